use anyhow::bail;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

// pt-BR short date, the way the dashboard shows every purchase date.
const DISPLAY_FORMAT: &str = "%d/%m/%Y";

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a purchase date as the analysis service emits it.
///
/// Accepts bare ISO dates, ISO datetimes with or without an offset, and the
/// `DD/MM/YYYY` display form. Time-of-day is discarded.
pub fn parse_purchase_date(raw: &str) -> anyhow::Result<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, DISPLAY_FORMAT) {
        return Ok(d);
    }
    bail!("unrecognized purchase date: {raw:?}")
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_purchase_date("2024-03-07").unwrap(), ymd(2024, 3, 7));
        assert_eq!(parse_purchase_date(" 2024-03-07 ").unwrap(), ymd(2024, 3, 7));
    }

    #[test]
    fn parses_datetimes_and_drops_time() {
        assert_eq!(
            parse_purchase_date("2024-03-07T00:00:00").unwrap(),
            ymd(2024, 3, 7)
        );
        assert_eq!(
            parse_purchase_date("2024-03-07 13:45:10.250").unwrap(),
            ymd(2024, 3, 7)
        );
        assert_eq!(
            parse_purchase_date("2024-03-07T10:00:00Z").unwrap(),
            ymd(2024, 3, 7)
        );
        assert_eq!(
            parse_purchase_date("2024-03-07T10:00:00-03:00").unwrap(),
            ymd(2024, 3, 7)
        );
    }

    #[test]
    fn parses_display_form() {
        assert_eq!(parse_purchase_date("07/03/2024").unwrap(), ymd(2024, 3, 7));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_purchase_date("").is_err());
        assert!(parse_purchase_date("last tuesday").is_err());
        assert!(parse_purchase_date("2024-13-01").is_err());
    }

    #[test]
    fn formats_pt_br() {
        assert_eq!(format_display_date(ymd(2024, 3, 7)), "07/03/2024");
    }
}
