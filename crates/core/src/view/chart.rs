use crate::domain::analysis::ClientRecord;
use crate::view::format::format_brl;

pub const CHART_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub value_label: String,
    pub height_percent: f64,
    /// First bar in backend order, drawn highlighted.
    pub leader: bool,
}

/// Top opportunities in the order the service ranked them; no re-sort here.
pub fn project(clients: &[ClientRecord]) -> Vec<ChartBar> {
    let top = &clients[..clients.len().min(CHART_TOP_N)];
    let max_revenue = top
        .iter()
        .map(|c| c.total_revenue)
        .fold(1.0_f64, f64::max);

    top.iter()
        .enumerate()
        .map(|(idx, client)| ChartBar {
            label: client.name.clone(),
            value: client.total_revenue,
            value_label: format_brl(client.total_revenue),
            height_percent: client.total_revenue / max_revenue * 100.0,
            leader: idx == 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn client(name: &str, revenue: f64) -> ClientRecord {
        ClientRecord {
            name: name.to_string(),
            tax_id: None,
            last_purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            days_since_last_purchase: 75,
            average_ticket_value: 1.0,
            total_revenue: revenue,
            purchase_history: vec![],
        }
    }

    #[test]
    fn takes_first_ten_in_input_order() {
        let clients: Vec<ClientRecord> =
            (0..12).map(|i| client(&format!("c{i}"), (i * 10) as f64)).collect();
        let bars = project(&clients);
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[0].label, "c0");
        assert_eq!(bars[9].label, "c9");
        assert!(bars[0].leader);
        assert!(bars[1..].iter().all(|b| !b.leader));
    }

    #[test]
    fn heights_are_relative_to_the_largest_bar() {
        let clients = vec![client("a", 50.0), client("b", 200.0), client("c", 0.0)];
        let bars = project(&clients);
        assert_eq!(bars[0].height_percent, 25.0);
        assert_eq!(bars[1].height_percent, 100.0);
        assert_eq!(bars[2].height_percent, 0.0);
        assert!(bars
            .iter()
            .all(|b| (0.0..=100.0).contains(&b.height_percent)));
    }

    #[test]
    fn max_ignores_clients_beyond_the_top_ten() {
        let mut clients: Vec<ClientRecord> = (0..10).map(|i| client(&format!("c{i}"), 10.0)).collect();
        clients.push(client("outlier", 1_000_000.0));
        let bars = project(&clients);
        assert!(bars.iter().all(|b| b.height_percent == 100.0));
    }

    #[test]
    fn all_zero_revenue_does_not_divide_by_zero() {
        let bars = project(&[client("a", 0.0), client("b", 0.0)]);
        assert!(bars.iter().all(|b| b.height_percent == 0.0));
    }

    #[test]
    fn sub_unit_revenue_uses_floor_of_one() {
        let bars = project(&[client("a", 0.5)]);
        assert_eq!(bars[0].height_percent, 50.0);
    }

    #[test]
    fn empty_input_has_no_bars() {
        assert!(project(&[]).is_empty());
    }
}
