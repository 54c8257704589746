use crate::domain::analysis::{AnalysisResult, AnalysisSummary, ClientRecord};
use crate::time::dates::parse_purchase_date;
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `/analyze` response body as the service sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireAnalysisResult {
    pub summary: WireSummary,
    pub recovery_focus_list: Vec<WireClientRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSummary {
    pub recovery_potential_value: f64,
    pub churned_clients_total: u64,
    pub global_average_ticket: f64,
    pub suggested_daily_calls: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireClientRecord {
    /// Preferred display name; `Client` is used when this is absent or blank.
    #[serde(rename = "Cliente", default)]
    pub name: Option<String>,
    #[serde(rename = "Client", default)]
    pub name_fallback: Option<String>,
    #[serde(rename = "CNPJ/CPF", default)]
    pub tax_id: Option<Value>,
    pub last_purchase_date: String,
    pub days_since_last_purchase: i64,
    pub average_ticket_value: f64,
    pub total_revenue: f64,
    #[serde(default)]
    pub purchase_history: Option<Vec<String>>,
}

pub fn parse_analysis_result(text: &str) -> anyhow::Result<AnalysisResult> {
    let parsed = serde_json::from_str::<WireAnalysisResult>(text)
        .context("analysis response does not match the expected schema")?;
    parsed.validate_and_into_result()
}

impl WireAnalysisResult {
    pub fn validate_and_into_result(self) -> anyhow::Result<AnalysisResult> {
        let summary = self.summary.validate_and_into_summary()?;

        let mut recovery_focus_list = Vec::with_capacity(self.recovery_focus_list.len());
        for (idx, record) in self.recovery_focus_list.into_iter().enumerate() {
            let record = record
                .validate_and_into_record()
                .with_context(|| format!("invalid recovery_focus_list[{idx}]"))?;
            recovery_focus_list.push(record);
        }

        Ok(AnalysisResult {
            summary,
            recovery_focus_list,
        })
    }
}

impl WireSummary {
    fn validate_and_into_summary(self) -> anyhow::Result<AnalysisSummary> {
        ensure_amount("summary.recovery_potential_value", self.recovery_potential_value)?;
        ensure_amount("summary.global_average_ticket", self.global_average_ticket)?;

        Ok(AnalysisSummary {
            recovery_potential_value: self.recovery_potential_value,
            churned_clients_total: self.churned_clients_total,
            global_average_ticket: self.global_average_ticket,
            suggested_daily_calls: self.suggested_daily_calls,
        })
    }
}

impl WireClientRecord {
    fn validate_and_into_record(self) -> anyhow::Result<ClientRecord> {
        let name = [self.name, self.name_fallback]
            .into_iter()
            .flatten()
            .map(|n| n.trim().to_string())
            .find(|n| !n.is_empty());
        let Some(name) = name else {
            bail!("missing field `Cliente`");
        };

        let last_purchase_date = parse_purchase_date(&self.last_purchase_date)
            .context("last_purchase_date")?;

        ensure!(
            self.days_since_last_purchase >= 0,
            "days_since_last_purchase must be non-negative (got {})",
            self.days_since_last_purchase
        );
        let days_since_last_purchase = u32::try_from(self.days_since_last_purchase)
            .with_context(|| {
                format!(
                    "days_since_last_purchase out of range: {}",
                    self.days_since_last_purchase
                )
            })?;

        ensure_amount("average_ticket_value", self.average_ticket_value)?;
        ensure_amount("total_revenue", self.total_revenue)?;

        let history = self.purchase_history.unwrap_or_default();
        let mut purchase_history = Vec::with_capacity(history.len());
        for (idx, raw) in history.iter().enumerate() {
            purchase_history.push(
                parse_purchase_date(raw).with_context(|| format!("purchase_history[{idx}]"))?,
            );
        }

        Ok(ClientRecord {
            name,
            tax_id: identifier(self.tax_id)?,
            last_purchase_date,
            days_since_last_purchase,
            average_ticket_value: self.average_ticket_value,
            total_revenue: self.total_revenue,
            purchase_history,
        })
    }
}

fn ensure_amount(field: &str, value: f64) -> anyhow::Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{field} must be a non-negative amount (got {value})"
    );
    Ok(())
}

// Spreadsheets exported through pandas sometimes turn CPF/CNPJ into numbers.
fn identifier(raw: Option<Value>) -> anyhow::Result<Option<String>> {
    let id = match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => bail!("CNPJ/CPF must be a string (got {other})"),
    };
    Ok(id.filter(|s| !s.is_empty()))
}
