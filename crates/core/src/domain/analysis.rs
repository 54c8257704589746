use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    /// Backend ranking order. The chart reads it as-is; the table re-sorts a copy.
    pub recovery_focus_list: Vec<ClientRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub recovery_potential_value: f64,
    pub churned_clients_total: u64,
    pub global_average_ticket: f64,
    pub suggested_daily_calls: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub name: String,
    /// `CNPJ/CPF` column. Absent for some exports.
    pub tax_id: Option<String>,
    pub last_purchase_date: NaiveDate,
    pub days_since_last_purchase: u32,
    pub average_ticket_value: f64,
    pub total_revenue: f64,
    /// Chronological purchase dates. May repeat `last_purchase_date`.
    pub purchase_history: Vec<NaiveDate>,
}
