use crate::domain::analysis::AnalysisSummary;
use crate::view::format::{format_brl, format_count};

pub const WORKING_DAYS_PER_CYCLE: u32 = 22;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    pub trend: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationalGoal {
    pub calls_per_day: u64,
    pub total_clients: u64,
    pub working_days: u32,
}

/// Headline cards. A missing summary (still loading) shows zeroes.
pub fn project_kpis(summary: Option<&AnalysisSummary>) -> [KpiCard; 3] {
    let s = summary.copied().unwrap_or_default();
    [
        KpiCard {
            label: "Recovery Potential",
            value: format_brl(s.recovery_potential_value),
            trend: "+12% estimated",
        },
        KpiCard {
            label: "Clients in Churn",
            value: format_count(s.churned_clients_total),
            trend: "Action required",
        },
        KpiCard {
            label: "Global Ticket Average",
            value: format_brl(s.global_average_ticket),
            trend: "Standard base",
        },
    ]
}

pub fn operational_goal(summary: Option<&AnalysisSummary>) -> OperationalGoal {
    let s = summary.copied().unwrap_or_default();
    OperationalGoal {
        calls_per_day: s.suggested_daily_calls,
        total_clients: s.churned_clients_total,
        working_days: WORKING_DAYS_PER_CYCLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> AnalysisSummary {
        AnalysisSummary {
            recovery_potential_value: 15_300.4,
            churned_clients_total: 1_250,
            global_average_ticket: 87.0,
            suggested_daily_calls: 57,
        }
    }

    #[test]
    fn formats_summary_values() {
        let s = summary();
        let cards = project_kpis(Some(&s));
        assert_eq!(cards[0].value, "R$ 15.300,40");
        assert_eq!(cards[1].value, "1.250");
        assert_eq!(cards[2].value, "R$ 87,00");
    }

    #[test]
    fn missing_summary_renders_zeroes() {
        let cards = project_kpis(None);
        assert_eq!(cards[0].value, "R$ 0,00");
        assert_eq!(cards[1].value, "0");

        let goal = operational_goal(None);
        assert_eq!(goal.calls_per_day, 0);
        assert_eq!(goal.working_days, 22);
    }

    #[test]
    fn goal_reads_calls_and_clients() {
        let s = summary();
        let goal = operational_goal(Some(&s));
        assert_eq!(goal.calls_per_day, 57);
        assert_eq!(goal.total_clients, 1_250);
    }
}
