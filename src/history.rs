//! Change tracking for assumption edits

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::projection::Year;

/// Effect of an edit on Year 3 net income
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetIncomeImpact {
    pub impact_abs: f64,
    /// Percent of the previous net income magnitude; 0 when it was 0
    pub impact_pct: f64,
}

impl NetIncomeImpact {
    pub fn between(previous: f64, current: f64) -> Self {
        let impact_abs = current - previous;
        let impact_pct = if previous != 0.0 {
            impact_abs / previous.abs() * 100.0
        } else {
            0.0
        };
        NetIncomeImpact {
            impact_abs,
            impact_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub recorded_at: DateTime<Local>,
    pub variable: String,
    pub year: Year,
    pub old_value: f64,
    pub new_value: f64,
    pub impact: NetIncomeImpact,
}

impl ChangeRecord {
    /// Build a record for an edit, or `None` if the value did not change
    pub fn for_edit(
        variable: &str,
        year: Year,
        old_value: f64,
        new_value: f64,
        previous_net_income: f64,
        new_net_income: f64,
    ) -> Option<Self> {
        if old_value == new_value {
            return None;
        }
        Some(ChangeRecord {
            recorded_at: Local::now(),
            variable: variable.to_string(),
            year,
            old_value,
            new_value,
            impact: NetIncomeImpact::between(previous_net_income, new_net_income),
        })
    }
}
