use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated expense totals computed by the backend (`type=expenseStats`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseStats {
    /// Category → total
    #[serde(default)]
    pub categories: BTreeMap<String, f64>,

    /// `YYYY-MM` → total
    #[serde(default)]
    pub monthly: BTreeMap<String, f64>,

    /// `YYYY-MM-DD` → total (older backends omit it)
    #[serde(default)]
    pub daily: Option<BTreeMap<String, f64>>,
}

impl ExpenseStats {
    /// Total spent in the month containing `date`, 0 if unknown.
    pub fn month_total(&self, date: NaiveDate) -> f64 {
        let key = date.format("%Y-%m").to_string();
        self.monthly.get(&key).copied().unwrap_or(0.0)
    }

    /// Total spent on `date`, 0 if unknown or no daily breakdown was sent.
    pub fn day_total(&self, date: NaiveDate) -> f64 {
        let key = date.format("%Y-%m-%d").to_string();
        self.daily
            .as_ref()
            .and_then(|d| d.get(&key).copied())
            .unwrap_or(0.0)
    }
}
