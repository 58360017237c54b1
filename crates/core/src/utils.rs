//! Formatting and timing helpers shared by the services.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `HH:MM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// `YYYY-MM-DD HH:MM`, the x label of time series points.
pub fn format_timestamp(date: NaiveDate, time: NaiveTime) -> String {
    format!("{} {}", format_date(date), format_time(time))
}

/// Current local date and minute, used to prefill date/time form fields.
pub fn default_date_time(now: NaiveDateTime) -> (String, String) {
    (format_date(now.date()), format_time(now.time()))
}

/// Group digits by thousands with a fixed number of decimals.
/// Non-finite input formats as `"0"`.
pub fn format_number(num: f64, decimals: usize) -> String {
    if !num.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", decimals, num.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = num < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Whole-unit currency display, e.g. `$1,235`.
pub fn format_currency(amount: f64) -> String {
    format!("${}", format_number(amount, 0))
}

/// Absolute number of days between two dates.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days().abs()
}

/// First and last day of the month containing `date`.
pub fn month_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let next_month = first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(first);
    let last = next_month.pred_opt().unwrap_or(date);
    (first, last)
}

/// Runs only the last of a burst of calls, `delay` after it was made.
///
/// Each call cancels the pending one. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        }));
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    /// Whether a call is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}
