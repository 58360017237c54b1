use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::serde_helpers::{self, hhmm};

/// The three kinds of records the tracker can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Expense,
    Weight,
    BloodPressure,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Expense,
        RecordKind::Weight,
        RecordKind::BloodPressure,
    ];

    /// Sheet name on the backend.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            RecordKind::Expense => "expense",
            RecordKind::Weight => "weight",
            RecordKind::BloodPressure => "blood pressure",
        }
    }

    /// Id of the form that produces this record (also the draft key suffix).
    pub fn form_id(&self) -> &'static str {
        match self {
            RecordKind::Expense => "expenseForm",
            RecordKind::Weight => "weightForm",
            RecordKind::BloodPressure => "bpForm",
        }
    }

    /// Fields the form must fill in.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Expense => &["date", "category", "amount"],
            RecordKind::Weight => &["date", "time", "weight"],
            RecordKind::BloodPressure => &["date", "time", "systolic", "diastolic"],
        }
    }

    /// Fields parsed as numbers.
    pub fn numeric_fields(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Expense => &["amount"],
            RecordKind::Weight => &["weight", "waist"],
            RecordKind::BloodPressure => &["systolic", "diastolic", "pulse"],
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sheet_name())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "expenses" => Ok(RecordKind::Expense),
            "weight" => Ok(RecordKind::Weight),
            "blood pressure" | "bloodpressure" | "blood-pressure" | "bp" => {
                Ok(RecordKind::BloodPressure)
            }
            other => Err(format!("unknown record kind '{other}'")),
        }
    }
}

/// A single expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(deserialize_with = "serde_helpers::date_lenient")]
    pub date: NaiveDate,
    pub category: String,
    /// Always non-negative
    #[serde(deserialize_with = "serde_helpers::f64_lenient")]
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A weight (and optionally waist) measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    #[serde(deserialize_with = "serde_helpers::date_lenient")]
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Kilograms
    #[serde(deserialize_with = "serde_helpers::f64_lenient")]
    pub weight: f64,
    /// Centimetres
    #[serde(
        default,
        deserialize_with = "serde_helpers::opt_f64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub waist: Option<f64>,
}

/// A blood pressure reading in mmHg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureRecord {
    #[serde(deserialize_with = "serde_helpers::date_lenient")]
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(deserialize_with = "serde_helpers::u32_lenient")]
    pub systolic: u32,
    #[serde(deserialize_with = "serde_helpers::u32_lenient")]
    pub diastolic: u32,
    #[serde(
        default,
        deserialize_with = "serde_helpers::opt_u32_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub pulse: Option<u32>,
}

impl BloodPressureRecord {
    /// Readings taken before noon count as morning readings.
    pub fn is_morning(&self) -> bool {
        use chrono::Timelike;
        self.time.hour() < 12
    }
}

/// Any record ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Expense(ExpenseRecord),
    Weight(WeightRecord),
    BloodPressure(BloodPressureRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Expense(_) => RecordKind::Expense,
            Record::Weight(_) => RecordKind::Weight,
            Record::BloodPressure(_) => RecordKind::BloodPressure,
        }
    }

    /// Query parameters for a save request, `sheet` first.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("sheet".to_string(), self.kind().sheet_name().to_string())];
        let mut push = |k: &str, v: String| params.push((k.to_string(), v));

        match self {
            Record::Expense(r) => {
                push("date", r.date.format("%Y-%m-%d").to_string());
                push("category", r.category.clone());
                push("amount", r.amount.to_string());
                if let Some(note) = &r.note {
                    push("note", note.clone());
                }
            }
            Record::Weight(r) => {
                push("date", r.date.format("%Y-%m-%d").to_string());
                push("time", r.time.format("%H:%M").to_string());
                push("weight", r.weight.to_string());
                if let Some(waist) = r.waist {
                    push("waist", waist.to_string());
                }
            }
            Record::BloodPressure(r) => {
                push("date", r.date.format("%Y-%m-%d").to_string());
                push("time", r.time.format("%H:%M").to_string());
                push("systolic", r.systolic.to_string());
                push("diastolic", r.diastolic.to_string());
                if let Some(pulse) = r.pulse {
                    push("pulse", pulse.to_string());
                }
            }
        }
        params
    }
}
