use chrono::{Months, NaiveDate};
use std::collections::BTreeMap;

use crate::config::ValidationRules;
use crate::errors::{CoreError, FieldError};
use crate::models::record::{
    BloodPressureRecord, ExpenseRecord, Record, RecordKind, WeightRecord,
};
use crate::models::serde_helpers::hhmm;
use crate::storage::manager::{draft_key, StorageManager};

/// Raw form input: field name → text as typed.
pub type FormFields = BTreeMap<String, String>;

/// Client-side form handling: field validation, record preparation and drafts.
///
/// Validation runs before anything is sent, so a rejected form never reaches
/// the backend and the input stays available for correction.
#[derive(Debug, Clone)]
pub struct FormService {
    rules: ValidationRules,
    storage: StorageManager,
    auto_save: bool,
}

impl FormService {
    pub fn new(rules: ValidationRules, storage: StorageManager, auto_save: bool) -> Self {
        Self {
            rules,
            storage,
            auto_save,
        }
    }

    // ── Validation ──────────────────────────────────────────────────

    /// Check one field of a `kind` form. `today` anchors the date window.
    pub fn validate_field(
        &self,
        kind: RecordKind,
        name: &str,
        value: &str,
        today: NaiveDate,
    ) -> Result<(), FieldError> {
        let value = value.trim();

        if value.is_empty() {
            if kind.required_fields().contains(&name) {
                return Err(FieldError::new(name, "This field is required"));
            }
            return Ok(());
        }

        if kind.numeric_fields().contains(&name) {
            let number: f64 = value
                .parse()
                .ok()
                .filter(|n: &f64| n.is_finite())
                .ok_or_else(|| FieldError::new(name, "Please enter a valid number"))?;

            if let Some(range) = self.rules.range_for(name) {
                if !range.contains(number) {
                    return Err(FieldError::new(
                        name,
                        format!("Value must be between {} and {}", range.min, range.max),
                    ));
                }
            }
        }

        match name {
            "date" => {
                let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .map_err(|_| FieldError::new(name, "Please enter a valid date"))?;
                if date > today {
                    return Err(FieldError::new(name, "Date cannot be in the future"));
                }
                let oldest = today.checked_sub_months(Months::new(12)).unwrap_or(today);
                if date < oldest {
                    return Err(FieldError::new(
                        name,
                        "Date cannot be more than one year ago",
                    ));
                }
            }
            "time" => {
                hhmm::parse(value)
                    .ok_or_else(|| FieldError::new(name, "Please enter a valid time"))?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Check every required field and every filled-in field, reporting all
    /// failures at once.
    pub fn validate_form(
        &self,
        kind: RecordKind,
        fields: &FormFields,
        today: NaiveDate,
    ) -> Result<(), CoreError> {
        let mut names: Vec<&str> = kind.required_fields().to_vec();
        for name in fields.keys() {
            if !names.contains(&name.as_str()) {
                names.push(name.as_str());
            }
        }

        let errors: Vec<FieldError> = names
            .into_iter()
            .filter_map(|name| {
                let value = fields.get(name).map(String::as_str).unwrap_or("");
                self.validate_field(kind, name, value, today).err()
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidForm(errors))
        }
    }

    /// Turn form text into a typed record. Empty optional fields are dropped.
    pub fn prepare_record(&self, kind: RecordKind, fields: &FormFields) -> Result<Record, CoreError> {
        let reader = FieldReader { fields };
        let record = match kind {
            RecordKind::Expense => Record::Expense(ExpenseRecord {
                date: reader.date("date")?,
                category: reader.text("category")?,
                amount: reader.number("amount")?,
                note: reader.optional_text("note"),
            }),
            RecordKind::Weight => Record::Weight(WeightRecord {
                date: reader.date("date")?,
                time: reader.time("time")?,
                weight: reader.number("weight")?,
                waist: reader.optional_number("waist")?,
            }),
            RecordKind::BloodPressure => Record::BloodPressure(BloodPressureRecord {
                date: reader.date("date")?,
                time: reader.time("time")?,
                systolic: reader.integer("systolic")?,
                diastolic: reader.integer("diastolic")?,
                pulse: reader.optional_number("pulse")?.map(|p| p.trunc() as u32),
            }),
        };
        Ok(record)
    }

    /// Validate, then prepare.
    pub fn build_record(
        &self,
        kind: RecordKind,
        fields: &FormFields,
        today: NaiveDate,
    ) -> Result<Record, CoreError> {
        self.validate_form(kind, fields, today)?;
        self.prepare_record(kind, fields)
    }

    // ── Drafts ──────────────────────────────────────────────────────

    pub fn auto_save_enabled(&self) -> bool {
        self.auto_save
    }

    /// Store the in-progress form under `draft_<formId>`. No-op when autosave
    /// is off; returns whether a draft was written.
    pub fn save_draft(&self, kind: RecordKind, fields: &FormFields) -> bool {
        if !self.auto_save {
            return false;
        }
        self.storage.set(&draft_key(kind.form_id()), fields)
    }

    /// Saved draft for `kind`, with empty values dropped.
    pub fn load_draft(&self, kind: RecordKind) -> Option<FormFields> {
        if !self.auto_save {
            return None;
        }
        let mut draft: FormFields = self.storage.get(&draft_key(kind.form_id()))?;
        draft.retain(|_, v| !v.is_empty());
        Some(draft)
    }

    pub fn clear_draft(&self, kind: RecordKind) {
        self.storage.remove(&draft_key(kind.form_id()));
    }
}

/// Typed accessors over raw form text, failing with a field error.
struct FieldReader<'a> {
    fields: &'a FormFields,
}

impl FieldReader<'_> {
    fn raw(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn missing(name: &str) -> CoreError {
        CoreError::InvalidForm(vec![FieldError::new(name, "This field is required")])
    }

    fn invalid(name: &str, what: &str) -> CoreError {
        CoreError::InvalidForm(vec![FieldError::new(name, format!("Please enter a valid {what}"))])
    }

    fn text(&self, name: &str) -> Result<String, CoreError> {
        self.raw(name)
            .map(str::to_string)
            .ok_or_else(|| Self::missing(name))
    }

    fn optional_text(&self, name: &str) -> Option<String> {
        self.raw(name).map(str::to_string)
    }

    fn optional_number(&self, name: &str) -> Result<Option<f64>, CoreError> {
        self.raw(name)
            .map(|v| {
                v.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| Self::invalid(name, "number"))
            })
            .transpose()
    }

    fn number(&self, name: &str) -> Result<f64, CoreError> {
        self.optional_number(name)?.ok_or_else(|| Self::missing(name))
    }

    fn integer(&self, name: &str) -> Result<u32, CoreError> {
        let n = self.number(name)?;
        if n < 0.0 || n > u32::MAX as f64 {
            return Err(Self::invalid(name, "number"));
        }
        Ok(n.trunc() as u32)
    }

    fn date(&self, name: &str) -> Result<NaiveDate, CoreError> {
        let raw = self.raw(name).ok_or_else(|| Self::missing(name))?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Self::invalid(name, "date"))
    }

    fn time(&self, name: &str) -> Result<chrono::NaiveTime, CoreError> {
        let raw = self.raw(name).ok_or_else(|| Self::missing(name))?;
        hhmm::parse(raw).ok_or_else(|| Self::invalid(name, "time"))
    }
}
