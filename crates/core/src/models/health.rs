use serde::{Deserialize, Serialize};

use super::settings::Gender;

/// Display severity of a classification, mildest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// BMI bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
            BmiCategory::Obese => "obese",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "BMI is low, consider increasing nutritional intake",
            BmiCategory::Normal => "BMI is within the normal range, keep it up",
            BmiCategory::Overweight => {
                "BMI is elevated, consider controlling diet and exercising more"
            }
            BmiCategory::Obese => "BMI is high, consider a weight-loss plan with a physician",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            BmiCategory::Normal => Severity::Info,
            BmiCategory::Underweight | BmiCategory::Overweight => Severity::Warning,
            BmiCategory::Obese => Severity::Danger,
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Waist circumference bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaistCategory {
    Normal,
    High,
}

impl WaistCategory {
    pub fn label(&self) -> &'static str {
        match self {
            WaistCategory::Normal => "normal",
            WaistCategory::High => "high",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            WaistCategory::Normal => Severity::Info,
            WaistCategory::High => Severity::Danger,
        }
    }
}

impl std::fmt::Display for WaistCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Waist classification together with the limit it was checked against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaistAssessment {
    pub category: WaistCategory,
    pub gender: Gender,
    /// Upper bound of the normal range in cm
    pub limit: f64,
}

impl WaistAssessment {
    pub fn description(&self) -> String {
        match self.category {
            WaistCategory::High => format!(
                "Waist exceeds the {} limit ({}cm), metabolic syndrome risk",
                self.gender, self.limit
            ),
            WaistCategory::Normal => format!("Waist is within the {} normal range", self.gender),
        }
    }
}

/// Blood pressure tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodPressureCategory {
    Normal,
    Elevated,
    High,
}

impl BloodPressureCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BloodPressureCategory::Normal => "normal",
            BloodPressureCategory::Elevated => "elevated",
            BloodPressureCategory::High => "high",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BloodPressureCategory::Normal => "Blood pressure is within the normal range",
            BloodPressureCategory::Elevated => {
                "Blood pressure is slightly above normal, watch diet and exercise"
            }
            BloodPressureCategory::High => "Blood pressure is high, consider seeing a physician",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            BloodPressureCategory::Normal => Severity::Info,
            BloodPressureCategory::Elevated => Severity::Warning,
            BloodPressureCategory::High => Severity::Danger,
        }
    }
}

impl std::fmt::Display for BloodPressureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Healthy weight interval for a given height (normal BMI bucket), kg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealWeightRange {
    pub min: f64,
    pub max: f64,
}

/// Activity level for the TDEE multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "very_active" => Ok(ActivityLevel::VeryActive),
            other => Err(format!("unknown activity level '{other}'")),
        }
    }
}

/// Advice priority; sorts low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    Bmi,
    Waist,
    BloodPressure,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAdvice {
    pub kind: AdviceKind,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

/// Latest known readings used to build advice. Missing readings are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub bmi: Option<f64>,
    pub waist: Option<f64>,
    pub gender: Option<Gender>,
    pub systolic: Option<u32>,
    pub diastolic: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Weight change over the most recent records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTrend {
    pub direction: TrendDirection,
    /// Absolute change in percent of the first weight considered
    pub percentage: f64,
    pub message: String,
}

/// Everything the health summary shows for the latest readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub snapshot: HealthSnapshot,
    pub bmi_category: Option<BmiCategory>,
    pub waist: Option<WaistAssessment>,
    pub blood_pressure: Option<BloodPressureCategory>,
    pub ideal_weight: Option<IdealWeightRange>,
    pub trend: Option<WeightTrend>,
    pub advice: Vec<HealthAdvice>,
}
