use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::CoreError;

/// Environment variable overriding `api.url`.
pub const ENV_API_URL: &str = "DAILY_TRACKER_API_URL";
/// Environment variable overriding `api.key`.
pub const ENV_API_KEY: &str = "DAILY_TRACKER_API_KEY";

/// Static application configuration.
///
/// Every section falls back to its defaults when missing from the config file,
/// so an empty `{}` is a valid configuration (apart from the API endpoint).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub validation: ValidationRules,
    pub health: HealthStandards,
    pub ui: UiConfig,
    pub chart_colors: ChartColors,
    pub features: Features,
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load the configuration file at `path` (defaults when `None`), then apply
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load) without validation, for callers that never
    /// talk to the backend.
    pub fn read(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    CoreError::Config(format!("Failed to read {}: {e}", path.display()))
                })?;
                Self::from_json_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override API settings from `DAILY_TRACKER_API_URL` / `DAILY_TRACKER_API_KEY`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api.url = url.trim().to_string();
            }
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            self.api.key = key;
        }
    }

    /// Reject configurations the client cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.api.url.trim();
        if url.is_empty() {
            return Err(CoreError::Config(format!(
                "API URL is not set (set api.url or {ENV_API_URL})"
            )));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "API URL must start with http:// or https://, got '{url}'"
            )));
        }
        if self.api.timeout_ms == 0 {
            return Err(CoreError::Config("api.timeout_ms must be positive".into()));
        }

        for (name, range) in self.validation.named_ranges() {
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(CoreError::Config(format!(
                    "Invalid validation range for '{name}': {} > {}",
                    range.min, range.max
                )));
            }
        }

        let bmi = &self.health.bmi;
        if !(bmi.underweight < bmi.normal && bmi.normal < bmi.overweight) {
            return Err(CoreError::Config(
                "BMI thresholds must be strictly increasing".into(),
            ));
        }
        Ok(())
    }
}

// ── API ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend web-app endpoint
    pub url: String,
    /// Static key appended to every request as `apiKey`
    pub key: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of cached API responses in milliseconds (5 minutes by default)
    pub ttl_ms: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: 300_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry; doubled after each attempt
    pub initial_delay_ms: u64,
    /// Optional cap on the summed backoff delay. `None` retries without a cap.
    pub max_total_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_total_delay_ms: None,
        }
    }
}

// ── Validation ──────────────────────────────────────────────────────

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    pub min: f64,
    pub max: f64,
}

impl NumberRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseRules {
    pub amount: NumberRange,
}

impl Default for ExpenseRules {
    fn default() -> Self {
        Self {
            amount: NumberRange::new(0.0, 1_000_000.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightRules {
    pub weight: NumberRange,
    pub waist: NumberRange,
}

impl Default for WeightRules {
    fn default() -> Self {
        Self {
            weight: NumberRange::new(20.0, 300.0),
            waist: NumberRange::new(30.0, 200.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BloodPressureRules {
    pub systolic: NumberRange,
    pub diastolic: NumberRange,
    pub pulse: NumberRange,
}

impl Default for BloodPressureRules {
    fn default() -> Self {
        Self {
            systolic: NumberRange::new(50.0, 250.0),
            diastolic: NumberRange::new(30.0, 150.0),
            pulse: NumberRange::new(30.0, 200.0),
        }
    }
}

/// Per-record numeric ranges checked before anything is sent to the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub expense: ExpenseRules,
    pub weight: WeightRules,
    pub blood_pressure: BloodPressureRules,
}

impl ValidationRules {
    /// Look up the range for a field name, searching expense, weight, then
    /// blood pressure rules.
    pub fn range_for(&self, field: &str) -> Option<NumberRange> {
        self.named_ranges()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, range)| range)
    }

    fn named_ranges(&self) -> Vec<(&'static str, NumberRange)> {
        vec![
            ("amount", self.expense.amount),
            ("weight", self.weight.weight),
            ("waist", self.weight.waist),
            ("systolic", self.blood_pressure.systolic),
            ("diastolic", self.blood_pressure.diastolic),
            ("pulse", self.blood_pressure.pulse),
        ]
    }
}

// ── Health thresholds ───────────────────────────────────────────────

/// Exclusive upper bounds of the BMI buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BmiThresholds {
    pub underweight: f64,
    pub normal: f64,
    pub overweight: f64,
}

impl Default for BmiThresholds {
    fn default() -> Self {
        Self {
            underweight: 18.5,
            normal: 24.0,
            overweight: 27.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaistThresholds {
    pub male: f64,
    pub female: f64,
}

impl Default for WaistThresholds {
    fn default() -> Self {
        Self {
            male: 90.0,
            female: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureLimit {
    pub systolic: u32,
    pub diastolic: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BloodPressureThresholds {
    /// Readings at or above this limit are "elevated"
    pub normal: PressureLimit,
    /// Readings at or above this limit are "high"
    pub high: PressureLimit,
}

impl Default for BloodPressureThresholds {
    fn default() -> Self {
        Self {
            normal: PressureLimit {
                systolic: 120,
                diastolic: 80,
            },
            high: PressureLimit {
                systolic: 140,
                diastolic: 90,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStandards {
    pub bmi: BmiThresholds,
    pub waist: WaistThresholds,
    pub blood_pressure: BloodPressureThresholds,
}

// ── UI / presentation ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Debounce delay for field validation and draft autosave
    pub validation_delay_ms: u64,
    /// Polling interval for refreshing the active tab (0 disables polling)
    pub data_refresh_interval_ms: u64,
    /// Maximum number of points kept in line charts
    pub max_data_points: usize,
}

impl UiConfig {
    pub fn validation_delay(&self) -> Duration {
        Duration::from_millis(self.validation_delay_ms)
    }

    pub fn data_refresh_interval(&self) -> Option<Duration> {
        (self.data_refresh_interval_ms > 0)
            .then(|| Duration::from_millis(self.data_refresh_interval_ms))
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            validation_delay_ms: 500,
            data_refresh_interval_ms: 30_000,
            max_data_points: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BloodPressureColors {
    pub morning_systolic: String,
    pub morning_diastolic: String,
    pub evening_systolic: String,
    pub evening_diastolic: String,
}

impl Default for BloodPressureColors {
    fn default() -> Self {
        Self {
            morning_systolic: "#f44336".into(),
            morning_diastolic: "#ff9800".into(),
            evening_systolic: "#3f51b5".into(),
            evening_diastolic: "#009688".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartColors {
    /// Palette cycled through by expense category slices
    pub expense: Vec<String>,
    pub weight: String,
    pub waist: String,
    pub blood_pressure: BloodPressureColors,
}

impl Default for ChartColors {
    fn default() -> Self {
        Self {
            expense: [
                "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#C7C7C7",
                "#64B5F6",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            weight: "#4caf50".into(),
            waist: "#ff9800".into(),
            blood_pressure: BloodPressureColors::default(),
        }
    }
}

// ── Feature flags ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    /// Persist form drafts under `draft_<formId>`
    pub auto_save: bool,
    pub offline_mode: bool,
    pub data_export: bool,
    pub notifications: bool,
    /// Persist every successful cached read under `backup_<key>`
    pub auto_backup: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            auto_save: false,
            offline_mode: false,
            data_export: true,
            notifications: false,
            auto_backup: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    /// Log every outgoing request (API key redacted)
    pub log_api_requests: bool,
}
