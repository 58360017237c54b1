use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field that failed client-side validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Form field name (e.g., "amount", "systolic")
    pub field: String,
    /// Message shown next to the field
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unified error type for the entire daily-tracker-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation ──────────────────────────────────────────────────
    #[error("Form validation failed: {}", join_field_errors(.0))]
    InvalidForm(Vec<FieldError>),

    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("API error: {0}")]
    Api(String),

    // ── Local storage / serialization ───────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// `true` for errors raised by the remote API or the transport.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_) | CoreError::Permission(_) | CoreError::Api(_)
        )
    }

    /// Field errors carried by an `InvalidForm` error, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            CoreError::InvalidForm(errors) => errors,
            _ => &[],
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL, and the API key travels in the query.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };

        match e.status() {
            Some(status) if status.as_u16() == 401 || status.as_u16() == 403 => {
                CoreError::Permission(sanitized)
            }
            Some(_) => CoreError::Api(sanitized),
            None if e.is_decode() => CoreError::Deserialization(sanitized),
            None => CoreError::Network(sanitized),
        }
    }
}
