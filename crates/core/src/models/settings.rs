use serde::{Deserialize, Serialize};

use super::serde_helpers;

/// Biological sex used by the waist and BMR formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    /// `M`/`male` (any case) is male; any other non-empty code is female.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "" => Err("gender must not be empty".into()),
            "M" | "MALE" => Ok(Gender::Male),
            _ => Ok(Gender::Female),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Gender> for String {
    fn from(g: Gender) -> Self {
        g.code().to_string()
    }
}

/// Personal settings stored on the backend's settings sheet. Read-only here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Height in centimetres
    #[serde(default, deserialize_with = "serde_helpers::opt_f64_lenient")]
    pub height: Option<f64>,

    #[serde(default, deserialize_with = "serde_helpers::opt_gender")]
    pub gender: Option<Gender>,
}
