//! Lenient deserializers for values coming back from the sheet backend.
//!
//! Spreadsheet cells round-trip as either JSON numbers or strings, dates may
//! carry a time component, and times are written as `HH:MM`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serializer};

use super::settings::Gender;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn parse_number<E: serde::de::Error>(raw: NumberOrString) -> Result<Option<f64>, E> {
    match raw {
        NumberOrString::Number(n) => Ok(Some(n)),
        NumberOrString::Text(s) if s.trim().is_empty() => Ok(None),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| E::custom(format!("expected a number, got '{s}'"))),
    }
}

pub fn f64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    parse_number(NumberOrString::deserialize(d)?)?
        .ok_or_else(|| serde::de::Error::custom("expected a number, got an empty string"))
}

pub fn opt_f64_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(d)? {
        Some(raw) => parse_number(raw),
        None => Ok(None),
    }
}

/// Blank or whitespace-only cells decode as `None`.
pub fn opt_gender<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Gender>, D::Error> {
    match Option::<String>::deserialize(d)? {
        Some(raw) if !raw.trim().is_empty() => {
            raw.parse::<Gender>().map(Some).map_err(serde::de::Error::custom)
        }
        _ => Ok(None),
    }
}

fn to_u32<E: serde::de::Error>(n: f64) -> Result<u32, E> {
    if n.is_finite() && n >= 0.0 && n <= u32::MAX as f64 {
        Ok(n.trunc() as u32)
    } else {
        Err(E::custom(format!("expected a non-negative integer, got {n}")))
    }
}

pub fn u32_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let n = f64_lenient(d)?;
    to_u32(n)
}

pub fn opt_u32_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    opt_f64_lenient(d)?.map(to_u32).transpose()
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part (`T...` or ` ...`).
pub fn date_lenient<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    let head = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map_err(|e| serde::de::Error::custom(format!("invalid date '{raw}': {e}")))
}

pub mod hhmm {
    use super::*;

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{raw}'")))
    }
}
