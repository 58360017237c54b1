pub mod chart;
pub mod health;
pub mod record;
pub mod settings;
pub mod stats;

pub(crate) mod serde_helpers;
