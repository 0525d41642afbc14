//! Data models for the fleet-management REST API.
//!
//! This module contains all the data structures used to represent
//! fleet data including:
//!
//! - `Vehicle`, `Driver`: the fleet and its drivers
//! - `Task`: vehicle/driver assignments with a status
//! - `MileageRecord`, `Expense`: per-vehicle logs
//! - `DashboardStats`, `Activity`: dashboard summaries
//!
//! Field names on the wire are the backend's Turkish names; the Rust names
//! are English.

pub mod dashboard;
pub mod driver;
pub mod expense;
pub mod form;
pub mod mileage;
pub mod record;
pub mod task;
pub mod vehicle;

pub use dashboard::{Activity, DashboardStats};
pub use driver::Driver;
pub use expense::{Expense, EXPENSE_KINDS};
pub use form::{Choice, FieldKind, FieldSpec, FormError, FormValues};
pub use mileage::MileageRecord;
pub use record::{filter_records, Record, Resource};
pub use task::{Task, TaskStatus};
pub use vehicle::{Ownership, Vehicle, VehicleStatus};

/// Serde helpers for numbers the backend may send as JSON strings
/// (Django decimal fields serialize as `"123.45"`).
pub(crate) mod flexible_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid number: {}", s))),
        }
    }
}

/// Serde helpers for dates that may arrive as `YYYY-MM-DD`, a full
/// timestamp, or null.
pub(crate) mod flexible_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::form::DATE_FORMAT;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        // Timestamps keep only their date part
        let date_part = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid date: {}", raw)))
    }
}
