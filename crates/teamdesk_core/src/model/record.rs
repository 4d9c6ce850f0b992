//! Shared record contracts for persisted entities.
//!
//! # Responsibility
//! - Name the logical collections owned by the document store.
//! - Define the `Record` contract every persisted entity implements.
//! - Provide the validation error shared by all record types.
//!
//! # Invariants
//! - Collection names are stable wire identifiers and never change.
//! - `Record::validate()` is pure and never touches storage.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// String identifier for every record in the document store.
///
/// Generated ids are UUID v4 strings, but imported ids (`"T1"`) are kept as-is.
pub type RecordId = String;

/// Date format used by attendance and daily report records.
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Generates a fresh record id.
pub fn new_record_id() -> RecordId {
    Uuid::new_v4().to_string()
}

/// Parses a `YYYY-MM-DD` record date.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), RECORD_DATE_FORMAT).ok()
}

/// Named logical grouping of records in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Users,
    Projects,
    Tasks,
    Attendance,
    DailyUpdates,
}

impl Collection {
    /// All collections in declaration order.
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Projects,
        Collection::Tasks,
        Collection::Attendance,
        Collection::DailyUpdates,
    ];

    /// Stable collection name used as storage key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Attendance => "attendance",
            Self::DailyUpdates => "daily_updates",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.as_str() == value.trim())
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub collection: Collection,
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(collection: Collection, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            collection,
            field,
            reason: reason.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} record: `{}` {}",
            self.collection, self.field, self.reason
        )
    }
}

impl Error for ValidationError {}

/// Result alias for record validation.
pub type ValidationResult = Result<(), ValidationError>;

/// Contract shared by every entity persisted in the document store.
///
/// Serialized form is the document body (camelCase keys, `id` included).
pub trait Record: Serialize + DeserializeOwned {
    /// Collection this record type lives in.
    const COLLECTION: Collection;

    /// Stable record id.
    fn id(&self) -> &str;

    /// Checks record-local invariants.
    ///
    /// Cross-record references are not checked here; broken references are
    /// resolved softly at display time.
    fn validate(&self) -> ValidationResult;
}

pub(crate) fn require_not_blank(
    collection: Collection,
    field: &'static str,
    value: &str,
) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(collection, field, "must not be blank"));
    }
    Ok(())
}

pub(crate) fn require_optional_not_blank(
    collection: Collection,
    field: &'static str,
    value: Option<&str>,
) -> ValidationResult {
    match value {
        Some(value) => require_not_blank(collection, field, value),
        None => Ok(()),
    }
}

pub(crate) fn require_record_date(
    collection: Collection,
    field: &'static str,
    value: &str,
) -> ValidationResult {
    if parse_record_date(value).is_none() {
        return Err(ValidationError::new(
            collection,
            field,
            format!("must be a YYYY-MM-DD date, got `{value}`"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{new_record_id, parse_record_date, Collection};

    #[test]
    fn collection_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::parse(collection.as_str()), Some(collection));
        }
        assert_eq!(Collection::DailyUpdates.as_str(), "daily_updates");
        assert_eq!(Collection::parse("widgets"), None);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(new_record_id(), new_record_id());
    }

    #[test]
    fn record_date_requires_iso_day() {
        assert!(parse_record_date("2024-02-29").is_some());
        assert!(parse_record_date("2023-02-29").is_none());
        assert!(parse_record_date("29/02/2024").is_none());
    }
}
