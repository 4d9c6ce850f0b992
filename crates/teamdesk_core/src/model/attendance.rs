//! Attendance domain model.
//!
//! # Invariants
//! - `date` is a `YYYY-MM-DD` calendar day.
//! - `check_out`, when set, is not earlier than `check_in`.

use crate::model::record::{
    new_record_id, parse_record_date, require_not_blank, require_record_date, Collection, Record,
    RecordId, ValidationError, ValidationResult,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Leave => "leave",
        }
    }
}

/// One attendance entry per user per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: RecordId,
    pub user_id: RecordId,
    pub date: String,
    /// Epoch milliseconds.
    pub check_in: i64,
    #[serde(default)]
    pub check_out: Option<i64>,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub working_hours: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Attendance {
    pub fn new(
        user_id: impl Into<RecordId>,
        date: NaiveDate,
        check_in: i64,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            id: new_record_id(),
            user_id: user_id.into(),
            date: date.format(crate::model::record::RECORD_DATE_FORMAT).to_string(),
            check_in,
            check_out: None,
            status,
            working_hours: None,
            notes: None,
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        parse_record_date(&self.date)
    }
}

/// Hours between check-in and check-out, rounded to two decimals.
///
/// Returns `None` when `check_out` precedes `check_in` or the span
/// overflows `i64`.
pub fn working_hours_between(check_in: i64, check_out: i64) -> Option<f64> {
    if check_out < check_in {
        return None;
    }
    let span = check_out.checked_sub(check_in)?;
    let hours = span as f64 / MILLIS_PER_HOUR;
    Some((hours * 100.0).round() / 100.0)
}

impl Record for Attendance {
    const COLLECTION: Collection = Collection::Attendance;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult {
        require_not_blank(Self::COLLECTION, "id", &self.id)?;
        require_not_blank(Self::COLLECTION, "userId", &self.user_id)?;
        require_record_date(Self::COLLECTION, "date", &self.date)?;
        if let Some(check_out) = self.check_out {
            if check_out < self.check_in {
                return Err(ValidationError::new(
                    Self::COLLECTION,
                    "checkOut",
                    "must not be earlier than checkIn",
                ));
            }
        }
        if let Some(hours) = self.working_hours {
            if !hours.is_finite() || hours < 0.0 {
                return Err(ValidationError::new(
                    Self::COLLECTION,
                    "workingHours",
                    "must be a non-negative number",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{working_hours_between, Attendance, AttendanceStatus};
    use crate::model::record::Record;
    use chrono::NaiveDate;

    #[test]
    fn working_hours_round_to_two_decimals() {
        // 7h 20m
        assert_eq!(working_hours_between(0, 26_400_000), Some(7.33));
        assert_eq!(working_hours_between(10, 5), None);
    }

    #[test]
    fn working_hours_span_overflow_is_none() {
        assert_eq!(working_hours_between(i64::MIN, i64::MAX), None);
        assert_eq!(working_hours_between(-1, i64::MAX), None);
    }

    #[test]
    fn status_names_match_wire_format() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Leave,
        ] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire.as_str(), Some(status.as_str()));
        }
    }

    #[test]
    fn new_entry_formats_date() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let entry = Attendance::new("E1", day, 0, AttendanceStatus::Present);
        assert_eq!(entry.date, "2024-03-07");
        assert_eq!(entry.day(), Some(day));
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let mut entry = Attendance::new("E1", day, 0, AttendanceStatus::Present);
        entry.date = "07.03.2024".to_string();
        assert_eq!(entry.validate().unwrap_err().field, "date");
    }
}
