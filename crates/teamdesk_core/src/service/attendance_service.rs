//! Attendance use-case service.
//!
//! # Responsibility
//! - Record daily check-in/check-out and absences.
//! - Summarize a user's month.
//!
//! # Invariants
//! - At most one attendance entry per user per day.
//! - `workingHours` is derived from check-in/check-out, never entered.

use crate::model::attendance::{working_hours_between, Attendance, AttendanceStatus};
use crate::model::record::{Collection, RECORD_DATE_FORMAT};
use crate::service::{require_user, ServiceError, ServiceResult};
use crate::store::{
    create_record, fetch_record, fetch_records, patch_record, DocumentFilter, DocumentStore,
    SortDirection, StoreError,
};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::{Map, Value};

/// Per-status day counts for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub present: usize,
    pub absent: usize,
    pub leave: usize,
}

impl AttendanceSummary {
    pub fn from_entries(entries: &[Attendance]) -> Self {
        entries
            .iter()
            .fold(Self::default(), |mut summary, entry| {
                match entry.status {
                    AttendanceStatus::Present => summary.present += 1,
                    AttendanceStatus::Absent => summary.absent += 1,
                    AttendanceStatus::Leave => summary.leave += 1,
                }
                summary
            })
    }
}

pub struct AttendanceService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> AttendanceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Opens a `present` entry for `date` at `at_ms`.
    pub fn check_in(
        &self,
        user_id: &str,
        date: NaiveDate,
        at_ms: i64,
    ) -> ServiceResult<Attendance> {
        require_user(&self.store, user_id)?;
        self.require_no_entry(user_id, date)?;
        let entry = Attendance::new(user_id, date, at_ms, AttendanceStatus::Present);
        let id = create_record(&self.store, &entry)?;
        self.require_entry(&id)
    }

    /// Closes an open entry and derives its working hours.
    ///
    /// # Errors
    /// - `InvalidInput` when the entry is not `present`, is already checked
    ///   out, or when `at_ms` precedes the check-in.
    pub fn check_out(&self, id: &str, at_ms: i64) -> ServiceResult<Attendance> {
        let entry = self.require_entry(id)?;
        if entry.status != AttendanceStatus::Present {
            return Err(ServiceError::InvalidInput(format!(
                "attendance `{id}` is marked {} and cannot be checked out",
                entry.status.as_str()
            )));
        }
        if entry.check_out.is_some() {
            return Err(ServiceError::InvalidInput(format!(
                "attendance `{id}` is already checked out"
            )));
        }
        let hours = working_hours_between(entry.check_in, at_ms).ok_or_else(|| {
            ServiceError::InvalidInput("check-out cannot be earlier than check-in".into())
        })?;

        let mut patch = Map::new();
        patch.insert("checkOut".to_string(), Value::from(at_ms));
        patch.insert("workingHours".to_string(), Value::from(hours));
        Ok(patch_record(&self.store, id, &patch)?)
    }

    /// Records an `absent` or `leave` day.
    pub fn mark_absence(
        &self,
        user_id: &str,
        date: NaiveDate,
        status: AttendanceStatus,
        notes: Option<&str>,
    ) -> ServiceResult<Attendance> {
        if status == AttendanceStatus::Present {
            return Err(ServiceError::InvalidInput(
                "use check-in to record presence".into(),
            ));
        }
        require_user(&self.store, user_id)?;
        self.require_no_entry(user_id, date)?;

        let day_start = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        let mut entry = Attendance::new(user_id, date, day_start, status);
        entry.notes = notes
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string);
        let id = create_record(&self.store, &entry)?;
        self.require_entry(&id)
    }

    /// Entries of one calendar month, date ascending.
    pub fn list_for_month(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ServiceResult<Vec<Attendance>> {
        if !(1..=12).contains(&month) {
            return Err(ServiceError::InvalidInput(format!(
                "month must be within 1..=12, got {month}"
            )));
        }
        let filter = DocumentFilter::all()
            .where_eq("userId", user_id)
            .order_by("date", SortDirection::Ascending);
        let entries: Vec<Attendance> = fetch_records(&self.store, &filter)?;
        Ok(entries
            .into_iter()
            .filter(|entry| {
                entry
                    .day()
                    .is_some_and(|day| day.year() == year && day.month() == month)
            })
            .collect())
    }

    pub fn month_summary(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> ServiceResult<AttendanceSummary> {
        let entries = self.list_for_month(user_id, year, month)?;
        Ok(AttendanceSummary::from_entries(&entries))
    }

    fn require_no_entry(&self, user_id: &str, date: NaiveDate) -> ServiceResult<()> {
        let day = date.format(RECORD_DATE_FORMAT).to_string();
        let filter = DocumentFilter::all()
            .where_eq("userId", user_id)
            .where_eq("date", day.as_str())
            .limit(1);
        let existing: Vec<Attendance> = fetch_records(&self.store, &filter)?;
        if !existing.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "attendance for {day} is already recorded"
            )));
        }
        Ok(())
    }

    fn require_entry(&self, id: &str) -> ServiceResult<Attendance> {
        fetch_record::<Attendance, S>(&self.store, id)?.ok_or_else(|| {
            ServiceError::Store(StoreError::NotFound {
                collection: Collection::Attendance,
                id: id.to_string(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AttendanceSummary;
    use crate::model::attendance::{Attendance, AttendanceStatus};
    use chrono::NaiveDate;

    #[test]
    fn summary_counts_each_status() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let entries = vec![
            Attendance::new("E1", day, 0, AttendanceStatus::Present),
            Attendance::new("E1", day, 0, AttendanceStatus::Present),
            Attendance::new("E1", day, 0, AttendanceStatus::Absent),
            Attendance::new("E1", day, 0, AttendanceStatus::Leave),
        ];
        assert_eq!(
            AttendanceSummary::from_entries(&entries),
            AttendanceSummary {
                present: 2,
                absent: 1,
                leave: 1
            }
        );
    }
}
