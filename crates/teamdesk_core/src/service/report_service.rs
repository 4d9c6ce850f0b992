//! Daily report use-cases.

use crate::model::daily_update::DailyUpdate;
use crate::model::record::{Collection, RECORD_DATE_FORMAT};
use crate::service::{optional_text, require_min_chars, require_user, ServiceError, ServiceResult};
use crate::store::{
    create_record, fetch_record, fetch_records, DocumentFilter, DocumentStore, SortDirection,
    StoreError, CREATED_AT_KEY,
};
use chrono::NaiveDate;

const MIN_CONTENT_CHARS: usize = 5;

/// Input for a daily stand-up update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDailyUpdate {
    pub date: NaiveDate,
    pub content: String,
    pub blocking: Option<String>,
    pub next_steps: Option<String>,
}

/// Updates sharing one report date, newest entry first.
pub type DatedUpdates = (String, Vec<DailyUpdate>);

pub struct ReportService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn submit_update(
        &self,
        input: &NewDailyUpdate,
        user_id: &str,
    ) -> ServiceResult<DailyUpdate> {
        let content = require_min_chars("content", &input.content, MIN_CONTENT_CHARS)?;
        require_user(&self.store, user_id)?;

        let mut update = DailyUpdate::new(
            user_id,
            input.date.format(RECORD_DATE_FORMAT).to_string(),
            content,
        );
        update.blocking = optional_text(input.blocking.as_deref());
        update.next_steps = optional_text(input.next_steps.as_deref());

        let id = create_record(&self.store, &update)?;
        fetch_record::<DailyUpdate, S>(&self.store, &id)?.ok_or_else(|| {
            ServiceError::Store(StoreError::NotFound {
                collection: Collection::DailyUpdates,
                id,
            })
        })
    }

    /// All updates grouped by report date, newest date first.
    pub fn updates_by_date(&self) -> ServiceResult<Vec<DatedUpdates>> {
        let filter = DocumentFilter::all().order_by(CREATED_AT_KEY, SortDirection::Descending);
        let updates: Vec<DailyUpdate> = fetch_records(&self.store, &filter)?;
        Ok(group_by_date(updates))
    }
}

/// Groups updates by `date`, newest date first, keeping input order inside a
/// group.
pub fn group_by_date(mut updates: Vec<DailyUpdate>) -> Vec<DatedUpdates> {
    // Stable sort keeps the newest-first order within each date.
    updates.sort_by(|left, right| right.date.cmp(&left.date));

    let mut groups: Vec<DatedUpdates> = Vec::new();
    for update in updates {
        match groups.last_mut() {
            Some((date, entries)) if *date == update.date => entries.push(update),
            _ => groups.push((update.date.clone(), vec![update])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::group_by_date;
    use crate::model::daily_update::DailyUpdate;

    fn update(id: &str, date: &str) -> DailyUpdate {
        let mut update = DailyUpdate::new("E1", date, "Worked on the API");
        update.id = id.to_string();
        update
    }

    #[test]
    fn groups_newest_date_first_preserving_entry_order() {
        let groups = group_by_date(vec![
            update("U3", "2024-05-01"),
            update("U2", "2024-05-02"),
            update("U1", "2024-05-01"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "2024-05-02");
        assert_eq!(groups[1].0, "2024-05-01");
        let ids: Vec<&str> = groups[1].1.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U3", "U1"]);
    }
}
