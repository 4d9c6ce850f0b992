//! Daily report (stand-up update) domain model.

use crate::model::record::{
    new_record_id, require_not_blank, require_record_date, Collection, Record, RecordId,
    ValidationResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUpdate {
    pub id: RecordId,
    pub user_id: RecordId,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub content: String,
    #[serde(default)]
    pub blocking: Option<String>,
    #[serde(default)]
    pub next_steps: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl DailyUpdate {
    pub fn new(
        user_id: impl Into<RecordId>,
        date: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_record_id(),
            user_id: user_id.into(),
            date: date.into(),
            content: content.into(),
            blocking: None,
            next_steps: None,
            created_at: 0,
        }
    }
}

impl Record for DailyUpdate {
    const COLLECTION: Collection = Collection::DailyUpdates;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult {
        require_not_blank(Self::COLLECTION, "id", &self.id)?;
        require_not_blank(Self::COLLECTION, "userId", &self.user_id)?;
        require_record_date(Self::COLLECTION, "date", &self.date)?;
        require_not_blank(Self::COLLECTION, "content", &self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::DailyUpdate;
    use crate::model::record::Record;

    #[test]
    fn blank_content_is_rejected() {
        let update = DailyUpdate::new("E1", "2024-03-07", "   ");
        assert_eq!(update.validate().unwrap_err().field, "content");
    }
}
