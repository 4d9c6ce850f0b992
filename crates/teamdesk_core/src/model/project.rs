//! Project domain model.

use crate::model::record::{
    new_record_id, require_not_blank, Collection, Record, RecordId, ValidationError,
    ValidationResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Active,
    Completed,
    OnHold,
}

/// Canonical project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ProjectStatus,
    pub manager_id: RecordId,
    /// Member user ids.
    #[serde(default)]
    pub members: Vec<RecordId>,
    /// Epoch milliseconds.
    pub start_date: i64,
    #[serde(default)]
    pub end_date: Option<i64>,
    #[serde(default)]
    pub created_at: i64,
}

impl Project {
    pub fn new(name: impl Into<String>, manager_id: impl Into<RecordId>, start_date: i64) -> Self {
        let manager_id = manager_id.into();
        Self {
            id: new_record_id(),
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::Active,
            members: vec![manager_id.clone()],
            manager_id,
            start_date,
            end_date: None,
            created_at: 0,
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|member| member == user_id)
    }
}

impl Record for Project {
    const COLLECTION: Collection = Collection::Projects;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult {
        require_not_blank(Self::COLLECTION, "id", &self.id)?;
        require_not_blank(Self::COLLECTION, "name", &self.name)?;
        require_not_blank(Self::COLLECTION, "managerId", &self.manager_id)?;
        if self.members.is_empty() {
            return Err(ValidationError::new(
                Self::COLLECTION,
                "members",
                "must contain at least one member",
            ));
        }
        if let Some(end_date) = self.end_date {
            if end_date < self.start_date {
                return Err(ValidationError::new(
                    Self::COLLECTION,
                    "endDate",
                    "must not be earlier than startDate",
                ));
            }
        }
        Ok(())
    }
}
