//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its enumerated status/priority.
//!
//! # Invariants
//! - `status` and `priority` are always one of the fixed enumerated values.
//! - `assignee_id`, when set, is a non-blank user id. Existence is not
//!   enforced here; dangling ids render as "Unknown".
//! - `updated_at >= created_at`.

use crate::model::record::{
    new_record_id, require_not_blank, require_optional_not_blank, Collection, Record, RecordId,
    ValidationError, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Created but not started.
    Todo,
    /// Work is in progress.
    InProgress,
    /// Waiting for review.
    Review,
    /// Completed. Terminal.
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
    }

    /// Whether no further work or re-prioritization is expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Stored task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] =
        [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value.trim())
    }
}

/// Canonical task record.
///
/// Field order is the serialization order used in prioritization prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub project_id: RecordId,
    #[serde(default)]
    pub assignee_id: Option<RecordId>,
    pub reporter_id: RecordId,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Epoch milliseconds.
    #[serde(default)]
    pub due_date: Option<i64>,
    /// Epoch milliseconds, stamped by the store on insert.
    #[serde(default)]
    pub created_at: i64,
    /// Epoch milliseconds, stamped by the store on every write.
    #[serde(default)]
    pub updated_at: i64,
}

impl Task {
    /// Creates an unsaved task with a generated id, `todo` status and
    /// `medium` priority.
    pub fn new(
        title: impl Into<String>,
        project_id: impl Into<RecordId>,
        reporter_id: impl Into<RecordId>,
    ) -> Self {
        Self::with_id(new_record_id(), title, project_id, reporter_id)
    }

    /// Creates an unsaved task with a caller-provided id.
    pub fn with_id(
        id: impl Into<RecordId>,
        title: impl Into<String>,
        project_id: impl Into<RecordId>,
        reporter_id: impl Into<RecordId>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            project_id: project_id.into(),
            assignee_id: None,
            reporter_id: reporter_id.into(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}

impl Record for Task {
    const COLLECTION: Collection = Collection::Tasks;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult {
        require_not_blank(Self::COLLECTION, "id", &self.id)?;
        require_not_blank(Self::COLLECTION, "title", &self.title)?;
        require_not_blank(Self::COLLECTION, "projectId", &self.project_id)?;
        require_not_blank(Self::COLLECTION, "reporterId", &self.reporter_id)?;
        require_optional_not_blank(Self::COLLECTION, "assigneeId", self.assignee_id.as_deref())?;
        if self.updated_at < self.created_at {
            return Err(ValidationError::new(
                Self::COLLECTION,
                "updatedAt",
                "must not be earlier than createdAt",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskPriority, TaskStatus};
    use crate::model::record::Record;

    #[test]
    fn status_wire_names_are_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("In Progress"), None);
    }

    #[test]
    fn only_done_is_terminal() {
        let terminal: Vec<_> = TaskStatus::ALL
            .into_iter()
            .filter(|status| status.is_terminal())
            .collect();
        assert_eq!(terminal, vec![TaskStatus::Done]);
    }

    #[test]
    fn new_task_defaults_to_todo_medium() {
        let task = Task::new("Write docs", "P1", "U1");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn blank_assignee_is_rejected() {
        let mut task = Task::with_id("T1", "Write docs", "P1", "U1");
        task.assignee_id = Some("  ".to_string());
        let err = task.validate().unwrap_err();
        assert_eq!(err.field, "assigneeId");
    }

    #[test]
    fn serializes_absent_optionals_as_null() {
        let task = Task::with_id("T1", "Write docs", "P1", "U1");
        let value = serde_json::to_value(&task).unwrap();
        assert!(value["assigneeId"].is_null());
        assert!(value["dueDate"].is_null());
        assert_eq!(value["projectId"], "P1");
    }
}
