//! Task use-case service.
//!
//! # Responsibility
//! - Create, list and update tasks for a project board.
//! - Persist accepted prioritization suggestions.
//!
//! # Invariants
//! - Task lists are ordered newest first (`createdAt DESC, id ASC`).
//! - Suggestions are applied only through `apply_priority_suggestions`; the
//!   prioritization flow itself never writes.

use crate::model::prioritized::PrioritizedTask;
use crate::model::project::Project;
use crate::model::record::{Collection, RecordId};
use crate::model::task::{Task, TaskPriority, TaskStatus};
use crate::service::{optional_text, require_min_chars, require_user, ServiceError, ServiceResult};
use crate::store::{
    create_record, fetch_record, fetch_records, patch_record, remove_record, update_record,
    DocumentFilter, DocumentStore, SortDirection, StoreError, StoreResult, CREATED_AT_KEY,
};
use log::{info, warn};
use serde_json::{Map, Value};

const MIN_TITLE_CHARS: usize = 2;

enum SuggestionOutcome {
    Updated,
    Unchanged,
    Missing,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: RecordId,
    pub assignee_id: Option<RecordId>,
    /// Defaults to `medium`.
    pub priority: Option<TaskPriority>,
    /// Defaults to `todo`.
    pub status: Option<TaskStatus>,
    pub due_date: Option<i64>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, project_id: impl Into<RecordId>) -> Self {
        Self {
            title: title.into(),
            description: None,
            project_id: project_id.into(),
            assignee_id: None,
            priority: None,
            status: None,
            due_date: None,
        }
    }
}

/// Optional task list filters; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub project_id: Option<RecordId>,
    pub assignee_id: Option<RecordId>,
    pub status: Option<TaskStatus>,
}

impl TaskListQuery {
    fn to_filter(&self) -> DocumentFilter {
        let mut filter = DocumentFilter::all().order_by(CREATED_AT_KEY, SortDirection::Descending);
        if let Some(project_id) = &self.project_id {
            filter = filter.where_eq("projectId", project_id.as_str());
        }
        if let Some(assignee_id) = &self.assignee_id {
            filter = filter.where_eq("assigneeId", assignee_id.as_str());
        }
        if let Some(status) = self.status {
            filter = filter.where_eq("status", status.as_str());
        }
        filter
    }
}

/// Use-case service for task operations.
pub struct TaskService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a task reported by `reporter_id`.
    ///
    /// # Errors
    /// - `InvalidInput` when the title is shorter than two characters.
    /// - `InvalidReference` when the project, reporter or assignee is missing.
    pub fn create_task(&self, input: &NewTask, reporter_id: &str) -> ServiceResult<Task> {
        let title = require_min_chars("title", &input.title, MIN_TITLE_CHARS)?;
        self.require_project(&input.project_id)?;
        require_user(&self.store, reporter_id)?;
        if let Some(assignee_id) = &input.assignee_id {
            require_user(&self.store, assignee_id)?;
        }

        let mut task = Task::new(title, input.project_id.clone(), reporter_id);
        task.description = optional_text(input.description.as_deref()).unwrap_or_default();
        task.assignee_id = input.assignee_id.clone();
        task.priority = input.priority.unwrap_or(TaskPriority::Medium);
        task.status = input.status.unwrap_or(TaskStatus::Todo);
        task.due_date = input.due_date;

        let id = create_record(&self.store, &task)?;
        self.load_written(&id)
    }

    pub fn get_task(&self, id: &str) -> ServiceResult<Option<Task>> {
        Ok(fetch_record(&self.store, id)?)
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> ServiceResult<Vec<Task>> {
        Ok(fetch_records(&self.store, &query.to_filter())?)
    }

    pub fn update_status(&self, id: &str, status: TaskStatus) -> ServiceResult<Task> {
        let mut patch = Map::new();
        patch.insert("status".to_string(), Value::from(status.as_str()));
        Ok(patch_record(&self.store, id, &patch)?)
    }

    /// Replaces the editable fields of an existing task.
    pub fn update_task(&self, task: &Task) -> ServiceResult<Task> {
        require_min_chars("title", &task.title, MIN_TITLE_CHARS)?;
        if let Some(assignee_id) = &task.assignee_id {
            require_user(&self.store, assignee_id)?;
        }
        update_record(&self.store, task)?;
        self.load_written(&task.id)
    }

    pub fn delete_task(&self, id: &str) -> ServiceResult<bool> {
        Ok(remove_record::<Task, S>(&self.store, id)?)
    }

    /// Applies accepted suggestions to the stored tasks.
    ///
    /// Only `priority` is written, and only when it changes. Tasks deleted
    /// since the suggestion was produced are skipped. Returns the number of
    /// tasks updated.
    ///
    /// Each task is written separately. A store failure stops the batch with
    /// `PartiallyApplied`, whose `applied` count says how many earlier
    /// tasks were already updated.
    pub fn apply_priority_suggestions(
        &self,
        suggestions: &[PrioritizedTask],
    ) -> ServiceResult<usize> {
        let mut updated = 0;
        let mut skipped = 0;
        for suggestion in suggestions {
            match self.apply_suggestion(suggestion) {
                Ok(SuggestionOutcome::Updated) => updated += 1,
                Ok(SuggestionOutcome::Unchanged) => {}
                Ok(SuggestionOutcome::Missing) => skipped += 1,
                Err(source) => {
                    warn!(
                        "event=apply_priorities module=service status=error updated={} task_id={}",
                        updated, suggestion.task.id
                    );
                    return Err(ServiceError::PartiallyApplied {
                        applied: updated,
                        source,
                    });
                }
            }
        }
        info!(
            "event=apply_priorities module=service status=ok suggested={} updated={} skipped={}",
            suggestions.len(),
            updated,
            skipped
        );
        Ok(updated)
    }

    fn apply_suggestion(&self, suggestion: &PrioritizedTask) -> StoreResult<SuggestionOutcome> {
        let Some(current) = fetch_record::<Task, S>(&self.store, &suggestion.task.id)? else {
            return Ok(SuggestionOutcome::Missing);
        };
        let target = suggestion.new_priority.to_task_priority();
        if current.priority == target {
            return Ok(SuggestionOutcome::Unchanged);
        }
        let mut patch = Map::new();
        patch.insert("priority".to_string(), Value::from(target.as_str()));
        patch_record::<Task, S>(&self.store, &current.id, &patch)?;
        Ok(SuggestionOutcome::Updated)
    }

    fn require_project(&self, id: &str) -> ServiceResult<Project> {
        fetch_record::<Project, S>(&self.store, id)?.ok_or_else(|| {
            ServiceError::InvalidReference {
                collection: Collection::Projects,
                id: id.to_string(),
                reason: "project does not exist",
            }
        })
    }

    fn load_written(&self, id: &str) -> ServiceResult<Task> {
        fetch_record::<Task, S>(&self.store, id)?.ok_or_else(|| {
            ServiceError::Store(StoreError::NotFound {
                collection: Collection::Tasks,
                id: id.to_string(),
            })
        })
    }
}
