//! Project use-case service.
//!
//! # Responsibility
//! - Create projects, manage membership and report completion progress.
//!
//! # Invariants
//! - The manager is always a member.
//! - Membership lists contain no duplicates.

use crate::model::project::{Project, ProjectStatus};
use crate::model::record::{Collection, RecordId};
use crate::model::task::{Task, TaskStatus};
use crate::service::{optional_text, require_min_chars, require_user, ServiceError, ServiceResult};
use crate::store::{
    create_record, fetch_record, fetch_records, patch_record, DocumentFilter, DocumentStore,
    SortDirection, CREATED_AT_KEY,
};
use serde::Serialize;
use serde_json::{Map, Value};

const MIN_NAME_CHARS: usize = 2;

/// Input for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub manager_id: RecordId,
    /// Additional members; the manager is added automatically.
    pub members: Vec<RecordId>,
    pub status: Option<ProjectStatus>,
    pub start_date: i64,
    pub end_date: Option<i64>,
}

/// Completion ratio of one project's tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    pub project_id: RecordId,
    pub total: usize,
    pub completed: usize,
    /// Rounded to the nearest whole percent; 0 when the project has no tasks.
    pub percent: u8,
}

impl ProjectProgress {
    /// Computes progress from any task list; tasks of other projects are ignored.
    pub fn from_tasks(project_id: &str, tasks: &[Task]) -> Self {
        let (total, completed) = tasks
            .iter()
            .filter(|task| task.project_id == project_id)
            .fold((0usize, 0usize), |(total, completed), task| {
                let done = usize::from(task.status == TaskStatus::Done);
                (total + 1, completed + done)
            });
        let percent = if total == 0 {
            0
        } else {
            ((completed * 100 + total / 2) / total) as u8
        };
        Self {
            project_id: project_id.to_string(),
            total,
            completed,
            percent,
        }
    }
}

pub struct ProjectService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> ProjectService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a project.
    ///
    /// # Errors
    /// - `InvalidInput` for a short name or an empty manager id.
    /// - `InvalidReference` for a missing manager or member, or a manager
    ///   whose role cannot manage.
    pub fn create_project(&self, input: &NewProject) -> ServiceResult<Project> {
        let name = require_min_chars("name", &input.name, MIN_NAME_CHARS)?;
        if input.manager_id.trim().is_empty() {
            return Err(ServiceError::InvalidInput("manager is required".into()));
        }
        let manager = require_user(&self.store, &input.manager_id)?;
        if !manager.role.can_manage() {
            return Err(ServiceError::InvalidReference {
                collection: Collection::Users,
                id: manager.id,
                reason: "user cannot be a manager",
            });
        }

        let mut project = Project::new(name, input.manager_id.clone(), input.start_date);
        project.description = optional_text(input.description.as_deref()).unwrap_or_default();
        project.status = input.status.unwrap_or(ProjectStatus::Active);
        project.end_date = input.end_date;
        for member_id in &input.members {
            if project.has_member(member_id) {
                continue;
            }
            require_user(&self.store, member_id)?;
            project.members.push(member_id.clone());
        }

        let id = create_record(&self.store, &project)?;
        self.require_project(&id)
    }

    pub fn get_project(&self, id: &str) -> ServiceResult<Option<Project>> {
        Ok(fetch_record(&self.store, id)?)
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> ServiceResult<Vec<Project>> {
        let filter = DocumentFilter::all().order_by(CREATED_AT_KEY, SortDirection::Descending);
        Ok(fetch_records(&self.store, &filter)?)
    }

    /// Adds `user_id` to the project. Adding an existing member is a no-op.
    pub fn add_member(&self, project_id: &str, user_id: &str) -> ServiceResult<Project> {
        let project = self.require_project(project_id)?;
        if project.has_member(user_id) {
            return Ok(project);
        }
        require_user(&self.store, user_id)?;

        let mut members = project.members;
        members.push(user_id.to_string());
        let mut patch = Map::new();
        patch.insert("members".to_string(), Value::from(members));
        Ok(patch_record(&self.store, project_id, &patch)?)
    }

    pub fn project_progress(&self, project_id: &str) -> ServiceResult<ProjectProgress> {
        self.require_project(project_id)?;
        let tasks: Vec<Task> = fetch_records(
            &self.store,
            &DocumentFilter::all().where_eq("projectId", project_id),
        )?;
        Ok(ProjectProgress::from_tasks(project_id, &tasks))
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
}

#[cfg(test)]
mod tests {
    use super::ProjectProgress;
    use crate::model::task::{Task, TaskStatus};

    fn task(id: &str, project_id: &str, status: TaskStatus) -> Task {
        let mut task = Task::with_id(id, "Work", project_id, "E1");
        task.status = status;
        task
    }

    #[test]
    fn progress_counts_done_tasks_of_one_project() {
        let tasks = vec![
            task("T1", "P1", TaskStatus::Done),
            task("T2", "P1", TaskStatus::InProgress),
            task("T3", "P1", TaskStatus::Todo),
            task("T4", "P2", TaskStatus::Done),
        ];
        let progress = ProjectProgress::from_tasks("P1", &tasks);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.percent, 33);
    }

    #[test]
    fn progress_of_empty_project_is_zero() {
        let progress = ProjectProgress::from_tasks("P9", &[]);
        assert_eq!((progress.total, progress.completed, progress.percent), (0, 0, 0));
    }
}
