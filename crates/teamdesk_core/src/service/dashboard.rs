//! Dashboard summary projection.

use crate::model::project::{Project, ProjectStatus};
use crate::model::task::{Task, TaskStatus};
use crate::model::user::User;
use crate::service::project_service::ProjectProgress;
use crate::service::ServiceResult;
use crate::store::{fetch_records, DocumentFilter, DocumentStore, SortDirection, CREATED_AT_KEY};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_projects: usize,
    pub employees: usize,
    pub tasks_in_progress: usize,
    pub tasks_done: usize,
    /// One entry per project, in the order projects were given.
    pub project_progress: Vec<ProjectProgress>,
}

impl DashboardSummary {
    pub fn compute(projects: &[Project], users: &[User], tasks: &[Task]) -> Self {
        let count_status =
            |status: TaskStatus| tasks.iter().filter(|task| task.status == status).count();
        Self {
            active_projects: projects
                .iter()
                .filter(|project| project.status == ProjectStatus::Active)
                .count(),
            employees: users.len(),
            tasks_in_progress: count_status(TaskStatus::InProgress),
            tasks_done: count_status(TaskStatus::Done),
            project_progress: projects
                .iter()
                .map(|project| ProjectProgress::from_tasks(&project.id, tasks))
                .collect(),
        }
    }
}

/// Computes the dashboard from stored data, projects newest first.
pub fn load_dashboard<S: DocumentStore>(store: &S) -> ServiceResult<DashboardSummary> {
    let projects: Vec<Project> = fetch_records(
        store,
        &DocumentFilter::all().order_by(CREATED_AT_KEY, SortDirection::Descending),
    )?;
    let users: Vec<User> = fetch_records(store, &DocumentFilter::all())?;
    let tasks: Vec<Task> = fetch_records(store, &DocumentFilter::all())?;
    Ok(DashboardSummary::compute(&projects, &users, &tasks))
}

#[cfg(test)]
mod tests {
    use super::DashboardSummary;
    use crate::model::project::{Project, ProjectStatus};
    use crate::model::task::{Task, TaskStatus};
    use crate::model::user::{User, UserRole};

    #[test]
    fn compute_counts_statuses_and_progress() {
        let mut active = Project::new("Website", "M1", 0);
        active.id = "P1".to_string();
        let mut paused = Project::new("Mobile", "M1", 0);
        paused.id = "P2".to_string();
        paused.status = ProjectStatus::OnHold;

        let users = vec![
            User::with_id("M1", "m@example.com", UserRole::Manager),
            User::with_id("E1", "e@example.com", UserRole::Employee),
        ];
        let mut t1 = Task::with_id("T1", "Design", "P1", "M1");
        t1.status = TaskStatus::Done;
        let mut t2 = Task::with_id("T2", "Build", "P1", "M1");
        t2.status = TaskStatus::InProgress;

        let summary = DashboardSummary::compute(&[active, paused], &users, &[t1, t2]);
        assert_eq!(summary.active_projects, 1);
        assert_eq!(summary.employees, 2);
        assert_eq!(summary.tasks_in_progress, 1);
        assert_eq!(summary.tasks_done, 1);
        assert_eq!(summary.project_progress[0].percent, 50);
        assert_eq!(summary.project_progress[1].total, 0);
    }
}
