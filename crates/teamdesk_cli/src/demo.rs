//! Demo dataset for local exploration.
//!
//! # Invariants
//! - Every record has a fixed id, so re-seeding upserts instead of duplicating.
//! - Dates and deadlines are relative to the caller-supplied `now`.

use chrono::{Days, NaiveDate};
use log::info;
use teamdesk_core::model::attendance::{Attendance, AttendanceStatus};
use teamdesk_core::model::daily_update::DailyUpdate;
use teamdesk_core::model::project::Project;
use teamdesk_core::model::record::RECORD_DATE_FORMAT;
use teamdesk_core::model::task::{Task, TaskPriority, TaskStatus};
use teamdesk_core::model::user::{User, UserRole};
use teamdesk_core::store::{create_record, DocumentStore, StoreResult};

const DAY_MS: i64 = 86_400_000;

/// Number of records written per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedCounts {
    pub users: usize,
    pub projects: usize,
    pub tasks: usize,
    pub attendance: usize,
    pub daily_updates: usize,
}

struct DemoUser {
    id: &'static str,
    name: &'static str,
    email: &'static str,
    role: UserRole,
    department: &'static str,
    manager: Option<&'static str>,
}

const USERS: [DemoUser; 6] = [
    DemoUser {
        id: "E1",
        name: "Alice Johnson",
        email: "alice.j@example.com",
        role: UserRole::Manager,
        department: "Project Management",
        manager: None,
    },
    DemoUser {
        id: "E2",
        name: "Bob Williams",
        email: "bob.w@example.com",
        role: UserRole::Manager,
        department: "Engineering",
        manager: Some("E1"),
    },
    DemoUser {
        id: "E3",
        name: "Charlie Brown",
        email: "charlie.b@example.com",
        role: UserRole::Employee,
        department: "Design",
        manager: Some("E1"),
    },
    DemoUser {
        id: "E4",
        name: "Diana Prince",
        email: "diana.p@example.com",
        role: UserRole::Employee,
        department: "Engineering",
        manager: Some("E2"),
    },
    DemoUser {
        id: "E5",
        name: "Ethan Hunt",
        email: "ethan.h@example.com",
        role: UserRole::Employee,
        department: "Engineering",
        manager: Some("E2"),
    },
    DemoUser {
        id: "E6",
        name: "Fiona Glenanne",
        email: "fiona.g@example.com",
        role: UserRole::Employee,
        department: "Quality Assurance",
        manager: Some("E1"),
    },
];

/// (id, name, description, manager, members)
const PROJECTS: [(&str, &str, &str, &str, &[&str]); 3] = [
    (
        "P1",
        "Website Redesign",
        "Complete overhaul of the corporate website.",
        "E1",
        &["E1", "E2", "E3", "E4"],
    ),
    (
        "P2",
        "Mobile App Launch",
        "Develop and launch the new mobile application.",
        "E1",
        &["E1", "E2", "E5", "E6"],
    ),
    (
        "P3",
        "Internal CRM Tool",
        "Build a new Customer Relationship Management tool.",
        "E2",
        &["E1", "E2", "E4", "E5"],
    ),
];

/// (id, title, description, assignee, project, due in days, priority, status)
type DemoTask = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    i64,
    TaskPriority,
    TaskStatus,
);

const TASKS: [DemoTask; 6] = [
    (
        "T1",
        "Design new homepage mockups",
        "Create high-fidelity mockups for the new homepage design.",
        "E3",
        "P1",
        5,
        TaskPriority::High,
        TaskStatus::InProgress,
    ),
    (
        "T2",
        "Develop homepage component library",
        "Build React components for the new homepage.",
        "E4",
        "P1",
        10,
        TaskPriority::High,
        TaskStatus::Todo,
    ),
    (
        "T3",
        "Set up mobile app backend",
        "Configure server, database, and authentication for the mobile app.",
        "E5",
        "P2",
        3,
        TaskPriority::High,
        TaskStatus::InProgress,
    ),
    (
        "T4",
        "Write E2E tests for login flow",
        "Write end-to-end tests for user authentication.",
        "E6",
        "P2",
        7,
        TaskPriority::Medium,
        TaskStatus::Done,
    ),
    (
        "T5",
        "API for CRM contacts",
        "Develop the CRUD API endpoints for managing contacts.",
        "E5",
        "P3",
        8,
        TaskPriority::Medium,
        TaskStatus::Todo,
    ),
    (
        "T6",
        "Plan project timeline",
        "Create a detailed project plan and timeline for all phases.",
        "E1",
        "P1",
        2,
        TaskPriority::High,
        TaskStatus::Done,
    ),
];

/// (id, user, days ago, content)
const DAILY_UPDATES: [(&str, &str, u64, &str); 4] = [
    (
        "ds1",
        "E2",
        1,
        "Finished setting up the staging server. Started work on the auth middleware.",
    ),
    (
        "ds2",
        "E3",
        1,
        "Completed the wireframes for the user profile page. Shared with the team for feedback.",
    ),
    (
        "ds3",
        "E4",
        1,
        "Refactored the main navigation component to improve accessibility.",
    ),
    (
        "ds4",
        "E1",
        0,
        "Onboarding new team members and planning the next sprint.",
    ),
];

/// Writes the demo dataset into `store`.
pub fn seed<S: DocumentStore>(
    store: &S,
    now_ms: i64,
    today: NaiveDate,
) -> StoreResult<SeedCounts> {
    let mut counts = SeedCounts::default();

    for demo in &USERS {
        let mut user = User::with_id(demo.id, demo.email, demo.role);
        user.display_name = Some(demo.name.to_string());
        user.department = Some(demo.department.to_string());
        user.reporting_manager_id = demo.manager.map(str::to_string);
        create_record(store, &user)?;
        counts.users += 1;
    }

    for (id, name, description, manager, members) in PROJECTS {
        let mut project = Project::new(name, manager, now_ms - 30 * DAY_MS);
        project.id = id.to_string();
        project.description = description.to_string();
        project.members = members.iter().map(|member| member.to_string()).collect();
        create_record(store, &project)?;
        counts.projects += 1;
    }

    for (id, title, description, assignee, project, due_in_days, priority, status) in TASKS {
        let mut task = Task::with_id(id, title, project, "E1");
        task.description = description.to_string();
        task.assignee_id = Some(assignee.to_string());
        task.due_date = Some(now_ms + due_in_days * DAY_MS);
        task.priority = priority;
        task.status = status;
        create_record(store, &task)?;
        counts.tasks += 1;
    }

    let day_start = today
        .and_hms_opt(9, 0, 0)
        .map(|start| start.and_utc().timestamp_millis())
        .unwrap_or(now_ms);
    for demo in &USERS {
        let mut entry = Attendance::new(demo.id, today, day_start, AttendanceStatus::Present);
        entry.id = format!("{}-{}", demo.id, today.format(RECORD_DATE_FORMAT));
        create_record(store, &entry)?;
        counts.attendance += 1;
    }
    for (user_id, days_ago, status) in [
        ("E4", 1, AttendanceStatus::Leave),
        ("E5", 2, AttendanceStatus::Absent),
    ] {
        let Some(day) = today.checked_sub_days(Days::new(days_ago)) else {
            continue;
        };
        let check_in = day_start - (days_ago as i64) * DAY_MS;
        let mut entry = Attendance::new(user_id, day, check_in, status);
        entry.id = format!("{user_id}-{}", day.format(RECORD_DATE_FORMAT));
        create_record(store, &entry)?;
        counts.attendance += 1;
    }

    for (id, user_id, days_ago, content) in DAILY_UPDATES {
        let Some(day) = today.checked_sub_days(Days::new(days_ago)) else {
            continue;
        };
        let date = day.format(RECORD_DATE_FORMAT).to_string();
        let mut update = DailyUpdate::new(user_id, date, content);
        update.id = id.to_string();
        create_record(store, &update)?;
        counts.daily_updates += 1;
    }

    info!(
        "event=seed module=cli status=ok users={} projects={} tasks={} attendance={} updates={}",
        counts.users,
        counts.projects,
        counts.tasks,
        counts.attendance,
        counts.daily_updates
    );
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::seed;
    use chrono::NaiveDate;
    use teamdesk_core::db::{open_db, open_db_in_memory};
    use teamdesk_core::model::task::Task;
    use teamdesk_core::service::dashboard::load_dashboard;
    use teamdesk_core::store::{fetch_records, DocumentFilter, SqliteDocumentStore};

    #[test]
    fn seed_is_repeatable_and_feeds_the_dashboard() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteDocumentStore::new(&conn);
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let first = seed(&store, 1_715_300_000_000, today).unwrap();
        let second = seed(&store, 1_715_300_000_000, today).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.attendance, 8);

        let tasks: Vec<Task> = fetch_records(&store, &DocumentFilter::all()).unwrap();
        assert_eq!(tasks.len(), 6);

        let dashboard = load_dashboard(&store).unwrap();
        assert_eq!(dashboard.active_projects, 3);
        assert_eq!(dashboard.employees, 6);
        assert_eq!(dashboard.tasks_in_progress, 2);
        assert_eq!(dashboard.tasks_done, 2);
    }

    #[test]
    fn seeded_data_survives_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("teamdesk.sqlite3");
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        {
            let conn = open_db(&path).unwrap();
            let store = SqliteDocumentStore::new(&conn);
            seed(&store, 1_715_300_000_000, today).unwrap();
        }

        let conn = open_db(&path).unwrap();
        let store = SqliteDocumentStore::new(&conn);
        let tasks: Vec<Task> = fetch_records(&store, &DocumentFilter::all()).unwrap();
        assert_eq!(tasks.len(), 6);
        assert_eq!(load_dashboard(&store).unwrap().employees, 6);
    }
}
