//! `teamdesk` command-line front end.
//!
//! # Responsibility
//! - Wire configuration, logging and storage into core use-cases.
//! - Render results as plain text; errors are reported verbatim.

mod demo;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teamdesk_core::config::AppConfig;
use teamdesk_core::db::open_db;
use teamdesk_core::prioritize::{OpenAiCompatibleGenerator, Prioritizer};
use teamdesk_core::service::dashboard::load_dashboard;
use teamdesk_core::service::project_service::ProjectService;
use teamdesk_core::service::task_service::{TaskListQuery, TaskService};
use teamdesk_core::service::user_service::{Directory, UserService};
use teamdesk_core::store::{now_epoch_ms, SqliteDocumentStore};
use teamdesk_core::{core_version, init_from_config, ping, ConfigError};

const DEFAULT_CONFIG_FILE: &str = "teamdesk.toml";

/// teamdesk - team, project and task tracking with AI prioritization
#[derive(Parser, Debug)]
#[command(name = "teamdesk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides `storage.db_path`)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Absolute log directory (overrides `logging.dir`)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check core linkage
    Ping,

    /// Load the demo dataset
    Seed,

    /// Show project, people and task counts
    Dashboard,

    /// List tasks, newest first
    Tasks {
        /// Only tasks of this project
        #[arg(long)]
        project: Option<String>,
    },

    /// Ask the generation service to re-prioritize open tasks
    Prioritize {
        /// Persist the suggested priorities
        #[arg(long)]
        apply: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(log_dir) = cli.log_dir {
        config.logging.dir = Some(log_dir);
    }
    init_from_config(&config.logging).map_err(anyhow::Error::msg)?;

    if let Commands::Ping = cli.command {
        println!("teamdesk_core ping={}", ping());
        println!("teamdesk_core version={}", core_version());
        return Ok(());
    }

    let db_path = cli.db.unwrap_or_else(|| config.storage.db_path.clone());
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;
    let store = SqliteDocumentStore::new(&conn);

    match cli.command {
        Commands::Ping => {}
        Commands::Seed => {
            let counts = demo::seed(&store, now_epoch_ms(), chrono::Local::now().date_naive())?;
            println!(
                "seeded users={} projects={} tasks={} attendance={} daily_updates={}",
                counts.users,
                counts.projects,
                counts.tasks,
                counts.attendance,
                counts.daily_updates
            );
        }
        Commands::Dashboard => print_dashboard(&store)?,
        Commands::Tasks { project } => print_tasks(&store, project)?,
        Commands::Prioritize { apply } => prioritize(&store, &config, apply).await?,
    }

    Ok(())
}

/// Explicit paths must exist; the default file is optional.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None => match AppConfig::load(DEFAULT_CONFIG_FILE) {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(AppConfig::default()),
            Err(err) => Err(err.into()),
        },
    }
}

fn print_dashboard(store: &SqliteDocumentStore<'_>) -> Result<()> {
    let summary = load_dashboard(store)?;
    let projects = ProjectService::new(store);

    println!("active projects:   {}", summary.active_projects);
    println!("employees:         {}", summary.employees);
    println!("tasks in progress: {}", summary.tasks_in_progress);
    println!("tasks done:        {}", summary.tasks_done);
    for progress in &summary.project_progress {
        let name = projects
            .get_project(&progress.project_id)?
            .map(|project| project.name)
            .unwrap_or_else(|| progress.project_id.clone());
        println!(
            "  {name}: {}/{} done ({}%)",
            progress.completed, progress.total, progress.percent
        );
    }
    Ok(())
}

fn print_tasks(store: &SqliteDocumentStore<'_>, project: Option<String>) -> Result<()> {
    let tasks = TaskService::new(store).list_tasks(&TaskListQuery {
        project_id: project,
        ..TaskListQuery::default()
    })?;
    let directory = Directory::load(store)?;

    if tasks.is_empty() {
        println!("no tasks");
    }
    for task in &tasks {
        println!(
            "{:<10} {:<12} {:<7} {}  ({})",
            task.id,
            task.status.as_str(),
            task.priority.as_str(),
            task.title,
            directory.assignee_label(task.assignee_id.as_deref())
        );
    }
    Ok(())
}

async fn prioritize(
    store: &SqliteDocumentStore<'_>,
    config: &AppConfig,
    apply: bool,
) -> Result<()> {
    let tasks_service = TaskService::new(store);
    let tasks = tasks_service.list_tasks(&TaskListQuery::default())?;
    let users = UserService::new(store).list_users()?;

    let generator = OpenAiCompatibleGenerator::new(config.generation.clone())?;
    let prioritizer = Prioritizer::new(Arc::new(generator));
    let prioritized = prioritizer
        .prioritize_at(&tasks, &users, now_epoch_ms())
        .await?;

    if prioritized.is_empty() {
        println!("no open tasks to prioritize");
        return Ok(());
    }
    for entry in &prioritized {
        println!(
            "{:<8} {} -> {}  {}",
            entry.new_priority.as_str(),
            entry.task.priority.as_str(),
            entry.new_priority.to_task_priority().as_str(),
            entry.task.title
        );
        println!("         {}", entry.justification);
    }

    if apply {
        let updated = tasks_service.apply_priority_suggestions(&prioritized)?;
        println!("updated {updated} task(s)");
    }
    Ok(())
}
