//! Core domain logic for TeamDesk.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod prioritize;
pub mod service;
pub mod store;

pub use config::{AppConfig, ConfigError, GenerationConfig, LoggingConfig, StorageConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::attendance::{Attendance, AttendanceStatus};
pub use model::daily_update::DailyUpdate;
pub use model::prioritized::{NewPriority, PrioritizedTask};
pub use model::project::{Project, ProjectStatus};
pub use model::record::{Collection, Record, RecordId, ValidationError};
pub use model::task::{Task, TaskPriority, TaskStatus};
pub use model::user::{User, UserRole};
pub use prioritize::{
    GenerationError, GenerationService, InvalidResponseError, OpenAiCompatibleGenerator,
    PrioritizationRequest, PrioritizeError, Prioritizer,
};
pub use service::{ServiceError, ServiceResult};
pub use store::{DocumentFilter, DocumentStore, SqliteDocumentStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
