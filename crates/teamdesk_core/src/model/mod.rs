//! Canonical domain model for users, projects, tasks, attendance and
//! daily reports.
//!
//! # Responsibility
//! - Define the record shapes owned by the document store.
//! - Keep one canonical model per entity; wire names are camelCase.
//!
//! # Invariants
//! - Every persisted record implements `Record` and validates locally.
//! - Cross-record references are ids only and are not enforced here.

pub mod attendance;
pub mod daily_update;
pub mod prioritized;
pub mod project;
pub mod record;
pub mod task;
pub mod user;
