//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate typed store calls into use-case level APIs.
//! - Keep front ends decoupled from storage details.
//!
//! # Invariants
//! - Services are generic over `DocumentStore` and never bypass record
//!   validation.
//! - Acting user ids, dates and clock values are explicit arguments.

pub mod attendance_service;
pub mod dashboard;
pub mod project_service;
pub mod report_service;
pub mod task_service;
pub mod user_service;

use crate::model::record::{Collection, RecordId};
use crate::model::user::User;
use crate::store::{fetch_record, DocumentStore, StoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for use-case operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Persistence or record validation failure.
    Store(StoreError),
    /// Caller input rejected before touching storage.
    InvalidInput(String),
    /// Input points at a record that does not exist or has the wrong shape.
    InvalidReference {
        collection: Collection,
        id: RecordId,
        reason: &'static str,
    },
    /// A batch write stopped part way; `applied` records were already
    /// written and stay written.
    PartiallyApplied { applied: usize, source: StoreError },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidReference {
                collection,
                id,
                reason,
            } => write!(f, "invalid reference to {collection} `{id}`: {reason}"),
            Self::PartiallyApplied { applied, source } => {
                write!(f, "stopped after {applied} update(s): {source}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) | Self::PartiallyApplied { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Loads a user that `input` refers to, or fails with `InvalidReference`.
pub(crate) fn require_user<S: DocumentStore>(store: &S, id: &str) -> ServiceResult<User> {
    fetch_record::<User, S>(store, id)?.ok_or_else(|| ServiceError::InvalidReference {
        collection: Collection::Users,
        id: id.to_string(),
        reason: "user does not exist",
    })
}

/// Trims `value` and rejects it when shorter than `min_chars`.
pub(crate) fn require_min_chars(
    field: &str,
    value: &str,
    min_chars: usize,
) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < min_chars {
        return Err(ServiceError::InvalidInput(format!(
            "{field} must be at least {min_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
