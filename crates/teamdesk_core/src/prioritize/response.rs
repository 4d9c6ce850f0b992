//! Prioritization response validator.
//!
//! # Responsibility
//! - Turn raw generation output into a typed `PrioritizedTask` list.
//!
//! # Invariants
//! - All-or-nothing: one invalid element rejects the whole response.
//! - Returned tasks carry the submitted task fields unchanged.
//! - Element order is preserved exactly as returned by the service.
//!
//! Coercions are limited to stripping markdown code fences around the payload
//! and case/whitespace-insensitive matching of `newPriority`.

use crate::model::prioritized::{NewPriority, PrioritizedTask};
use crate::model::record::RecordId;
use crate::model::task::Task;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PRIORITIZED_TASKS_KEY: &str = "prioritizedTasks";
const JUSTIFICATION_KEY: &str = "justification";
const NEW_PRIORITY_KEY: &str = "newPriority";

/// Task fields every response element must carry.
pub const REQUIRED_TASK_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "projectId",
    "reporterId",
    "status",
    "priority",
    "createdAt",
    "updatedAt",
];

/// The service answered, but the payload failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidResponseError {
    NotJson { message: String },
    NotAnObject,
    MissingTaskList,
    ElementNotObject { index: usize },
    MissingField { index: usize, field: &'static str },
    InvalidTaskField { index: usize, message: String },
    EmptyJustification { index: usize },
    InvalidJustification { index: usize },
    InvalidPriority { index: usize, value: String },
    UnknownTask { index: usize, id: RecordId },
    DuplicateTask { index: usize, id: RecordId },
    AlteredTask { index: usize, id: RecordId },
}

impl Display for InvalidResponseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotJson { message } => write!(f, "response is not valid JSON: {message}"),
            Self::NotAnObject => write!(f, "response root is not a JSON object"),
            Self::MissingTaskList => {
                write!(f, "response has no `{PRIORITIZED_TASKS_KEY}` array")
            }
            Self::ElementNotObject { index } => {
                write!(f, "prioritized task #{index} is not a JSON object")
            }
            Self::MissingField { index, field } => {
                write!(f, "prioritized task #{index} is missing `{field}`")
            }
            Self::InvalidTaskField { index, message } => {
                write!(f, "prioritized task #{index} has invalid task fields: {message}")
            }
            Self::EmptyJustification { index } => {
                write!(f, "prioritized task #{index} has an empty justification")
            }
            Self::InvalidJustification { index } => {
                write!(f, "prioritized task #{index} has a non-string justification")
            }
            Self::InvalidPriority { index, value } => write!(
                f,
                "prioritized task #{index} has unsupported newPriority `{value}`; expected low|medium|high|critical"
            ),
            Self::UnknownTask { index, id } => {
                write!(f, "prioritized task #{index} references unknown task `{id}`")
            }
            Self::DuplicateTask { index, id } => {
                write!(f, "prioritized task #{index} repeats task `{id}`")
            }
            Self::AlteredTask { index, id } => {
                write!(f, "prioritized task #{index} altered fields of task `{id}`")
            }
        }
    }
}

impl Error for InvalidResponseError {}

/// Validates raw model output against the submitted tasks.
///
/// `submitted` must be the task list actually sent to the service.
pub fn validate_response(
    raw: &str,
    submitted: &[Task],
) -> Result<Vec<PrioritizedTask>, InvalidResponseError> {
    let payload: Value = serde_json::from_str(strip_code_fences(raw)).map_err(|err| {
        InvalidResponseError::NotJson {
            message: err.to_string(),
        }
    })?;
    validate_payload(&payload, submitted)
}

/// Validates an already-parsed response payload.
pub fn validate_payload(
    payload: &Value,
    submitted: &[Task],
) -> Result<Vec<PrioritizedTask>, InvalidResponseError> {
    let root = payload
        .as_object()
        .ok_or(InvalidResponseError::NotAnObject)?;
    let elements = root
        .get(PRIORITIZED_TASKS_KEY)
        .and_then(Value::as_array)
        .ok_or(InvalidResponseError::MissingTaskList)?;

    let submitted_by_id: HashMap<&str, &Task> = submitted
        .iter()
        .map(|task| (task.id.as_str(), task))
        .collect();
    let mut seen: HashSet<RecordId> = HashSet::with_capacity(elements.len());
    let mut prioritized = Vec::with_capacity(elements.len());

    for (index, element) in elements.iter().enumerate() {
        let fields = element
            .as_object()
            .ok_or(InvalidResponseError::ElementNotObject { index })?;
        let entry = validate_element(index, fields)?;

        let original = submitted_by_id
            .get(entry.task.id.as_str())
            .ok_or_else(|| InvalidResponseError::UnknownTask {
                index,
                id: entry.task.id.clone(),
            })?;
        if !seen.insert(entry.task.id.clone()) {
            return Err(InvalidResponseError::DuplicateTask {
                index,
                id: entry.task.id,
            });
        }
        if **original != entry.task {
            return Err(InvalidResponseError::AlteredTask {
                index,
                id: entry.task.id,
            });
        }

        prioritized.push(entry);
    }

    Ok(prioritized)
}

fn validate_element(
    index: usize,
    fields: &Map<String, Value>,
) -> Result<PrioritizedTask, InvalidResponseError> {
    for field in REQUIRED_TASK_FIELDS {
        if !fields.contains_key(*field) {
            return Err(InvalidResponseError::MissingField {
                index,
                field: *field,
            });
        }
    }

    let justification = match fields.get(JUSTIFICATION_KEY) {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        Some(Value::String(_)) => return Err(InvalidResponseError::EmptyJustification { index }),
        Some(_) => return Err(InvalidResponseError::InvalidJustification { index }),
        None => {
            return Err(InvalidResponseError::MissingField {
                index,
                field: JUSTIFICATION_KEY,
            })
        }
    };

    let new_priority = match fields.get(NEW_PRIORITY_KEY) {
        Some(Value::String(text)) => {
            NewPriority::parse(text).ok_or_else(|| InvalidResponseError::InvalidPriority {
                index,
                value: text.clone(),
            })?
        }
        Some(other) => {
            return Err(InvalidResponseError::InvalidPriority {
                index,
                value: other.to_string(),
            })
        }
        None => {
            return Err(InvalidResponseError::MissingField {
                index,
                field: NEW_PRIORITY_KEY,
            })
        }
    };

    let mut task_fields = fields.clone();
    task_fields.remove(JUSTIFICATION_KEY);
    task_fields.remove(NEW_PRIORITY_KEY);
    let task: Task = serde_json::from_value(Value::Object(task_fields)).map_err(|err| {
        InvalidResponseError::InvalidTaskField {
            index,
            message: err.to_string(),
        }
    })?;

    Ok(PrioritizedTask {
        task,
        justification,
        new_priority,
    })
}

/// Strips a surrounding markdown code fence, with optional language tag.
///
/// The tag may be followed by a newline or sit on the same line as the body.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        if let Some(content) = body.trim_end().strip_suffix("```") {
            return content.trim();
        }
    }
    trimmed
}
