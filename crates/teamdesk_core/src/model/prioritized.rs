//! Transient prioritization result model.
//!
//! # Invariants
//! - A `PrioritizedTask` is never persisted; only its suggested priority may be
//!   applied to the stored task through an explicit user action.
//! - `justification` is non-empty once produced by the response validator.

use crate::model::task::{Task, TaskPriority};
use serde::{Deserialize, Serialize};

/// Priority suggested by the generation service.
///
/// Extends `TaskPriority` with `critical` for tasks blocking teammates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl NewPriority {
    pub const ALL: [NewPriority; 4] = [
        NewPriority::Low,
        NewPriority::Medium,
        NewPriority::High,
        NewPriority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parses a suggested priority, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == normalized)
    }

    /// Stored priority to apply when the user accepts this suggestion.
    ///
    /// `critical` has no stored counterpart and maps to `high`.
    pub fn to_task_priority(self) -> TaskPriority {
        match self {
            Self::Low => TaskPriority::Low,
            Self::Medium => TaskPriority::Medium,
            Self::High | Self::Critical => TaskPriority::High,
        }
    }
}

/// A task annotated with a suggested priority and its justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedTask {
    #[serde(flatten)]
    pub task: Task,
    pub justification: String,
    pub new_priority: NewPriority,
}

impl PrioritizedTask {
    /// Whether applying the suggestion would change the stored priority.
    pub fn changes_priority(&self) -> bool {
        self.new_priority.to_task_priority() != self.task.priority
    }
}

#[cfg(test)]
mod tests {
    use super::{NewPriority, PrioritizedTask};
    use crate::model::task::{Task, TaskPriority};

    #[test]
    fn parse_is_case_insensitive_and_closed() {
        assert_eq!(NewPriority::parse(" Critical "), Some(NewPriority::Critical));
        assert_eq!(NewPriority::parse("HIGH"), Some(NewPriority::High));
        assert_eq!(NewPriority::parse("urgent"), None);
        assert_eq!(NewPriority::parse(""), None);
    }

    #[test]
    fn critical_applies_as_high() {
        assert_eq!(NewPriority::Critical.to_task_priority(), TaskPriority::High);
        assert_eq!(NewPriority::Low.to_task_priority(), TaskPriority::Low);
    }

    #[test]
    fn serializes_flat_with_task_fields() {
        let prioritized = PrioritizedTask {
            task: Task::with_id("T1", "Plan timeline", "P1", "E1"),
            justification: "Deadline in two days".to_string(),
            new_priority: NewPriority::Critical,
        };
        let value = serde_json::to_value(&prioritized).unwrap();
        assert_eq!(value["id"], "T1");
        assert_eq!(value["newPriority"], "critical");
        assert_eq!(value["justification"], "Deadline in two days");
        assert!(prioritized.changes_priority());
    }
}
