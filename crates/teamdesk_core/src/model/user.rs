//! User (employee) domain model.
//!
//! # Responsibility
//! - Define the canonical user record shared by directory and prompt views.
//!
//! # Invariants
//! - `email` has a `local@domain.tld` shape.
//! - `hourly_rate`, when set, is finite and non-negative.
//! - A user never reports to themself. Whether the manager exists and holds a
//!   managing role is a caller-side check (see `UserService`).

use crate::model::record::{
    new_record_id, require_not_blank, require_optional_not_blank, Collection, Record, RecordId,
    ValidationError, ValidationResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile")
});

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Employee,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    /// Whether users of this role may be a reporting manager.
    pub fn can_manage(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

/// Canonical user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub reporting_manager_id: Option<RecordId>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub created_at: i64,
}

impl User {
    pub fn new(email: impl Into<String>, role: UserRole) -> Self {
        Self::with_id(new_record_id(), email, role)
    }

    pub fn with_id(id: impl Into<RecordId>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: None,
            photo_url: None,
            role,
            department: None,
            reporting_manager_id: None,
            hourly_rate: None,
            created_at: 0,
        }
    }

    /// Human-facing name: display name when set, email otherwise.
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.as_str(),
        }
    }
}

impl Record for User {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> ValidationResult {
        require_not_blank(Self::COLLECTION, "id", &self.id)?;
        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            return Err(ValidationError::new(
                Self::COLLECTION,
                "email",
                format!("is not a valid address: `{}`", self.email),
            ));
        }
        require_optional_not_blank(
            Self::COLLECTION,
            "reportingManagerId",
            self.reporting_manager_id.as_deref(),
        )?;
        if self.reporting_manager_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::new(
                Self::COLLECTION,
                "reportingManagerId",
                "must not reference the user itself",
            ));
        }
        if let Some(rate) = self.hourly_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ValidationError::new(
                    Self::COLLECTION,
                    "hourlyRate",
                    "must be a non-negative number",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserRole};
    use crate::model::record::Record;

    #[test]
    fn name_falls_back_to_email() {
        let mut user = User::with_id("E1", "alice@example.com", UserRole::Manager);
        assert_eq!(user.name(), "alice@example.com");
        user.display_name = Some("Alice Johnson".to_string());
        assert_eq!(user.name(), "Alice Johnson");
    }

    #[test]
    fn validate_rejects_bad_email_and_rate() {
        let mut user = User::with_id("E1", "not-an-email", UserRole::Employee);
        assert_eq!(user.validate().unwrap_err().field, "email");

        user.email = "bob@example.com".to_string();
        user.hourly_rate = Some(-5.0);
        assert_eq!(user.validate().unwrap_err().field, "hourlyRate");
    }

    #[test]
    fn validate_rejects_self_reporting() {
        let mut user = User::with_id("E1", "bob@example.com", UserRole::Manager);
        user.reporting_manager_id = Some("E1".to_string());
        assert_eq!(user.validate().unwrap_err().field, "reportingManagerId");
    }

    #[test]
    fn only_admin_and_manager_can_manage() {
        assert!(UserRole::Admin.can_manage());
        assert!(UserRole::Manager.can_manage());
        assert!(!UserRole::Employee.can_manage());
    }
}
