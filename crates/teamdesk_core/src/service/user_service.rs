//! User directory use-cases.
//!
//! # Responsibility
//! - Register users and maintain reporting lines.
//! - Resolve ids to display labels with soft failure for dangling references.

use crate::model::record::{Collection, RecordId};
use crate::model::user::{User, UserRole};
use crate::service::{optional_text, require_min_chars, require_user, ServiceError, ServiceResult};
use crate::store::{
    create_record, fetch_record, fetch_records, patch_record, DocumentFilter, DocumentStore,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const UNASSIGNED_LABEL: &str = "Unassigned";
pub const UNKNOWN_LABEL: &str = "Unknown";

const MIN_NAME_CHARS: usize = 2;

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    /// Defaults to `employee`.
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub reporting_manager_id: Option<RecordId>,
    pub hourly_rate: Option<f64>,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            role: None,
            department: None,
            reporting_manager_id: None,
            hourly_rate: None,
        }
    }
}

pub struct UserService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a user.
    ///
    /// # Errors
    /// - `InvalidInput` for a duplicate email or a display name under two
    ///   characters.
    /// - `InvalidReference` when the reporting manager is missing or cannot
    ///   manage.
    pub fn register_user(&self, input: &NewUser) -> ServiceResult<User> {
        let email = input.email.trim().to_string();
        let existing: Vec<User> = fetch_records(
            &self.store,
            &DocumentFilter::all().where_eq("email", email.as_str()).limit(1),
        )?;
        if !existing.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "email `{email}` is already registered"
            )));
        }

        let mut user = User::new(email, input.role.unwrap_or(UserRole::Employee));
        user.display_name = match input.display_name.as_deref() {
            Some(name) => Some(require_min_chars("display name", name, MIN_NAME_CHARS)?),
            None => None,
        };
        user.department = optional_text(input.department.as_deref());
        user.hourly_rate = input.hourly_rate;
        if let Some(manager_id) = &input.reporting_manager_id {
            self.require_manager(manager_id)?;
            user.reporting_manager_id = Some(manager_id.clone());
        }

        let id = create_record(&self.store, &user)?;
        require_user(&self.store, &id)
    }

    pub fn get_user(&self, id: &str) -> ServiceResult<Option<User>> {
        Ok(fetch_record(&self.store, id)?)
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(fetch_records(&self.store, &DocumentFilter::all())?)
    }

    /// Employees and managers, ordered by display name.
    pub fn list_employees(&self) -> ServiceResult<Vec<User>> {
        self.list_by_roles(&[UserRole::Employee, UserRole::Manager])
    }

    /// Users eligible as a reporting or project manager.
    pub fn list_manager_candidates(&self) -> ServiceResult<Vec<User>> {
        self.list_by_roles(&[UserRole::Admin, UserRole::Manager])
    }

    /// Sets or clears the reporting manager of `user_id`.
    pub fn set_reporting_manager(
        &self,
        user_id: &str,
        manager_id: Option<&str>,
    ) -> ServiceResult<User> {
        let value = match manager_id {
            Some(manager_id) => {
                self.require_manager(manager_id)?;
                Value::from(manager_id)
            }
            None => Value::Null,
        };
        let mut patch = Map::new();
        patch.insert("reportingManagerId".to_string(), value);
        Ok(patch_record(&self.store, user_id, &patch)?)
    }

    fn list_by_roles(&self, roles: &[UserRole]) -> ServiceResult<Vec<User>> {
        let filter = DocumentFilter::all().where_in("role", roles.iter().map(|role| role.as_str()));
        let mut users: Vec<User> = fetch_records(&self.store, &filter)?;
        users.sort_by(|left, right| {
            left.name()
                .to_lowercase()
                .cmp(&right.name().to_lowercase())
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(users)
    }

    fn require_manager(&self, manager_id: &str) -> ServiceResult<User> {
        let manager = require_user(&self.store, manager_id)?;
        if !manager.role.can_manage() {
            return Err(ServiceError::InvalidReference {
                collection: Collection::Users,
                id: manager_id.to_string(),
                reason: "user cannot be a manager",
            });
        }
        Ok(manager)
    }
}

/// Id-to-name lookup for display.
///
/// Dangling references never fail; they render as `Unknown`.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    names: HashMap<RecordId, String>,
}

impl Directory {
    pub fn new(users: &[User]) -> Self {
        Self {
            names: users
                .iter()
                .map(|user| (user.id.clone(), user.name().to_string()))
                .collect(),
        }
    }

    pub fn load<S: DocumentStore>(store: &S) -> ServiceResult<Self> {
        let users: Vec<User> = fetch_records(store, &DocumentFilter::all())?;
        Ok(Self::new(&users))
    }

    pub fn assignee_label(&self, assignee_id: Option<&str>) -> &str {
        match assignee_id {
            None => UNASSIGNED_LABEL,
            Some(id) => self.user_label(id),
        }
    }

    pub fn user_label(&self, id: &str) -> &str {
        self.names.get(id).map(String::as_str).unwrap_or(UNKNOWN_LABEL)
    }
}
