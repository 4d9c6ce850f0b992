//! Document store boundary for remote-style collections.
//!
//! # Responsibility
//! - Define the storage-agnostic `DocumentStore` contract used by services.
//! - Provide filter/query options and semantic store errors.
//! - Host the typed record boundary and polling subscriptions.
//!
//! # Invariants
//! - Documents are JSON objects addressed by `(collection, id)`.
//! - `createdAt`/`updatedAt` are owned by the store (epoch milliseconds).
//! - Every write or remove that changes a collection bumps its revision.
//! - No transactional or cross-collection ordering is promised to callers.

use crate::db::DbError;
use crate::model::record::{Collection, RecordId, ValidationError};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod records;
pub mod sqlite_store;
pub mod subscription;

pub use records::{
    create_record, fetch_record, fetch_records, patch_record, remove_record, update_record,
};
pub use sqlite_store::SqliteDocumentStore;
pub use subscription::{subscribe, CancelHandle, Subscription};

/// Body key mirroring the insert timestamp.
pub const CREATED_AT_KEY: &str = "createdAt";
/// Body key mirroring the last write timestamp.
pub const UPDATED_AT_KEY: &str = "updatedAt";
/// Reserved key; ids live outside the stored body.
pub const ID_KEY: &str = "id";

pub type StoreResult<T> = Result<T, StoreError>;

/// Error for document store and typed record operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Record failed validation before a write.
    Validation(ValidationError),
    NotFound {
        collection: Collection,
        id: RecordId,
    },
    InvalidFilter(String),
    /// Stored or submitted document does not match its schema.
    InvalidDocument {
        collection: Collection,
        id: RecordId,
        message: String,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} record not found: {id}"),
            Self::InvalidFilter(message) => write!(f, "invalid document filter: {message}"),
            Self::InvalidDocument {
                collection,
                id,
                message,
            } => write!(f, "invalid {collection} document `{id}`: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidFilter(_) | Self::InvalidDocument { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: RecordId,
    /// JSON body without the `id` key.
    pub body: Map<String, Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    /// Body with `id` merged in, the shape typed records decode from.
    pub fn to_value_with_id(&self) -> Value {
        let mut body = self.body.clone();
        body.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        Value::Object(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Condition on one top-level body field (`id` addresses the document id).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    Equals { field: String, value: Value },
    In { field: String, values: Vec<Value> },
}

/// Query options for `DocumentStore::fetch_many`.
///
/// Results are totally ordered: by `order_by` then id, or by creation time
/// then id when no order is requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub conditions: Vec<FieldCondition>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<u32>,
}

impl DocumentFilter {
    /// Matches every document of a collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(FieldCondition::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Matches documents whose field equals any of `values`.
    ///
    /// An empty value list matches nothing.
    pub fn where_in<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(FieldCondition::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Storage contract over named collections of JSON documents.
pub trait DocumentStore {
    /// Lists documents matching `filter`.
    fn fetch_many(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<Document>>;

    /// Gets one document by id.
    fn fetch_one(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// Upserts a document by merging `patch` into its body.
    ///
    /// - `id = None` inserts under a generated id.
    /// - Patch keys overwrite; `null` removes a key; an `id` key is ignored.
    /// - Returns the document id.
    fn write(
        &self,
        collection: Collection,
        id: Option<&str>,
        patch: &Map<String, Value>,
    ) -> StoreResult<RecordId>;

    /// Removes a document. Returns whether anything was removed.
    fn remove(&self, collection: Collection, id: &str) -> StoreResult<bool>;

    /// Monotonic change counter for a collection.
    fn revision(&self, collection: Collection) -> StoreResult<u64>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn fetch_many(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<Document>> {
        (**self).fetch_many(collection, filter)
    }

    fn fetch_one(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        (**self).fetch_one(collection, id)
    }

    fn write(
        &self,
        collection: Collection,
        id: Option<&str>,
        patch: &Map<String, Value>,
    ) -> StoreResult<RecordId> {
        (**self).write(collection, id, patch)
    }

    fn remove(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        (**self).remove(collection, id)
    }

    fn revision(&self, collection: Collection) -> StoreResult<u64> {
        (**self).revision(collection)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Applies merge-patch semantics shared by every store implementation.
pub(crate) fn merge_patch(body: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if key == ID_KEY {
            continue;
        }
        if value.is_null() {
            body.remove(key);
        } else {
            body.insert(key.clone(), value.clone());
        }
    }
}
