//! Typed record boundary over `DocumentStore`.
//!
//! # Responsibility
//! - Decode documents into typed records and encode records into patches.
//! - Enforce `Record::validate()` on every read and write.
//!
//! # Invariants
//! - Write paths validate before any mutation.
//! - Read paths reject invalid stored documents instead of masking them.

use crate::model::record::{Record, RecordId};
use crate::store::{
    merge_patch, Document, DocumentFilter, DocumentStore, StoreError, StoreResult, ID_KEY,
};
use serde_json::{Map, Value};

/// Decodes and validates one stored document.
pub fn decode_record<T: Record>(document: &Document) -> StoreResult<T> {
    let invalid = |message: String| StoreError::InvalidDocument {
        collection: T::COLLECTION,
        id: document.id.clone(),
        message,
    };

    let record: T = serde_json::from_value(document.to_value_with_id())
        .map_err(|err| invalid(err.to_string()))?;
    record.validate().map_err(|err| invalid(err.to_string()))?;
    Ok(record)
}

/// Encodes a record into a full-replacement patch (absent optionals as `null`).
pub fn encode_record<T: Record>(record: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(record) {
        Ok(Value::Object(mut body)) => {
            body.remove(ID_KEY);
            Ok(body)
        }
        Ok(_) => Err(StoreError::InvalidDocument {
            collection: T::COLLECTION,
            id: record.id().to_string(),
            message: "record does not serialize to a JSON object".to_string(),
        }),
        Err(err) => Err(StoreError::InvalidDocument {
            collection: T::COLLECTION,
            id: record.id().to_string(),
            message: err.to_string(),
        }),
    }
}

/// Lists typed records matching `filter`.
pub fn fetch_records<T: Record, S: DocumentStore + ?Sized>(
    store: &S,
    filter: &DocumentFilter,
) -> StoreResult<Vec<T>> {
    store
        .fetch_many(T::COLLECTION, filter)?
        .iter()
        .map(decode_record::<T>)
        .collect()
}

/// Gets one typed record by id.
pub fn fetch_record<T: Record, S: DocumentStore + ?Sized>(
    store: &S,
    id: &str,
) -> StoreResult<Option<T>> {
    store
        .fetch_one(T::COLLECTION, id)?
        .map(|document| decode_record::<T>(&document))
        .transpose()
}

/// Persists a new record under its own id.
///
/// Retrying with the same record is safe: the write is an upsert and
/// `createdAt` keeps its first value.
pub fn create_record<T: Record, S: DocumentStore + ?Sized>(
    store: &S,
    record: &T,
) -> StoreResult<RecordId> {
    record.validate()?;
    let body = encode_record(record)?;
    store.write(T::COLLECTION, Some(record.id()), &body)
}

/// Replaces an existing record.
///
/// # Errors
/// - `StoreError::NotFound` when no record has this id.
pub fn update_record<T: Record, S: DocumentStore + ?Sized>(
    store: &S,
    record: &T,
) -> StoreResult<()> {
    record.validate()?;
    if store.fetch_one(T::COLLECTION, record.id())?.is_none() {
        return Err(StoreError::NotFound {
            collection: T::COLLECTION,
            id: record.id().to_string(),
        });
    }
    let body = encode_record(record)?;
    store.write(T::COLLECTION, Some(record.id()), &body)?;
    Ok(())
}

/// Merges `patch` into an existing record and returns the stored result.
///
/// The merged document is decoded and validated before it is written.
pub fn patch_record<T: Record, S: DocumentStore + ?Sized>(
    store: &S,
    id: &str,
    patch: &Map<String, Value>,
) -> StoreResult<T> {
    let not_found = || StoreError::NotFound {
        collection: T::COLLECTION,
        id: id.to_string(),
    };

    let mut merged = store.fetch_one(T::COLLECTION, id)?.ok_or_else(not_found)?;
    merge_patch(&mut merged.body, patch);
    let candidate: T = serde_json::from_value(merged.to_value_with_id()).map_err(|err| {
        StoreError::InvalidDocument {
            collection: T::COLLECTION,
            id: id.to_string(),
            message: err.to_string(),
        }
    })?;
    candidate.validate()?;

    store.write(T::COLLECTION, Some(id), patch)?;
    fetch_record(store, id)?.ok_or_else(not_found)
}

/// Removes a record. Returns whether anything was removed.
pub fn remove_record<T: Record, S: DocumentStore + ?Sized>(
    store: &S,
    id: &str,
) -> StoreResult<bool> {
    store.remove(T::COLLECTION, id)
}
