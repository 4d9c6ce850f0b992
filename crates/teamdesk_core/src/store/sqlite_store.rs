//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist JSON documents per collection in the `documents` table.
//! - Translate `DocumentFilter` into bound `json_extract` queries.
//!
//! # Invariants
//! - Filter field names are validated and bound, never interpolated.
//! - A write and its revision bump commit atomically.
//! - Stored bodies that are not JSON objects are rejected on read.

use crate::model::record::{new_record_id, Collection, RecordId};
use crate::store::{
    merge_patch, now_epoch_ms, Document, DocumentFilter, DocumentStore, FieldCondition,
    SortDirection, StoreError, StoreResult, CREATED_AT_KEY, ID_KEY, UPDATED_AT_KEY,
};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};

const DOCUMENT_SELECT_SQL: &str = "SELECT id, body, created_at, updated_at FROM documents";

static FIELD_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("field pattern must compile"));

/// Document store over a migrated SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    clock: fn() -> i64,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_clock(conn, now_epoch_ms)
    }

    /// Uses `clock` for `createdAt`/`updatedAt` stamps.
    pub fn with_clock(conn: &'conn Connection, clock: fn() -> i64) -> Self {
        Self { conn, clock }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn fetch_many(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<Document>> {
        let mut sql = format!("{DOCUMENT_SELECT_SQL} WHERE collection = ?");
        let mut bind_values = vec![SqlValue::Text(collection.as_str().to_string())];

        for condition in &filter.conditions {
            match condition {
                FieldCondition::Equals { field, value } => {
                    let expr = field_expr(field, &mut bind_values)?;
                    sql.push_str(&format!(" AND {expr} = ?"));
                    bind_values.push(scalar_to_sql(field, value)?);
                }
                FieldCondition::In { field, values } => {
                    if values.is_empty() {
                        validate_field_name(field)?;
                        sql.push_str(" AND 0");
                        continue;
                    }
                    let expr = field_expr(field, &mut bind_values)?;
                    let placeholders = vec!["?"; values.len()].join(", ");
                    sql.push_str(&format!(" AND {expr} IN ({placeholders})"));
                    for value in values {
                        bind_values.push(scalar_to_sql(field, value)?);
                    }
                }
            }
        }

        match &filter.order_by {
            Some(order) => {
                let expr = field_expr(&order.field, &mut bind_values)?;
                let direction = match order.direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                sql.push_str(&format!(" ORDER BY {expr} {direction}, id ASC"));
            }
            None => sql.push_str(" ORDER BY created_at ASC, id ASC"),
        }

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(SqlValue::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(collection, row)?);
        }

        Ok(documents)
    }

    fn fetch_one(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL} WHERE collection = ?1 AND id = ?2;"
        ))?;
        let mut rows = stmt.query(params![collection.as_str(), id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(collection, row)?));
        }

        Ok(None)
    }

    fn write(
        &self,
        collection: Collection,
        id: Option<&str>,
        patch: &Map<String, Value>,
    ) -> StoreResult<RecordId> {
        let id = match id {
            Some(id) if id.trim().is_empty() => {
                return Err(StoreError::InvalidDocument {
                    collection,
                    id: id.to_string(),
                    message: "document id must not be blank".to_string(),
                });
            }
            Some(id) => id.to_string(),
            None => new_record_id(),
        };
        let now = (self.clock)();

        let tx = self.conn.unchecked_transaction()?;
        let existing = tx
            .query_row(
                "SELECT body, created_at FROM documents WHERE collection = ?1 AND id = ?2;",
                params![collection.as_str(), id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        let (mut body, created_at) = match existing {
            Some((text, created_at)) => (parse_body(collection, &id, &text)?, created_at),
            None => (Map::new(), now),
        };
        // Clock skew must never produce updatedAt < createdAt.
        let updated_at = now.max(created_at);

        merge_patch(&mut body, patch);
        body.insert(CREATED_AT_KEY.to_string(), Value::from(created_at));
        body.insert(UPDATED_AT_KEY.to_string(), Value::from(updated_at));

        let body_text =
            serde_json::to_string(&body).map_err(|err| StoreError::InvalidDocument {
                collection,
                id: id.clone(),
                message: err.to_string(),
            })?;

        tx.execute(
            "INSERT INTO documents (collection, id, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (collection, id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at;",
            params![collection.as_str(), id.as_str(), body_text, created_at, updated_at],
        )?;
        bump_revision(&tx, collection)?;
        tx.commit()?;

        Ok(id)
    }

    fn remove(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![collection.as_str(), id],
        )?;
        if changed > 0 {
            bump_revision(&tx, collection)?;
        }
        tx.commit()?;

        Ok(changed > 0)
    }

    fn revision(&self, collection: Collection) -> StoreResult<u64> {
        let revision = self
            .conn
            .query_row(
                "SELECT revision FROM collection_revisions WHERE collection = ?1;",
                [collection.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(revision.map_or(0, |value| u64::try_from(value).unwrap_or(0)))
    }
}

fn bump_revision(conn: &Connection, collection: Collection) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO collection_revisions (collection, revision) VALUES (?1, 1)
         ON CONFLICT (collection) DO UPDATE SET revision = revision + 1;",
        [collection.as_str()],
    )?;
    Ok(())
}

fn validate_field_name(field: &str) -> StoreResult<()> {
    if !FIELD_NAME_PATTERN.is_match(field) {
        return Err(StoreError::InvalidFilter(format!(
            "unsupported field name `{field}`"
        )));
    }
    Ok(())
}

/// Returns the SQL expression addressing `field`, binding its JSON path.
fn field_expr(field: &str, bind_values: &mut Vec<SqlValue>) -> StoreResult<&'static str> {
    validate_field_name(field)?;
    if field == ID_KEY {
        return Ok("id");
    }
    bind_values.push(SqlValue::Text(format!("$.{field}")));
    Ok("json_extract(body, ?)")
}

fn scalar_to_sql(field: &str, value: &Value) -> StoreResult<SqlValue> {
    match value {
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(SqlValue::Integer(integer))
            } else if let Some(real) = number.as_f64() {
                Ok(SqlValue::Real(real))
            } else {
                Err(StoreError::InvalidFilter(format!(
                    "number out of range for field `{field}`"
                )))
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => Err(StoreError::InvalidFilter(
            format!("field `{field}` can only be compared with scalar values"),
        )),
    }
}

fn parse_body(collection: Collection, id: &str, text: &str) -> StoreResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(body)) => Ok(body),
        Ok(_) => Err(StoreError::InvalidDocument {
            collection,
            id: id.to_string(),
            message: "document body is not a JSON object".to_string(),
        }),
        Err(err) => Err(StoreError::InvalidDocument {
            collection,
            id: id.to_string(),
            message: err.to_string(),
        }),
    }
}

fn parse_document_row(collection: Collection, row: &Row<'_>) -> StoreResult<Document> {
    let id: String = row.get("id")?;
    let body_text: String = row.get("body")?;
    let body = parse_body(collection, &id, &body_text)?;

    Ok(Document {
        id,
        body,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
