//! Translation of scan filters and sort keys into SQL.
//!
//! # Invariants
//! - Only whitelisted column names reach the SQL text; values are always bound.
//! - Ordering always ends with `uuid ASC`, so equal sort keys stay deterministic.
//! - `LIMIT ? OFFSET ?` placeholders are appended last; callers bind them.

use crate::model::EntityKind;
use crate::repo::entity_repo::{RepoError, RepoResult, ScanQuery};
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

const TIMESTAMP_COLUMNS: [&str; 2] = ["created_date", "updated_date"];

/// Column addressed by a filter or sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldTarget<'a> {
    Id,
    Column(&'a str),
    References(EntityKind),
    Unknown,
}

fn resolve_field<'a>(kind: EntityKind, columns: &'a [&'a str], field: &str) -> FieldTarget<'a> {
    if field == "id" || field == "_id" {
        return FieldTarget::Id;
    }
    if let Some(column) = columns.iter().find(|column| **column == field) {
        return FieldTarget::Column(column);
    }
    if let Some(column) = TIMESTAMP_COLUMNS.iter().find(|column| **column == field) {
        return FieldTarget::Column(column);
    }
    match EntityKind::from_reference_field(field) {
        Some(target) if target != kind => FieldTarget::References(target),
        _ => FieldTarget::Unknown,
    }
}

/// Builds the `WHERE ... ORDER BY ... LIMIT ? OFFSET ?` tail of a scan.
///
/// Returns the SQL tail and the values bound by the `WHERE` clause.
pub(crate) fn build_scan_sql(
    kind: EntityKind,
    columns: &[&str],
    query: &ScanQuery,
) -> RepoResult<(String, Vec<Value>)> {
    let mut sql = String::from(" WHERE 1 = 1");
    let mut bind_values = Vec::new();

    for (field, value) in &query.filter {
        match resolve_field(kind, columns, field) {
            FieldTarget::Id => {
                let text = value.as_str().ok_or_else(|| {
                    RepoError::InvalidQuery(format!("`{field}` must be compared to a string id"))
                })?;
                sql.push_str(" AND uuid = ?");
                bind_values.push(Value::Text(text.to_string()));
            }
            FieldTarget::Column(column) => match json_to_sql(field, value)? {
                Some(bound) => {
                    sql.push_str(&format!(" AND \"{column}\" = ?"));
                    bind_values.push(bound);
                }
                None => sql.push_str(&format!(" AND \"{column}\" IS NULL")),
            },
            FieldTarget::References(target) => {
                let text = value.as_str().ok_or_else(|| {
                    RepoError::InvalidQuery(format!(
                        "`{field}` must be compared to a single string id"
                    ))
                })?;
                sql.push_str(
                    " AND EXISTS (
                        SELECT 1 FROM entity_refs r
                        WHERE r.owner_kind = ?
                          AND r.owner_uuid = uuid
                          AND r.target_kind = ?
                          AND r.target_uuid = ?
                    )",
                );
                bind_values.push(Value::Text(kind.as_db().to_string()));
                bind_values.push(Value::Text(target.as_db().to_string()));
                bind_values.push(Value::Text(text.to_string()));
            }
            // A field no record carries cannot equal anything.
            FieldTarget::Unknown => sql.push_str(" AND 0 = 1"),
        }
    }

    sql.push_str(" ORDER BY ");
    if let Some(order) = order_term(kind, columns, &query.sort) {
        sql.push_str(&order);
        sql.push_str(", ");
    }
    sql.push_str("uuid ASC LIMIT ? OFFSET ?;");

    Ok((sql, bind_values))
}

fn order_term(kind: EntityKind, columns: &[&str], sort: &str) -> Option<String> {
    let sort = sort.trim();
    let (field, direction) = match sort.strip_prefix('-') {
        Some(field) => (field, "DESC"),
        None => (sort, "ASC"),
    };
    match resolve_field(kind, columns, field) {
        FieldTarget::Column(column) => Some(format!("\"{column}\" {direction}")),
        FieldTarget::Id => Some(format!("uuid {direction}")),
        FieldTarget::References(_) | FieldTarget::Unknown => None,
    }
}

fn json_to_sql(field: &str, value: &JsonValue) -> RepoResult<Option<Value>> {
    match value {
        JsonValue::Null => Ok(None),
        JsonValue::Bool(flag) => Ok(Some(Value::Integer(i64::from(*flag)))),
        JsonValue::String(text) => Ok(Some(Value::Text(text.clone()))),
        JsonValue::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => Ok(Some(Value::Integer(integer))),
            (None, Some(real)) => Ok(Some(Value::Real(real))),
            (None, None) => Err(RepoError::InvalidQuery(format!(
                "`{field}` number {number} is out of range"
            ))),
        },
        JsonValue::Array(_) | JsonValue::Object(_) => Err(RepoError::InvalidQuery(format!(
            "`{field}` supports equality on a single value only"
        ))),
    }
}
