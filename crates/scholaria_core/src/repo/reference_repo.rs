//! Reference-set persistence shared by all record types.
//!
//! # Responsibility
//! - Store each record's reference sets as rows in `entity_refs`.
//! - Provide the bulk pull used by the delete cascade.
//!
//! # Invariants
//! - Each side of a relationship owns its own rows; writing one side never
//!   touches the other.
//! - A reference set is read back in the order it was written.

use crate::model::{EntityId, EntityKind};
use crate::repo::entity_repo::RepoResult;
use crate::repo::{ensure_connection_ready, parse_uuid};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;

/// Upper bound on ids bound into one `IN (...)` list.
pub(crate) const ID_CHUNK_SIZE: usize = 500;

/// Repository interface for cross-record reference maintenance.
pub trait ReferenceRepository {
    /// Removes `target_id` from the `target_kind` reference set of every
    /// `owner_kind` record listed in `owner_ids`.
    ///
    /// Returns the number of reference rows removed.
    fn pull_reference(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[EntityId],
        target_kind: EntityKind,
        target_id: EntityId,
    ) -> RepoResult<usize>;

    /// Lists owners of `owner_kind` whose reference set contains `target_id`.
    fn referrers(
        &self,
        owner_kind: EntityKind,
        target_kind: EntityKind,
        target_id: EntityId,
    ) -> RepoResult<Vec<EntityId>>;
}

/// SQLite-backed reference repository.
pub struct SqliteReferenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReferenceRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ReferenceRepository for SqliteReferenceRepository<'_> {
    fn pull_reference(
        &self,
        owner_kind: EntityKind,
        owner_ids: &[EntityId],
        target_kind: EntityKind,
        target_id: EntityId,
    ) -> RepoResult<usize> {
        let mut removed = 0;
        for chunk in owner_ids.chunks(ID_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "DELETE FROM entity_refs
                 WHERE owner_kind = ?
                   AND target_kind = ?
                   AND target_uuid = ?
                   AND owner_uuid IN ({placeholders});"
            );

            let mut bind_values = vec![
                Value::Text(owner_kind.as_db().to_string()),
                Value::Text(target_kind.as_db().to_string()),
                Value::Text(target_id.to_string()),
            ];
            bind_values.extend(chunk.iter().map(|id| Value::Text(id.to_string())));
            removed += self.conn.execute(&sql, params_from_iter(bind_values))?;
        }
        Ok(removed)
    }

    fn referrers(
        &self,
        owner_kind: EntityKind,
        target_kind: EntityKind,
        target_id: EntityId,
    ) -> RepoResult<Vec<EntityId>> {
        let mut stmt = self.conn.prepare(
            "SELECT owner_uuid
             FROM entity_refs
             WHERE owner_kind = ?1
               AND target_kind = ?2
               AND target_uuid = ?3
             ORDER BY owner_uuid ASC;",
        )?;
        let mut rows = stmt.query(params![
            owner_kind.as_db(),
            target_kind.as_db(),
            target_id.to_string()
        ])?;
        let mut owners = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            owners.push(parse_uuid(&value, "entity_refs.owner_uuid")?);
        }
        Ok(owners)
    }
}

/// Reads one reference set in write order.
pub(crate) fn load_reference_set(
    conn: &Connection,
    owner_kind: EntityKind,
    owner_id: EntityId,
    target_kind: EntityKind,
) -> RepoResult<Vec<EntityId>> {
    let mut stmt = conn.prepare(
        "SELECT target_uuid
         FROM entity_refs
         WHERE owner_kind = ?1
           AND owner_uuid = ?2
           AND target_kind = ?3
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query(params![
        owner_kind.as_db(),
        owner_id.to_string(),
        target_kind.as_db()
    ])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "entity_refs.target_uuid")?);
    }
    Ok(ids)
}

/// Reads the `target_kind` reference sets of many owners at once, each in
/// write order. Owners with an empty set have no entry.
pub(crate) fn load_reference_sets(
    conn: &Connection,
    owner_kind: EntityKind,
    owner_ids: &[EntityId],
    target_kind: EntityKind,
) -> RepoResult<HashMap<EntityId, Vec<EntityId>>> {
    let mut sets: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
    for chunk in owner_ids.chunks(ID_CHUNK_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT owner_uuid, target_uuid
             FROM entity_refs
             WHERE owner_kind = ?
               AND target_kind = ?
               AND owner_uuid IN ({placeholders})
             ORDER BY owner_uuid ASC, position ASC;"
        );

        let mut bind_values = vec![
            Value::Text(owner_kind.as_db().to_string()),
            Value::Text(target_kind.as_db().to_string()),
        ];
        bind_values.extend(chunk.iter().map(|id| Value::Text(id.to_string())));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        while let Some(row) = rows.next()? {
            let owner: String = row.get(0)?;
            let target: String = row.get(1)?;
            sets.entry(parse_uuid(&owner, "entity_refs.owner_uuid")?)
                .or_default()
                .push(parse_uuid(&target, "entity_refs.target_uuid")?);
        }
    }
    Ok(sets)
}

/// Replaces one reference set. Callers run this inside the record's
/// transaction; duplicate ids keep their first position.
pub(crate) fn replace_reference_set(
    conn: &Connection,
    owner_kind: EntityKind,
    owner_id: EntityId,
    target_kind: EntityKind,
    ids: &[EntityId],
) -> RepoResult<()> {
    let owner = owner_id.to_string();
    conn.execute(
        "DELETE FROM entity_refs
         WHERE owner_kind = ?1 AND owner_uuid = ?2 AND target_kind = ?3;",
        params![owner_kind.as_db(), owner.as_str(), target_kind.as_db()],
    )?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO entity_refs
            (owner_kind, owner_uuid, target_kind, target_uuid, position)
         VALUES (?1, ?2, ?3, ?4, ?5);",
    )?;
    for (position, id) in ids.iter().enumerate() {
        stmt.execute(params![
            owner_kind.as_db(),
            owner.as_str(),
            target_kind.as_db(),
            id.to_string(),
            i64::try_from(position).unwrap_or(i64::MAX)
        ])?;
    }
    Ok(())
}

/// Removes every reference row owned by one record.
pub(crate) fn delete_owned_rows(
    conn: &Connection,
    owner_kind: EntityKind,
    owner_id: EntityId,
) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM entity_refs WHERE owner_kind = ?1 AND owner_uuid = ?2;",
        params![owner_kind.as_db(), owner_id.to_string()],
    )?;
    Ok(removed)
}
