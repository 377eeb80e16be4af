//! Relationship maintainer for deletes.
//!
//! # Responsibility
//! - Delete one record and prune its id from the neighbours it lists.
//!
//! # Invariants
//! - Deleting a missing id is a no-op that returns `None`.
//! - Only neighbours named by the deleted record are visited; records that
//!   list it without being listed back keep their stale reference.
//! - Steps run as independent store calls. A failed pull after the delete
//!   surfaces as `PartialCascadeFailure`; nothing is rolled back.

use crate::model::{Entity, EntityId};
use crate::repo::entity_repo::{EntityRepository, RepoError, SqlEntity, SqliteEntityRepository};
use crate::repo::reference_repo::{ReferenceRepository, SqliteReferenceRepository};
use crate::service::error::{ServiceError, ServiceResult};
use log::{info, warn};
use rusqlite::Connection;
use std::time::Instant;

/// Deletes record `id` of type `E` and prunes back-references to it.
///
/// Returns the record as it was before deletion.
pub fn remove_with_cascade<E: SqlEntity>(
    conn: &Connection,
    id: EntityId,
) -> ServiceResult<Option<E>> {
    let started_at = Instant::now();
    let records = SqliteEntityRepository::<E>::try_new(conn)?;
    let references = SqliteReferenceRepository::try_new(conn)?;

    let Some(target) = records.get(id)? else {
        info!(
            "event=entity_remove module=cascade status=ok kind={} id={id} found=false",
            E::KIND
        );
        return Ok(None);
    };

    match records.delete(id) {
        Ok(_) => {}
        // Lost a race with a concurrent delete; same outcome as absent.
        Err(RepoError::NotFound(..)) => return Ok(None),
        Err(err) => return Err(err.into()),
    }

    let mut pruned = 0;
    for step in E::KIND.related() {
        let neighbours = target.references(step).unwrap_or_default();
        if neighbours.is_empty() {
            continue;
        }
        match references.pull_reference(step, neighbours, E::KIND, id) {
            Ok(removed) => pruned += removed,
            Err(source) => {
                warn!(
                    "event=entity_remove module=cascade status=error kind={} id={id} step={step} error_code=cascade_pull_failed error={source}",
                    E::KIND
                );
                return Err(ServiceError::PartialCascadeFailure {
                    kind: E::KIND,
                    id,
                    step,
                    source,
                });
            }
        }
    }

    info!(
        "event=entity_remove module=cascade status=ok kind={} id={id} found=true pruned={pruned} duration_ms={}",
        E::KIND,
        started_at.elapsed().as_millis()
    );
    Ok(Some(target))
}
