//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define record-store contracts used by the services.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories refuse connections that are not fully migrated.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to DB transport errors.

pub mod entity_repo;
pub mod reference_repo;
mod scan;

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::EntityId;
use entity_repo::{RepoError, RepoResult};
use uuid::Uuid;

fn ensure_connection_ready(conn: &rusqlite::Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<EntityId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
