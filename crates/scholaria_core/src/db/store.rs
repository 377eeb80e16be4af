//! Process-wide store handle.
//!
//! # Responsibility
//! - Connect and migrate once at startup, then hand out entity services.
//! - Close the connection explicitly at shutdown.
//!
//! # Invariants
//! - Services borrow the handle; none outlives it.
//! - One handle owns one connection. Parallel workers open one handle each
//!   against the same database file.

use super::{open_db, open_db_in_memory, DbResult};
use crate::config::{ScholariaConfig, SearchConfig};
use crate::repo::entity_repo::SqlEntity;
use crate::service::entity_service::{
    EntityService, FindingService, ResearcherService, SubjectService,
};
use crate::service::error::ServiceResult;
use log::info;
use rusqlite::Connection;
use std::path::Path;

/// Migrated connection plus the search bounds shared by every service.
pub struct Store {
    conn: Connection,
    search: SearchConfig,
}

impl Store {
    /// Opens the configured database file, resolving relative paths against
    /// `base_dir`.
    pub fn open(config: &ScholariaConfig, base_dir: &Path) -> DbResult<Self> {
        let conn = open_db(config.database_path(base_dir))?;
        Ok(Self {
            conn,
            search: config.search.clone(),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory(search: SearchConfig) -> DbResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
            search,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    pub fn service<E: SqlEntity>(&self) -> ServiceResult<EntityService<'_, E>> {
        EntityService::try_new(&self.conn, self.search.clone())
    }

    pub fn subjects(&self) -> ServiceResult<SubjectService<'_>> {
        self.service()
    }

    pub fn researchers(&self) -> ServiceResult<ResearcherService<'_>> {
        self.service()
    }

    pub fn findings(&self) -> ServiceResult<FindingService<'_>> {
        self.service()
    }

    /// Closes the connection, flushing pending work.
    pub fn close(self) -> DbResult<()> {
        self.conn.close().map_err(|(_, err)| err)?;
        info!("event=db_close module=db status=ok");
        Ok(())
    }
}
