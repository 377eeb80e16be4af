//! Per-type entity service.
//!
//! # Responsibility
//! - Provide create/get/search/update/remove for one record type.
//! - Translate "not found" into an empty document at the boundary.
//!
//! # Invariants
//! - `update` always refreshes `updated_date`, whatever the patch holds.
//! - `search` never returns more than the normalized `limit` records.

use crate::config::SearchConfig;
use crate::model::finding::Finding;
use crate::model::researcher::Researcher;
use crate::model::subject::Subject;
use crate::model::{now_epoch_ms, Document, Entity, EntityId};
use crate::query::options::{normalize_search_options, RawSearchParams, SearchOptions};
use crate::repo::entity_repo::{
    EntityRepository, RepoError, ScanQuery, SqlEntity, SqliteEntityRepository,
};
use crate::service::cascade::remove_with_cascade;
use crate::service::error::ServiceResult;
use crate::service::population::PopulationResolver;
use log::{debug, info};
use rusqlite::Connection;
use serde::Serialize;

pub type SubjectService<'conn> = EntityService<'conn, Subject>;
pub type ResearcherService<'conn> = EntityService<'conn, Researcher>;
pub type FindingService<'conn> = EntityService<'conn, Finding>;

/// Search response: the options actually applied plus the result page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub options: SearchOptions,
    pub result: Vec<Document>,
}

/// Service facade for one record type over a migrated connection.
pub struct EntityService<'conn, E: SqlEntity> {
    conn: &'conn Connection,
    repo: SqliteEntityRepository<'conn, E>,
    search: SearchConfig,
}

impl<'conn, E: SqlEntity> EntityService<'conn, E> {
    pub fn try_new(conn: &'conn Connection, search: SearchConfig) -> ServiceResult<Self> {
        Ok(Self {
            conn,
            repo: SqliteEntityRepository::try_new(conn)?,
            search,
        })
    }

    /// Creates a record with a store-assigned id and equal timestamps.
    pub fn create(&self, body: E::New) -> ServiceResult<E> {
        let record = E::from_new(body, now_epoch_ms());
        self.repo.insert(&record)?;
        info!(
            "event=entity_create module=service status=ok kind={} id={}",
            E::KIND,
            record.id()
        );
        Ok(record)
    }

    /// Returns the populated record, or an empty document when absent.
    pub fn get(&self, id: EntityId) -> ServiceResult<Document> {
        match self.repo.get(id)? {
            Some(record) => Ok(self.resolver().populate_one(&record)?),
            None => Ok(Document::new()),
        }
    }

    /// Typed lookup without population.
    pub fn get_record(&self, id: EntityId) -> ServiceResult<Option<E>> {
        Ok(self.repo.get(id)?)
    }

    /// Normalizes raw parameters with this type's default projection, then
    /// searches.
    pub fn search_raw(&self, params: &RawSearchParams) -> ServiceResult<SearchPage> {
        let options = normalize_search_options(params, E::DEFAULT_FIELDS, &self.search);
        self.search(&options)
    }

    /// Runs a bounded, projected, populated search.
    ///
    /// Options are re-normalized first, so hand-built values with `page = 0`
    /// or an oversized `limit` are clamped instead of trusted.
    pub fn search(&self, options: &SearchOptions) -> ServiceResult<SearchPage> {
        let options = normalize_search_options(&options.to_raw(), E::DEFAULT_FIELDS, &self.search);
        let records = self.repo.scan(&ScanQuery {
            filter: options.filter.clone(),
            sort: options.sort.clone(),
            limit: options.limit,
            skip: options.skip(),
        })?;
        let result = self
            .resolver()
            .populate_many(&records, &options.projection())?;

        debug!(
            "event=entity_search module=service status=ok kind={} page={} limit={} returned={}",
            E::KIND,
            options.page,
            options.limit,
            result.len()
        );
        Ok(SearchPage { options, result })
    }

    /// Applies `patch`, refreshes `updated_date` and returns the populated
    /// record, or an empty document when absent.
    pub fn update(&self, id: EntityId, patch: E::Patch) -> ServiceResult<Document> {
        let updated = match self.repo.update(id, patch, now_epoch_ms()) {
            Ok(record) => record,
            Err(RepoError::NotFound(..)) => return Ok(Document::new()),
            Err(err) => return Err(err.into()),
        };
        info!(
            "event=entity_update module=service status=ok kind={} id={id}",
            E::KIND
        );
        Ok(self.resolver().populate_one(&updated)?)
    }

    /// Deletes the record and prunes its neighbours' back-references.
    ///
    /// Returns the pre-deletion body, or an empty document when absent.
    pub fn remove(&self, id: EntityId) -> ServiceResult<Document> {
        Ok(remove_with_cascade::<E>(self.conn, id)?
            .map(|record| record.to_document())
            .unwrap_or_default())
    }

    fn resolver(&self) -> PopulationResolver<'conn> {
        PopulationResolver::new(self.conn)
    }
}
