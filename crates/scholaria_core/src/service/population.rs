//! Population resolver.
//!
//! # Responsibility
//! - Replace reference-id arrays in result documents with record bodies.
//!
//! # Invariants
//! - Read-only: never writes to the store.
//! - Ids with no stored record are dropped from the expansion silently.
//! - Expansion is one level deep; populated bodies keep their own id arrays.

use crate::model::finding::Finding;
use crate::model::researcher::Researcher;
use crate::model::subject::Subject;
use crate::model::{dedup_ids, Document, Entity, EntityId, EntityKind};
use crate::query::projection::Projection;
use crate::repo::entity_repo::{EntityRepository, RepoResult, SqlEntity, SqliteEntityRepository};
use rusqlite::Connection;
use serde_json::Value;
use std::collections::HashMap;

/// Expands reference sets into referenced record bodies.
pub struct PopulationResolver<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PopulationResolver<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Builds the populated document for one record.
    pub fn populate_one<E: Entity>(&self, record: &E) -> RepoResult<Document> {
        let mut documents = self.populate_many(std::slice::from_ref(record), &Projection::All)?;
        Ok(documents.pop().unwrap_or_default())
    }

    /// Builds projected, populated documents for `records`, preserving order.
    ///
    /// Only reference fields kept by `projection` are resolved; each
    /// referenced record is fetched once per call.
    pub fn populate_many<E: Entity>(
        &self,
        records: &[E],
        projection: &Projection,
    ) -> RepoResult<Vec<Document>> {
        let mut bodies: HashMap<EntityKind, HashMap<EntityId, Value>> = HashMap::new();
        for kind in E::KIND.related() {
            if !projection.includes(kind.reference_field()) {
                continue;
            }
            let wanted = dedup_ids(
                records
                    .iter()
                    .flat_map(|record| record.references(kind).unwrap_or_default())
                    .copied(),
            );
            bodies.insert(kind, self.fetch_bodies(kind, &wanted)?);
        }

        let documents = records
            .iter()
            .map(|record| {
                let mut document = projection.apply(record.to_document());
                for (kind, fetched) in &bodies {
                    let expanded = record
                        .references(*kind)
                        .unwrap_or_default()
                        .iter()
                        .filter_map(|id| fetched.get(id).cloned())
                        .collect();
                    document.insert(kind.reference_field().to_string(), Value::Array(expanded));
                }
                document
            })
            .collect();
        Ok(documents)
    }

    fn fetch_bodies(
        &self,
        kind: EntityKind,
        ids: &[EntityId],
    ) -> RepoResult<HashMap<EntityId, Value>> {
        match kind {
            EntityKind::Researcher => self.fetch::<Researcher>(ids),
            EntityKind::Subject => self.fetch::<Subject>(ids),
            EntityKind::Finding => self.fetch::<Finding>(ids),
        }
    }

    fn fetch<E: SqlEntity>(&self, ids: &[EntityId]) -> RepoResult<HashMap<EntityId, Value>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let repo = SqliteEntityRepository::<E>::try_new(self.conn)?;
        Ok(repo
            .get_many(ids)?
            .into_iter()
            .map(|record| (record.id(), Value::Object(record.to_document())))
            .collect())
    }
}
