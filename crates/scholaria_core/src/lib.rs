//! Core domain logic for the scholaria research catalogue.
//!
//! Researchers, subjects and findings reference each other many-to-many.
//! This crate owns reference-set consistency on delete and the normalization
//! of client search parameters into bounded queries.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ScholariaConfig, SearchConfig};
pub use db::Store;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::finding::{Finding, FindingPatch, NewFinding};
pub use model::researcher::{NewResearcher, Researcher, ResearcherPatch};
pub use model::subject::{NewSubject, Subject, SubjectPatch};
pub use model::{Document, Entity, EntityId, EntityKind};
pub use query::options::{normalize_search_options, RawSearchParams, SearchOptions};
pub use query::projection::Projection;
pub use repo::entity_repo::{
    EntityRepository, RepoError, RepoResult, ScanQuery, SqlEntity, SqliteEntityRepository,
};
pub use repo::reference_repo::{ReferenceRepository, SqliteReferenceRepository};
pub use service::entity_service::{
    EntityService, FindingService, ResearcherService, SearchPage, SubjectService,
};
pub use service::error::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
