//! Service-boundary error kinds.

use crate::model::{EntityId, EntityKind};
use crate::repo::entity_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to callers of entity services.
#[derive(Debug)]
pub enum ServiceError {
    /// The store could not be reached (open, lock, I/O failures).
    StoreUnavailable(RepoError),
    /// The record was deleted but pruning back-references on `step` failed.
    ///
    /// Some `step` records may still list `id`; callers can reconcile.
    PartialCascadeFailure {
        kind: EntityKind,
        id: EntityId,
        step: EntityKind,
        source: RepoError,
    },
    /// Any other store failure, passed through unchanged.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::PartialCascadeFailure {
                kind,
                id,
                step,
                source,
            } => write!(
                f,
                "{kind} {id} was deleted but pruning {} failed: {source}",
                step.reference_field()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::PartialCascadeFailure { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        if value.is_unavailable() {
            Self::StoreUnavailable(value)
        } else {
            Self::Repo(value)
        }
    }
}
