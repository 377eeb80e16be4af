//! Subject record.
//!
//! # Invariants
//! - `created_date == updated_date` right after creation.
//! - `researchers` and `findings` hold ids only; bodies are resolved on read.

use super::{dedup_ids, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Area of study that researchers work on and findings are filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: EntityId,
    pub name: String,
    pub field_of_study: String,
    #[serde(default)]
    pub researchers: Vec<EntityId>,
    #[serde(default)]
    pub findings: Vec<EntityId>,
    /// Unix epoch milliseconds.
    pub created_date: i64,
    /// Unix epoch milliseconds.
    pub updated_date: i64,
}

/// Create body for [`Subject`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub field_of_study: String,
    #[serde(default)]
    pub researchers: Vec<EntityId>,
    #[serde(default)]
    pub findings: Vec<EntityId>,
}

impl NewSubject {
    pub fn new(name: impl Into<String>, field_of_study: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_of_study: field_of_study.into(),
            ..Self::default()
        }
    }
}

/// Update body for [`Subject`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub field_of_study: Option<String>,
    pub researchers: Option<Vec<EntityId>>,
    pub findings: Option<Vec<EntityId>>,
}

impl Entity for Subject {
    type New = NewSubject;
    type Patch = SubjectPatch;

    const KIND: EntityKind = EntityKind::Subject;
    const DEFAULT_FIELDS: &'static [&'static str] =
        &["name", "field_of_study", "created_date", "updated_date"];

    fn from_new(body: NewSubject, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: body.name,
            field_of_study: body.field_of_study,
            researchers: dedup_ids(body.researchers),
            findings: dedup_ids(body.findings),
            created_date: now_ms,
            updated_date: now_ms,
        }
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn created_date(&self) -> i64 {
        self.created_date
    }

    fn updated_date(&self) -> i64 {
        self.updated_date
    }

    fn references(&self, kind: EntityKind) -> Option<&[EntityId]> {
        match kind {
            EntityKind::Researcher => Some(&self.researchers),
            EntityKind::Finding => Some(&self.findings),
            EntityKind::Subject => None,
        }
    }

    fn references_mut(&mut self, kind: EntityKind) -> Option<&mut Vec<EntityId>> {
        match kind {
            EntityKind::Researcher => Some(&mut self.researchers),
            EntityKind::Finding => Some(&mut self.findings),
            EntityKind::Subject => None,
        }
    }

    fn apply_patch(&mut self, patch: SubjectPatch, now_ms: i64) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(field_of_study) = patch.field_of_study {
            self.field_of_study = field_of_study;
        }
        if let Some(researchers) = patch.researchers {
            self.researchers = dedup_ids(researchers);
        }
        if let Some(findings) = patch.findings {
            self.findings = dedup_ids(findings);
        }
        self.updated_date = now_ms;
    }
}
