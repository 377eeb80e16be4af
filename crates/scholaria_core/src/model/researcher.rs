//! Researcher record.

use super::{dedup_ids, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Person credited on findings and attached to subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Researcher {
    pub id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub institution: Option<String>,
    /// External ORCID identifier, e.g. `0000-0002-1825-0097`.
    pub orcid_id: Option<String>,
    #[serde(default)]
    pub subjects: Vec<EntityId>,
    #[serde(default)]
    pub findings: Vec<EntityId>,
    pub created_date: i64,
    pub updated_date: i64,
}

/// Create body for [`Researcher`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResearcher {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub orcid_id: Option<String>,
    #[serde(default)]
    pub subjects: Vec<EntityId>,
    #[serde(default)]
    pub findings: Vec<EntityId>,
}

impl NewResearcher {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }
}

/// Update body for [`Researcher`]. `None` leaves a field untouched.
///
/// `institution` and `orcid_id` are nullable, so `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearcherPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "crate::model::deserialize_some")]
    pub institution: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::model::deserialize_some")]
    pub orcid_id: Option<Option<String>>,
    pub subjects: Option<Vec<EntityId>>,
    pub findings: Option<Vec<EntityId>>,
}

impl Entity for Researcher {
    type New = NewResearcher;
    type Patch = ResearcherPatch;

    const KIND: EntityKind = EntityKind::Researcher;
    const DEFAULT_FIELDS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "institution",
        "orcid_id",
        "created_date",
        "updated_date",
    ];

    fn from_new(body: NewResearcher, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: body.first_name,
            last_name: body.last_name,
            institution: body.institution,
            orcid_id: body.orcid_id,
            subjects: dedup_ids(body.subjects),
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
            EntityKind::Subject => Some(&self.subjects),
            EntityKind::Finding => Some(&self.findings),
            EntityKind::Researcher => None,
        }
    }

    fn references_mut(&mut self, kind: EntityKind) -> Option<&mut Vec<EntityId>> {
        match kind {
            EntityKind::Subject => Some(&mut self.subjects),
            EntityKind::Finding => Some(&mut self.findings),
            EntityKind::Researcher => None,
        }
    }

    fn apply_patch(&mut self, patch: ResearcherPatch, now_ms: i64) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(institution) = patch.institution {
            self.institution = institution;
        }
        if let Some(orcid_id) = patch.orcid_id {
            self.orcid_id = orcid_id;
        }
        if let Some(subjects) = patch.subjects {
            self.subjects = dedup_ids(subjects);
        }
        if let Some(findings) = patch.findings {
            self.findings = dedup_ids(findings);
        }
        self.updated_date = now_ms;
    }
}
