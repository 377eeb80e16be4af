//! Finding (paper) record.

use super::{dedup_ids, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published result credited to researchers and filed under subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: EntityId,
    pub title: String,
    /// Serialized as `abstract`, which is a reserved word in Rust.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// ISO-8601 date, e.g. `2017-02-13`.
    pub publication_date: Option<String>,
    #[serde(default)]
    pub researchers: Vec<EntityId>,
    #[serde(default)]
    pub subjects: Vec<EntityId>,
    pub created_date: i64,
    pub updated_date: i64,
}

/// Create body for [`Finding`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFinding {
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub researchers: Vec<EntityId>,
    #[serde(default)]
    pub subjects: Vec<EntityId>,
}

impl NewFinding {
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            abstract_text: abstract_text.into(),
            ..Self::default()
        }
    }
}

/// Update body for [`Finding`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingPatch {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default, deserialize_with = "crate::model::deserialize_some")]
    pub publication_date: Option<Option<String>>,
    pub researchers: Option<Vec<EntityId>>,
    pub subjects: Option<Vec<EntityId>>,
}

impl Entity for Finding {
    type New = NewFinding;
    type Patch = FindingPatch;

    const KIND: EntityKind = EntityKind::Finding;
    const DEFAULT_FIELDS: &'static [&'static str] =
        &["title", "abstract", "created_date", "updated_date"];

    fn from_new(body: NewFinding, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: body.title,
            abstract_text: body.abstract_text,
            publication_date: body.publication_date,
            researchers: dedup_ids(body.researchers),
            subjects: dedup_ids(body.subjects),
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
            EntityKind::Subject => Some(&self.subjects),
            EntityKind::Finding => None,
        }
    }

    fn references_mut(&mut self, kind: EntityKind) -> Option<&mut Vec<EntityId>> {
        match kind {
            EntityKind::Researcher => Some(&mut self.researchers),
            EntityKind::Subject => Some(&mut self.subjects),
            EntityKind::Finding => None,
        }
    }

    fn apply_patch(&mut self, patch: FindingPatch, now_ms: i64) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(abstract_text) = patch.abstract_text {
            self.abstract_text = abstract_text;
        }
        if let Some(publication_date) = patch.publication_date {
            self.publication_date = publication_date;
        }
        if let Some(researchers) = patch.researchers {
            self.researchers = dedup_ids(researchers);
        }
        if let Some(subjects) = patch.subjects {
            self.subjects = dedup_ids(subjects);
        }
        self.updated_date = now_ms;
    }
}
