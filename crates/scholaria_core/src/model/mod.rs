//! Domain model for researchers, subjects and findings.
//!
//! # Responsibility
//! - Define the three record types and their reference sets.
//! - Provide the `Entity` contract shared by storage, population and cascade.
//!
//! # Invariants
//! - Every record is identified by a stable `EntityId` that is never reused.
//! - Every entity type holds exactly one reference set per other entity type.
//! - Reference sets keep insertion order and contain no duplicate ids.

pub mod finding;
pub mod researcher;
pub mod subject;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for every stored record.
pub type EntityId = Uuid;

/// JSON object shape handed to the response layer.
///
/// An empty document stands for "not found".
pub type Document = serde_json::Map<String, serde_json::Value>;

/// The three record types known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Researcher,
    Subject,
    Finding,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Researcher, Self::Subject, Self::Finding];

    /// Value persisted in `entity_refs.owner_kind` / `target_kind`.
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Researcher => "researcher",
            Self::Subject => "subject",
            Self::Finding => "finding",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "researcher" => Some(Self::Researcher),
            "subject" => Some(Self::Subject),
            "finding" => Some(Self::Finding),
            _ => None,
        }
    }

    /// Name of the reference-set field that holds ids of this kind.
    pub fn reference_field(self) -> &'static str {
        match self {
            Self::Researcher => "researchers",
            Self::Subject => "subjects",
            Self::Finding => "findings",
        }
    }

    pub fn from_reference_field(field: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.reference_field() == field)
    }

    /// The other two kinds, in declaration order.
    pub fn related(self) -> [EntityKind; 2] {
        match self {
            Self::Researcher => [Self::Subject, Self::Finding],
            Self::Subject => [Self::Researcher, Self::Finding],
            Self::Finding => [Self::Researcher, Self::Subject],
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

/// Contract implemented by every stored record type.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Input body accepted by `create`.
    type New;
    /// Partial replacement accepted by `update`.
    type Patch;

    const KIND: EntityKind;
    /// Projection used by search when the caller supplies none.
    const DEFAULT_FIELDS: &'static [&'static str];

    /// Builds a fresh record with a generated id and equal timestamps.
    fn from_new(body: Self::New, now_ms: i64) -> Self;

    fn id(&self) -> EntityId;
    fn created_date(&self) -> i64;
    fn updated_date(&self) -> i64;

    /// Returns the reference set pointing at `kind`, or `None` for own kind.
    fn references(&self, kind: EntityKind) -> Option<&[EntityId]>;
    fn references_mut(&mut self, kind: EntityKind) -> Option<&mut Vec<EntityId>>;

    /// Applies every supplied patch field and refreshes `updated_date`.
    fn apply_patch(&mut self, patch: Self::Patch, now_ms: i64);

    /// Serializes the record into a response document.
    fn to_document(&self) -> Document {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => Document::new(),
        }
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Collapses duplicate ids while keeping first-seen order.
pub fn dedup_ids(ids: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
    let mut unique = Vec::new();
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
pub(crate) fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{dedup_ids, EntityKind};
    use uuid::Uuid;

    #[test]
    fn kind_roundtrips_through_db_value() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse_db(kind.as_db()), Some(kind));
        }
        assert_eq!(EntityKind::parse_db("paper"), None);
    }

    #[test]
    fn related_kinds_exclude_self() {
        for kind in EntityKind::ALL {
            assert!(!kind.related().contains(&kind));
        }
    }

    #[test]
    fn reference_field_maps_back_to_kind() {
        assert_eq!(
            EntityKind::from_reference_field("findings"),
            Some(EntityKind::Finding)
        );
        assert_eq!(EntityKind::from_reference_field("title"), None);
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids([b, a, b, a]), vec![b, a]);
    }
}
