//! Field projection applied to result documents.

use crate::model::Document;

/// Field selection parsed from the comma-joined `fields` option.
///
/// The record `id` is always kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Only(Vec<String>),
}

impl Projection {
    pub fn parse(fields: &str) -> Self {
        let selected = fields
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(|field| if field == "_id" { "id" } else { field })
            .map(str::to_string)
            .collect::<Vec<_>>();
        if selected.is_empty() {
            Self::All
        } else {
            Self::Only(selected)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn includes(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(fields) => field == "id" || fields.iter().any(|kept| kept == field),
        }
    }

    /// Drops every field the projection does not include.
    pub fn apply(&self, mut document: Document) -> Document {
        if let Self::Only(_) = self {
            document.retain(|field, _| self.includes(field));
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::Projection;
    use serde_json::json;

    #[test]
    fn id_survives_every_projection() {
        let projection = Projection::parse("name");
        let document = json!({"id": "1", "name": "Toxicology", "field_of_study": "x"})
            .as_object()
            .cloned()
            .unwrap();

        let projected = projection.apply(document);
        assert_eq!(projected.len(), 2);
        assert!(projected.contains_key("id"));
        assert!(!projected.contains_key("field_of_study"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let projection = Projection::parse("nope, name");
        assert!(projection.includes("name"));
        assert!(!projection.includes("researchers"));
    }

    #[test]
    fn blank_list_selects_all() {
        assert!(Projection::parse("").is_all());
        assert!(Projection::parse(" ,, ").is_all());
    }
}
