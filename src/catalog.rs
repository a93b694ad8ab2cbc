//! Derives the tag/attribute catalog the browser-side editor consumes.
//!
//! The catalog is pure data derived from the store; ordering comes from the
//! store's name-ordered retrieval and is not re-sorted here. Serialized, it
//! is attached to the editor's markup as a data attribute.

use serde::Serialize;
use sigla_store::{DocumentDefinition, MetadataStore};

/// The catalog for one document definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub identifier: String,
    pub tags: Vec<CatalogTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTag {
    pub name: String,
    pub self_closing: bool,
    pub attributes: Vec<CatalogAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogAttribute {
    pub name: String,
    pub required: bool,
}

impl Catalog {
    /// The serialized form embedded in the editor markup.
    pub fn to_json(&self) -> String {
        // Plain strings and booleans; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Builds the catalog for `definition`. A definition without tags yields an
/// empty `tags` sequence, never null; the same holds for attributes.
pub fn build_catalog(store: &MetadataStore, definition: &DocumentDefinition) -> Catalog {
    let tags = store
        .find_tags(definition)
        .into_iter()
        .map(|tag| {
            let attributes = store
                .find_attributes(&tag)
                .into_iter()
                .map(|attribute| CatalogAttribute {
                    name: attribute.name,
                    required: attribute.required,
                })
                .collect();
            CatalogTag {
                name: tag.name,
                self_closing: tag.self_closing,
                attributes,
            }
        })
        .collect();

    Catalog {
        identifier: definition.identifier.clone(),
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigla_store::{AttributeDefinition, TagDefinition};

    #[test]
    fn catalog_is_alphabetical_regardless_of_insertion_order() {
        let store = MetadataStore::new();
        let mut definition = DocumentDefinition::new("fontMarkup", "document");
        store.persist_document(&mut definition).unwrap();
        let document_id = definition.id.unwrap();

        let mut tag_b = TagDefinition::new(document_id, "b");
        store.persist_tag(&mut tag_b).unwrap();
        let mut tag_a = TagDefinition::new(document_id, "a");
        store.persist_tag(&mut tag_a).unwrap();

        for name in ["z", "y"] {
            let mut attribute = AttributeDefinition::new(tag_b.id.unwrap(), name);
            store.persist_attribute(&mut attribute).unwrap();
        }

        let catalog = build_catalog(&store, &definition);
        assert_eq!(catalog.identifier, "fontMarkup");
        let tag_names: Vec<_> = catalog.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tag_names, ["a", "b"]);
        let attr_names: Vec<_> = catalog.tags[1]
            .attributes
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(attr_names, ["y", "z"]);
    }

    #[test]
    fn empty_definition_yields_empty_tags() {
        let store = MetadataStore::new();
        let mut definition = DocumentDefinition::new("siglumTextMarkup", "document");
        store.persist_document(&mut definition).unwrap();

        let catalog = build_catalog(&store, &definition);
        assert!(catalog.tags.is_empty());
        assert_eq!(
            catalog.to_json(),
            r#"{"identifier":"siglumTextMarkup","tags":[]}"#
        );
    }

    #[test]
    fn serialized_shape_uses_the_wire_keys() {
        let store = MetadataStore::new();
        let mut definition = DocumentDefinition::new("fontMarkup", "document");
        store.persist_document(&mut definition).unwrap();

        let mut tag = TagDefinition::new(definition.id.unwrap(), "br");
        tag.self_closing = true;
        store.persist_tag(&mut tag).unwrap();
        let mut attribute = AttributeDefinition::new(tag.id.unwrap(), "class");
        attribute.required = true;
        store.persist_attribute(&mut attribute).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&build_catalog(&store, &definition).to_json()).unwrap();
        assert_eq!(json["identifier"], "fontMarkup");
        assert_eq!(json["tags"][0]["name"], "br");
        assert_eq!(json["tags"][0]["selfClosing"], true);
        assert_eq!(json["tags"][0]["attributes"][0]["name"], "class");
        assert_eq!(json["tags"][0]["attributes"][0]["required"], true);
    }
}
