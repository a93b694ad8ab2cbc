//! Entity types.
//!
//! Identity is the UUID, assigned unconditionally at construction; two
//! values compare equal exactly when their UUIDs match, so a transient copy
//! and its persisted counterpart are the same logical entity. The storage
//! id is an opaque surrogate the store assigns on persist, and the version
//! counter backs optimistic locking — both are managed by the store, never
//! by callers.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Storage-assigned surrogate key.
pub type EntityId = u32;

/// One logical kind of rich-text field: its wrapping root element, its XSD
/// schema text, and an optional XSLT stylesheet for previews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDefinition {
    pub id: Option<EntityId>,
    pub(crate) uuid: Uuid,
    pub(crate) version: u64,
    pub identifier: String,
    pub root_element: String,
    pub schema: String,
    pub xsl: Option<String>,
}

impl DocumentDefinition {
    pub fn new(identifier: impl Into<String>, root_element: impl Into<String>) -> Self {
        DocumentDefinition {
            id: None,
            uuid: Uuid::new_v4(),
            version: 0,
            identifier: identifier.into(),
            root_element: root_element.into(),
            schema: crate::EMPTY_SCHEMA.to_string(),
            xsl: None,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }
}

impl PartialEq for DocumentDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for DocumentDefinition {}

impl Hash for DocumentDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// One insertable XML tag available within a parent document definition's
/// fragments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDefinition {
    pub id: Option<EntityId>,
    pub(crate) uuid: Uuid,
    pub(crate) version: u64,
    pub document_id: EntityId,
    pub name: String,
    pub self_closing: bool,
}

impl TagDefinition {
    pub fn new(document_id: EntityId, name: impl Into<String>) -> Self {
        TagDefinition {
            id: None,
            uuid: Uuid::new_v4(),
            version: 0,
            document_id,
            name: name.into(),
            self_closing: false,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }
}

impl PartialEq for TagDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for TagDefinition {}

impl Hash for TagDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// One attribute usable on a parent tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: Option<EntityId>,
    pub(crate) uuid: Uuid,
    pub(crate) version: u64,
    pub tag_id: EntityId,
    pub name: String,
    pub required: bool,
}

impl AttributeDefinition {
    pub fn new(tag_id: EntityId, name: impl Into<String>) -> Self {
        AttributeDefinition {
            id: None,
            uuid: Uuid::new_v4(),
            version: 0,
            tag_id,
            name: name.into(),
            required: false,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }
}

impl PartialEq for AttributeDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for AttributeDefinition {}

impl Hash for AttributeDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// A bibliographic siglum. The plain `name` is the canonical lookup key,
/// derived from the markup-annotated `tagged_name` before persisting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Siglum {
    pub id: Option<EntityId>,
    pub(crate) uuid: Uuid,
    pub(crate) version: u64,
    pub name: String,
    pub tagged_name: String,
    pub text: Option<String>,
    pub siglum_type: SiglumType,
}

impl Siglum {
    pub fn new(
        name: impl Into<String>,
        tagged_name: impl Into<String>,
        siglum_type: SiglumType,
    ) -> Self {
        Siglum {
            id: None,
            uuid: Uuid::new_v4(),
            version: 0,
            name: name.into(),
            tagged_name: tagged_name.into(),
            text: None,
            siglum_type,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }
}

impl PartialEq for Siglum {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for Siglum {}

impl Hash for Siglum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// Source class of a siglum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiglumType {
    Primary,
    Secondary,
    Tertiary,
}

impl std::fmt::Display for SiglumType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SiglumType::Primary => "PRIMARY",
            SiglumType::Secondary => "SECONDARY",
            SiglumType::Tertiary => "TERTIARY",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_uuid_not_by_fields() {
        let a = DocumentDefinition::new("fontMarkup", "document");
        let mut b = a.clone();
        b.identifier = "renamed".to_string();
        assert_eq!(a, b);

        let c = DocumentDefinition::new("fontMarkup", "document");
        assert_ne!(a, c);
    }

    #[test]
    fn uuid_is_assigned_at_construction() {
        let tag = TagDefinition::new(1, "b");
        assert!(!tag.uuid().is_nil());
        assert!(tag.is_transient());
        assert_eq!(tag.version(), 0);
    }

    #[test]
    fn new_definition_starts_with_the_empty_schema() {
        let definition = DocumentDefinition::new("siglumTextMarkup", "document");
        assert_eq!(definition.schema, crate::EMPTY_SCHEMA);
        assert!(definition.xsl.is_none());
    }

    #[test]
    fn siglum_type_serializes_screaming() {
        let json = serde_json::to_string(&SiglumType::Primary).unwrap();
        assert_eq!(json, "\"PRIMARY\"");
    }
}
