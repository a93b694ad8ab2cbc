//! Entities and the transactional store behind the markup metadata system.
//!
//! Three metadata entities form a strict ownership tree — document
//! definition → tag definition → attribute definition — and the siglum
//! records they annotate sit beside them. The [`MetadataStore`] gives every
//! mutation one atomic unit with optimistic-lock conflict detection and
//! durable uniqueness checks; retrieval is name-ordered so downstream
//! consumers (catalog building, editors) see deterministic sequences.

pub mod entity;
pub mod error;
pub mod store;

pub use entity::{
    AttributeDefinition, DocumentDefinition, EntityId, Siglum, SiglumType, TagDefinition,
};
pub use error::StoreError;
pub use store::{MetadataStore, SEED_IDENTIFIERS};

/// The placeholder schema newly created document definitions start with: a
/// well-formed XSD that declares nothing, so it admits no markup until an
/// administrator fills it in.
pub const EMPTY_SCHEMA: &str = "<?xml version=\"1.0\"?>\n\
<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\" \
elementFormDefault=\"qualified\" attributeFormDefault=\"unqualified\">\n\n\
</xs:schema>";
