//! Editor-facing core for the siglum catalogue's markup system.
//!
//! A document definition describes one kind of rich-text field: the root
//! element its fragments are wrapped in, the XSD schema they must satisfy,
//! and an optional XSLT stylesheet for previews. This crate ties the engine
//! crates together into the surface the editing layer calls:
//!
//! - [`XmlFieldValidator`] validates a field's raw value in one of three
//!   modes (against a definition's schema, as XSD text, as XSLT text) and
//!   reports [`FieldError`]s with positions adjusted for the synthetic
//!   wrapper element.
//! - [`build_catalog`] derives the tag/attribute catalog JSON that drives
//!   editor autocompletion and clickable tag insertion.
//! - [`extract_text`] strips markup from a tagged display value to obtain
//!   its canonical plain-text key.
//! - [`render_preview`] applies a definition's stylesheet to a fragment for
//!   the live preview panel.
//!
//! Entities and the store are re-exported from [`sigla_store`].

pub mod catalog;
pub mod feedback;
pub mod preview;
pub mod text;
pub mod validator;

pub use catalog::{build_catalog, Catalog, CatalogAttribute, CatalogTag};
pub use feedback::{FieldError, FieldErrorKind, FieldKind};
pub use preview::render_preview;
pub use sigla_store::{
    AttributeDefinition, DocumentDefinition, EntityId, MetadataStore, Siglum, SiglumType,
    StoreError, TagDefinition, EMPTY_SCHEMA, SEED_IDENTIFIERS,
};
pub use text::extract_text;
pub use validator::{ValidatorMode, XmlFieldValidator};
