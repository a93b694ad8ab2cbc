//! The in-process transactional store.
//!
//! Every public mutation acquires the write lock once, performs all of its
//! checks, and only then touches the tables — one atomic unit per
//! operation, nothing half-committed. Optimistic locking is a plain version
//! comparison: a merge based on a stale version is a typed
//! [`StoreError::Conflict`], never a silent overwrite, and the store never
//! retries on the caller's behalf. Uniqueness is enforced here, inside the
//! same critical section as the insert, so editor-side pre-checks stay a
//! courtesy rather than the safety mechanism.

use crate::entity::{
    AttributeDefinition, DocumentDefinition, EntityId, Siglum, TagDefinition,
};
use crate::error::StoreError;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Document definitions the application requires at startup; `initialize`
/// seeds them when missing.
pub const SEED_IDENTIFIERS: [&str; 2] = ["fontMarkup", "siglumTextMarkup"];

const DOCUMENT: &str = "document definition";
const TAG: &str = "tag definition";
const ATTRIBUTE: &str = "attribute definition";
const SIGLUM: &str = "siglum";

#[derive(Debug, Default)]
struct Tables {
    documents: BTreeMap<EntityId, DocumentDefinition>,
    tags: BTreeMap<EntityId, TagDefinition>,
    attributes: BTreeMap<EntityId, AttributeDefinition>,
    sigla: BTreeMap<EntityId, Siglum>,
    next_id: EntityId,
}

impl Tables {
    fn allocate(&mut self) -> EntityId {
        self.next_id += 1;
        self.next_id
    }
}

/// The process-wide store for metadata and siglum records.
#[derive(Debug, Default)]
pub struct MetadataStore {
    inner: RwLock<Tables>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the required document definitions, once each. Calling this any
    /// number of times never duplicates an identifier; an existing row is
    /// left untouched.
    pub fn initialize(&self) {
        for identifier in SEED_IDENTIFIERS {
            let mut tables = self.write();
            if tables.documents.values().any(|d| d.identifier == identifier) {
                continue;
            }
            let mut definition = DocumentDefinition::new(identifier, "document");
            let id = tables.allocate();
            definition.id = Some(id);
            tables.documents.insert(id, definition);
            log::debug!("seeded document definition '{identifier}'");
        }
    }

    // --- document definitions ---

    pub fn persist_document(
        &self,
        definition: &mut DocumentDefinition,
    ) -> Result<(), StoreError> {
        let mut tables = self.write();
        if definition.id.is_some() {
            return Err(StoreError::AlreadyPersistent { entity: DOCUMENT });
        }
        if tables
            .documents
            .values()
            .any(|d| d.identifier == definition.identifier)
        {
            return Err(StoreError::NotUnique {
                entity: DOCUMENT,
                field: "identifier",
                value: definition.identifier.clone(),
            });
        }
        let id = tables.allocate();
        definition.id = Some(id);
        definition.version = 0;
        tables.documents.insert(id, definition.clone());
        Ok(())
    }

    pub fn merge_document(
        &self,
        definition: &DocumentDefinition,
    ) -> Result<DocumentDefinition, StoreError> {
        let mut tables = self.write();
        let id = persistent_id(definition.id, DOCUMENT)?;
        let current = tables
            .documents
            .get(&id)
            .ok_or(StoreError::Unresolvable { entity: DOCUMENT, id })?;
        if current.version != definition.version {
            return Err(StoreError::Conflict {
                entity: DOCUMENT,
                expected: definition.version,
                actual: current.version,
            });
        }
        if tables
            .documents
            .values()
            .any(|d| d.id != definition.id && d.identifier == definition.identifier)
        {
            return Err(StoreError::NotUnique {
                entity: DOCUMENT,
                field: "identifier",
                value: definition.identifier.clone(),
            });
        }
        let mut updated = definition.clone();
        updated.version += 1;
        tables.documents.insert(id, updated.clone());
        Ok(updated)
    }

    /// Removes a document definition and, child-first within the same
    /// atomic unit, every tag and attribute definition under it.
    pub fn remove_document(&self, definition: &DocumentDefinition) -> Result<(), StoreError> {
        let mut tables = self.write();
        let id = persistent_id(definition.id, DOCUMENT)?;
        if !tables.documents.contains_key(&id) {
            return Err(StoreError::Unresolvable { entity: DOCUMENT, id });
        }
        let tag_ids: Vec<EntityId> = tables
            .tags
            .values()
            .filter(|t| t.document_id == id)
            .filter_map(|t| t.id)
            .collect();
        tables
            .attributes
            .retain(|_, a| !tag_ids.contains(&a.tag_id));
        tables.tags.retain(|_, t| t.document_id != id);
        tables.documents.remove(&id);
        Ok(())
    }

    pub fn find_document_by_id(&self, id: EntityId) -> Option<DocumentDefinition> {
        self.read().documents.get(&id).cloned()
    }

    pub fn find_document_by_identifier(&self, identifier: &str) -> Option<DocumentDefinition> {
        self.read()
            .documents
            .values()
            .find(|d| d.identifier == identifier)
            .cloned()
    }

    /// All document definitions, ordered by identifier.
    pub fn find_all_documents(&self) -> Vec<DocumentDefinition> {
        let mut documents: Vec<_> = self.read().documents.values().cloned().collect();
        documents.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        documents
    }

    pub fn find_first_document(&self) -> Option<DocumentDefinition> {
        self.find_all_documents().into_iter().next()
    }

    // --- tag definitions ---

    pub fn persist_tag(&self, tag: &mut TagDefinition) -> Result<(), StoreError> {
        let mut tables = self.write();
        if tag.id.is_some() {
            return Err(StoreError::AlreadyPersistent { entity: TAG });
        }
        if !tables.documents.contains_key(&tag.document_id) {
            return Err(StoreError::MissingParent {
                entity: TAG,
                parent_id: tag.document_id,
            });
        }
        if tables
            .tags
            .values()
            .any(|t| t.document_id == tag.document_id && t.name == tag.name)
        {
            return Err(StoreError::NotUnique {
                entity: TAG,
                field: "name",
                value: tag.name.clone(),
            });
        }
        let id = tables.allocate();
        tag.id = Some(id);
        tag.version = 0;
        tables.tags.insert(id, tag.clone());
        Ok(())
    }

    pub fn merge_tag(&self, tag: &TagDefinition) -> Result<TagDefinition, StoreError> {
        let mut tables = self.write();
        let id = persistent_id(tag.id, TAG)?;
        let current = tables
            .tags
            .get(&id)
            .ok_or(StoreError::Unresolvable { entity: TAG, id })?;
        if current.version != tag.version {
            return Err(StoreError::Conflict {
                entity: TAG,
                expected: tag.version,
                actual: current.version,
            });
        }
        if !tables.documents.contains_key(&tag.document_id) {
            return Err(StoreError::MissingParent {
                entity: TAG,
                parent_id: tag.document_id,
            });
        }
        if tables
            .tags
            .values()
            .any(|t| t.id != tag.id && t.document_id == tag.document_id && t.name == tag.name)
        {
            return Err(StoreError::NotUnique {
                entity: TAG,
                field: "name",
                value: tag.name.clone(),
            });
        }
        let mut updated = tag.clone();
        updated.version += 1;
        tables.tags.insert(id, updated.clone());
        Ok(updated)
    }

    /// Removes a tag definition and, child-first, its attribute
    /// definitions.
    pub fn remove_tag(&self, tag: &TagDefinition) -> Result<(), StoreError> {
        let mut tables = self.write();
        let id = persistent_id(tag.id, TAG)?;
        if !tables.tags.contains_key(&id) {
            return Err(StoreError::Unresolvable { entity: TAG, id });
        }
        tables.attributes.retain(|_, a| a.tag_id != id);
        tables.tags.remove(&id);
        Ok(())
    }

    pub fn find_tag_by_id(&self, id: EntityId) -> Option<TagDefinition> {
        self.read().tags.get(&id).cloned()
    }

    /// Tag definitions of a document definition, ordered by name. A
    /// transient parent has no children yet.
    pub fn find_tags(&self, definition: &DocumentDefinition) -> Vec<TagDefinition> {
        let Some(document_id) = definition.id else {
            return Vec::new();
        };
        let mut tags: Vec<_> = self
            .read()
            .tags
            .values()
            .filter(|t| t.document_id == document_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    pub fn find_first_tag(&self, definition: &DocumentDefinition) -> Option<TagDefinition> {
        self.find_tags(definition).into_iter().next()
    }

    // --- attribute definitions ---

    pub fn persist_attribute(&self, attribute: &mut AttributeDefinition) -> Result<(), StoreError> {
        let mut tables = self.write();
        if attribute.id.is_some() {
            return Err(StoreError::AlreadyPersistent { entity: ATTRIBUTE });
        }
        if !tables.tags.contains_key(&attribute.tag_id) {
            return Err(StoreError::MissingParent {
                entity: ATTRIBUTE,
                parent_id: attribute.tag_id,
            });
        }
        if tables
            .attributes
            .values()
            .any(|a| a.tag_id == attribute.tag_id && a.name == attribute.name)
        {
            return Err(StoreError::NotUnique {
                entity: ATTRIBUTE,
                field: "name",
                value: attribute.name.clone(),
            });
        }
        let id = tables.allocate();
        attribute.id = Some(id);
        attribute.version = 0;
        tables.attributes.insert(id, attribute.clone());
        Ok(())
    }

    pub fn merge_attribute(
        &self,
        attribute: &AttributeDefinition,
    ) -> Result<AttributeDefinition, StoreError> {
        let mut tables = self.write();
        let id = persistent_id(attribute.id, ATTRIBUTE)?;
        let current = tables
            .attributes
            .get(&id)
            .ok_or(StoreError::Unresolvable {
                entity: ATTRIBUTE,
                id,
            })?;
        if current.version != attribute.version {
            return Err(StoreError::Conflict {
                entity: ATTRIBUTE,
                expected: attribute.version,
                actual: current.version,
            });
        }
        if !tables.tags.contains_key(&attribute.tag_id) {
            return Err(StoreError::MissingParent {
                entity: ATTRIBUTE,
                parent_id: attribute.tag_id,
            });
        }
        if tables.attributes.values().any(|a| {
            a.id != attribute.id && a.tag_id == attribute.tag_id && a.name == attribute.name
        }) {
            return Err(StoreError::NotUnique {
                entity: ATTRIBUTE,
                field: "name",
                value: attribute.name.clone(),
            });
        }
        let mut updated = attribute.clone();
        updated.version += 1;
        tables.attributes.insert(id, updated.clone());
        Ok(updated)
    }

    pub fn remove_attribute(&self, attribute: &AttributeDefinition) -> Result<(), StoreError> {
        let mut tables = self.write();
        let id = persistent_id(attribute.id, ATTRIBUTE)?;
        if tables.attributes.remove(&id).is_none() {
            return Err(StoreError::Unresolvable {
                entity: ATTRIBUTE,
                id,
            });
        }
        Ok(())
    }

    pub fn find_attribute_by_id(&self, id: EntityId) -> Option<AttributeDefinition> {
        self.read().attributes.get(&id).cloned()
    }

    /// Attribute definitions of a tag definition, ordered by name.
    pub fn find_attributes(&self, tag: &TagDefinition) -> Vec<AttributeDefinition> {
        let Some(tag_id) = tag.id else {
            return Vec::new();
        };
        let mut attributes: Vec<_> = self
            .read()
            .attributes
            .values()
            .filter(|a| a.tag_id == tag_id)
            .cloned()
            .collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));
        attributes
    }

    pub fn find_first_attribute(&self, tag: &TagDefinition) -> Option<AttributeDefinition> {
        self.find_attributes(tag).into_iter().next()
    }

    // --- sigla ---

    pub fn persist_siglum(&self, siglum: &mut Siglum) -> Result<(), StoreError> {
        let mut tables = self.write();
        if siglum.id.is_some() {
            return Err(StoreError::AlreadyPersistent { entity: SIGLUM });
        }
        if tables.sigla.values().any(|s| s.name == siglum.name) {
            return Err(StoreError::NotUnique {
                entity: SIGLUM,
                field: "name",
                value: siglum.name.clone(),
            });
        }
        let id = tables.allocate();
        siglum.id = Some(id);
        siglum.version = 0;
        tables.sigla.insert(id, siglum.clone());
        Ok(())
    }

    pub fn merge_siglum(&self, siglum: &Siglum) -> Result<Siglum, StoreError> {
        let mut tables = self.write();
        let id = persistent_id(siglum.id, SIGLUM)?;
        let current = tables
            .sigla
            .get(&id)
            .ok_or(StoreError::Unresolvable { entity: SIGLUM, id })?;
        if current.version != siglum.version {
            return Err(StoreError::Conflict {
                entity: SIGLUM,
                expected: siglum.version,
                actual: current.version,
            });
        }
        if tables
            .sigla
            .values()
            .any(|s| s.id != siglum.id && s.name == siglum.name)
        {
            return Err(StoreError::NotUnique {
                entity: SIGLUM,
                field: "name",
                value: siglum.name.clone(),
            });
        }
        let mut updated = siglum.clone();
        updated.version += 1;
        tables.sigla.insert(id, updated.clone());
        Ok(updated)
    }

    pub fn remove_siglum(&self, siglum: &Siglum) -> Result<(), StoreError> {
        let mut tables = self.write();
        let id = persistent_id(siglum.id, SIGLUM)?;
        if tables.sigla.remove(&id).is_none() {
            return Err(StoreError::Unresolvable { entity: SIGLUM, id });
        }
        Ok(())
    }

    pub fn find_siglum_by_id(&self, id: EntityId) -> Option<Siglum> {
        self.read().sigla.get(&id).cloned()
    }

    pub fn find_siglum_by_name(&self, name: &str) -> Option<Siglum> {
        self.read()
            .sigla
            .values()
            .find(|s| s.name == name)
            .cloned()
    }

    /// All sigla, ordered by name.
    pub fn find_all_sigla(&self) -> Vec<Siglum> {
        let mut sigla: Vec<_> = self.read().sigla.values().cloned().collect();
        sigla.sort_by(|a, b| a.name.cmp(&b.name));
        sigla
    }

    // Mutations check everything before touching the tables, so the data a
    // poisoned lock guards is still consistent; recover instead of
    // propagating the panic.
    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn persistent_id(id: Option<EntityId>, entity: &'static str) -> Result<EntityId, StoreError> {
    id.ok_or(StoreError::Transient { entity })
}
