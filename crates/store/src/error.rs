use crate::entity::EntityId;
use thiserror::Error;

/// Failures a store operation can surface. Conflicts and uniqueness
/// violations are typed so the editing layer can prompt a reload or attach
/// a field-level message instead of showing a generic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(
        "optimistic lock conflict on {entity}: edit is based on version {expected}, store holds version {actual}"
    )]
    Conflict {
        entity: &'static str,
        expected: u64,
        actual: u64,
    },

    #[error("{entity} {field} '{value}' is already in use")]
    NotUnique {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("cannot resolve {entity} with id {id}; it may have been deleted")]
    Unresolvable { entity: &'static str, id: EntityId },

    #[error("{entity} refers to a parent row with id {parent_id} that does not exist")]
    MissingParent {
        entity: &'static str,
        parent_id: EntityId,
    },

    #[error("{entity} is transient; persist it first")]
    Transient { entity: &'static str },

    #[error("{entity} is already persistent; merge changes instead of persisting again")]
    AlreadyPersistent { entity: &'static str },
}
