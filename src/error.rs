//! Error types for model building.
//!
//! Ambiguities and structural redundancies are *diagnostics*, not errors
//! (see [`diagnostics`](crate::diagnostics)); this module covers the cases
//! where the build itself must fail. The failure is atomic: no partially
//! built model is handed back.

use thiserror::Error;

/// Result type for model-building operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that abort the model-building operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A referenced entity type does not exist in the model.
    #[error("entity type '{0}' not found in the model")]
    EntityTypeNotFound(String),

    /// A property was used on an entity type that does not declare it.
    #[error("property '{property}' does not belong to entity type '{entity_type}'")]
    PropertyNotOnType {
        property: String,
        entity_type: String,
    },

    /// A foreign key's dependent property count does not match the
    /// principal key.
    #[error(
        "foreign key from '{dependent}' to '{principal}' maps {actual} properties \
         to a key of {expected}"
    )]
    ForeignKeyPropertyCountMismatch {
        dependent: String,
        principal: String,
        expected: usize,
        actual: usize,
    },

    /// A dependent property's type cannot represent the principal key
    /// property it is mapped to.
    #[error(
        "property '{property}' on '{dependent}' is incompatible with the key of '{principal}'"
    )]
    IncompatibleForeignKeyProperties {
        dependent: String,
        principal: String,
        property: String,
    },

    /// Two equally authoritative sources configured different property sets
    /// for the same foreign key, and the relationship could not be split.
    #[error(
        "conflicting foreign key property configurations between '{dependent}' and '{principal}'"
    )]
    ConflictingForeignKeyProperties {
        dependent: String,
        principal: String,
    },

    /// An entity type ended up with no primary key at finalization.
    #[error("entity type '{0}' requires a primary key")]
    KeylessEntityType(String),

    /// A foreign key still had no dependent properties at finalization.
    #[error("foreign key from '{dependent}' to '{principal}' has no mapped properties")]
    ForeignKeyPropertiesUndiscovered {
        dependent: String,
        principal: String,
    },

    /// Convention rules kept triggering each other without converging.
    /// A defect in a rule, not a user-facing condition.
    #[error("convention cascade did not converge after {processed} events")]
    ConventionCycle { processed: usize },
}
