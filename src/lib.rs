//! # Keystone
//!
//! Convention-based schema inference over structural type descriptions.
//!
//! ## Architecture
//!
//! Keystone builds a relational metadata model from the shapes of the
//! caller's types:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          MemberClassifier (structural types)             │
//! │    (scalar members, references, collections)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [session]
//! ┌─────────────────────────────────────────────────────────┐
//! │      ModelBuilder (provenance-gated mutation)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [event queue]
//! ┌─────────────────────────────────────────────────────────┐
//! │   ConventionDispatcher + discovery rules                 │
//! │   (properties, keys, relationships, FK properties,       │
//! │    indexes, join entities, cleanup)                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [finalize]
//! ┌─────────────────────────────────────────────────────────┐
//! │       Model (entity types, keys, foreign keys)           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod conventions;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod infer;
pub mod metadata;
pub mod naming;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::classifier::{
        DeclaredTypes, MemberClassifier, NavigationMember, ScalarMember, ScalarType,
        TypeDescriptor,
    };
    pub use crate::diagnostics::{CollectingSink, DiagnosticsSink, ModelDiagnostic, NullSink};
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::infer::{build_model, ModelSession};
    pub use crate::metadata::{
        ConfigurationSource, EntityTypeId, ForeignKeyId, IndexId, KeyId, Model, ModelBuilder,
        ModelSnapshot, NavigationId, PropertyId, SkipNavigationId, ValueGeneration,
    };
}

pub use classifier::{DeclaredTypes, ScalarType, TypeDescriptor};
pub use error::{ModelError, ModelResult};
pub use infer::{build_model, ModelSession};
pub use metadata::{ConfigurationSource, Model, ModelBuilder};
