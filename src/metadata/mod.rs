//! The metadata graph: the mutable schema-shaped object model.
//!
//! Nodes live in generational arenas ([`arena`]) and reference each other
//! by typed id. All edits flow through [`Model`]'s edit API (raising
//! events) behind [`ModelBuilder`]'s provenance gate.

pub mod arena;
pub mod builder;
pub mod graph;
pub mod nodes;
pub mod provenance;
pub mod snapshot;

pub use arena::{
    Arena, ArenaId, EntityTypeId, ForeignKeyId, IndexId, KeyId, NavigationId, PropertyId,
    SkipNavigationId,
};
pub use builder::ModelBuilder;
pub use graph::Model;
pub use nodes::{
    AmbiguityRecord, EntityTypeNode, ForeignKeyNode, IndexNode, KeyNode, NavigationNode,
    PropertyNode, SkipNavigationNode, ValueGeneration,
};
pub use provenance::ConfigurationSource;
pub use snapshot::{
    EntityTypeSnapshot, ForeignKeySnapshot, IndexSnapshot, ModelSnapshot, PropertySnapshot,
    SkipNavigationSnapshot,
};
