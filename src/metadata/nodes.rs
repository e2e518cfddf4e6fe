//! Node types of the metadata graph.
//!
//! Nodes reference each other by arena id only; the owning
//! [`Model`](super::Model) maintains the membership vectors and name
//! indexes. Membership vectors preserve insertion order, which is the
//! deterministic tie-break order for convention rules.

use std::collections::HashSet;

use crate::classifier::ScalarType;

use super::arena::{
    EntityTypeId, ForeignKeyId, IndexId, KeyId, NavigationId, PropertyId, SkipNavigationId,
};
use super::provenance::ConfigurationSource;

/// One mapped structural type, or a shared synthetic type with no backing
/// structural type (used for many-to-many join entities).
#[derive(Debug, Clone)]
pub struct EntityTypeNode {
    /// Identity name, unique within the model.
    pub name: String,
    /// Backing structural type name; `None` for shared synthetic types.
    pub backing_type: Option<String>,
    /// Single-inheritance base type.
    pub base_type: Option<EntityTypeId>,
    /// Whether the type's lifetime is owned by a principal.
    pub owned: bool,
    pub source: ConfigurationSource,

    /// Declared properties, in insertion order.
    pub properties: Vec<PropertyId>,
    pub keys: Vec<KeyId>,
    pub primary_key: Option<KeyId>,
    /// Foreign keys declared on this type (this type is the dependent).
    pub foreign_keys: Vec<ForeignKeyId>,
    /// Foreign keys pointing at this type (this type is the principal).
    pub referencing_foreign_keys: Vec<ForeignKeyId>,
    pub navigations: Vec<NavigationId>,
    pub skip_navigations: Vec<SkipNavigationId>,
    pub indexes: Vec<IndexId>,

    /// Member names the caller told inference to leave alone.
    pub ignored_members: HashSet<String>,
}

/// How a property's value is produced on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueGeneration {
    Never,
    OnAdd,
}

/// A scalar-valued member of an entity type.
#[derive(Debug, Clone)]
pub struct PropertyNode {
    pub name: String,
    pub entity_type: EntityTypeId,
    pub value_type: ScalarType,
    pub nullable: bool,
    /// Synthesized by inference rather than backed by a structural member.
    pub shadow: bool,
    pub value_generation: ValueGeneration,
    pub source: ConfigurationSource,
    /// Provenance of the nullability fact alone; rules only re-derive
    /// nullability while this stays at convention level.
    pub nullability_source: Option<ConfigurationSource>,
}

/// An ordered, non-empty, unique property set on one entity type.
#[derive(Debug, Clone)]
pub struct KeyNode {
    pub entity_type: EntityTypeId,
    pub properties: Vec<PropertyId>,
    pub source: ConfigurationSource,
}

/// A directed relationship from a dependent property set to a principal key.
///
/// Sub-attributes carry independent provenance so a rule with authority over
/// one of them cannot clobber another configured with higher authority.
#[derive(Debug, Clone)]
pub struct ForeignKeyNode {
    pub dependent: EntityTypeId,
    pub principal: EntityTypeId,
    /// Dependent-side properties; empty while discovery is still pending.
    pub properties: Vec<PropertyId>,
    /// The principal key the properties map to, once discovered.
    pub principal_key: Option<KeyId>,
    /// One-to-one when true, one-to-many otherwise.
    pub unique: bool,
    pub required: bool,
    pub ownership: bool,
    /// Navigation on the dependent type pointing at the principal.
    pub dependent_navigation: Option<NavigationId>,
    /// Navigation on the principal type pointing at the dependent.
    pub principal_navigation: Option<NavigationId>,

    pub source: ConfigurationSource,
    pub properties_source: Option<ConfigurationSource>,
    pub principal_end_source: Option<ConfigurationSource>,
    pub unique_source: Option<ConfigurationSource>,
    pub required_source: Option<ConfigurationSource>,
    pub ownership_source: Option<ConfigurationSource>,
}

/// A reference-shaped member bound to exactly one foreign key.
#[derive(Debug, Clone)]
pub struct NavigationNode {
    pub name: String,
    /// The entity type the navigation is declared on.
    pub declaring: EntityTypeId,
    /// The entity type the navigation points at.
    pub target: EntityTypeId,
    pub foreign_key: ForeignKeyId,
    /// Declared on the dependent side (pointing at the principal) when true.
    pub on_dependent: bool,
    /// Collection-shaped; only ever true on the principal side.
    pub collection: bool,
    pub source: ConfigurationSource,
}

/// A reference-shaped member bound transitively through a join entity type.
#[derive(Debug, Clone)]
pub struct SkipNavigationNode {
    pub name: String,
    pub declaring: EntityTypeId,
    pub target: EntityTypeId,
    /// The skip navigation on the target pointing back, once paired.
    pub inverse: Option<SkipNavigationId>,
    /// The join-entity foreign key whose principal is the declaring type.
    pub foreign_key: Option<ForeignKeyId>,
    /// The synthesized join entity type, once resolved.
    pub join_entity: Option<EntityTypeId>,
    pub collection: bool,
    pub source: ConfigurationSource,
}

/// An index over an ordered property set of one entity type.
#[derive(Debug, Clone)]
pub struct IndexNode {
    pub entity_type: EntityTypeId,
    pub properties: Vec<PropertyId>,
    pub unique: bool,
    pub source: ConfigurationSource,
    pub unique_source: Option<ConfigurationSource>,
}

/// An unresolved relationship-pairing ambiguity, recorded on both
/// participating entity types so a later change can re-open resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguityRecord {
    /// The other entity type of the ambiguous candidate group.
    pub counterpart: EntityTypeId,
    /// The competing member names on the recording type's side.
    pub members: Vec<String>,
}
