//! Convention rules and their registry.
//!
//! Each rule is one unit of inference logic subscribed to one or more
//! event kinds. Subscription is explicit: a rule implements the capability
//! trait for an event kind and is pushed onto the [`ConventionSet`] list
//! for that kind, in the order it should run. Dispatch is a plain loop
//! over the list, no dynamic type inspection.
//!
//! Handlers receive the (possibly replaced) payload from the previous rule
//! and return [`Flow`] to continue or stop propagation. Events for removed
//! objects carry their data by value and have no replacement semantics.

mod cleanup;
mod fk_index;
mod fk_property_discovery;
mod join_entity;
mod key_discovery;
mod property_discovery;
mod relationship_discovery;

pub use cleanup::ModelCleanup;
pub use fk_index::ForeignKeyIndex;
pub use fk_property_discovery::ForeignKeyPropertyDiscovery;
pub use join_entity::JoinEntitySynthesis;
pub use key_discovery::KeyDiscovery;
pub use property_discovery::PropertyDiscovery;
pub use relationship_discovery::RelationshipDiscovery;

use std::rc::Rc;

use crate::dispatch::Flow;
use crate::error::ModelError;
use crate::metadata::{
    EntityTypeId, ForeignKeyId, IndexId, KeyId, ModelBuilder, NavigationId, PropertyId,
    SkipNavigationId,
};

/// Result of one handler invocation.
pub type ConventionResult<T> = Result<Flow<T>, ModelError>;

/// Base trait of every rule; the name shows up in debugging output.
pub trait Convention {
    fn name(&self) -> &'static str;
}

pub trait EntityTypeAddedConvention: Convention {
    fn entity_type_added(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId>;
}

pub trait BaseTypeChangedConvention: Convention {
    fn base_type_changed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId>;
}

pub trait MemberIgnoredConvention: Convention {
    fn member_ignored(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        member: &str,
    ) -> ConventionResult<()>;
}

pub trait PropertyAddedConvention: Convention {
    fn property_added(
        &self,
        builder: &mut ModelBuilder,
        property: PropertyId,
    ) -> ConventionResult<PropertyId>;
}

pub trait PropertyNullabilityChangedConvention: Convention {
    fn property_nullability_changed(
        &self,
        builder: &mut ModelBuilder,
        property: PropertyId,
    ) -> ConventionResult<PropertyId>;
}

pub trait KeyAddedConvention: Convention {
    fn key_added(&self, builder: &mut ModelBuilder, key: KeyId) -> ConventionResult<KeyId>;
}

pub trait KeyRemovedConvention: Convention {
    fn key_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        properties: &[PropertyId],
    ) -> ConventionResult<()>;
}

pub trait PrimaryKeyChangedConvention: Convention {
    fn primary_key_changed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId>;
}

pub trait ForeignKeyAddedConvention: Convention {
    fn foreign_key_added(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId>;
}

pub trait ForeignKeyRemovedConvention: Convention {
    fn foreign_key_removed(
        &self,
        builder: &mut ModelBuilder,
        dependent: EntityTypeId,
        principal: EntityTypeId,
        properties: &[PropertyId],
    ) -> ConventionResult<()>;
}

pub trait ForeignKeyPropertiesChangedConvention: Convention {
    fn foreign_key_properties_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId>;
}

pub trait ForeignKeyUniquenessChangedConvention: Convention {
    fn foreign_key_uniqueness_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId>;
}

pub trait ForeignKeyRequiredChangedConvention: Convention {
    fn foreign_key_required_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId>;
}

pub trait ForeignKeyOwnershipChangedConvention: Convention {
    fn foreign_key_ownership_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId>;
}

pub trait NavigationAddedConvention: Convention {
    fn navigation_added(
        &self,
        builder: &mut ModelBuilder,
        navigation: NavigationId,
    ) -> ConventionResult<NavigationId>;
}

pub trait NavigationRemovedConvention: Convention {
    fn navigation_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        target: EntityTypeId,
        name: &str,
    ) -> ConventionResult<()>;
}

pub trait SkipNavigationAddedConvention: Convention {
    fn skip_navigation_added(
        &self,
        builder: &mut ModelBuilder,
        navigation: SkipNavigationId,
    ) -> ConventionResult<SkipNavigationId>;
}

pub trait SkipNavigationRemovedConvention: Convention {
    fn skip_navigation_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        target: EntityTypeId,
        name: &str,
        join_entity: Option<EntityTypeId>,
    ) -> ConventionResult<()>;
}

pub trait SkipNavigationInverseChangedConvention: Convention {
    fn skip_navigation_inverse_changed(
        &self,
        builder: &mut ModelBuilder,
        navigation: SkipNavigationId,
    ) -> ConventionResult<SkipNavigationId>;
}

pub trait SkipNavigationForeignKeyChangedConvention: Convention {
    fn skip_navigation_foreign_key_changed(
        &self,
        builder: &mut ModelBuilder,
        navigation: SkipNavigationId,
        old_foreign_key: Option<ForeignKeyId>,
    ) -> ConventionResult<SkipNavigationId>;
}

pub trait IndexAddedConvention: Convention {
    fn index_added(&self, builder: &mut ModelBuilder, index: IndexId)
        -> ConventionResult<IndexId>;
}

pub trait IndexRemovedConvention: Convention {
    fn index_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        properties: &[PropertyId],
    ) -> ConventionResult<()>;
}

pub trait ModelFinalizingConvention: Convention {
    fn model_finalizing(&self, builder: &mut ModelBuilder) -> ConventionResult<()>;
}

/// The registry: one ordered rule list per event kind.
#[derive(Default)]
pub struct ConventionSet {
    pub entity_type_added: Vec<Rc<dyn EntityTypeAddedConvention>>,
    pub base_type_changed: Vec<Rc<dyn BaseTypeChangedConvention>>,
    pub member_ignored: Vec<Rc<dyn MemberIgnoredConvention>>,
    pub property_added: Vec<Rc<dyn PropertyAddedConvention>>,
    pub property_nullability_changed: Vec<Rc<dyn PropertyNullabilityChangedConvention>>,
    pub key_added: Vec<Rc<dyn KeyAddedConvention>>,
    pub key_removed: Vec<Rc<dyn KeyRemovedConvention>>,
    pub primary_key_changed: Vec<Rc<dyn PrimaryKeyChangedConvention>>,
    pub foreign_key_added: Vec<Rc<dyn ForeignKeyAddedConvention>>,
    pub foreign_key_removed: Vec<Rc<dyn ForeignKeyRemovedConvention>>,
    pub foreign_key_properties_changed: Vec<Rc<dyn ForeignKeyPropertiesChangedConvention>>,
    pub foreign_key_uniqueness_changed: Vec<Rc<dyn ForeignKeyUniquenessChangedConvention>>,
    pub foreign_key_required_changed: Vec<Rc<dyn ForeignKeyRequiredChangedConvention>>,
    pub foreign_key_ownership_changed: Vec<Rc<dyn ForeignKeyOwnershipChangedConvention>>,
    pub navigation_added: Vec<Rc<dyn NavigationAddedConvention>>,
    pub navigation_removed: Vec<Rc<dyn NavigationRemovedConvention>>,
    pub skip_navigation_added: Vec<Rc<dyn SkipNavigationAddedConvention>>,
    pub skip_navigation_removed: Vec<Rc<dyn SkipNavigationRemovedConvention>>,
    pub skip_navigation_inverse_changed: Vec<Rc<dyn SkipNavigationInverseChangedConvention>>,
    pub skip_navigation_foreign_key_changed:
        Vec<Rc<dyn SkipNavigationForeignKeyChangedConvention>>,
    pub index_added: Vec<Rc<dyn IndexAddedConvention>>,
    pub index_removed: Vec<Rc<dyn IndexRemovedConvention>>,
    pub model_finalizing: Vec<Rc<dyn ModelFinalizingConvention>>,
}

impl ConventionSet {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build the standard rule set in its canonical registration order:
/// property discovery, key discovery, relationship discovery, foreign-key
/// property discovery, index maintenance, join synthesis, cleanup.
pub fn default_conventions() -> ConventionSet {
    let mut set = ConventionSet::new();

    let property_discovery = Rc::new(PropertyDiscovery);
    let key_discovery = Rc::new(KeyDiscovery);
    let relationship_discovery = Rc::new(RelationshipDiscovery);
    let fk_property_discovery = Rc::new(ForeignKeyPropertyDiscovery);
    let fk_index = Rc::new(ForeignKeyIndex);
    let join_entity = Rc::new(JoinEntitySynthesis);
    let cleanup = Rc::new(ModelCleanup);

    set.entity_type_added.push(property_discovery.clone());
    set.entity_type_added.push(key_discovery.clone());
    set.entity_type_added.push(relationship_discovery.clone());

    set.base_type_changed.push(property_discovery);
    set.base_type_changed.push(key_discovery.clone());
    set.base_type_changed.push(relationship_discovery.clone());

    set.member_ignored.push(relationship_discovery.clone());

    set.property_added.push(key_discovery.clone());
    set.property_added.push(fk_property_discovery.clone());

    set.property_nullability_changed
        .push(fk_property_discovery.clone());

    set.key_added.push(fk_index.clone());

    set.key_removed.push(key_discovery.clone());
    set.key_removed.push(fk_index.clone());

    set.primary_key_changed.push(fk_property_discovery.clone());

    set.foreign_key_added.push(key_discovery.clone());
    set.foreign_key_added.push(fk_property_discovery.clone());
    set.foreign_key_added.push(fk_index.clone());

    set.foreign_key_removed.push(relationship_discovery.clone());
    set.foreign_key_removed.push(key_discovery.clone());
    set.foreign_key_removed.push(fk_index.clone());

    set.foreign_key_properties_changed
        .push(fk_property_discovery.clone());
    set.foreign_key_properties_changed.push(key_discovery.clone());
    set.foreign_key_properties_changed.push(fk_index.clone());

    set.foreign_key_uniqueness_changed.push(key_discovery.clone());
    set.foreign_key_uniqueness_changed
        .push(fk_property_discovery.clone());
    set.foreign_key_uniqueness_changed.push(fk_index.clone());

    set.foreign_key_required_changed
        .push(fk_property_discovery.clone());

    set.foreign_key_ownership_changed
        .push(relationship_discovery.clone());
    set.foreign_key_ownership_changed.push(key_discovery);

    set.navigation_added.push(fk_property_discovery);

    set.navigation_removed.push(relationship_discovery);

    set.skip_navigation_added.push(join_entity.clone());
    set.skip_navigation_removed.push(join_entity.clone());
    set.skip_navigation_inverse_changed.push(join_entity.clone());
    set.skip_navigation_foreign_key_changed.push(join_entity);

    set.index_added.push(fk_index.clone());
    set.index_removed.push(fk_index);

    set.model_finalizing.push(cleanup);

    set
}
