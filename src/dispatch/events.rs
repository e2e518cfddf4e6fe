//! Mutation events raised by the metadata graph.
//!
//! Every semantic mutation on [`Model`](crate::metadata::Model) records
//! exactly one event on the graph's FIFO queue. Events for removed objects
//! carry the data later rules need by value, since the id is dead by the
//! time the event is observed.

use crate::metadata::{
    EntityTypeId, ForeignKeyId, IndexId, KeyId, NavigationId, PropertyId, SkipNavigationId,
};

/// One graph mutation, as seen by convention rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    EntityTypeAdded(EntityTypeId),
    EntityTypeRemoved {
        name: String,
    },
    BaseTypeChanged(EntityTypeId),
    MemberIgnored {
        entity_type: EntityTypeId,
        member: String,
    },

    PropertyAdded(PropertyId),
    PropertyRemoved {
        entity_type: EntityTypeId,
        name: String,
    },
    PropertyNullabilityChanged(PropertyId),

    KeyAdded(KeyId),
    KeyRemoved {
        entity_type: EntityTypeId,
        properties: Vec<PropertyId>,
    },
    PrimaryKeyChanged(EntityTypeId),

    ForeignKeyAdded(ForeignKeyId),
    ForeignKeyRemoved {
        dependent: EntityTypeId,
        principal: EntityTypeId,
        properties: Vec<PropertyId>,
    },
    ForeignKeyPropertiesChanged(ForeignKeyId),
    ForeignKeyUniquenessChanged(ForeignKeyId),
    ForeignKeyRequiredChanged(ForeignKeyId),
    ForeignKeyOwnershipChanged(ForeignKeyId),

    NavigationAdded(NavigationId),
    NavigationRemoved {
        entity_type: EntityTypeId,
        target: EntityTypeId,
        name: String,
    },

    SkipNavigationAdded(SkipNavigationId),
    SkipNavigationRemoved {
        entity_type: EntityTypeId,
        target: EntityTypeId,
        name: String,
        join_entity: Option<EntityTypeId>,
    },
    SkipNavigationInverseChanged(SkipNavigationId),
    SkipNavigationForeignKeyChanged {
        navigation: SkipNavigationId,
        old_foreign_key: Option<ForeignKeyId>,
    },

    IndexAdded(IndexId),
    IndexRemoved {
        entity_type: EntityTypeId,
        properties: Vec<PropertyId>,
    },
    IndexUniquenessChanged(IndexId),

    /// Raised once by the session after incremental mutation is complete.
    ModelFinalizing,
}
