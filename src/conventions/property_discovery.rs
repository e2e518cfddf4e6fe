//! Maps viable primitive structural members to convention properties.
//!
//! Runs before key discovery so the name-heuristic scans have material to
//! work with. Members already mapped (or inherited from a base type) and
//! ignored members are left alone.

use crate::dispatch::Flow;
use crate::metadata::{ConfigurationSource, EntityTypeId, ModelBuilder};

use super::{BaseTypeChangedConvention, Convention, ConventionResult, EntityTypeAddedConvention};

pub struct PropertyDiscovery;

impl PropertyDiscovery {
    fn discover(&self, builder: &mut ModelBuilder, entity_type: EntityTypeId) {
        let Some(backing) = builder
            .model()
            .get_entity_type(entity_type)
            .and_then(|n| n.backing_type.clone())
        else {
            return;
        };
        let classifier = builder.classifier();
        for member in classifier.scalar_members(&backing) {
            if builder.model().is_member_ignored(entity_type, &member.name) {
                continue;
            }
            // Inherited properties stay declared on the base; a same-named
            // property on this type (including a shadow synthesized before
            // the member was seen) goes through the builder's merge path.
            if let Some(existing) = builder.model().find_property(entity_type, &member.name) {
                if builder.model().property(existing).entity_type != entity_type {
                    continue;
                }
            }
            let _ = builder.property(
                entity_type,
                &member.name,
                member.value_type,
                member.nullable,
                false,
                ConfigurationSource::Convention,
            );
        }
    }
}

impl Convention for PropertyDiscovery {
    fn name(&self) -> &'static str {
        "PropertyDiscovery"
    }
}

impl EntityTypeAddedConvention for PropertyDiscovery {
    fn entity_type_added(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId> {
        self.discover(builder, entity_type);
        Ok(Flow::Continue(entity_type))
    }
}

impl BaseTypeChangedConvention for PropertyDiscovery {
    fn base_type_changed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId> {
        self.discover(builder, entity_type);
        Ok(Flow::Continue(entity_type))
    }
}
