//! Primary key discovery.
//!
//! Picks the convention primary key for an entity type, in priority order:
//! the owning foreign key's properties (one-to-one ownership), those
//! properties plus a shadow discriminator (collection ownership), the
//! concatenated foreign key properties of a synthetic join type, and
//! finally the `Id` / `[TypeName]Id` naming heuristic over declared
//! properties. A single-property heuristic key of a generatable type is
//! marked store-generated unless it also serves as a foreign key.

use crate::diagnostics::ModelDiagnostic;
use crate::dispatch::Flow;
use crate::error::ModelResult;
use crate::metadata::{
    ConfigurationSource, EntityTypeId, ForeignKeyId, KeyId, ModelBuilder, PropertyId,
    ValueGeneration,
};
use crate::naming;

use super::{
    BaseTypeChangedConvention, Convention, ConventionResult, EntityTypeAddedConvention,
    ForeignKeyAddedConvention, ForeignKeyOwnershipChangedConvention,
    ForeignKeyPropertiesChangedConvention, ForeignKeyRemovedConvention,
    ForeignKeyUniquenessChangedConvention, KeyRemovedConvention, PropertyAddedConvention,
};

pub struct KeyDiscovery;

impl KeyDiscovery {
    fn discover(&self, builder: &mut ModelBuilder, entity_type: EntityTypeId) -> ModelResult<()> {
        if !builder.model().is_entity_type_live(entity_type) {
            return Ok(());
        }
        let (base_type, primary_key) = {
            let node = builder.model().entity_type(entity_type);
            (node.base_type, node.primary_key)
        };
        // Derived types share the root's key; drop any convention key of
        // their own left over from before the base was set.
        if base_type.is_some() {
            if let Some(pk) = primary_key {
                builder.remove_key(pk, ConfigurationSource::Convention);
            }
            return Ok(());
        }
        if let Some(pk) = primary_key {
            if !ConfigurationSource::Convention.overrides(Some(builder.model().key(pk).source)) {
                return Ok(());
            }
        }

        let owning = builder
            .model()
            .entity_type(entity_type)
            .foreign_keys
            .iter()
            .copied()
            .find(|&fk| builder.model().foreign_key(fk).ownership);
        if let Some(fk) = owning {
            return self.discover_for_owned(builder, entity_type, fk);
        }

        if builder.model().entity_type(entity_type).backing_type.is_none() {
            return self.discover_for_join(builder, entity_type);
        }

        self.discover_by_name(builder, entity_type)
    }

    /// Ownership: the owned dependent reuses the owning foreign key's
    /// properties, appending a shadow discriminator when the owner holds a
    /// collection.
    fn discover_for_owned(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        fk: ForeignKeyId,
    ) -> ModelResult<()> {
        let fk_node = builder.model().foreign_key(fk).clone();
        if fk_node.properties.is_empty() {
            // Property discovery has not run yet; the properties-changed
            // event will bring this rule back.
            return Ok(());
        }
        if fk_node.unique {
            let _ = builder.primary_key(entity_type, &fk_node.properties, ConfigurationSource::Convention)?;
            return Ok(());
        }
        if let Some(discriminator) = self.existing_discriminator(builder, entity_type, &fk_node.properties) {
            let mut properties = fk_node.properties.clone();
            properties.push(discriminator);
            let _ = builder.primary_key(entity_type, &properties, ConfigurationSource::Convention)?;
            return Ok(());
        }
        let name = naming::uniquify("Id", |candidate| {
            builder.model().find_property(entity_type, candidate).is_some()
        });
        let Some(discriminator) = builder.property(
            entity_type,
            &name,
            crate::classifier::ScalarType::Int,
            false,
            true,
            ConfigurationSource::Convention,
        ) else {
            return Ok(());
        };
        builder.set_value_generation(
            discriminator,
            ValueGeneration::OnAdd,
            ConfigurationSource::Convention,
        );
        let entity_name = builder.model().entity_type(entity_type).name.clone();
        builder.report(ModelDiagnostic::ShadowPropertyCreated {
            entity_type: entity_name,
            property: name,
        });
        let mut properties = fk_node.properties;
        properties.push(discriminator);
        let _ = builder.primary_key(entity_type, &properties, ConfigurationSource::Convention)?;
        Ok(())
    }

    /// A previously synthesized collection-ownership discriminator: the
    /// shadow property trailing the current convention primary key.
    fn existing_discriminator(
        &self,
        builder: &ModelBuilder,
        entity_type: EntityTypeId,
        fk_properties: &[PropertyId],
    ) -> Option<PropertyId> {
        let pk: KeyId = builder.model().entity_type(entity_type).primary_key?;
        let key = builder.model().key(pk);
        let (&last, head) = key.properties.split_last()?;
        if head == fk_properties && builder.model().property(last).shadow {
            Some(last)
        } else {
            None
        }
    }

    /// A synthetic join type keys on the concatenation of its foreign key
    /// properties, once every foreign key has them.
    fn discover_for_join(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ModelResult<()> {
        let foreign_keys = builder.model().entity_type(entity_type).foreign_keys.clone();
        if foreign_keys.len() < 2 {
            return Ok(());
        }
        let mut properties = Vec::new();
        for fk in foreign_keys {
            let fk_node = builder.model().foreign_key(fk);
            if fk_node.properties.is_empty() {
                return Ok(());
            }
            properties.extend_from_slice(&fk_node.properties);
        }
        let _ = builder.primary_key(entity_type, &properties, ConfigurationSource::Convention)?;
        Ok(())
    }

    fn discover_by_name(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ModelResult<()> {
        let node = builder.model().entity_type(entity_type);
        let entity_name = node.name.clone();
        let candidates: Vec<PropertyId> = node
            .properties
            .iter()
            .copied()
            .filter(|&p| naming::is_key_candidate(&builder.model().property(p).name, &entity_name))
            .collect();
        if candidates.len() > 1 {
            let names = candidates
                .iter()
                .map(|&p| builder.model().property(p).name.clone())
                .collect();
            builder.report(ModelDiagnostic::AmbiguousKeyCandidates {
                entity_type: entity_name,
                candidates: names,
            });
            return Ok(());
        }
        let Some(&candidate) = candidates.first() else {
            return Ok(());
        };
        if builder.primary_key(entity_type, &[candidate], ConfigurationSource::Convention)?.is_none()
        {
            return Ok(());
        }
        let value_type = builder.model().property(candidate).value_type;
        let in_foreign_key = builder
            .model()
            .foreign_keys()
            .any(|(_, fk)| fk.properties.contains(&candidate));
        let generation = if value_type.supports_value_generation() && !in_foreign_key {
            ValueGeneration::OnAdd
        } else {
            // A key that doubles as a foreign key takes its value from the
            // principal instead of the store.
            ValueGeneration::Never
        };
        builder.set_value_generation(candidate, generation, ConfigurationSource::Convention);
        Ok(())
    }
}

impl Convention for KeyDiscovery {
    fn name(&self) -> &'static str {
        "KeyDiscovery"
    }
}

impl EntityTypeAddedConvention for KeyDiscovery {
    fn entity_type_added(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId> {
        self.discover(builder, entity_type)?;
        Ok(Flow::Continue(entity_type))
    }
}

impl BaseTypeChangedConvention for KeyDiscovery {
    fn base_type_changed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId> {
        self.discover(builder, entity_type)?;
        Ok(Flow::Continue(entity_type))
    }
}

impl PropertyAddedConvention for KeyDiscovery {
    fn property_added(
        &self,
        builder: &mut ModelBuilder,
        property: PropertyId,
    ) -> ConventionResult<PropertyId> {
        let entity_type = builder.model().property(property).entity_type;
        self.discover(builder, entity_type)?;
        Ok(Flow::Continue(property))
    }
}

impl KeyRemovedConvention for KeyDiscovery {
    fn key_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        _properties: &[PropertyId],
    ) -> ConventionResult<()> {
        if builder.model().entity_type(entity_type).primary_key.is_none() {
            self.discover(builder, entity_type)?;
        }
        Ok(Flow::Continue(()))
    }
}

impl ForeignKeyAddedConvention for KeyDiscovery {
    fn foreign_key_added(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let dependent = builder.model().foreign_key(foreign_key).dependent;
        self.discover(builder, dependent)?;
        Ok(Flow::Continue(foreign_key))
    }
}

impl ForeignKeyRemovedConvention for KeyDiscovery {
    fn foreign_key_removed(
        &self,
        builder: &mut ModelBuilder,
        dependent: EntityTypeId,
        _principal: EntityTypeId,
        _properties: &[PropertyId],
    ) -> ConventionResult<()> {
        if builder.model().is_entity_type_live(dependent) {
            self.discover(builder, dependent)?;
        }
        Ok(Flow::Continue(()))
    }
}

impl ForeignKeyPropertiesChangedConvention for KeyDiscovery {
    fn foreign_key_properties_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let dependent = builder.model().foreign_key(foreign_key).dependent;
        self.discover(builder, dependent)?;
        Ok(Flow::Continue(foreign_key))
    }
}

impl ForeignKeyUniquenessChangedConvention for KeyDiscovery {
    fn foreign_key_uniqueness_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let node = builder.model().foreign_key(foreign_key);
        if node.ownership {
            let dependent = node.dependent;
            self.discover(builder, dependent)?;
        }
        Ok(Flow::Continue(foreign_key))
    }
}

impl ForeignKeyOwnershipChangedConvention for KeyDiscovery {
    fn foreign_key_ownership_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let dependent = builder.model().foreign_key(foreign_key).dependent;
        self.discover(builder, dependent)?;
        Ok(Flow::Continue(foreign_key))
    }
}
