//! Convention indexes over foreign key properties.
//!
//! Every discovered foreign key gets an index on its dependent properties,
//! unique when the relationship is one-to-one, unless a key or a longer
//! index already leads with those properties. The rule sweeps the dependent
//! type whenever its foreign keys, keys, or indexes change, removing
//! convention indexes that became redundant and re-creating ones that lost
//! their cover.

use crate::diagnostics::ModelDiagnostic;
use crate::dispatch::Flow;
use crate::error::ModelResult;
use crate::metadata::{
    ConfigurationSource, EntityTypeId, ForeignKeyId, IndexId, KeyId, ModelBuilder, PropertyId,
};

use super::{
    Convention, ConventionResult, ForeignKeyAddedConvention, ForeignKeyPropertiesChangedConvention,
    ForeignKeyRemovedConvention, ForeignKeyUniquenessChangedConvention, IndexAddedConvention,
    IndexRemovedConvention, KeyAddedConvention, KeyRemovedConvention,
};

pub struct ForeignKeyIndex;

impl ForeignKeyIndex {
    /// Reconcile every convention index on the type against its current
    /// foreign keys and keys.
    fn sweep(&self, builder: &mut ModelBuilder, entity_type: EntityTypeId) -> ModelResult<()> {
        if !builder.model().is_entity_type_live(entity_type) {
            return Ok(());
        }
        let node = builder.model().entity_type(entity_type);
        let key_property_sets: Vec<Vec<PropertyId>> = node
            .keys
            .iter()
            .map(|&k| builder.model().key(k).properties.clone())
            .collect();
        let mut wanted: Vec<(Vec<PropertyId>, bool)> = Vec::new();
        for &fk in &node.foreign_keys {
            let fk_node = builder.model().foreign_key(fk);
            if fk_node.properties.is_empty() {
                continue;
            }
            match wanted.iter_mut().find(|(p, _)| *p == fk_node.properties) {
                Some((_, unique)) => *unique |= fk_node.unique,
                None => wanted.push((fk_node.properties.clone(), fk_node.unique)),
            }
        }
        let indexes = node.indexes.clone();
        let index_shapes: Vec<(IndexId, Vec<PropertyId>)> = indexes
            .iter()
            .map(|&i| (i, builder.model().index(i).properties.clone()))
            .collect();

        let covered_by_key = |properties: &[PropertyId]| {
            key_property_sets
                .iter()
                .any(|k| k.len() >= properties.len() && k[..properties.len()] == *properties)
        };
        let covered_by_longer_index = |index: IndexId, properties: &[PropertyId]| {
            index_shapes.iter().any(|(other, other_properties)| {
                *other != index
                    && other_properties.len() > properties.len()
                    && other_properties[..properties.len()] == *properties
            })
        };

        for index in &indexes {
            let index_node = builder.model().index(*index);
            if index_node.source != ConfigurationSource::Convention {
                continue;
            }
            let properties = index_node.properties.clone();
            if covered_by_key(&properties) || covered_by_longer_index(*index, &properties) {
                let names = properties
                    .iter()
                    .map(|&p| builder.model().property(p).name.clone())
                    .collect();
                let entity_name = builder.model().entity_type(entity_type).name.clone();
                builder.remove_index(*index, ConfigurationSource::Convention);
                builder.report(ModelDiagnostic::RedundantIndexRemoved {
                    entity_type: entity_name,
                    properties: names,
                });
                continue;
            }
            if !wanted.iter().any(|(p, _)| *p == properties) {
                builder.remove_index(*index, ConfigurationSource::Convention);
            }
        }

        for (properties, unique) in wanted {
            if covered_by_key(&properties) {
                continue;
            }
            // A longer index leading with these properties covers them too.
            let covered_by_index = builder
                .model()
                .entity_type(entity_type)
                .indexes
                .iter()
                .any(|&i| {
                    let other = &builder.model().index(i).properties;
                    other.len() > properties.len() && other[..properties.len()] == properties
                });
            if covered_by_index {
                continue;
            }
            let _ = builder.index(entity_type, properties, unique, ConfigurationSource::Convention)?;
        }
        Ok(())
    }
}

impl Convention for ForeignKeyIndex {
    fn name(&self) -> &'static str {
        "ForeignKeyIndex"
    }
}

impl ForeignKeyAddedConvention for ForeignKeyIndex {
    fn foreign_key_added(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let dependent = builder.model().foreign_key(foreign_key).dependent;
        self.sweep(builder, dependent)?;
        Ok(Flow::Continue(foreign_key))
    }
}

impl ForeignKeyRemovedConvention for ForeignKeyIndex {
    fn foreign_key_removed(
        &self,
        builder: &mut ModelBuilder,
        dependent: EntityTypeId,
        _principal: EntityTypeId,
        _properties: &[PropertyId],
    ) -> ConventionResult<()> {
        self.sweep(builder, dependent)?;
        Ok(Flow::Continue(()))
    }
}

impl ForeignKeyPropertiesChangedConvention for ForeignKeyIndex {
    fn foreign_key_properties_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let dependent = builder.model().foreign_key(foreign_key).dependent;
        self.sweep(builder, dependent)?;
        Ok(Flow::Continue(foreign_key))
    }
}

impl ForeignKeyUniquenessChangedConvention for ForeignKeyIndex {
    fn foreign_key_uniqueness_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let dependent = builder.model().foreign_key(foreign_key).dependent;
        self.sweep(builder, dependent)?;
        Ok(Flow::Continue(foreign_key))
    }
}

impl KeyAddedConvention for ForeignKeyIndex {
    fn key_added(&self, builder: &mut ModelBuilder, key: KeyId) -> ConventionResult<KeyId> {
        let entity_type = builder.model().key(key).entity_type;
        self.sweep(builder, entity_type)?;
        Ok(Flow::Continue(key))
    }
}

impl KeyRemovedConvention for ForeignKeyIndex {
    fn key_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        _properties: &[PropertyId],
    ) -> ConventionResult<()> {
        self.sweep(builder, entity_type)?;
        Ok(Flow::Continue(()))
    }
}

impl IndexAddedConvention for ForeignKeyIndex {
    fn index_added(&self, builder: &mut ModelBuilder, index: IndexId) -> ConventionResult<IndexId> {
        let entity_type = builder.model().index(index).entity_type;
        self.sweep(builder, entity_type)?;
        Ok(Flow::Continue(index))
    }
}

impl IndexRemovedConvention for ForeignKeyIndex {
    fn index_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        _properties: &[PropertyId],
    ) -> ConventionResult<()> {
        self.sweep(builder, entity_type)?;
        Ok(Flow::Continue(()))
    }
}
