//! Foreign key property discovery.
//!
//! Finds the dependent-side property set for a foreign key whose properties
//! are still at convention authority. Candidates are matched by name in
//! tiers: `[navigation][key property]`, `[navigation]Id`, then the same two
//! with the principal type name as the base. A name match of the wrong type
//! is reported and stops discovery for that foreign key. With no match, a
//! non-ownership one-to-one reuses the dependent's primary key when it is
//! shape-compatible; everything else gets shadow properties.
//!
//! The rule also keeps two derived facts in sync at convention authority:
//! a foreign key over only non-nullable properties is required, and the
//! properties of a required foreign key are non-nullable.

use std::collections::HashSet;

use crate::diagnostics::ModelDiagnostic;
use crate::dispatch::Flow;
use crate::error::ModelResult;
use crate::metadata::{
    ConfigurationSource, EntityTypeId, ForeignKeyId, ForeignKeyNode, ModelBuilder, NavigationId,
    PropertyId,
};
use crate::naming;

use super::{
    Convention, ConventionResult, ForeignKeyAddedConvention,
    ForeignKeyPropertiesChangedConvention, ForeignKeyRequiredChangedConvention,
    ForeignKeyUniquenessChangedConvention, NavigationAddedConvention, PrimaryKeyChangedConvention,
    PropertyAddedConvention, PropertyNullabilityChangedConvention,
};

pub struct ForeignKeyPropertyDiscovery;

enum NameMatch {
    Found(Vec<PropertyId>),
    /// A name matched but its type conflicts with the principal key;
    /// discovery must not guess further.
    TypeConflict,
    None,
}

impl ForeignKeyPropertyDiscovery {
    fn discover(&self, builder: &mut ModelBuilder, fk: ForeignKeyId) -> ModelResult<()> {
        let Some(node) = builder.model().get_foreign_key(fk) else {
            return Ok(());
        };
        if !ConfigurationSource::Convention.overrides(node.properties_source) {
            return Ok(());
        }
        let fk_node = node.clone();
        let Some(principal_key) = builder.model().entity_type(fk_node.principal).primary_key
        else {
            // Nothing to map onto yet; a primary-key change brings us back.
            return Ok(());
        };
        let key_properties = builder.model().key(principal_key).properties.clone();

        let mut bases = Vec::new();
        if let Some(nav) = fk_node.dependent_navigation {
            bases.push(builder.model().navigation(nav).name.clone());
        }
        let principal_name = builder.model().entity_type(fk_node.principal).name.clone();
        if !bases.contains(&principal_name) {
            bases.push(principal_name);
        }

        match self.match_by_name(builder, fk, &fk_node, &key_properties, &bases) {
            NameMatch::Found(properties) => {
                self.apply(builder, fk, &fk_node, properties, true)?;
            }
            NameMatch::TypeConflict => {}
            NameMatch::None => {
                // A previously synthesized set that still lines up with the
                // principal key stays; resynthesizing would churn names.
                if self.still_compatible(builder, &fk_node, &key_properties) {
                    return Ok(());
                }
                if let Some(reused) = self.reusable_dependent_key(builder, &fk_node, &key_properties)
                {
                    self.apply(builder, fk, &fk_node, reused, true)?;
                } else {
                    self.synthesize_shadow(builder, fk, &fk_node, &key_properties, &bases)?;
                }
            }
        }
        Ok(())
    }

    fn still_compatible(
        &self,
        builder: &ModelBuilder,
        fk_node: &ForeignKeyNode,
        key_properties: &[PropertyId],
    ) -> bool {
        let model = builder.model();
        fk_node.properties.len() == key_properties.len()
            && !fk_node.properties.is_empty()
            && fk_node
                .properties
                .iter()
                .zip(key_properties.iter())
                .all(|(&p, &k)| model.property(p).value_type == model.property(k).value_type)
    }

    /// Try each base name in order, matching `[base][key property]` and then
    /// `[base]Id` against the dependent's declared properties.
    fn match_by_name(
        &self,
        builder: &mut ModelBuilder,
        fk: ForeignKeyId,
        fk_node: &ForeignKeyNode,
        key_properties: &[PropertyId],
        bases: &[String],
    ) -> NameMatch {
        let candidates = self.candidate_properties(builder, fk, fk_node);
        for base in bases {
            for use_id_suffix in [false, true] {
                if use_id_suffix && key_properties.len() != 1 {
                    continue;
                }
                let mut matched = Vec::with_capacity(key_properties.len());
                for &key_property in key_properties {
                    let suffix = if use_id_suffix {
                        "Id".to_string()
                    } else {
                        builder.model().property(key_property).name.clone()
                    };
                    let found = candidates.iter().copied().find(|&p| {
                        naming::concat_match(&builder.model().property(p).name, base, &suffix)
                    });
                    let Some(found) = found else {
                        matched.clear();
                        break;
                    };
                    let expected = builder.model().property(key_property).value_type;
                    let actual = builder.model().property(found).value_type;
                    if expected != actual {
                        builder.report(ModelDiagnostic::IncompatibleForeignKeyProperty {
                            dependent: builder.model().entity_type(fk_node.dependent).name.clone(),
                            principal: builder.model().entity_type(fk_node.principal).name.clone(),
                            property: builder.model().property(found).name.clone(),
                            expected,
                            actual,
                        });
                        return NameMatch::TypeConflict;
                    }
                    matched.push(found);
                }
                if matched.len() == key_properties.len() {
                    return NameMatch::Found(matched);
                }
            }
        }
        NameMatch::None
    }

    /// Dependent properties eligible for name matching: the declared chain,
    /// minus properties serving other foreign keys and minus the dependent's
    /// own primary key (reused only through the one-to-one fallback).
    fn candidate_properties(
        &self,
        builder: &ModelBuilder,
        fk: ForeignKeyId,
        fk_node: &ForeignKeyNode,
    ) -> Vec<PropertyId> {
        let model = builder.model();
        let mut used_elsewhere: HashSet<PropertyId> = HashSet::new();
        for &other in &model.entity_type(fk_node.dependent).foreign_keys {
            if other == fk {
                continue;
            }
            used_elsewhere.extend(model.foreign_key(other).properties.iter().copied());
        }
        used_elsewhere.extend(
            model
                .entity_type(fk_node.dependent)
                .primary_key
                .map(|k| model.key(k).properties.clone())
                .unwrap_or_default(),
        );

        let mut candidates = Vec::new();
        let mut current = Some(fk_node.dependent);
        while let Some(id) = current {
            let node = model.entity_type(id);
            candidates.extend(
                node.properties
                    .iter()
                    .copied()
                    .filter(|p| !used_elsewhere.contains(p)),
            );
            current = node.base_type;
        }
        candidates
    }

    /// A non-ownership one-to-one can map its dependent primary key onto the
    /// principal key when the shapes line up. Ownership is excluded: there
    /// the dependent key is derived from this foreign key, not the reverse.
    fn reusable_dependent_key(
        &self,
        builder: &ModelBuilder,
        fk_node: &ForeignKeyNode,
        key_properties: &[PropertyId],
    ) -> Option<Vec<PropertyId>> {
        if !fk_node.unique || fk_node.ownership {
            return None;
        }
        let model = builder.model();
        let dependent_key = model.entity_type(fk_node.dependent).primary_key?;
        let properties = model.key(dependent_key).properties.clone();
        if properties.len() != key_properties.len() {
            return None;
        }
        let compatible = properties
            .iter()
            .zip(key_properties.iter())
            .all(|(&p, &k)| model.property(p).value_type == model.property(k).value_type);
        compatible.then_some(properties)
    }

    fn apply(
        &self,
        builder: &mut ModelBuilder,
        fk: ForeignKeyId,
        fk_node: &ForeignKeyNode,
        properties: Vec<PropertyId>,
        derive_required: bool,
    ) -> ModelResult<()> {
        let old = fk_node.properties.clone();
        if builder
            .set_foreign_key_properties(fk, properties.clone(), ConfigurationSource::Convention)?
            .is_none()
        {
            return Ok(());
        }
        if derive_required {
            let required = properties
                .iter()
                .all(|&p| !builder.model().property(p).nullable);
            let _ = builder.set_foreign_key_required(fk, required, ConfigurationSource::Convention);
        }
        self.prune_obsolete(builder, old, &properties);
        Ok(())
    }

    /// Shadow properties replaced by real ones are removed once nothing
    /// references them.
    fn prune_obsolete(&self, builder: &mut ModelBuilder, old: Vec<PropertyId>, new: &[PropertyId]) {
        for property in old {
            if new.contains(&property) || !builder.model().is_property_live(property) {
                continue;
            }
            let node = builder.model().property(property);
            if !node.shadow || node.source != ConfigurationSource::Convention {
                continue;
            }
            let referenced = builder
                .model()
                .foreign_keys()
                .any(|(_, fk)| fk.properties.contains(&property))
                || builder
                    .model()
                    .entity_type(node.entity_type)
                    .keys
                    .iter()
                    .any(|&k| builder.model().key(k).properties.contains(&property))
                || builder
                    .model()
                    .entity_type(node.entity_type)
                    .indexes
                    .iter()
                    .any(|&i| builder.model().index(i).properties.contains(&property));
            if !referenced {
                builder.remove_property(property, ConfigurationSource::Convention);
            }
        }
    }

    fn synthesize_shadow(
        &self,
        builder: &mut ModelBuilder,
        fk: ForeignKeyId,
        fk_node: &ForeignKeyNode,
        key_properties: &[PropertyId],
        bases: &[String],
    ) -> ModelResult<()> {
        let base = bases.first().cloned().unwrap_or_default();
        let dependent = fk_node.dependent;
        let dependent_name = builder.model().entity_type(dependent).name.clone();
        let mut properties = Vec::with_capacity(key_properties.len());
        for &key_property in key_properties {
            let key_name = builder.model().property(key_property).name.clone();
            let value_type = builder.model().property(key_property).value_type;
            let desired = naming::shadow_property_name(&base, &key_name);
            // An ignored member name stays off limits, otherwise the shadow
            // property would be rejected and the foreign key left unmapped.
            let name = naming::uniquify(&desired, |candidate| {
                builder.model().find_property(dependent, candidate).is_some()
                    || builder.model().is_member_ignored(dependent, candidate)
            });
            let Some(property) = builder.property(
                dependent,
                &name,
                value_type,
                !fk_node.required,
                true,
                ConfigurationSource::Convention,
            ) else {
                return Ok(());
            };
            builder.report(ModelDiagnostic::ShadowPropertyCreated {
                entity_type: dependent_name.clone(),
                property: name,
            });
            properties.push(property);
        }
        self.apply(builder, fk, fk_node, properties, false)
    }
}

impl Convention for ForeignKeyPropertyDiscovery {
    fn name(&self) -> &'static str {
        "ForeignKeyPropertyDiscovery"
    }
}

impl ForeignKeyAddedConvention for ForeignKeyPropertyDiscovery {
    fn foreign_key_added(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        self.discover(builder, foreign_key)?;
        Ok(Flow::Continue(foreign_key))
    }
}

impl PropertyAddedConvention for ForeignKeyPropertyDiscovery {
    fn property_added(
        &self,
        builder: &mut ModelBuilder,
        property: PropertyId,
    ) -> ConventionResult<PropertyId> {
        let entity_type = builder.model().property(property).entity_type;
        for fk in builder.model().entity_type(entity_type).foreign_keys.clone() {
            self.discover(builder, fk)?;
        }
        Ok(Flow::Continue(property))
    }
}

impl PrimaryKeyChangedConvention for ForeignKeyPropertyDiscovery {
    fn primary_key_changed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId> {
        for fk in builder
            .model()
            .entity_type(entity_type)
            .referencing_foreign_keys
            .clone()
        {
            self.discover(builder, fk)?;
        }
        Ok(Flow::Continue(entity_type))
    }
}

impl NavigationAddedConvention for ForeignKeyPropertyDiscovery {
    fn navigation_added(
        &self,
        builder: &mut ModelBuilder,
        navigation: NavigationId,
    ) -> ConventionResult<NavigationId> {
        let node = builder.model().navigation(navigation);
        if node.on_dependent {
            let fk = node.foreign_key;
            self.discover(builder, fk)?;
        }
        Ok(Flow::Continue(navigation))
    }
}

impl ForeignKeyPropertiesChangedConvention for ForeignKeyPropertyDiscovery {
    /// A property set cleared back to "undiscovered" (for example by
    /// ignoring a matched member) is re-discovered. Non-empty sets are left
    /// alone, including the ones this rule just wrote.
    fn foreign_key_properties_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        if builder.model().foreign_key(foreign_key).properties.is_empty() {
            self.discover(builder, foreign_key)?;
        }
        Ok(Flow::Continue(foreign_key))
    }
}

impl ForeignKeyUniquenessChangedConvention for ForeignKeyPropertyDiscovery {
    fn foreign_key_uniqueness_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        self.discover(builder, foreign_key)?;
        Ok(Flow::Continue(foreign_key))
    }
}

impl ForeignKeyRequiredChangedConvention for ForeignKeyPropertyDiscovery {
    fn foreign_key_required_changed(
        &self,
        builder: &mut ModelBuilder,
        foreign_key: ForeignKeyId,
    ) -> ConventionResult<ForeignKeyId> {
        let node = builder.model().foreign_key(foreign_key);
        let required = node.required;
        for property in node.properties.clone() {
            if builder.model().property(property).shadow
                || builder.model().property(property).nullability_source.is_none()
                || builder.model().property(property).nullability_source
                    == Some(ConfigurationSource::Convention)
            {
                let _ = builder.set_property_nullable(property, !required, ConfigurationSource::Convention);
            }
        }
        Ok(Flow::Continue(foreign_key))
    }
}

impl PropertyNullabilityChangedConvention for ForeignKeyPropertyDiscovery {
    fn property_nullability_changed(
        &self,
        builder: &mut ModelBuilder,
        property: PropertyId,
    ) -> ConventionResult<PropertyId> {
        let entity_type = builder.model().property(property).entity_type;
        for fk in builder.model().entity_type(entity_type).foreign_keys.clone() {
            let node = builder.model().foreign_key(fk);
            if !node.properties.contains(&property) {
                continue;
            }
            if !ConfigurationSource::Convention.overrides(node.required_source) {
                continue;
            }
            let required = node
                .properties
                .iter()
                .all(|&p| !builder.model().property(p).nullable);
            let _ = builder.set_foreign_key_required(fk, required, ConfigurationSource::Convention);
        }
        Ok(Flow::Continue(property))
    }
}
