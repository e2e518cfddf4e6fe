//! Relationship discovery.
//!
//! Scans a type's association-shaped members, pairs them with inverse
//! members on the target type, and materializes foreign keys, navigations
//! and skip navigations. A candidate group with more than one viable
//! pairing binds nothing: the ambiguity is recorded on both types and
//! reported, and a later change (an ignored member, a removed navigation)
//! re-opens resolution.

use std::collections::BTreeMap;

use crate::classifier::NavigationMember;
use crate::diagnostics::ModelDiagnostic;
use crate::dispatch::Flow;
use crate::error::ModelResult;
use crate::metadata::{
    AmbiguityRecord, ConfigurationSource, EntityTypeId, ForeignKeyId, ModelBuilder, PropertyId,
};

use super::{
    BaseTypeChangedConvention, Convention, ConventionResult, EntityTypeAddedConvention,
    ForeignKeyOwnershipChangedConvention, ForeignKeyRemovedConvention, MemberIgnoredConvention,
    NavigationRemovedConvention,
};

pub struct RelationshipDiscovery;

impl RelationshipDiscovery {
    fn discover(&self, builder: &mut ModelBuilder, entity_type: EntityTypeId) -> ModelResult<()> {
        if !builder.model().is_entity_type_live(entity_type) {
            return Ok(());
        }
        let Some(backing) = builder.model().entity_type(entity_type).backing_type.clone() else {
            return Ok(());
        };

        self.clear_ambiguities(builder, entity_type);

        let classifier = builder.classifier();
        let forwards: Vec<NavigationMember> = classifier
            .navigation_members(&backing)
            .into_iter()
            .filter(|m| {
                self.is_unbound(builder, entity_type, &m.name)
                    && !builder.model().is_type_ignored(&m.target_type)
            })
            .collect();

        let mut groups: BTreeMap<String, Vec<NavigationMember>> = BTreeMap::new();
        for member in forwards {
            groups.entry(member.target_type.clone()).or_default().push(member);
        }

        let mut created = Vec::new();
        for (target_name, group) in groups {
            // Self-referencing members never auto-pair; each one stands
            // alone so `Parent` and `Children` on the same type produce two
            // independent relationships.
            if target_name == backing {
                for member in &group {
                    self.bind_one_sided(builder, entity_type, entity_type, member, false)?;
                }
                continue;
            }

            let (target, was_created) = match builder.model().find_entity_type(&target_name) {
                Some(existing) => (existing, false),
                None => {
                    let Some(id) =
                        builder.entity_type(&target_name, ConfigurationSource::Convention)
                    else {
                        continue;
                    };
                    (id, true)
                }
            };
            if was_created {
                created.push(target);
            }

            let ownership = builder.model().entity_type(target).owned;
            let inverses = self.inverse_candidates(builder, &backing, target);

            let ambiguous =
                (!ownership && group.len() > 1 && !inverses.is_empty()) || inverses.len() > 1;
            if ambiguous {
                self.record_ambiguity(builder, entity_type, target, &group, &inverses);
                continue;
            }

            if group.len() == 1 && inverses.len() == 1 {
                self.bind_pair(builder, entity_type, target, &group[0], &inverses[0], ownership)?;
            } else {
                for member in &group {
                    self.bind_one_sided(builder, entity_type, target, member, ownership)?;
                }
            }
        }

        self.collect_unused(builder, created);
        Ok(())
    }

    /// Whether a member name on this type is still free for discovery.
    fn is_unbound(&self, builder: &ModelBuilder, entity_type: EntityTypeId, name: &str) -> bool {
        let model = builder.model();
        !model.is_member_ignored(entity_type, name)
            && model.find_property(entity_type, name).is_none()
            && model.find_navigation(entity_type, name).is_none()
            && model.find_skip_navigation(entity_type, name).is_none()
    }

    /// Unbound members on the target that point back at the scanned type.
    fn inverse_candidates(
        &self,
        builder: &ModelBuilder,
        backing: &str,
        target: EntityTypeId,
    ) -> Vec<NavigationMember> {
        let Some(target_backing) = builder.model().entity_type(target).backing_type.clone() else {
            return Vec::new();
        };
        builder
            .classifier()
            .navigation_members(&target_backing)
            .into_iter()
            .filter(|m| m.target_type == backing && self.is_unbound(builder, target, &m.name))
            .collect()
    }

    fn record_ambiguity(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        target: EntityTypeId,
        forwards: &[NavigationMember],
        inverses: &[NavigationMember],
    ) {
        let forward_names: Vec<String> = forwards.iter().map(|m| m.name.clone()).collect();
        let inverse_names: Vec<String> = inverses.iter().map(|m| m.name.clone()).collect();
        let first_type = builder.model().entity_type(entity_type).name.clone();
        let second_type = builder.model().entity_type(target).name.clone();

        let scratch = &mut builder.model_mut().scratch.ambiguous_navigations;
        scratch.entry(entity_type).or_default().push(AmbiguityRecord {
            counterpart: target,
            members: forward_names.clone(),
        });
        scratch.entry(target).or_default().push(AmbiguityRecord {
            counterpart: entity_type,
            members: inverse_names.clone(),
        });

        let mut members = forward_names;
        members.extend(inverse_names);
        builder.report(ModelDiagnostic::AmbiguousNavigations {
            first_type,
            second_type,
            members,
        });
    }

    /// Drop the type's ambiguity records and their mirror entries before
    /// re-running discovery against current state.
    fn clear_ambiguities(&self, builder: &mut ModelBuilder, entity_type: EntityTypeId) {
        let scratch = &mut builder.model_mut().scratch.ambiguous_navigations;
        let Some(records) = scratch.remove(&entity_type) else {
            return;
        };
        for record in records {
            if let Some(mirror) = scratch.get_mut(&record.counterpart) {
                mirror.retain(|r| r.counterpart != entity_type);
                if mirror.is_empty() {
                    scratch.remove(&record.counterpart);
                }
            }
        }
    }

    /// Bind a confirmed forward/inverse pair into one relationship.
    fn bind_pair(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        target: EntityTypeId,
        forward: &NavigationMember,
        inverse: &NavigationMember,
        ownership: bool,
    ) -> ModelResult<()> {
        if forward.collection && inverse.collection {
            let Some(declared) = builder.skip_navigation(
                entity_type,
                &forward.name,
                target,
                true,
                ConfigurationSource::Convention,
            ) else {
                return Ok(());
            };
            let Some(inverse_nav) = builder.skip_navigation(
                target,
                &inverse.name,
                entity_type,
                true,
                ConfigurationSource::Convention,
            ) else {
                return Ok(());
            };
            builder.set_skip_navigation_inverse(declared, Some(inverse_nav));
            return Ok(());
        }

        // The reference-holding side is the dependent; an owned target is
        // always the dependent regardless of shape. Two references make a
        // one-to-one with the scanned type as dependent.
        let (dependent, principal, dependent_member, principal_member, unique) =
            if ownership && !inverse.collection {
                (target, entity_type, inverse, forward, !forward.collection)
            } else if !forward.collection && inverse.collection {
                (entity_type, target, forward, inverse, false)
            } else if forward.collection && !inverse.collection {
                (target, entity_type, inverse, forward, false)
            } else {
                (entity_type, target, forward, inverse, true)
            };

        let Some(fk) = builder.foreign_key(
            dependent,
            principal,
            unique,
            ownership,
            ConfigurationSource::Convention,
        ) else {
            return Ok(());
        };
        let _ = builder.navigation(fk, true, &dependent_member.name, ConfigurationSource::Convention);
        let _ = builder.navigation(fk, false, &principal_member.name, ConfigurationSource::Convention);
        Ok(())
    }

    /// Bind a forward member with no inverse into a one-sided relationship.
    fn bind_one_sided(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        target: EntityTypeId,
        member: &NavigationMember,
        ownership: bool,
    ) -> ModelResult<()> {
        let fk: Option<ForeignKeyId> = if member.collection {
            // The scanned type holds the collection, so it is the principal.
            builder.foreign_key(
                target,
                entity_type,
                false,
                ownership,
                ConfigurationSource::Convention,
            )
        } else if ownership {
            // A lone reference to an owned type: the owned target is the
            // dependent of a one-to-one, navigated from the owner.
            builder.foreign_key(
                target,
                entity_type,
                true,
                true,
                ConfigurationSource::Convention,
            )
        } else {
            builder.foreign_key(
                entity_type,
                target,
                false,
                false,
                ConfigurationSource::Convention,
            )
        };
        let Some(fk) = fk else {
            return Ok(());
        };
        let on_dependent = !member.collection && !ownership;
        let _ = builder.navigation(fk, on_dependent, &member.name, ConfigurationSource::Convention);
        Ok(())
    }

    /// Remove convention types this pass created that ended up unused.
    fn collect_unused(&self, builder: &mut ModelBuilder, created: Vec<EntityTypeId>) {
        for target in created {
            if !builder.model().is_entity_type_live(target) {
                continue;
            }
            let node = builder.model().entity_type(target);
            if node.source != ConfigurationSource::Convention {
                continue;
            }
            let referenced = !node.foreign_keys.is_empty()
                || !node.referencing_foreign_keys.is_empty()
                || !node.navigations.is_empty()
                || !node.skip_navigations.is_empty()
                || builder.model().skip_navigations().any(|(_, s)| s.target == target);
            if !referenced {
                builder.remove_entity_type(target, ConfigurationSource::Convention);
            }
        }
    }
}

impl Convention for RelationshipDiscovery {
    fn name(&self) -> &'static str {
        "RelationshipDiscovery"
    }
}

impl EntityTypeAddedConvention for RelationshipDiscovery {
    fn entity_type_added(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId> {
        self.discover(builder, entity_type)?;
        Ok(Flow::Continue(entity_type))
    }
}

impl BaseTypeChangedConvention for RelationshipDiscovery {
    fn base_type_changed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
    ) -> ConventionResult<EntityTypeId> {
        self.discover(builder, entity_type)?;
        Ok(Flow::Continue(entity_type))
    }
}

impl MemberIgnoredConvention for RelationshipDiscovery {
    fn member_ignored(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        _member: &str,
    ) -> ConventionResult<()> {
        // Re-open every ambiguity this type participates in: the ignored
        // member may have been the blocking candidate.
        let mut counterparts: Vec<EntityTypeId> = builder
            .model()
            .ambiguous_navigations(entity_type)
            .iter()
            .map(|r| r.counterpart)
            .collect();
        for (&other, records) in &builder.model().scratch.ambiguous_navigations {
            if records.iter().any(|r| r.counterpart == entity_type) {
                counterparts.push(other);
            }
        }
        counterparts.sort();
        counterparts.dedup();

        self.discover(builder, entity_type)?;
        for counterpart in counterparts {
            if builder.model().is_entity_type_live(counterpart) {
                self.discover(builder, counterpart)?;
            }
        }
        Ok(Flow::Continue(()))
    }
}

impl NavigationRemovedConvention for RelationshipDiscovery {
    fn navigation_removed(
        &self,
        builder: &mut ModelBuilder,
        entity_type: EntityTypeId,
        target: EntityTypeId,
        _name: &str,
    ) -> ConventionResult<()> {
        if builder.model().is_entity_type_live(entity_type) {
            self.discover(builder, entity_type)?;
        }
        if target != entity_type && builder.model().is_entity_type_live(target) {
            self.discover(builder, target)?;
        }
        Ok(Flow::Continue(()))
    }
}

impl ForeignKeyRemovedConvention for RelationshipDiscovery {
    fn foreign_key_removed(
        &self,
        builder: &mut ModelBuilder,
        dependent: EntityTypeId,
        principal: EntityTypeId,
        _properties: &[PropertyId],
    ) -> ConventionResult<()> {
        if builder.model().is_entity_type_live(dependent) {
            self.discover(builder, dependent)?;
        }
        if principal != dependent && builder.model().is_entity_type_live(principal) {
            self.discover(builder, principal)?;
        }
        Ok(Flow::Continue(()))
    }
}

impl ForeignKeyOwnershipChangedConvention for RelationshipDiscovery {
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
