//! The mutable metadata graph.
//!
//! [`Model`] owns one generational arena per node kind plus the name
//! indexes, the pending-event queue, and the typed scratch side-tables used
//! by discovery rules. Every semantic mutation goes through a method here
//! and records exactly one [`ModelEvent`]; nothing appends to a node's
//! membership sets directly, so rules always observe edits.
//!
//! Provenance gating lives one layer up in
//! [`ModelBuilder`](super::builder::ModelBuilder); the methods here are the
//! raw edit API and assume the caller already holds the authority to write.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::classifier::ScalarType;
use crate::dispatch::events::ModelEvent;

use super::arena::{
    Arena, EntityTypeId, ForeignKeyId, IndexId, KeyId, NavigationId, PropertyId, SkipNavigationId,
};
use super::nodes::{
    AmbiguityRecord, EntityTypeNode, ForeignKeyNode, IndexNode, KeyNode, NavigationNode,
    PropertyNode, SkipNavigationNode, ValueGeneration,
};
use super::provenance::ConfigurationSource;

/// Typed side-tables used as rule scratch state, cleared at finalization.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scratch {
    /// Unresolved relationship ambiguities, keyed by entity type.
    pub ambiguous_navigations: HashMap<EntityTypeId, Vec<AmbiguityRecord>>,
}

/// The schema-shaped metadata graph.
#[derive(Debug, Clone, Default)]
pub struct Model {
    entity_types: Arena<EntityTypeId, EntityTypeNode>,
    properties: Arena<PropertyId, PropertyNode>,
    keys: Arena<KeyId, KeyNode>,
    foreign_keys: Arena<ForeignKeyId, ForeignKeyNode>,
    navigations: Arena<NavigationId, NavigationNode>,
    skip_navigations: Arena<SkipNavigationId, SkipNavigationNode>,
    indexes: Arena<IndexId, IndexNode>,

    by_name: HashMap<String, EntityTypeId>,
    ignored_types: HashSet<String>,
    owned_types: HashSet<String>,

    events: VecDeque<ModelEvent>,
    pub(crate) scratch: Scratch,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn entity_type(&self, id: EntityTypeId) -> &EntityTypeNode {
        self.entity_types.get(id).expect("stale entity type id")
    }

    pub fn get_entity_type(&self, id: EntityTypeId) -> Option<&EntityTypeNode> {
        self.entity_types.get(id)
    }

    pub(crate) fn entity_type_mut(&mut self, id: EntityTypeId) -> &mut EntityTypeNode {
        self.entity_types.get_mut(id).expect("stale entity type id")
    }

    pub fn property(&self, id: PropertyId) -> &PropertyNode {
        self.properties.get(id).expect("stale property id")
    }

    pub fn get_property(&self, id: PropertyId) -> Option<&PropertyNode> {
        self.properties.get(id)
    }

    pub(crate) fn property_mut(&mut self, id: PropertyId) -> &mut PropertyNode {
        self.properties.get_mut(id).expect("stale property id")
    }

    pub fn key(&self, id: KeyId) -> &KeyNode {
        self.keys.get(id).expect("stale key id")
    }

    pub fn get_key(&self, id: KeyId) -> Option<&KeyNode> {
        self.keys.get(id)
    }

    pub fn foreign_key(&self, id: ForeignKeyId) -> &ForeignKeyNode {
        self.foreign_keys.get(id).expect("stale foreign key id")
    }

    pub fn get_foreign_key(&self, id: ForeignKeyId) -> Option<&ForeignKeyNode> {
        self.foreign_keys.get(id)
    }

    pub fn navigation(&self, id: NavigationId) -> &NavigationNode {
        self.navigations.get(id).expect("stale navigation id")
    }

    pub fn get_navigation(&self, id: NavigationId) -> Option<&NavigationNode> {
        self.navigations.get(id)
    }

    pub fn skip_navigation(&self, id: SkipNavigationId) -> &SkipNavigationNode {
        self.skip_navigations
            .get(id)
            .expect("stale skip navigation id")
    }

    pub fn get_skip_navigation(&self, id: SkipNavigationId) -> Option<&SkipNavigationNode> {
        self.skip_navigations.get(id)
    }

    pub fn index(&self, id: IndexId) -> &IndexNode {
        self.indexes.get(id).expect("stale index id")
    }

    pub fn get_index(&self, id: IndexId) -> Option<&IndexNode> {
        self.indexes.get(id)
    }

    pub fn find_entity_type(&self, name: &str) -> Option<EntityTypeId> {
        self.by_name.get(name).copied()
    }

    /// Find a declared property by name, walking the base-type chain.
    pub fn find_property(&self, entity_type: EntityTypeId, name: &str) -> Option<PropertyId> {
        let mut current = Some(entity_type);
        while let Some(id) = current {
            let node = self.entity_types.get(id)?;
            for &property in &node.properties {
                if self.property(property).name == name {
                    return Some(property);
                }
            }
            current = node.base_type;
        }
        None
    }

    /// Find a navigation declared on the given type by name.
    pub fn find_navigation(&self, entity_type: EntityTypeId, name: &str) -> Option<NavigationId> {
        let node = self.entity_types.get(entity_type)?;
        node.navigations
            .iter()
            .copied()
            .find(|&n| self.navigation(n).name == name)
    }

    /// Find a skip navigation declared on the given type by name.
    pub fn find_skip_navigation(
        &self,
        entity_type: EntityTypeId,
        name: &str,
    ) -> Option<SkipNavigationId> {
        let node = self.entity_types.get(entity_type)?;
        node.skip_navigations
            .iter()
            .copied()
            .find(|&n| self.skip_navigation(n).name == name)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = (EntityTypeId, &EntityTypeNode)> + '_ {
        self.entity_types.iter()
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (ForeignKeyId, &ForeignKeyNode)> + '_ {
        self.foreign_keys.iter()
    }

    pub fn skip_navigations(
        &self,
    ) -> impl Iterator<Item = (SkipNavigationId, &SkipNavigationNode)> + '_ {
        self.skip_navigations.iter()
    }

    pub fn is_entity_type_live(&self, id: EntityTypeId) -> bool {
        self.entity_types.contains(id)
    }

    pub fn is_property_live(&self, id: PropertyId) -> bool {
        self.properties.contains(id)
    }

    pub fn is_key_live(&self, id: KeyId) -> bool {
        self.keys.contains(id)
    }

    pub fn is_foreign_key_live(&self, id: ForeignKeyId) -> bool {
        self.foreign_keys.contains(id)
    }

    pub fn is_navigation_live(&self, id: NavigationId) -> bool {
        self.navigations.contains(id)
    }

    pub fn is_skip_navigation_live(&self, id: SkipNavigationId) -> bool {
        self.skip_navigations.contains(id)
    }

    pub fn is_index_live(&self, id: IndexId) -> bool {
        self.indexes.contains(id)
    }

    pub fn is_type_ignored(&self, name: &str) -> bool {
        self.ignored_types.contains(name)
    }

    /// Whether a member is ignored on the type or any of its base types.
    pub fn is_member_ignored(&self, entity_type: EntityTypeId, member: &str) -> bool {
        let mut current = Some(entity_type);
        while let Some(id) = current {
            let Some(node) = self.entity_types.get(id) else {
                return false;
            };
            if node.ignored_members.contains(member) {
                return true;
            }
            current = node.base_type;
        }
        false
    }

    pub fn is_owned_type(&self, name: &str) -> bool {
        self.owned_types.contains(name)
    }

    /// Unresolved relationship ambiguities recorded on an entity type.
    pub fn ambiguous_navigations(&self, entity_type: EntityTypeId) -> &[AmbiguityRecord] {
        self.scratch
            .ambiguous_navigations
            .get(&entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total live node count, used to bound event cascades.
    pub fn node_count(&self) -> usize {
        self.entity_types.len()
            + self.properties.len()
            + self.keys.len()
            + self.foreign_keys.len()
            + self.navigations.len()
            + self.skip_navigations.len()
            + self.indexes.len()
    }

    // ========================================================================
    // Event queue
    // ========================================================================

    pub(crate) fn record(&mut self, event: ModelEvent) {
        self.events.push_back(event);
    }

    pub(crate) fn pop_event(&mut self) -> Option<ModelEvent> {
        self.events.pop_front()
    }

    pub(crate) fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // ========================================================================
    // Entity types
    // ========================================================================

    pub(crate) fn insert_entity_type(
        &mut self,
        name: String,
        backing_type: Option<String>,
        source: ConfigurationSource,
    ) -> EntityTypeId {
        let owned = self.owned_types.contains(&name);
        let id = self.entity_types.insert(EntityTypeNode {
            name: name.clone(),
            backing_type,
            base_type: None,
            owned,
            source,
            properties: Vec::new(),
            keys: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            referencing_foreign_keys: Vec::new(),
            navigations: Vec::new(),
            skip_navigations: Vec::new(),
            indexes: Vec::new(),
            ignored_members: HashSet::new(),
        });
        self.by_name.insert(name, id);
        self.record(ModelEvent::EntityTypeAdded(id));
        id
    }

    /// Remove an entity type and everything declared on or referencing it.
    pub(crate) fn delete_entity_type(&mut self, id: EntityTypeId) {
        if !self.entity_types.contains(id) {
            return;
        }
        let declared = self.entity_types[id].foreign_keys.clone();
        let referencing = self.entity_types[id].referencing_foreign_keys.clone();
        for fk in declared.into_iter().chain(referencing) {
            self.delete_foreign_key(fk);
        }

        let declared_skips = self.entity_types[id].skip_navigations.clone();
        for nav in declared_skips {
            self.delete_skip_navigation(nav);
        }
        let targeting: Vec<SkipNavigationId> = self
            .skip_navigations
            .iter()
            .filter(|(_, n)| n.target == id)
            .map(|(i, _)| i)
            .collect();
        for nav in targeting {
            self.delete_skip_navigation(nav);
        }

        for index in self.entity_types[id].indexes.clone() {
            self.delete_index(index);
        }
        for key in self.entity_types[id].keys.clone() {
            self.delete_key(key);
        }
        for property in self.entity_types[id].properties.clone() {
            self.delete_property(property);
        }

        let derived: Vec<EntityTypeId> = self
            .entity_types
            .iter()
            .filter(|(other, n)| *other != id && n.base_type == Some(id))
            .map(|(i, _)| i)
            .collect();
        for d in derived {
            self.set_base_type(d, None);
        }

        let node = self
            .entity_types
            .remove(id)
            .expect("entity type vanished during cascade");
        self.by_name.remove(&node.name);
        self.scratch.ambiguous_navigations.remove(&id);
        self.record(ModelEvent::EntityTypeRemoved { name: node.name });
    }

    pub(crate) fn set_base_type(&mut self, entity_type: EntityTypeId, base: Option<EntityTypeId>) {
        let node = self.entity_type_mut(entity_type);
        if node.base_type == base {
            return;
        }
        node.base_type = base;
        self.record(ModelEvent::BaseTypeChanged(entity_type));
    }

    pub(crate) fn set_owned(&mut self, entity_type: EntityTypeId, owned: bool) {
        self.entity_type_mut(entity_type).owned = owned;
    }

    pub(crate) fn mark_owned_type(&mut self, name: &str) {
        self.owned_types.insert(name.to_string());
        if let Some(id) = self.find_entity_type(name) {
            self.set_owned(id, true);
        }
    }

    pub(crate) fn add_ignored_type(&mut self, name: &str) {
        self.ignored_types.insert(name.to_string());
    }

    pub(crate) fn add_ignored_member(&mut self, entity_type: EntityTypeId, member: String) {
        let node = self.entity_type_mut(entity_type);
        if !node.ignored_members.insert(member.clone()) {
            return;
        }
        self.record(ModelEvent::MemberIgnored {
            entity_type,
            member,
        });
    }

    // ========================================================================
    // Properties
    // ========================================================================

    pub(crate) fn insert_property(
        &mut self,
        entity_type: EntityTypeId,
        name: String,
        value_type: ScalarType,
        nullable: bool,
        shadow: bool,
        source: ConfigurationSource,
    ) -> PropertyId {
        let id = self.properties.insert(PropertyNode {
            name,
            entity_type,
            value_type,
            nullable,
            shadow,
            value_generation: ValueGeneration::Never,
            source,
            nullability_source: None,
        });
        self.entity_type_mut(entity_type).properties.push(id);
        self.record(ModelEvent::PropertyAdded(id));
        id
    }

    /// Remove a property; keys, foreign-key property sets, and indexes that
    /// use it are torn down or cleared first so the graph never references
    /// a removed object.
    pub(crate) fn delete_property(&mut self, id: PropertyId) {
        if !self.properties.contains(id) {
            return;
        }
        let entity_type = self.properties[id].entity_type;

        let keys: Vec<KeyId> = self
            .keys
            .iter()
            .filter(|(_, k)| k.properties.contains(&id))
            .map(|(i, _)| i)
            .collect();
        for key in keys {
            self.delete_key(key);
        }

        let foreign_keys: Vec<ForeignKeyId> = self
            .foreign_keys
            .iter()
            .filter(|(_, fk)| fk.properties.contains(&id))
            .map(|(i, _)| i)
            .collect();
        for fk in foreign_keys {
            self.clear_foreign_key_properties(fk);
        }

        let indexes: Vec<IndexId> = self
            .indexes
            .iter()
            .filter(|(_, ix)| ix.properties.contains(&id))
            .map(|(i, _)| i)
            .collect();
        for index in indexes {
            self.delete_index(index);
        }

        let node = self.properties.remove(id).expect("property vanished");
        if let Some(owner) = self.entity_types.get_mut(entity_type) {
            owner.properties.retain(|&p| p != id);
        }
        self.record(ModelEvent::PropertyRemoved {
            entity_type,
            name: node.name,
        });
    }

    /// Returns true when the stored nullability actually changed.
    pub(crate) fn set_property_nullable(
        &mut self,
        id: PropertyId,
        nullable: bool,
        source: ConfigurationSource,
    ) -> bool {
        let node = self.properties.get_mut(id).expect("stale property id");
        node.nullability_source = Some(source.max_with(node.nullability_source));
        if node.nullable == nullable {
            return false;
        }
        node.nullable = nullable;
        self.record(ModelEvent::PropertyNullabilityChanged(id));
        true
    }

    pub(crate) fn set_value_generation(&mut self, id: PropertyId, value_generation: ValueGeneration) {
        self.properties.get_mut(id).expect("stale property id").value_generation =
            value_generation;
    }

    // ========================================================================
    // Keys
    // ========================================================================

    pub(crate) fn insert_key(
        &mut self,
        entity_type: EntityTypeId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> KeyId {
        let id = self.keys.insert(KeyNode {
            entity_type,
            properties,
            source,
        });
        self.entity_type_mut(entity_type).keys.push(id);
        self.record(ModelEvent::KeyAdded(id));
        id
    }

    pub(crate) fn delete_key(&mut self, id: KeyId) {
        if !self.keys.contains(id) {
            return;
        }
        let node = self.keys.remove(id).expect("key vanished");

        let dangling: Vec<ForeignKeyId> = self
            .foreign_keys
            .iter()
            .filter(|(_, fk)| fk.principal_key == Some(id))
            .map(|(i, _)| i)
            .collect();
        for fk in dangling {
            self.foreign_keys[fk].principal_key = None;
        }

        if let Some(owner) = self.entity_types.get_mut(node.entity_type) {
            owner.keys.retain(|&k| k != id);
            if owner.primary_key == Some(id) {
                owner.primary_key = None;
                self.record(ModelEvent::PrimaryKeyChanged(node.entity_type));
            }
        }
        self.record(ModelEvent::KeyRemoved {
            entity_type: node.entity_type,
            properties: node.properties,
        });
    }

    pub(crate) fn set_primary_key(&mut self, entity_type: EntityTypeId, key: Option<KeyId>) {
        let node = self.entity_type_mut(entity_type);
        if node.primary_key == key {
            return;
        }
        node.primary_key = key;
        self.record(ModelEvent::PrimaryKeyChanged(entity_type));
    }

    // ========================================================================
    // Foreign keys
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn insert_foreign_key(
        &mut self,
        dependent: EntityTypeId,
        principal: EntityTypeId,
        unique: bool,
        required: bool,
        ownership: bool,
        source: ConfigurationSource,
    ) -> ForeignKeyId {
        let id = self.foreign_keys.insert(ForeignKeyNode {
            dependent,
            principal,
            properties: Vec::new(),
            principal_key: None,
            unique,
            required,
            ownership,
            dependent_navigation: None,
            principal_navigation: None,
            source,
            properties_source: None,
            principal_end_source: Some(source),
            unique_source: Some(source),
            required_source: None,
            ownership_source: ownership.then_some(source),
        });
        self.entity_type_mut(dependent).foreign_keys.push(id);
        self.entity_type_mut(principal)
            .referencing_foreign_keys
            .push(id);
        self.record(ModelEvent::ForeignKeyAdded(id));
        id
    }

    pub(crate) fn delete_foreign_key(&mut self, id: ForeignKeyId) {
        if !self.foreign_keys.contains(id) {
            return;
        }
        let navigations: Vec<NavigationId> = [
            self.foreign_keys[id].dependent_navigation,
            self.foreign_keys[id].principal_navigation,
        ]
        .into_iter()
        .flatten()
        .collect();
        for nav in navigations {
            self.delete_navigation(nav);
        }

        let referencing: Vec<SkipNavigationId> = self
            .skip_navigations
            .iter()
            .filter(|(_, n)| n.foreign_key == Some(id))
            .map(|(i, _)| i)
            .collect();
        for nav in referencing {
            self.set_skip_navigation_foreign_key(nav, None);
        }

        let node = self.foreign_keys.remove(id).expect("foreign key vanished");
        if let Some(dependent) = self.entity_types.get_mut(node.dependent) {
            dependent.foreign_keys.retain(|&fk| fk != id);
        }
        if let Some(principal) = self.entity_types.get_mut(node.principal) {
            principal.referencing_foreign_keys.retain(|&fk| fk != id);
        }
        self.record(ModelEvent::ForeignKeyRemoved {
            dependent: node.dependent,
            principal: node.principal,
            properties: node.properties,
        });
    }

    /// Returns true when the property set actually changed.
    pub(crate) fn set_foreign_key_properties(
        &mut self,
        id: ForeignKeyId,
        properties: Vec<PropertyId>,
        principal_key: Option<KeyId>,
        source: ConfigurationSource,
    ) -> bool {
        let node = self.foreign_keys.get_mut(id).expect("stale foreign key id");
        node.properties_source = Some(source.max_with(node.properties_source));
        if node.properties == properties && node.principal_key == principal_key {
            return false;
        }
        node.properties = properties;
        node.principal_key = principal_key;
        self.record(ModelEvent::ForeignKeyPropertiesChanged(id));
        true
    }

    /// Clear the dependent property set back to "undiscovered".
    pub(crate) fn clear_foreign_key_properties(&mut self, id: ForeignKeyId) {
        let node = self.foreign_keys.get_mut(id).expect("stale foreign key id");
        if node.properties.is_empty() {
            return;
        }
        node.properties = Vec::new();
        node.principal_key = None;
        node.properties_source = None;
        self.record(ModelEvent::ForeignKeyPropertiesChanged(id));
    }

    pub(crate) fn set_foreign_key_unique(
        &mut self,
        id: ForeignKeyId,
        unique: bool,
        source: ConfigurationSource,
    ) -> bool {
        let node = self.foreign_keys.get_mut(id).expect("stale foreign key id");
        node.unique_source = Some(source.max_with(node.unique_source));
        if node.unique == unique {
            return false;
        }
        node.unique = unique;
        self.record(ModelEvent::ForeignKeyUniquenessChanged(id));
        true
    }

    pub(crate) fn set_foreign_key_required(
        &mut self,
        id: ForeignKeyId,
        required: bool,
        source: ConfigurationSource,
    ) -> bool {
        let node = self.foreign_keys.get_mut(id).expect("stale foreign key id");
        node.required_source = Some(source.max_with(node.required_source));
        if node.required == required {
            return false;
        }
        node.required = required;
        self.record(ModelEvent::ForeignKeyRequiredChanged(id));
        true
    }

    pub(crate) fn set_foreign_key_ownership(
        &mut self,
        id: ForeignKeyId,
        ownership: bool,
        source: ConfigurationSource,
    ) -> bool {
        let node = self.foreign_keys.get_mut(id).expect("stale foreign key id");
        node.ownership_source = Some(source.max_with(node.ownership_source));
        if node.ownership == ownership {
            return false;
        }
        node.ownership = ownership;
        self.record(ModelEvent::ForeignKeyOwnershipChanged(id));
        true
    }

    // ========================================================================
    // Navigations
    // ========================================================================

    /// Bind a navigation to one end of a foreign key. The slot must be
    /// empty; replacing goes through removal first so both events fire.
    pub(crate) fn insert_navigation(
        &mut self,
        foreign_key: ForeignKeyId,
        on_dependent: bool,
        name: String,
        source: ConfigurationSource,
    ) -> NavigationId {
        let (declaring, target, collection) = {
            let fk = &self.foreign_keys[foreign_key];
            if on_dependent {
                (fk.dependent, fk.principal, false)
            } else {
                (fk.principal, fk.dependent, !fk.unique)
            }
        };
        let id = self.navigations.insert(NavigationNode {
            name,
            declaring,
            target,
            foreign_key,
            on_dependent,
            collection,
            source,
        });
        {
            let fk = self.foreign_keys.get_mut(foreign_key).expect("stale fk id");
            if on_dependent {
                debug_assert!(fk.dependent_navigation.is_none());
                fk.dependent_navigation = Some(id);
            } else {
                debug_assert!(fk.principal_navigation.is_none());
                fk.principal_navigation = Some(id);
            }
        }
        self.entity_type_mut(declaring).navigations.push(id);
        self.record(ModelEvent::NavigationAdded(id));
        id
    }

    pub(crate) fn delete_navigation(&mut self, id: NavigationId) {
        if !self.navigations.contains(id) {
            return;
        }
        let node = self.navigations.remove(id).expect("navigation vanished");
        if let Some(owner) = self.entity_types.get_mut(node.declaring) {
            owner.navigations.retain(|&n| n != id);
        }
        if let Some(fk) = self.foreign_keys.get_mut(node.foreign_key) {
            if fk.dependent_navigation == Some(id) {
                fk.dependent_navigation = None;
            }
            if fk.principal_navigation == Some(id) {
                fk.principal_navigation = None;
            }
        }
        self.record(ModelEvent::NavigationRemoved {
            entity_type: node.declaring,
            target: node.target,
            name: node.name,
        });
    }

    // ========================================================================
    // Skip navigations
    // ========================================================================

    pub(crate) fn insert_skip_navigation(
        &mut self,
        entity_type: EntityTypeId,
        name: String,
        target: EntityTypeId,
        collection: bool,
        source: ConfigurationSource,
    ) -> SkipNavigationId {
        let id = self.skip_navigations.insert(SkipNavigationNode {
            name,
            declaring: entity_type,
            target,
            inverse: None,
            foreign_key: None,
            join_entity: None,
            collection,
            source,
        });
        self.entity_type_mut(entity_type).skip_navigations.push(id);
        self.record(ModelEvent::SkipNavigationAdded(id));
        id
    }

    pub(crate) fn delete_skip_navigation(&mut self, id: SkipNavigationId) {
        if !self.skip_navigations.contains(id) {
            return;
        }
        let node = self
            .skip_navigations
            .remove(id)
            .expect("skip navigation vanished");
        if let Some(owner) = self.entity_types.get_mut(node.declaring) {
            owner.skip_navigations.retain(|&n| n != id);
        }
        if let Some(inverse) = node.inverse {
            if let Some(partner) = self.skip_navigations.get_mut(inverse) {
                if partner.inverse == Some(id) {
                    partner.inverse = None;
                    self.record(ModelEvent::SkipNavigationInverseChanged(inverse));
                }
            }
        }
        self.record(ModelEvent::SkipNavigationRemoved {
            entity_type: node.declaring,
            target: node.target,
            name: node.name,
            join_entity: node.join_entity,
        });
    }

    /// Set one side's inverse pointer. Symmetric pairing is the builder's
    /// job; this records one event per actually-changed side.
    pub(crate) fn set_skip_navigation_inverse(
        &mut self,
        id: SkipNavigationId,
        inverse: Option<SkipNavigationId>,
    ) {
        let node = self
            .skip_navigations
            .get_mut(id)
            .expect("stale skip navigation id");
        if node.inverse == inverse {
            return;
        }
        node.inverse = inverse;
        self.record(ModelEvent::SkipNavigationInverseChanged(id));
    }

    /// Bind or clear the join-side foreign key; the join entity pointer is
    /// derived from the foreign key's dependent end.
    pub(crate) fn set_skip_navigation_foreign_key(
        &mut self,
        id: SkipNavigationId,
        foreign_key: Option<ForeignKeyId>,
    ) {
        let join_entity = foreign_key.map(|fk| self.foreign_keys[fk].dependent);
        let node = self
            .skip_navigations
            .get_mut(id)
            .expect("stale skip navigation id");
        if node.foreign_key == foreign_key {
            return;
        }
        let old_foreign_key = node.foreign_key;
        node.foreign_key = foreign_key;
        node.join_entity = join_entity;
        self.record(ModelEvent::SkipNavigationForeignKeyChanged {
            navigation: id,
            old_foreign_key,
        });
    }

    // ========================================================================
    // Indexes
    // ========================================================================

    pub(crate) fn insert_index(
        &mut self,
        entity_type: EntityTypeId,
        properties: Vec<PropertyId>,
        unique: bool,
        source: ConfigurationSource,
    ) -> IndexId {
        let id = self.indexes.insert(IndexNode {
            entity_type,
            properties,
            unique,
            source,
            unique_source: Some(source),
        });
        self.entity_type_mut(entity_type).indexes.push(id);
        self.record(ModelEvent::IndexAdded(id));
        id
    }

    pub(crate) fn delete_index(&mut self, id: IndexId) {
        if !self.indexes.contains(id) {
            return;
        }
        let node = self.indexes.remove(id).expect("index vanished");
        if let Some(owner) = self.entity_types.get_mut(node.entity_type) {
            owner.indexes.retain(|&i| i != id);
        }
        self.record(ModelEvent::IndexRemoved {
            entity_type: node.entity_type,
            properties: node.properties,
        });
    }

    pub(crate) fn set_index_unique(
        &mut self,
        id: IndexId,
        unique: bool,
        source: ConfigurationSource,
    ) -> bool {
        let node = self.indexes.get_mut(id).expect("stale index id");
        node.unique_source = Some(source.max_with(node.unique_source));
        if node.unique == unique {
            return false;
        }
        node.unique = unique;
        self.record(ModelEvent::IndexUniquenessChanged(id));
        true
    }

    // ========================================================================
    // Finalization
    // ========================================================================

    pub(crate) fn clear_scratch(&mut self) {
        self.scratch.ambiguous_navigations.clear();
    }
}
