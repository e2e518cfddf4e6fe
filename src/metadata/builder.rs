//! The model builder: the mutation surface rules and callers edit through.
//!
//! Every method takes the [`ConfigurationSource`] of the writer and applies
//! the precedence rule: an edit whose authority does not reach the fact's
//! current provenance is a normal, silent no-op (`None`/`false`), never an
//! error. Errors are reserved for structural misuse (properties on the
//! wrong type, key shape mismatches) and for marker conflicts that cannot
//! be resolved by splitting a relationship.

use std::rc::Rc;

use crate::classifier::{MemberClassifier, ScalarType};
use crate::diagnostics::{DiagnosticsSink, ModelDiagnostic};
use crate::error::{ModelError, ModelResult};

use super::arena::{
    EntityTypeId, ForeignKeyId, IndexId, KeyId, NavigationId, PropertyId, SkipNavigationId,
};
use super::graph::Model;
use super::nodes::ValueGeneration;
use super::provenance::ConfigurationSource;

/// Provenance-gated edit API over a [`Model`].
pub struct ModelBuilder {
    model: Model,
    classifier: Rc<dyn MemberClassifier>,
    diagnostics: Rc<dyn DiagnosticsSink>,
}

impl ModelBuilder {
    pub fn new(classifier: Rc<dyn MemberClassifier>, diagnostics: Rc<dyn DiagnosticsSink>) -> Self {
        Self {
            model: Model::new(),
            classifier,
            diagnostics,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub(crate) fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn classifier(&self) -> Rc<dyn MemberClassifier> {
        Rc::clone(&self.classifier)
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticsSink {
        self.diagnostics.as_ref()
    }

    pub(crate) fn report(&self, diagnostic: ModelDiagnostic) {
        self.diagnostics.report(diagnostic);
    }

    // ========================================================================
    // Entity types
    // ========================================================================

    /// Add or retrieve an entity type backed by a structural type.
    ///
    /// Convention writers only get a type that the classifier knows and
    /// that has not been ignored; higher-authority writers may map anything.
    pub fn entity_type(
        &mut self,
        name: &str,
        source: ConfigurationSource,
    ) -> Option<EntityTypeId> {
        if let Some(existing) = self.model.find_entity_type(name) {
            let node = self.model.entity_type_mut(existing);
            node.source = source.max_with(Some(node.source));
            return Some(existing);
        }
        if self.model.is_type_ignored(name) && source == ConfigurationSource::Convention {
            return None;
        }
        if source == ConfigurationSource::Convention && !self.classifier.has_type(name) {
            return None;
        }
        let backing = self.classifier.has_type(name).then(|| name.to_string());
        Some(self.model.insert_entity_type(name.to_string(), backing, source))
    }

    /// Add a shared synthetic entity type with no backing structural type.
    /// The caller picks a free name (see [`naming::uniquify`](crate::naming::uniquify)).
    pub fn shared_entity_type(
        &mut self,
        name: &str,
        source: ConfigurationSource,
    ) -> Option<EntityTypeId> {
        if self.model.find_entity_type(name).is_some() {
            return None;
        }
        Some(self.model.insert_entity_type(name.to_string(), None, source))
    }

    /// Remove an entity type if the writer outranks its creator.
    pub fn remove_entity_type(&mut self, id: EntityTypeId, source: ConfigurationSource) -> bool {
        let Some(node) = self.model.get_entity_type(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.delete_entity_type(id);
        true
    }

    pub fn set_base_type(
        &mut self,
        entity_type: EntityTypeId,
        base: Option<EntityTypeId>,
        source: ConfigurationSource,
    ) -> bool {
        let Some(node) = self.model.get_entity_type(entity_type) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.set_base_type(entity_type, base);
        true
    }

    /// Mark a type name as owned: once mapped, its lifetime is subordinate
    /// to the principal that navigates to it.
    pub fn mark_owned(&mut self, name: &str) {
        self.model.mark_owned_type(name);
    }

    /// Exclude a structural type from mapping entirely.
    pub fn ignore_type(&mut self, name: &str) {
        self.model.add_ignored_type(name);
        if let Some(id) = self.model.find_entity_type(name) {
            self.remove_entity_type(id, ConfigurationSource::Explicit);
        }
    }

    /// Exclude one member from inference, unbinding whatever was already
    /// inferred from it.
    pub fn ignore_member(&mut self, entity_type: EntityTypeId, member: &str) {
        if !self.model.is_entity_type_live(entity_type) {
            return;
        }
        let property = self
            .model
            .entity_type(entity_type)
            .properties
            .iter()
            .copied()
            .find(|&p| self.model.property(p).name == member);
        if let Some(property) = property {
            self.model.delete_property(property);
        }
        if let Some(navigation) = self.model.find_navigation(entity_type, member) {
            self.model.delete_navigation(navigation);
        }
        if let Some(skip) = self.model.find_skip_navigation(entity_type, member) {
            self.model.delete_skip_navigation(skip);
        }
        self.model.add_ignored_member(entity_type, member.to_string());
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Add a property, or upgrade the provenance of an existing one with
    /// the same name and type. A type change requires outranking the
    /// current source and is modeled as remove-plus-add so both events fire.
    #[allow(clippy::too_many_arguments)]
    pub fn property(
        &mut self,
        entity_type: EntityTypeId,
        name: &str,
        value_type: ScalarType,
        nullable: bool,
        shadow: bool,
        source: ConfigurationSource,
    ) -> Option<PropertyId> {
        if !self.model.is_entity_type_live(entity_type) {
            return None;
        }
        if self.model.is_member_ignored(entity_type, name)
            && source == ConfigurationSource::Convention
        {
            return None;
        }
        let existing = self
            .model
            .entity_type(entity_type)
            .properties
            .iter()
            .copied()
            .find(|&p| self.model.property(p).name == name);
        if let Some(existing) = existing {
            let node = self.model.property(existing);
            if node.value_type == value_type {
                let node = self.model.property_mut(existing);
                node.source = source.max_with(Some(node.source));
                if !shadow {
                    node.shadow = false;
                }
                // Nullability is a separately owned fact; re-discovery must
                // not clobber a stronger writer.
                let _ = self.set_property_nullable(existing, nullable, source);
                return Some(existing);
            }
            if !source.overrides(Some(node.source)) {
                return None;
            }
            self.model.delete_property(existing);
        }
        Some(self.model.insert_property(
            entity_type,
            name.to_string(),
            value_type,
            nullable,
            shadow,
            source,
        ))
    }

    pub fn remove_property(&mut self, id: PropertyId, source: ConfigurationSource) -> bool {
        let Some(node) = self.model.get_property(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.delete_property(id);
        true
    }

    /// Returns `Some(changed)` when the writer had authority over the
    /// nullability fact, `None` otherwise.
    pub fn set_property_nullable(
        &mut self,
        id: PropertyId,
        nullable: bool,
        source: ConfigurationSource,
    ) -> Option<bool> {
        let node = self.model.get_property(id)?;
        if !source.overrides(node.nullability_source) {
            return None;
        }
        Some(self.model.set_property_nullable(id, nullable, source))
    }

    pub fn set_value_generation(
        &mut self,
        id: PropertyId,
        value_generation: ValueGeneration,
        source: ConfigurationSource,
    ) -> bool {
        let Some(node) = self.model.get_property(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.set_value_generation(id, value_generation);
        true
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Set the primary key. Fails on structural misuse (empty set,
    /// properties of another type); silently yields `None` when an existing
    /// primary key outranks the writer.
    pub fn primary_key(
        &mut self,
        entity_type: EntityTypeId,
        properties: &[PropertyId],
        source: ConfigurationSource,
    ) -> ModelResult<Option<KeyId>> {
        if !self.model.is_entity_type_live(entity_type) {
            return Ok(None);
        }
        if properties.is_empty() {
            return Err(ModelError::KeylessEntityType(
                self.model.entity_type(entity_type).name.clone(),
            ));
        }
        for &property in properties {
            self.ensure_property_on(entity_type, property)?;
        }
        let existing = self.model.entity_type(entity_type).primary_key;
        if let Some(existing) = existing {
            let key = self.model.key(existing);
            if !source.overrides(Some(key.source)) {
                return Ok(None);
            }
            if key.properties == properties {
                return Ok(Some(existing));
            }
            self.model.delete_key(existing);
        }
        let key = self.model.insert_key(entity_type, properties.to_vec(), source);
        self.model.set_primary_key(entity_type, Some(key));
        // Key properties cannot hold nulls.
        for &property in properties {
            self.model.set_property_nullable(property, false, source);
        }
        Ok(Some(key))
    }

    pub fn remove_key(&mut self, id: KeyId, source: ConfigurationSource) -> bool {
        let Some(node) = self.model.get_key(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.delete_key(id);
        true
    }

    // ========================================================================
    // Foreign keys
    // ========================================================================

    /// Create a foreign key between two mapped entity types. The dependent
    /// property set starts empty and is filled by discovery or by
    /// [`set_foreign_key_properties`](Self::set_foreign_key_properties).
    pub fn foreign_key(
        &mut self,
        dependent: EntityTypeId,
        principal: EntityTypeId,
        unique: bool,
        ownership: bool,
        source: ConfigurationSource,
    ) -> Option<ForeignKeyId> {
        if !self.model.is_entity_type_live(dependent) || !self.model.is_entity_type_live(principal)
        {
            return None;
        }
        // An owned dependent has at most one owning foreign key.
        if ownership {
            let already_owned = self
                .model
                .entity_type(dependent)
                .foreign_keys
                .iter()
                .any(|&fk| self.model.foreign_key(fk).ownership);
            if already_owned {
                return None;
            }
        }
        Some(
            self.model
                .insert_foreign_key(dependent, principal, unique, false, ownership, source),
        )
    }

    pub fn remove_foreign_key(&mut self, id: ForeignKeyId, source: ConfigurationSource) -> bool {
        let Some(node) = self.model.get_foreign_key(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.delete_foreign_key(id);
        true
    }

    /// Configure the dependent property set of a foreign key.
    ///
    /// Returns the foreign key now carrying the property set: normally the
    /// one passed in, but a marker conflict resolved by splitting the
    /// relationship returns the newly created half. `Ok(None)` means the
    /// writer was overridden.
    pub fn set_foreign_key_properties(
        &mut self,
        id: ForeignKeyId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> ModelResult<Option<ForeignKeyId>> {
        let Some(node) = self.model.get_foreign_key(id) else {
            return Ok(None);
        };
        let existing_source = node.properties_source;
        if !source.overrides(existing_source) {
            return Ok(None);
        }
        let conflicting = source == ConfigurationSource::DataAnnotation
            && existing_source == Some(ConfigurationSource::DataAnnotation)
            && !node.properties.is_empty()
            && node.properties != properties;
        if conflicting {
            return self.split_conflicting_relationship(id, properties, source);
        }
        let principal_key = self.validate_foreign_key_properties(id, &properties)?;
        self.model
            .set_foreign_key_properties(id, properties, principal_key, source);
        Ok(Some(id))
    }

    /// Check that a candidate dependent property set belongs to the
    /// dependent type and is shape-compatible with the principal key.
    fn validate_foreign_key_properties(
        &self,
        id: ForeignKeyId,
        properties: &[PropertyId],
    ) -> ModelResult<Option<KeyId>> {
        let fk = self.model.foreign_key(id);
        for &property in properties {
            self.ensure_property_on(fk.dependent, property)?;
        }
        let Some(principal_key) = self.model.entity_type(fk.principal).primary_key else {
            return Ok(None);
        };
        let key_properties = &self.model.key(principal_key).properties;
        if key_properties.len() != properties.len() {
            return Err(ModelError::ForeignKeyPropertyCountMismatch {
                dependent: self.model.entity_type(fk.dependent).name.clone(),
                principal: self.model.entity_type(fk.principal).name.clone(),
                expected: key_properties.len(),
                actual: properties.len(),
            });
        }
        for (&property, &key_property) in properties.iter().zip(key_properties.iter()) {
            if self.model.property(property).value_type
                != self.model.property(key_property).value_type
            {
                return Err(ModelError::IncompatibleForeignKeyProperties {
                    dependent: self.model.entity_type(fk.dependent).name.clone(),
                    principal: self.model.entity_type(fk.principal).name.clone(),
                    property: self.model.property(property).name.clone(),
                });
            }
        }
        Ok(Some(principal_key))
    }

    /// Two equally authoritative property configurations on one foreign
    /// key: keep the original for the dependent-side navigation, move the
    /// principal-side navigation onto a second relationship carrying the
    /// new properties. Impossible when there is no navigation to move.
    fn split_conflicting_relationship(
        &mut self,
        id: ForeignKeyId,
        properties: Vec<PropertyId>,
        source: ConfigurationSource,
    ) -> ModelResult<Option<ForeignKeyId>> {
        let fk = self.model.foreign_key(id).clone();
        let dependent_name = self.model.entity_type(fk.dependent).name.clone();
        let principal_name = self.model.entity_type(fk.principal).name.clone();
        let Some(principal_navigation) = fk.principal_navigation else {
            return Err(ModelError::ConflictingForeignKeyProperties {
                dependent: dependent_name,
                principal: principal_name,
            });
        };
        let navigation_name = self.model.navigation(principal_navigation).name.clone();
        let navigation_source = self.model.navigation(principal_navigation).source;

        self.model.delete_navigation(principal_navigation);
        let new_fk =
            self.model
                .insert_foreign_key(fk.dependent, fk.principal, fk.unique, false, false, source);
        self.model
            .insert_navigation(new_fk, false, navigation_name, navigation_source);
        let principal_key = self.validate_foreign_key_properties(new_fk, &properties)?;
        self.model
            .set_foreign_key_properties(new_fk, properties, principal_key, source);
        self.report(ModelDiagnostic::RelationshipSplit {
            dependent: dependent_name,
            principal: principal_name,
        });
        Ok(Some(new_fk))
    }

    pub fn set_foreign_key_unique(
        &mut self,
        id: ForeignKeyId,
        unique: bool,
        source: ConfigurationSource,
    ) -> Option<bool> {
        let node = self.model.get_foreign_key(id)?;
        if !source.overrides(node.unique_source) {
            return None;
        }
        Some(self.model.set_foreign_key_unique(id, unique, source))
    }

    pub fn set_foreign_key_required(
        &mut self,
        id: ForeignKeyId,
        required: bool,
        source: ConfigurationSource,
    ) -> Option<bool> {
        let node = self.model.get_foreign_key(id)?;
        if !source.overrides(node.required_source) {
            return None;
        }
        Some(self.model.set_foreign_key_required(id, required, source))
    }

    pub fn set_foreign_key_ownership(
        &mut self,
        id: ForeignKeyId,
        ownership: bool,
        source: ConfigurationSource,
    ) -> Option<bool> {
        let node = self.model.get_foreign_key(id)?;
        if !source.overrides(node.ownership_source) {
            return None;
        }
        Some(self.model.set_foreign_key_ownership(id, ownership, source))
    }

    // ========================================================================
    // Navigations
    // ========================================================================

    /// Bind a navigation to one end of a foreign key, replacing a
    /// lower-or-equal-authority occupant of that end.
    pub fn navigation(
        &mut self,
        foreign_key: ForeignKeyId,
        on_dependent: bool,
        name: &str,
        source: ConfigurationSource,
    ) -> Option<NavigationId> {
        let node = self.model.get_foreign_key(foreign_key)?;
        let declaring = if on_dependent {
            node.dependent
        } else {
            node.principal
        };
        let occupant = if on_dependent {
            node.dependent_navigation
        } else {
            node.principal_navigation
        };
        if let Some(occupant) = occupant {
            let existing = self.model.navigation(occupant);
            if existing.name == name {
                return Some(occupant);
            }
            if !source.overrides(Some(existing.source)) {
                return None;
            }
            self.model.delete_navigation(occupant);
        }
        // A same-named navigation on the declaring type bound to a different
        // foreign key blocks this one unless outranked.
        if let Some(clashing) = self.model.find_navigation(declaring, name) {
            if !source.overrides(Some(self.model.navigation(clashing).source)) {
                return None;
            }
            self.model.delete_navigation(clashing);
        }
        Some(
            self.model
                .insert_navigation(foreign_key, on_dependent, name.to_string(), source),
        )
    }

    pub fn remove_navigation(&mut self, id: NavigationId, source: ConfigurationSource) -> bool {
        let Some(node) = self.model.get_navigation(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.delete_navigation(id);
        true
    }

    // ========================================================================
    // Skip navigations
    // ========================================================================

    pub fn skip_navigation(
        &mut self,
        entity_type: EntityTypeId,
        name: &str,
        target: EntityTypeId,
        collection: bool,
        source: ConfigurationSource,
    ) -> Option<SkipNavigationId> {
        if !self.model.is_entity_type_live(entity_type) || !self.model.is_entity_type_live(target)
        {
            return None;
        }
        if let Some(existing) = self.model.find_skip_navigation(entity_type, name) {
            return Some(existing);
        }
        Some(self.model.insert_skip_navigation(
            entity_type,
            name.to_string(),
            target,
            collection,
            source,
        ))
    }

    pub fn remove_skip_navigation(
        &mut self,
        id: SkipNavigationId,
        source: ConfigurationSource,
    ) -> bool {
        let Some(node) = self.model.get_skip_navigation(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.delete_skip_navigation(id);
        true
    }

    /// Pair (or unpair) two skip navigations symmetrically. Old partners on
    /// either side are unpaired first.
    pub fn set_skip_navigation_inverse(
        &mut self,
        id: SkipNavigationId,
        inverse: Option<SkipNavigationId>,
    ) {
        if !self.model.is_skip_navigation_live(id) {
            return;
        }
        let old = self.model.skip_navigation(id).inverse;
        if old == inverse {
            return;
        }
        if let Some(old) = old {
            if self.model.is_skip_navigation_live(old) {
                self.model.set_skip_navigation_inverse(old, None);
            }
        }
        if let Some(new) = inverse {
            if let Some(previous) = self.model.skip_navigation(new).inverse {
                if previous != id && self.model.is_skip_navigation_live(previous) {
                    self.model.set_skip_navigation_inverse(previous, None);
                }
            }
            self.model.set_skip_navigation_inverse(new, Some(id));
        }
        self.model.set_skip_navigation_inverse(id, inverse);
    }

    pub fn set_skip_navigation_foreign_key(
        &mut self,
        id: SkipNavigationId,
        foreign_key: Option<ForeignKeyId>,
    ) {
        if !self.model.is_skip_navigation_live(id) {
            return;
        }
        self.model.set_skip_navigation_foreign_key(id, foreign_key);
    }

    // ========================================================================
    // Indexes
    // ========================================================================

    /// Create an index, or return the existing index on exactly these
    /// properties (upgrading its uniqueness when the writer has authority).
    pub fn index(
        &mut self,
        entity_type: EntityTypeId,
        properties: Vec<PropertyId>,
        unique: bool,
        source: ConfigurationSource,
    ) -> ModelResult<Option<IndexId>> {
        if !self.model.is_entity_type_live(entity_type) || properties.is_empty() {
            return Ok(None);
        }
        for &property in &properties {
            self.ensure_property_on(entity_type, property)?;
        }
        let existing = self
            .model
            .entity_type(entity_type)
            .indexes
            .iter()
            .copied()
            .find(|&i| self.model.index(i).properties == properties);
        if let Some(existing) = existing {
            self.set_index_unique(existing, unique, source);
            return Ok(Some(existing));
        }
        Ok(Some(
            self.model
                .insert_index(entity_type, properties, unique, source),
        ))
    }

    pub fn remove_index(&mut self, id: IndexId, source: ConfigurationSource) -> bool {
        let Some(node) = self.model.get_index(id) else {
            return false;
        };
        if !source.overrides(Some(node.source)) {
            return false;
        }
        self.model.delete_index(id);
        true
    }

    pub fn set_index_unique(
        &mut self,
        id: IndexId,
        unique: bool,
        source: ConfigurationSource,
    ) -> Option<bool> {
        let node = self.model.get_index(id)?;
        if !source.overrides(node.unique_source) {
            return None;
        }
        Some(self.model.set_index_unique(id, unique, source))
    }

    // ========================================================================
    // Shared checks
    // ========================================================================

    fn ensure_property_on(
        &self,
        entity_type: EntityTypeId,
        property: PropertyId,
    ) -> ModelResult<()> {
        let node = self.model.property(property);
        let mut current = Some(entity_type);
        while let Some(id) = current {
            if node.entity_type == id {
                return Ok(());
            }
            current = self.model.entity_type(id).base_type;
        }
        Err(ModelError::PropertyNotOnType {
            property: node.name.clone(),
            entity_type: self.model.entity_type(entity_type).name.clone(),
        })
    }
}
