//! Deterministic, serializable view of a model.
//!
//! The snapshot flattens arena ids into names and sorts every collection,
//! so two models with identical semantics produce identical snapshots
//! regardless of discovery order. Tests use snapshot equality to assert
//! graph-wide properties like idempotence; hosts can serialize it for
//! debugging dumps.

use serde::Serialize;

use crate::classifier::ScalarType;

use super::graph::Model;
use super::provenance::ConfigurationSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySnapshot {
    pub name: String,
    pub value_type: ScalarType,
    pub nullable: bool,
    pub shadow: bool,
    pub source: ConfigurationSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeySnapshot {
    pub dependent: String,
    pub principal: String,
    pub properties: Vec<String>,
    pub unique: bool,
    pub required: bool,
    pub ownership: bool,
    pub dependent_navigation: Option<String>,
    pub principal_navigation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipNavigationSnapshot {
    pub name: String,
    pub target: String,
    pub inverse: Option<String>,
    pub join_entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IndexSnapshot {
    pub properties: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityTypeSnapshot {
    pub name: String,
    pub backing_type: Option<String>,
    pub base_type: Option<String>,
    pub owned: bool,
    pub source: ConfigurationSource,
    pub properties: Vec<PropertySnapshot>,
    pub primary_key: Option<Vec<String>>,
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    pub skip_navigations: Vec<SkipNavigationSnapshot>,
    pub indexes: Vec<IndexSnapshot>,
}

/// A full-model snapshot, ordered by entity type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSnapshot {
    pub entity_types: Vec<EntityTypeSnapshot>,
}

impl ModelSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Model {
    /// Capture a deterministic snapshot of the current graph.
    pub fn snapshot(&self) -> ModelSnapshot {
        let mut entity_types: Vec<EntityTypeSnapshot> = self
            .entity_types()
            .map(|(id, node)| {
                let mut properties: Vec<PropertySnapshot> = node
                    .properties
                    .iter()
                    .map(|&p| {
                        let property = self.property(p);
                        PropertySnapshot {
                            name: property.name.clone(),
                            value_type: property.value_type,
                            nullable: property.nullable,
                            shadow: property.shadow,
                            source: property.source,
                        }
                    })
                    .collect();
                properties.sort_by(|a, b| a.name.cmp(&b.name));

                let primary_key = node.primary_key.map(|k| {
                    self.key(k)
                        .properties
                        .iter()
                        .map(|&p| self.property(p).name.clone())
                        .collect()
                });

                let mut foreign_keys: Vec<ForeignKeySnapshot> = node
                    .foreign_keys
                    .iter()
                    .map(|&fk| {
                        let foreign_key = self.foreign_key(fk);
                        ForeignKeySnapshot {
                            dependent: self.entity_type(foreign_key.dependent).name.clone(),
                            principal: self.entity_type(foreign_key.principal).name.clone(),
                            properties: foreign_key
                                .properties
                                .iter()
                                .map(|&p| self.property(p).name.clone())
                                .collect(),
                            unique: foreign_key.unique,
                            required: foreign_key.required,
                            ownership: foreign_key.ownership,
                            dependent_navigation: foreign_key
                                .dependent_navigation
                                .map(|n| self.navigation(n).name.clone()),
                            principal_navigation: foreign_key
                                .principal_navigation
                                .map(|n| self.navigation(n).name.clone()),
                        }
                    })
                    .collect();
                foreign_keys.sort_by(|a, b| {
                    (&a.principal, &a.properties).cmp(&(&b.principal, &b.properties))
                });

                let mut skip_navigations: Vec<SkipNavigationSnapshot> = node
                    .skip_navigations
                    .iter()
                    .map(|&n| {
                        let nav = self.skip_navigation(n);
                        SkipNavigationSnapshot {
                            name: nav.name.clone(),
                            target: self.entity_type(nav.target).name.clone(),
                            inverse: nav
                                .inverse
                                .map(|i| self.skip_navigation(i).name.clone()),
                            join_entity: nav
                                .join_entity
                                .map(|j| self.entity_type(j).name.clone()),
                        }
                    })
                    .collect();
                skip_navigations.sort_by(|a, b| a.name.cmp(&b.name));

                let mut indexes: Vec<IndexSnapshot> = node
                    .indexes
                    .iter()
                    .map(|&i| {
                        let index = self.index(i);
                        IndexSnapshot {
                            properties: index
                                .properties
                                .iter()
                                .map(|&p| self.property(p).name.clone())
                                .collect(),
                            unique: index.unique,
                        }
                    })
                    .collect();
                indexes.sort();

                EntityTypeSnapshot {
                    name: node.name.clone(),
                    backing_type: node.backing_type.clone(),
                    base_type: node.base_type.map(|b| self.entity_type(b).name.clone()),
                    owned: node.owned,
                    source: node.source,
                    properties,
                    primary_key,
                    foreign_keys,
                    skip_navigations,
                    indexes,
                }
            })
            .collect();
        entity_types.sort_by(|a, b| a.name.cmp(&b.name));
        ModelSnapshot { entity_types }
    }
}
