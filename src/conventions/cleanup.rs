//! Final model cleanup.
//!
//! Runs once at finalization: removes convention entity types not reachable
//! from any explicitly configured type, convention foreign keys no
//! navigation or skip navigation uses, and convention shadow properties
//! nothing references anymore. Rule scratch state is cleared last.

use std::collections::HashSet;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;

use crate::dispatch::Flow;
use crate::metadata::{ConfigurationSource, EntityTypeId, ForeignKeyId, ModelBuilder, PropertyId};

use super::{Convention, ConventionResult, ModelFinalizingConvention};

pub struct ModelCleanup;

impl ModelCleanup {
    /// Entity types only reachable through other convention types are
    /// left over from discovery walks that were later undone.
    fn remove_unreachable(&self, builder: &mut ModelBuilder) {
        let mut graph: DiGraphMap<EntityTypeId, ()> = DiGraphMap::new();
        let model = builder.model();
        for (id, node) in model.entity_types() {
            graph.add_node(id);
            if let Some(base) = node.base_type {
                graph.add_edge(id, base, ());
                graph.add_edge(base, id, ());
            }
        }
        // Reachability follows navigations, not bare foreign keys: a
        // relationship nothing navigates is itself about to be removed.
        // Ownership is the exception, since it binds lifetimes either way.
        for (_, fk) in model.foreign_keys() {
            if fk.ownership
                || fk.dependent_navigation.is_some()
                || fk.principal_navigation.is_some()
            {
                graph.add_edge(fk.dependent, fk.principal, ());
                graph.add_edge(fk.principal, fk.dependent, ());
            }
        }
        for (_, skip) in model.skip_navigations() {
            graph.add_edge(skip.declaring, skip.target, ());
            graph.add_edge(skip.target, skip.declaring, ());
            if let Some(join) = skip.join_entity {
                graph.add_edge(skip.declaring, join, ());
                graph.add_edge(join, skip.declaring, ());
            }
        }

        let mut reachable: HashSet<EntityTypeId> = HashSet::new();
        for (root, node) in model.entity_types() {
            if node.source == ConfigurationSource::Convention {
                continue;
            }
            let mut dfs = Dfs::new(&graph, root);
            while let Some(id) = dfs.next(&graph) {
                reachable.insert(id);
            }
        }

        let unreachable: Vec<EntityTypeId> = model
            .entity_types()
            .filter(|(id, node)| {
                node.source == ConfigurationSource::Convention && !reachable.contains(id)
            })
            .map(|(id, _)| id)
            .collect();
        for id in unreachable {
            builder.remove_entity_type(id, ConfigurationSource::Convention);
        }
    }

    fn remove_unused_foreign_keys(&self, builder: &mut ModelBuilder) {
        let model = builder.model();
        let used_by_skip: HashSet<ForeignKeyId> = model
            .skip_navigations()
            .filter_map(|(_, s)| s.foreign_key)
            .collect();
        let unused: Vec<ForeignKeyId> = model
            .foreign_keys()
            .filter(|(id, fk)| {
                fk.source == ConfigurationSource::Convention
                    && fk.dependent_navigation.is_none()
                    && fk.principal_navigation.is_none()
                    && !used_by_skip.contains(id)
            })
            .map(|(id, _)| id)
            .collect();
        for fk in unused {
            builder.remove_foreign_key(fk, ConfigurationSource::Convention);
        }
    }

    fn remove_unused_shadow_properties(&self, builder: &mut ModelBuilder) {
        let model = builder.model();
        let mut referenced: HashSet<PropertyId> = HashSet::new();
        for (_, fk) in model.foreign_keys() {
            referenced.extend(fk.properties.iter().copied());
        }
        for (_, node) in model.entity_types() {
            for &key in &node.keys {
                referenced.extend(model.key(key).properties.iter().copied());
            }
            for &index in &node.indexes {
                referenced.extend(model.index(index).properties.iter().copied());
            }
        }
        let mut unused: Vec<PropertyId> = Vec::new();
        for (_, node) in model.entity_types() {
            for &property in &node.properties {
                let p = model.property(property);
                if p.shadow
                    && p.source == ConfigurationSource::Convention
                    && !referenced.contains(&property)
                {
                    unused.push(property);
                }
            }
        }
        for property in unused {
            builder.remove_property(property, ConfigurationSource::Convention);
        }
    }
}

impl Convention for ModelCleanup {
    fn name(&self) -> &'static str {
        "ModelCleanup"
    }
}

impl ModelFinalizingConvention for ModelCleanup {
    fn model_finalizing(&self, builder: &mut ModelBuilder) -> ConventionResult<()> {
        self.remove_unreachable(builder);
        self.remove_unused_foreign_keys(builder);
        self.remove_unused_shadow_properties(builder);
        builder.model_mut().clear_scratch();
        Ok(Flow::Continue(()))
    }
}
