//! Join entity synthesis for many-to-many relationships.
//!
//! When two collection skip navigations become inverses of each other, a
//! shared entity type with no backing structural type is synthesized
//! between them, carrying one foreign key to each side. Property and key
//! discovery then complete it: shadow properties for both foreign keys and
//! a composite primary key over them. Unpairing or removing either
//! navigation dissolves the join type once nothing references it.

use crate::diagnostics::ModelDiagnostic;
use crate::dispatch::Flow;
use crate::metadata::{
    ConfigurationSource, EntityTypeId, ForeignKeyId, ModelBuilder, SkipNavigationId,
};
use crate::naming;

use super::{
    Convention, ConventionResult, SkipNavigationAddedConvention,
    SkipNavigationForeignKeyChangedConvention, SkipNavigationInverseChangedConvention,
    SkipNavigationRemovedConvention,
};

pub struct JoinEntitySynthesis;

impl JoinEntitySynthesis {
    fn try_synthesize(&self, builder: &mut ModelBuilder, navigation: SkipNavigationId) {
        let node = builder.model().skip_navigation(navigation).clone();
        let Some(inverse) = node.inverse else {
            return;
        };
        let inverse_node = builder.model().skip_navigation(inverse).clone();
        if node.foreign_key.is_some() && inverse_node.foreign_key.is_some() {
            return;
        }
        if !node.collection || !inverse_node.collection {
            return;
        }

        let left = node.declaring;
        let right = node.target;
        let left_name = builder.model().entity_type(left).name.clone();
        let right_name = builder.model().entity_type(right).name.clone();
        let desired = naming::join_entity_name(&left_name, &right_name);
        let name = naming::uniquify(&desired, |candidate| {
            builder.model().find_entity_type(candidate).is_some()
        });
        let Some(join) = builder.shared_entity_type(&name, ConfigurationSource::Convention) else {
            return;
        };

        // Foreign keys in deterministic order: the lexicographically smaller
        // principal first, matching the join type's name.
        let (first, second) = if left_name <= right_name {
            (left, right)
        } else {
            (right, left)
        };
        let fk_first = builder.foreign_key(
            join,
            first,
            false,
            false,
            ConfigurationSource::Convention,
        );
        let fk_second = builder.foreign_key(
            join,
            second,
            false,
            false,
            ConfigurationSource::Convention,
        );
        let (left_fk, right_fk) = if first == left {
            (fk_first, fk_second)
        } else {
            (fk_second, fk_first)
        };
        builder.set_skip_navigation_foreign_key(navigation, left_fk);
        builder.set_skip_navigation_foreign_key(inverse, right_fk);

        let (smaller, larger) = if left_name <= right_name {
            (left_name, right_name)
        } else {
            (right_name, left_name)
        };
        builder.report(ModelDiagnostic::JoinEntityCreated {
            name,
            left: smaller,
            right: larger,
        });
    }

    /// Remove a synthesized join type no skip navigation resolves through
    /// anymore.
    fn maybe_remove_join(&self, builder: &mut ModelBuilder, join: EntityTypeId) {
        if !builder.model().is_entity_type_live(join) {
            return;
        }
        let node = builder.model().entity_type(join);
        if node.source != ConfigurationSource::Convention || node.backing_type.is_some() {
            return;
        }
        let referenced = builder
            .model()
            .skip_navigations()
            .any(|(_, s)| s.join_entity == Some(join));
        if !referenced {
            builder.remove_entity_type(join, ConfigurationSource::Convention);
        }
    }
}

impl Convention for JoinEntitySynthesis {
    fn name(&self) -> &'static str {
        "JoinEntitySynthesis"
    }
}

impl SkipNavigationAddedConvention for JoinEntitySynthesis {
    fn skip_navigation_added(
        &self,
        builder: &mut ModelBuilder,
        navigation: SkipNavigationId,
    ) -> ConventionResult<SkipNavigationId> {
        self.try_synthesize(builder, navigation);
        Ok(Flow::Continue(navigation))
    }
}

impl SkipNavigationInverseChangedConvention for JoinEntitySynthesis {
    fn skip_navigation_inverse_changed(
        &self,
        builder: &mut ModelBuilder,
        navigation: SkipNavigationId,
    ) -> ConventionResult<SkipNavigationId> {
        let node = builder.model().skip_navigation(navigation).clone();
        if node.inverse.is_some() {
            self.try_synthesize(builder, navigation);
        } else if node.foreign_key.is_some() {
            builder.set_skip_navigation_foreign_key(navigation, None);
            if let Some(join) = node.join_entity {
                self.maybe_remove_join(builder, join);
            }
        }
        Ok(Flow::Continue(navigation))
    }
}

impl SkipNavigationRemovedConvention for JoinEntitySynthesis {
    fn skip_navigation_removed(
        &self,
        builder: &mut ModelBuilder,
        _entity_type: EntityTypeId,
        _target: EntityTypeId,
        _name: &str,
        join_entity: Option<EntityTypeId>,
    ) -> ConventionResult<()> {
        if let Some(join) = join_entity {
            self.maybe_remove_join(builder, join);
        }
        Ok(Flow::Continue(()))
    }
}

impl SkipNavigationForeignKeyChangedConvention for JoinEntitySynthesis {
    fn skip_navigation_foreign_key_changed(
        &self,
        builder: &mut ModelBuilder,
        navigation: SkipNavigationId,
        old_foreign_key: Option<ForeignKeyId>,
    ) -> ConventionResult<SkipNavigationId> {
        if let Some(old) = old_foreign_key {
            if builder.model().is_foreign_key_live(old) {
                let join = builder.model().foreign_key(old).dependent;
                self.maybe_remove_join(builder, join);
            }
        }
        Ok(Flow::Continue(navigation))
    }
}
