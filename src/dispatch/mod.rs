//! The convention dispatch core.
//!
//! Mutations never call rules directly: the graph records events on a FIFO
//! queue and [`ConventionDispatcher::flush`] drains it, running the ordered
//! rule list registered for each event kind. Cascades triggered by a rule's
//! own edits land on the same queue, so re-entrancy is an explicit,
//! replayable work queue rather than host call-stack recursion, and batch
//! scopes compose by suppressing the drain until the outermost scope ends.

pub mod events;

pub use events::ModelEvent;

use std::cell::Cell;

use crate::conventions::ConventionSet;
use crate::error::{ModelError, ModelResult};
use crate::metadata::ModelBuilder;

/// A handler's verdict on further propagation of the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow<T> {
    /// Pass (the possibly replaced) payload to the next rule.
    Continue(T),
    /// Short-circuit the remaining rules for this event.
    Stop(T),
}

impl<T: PartialEq> Flow<T> {
    /// Stop propagation only when this rule's edit observably changed the
    /// value earlier rules saw.
    pub fn stop_if_changed(before: T, after: T) -> Flow<T> {
        if before == after {
            Flow::Continue(after)
        } else {
            Flow::Stop(after)
        }
    }
}

/// Runs one rule chain over an id-shaped payload, re-checking liveness
/// before every rule: an edit that removed the payload object ends the
/// chain, no rule ever observes a dead id.
macro_rules! run_id_chain {
    ($set:expr, $builder:expr, $payload:expr, $live:ident, $method:ident) => {{
        let mut payload = $payload;
        for convention in &$set {
            if !$builder.model().$live(payload) {
                return Ok(());
            }
            match convention.$method($builder, payload)? {
                Flow::Continue(next) => payload = next,
                Flow::Stop(_) => break,
            }
        }
        Ok(())
    }};
}

/// Runs one rule chain over a removed-object payload (data by value,
/// nothing to replace).
macro_rules! run_data_chain {
    ($set:expr, $builder:expr, $method:ident ( $($arg:expr),* )) => {{
        for convention in &$set {
            match convention.$method($builder, $($arg),*)? {
                Flow::Continue(()) => {}
                Flow::Stop(()) => break,
            }
        }
        Ok(())
    }};
}

/// Invokes registered rules in order for each queued event.
pub struct ConventionDispatcher {
    conventions: ConventionSet,
    delay_depth: Cell<usize>,
}

impl ConventionDispatcher {
    pub fn new(conventions: ConventionSet) -> Self {
        Self {
            conventions,
            delay_depth: Cell::new(0),
        }
    }

    pub fn conventions(&self) -> &ConventionSet {
        &self.conventions
    }

    /// Whether a delay scope is active (events accumulate, no dispatch).
    pub fn is_delayed(&self) -> bool {
        self.delay_depth.get() > 0
    }

    pub(crate) fn begin_delay(&self) {
        self.delay_depth.set(self.delay_depth.get() + 1);
    }

    pub(crate) fn end_delay(&self) {
        let depth = self.delay_depth.get();
        debug_assert!(depth > 0, "unbalanced delay scope");
        self.delay_depth.set(depth.saturating_sub(1));
    }

    /// Drain the event queue, dispatching each event against the graph's
    /// current (final) state. No-op while a delay scope is active.
    ///
    /// The queue is bounded: a cascade that keeps producing events beyond
    /// a budget quadratic in model size is a rule defect and aborts the
    /// build instead of hanging it.
    pub fn flush(&self, builder: &mut ModelBuilder) -> ModelResult<()> {
        if self.is_delayed() {
            return Ok(());
        }
        let mut processed = 0usize;
        while let Some(event) = builder.model_mut().pop_event() {
            processed += 1;
            if processed > self.event_budget(builder) {
                return Err(ModelError::ConventionCycle { processed });
            }
            self.dispatch(builder, event)?;
        }
        Ok(())
    }

    fn event_budget(&self, builder: &ModelBuilder) -> usize {
        let n = builder.model().node_count() + 16;
        (n * n).max(4096)
    }

    fn dispatch(&self, builder: &mut ModelBuilder, event: ModelEvent) -> ModelResult<()> {
        match event {
            ModelEvent::EntityTypeAdded(id) => run_id_chain!(
                self.conventions.entity_type_added,
                builder,
                id,
                is_entity_type_live,
                entity_type_added
            ),
            ModelEvent::EntityTypeRemoved { .. } => Ok(()),
            ModelEvent::BaseTypeChanged(id) => run_id_chain!(
                self.conventions.base_type_changed,
                builder,
                id,
                is_entity_type_live,
                base_type_changed
            ),
            ModelEvent::MemberIgnored {
                entity_type,
                member,
            } => {
                if !builder.model().is_entity_type_live(entity_type) {
                    return Ok(());
                }
                run_data_chain!(
                    self.conventions.member_ignored,
                    builder,
                    member_ignored(entity_type, &member)
                )
            }
            ModelEvent::PropertyAdded(id) => run_id_chain!(
                self.conventions.property_added,
                builder,
                id,
                is_property_live,
                property_added
            ),
            ModelEvent::PropertyRemoved { .. } => Ok(()),
            ModelEvent::PropertyNullabilityChanged(id) => run_id_chain!(
                self.conventions.property_nullability_changed,
                builder,
                id,
                is_property_live,
                property_nullability_changed
            ),
            ModelEvent::KeyAdded(id) => run_id_chain!(
                self.conventions.key_added,
                builder,
                id,
                is_key_live,
                key_added
            ),
            ModelEvent::KeyRemoved {
                entity_type,
                properties,
            } => {
                if !builder.model().is_entity_type_live(entity_type) {
                    return Ok(());
                }
                run_data_chain!(
                    self.conventions.key_removed,
                    builder,
                    key_removed(entity_type, &properties)
                )
            }
            ModelEvent::PrimaryKeyChanged(id) => run_id_chain!(
                self.conventions.primary_key_changed,
                builder,
                id,
                is_entity_type_live,
                primary_key_changed
            ),
            ModelEvent::ForeignKeyAdded(id) => run_id_chain!(
                self.conventions.foreign_key_added,
                builder,
                id,
                is_foreign_key_live,
                foreign_key_added
            ),
            ModelEvent::ForeignKeyRemoved {
                dependent,
                principal,
                properties,
            } => run_data_chain!(
                self.conventions.foreign_key_removed,
                builder,
                foreign_key_removed(dependent, principal, &properties)
            ),
            ModelEvent::ForeignKeyPropertiesChanged(id) => run_id_chain!(
                self.conventions.foreign_key_properties_changed,
                builder,
                id,
                is_foreign_key_live,
                foreign_key_properties_changed
            ),
            ModelEvent::ForeignKeyUniquenessChanged(id) => run_id_chain!(
                self.conventions.foreign_key_uniqueness_changed,
                builder,
                id,
                is_foreign_key_live,
                foreign_key_uniqueness_changed
            ),
            ModelEvent::ForeignKeyRequiredChanged(id) => run_id_chain!(
                self.conventions.foreign_key_required_changed,
                builder,
                id,
                is_foreign_key_live,
                foreign_key_required_changed
            ),
            ModelEvent::ForeignKeyOwnershipChanged(id) => run_id_chain!(
                self.conventions.foreign_key_ownership_changed,
                builder,
                id,
                is_foreign_key_live,
                foreign_key_ownership_changed
            ),
            ModelEvent::NavigationAdded(id) => run_id_chain!(
                self.conventions.navigation_added,
                builder,
                id,
                is_navigation_live,
                navigation_added
            ),
            ModelEvent::NavigationRemoved {
                entity_type,
                target,
                name,
            } => run_data_chain!(
                self.conventions.navigation_removed,
                builder,
                navigation_removed(entity_type, target, &name)
            ),
            ModelEvent::SkipNavigationAdded(id) => run_id_chain!(
                self.conventions.skip_navigation_added,
                builder,
                id,
                is_skip_navigation_live,
                skip_navigation_added
            ),
            ModelEvent::SkipNavigationRemoved {
                entity_type,
                target,
                name,
                join_entity,
            } => run_data_chain!(
                self.conventions.skip_navigation_removed,
                builder,
                skip_navigation_removed(entity_type, target, &name, join_entity)
            ),
            ModelEvent::SkipNavigationInverseChanged(id) => run_id_chain!(
                self.conventions.skip_navigation_inverse_changed,
                builder,
                id,
                is_skip_navigation_live,
                skip_navigation_inverse_changed
            ),
            ModelEvent::SkipNavigationForeignKeyChanged {
                navigation,
                old_foreign_key,
            } => {
                let mut payload = navigation;
                for convention in &self.conventions.skip_navigation_foreign_key_changed {
                    if !builder.model().is_skip_navigation_live(payload) {
                        return Ok(());
                    }
                    match convention.skip_navigation_foreign_key_changed(
                        builder,
                        payload,
                        old_foreign_key,
                    )? {
                        Flow::Continue(next) => payload = next,
                        Flow::Stop(_) => break,
                    }
                }
                Ok(())
            }
            ModelEvent::IndexAdded(id) => run_id_chain!(
                self.conventions.index_added,
                builder,
                id,
                is_index_live,
                index_added
            ),
            ModelEvent::IndexRemoved {
                entity_type,
                properties,
            } => {
                if !builder.model().is_entity_type_live(entity_type) {
                    return Ok(());
                }
                run_data_chain!(
                    self.conventions.index_removed,
                    builder,
                    index_removed(entity_type, &properties)
                )
            }
            ModelEvent::IndexUniquenessChanged(_) => Ok(()),
            ModelEvent::ModelFinalizing => {
                for convention in &self.conventions.model_finalizing {
                    match convention.model_finalizing(builder)? {
                        Flow::Continue(()) => {}
                        Flow::Stop(()) => break,
                    }
                }
                Ok(())
            }
        }
    }
}
