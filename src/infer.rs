//! The inference session: the public entry point tying the builder and
//! the dispatcher together.
//!
//! A session interleaves caller configuration with convention dispatch:
//! every mutation batch is followed by a queue flush, so the model the
//! caller observes between calls is always convention-complete. A delay
//! scope suppresses the flush until its outermost end, letting a batch of
//! related edits be observed by rules against final state only.

use std::rc::Rc;

use crate::classifier::MemberClassifier;
use crate::conventions::{default_conventions, ConventionSet};
use crate::diagnostics::{DiagnosticsSink, NullSink};
use crate::dispatch::{ConventionDispatcher, ModelEvent};
use crate::error::{ModelError, ModelResult};
use crate::metadata::{ConfigurationSource, EntityTypeId, Model, ModelBuilder};

/// An incremental model build over one classifier.
pub struct ModelSession {
    builder: ModelBuilder,
    dispatcher: ConventionDispatcher,
}

impl ModelSession {
    /// A session with the standard convention rule set.
    pub fn new(classifier: Rc<dyn MemberClassifier>, diagnostics: Rc<dyn DiagnosticsSink>) -> Self {
        Self::with_conventions(default_conventions(), classifier, diagnostics)
    }

    pub fn with_conventions(
        conventions: ConventionSet,
        classifier: Rc<dyn MemberClassifier>,
        diagnostics: Rc<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            builder: ModelBuilder::new(classifier, diagnostics),
            dispatcher: ConventionDispatcher::new(conventions),
        }
    }

    /// The model as of the last flush.
    pub fn model(&self) -> &Model {
        self.builder.model()
    }

    /// Map a structural type explicitly and run discovery from it.
    pub fn add_entity_type(&mut self, name: &str) -> ModelResult<Option<EntityTypeId>> {
        let id = self.builder.entity_type(name, ConfigurationSource::Explicit);
        self.dispatcher.flush(&mut self.builder)?;
        Ok(id)
    }

    /// Exclude a structural type from the model.
    pub fn ignore_type(&mut self, name: &str) -> ModelResult<()> {
        self.builder.ignore_type(name);
        self.dispatcher.flush(&mut self.builder)
    }

    /// Exclude one member from inference.
    pub fn ignore_member(&mut self, entity_type: EntityTypeId, member: &str) -> ModelResult<()> {
        self.builder.ignore_member(entity_type, member);
        self.dispatcher.flush(&mut self.builder)
    }

    /// Mark a type name as owned by whichever principal navigates to it.
    pub fn mark_owned(&mut self, name: &str) -> ModelResult<()> {
        self.builder.mark_owned(name);
        self.dispatcher.flush(&mut self.builder)
    }

    /// Apply arbitrary builder edits, then flush the convention queue.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut ModelBuilder) -> R) -> ModelResult<R> {
        let result = f(&mut self.builder);
        self.dispatcher.flush(&mut self.builder)?;
        Ok(result)
    }

    /// Run a batch of edits with convention dispatch suppressed until the
    /// outermost scope ends; rules then observe the batch's final state.
    /// Scopes nest: an inner scope joins the outer batch.
    pub fn delay_conventions<R>(
        &mut self,
        f: impl FnOnce(&mut ModelSession) -> R,
    ) -> ModelResult<R> {
        self.dispatcher.begin_delay();
        let result = f(self);
        self.dispatcher.end_delay();
        self.dispatcher.flush(&mut self.builder)?;
        Ok(result)
    }

    /// Finish the build: drain the queue, run the finalizing rules, and
    /// validate that discovery completed everywhere.
    pub fn finalize(mut self) -> ModelResult<Model> {
        self.dispatcher.flush(&mut self.builder)?;
        self.builder.model_mut().record(ModelEvent::ModelFinalizing);
        self.dispatcher.flush(&mut self.builder)?;
        self.validate()?;
        Ok(self.builder.into_model())
    }

    /// Terminal invariants: every root entity type has a primary key and
    /// every foreign key found its properties.
    fn validate(&self) -> ModelResult<()> {
        let model = self.builder.model();
        for (_, node) in model.entity_types() {
            if node.base_type.is_none() && node.primary_key.is_none() {
                return Err(ModelError::KeylessEntityType(node.name.clone()));
            }
        }
        for (_, fk) in model.foreign_keys() {
            if fk.properties.is_empty() {
                return Err(ModelError::ForeignKeyPropertiesUndiscovered {
                    dependent: model.entity_type(fk.dependent).name.clone(),
                    principal: model.entity_type(fk.principal).name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Build a finalized model from a classifier and a set of root type names.
pub fn build_model(
    classifier: Rc<dyn MemberClassifier>,
    roots: &[&str],
) -> ModelResult<Model> {
    let mut session = ModelSession::new(classifier, Rc::new(NullSink));
    for root in roots {
        session.add_entity_type(root)?;
    }
    session.finalize()
}
