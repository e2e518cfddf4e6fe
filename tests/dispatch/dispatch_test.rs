#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use keystone::classifier::{DeclaredTypes, ScalarType, TypeDescriptor};
    use keystone::conventions::{
        Convention, ConventionResult, ConventionSet, EntityTypeAddedConvention,
        PropertyAddedConvention, PropertyDiscovery, PropertyNullabilityChangedConvention,
    };
    use keystone::diagnostics::NullSink;
    use keystone::dispatch::Flow;
    use keystone::error::ModelError;
    use keystone::infer::ModelSession;
    use keystone::metadata::{ConfigurationSource, EntityTypeId, ModelBuilder, PropertyId};

    fn classifier() -> Rc<DeclaredTypes> {
        Rc::new(DeclaredTypes::new().with(
            TypeDescriptor::new("Blog")
                .scalar("Id", ScalarType::Int)
                .scalar("Title", ScalarType::String),
        ))
    }

    #[test]
    fn test_stop_if_changed() {
        assert_eq!(Flow::stop_if_changed(1, 1), Flow::Continue(1));
        assert_eq!(Flow::stop_if_changed(1, 2), Flow::Stop(2));
    }

    struct Recorder {
        label: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Convention for Recorder {
        fn name(&self) -> &'static str {
            "Recorder"
        }
    }

    impl EntityTypeAddedConvention for Recorder {
        fn entity_type_added(
            &self,
            _builder: &mut ModelBuilder,
            entity_type: EntityTypeId,
        ) -> ConventionResult<EntityTypeId> {
            self.log.borrow_mut().push(self.label);
            Ok(Flow::Continue(entity_type))
        }
    }

    #[test]
    fn test_rules_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ConventionSet::new();
        set.entity_type_added.push(Rc::new(Recorder {
            label: "first",
            log: log.clone(),
        }));
        set.entity_type_added.push(Rc::new(Recorder {
            label: "second",
            log: log.clone(),
        }));

        let mut session = ModelSession::with_conventions(set, classifier(), Rc::new(NullSink));
        session.add_entity_type("Blog").unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    struct Suppressor;

    impl Convention for Suppressor {
        fn name(&self) -> &'static str {
            "Suppressor"
        }
    }

    impl EntityTypeAddedConvention for Suppressor {
        fn entity_type_added(
            &self,
            _builder: &mut ModelBuilder,
            entity_type: EntityTypeId,
        ) -> ConventionResult<EntityTypeId> {
            Ok(Flow::Stop(entity_type))
        }
    }

    #[test]
    fn test_stop_short_circuits_remaining_rules() {
        let mut set = ConventionSet::new();
        set.entity_type_added.push(Rc::new(Suppressor));
        set.entity_type_added.push(Rc::new(PropertyDiscovery));

        let mut session = ModelSession::with_conventions(set, classifier(), Rc::new(NullSink));
        let blog = session.add_entity_type("Blog").unwrap().unwrap();
        // Property discovery never saw the event.
        assert!(session.model().entity_type(blog).properties.is_empty());
    }

    struct Remover;

    impl Convention for Remover {
        fn name(&self) -> &'static str {
            "Remover"
        }
    }

    impl PropertyAddedConvention for Remover {
        fn property_added(
            &self,
            builder: &mut ModelBuilder,
            property: PropertyId,
        ) -> ConventionResult<PropertyId> {
            builder.remove_property(property, ConfigurationSource::Explicit);
            Ok(Flow::Continue(property))
        }
    }

    struct PropertyRecorder {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Convention for PropertyRecorder {
        fn name(&self) -> &'static str {
            "PropertyRecorder"
        }
    }

    impl PropertyAddedConvention for PropertyRecorder {
        fn property_added(
            &self,
            _builder: &mut ModelBuilder,
            property: PropertyId,
        ) -> ConventionResult<PropertyId> {
            self.log.borrow_mut().push("saw it");
            Ok(Flow::Continue(property))
        }
    }

    #[test]
    fn test_removed_payload_ends_the_chain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut set = ConventionSet::new();
        set.property_added.push(Rc::new(Remover));
        set.property_added.push(Rc::new(PropertyRecorder { log: log.clone() }));

        let mut session = ModelSession::with_conventions(set, classifier(), Rc::new(NullSink));
        session
            .mutate(|b| {
                let blog = b.entity_type("Blog", ConfigurationSource::Explicit).unwrap();
                b.property(
                    blog,
                    "Title",
                    ScalarType::String,
                    false,
                    false,
                    ConfigurationSource::Convention,
                )
                .unwrap();
            })
            .unwrap();
        // No rule ever observes a dead id.
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_delay_scope_defers_dispatch_to_scope_end() {
        let mut session = ModelSession::new(classifier(), Rc::new(NullSink));
        session
            .delay_conventions(|s| {
                let blog = s.mutate(|b| {
                    b.entity_type("Blog", ConfigurationSource::Explicit).unwrap()
                })?;
                // Nothing dispatched yet: the type exists but discovery has
                // not touched it.
                assert!(s.model().entity_type(blog).properties.is_empty());
                assert!(s.model().entity_type(blog).primary_key.is_none());

                // An inner scope joins the outer batch.
                s.delay_conventions(|inner| {
                    assert!(inner.model().entity_type(blog).primary_key.is_none());
                    Ok(())
                })??;
                assert!(s.model().entity_type(blog).primary_key.is_none());
                Ok::<_, ModelError>(blog)
            })
            .unwrap()
            .unwrap();

        let blog = session.model().find_entity_type("Blog").unwrap();
        assert_eq!(session.model().entity_type(blog).properties.len(), 2);
        assert!(session.model().entity_type(blog).primary_key.is_some());
    }

    struct Toggler;

    impl Convention for Toggler {
        fn name(&self) -> &'static str {
            "Toggler"
        }
    }

    impl PropertyNullabilityChangedConvention for Toggler {
        fn property_nullability_changed(
            &self,
            builder: &mut ModelBuilder,
            property: PropertyId,
        ) -> ConventionResult<PropertyId> {
            let nullable = builder.model().property(property).nullable;
            let _ = builder.set_property_nullable(property, !nullable, ConfigurationSource::Explicit);
            Ok(Flow::Continue(property))
        }
    }

    #[test]
    fn test_non_converging_cascade_aborts_with_cycle_error() {
        let mut set = ConventionSet::new();
        set.property_nullability_changed.push(Rc::new(Toggler));

        let mut session = ModelSession::with_conventions(set, classifier(), Rc::new(NullSink));
        let result = session.mutate(|b| {
            let blog = b.entity_type("Blog", ConfigurationSource::Explicit).unwrap();
            let title = b
                .property(
                    blog,
                    "Title",
                    ScalarType::String,
                    false,
                    false,
                    ConfigurationSource::Explicit,
                )
                .unwrap();
            let _ = b.set_property_nullable(title, true, ConfigurationSource::Explicit);
        });
        assert!(matches!(result, Err(ModelError::ConventionCycle { .. })));
    }
}
