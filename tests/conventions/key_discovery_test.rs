#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use keystone::classifier::{DeclaredTypes, ScalarType, TypeDescriptor};
    use keystone::diagnostics::{CollectingSink, ModelDiagnostic, NullSink};
    use keystone::infer::ModelSession;
    use keystone::metadata::{ConfigurationSource, Model, ValueGeneration};

    fn key_property_names(model: &Model, entity: &str) -> Vec<String> {
        let id = model.find_entity_type(entity).unwrap();
        let pk = model.entity_type(id).primary_key.expect("no primary key");
        model
            .key(pk)
            .properties
            .iter()
            .map(|&p| model.property(p).name.clone())
            .collect()
    }

    #[test]
    fn test_id_property_becomes_generated_key() {
        let classifier = Rc::new(DeclaredTypes::new().with(
            TypeDescriptor::new("Blog")
                .scalar("Id", ScalarType::Int)
                .scalar("Title", ScalarType::String),
        ));
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        let blog = session.add_entity_type("Blog").unwrap().unwrap();

        let model = session.model();
        assert_eq!(key_property_names(model, "Blog"), vec!["Id"]);
        let id = model.find_property(blog, "Id").unwrap();
        assert_eq!(model.property(id).value_generation, ValueGeneration::OnAdd);
        assert!(!model.property(id).nullable);
    }

    #[test]
    fn test_type_qualified_id_matches() {
        let classifier = Rc::new(DeclaredTypes::new().with(
            TypeDescriptor::new("Order").scalar("OrderId", ScalarType::Int),
        ));
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        session.add_entity_type("Order").unwrap();
        assert_eq!(key_property_names(session.model(), "Order"), vec!["OrderId"]);
    }

    #[test]
    fn test_string_key_is_not_store_generated() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(TypeDescriptor::new("Country").scalar("Id", ScalarType::String)),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        let country = session.add_entity_type("Country").unwrap().unwrap();

        let model = session.model();
        assert_eq!(key_property_names(model, "Country"), vec!["Id"]);
        let id = model.find_property(country, "Id").unwrap();
        assert_eq!(model.property(id).value_generation, ValueGeneration::Never);
    }

    #[test]
    fn test_two_candidates_bind_no_key() {
        let classifier = Rc::new(DeclaredTypes::new().with(
            TypeDescriptor::new("Order")
                .scalar("Id", ScalarType::Int)
                .scalar("OrderId", ScalarType::Int),
        ));
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(classifier, sink.clone());
        let order = session.add_entity_type("Order").unwrap().unwrap();

        assert!(session.model().entity_type(order).primary_key.is_none());
        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::AmbiguousKeyCandidates { entity_type, .. } if entity_type == "Order"
        )));
    }

    #[test]
    fn test_derived_type_drops_its_convention_key() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(TypeDescriptor::new("Order").scalar("Id", ScalarType::Int))
                .with(
                    TypeDescriptor::new("RushOrder")
                        .scalar("Id", ScalarType::Int)
                        .scalar("Deadline", ScalarType::DateTime),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        let order = session.add_entity_type("Order").unwrap().unwrap();
        let rush = session.add_entity_type("RushOrder").unwrap().unwrap();
        assert!(session.model().entity_type(rush).primary_key.is_some());

        session
            .mutate(|b| {
                assert!(b.set_base_type(rush, Some(order), ConfigurationSource::Explicit));
            })
            .unwrap();

        let model = session.model();
        assert!(model.entity_type(rush).primary_key.is_none());
        assert!(model.entity_type(order).primary_key.is_some());
    }

    #[test]
    fn test_owned_collection_keys_on_fk_plus_discriminator() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Customer")
                        .scalar("Id", ScalarType::Int)
                        .collection("Addresses", "Address"),
                )
                .with(
                    TypeDescriptor::new("Address")
                        .scalar("Street", ScalarType::String)
                        .scalar("City", ScalarType::String),
                ),
        );
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(classifier, sink.clone());
        session.mark_owned("Address").unwrap();
        session.add_entity_type("Customer").unwrap();

        let model = session.model();
        let address = model.find_entity_type("Address").unwrap();
        assert_eq!(key_property_names(model, "Address"), vec!["CustomerId", "Id"]);

        let discriminator = model.find_property(address, "Id").unwrap();
        assert!(model.property(discriminator).shadow);
        assert!(!model.property(discriminator).nullable);
        assert_eq!(
            model.property(discriminator).value_generation,
            ValueGeneration::OnAdd
        );
        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::ShadowPropertyCreated { entity_type, property }
                if entity_type == "Address" && property == "Id"
        )));
    }

    #[test]
    fn test_key_serving_a_foreign_key_is_not_store_generated() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("User")
                        .scalar("Id", ScalarType::Int)
                        .reference("Profile", "Profile"),
                )
                .with(
                    TypeDescriptor::new("Profile")
                        .scalar("Id", ScalarType::Int)
                        .reference("User", "User"),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        let user = session.add_entity_type("User").unwrap().unwrap();

        let model = session.model();
        let user_id = model.find_property(user, "Id").unwrap();
        // User's key doubles as the foreign key of the one-to-one, so the
        // store cannot generate it independently.
        let (_, fk) = model.foreign_keys().next().unwrap();
        assert!(fk.properties.contains(&user_id));
        assert_eq!(model.property(user_id).value_generation, ValueGeneration::Never);
    }
}
