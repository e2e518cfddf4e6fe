#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use keystone::classifier::{DeclaredTypes, ScalarType, TypeDescriptor};
    use keystone::diagnostics::{CollectingSink, ModelDiagnostic, NullSink};
    use keystone::error::ModelError;
    use keystone::infer::ModelSession;
    use keystone::metadata::{ConfigurationSource, ForeignKeyNode, Model};

    fn single_foreign_key(model: &Model) -> ForeignKeyNode {
        let mut fks = model.foreign_keys();
        let (_, fk) = fks.next().expect("no foreign key");
        assert!(fks.next().is_none(), "more than one foreign key");
        fk.clone()
    }

    #[test]
    fn test_declared_property_matched_by_principal_name() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Blog")
                        .scalar("Id", ScalarType::Int)
                        .collection("Posts", "Post"),
                )
                .with(
                    TypeDescriptor::new("Post")
                        .scalar("Id", ScalarType::Int)
                        .scalar("BlogId", ScalarType::Int)
                        .reference("Blog", "Blog"),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        session.add_entity_type("Blog").unwrap();

        let model = session.model();
        let post = model.find_entity_type("Post").unwrap();
        let blog_id = model.find_property(post, "BlogId").unwrap();
        let fk = single_foreign_key(model);
        assert_eq!(fk.properties, vec![blog_id]);
        assert!(!model.property(blog_id).shadow);
        // A non-nullable foreign key property makes the relationship required.
        assert!(fk.required);
        assert_eq!(fk.properties_source, Some(ConfigurationSource::Convention));
    }

    #[test]
    fn test_navigation_name_matched_with_id_suffix() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Customer")
                        .scalar("Id", ScalarType::Int)
                        .collection("Orders", "Order"),
                )
                .with(
                    TypeDescriptor::new("Order")
                        .scalar("Id", ScalarType::Int)
                        .scalar("BuyerId", ScalarType::Int)
                        .reference("Buyer", "Customer"),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        session.add_entity_type("Customer").unwrap();

        let model = session.model();
        let order = model.find_entity_type("Order").unwrap();
        let buyer_id = model.find_property(order, "BuyerId").unwrap();
        let fk = single_foreign_key(model);
        assert_eq!(fk.properties, vec![buyer_id]);
        let nav = model.navigation(fk.dependent_navigation.unwrap());
        assert_eq!(nav.name, "Buyer");
    }

    #[test]
    fn test_name_match_of_wrong_type_stops_discovery() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Blog")
                        .scalar("Id", ScalarType::Int)
                        .collection("Posts", "Post"),
                )
                .with(
                    TypeDescriptor::new("Post")
                        .scalar("Id", ScalarType::Int)
                        .scalar("BlogId", ScalarType::String)
                        .reference("Blog", "Blog"),
                ),
        );
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(classifier, sink.clone());
        session.add_entity_type("Blog").unwrap();

        // The matched name is reported instead of silently falling back to a
        // shadow property next to the conflicting one.
        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::IncompatibleForeignKeyProperty {
                property,
                expected: ScalarType::Int,
                actual: ScalarType::String,
                ..
            } if property == "BlogId"
        )));
        let fk = single_foreign_key(session.model());
        assert!(fk.properties.is_empty());

        let result = session.finalize();
        assert!(matches!(
            result,
            Err(ModelError::ForeignKeyPropertiesUndiscovered { .. })
        ));
    }

    #[test]
    fn test_shadow_property_synthesized_when_nothing_matches() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Blog")
                        .scalar("Id", ScalarType::Int)
                        .collection("Posts", "Post"),
                )
                .with(
                    TypeDescriptor::new("Post")
                        .scalar("Id", ScalarType::Int)
                        .reference("Blog", "Blog"),
                ),
        );
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(classifier, sink.clone());
        session.add_entity_type("Blog").unwrap();

        let model = session.model();
        let post = model.find_entity_type("Post").unwrap();
        let blog_id = model.find_property(post, "BlogId").unwrap();
        let fk = single_foreign_key(model);
        assert_eq!(fk.properties, vec![blog_id]);
        assert!(model.property(blog_id).shadow);
        // An optional relationship gets a nullable shadow column.
        assert!(model.property(blog_id).nullable);
        assert!(!fk.required);
        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::ShadowPropertyCreated { entity_type, property }
                if entity_type == "Post" && property == "BlogId"
        )));
    }

    #[test]
    fn test_required_foreign_key_tightens_shadow_properties() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Blog")
                        .scalar("Id", ScalarType::Int)
                        .collection("Posts", "Post"),
                )
                .with(
                    TypeDescriptor::new("Post")
                        .scalar("Id", ScalarType::Int)
                        .reference("Blog", "Blog"),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        session.add_entity_type("Blog").unwrap();

        let fk_id = session.model().foreign_keys().next().unwrap().0;
        session
            .mutate(|b| {
                b.set_foreign_key_required(fk_id, true, ConfigurationSource::Explicit)
                    .unwrap();
            })
            .unwrap();

        let model = session.model();
        let post = model.find_entity_type("Post").unwrap();
        let blog_id = model.find_property(post, "BlogId").unwrap();
        assert!(!model.property(blog_id).nullable);
    }

    #[test]
    fn test_property_nullability_drives_requiredness() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Blog")
                        .scalar("Id", ScalarType::Int)
                        .collection("Posts", "Post"),
                )
                .with(
                    TypeDescriptor::new("Post")
                        .scalar("Id", ScalarType::Int)
                        .nullable_scalar("BlogId", ScalarType::Int)
                        .reference("Blog", "Blog"),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        session.add_entity_type("Blog").unwrap();

        let model = session.model();
        let post = model.find_entity_type("Post").unwrap();
        let blog_id = model.find_property(post, "BlogId").unwrap();
        assert!(!single_foreign_key(model).required);

        session
            .mutate(|b| {
                b.set_property_nullable(blog_id, false, ConfigurationSource::Explicit)
                    .unwrap();
            })
            .unwrap();
        assert!(single_foreign_key(session.model()).required);
    }

    #[test]
    fn test_properties_rediscovered_after_matched_member_ignored() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Order")
                        .scalar("Id", ScalarType::Int)
                        .collection("Lines", "OrderLine"),
                )
                .with(
                    TypeDescriptor::new("OrderLine")
                        .scalar("Id", ScalarType::Int)
                        .scalar("OrderId", ScalarType::Int)
                        .reference("Order", "Order"),
                ),
        );
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(classifier, sink.clone());
        session.add_entity_type("Order").unwrap();

        let line = session.model().find_entity_type("OrderLine").unwrap();
        let order_id = session.model().find_property(line, "OrderId").unwrap();
        assert_eq!(single_foreign_key(session.model()).properties, vec![order_id]);

        // Ignoring the matched member clears the foreign key back to
        // undiscovered; a shadow property takes its place. The ignored
        // name stays off limits, so the shadow gets an ordinal.
        session.ignore_member(line, "OrderId").unwrap();

        let fk = single_foreign_key(session.model());
        assert_eq!(fk.properties.len(), 1);
        let shadow = fk.properties[0];
        assert_eq!(session.model().property(shadow).name, "OrderId1");
        assert!(session.model().property(shadow).shadow);
        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::ShadowPropertyCreated { entity_type, property }
                if entity_type == "OrderLine" && property == "OrderId1"
        )));

        let model = session.finalize().unwrap();
        let fk = single_foreign_key(&model);
        assert_eq!(fk.properties.len(), 1);
    }
}
