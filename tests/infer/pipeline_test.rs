#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use keystone::classifier::{DeclaredTypes, ScalarType, TypeDescriptor};
    use keystone::diagnostics::NullSink;
    use keystone::error::ModelError;
    use keystone::infer::{build_model, ModelSession};
    use keystone::metadata::ConfigurationSource;

    fn library_classifier() -> Rc<DeclaredTypes> {
        Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Blog")
                        .scalar("Id", ScalarType::Int)
                        .scalar("Url", ScalarType::String)
                        .collection("Posts", "Post"),
                )
                .with(
                    TypeDescriptor::new("Post")
                        .scalar("Id", ScalarType::Int)
                        .scalar("Title", ScalarType::String)
                        .nullable_scalar("Rating", ScalarType::Float)
                        .reference("Blog", "Blog"),
                ),
        )
    }

    #[test]
    fn test_one_to_many_end_to_end() {
        let model = build_model(library_classifier(), &["Blog"]).unwrap();
        let snapshot = model.snapshot();

        let blog = snapshot
            .entity_types
            .iter()
            .find(|e| e.name == "Blog")
            .unwrap();
        let post = snapshot
            .entity_types
            .iter()
            .find(|e| e.name == "Post")
            .unwrap();

        assert_eq!(blog.primary_key.as_deref(), Some(&["Id".to_string()][..]));
        assert_eq!(post.primary_key.as_deref(), Some(&["Id".to_string()][..]));

        assert_eq!(post.foreign_keys.len(), 1);
        let fk = &post.foreign_keys[0];
        assert_eq!(fk.principal, "Blog");
        assert_eq!(fk.properties, vec!["BlogId"]);
        assert_eq!(fk.dependent_navigation.as_deref(), Some("Blog"));
        assert_eq!(fk.principal_navigation.as_deref(), Some("Posts"));
        assert!(!fk.unique);
        // The shadow column is nullable, so the relationship stays optional.
        assert!(!fk.required);

        assert_eq!(post.indexes.len(), 1);
        assert_eq!(post.indexes[0].properties, vec!["BlogId"]);

        let shadow = post.properties.iter().find(|p| p.name == "BlogId").unwrap();
        assert!(shadow.shadow);
        assert!(shadow.nullable);
        let rating = post.properties.iter().find(|p| p.name == "Rating").unwrap();
        assert!(rating.nullable);
    }

    #[test]
    fn test_rebuild_produces_an_identical_model() {
        let first = build_model(library_classifier(), &["Blog"]).unwrap();
        let second = build_model(library_classifier(), &["Blog"]).unwrap();
        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(first.snapshot().to_json(), second.snapshot().to_json());
    }

    #[test]
    fn test_root_order_does_not_change_the_outcome() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Student")
                        .scalar("Id", ScalarType::Int)
                        .collection("Courses", "Course"),
                )
                .with(
                    TypeDescriptor::new("Course")
                        .scalar("Id", ScalarType::Int)
                        .collection("Students", "Student"),
                ),
        );
        let forward = build_model(classifier.clone(), &["Student", "Course"]).unwrap();
        let reverse = build_model(classifier, &["Course", "Student"]).unwrap();
        assert_eq!(forward.snapshot(), reverse.snapshot());
    }

    #[test]
    fn test_many_to_many_end_to_end() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Student")
                        .scalar("Id", ScalarType::Int)
                        .collection("Courses", "Course"),
                )
                .with(
                    TypeDescriptor::new("Course")
                        .scalar("Id", ScalarType::Int)
                        .collection("Students", "Student"),
                ),
        );
        let model = build_model(classifier, &["Student"]).unwrap();
        let snapshot = model.snapshot();

        let join = snapshot
            .entity_types
            .iter()
            .find(|e| e.name == "CourseStudent")
            .unwrap();
        assert!(join.backing_type.is_none());
        assert_eq!(
            join.primary_key.as_deref(),
            Some(&["CourseId".to_string(), "StudentId".to_string()][..])
        );
        assert_eq!(join.foreign_keys.len(), 2);
        assert_eq!(join.foreign_keys[0].principal, "Course");
        assert_eq!(join.foreign_keys[1].principal, "Student");

        let student = snapshot
            .entity_types
            .iter()
            .find(|e| e.name == "Student")
            .unwrap();
        assert_eq!(student.skip_navigations.len(), 1);
        assert_eq!(student.skip_navigations[0].name, "Courses");
        assert_eq!(student.skip_navigations[0].target, "Course");
        assert_eq!(student.skip_navigations[0].join_entity.as_deref(), Some("CourseStudent"));
        assert_eq!(student.skip_navigations[0].inverse.as_deref(), Some("Students"));
    }

    #[test]
    fn test_explicit_configuration_outlives_rediscovery() {
        let classifier = Rc::new(
            DeclaredTypes::new().with(
                TypeDescriptor::new("Country")
                    .scalar("Id", ScalarType::Int)
                    .scalar("Code", ScalarType::String),
            ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        let country = session.add_entity_type("Country").unwrap().unwrap();
        let code = session.model().find_property(country, "Code").unwrap();
        session
            .mutate(|b| {
                b.primary_key(country, &[code], ConfigurationSource::Explicit)
                    .unwrap()
                    .unwrap();
            })
            .unwrap();

        // Re-running discovery over the type must not reclaim the key for the
        // Id heuristic.
        session
            .mutate(|b| {
                b.ignore_member(country, "Id");
            })
            .unwrap();

        let model = session.finalize().unwrap();
        let snapshot = model.snapshot();
        let country = snapshot
            .entity_types
            .iter()
            .find(|e| e.name == "Country")
            .unwrap();
        assert_eq!(country.primary_key.as_deref(), Some(&["Code".to_string()][..]));
        assert_eq!(
            country
                .properties
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Code"]
        );
    }

    #[test]
    fn test_keyless_type_fails_finalization() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(TypeDescriptor::new("Note").scalar("Text", ScalarType::String)),
        );
        let result = build_model(classifier, &["Note"]);
        assert!(matches!(
            result,
            Err(ModelError::KeylessEntityType(name)) if name == "Note"
        ));
    }

    #[test]
    fn test_explicit_nullability_survives_member_rediscovery() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(TypeDescriptor::new("Content").scalar("Id", ScalarType::Int))
                .with(
                    TypeDescriptor::new("Article")
                        .scalar("Id", ScalarType::Int)
                        .nullable_scalar("Title", ScalarType::String),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        let content = session.add_entity_type("Content").unwrap().unwrap();
        let article = session.add_entity_type("Article").unwrap().unwrap();
        let title = session.model().find_property(article, "Title").unwrap();
        session
            .mutate(|b| {
                assert_eq!(
                    b.set_property_nullable(title, false, ConfigurationSource::Explicit),
                    Some(true)
                );
            })
            .unwrap();

        // A base type change re-runs member discovery over the whole type.
        session
            .mutate(|b| {
                assert!(b.set_base_type(article, Some(content), ConfigurationSource::Explicit));
            })
            .unwrap();

        assert!(!session.model().property(title).nullable);
        assert_eq!(
            session.model().property(title).nullability_source,
            Some(ConfigurationSource::Explicit)
        );
    }
}
