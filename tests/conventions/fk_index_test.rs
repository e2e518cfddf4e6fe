#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use keystone::classifier::{DeclaredTypes, ScalarType, TypeDescriptor};
    use keystone::diagnostics::{CollectingSink, ModelDiagnostic, NullSink};
    use keystone::infer::ModelSession;
    use keystone::metadata::{ConfigurationSource, Model};

    fn index_property_names(model: &Model, entity: &str) -> Vec<(Vec<String>, bool)> {
        let id = model.find_entity_type(entity).unwrap();
        model
            .entity_type(id)
            .indexes
            .iter()
            .map(|&i| {
                let node = model.index(i);
                let names = node
                    .properties
                    .iter()
                    .map(|&p| model.property(p).name.clone())
                    .collect();
                (names, node.unique)
            })
            .collect()
    }

    fn blog_post_classifier() -> Rc<DeclaredTypes> {
        Rc::new(
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
        )
    }

    #[test]
    fn test_foreign_key_properties_get_an_index() {
        let mut session = ModelSession::new(blog_post_classifier(), Rc::new(NullSink));
        session.add_entity_type("Blog").unwrap();

        let indexes = index_property_names(session.model(), "Post");
        assert_eq!(indexes, vec![(vec!["BlogId".to_string()], false)]);
    }

    #[test]
    fn test_one_to_one_index_is_unique() {
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
                        .scalar("UserId", ScalarType::Int)
                        .reference("User", "User"),
                ),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        session.add_entity_type("Profile").unwrap();

        // Profile declared the reference pair, so Profile is the dependent and
        // its UserId matches by name.
        let indexes = index_property_names(session.model(), "Profile");
        assert_eq!(indexes, vec![(vec!["UserId".to_string()], true)]);
    }

    #[test]
    fn test_index_covered_by_primary_key_is_dropped() {
        let classifier = Rc::new(
            DeclaredTypes::new()
                .with(
                    TypeDescriptor::new("Course")
                        .scalar("Id", ScalarType::Int)
                        .collection("Students", "Student"),
                )
                .with(
                    TypeDescriptor::new("Student")
                        .scalar("Id", ScalarType::Int)
                        .collection("Courses", "Course"),
                ),
        );
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(classifier, sink.clone());
        session.add_entity_type("Course").unwrap();
        session.add_entity_type("Student").unwrap();

        // The join type keys on [CourseId, StudentId]; that key covers the
        // CourseId index as a prefix, while StudentId still needs its own.
        let indexes = index_property_names(session.model(), "CourseStudent");
        assert_eq!(indexes, vec![(vec!["StudentId".to_string()], false)]);
        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::RedundantIndexRemoved { entity_type, properties }
                if entity_type == "CourseStudent" && properties == &["CourseId".to_string()]
        )));
    }

    #[test]
    fn test_index_returns_when_key_cover_moves_away() {
        let mut session = ModelSession::new(blog_post_classifier(), Rc::new(NullSink));
        session.add_entity_type("Blog").unwrap();

        let post = session.model().find_entity_type("Post").unwrap();
        let blog_id = session.model().find_property(post, "BlogId").unwrap();
        let post_id = session.model().find_property(post, "Id").unwrap();

        // Keying Post on BlogId makes the convention index redundant.
        session
            .mutate(|b| {
                b.primary_key(post, &[blog_id], ConfigurationSource::Explicit)
                    .unwrap()
                    .unwrap();
            })
            .unwrap();
        assert!(index_property_names(session.model(), "Post").is_empty());

        // Moving the key back uncovers the foreign key again.
        session
            .mutate(|b| {
                b.primary_key(post, &[post_id], ConfigurationSource::Explicit)
                    .unwrap()
                    .unwrap();
            })
            .unwrap();
        assert_eq!(
            index_property_names(session.model(), "Post"),
            vec![(vec!["BlogId".to_string()], false)]
        );
    }

    #[test]
    fn test_explicit_index_is_left_alone() {
        let mut session = ModelSession::new(blog_post_classifier(), Rc::new(NullSink));
        session.add_entity_type("Blog").unwrap();

        let post = session.model().find_entity_type("Post").unwrap();
        let post_id = session.model().find_property(post, "Id").unwrap();
        session
            .mutate(|b| {
                b.index(post, vec![post_id], false, ConfigurationSource::Explicit)
                    .unwrap()
                    .unwrap();
            })
            .unwrap();

        // The explicit index matches no foreign key, but the sweep only
        // touches convention indexes.
        let mut indexes = index_property_names(session.model(), "Post");
        indexes.sort();
        assert_eq!(
            indexes,
            vec![
                (vec!["BlogId".to_string()], false),
                (vec!["Id".to_string()], false),
            ]
        );
    }

    #[test]
    fn test_index_removed_when_longer_index_covers_it() {
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(blog_post_classifier(), sink.clone());
        session.add_entity_type("Blog").unwrap();

        let post = session.model().find_entity_type("Post").unwrap();
        let blog_id = session.model().find_property(post, "BlogId").unwrap();
        let post_id = session.model().find_property(post, "Id").unwrap();
        let explicit = session
            .mutate(|b| {
                b.index(
                    post,
                    vec![blog_id, post_id],
                    false,
                    ConfigurationSource::Explicit,
                )
            })
            .unwrap()
            .unwrap()
            .unwrap();

        // The explicit index leads with the foreign key properties, so the
        // convention index is redundant.
        let indexes = index_property_names(session.model(), "Post");
        assert_eq!(
            indexes,
            vec![(vec!["BlogId".to_string(), "Id".to_string()], false)]
        );
        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::RedundantIndexRemoved { entity_type, properties }
                if entity_type == "Post" && properties == &["BlogId".to_string()]
        )));

        // Removing the cover brings the convention index back.
        session
            .mutate(|b| {
                assert!(b.remove_index(explicit, ConfigurationSource::Explicit));
            })
            .unwrap();
        let indexes = index_property_names(session.model(), "Post");
        assert_eq!(indexes, vec![(vec!["BlogId".to_string()], false)]);
    }
}
