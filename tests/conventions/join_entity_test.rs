#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use keystone::classifier::{DeclaredTypes, ScalarType, TypeDescriptor};
    use keystone::diagnostics::{CollectingSink, ModelDiagnostic, NullSink};
    use keystone::infer::ModelSession;
    use keystone::metadata::{ConfigurationSource, Model};

    fn course_student_classifier() -> Rc<DeclaredTypes> {
        Rc::new(
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
        )
    }

    fn property_names(model: &Model, entity: &str) -> Vec<String> {
        let id = model.find_entity_type(entity).unwrap();
        let mut names: Vec<String> = model
            .entity_type(id)
            .properties
            .iter()
            .map(|&p| model.property(p).name.clone())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_many_to_many_synthesizes_a_join_type() {
        let sink = Rc::new(CollectingSink::new());
        let mut session = ModelSession::new(course_student_classifier(), sink.clone());
        let student = session.add_entity_type("Student").unwrap().unwrap();

        let model = session.model();
        let course = model.find_entity_type("Course").unwrap();
        let join = model.find_entity_type("CourseStudent").unwrap();
        let join_node = model.entity_type(join);
        assert!(join_node.backing_type.is_none());
        assert_eq!(join_node.source, ConfigurationSource::Convention);

        // One foreign key to each side, the lexicographically smaller
        // principal first, shadow properties named after the principals.
        assert_eq!(join_node.foreign_keys.len(), 2);
        let first = model.foreign_key(join_node.foreign_keys[0]);
        let second = model.foreign_key(join_node.foreign_keys[1]);
        assert_eq!(first.principal, course);
        assert_eq!(second.principal, student);
        assert_eq!(property_names(model, "CourseStudent"), vec!["CourseId", "StudentId"]);

        // The composite key concatenates the two foreign keys.
        let pk = model.key(join_node.primary_key.unwrap());
        let key_names: Vec<String> = pk
            .properties
            .iter()
            .map(|&p| model.property(p).name.clone())
            .collect();
        assert_eq!(key_names, vec!["CourseId", "StudentId"]);

        // Both skip navigations resolve through the join type.
        let courses = model.find_skip_navigation(student, "Courses").unwrap();
        let students = model.find_skip_navigation(course, "Students").unwrap();
        assert_eq!(model.skip_navigation(courses).inverse, Some(students));
        assert_eq!(model.skip_navigation(courses).join_entity, Some(join));
        assert_eq!(model.skip_navigation(students).join_entity, Some(join));
        assert_eq!(
            model.skip_navigation(courses).foreign_key,
            Some(join_node.foreign_keys[1])
        );
        assert_eq!(
            model.skip_navigation(students).foreign_key,
            Some(join_node.foreign_keys[0])
        );

        assert!(sink.events().iter().any(|d| matches!(
            d,
            ModelDiagnostic::JoinEntityCreated { name, left, right }
                if name == "CourseStudent" && left == "Course" && right == "Student"
        )));
    }

    #[test]
    fn test_join_name_collision_gets_an_ordinal() {
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
                )
                .with(TypeDescriptor::new("CourseStudent").scalar("Id", ScalarType::Int)),
        );
        let mut session = ModelSession::new(classifier, Rc::new(NullSink));
        session.add_entity_type("CourseStudent").unwrap();
        session.add_entity_type("Student").unwrap();

        let model = session.model();
        let synthesized = model.find_entity_type("CourseStudent1").unwrap();
        assert!(model.entity_type(synthesized).backing_type.is_none());
        // The structural type with the clashing name is untouched.
        let clashing = model.find_entity_type("CourseStudent").unwrap();
        assert!(model.entity_type(clashing).backing_type.is_some());
    }

    #[test]
    fn test_removing_a_skip_navigation_dissolves_the_join() {
        let mut session = ModelSession::new(course_student_classifier(), Rc::new(NullSink));
        let student = session.add_entity_type("Student").unwrap().unwrap();
        assert!(session.model().find_entity_type("CourseStudent").is_some());

        let courses = session
            .model()
            .find_skip_navigation(student, "Courses")
            .unwrap();
        session
            .mutate(|b| {
                assert!(b.remove_skip_navigation(courses, ConfigurationSource::Explicit));
            })
            .unwrap();

        assert!(session.model().find_entity_type("CourseStudent").is_none());
    }

    #[test]
    fn test_unpairing_clears_the_foreign_key_and_join() {
        let mut session = ModelSession::new(course_student_classifier(), Rc::new(NullSink));
        let student = session.add_entity_type("Student").unwrap().unwrap();
        let courses = session
            .model()
            .find_skip_navigation(student, "Courses")
            .unwrap();

        session
            .mutate(|b| {
                b.set_skip_navigation_inverse(courses, None);
            })
            .unwrap();

        let model = session.model();
        assert!(model.find_entity_type("CourseStudent").is_none());
        assert_eq!(model.skip_navigation(courses).foreign_key, None);
        assert_eq!(model.skip_navigation(courses).inverse, None);
    }
}
