#[cfg(test)]
mod tests {
    use keystone::metadata::arena::{Arena, ArenaId, EntityTypeId};

    #[test]
    fn test_insert_and_get() {
        let mut arena: Arena<EntityTypeId, String> = Arena::new();
        let a = arena.insert("Blog".to_string());
        let b = arena.insert("Post".to_string());

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a).map(String::as_str), Some("Blog"));
        assert_eq!(arena.get(b).map(String::as_str), Some("Post"));
        assert!(arena.contains(a));
    }

    #[test]
    fn test_remove_invalidates_id() {
        let mut arena: Arena<EntityTypeId, String> = Arena::new();
        let a = arena.insert("Blog".to_string());

        assert_eq!(arena.remove(a), Some("Blog".to_string()));
        assert!(!arena.contains(a));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
    }

    #[test]
    fn test_reused_slot_gets_new_generation() {
        let mut arena: Arena<EntityTypeId, String> = Arena::new();
        let a = arena.insert("Blog".to_string());
        arena.remove(a);
        let b = arena.insert("Post".to_string());

        // Same slot, different generation: the old id stays dead.
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b).map(String::as_str), Some("Post"));
    }

    #[test]
    fn test_iter_skips_removed_slots() {
        let mut arena: Arena<EntityTypeId, u32> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let c = arena.insert(3);
        arena.remove(b);

        let live: Vec<(EntityTypeId, u32)> = arena.iter().map(|(id, &v)| (id, v)).collect();
        assert_eq!(live, vec![(a, 1), (c, 3)]);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut arena: Arena<EntityTypeId, u32> = Arena::new();
        let a = arena.insert(1);
        *arena.get_mut(a).unwrap() += 10;
        assert_eq!(arena[a], 11);
    }

    #[test]
    #[should_panic(expected = "stale or removed arena id")]
    fn test_index_panics_on_removed_id() {
        let mut arena: Arena<EntityTypeId, u32> = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let _ = arena[a];
    }
}
