//! Generational arenas for metadata graph nodes.
//!
//! Every node kind (entity type, property, key, foreign key, navigation,
//! skip navigation, index) lives in its own arena and is addressed by a
//! typed, `Copy` id carrying a slot index plus a generation counter.
//! Back-references between nodes are stored as ids and resolved through the
//! owning [`Model`](super::Model), so "is this object still live" is a
//! single generation check rather than a nullable-reference protocol.

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A typed handle into one arena.
pub trait ArenaId: Copy + Eq {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            index: u32,
            generation: u32,
        }

        impl ArenaId for $name {
            fn from_parts(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            fn index(self) -> u32 {
                self.index
            }

            fn generation(self) -> u32 {
                self.generation
            }
        }
    };
}

define_id!(
    /// Handle to an entity type node.
    EntityTypeId
);
define_id!(
    /// Handle to a property node.
    PropertyId
);
define_id!(
    /// Handle to a key node.
    KeyId
);
define_id!(
    /// Handle to a foreign key node.
    ForeignKeyId
);
define_id!(
    /// Handle to a navigation node.
    NavigationId
);
define_id!(
    /// Handle to a skip navigation node.
    SkipNavigationId
);
define_id!(
    /// Handle to an index node.
    IndexId
);

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A generational arena: stable ids, O(1) insert/remove/lookup, and
/// stale-id detection via generation mismatch.
#[derive(Debug, Clone)]
pub struct Arena<I, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    _id: PhantomData<I>,
}

impl<I: ArenaId, T> Arena<I, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            _id: PhantomData,
        }
    }

    /// Insert a value and return its id.
    pub fn insert(&mut self, value: T) -> I {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            I::from_parts(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            I::from_parts(index, 0)
        }
    }

    /// Remove a value. The slot's generation is bumped so stale ids can
    /// never resolve to a later occupant.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() || slot.value.is_none() {
            return None;
        }
        let value = slot.value.take();
        slot.generation += 1;
        self.free.push(id.index());
        self.live -= 1;
        value
    }

    pub fn get(&self, id: I) -> Option<&T> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Whether the id refers to a live value.
    pub fn contains(&self, id: I) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate live entries in slot order (insertion order for arenas that
    /// never free, deterministic regardless).
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (I::from_parts(index as u32, slot.generation), value))
        })
    }
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id).expect("stale or removed arena id")
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id).expect("stale or removed arena id")
    }
}
