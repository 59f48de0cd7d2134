use im::Vector;

use crate::collection::CollectionAccessor;
use crate::core::{Entity, EntityId};

/// Immutable capture of a collection, held for one in-flight mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    entries: Vector<Entity>,
}

impl CollectionSnapshot {
    pub fn capture<A: CollectionAccessor + ?Sized>(accessor: &A) -> Self {
        Self {
            entries: accessor.get(),
        }
    }

    pub(crate) fn from_entries(entries: Vector<Entity>) -> Self {
        Self { entries }
    }

    /// Overwrites the accessor's collection with exactly the captured state.
    pub fn restore<A: CollectionAccessor + ?Sized>(&self, accessor: &A) {
        accessor.set(self.entries.clone());
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entries.iter().find(|entity| entity.id() == id)
    }

    pub fn entries(&self) -> &Vector<Entity> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
