use std::sync::{Arc, PoisonError, RwLock};

use im::Vector;

use crate::core::{Entity, EntityId};

/// Read/write access to an ordered collection of entities.
///
/// This is the only way the coordinator touches state, so it can be pointed
/// at any container: a UI store, a test fixture, or [`SharedCollection`].
/// Both calls are synchronous and must not suspend.
pub trait CollectionAccessor {
    fn get(&self) -> Vector<Entity>;
    fn set(&self, next: Vector<Entity>);

    /// Edits the collection in place and returns what `f` returns.
    ///
    /// The default reads with `get` and writes back with `set`, which is only
    /// atomic for single-threaded containers. Shared containers must override
    /// it so that no other write can land between the read and the write.
    fn update<R>(&self, f: impl FnOnce(&mut Vector<Entity>) -> R) -> R {
        let mut entries = self.get();
        let result = f(&mut entries);
        self.set(entries);
        result
    }
}

impl<T: CollectionAccessor + ?Sized> CollectionAccessor for Arc<T> {
    fn get(&self) -> Vector<Entity> {
        (**self).get()
    }

    fn set(&self, next: Vector<Entity>) {
        (**self).set(next)
    }

    fn update<R>(&self, f: impl FnOnce(&mut Vector<Entity>) -> R) -> R {
        (**self).update(f)
    }
}

/// Shared, cheaply cloneable collection backed by a persistent vector.
///
/// Clones share the same underlying state. Reads hand out an `im::Vector`,
/// which is an O(1) structural copy, so snapshots never deep-clone entities.
#[derive(Debug, Clone, Default)]
pub struct SharedCollection {
    entries: Arc<RwLock<Vector<Entity>>>,
}

impl SharedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entities.into_iter().collect())),
        }
    }

    pub fn len(&self) -> usize {
        self.read(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.read(|entries| entries.is_empty())
    }

    pub fn find(&self, id: &EntityId) -> Option<Entity> {
        self.read(|entries| entries.iter().find(|entity| entity.id() == id).cloned())
    }

    pub fn position(&self, id: &EntityId) -> Option<usize> {
        self.read(|entries| position_of(entries, id))
    }

    /// Replaces the entity with `id` in place. Returns `false` if it is absent.
    pub fn replace(&self, id: &EntityId, entity: Entity) -> bool {
        self.write(|entries| match position_of(entries, id) {
            Some(index) => {
                entries.set(index, entity);
                true
            }
            None => false,
        })
    }

    /// Inserts at the front; collections are kept newest first.
    pub fn prepend(&self, entity: Entity) {
        self.write(|entries| entries.push_front(entity));
    }

    pub fn remove(&self, id: &EntityId) -> Option<Entity> {
        self.write(|entries| position_of(entries, id).map(|index| entries.remove(index)))
    }

    pub fn to_vec(&self) -> Vec<Entity> {
        self.read(|entries| entries.iter().cloned().collect())
    }

    fn read<R>(&self, f: impl FnOnce(&Vector<Entity>) -> R) -> R {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Vector<Entity>) -> R) -> R {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl CollectionAccessor for SharedCollection {
    fn get(&self) -> Vector<Entity> {
        self.read(|entries| entries.clone())
    }

    fn set(&self, next: Vector<Entity>) {
        self.write(|entries| *entries = next);
    }

    fn update<R>(&self, f: impl FnOnce(&mut Vector<Entity>) -> R) -> R {
        self.write(f)
    }
}

pub(crate) fn position_of(entries: &Vector<Entity>, id: &EntityId) -> Option<usize> {
    entries.iter().position(|entity| entity.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SharedCollection {
        SharedCollection::from_entities(vec![
            Entity::new(1).with_field("status", "pendente"),
            Entity::new(2).with_field("status", "em_andamento"),
        ])
    }

    #[test]
    fn test_clones_share_state() {
        let collection = sample();
        let other = collection.clone();
        other.prepend(Entity::new(3));
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.position(&EntityId::from(3)), Some(0));
    }

    #[test]
    fn test_replace_keeps_position() {
        let collection = sample();
        let replaced = collection.replace(
            &EntityId::from(1),
            Entity::new(1).with_field("status", "finalizado"),
        );
        assert!(replaced);
        assert_eq!(collection.position(&EntityId::from(1)), Some(0));
        assert!(!collection.replace(&EntityId::from(9), Entity::new(9)));
    }

    #[test]
    fn test_update_runs_under_one_write() {
        let collection = Arc::new(sample());
        let workers: Vec<_> = (0..8)
            .map(|n| {
                let collection = Arc::clone(&collection);
                std::thread::spawn(move || {
                    collection.update(|entries| {
                        let snapshot = entries.clone();
                        std::thread::sleep(std::time::Duration::from_millis(1));
                        *entries = snapshot;
                        entries.push_back(Entity::new(100 + n));
                    })
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(collection.len(), 10);
    }

    #[test]
    fn test_default_update_goes_through_get_and_set() {
        struct Plain(std::cell::RefCell<Vector<Entity>>);

        impl CollectionAccessor for Plain {
            fn get(&self) -> Vector<Entity> {
                self.0.borrow().clone()
            }

            fn set(&self, next: Vector<Entity>) {
                *self.0.borrow_mut() = next;
            }
        }

        let plain = Plain(std::cell::RefCell::new(sample().get()));
        let removed = plain.update(|entries| entries.pop_front());
        assert_eq!(removed.map(|entity| entity.id().clone()), Some(EntityId::from(1)));
        assert_eq!(plain.get().len(), 1);
    }

    #[test]
    fn test_get_is_detached_copy() {
        let collection = sample();
        let copy = collection.get();
        collection.remove(&EntityId::from(2));
        assert_eq!(copy.len(), 2);
        assert_eq!(collection.len(), 1);
    }
}
