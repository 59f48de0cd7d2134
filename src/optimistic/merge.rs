use crate::core::{Entity, Patch};

/// Produces the optimistic entity from the current one and a patch.
///
/// Implementations must not change the entity's id; the coordinator puts
/// the result back at the position of the original id. It runs while the
/// collection is locked for the edit, so it must not call the accessor.
pub trait MergeStrategy {
    fn merge(&self, current: &Entity, patch: &Patch) -> Entity;
}

/// Field-by-field overwrite, one level deep. Fields absent from the patch
/// are kept; a `Null` in the patch sets the field to `Null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShallowMerge;

impl MergeStrategy for ShallowMerge {
    fn merge(&self, current: &Entity, patch: &Patch) -> Entity {
        let mut merged = current.clone();
        for (name, value) in patch.iter() {
            merged.set_field(name.clone(), value.clone());
        }
        merged
    }
}

impl<F> MergeStrategy for F
where
    F: Fn(&Entity, &Patch) -> Entity,
{
    fn merge(&self, current: &Entity, patch: &Patch) -> Entity {
        self(current, patch)
    }
}
