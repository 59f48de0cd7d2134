// ============================================================================
// List Queries
// ============================================================================
//
// Equality filters, one sort key and an optional limit: everything the
// screens ask of the data-access layer. Missing and NULL sort keys always
// go last, whichever the direction.
//
// ============================================================================

use std::cmp::Ordering;

use crate::core::{Entity, Result, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<(String, Value)>,
    pub sort: Option<SortKey>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only entities whose `field` equals `value`. Filters are ANDed.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortKey {
            field: field.into(),
            order,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.filters.iter().all(|(field, expected)| {
            if field == crate::core::entity::ID_FIELD {
                return entity.id().as_str() == expected.to_string();
            }
            entity.field(field) == Some(expected)
        })
    }

    /// Filters, sorts (stable) and truncates `entities`.
    ///
    /// `max_page_size` caps the result when no explicit limit is given.
    pub fn apply(&self, entities: Vec<Entity>, max_page_size: usize) -> Result<Vec<Entity>> {
        let mut items: Vec<Entity> = entities
            .into_iter()
            .filter(|entity| self.matches(entity))
            .collect();

        if let Some(key) = &self.sort {
            check_comparable(&items, &key.field)?;
            items.sort_by(|left, right| compare_by_key(left, right, key));
        }

        items.truncate(self.limit.unwrap_or(max_page_size).min(max_page_size));
        Ok(items)
    }
}

/// Fails if two non-null sort keys have incompatible types.
///
/// Compatibility is an equivalence (numbers, text, booleans), so checking
/// every key against the first one covers all pairs.
fn check_comparable(items: &[Entity], field: &str) -> Result<()> {
    let mut keys = items
        .iter()
        .filter_map(|entity| entity.field(field))
        .filter(|value| !value.is_null());
    let Some(first) = keys.next() else {
        return Ok(());
    };
    keys.try_for_each(|value| first.compare(value).map(|_| ()))
}

fn compare_by_key(left: &Entity, right: &Entity, key: &SortKey) -> Ordering {
    let left = left.field(&key.field).unwrap_or(&Value::Null);
    let right = right.field(&key.field).unwrap_or(&Value::Null);

    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            // keys were checked by check_comparable
            let ordering = left.compare(right).unwrap_or(Ordering::Equal);
            match key.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    }
}
