use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::core::{Result, Value};

/// Name of the identity field every entity carries.
pub const ID_FIELD: &str = "id";

/// Identifier of an entity, unique within its collection.
///
/// Numeric and textual ids are both accepted and normalised to their string
/// form, so `EntityId::from(1) == EntityId::from("1")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id, as assigned by the store on create.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for EntityId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&EntityId> for EntityId {
    fn from(id: &EntityId) -> Self {
        id.clone()
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Integer(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Integer(id) => Self::from(id),
            RawId::Text(id) => Self(id),
        })
    }
}

/// A single record of a collection: an `id` plus named fields.
///
/// Entities are treated as immutable records by the coordinator: an update
/// replaces the whole entity rather than editing it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Sets a field. The identity field cannot be overwritten and is skipped.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if name == ID_FIELD {
            return;
        }
        self.fields.insert(name, value.into());
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(json)?)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Field changes to shallow-merge onto an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(BTreeMap<String, Value>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(json)?)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Patch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_and_text_ids_are_equal() {
        assert_eq!(EntityId::from(1), EntityId::from("1"));
    }

    #[test]
    fn test_entity_serializes_flat() {
        let entity = Entity::new(1).with_field("status", "pendente");
        let json = entity.to_json().unwrap();
        assert_eq!(json, json!({"id": "1", "status": "pendente"}));
    }

    #[test]
    fn test_entity_from_json_accepts_numeric_id() {
        let entity =
            Entity::from_json(json!({"id": 2, "status": "em_andamento", "amount": 10.5})).unwrap();
        assert_eq!(entity.id(), &EntityId::from(2));
        assert_eq!(entity.field("status"), Some(&Value::from("em_andamento")));
        assert_eq!(entity.field("amount"), Some(&Value::Float(10.5)));
        assert!(entity.field("id").is_none());
    }

    #[test]
    fn test_entity_from_json_requires_id() {
        assert!(Entity::from_json(json!({"status": "pendente"})).is_err());
    }

    #[test]
    fn test_id_field_cannot_be_overwritten() {
        let entity = Entity::new("a").with_field("id", "b");
        assert_eq!(entity.id().as_str(), "a");
        assert!(entity.fields().is_empty());
    }

    #[test]
    fn test_patch_from_json() {
        let patch = Patch::from_json(json!({"status": "finalizado", "notes": null})).unwrap();
        assert_eq!(patch.len(), 2);
        assert_eq!(patch.get("notes"), Some(&Value::Null));
    }
}
