//! Serialization and deserialization contexts.
//!
//! [`SerializeContext`] accumulates the fields of one document map.
//! [`DeserializeContext`] gives field-by-field access to one. Both carry
//! the [`World`] and the scene that references are written relative to.

use serde_json::Map;

use super::Document;
use super::error::{DeserializeError, SerializeError};
use super::field;
use crate::ids::SceneId;
use crate::value::{Value, VariableType};
use crate::world::World;

// ---------------------------------------------------------------------------
// SerializeContext
// ---------------------------------------------------------------------------

/// Context for writing one document map at a time.
pub struct SerializeContext<'w> {
    world: &'w World,
    scene: SceneId,
    fields: Map<String, Document>,
}

impl<'w> SerializeContext<'w> {
    pub fn new(world: &'w World, scene: SceneId) -> Self {
        Self {
            world,
            scene,
            fields: Map::new(),
        }
    }

    pub fn world(&self) -> &World {
        self.world
    }

    /// The scene references are written relative to.
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Begin a map, discarding fields of an unfinished one.
    pub fn begin_struct(&mut self, _name: &str) -> Result<(), SerializeError> {
        self.fields.clear();
        Ok(())
    }

    /// Write a pre-built document for a field.
    pub fn write_field(&mut self, name: &str, value: Document) -> Result<(), SerializeError> {
        self.fields.insert(name.to_owned(), value);
        Ok(())
    }

    /// Write a variable value using the scene-relative encoding.
    pub fn write_value(&mut self, name: &str, value: &Value) -> Result<(), SerializeError> {
        let encoded = field::encode_value(value, self.scene);
        self.write_field(name, encoded)
    }

    /// Write a serde-serializable value as a field.
    pub fn write_serde<T: serde::Serialize>(
        &mut self,
        name: &str,
        val: &T,
    ) -> Result<(), SerializeError> {
        let value = serde_json::to_value(val).map_err(|e| SerializeError::FieldError {
            field: name.to_owned(),
            message: e.to_string(),
        })?;
        self.write_field(name, value)
    }

    /// Finish the map and return it.
    pub fn end_struct(&mut self) -> Result<Document, SerializeError> {
        Ok(Document::Object(std::mem::take(&mut self.fields)))
    }
}

// ---------------------------------------------------------------------------
// DeserializeContext
// ---------------------------------------------------------------------------

/// Context for reading one document map at a time.
pub struct DeserializeContext<'w> {
    world: &'w World,
    scene: SceneId,
    fields: Map<String, Document>,
}

impl<'w> DeserializeContext<'w> {
    pub fn new(world: &'w World, scene: SceneId) -> Self {
        Self {
            world,
            scene,
            fields: Map::new(),
        }
    }

    pub fn world(&self) -> &World {
        self.world
    }

    /// The scene references are resolved relative to.
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Load a document map into the context.
    pub fn load_data(&mut self, data: &Document) -> Result<(), DeserializeError> {
        match data {
            Document::Object(map) => {
                self.fields = map.clone();
                Ok(())
            }
            other => Err(DeserializeError::TypeMismatch {
                field: "<root>".to_owned(),
                expected: "object".to_owned(),
                found: field::describe(other).to_owned(),
            }),
        }
    }

    /// Raw access to a field.
    pub fn read_field(&self, name: &str) -> Option<&Document> {
        self.fields.get(name)
    }

    /// Read a required serde-deserializable field.
    pub fn read_serde<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<T, DeserializeError> {
        let doc = self
            .read_field(name)
            .ok_or_else(|| DeserializeError::MissingField {
                field: name.to_owned(),
                context: "document".to_owned(),
            })?;
        serde_json::from_value(doc.clone()).map_err(|e| DeserializeError::TypeMismatch {
            field: name.to_owned(),
            expected: std::any::type_name::<T>().to_owned(),
            found: e.to_string(),
        })
    }

    /// Read an optional serde-deserializable field; absent and null are `None`.
    pub fn read_optional<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, DeserializeError> {
        match self.read_field(name) {
            None | Some(Document::Null) => Ok(None),
            Some(_) => self.read_serde(name).map(Some),
        }
    }

    /// Decode a variable field; `None` when the field is absent.
    pub fn read_value(
        &self,
        name: &str,
        ty: VariableType,
    ) -> Result<Option<Value>, DeserializeError> {
        self.read_field(name)
            .map(|doc| field::decode_value(doc, ty, name, self.scene))
            .transpose()
    }

    /// Names of the loaded fields, in document order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ids::GameObjectId;

    #[test]
    fn serialize_accumulates_in_write_order() {
        let world = World::new();
        let mut ctx = SerializeContext::new(&world, SceneId(1));
        ctx.begin_struct("Probe").unwrap();
        ctx.write_serde("Name", &"probe").unwrap();
        ctx.write_value("Target", &Value::GameObjectRef(Some(GameObjectId::new(SceneId(2), 5))))
            .unwrap();
        let doc = ctx.end_struct().unwrap();

        assert_eq!(
            doc,
            json!({ "Name": "probe", "Target": { "GOID": 5, "SceneID": 2 } })
        );
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["Name", "Target"]);
    }

    #[test]
    fn deserialize_reads_fields_by_name() {
        let world = World::new();
        let mut ctx = DeserializeContext::new(&world, SceneId(3));
        ctx.load_data(&json!({ "ID": 4, "Speed": 2.5, "Parent": null }))
            .unwrap();

        assert_eq!(ctx.read_serde::<u32>("ID").unwrap(), 4);
        assert_eq!(ctx.read_optional::<u32>("Parent").unwrap(), None);
        assert_eq!(
            ctx.read_value("Speed", VariableType::Float).unwrap(),
            Some(Value::Float(2.5))
        );
        assert_eq!(ctx.read_value("Missing", VariableType::Float).unwrap(), None);
        assert!(matches!(
            ctx.read_serde::<u32>("Missing"),
            Err(DeserializeError::MissingField { .. })
        ));
        assert!(ctx.load_data(&json!([1, 2])).is_err());
    }
}
