//! Document encoding of individual [`Value`]s.
//!
//! | Tag | Encoding |
//! |-----|----------|
//! | Int, UnsignedInt, EnumIndex, Float | number |
//! | Bool | bool |
//! | ColorByte | `[r, g, b, a]` |
//! | Vector2, Vector3 | `[x, y]`, `[x, y, z]` |
//! | GameObjectRef | `{"GOID": id}` |
//! | ComponentRef | `{"ComponentID": id}` |
//! | FileRef, MaterialRef, IndirectPointer | string |
//!
//! Null references encode as `null`. Object and component references carry
//! an extra `"SceneID"` key when the target lives in another scene than the
//! document.

use glam::{Vec2, Vec3};
use serde_json::{Map, json};

use super::Document;
use super::error::DeserializeError;
use crate::ids::{ComponentId, GameObjectId, SceneId};
use crate::value::{ColorByte, EnumIndex, FileRef, MaterialRef, Value, VariableType};

pub const OBJECT_KEY: &str = "GOID";
pub const COMPONENT_KEY: &str = "ComponentID";
pub const SCENE_KEY: &str = "SceneID";

/// Encode a value; references are written relative to `scene`.
pub fn encode_value(value: &Value, scene: SceneId) -> Document {
    match value {
        Value::Int(v) => json!(v),
        Value::UnsignedInt(v) => json!(v),
        Value::Bool(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::ColorByte(c) => json!([c.r, c.g, c.b, c.a]),
        Value::Vector2(v) => json!([v.x, v.y]),
        Value::Vector3(v) => json!([v.x, v.y, v.z]),
        Value::GameObjectRef(target) => match target {
            Some(id) => encode_reference(OBJECT_KEY, id.id, id.scene, scene),
            None => Document::Null,
        },
        Value::ComponentRef(target) => match target {
            Some(id) => encode_reference(COMPONENT_KEY, id.id, id.scene, scene),
            None => Document::Null,
        },
        Value::FileRef(file) => file.as_ref().map_or(Document::Null, |f| json!(f.0)),
        Value::MaterialRef(material) => material.as_ref().map_or(Document::Null, |m| json!(m.0)),
        Value::EnumIndex(EnumIndex(index)) => json!(index),
        Value::IndirectPointer(path) => path.as_ref().map_or(Document::Null, |p| json!(p)),
    }
}

fn encode_reference(key: &str, id: u32, target_scene: SceneId, scene: SceneId) -> Document {
    let mut map = Map::new();
    map.insert(key.to_owned(), json!(id));
    if target_scene != scene {
        map.insert(SCENE_KEY.to_owned(), json!(target_scene.0));
    }
    Document::Object(map)
}

/// Decode a document value as `ty`; references are resolved relative to
/// `scene` but not checked for existence.
pub fn decode_value(
    doc: &Document,
    ty: VariableType,
    field: &str,
    scene: SceneId,
) -> Result<Value, DeserializeError> {
    let mismatch = || DeserializeError::TypeMismatch {
        field: field.to_owned(),
        expected: ty.to_string(),
        found: describe(doc).to_owned(),
    };

    let value = match ty {
        VariableType::Int => doc
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int),
        VariableType::UnsignedInt => doc
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Value::UnsignedInt),
        VariableType::Bool => doc.as_bool().map(Value::Bool),
        VariableType::Float => doc.as_f64().map(|v| Value::Float(v as f32)),
        VariableType::EnumIndex => doc
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(|v| Value::EnumIndex(EnumIndex(v))),
        VariableType::ColorByte => {
            bytes::<4>(doc).map(|[r, g, b, a]| Value::ColorByte(ColorByte::new(r, g, b, a)))
        }
        VariableType::Vector2 => floats::<2>(doc).map(|[x, y]| Value::Vector2(Vec2::new(x, y))),
        VariableType::Vector3 => {
            floats::<3>(doc).map(|[x, y, z]| Value::Vector3(Vec3::new(x, y, z)))
        }
        VariableType::GameObjectRef => decode_reference(doc, OBJECT_KEY, scene)
            .map(|r| Value::GameObjectRef(r.map(|(s, id)| GameObjectId::new(s, id)))),
        VariableType::ComponentRef => decode_reference(doc, COMPONENT_KEY, scene)
            .map(|r| Value::ComponentRef(r.map(|(s, id)| ComponentId::new(s, id)))),
        VariableType::FileRef => {
            optional_string(doc).map(|s| Value::FileRef(s.map(|s| FileRef(s.to_owned()))))
        }
        VariableType::MaterialRef => optional_string(doc)
            .map(|s| Value::MaterialRef(s.map(|s| MaterialRef(s.to_owned())))),
        VariableType::IndirectPointer => {
            optional_string(doc).map(|s| Value::IndirectPointer(s.map(str::to_owned)))
        }
    };
    value.ok_or_else(mismatch)
}

/// `Some(None)` for null, `Some(Some(..))` for a well-formed reference.
fn decode_reference(doc: &Document, key: &str, scene: SceneId) -> Option<Option<(SceneId, u32)>> {
    if doc.is_null() {
        return Some(None);
    }
    let map = doc.as_object()?;
    let id = u32::try_from(map.get(key)?.as_u64()?).ok()?;
    let target_scene = match map.get(SCENE_KEY) {
        Some(scene_id) => SceneId(u32::try_from(scene_id.as_u64()?).ok()?),
        None => scene,
    };
    Some(Some((target_scene, id)))
}

fn optional_string(doc: &Document) -> Option<Option<&str>> {
    match doc {
        Document::Null => Some(None),
        Document::String(s) => Some(Some(s)),
        _ => None,
    }
}

fn floats<const N: usize>(doc: &Document) -> Option<[f32; N]> {
    let items = doc.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()? as f32;
    }
    Some(out)
}

fn bytes<const N: usize>(doc: &Document) -> Option<[u8; N]> {
    let items = doc.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = u8::try_from(item.as_u64()?).ok()?;
    }
    Some(out)
}

/// Short name of a document node's shape, for error messages.
pub fn describe(doc: &Document) -> &'static str {
    match doc {
        Document::Null => "null",
        Document::Bool(_) => "bool",
        Document::Number(_) => "number",
        Document::String(_) => "string",
        Document::Array(_) => "array",
        Document::Object(_) => "object",
    }
}
