use super::Document;
use super::context::SerializeContext;
use super::error::SerializeError;
use crate::ids::{ComponentId, GameObjectId, SceneId};
use crate::value::Value;
use crate::world::World;

/// Export one component.
///
/// ```json
/// {
///   "Type": "Light",
///   "ID": 9,
///   "Enabled": true,
///   "Variables": { "Intensity": 5.0, "Target": { "GOID": 3 } },
///   "Divorced": ["Intensity"]
/// }
/// ```
///
/// Only persisted variables are written, in registration order. `"Divorced"`
/// is omitted when no persisted variable is divorced.
pub fn export_component(world: &World, component: ComponentId) -> Result<Document, SerializeError> {
    let instance = world
        .component(component)
        .ok_or_else(|| SerializeError::NotFound(component.to_string()))?;
    let ty = instance.component_type();
    let mut ctx = SerializeContext::new(world, component.scene);

    ctx.begin_struct("Variables")?;
    for descriptor in ty.variables().iter().filter(|d| d.persist()) {
        let value = world
            .get_value(component, descriptor.name())
            .map_err(|e| SerializeError::FieldError {
                field: descriptor.name().to_owned(),
                message: e.to_string(),
            })?;
        ctx.write_value(descriptor.name(), &value)?;
    }
    let variables = ctx.end_struct()?;

    let divorced: Vec<&str> = instance
        .divorce_tracker()
        .divorced_indices()
        .filter_map(|index| ty.variable_at(index))
        .filter(|d| d.persist())
        .map(|d| d.name())
        .collect();

    ctx.begin_struct(ty.name())?;
    ctx.write_serde("Type", &ty.name())?;
    ctx.write_serde("ID", &component.id)?;
    ctx.write_serde("Enabled", &instance.is_enabled())?;
    ctx.write_field("Variables", variables)?;
    if !divorced.is_empty() {
        ctx.write_serde("Divorced", &divorced)?;
    }
    ctx.end_struct()
}

/// Export one object with its components.
///
/// `"ParentGOID"` and `"InheritsFrom"` are written only when set; the
/// prototype may live in another scene and is written as a reference.
pub fn export_object(world: &World, object: GameObjectId) -> Result<Document, SerializeError> {
    let entry = world
        .object(object)
        .ok_or_else(|| SerializeError::NotFound(object.to_string()))?;
    let components = entry
        .components()
        .iter()
        .map(|c| export_component(world, c.id()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut ctx = SerializeContext::new(world, object.scene);
    ctx.begin_struct("GameObject")?;
    ctx.write_serde("ID", &object.id)?;
    ctx.write_serde("Name", &entry.name())?;
    ctx.write_serde("Enabled", &entry.is_enabled())?;
    if let Some(parent) = entry.parent() {
        ctx.write_serde("ParentGOID", &parent.id)?;
    }
    if let Some(prototype) = entry.inherits_from() {
        ctx.write_value("InheritsFrom", &Value::GameObjectRef(Some(prototype)))?;
    }
    ctx.write_field("Components", Document::Array(components))?;
    ctx.end_struct()
}

/// Export a whole scene. Objects are listed parents first.
pub fn export_scene(world: &World, scene: SceneId) -> Result<Document, SerializeError> {
    let loaded = world
        .scene(scene)
        .ok_or_else(|| SerializeError::NotFound(scene.to_string()))?;

    let mut order = Vec::new();
    for &root in loaded.roots() {
        world.collect_subtree(root, &mut order);
    }
    let objects = order
        .into_iter()
        .map(|id| export_object(world, id))
        .collect::<Result<Vec<_>, _>>()?;
    log::debug!("exported {scene} ({} objects)", objects.len());

    let mut ctx = SerializeContext::new(world, scene);
    ctx.begin_struct("Scene")?;
    ctx.write_serde(super::field::SCENE_KEY, &scene.0)?;
    ctx.write_serde("Name", &loaded.name())?;
    ctx.write_field("GameObjects", Document::Array(objects))?;
    ctx.end_struct()
}
