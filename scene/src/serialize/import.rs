use std::collections::HashSet;
use std::sync::Arc;

use super::Document;
use super::context::DeserializeContext;
use super::error::DeserializeError;
use super::field::{self, SCENE_KEY};
use crate::component::Component;
use crate::edit::{SetOptions, WriteOrigin};
use crate::error::SceneError;
use crate::hierarchy;
use crate::ids::{ComponentId, GameObjectId, SceneId};
use crate::transform::Transform;
use crate::value::{Value, VariableType};
use crate::world::World;

/// What an import did with each variable entry.
///
/// Only `applied` entries changed the world. The other lists name entries
/// that were skipped and logged; none of them fails the import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub applied: Vec<String>,
    /// Names the component type does not declare (or does not persist).
    pub unknown: Vec<String>,
    /// References whose target is not loaded; the variable is left null.
    pub unresolved: Vec<String>,
    /// Entries of the wrong shape, or refused by the variable.
    pub rejected: Vec<String>,
}

impl ImportReport {
    /// `true` if every entry was applied.
    pub fn is_clean(&self) -> bool {
        self.unknown.is_empty() && self.unresolved.is_empty() && self.rejected.is_empty()
    }

    fn absorb(&mut self, prefix: &str, other: ImportReport) {
        let scoped = |names: Vec<String>| names.into_iter().map(move |n| format!("{prefix}/{n}"));
        self.applied.extend(scoped(other.applied));
        self.unknown.extend(scoped(other.unknown));
        self.unresolved.extend(scoped(other.unresolved));
        self.rejected.extend(scoped(other.rejected));
    }
}

/// Import a component document into an existing component.
///
/// Variables are matched by name. Missing variables keep their current
/// value. Imported values neither propagate to heirs nor divorce; the
/// divorce flags are restored from `"Divorced"` instead.
pub fn import_component(
    world: &mut World,
    doc: &Document,
    scene: SceneId,
    component: ComponentId,
) -> Result<ImportReport, DeserializeError> {
    let ty = world
        .component(component)
        .map(|c| Arc::clone(c.component_type()))
        .ok_or(SceneError::ComponentNotFound(component))?;
    let mut report = ImportReport::default();

    let (writes, enabled, divorced) = {
        let mut ctx = DeserializeContext::new(world, scene);
        ctx.load_data(doc)?;
        if let Some(type_name) = ctx.read_optional::<String>("Type")?
            && type_name != ty.name()
        {
            return Err(DeserializeError::TypeMismatch {
                field: "Type".to_owned(),
                expected: ty.name().to_owned(),
                found: type_name,
            });
        }
        let enabled = ctx.read_optional::<bool>("Enabled")?;
        let divorced = ctx.read_optional::<Vec<String>>("Divorced")?.unwrap_or_default();

        let mut writes = Vec::new();
        if let Some(variables) = ctx.read_field("Variables") {
            let mut fields = DeserializeContext::new(world, scene);
            fields.load_data(variables)?;
            for name in fields.field_names() {
                let Some(descriptor) = ty.variable(name).filter(|d| d.persist()) else {
                    log::debug!("ignoring unknown variable '{name}' for '{}'", ty.name());
                    report.unknown.push(name.to_owned());
                    continue;
                };
                let value = match fields.read_value(name, descriptor.var_type()) {
                    Ok(Some(value)) => value,
                    Ok(None) => continue,
                    Err(err) => {
                        log::warn!("skipping '{name}' of {component}: {err}");
                        report.rejected.push(name.to_owned());
                        continue;
                    }
                };
                let value = if resolves(world, &value) {
                    value
                } else {
                    log::warn!("'{name}' of {component} points at {value:?}, which is not loaded; leaving it null");
                    report.unresolved.push(name.to_owned());
                    match Value::null_of(descriptor.var_type()) {
                        Some(null) => null,
                        None => continue,
                    }
                };
                writes.push((name.to_owned(), value));
            }
        }
        (writes, enabled, divorced)
    };

    for (name, value) in writes {
        let mut visited = HashSet::new();
        match world.write_variable(
            component,
            &name,
            value,
            SetOptions::default(),
            WriteOrigin::Import,
            &mut visited,
        ) {
            Ok(_) => report.applied.push(name),
            Err(err) => {
                log::warn!("skipping '{name}' of {component}: {err}");
                report.rejected.push(name);
            }
        }
    }

    for descriptor in ty.variables().iter().filter(|d| d.persist()) {
        let flag = divorced.iter().any(|n| n == descriptor.name());
        world.set_divorced(component, descriptor.name(), flag)?;
    }
    for name in divorced.iter().filter(|n| ty.variable(n).is_none()) {
        log::debug!("ignoring divorce flag of unknown variable '{name}'");
    }
    if let Some(enabled) = enabled {
        world.set_component_enabled(component, enabled)?;
    }
    Ok(report)
}

fn resolves(world: &World, value: &Value) -> bool {
    match value {
        Value::GameObjectRef(Some(target)) => world.contains_object(*target),
        Value::ComponentRef(Some(target)) => world.component(*target).is_some(),
        _ => true,
    }
}

/// An object document with the ids the first pass read from it.
struct PendingObject<'d> {
    id: GameObjectId,
    doc: &'d Document,
    components: Vec<PendingComponent<'d>>,
}

struct PendingComponent<'d> {
    type_name: String,
    id: Option<ComponentId>,
    doc: &'d Document,
}

/// Load a scene document exported by
/// [`export_scene`](super::export_scene) into a scene that is not loaded
/// yet.
///
/// Objects are created first, then parented, then linked to their
/// prototypes, then given their components, and only then are variable
/// values imported. References between objects of the document therefore
/// resolve regardless of the order objects appear in.
pub fn import_scene(world: &mut World, doc: &Document) -> Result<(SceneId, ImportReport), DeserializeError> {
    let (scene, name, objects) = {
        let mut ctx = DeserializeContext::new(world, SceneId(0));
        ctx.load_data(doc)?;
        let scene = SceneId(ctx.read_serde::<u32>(SCENE_KEY)?);
        let name = ctx.read_optional::<String>("Name")?.unwrap_or_default();
        let objects = match doc.get("GameObjects") {
            Some(Document::Array(items)) => items
                .iter()
                .map(|item| pending_object(world, scene, item))
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(DeserializeError::TypeMismatch {
                    field: "GameObjects".to_owned(),
                    expected: "array".to_owned(),
                    found: field::describe(other).to_owned(),
                });
            }
            None => Vec::new(),
        };
        (scene, name, objects)
    };

    world.load_scene(scene, &name)?;
    if let Some(loaded) = world.scene_mut(scene) {
        for component in objects.iter().flat_map(|o| &o.components).filter_map(|c| c.id) {
            loaded.reserve_component_id(component.id);
        }
    }
    let report = match populate_scene(world, scene, &objects) {
        Ok(report) => report,
        Err(err) => {
            if let Err(unload) = world.unload_scene(scene) {
                log::warn!("cannot unload partially imported {scene}: {unload}");
            }
            return Err(err);
        }
    };
    log::debug!(
        "imported {scene} '{name}' ({} objects, {} values applied)",
        objects.len(),
        report.applied.len()
    );
    Ok((scene, report))
}

/// Import passes run once the scene is loaded and its ids reserved.
fn populate_scene(
    world: &mut World,
    scene: SceneId,
    objects: &[PendingObject<'_>],
) -> Result<ImportReport, DeserializeError> {
    let mut report = ImportReport::default();

    // Pass 1: objects, each with its Transform under the saved id.
    for pending in objects {
        let mut ctx = DeserializeContext::new(world, scene);
        ctx.load_data(pending.doc)?;
        let name = ctx.read_optional::<String>("Name")?.unwrap_or_default();
        let enabled = ctx.read_optional::<bool>("Enabled")?;
        let transform = pending
            .components
            .first()
            .filter(|c| c.type_name == Transform::NAME)
            .and_then(|c| c.id);
        world.create_object_with_transform_id(pending.id, &name, transform)?;
        if let Some(enabled) = enabled {
            world.set_object_enabled(pending.id, enabled)?;
        }
    }

    // Pass 2: parenting.
    for pending in objects {
        let Some(parent) = pending
            .doc
            .get("ParentGOID")
            .and_then(Document::as_u64)
            .and_then(|id| u32::try_from(id).ok())
        else {
            continue;
        };
        let parent = GameObjectId::new(scene, parent);
        if let Err(err) = hierarchy::set_parent(world, pending.id, parent) {
            log::warn!("cannot parent {} to {parent}: {err}", pending.id);
            report.unresolved.push(format!("{}/ParentGOID", pending.id));
        }
    }

    // Pass 3: prototypes.
    for pending in objects {
        let Some(doc) = pending.doc.get("InheritsFrom") else {
            continue;
        };
        let prototype = match field::decode_value(doc, VariableType::GameObjectRef, "InheritsFrom", scene)? {
            Value::GameObjectRef(Some(prototype)) => prototype,
            _ => continue,
        };
        if !world.contains_object(prototype) {
            log::warn!("prototype {prototype} of {} is not loaded", pending.id);
            report.unresolved.push(format!("{}/InheritsFrom", pending.id));
            continue;
        }
        if let Err(err) = world.set_inherits_from(pending.id, Some(prototype)) {
            log::warn!("{err}");
            report.rejected.push(format!("{}/InheritsFrom", pending.id));
        }
    }

    // Pass 4: components.
    let mut created = Vec::new();
    for pending in objects {
        for (index, component) in pending.components.iter().enumerate() {
            if index == 0 && component.type_name == Transform::NAME {
                if let Some(transform) = world.transform_of(pending.id) {
                    created.push((transform, component.doc));
                }
                continue;
            }
            let attached = match component.id {
                Some(id) => world.add_component_with_id(pending.id, &component.type_name, id),
                None => world.add_component_by_name(pending.id, &component.type_name),
            };
            match attached {
                Ok(id) => created.push((id, component.doc)),
                Err(err) => {
                    log::warn!("skipping '{}' on {}: {err}", component.type_name, pending.id);
                    report.unknown.push(format!("{}/{}", pending.id, component.type_name));
                }
            }
        }
    }

    // Pass 5: values.
    for (component, doc) in created {
        let partial = import_component(world, doc, scene, component)?;
        report.absorb(&component.to_string(), partial);
    }
    Ok(report)
}

fn pending_object<'d>(
    world: &World,
    scene: SceneId,
    doc: &'d Document,
) -> Result<PendingObject<'d>, DeserializeError> {
    let mut ctx = DeserializeContext::new(world, scene);
    ctx.load_data(doc)?;
    let id = GameObjectId::new(scene, ctx.read_serde::<u32>("ID")?);
    let components = match doc.get("Components") {
        Some(Document::Array(items)) => items
            .iter()
            .map(|item| {
                let mut ctx = DeserializeContext::new(world, scene);
                ctx.load_data(item)?;
                Ok(PendingComponent {
                    type_name: ctx.read_serde::<String>("Type")?,
                    id: ctx
                        .read_optional::<u32>("ID")?
                        .map(|id| ComponentId::new(scene, id)),
                    doc: item,
                })
            })
            .collect::<Result<Vec<_>, DeserializeError>>()?,
        _ => Vec::new(),
    };
    Ok(PendingObject { id, doc, components })
}
