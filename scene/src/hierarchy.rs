//! Parent-child hierarchy operations.
//!
//! Parenting is independent of prototype inheritance: it decides scene
//! traversal order and which objects [`World::destroy_object`] takes down
//! together. Both functions keep `parent`, `children` and the scene's root
//! list consistent.
//!
//! ```ignore
//! set_parent(&mut world, wheel, car)?;
//! remove_parent(&mut world, wheel)?;
//! ```

use crate::error::SceneError;
use crate::ids::GameObjectId;
use crate::world::World;

/// Sets `child` as a child of `parent`, detaching it from its old parent.
///
/// Fails with [`SceneError::HierarchyCycle`] if `parent` is `child` or one
/// of its descendants, and with [`SceneError::CrossSceneParent`] if the two
/// objects live in different scenes.
pub fn set_parent(
    world: &mut World,
    child: GameObjectId,
    parent: GameObjectId,
) -> Result<(), SceneError> {
    let old_parent = world
        .object(child)
        .ok_or(SceneError::ObjectNotFound(child))?
        .parent();
    if !world.contains_object(parent) {
        return Err(SceneError::ObjectNotFound(parent));
    }
    if child.scene != parent.scene {
        return Err(SceneError::CrossSceneParent { child, parent });
    }
    if old_parent == Some(parent) {
        return Ok(());
    }

    // Walk up from the new parent; meeting the child means a loop.
    let mut cursor = Some(parent);
    while let Some(current) = cursor {
        if current == child {
            return Err(SceneError::HierarchyCycle { child, parent });
        }
        cursor = world.object(current).and_then(|o| o.parent());
    }

    detach(world, child);
    if let Some(object) = world.object_mut(child) {
        object.parent = Some(parent);
    }
    if let Some(object) = world.object_mut(parent)
        && !object.children.contains(&child)
    {
        object.children.push(child);
    }
    log::trace!("{child} parented to {parent}");
    Ok(())
}

/// Makes `child` a scene root again. Does nothing if it has no parent.
pub fn remove_parent(world: &mut World, child: GameObjectId) -> Result<(), SceneError> {
    let has_parent = world
        .object(child)
        .ok_or(SceneError::ObjectNotFound(child))?
        .parent()
        .is_some();
    if !has_parent {
        return Ok(());
    }

    detach(world, child);
    if let Some(scene) = world.scene_mut(child.scene) {
        scene.roots.push(child);
    }
    Ok(())
}

/// Unlinks `child` from its parent's children or from the root list.
fn detach(world: &mut World, child: GameObjectId) {
    let old_parent = world.object_mut(child).and_then(|o| o.parent.take());
    match old_parent {
        Some(old) => {
            if let Some(object) = world.object_mut(old) {
                object.children.retain(|&c| c != child);
            }
        }
        None => {
            if let Some(scene) = world.scene_mut(child.scene) {
                scene.roots.retain(|&r| r != child);
            }
        }
    }
}
