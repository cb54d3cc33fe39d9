//! The [`World`]: loaded scenes, their objects and components.
//!
//! `World` is the context object every operation of this crate runs
//! against. It owns the component registry, every loaded [`Scene`] and an
//! index from component id to owning object. Value editing lives in
//! [`edit`](crate::edit), delete notifications in
//! [`observer`](crate::observer), parenting in [`hierarchy`](crate::hierarchy).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::component::{Component, ComponentData, ComponentInstance, ComponentRegistry, ComponentType};
use crate::error::SceneError;
use crate::game_object::GameObject;
use crate::hierarchy;
use crate::ids::{ComponentId, GameObjectId, SceneId};
use crate::observer::Subscriber;
use crate::scene::Scene;
use crate::transform::Transform;

/// Container of all loaded scenes and the component type registry.
pub struct World {
    registry: ComponentRegistry,
    transform_type: Arc<ComponentType>,
    scenes: BTreeMap<SceneId, Scene>,
    component_owners: HashMap<ComponentId, GameObjectId>,
    next_scene_id: u32,
    pub(crate) next_listener_id: u64,
}

impl World {
    pub fn new() -> Self {
        let mut registry = ComponentRegistry::new();
        let transform_type = registry.register_builtin::<Transform>();
        Self {
            registry,
            transform_type,
            scenes: BTreeMap::new(),
            component_owners: HashMap::new(),
            next_scene_id: 1,
            next_listener_id: 0,
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Registers a component type; idempotent.
    pub fn register_component<T: Component>(&mut self) -> Result<Arc<ComponentType>, SceneError> {
        self.registry.register::<T>()
    }

    // -----------------------------------------------------------------------
    // Scenes
    // -----------------------------------------------------------------------

    /// Creates an empty scene with a fresh id.
    pub fn create_scene(&mut self, name: &str) -> SceneId {
        while self.scenes.contains_key(&SceneId(self.next_scene_id)) {
            self.next_scene_id += 1;
        }
        let id = SceneId(self.next_scene_id);
        self.next_scene_id += 1;
        self.scenes.insert(id, Scene::new(id, name));
        log::debug!("created {id} '{name}'");
        id
    }

    /// Creates an empty scene under a known id, as done before importing a
    /// saved scene.
    pub fn load_scene(&mut self, id: SceneId, name: &str) -> Result<(), SceneError> {
        if self.scenes.contains_key(&id) {
            return Err(SceneError::SceneAlreadyLoaded(id));
        }
        self.scenes.insert(id, Scene::new(id, name));
        log::debug!("loaded {id} '{name}'");
        Ok(())
    }

    /// Destroys every object of the scene (with delete notifications) and
    /// removes it.
    pub fn unload_scene(&mut self, id: SceneId) -> Result<(), SceneError> {
        let roots = self
            .scenes
            .get(&id)
            .ok_or(SceneError::SceneNotFound(id))?
            .roots
            .clone();
        for root in roots {
            self.destroy_object(root)?;
        }
        self.scenes.remove(&id);
        log::debug!("unloaded {id}");
        Ok(())
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.get(&id)
    }

    pub fn loaded_scenes(&self) -> impl Iterator<Item = SceneId> + '_ {
        self.scenes.keys().copied()
    }

    /// Root objects of a scene; empty for scenes that are not loaded.
    pub fn root_objects(&self, scene: SceneId) -> &[GameObjectId] {
        self.scenes.get(&scene).map_or(&[], |s| s.roots())
    }

    pub fn find_object(&self, scene: SceneId, id: u32) -> Option<&GameObject> {
        self.scenes.get(&scene)?.object(id)
    }

    pub fn object(&self, id: GameObjectId) -> Option<&GameObject> {
        self.find_object(id.scene, id.id)
    }

    pub(crate) fn object_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.scenes.get_mut(&id.scene)?.objects.get_mut(&id.id)
    }

    pub fn contains_object(&self, id: GameObjectId) -> bool {
        self.object(id).is_some()
    }

    pub(crate) fn scene_mut(&mut self, id: SceneId) -> Option<&mut Scene> {
        self.scenes.get_mut(&id)
    }

    /// Every object of every loaded scene, depth-first through the parenting
    /// hierarchy starting at the scene roots.
    pub fn walk_objects(&self) -> Vec<GameObjectId> {
        let mut out = Vec::new();
        for scene in self.scenes.values() {
            for &root in scene.roots() {
                self.collect_subtree(root, &mut out);
            }
        }
        out
    }

    /// Pre-order list of `id` and its descendants.
    pub(crate) fn collect_subtree(&self, id: GameObjectId, out: &mut Vec<GameObjectId>) {
        let Some(object) = self.object(id) else {
            return;
        };
        out.push(id);
        for &child in object.children() {
            self.collect_subtree(child, out);
        }
    }

    /// Objects whose prototype is `prototype`.
    pub fn heirs_of(&self, prototype: GameObjectId) -> Vec<GameObjectId> {
        self.scenes
            .values()
            .flat_map(|scene| scene.objects.values())
            .filter(|o| o.inherits_from == Some(prototype))
            .map(|o| o.id)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    /// Creates a root object carrying a default [`Transform`].
    pub fn create_object(&mut self, scene: SceneId, name: &str) -> Result<GameObjectId, SceneError> {
        let id = self
            .scenes
            .get_mut(&scene)
            .ok_or(SceneError::SceneNotFound(scene))?
            .allocate_object_id();
        self.insert_object(id, name, None)
    }

    /// Creates a root object under an explicit id.
    pub fn create_object_with_id(
        &mut self,
        id: GameObjectId,
        name: &str,
    ) -> Result<GameObjectId, SceneError> {
        self.create_object_with_transform_id(id, name, None)
    }

    /// Like [`create_object_with_id`](Self::create_object_with_id), with a
    /// known id for the Transform as well.
    pub(crate) fn create_object_with_transform_id(
        &mut self,
        id: GameObjectId,
        name: &str,
        transform_id: Option<ComponentId>,
    ) -> Result<GameObjectId, SceneError> {
        let scene = self
            .scenes
            .get_mut(&id.scene)
            .ok_or(SceneError::SceneNotFound(id.scene))?;
        if scene.objects.contains_key(&id.id) {
            return Err(SceneError::ObjectIdInUse(id));
        }
        if let Some(transform) = transform_id
            && self.component_owners.contains_key(&transform)
        {
            return Err(SceneError::ComponentIdInUse(transform));
        }
        scene.reserve_object_id(id.id);
        self.insert_object(id, name, transform_id)
    }

    fn insert_object(
        &mut self,
        id: GameObjectId,
        name: &str,
        transform_id: Option<ComponentId>,
    ) -> Result<GameObjectId, SceneError> {
        let scene = self
            .scenes
            .get_mut(&id.scene)
            .ok_or(SceneError::SceneNotFound(id.scene))?;
        scene.objects.insert(id.id, GameObject::new(id, name));
        scene.roots.push(id);

        let transform = Arc::clone(&self.transform_type);
        let data = transform.instantiate();
        self.attach_component(id, transform, data, transform_id)?;
        log::trace!("created {id} '{name}'");
        Ok(id)
    }

    pub fn rename_object(&mut self, id: GameObjectId, name: &str) -> Result<String, SceneError> {
        let object = self.object_mut(id).ok_or(SceneError::ObjectNotFound(id))?;
        Ok(std::mem::replace(&mut object.name, name.to_owned()))
    }

    pub fn set_object_enabled(&mut self, id: GameObjectId, enabled: bool) -> Result<(), SceneError> {
        self.object_mut(id)
            .ok_or(SceneError::ObjectNotFound(id))?
            .enabled = enabled;
        Ok(())
    }

    /// Destroys an object and its parenting descendants, children first.
    ///
    /// For each destroyed object, in order: variables referencing it are
    /// nulled, listeners are called with the object, its own outgoing
    /// subscriptions are released, heirs lose their prototype link, and the
    /// object is removed.
    pub fn destroy_object(&mut self, id: GameObjectId) -> Result<(), SceneError> {
        if !self.contains_object(id) {
            return Err(SceneError::ObjectNotFound(id));
        }
        hierarchy::remove_parent(self, id)?;
        if let Some(scene) = self.scene_mut(id.scene) {
            scene.roots.retain(|&r| r != id);
        }

        let mut doomed = Vec::new();
        self.collect_subtree(id, &mut doomed);
        for object in doomed.into_iter().rev() {
            self.destroy_single(object);
        }
        Ok(())
    }

    fn destroy_single(&mut self, id: GameObjectId) {
        let Some(object) = self.object_mut(id) else {
            return;
        };
        let subscriptions = object.on_delete.take();
        log::debug!(
            "destroying {id} '{}' ({} delete subscribers)",
            object.name,
            subscriptions.len()
        );

        let mut listeners = Vec::new();
        for subscription in subscriptions {
            match subscription.subscriber {
                Subscriber::Variable {
                    component,
                    variable,
                } => {
                    self.clear_subscribed_variable(component, variable, id, None);
                }
                Subscriber::Listener(_) => listeners.extend(subscription.callback),
            }
        }
        if let Some(object) = self.object(id) {
            for mut callback in listeners {
                callback(object);
            }
        }

        let components: Vec<ComponentId> = self
            .object(id)
            .map(|o| o.components.iter().map(|c| c.id()).collect())
            .unwrap_or_default();
        for &component in &components {
            self.release_component_references(component);
        }

        for heir in self.heirs_of(id) {
            if let Some(object) = self.object_mut(heir) {
                log::warn!("{heir} lost its prototype: {id} was destroyed");
                object.inherits_from = None;
            }
        }

        for component in components {
            self.component_owners.remove(&component);
        }
        if let Some(scene) = self.scene_mut(id.scene) {
            scene.objects.remove(&id.id);
            scene.roots.retain(|&r| r != id);
        }
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// Adds a default `T`, registering the type on first use.
    pub fn add_component<T: Component>(&mut self, object: GameObjectId) -> Result<ComponentId, SceneError> {
        let ty = self.registry.register::<T>()?;
        let data = ty.instantiate();
        self.attach_component(object, ty, data, None)
    }

    /// Adds a default instance of a registered type, by name.
    pub fn add_component_by_name(
        &mut self,
        object: GameObjectId,
        type_name: &str,
    ) -> Result<ComponentId, SceneError> {
        let ty = self.component_type(type_name)?;
        let data = ty.instantiate();
        self.attach_component(object, ty, data, None)
    }

    /// Adds a default instance of a registered type under an explicit id.
    pub fn add_component_with_id(
        &mut self,
        object: GameObjectId,
        type_name: &str,
        id: ComponentId,
    ) -> Result<ComponentId, SceneError> {
        let ty = self.component_type(type_name)?;
        let data = ty.instantiate();
        self.attach_component(object, ty, data, Some(id))
    }

    fn component_type(&self, type_name: &str) -> Result<Arc<ComponentType>, SceneError> {
        self.registry
            .get(type_name)
            .cloned()
            .ok_or_else(|| SceneError::UnknownComponentType(type_name.to_owned()))
    }

    pub(crate) fn attach_component(
        &mut self,
        object: GameObjectId,
        ty: Arc<ComponentType>,
        data: Box<dyn ComponentData>,
        id: Option<ComponentId>,
    ) -> Result<ComponentId, SceneError> {
        if !self.contains_object(object) {
            return Err(SceneError::ObjectNotFound(object));
        }
        let scene = self
            .scenes
            .get_mut(&object.scene)
            .ok_or(SceneError::SceneNotFound(object.scene))?;
        let id = match id {
            Some(id) => {
                if id.scene != object.scene || self.component_owners.contains_key(&id) {
                    return Err(SceneError::ComponentIdInUse(id));
                }
                scene.reserve_component_id(id.id);
                id
            }
            None => loop {
                let id = scene.allocate_component_id();
                if !self.component_owners.contains_key(&id) {
                    break id;
                }
            },
        };

        log::trace!("attaching '{}' as {id} to {object}", ty.name());
        let instance = ComponentInstance::new(id, object, ty, data);
        if let Some(owner) = self.object_mut(object) {
            owner.components.push(instance);
        }
        self.component_owners.insert(id, object);
        self.subscribe_component_references(id);
        Ok(id)
    }

    /// Removes a component. ComponentRefs pointing at it are nulled.
    ///
    /// The Transform cannot be removed.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<(), SceneError> {
        let owner = self.owner_of(id).ok_or(SceneError::ComponentNotFound(id))?;
        let object = self.object(owner).ok_or(SceneError::ObjectNotFound(owner))?;
        if object.transform().map(|t| t.id()) == Some(id) {
            return Err(SceneError::TransformRemoval(owner));
        }

        let subscribers: Vec<Subscriber> = object.on_delete.subscribers().collect();
        for subscriber in subscribers {
            if let Subscriber::Variable {
                component,
                variable,
            } = subscriber
                && self.clear_subscribed_variable(component, variable, owner, Some(id))
                && let Some(object) = self.object_mut(owner)
            {
                object.on_delete.unregister(subscriber);
            }
        }

        self.release_component_references(id);
        if let Some(object) = self.object_mut(owner) {
            object.components.retain(|c| c.id() != id);
        }
        self.component_owners.remove(&id);
        log::trace!("removed {id} from {owner}");
        Ok(())
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentInstance> {
        let owner = self.component_owners.get(&id)?;
        self.object(*owner)?.component(id)
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> Option<&mut ComponentInstance> {
        let owner = *self.component_owners.get(&id)?;
        self.object_mut(owner)?.component_mut(id)
    }

    /// Typed read access to a component's storage.
    pub fn get<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.component(id)?.data::<T>()
    }

    pub fn owner_of(&self, component: ComponentId) -> Option<GameObjectId> {
        self.component_owners.get(&component).copied()
    }

    /// Components of `object` whose type is `type_name`, in order.
    pub fn components_of_type(&self, object: GameObjectId, type_name: &str) -> Vec<ComponentId> {
        self.object(object)
            .map(|o| o.components_of_type(type_name).map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    pub fn transform_of(&self, object: GameObjectId) -> Option<ComponentId> {
        self.object(object)?.transform().map(|t| t.id())
    }

    pub fn set_component_enabled(&mut self, id: ComponentId, enabled: bool) -> Result<(), SceneError> {
        self.component_mut(id)
            .ok_or(SceneError::ComponentNotFound(id))?
            .set_enabled(enabled);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Instantiation
    // -----------------------------------------------------------------------

    /// Creates an object inheriting from `prototype` in `scene`.
    ///
    /// The new object gets a copy of each prototype component (same types,
    /// same order, same values, nothing divorced). Parenting children of the
    /// prototype are instantiated recursively, each inheriting from its
    /// counterpart.
    pub fn instantiate(
        &mut self,
        prototype: GameObjectId,
        scene: SceneId,
        name: &str,
    ) -> Result<GameObjectId, SceneError> {
        let source = self
            .object(prototype)
            .ok_or(SceneError::ObjectNotFound(prototype))?;
        let copies: Vec<(Arc<ComponentType>, Box<dyn ComponentData>, bool)> = source
            .components
            .iter()
            .map(|c| (Arc::clone(c.component_type()), c.clone_data(), c.is_enabled()))
            .collect();
        let children: Vec<(GameObjectId, String)> = source
            .children
            .iter()
            .filter_map(|&child| self.object(child).map(|o| (child, o.name.clone())))
            .collect();

        let id = self.create_object(scene, name)?;
        for (index, (ty, data, enabled)) in copies.into_iter().enumerate() {
            let component = if index == 0 {
                let transform = self.transform_of(id).ok_or(SceneError::ObjectNotFound(id))?;
                if let Some(instance) = self.component_mut(transform) {
                    instance.replace_data(data);
                }
                transform
            } else {
                self.attach_component(id, ty, data, None)?
            };
            self.set_component_enabled(component, enabled)?;
        }
        if let Some(transform) = self.transform_of(id) {
            self.subscribe_component_references(transform);
        }
        if let Some(object) = self.object_mut(id) {
            object.inherits_from = Some(prototype);
        }

        for (child, child_name) in children {
            let copy = self.instantiate(child, scene, &child_name)?;
            hierarchy::set_parent(self, copy, id)?;
        }
        log::debug!("instantiated {id} '{name}' from {prototype}");
        Ok(id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("registry", &self.registry)
            .field("scenes", &self.scenes.keys().collect::<Vec<_>>())
            .field("components", &self.component_owners.len())
            .finish()
    }
}
