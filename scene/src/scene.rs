use std::collections::BTreeMap;

use crate::game_object::GameObject;
use crate::ids::{ComponentId, GameObjectId, SceneId};

/// A loaded scene: the objects it owns and its root list.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    name: String,
    pub(crate) objects: BTreeMap<u32, GameObject>,
    pub(crate) roots: Vec<GameObjectId>,
    next_object_id: u32,
    next_component_id: u32,
}

impl Scene {
    pub(crate) fn new(id: SceneId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            objects: BTreeMap::new(),
            roots: Vec::new(),
            next_object_id: 1,
            next_component_id: 1,
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Objects without a parent, in creation order.
    pub fn roots(&self) -> &[GameObjectId] {
        &self.roots
    }

    pub fn object(&self, id: u32) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn allocate_object_id(&mut self) -> GameObjectId {
        while self.objects.contains_key(&self.next_object_id) {
            self.next_object_id += 1;
        }
        let id = self.next_object_id;
        self.next_object_id += 1;
        GameObjectId::new(self.id, id)
    }

    /// Keeps automatic ids clear of an explicitly chosen one.
    pub(crate) fn reserve_object_id(&mut self, id: u32) {
        self.next_object_id = self.next_object_id.max(id.saturating_add(1));
    }

    pub(crate) fn allocate_component_id(&mut self) -> ComponentId {
        let id = self.next_component_id;
        self.next_component_id += 1;
        ComponentId::new(self.id, id)
    }

    pub(crate) fn reserve_component_id(&mut self, id: u32) {
        self.next_component_id = self.next_component_id.max(id.saturating_add(1));
    }
}
