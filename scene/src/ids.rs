use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a loaded scene.
///
/// Object and component ids are only unique within one scene, so every
/// persisted reference is stored relative to a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene {}", self.0)
    }
}

/// Scene-relative identifier of a [`GameObject`](crate::GameObject).
///
/// The pair `(scene, id)` is stable across save/load; it is what reference
/// variables store and what documents persist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameObjectId {
    pub scene: SceneId,
    pub id: u32,
}

impl GameObjectId {
    pub const fn new(scene: SceneId, id: u32) -> Self {
        Self { scene, id }
    }
}

impl fmt::Display for GameObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object {}:{}", self.scene.0, self.id)
    }
}

/// Scene-relative identifier of a [`ComponentInstance`](crate::ComponentInstance).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId {
    pub scene: SceneId,
    pub id: u32,
}

impl ComponentId {
    pub const fn new(scene: SceneId, id: u32) -> Self {
        Self { scene, id }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component {}:{}", self.scene.0, self.id)
    }
}

/// Handle identifying an external delete listener (a script binding, an
/// editor panel) in an object's observer list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let scene = SceneId(2);
        assert_eq!(scene.to_string(), "scene 2");
        assert_eq!(GameObjectId::new(scene, 7).to_string(), "object 2:7");
        assert_eq!(ComponentId::new(scene, 9).to_string(), "component 2:9");
    }

    #[test]
    fn ordering_groups_by_scene() {
        let a = GameObjectId::new(SceneId(1), 50);
        let b = GameObjectId::new(SceneId(2), 1);
        assert!(a < b);
    }
}
