use thiserror::Error;

use crate::ids::{ComponentId, GameObjectId, SceneId};
use crate::value::VariableType;

/// Errors returned by [`World`](crate::World) operations.
///
/// Every error is reported before the world is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("{0} is not loaded")]
    SceneNotFound(SceneId),
    #[error("{0} is already loaded")]
    SceneAlreadyLoaded(SceneId),
    #[error("{0} not found")]
    ObjectNotFound(GameObjectId),
    #[error("{0} is already in use")]
    ObjectIdInUse(GameObjectId),
    #[error("{0} not found")]
    ComponentNotFound(ComponentId),
    #[error("{0} is already in use")]
    ComponentIdInUse(ComponentId),
    #[error("component type '{0}' is not registered")]
    UnknownComponentType(String),
    #[error("component type name '{0}' is already registered for a different Rust type")]
    DuplicateComponentType(&'static str),
    #[error("component '{component}' has no variable named '{variable}'")]
    UnknownVariable { component: String, variable: String },
    #[error("variable '{variable}' holds {expected}, got {found}")]
    TypeMismatch {
        variable: String,
        expected: VariableType,
        found: VariableType,
    },
    #[error("variable '{variable}' of '{component}' is registered as {existing}, cannot re-register as {requested}")]
    SchemaDrift {
        component: &'static str,
        variable: String,
        existing: VariableType,
        requested: VariableType,
    },
    #[error("component '{component}' changed its variable list between registrations")]
    SchemaChanged { component: &'static str },
    #[error("enum index {index} is out of range for '{variable}' ({count} values)")]
    EnumOutOfRange {
        variable: String,
        index: i32,
        count: usize,
    },
    #[error("{object} cannot inherit from {prototype}: inheritance cycle")]
    InheritanceCycle {
        object: GameObjectId,
        prototype: GameObjectId,
    },
    #[error("{child} cannot be parented to {parent}: hierarchy cycle")]
    HierarchyCycle {
        child: GameObjectId,
        parent: GameObjectId,
    },
    #[error("{child} and {parent} live in different scenes")]
    CrossSceneParent {
        child: GameObjectId,
        parent: GameObjectId,
    },
    #[error("{0} has no prototype")]
    NotInherited(GameObjectId),
    #[error("prototype {prototype} has no '{component}' component")]
    PrototypeComponentMissing {
        prototype: GameObjectId,
        component: String,
    },
    #[error("the transform of {0} cannot be removed")]
    TransformRemoval(GameObjectId),
    #[error("reference target {0} does not exist")]
    ReferenceTargetNotFound(String),
}
