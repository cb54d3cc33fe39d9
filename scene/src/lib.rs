//! # Kiln Scene
//!
//! Reflected component variables with prototype inheritance.
//!
//! ## Core Types
//!
//! - [`World`]: context object owning loaded scenes, their objects and the
//!   component registry
//! - [`GameObject`]: named node with an ordered component list, a parenting
//!   position and an optional prototype (`inherits_from`)
//! - [`Component`] / [`ComponentType`] / [`ComponentInstance`]: user
//!   structs, their shared metadata and their live instances
//! - [`VariableDescriptor`] / [`VariableList`]: per-type reflection table
//!   built at registration
//! - [`Value`] / [`VariableType`]: the tagged values moved through it
//!
//! ## Inheritance
//!
//! Writing a variable through [`World::set_value`] divorces it from the
//! prototype when the value differs, then pushes the change to every heir
//! that still holds the old value and has not divorced it. [`World::marry`]
//! re-links a variable and takes the prototype's value.
//!
//! ## References
//!
//! `GameObjectRef` and `ComponentRef` variables are weak: they subscribe to
//! the target's [`OnDeleteObservers`] and are nulled when it is destroyed.
//!
//! ## Persistence and editing
//!
//! - [`serialize`]: document export/import with scene-relative references
//! - [`commands`] (feature `editor`): undoable edits for
//!   `kiln_core::abstract_editor::EditActionHistory`
//!
//! See `DESIGN.md` at the workspace root for architecture decisions.

pub mod component;
mod divorce;
mod edit;
mod error;
mod game_object;
pub mod hierarchy;
mod ids;
pub mod observer;
mod propagation;
mod scene;
pub mod serialize;
mod transform;
pub mod value;
pub mod variable;
mod world;

#[cfg(feature = "editor")]
pub mod commands;

pub use component::{Component, ComponentData, ComponentInstance, ComponentRegistry, ComponentType};
pub use divorce::DivorceTracker;
pub use edit::SetOptions;
pub use error::SceneError;
pub use game_object::GameObject;
pub use hierarchy::{remove_parent, set_parent};
pub use ids::{ComponentId, GameObjectId, ListenerId, SceneId};
pub use observer::{DeleteCallback, OnDeleteObservers, Subscriber};
pub use scene::Scene;
pub use transform::Transform;
pub use value::{ColorByte, EnumIndex, FLOAT_EPSILON, FileRef, MaterialRef, Value, VariableField, VariableType};
pub use variable::{DropPayload, ValueChange, VariableBuilder, VariableDescriptor, VariableList};
pub use world::World;

#[cfg(feature = "editor")]
pub use commands::{DivorceVariable, MarryVariable, SetPrototype, SetVariable};
