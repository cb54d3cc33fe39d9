//! Document export and import for components, objects and scenes.
//!
//! This module provides:
//!
//! - [`SerializeContext`] / [`DeserializeContext`]: field accumulation and
//!   field-by-field access, carrying the scene that references are
//!   relative to
//! - [`field`]: the per-[`Value`](crate::Value) document encoding
//! - [`export_component`] / [`export_object`] / [`export_scene`]
//! - [`import_component`] / [`import_scene`], reporting what was applied
//!   in an [`ImportReport`]
//! - [`Format`] / [`encode`] / [`decode`]: byte-level I/O
//!
//! Documents are [`serde_json::Value`] trees. Variables are written by
//! name in registration order and read back by name, so reordered, added
//! or removed variables load without error. References are written as
//! scene-relative ids; the scene id is only spelled out for targets in
//! another scene.

mod context;
mod error;
mod export;
pub mod field;
mod format;
mod import;

pub use context::{DeserializeContext, SerializeContext};
pub use error::{DeserializeError, SerializeError};
pub use export::{export_component, export_object, export_scene};
pub use format::{Format, decode, encode};
pub use import::{ImportReport, import_component, import_scene};

/// A persisted document: nested maps, arrays and scalars.
pub type Document = serde_json::Value;
