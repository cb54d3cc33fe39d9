//! Type tags and the tagged value union moved through the reflection layer.
//!
//! Every variable a component exposes has a [`VariableType`]. Reads produce
//! and writes consume a [`Value`] whose tag must match exactly; there is no
//! implicit coercion. [`VariableField`] connects concrete Rust field types
//! to their tag.

use std::fmt;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::ids::{ComponentId, GameObjectId};

/// Tolerance used when comparing float-based values.
///
/// Divorce detection and the propagation equality check both go through
/// [`Value::matches`], so a value that round-trips through a text document
/// still counts as inherited.
pub const FLOAT_EPSILON: f32 = 0.00001;

/// The type tag of a reflected variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    Int,
    UnsignedInt,
    Bool,
    Float,
    ColorByte,
    Vector2,
    Vector3,
    GameObjectRef,
    ComponentRef,
    FileRef,
    MaterialRef,
    EnumIndex,
    /// Opaque value resolved through custom accessors.
    IndirectPointer,
}

impl VariableType {
    /// Pointer-like variables: they can be null and need extra bookkeeping
    /// when written.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Self::GameObjectRef | Self::ComponentRef | Self::FileRef | Self::MaterialRef
        )
    }

    /// Variables that point into the scene graph and therefore subscribe to
    /// the target's delete notifications.
    pub fn tracks_deletion(self) -> bool {
        matches!(self, Self::GameObjectRef | Self::ComponentRef)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::UnsignedInt => "UnsignedInt",
            Self::Bool => "Bool",
            Self::Float => "Float",
            Self::ColorByte => "ColorByte",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::GameObjectRef => "GameObjectRef",
            Self::ComponentRef => "ComponentRef",
            Self::FileRef => "FileRef",
            Self::MaterialRef => "MaterialRef",
            Self::EnumIndex => "EnumIndex",
            Self::IndirectPointer => "IndirectPointer",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An 8-bit-per-channel RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorByte {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorByte {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ColorByte {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Index into a variable's enum string table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnumIndex(pub i32);

/// Path of a file resource. Resolving it to a loaded asset is the resource
/// loader's business.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef(pub String);

/// Name of a material resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialRef(pub String);

/// A reflected variable value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    UnsignedInt(u32),
    Bool(bool),
    Float(f32),
    ColorByte(ColorByte),
    Vector2(Vec2),
    Vector3(Vec3),
    GameObjectRef(Option<GameObjectId>),
    ComponentRef(Option<ComponentId>),
    FileRef(Option<FileRef>),
    MaterialRef(Option<MaterialRef>),
    EnumIndex(EnumIndex),
    IndirectPointer(Option<String>),
}

impl Value {
    pub fn variable_type(&self) -> VariableType {
        match self {
            Self::Int(_) => VariableType::Int,
            Self::UnsignedInt(_) => VariableType::UnsignedInt,
            Self::Bool(_) => VariableType::Bool,
            Self::Float(_) => VariableType::Float,
            Self::ColorByte(_) => VariableType::ColorByte,
            Self::Vector2(_) => VariableType::Vector2,
            Self::Vector3(_) => VariableType::Vector3,
            Self::GameObjectRef(_) => VariableType::GameObjectRef,
            Self::ComponentRef(_) => VariableType::ComponentRef,
            Self::FileRef(_) => VariableType::FileRef,
            Self::MaterialRef(_) => VariableType::MaterialRef,
            Self::EnumIndex(_) => VariableType::EnumIndex,
            Self::IndirectPointer(_) => VariableType::IndirectPointer,
        }
    }

    /// The null value of a pointer-like tag, `None` for plain data tags.
    pub fn null_of(ty: VariableType) -> Option<Self> {
        match ty {
            VariableType::GameObjectRef => Some(Self::GameObjectRef(None)),
            VariableType::ComponentRef => Some(Self::ComponentRef(None)),
            VariableType::FileRef => Some(Self::FileRef(None)),
            VariableType::MaterialRef => Some(Self::MaterialRef(None)),
            VariableType::IndirectPointer => Some(Self::IndirectPointer(None)),
            _ => None,
        }
    }

    /// Equality with [`FLOAT_EPSILON`] tolerance on float components.
    ///
    /// Values of different tags never match.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::Vector2(a), Self::Vector2(b)) => float_eq(a.x, b.x) && float_eq(a.y, b.y),
            (Self::Vector3(a), Self::Vector3(b)) => {
                float_eq(a.x, b.x) && float_eq(a.y, b.y) && float_eq(a.z, b.z)
            }
            _ => self == other,
        }
    }
}

fn float_eq(a: f32, b: f32) -> bool {
    a == b || (a.is_nan() && b.is_nan()) || (a - b).abs() <= FLOAT_EPSILON
}

/// A Rust field type that can be exposed as a reflected variable.
pub trait VariableField: Sized + Send + Sync + 'static {
    const TYPE: VariableType;

    fn to_value(&self) -> Value;

    /// Converts back from a value; `None` if the tag does not match.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_variable_field {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl VariableField for $ty {
                const TYPE: VariableType = VariableType::$tag;

                #[allow(clippy::clone_on_copy)]
                fn to_value(&self) -> Value {
                    Value::$tag(self.clone())
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$tag(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_variable_field! {
    i32 => Int,
    u32 => UnsignedInt,
    bool => Bool,
    f32 => Float,
    ColorByte => ColorByte,
    Vec2 => Vector2,
    Vec3 => Vector3,
    EnumIndex => EnumIndex,
    Option<GameObjectId> => GameObjectRef,
    Option<ComponentId> => ComponentRef,
    Option<FileRef> => FileRef,
    Option<MaterialRef> => MaterialRef,
}
