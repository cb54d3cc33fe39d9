//! Component types, their registry and live component instances.
//!
//! A [`Component`] is a plain Rust struct that declares its reflected
//! variables once, in [`Component::register_variables`]. Registering it in
//! a [`ComponentRegistry`] produces a shared [`ComponentType`]: the name,
//! the descriptor list and a factory for default instances. Every
//! [`ComponentInstance`] points at that shared type; instances never own
//! descriptors.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::divorce::DivorceTracker;
use crate::error::SceneError;
use crate::ids::{ComponentId, GameObjectId};
use crate::value::Value;
use crate::variable::{VariableDescriptor, VariableList};

/// Trait for reflected components.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Default)]
/// struct Light {
///     intensity: f32,
///     target: Option<GameObjectId>,
/// }
///
/// impl Component for Light {
///     const NAME: &'static str = "Light";
///
///     fn register_variables(vars: &mut VariableList<Self>) -> Result<(), SceneError> {
///         vars.add("Intensity", |l| &l.intensity, |l| &mut l.intensity)?;
///         vars.add("Target", |l| &l.target, |l| &mut l.target)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Component: Clone + Default + Send + Sync + 'static {
    /// Type name; matches components across objects and in documents.
    const NAME: &'static str;

    /// Declares the reflected variables, in canonical order.
    fn register_variables(vars: &mut VariableList<Self>) -> Result<(), SceneError>;
}

/// Type-erased component storage.
pub trait ComponentData: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_data(&self) -> Box<dyn ComponentData>;
}

impl<T: Component> ComponentData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_data(&self) -> Box<dyn ComponentData> {
        Box::new(self.clone())
    }
}

fn create_default<T: Component>() -> Box<dyn ComponentData> {
    Box::new(T::default())
}

/// Shared metadata of a registered component type.
pub struct ComponentType {
    name: &'static str,
    type_id: TypeId,
    variables: Vec<VariableDescriptor>,
    factory: fn() -> Box<dyn ComponentData>,
}

impl ComponentType {
    fn of<T: Component>() -> Result<Self, SceneError> {
        let mut list = VariableList::<T>::new(T::NAME);
        T::register_variables(&mut list)?;
        Ok(Self::from_list(list))
    }

    fn from_list<T: Component>(list: VariableList<T>) -> Self {
        Self {
            name: T::NAME,
            type_id: TypeId::of::<T>(),
            variables: list.into_descriptors(),
            factory: create_default::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Descriptors in registration order.
    pub fn variables(&self) -> &[VariableDescriptor] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDescriptor> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn variable_at(&self, index: usize) -> Option<&VariableDescriptor> {
        self.variables.get(index)
    }

    /// Looks up a variable, reporting the component name on failure.
    pub fn require_variable(&self, name: &str) -> Result<&VariableDescriptor, SceneError> {
        self.variable(name).ok_or_else(|| SceneError::UnknownVariable {
            component: self.name.to_owned(),
            variable: name.to_owned(),
        })
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn instantiate(&self) -> Box<dyn ComponentData> {
        (self.factory)()
    }

    fn same_schema(&self, other: &ComponentType) -> bool {
        self.variables.len() == other.variables.len()
            && self
                .variables
                .iter()
                .zip(&other.variables)
                .all(|(a, b)| a.name() == b.name() && a.var_type() == b.var_type())
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .finish()
    }
}

/// Registry of component types, keyed by name.
#[derive(Default)]
pub struct ComponentRegistry {
    types: HashMap<&'static str, Arc<ComponentType>>,
    order: Vec<&'static str>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`, returning its shared type.
    ///
    /// Registering the same type again is a no-op as long as its variable
    /// list is unchanged. A changed list fails with
    /// [`SceneError::SchemaChanged`]; another Rust type claiming the same
    /// name fails with [`SceneError::DuplicateComponentType`].
    pub fn register<T: Component>(&mut self) -> Result<Arc<ComponentType>, SceneError> {
        let fresh = ComponentType::of::<T>()?;
        if let Some(existing) = self.types.get(T::NAME) {
            if !existing.is::<T>() {
                return Err(SceneError::DuplicateComponentType(T::NAME));
            }
            if !existing.same_schema(&fresh) {
                return Err(SceneError::SchemaChanged { component: T::NAME });
            }
            return Ok(Arc::clone(existing));
        }

        log::debug!(
            "registered component '{}' ({} variables)",
            T::NAME,
            fresh.variables.len()
        );
        let ty = Arc::new(fresh);
        self.types.insert(T::NAME, Arc::clone(&ty));
        self.order.push(T::NAME);
        Ok(ty)
    }

    /// Registers a component type the world cannot run without.
    ///
    /// A registration error keeps the variables declared before it and is
    /// logged instead of returned.
    pub(crate) fn register_builtin<T: Component>(&mut self) -> Arc<ComponentType> {
        if let Some(existing) = self.get_of::<T>() {
            return Arc::clone(existing);
        }
        let mut list = VariableList::<T>::new(T::NAME);
        if let Err(err) = T::register_variables(&mut list) {
            log::error!("built-in component '{}' registered partially: {err}", T::NAME);
        }
        let ty = Arc::new(ComponentType::from_list(list));
        self.types.insert(T::NAME, Arc::clone(&ty));
        self.order.push(T::NAME);
        ty
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ComponentType>> {
        self.types.get(name)
    }

    pub fn get_of<T: Component>(&self) -> Option<&Arc<ComponentType>> {
        self.types.get(T::NAME).filter(|ty| ty.is::<T>())
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ComponentType>> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("types", &self.order)
            .finish()
    }
}

/// A live component attached to a game object.
pub struct ComponentInstance {
    id: ComponentId,
    owner: GameObjectId,
    component_type: Arc<ComponentType>,
    enabled: bool,
    divorced: DivorceTracker,
    data: Box<dyn ComponentData>,
}

impl ComponentInstance {
    pub(crate) fn new(
        id: ComponentId,
        owner: GameObjectId,
        component_type: Arc<ComponentType>,
        data: Box<dyn ComponentData>,
    ) -> Self {
        Self {
            id,
            owner,
            component_type,
            enabled: true,
            divorced: DivorceTracker::new(),
            data,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn owner(&self) -> GameObjectId {
        self.owner
    }

    pub fn component_type(&self) -> &Arc<ComponentType> {
        &self.component_type
    }

    pub fn type_name(&self) -> &'static str {
        self.component_type.name()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn divorce_tracker(&self) -> &DivorceTracker {
        &self.divorced
    }

    pub(crate) fn divorce_tracker_mut(&mut self) -> &mut DivorceTracker {
        &mut self.divorced
    }

    /// Reads a variable by name without reference validation.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.component_type
            .variable(name)
            .and_then(|v| v.read(self.data.as_any()))
    }

    /// Typed access to the component's storage.
    pub fn data<T: Component>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref()
    }

    pub(crate) fn read(&self, descriptor: &VariableDescriptor) -> Option<Value> {
        descriptor.read(self.data.as_any())
    }

    /// Raw storage write; no divorce, propagation or bookkeeping.
    pub(crate) fn write(&mut self, descriptor: &VariableDescriptor, value: Value) -> bool {
        descriptor.write(self.data.as_any_mut(), value)
    }

    pub(crate) fn data_any(&self) -> &dyn Any {
        self.data.as_any()
    }

    pub(crate) fn data_any_mut(&mut self) -> &mut dyn Any {
        self.data.as_any_mut()
    }

    pub(crate) fn clone_data(&self) -> Box<dyn ComponentData> {
        self.data.clone_data()
    }

    /// Swaps in storage of the same type. Mismatched storage is ignored.
    pub(crate) fn replace_data(&mut self, data: Box<dyn ComponentData>) -> bool {
        if Any::type_id(data.as_any()) != Any::type_id(self.data.as_any()) {
            log::error!("refusing to replace '{}' storage with another type", self.type_name());
            return false;
        }
        self.data = data;
        true
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("type", &self.component_type.name())
            .field("enabled", &self.enabled)
            .field("divorced", &self.divorced)
            .finish()
    }
}
