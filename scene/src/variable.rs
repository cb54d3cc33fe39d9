//! Variable descriptors: per-component-type metadata for reflected fields.
//!
//! A component type declares its variables once, through a
//! [`VariableList`], when it is registered. Each declaration produces a
//! [`VariableDescriptor`] holding the type tag, the persistence and display
//! flags, a typed accessor pair and the optional editor callbacks. The
//! descriptor list is shared by every instance of the type and never
//! changes after registration.
//!
//! ```ignore
//! impl Component for Light {
//!     const NAME: &'static str = "Light";
//!
//!     fn register_variables(vars: &mut VariableList<Self>) -> Result<(), SceneError> {
//!         vars.add("Intensity", |l| &l.intensity, |l| &mut l.intensity)?;
//!         vars.add("Color", |l| &l.color, |l| &mut l.color)?
//!             .on_value_changed(|light, _| light.dirty = true);
//!         vars.add_enum("Kind", |l| &l.kind, |l| &mut l.kind, &["Point", "Spot"])?;
//!         Ok(())
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use crate::error::SceneError;
use crate::ids::{ComponentId, GameObjectId};
use crate::value::{EnumIndex, FileRef, MaterialRef, Value, VariableField, VariableType};

type Getter = Box<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
type Setter = Box<dyn Fn(&mut dyn Any, Value) -> bool + Send + Sync>;
type ValueChangedFn = Box<dyn Fn(&mut dyn Any, &ValueChange<'_>) + Send + Sync>;
type DropFn = Box<dyn Fn(&mut dyn Any, &DropPayload) -> Option<Value> + Send + Sync>;
type ButtonFn = Box<dyn Fn(&mut dyn Any) + Send + Sync>;
type ShouldBeAddedFn = Box<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/// Describes a committed write, passed to `on_value_changed` callbacks.
#[derive(Debug, Clone, Copy)]
pub struct ValueChange<'a> {
    pub old: &'a Value,
    pub new: &'a Value,
    /// The write came from an editor widget or script binding rather than
    /// from propagation or gameplay code.
    pub changed_by_interface: bool,
    /// `false` for intermediate writes of an in-progress drag.
    pub finished: bool,
}

/// Something dragged from the editor onto a variable widget.
#[derive(Debug, Clone, PartialEq)]
pub enum DropPayload {
    GameObject(GameObjectId),
    Component(ComponentId),
    File(FileRef),
    Material(MaterialRef),
}

impl DropPayload {
    /// Default conversion of a payload into a value of the given tag.
    pub fn to_value(&self, ty: VariableType) -> Option<Value> {
        match (self, ty) {
            (Self::GameObject(id), VariableType::GameObjectRef) => {
                Some(Value::GameObjectRef(Some(*id)))
            }
            (Self::Component(id), VariableType::ComponentRef) => {
                Some(Value::ComponentRef(Some(*id)))
            }
            (Self::File(file), VariableType::FileRef) => Some(Value::FileRef(Some(file.clone()))),
            (Self::Material(material), VariableType::MaterialRef) => {
                Some(Value::MaterialRef(Some(material.clone())))
            }
            _ => None,
        }
    }
}

/// Static metadata for one reflected variable of a component type.
pub struct VariableDescriptor {
    name: String,
    var_type: VariableType,
    index: usize,
    persist: bool,
    displayable: bool,
    label: Option<String>,
    enum_strings: Vec<String>,
    getter: Getter,
    setter: Setter,
    on_value_changed: Option<ValueChangedFn>,
    on_drop: Option<DropFn>,
    on_button_pressed: Option<ButtonFn>,
    should_be_added: Option<ShouldBeAddedFn>,
}

impl VariableDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    /// Position in registration order; the canonical order for display and
    /// serialization, and the key of the divorce bitset.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the variable is written to documents.
    pub fn persist(&self) -> bool {
        self.persist
    }

    /// Whether the variable is shown in the editor.
    pub fn displayable(&self) -> bool {
        self.displayable
    }

    /// Editor label; defaults to the name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn enum_strings(&self) -> &[String] {
        &self.enum_strings
    }

    pub fn has_button(&self) -> bool {
        self.on_button_pressed.is_some()
    }

    /// Checks that `value` can be written to this variable.
    pub fn validate(&self, value: &Value) -> Result<(), SceneError> {
        if value.variable_type() != self.var_type {
            return Err(SceneError::TypeMismatch {
                variable: self.name.clone(),
                expected: self.var_type,
                found: value.variable_type(),
            });
        }
        if let Value::EnumIndex(EnumIndex(index)) = value
            && !self.enum_strings.is_empty()
            && (*index < 0 || *index as usize >= self.enum_strings.len())
        {
            return Err(SceneError::EnumOutOfRange {
                variable: self.name.clone(),
                index: *index,
                count: self.enum_strings.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn read(&self, data: &dyn Any) -> Option<Value> {
        (self.getter)(data)
    }

    pub(crate) fn write(&self, data: &mut dyn Any, value: Value) -> bool {
        (self.setter)(data, value)
    }

    pub(crate) fn notify_changed(&self, data: &mut dyn Any, change: &ValueChange<'_>) {
        if let Some(callback) = &self.on_value_changed {
            callback(data, change);
        }
    }

    pub(crate) fn convert_drop(&self, data: &mut dyn Any, payload: &DropPayload) -> Option<Value> {
        match &self.on_drop {
            Some(callback) => callback(data, payload),
            None => payload.to_value(self.var_type),
        }
    }

    pub(crate) fn press(&self, data: &mut dyn Any) -> bool {
        match &self.on_button_pressed {
            Some(callback) => {
                callback(data);
                true
            }
            None => false,
        }
    }

    pub(crate) fn should_display(&self, data: &dyn Any) -> bool {
        self.displayable
            && self
                .should_be_added
                .as_ref()
                .is_none_or(|filter| filter(data))
    }
}

impl fmt::Debug for VariableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableDescriptor")
            .field("name", &self.name)
            .field("var_type", &self.var_type)
            .field("index", &self.index)
            .field("persist", &self.persist)
            .field("displayable", &self.displayable)
            .finish_non_exhaustive()
    }
}

/// Registration surface handed to
/// [`Component::register_variables`](crate::Component::register_variables).
pub struct VariableList<T> {
    component: &'static str,
    variables: Vec<VariableDescriptor>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<T: Any + Send + Sync> VariableList<T> {
    pub(crate) fn new(component: &'static str) -> Self {
        Self {
            component,
            variables: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares a variable backed by a plain field.
    pub fn add<F: VariableField>(
        &mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Result<VariableBuilder<'_, T>, SceneError> {
        let getter: Getter = Box::new(move |data: &dyn Any| {
            data.downcast_ref::<T>().map(|c| get(c).to_value())
        });
        let setter: Setter = Box::new(move |data: &mut dyn Any, value: Value| {
            match (data.downcast_mut::<T>(), F::from_value(value)) {
                (Some(component), Some(field)) => {
                    *get_mut(component) = field;
                    true
                }
                _ => false,
            }
        });
        self.push(name, F::TYPE, getter, setter)
    }

    /// Declares an [`EnumIndex`] variable with its display strings.
    pub fn add_enum(
        &mut self,
        name: &str,
        get: fn(&T) -> &EnumIndex,
        get_mut: fn(&mut T) -> &mut EnumIndex,
        strings: &[&str],
    ) -> Result<VariableBuilder<'_, T>, SceneError> {
        Ok(self.add(name, get, get_mut)?.enum_strings(strings))
    }

    /// Declares a variable with custom accessors, for computed values and
    /// [`VariableType::IndirectPointer`] variables.
    ///
    /// `set` only receives values that already passed the tag check.
    pub fn add_accessor(
        &mut self,
        name: &str,
        var_type: VariableType,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, Value) + Send + Sync + 'static,
    ) -> Result<VariableBuilder<'_, T>, SceneError> {
        let getter: Getter = Box::new(move |data: &dyn Any| data.downcast_ref::<T>().map(&get));
        let setter: Setter = Box::new(move |data: &mut dyn Any, value: Value| {
            match data.downcast_mut::<T>() {
                Some(component) => {
                    set(component, value);
                    true
                }
                None => false,
            }
        });
        self.push(name, var_type, getter, setter)
    }

    fn push(
        &mut self,
        name: &str,
        var_type: VariableType,
        getter: Getter,
        setter: Setter,
    ) -> Result<VariableBuilder<'_, T>, SceneError> {
        if let Some(existing) = self.variables.iter().find(|v| v.name == name) {
            if existing.var_type != var_type {
                return Err(SceneError::SchemaDrift {
                    component: self.component,
                    variable: name.to_owned(),
                    existing: existing.var_type,
                    requested: var_type,
                });
            }
            log::debug!(
                "variable '{}' of '{}' registered twice; keeping the first",
                name,
                self.component
            );
            return Ok(VariableBuilder::inert());
        }

        let index = self.variables.len();
        self.variables.push(VariableDescriptor {
            name: name.to_owned(),
            var_type,
            index,
            persist: true,
            displayable: true,
            label: None,
            enum_strings: Vec::new(),
            getter,
            setter,
            on_value_changed: None,
            on_drop: None,
            on_button_pressed: None,
            should_be_added: None,
        });
        Ok(VariableBuilder {
            descriptor: self.variables.last_mut(),
            _marker: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub(crate) fn into_descriptors(self) -> Vec<VariableDescriptor> {
        self.variables
    }
}

/// Chained options for a freshly declared variable.
///
/// Returned inert (every option ignored) when the name was already
/// registered, so the first registration wins.
pub struct VariableBuilder<'a, T> {
    descriptor: Option<&'a mut VariableDescriptor>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<'a, T: Any + Send + Sync> VariableBuilder<'a, T> {
    fn inert() -> Self {
        Self {
            descriptor: None,
            _marker: PhantomData,
        }
    }

    fn with(mut self, f: impl FnOnce(&mut VariableDescriptor)) -> Self {
        if let Some(descriptor) = self.descriptor.as_deref_mut() {
            f(descriptor);
        }
        self
    }

    pub fn label(self, label: &str) -> Self {
        self.with(|d| d.label = Some(label.to_owned()))
    }

    /// Excludes the variable from documents.
    pub fn transient(self) -> Self {
        self.with(|d| d.persist = false)
    }

    /// Hides the variable from the editor.
    pub fn hidden(self) -> Self {
        self.with(|d| d.displayable = false)
    }

    pub fn enum_strings(self, strings: &[&str]) -> Self {
        self.with(|d| d.enum_strings = strings.iter().map(|s| (*s).to_owned()).collect())
    }

    pub fn on_value_changed(
        self,
        callback: impl Fn(&mut T, &ValueChange<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.with(|d| {
            let wrapped: ValueChangedFn =
                Box::new(move |data: &mut dyn Any, change: &ValueChange<'_>| {
                    if let Some(component) = data.downcast_mut::<T>() {
                        callback(component, change);
                    }
                });
            d.on_value_changed = Some(wrapped);
        })
    }

    /// Converts a drag-and-drop payload into the value to assign; returning
    /// `None` rejects the drop.
    pub fn on_drop(
        self,
        callback: impl Fn(&mut T, &DropPayload) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.with(|d| {
            let wrapped: DropFn = Box::new(move |data: &mut dyn Any, payload: &DropPayload| {
                data.downcast_mut::<T>()
                    .and_then(|component| callback(component, payload))
            });
            d.on_drop = Some(wrapped);
        })
    }

    pub fn on_button_pressed(self, callback: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
        self.with(|d| {
            d.on_button_pressed = Some(Box::new(move |data: &mut dyn Any| {
                if let Some(component) = data.downcast_mut::<T>() {
                    callback(component);
                }
            }))
        })
    }

    /// Editor display filter evaluated per instance.
    pub fn should_be_added(self, filter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.with(|d| {
            d.should_be_added = Some(Box::new(move |data: &dyn Any| {
                data.downcast_ref::<T>().is_some_and(&filter)
            }))
        })
    }
}
