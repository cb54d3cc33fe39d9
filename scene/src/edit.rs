//! The edit path: reading and writing variables, divorce and marriage,
//! prototype links and the editor interactions built on top of them.
//!
//! Every write goes through [`World::set_value`]:
//!
//! 1. the value is checked against the descriptor (tag, enum range, and for
//!    scene references the existence of the target);
//! 2. delete subscriptions move from the old target to the new one;
//! 3. storage is written;
//! 4. the variable is divorced if it now differs from the prototype;
//! 5. the change propagates to heirs;
//! 6. the descriptor's `on_value_changed` callback runs.

use std::collections::HashSet;
use std::sync::Arc;

use crate::component::{ComponentInstance, ComponentType};
use crate::error::SceneError;
use crate::ids::{ComponentId, GameObjectId};
use crate::propagation;
use crate::value::Value;
use crate::variable::{DropPayload, ValueChange, VariableDescriptor};
use crate::world::World;

/// Flags forwarded to `on_value_changed` callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetOptions {
    /// The write came from an editor widget or a script binding.
    pub changed_by_interface: bool,
    /// `false` for the intermediate writes of a drag.
    pub finished: bool,
}

impl SetOptions {
    /// A committed edit made through the editor.
    pub fn interface() -> Self {
        Self {
            changed_by_interface: true,
            finished: true,
        }
    }

    /// An in-progress drag in the editor.
    pub fn dragging() -> Self {
        Self {
            changed_by_interface: true,
            finished: false,
        }
    }
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            changed_by_interface: false,
            finished: true,
        }
    }
}

/// Where a write comes from; decides which steps of the edit path run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WriteOrigin {
    /// A caller edit: auto-divorce, propagation and callbacks.
    Direct,
    /// Pushed down from a prototype: propagation and callbacks only.
    Propagated,
    /// Loaded from a document: storage and subscriptions only.
    Import,
}

impl World {
    /// Reads a variable by name.
    pub fn get_value(&self, component: ComponentId, variable: &str) -> Result<Value, SceneError> {
        let instance = self
            .component(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        let descriptor = instance.component_type().require_variable(variable)?;
        let value = read_storage(instance, descriptor)?;

        if self.is_dangling(&value) {
            debug_assert!(
                false,
                "'{variable}' of {component} points at a destroyed target: {value:?}"
            );
            log::error!("'{variable}' of {component} points at a destroyed target; reading null");
            return Ok(Value::null_of(descriptor.var_type()).unwrap_or(value));
        }
        Ok(value)
    }

    /// Writes a variable and returns the previous value.
    ///
    /// Nothing is mutated when the value is rejected.
    pub fn set_value(
        &mut self,
        component: ComponentId,
        variable: &str,
        value: Value,
        options: SetOptions,
    ) -> Result<Value, SceneError> {
        let mut visited = HashSet::new();
        self.write_variable(
            component,
            variable,
            value,
            options,
            WriteOrigin::Direct,
            &mut visited,
        )
    }

    pub(crate) fn write_variable(
        &mut self,
        component: ComponentId,
        variable: &str,
        value: Value,
        options: SetOptions,
        origin: WriteOrigin,
        visited: &mut HashSet<ComponentId>,
    ) -> Result<Value, SceneError> {
        let instance = self
            .component(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        let ty: Arc<ComponentType> = Arc::clone(instance.component_type());
        let descriptor = ty.require_variable(variable)?;
        descriptor.validate(&value)?;
        self.check_reference_target(&value)?;
        let old = read_storage(instance, descriptor)?;
        visited.insert(component);

        if descriptor.var_type().tracks_deletion() {
            self.resubscribe_variable(component, descriptor.index(), &old, &value);
        }
        let instance = self
            .component_mut(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        instance.write(descriptor, value.clone());

        if origin == WriteOrigin::Import {
            return Ok(old);
        }

        if origin == WriteOrigin::Direct
            && let Some(inherited) = self.inherited_value(component, descriptor)
            && !inherited.matches(&value)
            && let Some(instance) = self.component_mut(component)
            && !instance.divorce_tracker().is_divorced(descriptor.index())
        {
            instance
                .divorce_tracker_mut()
                .set_divorced(descriptor.index(), true);
            log::debug!("'{variable}' of {component} divorced from its prototype");
        }

        propagation::propagate(
            self,
            component,
            descriptor,
            &old,
            &value,
            options.finished,
            visited,
        );

        if let Some(instance) = self.component_mut(component) {
            descriptor.notify_changed(
                instance.data_any_mut(),
                &ValueChange {
                    old: &old,
                    new: &value,
                    changed_by_interface: options.changed_by_interface,
                    finished: options.finished,
                },
            );
        }
        Ok(old)
    }

    fn is_dangling(&self, value: &Value) -> bool {
        match value {
            Value::GameObjectRef(Some(target)) => !self.contains_object(*target),
            Value::ComponentRef(Some(target)) => self.component(*target).is_none(),
            _ => false,
        }
    }

    fn check_reference_target(&self, value: &Value) -> Result<(), SceneError> {
        if self.is_dangling(value) {
            let target = match value {
                Value::GameObjectRef(Some(target)) => target.to_string(),
                Value::ComponentRef(Some(target)) => target.to_string(),
                _ => String::new(),
            };
            return Err(SceneError::ReferenceTargetNotFound(target));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Divorce and marriage
    // -----------------------------------------------------------------------

    /// The value the prototype's matching component holds for `variable`.
    ///
    /// `None` if the owner has no prototype or the prototype lacks the
    /// component type. References come back unchanged, so a `ComponentRef`
    /// still names the prototype's component rather than the heir's copy.
    pub fn prototype_value(&self, component: ComponentId, variable: &str) -> Option<Value> {
        let instance = self.component(component)?;
        let descriptor = instance.component_type().variable(variable)?;
        self.inherited_value(component, descriptor)
    }

    fn inherited_value(&self, component: ComponentId, descriptor: &VariableDescriptor) -> Option<Value> {
        let source = self.prototype_component(component).ok()?;
        source.read(descriptor)
    }

    fn prototype_component(&self, component: ComponentId) -> Result<&ComponentInstance, SceneError> {
        let instance = self
            .component(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        let owner = instance.owner();
        let prototype = self
            .object(owner)
            .and_then(|o| o.inherits_from())
            .ok_or(SceneError::NotInherited(owner))?;
        self.object(prototype)
            .and_then(|p| p.first_component_of_type(instance.type_name()))
            .ok_or_else(|| SceneError::PrototypeComponentMissing {
                prototype,
                component: instance.type_name().to_owned(),
            })
    }

    /// Marks a variable as overridden so prototype changes skip it.
    pub fn divorce(&mut self, component: ComponentId, variable: &str) -> Result<(), SceneError> {
        let index = self.variable_index(component, variable)?;
        let owner = self
            .owner_of(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        if self.inherits_from(owner).is_none() {
            return Err(SceneError::NotInherited(owner));
        }
        self.set_divorced_at(component, index, true)
    }

    /// Clears the divorce flag and takes the prototype's current value.
    ///
    /// Returns the value held before marrying.
    pub fn marry(&mut self, component: ComponentId, variable: &str) -> Result<Value, SceneError> {
        let index = self.variable_index(component, variable)?;
        let source = self.prototype_component(component)?;
        let inherited = source
            .value(variable)
            .ok_or_else(|| SceneError::UnknownVariable {
                component: source.type_name().to_owned(),
                variable: variable.to_owned(),
            })?;

        self.set_divorced_at(component, index, false)?;
        self.set_value(component, variable, inherited, SetOptions::default())
    }

    pub fn is_divorced(&self, component: ComponentId, variable: &str) -> Result<bool, SceneError> {
        let index = self.variable_index(component, variable)?;
        let instance = self
            .component(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        Ok(instance.divorce_tracker().is_divorced(index))
    }

    /// Raw flag write, used to restore a flag on undo and on import.
    pub fn set_divorced(
        &mut self,
        component: ComponentId,
        variable: &str,
        divorced: bool,
    ) -> Result<(), SceneError> {
        let index = self.variable_index(component, variable)?;
        self.set_divorced_at(component, index, divorced)
    }

    fn set_divorced_at(&mut self, component: ComponentId, index: usize, divorced: bool) -> Result<(), SceneError> {
        self.component_mut(component)
            .ok_or(SceneError::ComponentNotFound(component))?
            .divorce_tracker_mut()
            .set_divorced(index, divorced);
        Ok(())
    }

    fn variable_index(&self, component: ComponentId, variable: &str) -> Result<usize, SceneError> {
        let instance = self
            .component(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        Ok(instance.component_type().require_variable(variable)?.index())
    }

    // -----------------------------------------------------------------------
    // Prototype links
    // -----------------------------------------------------------------------

    pub fn inherits_from(&self, object: GameObjectId) -> Option<GameObjectId> {
        self.object(object)?.inherits_from()
    }

    /// Sets or clears the prototype of `object`, returning the old one.
    ///
    /// Links that would close a loop fail with
    /// [`SceneError::InheritanceCycle`] and leave the old prototype in
    /// place. Divorce flags are kept.
    pub fn set_inherits_from(
        &mut self,
        object: GameObjectId,
        prototype: Option<GameObjectId>,
    ) -> Result<Option<GameObjectId>, SceneError> {
        if !self.contains_object(object) {
            return Err(SceneError::ObjectNotFound(object));
        }
        if let Some(prototype) = prototype {
            if !self.contains_object(prototype) {
                return Err(SceneError::ObjectNotFound(prototype));
            }
            let mut seen = HashSet::new();
            let mut cursor = Some(prototype);
            while let Some(current) = cursor {
                if current == object || !seen.insert(current) {
                    return Err(SceneError::InheritanceCycle { object, prototype });
                }
                cursor = self.inherits_from(current);
            }
        }

        let entry = self
            .object_mut(object)
            .ok_or(SceneError::ObjectNotFound(object))?;
        let previous = std::mem::replace(&mut entry.inherits_from, prototype);
        match prototype {
            Some(prototype) => log::debug!("{object} now inherits from {prototype}"),
            None => log::debug!("{object} no longer inherits"),
        }
        Ok(previous)
    }

    // -----------------------------------------------------------------------
    // Editor interactions
    // -----------------------------------------------------------------------

    /// Drops an editor payload onto a variable.
    ///
    /// The descriptor's `on_drop` callback (or the default conversion for
    /// reference variables) turns the payload into a value, which is then
    /// written as an interface edit. Returns the previous value, or `None`
    /// if the drop was rejected.
    pub fn drop_onto_variable(
        &mut self,
        component: ComponentId,
        variable: &str,
        payload: &DropPayload,
    ) -> Result<Option<Value>, SceneError> {
        let ty = self
            .component(component)
            .map(|c| Arc::clone(c.component_type()))
            .ok_or(SceneError::ComponentNotFound(component))?;
        let descriptor = ty.require_variable(variable)?;
        let instance = self
            .component_mut(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        let Some(value) = descriptor.convert_drop(instance.data_any_mut(), payload) else {
            log::debug!("drop of {payload:?} onto '{variable}' of {component} rejected");
            return Ok(None);
        };
        self.set_value(component, variable, value, SetOptions::interface())
            .map(Some)
    }

    /// Runs the button callback of a variable; `false` if it has none.
    pub fn press_button(&mut self, component: ComponentId, variable: &str) -> Result<bool, SceneError> {
        let ty = self
            .component(component)
            .map(|c| Arc::clone(c.component_type()))
            .ok_or(SceneError::ComponentNotFound(component))?;
        let descriptor = ty.require_variable(variable)?;
        if !descriptor.has_button() {
            return Ok(false);
        }
        let instance = self
            .component_mut(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        Ok(descriptor.press(instance.data_any_mut()))
    }

    /// Variables the editor shows for this instance, in registration order.
    pub fn displayed_variables(
        &self,
        component: ComponentId,
    ) -> Result<Vec<&VariableDescriptor>, SceneError> {
        let instance = self
            .component(component)
            .ok_or(SceneError::ComponentNotFound(component))?;
        Ok(instance
            .component_type()
            .variables()
            .iter()
            .filter(|d| d.should_display(instance.data_any()))
            .collect())
    }
}

fn read_storage(instance: &ComponentInstance, descriptor: &VariableDescriptor) -> Result<Value, SceneError> {
    instance.read(descriptor).ok_or_else(|| {
        log::error!(
            "storage of {} does not match the '{}' descriptors",
            instance.id(),
            instance.type_name()
        );
        SceneError::UnknownVariable {
            component: instance.type_name().to_owned(),
            variable: descriptor.name().to_owned(),
        }
    })
}
