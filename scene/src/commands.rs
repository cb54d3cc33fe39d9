//! Undoable edits of a [`World`].
//!
//! Each command goes through the same [`World`] methods forward edits use,
//! in both directions, so divorce flags and inherited copies stay
//! consistent after undo and redo.
//!
//! ```ignore
//! let mut history = EditActionHistory::<World>::new(DEFAULT_MAX_UNDO);
//! for frame_value in drag {
//!     history.execute(Box::new(SetVariable::dragging(light, "Intensity", frame_value)), &mut world)?;
//! }
//! history.execute(Box::new(SetVariable::new(light, "Intensity", last)), &mut world)?;
//! history.undo(&mut world)?; // back to the value before the drag
//! ```

use kiln_core::abstract_editor::{EditAction, EditActionError, EditActionResult, Editable};

use crate::edit::SetOptions;
use crate::error::SceneError;
use crate::ids::{ComponentId, GameObjectId};
use crate::value::Value;
use crate::world::World;

impl Editable for World {}

impl From<SceneError> for EditActionError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::ObjectNotFound(id) => Self::TargetNotFound(id.to_string()),
            SceneError::ComponentNotFound(id) => Self::TargetNotFound(id.to_string()),
            SceneError::SceneNotFound(id) => Self::TargetNotFound(id.to_string()),
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Writes one variable.
///
/// The previous value and divorce flag are captured on the first apply.
/// Unfinished (dragging) writes absorb the writes that follow them on the
/// same variable, so a whole drag becomes one step holding the value from
/// before the drag and the final one.
#[derive(Debug)]
pub struct SetVariable {
    component: ComponentId,
    variable: String,
    new: Value,
    old: Option<Value>,
    was_divorced: Option<bool>,
    finished: bool,
    changed_by_interface: bool,
    linked: bool,
}

impl SetVariable {
    /// A committed write made through the editor.
    pub fn new(component: ComponentId, variable: &str, value: Value) -> Self {
        Self {
            component,
            variable: variable.to_owned(),
            new: value,
            old: None,
            was_divorced: None,
            finished: true,
            changed_by_interface: true,
            linked: false,
        }
    }

    /// An intermediate write of a drag.
    pub fn dragging(component: ComponentId, variable: &str, value: Value) -> Self {
        Self {
            finished: false,
            ..Self::new(component, variable, value)
        }
    }

    /// Undo and redo this write together with the step before it.
    pub fn linked(mut self) -> Self {
        self.linked = true;
        self
    }

    /// Marks the write as coming from code rather than an editor widget.
    pub fn from_code(mut self) -> Self {
        self.changed_by_interface = false;
        self
    }

    fn options(&self) -> SetOptions {
        SetOptions {
            changed_by_interface: self.changed_by_interface,
            finished: self.finished,
        }
    }
}

impl EditAction<World> for SetVariable {
    fn apply(&mut self, world: &mut World) -> EditActionResult {
        let was_divorced = world.is_divorced(self.component, &self.variable)?;
        let previous = world.set_value(self.component, &self.variable, self.new.clone(), self.options())?;
        self.old.get_or_insert(previous);
        self.was_divorced.get_or_insert(was_divorced);
        Ok(())
    }

    fn undo(&mut self, world: &mut World) -> EditActionResult {
        let old = self
            .old
            .clone()
            .ok_or_else(|| EditActionError::InvalidState("variable write was never applied".into()))?;
        let options = SetOptions {
            changed_by_interface: self.changed_by_interface,
            finished: true,
        };
        world.set_value(self.component, &self.variable, old, options)?;
        if let Some(divorced) = self.was_divorced {
            world.set_divorced(self.component, &self.variable, divorced)?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        "Change variable"
    }

    fn merge(&mut self, other: Box<dyn EditAction<World>>) -> Option<Box<dyn EditAction<World>>> {
        if !self.finished
            && !other.links_to_previous()
            && let Some(other) = (*other).as_any().downcast_ref::<SetVariable>()
            && other.component == self.component
            && other.variable == self.variable
        {
            self.new = other.new.clone();
            self.finished = other.finished;
            return None;
        }
        Some(other)
    }

    fn links_to_previous(&self) -> bool {
        self.linked
    }
}

/// Marks a variable as overridden.
#[derive(Debug)]
pub struct DivorceVariable {
    component: ComponentId,
    variable: String,
    was_divorced: Option<bool>,
}

impl DivorceVariable {
    pub fn new(component: ComponentId, variable: &str) -> Self {
        Self {
            component,
            variable: variable.to_owned(),
            was_divorced: None,
        }
    }
}

impl EditAction<World> for DivorceVariable {
    fn apply(&mut self, world: &mut World) -> EditActionResult {
        let was_divorced = world.is_divorced(self.component, &self.variable)?;
        world.divorce(self.component, &self.variable)?;
        self.was_divorced.get_or_insert(was_divorced);
        Ok(())
    }

    fn undo(&mut self, world: &mut World) -> EditActionResult {
        let divorced = self.was_divorced.unwrap_or(false);
        world.set_divorced(self.component, &self.variable, divorced)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Divorce variable"
    }
}

/// Re-links a variable to its prototype, taking the prototype's value.
#[derive(Debug)]
pub struct MarryVariable {
    component: ComponentId,
    variable: String,
    old: Option<Value>,
    was_divorced: Option<bool>,
}

impl MarryVariable {
    pub fn new(component: ComponentId, variable: &str) -> Self {
        Self {
            component,
            variable: variable.to_owned(),
            old: None,
            was_divorced: None,
        }
    }
}

impl EditAction<World> for MarryVariable {
    fn apply(&mut self, world: &mut World) -> EditActionResult {
        let was_divorced = world.is_divorced(self.component, &self.variable)?;
        let previous = world.marry(self.component, &self.variable)?;
        self.old.get_or_insert(previous);
        self.was_divorced.get_or_insert(was_divorced);
        Ok(())
    }

    fn undo(&mut self, world: &mut World) -> EditActionResult {
        let old = self
            .old
            .clone()
            .ok_or_else(|| EditActionError::InvalidState("marry was never applied".into()))?;
        world.set_value(self.component, &self.variable, old, SetOptions::interface())?;
        world.set_divorced(
            self.component,
            &self.variable,
            self.was_divorced.unwrap_or(false),
        )?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Reset variable to prototype"
    }
}

/// Changes the prototype of an object.
#[derive(Debug)]
pub struct SetPrototype {
    object: GameObjectId,
    prototype: Option<GameObjectId>,
    previous: Option<Option<GameObjectId>>,
}

impl SetPrototype {
    pub fn new(object: GameObjectId, prototype: Option<GameObjectId>) -> Self {
        Self {
            object,
            prototype,
            previous: None,
        }
    }
}

impl EditAction<World> for SetPrototype {
    fn apply(&mut self, world: &mut World) -> EditActionResult {
        let previous = world.set_inherits_from(self.object, self.prototype)?;
        self.previous.get_or_insert(previous);
        Ok(())
    }

    fn undo(&mut self, world: &mut World) -> EditActionResult {
        let previous = self
            .previous
            .ok_or_else(|| EditActionError::InvalidState("prototype change was never applied".into()))?;
        world.set_inherits_from(self.object, previous)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Change prototype"
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use kiln_core::abstract_editor::EditActionHistory;

    use super::*;

    fn pos(x: f32) -> Value {
        Value::Vector3(Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn undo_restores_value_and_divorce_flag() {
        let mut world = World::new();
        let scene = world.create_scene("Main");
        let base = world.create_object(scene, "Base").unwrap();
        let heir = world.create_object(scene, "Heir").unwrap();
        let mut history = EditActionHistory::<World>::new(16);
        history
            .execute(Box::new(SetPrototype::new(heir, Some(base))), &mut world)
            .unwrap();
        let transform = world.transform_of(heir).unwrap();

        history
            .execute(Box::new(SetVariable::new(transform, "Pos", pos(3.0))), &mut world)
            .unwrap();
        assert!(world.is_divorced(transform, "Pos").unwrap());

        history.undo(&mut world).unwrap();
        assert_eq!(world.get_value(transform, "Pos").unwrap(), pos(0.0));
        assert!(!world.is_divorced(transform, "Pos").unwrap());

        history.undo(&mut world).unwrap();
        assert_eq!(world.inherits_from(heir), None);
        history.redo_many(2, &mut world).unwrap();
        assert_eq!(world.inherits_from(heir), Some(base));
        assert!(world.is_divorced(transform, "Pos").unwrap());
    }

    #[test]
    fn drag_collapses_into_one_step() {
        let mut world = World::new();
        let scene = world.create_scene("Main");
        let object = world.create_object(scene, "Box").unwrap();
        let transform = world.transform_of(object).unwrap();
        let mut history = EditActionHistory::<World>::new(16);

        for x in [1.0, 2.0, 3.0] {
            history
                .execute(Box::new(SetVariable::dragging(transform, "Pos", pos(x))), &mut world)
                .unwrap();
        }
        history
            .execute(Box::new(SetVariable::new(transform, "Pos", pos(4.0))), &mut world)
            .unwrap();
        history
            .execute(Box::new(SetVariable::new(transform, "Pos", pos(5.0))), &mut world)
            .unwrap();

        assert_eq!(history.undo_count(), 2);
        history.undo(&mut world).unwrap();
        assert_eq!(world.get_value(transform, "Pos").unwrap(), pos(4.0));
        history.undo(&mut world).unwrap();
        assert_eq!(world.get_value(transform, "Pos").unwrap(), pos(0.0));
    }

    #[test]
    fn failed_writes_are_not_recorded() {
        let mut world = World::new();
        let scene = world.create_scene("Main");
        let object = world.create_object(scene, "Box").unwrap();
        let transform = world.transform_of(object).unwrap();
        let mut history = EditActionHistory::<World>::new(16);

        let err = history
            .execute(Box::new(SetVariable::new(transform, "Pos", Value::Int(1))), &mut world)
            .unwrap_err();
        assert!(matches!(err, EditActionError::Custom(_)));
        assert!(!history.can_undo());

        let missing = DivorceVariable::new(transform, "Pos");
        assert!(history.execute(Box::new(missing), &mut world).is_err());
    }
}
