use glam::Vec3;

use crate::component::Component;
use crate::error::SceneError;
use crate::variable::VariableList;

/// Built-in component present on every game object.
///
/// Rotation is stored as Euler angles in degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Component for Transform {
    const NAME: &'static str = "Transform";

    fn register_variables(vars: &mut VariableList<Self>) -> Result<(), SceneError> {
        vars.add("Pos", |t| &t.position, |t| &mut t.position)?
            .label("Position");
        vars.add("Rot", |t| &t.rotation, |t| &mut t.rotation)?
            .label("Rotation");
        vars.add("Scale", |t| &t.scale, |t| &mut t.scale)?;
        Ok(())
    }
}
