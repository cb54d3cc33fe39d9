//! Shared fixtures for the scene integration tests.

#![allow(dead_code)]

use kiln_scene::{
    ColorByte, Component, ComponentId, EnumIndex, FileRef, GameObjectId, SceneError, SceneId,
    SetOptions, Value, VariableList, World,
};

/// Initialize logging for test output; repeated calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Light component used across the tests.
#[derive(Clone, Debug, Default)]
pub struct Light {
    pub intensity: f32,
    pub color: ColorByte,
    pub target: Option<GameObjectId>,
    pub partner: Option<ComponentId>,
    pub kind: EnumIndex,
    pub cookie: Option<FileRef>,
    /// Not persisted.
    pub range: u32,
    /// Committed `on_value_changed` calls for `Intensity`.
    pub commits: u32,
}

impl Component for Light {
    const NAME: &'static str = "Light";

    fn register_variables(vars: &mut VariableList<Self>) -> Result<(), SceneError> {
        vars.add("Intensity", |l| &l.intensity, |l| &mut l.intensity)?
            .on_value_changed(|light, change| {
                if change.finished {
                    light.commits += 1;
                }
            });
        vars.add("Color", |l| &l.color, |l| &mut l.color)?;
        vars.add("Target", |l| &l.target, |l| &mut l.target)?;
        vars.add("Partner", |l| &l.partner, |l| &mut l.partner)?;
        vars.add_enum("Kind", |l| &l.kind, |l| &mut l.kind, &["Point", "Spot", "Area"])?;
        vars.add("Cookie", |l| &l.cookie, |l| &mut l.cookie)?;
        vars.add("Range", |l| &l.range, |l| &mut l.range)?.transient();
        Ok(())
    }
}

pub struct LightRig {
    pub world: World,
    pub scene: SceneId,
    pub base: GameObjectId,
    pub base_light: ComponentId,
}

/// A world with one `BaseLight` object carrying a `Light` of intensity 1.
pub fn light_rig() -> LightRig {
    init_logging();
    let mut world = World::new();
    let scene = world.create_scene("Lights");
    let base = world.create_object(scene, "BaseLight").unwrap();
    let base_light = world.add_component::<Light>(base).unwrap();
    world
        .set_value(base_light, "Intensity", Value::Float(1.0), SetOptions::default())
        .unwrap();
    LightRig {
        world,
        scene,
        base,
        base_light,
    }
}

impl LightRig {
    /// Adds an object inheriting from `prototype` with its own `Light`
    /// copied from the prototype's current values.
    pub fn heir(&mut self, prototype: GameObjectId, name: &str) -> (GameObjectId, ComponentId) {
        let object = self.world.instantiate(prototype, self.scene, name).unwrap();
        let light = self.world.components_of_type(object, "Light")[0];
        (object, light)
    }

    pub fn intensity(&self, light: ComponentId) -> f32 {
        match self.world.get_value(light, "Intensity").unwrap() {
            Value::Float(v) => v,
            other => panic!("unexpected intensity {other:?}"),
        }
    }

    pub fn set_intensity(&mut self, light: ComponentId, value: f32) {
        self.world
            .set_value(light, "Intensity", Value::Float(value), SetOptions::interface())
            .unwrap();
    }
}
