#![cfg(feature = "editor")]

mod common;

use std::sync::Arc;
use std::thread;

use common::{LightRig, light_rig};
use kiln_core::abstract_editor::{ActionQueue, EditActionError, EditActionHistory};
use kiln_scene::{
    ColorByte, ComponentId, DivorceVariable, MarryVariable, SetPrototype, SetVariable, Value, World,
};

fn history() -> EditActionHistory<World> {
    EditActionHistory::new(32)
}

fn intensity(light: ComponentId, value: f32) -> Box<SetVariable> {
    Box::new(SetVariable::new(light, "Intensity", Value::Float(value)))
}

fn heir_rig() -> (LightRig, ComponentId) {
    let mut rig = light_rig();
    let (_, lamp) = rig.heir(rig.base, "Lamp");
    (rig, lamp)
}

#[test]
fn undo_reverts_inherited_copies() {
    let (mut rig, lamp) = heir_rig();
    let mut history = history();

    history.execute(intensity(rig.base_light, 4.0), &mut rig.world).unwrap();
    assert_eq!(rig.intensity(lamp), 4.0);

    history.undo(&mut rig.world).unwrap();
    assert_eq!(rig.intensity(rig.base_light), 1.0);
    assert_eq!(rig.intensity(lamp), 1.0);

    history.redo(&mut rig.world).unwrap();
    assert_eq!(rig.intensity(lamp), 4.0);
    assert!(!rig.world.is_divorced(lamp, "Intensity").unwrap());
}

#[test]
fn undoing_an_override_relinks_the_variable() {
    let (mut rig, lamp) = heir_rig();
    let mut history = history();

    history.execute(intensity(lamp, 9.0), &mut rig.world).unwrap();
    assert!(rig.world.is_divorced(lamp, "Intensity").unwrap());

    history.undo(&mut rig.world).unwrap();
    assert_eq!(rig.intensity(lamp), 1.0);
    assert!(!rig.world.is_divorced(lamp, "Intensity").unwrap());

    rig.set_intensity(rig.base_light, 3.0);
    assert_eq!(rig.intensity(lamp), 3.0);
}

#[test]
fn linked_edits_undo_together() {
    let (mut rig, lamp) = heir_rig();
    let mut history = history();
    let red = Value::ColorByte(ColorByte::new(255, 0, 0, 255));

    history.execute(intensity(rig.base_light, 2.0), &mut rig.world).unwrap();
    history
        .execute(
            Box::new(SetVariable::new(rig.base_light, "Color", red.clone()).linked()),
            &mut rig.world,
        )
        .unwrap();
    assert_eq!(history.undo_count(), 1);
    assert_eq!(rig.world.get_value(lamp, "Color").unwrap(), red);

    history.undo(&mut rig.world).unwrap();
    assert_eq!(rig.intensity(lamp), 1.0);
    assert_eq!(
        rig.world.get_value(lamp, "Color").unwrap(),
        Value::ColorByte(ColorByte::WHITE)
    );
    assert!(!history.can_undo());

    history.redo(&mut rig.world).unwrap();
    assert_eq!(rig.intensity(lamp), 2.0);
    assert_eq!(rig.world.get_value(lamp, "Color").unwrap(), red);
}

#[test]
fn a_drag_is_one_undo_step() {
    let (mut rig, lamp) = heir_rig();
    let mut history = history();

    for value in [1.25, 1.5, 1.75] {
        history
            .execute(
                Box::new(SetVariable::dragging(rig.base_light, "Intensity", Value::Float(value))),
                &mut rig.world,
            )
            .unwrap();
    }
    history.execute(intensity(rig.base_light, 2.0), &mut rig.world).unwrap();
    assert_eq!(history.undo_count(), 1);
    assert_eq!(rig.intensity(lamp), 2.0);

    history.undo(&mut rig.world).unwrap();
    assert_eq!(rig.intensity(rig.base_light), 1.0);
    assert_eq!(rig.intensity(lamp), 1.0);
}

#[test]
fn undo_and_redo_by_count() {
    let mut rig = light_rig();
    let light = rig.base_light;
    let mut history = history();
    for value in [2.0, 3.0, 4.0] {
        history.execute(intensity(light, value), &mut rig.world).unwrap();
    }

    assert_eq!(history.undo_many(2, &mut rig.world).unwrap(), 2);
    assert_eq!(rig.intensity(light), 2.0);
    assert_eq!(history.undo_many(5, &mut rig.world).unwrap(), 1);
    assert_eq!(rig.intensity(light), 1.0);
    assert!(matches!(
        history.undo(&mut rig.world),
        Err(EditActionError::NothingToUndo)
    ));

    assert_eq!(history.redo_many(3, &mut rig.world).unwrap(), 3);
    assert_eq!(rig.intensity(light), 4.0);
    assert!(!history.can_redo());
}

#[test]
fn a_new_edit_discards_the_redo_branch() {
    let mut rig = light_rig();
    let light = rig.base_light;
    let mut history = history();
    history.execute(intensity(light, 2.0), &mut rig.world).unwrap();
    history.undo(&mut rig.world).unwrap();
    assert!(history.can_redo());

    history.execute(intensity(light, 5.0), &mut rig.world).unwrap();
    assert!(!history.can_redo());
    assert_eq!(rig.intensity(light), 5.0);
}

#[test]
fn marry_undo_restores_the_override() {
    let (mut rig, lamp) = heir_rig();
    rig.set_intensity(lamp, 5.0);
    let mut history = history();

    history
        .execute(Box::new(MarryVariable::new(lamp, "Intensity")), &mut rig.world)
        .unwrap();
    assert_eq!(rig.intensity(lamp), 1.0);
    assert!(!rig.world.is_divorced(lamp, "Intensity").unwrap());
    assert_eq!(
        history.undo_descriptions().next(),
        Some("Reset variable to prototype")
    );

    history.undo(&mut rig.world).unwrap();
    assert_eq!(rig.intensity(lamp), 5.0);
    assert!(rig.world.is_divorced(lamp, "Intensity").unwrap());
}

#[test]
fn divorce_undo_clears_the_flag() {
    let (mut rig, lamp) = heir_rig();
    let mut history = history();

    history
        .execute(Box::new(DivorceVariable::new(lamp, "Color")), &mut rig.world)
        .unwrap();
    assert!(rig.world.is_divorced(lamp, "Color").unwrap());
    history.undo(&mut rig.world).unwrap();
    assert!(!rig.world.is_divorced(lamp, "Color").unwrap());
}

#[test]
fn prototype_changes_are_undoable() {
    let (mut rig, _) = heir_rig();
    let mut history = history();
    let bare = rig.world.create_object(rig.scene, "Bare").unwrap();

    history
        .execute(Box::new(SetPrototype::new(bare, Some(rig.base))), &mut rig.world)
        .unwrap();
    assert_eq!(rig.world.inherits_from(bare), Some(rig.base));

    let cycle = SetPrototype::new(rig.base, Some(bare));
    assert!(matches!(
        history.execute(Box::new(cycle), &mut rig.world),
        Err(EditActionError::Custom(_))
    ));
    assert_eq!(history.undo_count(), 1);

    history.undo(&mut rig.world).unwrap();
    assert_eq!(rig.world.inherits_from(bare), None);
}

#[test]
fn queued_edits_apply_on_the_main_thread() {
    let (mut rig, lamp) = heir_rig();
    let mut history = history();
    let queue = Arc::new(ActionQueue::<World>::new());
    let light = rig.base_light;

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            queue.push(Box::new(
                SetVariable::new(light, "Intensity", Value::Float(6.0)).from_code(),
            ));
        })
    };
    producer.join().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(rig.intensity(lamp), 1.0);

    for action in queue.drain() {
        history.execute(action, &mut rig.world).unwrap();
    }
    assert!(queue.is_empty());
    assert_eq!(rig.intensity(lamp), 6.0);
    assert_eq!(history.undo_count(), 1);
}
