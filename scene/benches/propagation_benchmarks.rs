use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use kiln_scene::serialize::export_scene;
use kiln_scene::{ComponentId, GameObjectId, SceneError, SceneId, SetOptions, Value, VariableList, World};

// ---------------------------------------------------------------------------
// Helper component type
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
struct Lamp {
    brightness: f32,
    target: Option<GameObjectId>,
}

impl kiln_scene::Component for Lamp {
    const NAME: &'static str = "Lamp";

    fn register_variables(vars: &mut VariableList<Self>) -> Result<(), SceneError> {
        vars.add("Brightness", |l| &l.brightness, |l| &mut l.brightness)?;
        vars.add("Target", |l| &l.target, |l| &mut l.target)?;
        Ok(())
    }
}

struct Rig {
    world: World,
    scene: SceneId,
    base: GameObjectId,
    base_lamp: ComponentId,
    heirs: Vec<GameObjectId>,
}

fn base_rig() -> Rig {
    let mut world = World::new();
    let scene = world.create_scene("Bench");
    let base = world.create_object(scene, "Base").unwrap();
    let base_lamp = world.add_component::<Lamp>(base).unwrap();
    Rig {
        world,
        scene,
        base,
        base_lamp,
        heirs: Vec::new(),
    }
}

/// `count` objects inheriting directly from the base.
fn fan(count: usize) -> Rig {
    let mut rig = base_rig();
    for i in 0..count {
        let heir = rig.world.instantiate(rig.base, rig.scene, &format!("Heir{i}")).unwrap();
        rig.heirs.push(heir);
    }
    rig
}

/// A single inheritance chain `depth` objects long.
fn chain(depth: usize) -> Rig {
    let mut rig = base_rig();
    let mut prototype = rig.base;
    for i in 0..depth {
        prototype = rig.world.instantiate(prototype, rig.scene, &format!("Link{i}")).unwrap();
        rig.heirs.push(prototype);
    }
    rig
}

fn toggle_brightness(rig: &mut Rig, step: &mut u32) {
    *step += 1;
    let value = Value::Float((*step % 2) as f32);
    black_box(
        rig.world
            .set_value(rig.base_lamp, "Brightness", value, SetOptions::default())
            .unwrap(),
    );
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

fn bench_propagate_fan_1k(c: &mut Criterion) {
    let mut rig = fan(1_000);
    let mut step = 0;
    c.bench_function("propagate_fan_1k", |b| {
        b.iter(|| toggle_brightness(&mut rig, &mut step));
    });
}

fn bench_propagate_chain_100(c: &mut Criterion) {
    let mut rig = chain(100);
    let mut step = 0;
    c.bench_function("propagate_chain_100", |b| {
        b.iter(|| toggle_brightness(&mut rig, &mut step));
    });
}

fn bench_propagate_fan_1k_half_divorced(c: &mut Criterion) {
    let mut rig = fan(1_000);
    for heir in rig.heirs.iter().step_by(2) {
        let lamp = rig.world.components_of_type(*heir, "Lamp")[0];
        rig.world.divorce(lamp, "Brightness").unwrap();
    }
    let mut step = 0;
    c.bench_function("propagate_fan_1k_half_divorced", |b| {
        b.iter(|| toggle_brightness(&mut rig, &mut step));
    });
}

fn bench_get_value(c: &mut Criterion) {
    let rig = base_rig();
    c.bench_function("get_value", |b| {
        b.iter(|| black_box(rig.world.get_value(rig.base_lamp, "Brightness").unwrap()));
    });
}

// ---------------------------------------------------------------------------
// Delete notification
// ---------------------------------------------------------------------------

fn bench_destroy_target_referenced_1k(c: &mut Criterion) {
    c.bench_function("destroy_target_referenced_1k", |b| {
        b.iter_batched(
            || {
                let mut rig = fan(1_000);
                let target = rig.world.create_object(rig.scene, "Target").unwrap();
                rig.world
                    .set_value(
                        rig.base_lamp,
                        "Target",
                        Value::GameObjectRef(Some(target)),
                        SetOptions::default(),
                    )
                    .unwrap();
                (rig, target)
            },
            |(mut rig, target)| {
                rig.world.destroy_object(target).unwrap();
                black_box(rig);
            },
            BatchSize::LargeInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn bench_export_scene_1k(c: &mut Criterion) {
    let rig = fan(1_000);
    c.bench_function("export_scene_1k", |b| {
        b.iter(|| black_box(export_scene(&rig.world, rig.scene).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_propagate_fan_1k,
    bench_propagate_chain_100,
    bench_propagate_fan_1k_half_divorced,
    bench_get_value,
    bench_destroy_target_referenced_1k,
    bench_export_scene_1k,
);
criterion_main!(benches);
