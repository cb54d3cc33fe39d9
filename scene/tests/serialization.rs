mod common;

use common::{Light, light_rig};
use glam::Vec3;
use kiln_scene::serialize::{
    self, DeserializeError, Format, export_component, export_scene, import_component, import_scene,
};
use kiln_scene::{
    ColorByte, EnumIndex, FileRef, GameObjectId, SceneId, SetOptions, Value, World, set_parent,
};
use serde_json::json;

fn configure_light(world: &mut World, light: kiln_scene::ComponentId, target: GameObjectId) {
    let writes = [
        ("Intensity", Value::Float(2.5)),
        ("Color", Value::ColorByte(ColorByte::new(12, 34, 56, 78))),
        ("Target", Value::GameObjectRef(Some(target))),
        ("Kind", Value::EnumIndex(EnumIndex(2))),
        ("Cookie", Value::FileRef(Some(FileRef("textures/cookie.png".into())))),
        ("Range", Value::UnsignedInt(40)),
    ];
    for (name, value) in writes {
        world.set_value(light, name, value, SetOptions::default()).unwrap();
    }
}

#[test]
fn component_round_trip_keeps_values_and_divorce_flags() {
    let mut rig = light_rig();
    let target = rig.world.create_object(rig.scene, "Target").unwrap();
    let (_, lamp) = rig.heir(rig.base, "Lamp");
    configure_light(&mut rig.world, lamp, target);
    assert!(rig.world.is_divorced(lamp, "Intensity").unwrap());

    let doc = export_component(&rig.world, lamp).unwrap();
    assert_eq!(doc["Type"], json!("Light"));
    assert_eq!(doc["Variables"]["Target"], json!({ "GOID": target.id }));
    assert!(doc["Variables"].get("Range").is_none());
    let names: Vec<_> = doc["Variables"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(names, ["Intensity", "Color", "Target", "Partner", "Kind", "Cookie"]);

    let (_, fresh) = rig.heir(rig.base, "Fresh");
    let report = import_component(&mut rig.world, &doc, rig.scene, fresh).unwrap();
    assert!(report.is_clean(), "{report:?}");

    for name in ["Intensity", "Color", "Target", "Partner", "Kind", "Cookie"] {
        assert_eq!(
            rig.world.get_value(fresh, name).unwrap(),
            rig.world.get_value(lamp, name).unwrap(),
            "{name}"
        );
        assert_eq!(
            rig.world.is_divorced(fresh, name).unwrap(),
            rig.world.is_divorced(lamp, name).unwrap(),
            "{name}"
        );
    }
    assert_eq!(rig.world.get::<Light>(fresh).unwrap().range, 0);
    assert_eq!(rig.world.object(target).unwrap().delete_observers().len(), 2);
}

#[test]
fn import_ignores_unknown_fields_and_skips_bad_entries() {
    let mut rig = light_rig();
    let light = rig.base_light;
    let doc = json!({
        "Type": "Light",
        "Flicker": true,
        "Variables": {
            "Brightness": 4.0,
            "Intensity": 3.0,
            "Color": "red",
            "Kind": 7,
            "Range": 99
        }
    });

    let report = import_component(&mut rig.world, &doc, rig.scene, light).unwrap();
    assert_eq!(report.applied, ["Intensity"]);
    assert_eq!(report.unknown, ["Brightness", "Range"]);
    assert_eq!(report.rejected, ["Color", "Kind"]);
    assert_eq!(rig.intensity(light), 3.0);
    assert_eq!(rig.world.get::<Light>(light).unwrap().color, ColorByte::WHITE);
    assert_eq!(rig.world.get::<Light>(light).unwrap().range, 0);
}

#[test]
fn import_does_not_propagate_or_divorce() {
    let mut rig = light_rig();
    let (_, lamp) = rig.heir(rig.base, "Lamp");

    let doc = json!({ "Variables": { "Intensity": 6.0 } });
    import_component(&mut rig.world, &doc, rig.scene, lamp).unwrap();
    assert_eq!(rig.intensity(lamp), 6.0);
    assert!(!rig.world.is_divorced(lamp, "Intensity").unwrap());

    import_component(&mut rig.world, &doc, rig.scene, rig.base_light).unwrap();
    let (_, other) = rig.heir(rig.base, "Other");
    assert_eq!(rig.intensity(other), 6.0);
}

#[test]
fn unresolved_references_are_left_null() {
    let mut rig = light_rig();
    let light = rig.base_light;
    let doc = json!({
        "Variables": {
            "Target": { "GOID": 77 },
            "Partner": { "ComponentID": 3, "SceneID": 42 },
            "Intensity": 1.5
        }
    });

    let report = import_component(&mut rig.world, &doc, rig.scene, light).unwrap();
    assert_eq!(report.unresolved, ["Target", "Partner"]);
    assert_eq!(report.applied, ["Target", "Partner", "Intensity"]);
    assert_eq!(rig.world.get::<Light>(light).unwrap().target, None);
    assert_eq!(rig.world.get::<Light>(light).unwrap().partner, None);
    assert_eq!(rig.intensity(light), 1.5);
}

#[test]
fn mismatched_component_type_is_an_error() {
    let mut rig = light_rig();
    let transform = rig.world.transform_of(rig.base).unwrap();
    let doc = export_component(&rig.world, rig.base_light).unwrap();

    let err = import_component(&mut rig.world, &doc, rig.scene, transform).unwrap_err();
    assert!(matches!(err, DeserializeError::TypeMismatch { ref field, .. } if field == "Type"));
}

#[test]
fn cross_scene_references_carry_the_scene_id() {
    let mut rig = light_rig();
    let elsewhere = rig.world.create_scene("Elsewhere");
    let remote = rig.world.create_object(elsewhere, "Remote").unwrap();
    rig.world
        .set_value(
            rig.base_light,
            "Target",
            Value::GameObjectRef(Some(remote)),
            SetOptions::default(),
        )
        .unwrap();

    let doc = export_component(&rig.world, rig.base_light).unwrap();
    assert_eq!(
        doc["Variables"]["Target"],
        json!({ "GOID": remote.id, "SceneID": elsewhere.0 })
    );
}

#[test]
fn scene_round_trip_restores_hierarchy_prototypes_and_references() {
    let mut rig = light_rig();
    let scene = rig.scene;
    let target = rig.world.create_object(scene, "Target").unwrap();
    let (lamp_object, lamp) = rig.heir(rig.base, "Lamp");
    set_parent(&mut rig.world, lamp_object, target).unwrap();
    configure_light(&mut rig.world, lamp, target);
    let transform = rig.world.transform_of(target).unwrap();
    rig.world
        .set_value(transform, "Pos", Value::Vector3(Vec3::new(1.0, 2.0, 3.0)), SetOptions::default())
        .unwrap();
    rig.world
        .set_value(
            rig.base_light,
            "Partner",
            Value::ComponentRef(Some(lamp)),
            SetOptions::default(),
        )
        .unwrap();

    let doc = export_scene(&rig.world, scene).unwrap();
    let bytes = serialize::encode(&doc, Format::Json).unwrap();

    let mut world = World::new();
    world.register_component::<Light>().unwrap();
    let decoded = serialize::decode(&bytes, Format::Json).unwrap();
    let (loaded, report) = import_scene(&mut world, &decoded).unwrap();
    assert_eq!(loaded, scene);
    assert!(report.is_clean(), "{report:?}");

    let object = world.object(lamp_object).unwrap();
    assert_eq!(object.name(), "Lamp");
    assert_eq!(object.parent(), Some(target));
    assert_eq!(object.inherits_from(), Some(rig.base));
    assert_eq!(world.root_objects(scene), [rig.base, target]);

    let light = world.components_of_type(lamp_object, "Light")[0];
    assert_eq!(light, lamp);
    assert_eq!(world.get::<Light>(light).unwrap().target, Some(target));
    assert!(world.is_divorced(light, "Intensity").unwrap());
    assert_eq!(
        world.get_value(world.transform_of(target).unwrap(), "Pos").unwrap(),
        Value::Vector3(Vec3::new(1.0, 2.0, 3.0))
    );
    assert_eq!(world.get::<Light>(rig.base_light).unwrap().partner, Some(lamp));
    assert_eq!(world.object(target).unwrap().delete_observers().len(), 1);

    // Prototype links are live again. The lamp's Partner was inherited, not
    // divorced, so it follows the prototype.
    world
        .set_value(rig.base_light, "Color", Value::ColorByte(ColorByte::BLACK), SetOptions::default())
        .unwrap();
    assert_eq!(
        world.get_value(light, "Color").unwrap(),
        Value::ColorByte(ColorByte::new(12, 34, 56, 78))
    );
    assert_eq!(world.get::<Light>(light).unwrap().partner, Some(lamp));
    world
        .set_value(rig.base_light, "Partner", Value::ComponentRef(None), SetOptions::default())
        .unwrap();
    assert_eq!(world.get::<Light>(light).unwrap().partner, None);
}

#[test]
fn scene_import_is_order_independent() {
    let doc = json!({
        "SceneID": 9,
        "Name": "Handwritten",
        "GameObjects": [
            {
                "ID": 2,
                "Name": "Child",
                "ParentGOID": 1,
                "InheritsFrom": { "GOID": 1 },
                "Components": [
                    { "Type": "Transform", "ID": 20, "Variables": { "Pos": [0.0, 1.0, 0.0] } },
                    { "Type": "Light", "ID": 21, "Variables": { "Target": { "GOID": 1 } } }
                ]
            },
            {
                "ID": 1,
                "Name": "Parent",
                "Components": [
                    { "Type": "Transform", "ID": 10 },
                    { "Type": "Light", "ID": 11, "Variables": { "Partner": { "ComponentID": 21 } } },
                    { "Type": "Sparkles", "ID": 12 }
                ]
            }
        ]
    });

    let mut world = World::new();
    world.register_component::<Light>().unwrap();
    let (scene, report) = import_scene(&mut world, &doc).unwrap();
    assert_eq!(scene, SceneId(9));
    assert_eq!(report.unknown.len(), 1);

    let parent = GameObjectId::new(scene, 1);
    let child = GameObjectId::new(scene, 2);
    assert_eq!(world.root_objects(scene), [parent]);
    assert_eq!(world.object(child).unwrap().parent(), Some(parent));
    assert_eq!(world.inherits_from(child), Some(parent));

    let child_light = kiln_scene::ComponentId::new(scene, 21);
    let parent_light = kiln_scene::ComponentId::new(scene, 11);
    assert_eq!(world.get::<Light>(child_light).unwrap().target, Some(parent));
    assert_eq!(world.get::<Light>(parent_light).unwrap().partner, Some(child_light));
    assert_eq!(world.transform_of(child), Some(kiln_scene::ComponentId::new(scene, 20)));

    let fresh = world.create_object(scene, "Fresh").unwrap();
    assert!(world.transform_of(fresh).unwrap().id > 21);
    assert_eq!(fresh.id, 3);
}

#[test]
fn importing_a_loaded_scene_fails() {
    let mut rig = light_rig();
    let doc = export_scene(&rig.world, rig.scene).unwrap();
    assert!(matches!(
        import_scene(&mut rig.world, &doc),
        Err(DeserializeError::Scene(_))
    ));
}

#[test]
fn failed_scene_import_leaves_nothing_loaded() {
    let doc = json!({
        "SceneID": 4,
        "Name": "Broken",
        "GameObjects": [
            { "ID": 1, "Name": "First" },
            { "ID": 1, "Name": "Twin" }
        ]
    });

    let mut world = World::new();
    world.register_component::<Light>().unwrap();
    assert!(matches!(
        import_scene(&mut world, &doc),
        Err(DeserializeError::Scene(_))
    ));
    assert!(world.scene(SceneId(4)).is_none());
    assert!(!world.contains_object(GameObjectId::new(SceneId(4), 1)));

    let fixed = json!({
        "SceneID": 4,
        "Name": "Fixed",
        "GameObjects": [{ "ID": 1, "Name": "First" }]
    });
    let (scene, report) = import_scene(&mut world, &fixed).unwrap();
    assert_eq!(scene, SceneId(4));
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(world.root_objects(scene), [GameObjectId::new(scene, 1)]);
}

#[cfg(feature = "serialize-ron")]
#[test]
fn ron_round_trip() {
    let rig = light_rig();
    let doc = export_component(&rig.world, rig.base_light).unwrap();
    let bytes = serialize::encode(&doc, Format::Ron).unwrap();
    let decoded = serialize::decode(&bytes, Format::Ron).unwrap();
    assert_eq!(decoded["Variables"]["Intensity"], doc["Variables"]["Intensity"]);
    assert_eq!(decoded["Type"], json!("Light"));
}
