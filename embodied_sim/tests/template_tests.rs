mod common;

use embodied_core::{
    Attributes, ObjectAttributes, SceneId, SimError, SimulatorConfiguration, TemplateId,
    TemplateLibrary,
};
use embodied_sim::{make_cfg, Backend, SimSettings, Simulator, DEMO_ROOM};
use nalgebra::Vector3;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

fn open_room(library: Arc<TemplateLibrary>) -> Simulator {
    let settings = SimSettings {
        scene: DEMO_ROOM.into(),
        enable_physics: true,
        ..Default::default()
    };
    Simulator::open_with(make_cfg(&settings), Backend::demo().unwrap().with_templates(library)).unwrap()
}

#[test]
fn test_register_new_handle_adds_one_template() {
    let library = TemplateLibrary::shared();
    let sim = open_room(library.clone());
    let templates = sim.template_library().unwrap();
    let obj_mgr = &templates.objects;

    let old_size = obj_mgr.get_num_templates();
    let mut template = ObjectAttributes::default();
    template.render_asset_handle = "/assets/transform_box.glb".into();
    let id = obj_mgr.register_template(template, "transform_box_template").unwrap();

    assert_eq!(obj_mgr.get_num_templates(), old_size + 1);
    assert_eq!(obj_mgr.get_template_id_by_handle("transform_box_template"), Some(id));
    assert_eq!(library.objects.get_num_templates(), old_size + 1);
}

#[test]
fn test_overwrite_keeps_id_and_count() {
    let library = TemplateLibrary::new();
    let first = library
        .objects
        .register_template(ObjectAttributes::with_handle("crate"), "crate")
        .unwrap();
    let second = library
        .objects
        .register_template(ObjectAttributes::with_handle("crate"), "crate")
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(library.objects.get_num_templates(), 1);
}

#[test]
fn test_empty_handle_is_rejected_without_mutation() {
    let library = TemplateLibrary::new();
    let result = library.objects.register_template(ObjectAttributes::default(), "");

    assert!(matches!(result, Err(SimError::InvalidTemplate(_))));
    assert_eq!(library.objects.get_num_templates(), 0);
}

#[test]
fn test_edit_copy_then_reregister() {
    let dir = tempfile::tempdir().unwrap();
    common::write_object_config(dir.path(), "sphere");
    let library = TemplateLibrary::shared();
    let obj_mgr = &library.objects;

    let ids = obj_mgr.load_configs(&dir.path().join("sphere")).unwrap();
    assert_eq!(ids.len(), 1);

    let mut sphere = obj_mgr.get_template_by_id(ids[0]).unwrap();
    assert!(sphere.render_asset_handle.ends_with("sphere.glb"));

    // Edits stay local until re-registered
    sphere.scale = Vector3::new(2.0, 2.0, 2.0);
    assert_eq!(obj_mgr.get_template_by_id(ids[0]).unwrap().scale, Vector3::new(1.0, 1.0, 1.0));

    let handle = sphere.handle.clone();
    let id = obj_mgr.register_template(sphere, &handle).unwrap();
    assert_eq!(id, ids[0]);
    assert_eq!(obj_mgr.get_template_by_id(ids[0]).unwrap().scale, Vector3::new(2.0, 2.0, 2.0));
}

#[test]
fn test_load_configs_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    common::write_object_config(dir.path(), "banana");
    common::write_object_config(dir.path(), "apple");
    common::write_object_config(&nested, "cheezit");
    fs::write(dir.path().join("broken.object_config.json"), "{").unwrap();
    fs::write(dir.path().join("notes.txt"), "not a config").unwrap();

    let library = TemplateLibrary::new();
    library
        .objects
        .register_template(ObjectAttributes::with_handle("existing"), "existing")
        .unwrap();
    let before = library.objects.get_num_templates();

    let ids = library.objects.load_configs(dir.path()).unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
    assert!(!ids.contains(&TemplateId(0)));
    assert_eq!(library.objects.get_num_templates(), before + 3);

    // Sorted discovery order
    let names: Vec<String> = ids
        .iter()
        .map(|id| library.objects.get_template_by_id(*id).unwrap().render_asset_handle)
        .collect();
    assert!(names[0].ends_with("apple.glb"));
    assert!(names[1].ends_with("banana.glb"));
    assert!(names[2].ends_with("cheezit.glb"));
}

#[test]
fn test_load_configs_empty_and_missing() {
    let dir = tempfile::tempdir().unwrap();
    let library = TemplateLibrary::new();

    assert!(library.objects.load_configs(dir.path()).unwrap().is_empty());

    let missing = library.objects.load_configs(&dir.path().join("nothing_here"));
    assert!(matches!(missing, Err(SimError::Load { .. })));
    assert_eq!(library.objects.get_num_templates(), 0);
}

#[test]
fn test_add_object_from_loaded_template() {
    let dir = tempfile::tempdir().unwrap();
    common::write_object_config(dir.path(), "sphere");
    let library = TemplateLibrary::shared();
    let mut sim = open_room(library.clone());

    let ids = library.objects.load_configs(&dir.path().join("sphere")).unwrap();
    let first = sim.add_object(ids[0]).unwrap().unwrap();
    let second = sim.add_object(ids[0]).unwrap().unwrap();
    assert_ne!(first, second);

    let template = sim.get_object_initialization_template(first).unwrap().unwrap();
    assert!(template.render_asset_handle.ends_with("sphere.glb"));
    assert_eq!(template.mass, 0.5);

    let stage = sim.get_stage_initialization_template().unwrap().unwrap();
    assert_eq!(stage.render_asset_handle, DEMO_ROOM);

    assert_eq!(sim.get_existing_object_ids().unwrap(), vec![first, second]);
    assert_eq!(sim.add_object(TemplateId(9_999)).unwrap(), None);
    assert_eq!(sim.add_object_by_handle("no_such_object").unwrap(), None);
}

#[test]
fn test_registry_outlives_sessions() {
    let library = TemplateLibrary::shared();
    let id = library
        .objects
        .register_template(ObjectAttributes::with_handle("persistent"), "persistent")
        .unwrap();

    for _ in 0..3 {
        let mut sim = open_room(library.clone());
        assert!(sim.add_object(id).unwrap().is_some());
    }
    assert_eq!(library.objects.get_num_templates(), 1);
    assert_eq!(library.stages.get_template_handles(""), vec![DEMO_ROOM.to_string()]);
}

#[test]
fn test_scene_id_round_trips_through_config() {
    let sim_cfg = SimulatorConfiguration {
        scene_id: SceneId::from(DEMO_ROOM),
        ..Default::default()
    };
    let json = serde_json::to_string(&sim_cfg).unwrap();
    let back: SimulatorConfiguration = serde_json::from_str(&json).unwrap();
    assert_eq!(back.scene_id, sim_cfg.scene_id);
}
