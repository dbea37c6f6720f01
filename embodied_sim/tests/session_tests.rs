mod common;

use approx::assert_relative_eq;
use embodied_core::{
    AgentConfiguration, Configuration, SceneId, SimError, SimulatorConfiguration, TemplateLibrary,
};
use embodied_env::{Aabb, NavMesh, SceneGraph};
use embodied_sim::{make_cfg, Backend, SimSettings, Simulator, StaticScenes, DEMO_FLOOR, DEMO_ROOM};
use nalgebra::Vector3;
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;

fn bare_config(scene: &str) -> Configuration {
    let agent = AgentConfiguration {
        sensor_specifications: vec![],
        ..Default::default()
    };
    Configuration::new(
        SimulatorConfiguration {
            scene_id: SceneId::from(scene),
            ..Default::default()
        },
        vec![agent],
    )
}

fn filesystem() -> Backend {
    Backend::filesystem().with_templates(TemplateLibrary::shared())
}

#[test]
fn test_no_navmesh_stage_never_collides() {
    let cfg = bare_config(DEMO_FLOOR);
    let actions: Vec<String> = cfg.agents[0].action_space.keys().cloned().collect();
    let mut sim = Simulator::open_with(cfg, Backend::demo().unwrap()).unwrap();
    sim.initialize_agent(0).unwrap();
    assert!(!sim.navmesh_loaded());

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for _ in 0..50 {
        let action = actions.choose(&mut rng).unwrap();
        let obs = sim.step(action).unwrap();
        assert!(!obs.collided);
        assert!(obs.readings.is_empty());
    }
}

#[test]
fn test_empty_navmesh_counts_as_no_navmesh() {
    let scenes = StaticScenes::new().with_scene("bare.glb", SceneGraph::new(), Some(NavMesh::default()));
    let mut sim = Simulator::open_with(bare_config("bare.glb"), Backend::in_memory(scenes)).unwrap();
    let agent = sim.initialize_agent(0).unwrap();
    assert!(!sim.navmesh_loaded());
    assert!(sim.navmesh().is_none());

    for _ in 0..50 {
        assert!(!sim.step("move_forward").unwrap().collided);
    }
    assert_eq!(sim.collision_count(), 0);
    assert_relative_eq!(sim.agent_state(&agent).unwrap().position.z, -12.5, epsilon = 1e-3);
}

#[test]
fn test_gltf_scene_without_navmesh_never_collides() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), false);
    let cfg = bare_config(&scene.display().to_string());

    let mut sim = Simulator::open_with(cfg, filesystem()).unwrap();
    sim.initialize_agent(0).unwrap();
    for _ in 0..60 {
        assert!(!sim.step("move_forward").unwrap().collided);
    }
}

#[test]
fn test_empty_scene_renders_empty_frames() {
    let settings = SimSettings {
        scene: "NONE".into(),
        depth_sensor: true,
        ..Default::default()
    };
    let mut sim = Simulator::open_with(make_cfg(&settings), Backend::demo().unwrap()).unwrap();
    assert!(sim.get_stage_initialization_template().unwrap().is_none());

    for action in ["turn_left", "move_forward"] {
        let obs = sim.step(action).unwrap();
        let depth = obs.get("depth_sensor").unwrap();
        assert_eq!((depth.height, depth.width, depth.channels), (480, 640, 1));
        assert!(depth.data.iter().all(|d| *d == 0.0));
        assert!(obs.get("color_sensor").is_some());
    }
}

#[test]
fn test_reset_restores_initial_state() {
    let settings = SimSettings {
        scene: DEMO_ROOM.into(),
        ..Default::default()
    };
    let cfg = make_cfg(&settings);
    let actions: Vec<String> = cfg.agents[0].action_space.keys().cloned().collect();
    let mut sim = Simulator::open_with(cfg, Backend::demo().unwrap()).unwrap();
    sim.initialize_agent(0).unwrap();
    let initial = sim.agent(0).unwrap().initial_state();

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..10 {
        sim.step(actions.choose(&mut rng).unwrap()).unwrap();
    }

    for _ in 0..3 {
        sim.reset().unwrap();
        let state = sim.agent(0).unwrap().state();
        assert_eq!(state.position, initial.position);
        assert!(state.approx_eq(&initial, 1e-4));
        assert_relative_eq!(
            state.rotation.quaternion().coords,
            initial.rotation.quaternion().coords,
            max_relative = 1e-4
        );
    }
}

#[test]
fn test_construct_destroy_three_times() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), true);
    let cfg = bare_config(&scene.display().to_string());
    let backend = filesystem();

    for _ in 0..3 {
        let sim = Simulator::open_with(cfg.clone(), backend.clone()).unwrap();
        assert!(sim.navmesh_loaded());
    }
    assert_eq!(backend.templates.stages.get_num_templates(), 1);
}

#[test]
fn test_keep_agent_past_session() {
    let cfg = bare_config(DEMO_ROOM);
    let mut agents = Vec::new();
    for _ in 0..3 {
        let sim = Simulator::open_with(cfg.clone(), Backend::demo().unwrap()).unwrap();
        agents.push(sim.get_agent(0).unwrap());
    }

    assert!(agents.iter().all(|a| !a.is_alive()));

    let sim = Simulator::open_with(cfg, Backend::demo().unwrap()).unwrap();
    for agent in &agents {
        assert!(matches!(sim.agent_state(agent), Err(SimError::ClosedSession)));
    }
}

#[test]
fn test_open_missing_scene_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere.glb");
    let result = Simulator::open_with(bare_config(&missing.display().to_string()), filesystem());
    assert!(matches!(result, Err(SimError::Configuration(_))));
}

#[test]
fn test_scene_bounding_box() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), false);
    let settings = SimSettings {
        scene: scene.display().to_string(),
        ..Default::default()
    };
    let mut sim = Simulator::open_with(make_cfg(&settings), filesystem()).unwrap();

    let graph = sim.get_active_scene_graph().unwrap();
    let root = graph.root();
    graph.compute_cumulative_bb(root);
    let scene_bb = graph.cumulative_bb(root).unwrap();

    let ground_truth = Aabb::from_size(Vector3::new(0.0, 0.0, -3.0), Vector3::new(2.0, 0.5, 2.0));
    assert!(scene_bb.approx_eq(&ground_truth, 1e-5));
    assert_relative_eq!(scene_bb.size(), Vector3::new(2.0, 0.5, 2.0), epsilon = 1e-5);
}

#[test]
fn test_stage_template_follows_scene() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), false);
    let scene_id = scene.display().to_string();

    let sim = Simulator::open_with(bare_config(&scene_id), filesystem()).unwrap();
    let stage = sim.get_stage_initialization_template().unwrap().unwrap();
    assert_eq!(stage.render_asset_handle, scene_id);
    assert_eq!(stage.handle, scene_id);
}

#[test]
fn test_sibling_stage_config_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), false);
    fs::write(
        dir.path().join("room.stage_config.json"),
        r#"{"render_asset": "room.gltf", "gravity": [0.0, -1.6, 0.0]}"#,
    )
    .unwrap();

    let scene_id = scene.display().to_string();
    let sim = Simulator::open_with(bare_config(&scene_id), filesystem()).unwrap();
    let stage = sim.get_stage_initialization_template().unwrap().unwrap();
    assert_eq!(stage.gravity, Vector3::new(0.0, -1.6, 0.0));
    assert_eq!(stage.render_asset_handle, scene_id);
}

#[test]
fn test_sibling_stage_config_cannot_redirect_render_asset() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), false);
    fs::write(
        dir.path().join("room.stage_config.json"),
        r#"{"render_asset": "elsewhere.glb", "collision_asset": "hull.glb"}"#,
    )
    .unwrap();

    let scene_id = scene.display().to_string();
    let sim = Simulator::open_with(bare_config(&scene_id), filesystem()).unwrap();
    let stage = sim.get_stage_initialization_template().unwrap().unwrap();
    assert_eq!(stage.render_asset_handle, scene_id);
    assert!(stage.collision_asset_handle.ends_with("hull.glb"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_stage_config_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), false);
    // A directory in place of the config file cannot be read as text
    fs::create_dir(dir.path().join("room.stage_config.json")).unwrap();

    let result = Simulator::open_with(bare_config(&scene.display().to_string()), filesystem());
    assert!(matches!(result, Err(SimError::Configuration(_))));
}

#[test]
fn test_navmesh_scene_keeps_agent_on_surface() {
    let dir = tempfile::tempdir().unwrap();
    let scene = common::write_scene(dir.path(), true);
    let mut sim = Simulator::open_with(bare_config(&scene.display().to_string()), filesystem()).unwrap();
    let agent = sim.initialize_agent(0).unwrap();

    let mut collided = false;
    for _ in 0..40 {
        collided |= sim.step("move_forward").unwrap().collided;
        let state = sim.agent_state(&agent).unwrap();
        assert!(sim.navmesh().unwrap().is_navigable(&state.position));
    }
    // 2 m footprint, 10 m of forward motion
    assert!(collided);
    assert!(sim.collision_count() > 0);
}

proptest! {
    #[test]
    fn prop_no_navmesh_never_collides(
        seed in any::<u64>(),
        picks in proptest::collection::vec(0usize..3, 50..120),
        empty in any::<bool>(),
    ) {
        let mut cfg = bare_config(if empty { "NONE" } else { DEMO_FLOOR });
        cfg.sim.random_seed = seed;
        let actions: Vec<String> = cfg.agents[0].action_space.keys().cloned().collect();
        let mut sim = Simulator::open_with(cfg, Backend::demo().unwrap()).unwrap();
        sim.initialize_agent(0).unwrap();

        for pick in picks {
            let obs = sim.step(&actions[pick]).unwrap();
            prop_assert!(!obs.collided);
        }
        prop_assert_eq!(sim.collision_count(), 0);
    }
}
