#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// One triangle under a translated node. Cumulative bounds of the scene
/// are (0, 0, -3)..(2, 0.5, -1).
pub const TRIANGLE_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "scene": 0,
    "scenes": [{"nodes": [0]}],
    "nodes": [
        {"name": "room", "translation": [1.0, 0.0, -2.0], "children": [1]},
        {"name": "floor", "mesh": 0}
    ],
    "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
    "buffers": [{"byteLength": 36, "uri": "triangle.bin"}],
    "bufferViews": [{"buffer": 0, "byteLength": 36}],
    "accessors": [{
        "bufferView": 0,
        "componentType": 5126,
        "count": 3,
        "type": "VEC3",
        "min": [-1.0, 0.0, -1.0],
        "max": [1.0, 0.5, 1.0]
    }]
}"#;

/// Walkable footprint matching the triangle scene's floor.
pub const TRIANGLE_NAVMESH: &str =
    r#"{"regions":[{"bounds":{"min":[0.0,0.0,-3.0],"max":[2.0,0.0,-1.0]}}]}"#;

/// Writes `room.gltf` (and optionally `room.navmesh`) into `dir`.
pub fn write_scene(dir: &Path, with_navmesh: bool) -> PathBuf {
    let scene = dir.join("room.gltf");
    fs::write(&scene, TRIANGLE_GLTF).unwrap();
    if with_navmesh {
        fs::write(dir.join("room.navmesh"), TRIANGLE_NAVMESH).unwrap();
    }
    scene
}

/// Writes `<name>.object_config.json` pointing at `<name>.glb`.
pub fn write_object_config(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{}.object_config.json", name));
    fs::write(
        &path,
        format!(r#"{{"render_asset": "{}.glb", "mass": 0.5}}"#, name),
    )
    .unwrap();
    path
}
