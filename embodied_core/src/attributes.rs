//! Attribute templates describing how to instantiate stages and objects.
//!
//! Templates are plain values. The registry owns the canonical copy of each
//! one; everything handed out to callers is an independent working copy.

use crate::error::SimError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Stable integer ID assigned by a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behaviour shared by every template kind the registry can hold.
pub trait Attributes: Clone + fmt::Debug + Send + Sync + 'static {
    /// Human-readable template kind (for logs and errors)
    const KIND: &'static str;

    /// File name suffix of on-disk config files for this kind
    const CONFIG_SUFFIX: &'static str;

    /// Creates an unregistered template with default values.
    fn with_handle(handle: &str) -> Self;

    fn handle(&self) -> &str;
    fn set_handle(&mut self, handle: &str);

    /// ID assigned at registration (`None` until registered)
    fn id(&self) -> Option<TemplateId>;
    fn set_id(&mut self, id: TemplateId);

    fn render_asset_handle(&self) -> &str;

    /// Parses a config file body; relative asset paths resolve against
    /// `base_dir`.
    fn from_config_json(handle: &str, base_dir: &Path, json: &str) -> Result<Self, SimError>;
}

fn resolve_asset(base_dir: &Path, asset: &str) -> String {
    if asset.is_empty() {
        return String::new();
    }
    let path = Path::new(asset);
    if path.is_absolute() {
        asset.to_string()
    } else {
        base_dir.join(path).display().to_string()
    }
}

fn invalid_config(kind: &str, handle: &str, err: serde_json::Error) -> SimError {
    SimError::InvalidTemplate(format!("{} config '{}': {}", kind, handle, err))
}

/// Template for a rigid object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttributes {
    pub handle: String,
    pub id: Option<TemplateId>,
    pub render_asset_handle: String,
    pub collision_asset_handle: String,
    pub scale: Vector3<f32>,

    /// Kilograms
    pub mass: f64,
    pub friction_coefficient: f64,
    pub restitution_coefficient: f64,

    /// Collision margin in meters
    pub margin: f64,
    pub is_collidable: bool,
}

impl Default for ObjectAttributes {
    fn default() -> Self {
        Self {
            handle: String::new(),
            id: None,
            render_asset_handle: String::new(),
            collision_asset_handle: String::new(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            mass: 1.0,
            friction_coefficient: 0.5,
            restitution_coefficient: 0.1,
            margin: 0.04,
            is_collidable: true,
        }
    }
}

/// On-disk layout of `*.object_config.json`.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct ObjectConfigFile {
    render_asset: String,
    collision_asset: String,
    scale: [f32; 3],
    mass: f64,
    friction_coefficient: f64,
    restitution_coefficient: f64,
    margin: f64,
    is_collidable: bool,
}

impl Default for ObjectConfigFile {
    fn default() -> Self {
        let d = ObjectAttributes::default();
        Self {
            render_asset: String::new(),
            collision_asset: String::new(),
            scale: [1.0, 1.0, 1.0],
            mass: d.mass,
            friction_coefficient: d.friction_coefficient,
            restitution_coefficient: d.restitution_coefficient,
            margin: d.margin,
            is_collidable: d.is_collidable,
        }
    }
}

impl Attributes for ObjectAttributes {
    const KIND: &'static str = "object";
    const CONFIG_SUFFIX: &'static str = ".object_config.json";

    fn with_handle(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            ..Default::default()
        }
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    fn set_handle(&mut self, handle: &str) {
        self.handle = handle.to_string();
    }

    fn id(&self) -> Option<TemplateId> {
        self.id
    }

    fn set_id(&mut self, id: TemplateId) {
        self.id = Some(id);
    }

    fn render_asset_handle(&self) -> &str {
        &self.render_asset_handle
    }

    fn from_config_json(handle: &str, base_dir: &Path, json: &str) -> Result<Self, SimError> {
        let file: ObjectConfigFile =
            serde_json::from_str(json).map_err(|e| invalid_config(Self::KIND, handle, e))?;
        if file.render_asset.is_empty() {
            return Err(SimError::InvalidTemplate(format!(
                "object config '{}' has no render_asset",
                handle
            )));
        }

        let render_asset_handle = resolve_asset(base_dir, &file.render_asset);
        let collision_asset_handle = if file.collision_asset.is_empty() {
            render_asset_handle.clone()
        } else {
            resolve_asset(base_dir, &file.collision_asset)
        };

        Ok(Self {
            handle: handle.to_string(),
            id: None,
            render_asset_handle,
            collision_asset_handle,
            scale: Vector3::from(file.scale),
            mass: file.mass,
            friction_coefficient: file.friction_coefficient,
            restitution_coefficient: file.restitution_coefficient,
            margin: file.margin,
            is_collidable: file.is_collidable,
        })
    }
}

/// Template for the static stage (scene) geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAttributes {
    pub handle: String,
    pub id: Option<TemplateId>,
    pub render_asset_handle: String,
    pub collision_asset_handle: String,
    pub scale: Vector3<f32>,

    /// Gravity applied to dynamic objects (m/s²)
    pub gravity: Vector3<f32>,
    pub origin: Vector3<f32>,
    pub navmesh_asset_handle: Option<String>,
}

impl Default for StageAttributes {
    fn default() -> Self {
        Self {
            handle: String::new(),
            id: None,
            render_asset_handle: String::new(),
            collision_asset_handle: String::new(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            gravity: Vector3::new(0.0, -9.8, 0.0),
            origin: Vector3::zeros(),
            navmesh_asset_handle: None,
        }
    }
}

impl StageAttributes {
    /// Stage template for a bare geometry asset with no config file.
    pub fn for_asset(asset: &str) -> Self {
        Self {
            handle: asset.to_string(),
            render_asset_handle: asset.to_string(),
            collision_asset_handle: asset.to_string(),
            ..Default::default()
        }
    }
}

/// On-disk layout of `*.stage_config.json`.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct StageConfigFile {
    render_asset: String,
    collision_asset: String,
    scale: [f32; 3],
    gravity: [f32; 3],
    origin: [f32; 3],
    navmesh_asset: Option<String>,
}

impl Default for StageConfigFile {
    fn default() -> Self {
        Self {
            render_asset: String::new(),
            collision_asset: String::new(),
            scale: [1.0, 1.0, 1.0],
            gravity: [0.0, -9.8, 0.0],
            origin: [0.0, 0.0, 0.0],
            navmesh_asset: None,
        }
    }
}

impl Attributes for StageAttributes {
    const KIND: &'static str = "stage";
    const CONFIG_SUFFIX: &'static str = ".stage_config.json";

    fn with_handle(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            ..Default::default()
        }
    }

    fn handle(&self) -> &str {
        &self.handle
    }

    fn set_handle(&mut self, handle: &str) {
        self.handle = handle.to_string();
    }

    fn id(&self) -> Option<TemplateId> {
        self.id
    }

    fn set_id(&mut self, id: TemplateId) {
        self.id = Some(id);
    }

    fn render_asset_handle(&self) -> &str {
        &self.render_asset_handle
    }

    fn from_config_json(handle: &str, base_dir: &Path, json: &str) -> Result<Self, SimError> {
        let file: StageConfigFile =
            serde_json::from_str(json).map_err(|e| invalid_config(Self::KIND, handle, e))?;
        if file.render_asset.is_empty() {
            return Err(SimError::InvalidTemplate(format!(
                "stage config '{}' has no render_asset",
                handle
            )));
        }

        let render_asset_handle = resolve_asset(base_dir, &file.render_asset);
        let collision_asset_handle = if file.collision_asset.is_empty() {
            render_asset_handle.clone()
        } else {
            resolve_asset(base_dir, &file.collision_asset)
        };

        Ok(Self {
            handle: handle.to_string(),
            id: None,
            render_asset_handle,
            collision_asset_handle,
            scale: Vector3::from(file.scale),
            gravity: Vector3::from(file.gravity),
            origin: Vector3::from(file.origin),
            navmesh_asset_handle: file.navmesh_asset.map(|n| resolve_asset(base_dir, &n)),
        })
    }
}
