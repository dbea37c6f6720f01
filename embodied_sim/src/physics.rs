//! Object instances and their dynamics.
//!
//! The PhysicsWorld owns every object spawned into a session:
//! - The template copy each object was created from
//! - Translation, rotation and velocity
//! - Gravity integration for dynamic objects (when physics is enabled)

use embodied_core::{ObjectAttributes, TemplateId};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Session-unique object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an object responds to simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionType {
    /// Never moves
    Static,

    /// Moves only when its translation is set explicitly
    Kinematic,

    /// Integrated under gravity
    Dynamic,
}

/// A live object in the session.
#[derive(Debug, Clone)]
pub struct ObjectInstance {
    pub id: ObjectId,

    /// Template the object was created from
    pub template_id: TemplateId,

    /// Copy of the template at creation time
    pub template: ObjectAttributes,

    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,

    /// m/s
    pub velocity: Vector3<f32>,

    pub motion_type: MotionType,
}

/// Object table plus a simple gravity integrator.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    /// Integrate dynamics on `step`
    enabled: bool,

    gravity: Vector3<f32>,

    /// Height objects come to rest at (`None` = nothing to land on)
    floor_height: Option<f32>,

    objects: BTreeMap<ObjectId, ObjectInstance>,

    /// Next object ID, never rewound
    next_id: u32,

    /// Seconds of simulated dynamics
    world_time: f64,
}

impl PhysicsWorld {
    pub fn new(enabled: bool, gravity: Vector3<f32>, floor_height: Option<f32>) -> Self {
        Self {
            enabled,
            gravity,
            floor_height,
            objects: BTreeMap::new(),
            next_id: 0,
            world_time: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Spawns an object at the origin and returns its ID.
    ///
    /// Objects are dynamic when physics is enabled, static otherwise.
    pub fn add_object(&mut self, template_id: TemplateId, template: ObjectAttributes) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let motion_type = if self.enabled {
            MotionType::Dynamic
        } else {
            MotionType::Static
        };

        self.objects.insert(
            id,
            ObjectInstance {
                id,
                template_id,
                template,
                translation: Vector3::zeros(),
                rotation: UnitQuaternion::identity(),
                velocity: Vector3::zeros(),
                motion_type,
            },
        );

        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<ObjectInstance> {
        self.objects.remove(&id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObjectInstance> {
        self.objects.get(&id)
    }

    /// IDs of all live objects in ascending order.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn set_translation(&mut self, id: ObjectId, translation: Vector3<f32>) -> bool {
        match self.objects.get_mut(&id) {
            Some(obj) => {
                obj.translation = translation;
                obj.velocity = Vector3::zeros();
                true
            }
            None => false,
        }
    }

    pub fn set_motion_type(&mut self, id: ObjectId, motion_type: MotionType) -> bool {
        match self.objects.get_mut(&id) {
            Some(obj) => {
                obj.motion_type = motion_type;
                true
            }
            None => false,
        }
    }

    /// Advances dynamics by dt seconds.
    pub fn step(&mut self, dt: f64) {
        if !self.enabled {
            return;
        }
        self.world_time += dt;
        let dt = dt as f32;

        for obj in self.objects.values_mut() {
            if obj.motion_type != MotionType::Dynamic {
                continue;
            }
            obj.velocity += self.gravity * dt;
            obj.translation += obj.velocity * dt;

            if let Some(floor) = self.floor_height {
                if obj.translation.y < floor {
                    obj.translation.y = floor;
                    obj.velocity = Vector3::zeros();
                }
            }
        }
    }

    pub fn time(&self) -> f64 {
        self.world_time
    }

    /// Drops every object. IDs keep counting up.
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ObjectAttributes {
        ObjectAttributes {
            render_asset_handle: "sphere.glb".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_object_ids_are_unique() {
        let mut world = PhysicsWorld::new(false, Vector3::new(0.0, -9.8, 0.0), Some(0.0));
        let a = world.add_object(TemplateId(0), template());
        let b = world.add_object(TemplateId(0), template());
        world.remove_object(a);
        let c = world.add_object(TemplateId(0), template());

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(world.object_ids(), vec![b, c]);
    }

    #[test]
    fn test_disabled_physics_is_static() {
        let mut world = PhysicsWorld::new(false, Vector3::new(0.0, -9.8, 0.0), None);
        let id = world.add_object(TemplateId(0), template());
        world.set_translation(id, Vector3::new(0.0, 5.0, 0.0));

        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }

        assert_eq!(world.object(id).unwrap().translation.y, 5.0);
        assert_eq!(world.time(), 0.0);
    }

    #[test]
    fn test_dynamic_object_falls_to_floor() {
        let mut world = PhysicsWorld::new(true, Vector3::new(0.0, -9.8, 0.0), Some(0.0));
        let id = world.add_object(TemplateId(0), template());
        world.set_translation(id, Vector3::new(0.0, 1.0, 0.0));

        world.step(0.1);
        let y = world.object(id).unwrap().translation.y;
        assert!(y < 1.0 && y > 0.0);

        for _ in 0..100 {
            world.step(0.1);
        }
        let obj = world.object(id).unwrap();
        assert_eq!(obj.translation.y, 0.0);
        assert_eq!(obj.velocity, Vector3::zeros());
    }

    #[test]
    fn test_kinematic_object_ignores_gravity() {
        let mut world = PhysicsWorld::new(true, Vector3::new(0.0, -9.8, 0.0), None);
        let id = world.add_object(TemplateId(0), template());
        world.set_motion_type(id, MotionType::Kinematic);
        world.step(1.0);

        assert_eq!(world.object(id).unwrap().translation, Vector3::zeros());
    }
}
