//! Bounding volumes for scene extent queries.

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box defined by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Corner with the smallest coordinates on all axes
    pub min: Vector3<f32>,

    /// Corner with the largest coordinates on all axes
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Creates a box from two corners, ordering them component-wise.
    pub fn new(a: Vector3<f32>, b: Vector3<f32>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Creates a box from its min corner and size.
    pub fn from_size(min: Vector3<f32>, size: Vector3<f32>) -> Self {
        Self::new(min, min + size)
    }

    /// Degenerate box containing a single point.
    pub fn from_point(point: Vector3<f32>) -> Self {
        Self { min: point, max: point }
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Returns the smallest box enclosing both boxes.
    pub fn join(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains(&self, point: &Vector3<f32>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Bounds of this box after applying an affine transformation.
    ///
    /// All 8 corners are transformed, so rotations grow the box rather
    /// than clipping it.
    pub fn transformed(&self, transformation: &Matrix4<f32>) -> Aabb {
        let mut out: Option<Aabb> = None;
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = transformation.transform_point(&corner).coords;
            out = Some(match out {
                Some(bb) => bb.join(&Aabb::from_point(p)),
                None => Aabb::from_point(p),
            });
        }
        out.unwrap_or(*self)
    }

    /// Component-wise comparison of both corners within `eps`.
    pub fn approx_eq(&self, other: &Aabb, eps: f32) -> bool {
        (self.min - other.min).amax() <= eps && (self.max - other.max).amax() <= eps
    }
}
