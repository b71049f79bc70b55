#![warn(missing_docs)]

//! Math types for the turtle mesh kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for turtle geometry: points, vectors, the canvas [`Transform`] and the
//! turtle [`Pose`].

mod pose;

pub use pose::{track_to, wrap_angle, Euler3, MoveAxis, Pose, TurnAxis};

use nalgebra::{Matrix4, Rotation3, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A rotation quaternion.
pub type Quat = nalgebra::UnitQuaternion<f64>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Pure rotation.
    pub fn rotation(rotation: &Rotation3<f64>) -> Self {
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    /// Object transform: rotate by `rotation` about the origin, then move to `location`.
    ///
    /// This is how a canvas maps its local vertex coordinates into world space.
    pub fn from_location_rotation(location: &Point3, rotation: &Euler3) -> Self {
        Self::translation(location.x, location.y, location.z)
            .then(&Self::rotation(&rotation.to_rotation()))
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
