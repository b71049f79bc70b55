//! Turtle pose: position plus Euler XYZ orientation.
//!
//! Angles are stored in radians. Public setters that take degrees say so
//! in their name.

use std::f64::consts::{PI, TAU};

use nalgebra::Rotation3;

use crate::{Point3, Quat, Vec3};

/// Wrap an angle in radians into `[-π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Euler XYZ orientation in radians.
///
/// `x` is pitch, `y` is roll and `z` is yaw (heading). The rotation matrix is
/// `Rz(z) * Ry(y) * Rx(x)`, so X is applied first.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Euler3 {
    /// Rotation about X (pitch).
    pub x: f64,
    /// Rotation about Y (roll).
    pub y: f64,
    /// Rotation about Z (yaw).
    pub z: f64,
}

impl Euler3 {
    /// Create from radians.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create from a vector of angles in degrees.
    pub fn from_degrees(degrees: &Vec3) -> Self {
        Self::new(
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        )
    }

    /// Angles in degrees.
    pub fn to_degrees(&self) -> Vec3 {
        Vec3::new(self.x.to_degrees(), self.y.to_degrees(), self.z.to_degrees())
    }

    /// The rotation this orientation describes.
    pub fn to_rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(self.x, self.y, self.z)
    }

    /// Recover Euler XYZ angles from a quaternion.
    pub fn from_quaternion(q: &Quat) -> Self {
        let (x, y, z) = q.euler_angles();
        Self::new(x, y, z)
    }

    fn component_mut(&mut self, axis: TurnAxis) -> &mut f64 {
        match axis {
            TurnAxis::Pitch => &mut self.x,
            TurnAxis::Roll => &mut self.y,
            TurnAxis::Yaw => &mut self.z,
        }
    }
}

/// A direction of travel in the turtle's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveAxis {
    /// Local +Y.
    Forward,
    /// Local -Y.
    Backward,
    /// Local +Z.
    Up,
    /// Local -Z.
    Down,
    /// Local -X.
    Left,
    /// Local +X.
    Right,
}

impl MoveAxis {
    /// Unit vector of this axis in the turtle's local frame.
    pub fn unit(self) -> Vec3 {
        match self {
            MoveAxis::Forward => Vec3::y(),
            MoveAxis::Backward => -Vec3::y(),
            MoveAxis::Up => Vec3::z(),
            MoveAxis::Down => -Vec3::z(),
            MoveAxis::Left => -Vec3::x(),
            MoveAxis::Right => Vec3::x(),
        }
    }
}

/// A rotation axis of the turtle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnAxis {
    /// About Z. Positive turns left (counter-clockwise seen from above).
    Yaw,
    /// About X. Positive looks up.
    Pitch,
    /// About Y. Positive rolls right.
    Roll,
}

/// Rotation that points local +Y along `direction` while keeping local +Z
/// as close to world +Z as possible.
///
/// Returns `None` for zero-length or non-finite directions. A direction
/// parallel to world Z uses world ∓Y as the up hint instead.
pub fn track_to(direction: &Vec3) -> Option<Quat> {
    let len = direction.norm();
    if !len.is_finite() || len < 1e-12 {
        return None;
    }
    let y = direction / len;
    let mut x = y.cross(&Vec3::z());
    if x.norm() < 1e-9 {
        let hint = if y.z > 0.0 { -Vec3::y() } else { Vec3::y() };
        x = y.cross(&hint);
    }
    let x = x.normalize();
    let z = x.cross(&y);
    let rotation = Rotation3::from_basis_unchecked(&[x, y, z]);
    Some(Quat::from_rotation_matrix(&rotation))
}

/// Position and orientation of the turtle in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World position.
    pub position: Point3,
    /// World orientation.
    pub orientation: Euler3,
}

impl Pose {
    /// Create a pose.
    pub fn new(position: Point3, orientation: Euler3) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Express a vector given in the turtle's local frame in world space.
    pub fn local_to_world(&self, v: &Vec3) -> Vec3 {
        self.orientation.to_rotation() * v
    }

    /// Express a turtle-local offset as a world point.
    pub fn local_point(&self, offset: &Vec3) -> Point3 {
        self.position + self.local_to_world(offset)
    }

    /// World displacement for a move of `distance` along `axis`.
    pub fn displacement(&self, axis: MoveAxis, distance: f64) -> Vec3 {
        self.local_to_world(&(axis.unit() * distance))
    }

    /// Move along a local axis and return the world displacement applied.
    pub fn advance(&mut self, axis: MoveAxis, distance: f64) -> Vec3 {
        let delta = self.displacement(axis, distance);
        self.position += delta;
        delta
    }

    /// Add `degrees` to one Euler component, keeping it wrapped.
    pub fn turn(&mut self, axis: TurnAxis, degrees: f64) {
        let c = self.orientation.component_mut(axis);
        *c = wrap_angle(*c + degrees.to_radians());
    }

    /// Overwrite one Euler component.
    pub fn set_angle(&mut self, axis: TurnAxis, degrees: f64) {
        *self.orientation.component_mut(axis) = degrees.to_radians();
    }

    /// Overwrite the full orientation from degrees.
    pub fn set_orientation_degrees(&mut self, degrees: &Vec3) {
        self.orientation = Euler3::from_degrees(degrees);
    }

    /// Orientation in degrees.
    pub fn heading_degrees(&self) -> Vec3 {
        self.orientation.to_degrees()
    }

    /// Orient the turtle so it faces `direction` (world space).
    ///
    /// The quaternion is only an intermediate; the stored orientation stays
    /// Euler XYZ. Returns `false` and leaves the pose untouched when the
    /// direction is degenerate.
    pub fn look_along(&mut self, direction: &Vec3) -> bool {
        match track_to(direction) {
            Some(q) => {
                self.orientation = Euler3::from_quaternion(&q);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn forward_is_local_y() {
        let mut pose = Pose::default();
        let d = pose.advance(MoveAxis::Forward, 10.0);
        assert_relative_eq!(d, Vec3::new(0.0, 10.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(pose.position, Point3::new(0.0, 10.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn left_turn_is_positive_yaw() {
        let mut pose = Pose::default();
        pose.turn(TurnAxis::Yaw, 90.0);
        pose.advance(MoveAxis::Forward, 1.0);
        // Facing -X after turning left from +Y.
        assert_relative_eq!(pose.position, Point3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn look_up_raises_forward() {
        let mut pose = Pose::default();
        pose.turn(TurnAxis::Pitch, 90.0);
        pose.advance(MoveAxis::Forward, 2.0);
        assert_relative_eq!(pose.position, Point3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn left_and_right_are_x() {
        let mut pose = Pose::default();
        pose.advance(MoveAxis::Right, 3.0);
        pose.advance(MoveAxis::Left, 1.0);
        pose.advance(MoveAxis::Up, 2.0);
        pose.advance(MoveAxis::Down, 0.5);
        assert_relative_eq!(pose.position, Point3::new(2.0, 0.0, 1.5), epsilon = 1e-12);
    }

    #[test]
    fn full_turn_wraps_to_zero() {
        let mut pose = Pose::default();
        for _ in 0..4 {
            pose.turn(TurnAxis::Yaw, -90.0);
        }
        assert!(pose.orientation.z.abs() < 1e-9);
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI) - (-PI)).abs() < 1e-12);
        assert!((wrap_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!(wrap_angle(TAU).abs() < 1e-12);
    }

    #[test]
    fn set_angle_overwrites_single_component() {
        let mut pose = Pose::default();
        pose.set_orientation_degrees(&Vec3::new(10.0, 20.0, 30.0));
        pose.set_angle(TurnAxis::Yaw, 45.0);
        assert_relative_eq!(
            pose.heading_degrees(),
            Vec3::new(10.0, 20.0, 45.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn track_to_identity_for_plus_y() {
        let q = track_to(&Vec3::new(0.0, 5.0, 0.0)).unwrap();
        let e = Euler3::from_quaternion(&q);
        assert!(e.x.abs() < 1e-12 && e.y.abs() < 1e-12 && e.z.abs() < 1e-12);
    }

    #[test]
    fn track_to_points_forward_along_direction() {
        for dir in [
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.3, 0.2, 0.9),
            Vec3::new(0.0, 0.0, -4.0),
            Vec3::new(0.0, 0.0, 1.0),
        ] {
            let mut pose = Pose::default();
            assert!(pose.look_along(&dir));
            let forward = pose.local_to_world(&Vec3::y());
            assert_relative_eq!(forward, dir.normalize(), epsilon = 1e-9);
        }
    }

    #[test]
    fn track_to_keeps_up_near_world_z() {
        let q = track_to(&Vec3::new(1.0, 1.0, 0.0)).unwrap();
        let up = q * Vec3::z();
        assert_relative_eq!(up, Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn track_to_rejects_degenerate() {
        assert!(track_to(&Vec3::zeros()).is_none());
        assert!(track_to(&Vec3::new(f64::NAN, 0.0, 1.0)).is_none());
        let mut pose = Pose::default();
        assert!(!pose.look_along(&Vec3::zeros()));
        assert_eq!(pose, Pose::default());
    }
}
