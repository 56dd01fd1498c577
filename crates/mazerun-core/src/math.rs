//! Minimal vector and rotation types with a fixed `#[repr(C)]` layout.
//!
//! Rotations in this simulator are yaw-only. [`Quat`] still stores the
//! full quaternion so checkpoint blobs keep a conventional layout.

use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Mul, Sub};

/// Three-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec3 {
    /// X component (across the arena).
    pub x: f32,
    /// Y component (along the arena, towards the exit).
    pub y: f32,
    /// Z component (up).
    pub z: f32,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    /// Build a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Length of the xy projection.
    pub fn length_xy(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Unit quaternion stored as `w, x, y, z`.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Quat {
    /// Scalar part.
    pub w: f32,
    /// X component of the vector part.
    pub x: f32,
    /// Y component of the vector part.
    pub y: f32,
    /// Z component of the vector part.
    pub z: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Rotation of `yaw` radians about +z.
    pub fn from_yaw(yaw: f32) -> Self {
        let half = 0.5 * yaw;
        Quat {
            w: half.cos(),
            x: 0.0,
            y: 0.0,
            z: half.sin(),
        }
    }

    /// Yaw angle about +z in `(-pi, pi]`.
    pub fn yaw(self) -> f32 {
        2.0 * self.z.atan2(self.w)
    }
}

/// Wrap an angle into `[-pi, pi)`.
pub fn wrap_angle(theta: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    theta - TAU * ((theta + PI) / TAU).floor()
}

/// Heading vector in the ground plane for a yaw angle. Yaw zero faces +y.
pub fn heading(yaw: f32) -> (f32, f32) {
    (-yaw.sin(), yaw.cos())
}
