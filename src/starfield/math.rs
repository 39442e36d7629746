//! Vector and matrix math for star navigation
//!
//! Double precision throughout: catalog coordinates span roughly 1e5..1e9
//! units and f32 loses pixel accuracy at that range.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Degrees to radians
pub const RAD_PER_DEG: f64 = std::f64::consts::PI / 180.0;

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Vector3 = Vector3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vector3) -> f64 {
        (other - self).magnitude()
    }

    /// Scale to unit length in place, returning the prior length.
    ///
    /// Panics on a zero vector. Callers are expected to have excluded that
    /// case already; a silent zero or NaN here would poison every pose it
    /// touches downstream.
    pub fn normalize(&mut self) -> f64 {
        let len = self.magnitude();
        assert!(len > 0.0, "cannot normalize a zero-length vector");
        self.x /= len;
        self.y /= len;
        self.z /= len;
        len
    }

    /// Unit-length copy. Same zero-vector contract as `normalize`.
    pub fn normalized(self) -> Vector3 {
        let mut v = self;
        v.normalize();
        v
    }

    pub fn scale(self, s: f64) -> Vector3 {
        Vector3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

impl Add for Vector3 {
    type Output = Vector3;
    fn add(self, other: Vector3) -> Vector3 {
        Vector3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vector3 {
    type Output = Vector3;
    fn sub(self, other: Vector3) -> Vector3 {
        Vector3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f64> for Vector3 {
    type Output = Vector3;
    fn mul(self, s: f64) -> Vector3 {
        self.scale(s)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;
    fn neg(self) -> Vector3 {
        Vector3 {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// 3x3 rotation matrix.
///
/// Row-vector convention: `v.transformed_by(m)` is `v * M`, and
/// `a.multiply(&b)` transforms by `a` first, then `b`. Camera orientations
/// store their basis vectors as rows (row1 = right, row2 = up,
/// row3 = forward), matching how the renderer consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub row1: Vector3,
    pub row2: Vector3,
    pub row3: Vector3,
}

impl Matrix3 {
    pub fn identity() -> Self {
        Self {
            row1: Vector3::new(1.0, 0.0, 0.0),
            row2: Vector3::new(0.0, 1.0, 0.0),
            row3: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    pub fn from_rows(row1: Vector3, row2: Vector3, row3: Vector3) -> Self {
        Self { row1, row2, row3 }
    }

    /// Rotation about the X axis by `angle` radians
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            row1: Vector3::new(1.0, 0.0, 0.0),
            row2: Vector3::new(0.0, c, s),
            row3: Vector3::new(0.0, -s, c),
        }
    }

    /// Rotation about the Y axis by `angle` radians
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            row1: Vector3::new(c, 0.0, -s),
            row2: Vector3::new(0.0, 1.0, 0.0),
            row3: Vector3::new(s, 0.0, c),
        }
    }

    /// Rotation about the Z axis by `angle` radians
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            row1: Vector3::new(c, s, 0.0),
            row2: Vector3::new(-s, c, 0.0),
            row3: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    /// Orientation whose forward row points along `forward`.
    ///
    /// Right and up rows are completed against world Y-up; when `forward`
    /// is (anti)parallel to Y the world Z axis seeds the basis instead.
    /// Panics on a zero `forward`.
    pub fn from_forward(forward: Vector3) -> Self {
        let fwd = forward.normalized();
        let up_hint = if fwd.x.abs() < 1.0e-9 && fwd.z.abs() < 1.0e-9 {
            Vector3::new(0.0, 0.0, 1.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };
        let right = up_hint.cross(fwd).normalized();
        let up = fwd.cross(right);
        Self {
            row1: right,
            row2: up,
            row3: fwd,
        }
    }

    pub fn transposed(&self) -> Matrix3 {
        Self {
            row1: Vector3::new(self.row1.x, self.row2.x, self.row3.x),
            row2: Vector3::new(self.row1.y, self.row2.y, self.row3.y),
            row3: Vector3::new(self.row1.z, self.row2.z, self.row3.z),
        }
    }

    /// `v * M` (row-vector convention)
    pub fn transform(&self, v: Vector3) -> Vector3 {
        Vector3 {
            x: v.x * self.row1.x + v.y * self.row2.x + v.z * self.row3.x,
            y: v.x * self.row1.y + v.y * self.row2.y + v.z * self.row3.y,
            z: v.x * self.row1.z + v.y * self.row2.z + v.z * self.row3.z,
        }
    }

    /// `self * other`: transforming by the product applies `self` first.
    pub fn multiply(&self, other: &Matrix3) -> Matrix3 {
        Self {
            row1: other.transform(self.row1),
            row2: other.transform(self.row2),
            row3: other.transform(self.row3),
        }
    }

    /// Rescale each row to unit length.
    ///
    /// Compositions accumulate float error; every pose product runs through
    /// this to keep the basis rows usable as projection axes.
    pub fn normalize_rows(&mut self) {
        self.row1.normalize();
        self.row2.normalize();
        self.row3.normalize();
    }

    /// True when rows are unit length and mutually orthogonal within `eps`
    pub fn is_orthonormal(&self, eps: f64) -> bool {
        (self.row1.magnitude() - 1.0).abs() < eps
            && (self.row2.magnitude() - 1.0).abs() < eps
            && (self.row3.magnitude() - 1.0).abs() < eps
            && self.row1.dot(self.row2).abs() < eps
            && self.row2.dot(self.row3).abs() < eps
            && self.row1.dot(self.row3).abs() < eps
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}
