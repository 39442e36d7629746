//! Quaternion-like rotation transform for smooth orientation blending
//!
//! Orientations are converted to a 4-component (scalar + vector) form for
//! interpolation and back to a row matrix for projection. The blend is a
//! spherical interpolation with an explicit fallback for near-antipodal
//! pairs, where the ordinary formula divides by a vanishing sine.

use super::math::{Matrix3, Vector3};

/// Below this the pair counts as antipodal and blending pivots through an
/// orthogonal transform instead of the sine ratio.
const ANTIPODAL_TOLERANCE: f64 = 1.0e-5;

/// Above this cosine the arc is too short for the sine ratio; plain linear
/// weights are accurate there.
const LERP_THRESHOLD: f64 = 1.0 - 1.0e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotTransform {
    pub scalar: f64,
    pub vector: Vector3,
}

impl RotTransform {
    pub fn identity() -> Self {
        Self {
            scalar: 1.0,
            vector: Vector3::ZERO,
        }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.scalar * other.scalar + self.vector.dot(other.vector)
    }

    /// Build from an orientation matrix (rows = basis vectors).
    ///
    /// Standard trace conversion with the largest-diagonal branches for
    /// numerical stability when the trace is small.
    pub fn from_matrix(m: &Matrix3) -> Self {
        let trace = m.row1.x + m.row2.y + m.row3.z;
        if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self {
                scalar: s * 0.25,
                vector: Vector3::new(
                    (m.row2.z - m.row3.y) / s,
                    (m.row3.x - m.row1.z) / s,
                    (m.row1.y - m.row2.x) / s,
                ),
            }
        } else if m.row1.x > m.row2.y && m.row1.x > m.row3.z {
            let s = (1.0 + m.row1.x - m.row2.y - m.row3.z).sqrt() * 2.0;
            Self {
                scalar: (m.row2.z - m.row3.y) / s,
                vector: Vector3::new(
                    s * 0.25,
                    (m.row2.x + m.row1.y) / s,
                    (m.row3.x + m.row1.z) / s,
                ),
            }
        } else if m.row2.y > m.row3.z {
            let s = (1.0 + m.row2.y - m.row1.x - m.row3.z).sqrt() * 2.0;
            Self {
                scalar: (m.row3.x - m.row1.z) / s,
                vector: Vector3::new(
                    (m.row1.y + m.row2.x) / s,
                    s * 0.25,
                    (m.row3.y + m.row2.z) / s,
                ),
            }
        } else {
            let s = (1.0 + m.row3.z - m.row1.x - m.row2.y).sqrt() * 2.0;
            Self {
                scalar: (m.row1.y - m.row2.x) / s,
                vector: Vector3::new(
                    (m.row1.z + m.row3.x) / s,
                    (m.row2.z + m.row3.y) / s,
                    s * 0.25,
                ),
            }
        }
    }

    /// Orientation matrix for this transform (assumed unit length)
    pub fn to_matrix(&self) -> Matrix3 {
        let w = self.scalar;
        let (x, y, z) = (self.vector.x, self.vector.y, self.vector.z);
        Matrix3::from_rows(
            Vector3::new(
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y + w * z),
                2.0 * (x * z - w * y),
            ),
            Vector3::new(
                2.0 * (x * y - w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z + w * x),
            ),
            Vector3::new(
                2.0 * (x * z + w * y),
                2.0 * (y * z - w * x),
                1.0 - 2.0 * (x * x + y * y),
            ),
        )
    }

    /// Spherical interpolation from `self` toward `other`.
    ///
    /// `percent` outside [0,1] clamps to the nearest endpoint, and the
    /// endpoints themselves are returned bit-exact. Antipodal pairs pivot
    /// through an orthogonal transform; without that the sine denominator
    /// vanishes and the weights blow up.
    pub fn blend(&self, other: &Self, percent: f64) -> Self {
        let t = percent.clamp(0.0, 1.0);
        if t == 0.0 {
            return *self;
        }
        if t == 1.0 {
            return *other;
        }

        let cosom = self.dot(other);
        if cosom + 1.0 < ANTIPODAL_TOLERANCE {
            // Nearly opposite: interpolate through a perpendicular transform
            let pivot = Self {
                scalar: self.vector.z,
                vector: Vector3::new(-self.vector.y, self.vector.x, -self.scalar),
            };
            let scale0 = ((1.0 - t) * std::f64::consts::FRAC_PI_2).sin();
            let scale1 = (t * std::f64::consts::FRAC_PI_2).sin();
            return Self {
                scalar: scale0 * self.scalar + scale1 * pivot.scalar,
                vector: self.vector * scale0 + pivot.vector * scale1,
            };
        }

        // Shortest arc: fold a negative cosine into the target weight
        let (cosom, flip) = if cosom < 0.0 { (-cosom, true) } else { (cosom, false) };
        let (scale0, mut scale1) = if cosom < LERP_THRESHOLD {
            let omega = cosom.acos();
            let sinom = omega.sin();
            (
                ((1.0 - t) * omega).sin() / sinom,
                (t * omega).sin() / sinom,
            )
        } else {
            (1.0 - t, t)
        };
        if flip {
            scale1 = -scale1;
        }
        Self {
            scalar: scale0 * self.scalar + scale1 * other.scalar,
            vector: self.vector * scale0 + other.vector * scale1,
        }
    }
}

impl Default for RotTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &Matrix3, b: &Matrix3, eps: f64) -> bool {
        a.row1.distance(b.row1) < eps && a.row2.distance(b.row2) < eps && a.row3.distance(b.row3) < eps
    }

    #[test]
    fn test_matrix_round_trip() {
        for m in [
            Matrix3::identity(),
            Matrix3::rotation_y(2.4),
            Matrix3::rotation_x(-0.9).multiply(&Matrix3::rotation_z(1.3)),
            // Trace near -1 exercises the diagonal branches
            Matrix3::rotation_y(std::f64::consts::PI - 1.0e-3),
            Matrix3::rotation_x(std::f64::consts::PI - 1.0e-3),
            Matrix3::rotation_z(std::f64::consts::PI - 1.0e-3),
        ] {
            let q = RotTransform::from_matrix(&m);
            assert!(close(&q.to_matrix(), &m, 1.0e-9));
        }
    }

    #[test]
    fn test_blend_endpoints_exact() {
        let a = RotTransform::from_matrix(&Matrix3::rotation_y(0.4));
        let b = RotTransform::from_matrix(&Matrix3::rotation_x(1.9));
        assert_eq!(a.blend(&b, 0.0), a);
        assert_eq!(a.blend(&b, 1.0), b);
        // Out-of-range percents clamp to the endpoints
        assert_eq!(a.blend(&b, -3.5), a);
        assert_eq!(a.blend(&b, 1.01), b);
    }

    #[test]
    fn test_blend_midpoint() {
        let a = RotTransform::from_matrix(&Matrix3::identity());
        let b = RotTransform::from_matrix(&Matrix3::rotation_y(1.0));
        let mid = a.blend(&b, 0.5);
        assert!(close(&mid.to_matrix(), &Matrix3::rotation_y(0.5), 1.0e-9));
    }

    #[test]
    fn test_blend_unit_length_preserved() {
        let a = RotTransform::from_matrix(&Matrix3::rotation_z(0.2));
        let b = RotTransform::from_matrix(&Matrix3::rotation_y(2.8));
        for i in 0..=10 {
            let q = a.blend(&b, i as f64 / 10.0);
            assert!((q.dot(&q) - 1.0).abs() < 1.0e-9);
        }
    }

    #[test]
    fn test_blend_antipodal_stays_finite() {
        let a = RotTransform {
            scalar: 0.0,
            vector: Vector3::new(1.0, 0.0, 0.0),
        };
        // Exactly opposite transform
        let b = RotTransform {
            scalar: 0.0,
            vector: Vector3::new(-1.0, 0.0, 0.0),
        };
        assert!(a.dot(&b) + 1.0 < 1.0e-5);
        for i in 1..10 {
            let q = a.blend(&b, i as f64 / 10.0);
            assert!(q.scalar.is_finite());
            assert!(q.vector.x.is_finite() && q.vector.y.is_finite() && q.vector.z.is_finite());
            assert!((q.dot(&q) - 1.0).abs() < 1.0e-9);
        }
    }
}
