//! Camera pose: orientation plus translation
//!
//! A pose is a 3x3 rotation with its basis vectors as rows, plus a
//! translation applied after the rotation (row-vector convention, so
//! composing A with B transforms by A first).

use serde::{Deserialize, Serialize};

use super::math::{Matrix3, Vector3};

/// Determinant below this is treated as singular input, which is a caller
/// bug rather than a recoverable condition.
const SINGULAR_LIMIT: f64 = 1.0e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub rotation: Matrix3,
    pub translation: Vector3,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::ZERO,
        }
    }

    pub fn new(rotation: Matrix3, translation: Vector3) -> Self {
        Self { rotation, translation }
    }

    /// Pure rotation about the Y axis
    pub fn rotation_y(angle: f64) -> Self {
        Self::new(Matrix3::rotation_y(angle), Vector3::ZERO)
    }

    /// Pure rotation about the X axis
    pub fn rotation_x(angle: f64) -> Self {
        Self::new(Matrix3::rotation_x(angle), Vector3::ZERO)
    }

    /// Rotate and translate `v`
    pub fn transform(&self, v: Vector3) -> Vector3 {
        self.rotation.transform(v) + self.translation
    }

    /// Rotate `v` without translating
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        self.rotation.transform(v)
    }

    /// Compose with `other`: the result transforms by `self`, then `other`.
    ///
    /// Rows are renormalized after the product; long animation chains would
    /// otherwise drift the basis off unit length.
    pub fn compose(&self, other: &Pose) -> Pose {
        let mut rotation = self.rotation.multiply(&other.rotation);
        rotation.normalize_rows();
        Pose {
            rotation,
            translation: other.transform(self.translation),
        }
    }

    /// Compose rotations only, keeping `self`'s translation rotated through
    /// `other` but ignoring `other`'s translation. Used for reorienting
    /// about a fixed point.
    pub fn compose_rotation(&self, other: &Pose) -> Pose {
        let mut rotation = self.rotation.multiply(&other.rotation);
        rotation.normalize_rows();
        Pose {
            rotation,
            translation: other.rotate(self.translation),
        }
    }

    /// Inverse through an explicit general 4x4 inverse.
    ///
    /// Deliberately not the orthonormal `R^T` shortcut: input poses can
    /// have drifted off orthonormal and the general inverse must stay
    /// exact for them.
    pub fn inverse_transform(&self) -> Pose {
        let r = &self.rotation;
        let t = self.translation;
        let m = [
            [r.row1.x, r.row1.y, r.row1.z, 0.0],
            [r.row2.x, r.row2.y, r.row2.z, 0.0],
            [r.row3.x, r.row3.y, r.row3.z, 0.0],
            [t.x, t.y, t.z, 1.0],
        ];
        let inv = invert4(&m);
        Pose {
            rotation: Matrix3::from_rows(
                Vector3::new(inv[0][0], inv[0][1], inv[0][2]),
                Vector3::new(inv[1][0], inv[1][1], inv[1][2]),
                Vector3::new(inv[2][0], inv[2][1], inv[2][2]),
            ),
            translation: Vector3::new(inv[3][0], inv[3][1], inv[3][2]),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// General 4x4 inverse via cofactor expansion.
///
/// Panics on (near-)singular input; see `SINGULAR_LIMIT`.
fn invert4(m: &[[f64; 4]; 4]) -> [[f64; 4]; 4] {
    let mut cof = [[0.0f64; 4]; 4];
    for row in 0..4 {
        for col in 0..4 {
            let minor = minor3(m, row, col);
            let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
            cof[row][col] = sign * minor;
        }
    }

    let det = m[0][0] * cof[0][0] + m[0][1] * cof[0][1] + m[0][2] * cof[0][2] + m[0][3] * cof[0][3];
    assert!(
        det.abs() > SINGULAR_LIMIT,
        "cannot invert a singular pose matrix (det = {det})"
    );

    // Adjugate (transposed cofactors) over the determinant
    let inv_det = 1.0 / det;
    let mut out = [[0.0f64; 4]; 4];
    for row in 0..4 {
        for col in 0..4 {
            out[row][col] = cof[col][row] * inv_det;
        }
    }
    out
}

/// Determinant of the 3x3 minor left after deleting `skip_row`/`skip_col`
fn minor3(m: &[[f64; 4]; 4], skip_row: usize, skip_col: usize) -> f64 {
    let mut sub = [[0.0f64; 3]; 3];
    let mut r = 0;
    for row in 0..4 {
        if row == skip_row {
            continue;
        }
        let mut c = 0;
        for col in 0..4 {
            if col == skip_col {
                continue;
            }
            sub[r][c] = m[row][col];
            c += 1;
        }
        r += 1;
    }
    sub[0][0] * (sub[1][1] * sub[2][2] - sub[1][2] * sub[2][1])
        - sub[0][1] * (sub[1][0] * sub[2][2] - sub[1][2] * sub[2][0])
        + sub[0][2] * (sub[1][0] * sub[2][1] - sub[1][1] * sub[2][0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pose() -> Pose {
        let rotation = Matrix3::rotation_y(0.8)
            .multiply(&Matrix3::rotation_x(-0.3))
            .multiply(&Matrix3::rotation_z(1.7));
        Pose::new(rotation, Vector3::new(120.0, -45.5, 9000.0))
    }

    #[test]
    fn test_inverse_round_trip() {
        let pose = sample_pose();
        let round = pose.compose(&pose.inverse_transform());
        let identity = Pose::identity();
        assert!(round.translation.magnitude() < 1.0e-6);
        assert!(round.rotation.row1.distance(identity.rotation.row1) < 1.0e-6);
        assert!(round.rotation.row2.distance(identity.rotation.row2) < 1.0e-6);
        assert!(round.rotation.row3.distance(identity.rotation.row3) < 1.0e-6);
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let pose = sample_pose();
        let inv = pose.inverse_transform();
        let v = Vector3::new(-3.0, 77.0, 0.25);
        assert!(inv.transform(pose.transform(v)).distance(v) < 1.0e-6);
    }

    #[test]
    fn test_compose_order() {
        let a = Pose::new(Matrix3::rotation_y(0.5), Vector3::new(10.0, 0.0, 0.0));
        let b = Pose::new(Matrix3::rotation_x(-0.2), Vector3::new(0.0, 5.0, 1.0));
        let v = Vector3::new(1.0, 2.0, 3.0);
        let sequential = b.transform(a.transform(v));
        let composed = a.compose(&b).transform(v);
        assert!(sequential.distance(composed) < 1.0e-9);
    }

    #[test]
    fn test_compose_keeps_rows_orthonormal() {
        let step = Pose::rotation_y(0.013);
        let mut pose = sample_pose();
        for _ in 0..2000 {
            pose = pose.compose(&step);
        }
        assert!(pose.rotation.is_orthonormal(1.0e-6));
    }

    #[test]
    fn test_compose_rotation_ignores_other_translation() {
        let a = Pose::new(Matrix3::identity(), Vector3::new(1.0, 0.0, 0.0));
        let b = Pose::new(Matrix3::rotation_z(std::f64::consts::FRAC_PI_2), Vector3::new(100.0, 100.0, 100.0));
        let out = a.compose_rotation(&b);
        // Translation rotated but b's offset not added
        assert!((out.translation.y - 1.0).abs() < 1.0e-9);
        assert!(out.translation.x.abs() < 1.0e-9);
    }

    #[test]
    #[should_panic(expected = "singular")]
    fn test_singular_inverse_panics() {
        let degenerate = Pose::new(
            Matrix3::from_rows(Vector3::ZERO, Vector3::ZERO, Vector3::ZERO),
            Vector3::ZERO,
        );
        let _ = degenerate.inverse_transform();
    }
}
