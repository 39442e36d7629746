//! Camera viewport: projection parameters and locked-star bookkeeping
//!
//! Owns the camera's position and orientation plus everything needed to
//! turn a camera-space point into a screen point. The locked-star matrix
//! carries the world positions of up to three lock targets; `lock_level`
//! strictly bounds how many of its rows are meaningful.

use super::math::{Matrix3, Vector3, RAD_PER_DEG};
use super::pose::Pose;

pub const DEFAULT_WIDTH: i32 = 600;
pub const DEFAULT_HEIGHT: i32 = 340;

/// Engine-tuned view cone half-angles, degrees
const DEFAULT_FOV_X_DEG: f64 = 20.0;
const DEFAULT_FOV_Y_DEG: f64 = 20.0;

const DEFAULT_FRONT_CLIP: f64 = 100.0;
const DEFAULT_BACK_CLIP: f64 = 1.0e9;

pub const MAX_LOCKED_STARS: u32 = 3;

#[derive(Debug, Clone)]
pub struct Viewport {
    position: Vector3,
    orientation: Matrix3,
    front_clip: f64,
    back_clip: f64,
    fov_x_deg: f64,
    fov_y_deg: f64,
    width: i32,
    height: i32,
    // Derived in reset()
    fov_tan_x: f64,
    fov_tan_y: f64,
    center_x: f64,
    center_y: f64,
    /// Rows 0..lock_level hold the world positions of locked stars
    locked_stars: Matrix3,
    lock_level: u32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        let mut viewport = Self {
            position: Vector3::ZERO,
            orientation: Matrix3::identity(),
            front_clip: DEFAULT_FRONT_CLIP,
            back_clip: DEFAULT_BACK_CLIP,
            fov_x_deg: DEFAULT_FOV_X_DEG,
            fov_y_deg: DEFAULT_FOV_Y_DEG,
            width,
            height,
            fov_tan_x: 0.0,
            fov_tan_y: 0.0,
            center_x: 0.0,
            center_y: 0.0,
            locked_stars: Matrix3::from_rows(Vector3::ZERO, Vector3::ZERO, Vector3::ZERO),
            lock_level: 0,
        };
        viewport.reset();
        viewport
    }

    /// Recompute the derived projection parameters
    pub fn reset(&mut self) {
        self.fov_tan_x = (self.fov_x_deg * RAD_PER_DEG).tan();
        self.fov_tan_y = (self.fov_y_deg * RAD_PER_DEG).tan();
        self.center_x = self.width as f64 * 0.5;
        self.center_y = self.height as f64 * 0.5;
    }

    pub fn set_fov(&mut self, x_deg: f64, y_deg: f64) {
        self.fov_x_deg = x_deg;
        self.fov_y_deg = y_deg;
        self.reset();
    }

    pub fn set_clip(&mut self, front: f64, back: f64) {
        self.front_clip = front;
        self.back_clip = back;
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn front_clip(&self) -> f64 {
        self.front_clip
    }

    pub fn back_clip(&self) -> f64 {
        self.back_clip
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, v: Vector3) {
        self.position = v;
    }

    pub fn orientation(&self) -> &Matrix3 {
        &self.orientation
    }

    pub fn set_orientation(&mut self, m: Matrix3) {
        self.orientation = m;
    }

    /// World-to-camera pose. Orientation rows are the camera basis in world
    /// space, so camera coordinates come from dotting against them:
    /// `v_cam = (v_world - position) * R^T`.
    pub fn pose(&self) -> Pose {
        let rotation = self.orientation.transposed();
        let translation = rotation.transform(-self.position);
        Pose::new(rotation, translation)
    }

    /// Rotation-only frame, for direction-like points (constellation art)
    pub fn raw_pose(&self) -> Pose {
        Pose::new(self.orientation.transposed(), Vector3::ZERO)
    }

    /// Project a camera-space point to screen coordinates.
    ///
    /// Returns None behind the front clip plane. The tangent scaling keeps
    /// the tuned 20-degree cone: a point at `x/z == tan(fov)` lands
    /// `center_x * tan(fov)` pixels off center.
    pub fn project(&self, cam: Vector3) -> Option<(f64, f64)> {
        if cam.z <= self.front_clip {
            return None;
        }
        let sx = self.center_x * (1.0 + self.fov_tan_x * cam.x / cam.z);
        let sy = self.center_y * (1.0 - self.fov_tan_y * cam.y / cam.z);
        Some((sx, sy))
    }

    /// True when the projected point is on the surface
    pub fn on_screen(&self, point: (f64, f64)) -> bool {
        point.0 >= 0.0
            && point.0 < self.width as f64
            && point.1 >= 0.0
            && point.1 < self.height as f64
    }

    pub fn lock_level(&self) -> u32 {
        self.lock_level
    }

    pub fn locked_star(&self, index: u32) -> Option<Vector3> {
        if index >= self.lock_level {
            return None;
        }
        Some(match index {
            0 => self.locked_stars.row1,
            1 => self.locked_stars.row2,
            _ => self.locked_stars.row3,
        })
    }

    /// Record a locked star, raising the lock level (clamped to 3)
    pub fn push_locked_star(&mut self, v: Vector3) {
        match self.lock_level {
            0 => self.locked_stars.row1 = v,
            1 => self.locked_stars.row2 = v,
            2 => self.locked_stars.row3 = v,
            _ => return,
        }
        self.lock_level += 1;
    }

    /// Drop the most recent locked star, lowering the lock level
    pub fn pop_locked_star(&mut self) {
        if self.lock_level > 0 {
            self.lock_level -= 1;
        }
    }

    pub(crate) fn restore_locked_stars(&mut self, rows: Matrix3, level: u32) {
        self.locked_stars = rows;
        self.lock_level = level.min(MAX_LOCKED_STARS);
    }

    pub(crate) fn locked_star_rows(&self) -> &Matrix3 {
        &self.locked_stars
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
