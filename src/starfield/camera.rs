//! Camera: viewport ownership, flights, star locking
//!
//! The camera owns its viewport and exactly one motion controller. The
//! controller variant follows the lock level: unmarked while free-flying,
//! marked once any star is locked. Every lock-level change rebuilds the
//! controller from scratch; the two kinds use different per-frame update
//! formulas and must never carry state across the switch. Setting a new
//! destination mid-flight likewise discards the old flight outright
//! (latest command wins).

use super::math::{Matrix3, Vector3, RAD_PER_DEG};
use super::motion::{
    MarkedMotion, MotionControl, MotionState, SpeedTable, UnmarkedMotion,
};
use super::pose::Pose;
use super::viewport::Viewport;

/// Flights longer than this get the full ramp/cruise/ramp schedule;
/// shorter ones snap to the target after the orientation blend.
/// Engine-tuned, no documented derivation.
const FAR_FLIGHT_THRESHOLD: f64 = 8000.0;

/// Tick budgets handed to `calc_speeds` for scheduled flights
const FLIGHT_SUSTAIN_TICKS: i32 = 120;
const FLIGHT_DECAY_TICKS: i32 = 4;

/// Reorientation is skipped when the forward axis already lies along the
/// path within this relative tolerance
const REORIENT_TOLERANCE: f64 = 1.0e-10;

/// Which pose a relative-position query runs through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeFrame {
    /// Full world-to-camera pose
    Full,
    /// Orientation only; for direction-like points at sky distance
    RotationOnly,
}

/// Surfaced by `update_position` when a flight finishes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraEvent {
    FlightCompleted {
        /// Star the finished flight was locking onto, if any. The caller
        /// completes the sequence by passing it to `add_locked_star`.
        locked_target: Option<Vector3>,
    },
}

pub struct Camera {
    viewport: Viewport,
    motion: MotionControl,
    is_moved: bool,
    /// Star to surface in the completion event of the current flight
    pending_lock: Option<Vector3>,
}

impl Camera {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_viewport(Viewport::new(width, height))
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport,
            motion: MotionControl::Unmarked(UnmarkedMotion::new()),
            is_moved: false,
            pending_lock: None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn position(&self) -> Vector3 {
        self.viewport.position()
    }

    pub fn orientation(&self) -> &Matrix3 {
        self.viewport.orientation()
    }

    pub fn lock_level(&self) -> u32 {
        self.viewport.lock_level()
    }

    /// Locked cameras refuse direct position/orientation writes; movement
    /// belongs to the marked controller until the stars are released.
    pub fn is_locked(&self) -> bool {
        self.viewport.lock_level() > 0
    }

    pub fn is_moved(&self) -> bool {
        self.is_moved
    }

    pub fn clear_moved(&mut self) {
        self.is_moved = false;
    }

    pub fn set_position(&mut self, v: Vector3) {
        if self.is_locked() {
            return;
        }
        self.viewport.set_position(v);
        self.is_moved = true;
    }

    pub fn set_orientation(&mut self, m: Matrix3) {
        if self.is_locked() {
            return;
        }
        self.viewport.set_orientation(m);
        self.is_moved = true;
    }

    /// Point the camera along `dir` (world space)
    pub fn set_forward(&mut self, dir: Vector3) {
        if self.is_locked() {
            return;
        }
        self.viewport.set_orientation(Matrix3::from_forward(dir));
        self.is_moved = true;
    }

    /// Begin a free flight toward `target`.
    ///
    /// Reorients first when the path leaves the current forward axis, and
    /// schedules the ramp table only past the far-flight threshold. Any
    /// flight already in progress is discarded.
    pub fn set_destination(&mut self, target: Vector3) {
        if self.is_locked() {
            return;
        }
        let src = self.viewport.position();
        let delta = target - src;
        let distance = delta.magnitude();
        if distance <= 0.0 {
            return;
        }

        let path_dir = delta * (1.0 / distance);
        let forward = self.viewport.orientation().row3;
        let reorient = if (1.0 - forward.dot(path_dir)).abs() > REORIENT_TOLERANCE {
            Some(Matrix3::from_forward(path_dir))
        } else {
            None
        };
        let speeds = if distance > FAR_FLIGHT_THRESHOLD {
            Some(SpeedTable::calc_speeds(
                FLIGHT_SUSTAIN_TICKS,
                FLIGHT_DECAY_TICKS,
                distance,
            ))
        } else {
            None
        };

        let mut motion = UnmarkedMotion::new();
        motion.start_flight(src, target, self.viewport.orientation(), reorient, speeds);
        self.motion = MotionControl::Unmarked(motion);
        self.pending_lock = None;
    }

    /// Record a locked star and rebuild the motion controller for the new
    /// lock level
    pub fn add_locked_star(&mut self, v: Vector3) {
        self.viewport.push_locked_star(v);
        self.rebuild_motion();
    }

    /// Release the most recent locked star and rebuild the controller
    pub fn remove_locked_star(&mut self) {
        self.viewport.pop_locked_star();
        self.rebuild_motion();
    }

    fn rebuild_motion(&mut self) {
        self.motion = if self.viewport.lock_level() == 0 {
            MotionControl::Unmarked(UnmarkedMotion::new())
        } else {
            MotionControl::Marked(MarkedMotion::new())
        };
        self.pending_lock = None;
    }

    /// Phase one of the lock sequence: slide the camera so `star` sits on
    /// the view axis at the current range, orientation unchanged. The
    /// completion event carries the star for `add_locked_star`.
    pub fn lock_marker1(&mut self, star: Vector3) -> bool {
        if self.viewport.lock_level() != 0 {
            return false;
        }
        let src = self.viewport.position();
        let range = src.distance(star);
        if range <= 0.0 {
            return false;
        }
        let forward = self.viewport.orientation().row3;
        let target = star - forward * range;

        let mut motion = UnmarkedMotion::new();
        let distance = src.distance(target);
        let speeds = if distance > FAR_FLIGHT_THRESHOLD {
            Some(SpeedTable::calc_speeds(
                FLIGHT_SUSTAIN_TICKS,
                FLIGHT_DECAY_TICKS,
                distance,
            ))
        } else {
            None
        };
        motion.start_flight(src, target, self.viewport.orientation(), None, speeds);
        self.motion = MotionControl::Unmarked(motion);
        self.pending_lock = Some(star);
        true
    }

    /// Phase two: with one star held, settle into the pose that also frames
    /// `star`. Candidates are integer-degree rotations about the Y axis
    /// through the first locked star, keeping the current range; the one
    /// closest to the present camera position wins. The scan is the
    /// settle animation's texture: the one-degree steps are what the
    /// player sees the camera snap through.
    pub fn lock_marker2(&mut self, star: Vector3) -> bool {
        if self.viewport.lock_level() != 1 {
            return false;
        }
        let Some(anchor) = self.viewport.locked_star(0) else {
            return false;
        };
        self.start_anchored_scan(anchor, star)
    }

    /// Phase three: same scan anchored at the midpoint of the first two
    /// locked stars
    pub fn lock_marker3(&mut self, star: Vector3) -> bool {
        if self.viewport.lock_level() != 2 {
            return false;
        }
        let (Some(first), Some(second)) =
            (self.viewport.locked_star(0), self.viewport.locked_star(1))
        else {
            return false;
        };
        let anchor = (first + second) * 0.5;
        self.start_anchored_scan(anchor, star)
    }

    fn start_anchored_scan(&mut self, anchor: Vector3, star: Vector3) -> bool {
        let prior = self.viewport.position();
        let range = prior.distance(anchor);
        if range <= 0.0 {
            return false;
        }

        // Brute-force all 360 integer degrees; do not replace with a
        // closed-form solve, the discrete stepping is intentional.
        let mut best_distance = f64::MAX;
        let mut best_degree = 0;
        for degree in 0..360 {
            let orient = Matrix3::rotation_y(degree as f64 * RAD_PER_DEG);
            let candidate = anchor - orient.row3 * range;
            let distance = candidate.distance(prior);
            if distance < best_distance {
                best_distance = distance;
                best_degree = degree;
            }
        }

        let winning = Matrix3::rotation_y(best_degree as f64 * RAD_PER_DEG);
        let target_pos = anchor - winning.row3 * range;
        // Re-aim at the anchor from the winning spot
        let target_orient = Matrix3::from_forward(anchor - target_pos);

        let mut motion = MarkedMotion::new();
        let distance = prior.distance(target_pos);
        let speeds = if distance > 0.0 {
            Some(SpeedTable::calc_speeds(
                FLIGHT_SUSTAIN_TICKS,
                FLIGHT_DECAY_TICKS,
                distance,
            ))
        } else {
            None
        };
        motion.start_flight(
            prior,
            target_pos,
            self.viewport.orientation(),
            &target_orient,
            speeds,
        );
        self.motion = MotionControl::Marked(motion);
        self.pending_lock = Some(star);
        true
    }

    /// Advance the active flight by one frame.
    ///
    /// Returns the completion event exactly once, on the tick the
    /// controller reports `DoneMoving`; the controller is reset to idle at
    /// that point and stays usable for the next flight.
    pub fn update_position(&mut self) -> Option<CameraEvent> {
        let mut pos = self.viewport.position();
        let mut orientation = *self.viewport.orientation();
        let state = self.motion.move_tick(&mut pos, &mut orientation);
        match state {
            MotionState::NotActive => None,
            MotionState::Moving => {
                self.viewport.set_position(pos);
                self.viewport.set_orientation(orientation);
                self.is_moved = true;
                None
            }
            MotionState::DoneMoving => {
                self.viewport.set_position(pos);
                self.viewport.set_orientation(orientation);
                self.is_moved = true;
                self.motion.stop();
                Some(CameraEvent::FlightCompleted {
                    locked_target: self.pending_lock.take(),
                })
            }
        }
    }

    /// World-to-camera pose
    pub fn pose(&self) -> Pose {
        self.viewport.pose()
    }

    /// Camera-space position of `src` through the chosen frame
    pub fn get_relative_pos(&self, frame: RelativeFrame, src: Vector3) -> Vector3 {
        match frame {
            RelativeFrame::Full => self.viewport.pose().transform(src),
            RelativeFrame::RotationOnly => self.viewport.raw_pose().transform(src),
        }
    }

    /// Project a world point to screen coordinates
    pub fn project(&self, world: Vector3) -> Option<(f64, f64)> {
        let cam = self.viewport.pose().transform(world);
        self.viewport.project(cam)
    }

    /// Replace the whole camera state from a restore path, rebuilding the
    /// motion controller for the restored lock level
    pub fn restore(
        &mut self,
        position: Vector3,
        orientation: Matrix3,
        front_clip: f64,
        back_clip: f64,
        locked_rows: Matrix3,
        lock_level: u32,
    ) {
        self.viewport.set_position(position);
        self.viewport.set_orientation(orientation);
        self.viewport.set_clip(front_clip, back_clip);
        self.viewport.restore_locked_stars(locked_rows, lock_level);
        self.rebuild_motion();
        self.is_moved = true;
    }

    pub(crate) fn motion(&self) -> &MotionControl {
        &self.motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticked_to_completion(camera: &mut Camera) -> Option<CameraEvent> {
        for _ in 0..2000 {
            if let Some(event) = camera.update_position() {
                return Some(event);
            }
        }
        None
    }

    #[test]
    fn test_set_position_noop_while_locked() {
        let mut camera = Camera::new(600, 340);
        camera.set_position(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.position(), Vector3::new(1.0, 2.0, 3.0));

        camera.add_locked_star(Vector3::new(0.0, 0.0, 1.0e6));
        camera.set_position(Vector3::new(9.0, 9.0, 9.0));
        camera.set_orientation(Matrix3::rotation_y(1.0));
        assert_eq!(camera.position(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(*camera.orientation(), Matrix3::identity());

        camera.remove_locked_star();
        camera.set_position(Vector3::new(9.0, 9.0, 9.0));
        assert_eq!(camera.position(), Vector3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_lock_transitions_swap_controller_kind() {
        let mut camera = Camera::new(600, 340);
        assert!(matches!(camera.motion(), MotionControl::Unmarked(_)));

        camera.add_locked_star(Vector3::new(0.0, 0.0, 1.0e6));
        assert_eq!(camera.lock_level(), 1);
        assert!(matches!(camera.motion(), MotionControl::Marked(_)));

        camera.add_locked_star(Vector3::new(1.0e6, 0.0, 1.0e6));
        assert!(matches!(camera.motion(), MotionControl::Marked(_)));

        camera.remove_locked_star();
        assert!(matches!(camera.motion(), MotionControl::Marked(_)));
        camera.remove_locked_star();
        assert_eq!(camera.lock_level(), 0);
        assert!(matches!(camera.motion(), MotionControl::Unmarked(_)));
    }

    #[test]
    fn test_lock_level_clamps() {
        let mut camera = Camera::new(600, 340);
        for i in 0..5 {
            camera.add_locked_star(Vector3::new(i as f64, 0.0, 1.0e6));
        }
        assert_eq!(camera.lock_level(), 3);
        for _ in 0..5 {
            camera.remove_locked_star();
        }
        assert_eq!(camera.lock_level(), 0);
    }

    #[test]
    fn test_destination_flight_settles() {
        let mut camera = Camera::new(600, 340);
        let target = Vector3::new(0.0, 0.0, 100000.0);
        camera.set_destination(target);
        assert!(!camera.is_moved());

        assert!(camera.update_position().is_none() || camera.position().distance(target) < 1.0e-3);
        assert!(camera.is_moved());

        let event = ticked_to_completion(&mut camera);
        assert!(matches!(
            event,
            Some(CameraEvent::FlightCompleted { locked_target: None })
        ));
        assert!(camera.position().distance(target) < 1.0e-3);
        // Controller idle again afterwards
        assert!(camera.update_position().is_none());
    }

    #[test]
    fn test_short_flight_snaps_without_schedule() {
        let mut camera = Camera::new(600, 340);
        // Below the far-flight threshold, along the current forward axis
        let target = Vector3::new(0.0, 0.0, 500.0);
        camera.set_destination(target);
        let mut ticks = 0;
        while camera.update_position().is_none() {
            ticks += 1;
            assert!(ticks < 5, "short flight should settle immediately");
        }
        assert!(camera.position().distance(target) < 1.0e-9);
    }

    #[test]
    fn test_destination_off_axis_reorients_first() {
        let mut camera = Camera::new(600, 340);
        let target = Vector3::new(200000.0, 0.0, 200000.0);
        camera.set_destination(target);

        let event = ticked_to_completion(&mut camera);
        assert!(event.is_some());
        assert!(camera.position().distance(target) < 1.0e-3);
        // Forward ended up along the flown path
        let dir = target.normalized();
        assert!(camera.orientation().row3.distance(dir) < 1.0e-6);
    }

    #[test]
    fn test_lock_marker1_event_carries_star() {
        let mut camera = Camera::new(600, 340);
        let star = Vector3::new(30000.0, 5000.0, 200000.0);
        assert!(camera.lock_marker1(star));
        let event = ticked_to_completion(&mut camera);
        let Some(CameraEvent::FlightCompleted { locked_target }) = event else {
            panic!("flight did not complete");
        };
        assert_eq!(locked_target, Some(star));

        // Star now sits on the view axis at the original range
        let cam_space = camera.get_relative_pos(RelativeFrame::Full, star);
        assert!(cam_space.x.abs() < 1.0);
        assert!(cam_space.y.abs() < 1.0);
        assert!(cam_space.z > 0.0);

        camera.add_locked_star(star);
        assert_eq!(camera.lock_level(), 1);
        assert!(matches!(camera.motion(), MotionControl::Marked(_)));
    }

    #[test]
    fn test_lock_marker2_faces_anchor() {
        let mut camera = Camera::new(600, 340);
        camera.set_position(Vector3::new(0.0, 0.0, -300000.0));
        let first = Vector3::new(0.0, 0.0, 1.0e6);
        camera.add_locked_star(first);

        let second = Vector3::new(250000.0, 40000.0, 9.0e5);
        assert!(camera.lock_marker2(second));
        let event = ticked_to_completion(&mut camera);
        let Some(CameraEvent::FlightCompleted { locked_target }) = event else {
            panic!("flight did not complete");
        };
        assert_eq!(locked_target, Some(second));

        // Anchor star centered on the view axis
        let cam_space = camera.get_relative_pos(RelativeFrame::Full, first);
        assert!(cam_space.z > 0.0);
        assert!(cam_space.x.abs() / cam_space.z < 1.0e-6);

        camera.add_locked_star(second);
        assert_eq!(camera.lock_level(), 2);
    }

    #[test]
    fn test_lock_marker_rejects_wrong_phase() {
        let mut camera = Camera::new(600, 340);
        let star = Vector3::new(0.0, 0.0, 1.0e6);
        assert!(!camera.lock_marker2(star));
        assert!(!camera.lock_marker3(star));

        camera.add_locked_star(star);
        assert!(!camera.lock_marker1(star));
        assert!(!camera.lock_marker3(star));
    }

    #[test]
    fn test_three_star_scenario() {
        // Camera at the origin facing +Z over a three-star sky
        let stars = [
            Vector3::new(0.0, 0.0, 100000.0),
            Vector3::new(50000.0, 0.0, 100000.0),
            Vector3::new(0.0, 50000.0, 100000.0),
        ];
        // New cameras start at the origin looking down +Z
        let camera = Camera::new(600, 340);

        // All three project to distinct on-screen points
        let points: Vec<(f64, f64)> = stars
            .iter()
            .map(|&s| camera.project(s).expect("star should be in front of the clip plane"))
            .collect();
        for p in &points {
            assert!(camera.viewport().on_screen(*p));
        }
        assert!(points[0] != points[1] && points[1] != points[2] && points[0] != points[2]);

        // Fly toward the first star; movement registers only once a tick runs
        let mut camera = camera;
        camera.set_destination(stars[0]);
        assert!(!camera.is_moved());
        camera.update_position();
        assert!(camera.is_moved());

        let mut guard = 0;
        while camera.update_position().is_none() {
            guard += 1;
            assert!(guard < 1000, "flight never settled");
        }
        assert!(camera.position().distance(stars[0]) < 1.0e-3);
    }

    #[test]
    fn test_new_destination_discards_flight() {
        let mut camera = Camera::new(600, 340);
        camera.set_destination(Vector3::new(0.0, 0.0, 1.0e6));
        for _ in 0..40 {
            camera.update_position();
        }
        let mid = camera.position();
        let replacement = mid + Vector3::new(500.0, 0.0, 0.0);
        camera.set_destination(replacement);
        let event = ticked_to_completion(&mut camera);
        assert!(event.is_some());
        assert!(camera.position().distance(replacement) < 1.0e-3);
    }
}
