//! Flight state machines
//!
//! Two controller kinds move the camera over successive frames. The
//! unmarked controller flies free-form: an orientation blend phase first,
//! then table-driven travel along a straight path. The marked controller
//! (active while stars are locked) blends orientation and position
//! simultaneously, re-deriving its position from the blend percent each
//! tick instead of accumulating per-tick steps.
//!
//! Nothing in here fails once a flight has started; a `move_tick` on an
//! idle controller is a no-op that reports `NotActive`.

use super::math::{Matrix3, Vector3};
use super::transform::RotTransform;

/// Speed table resolution. Tuned together with the quartic exponent to the
/// engine's 15-30fps frame rate assumption; changing either changes the
/// feel of every flight.
pub const SPEED_TABLE_SIZE: usize = 32;
const SPEED_CURVE_EXPONENT: f64 = 4.0;

/// Orientation blend advance per tick on the unmarked path (10 frames total)
pub const ORIENTATION_BLEND_STEP: f64 = 0.1;

/// Flights shorter than this settle within a tick; skip ramp bookkeeping
const MIN_FLIGHT_DISTANCE: f64 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    NotActive,
    Moving,
    DoneMoving,
}

/// Ramp-up/cruise/ramp-down speed schedule.
///
/// The 32 entries follow a quartic ease `(i/32)^4`, normalized so the
/// whole table sums to `decay * step`. A full flight spends 32 ticks
/// walking the table up, `cruise_count` ticks at the constant `step`, and
/// 32 ticks walking it back down.
#[derive(Debug, Clone)]
pub struct SpeedTable {
    entries: [f64; SPEED_TABLE_SIZE],
    step: f64,
    cruise_count: i32,
    acc_index: usize,
    cruise_done: i32,
    dec_index: usize,
}

impl SpeedTable {
    /// Build the schedule for a flight of `distance` units. `sustain` and
    /// `decay` are tick budgets for the cruise and ramp shares.
    pub fn calc_speeds(sustain: i32, decay: i32, distance: f64) -> SpeedTable {
        assert!(sustain > 0 && decay > 0 && distance > 0.0);
        let step = distance / (sustain + 2 * decay) as f64;

        let mut entries = [0.0f64; SPEED_TABLE_SIZE];
        let mut total = 0.0;
        for (i, entry) in entries.iter_mut().enumerate() {
            let v = (i as f64 / SPEED_TABLE_SIZE as f64).powf(SPEED_CURVE_EXPONENT);
            *entry = v;
            total += v;
        }
        let norm = step * decay as f64 / total;
        for entry in entries.iter_mut() {
            *entry *= norm;
        }

        SpeedTable {
            entries,
            step,
            cruise_count: sustain,
            acc_index: 0,
            cruise_done: 0,
            dec_index: SPEED_TABLE_SIZE,
        }
    }

    pub fn entries(&self) -> &[f64; SPEED_TABLE_SIZE] {
        &self.entries
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Speed for the next tick, or None once the schedule is exhausted
    fn next_speed(&mut self) -> Option<f64> {
        if self.acc_index < SPEED_TABLE_SIZE {
            let v = self.entries[self.acc_index];
            self.acc_index += 1;
            return Some(v);
        }
        if self.cruise_done < self.cruise_count {
            self.cruise_done += 1;
            return Some(self.step);
        }
        if self.dec_index > 0 {
            self.dec_index -= 1;
            return Some(self.entries[self.dec_index]);
        }
        None
    }
}

/// Slerp wrapper holding the two endpoint orientations of a transition
#[derive(Debug, Clone)]
pub struct OrientationChanger {
    src: RotTransform,
    dst: RotTransform,
}

impl OrientationChanger {
    pub fn new(src: &Matrix3, dst: &Matrix3) -> Self {
        Self {
            src: RotTransform::from_matrix(src),
            dst: RotTransform::from_matrix(dst),
        }
    }

    /// Orientation at `percent` of the transition
    pub fn at(&self, percent: f64) -> Matrix3 {
        self.src.blend(&self.dst, percent).to_matrix()
    }
}

/// Travel leg of an unmarked flight
#[derive(Debug, Clone)]
struct TravelLeg {
    dst: Vector3,
    dir: Vector3,
    /// None for short flights that snap to the destination after the blend
    speeds: Option<SpeedTable>,
}

/// Free-form flight: optional orientation blend, then translation
#[derive(Debug, Clone)]
pub struct UnmarkedMotion {
    state: MotionState,
    changer: Option<OrientationChanger>,
    blend_ticks: u32,
    travel: Option<TravelLeg>,
}

impl UnmarkedMotion {
    pub fn new() -> Self {
        Self {
            state: MotionState::NotActive,
            changer: None,
            blend_ticks: 0,
            travel: None,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Configure a flight from `src` to `dst`.
    ///
    /// `reorient` carries the target orientation when the caller decided
    /// the path needs one; `speeds` is the table for long flights (short
    /// ones snap once the blend finishes).
    pub fn start_flight(
        &mut self,
        src: Vector3,
        dst: Vector3,
        src_orient: &Matrix3,
        reorient: Option<Matrix3>,
        speeds: Option<SpeedTable>,
    ) {
        let delta = dst - src;
        let travel = if delta.magnitude() > MIN_FLIGHT_DISTANCE {
            Some(TravelLeg {
                dst,
                dir: delta.normalized(),
                speeds,
            })
        } else {
            None
        };
        self.changer = reorient.map(|target| OrientationChanger::new(src_orient, &target));
        self.blend_ticks = 0;
        self.travel = travel;
        self.state = if self.changer.is_some() || self.travel.is_some() {
            MotionState::Moving
        } else {
            MotionState::DoneMoving
        };
    }

    pub fn move_tick(&mut self, pos: &mut Vector3, orientation: &mut Matrix3) -> MotionState {
        if self.state != MotionState::Moving {
            return self.state;
        }

        // Phase 1: reorient toward the path. The percent comes from a tick
        // count times the step, not a running sum; summed 0.1s land just
        // short of 1.0 and cost an extra frame.
        if let Some(changer) = &self.changer {
            self.blend_ticks += 1;
            let percent = self.blend_ticks as f64 * ORIENTATION_BLEND_STEP;
            *orientation = changer.at(percent);
            if percent < 1.0 {
                return MotionState::Moving;
            }
            self.changer = None;
        }

        // Phase 2: travel
        let Some(travel) = &mut self.travel else {
            self.state = MotionState::DoneMoving;
            return self.state;
        };
        match travel.speeds.as_mut().and_then(SpeedTable::next_speed) {
            Some(speed) => {
                *pos = *pos + travel.dir * speed;
                MotionState::Moving
            }
            None => {
                // Schedule exhausted (or never built): settle exactly
                *pos = travel.dst;
                self.travel = None;
                self.state = MotionState::DoneMoving;
                self.state
            }
        }
    }
}

impl Default for UnmarkedMotion {
    fn default() -> Self {
        Self::new()
    }
}

/// Locked flight: simultaneous orientation blend and travel.
///
/// Position is always re-derived from the distance travelled along the
/// src-to-dst line (`vector_on_path`), never accumulated per tick;
/// accumulated steps drift off the path over a few hundred ticks.
#[derive(Debug, Clone)]
pub struct MarkedMotion {
    state: MotionState,
    src: Vector3,
    dst: Vector3,
    dir: Vector3,
    distance: f64,
    travelled: f64,
    changer: Option<OrientationChanger>,
    speeds: Option<SpeedTable>,
}

impl MarkedMotion {
    pub fn new() -> Self {
        Self {
            state: MotionState::NotActive,
            src: Vector3::ZERO,
            dst: Vector3::ZERO,
            dir: Vector3::ZERO,
            distance: 0.0,
            travelled: 0.0,
            changer: None,
            speeds: None,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn start_flight(
        &mut self,
        src: Vector3,
        dst: Vector3,
        src_orient: &Matrix3,
        dst_orient: &Matrix3,
        speeds: Option<SpeedTable>,
    ) {
        let delta = dst - src;
        let distance = delta.magnitude();
        self.src = src;
        self.dst = dst;
        self.distance = distance;
        self.travelled = 0.0;
        self.dir = if distance > MIN_FLIGHT_DISTANCE {
            delta * (1.0 / distance)
        } else {
            Vector3::ZERO
        };
        self.changer = Some(OrientationChanger::new(src_orient, dst_orient));
        self.speeds = if distance > MIN_FLIGHT_DISTANCE {
            speeds
        } else {
            None
        };
        self.state = MotionState::Moving;
    }

    /// Point on the src-to-dst line after `travelled` units
    pub fn vector_on_path(&self, travelled: f64) -> Vector3 {
        self.src + self.dir * travelled.clamp(0.0, self.distance)
    }

    pub fn move_tick(&mut self, pos: &mut Vector3, orientation: &mut Matrix3) -> MotionState {
        if self.state != MotionState::Moving {
            return self.state;
        }

        match self.speeds.as_mut().and_then(SpeedTable::next_speed) {
            Some(speed) => {
                self.travelled += speed;
                let percent = if self.distance > 0.0 {
                    (self.travelled / self.distance).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                *pos = self.vector_on_path(self.travelled);
                if let Some(changer) = &self.changer {
                    *orientation = changer.at(percent);
                }
                MotionState::Moving
            }
            None => {
                *pos = self.dst;
                if let Some(changer) = self.changer.take() {
                    *orientation = changer.at(1.0);
                }
                self.state = MotionState::DoneMoving;
                self.state
            }
        }
    }
}

impl Default for MarkedMotion {
    fn default() -> Self {
        Self::new()
    }
}

/// The camera's motion controller, owned by value and replaced wholesale on
/// every lock-level change
#[derive(Debug, Clone)]
pub enum MotionControl {
    Unmarked(UnmarkedMotion),
    Marked(MarkedMotion),
}

impl MotionControl {
    pub fn state(&self) -> MotionState {
        match self {
            MotionControl::Unmarked(m) => m.state(),
            MotionControl::Marked(m) => m.state(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == MotionState::Moving
    }

    pub fn move_tick(&mut self, pos: &mut Vector3, orientation: &mut Matrix3) -> MotionState {
        match self {
            MotionControl::Unmarked(m) => m.move_tick(pos, orientation),
            MotionControl::Marked(m) => m.move_tick(pos, orientation),
        }
    }

    /// Reset a finished controller back to idle, keeping the variant
    pub fn stop(&mut self) {
        match self {
            MotionControl::Unmarked(m) => *m = UnmarkedMotion::new(),
            MotionControl::Marked(m) => *m = MarkedMotion::new(),
        }
    }
}
