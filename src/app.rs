//! Viewer session state
//!
//! Glue between raw input events and the starfield subsystem: selection
//! clicks, puzzle matching against the target stars, lock/unlock commands,
//! and the status line shown at the bottom of the window.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::starfield::{
    pick_star, Camera, CameraEvent, Crosshairs, CrosshairEntry, SelectionChange, StarField,
    Vector3,
};

/// Fly-to flights stop this far short of the star, inside closeup range
const APPROACH_OFFSET: f64 = 50000.0;

/// Session configuration, RON on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Binary star resource; None renders the built-in synthetic catalog
    pub catalog_path: Option<PathBuf>,
    pub constellation_path: Option<PathBuf>,
    pub viewport_width: i32,
    pub viewport_height: i32,
    /// View cone half-angles, degrees
    pub fov_x_deg: f64,
    pub fov_y_deg: f64,
    pub start_position: Vector3,
    /// Catalog indices of the three stars the puzzle wants selected
    pub puzzle_targets: Vec<usize>,
    pub demo_seed: u64,
    pub demo_star_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            constellation_path: None,
            viewport_width: 600,
            viewport_height: 340,
            fov_x_deg: 20.0,
            fov_y_deg: 20.0,
            start_position: Vector3::ZERO,
            puzzle_targets: vec![0, 1, 2],
            demo_seed: 0x5747,
            demo_star_count: 900,
        }
    }
}

/// Error type for config loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

/// Load a session config from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SessionConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Ok(ron::from_str(&contents)?)
}

/// One navigation session: camera, field, selection and puzzle state
pub struct NavSession {
    pub camera: Camera,
    pub field: StarField,
    pub crosshairs: Crosshairs,
    puzzle_targets: Vec<usize>,
    status: String,
    status_time: f64,
}

impl NavSession {
    pub fn new(camera: Camera, field: StarField, puzzle_targets: Vec<usize>) -> Self {
        Self {
            camera,
            field,
            crosshairs: Crosshairs::new(),
            puzzle_targets,
            status: String::new(),
            status_time: 0.0,
        }
    }

    pub fn set_status(&mut self, msg: &str, seconds: f64) {
        self.status = msg.to_string();
        self.status_time = seconds;
    }

    pub fn status(&self) -> Option<&str> {
        if self.status_time > 0.0 {
            Some(&self.status)
        } else {
            None
        }
    }

    /// Per-frame: advance flights, complete lock sequences, keep the
    /// crosshair screen positions glued to their stars
    pub fn update(&mut self, delta: f64) {
        self.status_time = (self.status_time - delta).max(0.0);

        if let Some(CameraEvent::FlightCompleted { locked_target }) = self.camera.update_position()
        {
            if let Some(star) = locked_target {
                self.camera.add_locked_star(star);
                let level = self.camera.lock_level();
                self.set_status(&format!("Locked on ({}/3)", level), 3.0);
            }
        }

        if self.camera.is_moved() {
            self.crosshairs.reproject(self.field.catalog(), &self.camera);
            self.camera.clear_moved();
        }
    }

    /// Left click on the starfield surface
    pub fn handle_click(&mut self, point: (f64, f64)) {
        let Some((index, projected)) = pick_star(self.field.catalog(), &self.camera, point) else {
            return;
        };
        let pick = CrosshairEntry {
            screen: projected,
            index,
        };
        let change = self.crosshairs.select(pick);
        self.apply_selection_change(change);
    }

    fn apply_selection_change(&mut self, change: SelectionChange) {
        match change {
            SelectionChange::Added(entry) => {
                if let Some(position) = self.field.catalog().entry(entry.index).map(|s| s.position)
                {
                    self.field.markers_mut().push(position);
                }
                self.check_match(entry);
            }
            SelectionChange::Removed(entry) => {
                if let Some(position) = self.field.catalog().entry(entry.index).map(|s| s.position)
                {
                    self.field.markers_mut().remove(position);
                }
                self.set_status("Selection cleared", 2.0);
            }
            SelectionChange::Replaced { old, new } => {
                let catalog = self.field.catalog();
                let old_pos = catalog.entry(old.index).map(|s| s.position);
                let new_pos = catalog.entry(new.index).map(|s| s.position);
                let markers = self.field.markers_mut();
                if let Some(p) = old_pos {
                    markers.remove(p);
                }
                if let Some(p) = new_pos {
                    markers.push(p);
                }
                self.check_match(new);
            }
            SelectionChange::Ignored => {}
        }
    }

    /// External puzzle logic: compare the new pick against the target star
    /// for its slot and confirm it on a match
    fn check_match(&mut self, entry: CrosshairEntry) {
        let slot = self.crosshairs.len() - 1;
        if self.puzzle_targets.get(slot) == Some(&entry.index) {
            self.crosshairs.increment_match();
            if self.crosshairs.is_solved() {
                self.set_status("All three stars matched", 5.0);
            } else {
                self.set_status(&format!("Star {} matched", entry.index), 3.0);
            }
        } else {
            self.set_status(&format!("Star {} selected", entry.index), 2.0);
        }
    }

    /// Hover feedback
    pub fn handle_hover(&mut self, point: (f64, f64)) {
        if let Some((index, _)) = pick_star(self.field.catalog(), &self.camera, point) {
            self.set_status(&format!("Star {}", index), 0.5);
        }
    }

    /// Begin the next lock phase using the selection in the matching slot
    pub fn lock_next(&mut self) {
        let level = self.camera.lock_level();
        let Some(entry) = self.crosshairs.entries().get(level as usize).copied() else {
            self.set_status("No selection to lock", 2.0);
            return;
        };
        let Some(star) = self.field.catalog().entry(entry.index).map(|s| s.position) else {
            return;
        };
        let started = match level {
            0 => self.camera.lock_marker1(star),
            1 => self.camera.lock_marker2(star),
            2 => self.camera.lock_marker3(star),
            _ => false,
        };
        if started {
            self.set_status("Locking...", 3.0);
        } else {
            self.set_status("Cannot lock now", 2.0);
        }
    }

    /// Release the most recent lock
    pub fn unlock(&mut self) {
        if self.camera.lock_level() == 0 {
            self.set_status("Nothing locked", 2.0);
            return;
        }
        self.camera.remove_locked_star();
        self.set_status(&format!("Unlocked ({}/3)", self.camera.lock_level()), 2.0);
    }

    /// Fly toward the most recent selection, stopping in closeup range
    pub fn fly_to_selection(&mut self) {
        let Some(entry) = self.crosshairs.entries().last().copied() else {
            self.set_status("Nothing selected", 2.0);
            return;
        };
        let Some(star) = self.field.catalog().entry(entry.index).map(|s| s.position) else {
            return;
        };
        let delta = star - self.camera.position();
        let distance = delta.magnitude();
        if distance <= APPROACH_OFFSET {
            self.set_status("Already there", 2.0);
            return;
        }
        let target = star - delta * (APPROACH_OFFSET / distance);
        self.camera.set_destination(target);
        self.set_status(&format!("In flight to star {}", entry.index), 3.0);
    }

    pub fn is_solved(&self) -> bool {
        self.crosshairs.is_solved()
    }
}
