//! Star picking and crosshair selection
//!
//! A click maps to the first catalog star whose projected 4x4 pixel box
//! contains it. Selected stars fill up to three crosshair slots; the
//! newest slot stays "pending" until external puzzle logic confirms it by
//! advancing the match counter.

use super::camera::Camera;
use super::catalog::Catalog;
use super::surface::{BlendMode, SurfaceArea};

/// Half-extent of the screen-space pick box around a projected star
const PICK_BOX_HALF: f64 = 2.0;

/// Squared camera-space distance bounds for pickable stars. Below the
/// lower bound a star is in closeup range and owned by the closeup
/// renderer; above the upper bound it is beyond the far rendering shell.
/// The two bounds serve different renderers; keep them separate.
const PICK_MIN_DISTANCE_SQ: f64 = 1.0e12;
const PICK_MAX_DISTANCE_SQ: f64 = 1.0e9 * 1.0e9;

pub const MAX_SELECTIONS: usize = 3;

/// One selected star
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrosshairEntry {
    pub screen: (f64, f64),
    pub index: usize,
}

/// What a click did to the selection, so callers can mirror it into the
/// marker overlay and puzzle logic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionChange {
    Added(CrosshairEntry),
    Removed(CrosshairEntry),
    Replaced {
        old: CrosshairEntry,
        new: CrosshairEntry,
    },
    Ignored,
}

/// Screen-space star pick.
///
/// Walks the catalog in order and returns the first star whose box
/// contains `point`, along with its projected position. Stars outside the
/// pickable distance shell or off screen never match.
pub fn pick_star(
    catalog: &Catalog,
    camera: &Camera,
    point: (f64, f64),
) -> Option<(usize, (f64, f64))> {
    let pose = camera.pose();
    let viewport = camera.viewport();
    for (index, entry) in catalog.entries().iter().enumerate() {
        let cam = pose.transform(entry.position);
        let dist_sq = cam.magnitude_squared();
        if !(PICK_MIN_DISTANCE_SQ..PICK_MAX_DISTANCE_SQ).contains(&dist_sq) {
            continue;
        }
        let Some(projected) = viewport.project(cam) else {
            continue;
        };
        if !viewport.on_screen(projected) {
            continue;
        }
        if (projected.0 - point.0).abs() <= PICK_BOX_HALF
            && (projected.1 - point.1).abs() <= PICK_BOX_HALF
        {
            return Some((index, projected));
        }
    }
    None
}

/// The three-slot crosshair selection.
///
/// `match_index` counts confirmed slots minus one (-1 when nothing is
/// confirmed); entries at or below it are settled and never disturbed by
/// further clicks.
#[derive(Debug, Clone)]
pub struct Crosshairs {
    entries: Vec<CrosshairEntry>,
    match_index: i32,
}

impl Crosshairs {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_SELECTIONS),
            match_index: -1,
        }
    }

    /// Clear everything for a fresh puzzle session
    pub fn reset(&mut self) {
        self.entries.clear();
        self.match_index = -1;
    }

    pub fn entries(&self) -> &[CrosshairEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn match_index(&self) -> i32 {
        self.match_index
    }

    /// Solved once all three slots are confirmed
    pub fn is_solved(&self) -> bool {
        self.match_index >= 2
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.iter().any(|e| e.index == index)
    }

    /// True when every current entry is confirmed
    fn all_confirmed(&self) -> bool {
        self.entries.len() as i32 - 1 == self.match_index
    }

    /// Apply a picked star to the selection.
    ///
    /// Append when everything so far is confirmed and there is room;
    /// toggle the pending slot off when its star is clicked again; replace
    /// the pending slot when a different star is clicked.
    pub fn select(&mut self, pick: CrosshairEntry) -> SelectionChange {
        let Some(last) = self.entries.last().copied() else {
            self.entries.push(pick);
            return SelectionChange::Added(pick);
        };

        if self.all_confirmed() {
            if self.entries.len() < MAX_SELECTIONS && !self.contains(pick.index) {
                self.entries.push(pick);
                return SelectionChange::Added(pick);
            }
            return SelectionChange::Ignored;
        }

        // Last slot is pending
        if last.index == pick.index {
            self.entries.pop();
            return SelectionChange::Removed(last);
        }
        if self.contains(pick.index) {
            return SelectionChange::Ignored;
        }
        let slot = self.entries.len() - 1;
        self.entries[slot] = pick;
        SelectionChange::Replaced {
            old: last,
            new: pick,
        }
    }

    /// Confirm the pending slot (driven by external puzzle logic)
    pub fn increment_match(&mut self) {
        if self.match_index < self.entries.len() as i32 - 1 && self.match_index < 2 {
            self.match_index += 1;
        }
    }

    /// Walk a confirmation back
    pub fn decrement_match(&mut self) {
        if self.match_index > -1 {
            self.match_index -= 1;
        }
    }

    /// Draw crosshair glyphs over the selected stars. XOR so that a second
    /// identical pass erases them cleanly.
    pub fn draw(&self, surface: &mut SurfaceArea<'_>, rgb: u32) {
        surface.set_pen(rgb);
        let prior = surface.set_mode(BlendMode::Xor);
        for entry in &self.entries {
            let (x, y) = (entry.screen.0.round() as i32, entry.screen.1.round() as i32);
            surface.draw_line((x - 6) as f64, y as f64, (x - 2) as f64, y as f64);
            surface.draw_line((x + 2) as f64, y as f64, (x + 6) as f64, y as f64);
            surface.draw_line(x as f64, (y - 6) as f64, x as f64, (y - 2) as f64);
            surface.draw_line(x as f64, (y + 2) as f64, x as f64, (y + 6) as f64);
        }
        surface.set_mode(prior);
    }

    /// Refresh stored screen positions after the camera moved
    pub fn reproject(&mut self, catalog: &Catalog, camera: &Camera) {
        for entry in &mut self.entries {
            if let Some(star) = catalog.entry(entry.index) {
                if let Some(projected) = camera.project(star.position) {
                    entry.screen = projected;
                }
            }
        }
    }
}

impl Default for Crosshairs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::starfield::catalog::{StarColor, StarEntry, Thickness};
    use crate::starfield::math::Vector3;

    fn entry(index: usize) -> CrosshairEntry {
        CrosshairEntry {
            screen: (10.0 * index as f64, 20.0),
            index,
        }
    }

    fn star_at(position: Vector3) -> StarEntry {
        StarEntry {
            position,
            color: StarColor::new(255, 255, 255),
            thickness: Thickness::Thin,
            aux: [0; 5],
        }
    }

    #[test]
    fn test_append_up_to_three() {
        let mut sel = Crosshairs::new();
        assert_eq!(sel.select(entry(0)), SelectionChange::Added(entry(0)));
        sel.increment_match();
        assert_eq!(sel.select(entry(1)), SelectionChange::Added(entry(1)));
        sel.increment_match();
        assert_eq!(sel.select(entry(2)), SelectionChange::Added(entry(2)));
        sel.increment_match();
        assert_eq!(sel.len(), 3);
        assert!(sel.is_solved());
        // Full and confirmed: further clicks ignored
        assert_eq!(sel.select(entry(3)), SelectionChange::Ignored);
    }

    #[test]
    fn test_toggle_off_pending() {
        let mut sel = Crosshairs::new();
        sel.select(entry(4));
        // Same star again removes it
        assert_eq!(sel.select(entry(4)), SelectionChange::Removed(entry(4)));
        assert!(sel.is_empty());
        assert_eq!(sel.match_index(), -1);
    }

    #[test]
    fn test_replace_pending_keeps_confirmed() {
        let mut sel = Crosshairs::new();
        sel.select(entry(0));
        sel.increment_match();
        sel.select(entry(1));
        sel.increment_match();
        sel.select(entry(2));

        // Third slot pending: clicking a different star replaces only it
        let change = sel.select(entry(7));
        assert_eq!(
            change,
            SelectionChange::Replaced {
                old: entry(2),
                new: entry(7)
            }
        );
        assert_eq!(sel.len(), 3);
        assert_eq!(sel.entries()[0], entry(0));
        assert_eq!(sel.entries()[1], entry(1));
        assert_eq!(sel.entries()[2], entry(7));
        assert_eq!(sel.match_index(), 1);
    }

    #[test]
    fn test_toggle_then_reselect_restores_prior_state() {
        let mut sel = Crosshairs::new();
        sel.select(entry(0));
        sel.increment_match();
        sel.select(entry(5));
        let before = sel.entries().to_vec();

        sel.select(entry(5)); // toggle off
        assert_eq!(sel.len(), 1);
        sel.select(entry(5)); // back on
        assert_eq!(sel.entries(), before.as_slice());
    }

    #[test]
    fn test_duplicate_of_confirmed_ignored() {
        let mut sel = Crosshairs::new();
        sel.select(entry(0));
        sel.increment_match();
        sel.select(entry(1));
        // Star 0 is confirmed in slot 0; clicking it cannot move it into
        // the pending slot
        assert_eq!(sel.select(entry(0)), SelectionChange::Ignored);
        assert_eq!(sel.entries()[1], entry(1));
    }

    #[test]
    fn test_match_counter_bounds() {
        let mut sel = Crosshairs::new();
        sel.decrement_match();
        assert_eq!(sel.match_index(), -1);
        sel.select(entry(0));
        sel.increment_match();
        sel.increment_match(); // no second entry to confirm
        assert_eq!(sel.match_index(), 0);
        assert!(!sel.is_solved());
    }

    #[test]
    fn test_pick_star_box_and_distance_bounds() {
        let catalog = Catalog::from_entries(vec![
            // In the pickable shell, dead ahead
            star_at(Vector3::new(0.0, 0.0, 2.0e6)),
            // Too close: closeup territory
            star_at(Vector3::new(0.0, 0.0, 500000.0)),
            // Too far: beyond the rendering shell
            star_at(Vector3::new(0.0, 0.0, 2.0e9)),
        ]);
        let camera = Camera::new(600, 340);

        let hit = pick_star(&catalog, &camera, (300.0, 170.0));
        assert_eq!(hit.map(|(i, _)| i), Some(0));

        // Just outside the 4x4 box
        assert!(pick_star(&catalog, &camera, (303.5, 170.0)).is_none());
        // Inside it
        assert!(pick_star(&catalog, &camera, (301.9, 168.1)).is_some());
    }

    #[test]
    fn test_pick_star_first_match_wins() {
        // Two stars projecting to the same pixel; catalog order decides
        let catalog = Catalog::from_entries(vec![
            star_at(Vector3::new(0.0, 0.0, 3.0e6)),
            star_at(Vector3::new(0.0, 0.0, 4.0e6)),
        ]);
        let camera = Camera::new(600, 340);
        let hit = pick_star(&catalog, &camera, (300.0, 170.0));
        assert_eq!(hit.map(|(i, _)| i), Some(0));
    }
}
