//! Per-frame starfield rendering
//!
//! Walks the shared catalog once per frame: stars inside the closeup shell
//! hand off to the sparkle renderer, stars beyond the far shell are
//! skipped, and everything in between draws as a one- or five-pixel glyph.
//! Constellation art goes underneath, ghost markers on top.

use super::camera::Camera;
use super::catalog::{Catalog, Thickness};
use super::closeup::{StarCloseup, CLOSEUP_DISTANCE_SQ};
use super::constellations::ConstellationSet;
use super::markers::StarMarkers;
use super::surface::{BlendMode, SurfaceArea};

/// Squared camera-space distance beyond which stars are not drawn
const FAR_SHELL_SQ: f64 = 1.0e9 * 1.0e9;

/// Glyphs start dimming past this squared distance, down to `FADE_FLOOR`
/// at the far shell
const FADE_START_SQ: f64 = 1.0e16;
const FADE_FLOOR: f64 = 0.3;

const CONSTELLATION_COLOR: u32 = 0x00103060;

/// Brightness factor for a star at squared distance `dist_sq`
fn glyph_intensity(dist_sq: f64) -> f64 {
    if dist_sq <= FADE_START_SQ {
        return 1.0;
    }
    let span = (dist_sq.sqrt() - FADE_START_SQ.sqrt()) / (FAR_SHELL_SQ.sqrt() - FADE_START_SQ.sqrt());
    1.0 - (1.0 - FADE_FLOOR) * span.clamp(0.0, 1.0)
}

pub struct StarField {
    catalog: Catalog,
    constellations: ConstellationSet,
    markers: StarMarkers,
    closeup: StarCloseup,
    show_constellations: bool,
}

impl StarField {
    pub fn new(catalog: Catalog, constellations: ConstellationSet, closeup_seed: u64) -> Self {
        Self {
            catalog,
            constellations,
            markers: StarMarkers::new(),
            closeup: StarCloseup::new(closeup_seed),
            show_constellations: true,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn markers(&self) -> &StarMarkers {
        &self.markers
    }

    pub fn markers_mut(&mut self) -> &mut StarMarkers {
        &mut self.markers
    }

    pub fn constellations_shown(&self) -> bool {
        self.show_constellations
    }

    pub fn toggle_constellations(&mut self) {
        self.show_constellations = !self.show_constellations;
    }

    /// Render one frame into `surface`
    pub fn render(&mut self, surface: &mut SurfaceArea<'_>, camera: &Camera) {
        self.closeup.tick();

        if self.show_constellations && !self.constellations.is_empty() {
            self.constellations.draw(surface, camera, CONSTELLATION_COLOR);
        }

        let pose = camera.pose();
        let viewport = camera.viewport();
        let prior = surface.set_mode(BlendMode::Solid);
        for entry in self.catalog.entries() {
            let cam = pose.transform(entry.position);
            let dist_sq = cam.magnitude_squared();
            if dist_sq < CLOSEUP_DISTANCE_SQ {
                self.closeup.draw(surface, camera, entry, cam);
                surface.set_mode(BlendMode::Solid);
                continue;
            }
            if dist_sq >= FAR_SHELL_SQ {
                continue;
            }
            let Some((sx, sy)) = viewport.project(cam) else {
                continue;
            };
            let x = sx.round() as i32;
            let y = sy.round() as i32;
            surface.set_pen(entry.color.scaled(glyph_intensity(dist_sq)).to_rgb());
            surface.plot(x, y);
            if entry.thickness == Thickness::Thick {
                surface.plot(x - 1, y);
                surface.plot(x + 1, y);
                surface.plot(x, y - 1);
                surface.plot(x, y + 1);
            }
        }
        surface.set_mode(prior);

        self.markers.draw(surface, camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::starfield::catalog::{StarColor, StarEntry};
    use crate::starfield::math::Vector3;
    use crate::starfield::surface::PixelBuffer;

    fn star_at(position: Vector3, thickness: Thickness) -> StarEntry {
        StarEntry {
            position,
            color: StarColor::new(255, 255, 255),
            thickness,
            aux: [0; 5],
        }
    }

    fn render_once(field: &mut StarField, camera: &Camera) -> PixelBuffer {
        let mut buf = PixelBuffer::new(600, 340);
        let mut area = SurfaceArea::new(&mut buf);
        field.render(&mut area, camera);
        buf
    }

    #[test]
    fn test_star_glyph_lands_at_projection() {
        let catalog = Catalog::from_entries(vec![star_at(
            Vector3::new(0.0, 0.0, 2.0e6),
            Thickness::Thin,
        )]);
        let mut field = StarField::new(catalog, ConstellationSet::default(), 1);
        let camera = Camera::new(600, 340);
        let buf = render_once(&mut field, &camera);
        assert_eq!(buf.pixel(300, 170), Some(0x00ffffff));
    }

    #[test]
    fn test_thick_star_draws_plus() {
        let catalog = Catalog::from_entries(vec![star_at(
            Vector3::new(0.0, 0.0, 2.0e6),
            Thickness::Thick,
        )]);
        let mut field = StarField::new(catalog, ConstellationSet::default(), 1);
        let camera = Camera::new(600, 340);
        let buf = render_once(&mut field, &camera);
        for (x, y) in [(300, 170), (299, 170), (301, 170), (300, 169), (300, 171)] {
            assert_eq!(buf.pixel(x, y), Some(0x00ffffff));
        }
        assert_eq!(buf.pixel(299, 169), Some(0));
    }

    #[test]
    fn test_far_star_skipped() {
        let catalog = Catalog::from_entries(vec![star_at(
            Vector3::new(0.0, 0.0, 2.0e9),
            Thickness::Thin,
        )]);
        let mut field = StarField::new(catalog, ConstellationSet::default(), 1);
        let camera = Camera::new(600, 340);
        let buf = render_once(&mut field, &camera);
        assert!(buf.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_near_star_uses_closeup() {
        // Inside the closeup shell: glyph pixel replaced by the mesh
        let catalog = Catalog::from_entries(vec![star_at(
            Vector3::new(0.0, 0.0, 50000.0),
            Thickness::Thin,
        )]);
        let mut field = StarField::new(catalog, ConstellationSet::default(), 1);
        let camera = Camera::new(600, 340);
        let buf = render_once(&mut field, &camera);
        // The sparkle mesh spans many pixels around the center
        let lit = buf.pixels().iter().filter(|&&p| p != 0).count();
        assert!(lit > 20, "expected a sparkle cloud, got {} lit pixels", lit);
    }

    #[test]
    fn test_glyph_intensity_fades_with_distance() {
        assert_eq!(glyph_intensity(4.0e12), 1.0);
        assert_eq!(glyph_intensity(FADE_START_SQ), 1.0);
        let near = glyph_intensity(4.0e16);
        let far = glyph_intensity(6.4e17);
        assert!(near < 1.0 && far < near);
        assert!((glyph_intensity(FAR_SHELL_SQ) - FADE_FLOOR).abs() < 1.0e-9);
    }

    #[test]
    fn test_markers_drawn_on_top() {
        let catalog = Catalog::from_entries(vec![star_at(
            Vector3::new(0.0, 0.0, 2.0e6),
            Thickness::Thin,
        )]);
        let mut field = StarField::new(catalog, ConstellationSet::default(), 1);
        field.markers_mut().push(Vector3::new(0.0, 0.0, 2.0e6));
        let camera = Camera::new(600, 340);
        let buf = render_once(&mut field, &camera);
        // Box outline offset from the star pixel
        assert!(buf.pixel(296, 166).is_some());
        assert_ne!(buf.pixel(296, 166), Some(0));
    }
}
