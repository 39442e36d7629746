//! Ghost markers over the main starfield
//!
//! Each locked or tentatively selected star keeps a small box marker on
//! the field so the player can find it again after the camera flies.
//! Drawn XOR, so re-drawing the same frame erases them.

use super::camera::Camera;
use super::math::Vector3;
use super::surface::{BlendMode, SurfaceArea};

const MARKER_HALF: i32 = 4;
const MARKER_COLOR: u32 = 0x0000ff00;

#[derive(Debug, Clone, Default)]
pub struct StarMarkers {
    positions: Vec<Vector3>,
}

impl StarMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, v: Vector3) {
        self.positions.push(v);
    }

    /// Remove the marker at `v` if present (selection toggled off)
    pub fn remove(&mut self, v: Vector3) {
        if let Some(slot) = self.positions.iter().position(|p| *p == v) {
            self.positions.remove(slot);
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn draw(&self, surface: &mut SurfaceArea<'_>, camera: &Camera) {
        if self.positions.is_empty() {
            return;
        }
        surface.set_pen(MARKER_COLOR);
        let prior = surface.set_mode(BlendMode::Xor);
        for &pos in &self.positions {
            if let Some((sx, sy)) = camera.project(pos) {
                let x = sx.round() as i32;
                let y = sy.round() as i32;
                surface.draw_rect(
                    x - MARKER_HALF,
                    y - MARKER_HALF,
                    MARKER_HALF * 2 + 1,
                    MARKER_HALF * 2 + 1,
                );
            }
        }
        surface.set_mode(prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_remove() {
        let mut markers = StarMarkers::new();
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(4.0, 5.0, 6.0);
        markers.push(a);
        markers.push(b);
        assert_eq!(markers.len(), 2);
        markers.remove(a);
        assert_eq!(markers.len(), 1);
        markers.remove(a); // absent: no-op
        assert_eq!(markers.len(), 1);
        markers.clear();
        assert!(markers.is_empty());
    }

    #[test]
    fn test_draw_marks_and_erases() {
        use crate::starfield::surface::PixelBuffer;
        use crate::starfield::camera::Camera;

        let mut markers = StarMarkers::new();
        markers.push(Vector3::new(0.0, 0.0, 1.0e6));
        let camera = Camera::new(600, 340);

        let mut buf = PixelBuffer::new(600, 340);
        {
            let mut area = SurfaceArea::new(&mut buf);
            markers.draw(&mut area, &camera);
        }
        assert!(buf.pixels().iter().any(|&p| p != 0));
        {
            let mut area = SurfaceArea::new(&mut buf);
            markers.draw(&mut area, &camera);
        }
        assert!(buf.pixels().iter().all(|&p| p == 0));
    }
}
