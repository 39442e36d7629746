//! Constellation line art
//!
//! Polylines over the celestial sphere, drawn through the rotation-only
//! camera frame so they stay glued to the star background regardless of
//! where the camera has flown.

use std::io::Read;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::camera::{Camera, RelativeFrame};
use super::catalog::{read_f64, read_u32, Catalog, CatalogError, RESOURCE_MAGIC};
use super::math::Vector3;
use super::surface::{BlendMode, SurfaceArea};

/// Directions are pushed out to this radius before projection so the line
/// art always sits behind the stars it frames.
const SKY_RADIUS: f64 = 5.0e8;

#[derive(Debug, Clone)]
pub struct ConstellationLine {
    pub points: Vec<Vector3>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstellationSet {
    lines: Vec<ConstellationLine>,
}

impl ConstellationSet {
    /// Load from a binary stream: `(u32 tag, u32 line_count)` then per line
    /// `u32 point_count` followed by `point_count` xyz f64 triples.
    /// Same resource discipline as the catalog; an empty set is allowed
    /// (the starfield works without line art).
    pub fn load<R: Read>(reader: &mut R) -> Result<ConstellationSet, CatalogError> {
        let tag = read_u32(reader)?;
        if tag != RESOURCE_MAGIC {
            return Err(CatalogError::BadMagic(tag));
        }
        let line_count = read_u32(reader)? as usize;

        let mut lines = Vec::with_capacity(line_count);
        for _ in 0..line_count {
            let point_count = read_u32(reader)? as usize;
            let mut points = Vec::with_capacity(point_count);
            for _ in 0..point_count {
                let x = read_f64(reader)?;
                let y = read_f64(reader)?;
                let z = read_f64(reader)?;
                points.push(Vector3::new(x, y, z));
            }
            lines.push(ConstellationLine { points });
        }
        Ok(ConstellationSet { lines })
    }

    pub fn lines(&self) -> &[ConstellationLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Synthetic line art for sessions without a resource file: short
    /// polylines chaining nearby-in-direction catalog stars.
    pub fn synthetic(catalog: &Catalog, seed: u64, line_count: usize) -> ConstellationSet {
        let stars = catalog.entries();
        if stars.is_empty() {
            return ConstellationSet::default();
        }
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut lines = Vec::with_capacity(line_count);
        for _ in 0..line_count {
            let mut index = rng.gen_range(0..stars.len());
            let mut points = vec![stars[index].position];
            let hops = rng.gen_range(2..6);
            for _ in 0..hops {
                // Greedy hop to the directionally closest unused-ish star
                let here = stars[index].position.normalized();
                let mut best = (f64::MIN, index);
                for _ in 0..12 {
                    let probe = rng.gen_range(0..stars.len());
                    if probe == index {
                        continue;
                    }
                    let align = here.dot(stars[probe].position.normalized());
                    if align > best.0 {
                        best = (align, probe);
                    }
                }
                index = best.1;
                points.push(stars[index].position);
            }
            lines.push(ConstellationLine { points });
        }
        ConstellationSet { lines }
    }

    /// Draw all polylines. Segments with an endpoint behind the camera are
    /// skipped; everything else clips against the surface bounds.
    pub fn draw(&self, surface: &mut SurfaceArea<'_>, camera: &Camera, rgb: u32) {
        surface.set_pen(rgb);
        let prior = surface.set_mode(BlendMode::Or);
        for line in &self.lines {
            let mut last: Option<(f64, f64)> = None;
            for point in &line.points {
                let dir = point.normalized() * SKY_RADIUS;
                let cam = camera.get_relative_pos(RelativeFrame::RotationOnly, dir);
                let projected = camera.viewport().project(cam);
                if let (Some(a), Some(b)) = (last, projected) {
                    surface.draw_line(a.0, a.1, b.0, b.1);
                }
                last = projected;
            }
        }
        surface.set_mode(prior);
    }
}
