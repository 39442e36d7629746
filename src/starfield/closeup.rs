//! Close-up sparkle rendering
//!
//! Once the camera is near a star, the single-glyph rendering hands over
//! to a procedural "sparkle cloud": a lat/long wireframe sphere spun by a
//! running tick counter, dressed with pulsing glint pixels. All of the
//! randomness is synthesized once at setup from a seed, so every frame of
//! a session replays the same cloud.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::camera::Camera;
use super::catalog::{StarColor, StarEntry};
use super::math::{Matrix3, Vector3};
use super::surface::{BlendMode, SurfaceArea};

/// Squared camera-space distance below which a star renders as a closeup
pub const CLOSEUP_DISTANCE_SQ: f64 = 6.0e9;

/// Pre-randomized glint pool size
pub const GLINT_COUNT: usize = 1284;

/// World-space radius of the sparkle cloud
const SPARKLE_RADIUS: f64 = 9000.0;

/// Grid resolutions (width, height) per distance tier, coarsest first
const GRID_TIERS: [(usize, usize); 5] = [(8, 5), (12, 7), (16, 9), (20, 11), (24, 13)];

/// Squared-distance tier boundaries inside the closeup shell; crossing one
/// while approaching switches to the next finer grid
const TIER_BOUNDS: [f64; 4] = [4.8e9, 3.6e9, 2.4e9, 1.2e9];

/// Per-tick spin rates about the Y and X axes
const SPIN_RATE_Y: f64 = 0.02;
const SPIN_RATE_X: f64 = 0.011;

/// One pre-randomized sparkle
#[derive(Debug, Clone, Copy)]
struct Glint {
    color: StarColor,
    phase: f64,
    amplitude: f64,
    rate: f64,
}

/// One wireframe resolution tier
#[derive(Debug, Clone)]
struct GridEntry {
    width: usize,
    height: usize,
    /// Unit-sphere vertices: north pole, (height-2) rings of width, south pole
    vertices: Vec<Vector3>,
    /// Index pairs into `vertices`
    edges: Vec<(u32, u32)>,
}

/// Vertex index of ring `ring`, column `col` (poles sit outside the rings)
fn grid_index(width: usize, ring: usize, col: usize) -> u32 {
    (1 + ring * width + col) as u32
}

fn setup_entry(width: usize, height: usize) -> GridEntry {
    assert!(width >= 2 && height >= 3);
    let ring_count = height - 2;

    let mut vertices = Vec::with_capacity(ring_count * width + 2);
    vertices.push(Vector3::new(0.0, 1.0, 0.0));
    for ring in 0..ring_count {
        let lat = std::f64::consts::PI * (ring + 1) as f64 / (height - 1) as f64;
        let (sin_lat, cos_lat) = lat.sin_cos();
        for col in 0..width {
            let lon = std::f64::consts::TAU * col as f64 / width as f64;
            vertices.push(Vector3::new(
                sin_lat * lon.cos(),
                cos_lat,
                sin_lat * lon.sin(),
            ));
        }
    }
    vertices.push(Vector3::new(0.0, -1.0, 0.0));
    debug_assert_eq!(vertices.len(), (height - 2) * width + 2);

    let south = (ring_count * width + 1) as u32;
    let mut edges = Vec::with_capacity(width * (2 * height - 3));
    // Pole fan down to the first ring
    for col in 0..width {
        edges.push((0, grid_index(width, 0, col)));
    }
    // Ring loops
    for ring in 0..ring_count {
        for col in 0..width {
            edges.push((
                grid_index(width, ring, col),
                grid_index(width, ring, (col + 1) % width),
            ));
        }
    }
    // Meridian segments between consecutive rings
    for ring in 0..ring_count.saturating_sub(1) {
        for col in 0..width {
            edges.push((
                grid_index(width, ring, col),
                grid_index(width, ring + 1, col),
            ));
        }
    }
    // Pole fan up from the last ring
    for col in 0..width {
        edges.push((grid_index(width, ring_count - 1, col), south));
    }
    debug_assert_eq!(edges.len(), width * (2 * height - 3));

    GridEntry {
        width,
        height,
        vertices,
        edges,
    }
}

pub struct StarCloseup {
    glints: Vec<Glint>,
    grids: Vec<GridEntry>,
    multiplier: u32,
}

impl StarCloseup {
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut glints = Vec::with_capacity(GLINT_COUNT);
        for _ in 0..GLINT_COUNT {
            glints.push(Glint {
                color: StarColor::new(
                    rng.gen_range(170..=255),
                    rng.gen_range(150..=255),
                    rng.gen_range(170..=255),
                ),
                phase: rng.gen_range(0.0..std::f64::consts::TAU),
                amplitude: rng.gen_range(0.4..1.0),
                rate: rng.gen_range(0.02..0.2),
            });
        }

        let grids = GRID_TIERS
            .iter()
            .map(|&(w, h)| setup_entry(w, h))
            .collect();

        Self {
            glints,
            grids,
            multiplier: 0,
        }
    }

    /// Advance the spin counter; called once per rendered frame
    pub fn tick(&mut self) {
        self.multiplier = self.multiplier.wrapping_add(1);
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Grid tier for a squared camera distance: finer as the star nears
    fn tier_for(dist_sq: f64) -> usize {
        TIER_BOUNDS.iter().filter(|&&bound| dist_sq < bound).count()
    }

    /// Render the sparkle cloud for `star`, already known to be within
    /// closeup range (`cam_space` is its camera-space position).
    pub fn draw(
        &self,
        surface: &mut SurfaceArea<'_>,
        camera: &Camera,
        star: &StarEntry,
        cam_space: Vector3,
    ) {
        let dist_sq = cam_space.magnitude_squared();
        let grid = &self.grids[Self::tier_for(dist_sq)];
        let ticks = self.multiplier as f64;
        let spin =
            Matrix3::rotation_y(ticks * SPIN_RATE_Y).multiply(&Matrix3::rotation_x(ticks * SPIN_RATE_X));

        let pose = camera.pose();
        let viewport = camera.viewport();

        // Project every grid vertex once; edges index into this
        let mut projected = Vec::with_capacity(grid.vertices.len());
        for v in &grid.vertices {
            let world = star.position + spin.transform(*v) * SPARKLE_RADIUS;
            projected.push(viewport.project(pose.transform(world)));
        }

        surface.set_pen(star.color.scaled(0.6).to_rgb());
        let prior = surface.set_mode(BlendMode::Or);
        for &(a, b) in &grid.edges {
            if let (Some(pa), Some(pb)) = (projected[a as usize], projected[b as usize]) {
                surface.draw_line(pa.0, pa.1, pb.0, pb.1);
            }
        }

        // Pulsing glints ride the vertices
        surface.set_mode(BlendMode::Solid);
        for (i, point) in projected.iter().enumerate() {
            let Some((sx, sy)) = point else { continue };
            let glint = &self.glints[i % GLINT_COUNT];
            let pulse = 0.5 + 0.5 * (glint.phase + ticks * glint.rate).sin();
            let intensity = glint.amplitude * pulse;
            if intensity < 0.15 {
                continue; // dark phase of the cycle
            }
            surface.set_pen(glint.color.scaled(intensity).to_rgb());
            surface.plot(sx.round() as i32, sy.round() as i32);
        }
        surface.set_mode(prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts_match_formulas() {
        for &(w, h) in &GRID_TIERS {
            let grid = setup_entry(w, h);
            assert_eq!(grid.vertices.len(), (h - 2) * w + 2, "vertices for {}x{}", w, h);
            assert_eq!(grid.edges.len(), w * (2 * h - 3), "edges for {}x{}", w, h);
            assert_eq!((grid.width, grid.height), (w, h));
            // All edge indices must be addressable
            for &(a, b) in &grid.edges {
                assert!((a as usize) < grid.vertices.len());
                assert!((b as usize) < grid.vertices.len());
            }
        }
    }

    #[test]
    fn test_grid_vertices_unit_sphere() {
        let grid = setup_entry(16, 9);
        for v in &grid.vertices {
            assert!((v.magnitude() - 1.0).abs() < 1.0e-9);
        }
    }

    #[test]
    fn test_glint_pool_size_and_determinism() {
        let a = StarCloseup::new(42);
        let b = StarCloseup::new(42);
        assert_eq!(a.glints.len(), GLINT_COUNT);
        for (ga, gb) in a.glints.iter().zip(&b.glints) {
            assert_eq!(ga.color, gb.color);
            assert_eq!(ga.phase, gb.phase);
        }
        assert_eq!(a.grids.len(), GRID_TIERS.len());
    }

    #[test]
    fn test_tier_selection() {
        assert_eq!(StarCloseup::tier_for(5.9e9), 0);
        assert_eq!(StarCloseup::tier_for(4.0e9), 1);
        assert_eq!(StarCloseup::tier_for(3.0e9), 2);
        assert_eq!(StarCloseup::tier_for(1.5e9), 3);
        assert_eq!(StarCloseup::tier_for(0.5e9), 4);
    }

    #[test]
    fn test_multiplier_ticks() {
        let mut closeup = StarCloseup::new(1);
        assert_eq!(closeup.multiplier(), 0);
        closeup.tick();
        closeup.tick();
        assert_eq!(closeup.multiplier(), 2);
    }
}
