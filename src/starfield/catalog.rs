//! Star catalog: immutable per-session star data
//!
//! Loaded once from a binary resource at startup and shared read-only by
//! the camera, renderer and selection logic.

use std::fmt;
use std::io::Read;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::math::Vector3;

/// Header tag every star resource must lead with
pub const RESOURCE_MAGIC: u32 = 100;

/// Bytes per catalog record: f64 x/y/z, u8 r/g/b, u8 thickness, u32 aux[5]
const RECORD_SIZE: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Thickness {
    Thin,
    Thick,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl StarColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed 0x00RRGGBB pixel value
    pub fn to_rgb(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Scale all channels by `intensity` (clamped to [0,1])
    pub fn scaled(self, intensity: f64) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self {
            r: (self.r as f64 * i) as u8,
            g: (self.g as f64 * i) as u8,
            b: (self.b as f64 * i) as u8,
        }
    }
}

/// One catalog row
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StarEntry {
    pub position: Vector3,
    pub color: StarColor,
    pub thickness: Thickness,
    /// Extra catalog fields carried through the resource but unused here
    pub aux: [u32; 5],
}

/// Error type for star resource loading
#[derive(Debug)]
pub enum CatalogError {
    IoError(std::io::Error),
    /// Leading tag did not match `RESOURCE_MAGIC`
    BadMagic(u32),
    /// Resource declared zero records
    Empty,
    /// Stream ended before the declared record count
    Truncated,
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::IoError(e)
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::IoError(e) => write!(f, "IO error: {}", e),
            CatalogError::BadMagic(tag) => {
                write!(f, "bad resource tag {} (expected {})", tag, RESOURCE_MAGIC)
            }
            CatalogError::Empty => write!(f, "resource declares zero records"),
            CatalogError::Truncated => write!(f, "resource ended mid-record"),
        }
    }
}

impl std::error::Error for CatalogError {}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32, CatalogError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| CatalogError::Truncated)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_f64<R: Read>(reader: &mut R) -> Result<f64, CatalogError> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|_| CatalogError::Truncated)?;
    Ok(f64::from_le_bytes(buf))
}

/// The star catalog. Read-only after load; single render thread assumed.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<StarEntry>,
}

impl Catalog {
    /// Load from a binary record stream: `(u32 tag, u32 count)` header then
    /// `count` fixed-size records. Fails hard on a bad tag or zero count;
    /// the subsystem cannot function without its data.
    pub fn load<R: Read>(reader: &mut R) -> Result<Catalog, CatalogError> {
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let tag = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if tag != RESOURCE_MAGIC {
            return Err(CatalogError::BadMagic(tag));
        }
        let count = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        if count == 0 {
            return Err(CatalogError::Empty);
        }

        let mut entries = Vec::with_capacity(count);
        let mut record = [0u8; RECORD_SIZE];
        for _ in 0..count {
            reader
                .read_exact(&mut record)
                .map_err(|_| CatalogError::Truncated)?;
            entries.push(decode_record(&record));
        }
        Ok(Catalog { entries })
    }

    pub fn from_entries(entries: Vec<StarEntry>) -> Catalog {
        Catalog { entries }
    }

    /// Record at `index`, or None when out of range. "No star" is a valid
    /// answer along draw paths, so this is not an error.
    pub fn entry(&self, index: usize) -> Option<&StarEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[StarEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seeded synthetic catalog for sessions without a resource file.
    ///
    /// Stars land on a spherical shell around the origin with color pulled
    /// toward white, a minority of thick glyphs, and zeroed aux fields.
    pub fn synthetic(seed: u64, count: usize) -> Catalog {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            // Uniform direction on the sphere
            let z: f64 = rng.gen_range(-1.0..1.0);
            let lon: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let flat = (1.0 - z * z).sqrt();
            let dir = Vector3::new(flat * lon.cos(), z, flat * lon.sin());
            let radius: f64 = rng.gen_range(2.0e6..8.0e8);

            let warm = rng.gen_range(160..=255) as u8;
            let color = StarColor::new(
                warm,
                rng.gen_range(150..=warm as u32) as u8,
                rng.gen_range(140..=255) as u8,
            );
            let thickness = if rng.gen_range(0..5) == 0 {
                Thickness::Thick
            } else {
                Thickness::Thin
            };
            entries.push(StarEntry {
                position: dir * radius,
                color,
                thickness,
                aux: [0; 5],
            });
        }
        Catalog { entries }
    }
}

fn decode_record(buf: &[u8; RECORD_SIZE]) -> StarEntry {
    let f = |off: usize| {
        f64::from_le_bytes([
            buf[off],
            buf[off + 1],
            buf[off + 2],
            buf[off + 3],
            buf[off + 4],
            buf[off + 5],
            buf[off + 6],
            buf[off + 7],
        ])
    };
    let u = |off: usize| u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);

    StarEntry {
        position: Vector3::new(f(0), f(8), f(16)),
        color: StarColor::new(buf[24], buf[25], buf[26]),
        thickness: if buf[27] == 0 {
            Thickness::Thin
        } else {
            Thickness::Thick
        },
        aux: [u(28), u(32), u(36), u(40), u(44)],
    }
}

#[cfg(test)]
pub(crate) fn encode_record(entry: &StarEntry) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&entry.position.x.to_le_bytes());
    buf[8..16].copy_from_slice(&entry.position.y.to_le_bytes());
    buf[16..24].copy_from_slice(&entry.position.z.to_le_bytes());
    buf[24] = entry.color.r;
    buf[25] = entry.color.g;
    buf[26] = entry.color.b;
    buf[27] = match entry.thickness {
        Thickness::Thin => 0,
        Thickness::Thick => 1,
    };
    for (i, aux) in entry.aux.iter().enumerate() {
        let off = 28 + i * 4;
        buf[off..off + 4].copy_from_slice(&aux.to_le_bytes());
    }
    buf
}
