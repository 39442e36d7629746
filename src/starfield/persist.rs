//! Camera state persistence
//!
//! Flat sequential float/int records, one leading format-version integer
//! per saved sub-object: first the viewport placement, then the lock set.
//! No other framing; readers and writers must agree on field order.

use std::fmt;
use std::io::{Read, Write};

use super::camera::Camera;
use super::math::{Matrix3, Vector3};

const PLACEMENT_VERSION: u32 = 1;
const LOCK_SET_VERSION: u32 = 1;

#[derive(Debug)]
pub enum PersistError {
    IoError(std::io::Error),
    /// A sub-object led with a version this build does not read
    BadVersion(u32),
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::IoError(e)
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::IoError(e) => write!(f, "IO error: {}", e),
            PersistError::BadVersion(v) => write!(f, "unknown camera state version {}", v),
        }
    }
}

impl std::error::Error for PersistError {}

fn write_u32<W: Write>(w: &mut W, v: u32) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f64<W: Write>(w: &mut W, v: f64) -> std::io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_vector<W: Write>(w: &mut W, v: Vector3) -> std::io::Result<()> {
    write_f64(w, v.x)?;
    write_f64(w, v.y)?;
    write_f64(w, v.z)
}

fn read_u32<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> std::io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_vector<R: Read>(r: &mut R) -> std::io::Result<Vector3> {
    Ok(Vector3::new(read_f64(r)?, read_f64(r)?, read_f64(r)?))
}

/// Write the camera's placement, clip planes and lock set
pub fn save_camera<W: Write>(w: &mut W, camera: &Camera) -> Result<(), PersistError> {
    let viewport = camera.viewport();

    write_u32(w, PLACEMENT_VERSION)?;
    write_vector(w, viewport.position())?;
    let orientation = viewport.orientation();
    write_vector(w, orientation.row1)?;
    write_vector(w, orientation.row2)?;
    write_vector(w, orientation.row3)?;
    write_f64(w, viewport.front_clip())?;
    write_f64(w, viewport.back_clip())?;

    write_u32(w, LOCK_SET_VERSION)?;
    write_u32(w, viewport.lock_level())?;
    let rows = viewport.locked_star_rows();
    write_vector(w, rows.row1)?;
    write_vector(w, rows.row2)?;
    write_vector(w, rows.row3)?;
    Ok(())
}

/// Restore a camera saved by `save_camera`. The motion controller is
/// rebuilt idle for the restored lock level; flights do not survive a
/// save/load cycle.
pub fn load_camera<R: Read>(r: &mut R, camera: &mut Camera) -> Result<(), PersistError> {
    let version = read_u32(r)?;
    if version != PLACEMENT_VERSION {
        return Err(PersistError::BadVersion(version));
    }
    let position = read_vector(r)?;
    let orientation = Matrix3::from_rows(read_vector(r)?, read_vector(r)?, read_vector(r)?);
    let front_clip = read_f64(r)?;
    let back_clip = read_f64(r)?;

    let version = read_u32(r)?;
    if version != LOCK_SET_VERSION {
        return Err(PersistError::BadVersion(version));
    }
    let lock_level = read_u32(r)?;
    let locked_rows = Matrix3::from_rows(read_vector(r)?, read_vector(r)?, read_vector(r)?);

    camera.restore(
        position,
        orientation,
        front_clip,
        back_clip,
        locked_rows,
        lock_level,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_round_trip_exact() {
        let mut camera = Camera::new(600, 340);
        camera.set_position(Vector3::new(123.5, -9000.25, 4.5e7));
        camera.set_orientation(Matrix3::rotation_y(0.77).multiply(&Matrix3::rotation_x(-0.2)));
        camera.add_locked_star(Vector3::new(1.0e6, 2.0e6, 3.0e6));
        camera.add_locked_star(Vector3::new(-5.0e5, 0.0, 8.0e6));

        let mut bytes = Vec::new();
        save_camera(&mut bytes, &camera).unwrap();

        let mut restored = Camera::new(600, 340);
        load_camera(&mut Cursor::new(&bytes), &mut restored).unwrap();

        assert_eq!(restored.position(), camera.position());
        assert_eq!(*restored.orientation(), *camera.orientation());
        assert_eq!(restored.lock_level(), 2);
        assert_eq!(
            restored.viewport().locked_star(0),
            Some(Vector3::new(1.0e6, 2.0e6, 3.0e6))
        );
        assert_eq!(
            restored.viewport().locked_star(1),
            Some(Vector3::new(-5.0e5, 0.0, 8.0e6))
        );
        assert!(restored.is_locked());
    }

    #[test]
    fn test_bad_version_rejected() {
        let mut bytes = Vec::new();
        write_u32(&mut bytes, 9).unwrap();
        let mut camera = Camera::new(600, 340);
        assert!(matches!(
            load_camera(&mut Cursor::new(&bytes), &mut camera),
            Err(PersistError::BadVersion(9))
        ));
    }

    #[test]
    fn test_truncated_stream_is_io_error() {
        let mut camera = Camera::new(600, 340);
        let mut bytes = Vec::new();
        save_camera(&mut bytes, &camera).unwrap();
        bytes.truncate(20);
        let mut restored = Camera::new(600, 340);
        assert!(matches!(
            load_camera(&mut Cursor::new(&bytes), &mut restored),
            Err(PersistError::IoError(_))
        ));
    }
}
