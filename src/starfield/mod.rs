//! Starfield navigation subsystem
//!
//! A 3D camera over an immutable star catalog: projection of stars and
//! constellation art into a software surface, animated flights between
//! poses, star locking, and screen-space star selection.
//!
//! Single-threaded and frame-driven: the app calls
//! `Camera::update_position` then `StarField::render` once per tick.

mod camera;
mod catalog;
mod closeup;
mod constellations;
mod field;
mod markers;
mod math;
mod motion;
mod persist;
mod pose;
mod selection;
mod surface;
mod transform;
mod viewport;

pub use camera::{Camera, CameraEvent, RelativeFrame};
pub use catalog::{Catalog, CatalogError, StarColor, StarEntry, Thickness, RESOURCE_MAGIC};
pub use closeup::{StarCloseup, CLOSEUP_DISTANCE_SQ, GLINT_COUNT};
pub use constellations::{ConstellationLine, ConstellationSet};
pub use field::StarField;
pub use markers::StarMarkers;
pub use math::{Matrix3, Vector3, RAD_PER_DEG};
pub use motion::{
    MarkedMotion, MotionControl, MotionState, OrientationChanger, SpeedTable, UnmarkedMotion,
    ORIENTATION_BLEND_STEP, SPEED_TABLE_SIZE,
};
pub use persist::{load_camera, save_camera, PersistError};
pub use pose::Pose;
pub use selection::{pick_star, CrosshairEntry, Crosshairs, SelectionChange, MAX_SELECTIONS};
pub use surface::{BlendMode, PixelBuffer, SurfaceArea};
pub use transform::RotTransform;
pub use viewport::{Viewport, DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_LOCKED_STARS};
