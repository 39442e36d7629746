//! Starhelm: starfield navigation engine
//!
//! Software-rendered 3D star chart in the spirit of late-90s game engines:
//! - ~900-star catalog projected through a pose-based camera
//! - animated flights with quartic ease ramps and slerp reorientation
//! - three-phase star locking with brute-force settle scans
//! - screen-space star picking with a 3-slot match puzzle
//! - procedural sparkle closeups once the camera gets near a star

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod app;
mod starfield;

use std::fs::File;
use std::path::Path;

use macroquad::prelude::*;

use app::{load_config, NavSession, SessionConfig};
use starfield::{
    load_camera, save_camera, Camera, Catalog, ConstellationSet, Matrix3, PixelBuffer, StarField,
    SurfaceArea, Viewport, RAD_PER_DEG,
};

const CONFIG_PATH: &str = "assets/session.ron";
const CAMERA_STATE_PATH: &str = "camera_state.bin";
const SCREENSHOT_PATH: &str = "starfield.png";

/// Bottom strip reserved for the status line
const STATUS_BAR_HEIGHT: f32 = 28.0;

/// Orientation nudge per arrow-key frame, radians
const NUDGE_STEP: f64 = 0.6 * RAD_PER_DEG;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Starhelm v{}", VERSION),
        window_width: 600 * 2,
        window_height: 340 * 2 + STATUS_BAR_HEIGHT as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Load the configured catalog, or synthesize one when no path is set.
/// A configured path that fails to load is fatal: the subsystem cannot
/// function without its star data.
fn build_catalog(config: &SessionConfig) -> Catalog {
    match &config.catalog_path {
        Some(path) => {
            let mut file = File::open(path)
                .unwrap_or_else(|e| panic!("cannot open catalog {}: {}", path.display(), e));
            match Catalog::load(&mut file) {
                Ok(catalog) => {
                    println!("Loaded {} stars from {}", catalog.len(), path.display());
                    catalog
                }
                Err(e) => panic!("cannot load catalog {}: {}", path.display(), e),
            }
        }
        None => {
            let catalog = Catalog::synthetic(config.demo_seed, config.demo_star_count);
            println!("Using synthetic catalog ({} stars)", catalog.len());
            catalog
        }
    }
}

fn build_constellations(config: &SessionConfig, catalog: &Catalog) -> ConstellationSet {
    match &config.constellation_path {
        Some(path) => {
            let loaded = File::open(path)
                .map_err(starfield::CatalogError::from)
                .and_then(|mut f| ConstellationSet::load(&mut f));
            match loaded {
                Ok(set) => {
                    println!("Loaded {} constellation lines", set.lines().len());
                    set
                }
                Err(e) => {
                    eprintln!("Failed to load constellations: {}, using synthetic art", e);
                    ConstellationSet::synthetic(catalog, config.demo_seed, 24)
                }
            }
        }
        None => ConstellationSet::synthetic(catalog, config.demo_seed, 24),
    }
}

fn build_session(config: &SessionConfig) -> NavSession {
    let catalog = build_catalog(config);
    let constellations = build_constellations(config, &catalog);
    let field = StarField::new(catalog, constellations, config.demo_seed);

    let mut viewport = Viewport::new(config.viewport_width, config.viewport_height);
    viewport.set_fov(config.fov_x_deg, config.fov_y_deg);
    let mut camera = Camera::with_viewport(viewport);
    camera.set_position(config.start_position);
    camera.clear_moved();

    NavSession::new(camera, field, config.puzzle_targets.clone())
}

/// Destination rect for the starfield texture: aspect-preserving scale,
/// centered, leaving the status strip free
fn field_dest_rect(buf_w: f32, buf_h: f32) -> (f32, f32, f32, f32) {
    let avail_w = screen_width();
    let avail_h = screen_height() - STATUS_BAR_HEIGHT;
    let scale = (avail_w / buf_w).min(avail_h / buf_h);
    let dw = buf_w * scale;
    let dh = buf_h * scale;
    ((avail_w - dw) * 0.5, (avail_h - dh) * 0.5, dw, dh)
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = match load_config(CONFIG_PATH) {
        Ok(config) => {
            println!("Loaded session config from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            if Path::new(CONFIG_PATH).exists() {
                eprintln!("Bad config {}: {}, using defaults", CONFIG_PATH, e);
            }
            SessionConfig::default()
        }
    };

    let mut session = build_session(&config);

    let buf_w = config.viewport_width;
    let buf_h = config.viewport_height;
    let mut buffer = PixelBuffer::new(buf_w, buf_h);
    let mut rgba: Vec<u8> = Vec::new();
    let mut image = Image::gen_image_color(buf_w as u16, buf_h as u16, BLACK);
    let texture = Texture2D::from_image(&image);
    texture.set_filter(FilterMode::Nearest);

    println!("=== Starhelm ===");
    println!("click: select star | L: lock | U: unlock | F: fly | C: constellations");
    println!("arrows: look | H: home | S/R: save/restore camera | P: screenshot | O: open catalog");

    loop {
        let delta = get_frame_time() as f64;

        // Map the window mouse position back into buffer coordinates
        let (dx, dy, dw, dh) = field_dest_rect(buf_w as f32, buf_h as f32);
        let (mx, my) = mouse_position();
        let buffer_point = if mx >= dx && mx < dx + dw && my >= dy && my < dy + dh {
            Some((
                ((mx - dx) / dw * buf_w as f32) as f64,
                ((my - dy) / dh * buf_h as f32) as f64,
            ))
        } else {
            None
        };

        if let Some(point) = buffer_point {
            if is_mouse_button_pressed(MouseButton::Left) {
                session.handle_click(point);
            } else {
                session.handle_hover(point);
            }
        }

        if is_key_pressed(KeyCode::L) {
            session.lock_next();
        }
        if is_key_pressed(KeyCode::U) {
            session.unlock();
        }
        if is_key_pressed(KeyCode::F) {
            session.fly_to_selection();
        }
        if is_key_pressed(KeyCode::C) {
            session.field.toggle_constellations();
        }
        if is_key_pressed(KeyCode::H) {
            // Home view; refused while locked, like any direct pose write
            session.camera.set_position(config.start_position);
            session
                .camera
                .set_forward(starfield::Vector3::new(0.0, 0.0, 1.0));
            if session.camera.is_locked() {
                session.set_status("Unlock first", 2.0);
            } else {
                session.set_status("View reset", 2.0);
            }
        }

        // Orientation nudges; the camera refuses these while locked
        let mut nudge: Option<Matrix3> = None;
        if is_key_down(KeyCode::Left) {
            nudge = Some(Matrix3::rotation_y(-NUDGE_STEP));
        }
        if is_key_down(KeyCode::Right) {
            nudge = Some(Matrix3::rotation_y(NUDGE_STEP));
        }
        if is_key_down(KeyCode::Up) {
            nudge = Some(Matrix3::rotation_x(NUDGE_STEP));
        }
        if is_key_down(KeyCode::Down) {
            nudge = Some(Matrix3::rotation_x(-NUDGE_STEP));
        }
        if let Some(rot) = nudge {
            let orientation = session.camera.orientation().multiply(&rot);
            session.camera.set_orientation(orientation);
        }

        if is_key_pressed(KeyCode::S) {
            match File::create(CAMERA_STATE_PATH)
                .map_err(starfield::PersistError::from)
                .and_then(|mut f| save_camera(&mut f, &session.camera))
            {
                Ok(()) => session.set_status("Camera state saved", 2.0),
                Err(e) => {
                    eprintln!("Save failed: {}", e);
                    session.set_status("Save failed", 3.0);
                }
            }
        }
        if is_key_pressed(KeyCode::R) {
            match File::open(CAMERA_STATE_PATH)
                .map_err(starfield::PersistError::from)
                .and_then(|mut f| load_camera(&mut f, &mut session.camera))
            {
                Ok(()) => session.set_status("Camera state restored", 2.0),
                Err(e) => {
                    eprintln!("Restore failed: {}", e);
                    session.set_status("Restore failed", 3.0);
                }
            }
        }
        if is_key_pressed(KeyCode::P) {
            buffer.write_rgba(&mut rgba);
            match image::RgbaImage::from_raw(buf_w as u32, buf_h as u32, rgba.clone()) {
                Some(shot) => match shot.save(SCREENSHOT_PATH) {
                    Ok(()) => session.set_status("Screenshot saved", 2.0),
                    Err(e) => {
                        eprintln!("Screenshot failed: {}", e);
                        session.set_status("Screenshot failed", 3.0);
                    }
                },
                None => session.set_status("Screenshot failed", 3.0),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            if is_key_pressed(KeyCode::O) {
                let dialog = rfd::FileDialog::new().add_filter("Star catalog", &["bin", "dat"]);
                if let Some(path) = dialog.pick_file() {
                    let loaded = File::open(&path)
                        .map_err(starfield::CatalogError::from)
                        .and_then(|mut f| Catalog::load(&mut f));
                    match loaded {
                        Ok(catalog) => {
                            println!("Loaded {} stars from {}", catalog.len(), path.display());
                            let constellations =
                                ConstellationSet::synthetic(&catalog, config.demo_seed, 24);
                            let field = StarField::new(catalog, constellations, config.demo_seed);
                            let mut viewport = Viewport::new(buf_w, buf_h);
                            viewport.set_fov(config.fov_x_deg, config.fov_y_deg);
                            let mut camera = Camera::with_viewport(viewport);
                            camera.set_position(config.start_position);
                            camera.clear_moved();
                            session =
                                NavSession::new(camera, field, config.puzzle_targets.clone());
                            session.set_status("Catalog loaded", 3.0);
                        }
                        Err(e) => {
                            eprintln!("Failed to load {}: {}", path.display(), e);
                            session.set_status("Catalog load failed", 3.0);
                        }
                    }
                }
            }
        }

        session.update(delta);

        // Software render, then blit through a texture
        buffer.clear(0);
        {
            let mut area = SurfaceArea::new(&mut buffer);
            session.field.render(&mut area, &session.camera);
            session.crosshairs.draw(&mut area, 0x00ffff00);
        }
        buffer.write_rgba(&mut rgba);
        image.bytes.copy_from_slice(&rgba);
        texture.update(&image);

        clear_background(Color::from_rgba(8, 8, 12, 255));
        draw_texture_ex(
            &texture,
            dx,
            dy,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(dw, dh)),
                ..Default::default()
            },
        );

        // Status strip
        let base_y = screen_height() - 8.0;
        let lock = session.camera.lock_level();
        let left_text = if session.is_solved() {
            format!("LOCK {}/3 | SOLVED", lock)
        } else {
            format!(
                "LOCK {}/3 | MATCH {}",
                lock,
                session.crosshairs.match_index() + 1
            )
        };
        draw_text(&left_text, 10.0, base_y, 20.0, GREEN);
        if let Some(status) = session.status() {
            draw_text(status, 220.0, base_y, 20.0, LIGHTGRAY);
        }

        next_frame().await;
    }
}
