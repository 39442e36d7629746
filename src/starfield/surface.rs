//! Software drawing surface
//!
//! `PixelBuffer` owns the packed 0x00RRGGBB pixels; `SurfaceArea` is a
//! drawing view over it with a blend mode. Every mode reduces to one
//! `(color, mask)` pair applied per pixel as `p' = (p & mask) ^ color`,
//! computed once in `set_mode` rather than per plot.

/// Framebuffer for the starfield renderer
pub struct PixelBuffer {
    pixels: Vec<u32>,
    width: i32,
    height: i32,
}

impl PixelBuffer {
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0);
        Self {
            pixels: vec![0; (width * height) as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Pixels per row; the buffer is tightly packed
    pub fn pitch(&self) -> i32 {
        self.width
    }

    pub fn clear(&mut self, rgb: u32) {
        self.pixels.fill(rgb);
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Append the buffer as RGBA bytes (alpha forced opaque) for texture
    /// upload or screenshot export
    pub fn write_rgba(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.pixels.len() * 4);
        for &p in &self.pixels {
            out.push((p >> 16) as u8);
            out.push((p >> 8) as u8);
            out.push(p as u8);
            out.push(255);
        }
    }
}

/// Pixel blend modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Direct write of the pen color
    Solid,
    /// Keep only pen bits: `p & pen`
    And,
    /// Add pen bits: `p | pen`
    Or,
    /// Clear pen bits: `p & !pen`
    AndNot,
    /// Toggle pen bits: `p ^ pen`; drawing twice restores the surface
    Xor,
}

/// Drawing view over a pixel buffer
pub struct SurfaceArea<'a> {
    buf: &'a mut PixelBuffer,
    mode: BlendMode,
    pen: u32,
    color: u32,
    mask: u32,
}

// Cohen-Sutherland region bits
const OUT_LEFT: u8 = 1;
const OUT_RIGHT: u8 = 2;
const OUT_BOTTOM: u8 = 4;
const OUT_TOP: u8 = 8;

impl<'a> SurfaceArea<'a> {
    pub fn new(buf: &'a mut PixelBuffer) -> Self {
        let mut area = Self {
            buf,
            mode: BlendMode::Solid,
            pen: 0x00ffffff,
            color: 0,
            mask: 0,
        };
        area.apply_mode();
        area
    }

    pub fn width(&self) -> i32 {
        self.buf.width()
    }

    pub fn height(&self) -> i32 {
        self.buf.height()
    }

    /// Set the pen color (0x00RRGGBB)
    pub fn set_pen(&mut self, rgb: u32) {
        self.pen = rgb & 0x00ffffff;
        self.apply_mode();
    }

    /// Switch blend mode, returning the previous one so callers can restore
    pub fn set_mode(&mut self, mode: BlendMode) -> BlendMode {
        let prior = self.mode;
        self.mode = mode;
        self.apply_mode();
        prior
    }

    fn apply_mode(&mut self) {
        let (mask, color) = match self.mode {
            BlendMode::Solid => (0, self.pen),
            BlendMode::And => (self.pen, 0),
            BlendMode::Or => (!self.pen & 0x00ffffff, self.pen),
            BlendMode::AndNot => (!self.pen & 0x00ffffff, 0),
            BlendMode::Xor => (0x00ffffff, self.pen),
        };
        self.mask = mask;
        self.color = color;
    }

    pub fn plot(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 || x >= self.buf.width || y >= self.buf.height {
            return;
        }
        let idx = (y * self.buf.width + x) as usize;
        let p = self.buf.pixels[idx];
        self.buf.pixels[idx] = (p & self.mask) ^ self.color;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.buf.width);
        let y1 = (y + h).min(self.buf.height);
        for py in y0..y1 {
            for px in x0..x1 {
                let idx = (py * self.buf.width + px) as usize;
                let p = self.buf.pixels[idx];
                self.buf.pixels[idx] = (p & self.mask) ^ self.color;
            }
        }
    }

    /// Outline of a rect, one pixel wide
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.draw_line(x as f64, y as f64, (x + w - 1) as f64, y as f64);
        self.draw_line(x as f64, (y + h - 1) as f64, (x + w - 1) as f64, (y + h - 1) as f64);
        self.draw_line(x as f64, y as f64, x as f64, (y + h - 1) as f64);
        self.draw_line((x + w - 1) as f64, y as f64, (x + w - 1) as f64, (y + h - 1) as f64);
    }

    fn out_code(&self, x: f64, y: f64) -> u8 {
        let mut code = 0;
        if x < 0.0 {
            code |= OUT_LEFT;
        } else if x > (self.buf.width - 1) as f64 {
            code |= OUT_RIGHT;
        }
        if y < 0.0 {
            code |= OUT_TOP;
        } else if y > (self.buf.height - 1) as f64 {
            code |= OUT_BOTTOM;
        }
        code
    }

    /// Clipped line draw: Cohen-Sutherland against the surface bounds in
    /// float space, then Bresenham on the clipped integer endpoints.
    pub fn draw_line(&mut self, mut x0: f64, mut y0: f64, mut x1: f64, mut y1: f64) {
        let xmax = (self.buf.width - 1) as f64;
        let ymax = (self.buf.height - 1) as f64;
        let mut code0 = self.out_code(x0, y0);
        let mut code1 = self.out_code(x1, y1);

        loop {
            if code0 | code1 == 0 {
                break;
            }
            if code0 & code1 != 0 {
                return; // fully outside
            }
            let code = if code0 != 0 { code0 } else { code1 };
            let (nx, ny);
            if code & OUT_TOP != 0 {
                nx = x0 + (x1 - x0) * (0.0 - y0) / (y1 - y0);
                ny = 0.0;
            } else if code & OUT_BOTTOM != 0 {
                nx = x0 + (x1 - x0) * (ymax - y0) / (y1 - y0);
                ny = ymax;
            } else if code & OUT_RIGHT != 0 {
                ny = y0 + (y1 - y0) * (xmax - x0) / (x1 - x0);
                nx = xmax;
            } else {
                ny = y0 + (y1 - y0) * (0.0 - x0) / (x1 - x0);
                nx = 0.0;
            }
            if code == code0 {
                x0 = nx;
                y0 = ny;
                code0 = self.out_code(x0, y0);
            } else {
                x1 = nx;
                y1 = ny;
                code1 = self.out_code(x1, y1);
            }
        }

        self.bresenham(
            x0.round() as i32,
            y0.round() as i32,
            x1.round() as i32,
            y1.round() as i32,
        );
    }

    fn bresenham(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut x = x0;
        let mut y = y0;

        loop {
            self.plot(x, y);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_write() {
        let mut buf = PixelBuffer::new(8, 8);
        let mut area = SurfaceArea::new(&mut buf);
        area.set_pen(0x123456);
        area.plot(3, 4);
        assert_eq!(buf.pixel(3, 4), Some(0x123456));
        assert_eq!(buf.pixel(2, 4), Some(0));
    }

    #[test]
    fn test_xor_twice_restores() {
        let mut buf = PixelBuffer::new(8, 8);
        buf.clear(0x00aa55cc);
        let mut area = SurfaceArea::new(&mut buf);
        area.set_pen(0x00ffffff);
        area.set_mode(BlendMode::Xor);
        area.plot(1, 1);
        area.plot(1, 1);
        assert_eq!(buf.pixel(1, 1), Some(0x00aa55cc));
    }

    #[test]
    fn test_masked_modes() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.clear(0x00f0f0f0);
        let mut area = SurfaceArea::new(&mut buf);
        area.set_pen(0x000000ff);

        area.set_mode(BlendMode::And);
        area.plot(0, 0);
        area.set_mode(BlendMode::Or);
        area.plot(1, 0);
        area.set_mode(BlendMode::AndNot);
        area.plot(2, 0);

        assert_eq!(buf.pixel(0, 0), Some(0x00f0f0f0 & 0xff));
        assert_eq!(buf.pixel(1, 0), Some(0x00f0f0f0 | 0xff));
        assert_eq!(buf.pixel(2, 0), Some(0x00f0f0f0 & !0xffu32 & 0x00ffffff));
    }

    #[test]
    fn test_set_mode_returns_prior() {
        let mut buf = PixelBuffer::new(2, 2);
        let mut area = SurfaceArea::new(&mut buf);
        assert_eq!(area.set_mode(BlendMode::Xor), BlendMode::Solid);
        assert_eq!(area.set_mode(BlendMode::Solid), BlendMode::Xor);
    }

    #[test]
    fn test_line_endpoints_plotted() {
        let mut buf = PixelBuffer::new(16, 16);
        let mut area = SurfaceArea::new(&mut buf);
        area.set_pen(0x00ffffff);
        area.draw_line(2.0, 3.0, 10.0, 12.0);
        assert_eq!(buf.pixel(2, 3), Some(0x00ffffff));
        assert_eq!(buf.pixel(10, 12), Some(0x00ffffff));
    }

    #[test]
    fn test_line_fully_outside_draws_nothing() {
        let mut buf = PixelBuffer::new(8, 8);
        let mut area = SurfaceArea::new(&mut buf);
        area.set_pen(0x00ffffff);
        area.draw_line(-20.0, -5.0, -3.0, -1.0);
        assert!(buf.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_line_clipped_stays_in_bounds() {
        let mut buf = PixelBuffer::new(8, 8);
        let mut area = SurfaceArea::new(&mut buf);
        area.set_pen(0x00ffffff);
        // Crosses the surface diagonally from far outside both ends
        area.draw_line(-50.0, -50.0, 60.0, 60.0);
        assert_eq!(buf.pixel(0, 0), Some(0x00ffffff));
        assert_eq!(buf.pixel(7, 7), Some(0x00ffffff));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut buf = PixelBuffer::new(8, 8);
        let mut area = SurfaceArea::new(&mut buf);
        area.set_pen(0x00010203);
        area.fill_rect(6, 6, 10, 10);
        assert_eq!(buf.pixel(6, 6), Some(0x00010203));
        assert_eq!(buf.pixel(7, 7), Some(0x00010203));
        assert_eq!(buf.pixel(5, 5), Some(0));
    }
}
