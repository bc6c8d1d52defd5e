//! CPU raster target
//!
//! An owned RGBA8 buffer with clipped, alpha-blended primitives. All
//! sampling is nearest-neighbor; sprites land on whole pixels.

use super::sprites::Bitmap;

/// An RGBA8 frame buffer
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel data, row-major RGBA
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Source-over blend of one pixel; out-of-bounds writes are dropped
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let a = color[3] as u32;
        if a == 0 {
            return;
        }
        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        if a == 255 {
            self.data[idx..idx + 4].copy_from_slice(&color);
            return;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let src = color[c] as u32;
            let dst = self.data[idx + c] as u32;
            self.data[idx + c] = ((src * a + dst * inv) / 255) as u8;
        }
        let dst_a = self.data[idx + 3] as u32;
        self.data[idx + 3] = (a + dst_a * inv / 255).min(255) as u8;
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 4]) {
        let x0 = x.round() as i32;
        let y0 = y.round() as i32;
        let x1 = (x + w).round() as i32;
        let y1 = (y + h).round() as i32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i32;
        let x1 = (cx + radius).ceil() as i32;
        let y0 = (cy - radius).floor() as i32;
        let y1 = (cy + radius).ceil() as i32;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: [u8; 4]) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let x0 = (cx - rx).floor() as i32;
        let x1 = (cx + rx).ceil() as i32;
        let y0 = (cy - ry).floor() as i32;
        let y1 = (cy + ry).ceil() as i32;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = (px as f32 + 0.5 - cx) / rx;
                let dy = (py as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.blend_pixel(px, py, color);
                }
            }
        }
    }

    /// Short line segment, stepped at sub-pixel resolution
    pub fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: [u8; 4]) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let px = (x0 + dx * t).round() as i32;
            let py = (y0 + dy * t).round() as i32;
            self.blend_pixel(px, py, color);
        }
    }

    /// Nearest-neighbor sprite blit with optional horizontal flip.
    /// `opacity` scales the sprite's own alpha, 0..1.
    pub fn blit(&mut self, bitmap: &Bitmap, x: i32, y: i32, flip_x: bool, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        let opacity = opacity.min(1.0);
        for sy in 0..bitmap.height {
            for sx in 0..bitmap.width {
                let src_x = if flip_x { bitmap.width - 1 - sx } else { sx };
                let mut color = bitmap.pixel(src_x, sy);
                if color[3] == 0 {
                    continue;
                }
                color[3] = (color[3] as f32 * opacity) as u8;
                self.blend_pixel(x + sx as i32, y + sy as i32, color);
            }
        }
    }
}
