//! Software RGBA framebuffer.
//!
//! Renderers draw into a [`Canvas`]; presentation of the finished pixel
//! buffer is the host's job. The op set is the minimum the visualizers
//! need: pixels, rects, lines, circles, and a scaled blit for the
//! texture-based effects. All ops are clipped and safe on any canvas size,
//! including zero.

use crate::palette::Color;

/// How a drawing op combines with what is already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Source-over alpha blending.
    Over,
    /// Saturating additive blending, used for glow effects.
    Add,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True when there is nothing to draw into.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height * 4, 0);
    }

    pub fn clear(&mut self, color: Color) {
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = color.a;
        }
    }

    pub fn pixel_at(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some(Color::rgba(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ))
    }

    pub fn put(&mut self, x: i32, y: i32, color: Color, blend: Blend) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        let a = color.a as u32;
        match blend {
            Blend::Over => {
                let inv = 255 - a;
                self.pixels[i] = ((color.r as u32 * a + self.pixels[i] as u32 * inv) / 255) as u8;
                self.pixels[i + 1] =
                    ((color.g as u32 * a + self.pixels[i + 1] as u32 * inv) / 255) as u8;
                self.pixels[i + 2] =
                    ((color.b as u32 * a + self.pixels[i + 2] as u32 * inv) / 255) as u8;
                self.pixels[i + 3] = self.pixels[i + 3].max(color.a);
            }
            Blend::Add => {
                self.pixels[i] =
                    (self.pixels[i] as u32 + color.r as u32 * a / 255).min(255) as u8;
                self.pixels[i + 1] =
                    (self.pixels[i + 1] as u32 + color.g as u32 * a / 255).min(255) as u8;
                self.pixels[i + 2] =
                    (self.pixels[i + 2] as u32 + color.b as u32 * a / 255).min(255) as u8;
                self.pixels[i + 3] = self.pixels[i + 3].max(color.a);
            }
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color, blend: Blend) {
        if self.is_degenerate() || w <= 0 || h <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.put(px, py, color, blend);
            }
        }
    }

    pub fn hline(&mut self, x0: i32, x1: i32, y: i32, color: Color, blend: Blend) {
        let (a, b) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        for x in a..=b {
            self.put(x, y, color, blend);
        }
    }

    /// One-pixel line between two points, clipped; DDA stepping.
    pub fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Color, blend: Blend) {
        if self.is_degenerate() {
            return;
        }
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steps = dx.abs().max(dy.abs()).ceil() as i32;
        if steps == 0 {
            self.put(x0.round() as i32, y0.round() as i32, color, blend);
            return;
        }
        // Cull segments fully outside a generous clip margin.
        let margin = 2048.0;
        let wf = self.width as f32;
        let hf = self.height as f32;
        if (x0 < -margin && x1 < -margin)
            || (y0 < -margin && y1 < -margin)
            || (x0 > wf + margin && x1 > wf + margin)
            || (y0 > hf + margin && y1 > hf + margin)
        {
            return;
        }
        let steps = steps.min(8192);
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            self.put(
                (x0 + dx * t).round() as i32,
                (y0 + dy * t).round() as i32,
                color,
                blend,
            );
        }
    }

    /// Line with thickness, stamped as discs along the segment.
    pub fn thick_line(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        width: f32,
        color: Color,
        blend: Blend,
    ) {
        if width <= 1.5 {
            self.line(x0, y0, x1, y1, color, blend);
            return;
        }
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        let dx = x1 - x0;
        let dy = y1 - y0;
        let len = (dx * dx + dy * dy).sqrt();
        let radius = width * 0.5;
        let step = (radius * 0.75).max(1.0);
        let stamps = ((len / step).ceil() as i32).clamp(1, 4096);
        for s in 0..=stamps {
            let t = s as f32 / stamps as f32;
            self.fill_circle(x0 + dx * t, y0 + dy * t, radius, color, blend);
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, blend: Blend) {
        if self.is_degenerate() || !(cx.is_finite() && cy.is_finite()) || radius <= 0.0 {
            return;
        }
        let r = radius.min(4096.0);
        let x0 = ((cx - r).floor() as i32).max(0);
        let x1 = ((cx + r).ceil() as i32).min(self.width as i32 - 1);
        let y0 = ((cy - r).floor() as i32).max(0);
        let y1 = ((cy + r).ceil() as i32).min(self.height as i32 - 1);
        let r2 = r * r;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 - cx;
                let dy = py as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.put(px, py, color, blend);
                }
            }
        }
    }

    pub fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, blend: Blend) {
        if self.is_degenerate() || radius <= 0.0 || !(cx.is_finite() && cy.is_finite()) {
            return;
        }
        let r = radius.min(4096.0);
        let steps = ((r * std::f32::consts::TAU).ceil() as i32).clamp(8, 2048);
        for s in 0..steps {
            let a = s as f32 / steps as f32 * std::f32::consts::TAU;
            self.put(
                (cx + a.cos() * r).round() as i32,
                (cy + a.sin() * r).round() as i32,
                color,
                blend,
            );
        }
    }

    /// Nearest-neighbour blit of a source canvas stretched over this one.
    pub fn blit_scaled(&mut self, src: &Canvas, blend: Blend) {
        if self.is_degenerate() || src.is_degenerate() {
            return;
        }
        for y in 0..self.height {
            let sy = y * src.height / self.height;
            for x in 0..self.width {
                let sx = x * src.width / self.width;
                if let Some(c) = src.pixel_at(sx, sy) {
                    self.put(x as i32, y as i32, c, blend);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_canvas_accepts_every_op() {
        let mut canvas = Canvas::new(0, 0);
        canvas.clear(Color::WHITE);
        canvas.put(0, 0, Color::WHITE, Blend::Over);
        canvas.fill_rect(0, 0, 10, 10, Color::WHITE, Blend::Over);
        canvas.line(0.0, 0.0, 5.0, 5.0, Color::WHITE, Blend::Over);
        canvas.fill_circle(1.0, 1.0, 3.0, Color::WHITE, Blend::Add);
        assert!(canvas.is_degenerate());
    }

    #[test]
    fn put_clips_out_of_bounds() {
        let mut canvas = Canvas::new(4, 4);
        canvas.put(-1, 0, Color::WHITE, Blend::Over);
        canvas.put(4, 4, Color::WHITE, Blend::Over);
        assert!(canvas.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn additive_blend_saturates() {
        let mut canvas = Canvas::new(1, 1);
        let c = Color::rgb(200, 200, 200);
        canvas.put(0, 0, c, Blend::Add);
        canvas.put(0, 0, c, Blend::Add);
        assert_eq!(canvas.pixel_at(0, 0).unwrap().r, 255);
    }

    #[test]
    fn over_blend_weights_by_alpha() {
        let mut canvas = Canvas::new(1, 1);
        canvas.clear(Color::BLACK);
        canvas.put(0, 0, Color::rgb(255, 0, 0).with_alpha(128), Blend::Over);
        let px = canvas.pixel_at(0, 0).unwrap();
        assert!(px.r > 120 && px.r < 135);
        assert_eq!(px.g, 0);
    }

    #[test]
    fn non_finite_endpoints_are_ignored() {
        let mut canvas = Canvas::new(8, 8);
        canvas.line(f32::NAN, 0.0, 4.0, 4.0, Color::WHITE, Blend::Over);
        canvas.thick_line(0.0, f32::INFINITY, 4.0, 4.0, 3.0, Color::WHITE, Blend::Over);
        assert!(canvas.pixels().iter().all(|&b| b == 0));
    }
}
