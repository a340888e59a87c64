//! Scrolling wireframe terrain extruded from the spectrum, with a spiky
//! mountain skyline behind it.

use glam::Vec3;

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

use super::{average, centroid_norm, compress_into, perspective_scale, project_safe};

const COLS: usize = 64;
const ROWS: usize = 64;
const CELL_X: f32 = 10.0;
const CELL_Z: f32 = 10.0;
const HEIGHT_UNITS: f32 = 80.0;
const SCROLL_DECAY: f32 = 0.992;
const SKYLINE_POINTS: usize = 64;

pub struct AudioTerrain {
    heights: Vec<f32>,
    compressed: Vec<f32>,
}

impl AudioTerrain {
    pub fn new() -> Self {
        Self {
            heights: vec![0.0; ROWS * COLS],
            compressed: Vec::new(),
        }
    }

    fn at(&self, row: usize, col: usize) -> f32 {
        self.heights[row * COLS + col]
    }

    fn advance(&mut self, level: f32, beat_pulse: f32) {
        let height_scale = 0.6 + level * 1.8 + beat_pulse * 2.2;
        let bins = self.compressed.len().max(1);
        for c in 0..COLS {
            let f = c as f32 / (COLS - 1) as f32;
            // Square mapping packs more columns into the bass.
            let idx = ((f * f * (bins - 1) as f32) as usize).min(bins - 1);
            self.heights[c] = self.compressed[idx] * height_scale;
        }
        for c in 1..COLS - 1 {
            self.heights[c] =
                (self.heights[c - 1] + self.heights[c] * 2.0 + self.heights[c + 1]) / 4.0;
        }
        for r in (1..ROWS).rev() {
            for c in 0..COLS {
                self.heights[r * COLS + c] = self.heights[(r - 1) * COLS + c] * SCROLL_DECAY;
            }
        }
    }

    fn skyline(&self, canvas: &mut Canvas, input: &FrameInput<'_>, centroid: f32, level: f32) {
        let features = input.snapshot.features;
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let baseline = h * 0.38;
        let amp = h * 0.18
            + h * (0.05 + level * 0.12 + features.beat_pulse * 0.18);
        let ridge = Color::from_hsv((features.hue_base + centroid * 200.0) % 360.0, 60.0, 70.0)
            .with_alpha(120);

        for i in 0..SKYLINE_POINTS {
            let t = i as f32 / (SKYLINE_POINTS - 1) as f32;
            let spike = spike_noise(i, level, features.beat_pulse, features.phase);
            let top = (baseline - spike * amp).min(baseline);
            let x0 = (t * w) as i32;
            let x1 = (((i + 1) as f32 / (SKYLINE_POINTS - 1) as f32) * w) as i32;
            // Column fill fades toward the top of the sky.
            for y in 0..top.max(0.0) as i32 {
                let fade = y as f32 / baseline.max(1.0);
                canvas.hline(x0, x1, y, ridge.scaled(fade), Blend::Over);
            }
        }
    }
}

/// Deterministic pseudo-noise spikes with an audio wobble.
fn spike_noise(i: usize, level: f32, beat_pulse: f32, phase: f32) -> f32 {
    let n = (i as u32).wrapping_mul(1_103_515_245).wrapping_add(12_345) & 0x7fff_ffff;
    let r1 = (n % 1000) as f32 / 1000.0;
    let r2 = ((n / 1000) % 1000) as f32 / 1000.0;
    let base = r1.powf(0.35);
    let wobble = ((i as f32 + phase * 0.15) * 0.4).sin() * 0.2 + (r2 - 0.5) * 0.1;
    let audio = level * 0.5 + beat_pulse * 0.8;
    (base + wobble + audio).clamp(0.0, 1.4)
}

impl Default for AudioTerrain {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for AudioTerrain {
    fn name(&self) -> &'static str {
        "audio-terrain"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let snapshot = input.snapshot;
        let features = snapshot.features;
        compress_into(&snapshot.smoothed, features.gain, &mut self.compressed);

        let level = average(&self.compressed);
        let centroid = centroid_norm(&self.compressed);
        self.advance(level, features.beat_pulse);

        self.skyline(canvas, input, centroid, level);

        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let scale = perspective_scale(h);
        let cam = Vec3::new(0.0, 90.0, 180.0);

        let hue = (features.hue_base + centroid * 240.0) % 360.0;
        let val = (70.0 + level * 30.0 + features.beat_pulse * 40.0).clamp(0.0, 100.0);
        let wire = Color::from_hsv(hue, 80.0, val);
        let glow = wire.with_alpha(60);

        let world = |this: &Self, r: usize, c: usize| {
            Vec3::new(
                (c as f32 - COLS as f32 / 2.0) * CELL_X - cam.x,
                -this.at(r, c) * HEIGHT_UNITS - cam.y,
                r as f32 * CELL_Z - cam.z,
            )
        };

        for r in 0..ROWS - 1 {
            for c in 0..COLS - 1 {
                let a = project_safe(world(self, r, c), scale, w, h);
                let b = project_safe(world(self, r, c + 1), scale, w, h);
                canvas.thick_line(a.x, a.y, b.x, b.y, 3.5, glow, Blend::Add);
                canvas.line(a.x, a.y, b.x, b.y, wire, Blend::Over);
            }
        }
        for c in (0..COLS).step_by(2) {
            for r in 0..ROWS - 1 {
                let a = project_safe(world(self, r, c), scale, w, h);
                let b = project_safe(world(self, r + 1, c), scale, w, h);
                canvas.thick_line(a.x, a.y, b.x, b.y, 3.5, glow, Blend::Add);
                canvas.line(a.x, a.y, b.x, b.y, wire, Blend::Over);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn fresh_spectrum_lands_in_the_front_row_and_scrolls_back() {
        let mut viz = AudioTerrain::new();
        let mut canvas = Canvas::new(80, 60);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        viz.render(&mut canvas, &input);
        let front = viz.at(0, 4);
        assert!(front > 0.0);
        viz.render(&mut canvas, &input);
        // The previous front row moved one row back, slightly decayed.
        assert!((viz.at(1, 4) - front * SCROLL_DECAY).abs() < front * 0.5);
        assert!(lit_pixels(&canvas) > 100);
    }

    #[test]
    fn spike_noise_stays_in_range() {
        for i in 0..128 {
            let s = spike_noise(i, 1.0, 1.0, 500.0);
            assert!((0.0..=1.4).contains(&s));
        }
    }
}
