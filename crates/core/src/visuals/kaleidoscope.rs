//! Classic mirrored-wedge kaleidoscope over a spectrum-driven seed texture.

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

use super::{average, centroid_norm, compress_into, fold_wedges};

const WEDGES: u32 = 16;
const SPOKES: usize = 96;
const RINGS: usize = 10;
const DOTS: usize = 80;

pub struct Kaleidoscope {
    seed: Canvas,
    compressed: Vec<f32>,
}

impl Kaleidoscope {
    pub fn new() -> Self {
        Self {
            seed: Canvas::new(0, 0),
            compressed: Vec::new(),
        }
    }

    fn paint_seed(&mut self, input: &FrameInput<'_>) {
        let tex = self.seed.width() as f32;
        let cx = tex / 2.0;
        let cy = tex / 2.0;
        let max_r = tex * 0.48;
        let features = input.snapshot.features;
        let level = average(&self.compressed);
        let centroid = centroid_norm(&self.compressed);
        let hue_base = (features.hue_base + centroid * 360.0) % 360.0;
        let bins = self.compressed.len().max(1);

        self.seed.clear(Color::BLACK);

        for i in 0..SPOKES {
            let t = i as f32 / SPOKES as f32;
            let mag = self.compressed[(t * (bins - 1) as f32) as usize];
            let r = max_r * (0.2 + mag * 0.8);
            let ang = (t + features.phase * 0.002) * std::f32::consts::TAU;
            let color = input
                .palette
                .color_cyclic(hue_base + t * 360.0)
                .scaled(0.5 + mag * 2.0);
            self.seed.line(
                cx,
                cy,
                cx + ang.cos() * r,
                cy + ang.sin() * r,
                color,
                Blend::Over,
            );
        }

        for i in 0..RINGS {
            let t = i as f32 / (RINGS - 1) as f32;
            let r = max_r * (0.1 + 0.9 * t * (0.6 + 0.4 * level));
            self.seed
                .stroke_circle(cx, cy, r, Color::WHITE.with_alpha(40), Blend::Over);
        }

        for i in 0..DOTS {
            let t = i as f32 / DOTS as f32;
            let mag = self.compressed[(t * (bins - 1) as f32) as usize];
            if mag < 0.05 {
                continue;
            }
            let r = max_r * (0.2 + mag * 0.8);
            let ang = (t * 2.0 + features.phase * 0.004) * std::f32::consts::TAU;
            let color = input
                .palette
                .color_cyclic(hue_base + 180.0 * mag)
                .with_alpha(160);
            self.seed.fill_circle(
                cx + ang.cos() * r,
                cy + ang.sin() * r,
                2.0 + mag * 6.0,
                color,
                Blend::Over,
            );
        }
    }
}

impl Default for Kaleidoscope {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Kaleidoscope {
    fn name(&self) -> &'static str {
        "kaleidoscope"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let snapshot = input.snapshot;
        compress_into(
            &snapshot.smoothed,
            snapshot.features.gain,
            &mut self.compressed,
        );
        if self.compressed.is_empty() {
            return;
        }

        let s = canvas.width().min(canvas.height());
        let tex = (s / 2).max(64);
        if self.seed.width() != tex {
            self.seed.resize(tex, tex);
        }
        self.paint_seed(input);

        let features = snapshot.features;
        let level = average(&self.compressed);
        let zoom = 1.0 + level * 0.3 + features.beat_pulse * 0.6;
        let rotate =
            (features.phase * (0.05 + level * 0.2) + features.beat_pulse * 10.0) % 360.0;
        fold_wedges(canvas, &self.seed, WEDGES, rotate, zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn folded_output_is_symmetric_enough_to_light_all_quadrants() {
        let mut viz = Kaleidoscope::new();
        let mut canvas = Canvas::new(96, 96);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(lit_pixels(&canvas) > 500);
    }

    #[test]
    fn tiny_canvas_is_safe() {
        let mut viz = Kaleidoscope::new();
        let mut canvas = Canvas::new(3, 3);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
    }
}
