//! CRT scanlines, chromatic channel shift, and randomized glitch blocks.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

pub struct CrtGlitch {
    rng: SmallRng,
    sens_smooth: f32,
}

impl CrtGlitch {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            sens_smooth: 0.0,
        }
    }
}

impl Default for CrtGlitch {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for CrtGlitch {
    fn name(&self) -> &'static str {
        "crt-glitch"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let features = input.snapshot.features;
        let w = canvas.width() as i32;
        let h = canvas.height() as i32;

        let sens_now = (features.level * 0.6
            + features.low_band * 0.4
            + features.high_band * 0.5
            + if features.beat_pulse > 0.8 { 0.3 } else { 0.0 })
        .min(2.0);
        self.sens_smooth = self.sens_smooth * 0.9 + sens_now * 0.1;
        let sens = self.sens_smooth;

        // Scanlines.
        let spacing = ((3.0 - sens).clamp(1.0, 4.0)) as i32;
        let scan_alpha = (8.0 + sens * 20.0).clamp(8.0, 60.0) as u8;
        let scan = Color::WHITE.with_alpha(scan_alpha);
        let mut y = 0;
        while y < h {
            canvas.hline(0, w - 1, y, scan, Blend::Over);
            y += spacing;
        }

        // Chromatic channel shift as translucent offset washes.
        let shift = (1.5 + sens * 5.0) as i32;
        let rgb_alpha = (30.0 + sens * 50.0).clamp(20.0, 120.0) as u8;
        canvas.fill_rect(-shift, 0, w, h, Color::rgb(255, 0, 0).with_alpha(rgb_alpha), Blend::Add);
        canvas.fill_rect(shift, 0, w, h, Color::rgb(0, 0, 255).with_alpha(rgb_alpha), Blend::Add);
        canvas.fill_rect(0, -shift, w, h, Color::rgb(0, 128, 0).with_alpha(rgb_alpha), Blend::Add);

        // Vignette darkening toward the corners.
        let cx = w as f32 / 2.0;
        let cy = h as f32 / 2.0;
        let reach = w.max(h) as f32 / (1.2 - sens * 0.08);
        for py in 0..h {
            for px in 0..w {
                let dx = px as f32 - cx;
                let dy = py as f32 - cy;
                let t = ((dx * dx + dy * dy).sqrt() / reach - 0.7) / 0.3;
                if t > 0.0 {
                    let a = (t.min(1.0) * (150.0 + sens * 40.0).min(255.0)) as u8;
                    canvas.put(px, py, Color::BLACK.with_alpha(a), Blend::Over);
                }
            }
        }

        // Glitch blocks once the mix is hot enough.
        if sens > 0.3 {
            let glitches = ((1.0 + sens * 8.0) as usize).clamp(1, 18);
            let color = input
                .palette
                .color_cyclic(features.hue_base + sens * 90.0)
                .with_alpha((100.0 + sens * 60.0).clamp(80.0, 255.0) as u8);
            for _ in 0..glitches {
                let gw = ((24.0 + sens * 160.0) as i32).clamp(20, 220);
                let gh = ((6.0 + sens * 28.0) as i32).clamp(6, 40);
                let gx = self.rng.gen_range(0..(w - gw).max(1));
                let gy = self.rng.gen_range(0..(h - gh).max(1));
                canvas.fill_rect(gx, gy, gw, gh, color, Blend::Add);
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
    fn scanlines_and_shift_cover_the_frame() {
        let mut viz = CrtGlitch::new();
        let mut canvas = Canvas::new(64, 48);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        // A couple of frames lets the smoothed sensitivity climb.
        for _ in 0..5 {
            viz.render(&mut canvas, &input);
        }
        assert!(lit_pixels(&canvas) > 500);
    }

    #[test]
    fn sensitivity_smoothing_converges_upward() {
        let mut viz = CrtGlitch::new();
        let mut canvas = Canvas::new(32, 24);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        viz.render(&mut canvas, &input);
        let first = viz.sens_smooth;
        for _ in 0..10 {
            viz.render(&mut canvas, &input);
        }
        assert!(viz.sens_smooth > first);
    }
}
