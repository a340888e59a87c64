//! Classic vertical bar spectrum with peak caps.

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

use super::compress;

const BAR_COUNT: usize = 64;
const BAR_GAP: i32 = 2;
const HEIGHT_FILL: f32 = 0.95;

pub struct SpectrumBars;

impl SpectrumBars {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpectrumBars {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for SpectrumBars {
    fn name(&self) -> &'static str {
        "spectrum-bars"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let w = canvas.width() as i32;
        let h = canvas.height() as i32;
        let snapshot = input.snapshot;
        let gain = snapshot.features.gain;
        let bins = snapshot.smoothed.len();
        let bar_width = w as f32 / BAR_COUNT as f32;

        for bar in 0..BAR_COUNT {
            let bin = bar * bins / BAR_COUNT;
            let value = compress(snapshot.smoothed[bin], gain);
            let bar_height =
                ((value * h as f32 * HEIGHT_FILL).min(h as f32)).round() as i32;
            let x0 = (bar as f32 * bar_width) as i32;
            let x1 = ((bar + 1) as f32 * bar_width) as i32 - BAR_GAP;

            // Bottom-to-top palette gradient, one row at a time.
            for y in (h - bar_height)..h {
                let t = (h - 1 - y) as f32 / h as f32;
                let color = input.palette.color_at(t);
                canvas.hline(x0, x1, y, color, Blend::Over);
            }

            let peak = compress(snapshot.peaks[bin], gain);
            let peak_y = h - (peak * h as f32 * HEIGHT_FILL).min(h as f32) as i32;
            canvas.hline(x0, x1, peak_y.clamp(0, h - 1), Color::WHITE, Blend::Over);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn bars_light_the_bottom_of_the_canvas() {
        let mut viz = SpectrumBars::new();
        let mut canvas = Canvas::new(128, 64);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(lit_pixels(&canvas) > 100);
        // The bass bars rise from the bottom edge.
        assert!(canvas.pixel_at(0, 63).map(|c| c.r > 0 || c.g > 0 || c.b > 0) == Some(true));
    }

    #[test]
    fn silent_snapshot_still_draws_peak_caps_without_panic() {
        let mut viz = SpectrumBars::new();
        let mut canvas = Canvas::new(64, 32);
        let snapshot = crate::state::ReactiveSnapshot::default();
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
