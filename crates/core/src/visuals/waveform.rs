//! Mirrored oscilloscope trace across the canvas midline.

use crate::render::{Blend, Canvas, FrameInput, Visualizer};

pub struct Waveform;

impl Waveform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Waveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Waveform {
    fn name(&self) -> &'static str {
        "waveform"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let samples = &input.snapshot.waveform;
        if samples.is_empty() {
            return;
        }
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let mid = h / 2.0;
        let amp = h / 4.0;
        let step = samples.len() as f32 / w;

        let mut prev = mid;
        let mut prev_inv = mid;
        for x in 0..canvas.width() {
            let index = ((x as f32 * step) as usize).min(samples.len() - 1);
            let y = mid + samples[index] * amp;
            // Horizontal palette gradient.
            let color = input.palette.color_at(x as f32 / w);
            canvas.line(x as f32 - 1.0, prev, x as f32, y, color, Blend::Over);
            canvas.line(
                x as f32 - 1.0,
                prev_inv,
                x as f32,
                mid - samples[index] * amp,
                color,
                Blend::Over,
            );
            prev = y;
            prev_inv = mid - samples[index] * amp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn trace_spans_the_width() {
        let mut viz = Waveform::new();
        let mut canvas = Canvas::new(100, 50);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(lit_pixels(&canvas) >= 100);
    }

    #[test]
    fn flat_waveform_draws_the_midline() {
        let mut viz = Waveform::new();
        let mut canvas = Canvas::new(40, 20);
        let snapshot = crate::state::ReactiveSnapshot::default();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(canvas.pixel_at(20, 10).map(|c| c.r > 0 || c.g > 0 || c.b > 0) == Some(true));
    }
}
