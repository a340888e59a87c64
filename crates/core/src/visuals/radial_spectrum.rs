//! Rotating ring of spectrum spokes.

use crate::render::{Blend, Canvas, FrameInput, Visualizer};

use super::{average, compress_into};

const SPOKES: usize = 128;
const INNER_FRACTION: f32 = 0.2;

pub struct RadialSpectrum {
    rotation_deg: f32,
    compressed: Vec<f32>,
}

impl RadialSpectrum {
    pub fn new() -> Self {
        Self {
            rotation_deg: 0.0,
            compressed: Vec::new(),
        }
    }
}

impl Default for RadialSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for RadialSpectrum {
    fn name(&self) -> &'static str {
        "radial-spectrum"
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
        // Louder music spins the ring faster.
        self.rotation_deg = (self.rotation_deg + average(&self.compressed) / 10.0) % 360.0;

        let cx = canvas.width() as f32 / 2.0;
        let cy = canvas.height() as f32 / 2.0;
        let max_radius = cx.min(cy) * 0.9;
        let inner = max_radius * INNER_FRACTION;
        let bins = self.compressed.len().max(1);

        for i in 0..SPOKES {
            let angle = i as f32 / SPOKES as f32 * std::f32::consts::TAU
                + self.rotation_deg.to_radians();
            let bin = i * bins / SPOKES;
            let magnitude = self.compressed[bin.min(bins - 1)] * max_radius * 0.98;
            let outer = inner + magnitude;
            // Radial palette gradient along each spoke.
            let steps = (outer - inner).max(1.0) as i32;
            for s in 0..=steps {
                let r = inner + (outer - inner) * s as f32 / steps as f32;
                let color = input.palette.color_at(r / max_radius);
                canvas.put(
                    (cx + angle.cos() * r).round() as i32,
                    (cy + angle.sin() * r).round() as i32,
                    color,
                    Blend::Over,
                );
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
    fn spokes_radiate_from_the_inner_ring() {
        let mut viz = RadialSpectrum::new();
        let mut canvas = Canvas::new(80, 80);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(lit_pixels(&canvas) > 200);
    }

    #[test]
    fn rotation_advances_with_energy() {
        let mut viz = RadialSpectrum::new();
        let mut canvas = Canvas::new(40, 40);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        viz.render(&mut canvas, &input);
        let first = viz.rotation_deg;
        viz.render(&mut canvas, &input);
        assert!(viz.rotation_deg > first);
    }
}
