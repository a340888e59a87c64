//! Recursive swaying tree whose depth and growth ride the music.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};
use crate::state::ReactiveFeatures;

pub struct FractalTree {
    rng: SmallRng,
    depth: i32,
}

impl FractalTree {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            depth: 7,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn branch(
        &mut self,
        canvas: &mut Canvas,
        features: &ReactiveFeatures,
        x: f32,
        y: f32,
        angle_deg: f32,
        depth: i32,
        intensity: f32,
        branch_id: i32,
    ) {
        if depth <= 0 {
            return;
        }
        let depth_ratio = depth as f32 / self.depth as f32;
        let base_len = (0.02 + intensity * 0.08) * canvas.height() as f32;
        let growth_burst = 1.0 + features.beat_pulse * 2.0 + intensity * 0.5;
        let length = base_len * (0.5 + 0.5 * depth_ratio) * growth_burst
            + self.rng.gen_range(-10.0..10.0);

        let mut branch_angle =
            20.0 + intensity * 40.0 + self.rng.gen_range(-15.0..15.0_f32);
        branch_angle +=
            (features.phase * 0.1 + branch_id as f32).sin() * intensity * 12.0;

        let hue = (features.hue_base
            + branch_id as f32 * 12.0
            + self.rng.gen_range(0.0..20.0)
            + intensity * 60.0)
            % 360.0;
        let sat = (70.0 + intensity * 30.0 + features.beat_pulse * 30.0).clamp(0.0, 100.0);
        let val = (75.0 + intensity * 25.0 + features.beat_pulse * 40.0).clamp(0.0, 100.0);

        let rad = angle_deg.to_radians();
        let x2 = x + rad.cos() * length;
        let y2 = y + rad.sin() * length;

        let width =
            (depth as f32 * 1.2 * (0.7 + intensity * 0.4 + features.beat_pulse * 0.6)).max(1.0);
        canvas.thick_line(
            x,
            y,
            x2,
            y2,
            width,
            Color::from_hsv(hue, sat, val),
            Blend::Over,
        );

        self.branch(
            canvas,
            features,
            x2,
            y2,
            angle_deg - branch_angle,
            depth - 1,
            intensity * 0.98,
            branch_id + 1,
        );
        self.branch(
            canvas,
            features,
            x2,
            y2,
            angle_deg + branch_angle,
            depth - 1,
            intensity * 0.98,
            branch_id + 1,
        );

        // Beats make extra limbs likely.
        let extra_prob =
            0.08 + 0.30 * intensity + 0.40 * features.beat_pulse.min(1.0);
        if depth > 2 && !features.is_silent && self.rng.gen::<f32>() < extra_prob {
            let extra_angle = angle_deg + self.rng.gen_range(-45.0..45.0);
            self.branch(
                canvas,
                features,
                x2,
                y2,
                extra_angle,
                depth - 2,
                intensity * 0.95,
                branch_id + 2,
            );
        }
    }
}

impl Default for FractalTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for FractalTree {
    fn name(&self) -> &'static str {
        "fractal-tree"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let features = input.snapshot.features;
        let level = features.level;
        self.depth =
            ((7.0 + level * 6.0 + features.beat_pulse * 4.0) as i32).clamp(6, 16);

        let amplitude = if features.is_silent {
            0.0
        } else {
            5.0 * level + 12.0 * features.beat_pulse + 8.0 * level * features.beat_pulse
        };
        let sway = (features.phase * 0.05).sin() * amplitude;

        let root_x = canvas.width() as f32 / 2.0;
        let root_y = canvas.height() as f32;
        self.branch(
            canvas,
            &features,
            root_x,
            root_y,
            -90.0 + sway,
            self.depth,
            level,
            0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn tree_grows_from_the_bottom_center() {
        let mut viz = FractalTree::new();
        let mut canvas = Canvas::new(120, 90);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(lit_pixels(&canvas) > 50);
    }

    #[test]
    fn silence_still_produces_a_trunk() {
        let mut viz = FractalTree::new();
        let mut canvas = Canvas::new(60, 60);
        let snapshot = crate::state::ReactiveSnapshot::default();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(lit_pixels(&canvas) > 0);
    }
}
