//! Twisting neon wormhole flown at audio-adaptive speed.

use glam::Vec3;

use crate::render::{Blend, Canvas, FrameInput, Visualizer};

use super::{average, centroid_norm, compress_into, perspective_scale, project_safe};

const RADIAL_SEGMENTS: usize = 22;
const DEPTH_SEGMENTS: usize = 28;
const SPOKES: usize = 24;
const BASE_RADIUS: f32 = 140.0;
const RING_SPACING: f32 = 28.0;

pub struct NeonTunnel {
    phase: f32,
    compressed: Vec<f32>,
}

impl NeonTunnel {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            compressed: Vec::new(),
        }
    }

    fn ring_point(&self, ring: usize, t: f32, twist: f32) -> Vec3 {
        let j = ring as f32;
        let z = j * RING_SPACING - (self.phase % RING_SPACING) * RING_SPACING;
        let radius = BASE_RADIUS + j * 10.0 + (j * 0.3 + self.phase * 0.05).sin() * 10.0;
        let ang = t * std::f32::consts::TAU + j * twist;
        Vec3::new(ang.cos() * radius, ang.sin() * radius, z)
    }
}

impl Default for NeonTunnel {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for NeonTunnel {
    fn name(&self) -> &'static str {
        "neon-tunnel"
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

        let speed = 0.8 + level * 2.6 + features.beat_pulse * 4.2;
        self.phase += speed * 2.0;

        let color_pos = (centroid + self.phase * 0.01).rem_euclid(1.0);
        let tunnel_color = input.palette.color_at(color_pos);
        let glow = tunnel_color.with_alpha(90);
        let twist = 0.1 + level * 0.6;

        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let scale = perspective_scale(h);

        // Rings.
        for j in 0..DEPTH_SEGMENTS {
            let mut prev = project_safe(self.ring_point(j, 0.0, twist), scale, w, h);
            for i in 1..=RADIAL_SEGMENTS {
                let t = i as f32 / RADIAL_SEGMENTS as f32;
                let p = project_safe(self.ring_point(j, t, twist), scale, w, h);
                canvas.thick_line(prev.x, prev.y, p.x, p.y, 3.0, glow, Blend::Add);
                canvas.line(prev.x, prev.y, p.x, p.y, tunnel_color, Blend::Over);
                prev = p;
            }
        }

        // Spokes running down the tunnel.
        for i in 0..SPOKES {
            let t = i as f32 / SPOKES as f32;
            let mut prev = project_safe(self.ring_point(0, t, twist), scale, w, h);
            for j in 1..DEPTH_SEGMENTS {
                let p = project_safe(self.ring_point(j, t, twist), scale, w, h);
                canvas.line(prev.x, prev.y, p.x, p.y, tunnel_color, Blend::Over);
                prev = p;
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
    fn tunnel_draws_rings_and_advances_phase() {
        let mut viz = NeonTunnel::new();
        let mut canvas = Canvas::new(100, 80);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        viz.render(&mut canvas, &input);
        let first = viz.phase;
        viz.render(&mut canvas, &input);
        assert!(viz.phase > first);
        assert!(lit_pixels(&canvas) > 200);
    }

    #[test]
    fn silence_keeps_a_minimum_crawl() {
        let mut viz = NeonTunnel::new();
        let mut canvas = Canvas::new(50, 40);
        let snapshot = crate::state::ReactiveSnapshot::default();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(viz.phase > 0.0);
    }
}
