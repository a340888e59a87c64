//! Hyperspace starfield with loudness-driven warp speed.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::render::{Blend, Canvas, FrameInput, Visualizer};

use super::{perspective_scale, project_safe};

const STAR_COUNT: usize = 800;
const FIELD_DEPTH: f32 = 400.0;
const FIELD_SPREAD: f32 = 200.0;

struct Star {
    pos: Vec3,
    speed: f32,
    hue: f32,
    twinkle: f32,
}

pub struct Starfield {
    rng: SmallRng,
    stars: Vec<Star>,
    speed_smooth: f32,
}

impl Starfield {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            stars: Vec::new(),
            speed_smooth: 1.0,
        }
    }

    fn spawn(&mut self) -> Star {
        Star {
            pos: Vec3::new(
                self.rng.gen_range(-1.0..1.0) * FIELD_SPREAD,
                self.rng.gen_range(-1.0..1.0) * FIELD_SPREAD,
                self.rng.gen::<f32>() * FIELD_DEPTH,
            ),
            speed: 0.5 + self.rng.gen::<f32>() * 1.5,
            hue: self.rng.gen::<f32>() * 360.0,
            twinkle: self.rng.gen::<f32>() * std::f32::consts::TAU,
        }
    }

    /// Mean first-difference of the waveform tail; a crude brightness of the
    /// transient content used to drift the field sideways.
    fn lateral_drift(waveform: &[f32]) -> f32 {
        let mut sum = 0.0;
        let mut count = 0;
        for pair in waveform.chunks_exact(2) {
            sum += pair[0] - pair[1];
            count += 1;
        }
        if count > 0 {
            (sum / count as f32).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for Starfield {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Starfield {
    fn name(&self) -> &'static str {
        "starfield"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let features = input.snapshot.features;
        while self.stars.len() < STAR_COUNT {
            let star = self.spawn();
            self.stars.push(star);
        }

        let loud = features.level * 0.6
            + features.low_band * 0.6
            + if features.beat_pulse > 0.6 { 0.3 } else { 0.0 };
        let target_speed = 1.0 + loud * 8.0;
        self.speed_smooth = self.speed_smooth * 0.85 + target_speed * 0.15;

        let drift = Self::lateral_drift(&input.snapshot.waveform);

        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let scale = perspective_scale(h);

        for i in 0..self.stars.len() {
            {
                let star = &mut self.stars[i];
                star.pos.z -= star.speed * self.speed_smooth;
                star.pos.x += drift * 0.8 * star.speed;
                star.twinkle += 0.08 + self.speed_smooth * 0.05;
            }
            if self.stars[i].pos.z < 10.0 {
                let x = self.rng.gen_range(-1.0..1.0) * FIELD_SPREAD;
                let y = self.rng.gen_range(-1.0..1.0) * FIELD_SPREAD;
                let star = &mut self.stars[i];
                star.pos = Vec3::new(x, y, FIELD_DEPTH);
            }

            let star = &self.stars[i];
            let p = project_safe(star.pos, scale, w, h);
            let depth = star.pos.z.max(10.0);
            let alpha = (80.0 + self.speed_smooth * 20.0 + star.twinkle.sin() * 60.0)
                .clamp(30.0, 255.0) as u8;
            let color_pos = (star.hue / 360.0
                + features.hue_base / 360.0
                + star.pos.z / FIELD_DEPTH)
                .rem_euclid(1.0);
            let color = input.palette.color_at(color_pos).with_alpha(alpha);
            let tail = project_safe(
                star.pos + Vec3::new(0.0, 0.0, 18.0 * self.speed_smooth),
                scale,
                w,
                h,
            );
            canvas.thick_line(
                p.x,
                p.y,
                tail.x,
                tail.y,
                (6.0 / depth).max(1.0),
                color,
                Blend::Over,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn field_fills_and_stars_recycle() {
        let mut viz = Starfield::new();
        let mut canvas = Canvas::new(100, 80);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        for _ in 0..5 {
            viz.render(&mut canvas, &input);
        }
        assert_eq!(viz.stars.len(), STAR_COUNT);
        assert!(viz.stars.iter().all(|s| s.pos.z >= 10.0 - f32::EPSILON));
        assert!(lit_pixels(&canvas) > 100);
    }

    #[test]
    fn warp_speed_rises_with_loudness() {
        let mut viz = Starfield::new();
        let mut canvas = Canvas::new(50, 40);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let idle = viz.speed_smooth;
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(viz.speed_smooth > idle);
    }
}
