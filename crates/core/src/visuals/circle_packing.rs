//! Breathing circle pack: one circle per frequency band, popping on peaks.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

const BAND_LIMIT: usize = 64;

struct Circle {
    center: Vec2,
    radius: f32,
    velocity: Vec2,
    destination: Vec2,
    arrived: bool,
    life: f32,
    max_life: f32,
    alive_frames: u32,
    min_alive_frames: u32,
    pop_bias: f32,
}

pub struct CirclePacking {
    rng: SmallRng,
    circles: Vec<Circle>,
}

impl CirclePacking {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            circles: Vec::new(),
        }
    }

    fn random_velocity(rng: &mut SmallRng, s: f32) -> Vec2 {
        let ang = rng.gen::<f32>() * std::f32::consts::TAU;
        Vec2::new(ang.cos(), ang.sin()) * (s + rng.gen::<f32>() * s)
    }

    fn spawn(&mut self, w: f32, h: f32) {
        let destination = Vec2::new(self.rng.gen::<f32>() * w, self.rng.gen::<f32>() * h);
        let velocity = Self::random_velocity(&mut self.rng, 0.5);
        let min_alive = 30 + self.rng.gen_range(0..90);
        let pop_bias = self.rng.gen::<f32>() * 0.8 + 0.2;
        self.circles.push(Circle {
            center: Vec2::new(self.rng.gen::<f32>() * w, self.rng.gen::<f32>() * h),
            radius: 6.0,
            velocity,
            destination,
            arrived: false,
            life: 180.0,
            max_life: 180.0,
            alive_frames: 0,
            min_alive_frames: min_alive,
            pop_bias,
        });
    }

    fn respawn(rng: &mut SmallRng, c: &mut Circle, w: f32, h: f32) {
        c.center = match rng.gen_range(0..4) {
            0 => Vec2::new(-20.0, rng.gen::<f32>() * h),
            1 => Vec2::new(w + 20.0, rng.gen::<f32>() * h),
            2 => Vec2::new(rng.gen::<f32>() * w, -20.0),
            _ => Vec2::new(rng.gen::<f32>() * w, h + 20.0),
        };
        c.velocity = Self::random_velocity(rng, 1.0);
        c.radius = 8.0 + rng.gen::<f32>() * 14.0;
        c.life = 180.0 + rng.gen::<f32>() * 240.0;
        c.max_life = c.life;
        c.destination = Vec2::new(rng.gen::<f32>() * w, rng.gen::<f32>() * h);
        c.arrived = false;
        c.alive_frames = 0;
        c.min_alive_frames = 30 + rng.gen_range(0..90);
        c.pop_bias = rng.gen::<f32>() * 0.8 + 0.2;
    }

    /// Randomized pop threshold with a per-circle bias; peaks well above the
    /// smoothed level are what trigger it.
    fn should_pop(rng: &mut SmallRng, peak: f32, energy: f32, sens: f32, bias: f32) -> bool {
        let audio_factor = (peak - energy) * 4.0 + sens * 0.6 + rng.gen::<f32>() * 0.6;
        audio_factor > 1.2 * (1.0 - bias * 0.5)
    }
}

impl Default for CirclePacking {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for CirclePacking {
    fn name(&self) -> &'static str {
        "circle-packing"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let snapshot = input.snapshot;
        let features = snapshot.features;
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;

        let sens = (features.level * 0.5
            + features.low_band * 0.4
            + features.high_band * 0.6
            + features.beat_pulse.min(1.0) * 0.6)
            .min(1.5);

        let bands = snapshot.smoothed.len().min(BAND_LIMIT);
        while self.circles.len() < bands {
            self.spawn(w, h);
        }

        let count = self.circles.len();
        let bins = snapshot.smoothed.len().max(1);
        for i in 0..count {
            let idx = (i as f32 / count as f32 * (bins - 1) as f32) as usize;
            let energy = snapshot.smoothed[idx];
            let peak = snapshot.peaks[idx];
            let c = &mut self.circles[i];

            let pop_ready = c.arrived
                && Self::should_pop(&mut self.rng, peak, energy, sens, c.pop_bias);
            let bump = 1.0
                + if pop_ready { 1.2 } else { 0.0 }
                + features.beat_pulse.min(1.0) * 0.4;
            let target = 10.0 + energy * features.gain * 26.0 * bump;
            c.radius = c.radius * 0.86 + target * 0.14;

            let to_dest = c.destination - c.center;
            let dist = to_dest.length();
            if dist > 2.0 {
                c.velocity += to_dest / dist.max(1.0) * (0.05 + sens * 0.08);
            } else {
                c.arrived = true;
            }
            c.center += c.velocity * (0.6 + sens * 1.1);
            c.velocity *= 0.985;

            if c.center.x < -30.0 {
                c.center.x = w + 30.0;
            }
            if c.center.x > w + 30.0 {
                c.center.x = -30.0;
            }
            if c.center.y < -30.0 {
                c.center.y = h + 30.0;
            }
            if c.center.y > h + 30.0 {
                c.center.y = -30.0;
            }

            c.alive_frames += 1;
            c.life -= 1.0 + energy * 6.0 + features.beat_pulse.min(1.0) * 4.0;
            let allow_pop = c.arrived && c.alive_frames >= c.min_alive_frames;
            let pops = allow_pop
                && Self::should_pop(&mut self.rng, peak, energy, sens, c.pop_bias);
            if pops || c.life <= 0.0 {
                Self::respawn(&mut self.rng, c, w, h);
            }
        }

        // One separation pass keeps neighbours from overlapping hard.
        for i in 0..count {
            for j in (i + 1)..count {
                let d = self.circles[j].center - self.circles[i].center;
                let dist = d.length();
                let min_dist = self.circles[i].radius + self.circles[j].radius + 4.0;
                if dist > 0.0 && dist < min_dist {
                    let push = d / dist * ((min_dist - dist) * 0.4);
                    self.circles[i].center -= push;
                    self.circles[j].center += push;
                }
            }
        }

        for (i, c) in self.circles.iter().enumerate() {
            let color_pos =
                (i as f32 / count as f32 + features.hue_base / 360.0).rem_euclid(1.0);
            let alpha = (255.0 * (c.life / c.max_life.max(1.0))).max(40.0) as u8;
            let fill = input.palette.color_at(color_pos).with_alpha(alpha);
            canvas.fill_circle(c.center.x, c.center.y, c.radius, fill, Blend::Add);
            canvas.stroke_circle(
                c.center.x,
                c.center.y,
                c.radius,
                Color::WHITE.with_alpha(60),
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
    fn one_circle_per_band_up_to_the_limit() {
        let mut viz = CirclePacking::new();
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
        assert_eq!(viz.circles.len(), BAND_LIMIT);
        assert!(lit_pixels(&canvas) > 200);
    }

    #[test]
    fn radii_grow_toward_the_energy_target() {
        let mut viz = CirclePacking::new();
        let mut canvas = Canvas::new(80, 60);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        viz.render(&mut canvas, &input);
        for _ in 0..30 {
            viz.render(&mut canvas, &input);
        }
        assert!(viz.circles.iter().any(|c| c.radius > 6.0));
    }
}
