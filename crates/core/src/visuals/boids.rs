//! Confetti swarm chasing a circling bass attractor.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::render::{Blend, Canvas, FrameInput, Visualizer};
use crate::state::ReactiveFeatures;

const MAX_PARTICLES: usize = 900;

struct Particle {
    position: Vec2,
    velocity: Vec2,
    size: f32,
    hue: f32,
    life: f32,
    max_life: f32,
}

pub struct Boids {
    rng: SmallRng,
    particles: Vec<Particle>,
}

impl Boids {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            particles: Vec::new(),
        }
    }

    fn spawn_burst(&mut self, w: f32, h: f32, hue_base: f32, count: usize) {
        let center = Vec2::new(w / 2.0, h / 2.0);
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            let angle = self.rng.gen::<f32>() * std::f32::consts::TAU;
            let speed = 0.8 + self.rng.gen::<f32>() * 3.0;
            let offset = Vec2::new(
                self.rng.gen_range(-0.5..0.5) * 60.0,
                self.rng.gen_range(-0.5..0.5) * 60.0,
            );
            let life = 120.0 + self.rng.gen::<f32>() * 180.0;
            self.particles.push(Particle {
                position: center + offset,
                velocity: Vec2::new(angle.cos(), angle.sin()) * speed,
                size: 0.8 + self.rng.gen::<f32>() * 1.6,
                hue: (hue_base + self.rng.gen_range(0.0..360.0)) % 360.0,
                life,
                max_life: 180.0,
            });
        }
    }

    fn respawn(rng: &mut SmallRng, p: &mut Particle, center: Vec2, hue_base: f32) {
        let angle = rng.gen::<f32>() * std::f32::consts::TAU;
        let speed = 0.8 + rng.gen::<f32>() * 3.0;
        p.position = center
            + Vec2::new(rng.gen_range(-0.5..0.5) * 60.0, rng.gen_range(-0.5..0.5) * 60.0);
        p.velocity = Vec2::new(angle.cos(), angle.sin()) * speed;
        p.size = 0.8 + rng.gen::<f32>() * 1.6;
        p.hue = (hue_base + rng.gen_range(0.0..360.0)) % 360.0;
        p.life = 120.0 + rng.gen::<f32>() * 180.0;
        p.max_life = 180.0;
    }

    fn sensitivity(features: &ReactiveFeatures) -> f32 {
        (features.level * 0.4
            + features.low_band * 0.7
            + features.high_band * 0.3
            + features.beat_pulse.min(1.0) * 0.6)
            .min(1.5)
    }
}

impl Default for Boids {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Boids {
    fn name(&self) -> &'static str {
        "boids"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let features = input.snapshot.features;
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let sens = Self::sensitivity(&features);

        let baseline = (120 + (sens * 300.0) as usize).min(MAX_PARTICLES);
        if features.beat_pulse > 0.7 {
            let burst = 30 + (sens * 60.0) as usize;
            self.spawn_burst(w, h, features.hue_base, burst);
        }
        if self.particles.len() < baseline {
            let missing = baseline - self.particles.len();
            self.spawn_burst(w, h, features.hue_base, missing);
        } else if self.particles.len() > baseline {
            let excess = self.particles.len() - baseline;
            self.particles.drain(..excess);
        }

        let gravity = Vec2::new(0.0, 0.12 + sens * 0.6);
        let center = Vec2::new(w / 2.0, h / 2.0);
        let t = features.phase * 0.01;
        let bass_point =
            center + Vec2::new(t.cos() * 220.0, (t * 1.4).sin() * 140.0);
        let max_speed = 1.8 + sens * 8.0;

        for p in &mut self.particles {
            let to_bass = bass_point - p.position;
            let dist = to_bass.length().max(20.0);
            let dir = to_bass / dist;

            let mut accel = dir
                * (0.4 + features.low_band * 7.0 + features.beat_pulse.min(1.0) * 10.0);
            accel += Vec2::new(
                self.rng.gen_range(-0.5..0.5),
                self.rng.gen_range(-0.5..0.5),
            ) * (0.6 + features.high_band * 4.5);
            accel += gravity * 0.5;

            p.velocity += accel * 0.08;
            let spd = p.velocity.length();
            if spd > max_speed {
                p.velocity *= max_speed / spd;
            }
            p.position += p.velocity;

            p.life -= 1.0;
            if p.life <= 0.0 {
                Self::respawn(&mut self.rng, p, center, features.hue_base);
            }

            if p.position.x < -20.0 {
                p.position.x = w + 20.0;
            }
            if p.position.x > w + 20.0 {
                p.position.x = -20.0;
            }
            if p.position.y < -20.0 {
                p.position.y = h + 20.0;
            }
            if p.position.y > h + 20.0 {
                p.position.y = -20.0;
            }

            p.hue = (p.hue
                + features.high_band * 8.0
                + features.beat_pulse.min(1.0) * 16.0)
                % 360.0;
        }

        for p in &self.particles {
            let life_t = p.life / p.max_life.max(1.0);
            let alpha = (40.0 + life_t * 160.0 + sens * 60.0).clamp(0.0, 255.0) as u8;
            let color = input.palette.color_cyclic(p.hue).with_alpha(alpha);
            let thickness = 1.0 + p.size * (0.6 + sens * 0.7);
            let heading = if p.velocity == Vec2::ZERO {
                Vec2::X
            } else {
                p.velocity.normalize()
            };
            let tail = p.position - heading * (6.0 + sens * 28.0);
            canvas.thick_line(
                p.position.x,
                p.position.y,
                tail.x,
                tail.y,
                thickness,
                color,
                Blend::Add,
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
    fn swarm_size_stays_bounded() {
        let mut viz = Boids::new();
        let mut canvas = Canvas::new(120, 90);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        for _ in 0..20 {
            viz.render(&mut canvas, &input);
        }
        assert!(viz.particles.len() <= MAX_PARTICLES);
        assert!(lit_pixels(&canvas) > 100);
    }

    #[test]
    fn expired_particles_respawn_instead_of_leaking() {
        let mut viz = Boids::new();
        let mut canvas = Canvas::new(60, 40);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        viz.render(&mut canvas, &input);
        for p in &mut viz.particles {
            p.life = 1.0;
        }
        viz.render(&mut canvas, &input);
        assert!(viz.particles.iter().all(|p| p.life > 0.0));
    }
}
