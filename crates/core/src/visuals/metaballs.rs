//! Drifting glow blobs whose count and brightness track the mix energy.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

const MIN_BALLS: usize = 10;
const MAX_BALLS: usize = 60;

struct Ball {
    position: Vec2,
    velocity: Vec2,
    radius: f32,
}

pub struct Metaballs {
    rng: SmallRng,
    balls: Vec<Ball>,
}

impl Metaballs {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            balls: Vec::new(),
        }
    }
}

impl Default for Metaballs {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Metaballs {
    fn name(&self) -> &'static str {
        "metaballs"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let features = input.snapshot.features;
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;

        let glow = (features.level * 0.5
            + features.low_band * 0.7
            + features.high_band * 0.3
            + features.beat_pulse.min(1.0) * 0.6)
            .min(1.5);

        let target = (14 + (glow * 30.0) as usize).clamp(MIN_BALLS, MAX_BALLS);
        while self.balls.len() < target {
            let velocity = Vec2::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            ) * 0.9;
            self.balls.push(Ball {
                position: Vec2::new(self.rng.gen_range(0.0..w), self.rng.gen_range(0.0..h)),
                velocity,
                radius: 14.0 + self.rng.gen::<f32>() * 18.0,
            });
        }
        if self.balls.len() > target {
            let excess = self.balls.len() - target;
            self.balls.drain(..excess);
        }

        let speed_boost = 0.6 + glow * 1.8;
        let center = Vec2::new(w / 2.0, h / 2.0);
        for ball in &mut self.balls {
            ball.position += ball.velocity * speed_boost;
            ball.velocity += (center - ball.position).normalize_or_zero() * 0.0025;
            ball.velocity *= 0.994;

            if ball.position.x < -60.0 {
                ball.position.x = w + 60.0;
            }
            if ball.position.x > w + 60.0 {
                ball.position.x = -60.0;
            }
            if ball.position.y < -60.0 {
                ball.position.y = h + 60.0;
            }
            if ball.position.y > h + 60.0 {
                ball.position.y = -60.0;
            }
        }

        let alpha = (70.0 + glow * 150.0).min(220.0) as u8;
        let hue_offset = (features.hue_base * 0.3) % 360.0;
        let outline_alpha = (20.0 + glow * 30.0).min(60.0) as u8;
        let max_draw = w.max(h) * 0.2;

        for (i, ball) in self.balls.iter().enumerate() {
            let radius = (ball.radius * (0.9 + glow * 1.2)).max(10.0).min(max_draw);
            let color = input
                .palette
                .color_cyclic(hue_offset + i as f32 * 12.0)
                .with_alpha(alpha);
            canvas.fill_circle(ball.position.x, ball.position.y, radius, color, Blend::Add);
            canvas.stroke_circle(
                ball.position.x,
                ball.position.y,
                radius,
                Color::WHITE.with_alpha(outline_alpha),
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
    fn ball_count_tracks_energy_within_bounds() {
        let mut viz = Metaballs::new();
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
        assert!(viz.balls.len() >= MIN_BALLS && viz.balls.len() <= MAX_BALLS);
        assert!(lit_pixels(&canvas) > 200);
    }

    #[test]
    fn silence_shrinks_the_pool_toward_the_floor() {
        let mut viz = Metaballs::new();
        let mut canvas = Canvas::new(60, 40);
        let lively = lively_snapshot();
        let quiet = crate::state::ReactiveSnapshot::default();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &lively,
                palette: &palette,
            },
        );
        let busy = viz.balls.len();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &quiet,
                palette: &palette,
            },
        );
        assert!(viz.balls.len() <= busy);
        assert!(viz.balls.len() >= MIN_BALLS);
    }
}
