//! Self-growing 3D pipe lattice, screensaver style.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

use super::{perspective_scale, project_safe};

const MAX_SYSTEMS: usize = 8;
const MAX_SEGMENTS: usize = 400;
const BOUND_XY: f32 = 250.0;
const MIN_Z: f32 = -80.0;
const MAX_Z: f32 = 260.0;

struct Segment {
    start: Vec3,
    end: Vec3,
    color: Color,
}

struct PipeHead {
    position: Vec3,
    direction: Vec3,
}

pub struct Pipes3d {
    rng: SmallRng,
    systems: Vec<Vec<Segment>>,
    heads: Vec<PipeHead>,
    frame: u32,
}

impl Pipes3d {
    pub fn new() -> Self {
        let mut this = Self {
            rng: SmallRng::from_entropy(),
            systems: Vec::new(),
            heads: Vec::new(),
            frame: 0,
        };
        this.seed_pipe();
        this
    }

    fn seed_pipe(&mut self) {
        self.heads.push(PipeHead {
            position: Vec3::new(0.0, 0.0, 50.0),
            direction: Vec3::Y,
        });
        self.systems.push(Vec::new());
    }

    fn random_unit(&mut self, spread: f32) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-1.0..1.0),
            self.rng.gen_range(-1.0..1.0),
            self.rng.gen_range(-1.0..1.0),
        ) * spread
    }

    fn grow(&mut self, input: &FrameInput<'_>) {
        let features = input.snapshot.features;
        let level = features.level;
        let speed = 6.0 + level * 20.0 + features.beat_pulse * 30.0;
        let turn = 0.15 + level * 0.5 + features.beat_pulse * 1.2;
        let iterations =
            1 + (level * 2.0) as usize + usize::from(features.beat_pulse > 0.6);

        for _ in 0..iterations {
            for i in 0..self.heads.len() {
                let jitter = self.random_unit(turn);
                let head = &mut self.heads[i];
                head.direction = (head.direction + jitter).normalize_or_zero();
                if head.direction == Vec3::ZERO {
                    head.direction = Vec3::Y;
                }
                let mut next = head.position + head.direction * speed;

                // Reflect at the walls.
                if next.x.abs() > BOUND_XY {
                    head.direction.x = -head.direction.x;
                    next = head.position + head.direction * speed;
                }
                if next.y.abs() > BOUND_XY {
                    head.direction.y = -head.direction.y;
                    next = head.position + head.direction * speed;
                }
                if next.z < MIN_Z || next.z > MAX_Z {
                    head.direction.z = -head.direction.z;
                    next = head.position + head.direction * speed;
                }

                let hue = (features.hue_base
                    + level * 120.0
                    + features.beat_pulse * 180.0
                    + self.frame as f32 * 0.2)
                    % 360.0;
                let sat = (70.0 + level * 30.0 + features.beat_pulse * 30.0).min(100.0);
                let val = (80.0 + level * 20.0 + features.beat_pulse * 30.0).min(100.0);
                let color = Color::from_hsv(hue, sat, val);

                let start = self.heads[i].position;
                self.systems[i].push(Segment {
                    start,
                    end: next,
                    color,
                });
                self.heads[i].position = next;
                let direction = self.heads[i].direction;

                let split_chance =
                    0.01 + 0.05 * level + 0.12 * features.beat_pulse.min(1.0);
                if self.systems.len() < MAX_SYSTEMS && self.rng.gen::<f32>() < split_chance {
                    let branch_dir =
                        (direction + self.random_unit(0.6)).normalize_or_zero();
                    let branch_dir = if branch_dir == Vec3::ZERO {
                        Vec3::X
                    } else {
                        branch_dir
                    };
                    self.heads.push(PipeHead {
                        position: next,
                        direction: branch_dir,
                    });
                    self.systems.push(vec![Segment {
                        start: next,
                        end: next + branch_dir * (speed * 0.5),
                        color,
                    }]);
                }

                let system = &mut self.systems[i];
                if system.len() > MAX_SEGMENTS {
                    let excess = system.len() - MAX_SEGMENTS;
                    system.drain(..excess);
                }
            }
            if self.heads.is_empty() {
                self.seed_pipe();
            }
        }
    }
}

impl Default for Pipes3d {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Pipes3d {
    fn name(&self) -> &'static str {
        "pipes-3d"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        self.frame = self.frame.wrapping_add(1);
        self.grow(input);

        let w = canvas.width() as f32;
        let h = canvas.height() as f32;
        let scale = perspective_scale(h);

        for system in &self.systems {
            for segment in system {
                let p1 = project_safe(segment.start, scale, w, h);
                let p2 = project_safe(segment.end, scale, w, h);
                let depth1 = (segment.start.z + 120.0).max(10.0);
                let depth2 = (segment.end.z + 120.0).max(10.0);
                let avg_depth = (depth1 + depth2) / 2.0;

                canvas.thick_line(
                    p1.x,
                    p1.y,
                    p2.x,
                    p2.y,
                    (24.0 / avg_depth).max(1.6),
                    segment.color,
                    Blend::Over,
                );
                canvas.fill_circle(
                    p2.x,
                    p2.y,
                    (12.0 / avg_depth).max(1.2),
                    segment.color.with_alpha(220),
                    Blend::Over,
                );
            }
        }
    }
}
