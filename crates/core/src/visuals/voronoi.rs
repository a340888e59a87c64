//! Jittering Voronoi relaxation graph: sites glow, nearest neighbours link.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};

const SITE_COUNT: usize = 64;
const NEIGHBOUR_LINKS: usize = 3;

pub struct Voronoi {
    rng: SmallRng,
    sites: Vec<Vec2>,
    neighbours: Vec<(f32, usize)>,
}

impl Voronoi {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            sites: Vec::new(),
            neighbours: Vec::new(),
        }
    }
}

impl Default for Voronoi {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Voronoi {
    fn name(&self) -> &'static str {
        "voronoi"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let snapshot = input.snapshot;
        let features = snapshot.features;
        let w = canvas.width() as f32;
        let h = canvas.height() as f32;

        while self.sites.len() < SITE_COUNT {
            self.sites
                .push(Vec2::new(self.rng.gen::<f32>() * w, self.rng.gen::<f32>() * h));
        }

        let bins = snapshot.smoothed.len().max(1);
        for i in 0..self.sites.len() {
            let idx = (i as f32 / self.sites.len() as f32 * (bins - 1) as f32) as usize;
            let energy = (snapshot.smoothed[idx] * features.gain * 0.8).min(1.5);
            let jitter = Vec2::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            ) * (2.0 + energy * 8.0 + features.beat_pulse * 6.0);
            let mut p = self.sites[i] + jitter;
            if p.x < 0.0 {
                p.x += w;
            }
            if p.x > w {
                p.x -= w;
            }
            if p.y < 0.0 {
                p.y += h;
            }
            if p.y > h {
                p.y -= h;
            }
            self.sites[i] = p;
        }

        let edge_alpha = (60.0 + features.beat_pulse * 120.0).min(255.0) as u8;
        let edge = Color::WHITE.with_alpha(edge_alpha);

        for i in 0..self.sites.len() {
            let a = self.sites[i];
            self.neighbours.clear();
            for (j, &b) in self.sites.iter().enumerate() {
                if j != i {
                    self.neighbours.push((a.distance_squared(b), j));
                }
            }
            self.neighbours
                .sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal));

            let fill = input
                .palette
                .color_cyclic(features.hue_base + i as f32 * 5.0)
                .with_alpha(60);
            canvas.fill_circle(
                a.x,
                a.y,
                6.0 + features.beat_pulse * 8.0,
                fill,
                Blend::Add,
            );
            for &(_, j) in self.neighbours.iter().take(NEIGHBOUR_LINKS) {
                let b = self.sites[j];
                canvas.line(a.x, a.y, b.x, b.y, edge, Blend::Add);
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
    fn sites_spawn_once_and_stay_in_bounds() {
        let mut viz = Voronoi::new();
        let mut canvas = Canvas::new(100, 80);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        for _ in 0..10 {
            viz.render(&mut canvas, &input);
        }
        assert_eq!(viz.sites.len(), SITE_COUNT);
        assert!(viz
            .sites
            .iter()
            .all(|p| p.x >= -0.01 && p.x <= 100.01 && p.y >= -0.01 && p.y <= 80.01));
        assert!(lit_pixels(&canvas) > 100);
    }
}
