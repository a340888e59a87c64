//! Kaleidoscope fed by branching fractals and superformula rosettes.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::palette::Color;
use crate::render::{Blend, Canvas, FrameInput, Visualizer};
use crate::state::ReactiveFeatures;

use super::{centroid_norm, fold_wedges};

const WEDGES: u32 = 16;
const ROSETTE_STEPS: usize = 360;

pub struct FractalKaleidoscope {
    rng: SmallRng,
    seed: Canvas,
}

impl FractalKaleidoscope {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
            seed: Canvas::new(0, 0),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn branch(
        &mut self,
        features: &ReactiveFeatures,
        x: f32,
        y: f32,
        angle: f32,
        depth: i32,
        length: f32,
        hue_base: f32,
        id: i32,
    ) {
        if depth <= 0 || length < 2.0 {
            return;
        }
        let x2 = x + angle.cos() * length;
        let y2 = y + angle.sin() * length;
        let hue = (hue_base + id as f32 * 11.0 + length * 0.2) % 360.0;
        let glow = Color::from_hsv(hue, 70.0, 80.0).with_alpha(50);
        let line = Color::from_hsv(hue, 80.0, 100.0).with_alpha(180);
        self.seed
            .thick_line(x, y, x2, y2, depth as f32 * 1.6, glow, Blend::Add);
        self.seed
            .thick_line(x, y, x2, y2, depth as f32 * 0.9, line, Blend::Over);

        let jitter = 0.3 + features.high_band * 0.7;
        let shrink = 0.68 + features.level * 0.05;
        self.branch(
            features,
            x2,
            y2,
            angle - (0.6 + jitter * 0.4),
            depth - 1,
            length * shrink,
            hue_base,
            id + 1,
        );
        self.branch(
            features,
            x2,
            y2,
            angle + (0.6 + jitter * 0.4),
            depth - 1,
            length * shrink,
            hue_base,
            id + 2,
        );
        if self.rng.gen::<f32>() < 0.25 + features.beat_pulse * 0.3 {
            let stray = angle + self.rng.gen_range(-0.6..0.6);
            self.branch(
                features,
                x2,
                y2,
                stray,
                depth - 2,
                length * 0.55,
                hue_base,
                id + 3,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn rosette(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        m: f32,
        n1: f32,
        n2: f32,
        n3: f32,
        rotation: f32,
        color: Color,
        glow: Color,
    ) {
        let mut prev: Option<(f32, f32)> = None;
        for i in 0..=ROSETTE_STEPS {
            let ang = i as f32 / ROSETTE_STEPS as f32 * std::f32::consts::TAU + rotation;
            let r = superformula(ang, m, n1, n2, n3);
            let x = cx + ang.cos() * r * radius;
            let y = cy + ang.sin() * r * radius;
            if let Some((px, py)) = prev {
                self.seed.thick_line(px, py, x, y, 4.0, glow, Blend::Add);
                self.seed.line(px, py, x, y, color, Blend::Over);
            }
            prev = Some((x, y));
        }
    }
}

/// Gielis superformula radius for rosette outlines.
fn superformula(ang: f32, m: f32, n1: f32, n2: f32, n3: f32) -> f32 {
    let term1 = (m * ang / 4.0).cos().abs().powf(n2);
    let term2 = (m * ang / 4.0).sin().abs().powf(n3);
    let r = (term1 + term2).powf(-1.0 / n1);
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

impl Default for FractalKaleidoscope {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for FractalKaleidoscope {
    fn name(&self) -> &'static str {
        "fractal-kaleidoscope"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let features = input.snapshot.features;
        let level = features.level;
        let centroid = centroid_norm(&input.snapshot.smoothed);
        let hue_base = (features.hue_base + centroid * 360.0) % 360.0;

        let s = canvas.width().min(canvas.height());
        let tex = (s / 2).max(96);
        if self.seed.width() != tex {
            self.seed.resize(tex, tex);
        }
        let texf = tex as f32;

        // Dim radial backdrop so the fold never shows hard seams.
        self.seed
            .clear(Color::from_hsv((hue_base + 200.0) % 360.0, 30.0, 10.0));
        self.seed.fill_circle(
            texf / 2.0,
            texf / 2.0,
            texf * 0.35,
            Color::from_hsv((hue_base + 20.0) % 360.0, 30.0, 20.0).with_alpha(160),
            Blend::Over,
        );

        let seeds = 5 + (level * 6.0) as usize;
        let base_len = texf * (0.08 + level * 0.1 + features.beat_pulse * 0.14);
        for i in 0..seeds {
            let ang = i as f32 * std::f32::consts::TAU / seeds as f32
                + features.phase * 0.01;
            let cx = texf / 2.0 + ang.cos() * texf * 0.08;
            let cy = texf / 2.0 + ang.sin() * texf * 0.08;
            let start_angle = ang + self.rng.gen_range(-0.4..0.4);
            let depth = 5 + (level * 4.0) as i32;
            self.branch(&features, cx, cy, start_angle, depth, base_len, hue_base, 0);
        }

        let shapes = 3 + (level * 4.0) as usize;
        for i in 0..shapes {
            let rot = i as f32 * std::f32::consts::TAU / shapes as f32
                + features.phase * 0.005;
            let radius = texf * (0.18 + i as f32 * 0.06);
            let m = 4.0 + level * 8.0 + self.rng.gen_range(-1.5..1.5);
            let n1 = 0.3 + self.rng.gen::<f32>() * 0.8;
            let n2 = 0.2 + level * 0.6;
            let n3 = 0.2 + features.high_band * 0.6;
            let hue = (hue_base + i as f32 * 22.0 + features.beat_pulse * 50.0) % 360.0;
            let color = Color::from_hsv(hue, 70.0, 100.0).with_alpha(180);
            let glow = Color::from_hsv(hue, 60.0, 80.0).with_alpha(50);
            self.rosette(
                texf / 2.0,
                texf / 2.0,
                radius,
                m,
                n1,
                n2,
                n3,
                rot,
                color,
                glow,
            );
        }

        let rotate = (features.phase * 0.1 + features.beat_pulse * 8.0) % 360.0;
        let zoom = 1.0 + level * 0.35;
        fold_wedges(canvas, &self.seed, WEDGES, rotate, zoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn fold_fills_the_frame_from_the_seed() {
        let mut viz = FractalKaleidoscope::new();
        let mut canvas = Canvas::new(96, 96);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        viz.render(
            &mut canvas,
            &FrameInput {
                snapshot: &snapshot,
                palette: &palette,
            },
        );
        assert!(lit_pixels(&canvas) > 1000);
    }

    #[test]
    fn superformula_never_returns_non_finite_radii() {
        for i in 0..720 {
            let ang = i as f32 * 0.01;
            let r = superformula(ang, 6.0, 0.5, 0.3, 0.3);
            assert!(r.is_finite());
        }
    }
}
