//! Lava-lamp plasma field rendered to a low-resolution texture and
//! stretched over the frame. Heavy smoothing keeps the motion musical
//! instead of flickery.

use crate::render::{Blend, Canvas, FrameInput, Visualizer};

const TEXTURE_LIMIT: usize = 160;

pub struct Plasma {
    time: f32,
    hue_base: f32,
    brightness: f32,
    smoothed_bass: f32,
    smoothed_treble: f32,
    smoothed_level: f32,
    texture: Canvas,
}

impl Plasma {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            hue_base: 0.0,
            brightness: 0.5,
            smoothed_bass: 0.0,
            smoothed_treble: 0.0,
            smoothed_level: 0.0,
            texture: Canvas::new(0, 0),
        }
    }
}

impl Default for Plasma {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualizer for Plasma {
    fn name(&self) -> &'static str {
        "plasma"
    }

    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>) {
        if canvas.is_degenerate() {
            return;
        }
        let features = input.snapshot.features;

        self.smoothed_bass = self.smoothed_bass * 0.85 + features.low_band * 0.15;
        self.smoothed_treble = self.smoothed_treble * 0.80 + features.high_band * 0.20;
        self.smoothed_level = self.smoothed_level * 0.90 + features.level * 0.10;
        let smooth_pulse = (features.beat_pulse * 0.6).min(1.0);

        self.time += 0.008 + self.smoothed_level * 0.02 + smooth_pulse * 0.05;

        let target_brightness = 0.3 + self.smoothed_bass * 0.4 + smooth_pulse * 0.3;
        self.brightness = (self.brightness * 0.92 + target_brightness * 0.08).min(1.0);

        let hue_speed = self.smoothed_treble * 0.5 + smooth_pulse + 0.1;
        self.hue_base = (self.hue_base + hue_speed) % 360.0;

        let tw = (canvas.width() / 2).clamp(1, TEXTURE_LIMIT);
        let th = (canvas.height() / 2).clamp(1, TEXTURE_LIMIT);
        if self.texture.width() != tw || self.texture.height() != th {
            self.texture.resize(tw, th);
        }

        let w1 = self.time * 0.8;
        let w2 = self.time * 0.6;
        let w3 = self.time * 1.2;
        let w4 = self.time * 0.4;
        let amp1 = 0.8 + self.smoothed_level * 0.4;
        let amp2 = 1.0 + self.smoothed_bass * 0.6;
        let amp3 = 0.6 + self.smoothed_treble * 0.8;
        let amp4 = 0.9 + smooth_pulse * 0.3;
        let edge_sharpness = 0.5 + self.smoothed_treble * 0.3;

        for y in 0..th {
            let ny = (y as f32 - th as f32 * 0.5) / th as f32;
            for x in 0..tw {
                let nx = (x as f32 - tw as f32 * 0.5) / tw as f32;

                let wave1 = (nx * 8.0 * amp1 + w1).sin() * (ny * 6.0 * amp1 + w1 * 1.3).sin();
                let wave2 = ((nx + ny) * 5.0 * amp2 + w2).sin()
                    * ((nx - ny) * 7.0 * amp2 + w2 * 0.8).sin();
                let wave3 = ((nx * nx + ny * ny).sqrt() * 12.0 * amp3 + w3).sin()
                    * (ny.atan2(nx) * 4.0 + w3 * 1.5).sin();
                let wave4 = (nx * ny * 15.0 * amp4 + w4).sin()
                    * ((nx + ny) * 9.0 * amp4 + w4 * 0.6).sin();

                let plasma = ((wave1 + wave2 + wave3 + wave4) * 0.25 + 1.0) * 0.5;
                let brightness = (plasma * self.brightness).min(1.0).powf(edge_sharpness);

                // Three palette taps blended by slowly shifting weights.
                let c1 = input.palette.color_at(plasma.rem_euclid(1.0));
                let c2 = input.palette.color_at((plasma + 0.33).rem_euclid(1.0));
                let c3 = input.palette.color_at((plasma + 0.67).rem_euclid(1.0));

                let pi = std::f32::consts::PI;
                let mut b1 = 0.5 + 0.5 * (plasma * pi * 1.5 + w1 * 0.5).sin();
                let mut b2 = 0.5 + 0.5 * (plasma * pi * 2.0 + w2 * 0.5).sin();
                let mut b3 = 0.5 + 0.5 * (plasma * pi * 1.2 + w3 * 0.5).sin();
                let total = b1 + b2 + b3;
                if total > 0.0 {
                    b1 /= total;
                    b2 /= total;
                    b3 /= total;
                } else {
                    b1 = 1.0 / 3.0;
                    b2 = 1.0 / 3.0;
                    b3 = 1.0 / 3.0;
                }

                let glow = 1.0 + smooth_pulse * 0.2;
                let mix = |a: u8, b: u8, c: u8| {
                    let v = (a as f32 * b1 + b as f32 * b2 + c as f32 * b3)
                        * brightness
                        * glow;
                    v.min(255.0) as u8
                };
                let color = crate::palette::Color::rgb(
                    mix(c1.r, c2.r, c3.r),
                    mix(c1.g, c2.g, c3.g),
                    mix(c1.b, c2.b, c3.b),
                );
                self.texture.put(x as i32, y as i32, color, Blend::Over);
            }
        }

        canvas.blit_scaled(&self.texture, Blend::Over);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::visuals::testutil::{lit_pixels, lively_snapshot};

    #[test]
    fn plasma_covers_the_whole_frame() {
        let mut viz = Plasma::new();
        let mut canvas = Canvas::new(64, 48);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };
        for _ in 0..10 {
            viz.render(&mut canvas, &input);
        }
        // Brightness ramps up over a few frames; most pixels end up lit.
        assert!(lit_pixels(&canvas) > 64 * 48 / 2);
    }

    #[test]
    fn time_advances_faster_with_music_than_in_silence() {
        let palette = Palette::rainbow();
        let lively = lively_snapshot();
        let quiet = crate::state::ReactiveSnapshot::default();

        let mut with_music = Plasma::new();
        let mut in_silence = Plasma::new();
        let mut canvas = Canvas::new(16, 16);
        for _ in 0..10 {
            with_music.render(
                &mut canvas,
                &FrameInput {
                    snapshot: &lively,
                    palette: &palette,
                },
            );
            in_silence.render(
                &mut canvas,
                &FrameInput {
                    snapshot: &quiet,
                    palette: &palette,
                },
            );
        }
        assert!(with_music.time > in_silence.time);
    }
}
