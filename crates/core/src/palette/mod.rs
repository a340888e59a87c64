//! Color palette support.
//!
//! Renderers never pick raw RGB values for their main features; they sample
//! the active [`Palette`] either linearly (`color_at`) or cyclically through
//! a hue angle (`color_cyclic`). Malformed user colors are skipped rather
//! than propagated into the render path.

use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Scales the RGB channels by `factor` in [0, 1], leaving alpha alone.
    pub fn scaled(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * f) as u8,
            g: (self.g as f32 * f) as u8,
            b: (self.b as f32 * f) as u8,
            a: self.a,
        }
    }

    /// Converts from HSV with hue in degrees and saturation/value in
    /// [0, 100], matching the ranges the renderer tuning constants assume.
    pub fn from_hsv(hue: f32, saturation: f32, value: f32) -> Self {
        let h = hue.rem_euclid(360.0);
        let s = (saturation / 100.0).clamp(0.0, 1.0);
        let v = (value / 100.0).clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;
        let (r1, g1, b1) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Color::rgb(
            ((r1 + m) * 255.0) as u8,
            ((g1 + m) * 255.0) as u8,
            ((b1 + m) * 255.0) as u8,
        )
    }

    /// Parses `#RRGGBB` or `RRGGBB`, case insensitive.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Color::rgb(r, g, b))
    }

    fn lerp(a: Color, b: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color::rgb(
            (a.r as f32 * (1.0 - t) + b.r as f32 * t) as u8,
            (a.g as f32 * (1.0 - t) + b.g as f32 * t) as u8,
            (a.b as f32 * (1.0 - t) + b.b as f32 * t) as u8,
        )
    }
}

/// Names of the built-in palettes, in menu order.
pub const BUILTIN_PALETTES: &[&str] = &[
    "Rainbow",
    "Neon",
    "Ocean",
    "Fire",
    "Sunset",
    "Synthwave",
    "Monochrome",
    "Forest",
];

/// An ordered, non-empty list of colors sampled by the renderers.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::rainbow()
    }
}

impl Palette {
    /// Builds a palette from an explicit color list. An empty list falls
    /// back to the default rainbow palette so sampling never fails.
    pub fn new(colors: Vec<Color>) -> Self {
        if colors.is_empty() {
            Self::rainbow()
        } else {
            Self { colors }
        }
    }

    /// Builds a palette from hex strings, skipping entries that fail to
    /// parse. If nothing survives, the rainbow fallback applies.
    pub fn from_hex<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut colors = Vec::with_capacity(entries.len());
        for entry in entries {
            match Color::parse_hex(entry.as_ref()) {
                Some(color) => colors.push(color),
                None => {
                    tracing::warn!(color = entry.as_ref(), "skipping malformed palette color")
                }
            }
        }
        Self::new(colors)
    }

    /// Looks up one of the built-in palettes by name.
    pub fn named(name: &str) -> Option<Self> {
        let hex: &[&str] = match name {
            "Rainbow" => &[
                "#FF0000", "#FF8000", "#FFFF00", "#80FF00", "#00FF00", "#00FF80", "#00FFFF",
                "#0080FF", "#0000FF", "#8000FF", "#FF00FF", "#FF0080",
            ],
            "Neon" => &[
                "#FF0080", "#FF00FF", "#8000FF", "#0080FF", "#00FFFF", "#00FF80", "#80FF00",
                "#FFFF00",
            ],
            "Ocean" => &[
                "#001122", "#003366", "#0066AA", "#0099CC", "#33AADD", "#66CCEE", "#99DDFF",
                "#CCEEEE",
            ],
            "Fire" => &[
                "#660000", "#CC0000", "#FF3300", "#FF6600", "#FF9900", "#FFCC00", "#FFFF00",
                "#FFFF99",
            ],
            "Sunset" => &[
                "#2E1065", "#6A1B9A", "#AD1457", "#D32F2F", "#F57C00", "#FBC02D", "#FFE082",
                "#FFF3E0",
            ],
            "Synthwave" => &[
                "#FF00FF", "#FF0080", "#8000FF", "#0080FF", "#00FFFF", "#FF8000", "#FFFF00",
                "#FF0040",
            ],
            "Monochrome" => &["#000000", "#333333", "#666666", "#999999", "#CCCCCC", "#FFFFFF"],
            "Forest" => &[
                "#0D2818", "#1B5E20", "#2E7D32", "#43A047", "#66BB6A", "#81C784", "#A5D6A7",
                "#C8E6C9",
            ],
            _ => return None,
        };
        Some(Self::from_hex(hex))
    }

    /// The default palette used whenever no usable selection exists.
    pub fn rainbow() -> Self {
        Self::named("Rainbow").unwrap_or(Self {
            colors: vec![Color::WHITE],
        })
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Samples the palette at `t` in [0, 1] by linear interpolation between
    /// the two nearest entries: `index = t * (n - 1)`, blend = fract(index).
    pub fn color_at(&self, t: f32) -> Color {
        match self.colors.len() {
            0 => Color::WHITE,
            1 => self.colors[0],
            n => {
                let t = t.clamp(0.0, 1.0);
                let exact = t * (n - 1) as f32;
                let index = exact.floor() as usize;
                let next = (index + 1).min(n - 1);
                if index == next {
                    self.colors[index]
                } else {
                    Color::lerp(self.colors[index], self.colors[next], exact - index as f32)
                }
            }
        }
    }

    /// Samples the palette cyclically through a hue angle in degrees.
    pub fn color_cyclic(&self, hue: f32) -> Color {
        self.color_at(hue.rem_euclid(360.0) / 360.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!(Color::parse_hex("#FF8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::parse_hex("ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::parse_hex("#GG0000"), None);
        assert_eq!(Color::parse_hex("#FFF"), None);
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let palette = Palette::from_hex(&["#102030", "oops", "#405060"]);
        assert_eq!(palette.colors().len(), 2);
    }

    #[test]
    fn empty_palette_falls_back_to_rainbow() {
        let palette = Palette::new(Vec::new());
        assert_eq!(palette.colors().len(), 12);
    }

    #[test]
    fn single_color_palette_is_constant() {
        let only = Color::rgb(10, 20, 30);
        let palette = Palette::new(vec![only]);
        for t in [0.0_f32, 0.25, 0.5, 0.99, 1.0] {
            assert_eq!(palette.color_at(t), only);
        }
    }

    #[test]
    fn three_color_palette_interpolates_midpoint() {
        let palette = Palette::new(vec![
            Color::rgb(0, 0, 0),
            Color::rgb(100, 100, 100),
            Color::rgb(200, 200, 200),
        ]);
        // t = 0.5 maps to exact index 1 when n = 3.
        assert_eq!(palette.color_at(0.5), Color::rgb(100, 100, 100));
        // Quarter point blends half way between entries 0 and 1.
        assert_eq!(palette.color_at(0.25), Color::rgb(50, 50, 50));
    }

    #[test]
    fn cyclic_sampling_wraps_the_hue() {
        let palette = Palette::rainbow();
        assert_eq!(palette.color_cyclic(0.0), palette.color_cyclic(360.0));
        assert_eq!(palette.color_cyclic(-90.0), palette.color_cyclic(270.0));
    }

    #[test]
    fn hsv_primaries_convert_exactly() {
        assert_eq!(Color::from_hsv(0.0, 100.0, 100.0), Color::rgb(255, 0, 0));
        assert_eq!(Color::from_hsv(120.0, 100.0, 100.0), Color::rgb(0, 255, 0));
        assert_eq!(Color::from_hsv(240.0, 100.0, 100.0), Color::rgb(0, 0, 255));
        assert_eq!(Color::from_hsv(0.0, 0.0, 100.0), Color::rgb(255, 255, 255));
    }
}
