//! The built-in generative renderers.
//!
//! Shared math lives here: the perspective projection used by every 3D
//! effect, the log compression applied to raw spectrum bins before they
//! drive geometry, and the wedge fold behind the kaleidoscope pair.

pub mod boids;
pub mod circle_packing;
pub mod crt_glitch;
pub mod fractal_kaleidoscope;
pub mod fractal_tree;
pub mod kaleidoscope;
pub mod metaballs;
pub mod pipes3d;
pub mod plasma;
pub mod radial_spectrum;
pub mod spectrum_bars;
pub mod starfield;
pub mod terrain;
pub mod tunnel;
pub mod voronoi;
pub mod waveform;

use glam::{Vec2, Vec3};

use crate::render::{Blend, Canvas};

/// Camera field of view shared by the 3D renderers.
pub(crate) const FOV_DEGREES: f32 = 60.0;

/// Perspective scale for a viewport of the given height.
pub(crate) fn perspective_scale(height: f32) -> f32 {
    height / (2.0 * (FOV_DEGREES.to_radians() / 2.0).tan())
}

/// Projects a world point to screen space. The camera sits 100 units in
/// front of the origin; z is clamped so points behind the eye plane cannot
/// blow the perspective divide up to infinity.
pub(crate) fn project_safe(p: Vec3, scale: f32, width: f32, height: f32) -> Vec2 {
    let z = p.z.max(-90.0);
    let factor = scale / (z + 100.0);
    Vec2::new(p.x * factor + width / 2.0, -p.y * factor + height / 2.0)
}

/// Log compression of one gained magnitude: `log10(1 + 9v)`, keeping quiet
/// detail visible without letting loud passages pin every bin at full scale.
pub(crate) fn compress(value: f32, gain: f32) -> f32 {
    (1.0 + value * gain * 9.0).log10()
}

/// Fills `out` with the compressed view of a raw spectrum.
pub(crate) fn compress_into(src: &[f32], gain: f32, out: &mut Vec<f32>) {
    out.clear();
    out.extend(src.iter().map(|&v| compress(v, gain)));
}

pub(crate) fn average(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Normalized spectral centroid of an already-compressed spectrum; 0.5 when
/// there is no energy to weigh.
pub(crate) fn centroid_norm(values: &[f32]) -> f32 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (i, &v) in values.iter().enumerate() {
        weighted += v * i as f32;
        total += v;
    }
    if total > 0.0 {
        weighted / total / values.len().max(1) as f32
    } else {
        0.5
    }
}

/// Mirror-folds a square seed texture into `wedges` rotated sectors around
/// the canvas center. Each destination pixel maps back into the first wedge
/// (odd sectors mirrored) and samples the seed by polar lookup.
pub(crate) fn fold_wedges(
    dst: &mut Canvas,
    seed: &Canvas,
    wedges: u32,
    rotate_deg: f32,
    zoom: f32,
) {
    if dst.is_degenerate() || seed.is_degenerate() || wedges == 0 {
        return;
    }
    let w = dst.width() as f32;
    let h = dst.height() as f32;
    let cx = w / 2.0;
    let cy = h / 2.0;
    let wedge = std::f32::consts::TAU / wedges as f32;
    let rotate = rotate_deg.to_radians();
    let zoom = zoom.max(0.01);
    // Screen radius to seed radius.
    let tex = seed.width() as f32;
    let radial_scale = tex / w.min(h).max(1.0);
    let seed_cx = tex / 2.0;
    let seed_cy = seed.height() as f32 / 2.0;

    for y in 0..dst.height() {
        let dy = (y as f32 - cy) / zoom;
        for x in 0..dst.width() {
            let dx = (x as f32 - cx) / zoom;
            let r = (dx * dx + dy * dy).sqrt();
            let mut a = (dy.atan2(dx) - rotate).rem_euclid(2.0 * wedge);
            if a > wedge {
                a = 2.0 * wedge - a;
            }
            let sr = r * radial_scale;
            let sx = seed_cx + a.cos() * sr;
            let sy = seed_cy + a.sin() * sr;
            if sx < 0.0 || sy < 0.0 {
                continue;
            }
            if let Some(c) = seed.pixel_at(sx as usize, sy as usize) {
                dst.put(x as i32, y as i32, c, Blend::Over);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_clamps_points_behind_the_eye() {
        let scale = perspective_scale(600.0);
        let p = project_safe(Vec3::new(10.0, 10.0, -5000.0), scale, 800.0, 600.0);
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn projection_centers_the_origin() {
        let scale = perspective_scale(600.0);
        let p = project_safe(Vec3::ZERO, scale, 800.0, 600.0);
        assert_eq!(p, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn compression_is_monotonic_and_bounded_at_zero() {
        assert_eq!(compress(0.0, 10.0), 0.0);
        assert!(compress(0.2, 10.0) < compress(0.4, 10.0));
    }

    #[test]
    fn centroid_of_silence_is_midway() {
        assert_eq!(centroid_norm(&[0.0; 16]), 0.5);
    }

    #[test]
    fn centroid_shifts_toward_energetic_bins() {
        let mut spectrum = [0.0; 16];
        spectrum[14] = 1.0;
        assert!(centroid_norm(&spectrum) > 0.7);
    }
}
