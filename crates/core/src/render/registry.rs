//! Index-addressed registry of the built-in visualizers.

use crate::visuals;

use super::Visualizer;

/// Ordered collection of renderer instances. Indices are stable and match
/// the persisted `visual_index` configuration value.
pub struct VisualizerRegistry {
    visuals: Vec<Box<dyn Visualizer>>,
}

impl VisualizerRegistry {
    /// Builds the full built-in renderer set.
    pub fn new() -> Self {
        Self::from_visuals(vec![
            Box::new(visuals::spectrum_bars::SpectrumBars::new()),
            Box::new(visuals::waveform::Waveform::new()),
            Box::new(visuals::radial_spectrum::RadialSpectrum::new()),
            Box::new(visuals::fractal_tree::FractalTree::new()),
            Box::new(visuals::pipes3d::Pipes3d::new()),
            Box::new(visuals::kaleidoscope::Kaleidoscope::new()),
            Box::new(visuals::terrain::AudioTerrain::new()),
            Box::new(visuals::tunnel::NeonTunnel::new()),
            Box::new(visuals::metaballs::Metaballs::new()),
            Box::new(visuals::boids::Boids::new()),
            Box::new(visuals::circle_packing::CirclePacking::new()),
            Box::new(visuals::starfield::Starfield::new()),
            Box::new(visuals::crt_glitch::CrtGlitch::new()),
            Box::new(visuals::fractal_kaleidoscope::FractalKaleidoscope::new()),
            Box::new(visuals::voronoi::Voronoi::new()),
            Box::new(visuals::plasma::Plasma::new()),
        ])
    }

    /// Builds a registry from an explicit renderer list.
    pub fn from_visuals(visuals: Vec<Box<dyn Visualizer>>) -> Self {
        Self { visuals }
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.visuals.iter().map(|v| v.name()).collect()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Visualizer + 'static)> {
        self.visuals.get_mut(index).map(|v| v.as_mut())
    }
}

impl Default for VisualizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::render::{Canvas, FrameInput};
    use crate::visuals::testutil::lively_snapshot;

    #[test]
    fn registers_all_sixteen_renderers() {
        let registry = VisualizerRegistry::new();
        assert_eq!(registry.len(), 16);
        let names = registry.names();
        assert_eq!(names[0], "spectrum-bars");
        assert_eq!(names[15], "plasma");
    }

    #[test]
    fn get_mut_hands_out_a_renderer_that_can_draw() {
        let mut registry = VisualizerRegistry::new();
        let mut canvas = Canvas::new(64, 48);
        let snapshot = lively_snapshot();
        let palette = Palette::rainbow();
        let input = FrameInput {
            snapshot: &snapshot,
            palette: &palette,
        };

        let visual = registry.get_mut(0).unwrap();
        assert_eq!(visual.name(), "spectrum-bars");
        visual.render(&mut canvas, &input);

        assert!(registry.get_mut(registry.len()).is_none());
    }
}
