//! Rendering framework: the framebuffer, the visualizer contract, the
//! registry of renderers, and the frame scheduler.

pub mod canvas;
pub mod registry;
pub mod scheduler;

pub use canvas::{Blend, Canvas};
pub use registry::VisualizerRegistry;
pub use scheduler::{PresentSink, RenderScheduler, SchedulerHandle};

use crate::palette::Palette;
use crate::state::ReactiveSnapshot;

/// Everything a renderer may look at for one frame.
pub struct FrameInput<'a> {
    pub snapshot: &'a ReactiveSnapshot,
    pub palette: &'a Palette,
}

/// One generative renderer. Implementations own their persistent entity
/// state (particles, grids, sites) and mutate it only from `render`, which
/// the scheduler calls on the render thread exclusively.
pub trait Visualizer: Send {
    fn name(&self) -> &'static str;

    /// Draws one frame. Must degrade to minimal motion while
    /// `input.snapshot.features.is_silent` and must tolerate degenerate
    /// canvases.
    fn render(&mut self, canvas: &mut Canvas, input: &FrameInput<'_>);
}
