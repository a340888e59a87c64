//! Core library for the LumiViz audio visualizer.
//!
//! The crate is split along the data flow: `audio` captures samples and
//! feeds the `analysis` engine, which publishes [`state::ReactiveSnapshot`]s
//! through the shared reactive state; the `render` scheduler consumes them
//! at a fixed frame rate and dispatches one of the generative renderers in
//! `visuals`, colored through `palette` and configured via `config`.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod palette;
pub mod render;
pub mod state;
pub mod visuals;

pub use analysis::AnalysisEngine;
pub use audio::{list_input_devices, AudioCapture};
pub use config::{AppConfig, AudioConfig, PaletteConfig, WindowConfig};
pub use error::{Result, VizError};
pub use palette::{Color, Palette, BUILTIN_PALETTES};
pub use render::{
    Canvas, FrameInput, PresentSink, RenderScheduler, SchedulerHandle, Visualizer,
    VisualizerRegistry,
};
pub use state::{ReactiveFeatures, ReactiveSnapshot, SharedReactiveState};
