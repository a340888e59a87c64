//! Fixed-interval frame scheduler.
//!
//! A cooperative render loop: copy the latest reactive snapshot, dispatch
//! the active visualizer, hand the framebuffer to the presentation sink,
//! then sleep out the remainder of the frame period. Slow frames are simply
//! late; there is no frame skipping. A panicking renderer loses its frame,
//! never the loop.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::palette::{Color, Palette};
use crate::state::{ReactiveSnapshot, SharedReactiveState};
use crate::Result;

use super::{Canvas, FrameInput, VisualizerRegistry};

/// Target frame period (~60 Hz).
pub const FRAME_PERIOD: Duration = Duration::from_millis(16);

/// Receives each finished frame. The presentation surface (window, OBS
/// layer, encoder) lives on the host side of this trait.
pub trait PresentSink {
    fn present(&mut self, canvas: &Canvas) -> Result<()>;
}

/// Cloneable remote control for a running scheduler: stop it or switch the
/// active visualizer between ticks.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    running: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

impl SchedulerHandle {
    /// Requests the loop to exit after the current frame. Idempotent.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Selects the visualizer used from the next tick onward.
    pub fn set_active(&self, index: usize) {
        self.active.store(index, Ordering::SeqCst);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Timer-driven consumer of the shared reactive state.
pub struct RenderScheduler {
    shared: Arc<SharedReactiveState>,
    registry: VisualizerRegistry,
    palette: Palette,
    handle: SchedulerHandle,
    period: Duration,
    canvas: Canvas,
    snapshot: ReactiveSnapshot,
}

impl RenderScheduler {
    pub fn new(
        shared: Arc<SharedReactiveState>,
        registry: VisualizerRegistry,
        palette: Palette,
        width: usize,
        height: usize,
        visual_index: usize,
    ) -> Self {
        let handle = SchedulerHandle {
            running: Arc::new(AtomicBool::new(true)),
            active: Arc::new(AtomicUsize::new(visual_index)),
        };
        Self {
            shared,
            registry,
            palette,
            handle,
            period: FRAME_PERIOD,
            canvas: Canvas::new(width, height),
            snapshot: ReactiveSnapshot::default(),
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Resizes the framebuffer before the next frame.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.canvas.resize(width, height);
    }

    /// Runs the render loop until the handle stops it. Must be stopped
    /// before the presentation surface is torn down.
    pub fn run(&mut self, sink: &mut dyn PresentSink) -> Result<()> {
        tracing::info!(
            visuals = self.registry.len(),
            width = self.canvas.width(),
            height = self.canvas.height(),
            "render scheduler started"
        );
        while self.handle.is_running() {
            let frame_start = Instant::now();
            self.tick(sink)?;
            if let Some(rest) = self.period.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        tracing::info!("render scheduler stopped");
        Ok(())
    }

    /// Produces exactly one frame.
    pub fn tick(&mut self, sink: &mut dyn PresentSink) -> Result<()> {
        // Copy-then-release: the lock is never held while drawing.
        self.shared.snapshot_into(&mut self.snapshot)?;

        let index = if self.registry.is_empty() {
            return Ok(());
        } else {
            self.handle.active().min(self.registry.len() - 1)
        };

        self.canvas.clear(Color::BLACK);
        let input = FrameInput {
            snapshot: &self.snapshot,
            palette: &self.palette,
        };

        let canvas = &mut self.canvas;
        let visual = match self.registry.get_mut(index) {
            Some(v) => v,
            None => return Ok(()),
        };
        let name = visual.name();
        let outcome = catch_unwind(AssertUnwindSafe(|| visual.render(canvas, &input)));
        match outcome {
            Ok(()) => sink.present(&self.canvas)?,
            Err(_) => {
                tracing::warn!(visual = name, "renderer panicked; frame skipped");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Visualizer;

    struct CountingSink {
        frames: usize,
        stop_after: usize,
        handle: Option<SchedulerHandle>,
    }

    impl PresentSink for CountingSink {
        fn present(&mut self, canvas: &Canvas) -> Result<()> {
            assert!(!canvas.is_degenerate());
            self.frames += 1;
            if self.frames >= self.stop_after {
                if let Some(handle) = &self.handle {
                    handle.stop();
                }
            }
            Ok(())
        }
    }

    struct SolidFill;

    impl Visualizer for SolidFill {
        fn name(&self) -> &'static str {
            "solid-fill"
        }

        fn render(&mut self, canvas: &mut Canvas, _input: &FrameInput<'_>) {
            canvas.clear(Color::WHITE);
        }
    }

    struct AlwaysPanics;

    impl Visualizer for AlwaysPanics {
        fn name(&self) -> &'static str {
            "always-panics"
        }

        fn render(&mut self, _canvas: &mut Canvas, _input: &FrameInput<'_>) {
            panic!("intentional test panic");
        }
    }

    fn scheduler_with(visuals: Vec<Box<dyn Visualizer>>) -> RenderScheduler {
        RenderScheduler::new(
            Arc::new(SharedReactiveState::new()),
            VisualizerRegistry::from_visuals(visuals),
            Palette::rainbow(),
            32,
            24,
            0,
        )
    }

    #[test]
    fn runs_until_the_handle_stops_it() {
        let mut scheduler = scheduler_with(vec![Box::new(SolidFill)]);
        scheduler.set_period(Duration::from_millis(1));
        let mut sink = CountingSink {
            frames: 0,
            stop_after: 3,
            handle: Some(scheduler.handle()),
        };
        scheduler.run(&mut sink).unwrap();
        assert_eq!(sink.frames, 3);
    }

    #[test]
    fn panicking_renderer_skips_the_frame_not_the_loop() {
        let mut scheduler = scheduler_with(vec![Box::new(AlwaysPanics)]);
        let mut sink = CountingSink {
            frames: 0,
            stop_after: 1,
            handle: None,
        };
        // Frame is skipped, no present call, no propagated panic.
        scheduler.tick(&mut sink).unwrap();
        scheduler.tick(&mut sink).unwrap();
        assert_eq!(sink.frames, 0);
    }

    #[test]
    fn switching_the_active_index_takes_effect_next_tick() {
        let mut scheduler = scheduler_with(vec![Box::new(AlwaysPanics), Box::new(SolidFill)]);
        let handle = scheduler.handle();
        let mut sink = CountingSink {
            frames: 0,
            stop_after: usize::MAX,
            handle: None,
        };

        scheduler.tick(&mut sink).unwrap();
        assert_eq!(sink.frames, 0);

        handle.set_active(1);
        scheduler.tick(&mut sink).unwrap();
        assert_eq!(sink.frames, 1);
    }

    #[test]
    fn out_of_range_index_clamps_to_the_last_renderer() {
        let mut scheduler = scheduler_with(vec![Box::new(SolidFill)]);
        scheduler.handle().set_active(99);
        let mut sink = CountingSink {
            frames: 0,
            stop_after: usize::MAX,
            handle: None,
        };
        scheduler.tick(&mut sink).unwrap();
        assert_eq!(sink.frames, 1);
    }
}
