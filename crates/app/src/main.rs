use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lumiviz_core::{
    AnalysisEngine, AppConfig, AudioCapture, Canvas, Palette, PresentSink, RenderScheduler,
    SchedulerHandle, SharedReactiveState, VisualizerRegistry,
};
use tracing_subscriber::EnvFilter;

fn main() -> lumiviz_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Devices => list_devices(),
        Commands::Visuals => list_visuals(),
    }
}

fn run(args: RunArgs) -> lumiviz_core::Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::live_defaults(),
    };
    if let Some(device) = args.device {
        config.audio.device = Some(device);
    }
    if let Some(visual) = args.visual {
        config.visual_index = visual;
    }
    if let Some(palette) = args.palette {
        config.palette.name = palette;
    }
    if let Some(width) = args.width {
        config.window.width = width;
    }
    if let Some(height) = args.height {
        config.window.height = height;
    }

    let palette = resolve_palette(&config);
    let registry = VisualizerRegistry::new();
    tracing::info!(
        visual = registry.names().get(config.visual_index).copied(),
        palette = %config.palette.name,
        "starting visualizer"
    );

    let shared = Arc::new(SharedReactiveState::new());
    let engine = AnalysisEngine::with_sample_rate(config.audio.sample_rate);
    let capture = AudioCapture::start(config.audio.device.as_deref(), engine, shared.clone())?;
    tracing::info!(device = capture.device_name(), "capture running");

    let mut scheduler = RenderScheduler::new(
        shared,
        registry,
        palette,
        config.window.width as usize,
        config.window.height as usize,
        config.visual_index,
    );
    let handle = scheduler.handle();
    let mut sink = StatsSink::new(handle.clone(), args.frames);

    install_shutdown_handler(handle);
    scheduler.run(&mut sink)?;
    drop(capture);
    tracing::info!(frames = sink.frames, "session finished");
    Ok(())
}

fn resolve_palette(config: &AppConfig) -> Palette {
    if !config.palette.custom.is_empty() {
        return Palette::from_hex(&config.palette.custom);
    }
    Palette::named(&config.palette.name).unwrap_or_else(|| {
        tracing::warn!(name = %config.palette.name, "unknown palette, using Rainbow");
        Palette::rainbow()
    })
}

fn list_devices() -> lumiviz_core::Result<()> {
    let devices = lumiviz_core::list_input_devices()?;
    if devices.is_empty() {
        println!("no capture devices found");
    }
    for name in devices {
        println!("{name}");
    }
    Ok(())
}

fn list_visuals() -> lumiviz_core::Result<()> {
    for (index, name) in VisualizerRegistry::new().names().iter().enumerate() {
        println!("{index:2}  {name}");
    }
    Ok(())
}

fn install_shutdown_handler(handle: SchedulerHandle) {
    // Ctrl-C stops the render loop; capture stops when its guard drops.
    if let Err(err) = ctrlc_handler(handle) {
        tracing::warn!(%err, "could not install shutdown handler");
    }
}

fn ctrlc_handler(handle: SchedulerHandle) -> std::io::Result<()> {
    // Spawn a thread that waits for SIGINT-equivalent input on stdin close.
    // A windowing host would hook its close event here instead.
    std::thread::Builder::new()
        .name("shutdown-watch".into())
        .spawn(move || {
            let mut buf = String::new();
            // Blocks until stdin reaches EOF (or fails), then stops the loop.
            while std::io::stdin().read_line(&mut buf).unwrap_or(0) > 0 {
                buf.clear();
            }
            handle.stop();
        })
        .map(|_| ())
}

/// Presentation sink for headless runs: counts frames, logs level stats at a
/// low cadence, and stops the scheduler after an optional frame limit.
struct StatsSink {
    handle: SchedulerHandle,
    frames: u64,
    limit: Option<u64>,
}

impl StatsSink {
    fn new(handle: SchedulerHandle, limit: Option<u64>) -> Self {
        Self {
            handle,
            frames: 0,
            limit,
        }
    }
}

impl PresentSink for StatsSink {
    fn present(&mut self, canvas: &Canvas) -> lumiviz_core::Result<()> {
        self.frames += 1;
        if self.frames % 300 == 0 {
            tracing::debug!(
                frames = self.frames,
                width = canvas.width(),
                height = canvas.height(),
                "rendering"
            );
        }
        if let Some(limit) = self.limit {
            if self.frames >= limit {
                self.handle.stop();
            }
        }
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive music visualizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture audio and run the render loop.
    Run(RunArgs),
    /// List the capture devices the default audio host exposes.
    Devices,
    /// List the built-in visualizers and their indices.
    Visuals,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Capture device name; defaults to the host default input.
    #[arg(short, long)]
    device: Option<String>,
    /// Visualizer index (see `visuals`).
    #[arg(short, long)]
    visual: Option<usize>,
    /// Built-in palette name.
    #[arg(short, long)]
    palette: Option<String>,
    /// Framebuffer width in pixels.
    #[arg(long)]
    width: Option<u32>,
    /// Framebuffer height in pixels.
    #[arg(long)]
    height: Option<u32>,
    /// JSON configuration file; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Stop after this many frames (useful for smoke tests).
    #[arg(long)]
    frames: Option<u64>,
}
