use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use gratings::{
    ColorMode, Direction, Fps, Orientation, PhaseSequence, RenderThreading, StimulusConfig,
    WaveType,
};

#[derive(Parser, Debug)]
#[command(name = "gratings", version)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the full phase sweep as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the resolved configuration and sequence summary as JSON.
    Plan(PlanArgs),
}

/// Stimulus flags. Values given here override the `--config` file, which overrides defaults.
#[derive(Args, Debug)]
struct StimulusArgs {
    /// JSON stimulus config file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    colour: Option<ColorMode>,

    #[arg(long, value_enum)]
    wave: Option<WaveType>,

    #[arg(long, value_enum)]
    orientation: Option<Orientation>,

    #[arg(long, value_enum)]
    direction: Option<Direction>,

    #[arg(long)]
    spatial_frequency: Option<f64>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Integer output frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Phase increment between frames, in degrees.
    #[arg(long)]
    phase_step: Option<f64>,

    /// Number of full 360 degree sweeps.
    #[arg(long)]
    cycles: Option<u32>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    stimulus: StimulusArgs,

    /// Phase in degrees.
    #[arg(long, default_value_t = 1.0)]
    phase: f64,

    /// Output PNG path (defaults to `<stem>.png`).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    stimulus: StimulusArgs,

    /// Output MP4 path (defaults to `<out-dir>/<stem>.mp4`).
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Directory for the derived output name.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_overwrite: bool,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Frames per parallel batch (parallel mode only).
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(flatten)]
    stimulus: StimulusArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn resolve_config(args: &StimulusArgs) -> anyhow::Result<StimulusConfig> {
    let mut cfg = match &args.config {
        Some(path) => StimulusConfig::from_json_path(path)
            .with_context(|| format!("load stimulus config '{}'", path.display()))?,
        None => StimulusConfig::default(),
    };

    if let Some(v) = args.colour {
        cfg.colour = v;
    }
    if let Some(v) = args.wave {
        cfg.wave = v;
    }
    if let Some(v) = args.orientation {
        cfg.orientation = v;
    }
    if let Some(v) = args.direction {
        cfg.direction = v;
    }
    if let Some(v) = args.spatial_frequency {
        cfg.spatial_frequency = v;
    }
    if let Some(v) = args.width {
        cfg.width = v;
    }
    if let Some(v) = args.height {
        cfg.height = v;
    }
    if let Some(v) = args.fps {
        cfg.timing.fps = Fps::new(v, 1)?;
    }
    if let Some(v) = args.phase_step {
        cfg.timing.phase_step_deg = v;
    }
    if let Some(v) = args.cycles {
        cfg.timing.cycles = v;
    }

    cfg.validate()?;
    Ok(cfg)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(&args.stimulus)?;
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("{}.png", cfg.file_stem())));

    let frame = gratings::synthesize(&cfg.grating_params(args.phase))?;
    gratings::write_png(&frame, &out)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(&args.stimulus)?;
    let out = match (args.out, args.out_dir) {
        (Some(out), _) => out,
        (None, dir) => dir
            .unwrap_or_default()
            .join(format!("{}.mp4", cfg.file_stem())),
    };

    let threading = RenderThreading {
        parallel: args.parallel,
        chunk_size: args.chunk_size,
        threads: args.threads,
    };

    let stats = gratings::render_to_mp4(&cfg, &out, &threading, !args.no_overwrite)
        .with_context(|| format!("render '{}'", out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {:.2}s)",
        out.display(),
        stats.frames_total,
        stats.duration_secs
    );
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = resolve_config(&args.stimulus)?;
    let phases = PhaseSequence::for_config(&cfg)?;
    let frames = phases.len() as u64;

    let summary = serde_json::json!({
        "config": &cfg,
        "file_stem": cfg.file_stem(),
        "frames": frames,
        "first_phase_deg": phases.as_slice().first(),
        "last_phase_deg": phases.as_slice().last(),
        "fps": cfg.timing.fps.as_f64(),
        "duration_secs": cfg.timing.fps.frames_to_secs(frames),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
