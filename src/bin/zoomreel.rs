use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use zoomreel::{
    CancelToken, EncodeRequest, FailurePolicy, FfmpegEncoder, InterpolationPolicy, JobResult,
    JobStatus, OutputFileExists, ProcessRenderer, RunReport, VideoEncoder, ZoomConfig,
    ZoomPipeline,
};

#[derive(Parser, Debug)]
#[command(name = "zoomreel", version)]
struct Cli {
    /// Only log warnings and errors (RUST_LOG still wins when set).
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every missing frame, then encode the video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Print the frame plan as JSON without rendering anything.
    Plan(PlanArgs),
    /// Encode already-rendered frames into a video.
    Encode(EncodeArgs),
    /// Print the default configuration as JSON.
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Run configuration JSON. Omitted fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory that receives the frame images.
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Output video path.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    duration_secs: Option<f64>,

    /// Zoom pacing.
    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    /// Per-frame shrink ratio for the exponential policy.
    #[arg(long)]
    ratio: Option<f64>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    cfg: ConfigArgs,

    /// Concurrent renderer processes.
    #[arg(long)]
    workers: Option<usize>,

    /// Renderer executable.
    #[arg(long)]
    renderer: Option<PathBuf>,

    /// Extra attempts for a frame whose render failed.
    #[arg(long)]
    retries: Option<u32>,

    /// Kill a renderer that runs longer than this.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Skip encoding when any frame failed.
    #[arg(long)]
    abort_on_failure: bool,

    /// Write the per-frame run report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    cfg: ConfigArgs,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    #[command(flatten)]
    cfg: ConfigArgs,
}

#[derive(Args, Debug)]
struct InitConfigArgs {
    /// Write to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Linear,
    Exponential,
    Geometric,
    RelativeGeometric,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);
    match cli.cmd {
        Command::Render(args) => cmd_render(args, cli.quiet),
        Command::Plan(args) => cmd_plan(args),
        Command::Encode(args) => cmd_encode(args),
        Command::InitConfig(args) => cmd_init_config(args),
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &ConfigArgs) -> anyhow::Result<ZoomConfig> {
    let mut cfg = match &args.config {
        Some(path) => ZoomConfig::load(path)?,
        None => ZoomConfig::default(),
    };
    if let Some(dir) = &args.frames_dir {
        cfg.naming.dir = dir.clone();
    }
    if let Some(out) = &args.out {
        cfg.encoder.out_path = out.clone();
    }
    if let Some(fps) = args.fps {
        cfg.timing.fps = fps;
    }
    if let Some(secs) = args.duration_secs {
        cfg.timing.duration_secs = secs;
    }

    let current_ratio = match cfg.policy {
        InterpolationPolicy::Exponential { ratio } => Some(ratio),
        _ => None,
    };
    cfg.policy = match (args.policy, args.ratio) {
        (Some(PolicyChoice::Linear), _) => InterpolationPolicy::Linear,
        (Some(PolicyChoice::Geometric), _) => InterpolationPolicy::Geometric,
        (Some(PolicyChoice::RelativeGeometric), _) => InterpolationPolicy::RelativeGeometric,
        (Some(PolicyChoice::Exponential), ratio) => InterpolationPolicy::Exponential {
            ratio: ratio.or(current_ratio).unwrap_or(0.9),
        },
        (None, Some(ratio)) => {
            if current_ratio.is_none() {
                anyhow::bail!("--ratio only applies to the exponential policy");
            }
            InterpolationPolicy::Exponential { ratio }
        }
        (None, None) => cfg.policy,
    };
    Ok(cfg)
}

fn cmd_render(args: RenderArgs, quiet: bool) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.cfg)?;
    if let Some(workers) = args.workers {
        cfg.workers = workers;
    }
    if let Some(program) = args.renderer {
        cfg.renderer.program = program;
    }
    if let Some(retries) = args.retries {
        cfg.retries = retries;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.renderer.timeout_secs = Some(secs);
    }
    if args.abort_on_failure {
        cfg.failure_policy = FailurePolicy::AbortOnFailure;
    }

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, letting running frames finish");
        on_signal.cancel();
    })
    .context("install Ctrl-C handler")?;

    let renderer = ProcessRenderer::new(cfg.renderer.program.clone())
        .with_leading_args(cfg.renderer.args.iter().cloned())
        .with_timeout(cfg.renderer.timeout());
    let encoder = FfmpegEncoder::new(cfg.encoder.clone())?;
    let pipeline = ZoomPipeline::new(cfg)?.with_cancel(cancel);

    let bar = progress_bar(pipeline.plan().len() as u64, quiet || args.no_progress)?;
    let observer = |result: &JobResult, _completed: usize, _total: usize| {
        if result.status == JobStatus::Failed {
            bar.println(format!(
                "frame {} failed: {}",
                result.index,
                result
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default()
            ));
        }
        bar.inc(1);
    };
    let frames = pipeline.render_frames(&renderer, &OutputFileExists, &observer)?;
    bar.finish_and_clear();

    if let Some(path) = &args.report {
        let report = RunReport {
            failed: frames.failed_indices(),
            frames: frames.clone(),
        };
        write_json(path, &report)?;
    }

    let report = pipeline.encode(frames, &encoder)?;
    let c = report.frames.counts();
    eprintln!(
        "wrote {} ({} rendered, {} skipped, {} failed)",
        pipeline.config().encoder.out_path.display(),
        c.rendered,
        c.skipped,
        c.failed
    );
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.cfg)?;
    let plan = cfg.plan()?;
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &plan).context("write plan JSON")?;
    writeln!(out)?;
    Ok(())
}

fn cmd_encode(args: EncodeArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.cfg)?;
    cfg.validate()?;
    let encoder = FfmpegEncoder::new(cfg.encoder.clone())?;
    encoder.encode(&EncodeRequest {
        fps: cfg.timing.fps,
        frames_glob: cfg.naming.glob_pattern(),
    })?;
    eprintln!("wrote {}", cfg.encoder.out_path.display());
    Ok(())
}

fn cmd_init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    let json = ZoomConfig::default().to_json_pretty()?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, format!("{json}\n"))
                .with_context(|| format!("write config '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn progress_bar(len: u64, hidden: bool) -> anyhow::Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .context("progress bar template")?
        .progress_chars("#>-"),
    );
    Ok(bar)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report dir '{}'", parent.display()))?;
    }
    let f = std::fs::File::create(path)
        .with_context(|| format!("create report '{}'", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(f), value)
        .with_context(|| format!("write report '{}'", path.display()))?;
    Ok(())
}
