use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use swing_tempo::analysis::{
    calculate_ratio_from_frames, preset_by_id, presets_for_mode, SwingAnalysis, TempoMode,
    TempoPreset,
};
use swing_tempo::config::AppConfig;
use swing_tempo::detection::ImageSequenceExtractor;
use swing_tempo::engine::{TempoEngine, TempoReport};
use swing_tempo::managers::DetectionOutcome;
use swing_tempo::testing::{FlakyExtractor, SyntheticSwing, SyntheticSwingExtractor};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tempo_cli",
    about = "Swing tempo analysis harness: presets, ratios, comparisons and phase detection"
)]
struct Cli {
    /// JSON configuration file (defaults to assets/tempo_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level written to stderr (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List target presets
    Presets {
        #[arg(long)]
        mode: Option<TempoMode>,
    },
    /// Compute the tempo ratio of a frame triple
    Ratio {
        #[arg(long)]
        takeaway: u32,
        #[arg(long)]
        top: u32,
        #[arg(long)]
        impact: u32,
    },
    /// Compare a swing against a target preset
    Compare {
        /// Saved SwingAnalysis JSON record
        #[arg(long, conflicts_with_all = ["takeaway", "top", "impact"])]
        analysis: Option<PathBuf>,
        #[arg(long, requires_all = ["top", "impact"])]
        takeaway: Option<u32>,
        #[arg(long)]
        top: Option<u32>,
        #[arg(long)]
        impact: Option<u32>,
        /// Explicit preset id (e.g. long-24-8)
        #[arg(long, conflicts_with = "mode")]
        preset: Option<String>,
        #[arg(long)]
        mode: Option<TempoMode>,
    },
    /// Detect swing phases in a directory of still frames
    Detect {
        #[arg(long)]
        frames_dir: PathBuf,
        #[arg(long)]
        fps: f64,
        #[arg(long)]
        mode: Option<TempoMode>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Detect swing phases in a rendered synthetic swing with known truth
    Simulate {
        #[arg(long)]
        takeaway: u32,
        #[arg(long)]
        top: u32,
        #[arg(long)]
        impact: u32,
        #[arg(long, default_value_t = 30.0)]
        fps: f64,
        #[arg(long, default_value_t = 3000)]
        duration_ms: u64,
        /// Fail every Nth frame extraction (0 disables)
        #[arg(long, default_value_t = 0)]
        fail_every: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level)
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Presets { mode } => run_presets(mode),
        Commands::Ratio {
            takeaway,
            top,
            impact,
        } => run_ratio(takeaway, top, impact),
        Commands::Compare {
            analysis,
            takeaway,
            top,
            impact,
            preset,
            mode,
        } => run_compare(config, analysis, takeaway.zip(top).zip(impact), preset, mode),
        Commands::Detect {
            frames_dir,
            fps,
            mode,
            output,
        } => run_detect(config, frames_dir, fps, mode, output),
        Commands::Simulate {
            takeaway,
            top,
            impact,
            fps,
            duration_ms,
            fail_every,
            seed,
        } => {
            let swing = SyntheticSwing::new(takeaway, top, impact, fps, duration_ms).with_seed(seed);
            run_simulate(config, swing, fail_every)
        }
    }
}

fn run_presets(mode: Option<TempoMode>) -> Result<ExitCode> {
    let modes = match mode {
        Some(mode) => vec![mode],
        None => vec![TempoMode::Long, TempoMode::Short],
    };

    let listing: Vec<PresetListing<'_>> = modes
        .into_iter()
        .map(|mode| PresetListing {
            mode,
            target_ratio: mode.target_ratio(),
            presets: presets_for_mode(mode),
        })
        .collect();
    print_json(&listing)?;
    Ok(ExitCode::SUCCESS)
}

fn run_ratio(takeaway: u32, top: u32, impact: u32) -> Result<ExitCode> {
    if !(takeaway < top && top < impact) {
        bail!(
            "frames must satisfy takeaway < top < impact (got {}, {}, {})",
            takeaway,
            top,
            impact
        );
    }

    let report = RatioReport {
        backswing_frames: top - takeaway,
        downswing_frames: impact - top,
        ratio: calculate_ratio_from_frames(takeaway, top, impact),
    };
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn run_compare(
    config: AppConfig,
    analysis_path: Option<PathBuf>,
    frames: Option<((u32, u32), u32)>,
    preset_id: Option<String>,
    mode: Option<TempoMode>,
) -> Result<ExitCode> {
    let analysis = match (analysis_path, frames) {
        (Some(path), _) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<SwingAnalysis>(&raw)
                .with_context(|| format!("parsing SwingAnalysis from {}", path.display()))?
        }
        (None, Some(((takeaway, top), impact))) => {
            SwingAnalysis::from_frames(takeaway, top, impact, 1.0, true)
        }
        (None, None) => bail!("pass either --analysis FILE or --takeaway/--top/--impact"),
    };

    let target: &TempoPreset = match preset_id {
        Some(id) => preset_by_id(&id).with_context(|| format!("unknown preset '{}'", id))?,
        None => {
            let mode = mode.unwrap_or(config.analysis.default_mode);
            config.analysis.target_preset(mode).with_context(|| {
                format!(
                    "configured target '{}' is not a {} preset",
                    config.analysis.target_preset_id(mode),
                    mode.display_name()
                )
            })?
        }
    };

    let report = TempoReport::build(&analysis, target);
    print_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

fn run_detect(
    config: AppConfig,
    frames_dir: PathBuf,
    fps: f64,
    mode: Option<TempoMode>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let extractor = ImageSequenceExtractor::new(fps, config.detection.thumbnail_width)?;
    let engine = TempoEngine::new(config, Arc::new(extractor));
    let uri = frames_dir
        .to_str()
        .with_context(|| format!("{} is not valid UTF-8", frames_dir.display()))?
        .to_string();

    let runtime = build_runtime()?;
    let outcome = runtime.block_on(engine.analyze(&uri, fps))?;
    let report = engine.compare(&outcome.analysis, mode);
    engine.dispose();

    let payload = DetectReport {
        uri: &uri,
        outcome: &outcome,
        report: &report,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    match output {
        Some(path) => fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn run_simulate(config: AppConfig, swing: SyntheticSwing, fail_every: usize) -> Result<ExitCode> {
    let synthetic = Arc::new(SyntheticSwingExtractor::new(swing));
    let extractor = Arc::new(FlakyExtractor::new(synthetic, fail_every));
    let engine = TempoEngine::new(config, extractor);

    let runtime = build_runtime()?;
    let outcome = runtime.block_on(engine.analyze("synthetic://swing", swing.fps))?;
    let report = engine.compare(&outcome.analysis, None);
    engine.dispose();

    print_json(&SimulateReport {
        truth: &swing,
        outcome: &outcome,
        report: &report,
    })?;
    Ok(ExitCode::SUCCESS)
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating Tokio runtime")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetListing<'a> {
    mode: TempoMode,
    target_ratio: f64,
    presets: &'a [TempoPreset],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RatioReport {
    backswing_frames: u32,
    downswing_frames: u32,
    ratio: f64,
}

#[derive(Serialize)]
struct DetectReport<'a> {
    uri: &'a str,
    outcome: &'a DetectionOutcome,
    report: &'a TempoReport,
}

#[derive(Serialize)]
struct SimulateReport<'a> {
    truth: &'a SyntheticSwing,
    outcome: &'a DetectionOutcome,
    report: &'a TempoReport,
}
