//! Replay a recorded frame stream through the tracking pipeline.
//!
//! Inputs are three JSON files: the marker survey (registry), the camera
//! intrinsics and the frame stream. Output is one JSON pose record per
//! frame on stdout.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use marker_pose::core::{
    init_with_level, level_from_verbosity, CameraIntrinsics, ConfigError, MarkerTable,
};
use marker_pose::engine::{EngineError, EngineParams, TrackingEngine};
use marker_pose::solver::SolverKind;
use marker_pose::stream::{run_stream, FrameRecord};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SolverArg {
    /// Perspective solve with geometric fallback.
    Robust,
    /// Geometric size-and-bearing estimate only.
    Geometric,
}

impl From<SolverArg> for SolverKind {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Robust => SolverKind::Robust,
            SolverArg::Geometric => SolverKind::Geometric,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "marker-pose", version, about = "Estimate camera poses from marker detections")]
struct Args {
    /// Marker survey JSON: array of {id, position, edge_m}.
    #[arg(long)]
    registry: PathBuf,
    /// Camera intrinsics JSON: {fx, fy, cx, cy, distortion?}.
    #[arg(long)]
    intrinsics: PathBuf,
    /// Frame stream JSON: array of {t_s, markers}.
    #[arg(long)]
    frames: PathBuf,
    /// Solver strategy.
    #[arg(long, value_enum, default_value_t = SolverArg::Robust)]
    solver: SolverArg,
    /// Pretty-print each pose record.
    #[arg(long)]
    pretty: bool,
    /// Raise log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

fn read_file(path: &PathBuf) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })
}

fn run(args: &Args) -> Result<(), CliError> {
    let registry = MarkerTable::from_json_str(&read_file(&args.registry)?)?;

    let intrinsics: CameraIntrinsics = serde_json::from_str(&read_file(&args.intrinsics)?)
        .map_err(|source| CliError::Parse {
            what: "intrinsics",
            source,
        })?;

    let frames: Vec<FrameRecord> =
        serde_json::from_str(&read_file(&args.frames)?).map_err(|source| CliError::Parse {
            what: "frame stream",
            source,
        })?;

    let params = EngineParams {
        solver: args.solver.into(),
        ..EngineParams::default()
    };
    let mut engine = TrackingEngine::new(registry, intrinsics, params)?;

    log::info!("replaying {} frame(s)", frames.len());
    for record in run_stream(&mut engine, &frames) {
        let line = if args.pretty {
            serde_json::to_string_pretty(&record)?
        } else {
            serde_json::to_string(&record)?
        };
        println!("{line}");
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    let _ = init_with_level(level_from_verbosity(args.verbose, args.quiet));
    if let Err(err) = run(&args) {
        log::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
