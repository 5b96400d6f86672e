//! stream-displacement - Main Entry Point
//!
//! Builds the displacement worker, runs it against a local ingestion server
//! and records the streamed points to a result file.

use anyhow::Context;
use clap::Parser;
use displacement_stream::{
    app::Coordinator,
    backend::SystemRunner,
    config::{AppConfig, Algorithm, BuildMode, LogLevel, Target},
    frontend::TracingRenderer,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "stream-displacement",
    version,
    about = "Build the displacement worker, run it and record its point stream"
)]
struct Cli {
    /// Build target
    #[arg(short = 't', long, value_name = "native|rpi")]
    target: Option<Target>,

    /// Build mode
    #[arg(short = 'm', long, value_name = "debug|release")]
    mode: Option<BuildMode>,

    /// Only plot an existing result file
    #[arg(short = 'p', long)]
    plot_only: bool,

    /// Result file
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Input sequence handed to the worker
    #[arg(short = 's', long, value_name = "PATH")]
    sequence: Option<PathBuf>,

    /// Matching algorithm: 0 SURF+BFM, 1 SURF+FLANN, 2 SIFT+BFM, 3 SIFT+FLANN
    #[arg(short = 'c', long = "alg", value_name = "0..3")]
    algorithm: Option<Algorithm>,

    /// Worker log level
    #[arg(short = 'l', long, value_name = "debug|warning|error")]
    log_level: Option<LogLevel>,

    /// Remove the previous build first
    #[arg(short = 'r', long)]
    rebuild: bool,

    /// Export the raw points without interpolation
    #[arg(short = 'i', long)]
    no_interpolate: bool,

    /// Build the worker with profiling enabled
    #[arg(short = 'a', long)]
    profile: bool,

    /// Configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project root containing the worker sources
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,
}

impl Cli {
    /// Override configuration values with the flags given on the command line
    fn apply(&self, config: &mut AppConfig) {
        let worker = &mut config.worker;
        if let Some(target) = self.target {
            worker.target = target;
        }
        if let Some(mode) = self.mode {
            worker.mode = mode;
        }
        if let Some(output) = &self.output {
            worker.output = output.clone();
        }
        if let Some(sequence) = &self.sequence {
            worker.sequence = sequence.clone();
        }
        if let Some(algorithm) = self.algorithm {
            worker.algorithm = algorithm;
        }
        if let Some(level) = self.log_level {
            worker.log_level = level;
        }
        worker.rebuild |= self.rebuild;
        worker.profile |= self.profile;
        if self.no_interpolate {
            worker.interpolate = false;
        }
        if let Some(root) = &self.root {
            config.project.root = root.clone();
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // Help and version go to stdout and are not failures
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config =
        AppConfig::load_or_default(cli.config.as_deref()).context("Loading configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let _guard = init_tracing(config.worker.log_level, config.logging.log_dir.as_deref())?;

    if let Some(path) = &cli.write_config {
        config
            .save(path)
            .with_context(|| format!("Writing configuration to {}", path.display()))?;
        tracing::info!("Configuration written to {:?}", path);
        return Ok(());
    }

    let coordinator = Coordinator::new(config, Arc::new(SystemRunner));
    let mut renderer = TracingRenderer::new();

    if cli.plot_only {
        let points = coordinator.plot_only(&mut renderer)?;
        tracing::info!("Plot-only mode, {} points shown", points);
        return Ok(());
    }

    let worker = &coordinator.config().worker;
    tracing::info!(
        "Starting {} {} worker on {:?} using {}",
        worker.target,
        worker.mode,
        coordinator.config().sequence_path(),
        worker.algorithm.description()
    );
    let report = coordinator.run(&mut renderer)?;
    tracing::info!("Run finished: {}", report);
    Ok(())
}

/// Install the global subscriber. With a log directory, events are also
/// written to `<dir>/stream-<timestamp>.log`; the returned guard flushes that
/// file on drop.
fn init_tracing(level: LogLevel, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    let Some(dir) = log_dir else {
        registry.init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Creating log directory {}", dir.display()))?;
    let file_name = format!("stream-{}.log", chrono::Local::now().format("%Y%m%d-%H%M%S"));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    registry
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stream-displacement").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let mut config = AppConfig::default();
        parse(&[]).apply(&mut config);
        assert_eq!(config.worker, AppConfig::default().worker);
    }

    #[test]
    fn test_short_flags_override_config() {
        let cli = parse(&[
            "-t", "rpi", "-m", "release", "-o", "out.txt", "-s", "seq.dvd", "-c", "3", "-l",
            "warning", "-r", "-i", "-a",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        let worker = &config.worker;
        assert_eq!(worker.target, Target::Rpi);
        assert_eq!(worker.mode, BuildMode::Release);
        assert_eq!(worker.output, PathBuf::from("out.txt"));
        assert_eq!(worker.sequence, PathBuf::from("seq.dvd"));
        assert_eq!(worker.algorithm, Algorithm::SiftFlann);
        assert_eq!(worker.log_level, LogLevel::Warning);
        assert!(worker.rebuild && worker.profile && !worker.interpolate);
    }

    #[test]
    fn test_long_flags() {
        let cli = parse(&["--plot-only", "--alg", "1", "--root", "/proj"]);
        assert!(cli.plot_only);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.worker.algorithm, Algorithm::SurfFlann);
        assert_eq!(config.project.root, PathBuf::from("/proj"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for args in [&["-c", "4"][..], &["-t", "arm"], &["-l", "info"], &["--bogus"]] {
            let err = Cli::try_parse_from(
                std::iter::once("stream-displacement").chain(args.iter().copied()),
            )
            .unwrap_err();
            assert!(err.use_stderr(), "{:?} should be an error", args);
        }
    }

    #[test]
    fn test_help_is_not_an_error() {
        let err = Cli::try_parse_from(["stream-displacement", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }
}
