//! Binary entry point for the visitbench CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Measure cached dispatch over every .rs file under src/
//! visitbench src/
//!
//! # Compare both strategies and report the speed-up
//! visitbench crates/ --mode both
//!
//! # Machine-readable output, four worker threads
//! visitbench crates/ --mode both --jobs 4 --json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use visitbench::alloc::PeakAlloc;
use visitbench::config::{BenchConfig, ConfigOverrides, DispatchMode};
use visitbench::error::{BenchError, OutputErrorCode};
use visitbench::output::{emit_response, render_text, BenchResponse, ErrorResponse};
use visitbench::run_benchmark;

#[global_allocator]
static ALLOCATOR: PeakAlloc = PeakAlloc::new();

// ============================================================================
// CLI Structure
// ============================================================================

/// Compare naive and kind-cached visitor dispatch over Rust syntax trees.
///
/// Parses every matching file under the given paths once, then runs the
/// payload visitors over the corpus for a number of passes and reports
/// nodes visited, elapsed time and peak memory.
#[derive(Parser, Debug)]
#[command(
    name = "visitbench",
    version,
    about = "Compare naive and kind-cached visitor dispatch"
)]
struct Cli {
    /// Directories or files to collect sources from (default: config roots, else `.`).
    paths: Vec<PathBuf>,

    /// Dispatch strategy to measure.
    #[arg(long, value_enum)]
    mode: Option<DispatchMode>,

    /// Measured passes over the corpus.
    #[arg(long, short = 'n')]
    iterations: Option<u32>,

    /// Worker threads (1 traverses on the main thread).
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// File extension to collect; may be given several times.
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Config file (default: visitbench.toml in the working directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format on stderr.
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            roots: self.paths.clone(),
            extensions: self.extensions.clone(),
            iterations: self.iterations,
            mode: self.mode,
            jobs: self.jobs,
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Format of log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level, cli.log_format);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like reports do with --json
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Config file (explicit or discovered), then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<BenchConfig, BenchError> {
    let base = match &cli.config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::load_from_dir(&std::env::current_dir()?)?,
    };
    Ok(cli.overrides().apply(base))
}

/// Execute the benchmark and print the report.
fn execute(cli: &Cli) -> Result<(), BenchError> {
    let config = resolve_config(cli)?;
    let report = run_benchmark(&config, Some(&ALLOCATOR))?;

    let mut stdout = io::stdout().lock();
    if cli.json {
        emit_response(&BenchResponse::new(&report), &mut stdout)?;
    } else {
        render_text(&report, &mut stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
