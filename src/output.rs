//! Report rendering: a human-readable text report and the JSON forms.
//!
//! JSON output follows a fixed envelope so scripts can rely on it:
//!
//! 1. **Status first:** every response has `status` (`"ok"` or `"error"`)
//! 2. **Versioned:** `schema_version` enables forward compatibility
//! 3. **Deterministic:** same report, same bytes (apart from timings)

use std::io::{self, Write};

use serde::Serialize;

use crate::bench::{BenchReport, RunReport};
use crate::corpus::SkipReason;
use crate::error::{BenchError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

const RULE_WIDTH: usize = 60;

// ============================================================================
// Responses
// ============================================================================

/// Successful benchmark response.
#[derive(Debug, Serialize)]
pub struct BenchResponse<'a> {
    pub status: &'static str,
    pub schema_version: &'static str,
    #[serde(flatten)]
    pub report: &'a BenchReport,
    /// Naive over cached time, present when both ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speedup: Option<f64>,
}

impl<'a> BenchResponse<'a> {
    pub fn new(report: &'a BenchReport) -> Self {
        BenchResponse {
            status: "ok",
            schema_version: SCHEMA_VERSION,
            report,
            speedup: report.speedup(),
        }
    }
}

/// Error details inside an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Numeric error code, also the process exit code.
    pub code: u8,
    pub message: String,
}

/// Error response emitted instead of a report.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &BenchError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo {
                code: OutputErrorCode::from(err).code(),
                message: err.to_string(),
            },
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

// ============================================================================
// Number formatting
// ============================================================================

/// Group the digits of `value` in threes: `1234567` -> `"1,234,567"`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Two decimals with grouped thousands: `1234.567` -> `"1,234.57"`.
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value.max(0.0));
    match fixed.split_once('.') {
        Some((whole, fraction)) => {
            let whole = whole.parse::<u64>().map_or(whole.to_string(), format_thousands);
            format!("{whole}.{fraction}")
        }
        None => fixed,
    }
}

/// Human-readable byte count in B, KB, MB or GB (powers of 1024).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{} {}", format_decimal(size), UNITS[unit])
}

// ============================================================================
// Text report
// ============================================================================

fn field(writer: &mut impl Write, label: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(writer, "{label:<16}: {value}")
}

fn render_run(run: &RunReport, writer: &mut impl Write) -> io::Result<()> {
    field(writer, "Mode", run.mode)?;
    if run.jobs > 1 {
        field(writer, "Jobs", run.jobs)?;
    }
    field(writer, "Iterations", run.iterations)?;
    field(writer, "Nodes visited", format_thousands(run.nodes_visited))?;
    field(writer, "Total time", format!("{} ms", format_decimal(run.elapsed_ms)))?;
    field(
        writer,
        "Dispatch",
        format!(
            "{} lookups, {}% hits",
            format_thousands(run.dispatch.lookups),
            format_decimal(run.dispatch.hit_rate() * 100.0)
        ),
    )?;
    if let Some(peak) = run.peak_memory_bytes {
        field(writer, "Peak memory", format_bytes(peak))?;
    }
    writeln!(writer, "{}", "=".repeat(RULE_WIDTH))
}

/// Write the text report.
pub fn render_text(report: &BenchReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer, "visitbench: visitor dispatch benchmark")?;
    field(
        writer,
        "Files",
        format!("{} parsed, {} skipped", report.files, report.skipped.len()),
    )?;
    for skipped in &report.skipped {
        let why = match &skipped.reason {
            SkipReason::Unreadable { message } => message.clone(),
            SkipReason::ParseError {
                line,
                column,
                message,
            } => format!("{line}:{column}: {message}"),
        };
        writeln!(writer, "  skipped {} ({why})", skipped.path.display())?;
    }
    field(writer, "Source size", format_bytes(report.source_bytes))?;
    field(writer, "Corpus nodes", format_thousands(report.corpus_nodes))?;
    writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;

    for run in &report.runs {
        render_run(run, writer)?;
    }
    if let Some(speedup) = report.speedup() {
        field(writer, "Speed-up", format!("{speedup:.2}x"))?;
    }
    Ok(())
}
