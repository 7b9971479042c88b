// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Rust source adapter for visitbench.
//!
//! Parses Rust source text with `syn` and lowers the syntax tree into a
//! [`Forest`] of [`visitbench_core::Node`]s, one top-level node per item.
//!
//! # Example
//!
//! ```
//! use visitbench_core::NodeKind;
//! use visitbench_rust::parse_source;
//!
//! let forest = parse_source("struct A; fn b() {}").unwrap();
//! let kinds: Vec<_> = forest.iter().map(|node| node.kind).collect();
//! assert_eq!(kinds, vec![NodeKind::Struct, NodeKind::Function]);
//! ```

use std::cmp::min;

use thiserror::Error;
use tracing::trace;

use visitbench_core::Forest;

pub mod lower;

pub use lower::lower_file;

/// A source file that could not be parsed.
///
/// `line` and `column` are 1-based and point at the first offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseFailure {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseFailure {
    pub fn from_syn(err: &syn::Error) -> Self {
        let start = err.span().start();
        ParseFailure {
            line: start.line.max(1),
            column: start.column + 1,
            message: err.to_string(),
        }
    }
}

/// Parse Rust source text into a forest of top-level nodes.
///
/// # Errors
///
/// Returns a [`ParseFailure`] locating the first syntax error.
pub fn parse_source(source: &str) -> Result<Forest, ParseFailure> {
    let file = syn::parse_file(source).map_err(|err| ParseFailure::from_syn(&err))?;
    let forest = lower_file(&file);
    trace!(items = forest.len(), "lowered source file");
    Ok(forest)
}

// ============================================================================
// Error formatting
// ============================================================================

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth(n - 2)
        .map(|(index, _)| index + 1)
        .unwrap_or(source.len())
}

/// Byte range of the character at (`line`, `column`), clamped to `source`.
fn failure_span(source: &str, line: usize, column: usize) -> std::ops::Range<usize> {
    let line_start = bol_offset(source, line);
    let line_end = source[line_start..]
        .find('\n')
        .map_or(source.len(), |index| line_start + index);
    let line_text = &source[line_start..line_end];
    let start = line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map_or(line_start + line_text.len(), |(offset, _)| line_start + offset);
    let end = source[start..]
        .chars()
        .next()
        .map_or(start, |c| min(start + c.len_utf8(), source.len()));
    start..end
}

/// Formats a parse failure with the offending source line highlighted.
///
/// `label` names the input, typically its path.
///
/// # Example
///
/// ```
/// use visitbench_rust::{parse_source, render_failure};
///
/// let source = "fn broken() -> {}";
/// let failure = parse_source(source).unwrap_err();
/// let report = render_failure(&failure, source, "broken.rs");
/// assert!(report.contains("broken.rs"));
/// ```
pub fn render_failure(failure: &ParseFailure, source: &str, label: &str) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};

    let span = failure_span(source, failure.line, failure.column);
    Renderer::plain()
        .render(
            Level::Error.title(label).snippet(
                Snippet::source(source)
                    .line_start(1)
                    .origin(label)
                    .fold(true)
                    .annotations(vec![Level::Error.span(span).label(&failure.message)]),
            ),
        )
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================
