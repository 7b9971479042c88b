//! Corpus loading: enumerate source files, read them and parse them once.
//!
//! Files that cannot be read or parsed are recorded and skipped; they never
//! abort the run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, enabled, info, warn, Level};
use walkdir::WalkDir;

use visitbench_core::{forest_size, Forest};
use visitbench_rust::{parse_source, render_failure, ParseFailure};

use crate::config::BenchConfig;
use crate::error::BenchError;

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Source length in bytes.
    pub bytes: u64,
    pub forest: Forest,
}

/// Why a file was left out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Unreadable {
        message: String,
    },
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Every successfully parsed file, plus the ones that were skipped.
#[derive(Debug, Default)]
pub struct Corpus {
    pub files: Vec<SourceFile>,
    pub skipped: Vec<SkippedFile>,
    /// Bytes of every readable file, including those that are not UTF-8 or
    /// failed to parse.
    pub source_bytes: u64,
}

impl Corpus {
    /// Total nodes across all parsed forests.
    pub fn node_count(&self) -> u64 {
        self.files
            .iter()
            .map(|file| forest_size(&file.forest) as u64)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Whether `path`'s file name ends in `.{ext}` for one of `extensions`.
fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    extensions.iter().any(|ext| {
        name.len() > ext.len() + 1
            && name.ends_with(ext.as_str())
            && name[..name.len() - ext.len()].ends_with('.')
    })
}

/// Recursively collect files under `roots` with a matching extension.
///
/// Symlinks are followed. The result is sorted and free of duplicates, so
/// overlapping roots do not count a file twice.
pub fn collect_files(roots: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(root = %root.display(), error = %err, "skipping unreadable path");
                    continue;
                }
            };
            if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn skip_unreadable(path: &Path, message: String, corpus: &mut Corpus) {
    warn!(path = %path.display(), error = %message, "skipping unreadable file");
    corpus.skipped.push(SkippedFile {
        path: path.to_path_buf(),
        reason: SkipReason::Unreadable { message },
    });
}

/// Read and parse one file, or say why it is skipped.
///
/// The bytes of every readable file count toward the source size, even
/// when the file is not UTF-8 or does not parse.
fn load_file(path: &Path, corpus: &mut Corpus) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            skip_unreadable(path, err.to_string(), corpus);
            return;
        }
    };
    corpus.source_bytes += bytes.len() as u64;

    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(err) => {
            skip_unreadable(path, format!("not valid UTF-8: {}", err.utf8_error()), corpus);
            return;
        }
    };

    match parse_source(&source) {
        Ok(forest) => corpus.files.push(SourceFile {
            path: path.to_path_buf(),
            bytes: source.len() as u64,
            forest,
        }),
        Err(failure) => {
            warn!(
                path = %path.display(),
                line = failure.line,
                column = failure.column,
                "skipping file with parse errors"
            );
            if enabled!(Level::DEBUG) {
                let label = path.display().to_string();
                debug!("\n{}", render_failure(&failure, &source, &label));
            }
            let ParseFailure {
                line,
                column,
                message,
            } = failure;
            corpus.skipped.push(SkippedFile {
                path: path.to_path_buf(),
                reason: SkipReason::ParseError {
                    line,
                    column,
                    message,
                },
            });
        }
    }
}

/// Collect, read and parse the corpus described by `config`.
///
/// # Errors
///
/// Returns [`BenchError::NoInput`] if no file could be parsed.
pub fn load_corpus(config: &BenchConfig) -> Result<Corpus, BenchError> {
    let paths = collect_files(&config.roots, &config.extensions);
    info!(files = paths.len(), roots = %config.roots_display(), "collected source files");

    let mut corpus = Corpus::default();
    for path in &paths {
        load_file(path, &mut corpus);
    }

    if corpus.is_empty() {
        return Err(BenchError::NoInput {
            roots: config.roots_display(),
        });
    }
    info!(
        parsed = corpus.files.len(),
        skipped = corpus.skipped.len(),
        bytes = corpus.source_bytes,
        "corpus loaded"
    );
    Ok(corpus)
}
