//! Benchmark configuration.
//!
//! Settings come from `visitbench.toml` in the working directory (or an
//! explicit `--config` file), then command-line flags override individual
//! fields. Every field has a default, so an empty or missing file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "visitbench.toml";

/// Which dispatch strategy a run measures.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Re-evaluate visitor applicability at every node.
    Naive,
    /// Memoize applicable visitors per node kind.
    #[default]
    Cached,
    /// Run naive, then cached, and report the speed-up.
    Both,
}

/// One dispatch strategy, as measured by a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Naive,
    Cached,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Naive => "naive",
            Strategy::Cached => "cached",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DispatchMode {
    /// The runs this mode expands to, in execution order.
    pub fn runs(self) -> &'static [Strategy] {
        match self {
            DispatchMode::Naive => &[Strategy::Naive],
            DispatchMode::Cached => &[Strategy::Cached],
            DispatchMode::Both => &[Strategy::Naive, Strategy::Cached],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchMode::Naive => "naive",
            DispatchMode::Cached => "cached",
            DispatchMode::Both => "both",
        }
    }
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Benchmark settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    /// Directories (or single files) to collect sources from
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// File extensions to collect, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Measured passes over the whole corpus
    #[serde(default = "default_iterations")]
    pub iterations: u32,

    /// Dispatch strategy to measure
    #[serde(default)]
    pub mode: DispatchMode,

    /// Worker threads; 1 traverses on the calling thread
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_extensions() -> Vec<String> {
    vec!["rs".to_string()]
}

fn default_iterations() -> u32 {
    100
}

fn default_jobs() -> usize {
    1
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            extensions: default_extensions(),
            iterations: default_iterations(),
            mode: DispatchMode::default(),
            jobs: default_jobs(),
        }
    }
}

impl BenchConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let content = fs::read_to_string(path).map_err(|source| BenchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| BenchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `visitbench.toml` from `dir`, falling back to defaults
    pub fn load_from_dir(dir: &Path) -> Result<Self, BenchError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(BenchConfig::default())
        }
    }

    /// Reject settings no run can use.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.roots.is_empty() {
            return Err(BenchError::invalid_arguments("no source roots given"));
        }
        if self.extensions.is_empty() {
            return Err(BenchError::invalid_arguments("no file extensions given"));
        }
        if self.iterations == 0 {
            return Err(BenchError::invalid_arguments("iterations must be at least 1"));
        }
        if self.jobs == 0 {
            return Err(BenchError::invalid_arguments("jobs must be at least 1"));
        }
        Ok(())
    }

    /// Roots joined for display.
    pub fn roots_display(&self) -> String {
        self.roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Command-line values that replace config file values when present.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub roots: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub iterations: Option<u32>,
    pub mode: Option<DispatchMode>,
    pub jobs: Option<usize>,
}

impl ConfigOverrides {
    /// Apply the overrides on top of `config`.
    pub fn apply(self, mut config: BenchConfig) -> BenchConfig {
        if !self.roots.is_empty() {
            config.roots = self.roots;
        }
        if !self.extensions.is_empty() {
            config.extensions = self
                .extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        config
    }
}
