//! visitbench: naive vs kind-cached visitor dispatch, measured.
//!
//! Parses a corpus of Rust files once, then traverses it repeatedly with a
//! fixed set of payload visitors, timing naive dispatch against cached
//! dispatch. The traversal machinery lives in `visitbench-core`; parsing in
//! `visitbench-rust`.

// Harness plumbing
pub mod alloc;
pub mod config;
pub mod error;
pub mod output;

// Benchmark pipeline
pub mod bench;
pub mod corpus;
pub mod payload;

pub use bench::{run_benchmark, BenchReport, RunReport};
pub use config::{BenchConfig, ConfigOverrides, DispatchMode, Strategy};
pub use error::{BenchError, OutputErrorCode};
