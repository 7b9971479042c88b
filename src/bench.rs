//! Benchmark passes.
//!
//! One run measures one [`Strategy`]: the traverser is built once so a
//! cached dispatch stays warm across passes, then every pass resets the
//! per-pass counters and traverses every parsed file. Only the passes are
//! timed; corpus loading is not.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span};

use visitbench_core::{Dispatch, DispatchStats, SharedDispatchTable, Traverser};

use crate::alloc::PeakAlloc;
use crate::config::{BenchConfig, Strategy};
use crate::corpus::{load_corpus, SkippedFile, SourceFile};
use crate::error::BenchError;
use crate::payload::{payload_visitors, PassStats};

/// Measurements for one strategy.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: Strategy,
    pub iterations: u32,
    pub jobs: usize,
    /// Nodes counted across all passes.
    pub nodes_visited: u64,
    /// Counters of the final pass.
    pub last_pass: PassStats,
    pub elapsed_ms: f64,
    pub dispatch: DispatchStats,
    /// Heap high-water mark during the run, when a probe is installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_memory_bytes: Option<u64>,
}

impl RunReport {
    pub fn nodes_per_second(&self) -> f64 {
        if self.elapsed_ms <= 0.0 {
            0.0
        } else {
            self.nodes_visited as f64 / (self.elapsed_ms / 1000.0)
        }
    }
}

/// Everything one invocation measured.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    /// Files parsed into the corpus.
    pub files: usize,
    pub skipped: Vec<SkippedFile>,
    pub source_bytes: u64,
    /// Nodes in one pass over the corpus.
    pub corpus_nodes: u64,
    pub runs: Vec<RunReport>,
}

impl BenchReport {
    /// Naive time over cached time, when both were measured.
    pub fn speedup(&self) -> Option<f64> {
        let naive = self.runs.iter().find(|run| run.mode == Strategy::Naive)?;
        let cached = self.runs.iter().find(|run| run.mode == Strategy::Cached)?;
        (cached.elapsed_ms > 0.0).then(|| naive.elapsed_ms / cached.elapsed_ms)
    }
}

/// Load the corpus described by `config` and measure every configured run.
///
/// `probe` is the global allocator, if the caller installed one; without it
/// no peak memory is reported.
///
/// # Errors
///
/// Fails on invalid settings, an empty corpus, or if the payload visitors
/// or worker threads cannot be set up.
pub fn run_benchmark(
    config: &BenchConfig,
    probe: Option<&PeakAlloc>,
) -> Result<BenchReport, BenchError> {
    config.validate()?;
    let mut corpus = load_corpus(config)?;
    let corpus_nodes = corpus.node_count();

    let mut runs = Vec::with_capacity(config.mode.runs().len());
    for &strategy in config.mode.runs() {
        runs.push(run_strategy(
            &mut corpus.files,
            strategy,
            config.iterations,
            config.jobs,
            probe,
        )?);
    }

    Ok(BenchReport {
        files: corpus.files.len(),
        skipped: corpus.skipped,
        source_bytes: corpus.source_bytes,
        corpus_nodes,
        runs,
    })
}

/// What the passes of one run add up to.
struct Outcome {
    nodes_visited: u64,
    last_pass: PassStats,
    dispatch: DispatchStats,
    elapsed: Duration,
}

/// Measure `iterations` passes of `strategy` over `files`.
///
/// # Errors
///
/// Fails if the payload visitors are rejected or, with `jobs > 1`, if the
/// thread pool cannot be built.
pub fn run_strategy(
    files: &mut [SourceFile],
    strategy: Strategy,
    iterations: u32,
    jobs: usize,
    probe: Option<&PeakAlloc>,
) -> Result<RunReport, BenchError> {
    let _span = info_span!("run", mode = %strategy, iterations, jobs).entered();
    if let Some(probe) = probe {
        probe.reset_peak();
    }

    let outcome = if jobs <= 1 {
        let visitors = payload_visitors()?;
        match strategy {
            Strategy::Naive => run_sequential(Traverser::naive(visitors), files, iterations),
            Strategy::Cached => run_sequential(Traverser::cached(visitors), files, iterations),
        }
    } else {
        run_parallel(strategy, files, iterations, jobs)?
    };

    let report = RunReport {
        mode: strategy,
        iterations,
        jobs,
        nodes_visited: outcome.nodes_visited,
        last_pass: outcome.last_pass,
        elapsed_ms: outcome.elapsed.as_secs_f64() * 1000.0,
        dispatch: outcome.dispatch,
        peak_memory_bytes: probe.map(|probe| probe.peak() as u64),
    };
    info!(
        nodes = report.nodes_visited,
        elapsed_ms = report.elapsed_ms,
        hit_rate = report.dispatch.hit_rate(),
        "run finished"
    );
    Ok(report)
}

fn traverse_files<D: Dispatch>(
    traverser: &mut Traverser<PassStats, D>,
    files: &mut [SourceFile],
    stats: &mut PassStats,
) {
    for file in files {
        traverser.traverse(&mut file.forest, stats);
    }
}

fn run_sequential<D: Dispatch>(
    mut traverser: Traverser<PassStats, D>,
    files: &mut [SourceFile],
    iterations: u32,
) -> Outcome {
    let mut stats = PassStats::default();
    let mut nodes_visited = 0;

    let start = Instant::now();
    for _ in 0..iterations {
        stats.reset();
        traverse_files(&mut traverser, files, &mut stats);
        nodes_visited += stats.nodes_visited;
    }
    let elapsed = start.elapsed();

    Outcome {
        nodes_visited,
        last_pass: stats,
        dispatch: traverser.dispatch().stats(),
        elapsed,
    }
}

/// Traverse one chunk of files for one pass on a worker thread.
///
/// Visitors are not `Send`, so each worker builds its own traverser. Cached
/// workers share one dispatch table, which stays warm across passes.
fn traverse_chunk(
    strategy: Strategy,
    chunk: &mut [SourceFile],
    table: &SharedDispatchTable,
) -> Result<(PassStats, DispatchStats), BenchError> {
    let visitors = payload_visitors()?;
    let mut stats = PassStats::default();
    let dispatch = match strategy {
        Strategy::Naive => {
            let mut traverser = Traverser::naive(visitors);
            traverse_files(&mut traverser, chunk, &mut stats);
            traverser.dispatch().stats()
        }
        Strategy::Cached => {
            let mut traverser = Traverser::cached_shared(visitors, table.clone())?;
            traverse_files(&mut traverser, chunk, &mut stats);
            traverser.dispatch().stats()
        }
    };
    Ok((stats, dispatch))
}

fn run_parallel(
    strategy: Strategy,
    files: &mut [SourceFile],
    iterations: u32,
    jobs: usize,
) -> Result<Outcome, BenchError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|err| BenchError::internal(format!("failed to build thread pool: {err}")))?;
    let chunk_size = files.len().div_ceil(jobs).max(1);
    debug!(chunk_size, "splitting corpus across workers");

    let table = SharedDispatchTable::new();
    let mut nodes_visited = 0;
    let mut last_pass = PassStats::default();
    let mut dispatch = DispatchStats::default();

    let start = Instant::now();
    for _ in 0..iterations {
        let chunks = pool.install(|| {
            files
                .par_chunks_mut(chunk_size)
                .map(|chunk| traverse_chunk(strategy, chunk, &table))
                .collect::<Result<Vec<_>, BenchError>>()
        })?;
        last_pass.reset();
        for (pass, stats) in chunks {
            last_pass += pass;
            dispatch += stats;
        }
        nodes_visited += last_pass.nodes_visited;
    }
    let elapsed = start.elapsed();

    Ok(Outcome {
        nodes_visited,
        last_pass,
        dispatch,
        elapsed,
    })
}
