use anyhow::Result;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::pipeline::{Engine, RunOptions, RunReport};
use crate::sink::OutputSink;
use crate::source::{DetailSource, FixtureSource};

/// One independent season/file pipeline: its own sources and its own destination.
pub struct WorkerJob {
    pub label: String,
    pub fixtures: Box<dyn FixtureSource + Send>,
    pub detail: Box<dyn DetailSource + Send>,
    pub sink: Box<dyn OutputSink + Send>,
    pub options: RunOptions,
}

pub struct WorkerOutcome {
    pub label: String,
    pub result: Result<RunReport>,
}

/// Runs every job and returns once all of them are done.
pub fn run_workers(engine: &Engine, jobs: Vec<WorkerJob>, threads: usize) -> Vec<WorkerOutcome> {
    let pool = build_worker_pool(threads);
    with_worker_pool(&pool, || {
        jobs.into_par_iter()
            .map(|job| run_job(engine, job))
            .collect::<Vec<_>>()
    })
}

fn run_job(engine: &Engine, job: WorkerJob) -> WorkerOutcome {
    let WorkerJob {
        label,
        fixtures,
        detail,
        mut sink,
        options,
    } = job;
    info!(worker = %label, "worker started");
    let result = engine.run(fixtures.as_ref(), detail.as_ref(), sink.as_mut(), options);
    match &result {
        Ok(report) if report.aborted.is_some() => {
            warn!(worker = %label, written = report.written, "worker stopped early");
        }
        Ok(report) => info!(worker = %label, written = report.written, "worker finished"),
        Err(err) => warn!(worker = %label, error = %err, "worker failed"),
    }
    WorkerOutcome { label, result }
}

fn build_worker_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(1, 32))
        .thread_name(|idx| format!("season-worker-{idx}"))
        .build()
        .ok()
}

fn with_worker_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
