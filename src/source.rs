use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// One fixture row as delivered by the page data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFixture {
    #[serde(alias = "league")]
    pub competition_label: String,
    #[serde(alias = "home")]
    pub participant_a: String,
    #[serde(alias = "away")]
    pub participant_b: String,
    #[serde(default, alias = "time")]
    pub scheduled_time: String,
    #[serde(alias = "link")]
    pub detail_ref: String,
    #[serde(default)]
    pub live: bool,
}

/// One historical result row, still in page text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: String,
    pub home: String,
    pub away: String,
    pub score: String,
    #[serde(alias = "league")]
    pub competition: String,
    #[serde(default)]
    pub match_ref: Option<String>,
}

/// The three history sections of a fixture's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRows {
    #[serde(default, alias = "home_matches")]
    pub participant_a: Vec<HistoryRow>,
    #[serde(default, alias = "away_matches")]
    pub participant_b: Vec<HistoryRow>,
    #[serde(default, alias = "h2h_matches")]
    pub head_to_head: Vec<HistoryRow>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("collaborator call timed out after {0:?}")]
    Timeout(Duration),
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed page data: {0}")]
    Malformed(String),
    #[error("source lost: {0}")]
    Fatal(String),
}

impl SourceError {
    /// Fatal errors end the worker; everything else only skips the fixture.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Fatal(_))
    }
}

pub trait FixtureSource {
    fn fixtures(&self, day: u32) -> Result<Vec<RawFixture>, SourceError>;
}

pub trait DetailSource {
    fn detail(&self, detail_ref: &str) -> Result<DetailRows, SourceError>;

    /// Optional per-match quarter breakdown capability.
    fn period_breakdown(&self) -> Option<&dyn PeriodSource> {
        None
    }
}

pub trait PeriodSource {
    /// Raw period tokens in page order: home total, Q1..Q4, OT, then the same for away.
    fn fetch_periods(&self, match_ref: &str) -> Result<Vec<String>, SourceError>;

    /// Force a full reload of the match page before the next attempt.
    fn reload(&self, _match_ref: &str) -> Result<(), SourceError> {
        Ok(())
    }
}

type Job<S> = Box<dyn FnOnce(&S) + Send>;

/// Runs calls of the wrapped source on one long-lived helper thread and gives up
/// waiting after `timeout`.
///
/// A call that overruns keeps the helper busy until it returns; its result is dropped.
/// Calls made meanwhile fail fast as unavailable instead of queueing behind it, so at
/// most one call into the source is ever in flight.
pub struct Deadline<S> {
    inner: Arc<S>,
    timeout: Duration,
    jobs: mpsc::Sender<Job<S>>,
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when a job ends, unwinding included.
struct Idle(Arc<AtomicBool>);

impl Drop for Idle {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S> Deadline<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(inner: S, timeout: Duration) -> Self {
        let inner = Arc::new(inner);
        let (jobs, queue) = mpsc::channel::<Job<S>>();
        let worker = Arc::clone(&inner);
        let spawned = thread::Builder::new()
            .name("source-deadline".to_string())
            .spawn(move || {
                for job in queue {
                    job(worker.as_ref());
                }
            });
        if let Err(err) = spawned {
            // Every call reports the source as lost.
            warn!(error = %err, "failed to start source helper thread");
        }
        Self {
            inner,
            timeout,
            jobs,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    fn call<T, F>(&self, f: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, SourceError> + Send + 'static,
    {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(SourceError::Unavailable(
                "previous call still running".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel();
        let idle = Idle(Arc::clone(&self.busy));
        let job: Job<S> = Box::new(move |inner: &S| {
            let result = f(inner);
            drop(idle);
            let _ = tx.send(result);
        });
        if self.jobs.send(job).is_err() {
            // The rejected job is dropped here, which clears the flag.
            return Err(SourceError::Fatal("source helper thread is gone".to_string()));
        }
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(SourceError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(SourceError::Unavailable(
                "collaborator call ended without a result".to_string(),
            )),
        }
    }
}

impl<S> FixtureSource for Deadline<S>
where
    S: FixtureSource + Send + Sync + 'static,
{
    fn fixtures(&self, day: u32) -> Result<Vec<RawFixture>, SourceError> {
        self.call(move |inner| inner.fixtures(day))
    }
}

impl<S> DetailSource for Deadline<S>
where
    S: DetailSource + Send + Sync + 'static,
{
    fn detail(&self, detail_ref: &str) -> Result<DetailRows, SourceError> {
        let detail_ref = detail_ref.to_string();
        self.call(move |inner| inner.detail(&detail_ref))
    }

    fn period_breakdown(&self) -> Option<&dyn PeriodSource> {
        self.inner.period_breakdown()?;
        Some(self)
    }
}

impl<S> PeriodSource for Deadline<S>
where
    S: DetailSource + Send + Sync + 'static,
{
    fn fetch_periods(&self, match_ref: &str) -> Result<Vec<String>, SourceError> {
        let match_ref = match_ref.to_string();
        self.call(move |inner| match inner.period_breakdown() {
            Some(periods) => periods.fetch_periods(&match_ref),
            None => Err(SourceError::Unavailable("no period breakdown".to_string())),
        })
    }

    fn reload(&self, match_ref: &str) -> Result<(), SourceError> {
        let match_ref = match_ref.to_string();
        self.call(move |inner| match inner.period_breakdown() {
            Some(periods) => periods.reload(&match_ref),
            None => Ok(()),
        })
    }
}
