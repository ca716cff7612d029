use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::aggregate::{AggregatedRecord, Aggregator, Fixture};
use crate::competition::{AllowList, Classifier};
use crate::config::RunConfig;
use crate::history::{HistoryCaps, HistoryCollector, HistoryRole, ScoreFormat};
use crate::output::{Layout, OutputRouter, serialize};
use crate::periods::complete_periods;
use crate::recency::RecencyPolicy;
use crate::retry::RetryPolicy;
use crate::sink::OutputSink;
use crate::source::{DetailSource, FixtureSource, RawFixture, SourceError};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub day: u32,
    /// Admitted fixtures already written by an earlier run.
    pub start_offset: usize,
    pub now: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub admitted: usize,
    pub resumed_past: usize,
    pub written: usize,
    pub per_destination: BTreeMap<String, usize>,
    pub unmatched_rows: usize,
    pub failures: Vec<String>,
    /// Set when a systemic source failure ended the run early.
    pub aborted: Option<String>,
}

/// Classifies, filters, aggregates and routes fixtures. Shared read-only across workers.
#[derive(Debug, Clone)]
pub struct Engine {
    classifier: Classifier,
    allow_list: AllowList,
    recency: RecencyPolicy,
    caps: HistoryCaps,
    router: OutputRouter,
    layout: Layout,
    periods: bool,
    period_retry: RetryPolicy,
    match_competition: bool,
    score_format: ScoreFormat,
}

impl Engine {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            classifier: cfg.classifier(),
            allow_list: cfg.allow_list(),
            recency: cfg.recency(),
            caps: cfg.caps,
            router: cfg.router(),
            layout: cfg.layout(),
            periods: cfg.wants_periods(),
            period_retry: cfg.period_retry,
            match_competition: cfg.sport.filters_history_by_competition(),
            score_format: cfg.sport.score_format(),
        }
    }

    pub fn router(&self) -> &OutputRouter {
        &self.router
    }

    /// Admitted fixtures in source order. Live fixtures are never admitted.
    pub fn admit(&self, raw: &[RawFixture]) -> Vec<Fixture> {
        raw.iter()
            .filter(|row| !row.live)
            .map(|row| Fixture::from_raw(row, &self.classifier))
            .filter(|fixture| self.allow_list.is_admitted(&fixture.competition))
            .collect()
    }

    pub fn build_record(
        &self,
        fixture: Fixture,
        detail: &dyn DetailSource,
        now: NaiveDateTime,
    ) -> Result<AggregatedRecord, SourceError> {
        let rows = detail.detail(&fixture.source_ref)?;
        let target = fixture.competition.name.as_str();
        let cutoff = self.recency.cutoff(target, now);
        let mut collector =
            HistoryCollector::new(cutoff, self.caps).with_score_format(self.score_format);
        if !self.match_competition {
            collector = collector.any_competition();
        }

        let own_home = collector.collect(&rows.participant_a, target, HistoryRole::OwnHome);
        let own_away = collector.collect(&rows.participant_b, target, HistoryRole::OwnAway);
        let mut h2h = collector.collect(&rows.head_to_head, target, HistoryRole::HeadToHead);

        // Quarter lines are only written by the periods layout.
        let amateur = self.recency.is_amateur(target);
        if self.periods
            && self.layout == Layout::Periods
            && !amateur
            && let Some(source) = detail.period_breakdown()
        {
            for result in h2h.iter_mut() {
                let tokens = complete_periods(result, source, &self.period_retry)?;
                result.period_scores = tokens.to_scores();
            }
        }

        debug!(
            fixture = %fixture.label(),
            home = own_home.len(),
            away = own_away.len(),
            h2h = h2h.len(),
            "collected history"
        );
        Ok(Aggregator::new(&self.recency).aggregate(fixture, &own_home, &own_away, &h2h))
    }

    pub fn run(
        &self,
        fixtures: &dyn FixtureSource,
        detail: &dyn DetailSource,
        sink: &mut dyn OutputSink,
        opts: RunOptions,
    ) -> Result<RunReport> {
        let raw = fixtures
            .fixtures(opts.day)
            .with_context(|| format!("fetch fixtures for day offset {}", opts.day))?;
        let admitted = self.admit(&raw);
        let mut report = RunReport {
            fetched: raw.len(),
            admitted: admitted.len(),
            ..RunReport::default()
        };
        info!(
            fetched = report.fetched,
            admitted = report.admitted,
            start_offset = opts.start_offset,
            "fixtures classified"
        );

        let total = admitted.len();
        for (idx, fixture) in admitted.into_iter().enumerate() {
            if idx < opts.start_offset {
                report.resumed_past += 1;
                continue;
            }
            let label = fixture.label();
            info!(
                progress = %format!("{}/{}", idx + 1, total),
                fixture = %label,
                competition = %fixture.competition.code,
                "aggregating"
            );

            let record = match self.build_record(fixture, detail, opts.now) {
                Ok(record) => record,
                Err(err) if err.is_fatal() => {
                    warn!(fixture = %label, error = %err, "source lost; stopping worker");
                    report.aborted = Some(format!("{label}: {err}"));
                    break;
                }
                Err(err) => {
                    warn!(fixture = %label, error = %err, "skipping fixture");
                    report.failures.push(format!("{label}: {err}"));
                    continue;
                }
            };

            let destination = self.router.route(&record).to_string();
            let block = serialize(&record, self.layout);
            sink.append(&destination, &block)
                .with_context(|| format!("write {label} to {destination}"))?;

            report.unmatched_rows += record.unmatched_rows();
            report.written += 1;
            *report.per_destination.entry(destination).or_default() += 1;
        }

        Ok(report)
    }
}
