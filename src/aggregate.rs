use tracing::warn;

use crate::competition::{Classifier, Competition};
use crate::history::HistoricalResult;
use crate::recency::RecencyPolicy;
use crate::series::{HeadToHeadSeries, ParticipantSeries};
use crate::source::RawFixture;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub competition: Competition,
    pub participant_a: String,
    pub participant_b: String,
    /// `HH:MM`
    pub scheduled_time: String,
    pub source_ref: String,
}

impl Fixture {
    pub fn from_raw(raw: &RawFixture, classifier: &Classifier) -> Self {
        Self {
            competition: classifier.classify(&raw.competition_label),
            participant_a: raw.participant_a.trim().to_string(),
            participant_b: raw.participant_b.trim().to_string(),
            scheduled_time: raw.scheduled_time.trim().chars().take(5).collect(),
            source_ref: raw.detail_ref.clone(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} vs {}", self.participant_a, self.participant_b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedRecord {
    pub fixture: Fixture,
    pub participant_a_series: ParticipantSeries,
    pub participant_b_series: ParticipantSeries,
    pub h2h_series: HeadToHeadSeries,
}

impl AggregatedRecord {
    /// Rows whose participants matched neither name and were read as home.
    pub fn unmatched_rows(&self) -> usize {
        self.participant_a_series.unmatched
            + self.participant_b_series.unmatched
            + self.h2h_series.unmatched
    }
}

pub struct Aggregator<'a> {
    recency: &'a RecencyPolicy,
}

impl<'a> Aggregator<'a> {
    pub fn new(recency: &'a RecencyPolicy) -> Self {
        Self { recency }
    }

    pub fn aggregate(
        &self,
        fixture: Fixture,
        own_home: &[HistoricalResult],
        own_away: &[HistoricalResult],
        h2h: &[HistoricalResult],
    ) -> AggregatedRecord {
        let participant_a_series = ParticipantSeries::from_results(&fixture.participant_a, own_home);
        let participant_b_series = ParticipantSeries::from_results(&fixture.participant_b, own_away);
        // Collegiate head-to-head history is left out entirely.
        let h2h_series = if self.recency.is_amateur(&fixture.competition.name) {
            HeadToHeadSeries::empty(&fixture.participant_a)
        } else {
            HeadToHeadSeries::from_results(&fixture.participant_a, h2h)
        };

        let record = AggregatedRecord {
            fixture,
            participant_a_series,
            participant_b_series,
            h2h_series,
        };
        let unmatched = record.unmatched_rows();
        if unmatched > 0 {
            warn!(
                fixture = %record.fixture.label(),
                unmatched,
                "history rows matched neither participant name; scores read as home side"
            );
        }
        record
    }
}
