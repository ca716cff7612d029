use crate::history::HistoricalResult;

/// Which side of a historical row the subject played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    Home,
    Away,
    /// Subject matches neither side (alias or transliteration drift). Read as home.
    Unmatched,
}

pub fn perspective(result: &HistoricalResult, subject: &str) -> Perspective {
    if result.home == subject {
        Perspective::Home
    } else if result.away == subject {
        Perspective::Away
    } else {
        Perspective::Unmatched
    }
}

/// `(own, opponent)` for `subject`.
pub fn reorient(result: &HistoricalResult, subject: &str) -> (u32, u32) {
    match perspective(result, subject) {
        Perspective::Away => (result.away_score, result.home_score),
        Perspective::Home | Perspective::Unmatched => (result.home_score, result.away_score),
    }
}

/// Quarter breakdown of one match seen from the subject's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodLine {
    pub own: [u32; 5],
    pub opponent: [u32; 5],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreLine {
    pub own: u32,
    pub opponent: u32,
    pub periods: Option<PeriodLine>,
}

impl ScoreLine {
    pub fn from_result(result: &HistoricalResult, subject: &str) -> (Self, Perspective) {
        let side = perspective(result, subject);
        let (own, opponent) = reorient(result, subject);
        let periods = (!result.period_scores.is_zero()).then(|| {
            let p = result.period_scores;
            match side {
                Perspective::Away => PeriodLine {
                    own: p.away,
                    opponent: p.home,
                },
                Perspective::Home | Perspective::Unmatched => PeriodLine {
                    own: p.home,
                    opponent: p.away,
                },
            }
        });
        (
            Self {
                own,
                opponent,
                periods,
            },
            side,
        )
    }

    pub fn mirrored(&self) -> Self {
        Self {
            own: self.opponent,
            opponent: self.own,
            periods: self.periods.map(|p| PeriodLine {
                own: p.opponent,
                opponent: p.own,
            }),
        }
    }
}

/// A participant's own recent form, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParticipantSeries {
    pub subject: String,
    pub lines: Vec<ScoreLine>,
    pub unmatched: usize,
}

impl ParticipantSeries {
    pub fn from_results(subject: &str, results: &[HistoricalResult]) -> Self {
        let mut series = Self {
            subject: subject.to_string(),
            ..Self::default()
        };
        for result in results {
            let (line, side) = ScoreLine::from_result(result, subject);
            if side == Perspective::Unmatched {
                series.unmatched += 1;
            }
            series.lines.push(line);
        }
        series
    }

    pub fn own_scores(&self) -> Vec<u32> {
        self.lines.iter().map(|l| l.own).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Meetings between the two fixture participants, always seen from `subject`
/// (the upcoming fixture's home side). The other side's view is [`Self::mirrored`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeadToHeadSeries {
    pub subject: String,
    pub lines: Vec<ScoreLine>,
    pub unmatched: usize,
}

impl HeadToHeadSeries {
    pub fn from_results(subject: &str, results: &[HistoricalResult]) -> Self {
        let inner = ParticipantSeries::from_results(subject, results);
        Self {
            subject: inner.subject,
            lines: inner.lines,
            unmatched: inner.unmatched,
        }
    }

    pub fn empty(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            ..Self::default()
        }
    }

    pub fn mirrored(&self) -> Vec<ScoreLine> {
        self.lines.iter().map(ScoreLine::mirrored).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
