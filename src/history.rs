use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::source::HistoryRow;

/// Quarter scores for one match: Q1..Q4 then OT, per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodScores {
    pub home: [u32; 5],
    pub away: [u32; 5],
}

impl PeriodScores {
    pub fn is_zero(&self) -> bool {
        self.home.iter().chain(self.away.iter()).all(|v| *v == 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalResult {
    pub date: NaiveDate,
    pub home: String,
    pub away: String,
    pub home_score: u32,
    pub away_score: u32,
    pub competition_label: String,
    pub match_ref: Option<String>,
    pub period_scores: PeriodScores,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    OwnHome,
    OwnAway,
    HeadToHead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryCaps {
    pub recent_form: usize,
    pub head_to_head: usize,
}

impl Default for HistoryCaps {
    fn default() -> Self {
        Self {
            recent_form: 15,
            head_to_head: 5,
        }
    }
}

impl HistoryCaps {
    pub fn cap(&self, role: HistoryRole) -> usize {
        match role {
            HistoryRole::HeadToHead => self.head_to_head,
            HistoryRole::OwnHome | HistoryRole::OwnAway => self.recent_form,
        }
    }
}

/// How a history row's score text reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreFormat {
    /// Final points or goals per side.
    #[default]
    Points,
    /// Games per set (`6-4, 3-6, 7-6`), reduced to sets won per side.
    Sets,
}

impl ScoreFormat {
    pub fn parse(self, raw: &str) -> Option<(u32, u32)> {
        match self {
            ScoreFormat::Points => parse_score_pair(raw),
            ScoreFormat::Sets => parse_set_score(raw),
        }
    }
}

/// Picks the newest matching rows of one history section.
#[derive(Debug, Clone, Copy)]
pub struct HistoryCollector {
    cutoff: NaiveDateTime,
    caps: HistoryCaps,
    match_competition: bool,
    format: ScoreFormat,
}

impl HistoryCollector {
    pub fn new(cutoff: NaiveDateTime, caps: HistoryCaps) -> Self {
        Self {
            cutoff,
            caps,
            match_competition: true,
            format: ScoreFormat::Points,
        }
    }

    /// Keeps rows from every competition, unlabelled ones included.
    pub fn any_competition(mut self) -> Self {
        self.match_competition = false;
        self
    }

    pub fn with_score_format(mut self, format: ScoreFormat) -> Self {
        self.format = format;
        self
    }

    /// Rows are taken in source order (newest first on the page) and never re-sorted.
    pub fn collect(
        &self,
        rows: &[HistoryRow],
        target_competition: &str,
        role: HistoryRole,
    ) -> Vec<HistoricalResult> {
        let cap = self.caps.cap(role);
        let target = target_competition.to_lowercase();
        let mut out = Vec::new();

        for row in rows {
            if out.len() >= cap {
                break;
            }
            let Some(date) = parse_row_date(&row.date) else {
                debug!(date = %row.date, "skipping history row with unparseable date");
                continue;
            };
            let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
                continue;
            };
            if midnight <= self.cutoff {
                continue;
            }
            let label = row.competition.trim().to_lowercase();
            if self.match_competition && (label.is_empty() || !target.starts_with(&label)) {
                continue;
            }
            let Some((home_score, away_score)) = self.format.parse(&row.score) else {
                debug!(score = %row.score, "skipping history row with unparseable score");
                continue;
            };
            out.push(HistoricalResult {
                date,
                home: row.home.trim().to_string(),
                away: row.away.trim().to_string(),
                home_score,
                away_score,
                competition_label: label,
                match_ref: row.match_ref.clone().filter(|r| !r.trim().is_empty()),
                period_scores: PeriodScores::default(),
            });
        }

        out
    }
}

/// Page dates are `dd.mm.yy`; `dd.mm.yyyy` and ISO dates are accepted too.
pub fn parse_row_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%d.%m.%y", "%d.%m.%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// First two integers of the score text; hockey suffixes like `OT` or `pen.` are ignored.
pub fn parse_score_pair(raw: &str) -> Option<(u32, u32)> {
    let mut nums = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let home = nums.next()?;
    let away = nums.next()?;
    Some((home, away))
}

/// Sets won per side. Retired and walkover matches have no usable result.
pub fn parse_set_score(raw: &str) -> Option<(u32, u32)> {
    let lowered = raw.to_lowercase();
    if ["retired", "walkover", "w.o.", "ret."]
        .iter()
        .any(|mark| lowered.contains(mark))
    {
        return None;
    }
    let mut sets = (0, 0);
    let mut played = 0;
    for set in raw.split(',') {
        // Tiebreak points such as `7-6(5)` trail the games.
        let Some((home, away)) = parse_score_pair(set) else {
            continue;
        };
        played += 1;
        if home > away {
            sets.0 += 1;
        } else if away > home {
            sets.1 += 1;
        }
    }
    (played > 0).then_some(sets)
}
