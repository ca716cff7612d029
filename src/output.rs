use std::fmt::Write as _;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatedRecord;
use crate::competition::Sport;
use crate::series::ScoreLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `name: recent... [: h2h...]` per participant.
    #[default]
    Scores,
    /// Recent scores per participant, then an `H2H: n` line and per-meeting quarter lines.
    Periods,
    /// Like `Scores` with `own-opponent` tokens, for sets won.
    Sets,
}

impl Layout {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scores" | "plain" => Some(Layout::Scores),
            "periods" | "quarters" => Some(Layout::Periods),
            "sets" => Some(Layout::Sets),
            _ => None,
        }
    }
}

/// Sends a record to `destination` when its code is listed, or its country half
/// contains one of `categories` (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub destination: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub codes: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl RouteRule {
    fn new(destination: &str, codes: &[&str]) -> Self {
        Self {
            destination: destination.to_string(),
            country: None,
            codes: codes.iter().map(|c| c.to_string()).collect(),
            categories: Vec::new(),
        }
    }

    fn by_category(destination: &str, categories: &[&str]) -> Self {
        Self {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ..Self::new(destination, &[])
        }
    }

    fn matches(&self, country: &str, code: &str) -> bool {
        if let Some(want) = self.country.as_deref()
            && want.to_lowercase() != country.to_lowercase()
        {
            return false;
        }
        if self.codes.iter().any(|c| c == code) {
            return true;
        }
        let country = country.to_lowercase();
        self.categories
            .iter()
            .any(|c| !c.is_empty() && country.contains(&c.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRouter {
    rules: Vec<RouteRule>,
    fallback: String,
}

impl OutputRouter {
    pub fn new(rules: Vec<RouteRule>, fallback: &str) -> Self {
        Self {
            rules,
            fallback: fallback.to_string(),
        }
    }

    pub fn default_rules(sport: Sport) -> Vec<RouteRule> {
        match sport {
            Sport::Basketball => vec![
                RouteRule::new("nba", &["NBA", "WNBA"]),
                RouteRule::new("ncaa", &["NCAA"]),
            ],
            Sport::Hockey => vec![RouteRule::new("nhl", &["NHL"])],
            // Main tours apart from challengers, ITF and team events.
            Sport::Tennis => vec![RouteRule::by_category("atp", &["ATP", "WTA"])],
        }
    }

    pub fn default_fallback(sport: Sport) -> &'static str {
        match sport {
            Sport::Basketball => "random",
            Sport::Hockey => "hockey_random",
            Sport::Tennis => "tennis",
        }
    }

    pub fn for_sport(sport: Sport) -> Self {
        Self::new(Self::default_rules(sport), Self::default_fallback(sport))
    }

    pub fn route(&self, record: &AggregatedRecord) -> &str {
        let competition = &record.fixture.competition;
        self.rules
            .iter()
            .find(|rule| rule.matches(&competition.country, &competition.code))
            .map(|rule| rule.destination.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// Every destination this router can produce, fallback last.
    pub fn destinations(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for rule in &self.rules {
            if !out.contains(&rule.destination.as_str()) {
                out.push(&rule.destination);
            }
        }
        if !out.contains(&self.fallback.as_str()) {
            out.push(&self.fallback);
        }
        out
    }
}

/// One record as a text block, trailing blank line included.
pub fn serialize(record: &AggregatedRecord, layout: Layout) -> String {
    let fixture = &record.fixture;
    let a_recent = &record.participant_a_series.lines;
    let b_recent = &record.participant_b_series.lines;
    let a_h2h = &record.h2h_series.lines;
    let b_h2h = record.h2h_series.mirrored();

    let mut out = String::new();
    match layout {
        Layout::Scores | Layout::Sets => {
            let sets = layout == Layout::Sets;
            push_participant(&mut out, &fixture.participant_a, a_recent, a_h2h, sets);
            push_participant(&mut out, &fixture.participant_b, b_recent, &b_h2h, sets);
        }
        Layout::Periods => {
            push_participant(&mut out, &fixture.participant_a, a_recent, &[], false);
            push_participant(&mut out, &fixture.participant_b, b_recent, &[], false);
            let _ = writeln!(out, "H2H: {}", a_h2h.len());
            for (a, b) in a_h2h.iter().zip(&b_h2h) {
                push_period_line(&mut out, &fixture.participant_a, a);
                push_period_line(&mut out, &fixture.participant_b, b);
            }
        }
    }
    let _ = writeln!(
        out,
        "({}, {}, {})",
        fixture.competition.country, fixture.competition.code, fixture.scheduled_time
    );
    out.push('\n');
    out
}

fn push_participant(
    out: &mut String,
    name: &str,
    recent: &[ScoreLine],
    h2h: &[ScoreLine],
    sets: bool,
) {
    out.push_str(name);
    out.push(':');
    for line in recent {
        push_score(out, line, sets);
    }
    if !h2h.is_empty() {
        out.push_str(" :");
        for line in h2h {
            push_score(out, line, sets);
        }
    }
    out.push('\n');
}

fn push_score(out: &mut String, line: &ScoreLine, sets: bool) {
    if sets {
        let _ = write!(out, " {}-{}", line.own, line.opponent);
    } else {
        let _ = write!(out, " {}", line.own);
    }
}

fn push_period_line(out: &mut String, name: &str, line: &ScoreLine) {
    let periods = line.periods.unwrap_or_default();
    let _ = write!(out, "{name}: {}", line.own);
    for value in periods.own {
        let _ = write!(out, " {value}");
    }
    out.push('\n');
}

/// A serialized block read back from a destination file. Sets-layout tokens
/// (`2-1`) keep the participant's own count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedRecord {
    pub participant_a: String,
    pub participant_b: String,
    pub a_recent: Vec<u32>,
    pub a_h2h: Vec<u32>,
    pub b_recent: Vec<u32>,
    pub b_h2h: Vec<u32>,
    /// Periods layout only: `(total, Q1..Q4, OT)` per meeting, for a then b.
    pub period_rows: Vec<(Vec<u32>, Vec<u32>)>,
    pub country: String,
    pub code: String,
    pub time: String,
}

pub fn parse_blocks(text: &str) -> Result<Vec<ParsedRecord>> {
    split_blocks(text)
        .into_iter()
        .enumerate()
        .map(|(idx, lines)| parse_block(&lines).with_context(|| format!("record {}", idx + 1)))
        .collect()
}

/// Number of complete records in a destination; the resumption watermark.
pub fn count_records(text: &str) -> usize {
    split_blocks(text).len()
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_block(lines: &[&str]) -> Result<ParsedRecord> {
    if lines.len() < 3 {
        return Err(anyhow!("block has {} lines, need at least 3", lines.len()));
    }
    let (participant_a, a_recent, a_h2h) = parse_participant(lines[0])?;
    let (participant_b, b_recent, b_h2h) = parse_participant(lines[1])?;
    let mut record = ParsedRecord {
        participant_a,
        participant_b,
        a_recent,
        a_h2h,
        b_recent,
        b_h2h,
        ..ParsedRecord::default()
    };

    let mut rest = &lines[2..];
    if let Some(count) = rest[0].strip_prefix("H2H:") {
        let count: usize = count.trim().parse().context("invalid H2H count")?;
        let rows = count
            .checked_mul(2)
            .filter(|rows| rows.checked_add(2).is_some_and(|needed| rest.len() >= needed))
            .ok_or_else(|| anyhow!("expected {count} head-to-head rows"))?;
        for pair in rest[1..1 + rows].chunks(2) {
            let (_, a, _) = parse_participant(pair[0])?;
            let (_, b, _) = parse_participant(pair[1])?;
            record.a_h2h.push(a.first().copied().unwrap_or(0));
            record.b_h2h.push(b.first().copied().unwrap_or(0));
            record.period_rows.push((a, b));
        }
        rest = &rest[1 + rows..];
    }

    let meta = rest
        .first()
        .and_then(|l| l.trim().strip_prefix('('))
        .and_then(|l| l.strip_suffix(')'))
        .ok_or_else(|| anyhow!("missing metadata line"))?;
    let (country, tail) = meta
        .split_once(", ")
        .ok_or_else(|| anyhow!("metadata needs country, code and time"))?;
    let (code, time) = tail
        .rsplit_once(", ")
        .ok_or_else(|| anyhow!("metadata needs country, code and time"))?;
    record.country = country.to_string();
    record.code = code.to_string();
    record.time = time.to_string();
    Ok(record)
}

fn parse_participant(line: &str) -> Result<(String, Vec<u32>, Vec<u32>)> {
    let (name, scores) = line
        .split_once(':')
        .ok_or_else(|| anyhow!("participant line without ':': {line}"))?;
    let (recent, h2h) = match scores.split_once(" :") {
        Some((recent, h2h)) => (recent, h2h),
        None => (scores, ""),
    };
    Ok((name.trim().to_string(), parse_numbers(recent)?, parse_numbers(h2h)?))
}

fn parse_numbers(raw: &str) -> Result<Vec<u32>> {
    raw.split_whitespace()
        .map(|tok| {
            let own = tok.split_once('-').map_or(tok, |(own, _)| own);
            own.parse::<u32>()
                .with_context(|| format!("invalid score token {tok:?}"))
        })
        .collect()
}
