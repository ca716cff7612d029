use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::source::{
    DetailRows, DetailSource, FixtureSource, PeriodSource, RawFixture, SourceError,
};

/// Reads page data exported by the browser session as JSON files:
///
/// - `fixtures-<day>.json`: the day's fixture list
/// - `details/<detail_ref>.json`: the three history sections of one fixture
/// - `periods/<match_ref>.json`: quarter tokens of one historical match
///
/// References are turned into file names by [`file_key`].
#[derive(Debug, Clone)]
pub struct PageDump {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FixturesFile {
    List(Vec<RawFixture>),
    Wrapped {
        #[serde(default)]
        fixtures: Vec<RawFixture>,
    },
}

impl PageDump {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn fixtures_path(&self, day: u32) -> PathBuf {
        self.root.join(format!("fixtures-{day}.json"))
    }

    fn detail_path(&self, detail_ref: &str) -> PathBuf {
        self.root
            .join("details")
            .join(format!("{}.json", file_key(detail_ref)))
    }

    fn periods_path(&self, match_ref: &str) -> PathBuf {
        self.root
            .join("periods")
            .join(format!("{}.json", file_key(match_ref)))
    }
}

impl FixtureSource for PageDump {
    fn fixtures(&self, day: u32) -> Result<Vec<RawFixture>, SourceError> {
        let raw = read_page(&self.fixtures_path(day))?;
        parse_fixtures_json(&raw).map_err(|err| SourceError::Malformed(format!("{err:#}")))
    }
}

impl DetailSource for PageDump {
    fn detail(&self, detail_ref: &str) -> Result<DetailRows, SourceError> {
        let raw = read_page(&self.detail_path(detail_ref))?;
        parse_detail_json(&raw).map_err(|err| SourceError::Malformed(format!("{err:#}")))
    }

    fn period_breakdown(&self) -> Option<&dyn PeriodSource> {
        Some(self)
    }
}

impl PeriodSource for PageDump {
    fn fetch_periods(&self, match_ref: &str) -> Result<Vec<String>, SourceError> {
        let raw = read_page(&self.periods_path(match_ref))?;
        parse_periods_json(&raw).map_err(|err| SourceError::Malformed(format!("{err:#}")))
    }
}

fn read_page(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SourceError::Unavailable(format!("{} missing", path.display())),
        _ => SourceError::Unavailable(format!("{}: {err}", path.display())),
    })
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<RawFixture>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let file: FixturesFile = serde_json::from_str(trimmed).context("invalid fixtures json")?;
    Ok(match file {
        FixturesFile::List(list) => list,
        FixturesFile::Wrapped { fixtures } => fixtures,
    })
}

pub fn parse_detail_json(raw: &str) -> Result<DetailRows> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(DetailRows::default());
    }
    serde_json::from_str(trimmed).context("invalid detail json")
}

pub fn parse_periods_json(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let values: Vec<serde_json::Value> =
        serde_json::from_str(trimmed).context("invalid periods json")?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
        .collect())
}

/// File-system safe name for a page reference (often a full URL).
pub fn file_key(reference: &str) -> String {
    let trimmed = reference
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let key: String = trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    key.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::file_key;

    #[test]
    fn file_key_flattens_urls() {
        assert_eq!(
            file_key("https://www.flashscore.com/match/AbCd1234/#/h2h"),
            "www_flashscore_com_match_AbCd1234___h2h"
        );
        assert_eq!(file_key("m-17"), "m-17");
    }
}
