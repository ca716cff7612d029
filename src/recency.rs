use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::competition::Sport;

/// How far back history rows may reach, per competition class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyPolicy {
    /// Competition names starting with one of these (case-insensitive) are amateur/collegiate.
    pub amateur_prefixes: Vec<String>,
    pub amateur_window_days: i64,
    pub default_window_days: i64,
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            amateur_prefixes: vec!["NCAA".to_string()],
            amateur_window_days: 365,
            default_window_days: 730,
        }
    }
}

impl RecencyPolicy {
    /// Tennis has no collegiate tier and reaches back one year for every row.
    pub fn for_sport(sport: Sport) -> Self {
        match sport {
            Sport::Tennis => Self {
                amateur_prefixes: Vec::new(),
                amateur_window_days: 365,
                default_window_days: 365,
            },
            Sport::Basketball | Sport::Hockey => Self::default(),
        }
    }

    pub fn is_amateur(&self, class: &str) -> bool {
        let class = class.to_lowercase();
        self.amateur_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && class.starts_with(&prefix.to_lowercase()))
    }

    pub fn window_days(&self, class: &str) -> i64 {
        if self.is_amateur(class) {
            self.amateur_window_days
        } else {
            self.default_window_days
        }
    }

    /// Oldest instant still eligible. Rows must be strictly newer than this.
    /// Windows reaching past the calendar range clamp to its start.
    pub fn cutoff(&self, class: &str, now: NaiveDateTime) -> NaiveDateTime {
        TimeDelta::try_days(self.window_days(class).max(0))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(NaiveDateTime::MIN)
    }
}
