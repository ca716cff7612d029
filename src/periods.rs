use tracing::{debug, warn};

use crate::history::{HistoricalResult, PeriodScores};
use crate::retry::RetryPolicy;
use crate::source::{PeriodSource, SourceError};

pub const PERIOD_TOKENS: usize = 12;
/// Overtime slots of the home and away halves.
pub const OVERTIME_SLOTS: [usize; 2] = [5, 11];

/// Page tokens for one match: home total, Q1..Q4, OT, then away total, Q1..Q4, OT.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeriodTokens(pub [String; PERIOD_TOKENS]);

impl PeriodTokens {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pads short fetches with empty tokens; extra tokens are dropped.
    pub fn from_raw(raw: Vec<String>) -> Self {
        let mut tokens = Self::empty();
        for (slot, value) in tokens.0.iter_mut().zip(raw) {
            *slot = value.trim().to_string();
        }
        tokens
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|t| !t.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|t| t.is_empty())
    }

    pub fn missing(&self) -> usize {
        self.0.iter().filter(|t| t.is_empty()).count()
    }

    /// Overtime is absent for most matches; missing quarters stay empty.
    pub fn default_overtime(&mut self) {
        for idx in OVERTIME_SLOTS {
            if self.0[idx].is_empty() {
                self.0[idx] = "0".to_string();
            }
        }
    }

    pub fn to_scores(&self) -> PeriodScores {
        let num = |idx: usize| self.0[idx].parse::<u32>().unwrap_or(0);
        PeriodScores {
            home: [num(1), num(2), num(3), num(4), num(5)],
            away: [num(7), num(8), num(9), num(10), num(11)],
        }
    }
}

/// Fetches the quarter breakdown for one historical match.
///
/// Only a fatal source error comes back as `Err`; every other failure degrades to
/// blank or partially defaulted tokens.
pub fn complete_periods(
    result: &HistoricalResult,
    source: &dyn PeriodSource,
    policy: &RetryPolicy,
) -> Result<PeriodTokens, SourceError> {
    let Some(match_ref) = result.match_ref.as_deref() else {
        return Ok(PeriodTokens::empty());
    };

    let outcome = policy.run(
        |_| source.fetch_periods(match_ref).map(PeriodTokens::from_raw),
        PeriodTokens::is_complete,
        SourceError::is_fatal,
        |attempt| {
            debug!(match_ref, attempt, "period breakdown incomplete; reloading");
            if let Err(err) = source.reload(match_ref) {
                debug!(match_ref, error = %err, "reload failed");
            }
        },
    );

    if outcome.aborted
        && let Some(err) = outcome.last_error
    {
        return Err(err);
    }

    match outcome.value {
        Some(tokens) if outcome.complete => Ok(tokens),
        Some(tokens) if tokens.is_blank() => {
            warn!(
                match_ref,
                attempts = outcome.attempts,
                "period breakdown stayed empty after retries"
            );
            Ok(PeriodTokens::empty())
        }
        Some(mut tokens) => {
            tokens.default_overtime();
            if !tokens.is_complete() {
                warn!(
                    match_ref,
                    missing = tokens.missing(),
                    attempts = outcome.attempts,
                    "quarter scores still missing after retries"
                );
            }
            Ok(tokens)
        }
        None => match outcome.last_error {
            Some(err) => {
                warn!(match_ref, error = %err, "period breakdown unavailable");
                Ok(PeriodTokens::empty())
            }
            None => Ok(PeriodTokens::empty()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::PeriodTokens;

    fn tokens(raw: &[&str]) -> PeriodTokens {
        PeriodTokens::from_raw(raw.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn short_fetch_is_padded() {
        let t = tokens(&["88", "20", "22"]);
        assert_eq!(t.missing(), 9);
        assert!(!t.is_complete());
    }

    #[test]
    fn overtime_defaults_leave_quarters_alone() {
        let mut t = tokens(&["88", "20", "22", "", "24", "", "80", "18", "20", "21", "21", ""]);
        t.default_overtime();
        assert_eq!(t.0[5], "0");
        assert_eq!(t.0[11], "0");
        assert_eq!(t.0[3], "");
        let scores = t.to_scores();
        assert_eq!(scores.home, [20, 22, 0, 24, 0]);
        assert_eq!(scores.away, [18, 20, 21, 21, 0]);
    }
}
