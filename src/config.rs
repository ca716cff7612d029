use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::competition::{AllowList, Classifier, CodeRule, Sport};
use crate::history::HistoryCaps;
use crate::output::{Layout, OutputRouter, RouteRule};
use crate::recency::RecencyPolicy;
use crate::retry::RetryPolicy;

const DEFAULT_OUTPUT_DIR: &str = "data";
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WORKER_THREADS: usize = 4;

/// Everything one run needs. Loaded once, never mutated after the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub sport: Sport,
    /// Replaces the sport's default allow-list when set.
    pub allowed_competitions: Option<Vec<String>>,
    /// Replaces the sport's default admitted categories (tennis tours) when set.
    pub allowed_categories: Option<Vec<String>>,
    /// Replaces the sport's default code table when set.
    pub code_rules: Option<Vec<CodeRule>>,
    /// Defaults to the sport's windows.
    pub recency: Option<RecencyPolicy>,
    pub caps: HistoryCaps,
    pub routes: Option<Vec<RouteRule>>,
    pub fallback_route: Option<String>,
    /// Defaults to the sport's layout.
    pub layout: Option<Layout>,
    /// Defaults to the sport's setting.
    pub period_breakdown: Option<bool>,
    pub period_retry: RetryPolicy,
    pub call_timeout_secs: u64,
    pub worker_threads: usize,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sport: Sport::default(),
            allowed_competitions: None,
            allowed_categories: None,
            code_rules: None,
            recency: None,
            caps: HistoryCaps::default(),
            routes: None,
            fallback_route: None,
            layout: None,
            period_breakdown: None,
            period_retry: RetryPolicy::default(),
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            worker_threads: DEFAULT_WORKER_THREADS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl RunConfig {
    pub fn for_sport(sport: Sport) -> Self {
        Self {
            sport,
            ..Self::default()
        }
    }

    /// Reads `path` (if given), then applies `APP_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::default());
        }
        serde_json::from_str(trimmed).context("invalid config json")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(&tmp, json).context("write config")?;
        fs::rename(&tmp, path).context("swap config")?;
        Ok(())
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(raw) = env_value("APP_SPORT") {
            self.sport = Sport::parse(&raw).ok_or_else(|| anyhow!("unknown APP_SPORT {raw:?}"))?;
        }
        if let Some(raw) = env_value("APP_LAYOUT") {
            self.layout =
                Some(Layout::parse(&raw).ok_or_else(|| anyhow!("unknown APP_LAYOUT {raw:?}"))?);
        }
        if let Some(raw) = env_value("APP_ALLOWED_COMPETITIONS") {
            self.allowed_competitions = Some(parse_list(&raw));
        }
        if let Some(raw) = env_value("APP_ALLOWED_CATEGORIES") {
            self.allowed_categories = Some(parse_list(&raw));
        }
        if let Some(v) = env_parse::<usize>("APP_RECENT_FORM_CAP")? {
            self.caps.recent_form = v;
        }
        if let Some(v) = env_parse::<usize>("APP_H2H_CAP")? {
            self.caps.head_to_head = v;
        }
        if let Some(v) = env_parse::<i64>("APP_DEFAULT_WINDOW_DAYS")? {
            self.recency_mut().default_window_days = v;
        }
        if let Some(v) = env_parse::<i64>("APP_AMATEUR_WINDOW_DAYS")? {
            self.recency_mut().amateur_window_days = v;
        }
        if let Some(v) = env_parse::<u64>("APP_CALL_TIMEOUT_SECS")? {
            self.call_timeout_secs = v;
        }
        if let Some(v) = env_parse::<usize>("APP_WORKER_THREADS")? {
            self.worker_threads = v;
        }
        if let Some(v) = env_parse::<u32>("APP_PERIOD_RETRIES")? {
            self.period_retry.max_retries = v;
        }
        if let Some(v) = env_parse::<u64>("APP_PERIOD_BACKOFF_MS")? {
            self.period_retry.backoff_ms = v;
        }
        if let Some(raw) = env_value("APP_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(raw);
        }
        Ok(())
    }

    pub fn classifier(&self) -> Classifier {
        let rules = self
            .code_rules
            .clone()
            .unwrap_or_else(|| self.sport.default_rules());
        Classifier::new(rules, self.sport.label_markers())
    }

    pub fn allow_list(&self) -> AllowList {
        let names = self
            .allowed_competitions
            .clone()
            .unwrap_or_else(|| self.sport.default_allowed());
        let categories = self
            .allowed_categories
            .clone()
            .unwrap_or_else(|| self.sport.default_categories());
        AllowList::new(names).with_categories(categories)
    }

    pub fn recency(&self) -> RecencyPolicy {
        self.recency
            .clone()
            .unwrap_or_else(|| RecencyPolicy::for_sport(self.sport))
    }

    fn recency_mut(&mut self) -> &mut RecencyPolicy {
        let sport = self.sport;
        self.recency
            .get_or_insert_with(|| RecencyPolicy::for_sport(sport))
    }

    pub fn layout(&self) -> Layout {
        self.layout.unwrap_or_else(|| self.sport.default_layout())
    }

    pub fn router(&self) -> OutputRouter {
        let rules = self
            .routes
            .clone()
            .unwrap_or_else(|| OutputRouter::default_rules(self.sport));
        let fallback = self
            .fallback_route
            .as_deref()
            .unwrap_or(OutputRouter::default_fallback(self.sport));
        OutputRouter::new(rules, fallback)
    }

    pub fn wants_periods(&self) -> bool {
        self.period_breakdown
            .unwrap_or_else(|| self.sport.wants_periods())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs.max(1))
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads.clamp(1, 32)
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_value(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid {key}={raw:?}")),
        None => Ok(None),
    }
}

/// Comma or semicolon separated names; spaces inside a name are kept.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{RunConfig, parse_list};
    use crate::competition::Sport;
    use crate::output::Layout;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RunConfig::from_json(
            r#"{"sport":"hockey","caps":{"recent_form":10},"layout":"periods"}"#,
        )
        .expect("valid config");
        assert_eq!(cfg.sport, Sport::Hockey);
        assert_eq!(cfg.caps.recent_form, 10);
        assert_eq!(cfg.caps.head_to_head, 5);
        assert_eq!(cfg.layout(), Layout::Periods);
        assert_eq!(cfg.recency().default_window_days, 730);
        assert!(!cfg.wants_periods());
    }

    #[test]
    fn tennis_defaults_follow_the_sport() {
        let cfg = RunConfig::from_json(r#"{"sport":"tennis"}"#).expect("valid config");
        assert_eq!(cfg.layout(), Layout::Sets);
        assert_eq!(cfg.recency().default_window_days, 365);
        assert!(!cfg.wants_periods());
        assert!(!cfg.allow_list().is_empty());

        let pinned = RunConfig::from_json(
            r#"{"sport":"tennis","layout":"scores","recency":{"default_window_days":30}}"#,
        )
        .expect("valid config");
        assert_eq!(pinned.layout(), Layout::Scores);
        assert_eq!(pinned.recency().default_window_days, 30);
        assert_eq!(pinned.recency().amateur_prefixes, vec!["NCAA".to_string()]);
    }

    #[test]
    fn null_config_is_default() {
        assert_eq!(RunConfig::from_json("null").expect("null"), RunConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = std::env::temp_dir().join(format!("fixture_history_cfg_{}.json", std::process::id()));
        let mut cfg = RunConfig::for_sport(Sport::Hockey);
        cfg.allowed_competitions = Some(vec!["NHL".to_string()]);
        cfg.save(&path).expect("save");
        assert_eq!(RunConfig::from_file(&path).expect("load"), cfg);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn parse_list_keeps_inner_spaces() {
        assert_eq!(
            parse_list("NB I. A; Eurocup - Play Offs,NBA,"),
            vec!["NB I. A", "Eurocup - Play Offs", "NBA"]
        );
    }
}
