use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::history::ScoreFormat;
use crate::output::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    #[default]
    Basketball,
    Hockey,
    Tennis,
}

impl Sport {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "basketball" | "bb" => Some(Sport::Basketball),
            "hockey" | "ice_hockey" | "ice-hockey" => Some(Sport::Hockey),
            "tennis" => Some(Sport::Tennis),
            _ => None,
        }
    }

    pub fn default_rules(self) -> Vec<CodeRule> {
        match self {
            Sport::Basketball => BASKETBALL_RULES.clone(),
            Sport::Hockey => HOCKEY_RULES.clone(),
            // Tournament names are used as-is.
            Sport::Tennis => Vec::new(),
        }
    }

    /// Header suffixes cut from the competition name, longest first.
    pub fn label_markers(self) -> Vec<String> {
        let markers: &[&str] = match self {
            Sport::Basketball | Sport::Tennis => &["Standings"],
            // The NHL header carries a "Live Standings" link.
            Sport::Hockey => &["Live Standings", "Standings"],
        };
        markers.iter().map(|m| m.to_string()).collect()
    }

    pub fn default_allowed(self) -> Vec<String> {
        let names: &[&str] = match self {
            Sport::Basketball => &[
                "NBA",
                "WNBA",
                "NCAA",
                "ACB",
                "Euroleague",
                "Eurocup",
                "NBB",
                "BBL",
                "LNB",
                "Lega A",
                "ABA League",
                "BNXT League",
                "CBA",
                "KBL",
                "NBL",
            ],
            Sport::Hockey => &[
                "NHL",
                "AHL",
                "KHL",
                "SHL",
                "Liiga",
                "DEL",
                "NL",
                "Extraliga",
                "ICEHL",
                "Hockey Allsvenskan",
                "Mestis",
                "Champions Hockey League",
                "Metal Ligaen",
                "GET-ligaen",
                "1st Division",
            ],
            // Tournaments come and go weekly; tennis admits by tour instead.
            Sport::Tennis => &[],
        };
        names.iter().map(|n| n.to_string()).collect()
    }

    /// Substrings of the label's left half (the tour) that admit a fixture on their own.
    pub fn default_categories(self) -> Vec<String> {
        let tours: &[&str] = match self {
            Sport::Basketball | Sport::Hockey => &[],
            Sport::Tennis => &[
                "ATP",
                "WTA",
                "Challenger",
                "ITF Men",
                "ITF Women",
                "United Cup",
                "Davis Cup",
                "Billie Jean King Cup",
            ],
        };
        tours.iter().map(|t| t.to_string()).collect()
    }

    /// Whether head-to-head rows get a per-quarter breakdown.
    pub fn wants_periods(self) -> bool {
        matches!(self, Sport::Basketball)
    }

    /// Team sports keep only history rows from the fixture's competition; a player's
    /// tennis form counts across every tournament.
    pub fn filters_history_by_competition(self) -> bool {
        !matches!(self, Sport::Tennis)
    }

    pub fn score_format(self) -> ScoreFormat {
        match self {
            Sport::Basketball | Sport::Hockey => ScoreFormat::Points,
            Sport::Tennis => ScoreFormat::Sets,
        }
    }

    pub fn default_layout(self) -> Layout {
        match self {
            Sport::Basketball | Sport::Hockey => Layout::Scores,
            Sport::Tennis => Layout::Sets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Competition {
    pub name: String,
    pub country: String,
    pub code: String,
}

/// One entry of the ordered code table. First matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRule {
    pub name: String,
    #[serde(default)]
    pub prefix: bool,
    #[serde(default)]
    pub country: Option<String>,
    pub code: String,
}

impl CodeRule {
    pub fn exact(name: &str, code: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: false,
            country: None,
            code: code.to_string(),
        }
    }

    pub fn prefix(name: &str, code: &str) -> Self {
        Self {
            prefix: true,
            ..Self::exact(name, code)
        }
    }

    pub fn in_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn matches(&self, name: &str, country: &str) -> bool {
        let name_ok = if self.prefix {
            name.starts_with(&self.name)
        } else {
            name == self.name
        };
        if !name_ok {
            return false;
        }
        match self.country.as_deref() {
            Some(c) => c.to_lowercase() == country.to_lowercase(),
            None => true,
        }
    }
}

static BASKETBALL_RULES: Lazy<Vec<CodeRule>> = Lazy::new(|| {
    vec![
        // Same league name, different countries.
        CodeRule::exact("Super League", "ISL").in_country("Israel"),
        CodeRule::exact("Super League", "RSL").in_country("Russia"),
        CodeRule::exact("NBL", "NBL").in_country("Australia"),
        CodeRule::exact("NBL", "CZNBL").in_country("Czech Republic"),
        CodeRule::exact("NBL", "BGNBL").in_country("Bulgaria"),
        CodeRule::exact("Prva Liga", "MKPL").in_country("North Macedonia"),
        CodeRule::exact("Premier League", "PL"),
        CodeRule::exact("Premier League Women", "PRE"),
        CodeRule::exact("Prva Liga", "PL"),
        CodeRule::exact("Pro B", "PB"),
        CodeRule::exact("Super League", "SL"),
        CodeRule::exact("Super Lig", "SL"),
        CodeRule::exact("Premijer liga", "A1"),
        CodeRule::exact("First League", "FL"),
        CodeRule::exact("Basket Liga", "BL"),
        CodeRule::exact("Basket League", "BL"),
        CodeRule::exact("Basketligan", "LIG"),
        CodeRule::exact("Liga A", "LA"),
        CodeRule::exact("Superliga", "ABL"),
        CodeRule::exact("NB I. A", "NBI"),
        CodeRule::exact("Lega A", "LA"),
        CodeRule::exact("SLB", "BBL"),
        CodeRule::exact("BNXT League", "BNXT"),
        CodeRule::exact("1. Liga", "1L"),
        CodeRule::prefix("Champions League", "CHL"),
        CodeRule::prefix("FIBA Europe Cup", "FEC"),
    ]
});

static HOCKEY_RULES: Lazy<Vec<CodeRule>> = Lazy::new(|| {
    vec![
        CodeRule::exact("1st Division", "D1"),
        CodeRule::exact("Extraliga", "ELH"),
        CodeRule::exact("Mestis", "MES"),
        CodeRule::exact("Hockey Allsvenskan", "HA"),
        CodeRule::exact("Metal Ligaen", "ML"),
        CodeRule::exact("GET-ligaen", "GET"),
    ]
});

/// Turns page header labels such as `"USA : NCAA Standings"` into a [`Competition`].
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CodeRule>,
    label_markers: Vec<String>,
}

impl Classifier {
    pub fn new(rules: Vec<CodeRule>, label_markers: Vec<String>) -> Self {
        Self {
            rules,
            label_markers,
        }
    }

    pub fn for_sport(sport: Sport) -> Self {
        Self::new(sport.default_rules(), sport.label_markers())
    }

    pub fn rules(&self) -> &[CodeRule] {
        &self.rules
    }

    pub fn classify(&self, raw_label: &str) -> Competition {
        let (name, country) = self.split_label(raw_label);
        let code = self.code_for(&name, &country);
        Competition {
            name,
            country,
            code,
        }
    }

    /// Returns `(name, country)`. Labels without a colon come back verbatim as the name.
    pub fn split_label(&self, raw_label: &str) -> (String, String) {
        let Some((left, right)) = raw_label.split_once(':') else {
            return (raw_label.to_string(), String::new());
        };
        let country = left.trim().to_string();
        let mut name = right.trim();
        for marker in &self.label_markers {
            if let Some(idx) = name.find(marker.as_str()) {
                name = &name[..idx];
                break;
            }
        }
        (clean_name(name.trim()), country)
    }

    pub fn code_for(&self, name: &str, country: &str) -> String {
        self.rules
            .iter()
            .find(|rule| rule.matches(name, country))
            .map(|rule| rule.code.clone())
            .unwrap_or_else(|| name.to_string())
    }
}

fn clean_name(name: &str) -> String {
    let noisy = name.contains('\n') || name.split_whitespace().any(|tok| tok == "Draw");
    if !noisy {
        return name.to_string();
    }
    name.split_whitespace()
        .filter(|tok| *tok != "Draw")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact-name allow-list. Matches the classifier's `name`, never the `code`, so each
/// stage variant ("Eurocup - Play Offs") has to be listed on its own.
///
/// Categories are case-insensitive substrings of the competition's `country` half
/// (the tour, for tennis) and admit every competition under it.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    names: HashSet<String>,
    categories: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            categories: Vec::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories
            .into_iter()
            .map(Into::into)
            .filter(|c: &String| !c.is_empty())
            .collect();
        self
    }

    pub fn is_admitted(&self, competition: &Competition) -> bool {
        if self.names.contains(&competition.name) {
            return true;
        }
        let country = competition.country.to_lowercase();
        self.categories
            .iter()
            .any(|c| country.contains(&c.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.names.len() + self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_name, CodeRule};

    #[test]
    fn clean_name_drops_draw_and_newlines() {
        assert_eq!(clean_name("NCAA\nDraw"), "NCAA");
        assert_eq!(clean_name("Eurocup - Play Offs"), "Eurocup - Play Offs");
        assert_eq!(clean_name("Draw"), "");
    }

    #[test]
    fn country_condition_is_case_insensitive() {
        let rule = CodeRule::exact("NBL", "NBL").in_country("Australia");
        assert!(rule.matches("NBL", "AUSTRALIA"));
        assert!(!rule.matches("NBL", "Bulgaria"));
        assert!(!rule.matches("NBL1", "Australia"));
    }
}
