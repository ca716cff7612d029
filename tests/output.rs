use chrono::NaiveDate;

use fixture_history::aggregate::{AggregatedRecord, Aggregator, Fixture};
use fixture_history::competition::{Classifier, Sport};
use fixture_history::history::{HistoricalResult, PeriodScores};
use fixture_history::output::{
    Layout, OutputRouter, RouteRule, count_records, parse_blocks, serialize,
};
use fixture_history::recency::RecencyPolicy;
use fixture_history::source::RawFixture;

fn result(home: &str, away: &str, home_score: u32, away_score: u32) -> HistoricalResult {
    HistoricalResult {
        date: NaiveDate::from_ymd_opt(2025, 2, 1).expect("date"),
        home: home.to_string(),
        away: away.to_string(),
        home_score,
        away_score,
        competition_label: String::new(),
        match_ref: None,
        period_scores: PeriodScores::default(),
    }
}

fn record(sport: Sport, label: &str, a: &str, b: &str) -> AggregatedRecord {
    let raw = RawFixture {
        competition_label: label.to_string(),
        participant_a: a.to_string(),
        participant_b: b.to_string(),
        scheduled_time: "20:00".to_string(),
        detail_ref: "ref".to_string(),
        live: false,
    };
    let fixture = Fixture::from_raw(&raw, &Classifier::for_sport(sport));
    let recency = RecencyPolicy::default();
    let mut h2h = result(b, a, 101, 99);
    h2h.period_scores = PeriodScores {
        home: [25, 25, 25, 26, 0],
        away: [20, 30, 24, 25, 0],
    };
    Aggregator::new(&recency).aggregate(
        fixture,
        &[result(a, "X", 90, 80), result("Y", a, 70, 75)],
        &[result(b, "Z", 88, 86)],
        &[h2h],
    )
}

#[test]
fn scores_layout_matches_the_reader_format() {
    let rec = record(Sport::Basketball, "USA : NBA Standings", "Lakers", "Suns");
    let text = serialize(&rec, Layout::Scores);
    assert_eq!(
        text,
        "Lakers: 90 75 : 99\nSuns: 88 : 101\n(USA, NBA, 20:00)\n\n"
    );

    let parsed = parse_blocks(&text).expect("round trip");
    assert_eq!(parsed.len(), 1);
    let p = &parsed[0];
    assert_eq!(p.participant_a, "Lakers");
    assert_eq!(p.a_recent, vec![90, 75]);
    assert_eq!(p.a_h2h, vec![99]);
    assert_eq!(p.b_recent, vec![88]);
    assert_eq!(p.b_h2h, vec![101]);
    assert_eq!((p.country.as_str(), p.code.as_str(), p.time.as_str()), ("USA", "NBA", "20:00"));
    assert!(p.period_rows.is_empty());
}

#[test]
fn periods_layout_lists_each_meeting() {
    let rec = record(Sport::Basketball, "USA : NBA Standings", "Lakers", "Suns");
    let text = serialize(&rec, Layout::Periods);
    assert_eq!(
        text,
        "Lakers: 90 75\nSuns: 88\nH2H: 1\n\
         Lakers: 99 20 30 24 25 0\n\
         Suns: 101 25 25 25 26 0\n\
         (USA, NBA, 20:00)\n\n"
    );
    let parsed = parse_blocks(&text).expect("round trip");
    assert_eq!(parsed[0].a_recent, vec![90, 75]);
    assert_eq!(parsed[0].period_rows.len(), 1);
    assert_eq!(parsed[0].period_rows[0].1, vec![101, 25, 25, 25, 26, 0]);
}

#[test]
fn empty_series_still_write_the_name_line() {
    let mut rec = record(Sport::Basketball, "USA : NCAA", "Duke", "UNC");
    rec.participant_b_series.lines.clear();
    let text = serialize(&rec, Layout::Scores);
    assert_eq!(text, "Duke: 90 75\nUNC:\n(USA, NCAA, 20:00)\n\n");
    let parsed = parse_blocks(&text).expect("round trip");
    assert!(parsed[0].b_recent.is_empty());
    assert!(parsed[0].a_h2h.is_empty());
}

#[test]
fn multi_word_codes_survive_the_metadata_line() {
    let rec = record(
        Sport::Basketball,
        "EUROPE : Eurocup - Play Offs Standings",
        "Valencia",
        "Bursaspor",
    );
    let text = serialize(&rec, Layout::Scores);
    let parsed = parse_blocks(&text).expect("round trip");
    assert_eq!(parsed[0].code, "Eurocup - Play Offs");
    assert_eq!(parsed[0].country, "EUROPE");
}

#[test]
fn records_are_counted_by_blank_line_blocks() {
    let rec = record(Sport::Basketball, "USA : NBA", "Lakers", "Suns");
    let mut text = serialize(&rec, Layout::Scores);
    text.push_str(&serialize(&rec, Layout::Periods));
    assert_eq!(count_records(&text), 2);
    assert_eq!(parse_blocks(&text).expect("both parse").len(), 2);
    assert!(parse_blocks("Lakers: 1\n\n").is_err());
}

#[test]
fn basketball_routes() {
    let router = OutputRouter::for_sport(Sport::Basketball);
    let route = |label: &str| {
        router
            .route(&record(Sport::Basketball, label, "A", "B"))
            .to_string()
    };
    assert_eq!(route("USA : NBA Standings"), "nba");
    assert_eq!(route("USA : WNBA"), "nba");
    assert_eq!(route("USA : NCAA"), "ncaa");
    assert_eq!(route("SPAIN : ACB"), "random");
    assert_eq!(router.destinations(), vec!["nba", "ncaa", "random"]);
}

#[test]
fn hockey_routes() {
    let router = OutputRouter::for_sport(Sport::Hockey);
    let nhl = record(Sport::Hockey, "USA : NHL Live Standings", "Rangers", "Bruins");
    let khl = record(Sport::Hockey, "RUSSIA : KHL", "SKA", "CSKA");
    assert_eq!(router.route(&nhl), "nhl");
    assert_eq!(router.route(&khl), "hockey_random");
    assert_eq!(router.destinations(), vec!["nhl", "hockey_random"]);
}

#[test]
fn configured_routes_can_require_a_country() {
    let rules: Vec<RouteRule> = serde_json::from_str(
        r#"[{"destination": "israel", "country": "israel", "codes": ["ISL"]},
            {"destination": "nba", "codes": ["NBA"]}]"#,
    )
    .expect("valid routes");
    let router = OutputRouter::new(rules, "other");

    let isl = record(Sport::Basketball, "ISRAEL : Super League", "Maccabi", "Hapoel");
    let rsl = record(Sport::Basketball, "RUSSIA : Super League", "CSKA", "Zenit");
    assert_eq!(router.route(&isl), "israel");
    assert_eq!(router.route(&rsl), "other");
}

#[test]
fn oversized_head_to_head_counts_are_rejected() {
    let text = "A: 1\nB: 2\nH2H: 18446744073709551615\n(X, Y, 20:00)\n\n";
    assert!(parse_blocks(text).is_err());
    let text = "A: 1\nB: 2\nH2H: 9223372036854775807\n(X, Y, 20:00)\n\n";
    assert!(parse_blocks(text).is_err());
    assert!(parse_blocks("A: 1\nB: 2\nH2H: 2\nA: 1 0\n(X, Y, 20:00)\n\n").is_err());
}

#[test]
fn tennis_main_tours_get_their_own_file_with_set_tokens() {
    let classifier = Classifier::for_sport(Sport::Tennis);
    let raw = |label: &str| RawFixture {
        competition_label: label.to_string(),
        participant_a: "Sinner J.".to_string(),
        participant_b: "Rune H.".to_string(),
        scheduled_time: "13:30".to_string(),
        detail_ref: "ref".to_string(),
        live: false,
    };
    let recency = RecencyPolicy::for_sport(Sport::Tennis);
    let atp = Aggregator::new(&recency).aggregate(
        Fixture::from_raw(&raw("ATP - SINGLES: Rotterdam (Netherlands), hard"), &classifier),
        &[result("Sinner J.", "X", 2, 0), result("Y", "Sinner J.", 1, 2)],
        &[result("Z", "Rune H.", 2, 1)],
        &[result("Rune H.", "Sinner J.", 0, 2)],
    );
    let text = serialize(&atp, Layout::Sets);
    assert_eq!(
        text,
        "Sinner J.: 2-0 2-1 : 2-0\n\
         Rune H.: 1-2 : 0-2\n\
         (ATP - SINGLES, Rotterdam (Netherlands), hard, 13:30)\n\n"
    );
    let parsed = parse_blocks(&text).expect("round trip");
    assert_eq!(parsed[0].a_recent, vec![2, 2]);
    assert_eq!(parsed[0].b_h2h, vec![0]);
    assert_eq!(parsed[0].code, "Rotterdam (Netherlands), hard");

    let router = OutputRouter::for_sport(Sport::Tennis);
    assert_eq!(router.route(&atp), "atp");
    let itf = Aggregator::new(&recency).aggregate(
        Fixture::from_raw(&raw("ITF MEN - SINGLES: M25 Monastir (Tunisia)"), &classifier),
        &[],
        &[],
        &[],
    );
    assert_eq!(router.route(&itf), "tennis");
}
