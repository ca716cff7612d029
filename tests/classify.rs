use fixture_history::competition::{AllowList, Classifier, CodeRule, Competition, Sport};

fn basketball() -> Classifier {
    Classifier::for_sport(Sport::Basketball)
}

#[test]
fn splits_region_and_strips_standings() {
    let c = basketball().classify("USA : NBA Standings");
    assert_eq!(
        c,
        Competition {
            name: "NBA".to_string(),
            country: "USA".to_string(),
            code: "NBA".to_string(),
        }
    );
}

#[test]
fn stage_suffix_stays_in_the_name() {
    let c = basketball().classify("EUROPE : Eurocup - Play Offs Standings");
    assert_eq!(c.name, "Eurocup - Play Offs");
    assert_eq!(c.country, "EUROPE");
    assert_eq!(c.code, "Eurocup - Play Offs");
}

#[test]
fn country_specific_codes_win_over_generic_ones() {
    let classifier = basketball();
    assert_eq!(classifier.classify("ISRAEL : Super League Standings").code, "ISL");
    assert_eq!(classifier.classify("RUSSIA: Super League").code, "RSL");
    assert_eq!(classifier.classify("GREECE : Super League").code, "SL");
    assert_eq!(classifier.classify("TURKEY : Super Lig Standings").code, "SL");
    assert_eq!(classifier.classify("CZECH REPUBLIC : NBL").code, "CZNBL");
    assert_eq!(classifier.classify("NORTH MACEDONIA : Prva Liga").code, "MKPL");
    assert_eq!(classifier.classify("SLOVENIA : Prva Liga").code, "PL");
}

#[test]
fn prefix_rules_cover_stage_variants() {
    let classifier = basketball();
    assert_eq!(
        classifier
            .classify("EUROPE : Champions League - Play Offs Standings")
            .code,
        "CHL"
    );
    assert_eq!(classifier.classify("EUROPE : FIBA Europe Cup").code, "FEC");
}

#[test]
fn unmapped_names_are_their_own_code() {
    let c = basketball().classify("AUSTRALIA : NBL1 West Standings");
    assert_eq!(c.name, "NBL1 West");
    assert_eq!(c.code, "NBL1 West");
}

#[test]
fn labels_without_colon_come_back_verbatim() {
    let c = basketball().classify("Friendly International");
    assert_eq!(c.name, "Friendly International");
    assert_eq!(c.country, "");
    assert_eq!(c.code, "Friendly International");

    let empty = basketball().classify("");
    assert_eq!(empty.name, "");
    assert_eq!(empty.country, "");
    assert_eq!(empty.code, "");
}

#[test]
fn draw_noise_is_removed() {
    let c = basketball().classify("USA : NCAA\nDraw Standings");
    assert_eq!(c.name, "NCAA");
    assert_eq!(c.code, "NCAA");
}

#[test]
fn hockey_cuts_live_standings() {
    let hockey = Classifier::for_sport(Sport::Hockey);
    let nhl = hockey.classify("USA : NHL Live Standings");
    assert_eq!(nhl.name, "NHL");
    assert_eq!(nhl.code, "NHL");
    assert_eq!(hockey.classify("CZECH REPUBLIC : Extraliga").code, "ELH");
    assert_eq!(hockey.classify("SWEDEN : Hockey Allsvenskan Standings").code, "HA");
}

#[test]
fn custom_rules_apply_in_order() {
    let classifier = Classifier::new(
        vec![
            CodeRule::exact("Liga", "ARG").in_country("Argentina"),
            CodeRule::prefix("Liga", "LIGA"),
        ],
        vec!["Standings".to_string()],
    );
    assert_eq!(classifier.classify("ARGENTINA : Liga").code, "ARG");
    assert_eq!(classifier.classify("CHILE : Liga Nacional").code, "LIGA");
    assert_eq!(classifier.rules().len(), 2);
}

#[test]
fn allow_list_matches_names_exactly() {
    let classifier = basketball();
    let allow = AllowList::new(["Eurocup", "NBA"]);
    assert_eq!(allow.len(), 2);

    assert!(allow.is_admitted(&classifier.classify("EUROPE : Eurocup Standings")));
    assert!(allow.is_admitted(&classifier.classify("USA : NBA")));
    assert!(!allow.is_admitted(&classifier.classify("EUROPE : Eurocup - Play Offs Standings")));
    assert!(!allow.is_admitted(&classifier.classify("USA : WNBA")));

    let with_stage = AllowList::new(["Eurocup - Play Offs"]);
    assert!(with_stage.is_admitted(&classifier.classify("EUROPE : Eurocup - Play Offs Standings")));
    assert!(AllowList::default().is_empty());
}

#[test]
fn tennis_admits_whole_tours_and_keeps_tournament_names() {
    let classifier = Classifier::for_sport(Sport::Tennis);
    let comp = classifier.classify("ATP - SINGLES: Indian Wells (USA), hard Standings");
    assert_eq!(comp.country, "ATP - SINGLES");
    assert_eq!(comp.name, "Indian Wells (USA), hard");
    assert_eq!(comp.code, comp.name);

    let allow = AllowList::new(Sport::Tennis.default_allowed())
        .with_categories(Sport::Tennis.default_categories());
    assert!(allow.is_admitted(&comp));
    assert!(allow.is_admitted(&classifier.classify("WTA - DOUBLES: Doha (Qatar), hard")));
    assert!(allow.is_admitted(&classifier.classify("ITF WOMEN - SINGLES: Sharm (Egypt)")));
    assert!(!allow.is_admitted(&classifier.classify("EXHIBITION - MEN: Hong Kong")));
    assert!(!allow.is_admitted(&classifier.classify("UTR Pro Tennis Series")));
    assert_eq!(Sport::parse(" Tennis "), Some(Sport::Tennis));
}
