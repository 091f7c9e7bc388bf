//! End-to-end tests for the surebet library.
//!
//! Feeds go through consolidation and detection exactly as the binary runs
//! them; no network access is needed.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::macros::datetime;

use surebet::arbitrage::{find_opportunities, scan, DetectorConfig, MarginRange, SkipReason};
use surebet::market::{
    consolidate, demo_feeds, Event, MarketKind, Outcome, RawEventBuilder, SourceFeed,
};
use surebet::{ArbitrageError, Opportunity};

fn close(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

fn range(min: Decimal, max: Decimal) -> (Decimal, Decimal) {
    (min, max)
}

/// Two bookmakers quoting three derbies; only the first hides a surebet.
fn weekend_feeds() -> Vec<SourceFeed> {
    let at = datetime!(2024-01-20 12:00 UTC);
    vec![
        SourceFeed::new(
            "BetWarrior",
            vec![
                RawEventBuilder::new("Boca Juniors", "River Plate", "Primera Division")
                    .match_result(dec!(2.50), dec!(3.10), dec!(3.00), at)
                    .build(),
                RawEventBuilder::new("Racing Club", "Independiente", "Primera Division")
                    .match_result(dec!(2.10), dec!(3.40), dec!(3.80), at)
                    .build(),
                RawEventBuilder::new("San Lorenzo", "Huracan", "Primera Division")
                    .quote("1X2", MarketKind::MatchResult, Outcome::Home, dec!(2.30), at)
                    .build(),
            ],
        ),
        SourceFeed::new(
            "Codere",
            vec![
                RawEventBuilder::new("Boca Juniors", "River Plate", "Primera Division")
                    .match_result(dec!(2.35), dec!(3.60), dec!(3.30), at)
                    .build(),
                RawEventBuilder::new("Racing Club", "Independiente", "Primera Division")
                    .match_result(dec!(2.05), dec!(3.30), dec!(3.70), at)
                    .build(),
                RawEventBuilder::new("San Lorenzo", "Huracan", "Primera Division")
                    .quote("1X2", MarketKind::MatchResult, Outcome::Draw, dec!(3.10), at)
                    .build(),
            ],
        ),
    ]
}

fn assert_stake_split_holds(opp: &Opportunity) {
    let tolerance = dec!(0.000000001);

    let share: Decimal = opp.legs.iter().map(|l| l.stake / opp.total_stake).sum();
    assert!(close(share, Decimal::ONE, tolerance), "stake shares sum to {share}");

    for leg in &opp.legs {
        assert!(close(leg.stake * leg.quote.odds, opp.guaranteed_return, tolerance));
    }

    let reciprocal: Decimal = opp.legs.iter().map(|l| Decimal::ONE / l.quote.odds).sum();
    let expected_margin = (Decimal::ONE - reciprocal) * Decimal::ONE_HUNDRED;
    assert!(close(opp.margin, expected_margin, tolerance));
}

#[test]
fn three_way_scenario_matches_hand_calculation() {
    let events = consolidate(weekend_feeds());

    let opps = find_opportunities(&events, dec!(10000), range(dec!(1.0), dec!(10.0))).unwrap();

    assert_eq!(opps.len(), 1);
    let opp = &opps[0];
    assert_eq!(opp.event.home, "Boca Juniors");
    assert!(close(opp.implied_sum, dec!(0.9808), dec!(0.0001)));
    assert!(close(opp.margin, dec!(1.92), dec!(0.01)));

    let stakes: Vec<Decimal> = opp.legs.iter().map(|l| l.stake.round_dp(0)).collect();
    assert_eq!(stakes, vec![dec!(4078), dec!(2832), dec!(3090)]);

    assert!(close(opp.guaranteed_return, dec!(10196), dec!(1)));
    assert!(close(opp.guaranteed_profit, dec!(196), dec!(1)));
    assert!(close(opp.roi, dec!(1.96), dec!(0.01)));
    assert_stake_split_holds(opp);
}

#[test]
fn skipped_markets_are_reported_with_reasons() {
    let events = consolidate(weekend_feeds());
    let config = DetectorConfig::new(dec!(10000), MarginRange::new(dec!(1), dec!(10)).unwrap());

    let report = scan(&events, &config).unwrap();

    let reasons: Vec<(&str, &str)> = report
        .skipped
        .iter()
        .map(|s| (s.event.home.as_str(), s.reason.label()))
        .collect();
    assert_eq!(
        reasons,
        vec![("Racing Club", "no_arbitrage"), ("San Lorenzo", "incomplete")]
    );
    assert_eq!(report.markets_evaluated(), 3);
}

#[test]
fn accepted_margins_lie_within_range() {
    let events = consolidate(demo_feeds());
    let (min, max) = (dec!(0.5), dec!(5));

    for opp in find_opportunities(&events, dec!(2500), range(min, max)).unwrap() {
        assert!(opp.margin >= min && opp.margin <= max);
        assert_stake_split_holds(&opp);
    }
}

#[test]
fn tightening_the_range_removes_the_opportunity() {
    let events = consolidate(demo_feeds());
    let opps = find_opportunities(&events, dec!(10000), range(dec!(1), dec!(10))).unwrap();
    let margin = opps[0].margin;

    let raised_min =
        find_opportunities(&events, dec!(10000), range(margin + dec!(0.01), dec!(10))).unwrap();
    assert!(raised_min.is_empty());

    let lowered_max =
        find_opportunities(&events, dec!(10000), range(dec!(0), margin - dec!(0.01))).unwrap();
    assert!(lowered_max.is_empty());

    let exact = find_opportunities(&events, dec!(10000), range(margin, dec!(10))).unwrap();
    assert_eq!(exact.len(), 1);
}

#[test]
fn detection_is_deterministic() {
    let scan_demo = || {
        find_opportunities(&consolidate(demo_feeds()), dec!(10000), range(dec!(1), dec!(10)))
    };

    let first = scan_demo().unwrap();
    let second = scan_demo().unwrap();

    assert_eq!(first, second);
}

#[test]
fn exact_break_even_is_not_an_opportunity() {
    let at = datetime!(2024-01-20 12:00 UTC);
    let feeds = vec![
        SourceFeed::new(
            "Bplay",
            vec![RawEventBuilder::new("Boca Juniors", "River Plate", "Primera Division")
                .over_under(dec!(2.5), dec!(2.00), dec!(1.80), at)
                .build()],
        ),
        SourceFeed::new(
            "Betsson",
            vec![RawEventBuilder::new("Boca Juniors", "River Plate", "Primera Division")
                .over_under(dec!(2.5), dec!(1.90), dec!(2.00), at)
                .build()],
        ),
    ];
    let events = consolidate(feeds);
    let config = DetectorConfig::new(dec!(100), MarginRange::new(dec!(0), dec!(10)).unwrap());

    let report = scan(&events, &config).unwrap();

    assert!(report.opportunities.is_empty());
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::NoArbitrage {
            implied_sum: Decimal::ONE
        }
    );
}

#[test]
fn no_arbitrage_scenario_is_rejected() {
    let at = datetime!(2024-01-20 12:00 UTC);
    let feeds = vec![SourceFeed::new(
        "Codere",
        vec![RawEventBuilder::new("Racing Club", "Independiente", "Primera Division")
            .match_result(dec!(1.80), dec!(1.90), dec!(1.95), at)
            .build()],
    )];

    let events = consolidate(feeds);

    let opps = find_opportunities(&events, dec!(10000), range(dec!(0), dec!(10))).unwrap();

    assert!(opps.is_empty());
}

#[test]
fn invalid_input_fails_fast() {
    let at = datetime!(2024-01-20 12:00 UTC);
    let mut feeds = demo_feeds();
    feeds.push(SourceFeed::new(
        "Broken",
        vec![RawEventBuilder::new("Boca Juniors", "River Plate", "Primera Division")
            .quote("1X2", MarketKind::MatchResult, Outcome::Away, dec!(-3.0), at)
            .build()],
    ));
    let events = consolidate(feeds);

    let err = find_opportunities(&events, dec!(10000), range(dec!(1), dec!(10))).unwrap_err();
    assert!(matches!(err, ArbitrageError::InvalidOdds { .. }));

    let events = consolidate(demo_feeds());
    let err = find_opportunities(&events, dec!(-1), range(dec!(1), dec!(10))).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn empty_input_is_an_empty_result() {
    let events: Vec<Event> = consolidate(Vec::new());

    let opps = find_opportunities(&events, dec!(10000), range(dec!(1), dec!(10))).unwrap();

    assert!(opps.is_empty());
}

#[test]
fn feeds_and_report_travel_as_json() {
    let json = serde_json::to_string(&demo_feeds()).unwrap();
    let feeds: Vec<SourceFeed> = serde_json::from_str(&json).unwrap();
    assert_eq!(feeds, demo_feeds());

    let events = consolidate(feeds);
    let config = DetectorConfig::new(dec!(10000), MarginRange::new(dec!(1), dec!(10)).unwrap());
    let report = scan(&events, &config).unwrap();

    let value = serde_json::to_value(&report).unwrap();
    let legs = &value["opportunities"][0]["legs"];
    assert_eq!(legs[1]["quote"]["source"], "Codere");
    assert_eq!(legs[1]["quote"]["outcome"], "X");
    assert_eq!(value["opportunities"][0]["kind"], "match_result");
}
