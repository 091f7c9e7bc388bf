//! Builders and canned feeds for tests and the demo command.
//!
//! Nothing here touches the network; the demo feeds reproduce a Boca Juniors
//! vs River Plate 1X2 market quoted by four Argentine bookmakers, with the
//! best home, draw and away prices spread across three of them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::macros::datetime;
use time::OffsetDateTime;

use super::types::{MarketKind, Outcome, RawEvent, RawQuote, SourceFeed};

/// Builder for raw events with common market shapes.
#[derive(Debug, Clone)]
pub struct RawEventBuilder {
    event: RawEvent,
}

impl RawEventBuilder {
    /// Create a new builder for an event.
    pub fn new(
        home: impl Into<String>,
        away: impl Into<String>,
        competition: impl Into<String>,
    ) -> Self {
        Self {
            event: RawEvent {
                home: home.into(),
                away: away.into(),
                competition: competition.into(),
                country: None,
                scheduled_at: None,
                quotes: Vec::new(),
            },
        }
    }

    /// Set the country label.
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.event.country = Some(country.into());
        self
    }

    /// Set the scheduled start time.
    pub fn scheduled_at(mut self, at: OffsetDateTime) -> Self {
        self.event.scheduled_at = Some(at);
        self
    }

    /// Add a single quote.
    pub fn quote(
        mut self,
        market: impl Into<String>,
        kind: MarketKind,
        outcome: Outcome,
        odds: Decimal,
        observed_at: OffsetDateTime,
    ) -> Self {
        self.event.quotes.push(RawQuote {
            market: market.into(),
            kind,
            outcome,
            odds,
            observed_at,
        });
        self
    }

    /// Add a full "1X2" market.
    pub fn match_result(
        self,
        home: Decimal,
        draw: Decimal,
        away: Decimal,
        observed_at: OffsetDateTime,
    ) -> Self {
        let kind = MarketKind::MatchResult;
        self.quote("1X2", kind, Outcome::Home, home, observed_at)
            .quote("1X2", kind, Outcome::Draw, draw, observed_at)
            .quote("1X2", kind, Outcome::Away, away, observed_at)
    }

    /// Add a full over/under market for a goal line.
    pub fn over_under(
        self,
        line: Decimal,
        over: Decimal,
        under: Decimal,
        observed_at: OffsetDateTime,
    ) -> Self {
        let name = format!("Over/Under {line}");
        let kind = MarketKind::OverUnder;
        self.quote(name.clone(), kind, Outcome::Over, over, observed_at)
            .quote(name, kind, Outcome::Under, under, observed_at)
    }

    /// Build the raw event.
    pub fn build(self) -> RawEvent {
        self.event
    }
}

/// Four-bookmaker sample feeds containing one genuine 1X2 surebet.
///
/// Best prices: home 2.50 (BetWarrior), draw 3.60 (Codere), away 3.30 (Bplay).
/// Implied sum 0.9808, margin about 1.92%.
pub fn demo_feeds() -> Vec<SourceFeed> {
    let observed_at = datetime!(2024-01-20 12:00 UTC);
    let kickoff = datetime!(2024-01-20 20:00 UTC);

    let prices = [
        ("BetWarrior", dec!(2.50), dec!(3.10), dec!(3.00)),
        ("Codere", dec!(2.35), dec!(3.60), dec!(3.15)),
        ("Bplay", dec!(2.40), dec!(3.20), dec!(3.30)),
        ("Betsson", dec!(2.38), dec!(3.25), dec!(3.20)),
    ];

    prices
        .into_iter()
        .map(|(source, home, draw, away)| {
            let event = RawEventBuilder::new("Boca Juniors", "River Plate", "Primera Division")
                .country("Argentina")
                .scheduled_at(kickoff)
                .match_result(home, draw, away, observed_at)
                .build();
            SourceFeed::new(source, vec![event])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_adds_full_markets() {
        let at = datetime!(2024-01-20 12:00 UTC);
        let event = RawEventBuilder::new("Racing Club", "Independiente", "Primera Division")
            .match_result(dec!(2.10), dec!(3.40), dec!(3.80), at)
            .over_under(dec!(2.5), dec!(1.95), dec!(1.85), at)
            .build();

        assert_eq!(event.quotes.len(), 5);
        assert_eq!(event.quotes[3].market, "Over/Under 2.5");
        assert_eq!(event.quotes[4].outcome, Outcome::Under);
    }

    #[test]
    fn demo_feeds_cover_four_bookmakers() {
        let feeds = demo_feeds();
        let sources: Vec<_> = feeds.iter().map(|f| f.source.as_str()).collect();

        assert_eq!(sources, vec!["BetWarrior", "Codere", "Bplay", "Betsson"]);
        assert!(feeds.iter().all(|f| f.events[0].quotes.len() == 3));
    }
}
