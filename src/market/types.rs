//! Market-related types for multi-bookmaker sports betting.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

/// One mutually exclusive result of a betting market.
///
/// Variants are declared in presentation order, which is also the iteration
/// order of per-market quote maps.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Outcome {
    /// Home side wins.
    #[serde(rename = "1", alias = "home")]
    #[strum(to_string = "1", serialize = "home", serialize = "local")]
    Home,
    /// Draw.
    #[serde(rename = "X", alias = "draw")]
    #[strum(to_string = "X", serialize = "draw", serialize = "empate")]
    Draw,
    /// Away side wins.
    #[serde(rename = "2", alias = "away")]
    #[strum(to_string = "2", serialize = "away", serialize = "visitante")]
    Away,
    /// Total goes over the line.
    #[serde(rename = "over")]
    #[strum(to_string = "over")]
    Over,
    /// Total stays under the line.
    #[serde(rename = "under")]
    #[strum(to_string = "under")]
    Under,
    /// Proposition happens.
    #[serde(rename = "yes")]
    #[strum(to_string = "yes")]
    Yes,
    /// Proposition does not happen.
    #[serde(rename = "no")]
    #[strum(to_string = "no")]
    No,
}

impl Outcome {
    /// Human-readable label for console output.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Home => "Home",
            Outcome::Draw => "Draw",
            Outcome::Away => "Away",
            Outcome::Over => "Over",
            Outcome::Under => "Under",
            Outcome::Yes => "Yes",
            Outcome::No => "No",
        }
    }
}

/// Market type, fixing the set of outcomes that must all be covered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum MarketKind {
    /// Three-way match result (1X2).
    #[strum(to_string = "1X2", serialize = "match_result")]
    MatchResult,
    /// Two-way winner without a draw.
    #[strum(to_string = "12", serialize = "money_line", serialize = "moneyline")]
    MoneyLine,
    /// Total over/under a line.
    #[strum(to_string = "O/U", serialize = "over_under")]
    OverUnder,
    /// Both teams to score.
    #[strum(to_string = "BTTS", serialize = "both_teams_to_score")]
    BothTeamsToScore,
}

impl MarketKind {
    /// Outcomes a market of this kind must cover.
    pub fn outcomes(&self) -> &'static [Outcome] {
        match self {
            MarketKind::MatchResult => &[Outcome::Home, Outcome::Draw, Outcome::Away],
            MarketKind::MoneyLine => &[Outcome::Home, Outcome::Away],
            MarketKind::OverUnder => &[Outcome::Over, Outcome::Under],
            MarketKind::BothTeamsToScore => &[Outcome::Yes, Outcome::No],
        }
    }

    /// Check whether an outcome belongs to this market kind.
    pub fn contains(&self, outcome: Outcome) -> bool {
        self.outcomes().contains(&outcome)
    }
}

/// One price for one outcome from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Source (bookmaker) identifier.
    pub source: String,
    /// Outcome being priced.
    pub outcome: Outcome,
    /// Decimal odds (payout multiple per unit staked).
    pub odds: Decimal,
    /// When the price was observed.
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
}

impl Quote {
    /// Create a new quote.
    pub fn new(
        source: impl Into<String>,
        outcome: Outcome,
        odds: Decimal,
        observed_at: OffsetDateTime,
    ) -> Self {
        Self {
            source: source.into(),
            outcome,
            odds,
            observed_at,
        }
    }

    /// Implied probability (1 / odds), `None` for zero odds.
    pub fn implied_probability(&self) -> Option<Decimal> {
        Decimal::ONE.checked_div(self.odds)
    }
}

/// Identity of a real-world event across sources.
///
/// Participants are order-sensitive: swapping home and away is a different
/// event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    /// Home participant.
    pub home: String,
    /// Away participant.
    pub away: String,
    /// Competition or league label.
    pub competition: String,
}

impl EventKey {
    /// Create a new event key.
    pub fn new(
        home: impl Into<String>,
        away: impl Into<String>,
        competition: impl Into<String>,
    ) -> Self {
        Self {
            home: home.into(),
            away: away.into(),
            competition: competition.into(),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.home, self.away)
    }
}

/// A named betting market for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Market {
    /// Market name (e.g., "1X2", "Over/Under 2.5").
    pub name: String,
    /// Market kind.
    pub kind: MarketKind,
    /// Quotes per outcome in arrival order.
    pub quotes: BTreeMap<Outcome, Vec<Quote>>,
}

impl Market {
    /// Create an empty market.
    pub fn new(name: impl Into<String>, kind: MarketKind) -> Self {
        Self {
            name: name.into(),
            kind,
            quotes: BTreeMap::new(),
        }
    }

    /// Append a quote, keeping any existing quotes for the same outcome.
    pub fn push(&mut self, quote: Quote) {
        self.quotes.entry(quote.outcome).or_default().push(quote);
    }

    /// Quotes received for an outcome.
    pub fn quotes_for(&self, outcome: Outcome) -> &[Quote] {
        self.quotes.get(&outcome).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Outcomes of the market kind that have no quote yet.
    pub fn missing_outcomes(&self) -> Vec<Outcome> {
        self.kind
            .outcomes()
            .iter()
            .copied()
            .filter(|o| self.quotes_for(*o).is_empty())
            .collect()
    }

    /// Check whether every outcome of the market kind is quoted.
    pub fn is_complete(&self) -> bool {
        self.missing_outcomes().is_empty()
    }

    /// Outcomes present in the market that its kind does not define.
    pub fn foreign_outcomes(&self) -> impl Iterator<Item = Outcome> + '_ {
        self.quotes.keys().copied().filter(|o| !self.kind.contains(*o))
    }

    /// Iterate over every quote in the market.
    pub fn all_quotes(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.values().flatten()
    }

    /// Total number of quotes across outcomes.
    pub fn quote_count(&self) -> usize {
        self.quotes.values().map(Vec::len).sum()
    }
}

/// A real-world event with all its consolidated markets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Event identity.
    pub key: EventKey,
    /// Country label, if any source supplied it.
    pub country: Option<String>,
    /// Scheduled start time, if known.
    #[serde(with = "time::serde::rfc3339::option")]
    pub scheduled_at: Option<OffsetDateTime>,
    /// Markets keyed by name, in order of first appearance.
    pub markets: IndexMap<String, Market>,
}

impl Event {
    /// Create an event with no markets.
    pub fn new(key: EventKey) -> Self {
        Self {
            key,
            country: None,
            scheduled_at: None,
            markets: IndexMap::new(),
        }
    }

    /// Display name ("Home vs Away").
    pub fn name(&self) -> String {
        self.key.to_string()
    }

    /// Look up a market by name.
    pub fn market(&self, name: &str) -> Option<&Market> {
        self.markets.get(name)
    }
}

/// A quote as supplied by an acquisition collaborator, before consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuote {
    /// Market name.
    pub market: String,
    /// Market kind.
    pub kind: MarketKind,
    /// Outcome being priced.
    pub outcome: Outcome,
    /// Decimal odds.
    pub odds: Decimal,
    /// When the price was observed.
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
}

/// An event as scraped from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Home participant.
    pub home: String,
    /// Away participant.
    pub away: String,
    /// Competition or league label.
    pub competition: String,
    /// Country label.
    #[serde(default)]
    pub country: Option<String>,
    /// Scheduled start time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub scheduled_at: Option<OffsetDateTime>,
    /// Quotes offered for this event.
    #[serde(default)]
    pub quotes: Vec<RawQuote>,
}

impl RawEvent {
    /// Consolidation key for this event.
    pub fn key(&self) -> EventKey {
        EventKey::new(&self.home, &self.away, &self.competition)
    }
}

/// All events reported by one source in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFeed {
    /// Source (bookmaker) identifier.
    pub source: String,
    /// Events reported by the source.
    pub events: Vec<RawEvent>,
}

impl SourceFeed {
    /// Create a feed for a source.
    pub fn new(source: impl Into<String>, events: Vec<RawEvent>) -> Self {
        Self {
            source: source.into(),
            events,
        }
    }
}
