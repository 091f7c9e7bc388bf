//! Surebet opportunity detection across consolidated markets.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::calculator::{
    calculate_opportunity, implied_sum, margin_from_implied, select_best_quote, MarginRange,
    OddsWindow, Opportunity, MAX_QUOTE_ODDS, MAX_TOTAL_STAKE,
};
use crate::error::ArbitrageError;
use crate::market::{Event, EventKey, Market, Outcome, Quote};
use crate::metrics;

/// Per-call detection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectorConfig {
    /// Amount split across the legs of every opportunity.
    pub total_stake: Decimal,
    /// Accepted margin band in percent.
    pub margin_range: MarginRange,
    /// Only quotes inside this window compete for best price.
    pub odds_window: Option<OddsWindow>,
    /// Largest total stake allowed with any single source.
    pub max_stake_per_source: Option<Decimal>,
}

impl DetectorConfig {
    /// Create a config with no odds window and no per-source cap.
    pub fn new(total_stake: Decimal, margin_range: MarginRange) -> Self {
        Self {
            total_stake,
            margin_range,
            odds_window: None,
            max_stake_per_source: None,
        }
    }

    /// Restrict best-price selection to an odds window.
    pub fn with_odds_window(mut self, window: OddsWindow) -> Self {
        self.odds_window = Some(window);
        self
    }

    /// Cap the total stake placed with any one source.
    pub fn with_max_stake_per_source(mut self, cap: Decimal) -> Self {
        self.max_stake_per_source = Some(cap);
        self
    }

    /// Check the settings themselves.
    pub fn validate(&self) -> Result<(), ArbitrageError> {
        if self.total_stake <= Decimal::ZERO || self.total_stake > MAX_TOTAL_STAKE {
            return Err(ArbitrageError::InvalidStake(self.total_stake));
        }
        self.margin_range.validate()?;
        if let Some(window) = &self.odds_window {
            window.validate()?;
        }
        if let Some(cap) = self.max_stake_per_source {
            if cap <= Decimal::ZERO {
                return Err(ArbitrageError::InvalidStake(cap));
            }
        }
        Ok(())
    }
}

/// Why a market produced no opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Some outcome has no usable quote.
    Incomplete {
        /// Outcomes without a usable quote.
        missing: Vec<Outcome>,
    },
    /// Implied probability sum is at least 1.
    NoArbitrage {
        /// Sum of reciprocal best odds.
        implied_sum: Decimal,
    },
    /// Margin is below the configured minimum.
    BelowMinMargin {
        /// Margin in percent.
        margin: Decimal,
    },
    /// Margin is above the configured maximum (probable data error).
    AboveMaxMargin {
        /// Margin in percent.
        margin: Decimal,
    },
    /// One source would receive more than the per-source cap.
    StakeLimitExceeded {
        /// Source over the cap.
        source: String,
        /// Total stake that source would receive.
        stake: Decimal,
    },
}

impl SkipReason {
    /// Short label used in metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Incomplete { .. } => "incomplete",
            SkipReason::NoArbitrage { .. } => "no_arbitrage",
            SkipReason::BelowMinMargin { .. } => "below_min_margin",
            SkipReason::AboveMaxMargin { .. } => "above_max_margin",
            SkipReason::StakeLimitExceeded { .. } => "stake_limit_exceeded",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Incomplete { missing } => {
                let labels: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "incomplete: no quote for {}", labels.join(", "))
            }
            SkipReason::NoArbitrage { implied_sum } => {
                write!(f, "no arbitrage: implied sum {implied_sum} >= 1")
            }
            SkipReason::BelowMinMargin { margin } => write!(f, "margin {margin}% below minimum"),
            SkipReason::AboveMaxMargin { margin } => write!(f, "margin {margin}% above maximum"),
            SkipReason::StakeLimitExceeded { source, stake } => {
                write!(f, "stake {stake} with {source} exceeds per-source cap")
            }
        }
    }
}

/// A market that was evaluated but not reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMarket {
    /// Event the market belongs to.
    pub event: EventKey,
    /// Market name.
    pub market: String,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    /// Accepted opportunities, in event then market order.
    pub opportunities: Vec<Opportunity>,
    /// Markets that produced nothing, with reasons.
    pub skipped: Vec<SkippedMarket>,
}

impl DetectionReport {
    /// Number of markets evaluated.
    pub fn markets_evaluated(&self) -> usize {
        self.opportunities.len() + self.skipped.len()
    }

    /// Skipped markets whose quotes did not cover every outcome.
    pub fn incomplete(&self) -> impl Iterator<Item = &SkippedMarket> {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Incomplete { .. }))
    }
}

/// Scan consolidated events for surebets.
///
/// Malformed input fails the whole call before any market is evaluated.
/// Markets with missing outcomes, no arbitrage, or a margin outside the range
/// are listed in [`DetectionReport::skipped`].
pub fn scan(events: &[Event], config: &DetectorConfig) -> Result<DetectionReport, ArbitrageError> {
    config.validate()?;
    validate_events(events)?;

    let _timer = metrics::ScanTimer::start();
    let mut report = DetectionReport::default();

    for event in events {
        for market in event.markets.values() {
            metrics::inc_markets_evaluated();

            match check_market(event, market, config) {
                Ok(opportunity) => {
                    metrics::inc_opportunities();
                    report.opportunities.push(opportunity);
                }
                Err(reason) => {
                    metrics::inc_markets_skipped(reason.label());
                    report.skipped.push(SkippedMarket {
                        event: event.key.clone(),
                        market: market.name.clone(),
                        reason,
                    });
                }
            }
        }
    }

    debug!(
        evaluated = report.markets_evaluated(),
        opportunities = report.opportunities.len(),
        skipped = report.skipped.len(),
        "Detection pass complete"
    );

    Ok(report)
}

/// Find surebets with a plain stake and margin range.
///
/// `margin_range` is `(min_pct, max_pct)`. No odds window or per-source cap
/// applies; use [`scan`] with a [`DetectorConfig`] for those.
pub fn find_opportunities(
    events: &[Event],
    total_stake: Decimal,
    margin_range: (Decimal, Decimal),
) -> Result<Vec<Opportunity>, ArbitrageError> {
    let range = MarginRange::new(margin_range.0, margin_range.1)?;
    let config = DetectorConfig::new(total_stake, range);
    Ok(scan(events, &config)?.opportunities)
}

/// Reject structurally malformed events.
pub fn validate_events(events: &[Event]) -> Result<(), ArbitrageError> {
    for event in events {
        for market in event.markets.values() {
            if let Some(outcome) = market.foreign_outcomes().next() {
                return Err(ArbitrageError::ForeignOutcome {
                    event: event.name(),
                    market: market.name.clone(),
                    kind: market.kind,
                    outcome,
                });
            }

            if let Some(quote) = market
                .all_quotes()
                .find(|q| q.odds <= Decimal::ONE || q.odds > MAX_QUOTE_ODDS)
            {
                return Err(ArbitrageError::InvalidOdds {
                    event: event.name(),
                    market: market.name.clone(),
                    outcome: quote.outcome,
                    source_id: quote.source.clone(),
                    odds: quote.odds,
                });
            }
        }
    }
    Ok(())
}

/// Evaluate one market of a validated event.
#[instrument(skip_all, fields(event = %event.key, market = %market.name))]
pub fn check_market(
    event: &Event,
    market: &Market,
    config: &DetectorConfig,
) -> Result<Opportunity, SkipReason> {
    let window = config.odds_window.as_ref();
    let mut best: Vec<&Quote> = Vec::with_capacity(market.kind.outcomes().len());
    let mut missing = Vec::new();

    for outcome in market.kind.outcomes() {
        match select_best_quote(market.quotes_for(*outcome), window) {
            Some(quote) => best.push(quote),
            None => missing.push(*outcome),
        }
    }

    if !missing.is_empty() {
        debug!(?missing, "Market incomplete");
        return Err(SkipReason::Incomplete { missing });
    }

    let implied = implied_sum(&best);
    if implied >= Decimal::ONE {
        debug!(implied_sum = %implied, "No arbitrage");
        return Err(SkipReason::NoArbitrage {
            implied_sum: implied,
        });
    }

    let margin = margin_from_implied(implied);
    if margin < config.margin_range.min {
        debug!(margin = %margin, min = %config.margin_range.min, "Margin below minimum");
        return Err(SkipReason::BelowMinMargin { margin });
    }
    if margin > config.margin_range.max {
        debug!(
            margin = %margin,
            max = %config.margin_range.max,
            "Margin above maximum, likely bad data"
        );
        return Err(SkipReason::AboveMaxMargin { margin });
    }

    let opportunity = calculate_opportunity(event, market, &best, config.total_stake).ok_or(
        SkipReason::NoArbitrage {
            implied_sum: implied,
        },
    )?;

    if let Some(cap) = config.max_stake_per_source {
        if let Some((source, stake)) = opportunity
            .stake_by_source()
            .into_iter()
            .find(|(_, stake)| *stake > cap)
        {
            debug!(source, stake = %stake, cap = %cap, "Per-source stake cap exceeded");
            return Err(SkipReason::StakeLimitExceeded {
                source: source.to_string(),
                stake,
            });
        }
    }

    info!(
        margin = %opportunity.margin,
        roi = %opportunity.roi,
        profit = %opportunity.guaranteed_profit,
        "Surebet detected"
    );

    Ok(opportunity)
}
