//! Margin, stake and profit calculations for surebet opportunities.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::ArbitrageError;
use crate::market::{Event, EventKey, Market, MarketKind, Outcome, Quote};

/// Decimal places kept on the implied probability sum before comparing it
/// with 1. Reciprocals such as 1/3 are truncated at 28 digits, so three 3.00
/// prices would otherwise sum to just under 1 and look like a surebet.
pub const IMPLIED_SUM_SCALE: u32 = 20;

/// Default currency minor-unit precision for presentation.
pub const DEFAULT_STAKE_DECIMALS: u32 = 2;

/// Largest total stake a detection pass accepts.
pub const MAX_TOTAL_STAKE: Decimal = dec!(1000000000000000);

/// Largest decimal odds a quote may carry.
///
/// Together with [`MAX_TOTAL_STAKE`] this keeps every stake and payout well
/// inside the range of [`Decimal`].
pub const MAX_QUOTE_ODDS: Decimal = dec!(1000000);

/// Decimal can hold at most 28 fractional digits.
const MAX_SCALE: u32 = 28;

/// Accepted margin band in percent, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarginRange {
    /// Minimum margin worth acting on.
    pub min: Decimal,
    /// Maximum plausible margin; anything larger is treated as bad data.
    pub max: Decimal,
}

impl MarginRange {
    /// Create a margin range, requiring `0 <= min < max`.
    pub fn new(min: Decimal, max: Decimal) -> Result<Self, ArbitrageError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// Check bounds.
    pub fn validate(&self) -> Result<(), ArbitrageError> {
        if self.min < Decimal::ZERO || self.max <= self.min {
            return Err(ArbitrageError::InvalidMarginRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Check whether a margin falls inside the band.
    pub fn contains(&self, margin: Decimal) -> bool {
        margin >= self.min && margin <= self.max
    }
}

/// Band of odds considered for best-price selection, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OddsWindow {
    /// Lowest odds considered.
    pub min: Decimal,
    /// Highest odds considered.
    pub max: Decimal,
}

impl OddsWindow {
    /// Create an odds window, requiring `1 <= min < max`.
    pub fn new(min: Decimal, max: Decimal) -> Result<Self, ArbitrageError> {
        let window = Self { min, max };
        window.validate()?;
        Ok(window)
    }

    /// Check bounds.
    pub fn validate(&self) -> Result<(), ArbitrageError> {
        if self.min < Decimal::ONE || self.max <= self.min {
            return Err(ArbitrageError::InvalidOddsWindow {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Check whether odds fall inside the window.
    pub fn contains(&self, odds: Decimal) -> bool {
        odds >= self.min && odds <= self.max
    }
}

/// Pick the best quote: highest odds, then earliest observation, then first
/// received.
pub fn select_best_quote<'a>(
    quotes: &'a [Quote],
    window: Option<&OddsWindow>,
) -> Option<&'a Quote> {
    let mut best: Option<&Quote> = None;

    for quote in quotes {
        if let Some(w) = window {
            if !w.contains(quote.odds) {
                continue;
            }
        }

        best = match best {
            None => Some(quote),
            Some(current) if beats(quote, current) => Some(quote),
            keep => keep,
        };
    }

    best
}

fn beats(candidate: &Quote, current: &Quote) -> bool {
    candidate.odds > current.odds
        || (candidate.odds == current.odds && candidate.observed_at < current.observed_at)
}

/// Sum of reciprocal odds, rounded to [`IMPLIED_SUM_SCALE`] places.
///
/// Callers must have rejected odds <= 1.0 beforehand.
pub fn implied_sum(best: &[&Quote]) -> Decimal {
    best.iter()
        .map(|q| Decimal::ONE / q.odds)
        .sum::<Decimal>()
        .round_dp(IMPLIED_SUM_SCALE)
}

/// Margin in percent for an implied sum; 0 when there is no arbitrage.
pub fn margin_from_implied(implied: Decimal) -> Decimal {
    if implied >= Decimal::ONE {
        return Decimal::ZERO;
    }
    (Decimal::ONE - implied) * Decimal::ONE_HUNDRED
}

/// Arbitrage margin in percent for a set of best quotes.
pub fn calculate_margin(best: &[&Quote]) -> Decimal {
    margin_from_implied(implied_sum(best))
}

/// One leg of the stake split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeLeg {
    /// Best quote chosen for this outcome.
    pub quote: Quote,
    /// Full-precision stake.
    pub stake: Decimal,
    /// Full-precision payout if this outcome wins.
    pub expected_return: Decimal,
}

impl StakeLeg {
    /// Outcome this leg covers.
    pub fn outcome(&self) -> Outcome {
        self.quote.outcome
    }
}

/// Split `total_stake` in proportion to 1/odds so every outcome pays the same.
///
/// Returns `None` if any step would divide by zero or overflow.
pub fn calculate_stakes(best: &[&Quote], total_stake: Decimal) -> Option<Vec<StakeLeg>> {
    let weights = best
        .iter()
        .map(|q| Decimal::ONE.checked_div(q.odds))
        .collect::<Option<Vec<Decimal>>>()?;
    let total_weight = weights
        .iter()
        .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(*w))?;

    best.iter()
        .zip(weights)
        .map(|(quote, weight)| {
            let stake = weight.checked_div(total_weight)?.checked_mul(total_stake)?;
            Some(StakeLeg {
                quote: (*quote).clone(),
                stake,
                expected_return: stake.checked_mul(quote.odds)?,
            })
        })
        .collect()
}

/// A bet as it would be placed, rounded to currency minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedBet {
    /// Outcome to back.
    pub outcome: Outcome,
    /// Bookmaker offering the price.
    pub source: String,
    /// Odds taken.
    pub odds: Decimal,
    /// Rounded stake.
    pub stake: Decimal,
    /// Payout of the rounded stake, rounded.
    pub expected_return: Decimal,
}

/// Detected surebet opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Opportunity {
    /// Event the market belongs to.
    pub event: EventKey,
    /// Scheduled start time of the event.
    #[serde(with = "time::serde::rfc3339::option")]
    pub scheduled_at: Option<OffsetDateTime>,
    /// Market name.
    pub market: String,
    /// Market kind.
    pub kind: MarketKind,
    /// Sum of reciprocal best odds.
    pub implied_sum: Decimal,
    /// Arbitrage margin in percent ((1 - implied_sum) * 100).
    pub margin: Decimal,
    /// Total amount staked across all legs.
    pub total_stake: Decimal,
    /// One leg per outcome, in outcome order.
    pub legs: Vec<StakeLeg>,
    /// Smallest leg payout, i.e. the amount paid whichever outcome wins.
    pub guaranteed_return: Decimal,
    /// `guaranteed_return - total_stake`, the worst-case profit.
    pub guaranteed_profit: Decimal,
    /// Profit percentage ((profit / total_stake) * 100).
    pub roi: Decimal,
}

impl Opportunity {
    /// Legs rounded to `decimals` places for placing bets.
    pub fn stake_plan(&self, decimals: u32) -> Vec<PlannedBet> {
        self.legs
            .iter()
            .map(|leg| {
                let stake = round_money(leg.stake, decimals);
                PlannedBet {
                    outcome: leg.outcome(),
                    source: leg.quote.source.clone(),
                    odds: leg.quote.odds,
                    stake,
                    expected_return: round_money(stake * leg.quote.odds, decimals),
                }
            })
            .collect()
    }

    /// Spread between the largest and smallest payout once stakes are rounded.
    pub fn return_spread(&self, decimals: u32) -> Decimal {
        let returns: Vec<Decimal> = self
            .stake_plan(decimals)
            .into_iter()
            .map(|bet| bet.expected_return)
            .collect();

        match (returns.iter().max(), returns.iter().min()) {
            (Some(max), Some(min)) => *max - *min,
            _ => Decimal::ZERO,
        }
    }

    /// Worst-case payout drift per leg caused by rounding stakes to
    /// `decimals` places: half a minor unit times the largest odds, plus half
    /// a minor unit for rounding the payout itself.
    pub fn rounding_tolerance(&self, decimals: u32) -> Decimal {
        let half_unit = Decimal::new(5, decimals.saturating_add(1).min(MAX_SCALE));
        let max_odds = self
            .legs
            .iter()
            .map(|leg| leg.quote.odds)
            .max()
            .unwrap_or(Decimal::ONE);
        half_unit * max_odds + half_unit
    }

    /// Human summary with stakes and payouts rounded to `decimals` places.
    pub fn display_with(&self, decimals: u32) -> OpportunitySummary<'_> {
        OpportunitySummary {
            opportunity: self,
            decimals,
        }
    }

    /// Total stake placed with each source.
    pub fn stake_by_source(&self) -> BTreeMap<&str, Decimal> {
        let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
        for leg in &self.legs {
            *totals.entry(leg.quote.source.as_str()).or_default() += leg.stake;
        }
        totals
    }
}

/// [`Opportunity`] rendered at a chosen presentation precision.
#[derive(Debug, Clone, Copy)]
pub struct OpportunitySummary<'a> {
    opportunity: &'a Opportunity,
    decimals: u32,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display_with(DEFAULT_STAKE_DECIMALS), f)
    }
}

impl fmt::Display for OpportunitySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opp = self.opportunity;
        let dp = self.decimals;
        writeln!(
            f,
            "SUREBET {} [{}] | {}",
            opp.event, opp.event.competition, opp.market
        )?;
        for bet in opp.stake_plan(dp) {
            writeln!(
                f,
                "  {:<5} @ {:<6} {:<12} stake ${} -> return ${}",
                bet.outcome.label(),
                bet.odds,
                bet.source,
                bet.stake,
                bet.expected_return
            )?;
        }
        write!(
            f,
            "  margin {}% | ROI {}% | profit ${} on ${}",
            opp.margin.round_dp(DEFAULT_STAKE_DECIMALS),
            opp.roi.round_dp(DEFAULT_STAKE_DECIMALS),
            round_money(opp.guaranteed_profit, dp),
            round_money(opp.total_stake, dp)
        )
    }
}

fn round_money(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Build an opportunity from already-selected best quotes.
///
/// Returns `None` when the quotes do not form a surebet (implied sum >= 1) or
/// the amounts do not fit in a [`Decimal`]; stakes up to [`MAX_TOTAL_STAKE`]
/// with odds up to [`MAX_QUOTE_ODDS`] always fit. Margin-range filtering is
/// the detector's job.
pub fn calculate_opportunity(
    event: &Event,
    market: &Market,
    best: &[&Quote],
    total_stake: Decimal,
) -> Option<Opportunity> {
    let implied = implied_sum(best);
    if implied >= Decimal::ONE || best.is_empty() {
        return None;
    }

    let legs = calculate_stakes(best, total_stake)?;
    let guaranteed_return = legs.iter().map(|leg| leg.expected_return).min()?;
    let guaranteed_profit = guaranteed_return.checked_sub(total_stake)?;
    let roi = guaranteed_profit
        .checked_div(total_stake)?
        .checked_mul(Decimal::ONE_HUNDRED)?;

    Some(Opportunity {
        event: event.key.clone(),
        scheduled_at: event.scheduled_at,
        market: market.name.clone(),
        kind: market.kind,
        implied_sum: implied,
        margin: margin_from_implied(implied),
        total_stake,
        legs,
        guaranteed_return,
        guaranteed_profit,
        roi,
    })
}
