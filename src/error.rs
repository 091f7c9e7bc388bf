//! Unified error types for surebet detection.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::market::{MarketKind, Outcome};

/// Unified error type for the surebet crate.
#[derive(Error, Debug)]
pub enum SurebetError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Arbitrage detection error.
    #[error("arbitrage error: {0}")]
    Arbitrage(#[from] ArbitrageError),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed input handed to the detector.
///
/// Every variant fails the whole detection call; markets that are merely
/// missing quotes are reported as skipped instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageError {
    /// Total stake is not positive or exceeds the supported maximum.
    #[error("invalid total stake: {0} (need 0 < stake <= 10^15)")]
    InvalidStake(Decimal),

    /// Margin range bounds are out of order or negative.
    #[error("invalid margin range: min={min}%, max={max}% (need 0 <= min < max)")]
    InvalidMarginRange {
        /// Lower bound in percent.
        min: Decimal,
        /// Upper bound in percent.
        max: Decimal,
    },

    /// Odds window bounds are out of order or not above 1.0.
    #[error("invalid odds window: min={min}, max={max} (need 1 <= min < max)")]
    InvalidOddsWindow {
        /// Lowest odds considered.
        min: Decimal,
        /// Highest odds considered.
        max: Decimal,
    },

    /// A quote carries odds that cannot pay out more than the stake, or
    /// implausibly large odds.
    #[error(
        "invalid odds {odds} from {source_id} for {outcome} in {market} ({event}) (need 1 < odds <= 10^6)"
    )]
    InvalidOdds {
        /// Event display name.
        event: String,
        /// Market name.
        market: String,
        /// Outcome being quoted.
        outcome: Outcome,
        /// Source that supplied the quote.
        source_id: String,
        /// Offending odds value.
        odds: Decimal,
    },

    /// An outcome was quoted that the market kind does not define.
    #[error("outcome {outcome} does not belong to {kind} market {market} ({event})")]
    ForeignOutcome {
        /// Event display name.
        event: String,
        /// Market name.
        market: String,
        /// Market kind.
        kind: MarketKind,
        /// Foreign outcome.
        outcome: Outcome,
    },
}

impl ArbitrageError {
    /// Whether this error stems from caller or data input (all variants do).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ArbitrageError::InvalidStake(_)
                | ArbitrageError::InvalidMarginRange { .. }
                | ArbitrageError::InvalidOddsWindow { .. }
                | ArbitrageError::InvalidOdds { .. }
                | ArbitrageError::ForeignOutcome { .. }
        )
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, SurebetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn invalid_odds_message_names_the_source() {
        let err = ArbitrageError::InvalidOdds {
            event: "Boca Juniors vs River Plate".to_string(),
            market: "1X2".to_string(),
            outcome: Outcome::Draw,
            source_id: "Codere".to_string(),
            odds: dec!(0),
        };

        let msg = err.to_string();
        assert!(msg.contains("Codere"));
        assert!(msg.contains("X"));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn arbitrage_error_converts_into_crate_error() {
        let err: SurebetError = ArbitrageError::InvalidStake(dec!(-5)).into();
        assert!(matches!(err, SurebetError::Arbitrage(ArbitrageError::InvalidStake(_))));
    }
}
