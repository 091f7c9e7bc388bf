//! Application configuration loaded from environment variables.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};

use crate::arbitrage::{DetectorConfig, MarginRange, OddsWindow};
use crate::error::ArbitrageError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Detection Parameters ===
    /// Total amount split across the legs of each surebet.
    #[serde(default = "default_total_stake")]
    pub total_stake: Decimal,

    /// Minimum margin (percent) worth reporting.
    #[serde(default = "default_min_margin")]
    pub min_margin: Decimal,

    /// Maximum plausible margin (percent); larger ones are treated as bad data.
    #[serde(default = "default_max_margin")]
    pub max_margin: Decimal,

    /// Lowest odds considered for best-price selection.
    #[serde(default = "default_min_odds")]
    pub min_odds: Decimal,

    /// Highest odds considered for best-price selection.
    #[serde(default = "default_max_odds")]
    pub max_odds: Decimal,

    /// Largest total stake with any single bookmaker. An empty value, `0`,
    /// `none` or `off` disables the cap.
    #[serde(
        default = "default_max_stake_per_source",
        deserialize_with = "deserialize_stake_cap"
    )]
    pub max_stake_per_source: Option<Decimal>,

    /// Currency minor-unit precision used when printing stakes.
    #[serde(default = "default_stake_decimals")]
    pub stake_decimals: u32,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_total_stake() -> Decimal {
    Decimal::new(10000, 0) // 10,000 ARS
}

fn default_min_margin() -> Decimal {
    Decimal::new(10, 1) // 1.0%
}

fn default_max_margin() -> Decimal {
    Decimal::new(100, 1) // 10.0%
}

fn default_min_odds() -> Decimal {
    Decimal::new(11, 1) // 1.1
}

fn default_max_odds() -> Decimal {
    Decimal::new(50, 0)
}

fn default_max_stake_per_source() -> Option<Decimal> {
    Some(Decimal::new(50000, 0))
}

fn deserialize_stake_cap<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let value = match raw.as_deref().map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) if v.eq_ignore_ascii_case("none") || v.eq_ignore_ascii_case("off") => {
            return Ok(None)
        }
        Some(v) => v,
    };

    let cap = Decimal::from_str(value).map_err(de::Error::custom)?;
    Ok(Some(cap).filter(|c| !c.is_zero()))
}

fn default_stake_decimals() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_stake: default_total_stake(),
            min_margin: default_min_margin(),
            max_margin: default_max_margin(),
            min_odds: default_min_odds(),
            max_odds: default_max_odds(),
            max_stake_per_source: default_max_stake_per_source(),
            stake_decimals: default_stake_decimals(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.stake_decimals > 8 {
            return Err("STAKE_DECIMALS must be at most 8".to_string());
        }

        self.detector_config()
            .and_then(|config| config.validate())
            .map_err(|e| e.to_string())
    }

    /// Margin band as configured.
    pub fn margin_range(&self) -> Result<MarginRange, ArbitrageError> {
        MarginRange::new(self.min_margin, self.max_margin)
    }

    /// Build the detector settings for one pass.
    pub fn detector_config(&self) -> Result<DetectorConfig, ArbitrageError> {
        let mut config = DetectorConfig::new(self.total_stake, self.margin_range()?)
            .with_odds_window(OddsWindow::new(self.min_odds, self.max_odds)?);

        if let Some(cap) = self.max_stake_per_source {
            config = config.with_max_stake_per_source(cap);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_values_are_sensible() {
        assert_eq!(default_total_stake(), dec!(10000));
        assert_eq!(default_min_margin(), dec!(1.0));
        assert_eq!(default_max_margin(), dec!(10.0));
        assert_eq!(default_min_odds(), dec!(1.1));
        assert_eq!(default_max_stake_per_source(), Some(dec!(50000)));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn detector_config_carries_filters() {
        let config = Config::default().detector_config().unwrap();

        assert_eq!(config.total_stake, dec!(10000));
        assert_eq!(config.odds_window, Some(OddsWindow { min: dec!(1.1), max: dec!(50) }));
        assert_eq!(config.max_stake_per_source, Some(dec!(50000)));
    }

    #[test]
    fn validate_rejects_inverted_margin_range() {
        let config = Config {
            min_margin: dec!(5),
            max_margin: dec!(2),
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_stake() {
        let config = Config {
            total_stake: dec!(0),
            ..Config::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.contains("stake"));
    }

    #[test]
    fn validate_rejects_bad_odds_window() {
        let config = Config {
            min_odds: dec!(0.9),
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::from_iter(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn stake_cap_reads_from_environment() {
        let config = from_vars(&[("MAX_STAKE_PER_SOURCE", "25000")]).unwrap();
        assert_eq!(config.max_stake_per_source, Some(dec!(25000)));

        let unset = from_vars(&[]).unwrap();
        assert_eq!(unset.max_stake_per_source, Some(dec!(50000)));

        assert!(from_vars(&[("MAX_STAKE_PER_SOURCE", "lots")]).is_err());
    }

    #[test]
    fn stake_cap_can_be_disabled_from_environment() {
        for value in ["", "0", "0.00", "none", "OFF"] {
            let config = from_vars(&[("MAX_STAKE_PER_SOURCE", value)]).unwrap();
            assert_eq!(config.max_stake_per_source, None, "value {value:?}");
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn cap_can_be_disabled() {
        let config = Config {
            max_stake_per_source: None,
            ..Config::default()
        };

        assert_eq!(config.detector_config().unwrap().max_stake_per_source, None);
    }
}
