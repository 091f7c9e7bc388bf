//! Multi-bookmaker surebet detection.
//!
//! A surebet exists when the best decimal odds for every outcome of a market,
//! taken across bookmakers, have reciprocals summing to less than 1. Staking
//! in proportion to those reciprocals pays the same amount whichever outcome
//! wins:
//!
//! ```text
//! Home 2.50 (BetWarrior)  1/2.50 = 0.4000
//! Draw 3.60 (Codere)      1/3.60 = 0.2778
//! Away 3.30 (Bplay)       1/3.30 = 0.3030
//! ──────────────────────────────────────
//! Sum                             0.9808 < 1 ✅
//! Margin: 1.92%   Stake 10,000 → returns 10,195.67 on any outcome
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Events, markets, quotes and feed consolidation
//! - [`arbitrage`]: Best-price selection, margin and stake calculations
//! - [`metrics`]: Detection counters and latency

pub mod arbitrage;
pub mod config;
pub mod error;
pub mod market;
pub mod metrics;

pub use arbitrage::{find_opportunities, scan, DetectionReport, DetectorConfig, Opportunity};
pub use config::Config;
pub use error::{ArbitrageError, Result, SurebetError};
pub use market::consolidate;
