//! Arbitrage module for detecting surebet opportunities.
//!
//! This module handles:
//! - Best-price selection per outcome
//! - Margin, stake split and profit calculations
//! - Per-market detection with skip reasons

pub mod calculator;
pub mod detector;

pub use calculator::{
    calculate_margin, calculate_opportunity, calculate_stakes, select_best_quote, MarginRange,
    OddsWindow, Opportunity, OpportunitySummary, PlannedBet, StakeLeg, MAX_QUOTE_ODDS,
    MAX_TOTAL_STAKE,
};
pub use detector::{
    check_market, find_opportunities, scan, DetectionReport, DetectorConfig, SkipReason,
    SkippedMarket,
};
