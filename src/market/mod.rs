//! Market module for multi-bookmaker odds.
//!
//! This module handles:
//! - Event, market, outcome and quote types
//! - Consolidation of per-source feeds into unified events
//! - Sample feeds and builders for tests and the demo

pub mod consolidator;
pub mod sample;
pub mod types;

pub use consolidator::consolidate;
pub use sample::{demo_feeds, RawEventBuilder};
pub use types::{
    Event, EventKey, Market, MarketKind, Outcome, Quote, RawEvent, RawQuote, SourceFeed,
};
