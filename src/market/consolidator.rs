//! Merge per-source event lists into one view per real-world event.

use indexmap::IndexMap;
use tracing::debug;

use super::types::{Event, EventKey, Market, Quote, SourceFeed};

/// Consolidate events reported by several sources.
///
/// Events are matched on (home, away, competition) exactly; name normalization
/// is the caller's job. Markets merge by name and quote lists merge by outcome
/// through concatenation, so nothing a source reported is ever dropped.
/// Output order is the order in which events, then markets, were first seen.
pub fn consolidate<I>(feeds: I) -> Vec<Event>
where
    I: IntoIterator<Item = SourceFeed>,
{
    let mut events: IndexMap<EventKey, Event> = IndexMap::new();
    let mut sources = 0usize;
    let mut quotes = 0usize;

    for feed in feeds {
        sources += 1;

        for raw in feed.events {
            let event = events
                .entry(raw.key())
                .or_insert_with_key(|key| Event::new(key.clone()));

            if event.scheduled_at.is_none() {
                event.scheduled_at = raw.scheduled_at;
            }
            if event.country.is_none() {
                event.country = raw.country.filter(|c| !c.trim().is_empty());
            }

            for raw_quote in raw.quotes {
                let market = event
                    .markets
                    .entry(raw_quote.market.clone())
                    .or_insert_with(|| Market::new(raw_quote.market.clone(), raw_quote.kind));

                market.push(Quote::new(
                    feed.source.as_str(),
                    raw_quote.outcome,
                    raw_quote.odds,
                    raw_quote.observed_at,
                ));
                quotes += 1;
            }
        }
    }

    debug!(
        sources,
        events = events.len(),
        quotes,
        "Consolidated source feeds"
    );

    events.into_values().collect()
}
