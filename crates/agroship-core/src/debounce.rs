use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::aggregator::{QuoteAggregator, QuoteRequest, QuoteSet};
use crate::QuoteSelection;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Coalesces bursts of quote requests, e.g. while a customer edits the cart.
///
/// Every request waits out the debounce window. If a newer request arrived
/// meanwhile the older one resolves to `None` without touching any carrier.
/// Requests that already reached the carriers run to completion.
#[derive(Debug)]
pub struct QuoteDebouncer {
    aggregator: Arc<QuoteAggregator>,
    delay: Duration,
    generation: AtomicU64,
}

impl QuoteDebouncer {
    pub fn new(aggregator: Arc<QuoteAggregator>) -> Self {
        Self::with_delay(aggregator, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(aggregator: Arc<QuoteAggregator>, delay: Duration) -> Self {
        Self {
            aggregator,
            delay,
            generation: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resolves quotes unless superseded by a later call within the window.
    pub async fn request(
        &self,
        request: QuoteRequest,
        current: Option<QuoteSelection>,
    ) -> Option<QuoteSet> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "quote request superseded");
            return None;
        }

        Some(self.aggregator.get_quotes(&request, current.as_ref()).await)
    }
}
