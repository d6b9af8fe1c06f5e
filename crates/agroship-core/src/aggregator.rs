//! Quote aggregation across live carriers with a static fallback.
//!
//! Resolution order for one request:
//!
//! 1. Invalid weight or unknown zone yields an empty [`QuoteSet`].
//! 2. Every live [`QuoteProvider`] is called concurrently, each bounded by the
//!    provider timeout. Failures are logged and kept as recoverable errors.
//! 3. When no live quote came back the [`RateTable`] answers instead.
//! 4. Unavailable quotes are dropped.
//! 5. Without a valid caller selection the cheapest quote is auto-selected and
//!    the [`SelectionListener`] is notified.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::adapters::CourierApiAdapter;
use crate::carrier_api::{ProviderError, ProviderQuoteRequest, QuoteProvider};
use crate::config::ShippingConfig;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::rate_table::{RateTable, MAX_WEIGHT_KG};
use crate::{
    CarrierId, DestinationZone, Dimensions, QuoteSelection, ShippingError, ShippingQuote,
};

/// Shipment facts the storefront knows at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    /// `None` when the caller could not classify the destination.
    pub zone: Option<DestinationZone>,
    pub destination_district: Option<String>,
    pub weight_kg: f64,
    pub dimensions: Dimensions,
}

impl QuoteRequest {
    pub fn new(zone: DestinationZone, weight_kg: f64) -> Self {
        Self {
            zone: Some(zone),
            destination_district: None,
            weight_kg,
            dimensions: Dimensions::default(),
        }
    }

    pub fn with_destination_district(mut self, district: impl Into<String>) -> Self {
        self.destination_district = Some(district.into());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn is_quotable(&self) -> bool {
        self.zone.is_some() && self.weight_kg.is_finite() && self.weight_kg > 0.0
    }
}

/// Where the quotes in a [`QuoteSet`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteOrigin {
    Live,
    Fallback,
}

/// Outcome of one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSet {
    /// Visible quotes in provider order, or table order for fallback.
    pub quotes: Vec<ShippingQuote>,
    pub selected: Option<ShippingQuote>,
    /// True when `selected` was picked here rather than kept from the caller.
    pub auto_selected: bool,
    /// Empty sets report `Fallback`.
    pub origin: QuoteOrigin,
    /// Live carriers that were asked for a quote.
    pub consulted: Vec<CarrierId>,
    /// Failures swallowed while building the set.
    pub recovered: Vec<ShippingError>,
    pub latency_ms: u64,
}

impl QuoteSet {
    fn empty() -> Self {
        Self {
            quotes: Vec::new(),
            selected: None,
            auto_selected: false,
            origin: QuoteOrigin::Fallback,
            consulted: Vec::new(),
            recovered: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn cheapest(&self) -> Option<&ShippingQuote> {
        cheapest(&self.quotes)
    }
}

/// Receives the quote chosen when the caller had no valid selection.
pub trait SelectionListener: Send + Sync {
    fn on_auto_select(&self, quote: &ShippingQuote);
}

impl<F> SelectionListener for F
where
    F: Fn(&ShippingQuote) + Send + Sync,
{
    fn on_auto_select(&self, quote: &ShippingQuote) {
        self(quote)
    }
}

/// Fans a quote request out to live carriers and falls back to static rates.
#[derive(Clone)]
pub struct QuoteAggregator {
    providers: Vec<Arc<dyn QuoteProvider>>,
    rate_table: RateTable,
    origin_district: String,
    provider_timeout: Duration,
    listener: Option<Arc<dyn SelectionListener>>,
}

impl std::fmt::Debug for QuoteAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteAggregator")
            .field("live_carriers", &self.live_carriers())
            .field("origin_district", &self.origin_district)
            .field("provider_timeout", &self.provider_timeout)
            .finish_non_exhaustive()
    }
}

impl QuoteAggregator {
    /// Aggregator answering from the standard rate table only.
    pub fn offline() -> Self {
        QuoteAggregatorBuilder::new(ShippingConfig::offline()).build()
    }

    pub fn live_carriers(&self) -> Vec<CarrierId> {
        self.providers.iter().map(|provider| provider.carrier()).collect()
    }

    pub fn rate_table(&self) -> &RateTable {
        &self.rate_table
    }

    /// Parses `zone` and resolves quotes with no current selection.
    ///
    /// An unrecognised zone yields an empty set.
    pub async fn quotes_for(&self, zone: &str, weight_kg: f64, dimensions: Dimensions) -> QuoteSet {
        let request = QuoteRequest {
            zone: zone.parse().ok(),
            destination_district: None,
            weight_kg,
            dimensions,
        };
        self.get_quotes(&request, None).await
    }

    /// Resolves the visible quotes for `request` and the selected option.
    ///
    /// Never fails: carrier errors degrade to the rate table and are reported
    /// in [`QuoteSet::recovered`].
    pub async fn get_quotes(
        &self,
        request: &QuoteRequest,
        current: Option<&QuoteSelection>,
    ) -> QuoteSet {
        let started = Instant::now();
        let Some(zone) = request.zone.filter(|_| request.is_quotable()) else {
            debug!(weight_kg = request.weight_kg, "quote request is not quotable");
            return QuoteSet::empty();
        };

        let (live_quotes, recovered) = self.collect_live_quotes(zone, request).await;

        let (mut quotes, origin) = if live_quotes.is_empty() {
            if !self.providers.is_empty() {
                info!(zone = %zone, "no live quotes; serving fallback rates");
            }
            (self.rate_table.quotes(zone, request.weight_kg), QuoteOrigin::Fallback)
        } else {
            (live_quotes, QuoteOrigin::Live)
        };

        if request.weight_kg > MAX_WEIGHT_KG {
            for quote in &mut quotes {
                quote.available = false;
            }
        }
        quotes.retain(|quote| quote.available);

        let (selected, auto_selected) = resolve_selection(&quotes, current);
        if auto_selected {
            if let (Some(listener), Some(quote)) = (&self.listener, &selected) {
                listener.on_auto_select(quote);
            }
        }

        QuoteSet {
            quotes,
            selected,
            auto_selected,
            origin,
            consulted: self.live_carriers(),
            recovered,
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    async fn collect_live_quotes(
        &self,
        zone: DestinationZone,
        request: &QuoteRequest,
    ) -> (Vec<ShippingQuote>, Vec<ShippingError>) {
        if self.providers.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let provider_request = ProviderQuoteRequest {
            origin_district: self.origin_district.clone(),
            destination_district: request
                .destination_district
                .clone()
                .unwrap_or_else(|| default_district(zone).to_owned()),
            zone,
            weight_kg: request.weight_kg,
            dimensions: request.dimensions,
        };

        let calls = self.providers.iter().map(|provider| {
            let provider_request = provider_request.clone();
            async move {
                let carrier = provider.carrier();
                let outcome = match timeout(self.provider_timeout, provider.quote(provider_request))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ProviderError::timeout(format!(
                        "{carrier} did not answer within {}ms",
                        self.provider_timeout.as_millis()
                    ))),
                };
                (carrier, outcome)
            }
        });

        let mut quotes = Vec::new();
        let mut recovered = Vec::new();
        for (carrier, outcome) in join_all(calls).await {
            match outcome {
                Ok(quote) => quotes.push(quote),
                Err(source) => {
                    warn!(carrier = %carrier, code = source.code(), error = %source, "live quote failed");
                    recovered.push(ShippingError::ProviderQuote { carrier, source });
                }
            }
        }

        (quotes, recovered)
    }
}

fn default_district(zone: DestinationZone) -> &'static str {
    match zone {
        DestinationZone::Lima => "Lima",
        DestinationZone::Provincias => "Provincias",
    }
}

fn cheapest(quotes: &[ShippingQuote]) -> Option<&ShippingQuote> {
    quotes.iter().reduce(|best, quote| {
        if quote.price.amount < best.price.amount {
            quote
        } else {
            best
        }
    })
}

/// Keeps the caller's selection when still offered, else picks the cheapest.
fn resolve_selection(
    quotes: &[ShippingQuote],
    current: Option<&QuoteSelection>,
) -> (Option<ShippingQuote>, bool) {
    if let Some(kept) = current.and_then(|sel| quotes.iter().find(|quote| quote.matches(sel))) {
        return (Some(kept.clone()), false);
    }
    match cheapest(quotes) {
        Some(quote) => (Some(quote.clone()), true),
        None => (None, false),
    }
}

/// Builds a [`QuoteAggregator`] from a [`ShippingConfig`].
///
/// Carriers with credentials in the config get a [`CourierApiAdapter`];
/// everything else is served by the rate table.
///
/// ```rust,ignore
/// let aggregator = QuoteAggregatorBuilder::new(ShippingConfig::from_env()?)
///     .with_listener(|quote: &ShippingQuote| println!("{}", quote.carrier_name))
///     .build();
/// ```
pub struct QuoteAggregatorBuilder {
    config: ShippingConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    extra_providers: Vec<Arc<dyn QuoteProvider>>,
    rate_table: RateTable,
    listener: Option<Arc<dyn SelectionListener>>,
}

impl QuoteAggregatorBuilder {
    pub fn new(config: ShippingConfig) -> Self {
        Self {
            config,
            http_client: None,
            extra_providers: Vec::new(),
            rate_table: RateTable::standard(),
            listener: None,
        }
    }

    /// Transport shared by the configured courier adapters.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Adds a provider on top of those derived from the config.
    pub fn with_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.extra_providers.push(provider);
        self
    }

    pub fn with_rate_table(mut self, rate_table: RateTable) -> Self {
        self.rate_table = rate_table;
        self
    }

    pub fn with_listener(mut self, listener: impl SelectionListener + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn build(self) -> QuoteAggregator {
        let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();

        if self.config.live_carriers().next().is_some() {
            let http_client = self
                .http_client
                .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
            for credentials in self.config.live_carriers() {
                debug!(carrier = %credentials.carrier, "enabling live quotes");
                let adapter = CourierApiAdapter::new(credentials, Arc::clone(&http_client))
                    .with_timeout(self.config.provider_timeout)
                    .with_circuit_breaker(self.config.circuit_breaker);
                providers.push(Arc::new(adapter));
            }
        }
        providers.extend(self.extra_providers);

        QuoteAggregator {
            providers,
            rate_table: self.rate_table,
            origin_district: self.config.origin_district,
            provider_timeout: self.config.provider_timeout,
            listener: self.listener,
        }
    }
}
