//! # Agroship Core
//!
//! Shipping quotes, fallback rates, labels and tracking for the AgroBesser
//! storefront.
//!
//! ## Overview
//!
//! - **Domain models** for quotes, labels, addresses and tracking
//! - **Courier adapter** for carriers exposing the JSON courier API
//! - **Fallback rate table** answering when no carrier does
//! - **Quote aggregator** with concurrent fan-out and auto-selection
//! - **Shipment service** issuing one label per order
//! - **Circuit breaker** per live carrier
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Live carrier integrations |
//! | [`aggregator`] | Quote aggregation and selection |
//! | [`carrier`] | Carrier identifiers |
//! | [`carrier_api`] | Adapter traits and `ProviderError` |
//! | [`circuit_breaker`] | Circuit breaker for carrier calls |
//! | [`config`] | Environment-driven configuration |
//! | [`debounce`] | Coalescing of rapid quote requests |
//! | [`domain`] | Domain models |
//! | [`error`] | Validation and shipping errors |
//! | [`http_client`] | HTTP client abstraction |
//! | [`rate_table`] | Static fallback rates |
//! | [`shipment`] | Label creation and tracking |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agroship_core::{QuoteAggregatorBuilder, QuoteRequest, DestinationZone, ShippingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let aggregator = QuoteAggregatorBuilder::new(ShippingConfig::from_env()?).build();
//!
//!     let set = aggregator
//!         .get_quotes(&QuoteRequest::new(DestinationZone::Lima, 3.0), None)
//!         .await;
//!
//!     if let Some(quote) = set.selected {
//!         println!("{} {}: S/ {}", quote.carrier_name, quote.service_name, quote.price.amount);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Checkout │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Quote Aggregator│────▶│ Fallback Rates   │
//! │ Shipment Service│     └──────────────────┘
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Courier Adapter │────▶│ Circuit Breaker  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ HTTP Client     │
//! │ (reqwest/fake)  │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every [`ShippingError`] carries a [`Severity`]:
//!
//! ```rust
//! use agroship_core::{Severity, ShippingError};
//!
//! fn handle(error: &ShippingError) {
//!     match error.severity() {
//!         Severity::Recoverable => {
//!             // Already degraded to static data; log only
//!         }
//!         Severity::Fatal => {
//!             // Report to the customer
//!         }
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are held as `SecretString` and never logged
//! - Missing keys switch a carrier to fallback data instead of failing

pub mod adapters;
pub mod aggregator;
pub mod carrier;
pub mod carrier_api;
pub mod circuit_breaker;
pub mod config;
pub mod debounce;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod rate_table;
pub mod shipment;

// Adapter implementations
pub use adapters::CourierApiAdapter;

// Aggregation
pub use aggregator::{
    QuoteAggregator, QuoteAggregatorBuilder, QuoteOrigin, QuoteRequest, QuoteSet,
    SelectionListener,
};

// Carriers and adapter contracts
pub use carrier::CarrierId;
pub use carrier_api::{
    CarrierFuture, ProviderError, ProviderErrorKind, ProviderQuoteRequest, QuoteProvider,
    ShipmentCarrier,
};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Configuration
pub use config::{CarrierCredentials, ConfigError, SenderProfile, ShippingConfig};

// Debouncing
pub use debounce::{QuoteDebouncer, DEFAULT_DEBOUNCE};

// Domain models
pub use domain::{
    validate_currency_code, DestinationZone, Dimensions, OrderShippingCharge, Price,
    QuoteSelection, Recipient, ShipmentDetails, ShipmentLabel, ShippingAddress, ShippingQuote,
    TrackingState, TrackingStatus, UtcDateTime, DEFAULT_CURRENCY,
};

// Error types
pub use error::{Severity, ShippingError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Rates
pub use rate_table::{weight_surcharge, RateEntry, RateTable, MAX_WEIGHT_KG};

// Shipments
pub use shipment::{is_synthesized_tracking_number, ShipmentService, ShipmentServiceBuilder};
