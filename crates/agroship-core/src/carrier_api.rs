//! Carrier adapter contracts and request types.
//!
//! Live carrier integrations implement [`QuoteProvider`] for rate lookups and
//! [`ShipmentCarrier`] for label creation and tracking. Both are object safe so
//! the aggregator and the shipment service can hold them as `Arc<dyn _>`.
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | Quote | [`ProviderQuoteRequest`] | [`ShippingQuote`] |
//! | Create shipment | [`ShipmentDetails`] | [`ShipmentLabel`] |
//! | Track | tracking number | [`TrackingStatus`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{
    CarrierId, DestinationZone, Dimensions, ShipmentDetails, ShipmentLabel, ShippingQuote,
    TrackingStatus,
};

/// Boxed future returned by carrier adapters.
pub type CarrierFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Transport,
    Timeout,
    Status,
    MalformedPayload,
    CircuitOpen,
    InvalidRequest,
}

/// Structured failure of a single carrier call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    status: Option<u16>,
}

impl ProviderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn status(status: u16) -> Self {
        Self {
            kind: ProviderErrorKind::Status,
            message: format!("carrier returned status {status}"),
            status: Some(status),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedPayload, message)
    }

    pub fn circuit_open(carrier: CarrierId) -> Self {
        Self::new(
            ProviderErrorKind::CircuitOpen,
            format!("{carrier} circuit breaker is open; skipping upstream call"),
        )
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn http_status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Transport => "carrier.transport",
            ProviderErrorKind::Timeout => "carrier.timeout",
            ProviderErrorKind::Status => "carrier.status",
            ProviderErrorKind::MalformedPayload => "carrier.malformed_payload",
            ProviderErrorKind::CircuitOpen => "carrier.circuit_open",
            ProviderErrorKind::InvalidRequest => "carrier.invalid_request",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Shipment facts sent to a carrier quoting endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderQuoteRequest {
    pub origin_district: String,
    pub destination_district: String,
    pub zone: DestinationZone,
    pub weight_kg: f64,
    pub dimensions: Dimensions,
}

/// Live rate lookup for one carrier.
pub trait QuoteProvider: Send + Sync {
    fn carrier(&self) -> CarrierId;

    /// Fetches a quote for the shipment.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on network failure, non-2xx response,
    /// malformed payload, or when the adapter's circuit breaker is open.
    fn quote<'a>(&'a self, req: ProviderQuoteRequest) -> CarrierFuture<'a, ShippingQuote>;
}

/// Live label creation and tracking for one carrier.
pub trait ShipmentCarrier: Send + Sync {
    fn carrier(&self) -> CarrierId;

    /// Registers the shipment with the carrier and returns its label.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the carrier rejects or never answers the
    /// creation call.
    fn create_shipment<'a>(&'a self, details: ShipmentDetails) -> CarrierFuture<'a, ShipmentLabel>;

    fn track<'a>(&'a self, tracking_number: String) -> CarrierFuture<'a, TrackingStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_http_code() {
        let error = ProviderError::status(502);
        assert_eq!(error.kind(), ProviderErrorKind::Status);
        assert_eq!(error.http_status(), Some(502));
        assert_eq!(
            error.to_string(),
            "carrier returned status 502 (carrier.status)"
        );
    }

    #[test]
    fn circuit_open_names_the_carrier() {
        let error = ProviderError::circuit_open(CarrierId::Shalom);
        assert_eq!(error.kind(), ProviderErrorKind::CircuitOpen);
        assert!(error.message().starts_with("shalom"));
    }
}
