use thiserror::Error;

use crate::carrier::CarrierId;
use crate::carrier_api::ProviderError;

/// Validation errors raised while building domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid destination zone '{value}', expected one of lima, provincias")]
    InvalidZone { value: String },
    #[error("invalid carrier '{value}', expected one of olva, shalom, cruz-del-sur, marvisur, agrobesser")]
    InvalidCarrier { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("field '{field}' must be greater than zero")]
    NonPositiveValue { field: &'static str },
    #[error("field '{field}' cannot be empty")]
    EmptyField { field: &'static str },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },
    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("tracking number '{value}' is not well formed")]
    InvalidTrackingNumber { value: String },
}

/// How the caller is expected to react to a [`ShippingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Handled inside the subsystem by degrading to static data.
    Recoverable,
    /// Must be reported to the caller; the order cannot proceed.
    Fatal,
}

/// Shipping subsystem error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShippingError {
    #[error("quote from {carrier} failed: {source}")]
    ProviderQuote {
        carrier: CarrierId,
        source: ProviderError,
    },

    #[error("shipment creation with {carrier} failed: {source}")]
    ShipmentCreation {
        carrier: CarrierId,
        source: ProviderError,
    },

    #[error("tracking lookup with {carrier} failed: {source}")]
    Tracking {
        carrier: CarrierId,
        source: ProviderError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ShippingError {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ProviderQuote { .. } | Self::Tracking { .. } => Severity::Recoverable,
            Self::ShipmentCreation { .. } | Self::Validation(_) => Severity::Fatal,
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self.severity(), Severity::Recoverable)
    }

    pub const fn carrier(&self) -> Option<CarrierId> {
        match self {
            Self::ProviderQuote { carrier, .. }
            | Self::ShipmentCreation { carrier, .. }
            | Self::Tracking { carrier, .. } => Some(*carrier),
            Self::Validation(_) => None,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::ProviderQuote { .. } => "shipping.provider_quote",
            Self::ShipmentCreation { .. } => "shipping.shipment_creation",
            Self::Tracking { .. } => "shipping.tracking",
            Self::Validation(_) => "shipping.validation",
        }
    }
}
