//! # Domain Models
//!
//! Shipping domain types with validation at construction time.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ShippingQuote`] | Priced offer for one carrier/service tier |
//! | [`QuoteSelection`] | Caller's current choice among quotes |
//! | [`ShipmentDetails`] | Order data needed to ship |
//! | [`ShipmentLabel`] | Issued label with immutable tracking number |
//! | [`TrackingStatus`] | Tracking lookup result |
//! | [`ShippingAddress`] | Address embedded in an order |
//! | [`DestinationZone`] | Metro (`lima`) vs non-metro (`provincias`) |
//! | [`Price`] | Decimal amount with ISO currency |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod timestamp;
mod zone;

pub use models::{
    validate_currency_code, Dimensions, OrderShippingCharge, Price, QuoteSelection, Recipient,
    ShipmentDetails, ShipmentLabel, ShippingAddress, ShippingQuote, TrackingState, TrackingStatus,
    DEFAULT_CURRENCY,
};
pub use timestamp::UtcDateTime;
pub use zone::DestinationZone;
