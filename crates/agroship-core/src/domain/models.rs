use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CarrierId, DestinationZone, UtcDateTime, ValidationError};

/// Currency every storefront price is quoted in.
pub const DEFAULT_CURRENCY: &str = "PEN";

/// Decimal amount in a given currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency: String,
}

impl Price {
    pub fn new(amount: Decimal, currency: impl AsRef<str>) -> Result<Self, ValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ValidationError::NegativeValue { field: "price" });
        }

        Ok(Self {
            amount,
            currency: validate_currency_code(currency.as_ref())?,
        })
    }

    /// Price in soles.
    pub fn soles(amount: Decimal) -> Result<Self, ValidationError> {
        Self::new(amount, DEFAULT_CURRENCY)
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

/// Package dimensions in centimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl Dimensions {
    pub fn new(length_cm: f64, width_cm: f64, height_cm: f64) -> Result<Self, ValidationError> {
        validate_non_negative("length_cm", length_cm)?;
        validate_non_negative("width_cm", width_cm)?;
        validate_non_negative("height_cm", height_cm)?;

        Ok(Self {
            length_cm,
            width_cm,
            height_cm,
        })
    }
}

/// Normalized shipping offer for one carrier and service tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub carrier: CarrierId,
    pub carrier_name: String,
    pub service_name: String,
    pub price: Price,
    /// Free-text delivery window, e.g. "1-2 días hábiles".
    pub estimated_delivery: String,
    pub tracking_available: bool,
    pub description: String,
    pub available: bool,
}

impl ShippingQuote {
    pub fn new(
        carrier: CarrierId,
        service_name: impl Into<String>,
        price: Price,
        estimated_delivery: impl Into<String>,
        tracking_available: bool,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let service_name = service_name.into();
        if service_name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "service_name",
            });
        }

        Ok(Self {
            carrier,
            carrier_name: carrier.display_name().to_owned(),
            service_name,
            price,
            estimated_delivery: estimated_delivery.into(),
            tracking_available,
            description: description.into(),
            available: true,
        })
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }

    /// Whether `selection` refers to this carrier and service tier.
    pub fn matches(&self, selection: &QuoteSelection) -> bool {
        self.carrier == selection.carrier && self.service_name == selection.service_name
    }

    /// Shipping line copied into the order record at checkout.
    pub fn order_charge(&self) -> OrderShippingCharge {
        OrderShippingCharge {
            carrier_name: self.carrier_name.clone(),
            service_name: self.service_name.clone(),
            cost: self.price.clone(),
        }
    }
}

/// Caller-side reference to the currently selected quote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteSelection {
    pub carrier: CarrierId,
    pub service_name: String,
}

impl From<&ShippingQuote> for QuoteSelection {
    fn from(quote: &ShippingQuote) -> Self {
        Self {
            carrier: quote.carrier,
            service_name: quote.service_name.clone(),
        }
    }
}

/// Shipping fields persisted on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShippingCharge {
    pub carrier_name: String,
    pub service_name: String,
    pub cost: Price,
}

/// Delivery address embedded in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address_line: String,
    pub district: String,
    pub province: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl ShippingAddress {
    pub fn new(
        address_line: impl Into<String>,
        district: impl Into<String>,
        province: impl Into<String>,
        department: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            address_line: required("address_line", address_line.into())?,
            district: required("district", district.into())?,
            province: required("province", province.into())?,
            department: required("department", department.into())?,
            postal_code: None,
            reference: None,
        })
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn zone(&self) -> DestinationZone {
        DestinationZone::from_province(&self.province)
    }
}

/// Person receiving the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Recipient {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required("recipient_name", name.into())?,
            phone: required("recipient_phone", phone.into())?,
            email: None,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Order data needed to ship a confirmed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub order_id: String,
    pub carrier: CarrierId,
    pub recipient: Recipient,
    pub address: ShippingAddress,
    pub weight_kg: f64,
    pub dimensions: Dimensions,
}

impl ShipmentDetails {
    pub fn new(
        order_id: impl Into<String>,
        carrier: CarrierId,
        recipient: Recipient,
        address: ShippingAddress,
        weight_kg: f64,
        dimensions: Dimensions,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("weight_kg", weight_kg)?;
        if weight_kg == 0.0 {
            return Err(ValidationError::NonPositiveValue { field: "weight_kg" });
        }

        Ok(Self {
            order_id: required("order_id", order_id.into())?,
            carrier,
            recipient,
            address,
            weight_kg,
            dimensions,
        })
    }

    pub fn zone(&self) -> DestinationZone {
        self.address.zone()
    }
}

/// Label issued for an order. The tracking number never changes once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentLabel {
    pub order_id: String,
    pub tracking_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_url: Option<String>,
    pub estimated_delivery_date: UtcDateTime,
    pub carrier: CarrierId,
    pub carrier_name: String,
}

/// Coarse shipment progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Exception,
}

/// Result of a tracking lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub tracking_number: String,
    pub carrier: CarrierId,
    pub status: TrackingState,
    pub tracking_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<UtcDateTime>,
    /// False when the status is a placeholder rather than carrier data.
    pub live: bool,
}

impl TrackingStatus {
    /// Placeholder status pointing at the carrier's public tracking page.
    pub fn generic(tracking_number: &str, carrier: CarrierId) -> Self {
        Self {
            tracking_number: tracking_number.to_owned(),
            carrier,
            status: TrackingState::InTransit,
            tracking_url: carrier.public_tracking_url(tracking_number),
            location: None,
            updated_at: None,
            live: false,
        }
    }
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn required(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_currency() {
        assert_eq!(validate_currency_code("pen").expect("must normalize"), "PEN");
        assert!(matches!(
            validate_currency_code("SOLES"),
            Err(ValidationError::InvalidCurrency { .. })
        ));
    }

    #[test]
    fn rejects_negative_price() {
        let err = Price::soles(Decimal::new(-150, 1)).expect_err("must fail");
        assert!(matches!(err, ValidationError::NegativeValue { .. }));
    }

    #[test]
    fn order_charge_copies_carrier_and_price() {
        let quote = ShippingQuote::new(
            CarrierId::Shalom,
            "Envío Regular",
            Price::soles(Decimal::from(12)).expect("price"),
            "2-3 días hábiles",
            true,
            "Recojo en agencia",
        )
        .expect("quote");

        let charge = quote.order_charge();
        assert_eq!(charge.carrier_name, "Shalom");
        assert_eq!(charge.cost.amount, Decimal::from(12));
        assert_eq!(charge.cost.currency, "PEN");
    }

    #[test]
    fn address_zone_follows_province() {
        let address = ShippingAddress::new("Av. Grau 120", "Bellavista", "Callao", "Callao")
            .expect("address");
        assert_eq!(address.zone(), DestinationZone::Lima);

        let address = ShippingAddress::new("Jr. Lima 45", "Cayma", "Arequipa", "Arequipa")
            .expect("address");
        assert_eq!(address.zone(), DestinationZone::Provincias);
    }

    #[test]
    fn shipment_details_require_positive_weight() {
        let recipient = Recipient::new("Rosa Quispe", "987654321").expect("recipient");
        let address =
            ShippingAddress::new("Av. Sol 300", "Wanchaq", "Cusco", "Cusco").expect("address");

        let err = ShipmentDetails::new(
            "ORD-1001",
            CarrierId::Olva,
            recipient,
            address,
            0.0,
            Dimensions::default(),
        )
        .expect_err("zero weight must fail");
        assert!(matches!(err, ValidationError::NonPositiveValue { .. }));
    }

    #[test]
    fn price_serializes_amount_as_string() {
        let price = Price::soles(Decimal::from(15)).expect("price");
        let json = serde_json::to_value(&price).expect("serializes");
        assert_eq!(json["amount"], "15");
        assert_eq!(json["currency"], "PEN");
    }
}
