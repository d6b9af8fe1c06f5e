//! Static fallback rates used when no live carrier answers.
//!
//! Prices are in soles. Paid entries get a surcharge of
//! `ceil((weight - 5) * 2)` once the package passes 5kg; the free same-day
//! option is never surcharged and disappears above 10kg. Nothing ships above
//! 50kg.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::{CarrierId, DestinationZone, Price, ShippingQuote};

/// Hard cap for any carrier in the table.
pub const MAX_WEIGHT_KG: f64 = 50.0;
/// Weight included in the base price.
pub const SURCHARGE_FREE_WEIGHT_KG: f64 = 5.0;
/// Soles charged per extra kilogram, rounded up.
pub const SURCHARGE_PER_KG: f64 = 2.0;

/// One row of the rate matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RateEntry {
    pub zone: DestinationZone,
    pub carrier: CarrierId,
    pub service_name: &'static str,
    pub base_price: Decimal,
    pub estimated_delivery: &'static str,
    pub tracking_available: bool,
    pub description: &'static str,
    /// Entries with a limit are hidden above it and never surcharged.
    pub max_weight_kg: Option<f64>,
}

impl RateEntry {
    fn is_flat(&self) -> bool {
        self.max_weight_kg.is_some()
    }
}

/// Price/duration matrix keyed by zone and carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    entries: Vec<RateEntry>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RateTable {
    pub fn new(entries: Vec<RateEntry>) -> Self {
        Self { entries }
    }

    /// Rates for the Peru storefront.
    pub fn standard() -> Self {
        use CarrierId::{AgroBesser, CruzDelSur, Marvisur, Olva, Shalom};
        use DestinationZone::{Lima, Provincias};

        Self::new(vec![
            RateEntry {
                zone: Lima,
                carrier: Olva,
                service_name: "Olva Express",
                base_price: Decimal::from(15),
                estimated_delivery: "1-2 días hábiles",
                tracking_available: true,
                description: "Entrega a domicilio en Lima Metropolitana",
                max_weight_kg: None,
            },
            RateEntry {
                zone: Lima,
                carrier: Shalom,
                service_name: "Envío Regular",
                base_price: Decimal::from(12),
                estimated_delivery: "2-3 días hábiles",
                tracking_available: true,
                description: "Entrega a domicilio o recojo en agencia",
                max_weight_kg: None,
            },
            RateEntry {
                zone: Lima,
                carrier: AgroBesser,
                service_name: "Delivery Express",
                base_price: Decimal::ZERO,
                estimated_delivery: "Mismo día",
                tracking_available: false,
                description: "Reparto propio gratuito para pedidos de hasta 10kg",
                max_weight_kg: Some(10.0),
            },
            RateEntry {
                zone: Provincias,
                carrier: Olva,
                service_name: "Olva Nacional",
                base_price: Decimal::from(25),
                estimated_delivery: "3-5 días hábiles",
                tracking_available: true,
                description: "Entrega a domicilio en provincias",
                max_weight_kg: None,
            },
            RateEntry {
                zone: Provincias,
                carrier: Shalom,
                service_name: "Envío Nacional",
                base_price: Decimal::from(20),
                estimated_delivery: "3-6 días hábiles",
                tracking_available: true,
                description: "Recojo en agencia de destino",
                max_weight_kg: None,
            },
            RateEntry {
                zone: Provincias,
                carrier: CruzDelSur,
                service_name: "Cargo Terrestre",
                base_price: Decimal::from(28),
                estimated_delivery: "2-4 días hábiles",
                tracking_available: true,
                description: "Carga por bus interprovincial",
                max_weight_kg: None,
            },
            RateEntry {
                zone: Provincias,
                carrier: Marvisur,
                service_name: "Encomienda",
                base_price: Decimal::from(22),
                estimated_delivery: "3-5 días hábiles",
                tracking_available: false,
                description: "Encomienda a la agencia de destino",
                max_weight_kg: None,
            },
        ])
    }

    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    /// Quotes for `zone` in table order.
    ///
    /// Entries above their weight limit are still returned with
    /// `available = false`; callers filter them. Non-finite or non-positive
    /// weights yield an empty list.
    pub fn quotes(&self, zone: DestinationZone, weight_kg: f64) -> Vec<ShippingQuote> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            return Vec::new();
        }

        let surcharge = weight_surcharge(weight_kg);
        self.entries
            .iter()
            .filter(|entry| entry.zone == zone)
            .filter_map(|entry| {
                let amount = if entry.is_flat() {
                    entry.base_price
                } else {
                    entry.base_price + surcharge
                };
                let available = weight_kg <= MAX_WEIGHT_KG
                    && entry.max_weight_kg.is_none_or(|limit| weight_kg <= limit);

                let price = Price::soles(amount).ok()?;
                ShippingQuote::new(
                    entry.carrier,
                    entry.service_name,
                    price,
                    entry.estimated_delivery,
                    entry.tracking_available,
                    entry.description,
                )
                .ok()
                .map(|quote| quote.with_available(available))
            })
            .collect()
    }
}

/// Extra soles for a package of `weight_kg`; zero up to 5kg.
pub fn weight_surcharge(weight_kg: f64) -> Decimal {
    if !weight_kg.is_finite() || weight_kg <= SURCHARGE_FREE_WEIGHT_KG {
        return Decimal::ZERO;
    }
    let extra = ((weight_kg - SURCHARGE_FREE_WEIGHT_KG) * SURCHARGE_PER_KG).ceil();
    Decimal::from_f64(extra).unwrap_or(Decimal::ZERO)
}
