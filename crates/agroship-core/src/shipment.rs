//! Label creation and tracking for confirmed orders.
//!
//! Carriers with a live integration are called directly. Everything else gets
//! a synthesized tracking number of the form
//! `<prefix><8 digits of epoch ms><4 base36 chars>`, e.g. `OLV83412907K2QZ`.
//!
//! The service keeps a ledger of issued labels: an order gets exactly one
//! label and a tracking number is never handed out twice. Concurrent calls
//! for the same order share one carrier request.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::adapters::CourierApiAdapter;
use crate::carrier_api::ShipmentCarrier;
use crate::config::ShippingConfig;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{
    CarrierId, ShipmentDetails, ShipmentLabel, ShippingError, TrackingStatus, UtcDateTime,
    ValidationError,
};

const TRACKING_DIGITS_MODULUS: i128 = 100_000_000;
const TRACKING_SUFFIX_LEN: usize = 4;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Per-order slot, filled once the label has been issued.
type LabelSlot = Arc<OnceCell<ShipmentLabel>>;

#[derive(Debug, Default)]
struct LabelLedger {
    by_order: HashMap<String, LabelSlot>,
    issued: HashSet<String>,
}

/// Creates labels and answers tracking lookups.
pub struct ShipmentService {
    carriers: HashMap<CarrierId, Arc<dyn ShipmentCarrier>>,
    ledger: Mutex<LabelLedger>,
}

impl std::fmt::Debug for ShipmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipmentService")
            .field("live_carriers", &self.live_carriers())
            .finish_non_exhaustive()
    }
}

impl ShipmentService {
    /// Service synthesizing every label locally.
    pub fn offline() -> Self {
        ShipmentServiceBuilder::new(ShippingConfig::offline()).build()
    }

    pub fn live_carriers(&self) -> Vec<CarrierId> {
        let mut carriers: Vec<CarrierId> = self.carriers.keys().copied().collect();
        carriers.sort();
        carriers
    }

    pub fn is_live(&self, carrier: CarrierId) -> bool {
        self.carriers.contains_key(&carrier)
    }

    /// Label already issued for `order_id`, if any.
    pub fn label_for(&self, order_id: &str) -> Option<ShipmentLabel> {
        self.ledger()
            .by_order
            .get(order_id)
            .and_then(|slot| slot.get().cloned())
    }

    /// Issues the label for an order.
    ///
    /// Calling this again for the same order returns the label issued the
    /// first time without contacting the carrier. A call that arrives while
    /// the first one is still waiting on the carrier waits for its result.
    /// After a failure the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::ShipmentCreation`] when a live carrier fails,
    /// or [`ShippingError::Validation`] when the carrier hands back a
    /// tracking number that was already issued.
    pub async fn create_shipment(
        &self,
        details: ShipmentDetails,
    ) -> Result<ShipmentLabel, ShippingError> {
        let slot = self.slot(&details.order_id);
        if let Some(existing) = slot.get() {
            debug!(order_id = %details.order_id, "label already issued");
            return Ok(existing.clone());
        }

        let label = slot.get_or_try_init(|| self.issue(details)).await?;
        Ok(label.clone())
    }

    /// Looks up progress for a tracking number.
    ///
    /// A failing live lookup is logged and answered with the generic status.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError::Validation`] for a blank tracking number.
    pub async fn track_shipment(
        &self,
        tracking_number: &str,
        carrier: CarrierId,
    ) -> Result<TrackingStatus, ShippingError> {
        let tracking_number = tracking_number.trim();
        if tracking_number.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "tracking_number",
            }
            .into());
        }

        let Some(live) = self.carriers.get(&carrier) else {
            return Ok(TrackingStatus::generic(tracking_number, carrier));
        };

        match live.track(tracking_number.to_owned()).await {
            Ok(status) => Ok(status),
            Err(source) => {
                let error = ShippingError::Tracking { carrier, source };
                warn!(carrier = %carrier, code = error.code(), error = %error, "tracking lookup failed; returning generic status");
                Ok(TrackingStatus::generic(tracking_number, carrier))
            }
        }
    }

    fn slot(&self, order_id: &str) -> LabelSlot {
        Arc::clone(
            self.ledger()
                .by_order
                .entry(order_id.to_owned())
                .or_default(),
        )
    }

    async fn issue(&self, details: ShipmentDetails) -> Result<ShipmentLabel, ShippingError> {
        let carrier = details.carrier;
        let Some(live) = self.carriers.get(&carrier) else {
            return Ok(self.synthesize_label(&details));
        };

        let order_id = details.order_id.clone();
        let label = live.create_shipment(details).await.map_err(|source| {
            warn!(carrier = %carrier, order_id = %order_id, error = %source, "shipment creation failed");
            ShippingError::ShipmentCreation { carrier, source }
        })?;

        let fresh = self.ledger().issued.insert(label.tracking_number.clone());
        if !fresh {
            warn!(carrier = %carrier, order_id = %order_id, tracking_number = %label.tracking_number, "carrier reused a tracking number");
            return Err(ValidationError::InvalidTrackingNumber {
                value: label.tracking_number,
            }
            .into());
        }
        Ok(label)
    }

    fn synthesize_label(&self, details: &ShipmentDetails) -> ShipmentLabel {
        let now = UtcDateTime::now();
        let tracking_number = {
            let mut ledger = self.ledger();
            loop {
                let candidate = synthesize_tracking_number(details.carrier, now);
                if ledger.issued.insert(candidate.clone()) {
                    break candidate;
                }
            }
        };

        info!(carrier = %details.carrier, order_id = %details.order_id, "synthesized tracking number");
        ShipmentLabel {
            order_id: details.order_id.clone(),
            tracking_number,
            label_url: None,
            estimated_delivery_date: now.plus_days(details.zone().standard_transit_days()),
            carrier: details.carrier,
            carrier_name: details.carrier.display_name().to_owned(),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, LabelLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `<prefix><last 8 digits of epoch ms><4 random base36 chars>`.
fn synthesize_tracking_number(carrier: CarrierId, at: UtcDateTime) -> String {
    let digits = at.unix_timestamp_millis().rem_euclid(TRACKING_DIGITS_MODULUS);
    let suffix: String = (0..TRACKING_SUFFIX_LEN)
        .map(|_| char::from(BASE36[fastrand::usize(..BASE36.len())]))
        .collect();
    format!("{}{digits:08}{suffix}", carrier.tracking_prefix())
}

/// Whether `value` looks like a synthesized tracking number.
pub fn is_synthesized_tracking_number(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 3 + 8 + TRACKING_SUFFIX_LEN {
        return false;
    }
    let (prefix, rest) = bytes.split_at(3);
    let (digits, suffix) = rest.split_at(8);
    prefix.iter().all(u8::is_ascii_uppercase)
        && digits.iter().all(u8::is_ascii_digit)
        && suffix
            .iter()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

/// Builds a [`ShipmentService`] from a [`ShippingConfig`].
pub struct ShipmentServiceBuilder {
    config: ShippingConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    extra_carriers: Vec<Arc<dyn ShipmentCarrier>>,
}

impl ShipmentServiceBuilder {
    pub fn new(config: ShippingConfig) -> Self {
        Self {
            config,
            http_client: None,
            extra_carriers: Vec::new(),
        }
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Registers a carrier, replacing any configured one with the same id.
    pub fn with_carrier(mut self, carrier: Arc<dyn ShipmentCarrier>) -> Self {
        self.extra_carriers.push(carrier);
        self
    }

    pub fn build(self) -> ShipmentService {
        let mut carriers: HashMap<CarrierId, Arc<dyn ShipmentCarrier>> = HashMap::new();

        if self.config.live_carriers().next().is_some() {
            let http_client = self
                .http_client
                .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
            for credentials in self.config.live_carriers() {
                let adapter = CourierApiAdapter::new(credentials, Arc::clone(&http_client))
                    .with_timeout(self.config.provider_timeout)
                    .with_circuit_breaker(self.config.circuit_breaker)
                    .with_sender(self.config.sender.clone());
                carriers.insert(credentials.carrier, Arc::new(adapter));
            }
        }
        for carrier in self.extra_carriers {
            carriers.insert(carrier.carrier(), carrier);
        }

        ShipmentService {
            carriers,
            ledger: Mutex::new(LabelLedger::default()),
        }
    }
}
