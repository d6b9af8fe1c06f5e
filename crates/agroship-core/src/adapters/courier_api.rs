use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::carrier_api::{
    CarrierFuture, ProviderError, ProviderQuoteRequest, QuoteProvider, ShipmentCarrier,
};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::config::{CarrierCredentials, SenderProfile};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::{
    CarrierId, DestinationZone, Price, ShipmentDetails, ShipmentLabel, ShippingQuote,
    TrackingState, TrackingStatus, UtcDateTime, ValidationError, DEFAULT_CURRENCY,
};

/// Generic courier JSON API integration, instantiated once per carrier.
///
/// Endpoints (relative to the carrier's base URL):
/// - `POST /quotes`
/// - `POST /shipments`
/// - `GET /tracking/{number}`
#[derive(Clone)]
pub struct CourierApiAdapter {
    carrier: CarrierId,
    base_url: String,
    auth: HttpAuth,
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
    sender: Option<SenderProfile>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl CourierApiAdapter {
    pub fn new(credentials: &CarrierCredentials, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            carrier: credentials.carrier,
            base_url: credentials.base_url.clone(),
            auth: HttpAuth::BearerToken(credentials.bearer_token().to_owned()),
            http_client,
            timeout_ms: 4_000,
            sender: None,
            circuit_breaker: Arc::new(CircuitBreaker::new(
                credentials.carrier,
                CircuitBreakerConfig::default(),
            )),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_sender(mut self, sender: SenderProfile) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = Arc::new(CircuitBreaker::new(self.carrier, config));
        self
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        if !self.circuit_breaker.allow_request() {
            debug!(
                carrier = %self.carrier,
                retry_after = ?self.circuit_breaker.retry_after(),
                "carrier cut off; skipping call"
            );
            return Err(ProviderError::circuit_open(self.carrier));
        }

        let request = request
            .with_auth(&self.auth)
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);
        debug!(carrier = %self.carrier, url = %request.url, "calling carrier api");

        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.record_failure();
            if error.timed_out() {
                ProviderError::timeout(format!("{} timed out: {}", self.carrier, error.message()))
            } else {
                ProviderError::transport(format!(
                    "{} transport error: {}",
                    self.carrier,
                    error.message()
                ))
            }
        })?;

        if !response.is_success() {
            self.circuit_breaker.record_failure();
            return Err(ProviderError::status(response.status));
        }

        Ok(response)
    }

    /// Closes the books on a call that reached the carrier with a 2xx.
    ///
    /// A body that cannot be read counts against the breaker like a 5xx.
    fn settle<T>(&self, outcome: Result<T, ProviderError>) -> Result<T, ProviderError> {
        match &outcome {
            Ok(_) => self.circuit_breaker.record_success(),
            Err(error) => {
                debug!(carrier = %self.carrier, error = %error, "carrier answered with an unusable body");
                self.circuit_breaker.record_failure();
            }
        }
        outcome
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn parse<T: for<'de> Deserialize<'de>>(&self, body: &str) -> Result<T, ProviderError> {
        serde_json::from_str(body).map_err(|e| {
            ProviderError::malformed(format!("failed to parse {} response: {e}", self.carrier))
        })
    }
}

impl QuoteProvider for CourierApiAdapter {
    fn carrier(&self) -> CarrierId {
        self.carrier
    }

    fn quote<'a>(&'a self, req: ProviderQuoteRequest) -> CarrierFuture<'a, ShippingQuote> {
        Box::pin(async move {
            if !req.weight_kg.is_finite() || req.weight_kg <= 0.0 {
                return Err(ProviderError::invalid_request(
                    "quote request weight must be greater than zero",
                ));
            }

            let payload = QuotePayload::from_request(&req);
            let request = HttpRequest::post(self.endpoint("quotes"))
                .with_json(&payload)
                .map_err(|e| ProviderError::invalid_request(e.to_string()))?;

            let response = self.execute(request).await?;
            self.settle(
                self.parse::<QuoteResponse>(&response.body)
                    .and_then(|raw| normalize_quote(self.carrier, raw)),
            )
        })
    }
}

impl ShipmentCarrier for CourierApiAdapter {
    fn carrier(&self) -> CarrierId {
        self.carrier
    }

    fn create_shipment<'a>(&'a self, details: ShipmentDetails) -> CarrierFuture<'a, ShipmentLabel> {
        Box::pin(async move {
            let payload = ShipmentPayload::new(self.sender.as_ref(), &details);
            let request = HttpRequest::post(self.endpoint("shipments"))
                .with_json(&payload)
                .map_err(|e| ProviderError::invalid_request(e.to_string()))?;

            let response = self.execute(request).await?;
            self.settle(
                self.parse::<ShipmentResponse>(&response.body)
                    .and_then(|raw| normalize_label(self.carrier, &details, raw)),
            )
        })
    }

    fn track<'a>(&'a self, tracking_number: String) -> CarrierFuture<'a, TrackingStatus> {
        Box::pin(async move {
            let url = self.endpoint(&format!(
                "tracking/{}",
                urlencoding::encode(&tracking_number)
            ));
            let response = self.execute(HttpRequest::get(url)).await?;
            self.settle(
                self.parse::<TrackingResponse>(&response.body)
                    .and_then(|raw| normalize_tracking(self.carrier, tracking_number, raw)),
            )
        })
    }
}

#[derive(Debug, Serialize)]
struct QuotePayload<'a> {
    origin: DistrictRef<'a>,
    destination: DistrictRef<'a>,
    zone: DestinationZone,
    package: PackagePayload,
}

impl<'a> QuotePayload<'a> {
    fn from_request(req: &'a ProviderQuoteRequest) -> Self {
        Self {
            origin: DistrictRef {
                district: &req.origin_district,
            },
            destination: DistrictRef {
                district: &req.destination_district,
            },
            zone: req.zone,
            package: PackagePayload {
                weight_kg: req.weight_kg,
                length_cm: req.dimensions.length_cm,
                width_cm: req.dimensions.width_cm,
                height_cm: req.dimensions.height_cm,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct DistrictRef<'a> {
    district: &'a str,
}

#[derive(Debug, Serialize)]
struct PackagePayload {
    weight_kg: f64,
    length_cm: f64,
    width_cm: f64,
    height_cm: f64,
}

#[derive(Debug, Serialize)]
struct ShipmentPayload<'a> {
    reference: &'a str,
    sender: Option<SenderPayload<'a>>,
    recipient: RecipientPayload<'a>,
    package: PackagePayload,
}

impl<'a> ShipmentPayload<'a> {
    fn new(sender: Option<&'a SenderProfile>, details: &'a ShipmentDetails) -> Self {
        Self {
            reference: &details.order_id,
            sender: sender.map(|sender| SenderPayload {
                name: &sender.name,
                phone: &sender.phone,
                address_line: &sender.address_line,
                district: &sender.district,
            }),
            recipient: RecipientPayload {
                name: &details.recipient.name,
                phone: &details.recipient.phone,
                email: details.recipient.email.as_deref(),
                address_line: &details.address.address_line,
                district: &details.address.district,
                province: &details.address.province,
                department: &details.address.department,
                postal_code: details.address.postal_code.as_deref(),
                reference: details.address.reference.as_deref(),
            },
            package: PackagePayload {
                weight_kg: details.weight_kg,
                length_cm: details.dimensions.length_cm,
                width_cm: details.dimensions.width_cm,
                height_cm: details.dimensions.height_cm,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct SenderPayload<'a> {
    name: &'a str,
    phone: &'a str,
    address_line: &'a str,
    district: &'a str,
}

#[derive(Debug, Serialize)]
struct RecipientPayload<'a> {
    name: &'a str,
    phone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    address_line: &'a str,
    district: &'a str,
    province: &'a str,
    department: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    postal_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuoteResponse {
    service_name: String,
    price: Decimal,
    #[serde(default)]
    currency: Option<String>,
    estimated_delivery: String,
    #[serde(default = "default_true")]
    tracking_available: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ShipmentResponse {
    tracking_number: String,
    #[serde(default)]
    label_url: Option<String>,
    #[serde(default)]
    estimated_delivery_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TrackingResponse {
    status: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

const fn default_true() -> bool {
    true
}

fn normalize_quote(carrier: CarrierId, raw: QuoteResponse) -> Result<ShippingQuote, ProviderError> {
    let currency = raw.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let price = Price::new(raw.price, currency).map_err(validation_to_error)?;
    let description = raw
        .description
        .unwrap_or_else(|| format!("Tarifa en línea de {}", carrier.display_name()));

    ShippingQuote::new(
        carrier,
        raw.service_name,
        price,
        raw.estimated_delivery,
        raw.tracking_available,
        description,
    )
    .map_err(validation_to_error)
}

fn normalize_label(
    carrier: CarrierId,
    details: &ShipmentDetails,
    raw: ShipmentResponse,
) -> Result<ShipmentLabel, ProviderError> {
    let tracking_number = raw.tracking_number.trim().to_owned();
    if tracking_number.is_empty() {
        return Err(ProviderError::malformed(format!(
            "{carrier} shipment response has an empty tracking number"
        )));
    }

    let estimated_delivery_date = raw
        .estimated_delivery_date
        .as_deref()
        .and_then(|value| UtcDateTime::parse_any_offset(value).ok())
        .unwrap_or_else(|| UtcDateTime::now().plus_days(details.zone().standard_transit_days()));

    Ok(ShipmentLabel {
        order_id: details.order_id.clone(),
        tracking_number,
        label_url: raw.label_url,
        estimated_delivery_date,
        carrier,
        carrier_name: carrier.display_name().to_owned(),
    })
}

fn normalize_tracking(
    carrier: CarrierId,
    tracking_number: String,
    raw: TrackingResponse,
) -> Result<TrackingStatus, ProviderError> {
    let updated_at = raw
        .updated_at
        .as_deref()
        .map(UtcDateTime::parse_any_offset)
        .transpose()
        .map_err(validation_to_error)?;

    Ok(TrackingStatus {
        tracking_url: carrier.public_tracking_url(&tracking_number),
        tracking_number,
        carrier,
        status: parse_tracking_state(&raw.status),
        location: raw.location,
        updated_at,
        live: true,
    })
}

fn parse_tracking_state(raw: &str) -> TrackingState {
    match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
        "picked_up" | "recogido" => TrackingState::PickedUp,
        "out_for_delivery" | "en_reparto" => TrackingState::OutForDelivery,
        "delivered" | "entregado" => TrackingState::Delivered,
        "exception" | "incidencia" | "devuelto" => TrackingState::Exception,
        _ => TrackingState::InTransit,
    }
}

fn validation_to_error(error: ValidationError) -> ProviderError {
    ProviderError::malformed(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier_api::ProviderErrorKind;
    use crate::http_client::{HttpError, HttpMethod};
    use crate::{Dimensions, Recipient, ShippingAddress};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn responding(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn adapter(client: Arc<RecordingHttpClient>) -> CourierApiAdapter {
        let credentials = CarrierCredentials::new(CarrierId::Olva, "https://olva.test/v1", "key-1");
        CourierApiAdapter::new(&credentials, client)
    }

    fn quote_request() -> ProviderQuoteRequest {
        ProviderQuoteRequest {
            origin_district: String::from("Ate"),
            destination_district: String::from("Miraflores"),
            zone: DestinationZone::Lima,
            weight_kg: 3.0,
            dimensions: Dimensions::new(30.0, 20.0, 15.0).expect("dimensions"),
        }
    }

    fn shipment_details() -> ShipmentDetails {
        ShipmentDetails::new(
            "ORD-2001",
            CarrierId::Olva,
            Recipient::new("Juan Pérez", "999111222").expect("recipient"),
            ShippingAddress::new("Av. Larco 101", "Miraflores", "Lima", "Lima").expect("address"),
            2.5,
            Dimensions::default(),
        )
        .expect("details")
    }

    #[tokio::test]
    async fn quote_posts_json_with_bearer_token() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            r#"{"service_name":"Estándar","price":"14.50","estimated_delivery":"1-2 días hábiles"}"#,
        ))));

        let quote = adapter(client.clone())
            .quote(quote_request())
            .await
            .expect("quote should succeed");

        assert_eq!(quote.carrier, CarrierId::Olva);
        assert_eq!(quote.price.amount, Decimal::new(1450, 2));
        assert_eq!(quote.price.currency, "PEN");
        assert!(quote.tracking_available);

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "https://olva.test/v1/quotes");
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer key-1")
        );
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().expect("body")).expect("json body");
        assert_eq!(body["destination"]["district"], "Miraflores");
        assert_eq!(body["package"]["weight_kg"], 3.0);
    }

    #[tokio::test]
    async fn non_success_status_is_a_status_error() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::with_status(
            503, "busy",
        ))));

        let error = adapter(client)
            .quote(quote_request())
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), ProviderErrorKind::Status);
        assert_eq!(error.http_status(), Some(503));
    }

    #[tokio::test]
    async fn malformed_payload_is_reported() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            r#"{"unexpected":true}"#,
        ))));

        let error = adapter(client)
            .quote(quote_request())
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), ProviderErrorKind::MalformedPayload);
    }

    #[tokio::test]
    async fn repeated_failures_open_the_circuit() {
        let client = Arc::new(RecordingHttpClient::responding(Err(HttpError::new(
            "connection refused",
        ))));
        let adapter = adapter(client.clone()).with_circuit_breaker(CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_secs(60),
        });

        for _ in 0..2 {
            let error = adapter.quote(quote_request()).await.expect_err("must fail");
            assert_eq!(error.kind(), ProviderErrorKind::Transport);
        }

        let error = adapter.quote(quote_request()).await.expect_err("must fail");
        assert_eq!(error.kind(), ProviderErrorKind::CircuitOpen);
        assert_eq!(adapter.circuit_state(), CircuitState::Open);
        assert_eq!(client.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn create_shipment_maps_label() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            r#"{"tracking_number":"OLV123456789","label_url":"https://olva.test/labels/1.pdf","estimated_delivery_date":"2025-03-04T00:00:00Z"}"#,
        ))));

        let label = adapter(client.clone())
            .create_shipment(shipment_details())
            .await
            .expect("label");

        assert_eq!(label.tracking_number, "OLV123456789");
        assert_eq!(label.order_id, "ORD-2001");
        assert_eq!(label.carrier_name, "Olva Courier");
        assert_eq!(
            label.estimated_delivery_date.format_rfc3339(),
            "2025-03-04T00:00:00Z"
        );
        assert_eq!(
            client.recorded_requests()[0].url,
            "https://olva.test/v1/shipments"
        );
    }

    #[tokio::test]
    async fn malformed_bodies_open_the_circuit() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            r#"{"unexpected":true}"#,
        ))));
        let adapter = adapter(client.clone()).with_circuit_breaker(CircuitBreakerConfig {
            failure_threshold: 2,
            open_timeout: Duration::from_secs(60),
        });

        for _ in 0..2 {
            let error = adapter.quote(quote_request()).await.expect_err("must fail");
            assert_eq!(error.kind(), ProviderErrorKind::MalformedPayload);
        }

        let error = adapter.quote(quote_request()).await.expect_err("must fail");
        assert_eq!(error.kind(), ProviderErrorKind::CircuitOpen);
        assert_eq!(client.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn label_keeps_carrier_delivery_date_in_local_offset() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            r#"{"tracking_number":"OLV555","estimated_delivery_date":"2025-03-06T18:00:00-05:00"}"#,
        ))));

        let label = adapter(client)
            .create_shipment(shipment_details())
            .await
            .expect("label");

        assert_eq!(
            label.estimated_delivery_date.format_rfc3339(),
            "2025-03-06T23:00:00Z"
        );
    }

    #[tokio::test]
    async fn tracking_accepts_local_offset_timestamps() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            r#"{"status":"delivered","updated_at":"2025-03-04T10:00:00-05:00"}"#,
        ))));

        let status = adapter(client)
            .track(String::from("OLV555"))
            .await
            .expect("status");

        assert_eq!(status.status, TrackingState::Delivered);
        assert!(status.live);
        assert_eq!(
            status.updated_at.map(UtcDateTime::format_rfc3339).as_deref(),
            Some("2025-03-04T15:00:00Z")
        );
    }

    #[tokio::test]
    async fn tracking_maps_spanish_status() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            r#"{"status":"Entregado","location":"Arequipa"}"#,
        ))));

        let status = adapter(client.clone())
            .track(String::from("OLV 1"))
            .await
            .expect("status");

        assert_eq!(status.status, TrackingState::Delivered);
        assert!(status.live);
        assert_eq!(status.location.as_deref(), Some("Arequipa"));
        let requests = client.recorded_requests();
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url, "https://olva.test/v1/tracking/OLV%201");
    }
}
