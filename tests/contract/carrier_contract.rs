use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use agroship_core::{
    CarrierCredentials, CarrierId, CourierApiAdapter, DestinationZone, Dimensions, HttpClient,
    HttpError, HttpMethod, HttpRequest, HttpResponse, ProviderErrorKind, ProviderQuoteRequest,
    QuoteProvider, Recipient, SenderProfile, ShipmentCarrier, ShipmentDetails, ShippingAddress,
    TrackingState,
};
use rust_decimal::Decimal;

/// Answers by URL suffix and records every request.
#[derive(Default)]
struct ScriptedHttpClient {
    routes: Vec<(&'static str, Result<HttpResponse, HttpError>)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    fn route(mut self, suffix: &'static str, response: Result<HttpResponse, HttpError>) -> Self {
        self.routes.push((suffix, response));
        self
    }

    fn recorded(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request store").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self
            .routes
            .iter()
            .find(|(suffix, _)| request.url.contains(suffix))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Ok(HttpResponse::with_status(404, "not found")));
        self.requests.lock().expect("request store").push(request);
        Box::pin(async move { response })
    }
}

#[derive(Clone, Copy)]
struct CarrierCase {
    carrier: CarrierId,
    base_url: &'static str,
}

fn carrier_cases() -> Vec<CarrierCase> {
    vec![
        CarrierCase {
            carrier: CarrierId::Olva,
            base_url: "https://olva.test/v1",
        },
        CarrierCase {
            carrier: CarrierId::Shalom,
            base_url: "https://shalom.test/v1/",
        },
    ]
}

fn adapter(case: CarrierCase, client: Arc<ScriptedHttpClient>) -> CourierApiAdapter {
    let credentials = CarrierCredentials::new(case.carrier, case.base_url, "contract-key");
    CourierApiAdapter::new(&credentials, client).with_sender(SenderProfile {
        name: String::from("AgroBesser"),
        phone: String::from("014445566"),
        address_line: String::from("Av. Industrial 450"),
        district: String::from("Ate"),
    })
}

fn healthy_client() -> ScriptedHttpClient {
    ScriptedHttpClient::default()
        .route(
            "/quotes",
            Ok(HttpResponse::ok_json(
                r#"{"service_name":"Estándar","price":"16.90","currency":"pen","estimated_delivery":"2-3 días hábiles","tracking_available":true}"#,
            )),
        )
        .route(
            "/shipments",
            Ok(HttpResponse::ok_json(
                r#"{"tracking_number":"LIVE-0001","label_url":"https://labels.test/1.pdf"}"#,
            )),
        )
        .route(
            "/tracking/",
            Ok(HttpResponse::ok_json(
                r#"{"status":"en_reparto","location":"Trujillo","updated_at":"2025-05-02T14:00:00Z"}"#,
            )),
        )
}

fn quote_request() -> ProviderQuoteRequest {
    ProviderQuoteRequest {
        origin_district: String::from("Ate"),
        destination_district: String::from("Trujillo"),
        zone: DestinationZone::Provincias,
        weight_kg: 6.0,
        dimensions: Dimensions::new(40.0, 30.0, 20.0).expect("dimensions"),
    }
}

fn shipment_details(carrier: CarrierId) -> ShipmentDetails {
    ShipmentDetails::new(
        "ORD-5001",
        carrier,
        Recipient::new("Luis Ramos", "955000111").expect("recipient"),
        ShippingAddress::new("Jr. Pizarro 220", "Trujillo", "Trujillo", "La Libertad")
            .expect("address"),
        6.0,
        Dimensions::default(),
    )
    .expect("details")
}

#[test]
fn quote_returns_normalized_offer_for_all_carriers() {
    for case in carrier_cases() {
        let client = Arc::new(healthy_client());
        let quote = block_on(adapter(case, client.clone()).quote(quote_request()))
            .unwrap_or_else(|error| panic!("{} quote failed: {error}", case.carrier));

        assert_eq!(quote.carrier, case.carrier);
        assert_eq!(quote.carrier_name, case.carrier.display_name());
        assert_eq!(quote.price.amount, Decimal::new(1690, 2));
        assert_eq!(quote.price.currency, "PEN");
        assert!(quote.available);

        let requests = client.recorded();
        assert_eq!(requests.len(), 1, "{}: one upstream call", case.carrier);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert!(
            requests[0].url.ends_with(".test/v1/quotes"),
            "{}: unexpected url {}",
            case.carrier,
            requests[0].url
        );
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer contract-key")
        );
    }
}

#[test]
fn create_shipment_returns_label_for_all_carriers() {
    for case in carrier_cases() {
        let client = Arc::new(healthy_client());
        let label = block_on(adapter(case, client.clone()).create_shipment(shipment_details(case.carrier)))
            .unwrap_or_else(|error| panic!("{} shipment failed: {error}", case.carrier));

        assert_eq!(label.tracking_number, "LIVE-0001");
        assert_eq!(label.order_id, "ORD-5001");
        assert_eq!(label.carrier, case.carrier);
        assert_eq!(label.label_url.as_deref(), Some("https://labels.test/1.pdf"));

        let body: serde_json::Value = serde_json::from_str(
            client.recorded()[0].body.as_deref().expect("shipment body"),
        )
        .expect("json body");
        assert_eq!(body["reference"], "ORD-5001");
        assert_eq!(body["sender"]["name"], "AgroBesser");
        assert_eq!(body["recipient"]["department"], "La Libertad");
    }
}

#[test]
fn track_returns_live_status_for_all_carriers() {
    for case in carrier_cases() {
        let client = Arc::new(healthy_client());
        let status = block_on(adapter(case, client.clone()).track(String::from("LIVE-0001")))
            .unwrap_or_else(|error| panic!("{} tracking failed: {error}", case.carrier));

        assert!(status.live);
        assert_eq!(status.status, TrackingState::OutForDelivery);
        assert_eq!(status.location.as_deref(), Some("Trujillo"));
        assert!(status.updated_at.is_some());
        assert_eq!(client.recorded()[0].method, HttpMethod::Get);
    }
}

#[test]
fn upstream_failures_map_to_provider_error_kinds() {
    let cases = [
        (Ok(HttpResponse::with_status(502, "bad gateway")), ProviderErrorKind::Status),
        (Ok(HttpResponse::ok_json("<html>")), ProviderErrorKind::MalformedPayload),
        (Err(HttpError::new("connection refused")), ProviderErrorKind::Transport),
        (Err(HttpError::timeout("deadline elapsed")), ProviderErrorKind::Timeout),
    ];

    for case in carrier_cases() {
        for (response, expected) in cases.clone() {
            let client = Arc::new(ScriptedHttpClient::default().route("/quotes", response));
            let error = block_on(adapter(case, client).quote(quote_request()))
                .expect_err("failure must surface");
            assert_eq!(error.kind(), expected, "{}", case.carrier);
        }
    }
}

#[test]
fn non_positive_weight_is_rejected_before_any_call() {
    for case in carrier_cases() {
        let client = Arc::new(healthy_client());
        let mut request = quote_request();
        request.weight_kg = 0.0;

        let error = block_on(adapter(case, client.clone()).quote(request))
            .expect_err("zero weight must fail");
        assert_eq!(error.kind(), ProviderErrorKind::InvalidRequest);
        assert!(client.recorded().is_empty());
    }
}

fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: The vtable functions never dereference the data pointer and are no-op operations.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
}

unsafe fn noop_raw_waker_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop_raw_waker_noop(_: *const ()) {}

static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(
    noop_raw_waker_clone,
    noop_raw_waker_noop,
    noop_raw_waker_noop,
    noop_raw_waker_noop,
);
