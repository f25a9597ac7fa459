// In-process fake transfer backend for integration tests
// Serves the three backend endpoints under /api with injectable failures
//
// Numan Thabit 2025 Nov

#![allow(dead_code)]

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use chrono::NaiveDate;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use transfer_client::transport::{
    ApiEnvelope, FeeCalculationRequest, FeeCalculationResponse, RetryPolicy, TransferApi,
    TransferRequest, TransferResponse,
};
use url::Url;

pub const FLAT_FEE: f64 = 3.0;

#[derive(Default)]
pub struct FakeBackend {
    pub transfers: Mutex<Vec<TransferResponse>>,
    /// Every request received, failed ones included
    pub hits: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub schedule_calls: AtomicUsize,
    pub fee_calls: AtomicUsize,
    /// Answer this many upcoming requests with 503
    pub fail_next: AtomicUsize,
    /// When set, scheduling answers HTTP 200 with an ERROR envelope carrying this message
    pub logical_error: Mutex<Option<String>>,
    /// When set, list and fee calls answer HTTP 200 with an ERROR envelope carrying this message
    pub read_error: Mutex<Option<String>>,
}

impl FakeBackend {
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn reject_with(&self, message: &str) {
        *self.logical_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn accept(&self) {
        *self.logical_error.lock().unwrap() = None;
    }

    pub fn reject_reads_with(&self, message: &str) {
        *self.read_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn accept_reads(&self) {
        *self.read_error.lock().unwrap() = None;
    }

    fn read_error(&self) -> Option<String> {
        self.read_error.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Option<Response> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| (StatusCode::SERVICE_UNAVAILABLE, "backend warming up").into_response())
    }
}

pub struct TestServer {
    pub base_url: Url,
    pub backend: Arc<FakeBackend>,
}

impl TestServer {
    pub async fn start() -> Self {
        let backend = Arc::new(FakeBackend::default());
        let app = AxumRouter::new()
            .route("/api/transfers", get(list_transfers).post(schedule_transfer))
            .route("/api/transfers/calculate-fee", post(calculate_fee))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve fake backend");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/api")).expect("fake backend url"),
            backend,
        }
    }

    /// Client with short retry delays so tests stay fast.
    pub fn client(&self) -> TransferApi {
        TransferApi::with_settings(
            self.base_url.clone(),
            RetryPolicy::new(2, Duration::from_millis(20)),
            Duration::from_secs(5),
        )
        .expect("build transfer api")
    }
}

pub fn transfer_request(amount: f64) -> TransferRequest {
    TransferRequest {
        source_account: "1234567890".into(),
        destination_account: "0987654321".into(),
        transfer_amount: amount,
        transfer_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
    }
}

async fn list_transfers(State(backend): State<Arc<FakeBackend>>) -> Response {
    if let Some(failure) = backend.take_failure() {
        return failure;
    }
    backend.list_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = backend.read_error() {
        return Json(ApiEnvelope::<Vec<TransferResponse>>::error(message)).into_response();
    }
    let transfers = backend.transfers.lock().unwrap().clone();
    Json(ApiEnvelope::success(transfers)).into_response()
}

async fn schedule_transfer(
    State(backend): State<Arc<FakeBackend>>,
    Json(req): Json<TransferRequest>,
) -> Response {
    if let Some(failure) = backend.take_failure() {
        return failure;
    }
    backend.schedule_calls.fetch_add(1, Ordering::SeqCst);

    if req.transfer_amount <= 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "data": { "transferAmount": "Valor deve ser maior que zero" },
                "status": "ERROR",
                "message": "Dados inválidos"
            })),
        )
            .into_response();
    }

    if let Some(message) = backend.logical_error.lock().unwrap().clone() {
        return Json(ApiEnvelope::<TransferResponse>::error(message)).into_response();
    }

    let mut transfers = backend.transfers.lock().unwrap();
    let created = TransferResponse {
        id: transfers.len() as i64 + 1,
        source_account: req.source_account,
        destination_account: req.destination_account,
        transfer_amount: req.transfer_amount,
        fee: fee_for(req.transfer_amount),
        transfer_date: req.transfer_date,
        schedule_date: NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap(),
    };
    transfers.push(created.clone());
    Json(ApiEnvelope::success(created)).into_response()
}

async fn calculate_fee(
    State(backend): State<Arc<FakeBackend>>,
    Json(req): Json<FeeCalculationRequest>,
) -> Response {
    if let Some(failure) = backend.take_failure() {
        return failure;
    }
    backend.fee_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(message) = backend.read_error() {
        return Json(ApiEnvelope::<FeeCalculationResponse>::error(message)).into_response();
    }
    Json(ApiEnvelope::success(FeeCalculationResponse {
        fee: Some(fee_for(req.transfer_amount)),
    }))
    .into_response()
}

pub fn fee_for(amount: f64) -> f64 {
    FLAT_FEE + amount * 0.025
}
