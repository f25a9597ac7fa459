// Metrics and observability module
// This file holds the Prometheus collectors for backend calls and the query cache
//
// Numan Thabit 2025 Nov

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

pub static REQ_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "transfer_client_request_latency_seconds",
        "latency for backend calls, retries included",
        &["service", "operation"]
    )
    .expect("register request latency histogram")
});

pub static REQ_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "transfer_client_request_errors_total",
        "backend calls that failed after retries",
        &["service", "operation"]
    )
    .expect("register request error counter")
});

pub static REQ_RETRIES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "transfer_client_request_retries_total",
        "retried backend attempts",
        &["service", "operation"]
    )
    .expect("register request retry counter")
});

pub static CACHE_LOOKUPS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "transfer_client_cache_lookups_total",
        "query cache lookups by outcome",
        &["query", "outcome"]
    )
    .expect("register cache lookup counter")
});
