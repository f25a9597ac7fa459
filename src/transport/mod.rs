// Transport layer for the transfer backend
// HTTP bindings, response envelope, retry policy and wire types
//
// Numan Thabit 2025 Nov

pub mod api;
pub mod envelope;
pub mod retry;
pub mod types;

pub use api::{TransferApi, TransferBackend, DEFAULT_REQUEST_TIMEOUT};
pub use envelope::{ApiEnvelope, EnvelopeStatus};
pub use retry::{RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
pub use types::{FeeCalculationRequest, FeeCalculationResponse, TransferRequest, TransferResponse};
