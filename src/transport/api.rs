// Transfer backend HTTP client
// Issues the three backend calls, retries transient failures and normalizes every
// answer into an `ApiEnvelope`
//
// Numan Thabit 2025 Nov

use super::envelope::{error_from_body, ApiEnvelope};
use super::retry::{is_retryable_status, RetryPolicy};
use super::types::{
    FeeCalculationRequest, FeeCalculationResponse, TransferRequest, TransferResponse,
};
use crate::config::AppConfig;
use crate::errors::ClientError;
use crate::metrics::{REQ_ERRORS, REQ_LATENCY, REQ_RETRIES};
use async_trait::async_trait;
use backoff::future::retry_notify;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SERVICE: &str = "transfers";
const TRANSFERS_PATH: &str = "transfers";
const CALCULATE_FEE_PATH: &str = "transfers/calculate-fee";

/// Backend operations the data-access layer depends on
#[async_trait]
pub trait TransferBackend: Send + Sync {
    async fn schedule_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<ApiEnvelope<TransferResponse>, ClientError>;

    async fn get_all_transfers(&self) -> Result<ApiEnvelope<Vec<TransferResponse>>, ClientError>;

    async fn calculate_fee(
        &self,
        request: &FeeCalculationRequest,
    ) -> Result<ApiEnvelope<FeeCalculationResponse>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct TransferApi {
    http: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl TransferApi {
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        Self::with_settings(base_url, RetryPolicy::default(), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_settings(
        base_url: Url,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Transport(format!("build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            retry,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::with_settings(
            config.base_url()?,
            config.retry_policy(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Paths are appended to the base, which already carries the `/api` prefix.
    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        operation: &'static str,
        body: Option<&B>,
    ) -> Result<ApiEnvelope<T>, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let _timer = REQ_LATENCY
            .with_label_values(&[SERVICE, operation])
            .start_timer();

        let method_ref = &method;
        let url_ref = &url;
        let outcome = retry_notify(
            self.retry.backoff(),
            move || async move { self.send_once(method_ref.clone(), url_ref, body).await },
            |err: ClientError, wait: Duration| {
                REQ_RETRIES.with_label_values(&[SERVICE, operation]).inc();
                warn!(
                    operation = operation,
                    method = %method,
                    url = %url,
                    retry_in_ms = wait.as_millis() as u64,
                    error = %err,
                    "transient backend failure; retrying"
                );
            },
        )
        .await;

        if let Err(err) = &outcome {
            REQ_ERRORS.with_label_values(&[SERVICE, operation]).inc();
            error!(
                operation = operation,
                method = %method,
                url = %url,
                error = %err,
                "backend request failed"
            );
        }
        outcome
    }

    async fn send_once<B, T>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&B>,
    ) -> Result<ApiEnvelope<T>, backoff::Error<ClientError>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let resp = request.send().await.map_err(|e| {
            let err = ClientError::Transport(format!("send {url}: {e}"));
            if e.is_timeout() || e.is_connect() || e.is_request() {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            }
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            backoff::Error::transient(ClientError::Transport(format!("read body: {e}")))
        })?;

        if !status.is_success() {
            let err = error_from_body(&bytes).unwrap_or_else(|| ClientError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
            warn!(status = status.as_u16(), url = %url, error = %err, "backend returned error status");
            return Err(if is_retryable_status(status) {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            });
        }

        debug!(status = status.as_u16(), url = %url, bytes = bytes.len(), "backend response");
        serde_json::from_slice(&bytes)
            .map_err(|e| backoff::Error::permanent(ClientError::Decode(format!("{url}: {e}"))))
    }
}

#[async_trait]
impl TransferBackend for TransferApi {
    async fn schedule_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<ApiEnvelope<TransferResponse>, ClientError> {
        self.send(Method::POST, TRANSFERS_PATH, "schedule_transfer", Some(request))
            .await
    }

    async fn get_all_transfers(&self) -> Result<ApiEnvelope<Vec<TransferResponse>>, ClientError> {
        self.send::<(), _>(Method::GET, TRANSFERS_PATH, "get_all_transfers", None)
            .await
    }

    async fn calculate_fee(
        &self,
        request: &FeeCalculationRequest,
    ) -> Result<ApiEnvelope<FeeCalculationResponse>, ClientError> {
        self.send(Method::POST, CALCULATE_FEE_PATH, "calculate_fee", Some(request))
            .await
    }
}
