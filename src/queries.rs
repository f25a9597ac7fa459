// Data-access layer for transfers
// Wraps the backend client with the query cache: a cached transfer list, uncached
// fee calculations, and transfer creation that invalidates the list on success
//
// Numan Thabit 2025 Nov

use crate::cache::{QueryCache, QueryKey, QueryOptions};
use crate::errors::ClientError;
use crate::transport::{
    FeeCalculationRequest, FeeCalculationResponse, TransferBackend, TransferRequest,
    TransferResponse,
};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Query keys for everything transfer related, all under `transfers`.
pub struct TransferKeys;

impl TransferKeys {
    pub fn all() -> QueryKey {
        QueryKey::new(["transfers"])
    }

    pub fn lists() -> QueryKey {
        Self::all().child("list")
    }

    pub fn list(filters: &BTreeMap<String, String>) -> QueryKey {
        let encoded = filters
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        Self::lists().child(encoded)
    }

    pub fn details() -> QueryKey {
        Self::all().child("detail")
    }

    pub fn detail(id: i64) -> QueryKey {
        Self::details().child(id.to_string())
    }

    pub fn fee(params: &FeeCalculationRequest) -> QueryKey {
        Self::all().child("fee").child(format!(
            "{}@{}",
            params.transfer_amount, params.transfer_date
        ))
    }
}

#[derive(Clone)]
pub struct TransferQueries {
    backend: Arc<dyn TransferBackend>,
    cache: QueryCache,
    options: QueryOptions,
}

impl TransferQueries {
    pub fn new(backend: Arc<dyn TransferBackend>, cache: QueryCache) -> Self {
        Self {
            backend,
            cache,
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// All scheduled transfers, served from cache inside the freshness window.
    pub async fn transfers(&self) -> Result<Vec<TransferResponse>, ClientError> {
        let backend = Arc::clone(&self.backend);
        self.cache
            .fetch_query(TransferKeys::lists(), self.options, move || async move {
                fetch_transfer_list(backend.as_ref()).await
            })
            .await
    }

    /// Fee preview as returned by the backend. Never cached.
    pub async fn calculate_fee_details(
        &self,
        request: &FeeCalculationRequest,
    ) -> Result<Option<FeeCalculationResponse>, ClientError> {
        debug!(
            amount = request.transfer_amount,
            date = %request.transfer_date,
            "calculating fee"
        );
        self.backend.calculate_fee(request).await?.into_data()
    }

    /// Fee preview amount; 0 when the backend omits it.
    pub async fn calculate_fee(&self, request: &FeeCalculationRequest) -> Result<f64, ClientError> {
        let details = self.calculate_fee_details(request).await?;
        Ok(details.and_then(|d| d.fee).unwrap_or(0.0))
    }

    /// Schedule a transfer. The cached list is invalidated only once the backend
    /// has confirmed the transfer; failures leave the cache untouched.
    pub async fn create_transfer(
        &self,
        request: &TransferRequest,
    ) -> Result<Option<TransferResponse>, ClientError> {
        let created = self
            .backend
            .schedule_transfer(request)
            .await
            .and_then(|envelope| envelope.into_data())
            .map_err(|err| {
                warn!(error = %err, "transfer scheduling failed; cache left as is");
                err
            })?;

        let invalidated = self.cache.invalidate_queries(&TransferKeys::lists()).await;
        info!(
            id = ?created.as_ref().map(|t| t.id),
            fee = ?created.as_ref().map(|t| t.fee),
            invalidated = invalidated,
            "transfer scheduled"
        );
        Ok(created)
    }

    /// Warm the transfer list with the same freshness window as `transfers`.
    pub async fn prefetch_transfers(&self) {
        let backend = Arc::clone(&self.backend);
        self.cache
            .prefetch_query(TransferKeys::lists(), self.options, move || async move {
                fetch_transfer_list(backend.as_ref()).await
            })
            .await
    }

    /// Callback form of `prefetch_transfers`, for wiring into navigation hints.
    pub fn prefetch_callback(&self) -> impl Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static {
        let queries = self.clone();
        move || {
            let queries = queries.clone();
            Box::pin(async move { queries.prefetch_transfers().await })
        }
    }
}

async fn fetch_transfer_list(
    backend: &dyn TransferBackend,
) -> Result<Vec<TransferResponse>, ClientError> {
    let transfers = backend.get_all_transfers().await?.into_data()?;
    Ok(transfers.unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::ApiEnvelope;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory backend that records how often each call was made
    #[derive(Default)]
    pub(crate) struct MemoryBackend {
        pub transfers: Mutex<Vec<TransferResponse>>,
        pub list_calls: AtomicUsize,
        pub fee_calls: AtomicUsize,
        pub reject_schedules: AtomicBool,
        /// List and fee reads answer with an ERROR envelope while set
        pub reject_reads: AtomicBool,
        pub fee: Mutex<Option<f64>>,
    }

    impl MemoryBackend {
        pub(crate) fn with_fee(fee: Option<f64>) -> Self {
            let backend = Self::default();
            *backend.fee.lock().unwrap() = fee;
            backend
        }
    }

    #[async_trait]
    impl TransferBackend for MemoryBackend {
        async fn schedule_transfer(
            &self,
            request: &TransferRequest,
        ) -> Result<ApiEnvelope<TransferResponse>, ClientError> {
            if self.reject_schedules.load(Ordering::SeqCst) {
                return Ok(ApiEnvelope::error("Não há taxa aplicável para transferências com mais de 50 dias"));
            }
            let mut transfers = self.transfers.lock().unwrap();
            let created = TransferResponse {
                id: transfers.len() as i64 + 1,
                source_account: request.source_account.clone(),
                destination_account: request.destination_account.clone(),
                transfer_amount: request.transfer_amount,
                fee: 12.0,
                transfer_date: request.transfer_date,
                schedule_date: NaiveDate::from_ymd_opt(2030, 1, 1)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
            };
            transfers.push(created.clone());
            Ok(ApiEnvelope::success(created))
        }

        async fn get_all_transfers(
            &self,
        ) -> Result<ApiEnvelope<Vec<TransferResponse>>, ClientError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_reads.load(Ordering::SeqCst) {
                return Ok(ApiEnvelope::error("Serviço indisponível"));
            }
            Ok(ApiEnvelope::success(self.transfers.lock().unwrap().clone()))
        }

        async fn calculate_fee(
            &self,
            _request: &FeeCalculationRequest,
        ) -> Result<ApiEnvelope<FeeCalculationResponse>, ClientError> {
            self.fee_calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_reads.load(Ordering::SeqCst) {
                return Ok(ApiEnvelope::error("Serviço indisponível"));
            }
            Ok(ApiEnvelope::success(FeeCalculationResponse {
                fee: *self.fee.lock().unwrap(),
            }))
        }
    }

    pub(crate) fn request() -> TransferRequest {
        TransferRequest {
            source_account: "1234567890".into(),
            destination_account: "0987654321".into(),
            transfer_amount: 1000.0,
            transfer_date: NaiveDate::from_ymd_opt(2030, 1, 10).unwrap(),
        }
    }

    fn queries(backend: Arc<MemoryBackend>) -> TransferQueries {
        TransferQueries::new(backend, QueryCache::default())
    }

    #[test]
    fn keys_nest_under_transfers() {
        let fee = FeeCalculationRequest {
            transfer_amount: 10.5,
            transfer_date: NaiveDate::from_ymd_opt(2030, 1, 10).unwrap(),
        };
        assert_eq!(TransferKeys::lists().to_string(), "transfers/list");
        assert_eq!(TransferKeys::detail(3).to_string(), "transfers/detail/3");
        assert_eq!(TransferKeys::fee(&fee).to_string(), "transfers/fee/10.5@2030-01-10");

        let mut filters = BTreeMap::new();
        filters.insert("account".to_string(), "1234567890".to_string());
        let filtered = TransferKeys::list(&filters);
        assert!(filtered.starts_with(&TransferKeys::lists()));
        assert!(!TransferKeys::detail(3).starts_with(&TransferKeys::lists()));
    }

    #[tokio::test(start_paused = true)]
    async fn list_is_cached_within_freshness_window() {
        let backend = Arc::new(MemoryBackend::default());
        let queries = queries(backend.clone());

        assert!(queries.transfers().await.unwrap().is_empty());
        assert!(queries.transfers().await.unwrap().is_empty());
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn creating_a_transfer_refreshes_the_list() {
        let backend = Arc::new(MemoryBackend::default());
        let queries = queries(backend.clone());

        assert!(queries.transfers().await.unwrap().is_empty());
        let created = queries.create_transfer(&request()).await.unwrap().unwrap();

        let listed = queries.transfers().await.unwrap();
        assert_eq!(listed, vec![created]);
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_transfer_does_not_invalidate() {
        let backend = Arc::new(MemoryBackend::default());
        backend.reject_schedules.store(true, Ordering::SeqCst);
        let queries = queries(backend.clone());
        let mut events = queries.cache().subscribe();

        queries.transfers().await.unwrap();
        let err = queries.create_transfer(&request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { .. }));

        queries.transfers().await.unwrap();
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            events.recv().await.unwrap(),
            crate::cache::CacheEvent::Updated(TransferKeys::lists())
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn fee_calculation_is_never_cached_and_defaults_to_zero() {
        let backend = Arc::new(MemoryBackend::with_fee(Some(27.5)));
        let queries = queries(backend.clone());
        let fee_request = FeeCalculationRequest {
            transfer_amount: 1000.0,
            transfer_date: NaiveDate::from_ymd_opt(2030, 1, 10).unwrap(),
        };

        assert_eq!(queries.calculate_fee(&fee_request).await.unwrap(), 27.5);
        assert_eq!(queries.calculate_fee(&fee_request).await.unwrap(), 27.5);
        assert_eq!(backend.fee_calls.load(Ordering::SeqCst), 2);
        assert!(queries.cache().is_empty().await);

        *backend.fee.lock().unwrap() = None;
        assert_eq!(queries.calculate_fee(&fee_request).await.unwrap(), 0.0);
        assert_eq!(
            queries.calculate_fee_details(&fee_request).await.unwrap(),
            Some(FeeCalculationResponse { fee: None })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn error_envelopes_on_reads_fail_and_cache_nothing() {
        let backend = Arc::new(MemoryBackend::with_fee(Some(5.0)));
        backend.reject_reads.store(true, Ordering::SeqCst);
        let queries = queries(backend.clone());
        let fee_request = FeeCalculationRequest {
            transfer_amount: 100.0,
            transfer_date: NaiveDate::from_ymd_opt(2030, 1, 10).unwrap(),
        };

        match queries.transfers().await {
            Err(ClientError::Api { message, .. }) => assert_eq!(message, "Serviço indisponível"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            queries.calculate_fee(&fee_request).await,
            Err(ClientError::Api { .. })
        ));
        assert_eq!(
            queries
                .cache()
                .get_query_data::<Vec<TransferResponse>>(&TransferKeys::lists())
                .await,
            None
        );

        backend.reject_reads.store(false, Ordering::SeqCst);
        assert!(queries.transfers().await.unwrap().is_empty());
        assert_eq!(queries.calculate_fee(&fee_request).await.unwrap(), 5.0);
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(backend.fee_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn prefetch_warms_the_list() {
        let backend = Arc::new(MemoryBackend::default());
        let queries = queries(backend.clone());

        let prefetch = queries.prefetch_callback();
        prefetch().await;
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);

        queries.transfers().await.unwrap();
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
    }
}
