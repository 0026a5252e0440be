//! Validator → cache → primary → fallback → normalizer → cache pipeline.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::adapters::{AlphaVantageAdapter, FmpAdapter};
use crate::cache::{CacheMode, CacheTtl, StatementCache};
use crate::config::FetchConfig;
use crate::data_source::{ProviderError, StatementSource};
use crate::error::{AttemptFailure, AttemptReason, FetchError};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::normalizer::normalize;
use crate::{
    CanonicalRecord, Period, ProviderId, StatementRequest, StatementType, TickerSymbol,
    UtcDateTime,
};

/// Record plus whether it was served from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub record: CanonicalRecord,
    pub cache_hit: bool,
}

/// Entry point for callers: one validated, cached, fallback-aware fetch.
///
/// Shareable across sessions behind `Arc`; the cache handle is the only
/// shared mutable state.
#[derive(Clone)]
pub struct StatementService {
    primary: Arc<dyn StatementSource>,
    fallback: Arc<dyn StatementSource>,
    cache: StatementCache,
    ttl: CacheTtl,
}

impl StatementService {
    pub fn new(
        primary: Arc<dyn StatementSource>,
        fallback: Arc<dyn StatementSource>,
        cache: StatementCache,
        ttl: CacheTtl,
    ) -> Self {
        Self {
            primary,
            fallback,
            cache,
            ttl,
        }
    }

    pub fn builder() -> StatementServiceBuilder {
        StatementServiceBuilder::new()
    }

    pub fn cache(&self) -> &StatementCache {
        &self.cache
    }

    /// Providers in the order they are tried.
    pub fn provider_chain(&self) -> [ProviderId; 2] {
        [self.primary.id(), self.fallback.id()]
    }

    /// Fetch one normalized record, using the cache.
    ///
    /// # Errors
    ///
    /// [`FetchError::Validation`] for a bad ticker or a period the statement
    /// type is never reported for (no network I/O happens),
    /// [`FetchError::SchemaMismatch`] when every provider answered without the
    /// required fields, and [`FetchError::FetchFailure`] otherwise.
    pub async fn fetch_statement(
        &self,
        raw_ticker: &str,
        statement_type: StatementType,
        period: Option<Period>,
    ) -> Result<CanonicalRecord, FetchError> {
        self.fetch_statement_with_mode(raw_ticker, statement_type, period, CacheMode::Use)
            .await
    }

    pub async fn fetch_statement_with_mode(
        &self,
        raw_ticker: &str,
        statement_type: StatementType,
        period: Option<Period>,
        mode: CacheMode,
    ) -> Result<CanonicalRecord, FetchError> {
        let ticker = TickerSymbol::parse(raw_ticker)?;
        let req = StatementRequest::new(ticker, statement_type, period)?;
        self.fetch(&req, mode).await.map(|outcome| outcome.record)
    }

    /// Run the pipeline for an already validated request.
    #[instrument(skip(self, req), fields(request = %req))]
    pub async fn fetch(
        &self,
        req: &StatementRequest,
        mode: CacheMode,
    ) -> Result<FetchOutcome, FetchError> {
        if mode.reads() {
            if let Some(record) = self.cache.get(req).await {
                debug!(source = %record.source(), "cache hit");
                return Ok(FetchOutcome {
                    record,
                    cache_hit: true,
                });
            }
            debug!("cache miss");
        }

        let mut attempts = Vec::with_capacity(2);
        for source in [&self.primary, &self.fallback] {
            let provider = source.id();
            match self.attempt(source.as_ref(), req).await {
                Ok(record) => {
                    info!(%provider, fallback = !attempts.is_empty(), "record fetched");
                    if mode.writes() {
                        self.cache
                            .put(req.clone(), record.clone(), self.ttl.for_type(req.statement_type()))
                            .await;
                    }
                    return Ok(FetchOutcome {
                        record,
                        cache_hit: false,
                    });
                }
                Err(reason) => {
                    let quota = matches!(&reason, AttemptReason::Provider(error) if error.quota_related());
                    let failure = AttemptFailure { provider, reason };
                    warn!(%provider, code = failure.code(), quota, error = %failure.reason, "provider attempt failed");
                    attempts.push(failure);
                }
            }
        }

        Err(if attempts.iter().all(is_schema_mismatch) {
            FetchError::SchemaMismatch { attempts }
        } else {
            FetchError::FetchFailure { attempts }
        })
    }

    async fn attempt(
        &self,
        source: &dyn StatementSource,
        req: &StatementRequest,
    ) -> Result<CanonicalRecord, AttemptReason> {
        if !source.supports(req) {
            return Err(ProviderError::unsupported(source.id(), req).into());
        }
        let result = source.fetch(req).await?;
        Ok(normalize(result, req, UtcDateTime::now())?)
    }
}

fn is_schema_mismatch(attempt: &AttemptFailure) -> bool {
    matches!(&attempt.reason, AttemptReason::Normalize(error) if error.is_schema_mismatch())
}

/// Wires configuration, transport and cache into a [`StatementService`].
///
/// ```no_run
/// use findash_core::{FetchConfig, StatementServiceBuilder};
///
/// let config = FetchConfig::from_env().expect("valid environment");
/// let service = StatementServiceBuilder::new().with_config(config).build();
/// ```
#[derive(Default)]
pub struct StatementServiceBuilder {
    config: FetchConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    cache: Option<StatementCache>,
    primary: Option<Arc<dyn StatementSource>>,
    fallback: Option<Arc<dyn StatementSource>>,
}

impl StatementServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Transport shared by both provider adapters. Defaults to reqwest.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Inject an existing cache handle instead of creating a fresh one.
    pub fn with_cache(mut self, cache: StatementCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_primary(mut self, source: Arc<dyn StatementSource>) -> Self {
        self.primary = Some(source);
        self
    }

    pub fn with_fallback(mut self, source: Arc<dyn StatementSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    pub fn build(self) -> StatementService {
        let config = self.config;
        let http_client: Arc<dyn HttpClient> = match self.http_client {
            Some(http_client) => http_client,
            None => Arc::new(ReqwestHttpClient::new()),
        };

        let primary: Arc<dyn StatementSource> = match self.primary {
            Some(source) => source,
            None => Arc::new(
                FmpAdapter::new(Arc::clone(&http_client), config.fmp_api_key.as_str())
                    .with_timeout_ms(config.timeout_ms)
                    .with_policy(&config.fmp_policy),
            ),
        };
        let fallback: Arc<dyn StatementSource> = match self.fallback {
            Some(source) => source,
            None => Arc::new(
                AlphaVantageAdapter::new(http_client, config.alphavantage_api_key.as_str())
                    .with_timeout_ms(config.timeout_ms)
                    .with_policy(&config.alphavantage_policy),
            ),
        };

        debug!(
            primary = %primary.id(),
            fallback = %fallback.id(),
            timeout_ms = config.timeout_ms,
            "statement service configured"
        );

        StatementService::new(
            primary,
            fallback,
            self.cache.unwrap_or_default(),
            config.cache_ttl,
        )
    }
}
