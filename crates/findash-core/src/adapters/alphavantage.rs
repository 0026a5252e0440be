use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::{mentions_quota, parse_json, send};
use crate::data_source::{AlphaVantagePayload, ProviderError, ProviderResult, StatementSource};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, DEFAULT_TIMEOUT_MS};
use crate::normalizer::{provider_supports, MONTHLY_SERIES_KEY};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::Throttle;
use crate::{ProviderId, StatementRequest, StatementType};

pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage adapter, the fallback provider.
///
/// Alpha Vantage reports throttling with HTTP 200 and a `Note` or
/// `Information` body, so status alone is not enough to classify a reply.
#[derive(Clone)]
pub struct AlphaVantageAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
    throttle: Throttle,
}

impl AlphaVantageAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(ALPHAVANTAGE_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            throttle: Throttle::from_policy(&ProviderPolicy::alphavantage_default()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_policy(mut self, policy: &ProviderPolicy) -> Self {
        self.throttle = Throttle::from_policy(policy);
        self
    }

    fn build_request(&self, req: &StatementRequest) -> HttpRequest {
        HttpRequest::get(self.base_url.as_str())
            .with_timeout_ms(self.timeout_ms)
            .with_query("function", function_for(req.statement_type()))
            .with_query("symbol", req.ticker().as_str())
            .with_query("apikey", self.api_key.as_str())
    }

    fn classify(
        &self,
        statement_type: StatementType,
        response: HttpResponse,
    ) -> Result<ProviderResult, ProviderError> {
        if response.status == 429 {
            return Err(ProviderError::quota_exhausted(
                "alphavantage returned status 429 (rate limited)",
            ));
        }
        if !response.is_success() {
            return Err(ProviderError::http_status(response.status));
        }

        let body = parse_json(ProviderId::Alphavantage, &response.body)?;
        let Some(object) = body.as_object() else {
            return Err(ProviderError::malformed(
                "alphavantage response is not a JSON object",
            ));
        };

        for key in ["Note", "Information"] {
            if let Some(message) = object.get(key).and_then(Value::as_str) {
                return Err(if key == "Note" || mentions_quota(message) {
                    ProviderError::quota_exhausted(format!("alphavantage: {message}"))
                } else {
                    ProviderError::upstream(format!("alphavantage: {message}"))
                });
            }
        }
        if let Some(message) = object.get("Error Message").and_then(Value::as_str) {
            return Err(ProviderError::upstream(format!("alphavantage: {message}")));
        }

        let nested = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_object)
                .is_none_or(|inner| inner.is_empty())
        };
        let empty = match statement_type {
            StatementType::Quote => nested("Global Quote"),
            StatementType::PriceHistory => nested(MONTHLY_SERIES_KEY),
            _ => object.is_empty(),
        };
        if empty {
            return Err(ProviderError::not_found(
                "alphavantage returned no data for ticker",
            ));
        }

        Ok(ProviderResult::AlphaVantage(AlphaVantagePayload { body }))
    }
}

const fn function_for(statement_type: StatementType) -> &'static str {
    match statement_type {
        StatementType::Quote => "GLOBAL_QUOTE",
        StatementType::Income => "INCOME_STATEMENT",
        StatementType::BalanceSheet => "BALANCE_SHEET",
        StatementType::CashFlow => "CASH_FLOW",
        StatementType::Ratios | StatementType::KeyMetrics | StatementType::Overview => "OVERVIEW",
        StatementType::PriceHistory => "TIME_SERIES_MONTHLY_ADJUSTED",
    }
}

impl StatementSource for AlphaVantageAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Alphavantage
    }

    fn supports(&self, req: &StatementRequest) -> bool {
        provider_supports(ProviderId::Alphavantage, req)
    }

    fn fetch<'a>(
        &'a self,
        req: &'a StatementRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderResult, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.supports(req) {
                return Err(ProviderError::unsupported(ProviderId::Alphavantage, req));
            }
            let request = self.build_request(req);
            let response = send(
                ProviderId::Alphavantage,
                self.http_client.as_ref(),
                &self.throttle,
                request,
            )
            .await?;
            self.classify(req.statement_type(), response)
                .inspect_err(|error| {
                    warn!(provider = "alphavantage", request = %req, error = %error, "alphavantage fetch rejected");
                })
        })
    }
}
