use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::{mentions_quota, parse_json, send};
use crate::data_source::{FmpPayload, ProviderError, ProviderResult, StatementSource};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, DEFAULT_TIMEOUT_MS};
use crate::normalizer::provider_supports;
use crate::provider_policy::ProviderPolicy;
use crate::throttling::Throttle;
use crate::{Period, ProviderId, StatementRequest, StatementType};

pub const FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Financial Modeling Prep adapter, the primary provider.
#[derive(Clone)]
pub struct FmpAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
    throttle: Throttle,
}

impl FmpAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(FMP_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            throttle: Throttle::from_policy(&ProviderPolicy::fmp_default()),
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

    fn build_request(&self, req: &StatementRequest) -> Result<HttpRequest, ProviderError> {
        let path = match req.statement_type() {
            StatementType::Quote => "quote",
            StatementType::Income => "income-statement",
            StatementType::BalanceSheet => "balance-sheet-statement",
            StatementType::CashFlow => "cash-flow-statement",
            StatementType::Ratios if req.period() == Some(Period::Ttm) => "ratios-ttm",
            StatementType::Ratios => "ratios",
            StatementType::KeyMetrics if req.period() == Some(Period::Ttm) => "key-metrics-ttm",
            StatementType::KeyMetrics => "key-metrics",
            StatementType::Overview => "profile",
            StatementType::PriceHistory => {
                return Err(ProviderError::unsupported(ProviderId::Fmp, req));
            }
        };
        let url = format!(
            "{}/{path}/{}",
            self.base_url,
            urlencoding::encode(req.ticker().as_str())
        );

        let mut request = HttpRequest::get(url).with_timeout_ms(self.timeout_ms);
        let period = match req.period() {
            Some(Period::Annual) => Some("annual"),
            Some(Period::Quarterly) => Some("quarter"),
            Some(Period::Ttm) | None => None,
        };
        if let Some(period) = period {
            let limit = req.statement_type().history_depth().to_string();
            request = request.with_query("period", period).with_query("limit", limit);
        }
        Ok(request.with_query("apikey", self.api_key.as_str()))
    }

    fn classify(&self, response: HttpResponse) -> Result<ProviderResult, ProviderError> {
        if response.status == 429 {
            return Err(ProviderError::quota_exhausted(
                "fmp returned status 429 (rate limited)",
            ));
        }

        if !response.is_success() {
            let message = parse_json(ProviderId::Fmp, &response.body)
                .ok()
                .and_then(|body| error_message(&body).map(str::to_owned));
            return Err(match message {
                Some(message) if mentions_quota(&message) => {
                    ProviderError::quota_exhausted(format!("fmp: {message}"))
                }
                _ => ProviderError::http_status(response.status),
            });
        }

        let body = parse_json(ProviderId::Fmp, &response.body)?;
        if let Some(message) = error_message(&body) {
            return Err(if mentions_quota(message) {
                ProviderError::quota_exhausted(format!("fmp: {message}"))
            } else {
                ProviderError::upstream(format!("fmp: {message}"))
            });
        }

        match &body {
            Value::Array(rows) if rows.is_empty() => {
                Err(ProviderError::not_found("fmp returned no rows for ticker"))
            }
            Value::Array(_) => Ok(ProviderResult::Fmp(FmpPayload { body })),
            _ => Err(ProviderError::malformed("fmp response is not a JSON array")),
        }
    }
}

fn error_message(body: &Value) -> Option<&str> {
    body.get("Error Message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
}

impl StatementSource for FmpAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Fmp
    }

    fn supports(&self, req: &StatementRequest) -> bool {
        provider_supports(ProviderId::Fmp, req)
    }

    fn fetch<'a>(
        &'a self,
        req: &'a StatementRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderResult, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.build_request(req)?;
            let response = send(
                ProviderId::Fmp,
                self.http_client.as_ref(),
                &self.throttle,
                request,
            )
            .await?;
            self.classify(response).inspect_err(|error| {
                warn!(provider = "fmp", request = %req, error = %error, "fmp fetch rejected");
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::ProviderErrorKind;
    use crate::http_client::MockHttpClient;
    use crate::TickerSymbol;

    fn request(statement: StatementType, period: Option<Period>) -> StatementRequest {
        StatementRequest::new(
            TickerSymbol::parse("AAPL").expect("valid"),
            statement,
            period,
        )
        .expect("valid request")
    }

    fn adapter(client: &MockHttpClient) -> FmpAdapter {
        FmpAdapter::new(Arc::new(client.clone()), "fmp-key")
    }

    #[test]
    fn builds_statement_urls() {
        let client = MockHttpClient::new();
        let adapter = adapter(&client);

        let quote = adapter
            .build_request(&request(StatementType::Quote, None))
            .expect("quote endpoint");
        assert_eq!(quote.url, "https://financialmodelingprep.com/api/v3/quote/AAPL");
        assert_eq!(quote.query_value("period"), None);
        assert_eq!(quote.query_value("apikey"), Some("fmp-key"));

        let income = adapter
            .build_request(&request(StatementType::Income, Some(Period::Quarterly)))
            .expect("income endpoint");
        assert_eq!(
            income.url,
            "https://financialmodelingprep.com/api/v3/income-statement/AAPL"
        );
        assert_eq!(income.query_value("period"), Some("quarter"));
        assert_eq!(income.query_value("limit"), Some("5"));

        let balance = adapter
            .build_request(&request(StatementType::BalanceSheet, None))
            .expect("balance sheet endpoint");
        assert!(balance.url.ends_with("/balance-sheet-statement/AAPL"));
        assert_eq!(balance.query_value("period"), Some("annual"));
    }

    #[test]
    fn ttm_and_profile_requests_use_dedicated_endpoints() {
        let client = MockHttpClient::new();
        let adapter = adapter(&client);

        let ratios = adapter
            .build_request(&request(StatementType::Ratios, Some(Period::Ttm)))
            .expect("ratios endpoint");
        assert!(ratios.url.ends_with("/ratios-ttm/AAPL"));
        assert_eq!(ratios.query_value("period"), None);
        assert_eq!(ratios.query_value("limit"), None);

        let metrics = adapter
            .build_request(&request(StatementType::KeyMetrics, None))
            .expect("key metrics endpoint");
        assert!(metrics.url.ends_with("/key-metrics/AAPL"));
        assert_eq!(metrics.query_value("limit"), Some("5"));

        let profile = adapter
            .build_request(&request(StatementType::Overview, None))
            .expect("profile endpoint");
        assert!(profile.url.ends_with("/profile/AAPL"));
    }

    #[tokio::test]
    async fn price_history_is_refused_without_a_request() {
        let client = MockHttpClient::new();
        let adapter = adapter(&client);
        let req = request(StatementType::PriceHistory, None);

        assert!(!adapter.supports(&req));
        let error = adapter.fetch(&req).await.expect_err("not published by fmp");

        assert_eq!(error.kind(), ProviderErrorKind::Unsupported);
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn classifies_quota_and_errors() {
        let cases = [
            (HttpResponse::new(429, ""), ProviderErrorKind::QuotaExhausted),
            (
                HttpResponse::new(403, r#"{"Error Message":"Limit Reach . Please upgrade your plan"}"#),
                ProviderErrorKind::QuotaExhausted,
            ),
            (HttpResponse::new(503, "unavailable"), ProviderErrorKind::HttpStatus),
            (
                HttpResponse::ok_json(r#"{"Error Message":"Invalid API KEY."}"#),
                ProviderErrorKind::Upstream,
            ),
            (HttpResponse::ok_json("[]"), ProviderErrorKind::NotFound),
            (HttpResponse::ok_json("<html>"), ProviderErrorKind::Malformed),
        ];

        for (response, expected) in cases {
            let client = MockHttpClient::new().on("/quote/", Ok(response.clone()));
            let error = adapter(&client)
                .fetch(&request(StatementType::Quote, None))
                .await
                .expect_err("must be rejected");
            assert_eq!(error.kind(), expected, "response {response:?}");
        }
    }

    #[tokio::test]
    async fn passes_rows_through_as_fmp_payload() {
        let client = MockHttpClient::new().on(
            "/quote/AAPL",
            Ok(HttpResponse::ok_json(r#"[{"symbol":"AAPL","price":189.84}]"#)),
        );

        let result = adapter(&client)
            .fetch(&request(StatementType::Quote, None))
            .await
            .expect("payload");

        assert_eq!(result.provider(), ProviderId::Fmp);
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn local_budget_refuses_before_network() {
        let client = MockHttpClient::new().on("/quote/", Ok(HttpResponse::ok_json("[{}]")));
        let adapter = adapter(&client).with_policy(&ProviderPolicy {
            provider_id: ProviderId::Fmp,
            quota_window: std::time::Duration::from_secs(3600),
            quota_limit: 1,
        });

        adapter
            .fetch(&request(StatementType::Quote, None))
            .await
            .expect("first call within budget");
        let error = adapter
            .fetch(&request(StatementType::Quote, None))
            .await
            .expect_err("second call over budget");

        assert_eq!(error.kind(), ProviderErrorKind::QuotaExhausted);
        assert_eq!(client.request_count(), 1);
    }
}
