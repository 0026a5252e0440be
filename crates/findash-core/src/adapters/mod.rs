mod alphavantage;
mod fmp;

pub use alphavantage::{AlphaVantageAdapter, ALPHAVANTAGE_BASE_URL};
pub use fmp::{FmpAdapter, FMP_BASE_URL};

use serde_json::Value;
use tracing::{debug, warn};

use crate::data_source::ProviderError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::throttling::Throttle;
use crate::ProviderId;

/// Runs one upstream GET after checking the local quota budget.
///
/// Transport failures and timeouts are classified here; status and body
/// interpretation is left to the adapter.
async fn send(
    provider: ProviderId,
    http_client: &dyn HttpClient,
    throttle: &Throttle,
    request: HttpRequest,
) -> Result<HttpResponse, ProviderError> {
    if let Err(wait) = throttle.acquire() {
        warn!(%provider, wait_secs = wait.as_secs_f64(), "local quota budget exhausted");
        return Err(ProviderError::quota_exhausted(format!(
            "{provider} free-tier budget spent; retry in {:.2}s",
            wait.as_secs_f64()
        )));
    }

    debug!(%provider, url = %request.redacted_url(), timeout_ms = request.timeout_ms, "upstream request");

    let response = http_client.execute(request).await.map_err(|error| {
        warn!(%provider, error = %error, "upstream transport failure");
        if error.timed_out() {
            ProviderError::timeout(format!("{provider} timed out: {}", error.message()))
        } else {
            ProviderError::transport(format!("{provider} transport error: {}", error.message()))
        }
    })?;

    debug!(%provider, status = response.status, bytes = response.body.len(), "upstream response");
    Ok(response)
}

fn parse_json(provider: ProviderId, body: &str) -> Result<Value, ProviderError> {
    serde_json::from_str(body).map_err(|error| {
        ProviderError::malformed(format!("{provider} returned invalid JSON: {error}"))
    })
}

fn mentions_quota(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    ["limit", "frequency", "quota", "premium"]
        .iter()
        .any(|needle| lowered.contains(needle))
}
