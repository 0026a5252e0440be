//! Provider adapter contract and the raw, per-attempt provider result.
//!
//! Every upstream provider implements [`StatementSource`]. A fetch performs at
//! most one HTTP call and hands back a [`ProviderResult`], which only the
//! normalizer knows how to read.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::{Period, ProviderId, StatementRequest};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Connection refused, DNS failure, body read error.
    Transport,
    /// No response within the per-request timeout.
    Timeout,
    /// Non-2xx status that is not a quota signal.
    HttpStatus,
    /// Upstream quota or rate limit reached, or local budget spent.
    QuotaExhausted,
    /// Provider answered with an error message (bad symbol, bad key).
    Upstream,
    /// Provider answered successfully but with no data for the ticker.
    NotFound,
    /// Body was not the JSON shape the provider documents.
    Malformed,
    /// Provider does not publish the requested statement type for the
    /// requested period; no call was made.
    Unsupported,
}

/// Structured provider error used by the fallback coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
}

impl ProviderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn http_status(status: u16) -> Self {
        Self::new(
            ProviderErrorKind::HttpStatus,
            format!("upstream returned status {status}"),
        )
    }

    pub fn quota_exhausted(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::QuotaExhausted, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Upstream, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }

    pub fn unsupported(provider: ProviderId, req: &StatementRequest) -> Self {
        let period = req.period().map_or("none", Period::as_str);
        Self::new(
            ProviderErrorKind::Unsupported,
            format!(
                "{provider} does not report {} for period {period}",
                req.statement_type()
            ),
        )
    }

    fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn quota_related(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::QuotaExhausted)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Transport => "provider.transport",
            ProviderErrorKind::Timeout => "provider.timeout",
            ProviderErrorKind::HttpStatus => "provider.http_status",
            ProviderErrorKind::QuotaExhausted => "provider.quota_exhausted",
            ProviderErrorKind::Upstream => "provider.upstream",
            ProviderErrorKind::NotFound => "provider.not_found",
            ProviderErrorKind::Malformed => "provider.malformed",
            ProviderErrorKind::Unsupported => "provider.unsupported",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Raw Financial Modeling Prep response body for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FmpPayload {
    pub(crate) body: Value,
}

/// Raw Alpha Vantage response body for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaVantagePayload {
    pub(crate) body: Value,
}

/// Provider-specific raw response, tagged by the provider that produced it.
///
/// Owned by a single fetch attempt and consumed by
/// [`normalize`](crate::normalizer::normalize).
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult {
    Fmp(FmpPayload),
    AlphaVantage(AlphaVantagePayload),
}

impl ProviderResult {
    pub const fn provider(&self) -> ProviderId {
        match self {
            Self::Fmp(_) => ProviderId::Fmp,
            Self::AlphaVantage(_) => ProviderId::Alphavantage,
        }
    }
}

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the coordinator shares them
/// across sessions behind `Arc`.
pub trait StatementSource: Send + Sync {
    /// Returns the unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Whether this provider publishes the requested statement type for the
    /// requested period. Unsupported requests are never sent.
    fn supports(&self, req: &StatementRequest) -> bool;

    /// Fetches the raw statement payload with a single upstream call.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport failure, timeout, non-2xx
    /// status, quota exhaustion or an error body from the provider.
    fn fetch<'a>(
        &'a self,
        req: &'a StatementRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProviderResult, ProviderError>> + Send + 'a>>;
}
