//! Core contracts for findash.
//!
//! This crate contains:
//! - Canonical domain models and ticker validation
//! - Provider identifiers, adapters and the HTTP transport seam
//! - Response normalization into [`CanonicalRecord`]
//! - The TTL record cache and the fallback-aware [`StatementService`]
//! - Response envelope and structured errors

pub mod adapters;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod normalizer;
pub mod provider_policy;
pub mod service;
pub mod source;
pub mod throttling;

pub use adapters::{AlphaVantageAdapter, FmpAdapter, ALPHAVANTAGE_BASE_URL, FMP_BASE_URL};
pub use cache::{CacheMode, CacheTtl, StatementCache};
pub use config::FetchConfig;
pub use data_source::{ProviderError, ProviderErrorKind, ProviderResult, StatementSource};
pub use domain::{
    CanonicalRecord, CanonicalRecordBuilder, FiscalDate, LineItem, LineValue, Period,
    PeriodSnapshot, ProfileField, StatementRequest, StatementType, TickerSymbol, UtcDateTime,
};
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};
pub use error::{AttemptFailure, AttemptReason, ConfigError, FetchError, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, MockHttpClient, ReqwestHttpClient,
    DEFAULT_TIMEOUT_MS,
};
pub use normalizer::{normalize, NormalizeError};
pub use provider_policy::ProviderPolicy;
pub use service::{FetchOutcome, StatementService, StatementServiceBuilder};
pub use source::ProviderId;
pub use throttling::Throttle;
