use thiserror::Error;

use crate::data_source::ProviderError;
use crate::normalizer::NormalizeError;
use crate::{Period, ProviderId, StatementType};

/// Validation and contract errors exposed by `findash-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error(
        "invalid statement type '{value}', expected one of quote, income, balance-sheet, cash-flow, ratios, key-metrics, overview, price-history"
    )]
    InvalidStatementType { value: String },
    #[error("invalid period '{value}', expected annual, quarterly or ttm")]
    InvalidPeriod { value: String },
    #[error("{statement_type} is not reported for period '{period}'")]
    UnsupportedPeriod {
        statement_type: StatementType,
        period: Period,
    },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("fiscal date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Configuration values read from the environment that could not be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable '{name}' must be a non-negative integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("environment variable '{name}' must be greater than zero")]
    Zero { name: &'static str },
}

/// One failed provider attempt inside a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub provider: ProviderId,
    pub reason: AttemptReason,
}

impl AttemptFailure {
    pub fn code(&self) -> &'static str {
        match &self.reason {
            AttemptReason::Provider(error) => error.code(),
            AttemptReason::Normalize(error) => error.code(),
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

/// Why a provider attempt did not yield a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptReason {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Terminal outcome of a `fetch_statement` call that produced no record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("all providers failed: {}", join_attempts(.attempts))]
    FetchFailure { attempts: Vec<AttemptFailure> },

    #[error("no provider response contained the required fields: {}", join_attempts(.attempts))]
    SchemaMismatch { attempts: Vec<AttemptFailure> },
}

impl FetchError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "fetch.validation",
            Self::FetchFailure { .. } => "fetch.failure",
            Self::SchemaMismatch { .. } => "fetch.schema_mismatch",
        }
    }

    /// Per-provider attempts, empty for validation failures.
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            Self::Validation(_) => &[],
            Self::FetchFailure { attempts } | Self::SchemaMismatch { attempts } => attempts,
        }
    }
}

fn join_attempts(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
