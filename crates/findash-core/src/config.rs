use std::env;
use std::time::Duration;

use crate::cache::CacheTtl;
use crate::error::ConfigError;
use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::provider_policy::ProviderPolicy;

const DEMO_KEY: &str = "demo";

/// Runtime settings for the fetch pipeline.
///
/// Every value has a default, so an empty environment still yields a usable
/// (demo-key) configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub fmp_api_key: String,
    pub alphavantage_api_key: String,
    pub timeout_ms: u64,
    pub cache_ttl: CacheTtl,
    pub fmp_policy: ProviderPolicy,
    pub alphavantage_policy: ProviderPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            fmp_api_key: String::from(DEMO_KEY),
            alphavantage_api_key: String::from(DEMO_KEY),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_ttl: CacheTtl::default(),
            fmp_policy: ProviderPolicy::fmp_default(),
            alphavantage_policy: ProviderPolicy::alphavantage_default(),
        }
    }
}

impl FetchConfig {
    /// Reads settings from process environment variables.
    ///
    /// | Setting | Variables (first set wins) |
    /// |---------|----------------------------|
    /// | FMP key | `FINDASH_FMP_API_KEY`, `FMP_API_KEY` |
    /// | Alpha Vantage key | `FINDASH_ALPHAVANTAGE_API_KEY`, `ALPHAVANTAGE_API_KEY` |
    /// | timeout | `FINDASH_TIMEOUT_MS` |
    /// | quote TTL | `FINDASH_QUOTE_TTL_SECS` |
    /// | statement TTL | `FINDASH_STATEMENT_TTL_SECS` |
    /// | FMP calls per day | `FINDASH_FMP_QUOTA_LIMIT` |
    /// | Alpha Vantage calls per minute | `FINDASH_ALPHAVANTAGE_QUOTA_LIMIT` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let fmp_api_key = non_blank("FINDASH_FMP_API_KEY")
            .or_else(|| non_blank("FMP_API_KEY"))
            .unwrap_or(defaults.fmp_api_key);
        let alphavantage_api_key = non_blank("FINDASH_ALPHAVANTAGE_API_KEY")
            .or_else(|| non_blank("ALPHAVANTAGE_API_KEY"))
            .unwrap_or(defaults.alphavantage_api_key);

        let timeout_ms =
            parse_positive(&lookup, "FINDASH_TIMEOUT_MS")?.unwrap_or(defaults.timeout_ms);

        let quote = parse_u64(&lookup, "FINDASH_QUOTE_TTL_SECS")?
            .map_or(defaults.cache_ttl.quote, Duration::from_secs);
        let statement = parse_u64(&lookup, "FINDASH_STATEMENT_TTL_SECS")?
            .map_or(defaults.cache_ttl.statement, Duration::from_secs);

        let fmp_policy = match parse_quota(&lookup, "FINDASH_FMP_QUOTA_LIMIT")? {
            Some(limit) => defaults.fmp_policy.with_quota_limit(limit),
            None => defaults.fmp_policy,
        };
        let alphavantage_policy = match parse_quota(&lookup, "FINDASH_ALPHAVANTAGE_QUOTA_LIMIT")? {
            Some(limit) => defaults.alphavantage_policy.with_quota_limit(limit),
            None => defaults.alphavantage_policy,
        };

        Ok(Self {
            fmp_api_key,
            alphavantage_api_key,
            timeout_ms,
            cache_ttl: CacheTtl::new(quote, statement),
            fmp_policy,
            alphavantage_policy,
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

fn parse_u64<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber { name, value: raw })
}

fn parse_positive<F>(lookup: &F, name: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_u64(lookup, name)? {
        Some(0) => Err(ConfigError::Zero { name }),
        other => Ok(other),
    }
}

fn parse_quota<F>(lookup: &F, name: &'static str) -> Result<Option<u32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_positive(lookup, name)?
        .map(|value| {
            u32::try_from(value).map_err(|_| ConfigError::InvalidNumber {
                name,
                value: value.to_string(),
            })
        })
        .transpose()
}
