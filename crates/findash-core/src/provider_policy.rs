use std::time::Duration;

use crate::ProviderId;

/// Free-tier request budget for one upstream provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
}

impl ProviderPolicy {
    /// Alpha Vantage free tier: 5 calls per minute.
    pub fn alphavantage_default() -> Self {
        Self {
            provider_id: ProviderId::Alphavantage,
            quota_window: Duration::from_secs(60),
            quota_limit: 5,
        }
    }

    /// Financial Modeling Prep free tier: 250 calls per day.
    pub fn fmp_default() -> Self {
        Self {
            provider_id: ProviderId::Fmp,
            quota_window: Duration::from_secs(24 * 60 * 60),
            quota_limit: 250,
        }
    }

    /// Same window with a different call budget, for paid plans.
    pub fn with_quota_limit(mut self, quota_limit: u32) -> Self {
        self.quota_limit = quota_limit;
        self
    }
}
