use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{TickerSymbol, ValidationError};

/// Category of financial data a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementType {
    Quote,
    Income,
    BalanceSheet,
    CashFlow,
    Ratios,
    KeyMetrics,
    /// Company profile: name, exchange, sector plus headline valuation figures.
    Overview,
    /// Monthly closing prices, newest first.
    PriceHistory,
}

impl StatementType {
    pub const ALL: [Self; 8] = [
        Self::Quote,
        Self::Income,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::Ratios,
        Self::KeyMetrics,
        Self::Overview,
        Self::PriceHistory,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Income => "income",
            Self::BalanceSheet => "balance-sheet",
            Self::CashFlow => "cash-flow",
            Self::Ratios => "ratios",
            Self::KeyMetrics => "key-metrics",
            Self::Overview => "overview",
            Self::PriceHistory => "price-history",
        }
    }

    /// Whether records of this type are reported per fiscal period.
    pub const fn is_periodic(self) -> bool {
        !matches!(self, Self::Quote | Self::Overview | Self::PriceHistory)
    }

    /// Trailing-twelve-month figures exist only for derived metrics.
    pub const fn supports_ttm(self) -> bool {
        matches!(self, Self::Ratios | Self::KeyMetrics)
    }

    /// Number of periods a record carries: the latest plus its history.
    pub const fn history_depth(self) -> usize {
        match self {
            Self::Quote | Self::Overview => 1,
            Self::PriceHistory => 60,
            _ => 5,
        }
    }
}

impl Display for StatementType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quote" => Ok(Self::Quote),
            "income" | "income-statement" => Ok(Self::Income),
            "balance-sheet" | "balance_sheet" | "balance" => Ok(Self::BalanceSheet),
            "cash-flow" | "cash_flow" | "cashflow" => Ok(Self::CashFlow),
            "ratios" => Ok(Self::Ratios),
            "key-metrics" | "key_metrics" | "metrics" => Ok(Self::KeyMetrics),
            "overview" | "profile" => Ok(Self::Overview),
            "price-history" | "price_history" | "prices" => Ok(Self::PriceHistory),
            other => Err(ValidationError::InvalidStatementType {
                value: other.to_owned(),
            }),
        }
    }
}

/// Reporting period of a financial statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Annual,
    Quarterly,
    /// Trailing twelve months ending at the latest reported quarter.
    Ttm,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
            Self::Ttm => "ttm",
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "annual" | "year" | "fy" => Ok(Self::Annual),
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            "ttm" | "trailing" => Ok(Self::Ttm),
            other => Err(ValidationError::InvalidPeriod {
                value: other.to_owned(),
            }),
        }
    }
}

/// Cache key and fetch input: which statement of which ticker for which period.
///
/// The period is normalized on construction so that equal requests hash equally:
/// point-in-time types never carry a period and periodic statements default
/// to annual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StatementRequest {
    ticker: TickerSymbol,
    statement_type: StatementType,
    period: Option<Period>,
}

impl StatementRequest {
    pub fn new(
        ticker: TickerSymbol,
        statement_type: StatementType,
        period: Option<Period>,
    ) -> Result<Self, ValidationError> {
        let period = if statement_type.is_periodic() {
            Some(period.unwrap_or(Period::Annual))
        } else {
            None
        };

        if period == Some(Period::Ttm) && !statement_type.supports_ttm() {
            return Err(ValidationError::UnsupportedPeriod {
                statement_type,
                period: Period::Ttm,
            });
        }

        Ok(Self {
            ticker,
            statement_type,
            period,
        })
    }

    pub fn ticker(&self) -> &TickerSymbol {
        &self.ticker
    }

    pub const fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    pub const fn period(&self) -> Option<Period> {
        self.period
    }
}

impl Display for StatementRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.period {
            Some(period) => write!(f, "{}/{}/{}", self.ticker, self.statement_type, period),
            None => write!(f, "{}/{}", self.ticker, self.statement_type),
        }
    }
}
