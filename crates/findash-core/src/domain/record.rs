use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{FiscalDate, Period, ProviderId, StatementType, TickerSymbol, UtcDateTime, ValidationError};

/// Canonical, provider-independent name of a financial line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    // quote
    Price,
    Open,
    DayHigh,
    DayLow,
    PreviousClose,
    Change,
    ChangePercent,
    Volume,

    // income statement
    Revenue,
    CostOfRevenue,
    GrossProfit,
    OperatingExpenses,
    OperatingIncome,
    OtherIncomeExpenses,
    IncomeBeforeTax,
    IncomeTaxExpense,
    NetIncome,
    Ebitda,

    // balance sheet
    TotalAssets,
    TotalCurrentAssets,
    TotalNonCurrentAssets,
    TotalCurrentLiabilities,
    TotalNonCurrentLiabilities,
    TotalLiabilities,
    TotalEquity,
    CashAndEquivalents,

    // cash flow
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
    CapitalExpenditure,
    FreeCashFlow,

    // ratios
    CurrentRatio,
    QuickRatio,
    GrossProfitMargin,
    OperatingProfitMargin,
    NetProfitMargin,
    ReturnOnAssets,
    ReturnOnEquity,
    DebtEquityRatio,
    PriceEarningsRatio,
    PriceToBookRatio,
    PriceToSalesRatio,
    DividendYield,
    PayoutRatio,

    // company overview and key metrics
    MarketCap,
    Beta,
    EarningsPerShare,
    WorkingCapital,

    // price history
    Close,
    AdjustedClose,
}

impl LineItem {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Open => "open",
            Self::DayHigh => "day_high",
            Self::DayLow => "day_low",
            Self::PreviousClose => "previous_close",
            Self::Change => "change",
            Self::ChangePercent => "change_percent",
            Self::Volume => "volume",
            Self::Revenue => "revenue",
            Self::CostOfRevenue => "cost_of_revenue",
            Self::GrossProfit => "gross_profit",
            Self::OperatingExpenses => "operating_expenses",
            Self::OperatingIncome => "operating_income",
            Self::OtherIncomeExpenses => "other_income_expenses",
            Self::IncomeBeforeTax => "income_before_tax",
            Self::IncomeTaxExpense => "income_tax_expense",
            Self::NetIncome => "net_income",
            Self::Ebitda => "ebitda",
            Self::TotalAssets => "total_assets",
            Self::TotalCurrentAssets => "total_current_assets",
            Self::TotalNonCurrentAssets => "total_non_current_assets",
            Self::TotalCurrentLiabilities => "total_current_liabilities",
            Self::TotalNonCurrentLiabilities => "total_non_current_liabilities",
            Self::TotalLiabilities => "total_liabilities",
            Self::TotalEquity => "total_equity",
            Self::CashAndEquivalents => "cash_and_equivalents",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::InvestingCashFlow => "investing_cash_flow",
            Self::FinancingCashFlow => "financing_cash_flow",
            Self::CapitalExpenditure => "capital_expenditure",
            Self::FreeCashFlow => "free_cash_flow",
            Self::CurrentRatio => "current_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::GrossProfitMargin => "gross_profit_margin",
            Self::OperatingProfitMargin => "operating_profit_margin",
            Self::NetProfitMargin => "net_profit_margin",
            Self::ReturnOnAssets => "return_on_assets",
            Self::ReturnOnEquity => "return_on_equity",
            Self::DebtEquityRatio => "debt_equity_ratio",
            Self::PriceEarningsRatio => "price_earnings_ratio",
            Self::PriceToBookRatio => "price_to_book_ratio",
            Self::PriceToSalesRatio => "price_to_sales_ratio",
            Self::DividendYield => "dividend_yield",
            Self::PayoutRatio => "payout_ratio",
            Self::MarketCap => "market_cap",
            Self::Beta => "beta",
            Self::EarningsPerShare => "earnings_per_share",
            Self::WorkingCapital => "working_capital",
            Self::Close => "close",
            Self::AdjustedClose => "adjusted_close",
        }
    }
}

impl Display for LineItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive company attribute carried by overview records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Exchange,
    Sector,
    Industry,
}

impl ProfileField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Exchange => "exchange",
            Self::Sector => "sector",
            Self::Industry => "industry",
        }
    }
}

impl Display for ProfileField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric value of a line item, or an explicit marker that the provider
/// listed the field without a usable number.
///
/// Serialized as a JSON number, or `null` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum LineValue {
    Reported(f64),
    Unavailable,
}

impl LineValue {
    pub const fn is_unavailable(self) -> bool {
        matches!(self, Self::Unavailable)
    }

    pub const fn as_f64(self) -> Option<f64> {
        match self {
            Self::Reported(value) => Some(value),
            Self::Unavailable => None,
        }
    }
}

impl From<Option<f64>> for LineValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(value) if value.is_finite() => Self::Reported(value),
            _ => Self::Unavailable,
        }
    }
}

impl From<LineValue> for Option<f64> {
    fn from(value: LineValue) -> Self {
        value.as_f64()
    }
}

/// Line items of one earlier reporting period (or month, for price history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    period_end: Option<FiscalDate>,
    line_items: BTreeMap<LineItem, LineValue>,
}

impl PeriodSnapshot {
    pub fn new(period_end: Option<FiscalDate>, line_items: BTreeMap<LineItem, LineValue>) -> Self {
        Self {
            period_end,
            line_items,
        }
    }

    pub const fn period_end(&self) -> Option<FiscalDate> {
        self.period_end
    }

    pub fn get(&self, item: LineItem) -> Option<LineValue> {
        self.line_items.get(&item).copied()
    }
}

/// Provider-agnostic normalized financial statement for one ticker and period.
///
/// The top-level line items describe the latest period. `history` holds the
/// periods before it, newest first. Records are immutable once built; the
/// coordinator hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    ticker: TickerSymbol,
    statement_type: StatementType,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<Period>,
    source: ProviderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fiscal_period_end: Option<FiscalDate>,
    retrieved_at: UtcDateTime,
    line_items: BTreeMap<LineItem, LineValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    profile: BTreeMap<ProfileField, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    history: Vec<PeriodSnapshot>,
}

impl CanonicalRecord {
    pub fn builder(
        ticker: TickerSymbol,
        statement_type: StatementType,
        period: Option<Period>,
        source: ProviderId,
    ) -> CanonicalRecordBuilder {
        CanonicalRecordBuilder {
            record: Self {
                ticker,
                statement_type,
                period,
                source,
                currency: None,
                fiscal_period_end: None,
                retrieved_at: UtcDateTime::now(),
                line_items: BTreeMap::new(),
                profile: BTreeMap::new(),
                history: Vec::new(),
            },
        }
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

    /// Provider that produced the data.
    pub const fn source(&self) -> ProviderId {
        self.source
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub const fn fiscal_period_end(&self) -> Option<FiscalDate> {
        self.fiscal_period_end
    }

    pub const fn retrieved_at(&self) -> UtcDateTime {
        self.retrieved_at
    }

    /// `None` when the provider does not report this item at all.
    pub fn get(&self, item: LineItem) -> Option<LineValue> {
        self.line_items.get(&item).copied()
    }

    pub fn line_items(&self) -> impl Iterator<Item = (LineItem, LineValue)> + '_ {
        self.line_items.iter().map(|(item, value)| (*item, *value))
    }

    pub fn unavailable_items(&self) -> Vec<LineItem> {
        self.line_items
            .iter()
            .filter(|(_, value)| value.is_unavailable())
            .map(|(item, _)| *item)
            .collect()
    }

    pub fn profile(&self, field: ProfileField) -> Option<&str> {
        self.profile.get(&field).map(String::as_str)
    }

    /// Periods preceding the latest one, newest first.
    pub fn history(&self) -> &[PeriodSnapshot] {
        &self.history
    }

    /// Every reported value of `item`, latest period first.
    pub fn series(&self, item: LineItem) -> Vec<(Option<FiscalDate>, LineValue)> {
        let latest = self.get(item).map(|value| (self.fiscal_period_end, value));
        latest
            .into_iter()
            .chain(
                self.history
                    .iter()
                    .filter_map(|snapshot| snapshot.get(item).map(|value| (snapshot.period_end, value))),
            )
            .collect()
    }

    /// Percent change of `item` from the previous period to the latest one.
    ///
    /// The change is measured against the magnitude of the previous value so a
    /// loss shrinking toward zero reads as an improvement. `None` when either
    /// value is missing or unavailable, or the previous value is zero.
    pub fn period_change_percent(&self, item: LineItem) -> Option<f64> {
        let latest = self.get(item)?.as_f64()?;
        let previous = self.history.first()?.get(item)?.as_f64()?;
        if previous == 0.0 {
            return None;
        }
        Some((latest - previous) / previous.abs() * 100.0)
    }
}

/// Staged construction used by the normalizer.
#[derive(Debug)]
pub struct CanonicalRecordBuilder {
    record: CanonicalRecord,
}

impl CanonicalRecordBuilder {
    pub fn currency(mut self, currency: Option<&str>) -> Result<Self, ValidationError> {
        self.record.currency = currency.map(validate_currency_code).transpose()?;
        Ok(self)
    }

    pub fn fiscal_period_end(mut self, date: Option<FiscalDate>) -> Self {
        self.record.fiscal_period_end = date;
        self
    }

    pub fn retrieved_at(mut self, retrieved_at: UtcDateTime) -> Self {
        self.record.retrieved_at = retrieved_at;
        self
    }

    pub fn line_item(mut self, item: LineItem, value: LineValue) -> Self {
        self.record.line_items.insert(item, value);
        self
    }

    /// Blank text is ignored.
    pub fn profile(mut self, field: ProfileField, value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() {
            self.record.profile.insert(field, value.to_owned());
        }
        self
    }

    pub fn history(mut self, history: Vec<PeriodSnapshot>) -> Self {
        self.record.history = history;
        self
    }

    pub fn build(self) -> CanonicalRecord {
        self.record
    }
}

/// Validate and normalize currency to uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}
