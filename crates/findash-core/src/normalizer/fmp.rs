use serde_json::Value;

use super::{CanonicalFields, FieldMapping, ReportRow, TextMapping};
use crate::data_source::FmpPayload;
use crate::{LineItem, Period, ProfileField, ProviderId, StatementRequest, StatementType};

const QUOTE: &[FieldMapping] = &[
    FieldMapping::required(LineItem::Price, &["price"]),
    FieldMapping::optional(LineItem::Open, &["open"]),
    FieldMapping::optional(LineItem::DayHigh, &["dayHigh"]),
    FieldMapping::optional(LineItem::DayLow, &["dayLow"]),
    FieldMapping::optional(LineItem::PreviousClose, &["previousClose"]),
    FieldMapping::optional(LineItem::Change, &["change"]),
    FieldMapping::optional(LineItem::ChangePercent, &["changesPercentage", "changePercentage"]),
    FieldMapping::optional(LineItem::Volume, &["volume"]),
];

const INCOME: &[FieldMapping] = &[
    FieldMapping::required(LineItem::Revenue, &["revenue"]),
    FieldMapping::optional(LineItem::CostOfRevenue, &["costOfRevenue"]),
    FieldMapping::optional(LineItem::GrossProfit, &["grossProfit"]),
    FieldMapping::optional(LineItem::OperatingExpenses, &["operatingExpenses"]),
    FieldMapping::optional(LineItem::OperatingIncome, &["operatingIncome"]),
    FieldMapping::optional(LineItem::OtherIncomeExpenses, &["totalOtherIncomeExpensesNet"]),
    FieldMapping::optional(LineItem::IncomeBeforeTax, &["incomeBeforeTax"]),
    FieldMapping::optional(LineItem::IncomeTaxExpense, &["incomeTaxExpense"]),
    FieldMapping::required(LineItem::NetIncome, &["netIncome"]),
    FieldMapping::optional(LineItem::Ebitda, &["ebitda"]),
];

const BALANCE_SHEET: &[FieldMapping] = &[
    FieldMapping::required(LineItem::TotalAssets, &["totalAssets"]),
    FieldMapping::optional(LineItem::TotalCurrentAssets, &["totalCurrentAssets"]),
    FieldMapping::optional(LineItem::TotalNonCurrentAssets, &["totalNonCurrentAssets"]),
    FieldMapping::optional(LineItem::TotalCurrentLiabilities, &["totalCurrentLiabilities"]),
    FieldMapping::optional(LineItem::TotalNonCurrentLiabilities, &["totalNonCurrentLiabilities"]),
    FieldMapping::required(LineItem::TotalLiabilities, &["totalLiabilities"]),
    FieldMapping::required(LineItem::TotalEquity, &["totalEquity", "totalStockholdersEquity"]),
    FieldMapping::optional(LineItem::CashAndEquivalents, &["cashAndCashEquivalents"]),
];

const CASH_FLOW: &[FieldMapping] = &[
    FieldMapping::required(
        LineItem::OperatingCashFlow,
        &["netCashProvidedByOperatingActivities", "operatingCashFlow"],
    ),
    FieldMapping::optional(
        LineItem::InvestingCashFlow,
        // FMP's own key carries the misspelling.
        &["netCashUsedForInvestingActivites", "netCashUsedForInvestingActivities"],
    ),
    FieldMapping::optional(
        LineItem::FinancingCashFlow,
        &["netCashUsedProvidedByFinancingActivities"],
    ),
    FieldMapping::optional(LineItem::CapitalExpenditure, &["capitalExpenditure"]),
    FieldMapping::optional(LineItem::FreeCashFlow, &["freeCashFlow"]),
];

// `/ratios-ttm` suffixes every key with `TTM`.
const RATIOS: &[FieldMapping] = &[
    FieldMapping::optional(LineItem::CurrentRatio, &["currentRatio", "currentRatioTTM"]),
    FieldMapping::optional(LineItem::QuickRatio, &["quickRatio", "quickRatioTTM"]),
    FieldMapping::optional(
        LineItem::GrossProfitMargin,
        &["grossProfitMargin", "grossProfitMarginTTM"],
    ),
    FieldMapping::optional(
        LineItem::OperatingProfitMargin,
        &["operatingProfitMargin", "operatingProfitMarginTTM"],
    ),
    FieldMapping::required(LineItem::NetProfitMargin, &["netProfitMargin", "netProfitMarginTTM"]),
    FieldMapping::optional(LineItem::ReturnOnAssets, &["returnOnAssets", "returnOnAssetsTTM"]),
    FieldMapping::required(LineItem::ReturnOnEquity, &["returnOnEquity", "returnOnEquityTTM"]),
    FieldMapping::optional(LineItem::DebtEquityRatio, &["debtEquityRatio", "debtEquityRatioTTM"]),
    FieldMapping::required(
        LineItem::PriceEarningsRatio,
        &["priceEarningsRatio", "priceEarningsRatioTTM", "peRatioTTM"],
    ),
    FieldMapping::optional(
        LineItem::PriceToBookRatio,
        &["priceToBookRatio", "priceToBookRatioTTM"],
    ),
    FieldMapping::optional(
        LineItem::PriceToSalesRatio,
        &["priceToSalesRatio", "priceToSalesRatioTTM"],
    ),
    FieldMapping::optional(
        LineItem::DividendYield,
        // The TTM endpoint drops the final "d".
        &["dividendYield", "dividendYielTTM", "dividendYieldTTM"],
    ),
    FieldMapping::optional(LineItem::PayoutRatio, &["payoutRatio", "payoutRatioTTM"]),
];

const KEY_METRICS: &[FieldMapping] = &[
    FieldMapping::required(LineItem::MarketCap, &["marketCap", "marketCapTTM"]),
    FieldMapping::optional(LineItem::WorkingCapital, &["workingCapital", "workingCapitalTTM"]),
    FieldMapping::optional(LineItem::DebtEquityRatio, &["debtToEquity", "debtToEquityTTM"]),
    FieldMapping::optional(LineItem::PriceEarningsRatio, &["peRatio", "peRatioTTM"]),
    FieldMapping::optional(LineItem::ReturnOnEquity, &["roe", "roeTTM"]),
    FieldMapping::optional(LineItem::DividendYield, &["dividendYield", "dividendYieldTTM"]),
];

const OVERVIEW: &[FieldMapping] = &[
    FieldMapping::required(LineItem::MarketCap, &["mktCap", "marketCap"]),
    FieldMapping::optional(LineItem::Price, &["price"]),
    FieldMapping::optional(LineItem::Beta, &["beta"]),
];

const PROFILE: &[TextMapping] = &[
    TextMapping::new(ProfileField::Name, &["companyName"]),
    TextMapping::new(ProfileField::Exchange, &["exchangeShortName", "exchange"]),
    TextMapping::new(ProfileField::Sector, &["sector"]),
    TextMapping::new(ProfileField::Industry, &["industry"]),
];

impl CanonicalFields for FmpPayload {
    const PROVIDER: ProviderId = ProviderId::Fmp;

    fn supports(statement_type: StatementType, period: Option<Period>) -> bool {
        match statement_type {
            StatementType::PriceHistory => false,
            _ => period != Some(Period::Ttm) || statement_type.supports_ttm(),
        }
    }

    // Rows come newest first; the request's period was applied upstream.
    fn reports(&self, _req: &StatementRequest) -> Vec<ReportRow<'_>> {
        self.body
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(Value::as_object)
                    .map(ReportRow::new)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn fields(statement_type: StatementType) -> &'static [FieldMapping] {
        match statement_type {
            StatementType::Quote => QUOTE,
            StatementType::Income => INCOME,
            StatementType::BalanceSheet => BALANCE_SHEET,
            StatementType::CashFlow => CASH_FLOW,
            StatementType::Ratios => RATIOS,
            StatementType::KeyMetrics => KEY_METRICS,
            StatementType::Overview => OVERVIEW,
            StatementType::PriceHistory => &[],
        }
    }

    fn profile_fields(statement_type: StatementType) -> &'static [TextMapping] {
        match statement_type {
            StatementType::Overview => PROFILE,
            _ => &[],
        }
    }

    fn currency_keys(statement_type: StatementType) -> &'static [&'static str] {
        match statement_type {
            StatementType::Quote | StatementType::PriceHistory => &[],
            StatementType::Overview => &["currency"],
            _ => &["reportedCurrency"],
        }
    }

    fn fiscal_date_keys(statement_type: StatementType) -> &'static [&'static str] {
        match statement_type {
            StatementType::Quote | StatementType::Overview | StatementType::PriceHistory => &[],
            _ => &["date"],
        }
    }
}
