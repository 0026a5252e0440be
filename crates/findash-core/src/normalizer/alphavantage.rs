use serde_json::Value;

use super::{CanonicalFields, FieldMapping, ReportRow, TextMapping};
use crate::data_source::AlphaVantagePayload;
use crate::{LineItem, Period, ProfileField, ProviderId, StatementRequest, StatementType};

pub(crate) const MONTHLY_SERIES_KEY: &str = "Monthly Adjusted Time Series";

const QUOTE: &[FieldMapping] = &[
    FieldMapping::required(LineItem::Price, &["05. price"]),
    FieldMapping::optional(LineItem::Open, &["02. open"]),
    FieldMapping::optional(LineItem::DayHigh, &["03. high"]),
    FieldMapping::optional(LineItem::DayLow, &["04. low"]),
    FieldMapping::optional(LineItem::PreviousClose, &["08. previous close"]),
    FieldMapping::optional(LineItem::Change, &["09. change"]),
    FieldMapping::optional(LineItem::ChangePercent, &["10. change percent"]),
    FieldMapping::optional(LineItem::Volume, &["06. volume"]),
];

const INCOME: &[FieldMapping] = &[
    FieldMapping::required(LineItem::Revenue, &["totalRevenue"]),
    FieldMapping::optional(
        LineItem::CostOfRevenue,
        &["costOfRevenue", "costofGoodsAndServicesSold"],
    ),
    FieldMapping::optional(LineItem::GrossProfit, &["grossProfit"]),
    FieldMapping::optional(LineItem::OperatingExpenses, &["operatingExpenses"]),
    FieldMapping::optional(LineItem::OperatingIncome, &["operatingIncome"]),
    FieldMapping::optional(LineItem::OtherIncomeExpenses, &["otherNonOperatingIncome"]),
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
    FieldMapping::required(LineItem::TotalEquity, &["totalShareholderEquity"]),
    FieldMapping::optional(
        LineItem::CashAndEquivalents,
        &["cashAndCashEquivalentsAtCarryingValue", "cashAndShortTermInvestments"],
    ),
];

const CASH_FLOW: &[FieldMapping] = &[
    FieldMapping::required(LineItem::OperatingCashFlow, &["operatingCashflow"]),
    FieldMapping::optional(LineItem::InvestingCashFlow, &["cashflowFromInvestment"]),
    FieldMapping::optional(LineItem::FinancingCashFlow, &["cashflowFromFinancing"]),
    FieldMapping::optional(LineItem::CapitalExpenditure, &["capitalExpenditures"]),
];

// OVERVIEW reports trailing-twelve-month figures only, so the ratio and key
// metric tables serve `Period::Ttm` requests alone.
const RATIOS: &[FieldMapping] = &[
    FieldMapping::optional(LineItem::OperatingProfitMargin, &["OperatingMarginTTM"]),
    FieldMapping::required(LineItem::NetProfitMargin, &["ProfitMargin"]),
    FieldMapping::optional(LineItem::ReturnOnAssets, &["ReturnOnAssetsTTM"]),
    FieldMapping::required(LineItem::ReturnOnEquity, &["ReturnOnEquityTTM"]),
    FieldMapping::required(LineItem::PriceEarningsRatio, &["PERatio", "TrailingPE"]),
    FieldMapping::optional(LineItem::PriceToBookRatio, &["PriceToBookRatio"]),
    FieldMapping::optional(LineItem::PriceToSalesRatio, &["PriceToSalesRatioTTM"]),
    FieldMapping::optional(LineItem::DividendYield, &["DividendYield"]),
];

const KEY_METRICS: &[FieldMapping] = &[
    FieldMapping::required(LineItem::MarketCap, &["MarketCapitalization"]),
    FieldMapping::optional(LineItem::PriceEarningsRatio, &["PERatio"]),
    FieldMapping::optional(LineItem::ReturnOnEquity, &["ReturnOnEquityTTM"]),
    FieldMapping::optional(LineItem::DividendYield, &["DividendYield"]),
];

const OVERVIEW: &[FieldMapping] = &[
    FieldMapping::required(LineItem::MarketCap, &["MarketCapitalization"]),
    FieldMapping::optional(LineItem::PriceEarningsRatio, &["PERatio"]),
    FieldMapping::optional(LineItem::DividendYield, &["DividendYield"]),
    FieldMapping::optional(LineItem::NetProfitMargin, &["ProfitMargin"]),
    FieldMapping::optional(LineItem::Beta, &["Beta"]),
    FieldMapping::optional(LineItem::EarningsPerShare, &["EPS", "DilutedEPSTTM"]),
];

const PROFILE: &[TextMapping] = &[
    TextMapping::new(ProfileField::Name, &["Name"]),
    TextMapping::new(ProfileField::Exchange, &["Exchange"]),
    TextMapping::new(ProfileField::Sector, &["Sector"]),
    TextMapping::new(ProfileField::Industry, &["Industry"]),
];

const PRICE_HISTORY: &[FieldMapping] = &[
    FieldMapping::required(LineItem::Close, &["4. close"]),
    FieldMapping::optional(LineItem::AdjustedClose, &["5. adjusted close"]),
    FieldMapping::optional(LineItem::Volume, &["6. volume"]),
];

impl CanonicalFields for AlphaVantagePayload {
    const PROVIDER: ProviderId = ProviderId::Alphavantage;

    fn supports(statement_type: StatementType, period: Option<Period>) -> bool {
        match statement_type {
            StatementType::Ratios | StatementType::KeyMetrics => period == Some(Period::Ttm),
            _ => true,
        }
    }

    fn reports(&self, req: &StatementRequest) -> Vec<ReportRow<'_>> {
        match req.statement_type() {
            StatementType::Quote => self
                .body
                .get("Global Quote")
                .and_then(Value::as_object)
                .map(ReportRow::new)
                .into_iter()
                .collect(),
            StatementType::Ratios | StatementType::KeyMetrics | StatementType::Overview => self
                .body
                .as_object()
                .map(ReportRow::new)
                .into_iter()
                .collect(),
            StatementType::PriceHistory => {
                let Some(series) = self.body.get(MONTHLY_SERIES_KEY).and_then(Value::as_object)
                else {
                    return Vec::new();
                };
                // ISO date keys sort chronologically as text.
                let mut rows = series
                    .iter()
                    .filter_map(|(date, row)| {
                        row.as_object().map(|fields| ReportRow {
                            fields,
                            period_key: Some(date.as_str()),
                        })
                    })
                    .collect::<Vec<_>>();
                rows.sort_by(|left, right| right.period_key.cmp(&left.period_key));
                rows
            }
            StatementType::Income | StatementType::BalanceSheet | StatementType::CashFlow => {
                let key = match req.period() {
                    Some(Period::Quarterly) => "quarterlyReports",
                    _ => "annualReports",
                };
                self.body
                    .get(key)
                    .and_then(Value::as_array)
                    .map(|rows| {
                        rows.iter()
                            .filter_map(Value::as_object)
                            .map(ReportRow::new)
                            .collect()
                    })
                    .unwrap_or_default()
            }
        }
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
            StatementType::PriceHistory => PRICE_HISTORY,
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
            StatementType::Ratios | StatementType::KeyMetrics | StatementType::Overview => {
                &["Currency"]
            }
            _ => &["reportedCurrency"],
        }
    }

    fn fiscal_date_keys(statement_type: StatementType) -> &'static [&'static str] {
        match statement_type {
            StatementType::Quote | StatementType::Overview | StatementType::PriceHistory => &[],
            StatementType::Ratios | StatementType::KeyMetrics => &["LatestQuarter"],
            _ => &["fiscalDateEnding"],
        }
    }
}
