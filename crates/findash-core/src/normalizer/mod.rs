//! Provider payload → [`CanonicalRecord`] translation.
//!
//! Each provider payload type implements [`CanonicalFields`]: where its
//! latest report lives, which upstream keys feed which [`LineItem`], and
//! which of those are required. Extraction itself is shared.

mod alphavantage;
mod fmp;

pub(crate) use alphavantage::MONTHLY_SERIES_KEY;

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::data_source::{AlphaVantagePayload, FmpPayload, ProviderResult};
use crate::{
    CanonicalRecord, FiscalDate, LineItem, LineValue, Period, PeriodSnapshot, ProfileField,
    ProviderId, StatementRequest, StatementType, UtcDateTime, ValidationError,
};

/// Why a provider payload could not become a canonical record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{provider} response is missing required fields: {}", join_items(.missing))]
    SchemaMismatch {
        provider: ProviderId,
        missing: Vec<LineItem>,
    },

    #[error("{provider} response contains no report for the requested period")]
    MissingReport { provider: ProviderId },

    #[error("{provider} does not report {statement_type} for period {}", display_period(*.period))]
    Unsupported {
        provider: ProviderId,
        statement_type: StatementType,
        period: Option<Period>,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl NormalizeError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => "normalize.schema_mismatch",
            Self::MissingReport { .. } => "normalize.missing_report",
            Self::Unsupported { .. } => "normalize.unsupported",
            Self::Validation(_) => "normalize.validation",
        }
    }

    pub const fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }
}

fn join_items(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|item| item.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_period(period: Option<Period>) -> &'static str {
    period.map_or("none", Period::as_str)
}

/// Upstream key aliases feeding one canonical line item.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldMapping {
    pub item: LineItem,
    pub keys: &'static [&'static str],
    pub required: bool,
}

impl FieldMapping {
    pub(crate) const fn required(item: LineItem, keys: &'static [&'static str]) -> Self {
        Self {
            item,
            keys,
            required: true,
        }
    }

    pub(crate) const fn optional(item: LineItem, keys: &'static [&'static str]) -> Self {
        Self {
            item,
            keys,
            required: false,
        }
    }
}

/// Upstream key aliases feeding one profile text field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextMapping {
    pub field: ProfileField,
    pub keys: &'static [&'static str],
}

impl TextMapping {
    pub(crate) const fn new(field: ProfileField, keys: &'static [&'static str]) -> Self {
        Self { field, keys }
    }
}

/// One report object inside a payload.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReportRow<'a> {
    pub fields: &'a Map<String, Value>,
    /// Period end for payloads that key rows by date instead of carrying a
    /// date field.
    pub period_key: Option<&'a str>,
}

impl<'a> ReportRow<'a> {
    pub(crate) const fn new(fields: &'a Map<String, Value>) -> Self {
        Self {
            fields,
            period_key: None,
        }
    }
}

/// Fixed extraction contract every provider payload satisfies.
pub(crate) trait CanonicalFields {
    const PROVIDER: ProviderId;

    /// Whether the provider publishes this statement type for this period.
    fn supports(statement_type: StatementType, period: Option<Period>) -> bool;

    /// Report objects matching the request, newest first.
    fn reports(&self, req: &StatementRequest) -> Vec<ReportRow<'_>>;

    fn fields(statement_type: StatementType) -> &'static [FieldMapping];

    fn profile_fields(_statement_type: StatementType) -> &'static [TextMapping] {
        &[]
    }

    fn currency_keys(statement_type: StatementType) -> &'static [&'static str];

    fn fiscal_date_keys(statement_type: StatementType) -> &'static [&'static str];
}

/// Whether `provider` can answer `req` at all. Checked before any request is sent.
pub(crate) fn provider_supports(provider: ProviderId, req: &StatementRequest) -> bool {
    match provider {
        ProviderId::Fmp => FmpPayload::supports(req.statement_type(), req.period()),
        ProviderId::Alphavantage => {
            AlphaVantagePayload::supports(req.statement_type(), req.period())
        }
    }
}

/// Translate one provider result into a canonical record.
///
/// The newest report fills the record's line items and must carry every
/// required field. Up to [`StatementType::history_depth`] earlier reports
/// become [`PeriodSnapshot`]s without the required-field check.
///
/// # Errors
///
/// Returns [`NormalizeError::Unsupported`] when the provider does not publish
/// the requested statement type for the requested period,
/// [`NormalizeError::SchemaMismatch`] when a required line item is absent
/// under every alias, [`NormalizeError::MissingReport`] when the payload holds
/// no report for the request, and [`NormalizeError::Validation`] for a
/// malformed currency or date.
pub fn normalize(
    result: ProviderResult,
    req: &StatementRequest,
    retrieved_at: UtcDateTime,
) -> Result<CanonicalRecord, NormalizeError> {
    match &result {
        ProviderResult::Fmp(payload) => extract(payload, req, retrieved_at),
        ProviderResult::AlphaVantage(payload) => extract(payload, req, retrieved_at),
    }
}

fn extract<P: CanonicalFields>(
    payload: &P,
    req: &StatementRequest,
    retrieved_at: UtcDateTime,
) -> Result<CanonicalRecord, NormalizeError> {
    let statement_type = req.statement_type();
    if !P::supports(statement_type, req.period()) {
        return Err(NormalizeError::Unsupported {
            provider: P::PROVIDER,
            statement_type,
            period: req.period(),
        });
    }

    let rows = payload.reports(req);
    let (latest, earlier) = rows.split_first().ok_or(NormalizeError::MissingReport {
        provider: P::PROVIDER,
    })?;

    let mut builder = CanonicalRecord::builder(
        req.ticker().clone(),
        statement_type,
        req.period(),
        P::PROVIDER,
    )
    .retrieved_at(retrieved_at);

    let mut missing = Vec::new();
    for mapping in P::fields(statement_type) {
        match lookup(latest.fields, mapping.keys) {
            Some(raw) => builder = builder.line_item(mapping.item, read_value(raw)),
            None if mapping.required => missing.push(mapping.item),
            None => {}
        }
    }

    if !missing.is_empty() {
        debug!(provider = %P::PROVIDER, request = %req, ?missing, "required fields absent");
        return Err(NormalizeError::SchemaMismatch {
            provider: P::PROVIDER,
            missing,
        });
    }

    for mapping in P::profile_fields(statement_type) {
        if let Some(text) = lookup_text(latest.fields, mapping.keys) {
            builder = builder.profile(mapping.field, text);
        }
    }

    let history = earlier
        .iter()
        .take(statement_type.history_depth().saturating_sub(1))
        .map(|row| snapshot::<P>(row, statement_type))
        .collect::<Result<Vec<_>, _>>()?;

    let currency = lookup_text(latest.fields, P::currency_keys(statement_type));
    let fiscal_period_end = period_end::<P>(latest, statement_type)?;

    Ok(builder
        .currency(currency)?
        .fiscal_period_end(fiscal_period_end)
        .history(history)
        .build())
}

fn snapshot<P: CanonicalFields>(
    row: &ReportRow<'_>,
    statement_type: StatementType,
) -> Result<PeriodSnapshot, NormalizeError> {
    let line_items = P::fields(statement_type)
        .iter()
        .filter_map(|mapping| {
            lookup(row.fields, mapping.keys).map(|raw| (mapping.item, read_value(raw)))
        })
        .collect::<BTreeMap<_, _>>();

    Ok(PeriodSnapshot::new(
        period_end::<P>(row, statement_type)?,
        line_items,
    ))
}

fn period_end<P: CanonicalFields>(
    row: &ReportRow<'_>,
    statement_type: StatementType,
) -> Result<Option<FiscalDate>, NormalizeError> {
    let text = row
        .period_key
        .or_else(|| lookup_text(row.fields, P::fiscal_date_keys(statement_type)));
    Ok(text.map(FiscalDate::parse).transpose()?)
}

fn lookup<'a>(report: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| report.get(*key))
}

/// Text metadata (currency, dates); placeholder values count as absent.
fn lookup_text<'a>(report: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    lookup(report, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !is_placeholder(text))
}

fn read_value(raw: &Value) -> LineValue {
    match raw {
        Value::Number(number) => number.as_f64().into(),
        Value::String(text) => parse_text(text),
        _ => LineValue::Unavailable,
    }
}

fn parse_text(text: &str) -> LineValue {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    if is_placeholder(trimmed) {
        return LineValue::Unavailable;
    }
    trimmed.parse::<f64>().ok().into()
}

fn is_placeholder(text: &str) -> bool {
    matches!(text, "" | "-" | "None" | "none" | "null" | "N/A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TickerSymbol;
    use serde_json::json;

    fn request(statement: StatementType, period: Option<Period>) -> StatementRequest {
        StatementRequest::new(
            TickerSymbol::parse("AAPL").expect("valid"),
            statement,
            period,
        )
        .expect("valid request")
    }

    fn fixed_time() -> UtcDateTime {
        UtcDateTime::parse("2024-11-01T12:00:00Z").expect("valid")
    }

    #[test]
    fn text_values_follow_placeholder_rules() {
        assert_eq!(parse_text("185.2000"), LineValue::Reported(185.2));
        assert_eq!(parse_text("0.5346%"), LineValue::Reported(0.5346));
        assert_eq!(parse_text("None"), LineValue::Unavailable);
        assert_eq!(parse_text("-"), LineValue::Unavailable);
        assert_eq!(parse_text(""), LineValue::Unavailable);
        assert_eq!(parse_text("n/a-ish"), LineValue::Unavailable);
        assert_eq!(read_value(&Value::Null), LineValue::Unavailable);
        assert_eq!(read_value(&json!(0)), LineValue::Reported(0.0));
    }

    #[test]
    fn complete_fmp_income_has_no_unavailable_items() {
        let payload = ProviderResult::Fmp(FmpPayload {
            body: json!([{
                "date": "2024-09-28",
                "symbol": "AAPL",
                "reportedCurrency": "USD",
                "revenue": 391035000000_i64,
                "costOfRevenue": 210352000000_i64,
                "grossProfit": 180683000000_i64,
                "operatingExpenses": 57467000000_i64,
                "operatingIncome": 123216000000_i64,
                "totalOtherIncomeExpensesNet": 269000000,
                "incomeBeforeTax": 123485000000_i64,
                "incomeTaxExpense": 29749000000_i64,
                "netIncome": 93736000000_i64,
                "ebitda": 134661000000_i64
            }]),
        });

        let record = normalize(payload, &request(StatementType::Income, None), fixed_time())
            .expect("complete payload");

        assert!(record.unavailable_items().is_empty());
        assert_eq!(record.source(), ProviderId::Fmp);
        assert_eq!(record.currency(), Some("USD"));
        assert_eq!(
            record.fiscal_period_end().map(FiscalDate::format_iso).as_deref(),
            Some("2024-09-28")
        );
        assert_eq!(record.get(LineItem::NetIncome), Some(LineValue::Reported(93_736_000_000.0)));
        assert_eq!(record.line_items().count(), 10);
    }

    #[test]
    fn null_optional_field_becomes_unavailable_and_absent_one_is_omitted() {
        let payload = ProviderResult::Fmp(FmpPayload {
            body: json!([{ "price": 189.84, "open": null }]),
        });

        let record = normalize(payload, &request(StatementType::Quote, None), fixed_time())
            .expect("price present");

        assert_eq!(record.get(LineItem::Price), Some(LineValue::Reported(189.84)));
        assert_eq!(record.get(LineItem::Open), Some(LineValue::Unavailable));
        assert_eq!(record.get(LineItem::Volume), None);
        assert_eq!(record.unavailable_items(), vec![LineItem::Open]);
    }

    #[test]
    fn missing_required_fields_are_named() {
        let payload = ProviderResult::Fmp(FmpPayload {
            body: json!([{ "date": "2024-09-28", "totalAssets": 1.0 }]),
        });

        let error = normalize(payload, &request(StatementType::BalanceSheet, None), fixed_time())
            .expect_err("liabilities and equity missing");

        assert_eq!(
            error,
            NormalizeError::SchemaMismatch {
                provider: ProviderId::Fmp,
                missing: vec![LineItem::TotalLiabilities, LineItem::TotalEquity],
            }
        );
        assert!(error.is_schema_mismatch());
        assert_eq!(error.code(), "normalize.schema_mismatch");
    }

    #[test]
    fn required_field_present_as_null_is_not_a_mismatch() {
        let payload = ProviderResult::AlphaVantage(AlphaVantagePayload {
            body: json!({ "Global Quote": { "05. price": "None" } }),
        });

        let record = normalize(payload, &request(StatementType::Quote, None), fixed_time())
            .expect("key present");

        assert_eq!(record.get(LineItem::Price), Some(LineValue::Unavailable));
    }

    #[test]
    fn alphavantage_period_selects_report_array() {
        let body = json!({
            "symbol": "AAPL",
            "annualReports": [{
                "fiscalDateEnding": "2024-09-30",
                "reportedCurrency": "USD",
                "operatingCashflow": "118254000000",
                "cashflowFromInvestment": "2935000000",
                "cashflowFromFinancing": "None",
                "capitalExpenditures": "9447000000"
            }],
            "quarterlyReports": [{
                "fiscalDateEnding": "2024-12-31",
                "reportedCurrency": "USD",
                "operatingCashflow": "29935000000"
            }]
        });

        let annual = normalize(
            ProviderResult::AlphaVantage(AlphaVantagePayload { body: body.clone() }),
            &request(StatementType::CashFlow, Some(Period::Annual)),
            fixed_time(),
        )
        .expect("annual");
        let quarterly = normalize(
            ProviderResult::AlphaVantage(AlphaVantagePayload { body }),
            &request(StatementType::CashFlow, Some(Period::Quarterly)),
            fixed_time(),
        )
        .expect("quarterly");

        assert_eq!(
            annual.get(LineItem::OperatingCashFlow),
            Some(LineValue::Reported(118_254_000_000.0))
        );
        assert_eq!(annual.get(LineItem::FinancingCashFlow), Some(LineValue::Unavailable));
        assert_eq!(
            quarterly.fiscal_period_end().map(FiscalDate::format_iso).as_deref(),
            Some("2024-12-31")
        );
        assert_eq!(quarterly.period(), Some(Period::Quarterly));
    }

    #[test]
    fn empty_report_list_is_missing_report() {
        let payload = ProviderResult::AlphaVantage(AlphaVantagePayload {
            body: json!({ "symbol": "AAPL", "annualReports": [] }),
        });

        let error = normalize(payload, &request(StatementType::Income, None), fixed_time())
            .expect_err("no reports");

        assert_eq!(
            error,
            NormalizeError::MissingReport {
                provider: ProviderId::Alphavantage
            }
        );
    }

    #[test]
    fn malformed_currency_is_a_validation_error() {
        let payload = ProviderResult::Fmp(FmpPayload {
            body: json!([{
                "reportedCurrency": "DOLLARS",
                "revenue": 1.0,
                "netIncome": 1.0
            }]),
        });

        let error = normalize(payload, &request(StatementType::Income, None), fixed_time())
            .expect_err("bad currency");

        assert_eq!(error.code(), "normalize.validation");
    }

    #[test]
    fn earlier_rows_become_history_and_feed_period_change() {
        let payload = ProviderResult::Fmp(FmpPayload {
            body: json!([
                { "date": "2024-09-28", "reportedCurrency": "USD", "revenue": 391.0, "netIncome": 93.7 },
                { "date": "2023-09-30", "reportedCurrency": "USD", "revenue": 383.0, "netIncome": 97.0 },
                { "date": "2022-09-24", "reportedCurrency": "USD", "revenue": 394.3 }
            ]),
        });

        let record = normalize(payload, &request(StatementType::Income, None), fixed_time())
            .expect("latest row is complete");

        assert_eq!(record.history().len(), 2);
        assert_eq!(
            record.history()[1].period_end().map(FiscalDate::format_iso).as_deref(),
            Some("2022-09-24")
        );
        assert_eq!(record.history()[1].get(LineItem::NetIncome), None);
        let change = record
            .period_change_percent(LineItem::Revenue)
            .expect("both periods report revenue");
        assert!((change - (391.0 - 383.0) / 383.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn history_is_capped_at_statement_depth() {
        let rows = (0..8)
            .map(|offset| json!({ "date": format!("{}-12-31", 2024 - offset), "revenue": 1.0, "netIncome": 1.0 }))
            .collect::<Vec<_>>();
        let payload = ProviderResult::Fmp(FmpPayload {
            body: Value::Array(rows),
        });

        let record = normalize(payload, &request(StatementType::Income, None), fixed_time())
            .expect("record");

        assert_eq!(record.history().len(), StatementType::Income.history_depth() - 1);
    }

    #[test]
    fn unsupported_statement_period_pair_is_rejected_before_extraction() {
        let payload = ProviderResult::AlphaVantage(AlphaVantagePayload {
            body: json!({ "Symbol": "IBM", "PERatio": "22.8", "ProfitMargin": "0.09", "ReturnOnEquityTTM": "0.2" }),
        });

        let error = normalize(
            payload,
            &request(StatementType::Ratios, Some(Period::Annual)),
            fixed_time(),
        )
        .expect_err("overview data is trailing twelve months only");

        assert_eq!(error.code(), "normalize.unsupported");
        assert!(!provider_supports(
            ProviderId::Alphavantage,
            &request(StatementType::Ratios, Some(Period::Quarterly))
        ));
        assert!(provider_supports(
            ProviderId::Alphavantage,
            &request(StatementType::Ratios, Some(Period::Ttm))
        ));
        assert!(!provider_supports(
            ProviderId::Fmp,
            &request(StatementType::PriceHistory, None)
        ));
    }
}
