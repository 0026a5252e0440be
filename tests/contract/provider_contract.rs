//! Contract tests every provider adapter must satisfy: one upstream call per
//! fetch, keys passed as query parameters, and a payload that normalizes to a
//! record whose required line items are reported.

use std::sync::Arc;

use findash_core::{
    normalize, AlphaVantageAdapter, FmpAdapter, HttpResponse, LineItem, LineValue, MockHttpClient,
    Period, ProviderId, StatementRequest, StatementSource, StatementType, TickerSymbol,
    UtcDateTime,
};

const FMP_QUOTE: &str = r#"[{"symbol":"AAPL","name":"Apple Inc.","price":189.84,"changesPercentage":-0.5,"change":-0.95,"dayLow":188.5,"dayHigh":191.1,"open":190.2,"previousClose":190.79,"volume":52345678}]"#;
const FMP_INCOME: &str = r#"[{"date":"2024-09-28","symbol":"AAPL","reportedCurrency":"USD","revenue":391035000000,"costOfRevenue":210352000000,"grossProfit":180683000000,"operatingExpenses":57467000000,"operatingIncome":123216000000,"totalOtherIncomeExpensesNet":269000000,"incomeBeforeTax":123485000000,"incomeTaxExpense":29749000000,"netIncome":93736000000,"ebitda":134661000000}]"#;
const FMP_BALANCE: &str = r#"[{"date":"2024-09-28","reportedCurrency":"USD","totalAssets":364980000000,"totalCurrentAssets":152987000000,"totalNonCurrentAssets":211993000000,"totalCurrentLiabilities":176392000000,"totalNonCurrentLiabilities":131638000000,"totalLiabilities":308030000000,"totalStockholdersEquity":56950000000,"cashAndCashEquivalents":29943000000}]"#;
const FMP_CASH_FLOW: &str = r#"[{"date":"2024-09-28","reportedCurrency":"USD","netCashProvidedByOperatingActivities":118254000000,"netCashUsedForInvestingActivites":2935000000,"netCashUsedProvidedByFinancingActivities":-121983000000,"capitalExpenditure":-9447000000,"freeCashFlow":108807000000}]"#;
const FMP_RATIOS: &str = r#"[{"date":"2024-09-28","currentRatio":0.867,"quickRatio":0.826,"grossProfitMargin":0.462,"operatingProfitMargin":0.315,"netProfitMargin":0.24,"returnOnAssets":0.257,"returnOnEquity":1.646,"debtEquityRatio":1.872,"priceEarningsRatio":37.29,"priceToBookRatio":61.37,"priceToSalesRatio":8.94,"dividendYield":0.0044,"payoutRatio":0.162}]"#;
const FMP_KEY_METRICS: &str = r#"[{"date":"2024-09-28","marketCap":3495160329570,"workingCapital":-23405000000,"debtToEquity":1.872,"peRatio":37.29,"roe":1.646,"dividendYield":0.0044},{"date":"2023-09-30","marketCap":2676736798000,"workingCapital":-1742000000,"debtToEquity":1.79,"peRatio":28.28,"roe":1.56,"dividendYield":0.0055}]"#;
const FMP_RATIOS_TTM: &str = r#"[{"currentRatioTTM":0.867,"quickRatioTTM":0.826,"grossProfitMarginTTM":0.462,"operatingProfitMarginTTM":0.315,"netProfitMarginTTM":0.24,"returnOnAssetsTTM":0.257,"returnOnEquityTTM":1.646,"debtEquityRatioTTM":1.872,"peRatioTTM":37.29,"priceToBookRatioTTM":61.37,"priceToSalesRatioTTM":8.94,"dividendYielTTM":0.0044,"payoutRatioTTM":0.162}]"#;
const FMP_KEY_METRICS_TTM: &str = r#"[{"marketCapTTM":3495160329570,"workingCapitalTTM":-23405000000,"debtToEquityTTM":1.872,"peRatioTTM":37.29,"roeTTM":1.646,"dividendYieldTTM":0.0044}]"#;
const FMP_PROFILE: &str = r#"[{"symbol":"AAPL","companyName":"Apple Inc.","currency":"USD","exchangeShortName":"NASDAQ","sector":"Technology","industry":"Consumer Electronics","mktCap":3435062313000,"price":227.52,"beta":1.24}]"#;

const AV_QUOTE: &str = r#"{"Global Quote":{"01. symbol":"AAPL","02. open":"190.2000","03. high":"191.1000","04. low":"188.5000","05. price":"189.8400","06. volume":"52345678","07. latest trading day":"2024-11-01","08. previous close":"190.7900","09. change":"-0.9500","10. change percent":"-0.4979%"}}"#;
const AV_INCOME: &str = r#"{"symbol":"AAPL","annualReports":[{"fiscalDateEnding":"2024-09-30","reportedCurrency":"USD","grossProfit":"180683000000","totalRevenue":"391035000000","costOfRevenue":"210352000000","operatingIncome":"123216000000","operatingExpenses":"57467000000","incomeBeforeTax":"123485000000","incomeTaxExpense":"29749000000","ebitda":"134661000000","netIncome":"93736000000"}],"quarterlyReports":[]}"#;
const AV_BALANCE: &str = r#"{"symbol":"AAPL","annualReports":[{"fiscalDateEnding":"2024-09-30","reportedCurrency":"USD","totalAssets":"364980000000","totalCurrentAssets":"152987000000","cashAndCashEquivalentsAtCarryingValue":"29943000000","totalNonCurrentAssets":"211993000000","totalLiabilities":"308030000000","totalCurrentLiabilities":"176392000000","totalNonCurrentLiabilities":"131638000000","totalShareholderEquity":"56950000000"}],"quarterlyReports":[]}"#;
const AV_CASH_FLOW: &str = r#"{"symbol":"AAPL","annualReports":[{"fiscalDateEnding":"2024-09-30","reportedCurrency":"USD","operatingCashflow":"118254000000","capitalExpenditures":"9447000000","cashflowFromInvestment":"2935000000","cashflowFromFinancing":"-121983000000"}],"quarterlyReports":[]}"#;
const AV_OVERVIEW: &str = r#"{"Symbol":"AAPL","Name":"Apple Inc","Exchange":"NASDAQ","Sector":"TECHNOLOGY","Industry":"ELECTRONIC COMPUTERS","Currency":"USD","LatestQuarter":"2024-09-30","MarketCapitalization":"3435062313000","PERatio":"37.29","ProfitMargin":"0.24","OperatingMarginTTM":"0.315","ReturnOnAssetsTTM":"0.215","ReturnOnEquityTTM":"1.574","PriceToBookRatio":"61.37","PriceToSalesRatioTTM":"8.94","DividendYield":"0.0044","Beta":"1.24","EPS":"6.08"}"#;
const AV_MONTHLY: &str = r#"{"Meta Data":{"2. Symbol":"AAPL"},"Monthly Adjusted Time Series":{"2024-09-30":{"4. close":"233.0000","5. adjusted close":"232.7500","6. volume":"1232221620"},"2024-10-31":{"4. close":"225.9100","5. adjusted close":"225.6600","6. volume":"1040000000"},"2024-08-30":{"4. close":"229.0000","5. adjusted close":"228.5000","6. volume":"1300000000"}}}"#;

struct ProviderCase {
    id: ProviderId,
    source: Arc<dyn StatementSource>,
    client: MockHttpClient,
}

fn fmp_case() -> ProviderCase {
    let client = MockHttpClient::new()
        .on("/quote/", Ok(HttpResponse::ok_json(FMP_QUOTE)))
        .on("/income-statement/", Ok(HttpResponse::ok_json(FMP_INCOME)))
        .on("/balance-sheet-statement/", Ok(HttpResponse::ok_json(FMP_BALANCE)))
        .on("/cash-flow-statement/", Ok(HttpResponse::ok_json(FMP_CASH_FLOW)))
        .on("/ratios/", Ok(HttpResponse::ok_json(FMP_RATIOS)))
        .on("/ratios-ttm/", Ok(HttpResponse::ok_json(FMP_RATIOS_TTM)))
        .on("/key-metrics/", Ok(HttpResponse::ok_json(FMP_KEY_METRICS)))
        .on("/key-metrics-ttm/", Ok(HttpResponse::ok_json(FMP_KEY_METRICS_TTM)))
        .on("/profile/", Ok(HttpResponse::ok_json(FMP_PROFILE)));
    ProviderCase {
        id: ProviderId::Fmp,
        source: Arc::new(FmpAdapter::new(Arc::new(client.clone()), "fmp-secret")),
        client,
    }
}

fn alphavantage_case() -> ProviderCase {
    let client = MockHttpClient::new()
        .on("function=GLOBAL_QUOTE", Ok(HttpResponse::ok_json(AV_QUOTE)))
        .on("function=INCOME_STATEMENT", Ok(HttpResponse::ok_json(AV_INCOME)))
        .on("function=BALANCE_SHEET", Ok(HttpResponse::ok_json(AV_BALANCE)))
        .on("function=CASH_FLOW", Ok(HttpResponse::ok_json(AV_CASH_FLOW)))
        .on("function=OVERVIEW", Ok(HttpResponse::ok_json(AV_OVERVIEW)))
        .on(
            "function=TIME_SERIES_MONTHLY_ADJUSTED",
            Ok(HttpResponse::ok_json(AV_MONTHLY)),
        );
    ProviderCase {
        id: ProviderId::Alphavantage,
        source: Arc::new(AlphaVantageAdapter::new(Arc::new(client.clone()), "av-secret")),
        client,
    }
}

fn required_items(statement_type: StatementType) -> &'static [LineItem] {
    match statement_type {
        StatementType::Quote => &[LineItem::Price],
        StatementType::Income => &[LineItem::Revenue, LineItem::NetIncome],
        StatementType::BalanceSheet => &[
            LineItem::TotalAssets,
            LineItem::TotalLiabilities,
            LineItem::TotalEquity,
        ],
        StatementType::CashFlow => &[LineItem::OperatingCashFlow],
        StatementType::Ratios => &[
            LineItem::NetProfitMargin,
            LineItem::ReturnOnEquity,
            LineItem::PriceEarningsRatio,
        ],
        StatementType::KeyMetrics | StatementType::Overview => &[LineItem::MarketCap],
        StatementType::PriceHistory => &[LineItem::Close],
    }
}

fn request(statement_type: StatementType) -> StatementRequest {
    request_for(statement_type, None)
}

fn request_for(statement_type: StatementType, period: Option<Period>) -> StatementRequest {
    StatementRequest::new(
        TickerSymbol::parse("AAPL").expect("valid ticker"),
        statement_type,
        period,
    )
    .expect("valid request")
}

/// Each statement type with the default period, plus the trailing-twelve-month
/// variant where one exists, filtered to what `source` publishes.
fn supported_requests(source: &dyn StatementSource) -> Vec<StatementRequest> {
    StatementType::ALL
        .into_iter()
        .flat_map(|statement_type| {
            let ttm = statement_type
                .supports_ttm()
                .then(|| request_for(statement_type, Some(Period::Ttm)));
            std::iter::once(request(statement_type)).chain(ttm)
        })
        .filter(|req| source.supports(req))
        .collect()
}

#[tokio::test]
async fn every_provider_normalizes_every_supported_request() {
    for case in [fmp_case(), alphavantage_case()] {
        assert_eq!(case.source.id(), case.id);
        let requests = supported_requests(case.source.as_ref());

        for req in &requests {
            let statement_type = req.statement_type();
            let result = case
                .source
                .fetch(req)
                .await
                .unwrap_or_else(|error| panic!("{} {req}: {error}", case.id));
            assert_eq!(result.provider(), case.id);

            let record = normalize(result, req, UtcDateTime::now())
                .unwrap_or_else(|error| panic!("{} {req}: {error}", case.id));

            assert_eq!(record.ticker().as_str(), "AAPL");
            assert_eq!(record.statement_type(), statement_type);
            assert_eq!(record.period(), req.period());
            assert_eq!(record.source(), case.id);
            for item in required_items(statement_type) {
                assert!(
                    matches!(record.get(*item), Some(LineValue::Reported(_))),
                    "{} {req}: {item} should be reported",
                    case.id
                );
            }
        }

        assert_eq!(case.client.request_count(), requests.len());
    }
}

#[tokio::test]
async fn complete_payloads_carry_no_unavailable_markers() {
    for case in [fmp_case(), alphavantage_case()] {
        for req in supported_requests(case.source.as_ref()) {
            let result = case.source.fetch(&req).await.expect("scripted payload");
            let record = normalize(result, &req, UtcDateTime::now()).expect("normalizes");

            assert!(
                record.unavailable_items().is_empty(),
                "{} {req}: {:?}",
                case.id,
                record.unavailable_items()
            );
        }
    }
}

#[test]
fn capability_gaps_are_declared() {
    let fmp = fmp_case();
    let av = alphavantage_case();

    // FMP publishes every fiscal-period table but no monthly series.
    assert!(!fmp.source.supports(&request(StatementType::PriceHistory)));
    assert!(fmp.source.supports(&request_for(StatementType::Ratios, Some(Period::Quarterly))));

    // Alpha Vantage derives ratios and key metrics from trailing figures only.
    for statement_type in [StatementType::Ratios, StatementType::KeyMetrics] {
        assert!(!av.source.supports(&request_for(statement_type, Some(Period::Annual))));
        assert!(!av.source.supports(&request_for(statement_type, Some(Period::Quarterly))));
        assert!(av.source.supports(&request_for(statement_type, Some(Period::Ttm))));
    }
    assert!(av.source.supports(&request(StatementType::PriceHistory)));
}

#[tokio::test]
async fn multi_period_payloads_keep_earlier_periods() {
    let fmp = fmp_case();
    let req = request(StatementType::KeyMetrics);
    let result = fmp.source.fetch(&req).await.expect("scripted payload");
    let record = normalize(result, &req, UtcDateTime::now()).expect("normalizes");

    assert_eq!(record.history().len(), 1);
    assert!(record.period_change_percent(LineItem::MarketCap).is_some());

    let av = alphavantage_case();
    let req = request(StatementType::PriceHistory);
    let result = av.source.fetch(&req).await.expect("scripted payload");
    let record = normalize(result, &req, UtcDateTime::now()).expect("normalizes");

    let closes = record.series(LineItem::Close);
    assert_eq!(closes.len(), 3);
    assert_eq!(closes[0].1, LineValue::Reported(225.91));
    assert_eq!(
        closes[2].0.map(|date| date.format_iso()).as_deref(),
        Some("2024-08-30")
    );
}

#[tokio::test]
async fn api_key_travels_as_query_parameter_and_never_in_redacted_url() {
    for (case, key) in [(fmp_case(), "fmp-secret"), (alphavantage_case(), "av-secret")] {
        case.source
            .fetch(&request(StatementType::Income))
            .await
            .expect("scripted payload");

        let sent = case.client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].query_value("apikey"), Some(key));
        assert!(!sent[0].redacted_url().contains(key));
        assert_eq!(sent[0].timeout_ms, 5_000);
    }
}

#[tokio::test]
async fn quarterly_period_reaches_each_provider() {
    let quarterly = request_for(StatementType::Income, Some(Period::Quarterly));

    let fmp = fmp_case();
    fmp.source.fetch(&quarterly).await.expect("scripted payload");
    assert_eq!(fmp.client.requests()[0].query_value("period"), Some("quarter"));

    // Alpha Vantage returns both period arrays; the empty quarterly one has no report.
    let av = alphavantage_case();
    let result = av.source.fetch(&quarterly).await.expect("scripted payload");
    let error = normalize(result, &quarterly, UtcDateTime::now()).expect_err("no quarterly rows");
    assert_eq!(error.code(), "normalize.missing_report");
}
