//! CLI argument definitions for findash.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Fetch the latest quote for a ticker |
//! | `overview` | Fetch company name, exchange, sector and headline valuation |
//! | `prices` | Fetch up to five years of monthly closing prices |
//! | `statement` | Fetch income, balance-sheet, cash-flow, ratios or key-metrics history |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `FINDASH_TIMEOUT_MS` or `5000` | Per-provider request timeout |
//! | `--refresh` | `false` | Skip the cache lookup and store the fresh record |
//!
//! # Examples
//!
//! ```bash
//! findash quote AAPL
//! findash overview IBM
//! findash statement MSFT --kind balance-sheet --period quarterly --pretty
//! findash statement AAPL --kind ratios --period ttm
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

use findash_core::{Period, StatementType};

/// Financial statement retrieval with provider fallback and caching.
///
/// Data comes from Financial Modeling Prep, falling back to Alpha Vantage.
/// API keys are read from `FINDASH_FMP_API_KEY` and
/// `FINDASH_ALPHAVANTAGE_API_KEY`.
#[derive(Debug, Parser)]
#[command(name = "findash", author, version, about)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-provider request timeout in milliseconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Ignore any cached record and fetch from the providers.
    #[arg(long, global = true, default_value_t = false)]
    pub refresh: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote for a ticker.
    ///
    /// # Examples
    ///
    ///   findash quote AAPL
    ///   findash quote brk.b --pretty
    Quote(TickerArgs),

    /// Fetch the company profile and headline valuation figures.
    Overview(TickerArgs),

    /// Fetch monthly closing prices, newest first.
    Prices(TickerArgs),

    /// Fetch a financial statement or ratio set with up to five periods of history.
    ///
    /// # Examples
    ///
    ///   findash statement AAPL --kind income
    ///   findash statement MSFT --kind cash-flow --period quarterly
    ///   findash statement IBM --kind key-metrics --period ttm
    Statement(StatementArgs),
}

/// Arguments for commands that take only a ticker.
#[derive(Debug, Args)]
pub struct TickerArgs {
    /// Ticker symbol (1-6 characters of A-Z, 0-9 or '.'; case-insensitive).
    pub ticker: String,
}

/// Arguments for the `statement` command.
#[derive(Debug, Args)]
pub struct StatementArgs {
    /// Ticker symbol (1-6 characters of A-Z, 0-9 or '.'; case-insensitive).
    pub ticker: String,

    /// Statement to fetch.
    #[arg(long, value_enum)]
    pub kind: StatementKind,

    /// Reporting period; `ttm` applies to ratios and key-metrics only.
    #[arg(long, value_enum, default_value_t = PeriodArg::Annual)]
    pub period: PeriodArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatementKind {
    Income,
    BalanceSheet,
    CashFlow,
    Ratios,
    KeyMetrics,
}

impl From<StatementKind> for StatementType {
    fn from(kind: StatementKind) -> Self {
        match kind {
            StatementKind::Income => Self::Income,
            StatementKind::BalanceSheet => Self::BalanceSheet,
            StatementKind::CashFlow => Self::CashFlow,
            StatementKind::Ratios => Self::Ratios,
            StatementKind::KeyMetrics => Self::KeyMetrics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Annual,
    Quarterly,
    Ttm,
}

impl From<PeriodArg> for Period {
    fn from(period: PeriodArg) -> Self {
        match period {
            PeriodArg::Annual => Self::Annual,
            PeriodArg::Quarterly => Self::Quarterly,
            PeriodArg::Ttm => Self::Ttm,
        }
    }
}
