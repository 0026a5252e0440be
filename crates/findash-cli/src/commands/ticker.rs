use findash_core::{CacheMode, StatementRequest, StatementService, StatementType, TickerSymbol};

use crate::cli::TickerArgs;
use crate::error::CliError;

use super::{fetch_record, CommandResult};

/// Commands whose record has no reporting period: quote, overview, prices.
pub async fn run(
    args: &TickerArgs,
    statement_type: StatementType,
    service: &StatementService,
    mode: CacheMode,
) -> Result<CommandResult, CliError> {
    let ticker = TickerSymbol::parse(&args.ticker)?;
    let request = StatementRequest::new(ticker, statement_type, None)?;

    fetch_record(service, &request, mode).await
}
