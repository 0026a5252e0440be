use findash_core::{CacheMode, StatementRequest, StatementService, TickerSymbol};

use crate::cli::StatementArgs;
use crate::error::CliError;

use super::{fetch_record, CommandResult};

pub async fn run(
    args: &StatementArgs,
    service: &StatementService,
    mode: CacheMode,
) -> Result<CommandResult, CliError> {
    let ticker = TickerSymbol::parse(&args.ticker)?;
    let request = StatementRequest::new(ticker, args.kind.into(), Some(args.period.into()))?;

    fetch_record(service, &request, mode).await
}
