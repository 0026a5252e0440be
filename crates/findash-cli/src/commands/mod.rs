mod statement;
mod ticker;

use std::time::Instant;

use findash_core::{
    CacheMode, Envelope, EnvelopeError, EnvelopeMeta, FetchConfig, FetchError, ProviderId,
    StatementRequest, StatementService, StatementServiceBuilder, StatementType,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub cache_hit: bool,
    pub source: Option<ProviderId>,
    /// Terminal fetch error, reported after the envelope is written.
    pub failure: Option<FetchError>,
}

impl CommandResult {
    pub fn ok(data: Value, source: ProviderId) -> Self {
        Self {
            data,
            errors: Vec::new(),
            latency_ms: 0,
            cache_hit: false,
            source: Some(source),
            failure: None,
        }
    }

    pub fn failed(error: FetchError) -> Self {
        Self {
            data: Value::Null,
            errors: EnvelopeError::from_fetch_error(&error),
            latency_ms: 0,
            cache_hit: false,
            source: None,
            failure: Some(error),
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

pub struct CommandOutput {
    pub envelope: Envelope<Value>,
    pub failure: Option<FetchError>,
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let mut config = FetchConfig::from_env()?;
    if let Some(timeout_ms) = cli.timeout_ms {
        config = config.with_timeout_ms(timeout_ms);
    }
    let service = StatementServiceBuilder::new().with_config(config).build();
    let mode = if cli.refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    };

    let CommandResult {
        data,
        errors,
        latency_ms,
        cache_hit,
        source,
        failure,
    } = match &cli.command {
        Command::Quote(args) => ticker::run(args, StatementType::Quote, &service, mode).await?,
        Command::Overview(args) => {
            ticker::run(args, StatementType::Overview, &service, mode).await?
        }
        Command::Prices(args) => {
            ticker::run(args, StatementType::PriceHistory, &service, mode).await?
        }
        Command::Statement(args) => statement::run(args, &service, mode).await?,
    };

    let meta = EnvelopeMeta::new(Uuid::new_v4().to_string(), source, latency_ms, cache_hit)?;
    let envelope = Envelope::with_errors(meta, data, errors)?;

    Ok(CommandOutput { envelope, failure })
}

/// Shared fetch path: times the call and turns a fetch error into an
/// error envelope instead of an early exit.
async fn fetch_record(
    service: &StatementService,
    req: &StatementRequest,
    mode: CacheMode,
) -> Result<CommandResult, CliError> {
    let started = Instant::now();
    let outcome = service.fetch(req, mode).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let result = match outcome {
        Ok(outcome) => {
            let source = outcome.record.source();
            CommandResult::ok(serde_json::to_value(&outcome.record)?, source)
                .with_cache_hit(outcome.cache_hit)
        }
        Err(error) => CommandResult::failed(error),
    };

    debug!(request = %req, latency_ms, cache_hit = result.cache_hit, ok = result.failure.is_none(), "command finished");
    Ok(result.with_latency(latency_ms))
}
