mod carriers;
mod quote;
mod ship;
mod track;

use std::time::Duration;

use agroship_core::{CarrierId, ShippingConfig};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::Metadata;
use crate::output::{Envelope, EnvelopeError};

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub carriers: Vec<CarrierId>,
}

impl CommandResult {
    pub fn ok(data: Value, carriers: Vec<CarrierId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            carriers,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let config = load_config(cli)?;
    debug!(live = config.live_carriers().count(), "configuration loaded");

    let command_result = match &cli.command {
        Command::Quote(args) => quote::run(args, &config).await?,
        Command::Ship(args) => ship::run(args, &config).await?,
        Command::Track(args) => track::run(args, &config).await?,
        Command::Carriers => carriers::run(&config)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        latency_ms,
        carriers,
    } = command_result;

    let mut meta = Metadata::new(carriers, latency_ms);
    if cli.offline {
        meta.push_warning("--offline set; carrier API keys were ignored");
    }
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data, errors })
}

fn load_config(cli: &Cli) -> Result<ShippingConfig, CliError> {
    let mut config = if cli.offline {
        ShippingConfig::offline_from_env()?
    } else {
        ShippingConfig::from_env()?
    };

    if let Some(timeout_ms) = cli.timeout_ms {
        if timeout_ms == 0 {
            return Err(CliError::Command(String::from(
                "--timeout-ms must be greater than zero",
            )));
        }
        config = config.with_provider_timeout(Duration::from_millis(timeout_ms));
    }

    Ok(config)
}

fn parse_carrier(raw: &str) -> Result<CarrierId, CliError> {
    raw.parse::<CarrierId>().map_err(CliError::from)
}
