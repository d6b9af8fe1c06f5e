use std::time::Instant;

use agroship_core::{ShipmentServiceBuilder, ShippingConfig, TrackingStatus};
use serde::Serialize;

use crate::cli::TrackArgs;
use crate::error::CliError;

use super::{parse_carrier, CommandResult};

#[derive(Debug, Serialize)]
struct TrackResponseData {
    tracking: TrackingStatus,
}

pub async fn run(args: &TrackArgs, config: &ShippingConfig) -> Result<CommandResult, CliError> {
    let carrier = parse_carrier(&args.carrier)?;
    let service = ShipmentServiceBuilder::new(config.clone()).build();
    let live = service.is_live(carrier);

    let started = Instant::now();
    let tracking = service
        .track_shipment(&args.tracking_number, carrier)
        .await?;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let degraded = live && !tracking.live;
    let carriers = if live { vec![carrier] } else { Vec::new() };
    let data = serde_json::to_value(TrackResponseData { tracking })?;

    let result = CommandResult::ok(data, carriers).with_latency(latency_ms);
    if degraded {
        return Ok(result.with_warning("carrier tracking unavailable; showing generic status"));
    }
    Ok(result)
}
