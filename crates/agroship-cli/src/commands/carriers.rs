use agroship_core::{CarrierId, DestinationZone, RateTable, ShippingConfig};
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct CarrierRow {
    id: CarrierId,
    name: &'static str,
    tracking_prefix: &'static str,
    live: bool,
    fallback_zones: Vec<DestinationZone>,
}

#[derive(Debug, Serialize)]
struct CarriersResponseData {
    carriers: Vec<CarrierRow>,
}

pub fn run(config: &ShippingConfig) -> Result<CommandResult, CliError> {
    let table = RateTable::standard();
    let carriers = CarrierId::ALL
        .iter()
        .map(|&id| {
            let mut fallback_zones: Vec<DestinationZone> = table
                .entries()
                .iter()
                .filter(|entry| entry.carrier == id)
                .map(|entry| entry.zone)
                .collect();
            fallback_zones.dedup();

            CarrierRow {
                id,
                name: id.display_name(),
                tracking_prefix: id.tracking_prefix(),
                live: config.is_live(id),
                fallback_zones,
            }
        })
        .collect();

    let live = config.live_carriers().map(|credentials| credentials.carrier).collect();
    let data = serde_json::to_value(CarriersResponseData { carriers })?;
    Ok(CommandResult::ok(data, live))
}
