use std::time::Instant;

use agroship_core::{
    Dimensions, Recipient, ShipmentDetails, ShipmentLabel, ShipmentServiceBuilder, ShippingAddress,
    ShippingConfig,
};
use serde::Serialize;

use crate::cli::ShipArgs;
use crate::error::CliError;

use super::{parse_carrier, CommandResult};

#[derive(Debug, Serialize)]
struct ShipResponseData {
    label: ShipmentLabel,
    live: bool,
}

pub async fn run(args: &ShipArgs, config: &ShippingConfig) -> Result<CommandResult, CliError> {
    let carrier = parse_carrier(&args.carrier)?;

    let mut recipient = Recipient::new(&args.recipient_name, &args.recipient_phone)?;
    if let Some(email) = &args.recipient_email {
        recipient = recipient.with_email(email);
    }
    let mut address = ShippingAddress::new(
        &args.address_line,
        &args.district,
        &args.province,
        &args.department,
    )?;
    if let Some(postal_code) = &args.postal_code {
        address = address.with_postal_code(postal_code);
    }
    let details = ShipmentDetails::new(
        &args.order_id,
        carrier,
        recipient,
        address,
        args.weight,
        Dimensions::default(),
    )?;

    let service = ShipmentServiceBuilder::new(config.clone()).build();
    let live = service.is_live(carrier);

    let started = Instant::now();
    let label = service.create_shipment(details).await?;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let carriers = if live { vec![carrier] } else { Vec::new() };
    let data = serde_json::to_value(ShipResponseData { label, live })?;
    Ok(CommandResult::ok(data, carriers).with_latency(latency_ms))
}
