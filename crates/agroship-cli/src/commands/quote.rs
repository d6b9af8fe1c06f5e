use agroship_core::{
    DestinationZone, Dimensions, OrderShippingCharge, QuoteAggregator, QuoteAggregatorBuilder,
    QuoteOrigin, QuoteRequest, QuoteSelection, ShippingConfig, ShippingQuote,
};
use serde::Serialize;

use crate::cli::QuoteArgs;
use crate::error::CliError;
use crate::output::EnvelopeError;

use super::{parse_carrier, CommandResult};

#[derive(Debug, Serialize)]
struct QuoteResponseData {
    zone: Option<DestinationZone>,
    weight_kg: f64,
    origin: QuoteOrigin,
    quotes: Vec<ShippingQuote>,
    selected: Option<ShippingQuote>,
    auto_selected: bool,
    order_charge: Option<OrderShippingCharge>,
}

pub async fn run(args: &QuoteArgs, config: &ShippingConfig) -> Result<CommandResult, CliError> {
    let dimensions = Dimensions::new(args.length, args.width, args.height)?;
    let zone = args.zone.parse::<DestinationZone>().ok();

    let aggregator = QuoteAggregatorBuilder::new(config.clone()).build();
    let selection = selection(args, zone, &aggregator)?;

    let request = QuoteRequest {
        zone,
        destination_district: args.destination_district.clone(),
        weight_kg: args.weight,
        dimensions,
    };
    let set = aggregator.get_quotes(&request, selection.as_ref()).await;

    let mut warnings = Vec::new();
    if zone.is_none() {
        warnings.push(format!("unknown zone '{}'; no quotes offered", args.zone));
    } else if set.is_empty() {
        warnings.push(String::from("no carrier accepts this package"));
    }
    if set.origin == QuoteOrigin::Fallback && !set.consulted.is_empty() && !set.is_empty() {
        warnings.push(String::from("live carriers unavailable; showing fallback rates"));
    }

    let errors = set.recovered.iter().map(EnvelopeError::from).collect();
    let data = serde_json::to_value(QuoteResponseData {
        zone,
        weight_kg: args.weight,
        origin: set.origin,
        order_charge: set.selected.as_ref().map(ShippingQuote::order_charge),
        quotes: set.quotes,
        selected: set.selected,
        auto_selected: set.auto_selected,
    })?;

    let mut result = CommandResult::ok(data, set.consulted)
        .with_errors(errors)
        .with_latency(set.latency_ms);
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}

fn selection(
    args: &QuoteArgs,
    zone: Option<DestinationZone>,
    aggregator: &QuoteAggregator,
) -> Result<Option<QuoteSelection>, CliError> {
    let Some(raw) = args.selected.as_deref() else {
        return Ok(None);
    };
    let carrier = parse_carrier(raw)?;

    let service_name = match (&args.selected_service, zone) {
        (Some(service), _) => Some(service.clone()),
        (None, Some(zone)) => aggregator
            .rate_table()
            .entries()
            .iter()
            .find(|entry| entry.zone == zone && entry.carrier == carrier)
            .map(|entry| entry.service_name.to_owned()),
        (None, None) => None,
    };

    Ok(service_name.map(|service_name| QuoteSelection {
        carrier,
        service_name,
    }))
}
