use agroship_core::{CarrierId, ShippingError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CliError;
use crate::metadata::Metadata;

/// Standard response envelope for all `agroship` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub meta: Metadata,
    pub data: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}

/// Structured error entry surfaced next to the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<CarrierId>,
    pub recoverable: bool,
}

impl From<&ShippingError> for EnvelopeError {
    fn from(error: &ShippingError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
            carrier: error.carrier(),
            recoverable: error.is_recoverable(),
        }
    }
}

pub fn render(envelope: &Envelope<Value>, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    println!("{payload}");
    Ok(())
}
