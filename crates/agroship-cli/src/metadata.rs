use std::fmt::{Display, Formatter};

use agroship_core::{CarrierId, UtcDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request identifier (UUID v4) for end-to-end request tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Metadata attached to every envelope.
///
/// Field order is fixed to keep JSON output stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub generated_at: UtcDateTime,
    /// Live carriers consulted for this command.
    pub carriers: Vec<CarrierId>,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(carriers: Vec<CarrierId>, latency_ms: u64) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            generated_at: UtcDateTime::now(),
            carriers,
            latency_ms,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
