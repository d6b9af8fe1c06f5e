use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Provinces served as metropolitan Lima.
const METRO_PROVINCES: [&str; 2] = ["lima", "callao"];

/// Destination classification driving prices and carrier options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationZone {
    /// Metropolitan Lima and Callao.
    Lima,
    /// Every other region of Peru.
    Provincias,
}

impl DestinationZone {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lima => "lima",
            Self::Provincias => "provincias",
        }
    }

    pub const fn is_metro(self) -> bool {
        matches!(self, Self::Lima)
    }

    /// Days added to the ship date when no carrier estimate is available.
    pub const fn standard_transit_days(self) -> i64 {
        match self {
            Self::Lima => 3,
            Self::Provincias => 7,
        }
    }

    /// Classifies a destination by province name.
    pub fn from_province(province: &str) -> Self {
        let normalized = province.trim().to_lowercase();
        if METRO_PROVINCES.contains(&normalized.as_str()) {
            Self::Lima
        } else {
            Self::Provincias
        }
    }
}

impl Display for DestinationZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationZone {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lima" | "metro" | "lima-metropolitana" => Ok(Self::Lima),
            "provincias" | "provincia" | "non-metro" => Ok(Self::Provincias),
            other => Err(ValidationError::InvalidZone {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zone_names() {
        assert_eq!("Lima".parse::<DestinationZone>(), Ok(DestinationZone::Lima));
        assert_eq!(
            " provincias ".parse::<DestinationZone>(),
            Ok(DestinationZone::Provincias)
        );
        assert!(matches!(
            "arequipa".parse::<DestinationZone>(),
            Err(ValidationError::InvalidZone { .. })
        ));
    }

    #[test]
    fn callao_counts_as_metro() {
        assert_eq!(DestinationZone::from_province("Callao"), DestinationZone::Lima);
        assert_eq!(DestinationZone::from_province("LIMA"), DestinationZone::Lima);
        assert_eq!(
            DestinationZone::from_province("Huaral"),
            DestinationZone::Provincias
        );
        assert_eq!(
            DestinationZone::from_province("Cañete"),
            DestinationZone::Provincias
        );
    }
}
