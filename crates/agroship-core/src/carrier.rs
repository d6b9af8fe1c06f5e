use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical carrier identifiers used in quotes, labels and tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CarrierId {
    Olva,
    Shalom,
    CruzDelSur,
    Marvisur,
    /// The store's own delivery fleet inside metropolitan Lima.
    AgroBesser,
}

impl CarrierId {
    pub const ALL: [Self; 5] = [
        Self::Olva,
        Self::Shalom,
        Self::CruzDelSur,
        Self::Marvisur,
        Self::AgroBesser,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Olva => "olva",
            Self::Shalom => "shalom",
            Self::CruzDelSur => "cruz-del-sur",
            Self::Marvisur => "marvisur",
            Self::AgroBesser => "agrobesser",
        }
    }

    /// Human-facing carrier name copied into orders.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Olva => "Olva Courier",
            Self::Shalom => "Shalom",
            Self::CruzDelSur => "Cruz del Sur",
            Self::Marvisur => "Marvisur",
            Self::AgroBesser => "AgroBesser",
        }
    }

    /// Three-letter prefix of synthesized tracking numbers.
    pub const fn tracking_prefix(self) -> &'static str {
        match self {
            Self::Olva => "OLV",
            Self::Shalom => "SHA",
            Self::CruzDelSur => "CDS",
            Self::Marvisur => "MVS",
            Self::AgroBesser => "AGB",
        }
    }

    /// Public tracking page for a tracking number.
    pub fn public_tracking_url(self, tracking_number: &str) -> String {
        let encoded = urlencoding::encode(tracking_number);
        match self {
            Self::Olva => format!("https://www.olvacourier.com/rastreo/?tracking={encoded}"),
            Self::Shalom => format!("https://rastrea.shalom.com.pe/?codigo={encoded}"),
            Self::CruzDelSur => {
                format!("https://www.cruzdelsur.com.pe/carga/rastreo?guia={encoded}")
            }
            Self::Marvisur => format!("https://www.marvisur.com/rastreo?codigo={encoded}"),
            Self::AgroBesser => format!("https://agrobesser.com/seguimiento/{encoded}"),
        }
    }
}

impl Display for CarrierId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarrierId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "olva" | "olva-courier" => Ok(Self::Olva),
            "shalom" => Ok(Self::Shalom),
            "cruz-del-sur" | "cruzdelsur" => Ok(Self::CruzDelSur),
            "marvisur" => Ok(Self::Marvisur),
            "agrobesser" | "agro-besser" => Ok(Self::AgroBesser),
            _ => Err(ValidationError::InvalidCarrier {
                value: value.trim().to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_display_names_and_slugs() {
        assert_eq!("Olva Courier".parse::<CarrierId>(), Ok(CarrierId::Olva));
        assert_eq!("cruz_del_sur".parse::<CarrierId>(), Ok(CarrierId::CruzDelSur));
        assert_eq!(" SHALOM ".parse::<CarrierId>(), Ok(CarrierId::Shalom));
    }

    #[test]
    fn rejects_unknown_carrier() {
        let err = "dhl".parse::<CarrierId>().expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidCarrier { .. }));
    }

    #[test]
    fn tracking_prefixes_are_three_uppercase_letters() {
        for carrier in CarrierId::ALL {
            let prefix = carrier.tracking_prefix();
            assert_eq!(prefix.len(), 3);
            assert!(prefix.chars().all(|ch| ch.is_ascii_uppercase()));
        }
    }

    #[test]
    fn public_tracking_url_encodes_number() {
        let url = CarrierId::Olva.public_tracking_url("OLV 123");
        assert!(url.ends_with("OLV%20123"));
    }
}
