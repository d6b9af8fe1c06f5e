use agroship_core::{ConfigError, Severity, ShippingError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Shipping(#[from] ShippingError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) | Self::Command(_) => 2,
            Self::Shipping(ShippingError::Validation(_)) => 2,
            Self::Shipping(error) => match error.severity() {
                Severity::Fatal => 3,
                Severity::Recoverable => 1,
            },
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
