//! CLI argument definitions for agroship.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Resolve shipping quotes for a destination and weight |
//! | `ship` | Issue a label for a confirmed order |
//! | `track` | Look up a tracking number |
//! | `carriers` | List carriers and whether they are live |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--offline` | `false` | Ignore carrier API keys |
//! | `--timeout-ms` | from env | Per-carrier timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! agroship quote --zone lima --weight 3
//! agroship quote --zone provincias --weight 8 --pretty
//! agroship track OLV12345678ABCD --carrier olva
//! ```

use clap::{Args, Parser, Subcommand};

/// Shipping quotes, labels and tracking for the AgroBesser storefront.
#[derive(Debug, Parser)]
#[command(
    name = "agroship",
    author,
    version,
    about = "Shipping quotes, labels and tracking",
    long_about = "agroship resolves shipping quotes from live Peruvian carriers with a static \
fallback, issues shipment labels and looks up tracking numbers.\n\
\n\
Carrier integrations are enabled by OLVA_API_KEY and SHALOM_API_KEY. \
Without them every answer comes from the fallback rate table.\n\
\n\
Use 'agroship <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Ignore configured API keys and answer from static data.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Per-carrier timeout budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve shipping quotes.
    ///
    /// # Examples
    ///
    ///   agroship quote --zone lima --weight 3
    ///   agroship quote --zone provincias --weight 8 --selected shalom
    Quote(QuoteArgs),

    /// Issue the shipment label for an order.
    ///
    /// # Examples
    ///
    ///   agroship ship --order-id ORD-1 --carrier olva --recipient-name "Ana Torres" \
    ///     --recipient-phone 912345678 --address-line "Av. Sol 300" --district Wanchaq \
    ///     --province Cusco --department Cusco --weight 4
    Ship(ShipArgs),

    /// Look up a tracking number.
    ///
    /// # Examples
    ///
    ///   agroship track OLV12345678ABCD --carrier olva
    Track(TrackArgs),

    /// List carriers and their live/fallback status.
    Carriers,
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Destination zone: lima or provincias.
    #[arg(long)]
    pub zone: String,

    /// Package weight in kilograms.
    #[arg(long)]
    pub weight: f64,

    #[arg(long, default_value_t = 0.0)]
    pub length: f64,

    #[arg(long, default_value_t = 0.0)]
    pub width: f64,

    #[arg(long, default_value_t = 0.0)]
    pub height: f64,

    /// Destination district sent to live carriers.
    #[arg(long)]
    pub destination_district: Option<String>,

    /// Currently selected carrier; kept when still offered.
    #[arg(long)]
    pub selected: Option<String>,

    /// Service tier of the selected carrier. Defaults to its fallback-table tier.
    #[arg(long, requires = "selected")]
    pub selected_service: Option<String>,
}

/// Arguments for the `ship` command.
#[derive(Debug, Args)]
pub struct ShipArgs {
    #[arg(long)]
    pub order_id: String,

    #[arg(long)]
    pub carrier: String,

    #[arg(long)]
    pub recipient_name: String,

    #[arg(long)]
    pub recipient_phone: String,

    #[arg(long)]
    pub recipient_email: Option<String>,

    #[arg(long)]
    pub address_line: String,

    #[arg(long)]
    pub district: String,

    #[arg(long)]
    pub province: String,

    #[arg(long)]
    pub department: String,

    #[arg(long)]
    pub postal_code: Option<String>,

    /// Package weight in kilograms.
    #[arg(long)]
    pub weight: f64,
}

/// Arguments for the `track` command.
#[derive(Debug, Args)]
pub struct TrackArgs {
    pub tracking_number: String,

    #[arg(long)]
    pub carrier: String,
}
