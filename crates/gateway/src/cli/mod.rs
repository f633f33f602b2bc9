pub mod chat;
pub mod coins;
pub mod config;
pub mod wallet;

use clap::{Parser, Subcommand};

/// TrendPup — realtime chat bridge and memecoin market API.
#[derive(Debug, Parser)]
#[command(name = "trendpup", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the REST API and the realtime bridge (default when no subcommand is given).
    Serve,
    /// Chat with the agent through a running bridge.
    Chat {
        /// Bridge URL. Defaults to the configured bridge address.
        #[arg(long)]
        url: Option<String>,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print market reports from the local data files.
    #[command(subcommand)]
    Coins(CoinsCommand),
    /// Wallet address and balance texts.
    #[command(subcommand)]
    Wallet(WalletCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Subcommand)]
pub enum CoinsCommand {
    /// Most-mentioned coins.
    Trending {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Coins whose symbol contains the query.
    Search { query: String },
    /// Detailed analysis of one coin.
    Info { symbol: String },
    /// Risk assessment of one coin.
    Risk { symbol: String },
    /// Age of the analysis file.
    Freshness,
}

#[derive(Debug, Subcommand)]
pub enum WalletCommand {
    /// Find the Injective address in a chat message.
    Address {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Render a balance given in base units (10^-18 INJ).
    Balance { address: String, base_units: String },
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `TP_CONFIG` (or `config.toml`).
/// A missing file yields the defaults. Returns the config and the path used.
pub fn load_config() -> anyhow::Result<(tp_domain::config::Config, String)> {
    let config_path = std::env::var("TP_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        tp_domain::config::Config::default()
    };

    Ok((config, config_path))
}
