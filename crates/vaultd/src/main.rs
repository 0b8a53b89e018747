//! vaultd: encrypted vault storage daemon
//!
//! Usage:
//!   vaultd [--config /etc/vault/config.toml] [--listen 0.0.0.0:8080]

mod daemon;
mod metrics;
mod protocol;
mod routes;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "vaultd", version, about = "Encrypted vault storage daemon")]
struct Cli {
    /// Path to vault.toml configuration file
    #[arg(
        long,
        short = 'c',
        env = "VAULT_CONFIG",
        default_value = "/etc/vault/config.toml"
    )]
    config: PathBuf,

    /// Override the HTTP listen address from the config file
    #[arg(long, env = "VAULT_LISTEN")]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides [daemon].log_level
    #[arg(long, env = "VAULT_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides [daemon].log_format
    #[arg(long, env = "VAULT_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings may come from the file, so read it before the subscriber exists
    let (mut config, found) = load_config(&cli.config).await?;

    let level = cli.log.unwrap_or_else(|| config.daemon.log_level.clone());
    let format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_name(&config.daemon.log_format));
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "vaultd starting"
    );
    if !found {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }

    if let Some(listen) = cli.listen {
        config.daemon.listen = listen;
    }

    daemon::run(config).await
}

/// Returns the parsed config and whether the file existed.
async fn load_config(path: &Path) -> Result<(vault_core::config::VaultConfig, bool)> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((vault_core::config::VaultConfig::default(), false))
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
    }
}
