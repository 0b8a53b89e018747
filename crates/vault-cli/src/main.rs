//! vault: command-line client for vaultd
//!
//! Local commands (no server needed):
//!   encrypt <file> [-o out]      - encrypt a file with a passphrase
//!   decrypt <file> [-o out]      - decrypt a file produced by `encrypt`
//!   config show                  - display current configuration
//!
//! Server commands:
//!   register | login             - create an account / obtain a session token
//!   upload <file> [--name NAME]  - encrypt locally, then upload
//!   download <name> [-o out]     - download, then decrypt locally
//!   list | logout | health

mod client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vault_core::config::VaultConfig;
use vault_core::{canonical_name, SessionToken, ENCRYPTED_SUFFIX};

use crate::client::VaultClient;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "vault",
    version,
    about = "Encrypted vault client",
    long_about = "vault: encrypt files locally and keep them on a vaultd server"
)]
struct Cli {
    /// Path to vault.toml configuration file
    #[arg(long, short = 'c', env = "VAULT_CONFIG", default_value = "/etc/vault/config.toml")]
    config: PathBuf,

    /// Server URL (overrides [client].server_url)
    #[arg(long, env = "VAULT_SERVER", global = true)]
    server: Option<String>,

    /// Session token from `vault login`
    #[arg(long, env = "VAULT_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Log level for diagnostics on stderr
    #[arg(long, env = "VAULT_LOG", default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a local file (passphrase from VAULT_KEY or prompt)
    Encrypt {
        input: PathBuf,
        /// Output path (default: <input>.enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Decrypt a local file (passphrase from VAULT_KEY or prompt)
    Decrypt {
        input: PathBuf,
        /// Output path (default: input without .enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Create an account (password from VAULT_PASSWORD or prompt)
    Register {
        username: String,
    },

    /// Log in and print a session token for VAULT_TOKEN
    Login {
        username: String,
    },

    /// Encrypt a local file and upload the ciphertext
    Upload {
        file: PathBuf,
        /// Name to store under (default: the file's name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Download an object and decrypt it
    Download {
        /// Stored name, with or without the .enc suffix
        name: String,
        /// Output path (default: stored name without .enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Keep the ciphertext instead of decrypting
        #[arg(long)]
        raw: bool,
    },

    /// List stored objects
    List,

    /// End the current session
    Logout,

    /// Check that the server is up
    Health,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let mut config = load_config(&cli.config).await?;
    if let Some(server) = cli.server.clone() {
        config.client.server_url = server;
    }

    match cli.command {
        Commands::Encrypt { ref input, ref output } => cmd_encrypt(input, output.as_deref()).await,
        Commands::Decrypt { ref input, ref output } => cmd_decrypt(input, output.as_deref()).await,
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
        Commands::Register { ref username } => cmd_register(&config, username).await,
        Commands::Login { ref username } => cmd_login(&config, username).await,
        Commands::Upload { ref file, ref name } => {
            cmd_upload(&config, &session(&cli)?, file, name.as_deref()).await
        }
        Commands::Download { ref name, ref output, raw } => {
            cmd_download(&config, &session(&cli)?, name, output.as_deref(), raw).await
        }
        Commands::List => cmd_list(&config, &session(&cli)?).await,
        Commands::Logout => cmd_logout(&config, &session(&cli)?).await,
        Commands::Health => cmd_health(&config).await,
    }
}

async fn load_config(path: &Path) -> Result<VaultConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    } else {
        tracing::debug!("config file not found: {}  (using defaults)", path.display());
        Ok(VaultConfig::default())
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn connect(config: &VaultConfig) -> Result<VaultClient> {
    VaultClient::new(
        &config.client.server_url,
        Duration::from_secs(config.client.timeout_secs),
    )
    .with_context(|| format!("building client for {}", config.client.server_url))
}

fn session(cli: &Cli) -> Result<SessionToken> {
    match cli.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(SessionToken::new(token)),
        _ => anyhow::bail!("not logged in: run `vault login <user>` and export VAULT_TOKEN"),
    }
}

/// Read a secret from `env_var`, falling back to an interactive prompt.
fn read_secret(env_var: &str, prompt: &str) -> Result<SecretString> {
    if let Ok(value) = std::env::var(env_var) {
        if !value.is_empty() {
            return Ok(SecretString::from(value));
        }
    }
    let value = rpassword::prompt_password(prompt).context("reading secret from terminal")?;
    if value.is_empty() {
        anyhow::bail!("empty input; set {env_var} or type a value");
    }
    Ok(SecretString::from(value))
}

/// Default plaintext destination for an encrypted name: strip `.enc`, or add `.dec`.
fn plaintext_path(encrypted: &Path) -> PathBuf {
    let name = encrypted.to_string_lossy();
    match name.strip_suffix(ENCRYPTED_SUFFIX) {
        Some(stem) if !stem.is_empty() => PathBuf::from(stem),
        _ => PathBuf::from(format!("{name}.dec")),
    }
}

fn encrypted_path(plain: &Path) -> PathBuf {
    PathBuf::from(format!("{}{ENCRYPTED_SUFFIX}", plain.display()))
}

fn fmt_bytes(n: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if n >= MIB {
        format!("{:.1} MiB", n as f64 / MIB as f64)
    } else if n >= KIB {
        format!("{:.1} KiB", n as f64 / KIB as f64)
    } else {
        format!("{n} B")
    }
}

// ── `vault encrypt` / `vault decrypt` ─────────────────────────────────────────

async fn cmd_encrypt(input: &Path, output: Option<&Path>) -> Result<()> {
    let key = read_secret("VAULT_KEY", "Encryption password: ")?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| encrypted_path(input));
    let written = encrypt_file(input, &output, key.expose_secret()).await?;
    println!("Encrypted {} -> {} ({})", input.display(), output.display(), fmt_bytes(written));
    Ok(())
}

async fn cmd_decrypt(input: &Path, output: Option<&Path>) -> Result<()> {
    let key = read_secret("VAULT_KEY", "Decryption password: ")?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| plaintext_path(input));
    let written = decrypt_file(input, &output, key.expose_secret()).await?;
    println!("Decrypted {} -> {} ({})", input.display(), output.display(), fmt_bytes(written));
    Ok(())
}

async fn encrypt_file(input: &Path, output: &Path, key: &str) -> Result<u64> {
    let plaintext = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let blob = vault_crypto::encrypt(&plaintext, key).context("encrypting")?;
    tokio::fs::write(output, &blob)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(blob.len() as u64)
}

async fn decrypt_file(input: &Path, output: &Path, key: &str) -> Result<u64> {
    let blob = tokio::fs::read(input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    let plaintext = vault_crypto::decrypt(&blob, key)
        .with_context(|| format!("decrypting {}", input.display()))?;
    tokio::fs::write(output, &plaintext)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(plaintext.len() as u64)
}

// ── `vault config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &VaultConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Account commands ──────────────────────────────────────────────────────────

async fn cmd_register(config: &VaultConfig, username: &str) -> Result<()> {
    let password = read_secret("VAULT_PASSWORD", "New password: ")?;
    if std::env::var("VAULT_PASSWORD").is_err() {
        let confirm = rpassword::prompt_password("Confirm password: ")
            .context("reading secret from terminal")?;
        if confirm != password.expose_secret() {
            anyhow::bail!("passwords do not match");
        }
    }
    let message = connect(config)?
        .register(username, password.expose_secret())
        .await
        .context("register")?;
    println!("{message}");
    Ok(())
}

async fn cmd_login(config: &VaultConfig, username: &str) -> Result<()> {
    let password = read_secret("VAULT_PASSWORD", "Password: ")?;
    let token = connect(config)?
        .login(username, password.expose_secret())
        .await
        .context("login")?;
    eprintln!("Logged in as {username}. Export the token to use it:");
    println!("export VAULT_TOKEN={}", token.as_str());
    Ok(())
}

async fn cmd_logout(config: &VaultConfig, token: &SessionToken) -> Result<()> {
    connect(config)?.logout(token).await.context("logout")?;
    println!("Logged out");
    Ok(())
}

// ── Object commands ───────────────────────────────────────────────────────────

async fn cmd_upload(
    config: &VaultConfig,
    token: &SessionToken,
    file: &Path,
    name: Option<&str>,
) -> Result<()> {
    let name = match name {
        Some(n) => n.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("cannot derive a name from {}", file.display()))?,
    };

    let key = read_secret("VAULT_KEY", "Encryption password: ")?;
    let plaintext = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let blob = vault_crypto::encrypt(&plaintext, key.expose_secret()).context("encrypting")?;
    let size = blob.len() as u64;

    let stored = connect(config)?
        .upload(token, &name, blob)
        .await
        .context("upload")?;
    println!("Uploaded {} as {stored} ({})", file.display(), fmt_bytes(size));
    Ok(())
}

async fn cmd_download(
    config: &VaultConfig,
    token: &SessionToken,
    name: &str,
    output: Option<&Path>,
    raw: bool,
) -> Result<()> {
    let blob = connect(config)?
        .download(token, name)
        .await
        .context("download")?;

    let (bytes, default_out) = if raw {
        (blob, PathBuf::from(canonical_name(name)))
    } else {
        let key = read_secret("VAULT_KEY", "Decryption password: ")?;
        let plaintext = vault_crypto::decrypt(&blob, key.expose_secret())
            .with_context(|| format!("decrypting {name}"))?;
        (plaintext, plaintext_path(Path::new(&canonical_name(name))))
    };

    let output = output.map(Path::to_path_buf).unwrap_or(default_out);
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Downloaded {name} -> {} ({})", output.display(), fmt_bytes(bytes.len() as u64));
    Ok(())
}

async fn cmd_list(config: &VaultConfig, token: &SessionToken) -> Result<()> {
    let files = connect(config)?.list(token).await.context("list")?;
    if files.is_empty() {
        println!("No files stored");
        return Ok(());
    }
    println!("{:<40} {:>10}  {}", "NAME", "SIZE", "UPLOADED");
    for f in &files {
        println!(
            "{:<40} {:>10}  {}",
            f.logical_name,
            fmt_bytes(f.size),
            f.last_modified.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!("{} file(s)", files.len());
    Ok(())
}

async fn cmd_health(config: &VaultConfig) -> Result<()> {
    let body = connect(config)?.health().await.context("health check")?;
    let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("unknown");
    println!("{}: {status}", config.client.server_url);
    Ok(())
}
