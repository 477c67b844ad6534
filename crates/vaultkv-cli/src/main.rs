//! `vaultkv`: command-line client for Vault key-value secrets.
//!
//! Works against v1 and v2 engines without the caller knowing which one a
//! path lives on: every command resolves the mount first.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vaultkv_client::{MountInfo, MountParsing, SealStatus, VaultClient, VaultConfig, VaultResponse};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// Read and write Vault key-value secrets on v1 and v2 engines alike.
#[derive(Parser)]
#[allow(clippy::struct_excessive_bools)]
#[command(
    name = "vaultkv",
    version,
    about = "vaultkv CLI: read, write, list, and delete Vault KV secrets",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         VAULT_ADDR        Server address (default: http://127.0.0.1:8200)\n  \
         VAULT_TOKEN       Authentication token\n  \
         VAULT_NAMESPACE   Enterprise namespace\n  \
         RUST_LOG          Log filter (overrides --log-level)\n\n\
         {DIM}Examples:{RESET}\n  \
         vaultkv write secret/myapp db_host=10.0.0.1 db_port=5432\n  \
         vaultkv read secret/myapp\n  \
         vaultkv --retries 5 list secret/\n  \
         vaultkv destroy secret/myapp 1,2"
    ),
)]
struct Cli {
    /// Vault server address.
    #[arg(long, env = "VAULT_ADDR", default_value = "http://127.0.0.1:8200")]
    addr: String,

    /// Authentication token.
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Enterprise namespace, sent as X-Vault-Namespace.
    #[arg(long, env = "VAULT_NAMESPACE")]
    namespace: Option<String>,

    /// Retries per call after a server error or network failure.
    #[arg(long, env = "VAULT_MAX_RETRIES", default_value = "0")]
    retries: u32,

    /// Delay between retries, in milliseconds.
    #[arg(long, env = "VAULT_RETRY_INTERVAL_MS", default_value = "1000")]
    retry_interval_ms: u64,

    /// Connect timeout, in seconds.
    #[arg(long, env = "VAULT_OPEN_TIMEOUT", default_value = "30")]
    open_timeout: u64,

    /// Request timeout, in seconds.
    #[arg(long, env = "VAULT_READ_TIMEOUT", default_value = "60")]
    read_timeout: u64,

    /// Skip TLS certificate verification.
    #[arg(long, default_value = "false")]
    skip_verify: bool,

    /// PEM file with an extra trust anchor.
    #[arg(long, env = "VAULT_SSL_CERT")]
    ca_cert: Option<PathBuf>,

    /// Fail when a mount lookup response cannot be fully parsed.
    #[arg(long, default_value = "false")]
    strict_mounts: bool,

    /// Drop a trailing slash from mount paths reported by Vault.
    #[arg(long, default_value = "false")]
    trim_mount_path: bool,

    /// Print raw JSON instead of formatted output.
    #[arg(long, default_value = "false")]
    json: bool,

    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a secret.
    Read {
        /// Secret path, mount included (e.g. "secret/myapp").
        path: String,
    },
    /// Write a secret from key=value pairs.
    Write {
        /// Secret path, mount included.
        path: String,
        /// Key-value pairs in key=value format.
        #[arg(required = true)]
        data: Vec<String>,
    },
    /// List keys under a prefix.
    List {
        /// Path prefix, mount included.
        path: String,
    },
    /// Delete a secret (all versions and metadata on v2).
    Delete {
        /// Secret path, mount included.
        path: String,
    },
    /// Soft-delete specific versions of a v2 secret.
    DeleteVersions {
        /// Secret path, mount included.
        path: String,
        /// Comma-separated version numbers.
        #[arg(required = true, value_delimiter = ',')]
        versions: Vec<u64>,
    },
    /// Restore soft-deleted versions of a v2 secret.
    Undelete {
        /// Secret path, mount included.
        path: String,
        /// Comma-separated version numbers.
        #[arg(required = true, value_delimiter = ',')]
        versions: Vec<u64>,
    },
    /// Permanently destroy versions of a v2 secret.
    Destroy {
        /// Secret path, mount included.
        path: String,
        /// Comma-separated version numbers.
        #[arg(required = true, value_delimiter = ',')]
        versions: Vec<u64>,
    },
    /// Show which mount and engine version serve a path.
    MountInfo {
        /// Any path under the mount.
        path: String,
    },
    /// Show vault seal status.
    Status,
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli)?;
    let json = cli.json;
    debug!(address = %client.config().address(), "client ready");

    let logical = client.logical();
    match cli.command {
        Commands::Read { path } => {
            let resp = logical.read(&path).await?;
            print_secret(&path, &resp, json)?;
        }
        Commands::Write { path, data } => {
            let body = parse_kv_pairs(&data)?;
            let resp = logical.write(&path, body).await?;
            print_outcome(&format!("Secret written to {BOLD}{path}{RESET}"), &resp, json)?;
        }
        Commands::List { path } => {
            let resp = logical.list(&path).await?;
            print_keys(&path, &resp, json)?;
        }
        Commands::Delete { path } => {
            let resp = logical.delete(&path).await?;
            print_outcome(&format!("Secret at {BOLD}{path}{RESET} deleted."), &resp, json)?;
        }
        Commands::DeleteVersions { path, versions } => {
            let resp = logical.delete_versions(&path, &versions).await?;
            let msg = format!("Versions {} of {BOLD}{path}{RESET} deleted.", join(&versions));
            print_outcome(&msg, &resp, json)?;
        }
        Commands::Undelete { path, versions } => {
            let resp = logical.undelete_versions(&path, &versions).await?;
            let msg = format!("Versions {} of {BOLD}{path}{RESET} restored.", join(&versions));
            print_outcome(&msg, &resp, json)?;
        }
        Commands::Destroy { path, versions } => {
            let resp = logical.destroy_versions(&path, &versions).await?;
            let msg = format!("Versions {} of {BOLD}{path}{RESET} destroyed.", join(&versions));
            print_outcome(&msg, &resp, json)?;
        }
        Commands::MountInfo { path } => {
            let mount = client.mount_info(&path).await?;
            print_mount(&mount, json);
        }
        Commands::Status => {
            let status = client.seal_status().await?;
            print_seal_status(&status, json)?;
        }
    }
    Ok(())
}

fn build_client(cli: &Cli) -> Result<VaultClient> {
    let mut builder = VaultConfig::builder(cli.addr.as_str())
        .token(cli.token.clone().unwrap_or_default())
        .open_timeout(Duration::from_secs(cli.open_timeout))
        .read_timeout(Duration::from_secs(cli.read_timeout))
        .ssl_verify(!cli.skip_verify)
        .max_retries(cli.retries)
        .retry_interval(Duration::from_millis(cli.retry_interval_ms));
    if let Some(ns) = &cli.namespace {
        builder = builder.namespace(ns.as_str());
    }
    if let Some(path) = &cli.ca_cert {
        let pem = std::fs::read(path)
            .with_context(|| format!("failed to read CA certificate: {}", path.display()))?;
        builder = builder.ca_pem(pem);
    }
    if cli.strict_mounts {
        builder = builder.mount_parsing(MountParsing::Strict);
    }
    if cli.trim_mount_path {
        builder = builder.trim_mount_path(true);
    }
    let config = builder.build()?;
    VaultClient::new(config).context("failed to create vault client")
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn retries_line(resp: &VaultResponse) {
    if resp.retries() > 0 {
        println!("  {DIM}(after {} retries){RESET}", resp.retries());
    }
}

fn print_secret(path: &str, resp: &VaultResponse, json: bool) -> Result<()> {
    let data = resp.data()?;
    if json {
        print_json(&data);
        return Ok(());
    }

    println!();
    header("📦", &format!("Secret: {path}"));
    match data.as_object() {
        Some(obj) => {
            for (k, v) in obj {
                kv_line(k, &display_value(v));
            }
        }
        None => print_json(&data),
    }
    let version = resp
        .metadata()
        .ok()
        .and_then(|m| m.get("version").and_then(Value::as_u64));
    if let Some(version) = version {
        println!();
        kv_line("Version", &version.to_string());
    }
    retries_line(resp);
    println!();
    Ok(())
}

fn print_keys(path: &str, resp: &VaultResponse, json: bool) -> Result<()> {
    let keys = resp.list_keys()?;
    if json {
        print_json(&Value::from(keys));
        return Ok(());
    }

    println!();
    header("📂", &format!("Keys: {path}"));
    if keys.is_empty() {
        println!("  {DIM}(empty){RESET}");
    } else {
        for key in &keys {
            println!("  {CYAN}├─{RESET} {key}");
        }
    }
    retries_line(resp);
    println!();
    Ok(())
}

fn print_outcome(msg: &str, resp: &VaultResponse, json: bool) -> Result<()> {
    if json {
        print_json(&resp.json()?);
        return Ok(());
    }
    println!();
    success(msg);
    retries_line(resp);
    println!();
    Ok(())
}

fn print_mount(mount: &MountInfo, json: bool) {
    if json {
        print_json(&serde_json::json!({
            "mount_path": mount.mount_path(),
            "engine_version": mount.engine_version(),
        }));
        return;
    }

    println!();
    header("🗂", "Mount");
    kv_line("Path", mount.mount_path());
    let version = match mount.engine_version() {
        0 => format!("{DIM}unknown (treated as 1){RESET}"),
        v => v.to_string(),
    };
    kv_line("Engine version", &version);
    println!();
}

fn print_seal_status(status: &SealStatus, json: bool) -> Result<()> {
    if json {
        print_json(&serde_json::to_value(status)?);
        return Ok(());
    }

    println!();
    header("🔐", "Vault Status");
    let sealed = if status.sealed {
        format!("{RED}yes{RESET}")
    } else {
        format!("{GREEN}no{RESET}")
    };
    kv_line("Sealed", &sealed);
    kv_line("Threshold", &status.threshold.to_string());
    kv_line("Shares", &status.number_of_shares.to_string());
    kv_line("Unseal progress", &status.progress.to_string());
    println!();
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

fn parse_kv_pairs(pairs: &[String]) -> Result<Value> {
    let mut map = Map::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid key=value pair: '{pair}'"))?;
        map.insert(key.to_owned(), Value::String(value.to_owned()));
    }
    Ok(Value::Object(map))
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join(versions: &[u64]) -> String {
    versions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_json(value: &Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}
