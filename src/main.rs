//! XV Telemetry CLI
//!
//! Resolve the collection mode, replay interactions, or pull aggregates.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xv_telemetry::{
    host_device_id, AggregateReader, ClientConfig, Endpoint, HttpTransport, Interpretation,
    OperatingMode, TelemetryClient, Transport, VERSION,
};

#[derive(Parser)]
#[command(name = "xv-telemetry")]
#[command(version = VERSION)]
#[command(about = "Mode-gated session and interaction telemetry client", long_about = None)]
struct Cli {
    /// JSON config file (root_url, app_id, app_version, request_timeout_secs)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log requests and responses
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the server which mode to run in
    Mode {
        /// Base URL of the collection scripts
        #[arg(long)]
        root_url: Option<String>,
    },

    /// Set up, then record `instrument key` pairs read from stdin
    Replay {
        /// Base URL of the collection scripts
        #[arg(long)]
        root_url: Option<String>,

        /// Application identifier
        #[arg(long)]
        app_id: Option<String>,

        /// Application version
        #[arg(long)]
        app_version: Option<String>,

        /// Device identifier (derived from the host name if not specified)
        #[arg(long)]
        device_id: Option<String>,
    },

    /// Pull all session reports (master role)
    PullSessions {
        /// Base URL of the collection scripts
        #[arg(long)]
        root_url: Option<String>,
    },

    /// Pull all performance batches (master role)
    PullPerformance {
        /// Base URL of the collection scripts
        #[arg(long)]
        root_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file_config = match &cli.config {
        Some(path) => Some(load_config(path)?),
        None => None,
    };

    match cli.command {
        Commands::Mode { root_url } => {
            let config = resolve_config(file_config, root_url, None, None)?;
            cmd_mode(&config).await
        }
        Commands::Replay {
            root_url,
            app_id,
            app_version,
            device_id,
        } => {
            let config = resolve_config(file_config, root_url, app_id, app_version)?;
            cmd_replay(&config, device_id).await
        }
        Commands::PullSessions { root_url } => {
            let config = resolve_config(file_config, root_url, None, None)?;
            cmd_pull(&config, false).await
        }
        Commands::PullPerformance { root_url } => {
            let config = resolve_config(file_config, root_url, None, None)?;
            cmd_pull(&config, true).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,xv_telemetry=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<ClientConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {path:?}"))?;
    Ok(ClientConfig::from_json_str(&content)?)
}

/// Merge command-line values over the config file.
fn resolve_config(
    file_config: Option<ClientConfig>,
    root_url: Option<String>,
    app_id: Option<String>,
    app_version: Option<String>,
) -> Result<ClientConfig> {
    let mut config = match (file_config, root_url.clone()) {
        (Some(config), _) => config,
        (None, Some(root_url)) => ClientConfig::new(root_url, "xv-telemetry", VERSION),
        (None, None) => bail!("--root-url is required when no --config is given"),
    };

    if let Some(root_url) = root_url {
        config.root_url = root_url;
    }
    if let Some(app_id) = app_id {
        config.app_id = app_id;
    }
    if let Some(app_version) = app_version {
        config.app_version = app_version;
    }

    config.validate()?;
    Ok(config)
}

async fn cmd_mode(config: &ClientConfig) -> Result<()> {
    // Pull the mode directly so no session report is sent
    let transport = HttpTransport::new(config.request_timeout())?;
    let url = Endpoint::GetMode.url(&config.root_url);

    let response = transport
        .pull(&url, Interpretation::Text)
        .await
        .with_context(|| format!("Could not reach {url}"))?;

    println!("{}", OperatingMode::from_wire(&response.text()).as_wire());
    Ok(())
}

async fn cmd_replay(config: &ClientConfig, device_id: Option<String>) -> Result<()> {
    let device_id = device_id.unwrap_or_else(host_device_id);
    let client = TelemetryClient::http(config, device_id, tokio::runtime::Handle::current())?;

    println!("XV Telemetry v{VERSION}");
    println!("  Device ID: {}", client.device_id());

    let mode = client.setup_with(config).await;
    println!("  Mode: {mode}");
    if !mode.records_events() {
        eprintln!("Warning: server mode does not accept interaction events; input is ignored");
    }

    let stdin = std::io::stdin();
    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_pair(line) {
            Some((instrument, key)) => client.record(instrument, key),
            None => eprintln!("Warning: skipping line {}: '{line}'", line_no + 1),
        }
    }

    client.settle().await;

    let dropped = client.pending_events();
    if dropped > 0 {
        eprintln!("Note: {dropped} events did not fill a batch and were not sent");
    }

    println!();
    println!("{}", client.stats_summary());
    Ok(())
}

fn parse_pair(line: &str) -> Option<(i64, i64)> {
    let mut parts = line.split_whitespace();
    let instrument = parts.next()?.parse().ok()?;
    let key = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((instrument, key))
}

async fn cmd_pull(config: &ClientConfig, performance: bool) -> Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.request_timeout())?);
    let reader = AggregateReader::new(transport, config.root_url.clone());

    let value = if performance {
        reader.pull_performance_data().await?
    } else {
        reader.pull_session_data().await?
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("3 12"), Some((3, 12)));
        assert_eq!(parse_pair("  -1\t4 "), Some((-1, 4)));
        assert_eq!(parse_pair("3"), None);
        assert_eq!(parse_pair("3 4 5"), None);
        assert_eq!(parse_pair("a b"), None);
    }

    #[test]
    fn test_command_line_overrides_config() {
        let file = ClientConfig::new("https://a.org/", "app", "1.0");
        let config = resolve_config(
            Some(file),
            Some("https://b.org/".to_string()),
            None,
            Some("2.0".to_string()),
        )
        .unwrap();

        assert_eq!(config.root_url, "https://b.org/");
        assert_eq!(config.app_id, "app");
        assert_eq!(config.app_version, "2.0");
    }

    #[test]
    fn test_root_url_required() {
        assert!(resolve_config(None, None, None, None).is_err());
    }
}
