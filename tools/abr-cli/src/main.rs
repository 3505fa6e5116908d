//! ABR-CLI: command-line client for the ABR compose server.
//!
//! Talks to the server over the same HTTP and WebSocket routes as the
//! compose UI. Every read first refreshes (and validates) the state.
//!
//! ## Usage
//!
//! ```bash
//! # Print one subtree of the state
//! abr-cli get /impressions
//!
//! # Point at a remote server and follow every change
//! abr-cli --server http://abr.example.org:8000 watch
//!
//! # Edit a value; anything that is not JSON is sent as a string
//! abr-cli set /impressions/<uuid>/name "Temperature"
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use abr_client::{ClientConfig, SchemaValidator, Session};
use abr_telemetry::{init_telemetry, TelemetryConfig};
use commands::Command;

/// ABR compose state client
#[derive(Parser, Debug)]
#[command(name = "abr-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HTTP base URL of the compose server
    #[arg(long, env = "ABR_SERVER_URL")]
    server: Option<String>,

    /// Push channel URL (derived from --server when omitted)
    #[arg(long, env = "ABR_WS_URL")]
    ws_url: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate against a local schema file instead of the server's
    #[arg(long)]
    schema_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        }
        .with_env_overrides();

        if let Some(server) = &self.server {
            config.server.base_url = server.clone();
        }
        if let Some(ws_url) = &self.ws_url {
            config.server.ws_url = Some(ws_url.clone());
        }
        Ok(config)
    }

    fn session(&self) -> Result<Session> {
        let config = self.client_config()?;
        let Some(path) = &self.schema_file else {
            return Ok(Session::new(config)?);
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading schema {}", path.display()))?;
        let schema = serde_json::from_str(&text)
            .with_context(|| format!("parsing schema {}", path.display()))?;
        let transport = std::sync::Arc::new(abr_client::HttpTransport::new(&config.server)?);
        Ok(Session::with_validator(
            config,
            transport,
            SchemaValidator::from_schema(schema),
        )?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = init_telemetry(&TelemetryConfig::for_tool("abr-cli").verbose(args.verbose)) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    let session = args.session()?;
    let result = commands::run(args.command, &session).await;
    session.shutdown().await;
    result
}
