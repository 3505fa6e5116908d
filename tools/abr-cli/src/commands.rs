//! Subcommands.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use serde_json::Value;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use abr_client::{ClientEvent, EventFilter, HistogramRequest, Session, StatePath};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the value at a state path
    Get { path: String },

    /// Set the value at a state path (JSON, or a bare string)
    Set { path: String, value: String },

    /// Remove the subtree at a state path
    RemovePath { path: String },

    /// Remove every occurrence of a value (e.g. a VisAsset uuid)
    Remove { value: String },

    /// Undo the last state change on the server
    Undo,

    /// Redo the last undone change
    Redo,

    /// Print a named cache (visassets, datasets)
    Caches { name: String },

    /// List saved states
    States,

    /// Save the current state under a name
    Save { name: String },

    /// Load a saved state
    Load { name: String },

    /// Delete a saved state
    Delete { name: String },

    /// Histogram of a key data variable
    Histogram {
        organization: String,
        dataset: String,
        key_data: String,
        variable: String,
        #[arg(long, requires = "max")]
        min: Option<f64>,
        #[arg(long, requires = "min")]
        max: Option<f64>,
    },

    /// Connect the push channel and log every change until Ctrl-C
    Watch,
}

pub async fn run(command: Command, session: &Session) -> Result<()> {
    let state = session.state();
    match command {
        Command::Get { path } => {
            let path = parse_path(&path)?;
            state.refresh_state().await?;
            match state.get_path(&path) {
                Some(value) => print_json(&value)?,
                None => bail!("{path} not found"),
            }
        }
        Command::Set { path, value } => {
            state.update(&parse_path(&path)?, parse_value(&value)).await?;
        }
        Command::RemovePath { path } => state.remove_path(&parse_path(&path)?).await?,
        Command::Remove { value } => state.remove_all(&value).await?,
        Command::Undo => state.undo().await?,
        Command::Redo => state.redo().await?,
        Command::Caches { name } => print_json(&state.refresh_cache(&name).await?)?,
        Command::States => {
            for name in session.library().list_states().await? {
                println!("{name}");
            }
        }
        Command::Save { name } => println!("{}", session.library().save_state(&name).await?),
        Command::Load { name } => println!("{}", session.library().load_state(&name).await?),
        Command::Delete { name } => println!("{}", session.library().delete_state(&name).await?),
        Command::Histogram {
            organization,
            dataset,
            key_data,
            variable,
            min,
            max,
        } => {
            let mut request = HistogramRequest::new(organization, dataset, key_data, variable);
            if let (Some(min), Some(max)) = (min, max) {
                request = request.with_bounds(min, max);
            }
            let histogram = session.library().histogram(&request).await?;
            for bin in &histogram.histogram {
                println!("{:>14.6} {}", bin.bin_max, bin.items);
            }
        }
        Command::Watch => watch(session).await?,
    }
    Ok(())
}

async fn watch(session: &Session) -> Result<()> {
    let mut events = session.event_stream(EventFilter::all());
    session
        .connect()
        .await
        .context("connecting to the compose server")?;
    info!(keys = ?session.state().diff_keys(), "Initial state loaded");

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                log_event(session, &event);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn log_event(session: &Session, event: &ClientEvent) {
    match event {
        ClientEvent::StateReplaced { sequence } => {
            info!(sequence, changed = ?session.state().diff_keys(), "State replaced");
        }
        ClientEvent::StateRefreshFailed { sequence, reason } => {
            warn!(sequence, %reason, "State refresh rejected");
        }
        ClientEvent::CacheRefreshed { name } => info!(cache = %name, "Cache refreshed"),
        ClientEvent::ThumbnailUpdated { bytes } => info!(bytes, "Thumbnail updated"),
        ClientEvent::Connection(status) => info!(%status, "Push channel"),
    }
}

fn parse_path(text: &str) -> Result<StatePath> {
    text.parse()
        .with_context(|| format!("invalid state path {text:?}"))
}

/// JSON if it parses, otherwise the raw text as a string.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
