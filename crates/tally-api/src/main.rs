//! tallyd server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! in-process SQLite node, bootstraps the node identity and the configured
//! peers, and serves the obligation API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tally_api::{AppState, ServerConfig, api_router};
use tally_core::{identity::PartyName, node::NodeRpc as _};
use tally_node_sqlite::SqliteNode;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "tally obligation node server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TALLY"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the node database.
  let node = SqliteNode::open(&server_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open node store at {:?}", server_cfg.store_path)
    })?;

  // Bootstrap the node's own identity, then seed configured peers that are
  // not yet in the directory.
  let identity = node
    .ensure_local_identity(PartyName {
      organisation: server_cfg.organisation.clone(),
      locality:     server_cfg.locality.clone(),
      country:      server_cfg.country.clone(),
    })
    .await
    .context("failed to bootstrap node identity")?;
  tracing::info!("node identity: {}", identity.name);

  for peer in &server_cfg.peers {
    let known = node
      .parties_from_name(&peer.organisation)
      .await?
      .iter()
      .any(|p| p.name.organisation == peer.organisation);
    if !known {
      let registered = node
        .register_peer(PartyName {
          organisation: peer.organisation.clone(),
          locality:     peer.locality.clone(),
          country:      peer.country.clone(),
        })
        .await?;
      tracing::info!("registered peer: {}", registered.name);
    }
  }

  // Build application state — the identity lookup happens exactly once here.
  let state = AppState::initialise(Arc::new(node))
    .await
    .context("failed to initialise API state")?;

  let app = api_router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
