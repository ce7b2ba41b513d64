//! JSON REST API for a tally obligation node.
//!
//! Exposes an axum [`Router`] backed by any [`tally_core::node::NodeRpc`].
//! TLS and transport concerns are the caller's responsibility.

pub mod error;
pub mod identity;
pub mod obligations;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use serde::Deserialize;
use tally_core::{identity::Party, node::NodeRpc};

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// A directory entry seeded at startup.
#[derive(Deserialize, Clone)]
pub struct PeerConfig {
  pub organisation: String,
  pub locality:     String,
  pub country:      String,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// The node's own legal name.
  pub organisation: String,
  pub locality:     String,
  pub country:      String,
  /// Peers registered into the directory on first boot.
  #[serde(default)]
  pub peers:        Vec<PeerConfig>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<N: NodeRpc> {
  pub node:     Arc<N>,
  /// The node's own identity, fetched exactly once during startup and
  /// immutable for the process lifetime.
  pub identity: Party,
}

impl<N: NodeRpc> AppState<N> {
  /// Perform the one-time identity lookup and build the handler state.
  pub async fn initialise(node: Arc<N>) -> Result<Self, ApiError> {
    let identity = node.node_identity().await.map_err(ApiError::node)?;
    Ok(Self { node, identity })
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<N>(state: AppState<N>) -> Router<()>
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/me", get(identity::me::<N>))
    .route("/peers", get(identity::peers::<N>))
    .route("/owed-per-currency", get(obligations::owed_per_currency::<N>))
    .route(
      "/obligations",
      get(obligations::list::<N>).post(obligations::issue::<N>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
