//! Handlers for the identity endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me`    | Identity cached at startup |
//! | `GET`  | `/peers` | Live directory snapshot per call |

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tally_core::node::NodeRpc;

use crate::{AppState, error::ApiError};

/// `GET /me`
pub async fn me<N>(State(state): State<AppState<N>>) -> Json<Value>
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  Json(json!({ "me": state.identity.name.to_string() }))
}

/// `GET /peers`
pub async fn peers<N>(
  State(state): State<AppState<N>>,
) -> Result<Json<Value>, ApiError>
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  let peers = state.node.network_peers().await.map_err(ApiError::node)?;
  let names: Vec<String> =
    peers.iter().map(|p| p.name.to_string()).collect();
  Ok(Json(json!({ "peers": names })))
}
