//! Handlers for the obligation endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/obligations` | Full vault snapshot, unfiltered by party |
//! | `POST` | `/obligations` | Body: `{"amount":5,"currency":"USD","party":"PartyB"}` |
//! | `GET`  | `/owed-per-currency` | Totals owed to this node, per currency |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  amount::{Amount, Currency},
  identity::AbstractParty,
  node::{IssueCommand, NodeRpc, resolve_party},
  obligation::{self, Obligation},
};

use crate::{AppState, error::ApiError};

// ─── Queries ─────────────────────────────────────────────────────────────────

/// `GET /obligations`
pub async fn list<N>(
  State(state): State<AppState<N>>,
) -> Result<Json<Vec<Obligation>>, ApiError>
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  let snapshot = state.node.obligations().await.map_err(ApiError::node)?;
  Ok(Json(snapshot))
}

/// `GET /owed-per-currency`
pub async fn owed_per_currency<N>(
  State(state): State<AppState<N>>,
) -> Result<Json<BTreeMap<Currency, i64>>, ApiError>
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  let snapshot = state.node.obligations().await.map_err(ApiError::node)?;
  let me = AbstractParty::Known(state.identity.clone());
  Ok(Json(obligation::owed_per_currency(&snapshot, &me)))
}

// ─── Issuance ────────────────────────────────────────────────────────────────

/// Caller-facing issuance request. `amount` is in whole major units; the
/// node stores minor units.
#[derive(Debug, Deserialize)]
pub struct IssueBody {
  pub amount:   i64,
  pub currency: String,
  pub party:    String,
}

/// `POST /obligations`
///
/// Resolves the counterparty, submits the issuance flow, and blocks until
/// it commits or fails.
pub async fn issue<N>(
  State(state): State<AppState<N>>,
  Json(body): Json<IssueBody>,
) -> Result<impl IntoResponse, ApiError>
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  let lender = resolve_party(state.node.as_ref(), &body.party)
    .await
    .map_err(ApiError::from_resolve)?;

  let currency: Currency = body
    .currency
    .parse()
    .map_err(|e: tally_core::Error| ApiError::BadRequest(e.to_string()))?;
  let amount = Amount::from_major(body.amount, currency)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let result = state
    .node
    .issue_obligation(IssueCommand { amount, lender, anonymous: true })
    .await
    .map_err(ApiError::from_flow)?;

  let message = format!(
    "Transaction id {} committed to ledger.\n{}",
    result.tx_id, result.state
  );
  Ok((StatusCode::CREATED, message))
}
