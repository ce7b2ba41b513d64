//! Integration tests driving the API router against an in-memory node.

use std::{future::Future, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use tally_core::{
  identity::{Party, PartyName, PublicKey},
  node::{FlowError, FlowResult, IssueCommand, NodeRpc},
  obligation::Obligation,
};
use tally_node_sqlite::SqliteNode;
use tower::ServiceExt as _;

use crate::{AppState, api_router};

fn name(org: &str) -> PartyName {
  PartyName {
    organisation: org.to_owned(),
    locality:     "London".to_owned(),
    country:      "GB".to_owned(),
  }
}

/// A node for PartyA with two seeded peers.
async fn make_state() -> AppState<SqliteNode> {
  let node = SqliteNode::open_in_memory().await.unwrap();
  node.ensure_local_identity(name("PartyA")).await.unwrap();
  node.register_peer(name("PartyB")).await.unwrap();
  node
    .register_peer(name("First Bank of Partyville"))
    .await
    .unwrap();
  AppState::initialise(Arc::new(node)).await.unwrap()
}

async fn get<N>(state: AppState<N>, uri: &str) -> Response
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  api_router(state).oneshot(req).await.unwrap()
}

async fn post_json<N>(state: AppState<N>, uri: &str, body: Value) -> Response
where
  N: NodeRpc + Clone + Send + Sync + 'static,
{
  let req = Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap();
  api_router(state).oneshot(req).await.unwrap()
}

async fn body_string(resp: Response) -> String {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> Value {
  serde_json::from_str(&body_string(resp).await).unwrap()
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn me_returns_the_startup_cached_identity() {
  let resp = get(make_state().await, "/me").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    body_json(resp).await,
    json!({ "me": "O=PartyA, L=London, C=GB" })
  );
}

#[tokio::test]
async fn peers_lists_the_directory_without_self() {
  let resp = get(make_state().await, "/peers").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    body_json(resp).await,
    json!({
      "peers": [
        "O=First Bank of Partyville, L=London, C=GB",
        "O=PartyB, L=London, C=GB",
      ]
    })
  );
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn obligations_start_empty() {
  let resp = get(make_state().await, "/obligations").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn owed_per_currency_starts_empty() {
  let resp = get(make_state().await, "/owed-per-currency").await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await, json!({}));
}

// ─── Issuance ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn issuing_scales_major_units_and_lands_in_the_vault() {
  let state = make_state().await;

  let resp = post_json(
    state.clone(),
    "/obligations",
    json!({ "amount": 5, "currency": "USD", "party": "partyb" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let text = body_string(resp).await;
  assert!(text.contains("committed to ledger."), "{text}");
  assert!(text.contains("owes"), "{text}");

  // Input of 5 major units is stored as 500 minor units.
  let resp = get(state.clone(), "/obligations").await;
  let vault = body_json(resp).await;
  assert_eq!(vault.as_array().unwrap().len(), 1);
  assert_eq!(vault[0]["amount"]["quantity"], json!(500));
  assert_eq!(vault[0]["amount"]["currency"], json!("USD"));
  assert_eq!(vault[0]["paid"]["quantity"], json!(0));

  // The counterparty is the lender, so the full amount is owed to us.
  let resp = get(state, "/owed-per-currency").await;
  assert_eq!(body_json(resp).await, json!({ "USD": 500 }));
}

#[tokio::test]
async fn issuing_sums_owed_amounts_per_currency() {
  let state = make_state().await;

  for (amount, currency, party) in
    [(5, "USD", "partyb"), (3, "USD", "bank"), (7, "GBP", "partyb")]
  {
    let resp = post_json(
      state.clone(),
      "/obligations",
      json!({ "amount": amount, "currency": currency, "party": party }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  let resp = get(state, "/owed-per-currency").await;
  assert_eq!(body_json(resp).await, json!({ "GBP": 700, "USD": 800 }));
}

#[tokio::test]
async fn issuing_to_an_unknown_party_is_404_with_the_lookup_message() {
  let resp = post_json(
    make_state().await,
    "/obligations",
    json!({ "amount": 5, "currency": "USD", "party": "Nonexistent" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(
    body_json(resp).await,
    json!({ "error": "Couldn't lookup node identity for Nonexistent." })
  );
}

#[tokio::test]
async fn issuing_to_an_ambiguous_name_is_400_naming_candidates() {
  let resp = post_json(
    make_state().await,
    "/obligations",
    json!({ "amount": 5, "currency": "USD", "party": "party" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let error = body_json(resp).await["error"].as_str().unwrap().to_owned();
  assert!(error.contains("matches multiple parties"), "{error}");
  assert!(error.contains("O=PartyB, L=London, C=GB"), "{error}");
  assert!(error.contains("First Bank of Partyville"), "{error}");
}

#[tokio::test]
async fn issuing_with_a_malformed_currency_is_400() {
  let resp = post_json(
    make_state().await,
    "/obligations",
    json!({ "amount": 5, "currency": "dollars", "party": "partyb" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let error = body_json(resp).await["error"].as_str().unwrap().to_owned();
  assert!(error.contains("invalid currency code"), "{error}");
}

#[tokio::test]
async fn issuing_a_negative_amount_is_400() {
  let resp = post_json(
    make_state().await,
    "/obligations",
    json!({ "amount": -5, "currency": "USD", "party": "partyb" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_party_wins_over_a_malformed_currency() {
  // The counterparty is resolved before the amount is parsed, so a request
  // that is wrong on both counts reports the lookup failure.
  let resp = post_json(
    make_state().await,
    "/obligations",
    json!({ "amount": 5, "currency": "dollars", "party": "Nonexistent" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  assert_eq!(
    body_json(resp).await,
    json!({ "error": "Couldn't lookup node identity for Nonexistent." })
  );
}

#[tokio::test]
async fn zero_amount_issuance_is_rejected_by_the_flow() {
  // Zero passes input validation; the ledger's contract rules reject it.
  let resp = post_json(
    make_state().await,
    "/obligations",
    json!({ "amount": 0, "currency": "USD", "party": "partyb" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let error = body_json(resp).await["error"].as_str().unwrap().to_owned();
  assert!(error.contains("strictly positive"), "{error}");
}

// ─── Node failures ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("rpc connection lost")]
struct ConnectionLost;

/// A node whose connection dropped after startup: the cached identity is
/// still served, every RPC fails.
#[derive(Clone)]
struct UnreachableNode {
  identity: Party,
}

impl UnreachableNode {
  fn new() -> Self {
    Self {
      identity: Party {
        name:       name("PartyA"),
        owning_key: PublicKey([1; 32]),
      },
    }
  }
}

impl NodeRpc for UnreachableNode {
  type Error = ConnectionLost;

  fn node_identity(
    &self,
  ) -> impl Future<Output = Result<Party, ConnectionLost>> + Send + '_ {
    async { Ok(self.identity.clone()) }
  }

  fn network_peers(
    &self,
  ) -> impl Future<Output = Result<Vec<Party>, ConnectionLost>> + Send + '_ {
    async { Err(ConnectionLost) }
  }

  fn obligations(
    &self,
  ) -> impl Future<Output = Result<Vec<Obligation>, ConnectionLost>> + Send + '_
  {
    async { Err(ConnectionLost) }
  }

  fn parties_from_name<'a>(
    &'a self,
    _fragment: &'a str,
  ) -> impl Future<Output = Result<Vec<Party>, ConnectionLost>> + Send + 'a {
    async { Err(ConnectionLost) }
  }

  fn issue_obligation(
    &self,
    _command: IssueCommand,
  ) -> impl Future<Output = Result<FlowResult, FlowError<ConnectionLost>>> + Send + '_
  {
    async { Err(FlowError::Node(ConnectionLost)) }
  }
}

async fn unreachable_state() -> AppState<UnreachableNode> {
  AppState::initialise(Arc::new(UnreachableNode::new()))
    .await
    .unwrap()
}

#[tokio::test]
async fn query_against_an_unreachable_node_is_502() {
  for uri in ["/obligations", "/owed-per-currency", "/peers"] {
    let resp = get(unreachable_state().await, uri).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY, "{uri}");
    let error = body_json(resp).await["error"].as_str().unwrap().to_owned();
    assert!(error.contains("rpc connection lost"), "{uri}: {error}");
  }
}

#[tokio::test]
async fn issuance_against_an_unreachable_node_is_502() {
  let resp = post_json(
    unreachable_state().await,
    "/obligations",
    json!({ "amount": 5, "currency": "USD", "party": "PartyB" }),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
  let error = body_json(resp).await["error"].as_str().unwrap().to_owned();
  assert!(error.contains("rpc connection lost"), "{error}");
}
