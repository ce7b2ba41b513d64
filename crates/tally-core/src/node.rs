//! The `NodeRpc` trait — the seam to the ledger node — and party
//! resolution built on top of it.
//!
//! The trait is implemented by node backends (e.g. `tally-node-sqlite`).
//! Higher layers (`tally-api`) depend on this abstraction, not on any
//! concrete backend. Every query returns a point-in-time snapshot, never a
//! live subscription.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  amount::Amount,
  error::Error as CoreError,
  identity::Party,
  obligation::Obligation,
};

// ─── Flow types ──────────────────────────────────────────────────────────────

/// The id of the ledger transaction that recorded a new state.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(pub [u8; 32]);

impl TryFrom<String> for TransactionId {
  type Error = CoreError;

  fn try_from(s: String) -> Result<Self, CoreError> {
    let bytes =
      hex::decode(&s).map_err(|e| CoreError::InvalidKey(e.to_string()))?;
    let id: [u8; 32] = bytes
      .try_into()
      .map_err(|_| CoreError::InvalidKey(format!("{s:?} is not 32 bytes")))?;
    Ok(TransactionId(id))
  }
}

impl From<TransactionId> for String {
  fn from(id: TransactionId) -> Self {
    hex::encode(id.0)
  }
}

impl fmt::Display for TransactionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&hex::encode(self.0))
  }
}

/// Typed command for the obligation issuance flow.
///
/// The local node always takes the borrower role; `lender` is the resolved
/// counterparty. `anonymous` asks the flow to record the lender as a
/// key-only reference instead of its well-known identity.
#[derive(Debug, Clone)]
pub struct IssueCommand {
  pub amount:    Amount,
  pub lender:    Party,
  pub anonymous: bool,
}

/// Outcome of a committed flow: the recording transaction and the single
/// output state it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResult {
  pub tx_id: TransactionId,
  pub state: Obligation,
}

/// A flow submission either fails in transit or is rejected by the ledger's
/// contract rules; the two are not the same failure class.
#[derive(Debug, Error)]
pub enum FlowError<E: std::error::Error + 'static> {
  /// The ledger refused the proposed state; carries the engine's message.
  #[error("{0}")]
  Rejected(String),

  /// The node was unreachable or answered malformed data.
  #[error("node error: {0}")]
  Node(#[source] E),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the connection to a ledger node.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). The connection
/// must support concurrent use by multiple in-flight requests.
pub trait NodeRpc: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The node's own well-known identity.
  fn node_identity(
    &self,
  ) -> impl Future<Output = Result<Party, Self::Error>> + Send + '_;

  /// Snapshot of all other parties currently on the network map.
  fn network_peers(
    &self,
  ) -> impl Future<Output = Result<Vec<Party>, Self::Error>> + Send + '_;

  /// Point-in-time snapshot of all obligation states visible in the vault.
  fn obligations(
    &self,
  ) -> impl Future<Output = Result<Vec<Obligation>, Self::Error>> + Send + '_;

  /// All well-known parties whose organisation name contains `fragment`,
  /// case-insensitively.
  fn parties_from_name<'a>(
    &'a self,
    fragment: &'a str,
  ) -> impl Future<Output = Result<Vec<Party>, Self::Error>> + Send + 'a;

  /// Run the issuance flow and block until it commits or fails. Once
  /// submitted the flow runs to completion independently of the caller;
  /// no cancellation is exposed.
  fn issue_obligation(
    &self,
    command: IssueCommand,
  ) -> impl Future<Output = Result<FlowResult, FlowError<Self::Error>>> + Send + '_;
}

// ─── Party resolution ────────────────────────────────────────────────────────

/// Failure modes of [`resolve_party`].
#[derive(Debug, Error)]
pub enum ResolveError<E: std::error::Error + 'static> {
  #[error("Couldn't lookup node identity for {0}.")]
  NotFound(String),

  /// More than one directory entry matched; the caller must disambiguate.
  /// Never silently picks one.
  #[error("{fragment} matches multiple parties: {}", .candidates.join("; "))]
  Ambiguous {
    fragment:   String,
    candidates: Vec<String>,
  },

  #[error("directory lookup failed: {0}")]
  Node(#[source] E),
}

/// Resolve a caller-supplied name fragment to exactly one well-known party
/// via the node's directory.
pub async fn resolve_party<N: NodeRpc>(
  node: &N,
  fragment: &str,
) -> Result<Party, ResolveError<N::Error>> {
  let mut matches = node
    .parties_from_name(fragment)
    .await
    .map_err(ResolveError::Node)?;

  match matches.len() {
    0 => Err(ResolveError::NotFound(fragment.to_owned())),
    1 => Ok(matches.remove(0)),
    _ => Err(ResolveError::Ambiguous {
      fragment:   fragment.to_owned(),
      candidates: matches.iter().map(|p| p.name.to_string()).collect(),
    }),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
