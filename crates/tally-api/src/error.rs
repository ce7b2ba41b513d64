//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Client-correctable failures (unknown counterparty, ambiguous match,
//! malformed currency) map to 4xx; a ledger-rule rejection is 422 with the
//! engine's message; node transport failures are 502 and never collapsed
//! into the client-error path.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::node::{FlowError, ResolveError};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The ledger rejected the submitted flow.
  #[error("flow rejected: {0}")]
  Flow(String),

  #[error("node error: {0}")]
  Node(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn node<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Node(Box::new(err))
  }

  pub fn from_resolve<E>(err: ResolveError<E>) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match err {
      ResolveError::Node(e) => ApiError::Node(Box::new(e)),
      not_found @ ResolveError::NotFound(_) => {
        ApiError::NotFound(not_found.to_string())
      }
      ambiguous @ ResolveError::Ambiguous { .. } => {
        ApiError::BadRequest(ambiguous.to_string())
      }
    }
  }

  pub fn from_flow<E>(err: FlowError<E>) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match err {
      FlowError::Rejected(message) => ApiError::Flow(message),
      FlowError::Node(e) => ApiError::Node(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Flow(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Node(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
