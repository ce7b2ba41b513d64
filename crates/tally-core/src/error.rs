//! Error types for `tally-core`.

use thiserror::Error;

use crate::amount::Currency;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid currency code: {0:?}")]
  InvalidCurrency(String),

  #[error("currency mismatch: {left} vs {right}")]
  CurrencyMismatch { left: Currency, right: Currency },

  #[error("amount quantity must be non-negative, got {0}")]
  NegativeAmount(i64),

  #[error("amount quantity overflow")]
  AmountOverflow,

  #[error("payment of {payment} would exceed the obligation amount {amount}")]
  Overpayment { amount: String, payment: String },

  #[error("lender and borrower must be distinct parties")]
  SelfObligation,

  #[error("invalid public key encoding: {0}")]
  InvalidKey(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
