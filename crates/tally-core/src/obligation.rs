//! The obligation entity — one peer-to-peer debt record — and the
//! currency-grouped aggregation over a vault snapshot.
//!
//! An obligation is an immutable value. All mutator-named operations are pure
//! transformations that return a new instance carrying the same `id`; the
//! persisted record lives on the external ledger, this type is only an
//! in-memory projection of it.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  amount::{Amount, Currency},
  error::{Error, Result},
  identity::AbstractParty,
};

// ─── Obligation ──────────────────────────────────────────────────────────────

/// A debt of `amount` owed by `borrower` to `lender`, of which `paid` has
/// been repaid so far. Two obligations are the same entity iff their `id`
/// matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
  pub amount:   Amount,
  pub lender:   AbstractParty,
  pub borrower: AbstractParty,
  pub paid:     Amount,
  pub id:       Uuid,
}

impl Obligation {
  /// Create a fresh obligation: `paid` starts at zero in the amount's
  /// currency and `id` is newly generated.
  pub fn new(
    amount: Amount,
    lender: AbstractParty,
    borrower: AbstractParty,
  ) -> Result<Self> {
    if lender.owning_key() == borrower.owning_key() {
      return Err(Error::SelfObligation);
    }
    let paid = Amount::zero(amount.currency.clone());
    Ok(Self { amount, lender, borrower, paid, id: Uuid::new_v4() })
  }

  /// Rehydrate a previously persisted record with all fields supplied.
  pub fn from_parts(
    amount: Amount,
    lender: AbstractParty,
    borrower: AbstractParty,
    paid: Amount,
    id: Uuid,
  ) -> Result<Self> {
    if amount.currency != paid.currency {
      return Err(Error::CurrencyMismatch {
        left:  amount.currency,
        right: paid.currency,
      });
    }
    Ok(Self { amount, lender, borrower, paid, id })
  }

  /// Both parties on the record, lender first.
  pub fn participants(&self) -> [&AbstractParty; 2] {
    [&self.lender, &self.borrower]
  }

  /// A copy with `delta` added to the paid total.
  ///
  /// Fails on currency mismatch, or when the new total would exceed the
  /// obligation amount — an over-paid record is a state the ledger's
  /// contract rules would never accept.
  pub fn pay(&self, delta: &Amount) -> Result<Self> {
    let paid = self.paid.checked_add(delta)?;
    if paid.quantity > self.amount.quantity {
      return Err(Error::Overpayment {
        amount:  self.amount.to_string(),
        payment: paid.to_string(),
      });
    }
    Ok(Self { paid, ..self.clone() })
  }

  /// A copy with the lender replaced — models a lender transfer.
  pub fn with_new_lender(&self, new_lender: AbstractParty) -> Self {
    Self { lender: new_lender, ..self.clone() }
  }

  /// A copy with the lender replaced by the null-party sentinel — models the
  /// lender exiting or anonymising the record.
  pub fn without_lender(&self) -> Self {
    Self { lender: AbstractParty::null_party(), ..self.clone() }
  }
}

impl fmt::Display for Obligation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Obligation({}): {} owes {} {} and has paid {} so far.",
      self.id,
      self.borrower.display_name(),
      self.lender.display_name(),
      self.amount,
      self.paid
    )
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Total obligation amounts grouped by currency, excluding records where
/// `me` already is the lender.
///
/// Currencies with no surviving obligations are absent from the result, not
/// zero. `BTreeMap` keeps the output deterministically ordered. Totals that
/// would exceed `i64::MAX` clamp there rather than wrapping.
pub fn owed_per_currency<'a, I>(
  obligations: I,
  me: &AbstractParty,
) -> BTreeMap<Currency, i64>
where
  I: IntoIterator<Item = &'a Obligation>,
{
  let mut totals = BTreeMap::new();
  for obligation in obligations {
    if obligation.lender.owning_key() == me.owning_key() {
      continue;
    }
    let total =
      totals.entry(obligation.amount.currency.clone()).or_insert(0i64);
    *total = total.saturating_add(obligation.amount.quantity);
  }
  totals
}

// ─── Tests ───────────────────────────────────────────────────────────────────
