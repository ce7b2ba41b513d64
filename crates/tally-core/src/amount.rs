//! Money values — integer minor units tagged with a currency code.
//!
//! Arithmetic is only defined between amounts of the same currency; anything
//! cross-currency is an error, never a silent coercion.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─── Currency ────────────────────────────────────────────────────────────────

/// An ISO-4217-style currency code: exactly three ASCII uppercase letters.
///
/// Serialises as the bare string, so it is usable as a JSON map key.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
  pub fn code(&self) -> &str {
    &self.0
  }
}

impl FromStr for Currency {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    if s.len() == 3 && s.bytes().all(|b| b.is_ascii_uppercase()) {
      Ok(Self(s.to_owned()))
    } else {
      Err(Error::InvalidCurrency(s.to_owned()))
    }
  }
}

impl TryFrom<String> for Currency {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> {
    s.parse()
  }
}

impl From<Currency> for String {
  fn from(c: Currency) -> Self {
    c.0
  }
}

impl fmt::Display for Currency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Amount ──────────────────────────────────────────────────────────────────

/// A non-negative quantity of minor units (e.g. cents) in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
  pub quantity: i64,
  pub currency: Currency,
}

impl Amount {
  /// Build an amount from a raw minor-unit quantity.
  pub fn new(quantity: i64, currency: Currency) -> Result<Self> {
    if quantity < 0 {
      return Err(Error::NegativeAmount(quantity));
    }
    Ok(Self { quantity, currency })
  }

  /// The zero amount of `currency`.
  pub fn zero(currency: Currency) -> Self {
    Self { quantity: 0, currency }
  }

  /// Scale whole major units into minor units (1 major unit = 100 minor).
  ///
  /// This is the boundary where caller-facing major units (`5` USD) become
  /// the stored representation (`500` cents).
  pub fn from_major(units: i64, currency: Currency) -> Result<Self> {
    if units < 0 {
      return Err(Error::NegativeAmount(units));
    }
    let quantity = units.checked_mul(100).ok_or(Error::AmountOverflow)?;
    Ok(Self { quantity, currency })
  }

  /// Add `other`, failing on currency mismatch or overflow.
  pub fn checked_add(&self, other: &Amount) -> Result<Self> {
    self.require_same_currency(other)?;
    let quantity = self
      .quantity
      .checked_add(other.quantity)
      .ok_or(Error::AmountOverflow)?;
    Ok(Self { quantity, currency: self.currency.clone() })
  }

  /// Subtract `other`, failing on currency mismatch or when the result
  /// would go below zero.
  pub fn checked_sub(&self, other: &Amount) -> Result<Self> {
    self.require_same_currency(other)?;
    let quantity = self
      .quantity
      .checked_sub(other.quantity)
      .ok_or(Error::AmountOverflow)?;
    if quantity < 0 {
      return Err(Error::NegativeAmount(quantity));
    }
    Ok(Self { quantity, currency: self.currency.clone() })
  }

  fn require_same_currency(&self, other: &Amount) -> Result<()> {
    if self.currency == other.currency {
      Ok(())
    } else {
      Err(Error::CurrencyMismatch {
        left:  self.currency.clone(),
        right: other.currency.clone(),
      })
    }
  }
}

impl fmt::Display for Amount {
  /// Render as major units with two decimal places, e.g. `5.00 USD`.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}.{:02} {}",
      self.quantity / 100,
      self.quantity % 100,
      self.currency
    )
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
