//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings, keys as base-58,
//! transaction ids as lowercase hex, timestamps as RFC 3339.

use tally_core::{
  amount::Amount,
  identity::{AbstractParty, Party, PartyName, PublicKey},
  node::TransactionId,
  obligation::Obligation,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String {
  id.hyphenated().to_string()
}

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Ok(Uuid::parse_str(s)?)
}

pub fn encode_key(key: PublicKey) -> String {
  key.to_base58()
}

pub fn decode_key(s: &str) -> Result<PublicKey> {
  PublicKey::try_from(s.to_owned()).map_err(Error::Core)
}

pub fn encode_tx_id(id: TransactionId) -> String {
  String::from(id)
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A `parties` row as read from the database, before domain decoding.
pub struct RawParty {
  pub owning_key:   String,
  pub organisation: String,
  pub locality:     String,
  pub country:      String,
}

impl RawParty {
  pub fn decode(self) -> Result<Party> {
    Ok(Party {
      name:       PartyName {
        organisation: self.organisation,
        locality:     self.locality,
        country:      self.country,
      },
      owning_key: decode_key(&self.owning_key)?,
    })
  }
}

/// An `obligations` row joined against the directory for both parties.
pub struct RawObligation {
  pub obligation_id: String,
  pub quantity:      i64,
  pub currency:      String,
  pub paid:          i64,
  pub lender_key:    String,
  pub lender_known:  bool,
  pub borrower_key:  String,
  /// `(organisation, locality, country)` when the key resolves in the
  /// directory.
  pub lender_name:   Option<(String, String, String)>,
  pub borrower_name: Option<(String, String, String)>,
}

impl RawObligation {
  pub fn decode(self) -> Result<Obligation> {
    let currency: tally_core::amount::Currency = self
      .currency
      .parse()
      .map_err(|_| Error::Decode(format!("currency {:?}", self.currency)))?;

    let lender = if self.lender_known {
      decode_party(&self.lender_key, self.lender_name)?
    } else {
      AbstractParty::Anonymous(decode_key(&self.lender_key)?)
    };
    let borrower = decode_party(&self.borrower_key, self.borrower_name)?;

    Ok(Obligation::from_parts(
      Amount::new(self.quantity, currency.clone()).map_err(Error::Core)?,
      lender,
      borrower,
      Amount::new(self.paid, currency).map_err(Error::Core)?,
      decode_uuid(&self.obligation_id)?,
    )?)
  }
}

/// Map a stored key to a well-known identity where the directory still
/// resolves it; otherwise the reference stays anonymous.
fn decode_party(
  key: &str,
  name: Option<(String, String, String)>,
) -> Result<AbstractParty> {
  let owning_key = decode_key(key)?;
  Ok(match name {
    Some((organisation, locality, country)) => AbstractParty::Known(Party {
      name: PartyName { organisation, locality, country },
      owning_key,
    }),
    None => AbstractParty::Anonymous(owning_key),
  })
}
