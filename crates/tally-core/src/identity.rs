//! Party identities — named network parties and anonymous key-only
//! references.
//!
//! A party is ultimately identified by its owning public key. Names are a
//! directory concern: a key either resolves to a well-known organisation or
//! it stays anonymous and is rendered in base-58.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─── Public key ──────────────────────────────────────────────────────────────

/// An opaque 32-byte owning key. Serialises as its base-58 string form.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
  /// The well-known null key — owns the null party sentinel.
  pub const NULL: PublicKey = PublicKey([0u8; 32]);

  /// Base-58 rendering, used wherever a key stands in for a missing name.
  pub fn to_base58(&self) -> String {
    bs58::encode(self.0).into_string()
  }
}

impl TryFrom<String> for PublicKey {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Error> {
    let bytes = bs58::decode(&s)
      .into_vec()
      .map_err(|e| Error::InvalidKey(e.to_string()))?;
    let key: [u8; 32] = bytes
      .try_into()
      .map_err(|_| Error::InvalidKey(format!("{s:?} is not 32 bytes")))?;
    Ok(PublicKey(key))
  }
}

impl From<PublicKey> for String {
  fn from(key: PublicKey) -> Self {
    key.to_base58()
  }
}

impl fmt::Display for PublicKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_base58())
  }
}

// ─── Party name ──────────────────────────────────────────────────────────────

/// An X.500-style legal name for a party on the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyName {
  pub organisation: String,
  pub locality:     String,
  pub country:      String,
}

impl fmt::Display for PartyName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "O={}, L={}, C={}",
      self.organisation, self.locality, self.country
    )
  }
}

// ─── Parties ─────────────────────────────────────────────────────────────────

/// A well-known party: a legal name bound to an owning key by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
  pub name:       PartyName,
  pub owning_key: PublicKey,
}

/// A party reference as it appears on ledger states: either resolvable to a
/// well-known identity or an anonymous key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "party", rename_all = "snake_case")]
pub enum AbstractParty {
  Known(Party),
  Anonymous(PublicKey),
}

impl AbstractParty {
  /// The sentinel used when a lender exits or anonymises an obligation.
  pub const fn null_party() -> Self {
    AbstractParty::Anonymous(PublicKey::NULL)
  }

  pub fn owning_key(&self) -> PublicKey {
    match self {
      AbstractParty::Known(party) => party.owning_key,
      AbstractParty::Anonymous(key) => *key,
    }
  }

  /// Organisation name if the identity is well-known, otherwise the base-58
  /// form of the owning key.
  pub fn display_name(&self) -> String {
    match self {
      AbstractParty::Known(party) => party.name.organisation.clone(),
      AbstractParty::Anonymous(key) => key.to_base58(),
    }
  }
}

impl From<Party> for AbstractParty {
  fn from(party: Party) -> Self {
    AbstractParty::Known(party)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
