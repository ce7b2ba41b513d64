//! [`SqliteNode`] — the SQLite implementation of
//! [`NodeRpc`](tally_core::node::NodeRpc).

use std::{future::Future, path::Path};

use chrono::Utc;
use rand_core::{OsRng, RngCore};
use rusqlite::OptionalExtension as _;
use sha2::{Digest, Sha256};

use tally_core::{
  identity::{AbstractParty, Party, PartyName, PublicKey},
  node::{FlowError, FlowResult, IssueCommand, NodeRpc, TransactionId},
  obligation::Obligation,
};

use crate::{
  Error, Result,
  encode::{RawObligation, RawParty, encode_key, encode_tx_id, encode_uuid},
  schema::SCHEMA,
};

// ─── Node ────────────────────────────────────────────────────────────────────

/// A tally ledger node backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and the
/// connection supports concurrent use by multiple in-flight requests.
#[derive(Clone)]
pub struct SqliteNode {
  conn: tokio_rusqlite::Connection,
}

impl SqliteNode {
  /// Open (or create) a node database at `path` and run schema
  /// initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let node = Self { conn };
    node.init_schema().await?;
    Ok(node)
  }

  /// Open an in-memory node — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let node = Self { conn };
    node.init_schema().await?;
    Ok(node)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Identity bootstrap ────────────────────────────────────────────────

  /// Create the node's own identity with a fresh key on first boot; return
  /// the existing one on every boot after that.
  pub async fn ensure_local_identity(&self, name: PartyName) -> Result<Party> {
    if let Some(existing) = self.local_identity().await? {
      return Ok(existing);
    }
    let party = Party { name, owning_key: fresh_key() };
    self.insert_party(&party, true).await?;
    Ok(party)
  }

  /// Add a well-known peer to the directory, minting a key for it.
  ///
  /// On a production network the map is synchronised from the network
  /// operator; here it is seeded from configuration and tests.
  pub async fn register_peer(&self, name: PartyName) -> Result<Party> {
    let party = Party { name, owning_key: fresh_key() };
    self.insert_party(&party, false).await?;
    Ok(party)
  }

  async fn insert_party(&self, party: &Party, is_local: bool) -> Result<()> {
    let key = encode_key(party.owning_key);
    let name = party.name.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO parties
             (owning_key, organisation, locality, country, is_local)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            key,
            name.organisation,
            name.locality,
            name.country,
            is_local,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  async fn local_identity(&self) -> Result<Option<Party>> {
    let raw = self
      .conn
      .call(|conn| {
        let raw = conn
          .query_row(
            "SELECT owning_key, organisation, locality, country
             FROM parties WHERE is_local = 1",
            [],
            |r| {
              Ok(RawParty {
                owning_key:   r.get(0)?,
                organisation: r.get(1)?,
                locality:     r.get(2)?,
                country:      r.get(3)?,
              })
            },
          )
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawParty::decode).transpose()
  }

  async fn select_parties(&self, peers_only: bool) -> Result<Vec<Party>> {
    let raw = self
      .conn
      .call(move |conn| {
        let sql = if peers_only {
          "SELECT owning_key, organisation, locality, country
           FROM parties WHERE is_local = 0 ORDER BY organisation"
        } else {
          "SELECT owning_key, organisation, locality, country
           FROM parties ORDER BY organisation"
        };
        let mut stmt = conn.prepare(sql)?;
        let raw = stmt
          .query_map([], |r| {
            Ok(RawParty {
              owning_key:   r.get(0)?,
              organisation: r.get(1)?,
              locality:     r.get(2)?,
              country:      r.get(3)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(raw)
      })
      .await?;
    raw.into_iter().map(RawParty::decode).collect()
  }

  async fn vault_snapshot(&self) -> Result<Vec<Obligation>> {
    let raw = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT o.obligation_id, o.quantity, o.currency, o.paid,
                  o.lender_key, o.lender_known, o.borrower_key,
                  lp.organisation, lp.locality, lp.country,
                  bp.organisation, bp.locality, bp.country
           FROM obligations o
           LEFT JOIN parties lp
             ON lp.owning_key = o.lender_key AND o.lender_known = 1
           LEFT JOIN parties bp
             ON bp.owning_key = o.borrower_key
           ORDER BY o.recorded_at, o.obligation_id",
        )?;
        let raw = stmt
          .query_map([], |r| {
            Ok(RawObligation {
              obligation_id: r.get(0)?,
              quantity:      r.get(1)?,
              currency:      r.get(2)?,
              paid:          r.get(3)?,
              lender_key:    r.get(4)?,
              lender_known:  r.get(5)?,
              borrower_key:  r.get(6)?,
              lender_name:   zip3(r.get(7)?, r.get(8)?, r.get(9)?),
              borrower_name: zip3(r.get(10)?, r.get(11)?, r.get(12)?),
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(raw)
      })
      .await?;
    raw.into_iter().map(RawObligation::decode).collect()
  }
}

fn zip3(
  a: Option<String>,
  b: Option<String>,
  c: Option<String>,
) -> Option<(String, String, String)> {
  match (a, b, c) {
    (Some(a), Some(b), Some(c)) => Some((a, b, c)),
    _ => None,
  }
}

fn fresh_key() -> PublicKey {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  PublicKey(bytes)
}

/// The id of the transaction recording `state`: SHA-256 over the state's
/// canonical fields.
fn transaction_id(state: &Obligation) -> TransactionId {
  let mut hasher = Sha256::new();
  hasher.update(state.id.as_bytes());
  hasher.update(state.lender.owning_key().0);
  hasher.update(state.borrower.owning_key().0);
  hasher.update(state.amount.quantity.to_be_bytes());
  hasher.update(state.amount.currency.code().as_bytes());
  hasher.update(state.paid.quantity.to_be_bytes());
  TransactionId(hasher.finalize().into())
}

// ─── NodeRpc ─────────────────────────────────────────────────────────────────

impl NodeRpc for SqliteNode {
  type Error = Error;

  fn node_identity(
    &self,
  ) -> impl Future<Output = Result<Party>> + Send + '_ {
    async { self.local_identity().await?.ok_or(Error::IdentityMissing) }
  }

  fn network_peers(
    &self,
  ) -> impl Future<Output = Result<Vec<Party>>> + Send + '_ {
    self.select_parties(true)
  }

  fn obligations(
    &self,
  ) -> impl Future<Output = Result<Vec<Obligation>>> + Send + '_ {
    self.vault_snapshot()
  }

  fn parties_from_name<'a>(
    &'a self,
    fragment: &'a str,
  ) -> impl Future<Output = Result<Vec<Party>>> + Send + 'a {
    // Containment matching runs in Rust so fragments holding LIKE
    // metacharacters need no escaping.
    async move {
      let needle = fragment.to_lowercase();
      Ok(
        self
          .select_parties(false)
          .await?
          .into_iter()
          .filter(|p| p.name.organisation.to_lowercase().contains(&needle))
          .collect(),
      )
    }
  }

  fn issue_obligation(
    &self,
    command: IssueCommand,
  ) -> impl Future<Output = Result<FlowResult, FlowError<Error>>> + Send + '_
  {
    async move {
      let me = self
        .local_identity()
        .await
        .map_err(FlowError::Node)?
        .ok_or(FlowError::Node(Error::IdentityMissing))?;

      // Contract rules. A rejected flow leaves the vault untouched.
      if command.amount.quantity == 0 {
        return Err(FlowError::Rejected(
          "obligation amount must be strictly positive".to_owned(),
        ));
      }
      let lender = if command.anonymous {
        AbstractParty::Anonymous(command.lender.owning_key)
      } else {
        AbstractParty::Known(command.lender.clone())
      };
      let state =
        Obligation::new(command.amount, lender, AbstractParty::Known(me))
          .map_err(|e| FlowError::Rejected(e.to_string()))?;

      let tx_id = transaction_id(&state);
      let row = (
        encode_uuid(state.id),
        state.amount.quantity,
        state.amount.currency.code().to_owned(),
        state.paid.quantity,
        encode_key(state.lender.owning_key()),
        !command.anonymous,
        encode_key(state.borrower.owning_key()),
        encode_tx_id(tx_id),
        Utc::now().to_rfc3339(),
      );
      self
        .conn
        .call(move |conn| {
          conn.execute(
            "INSERT INTO obligations
               (obligation_id, quantity, currency, paid,
                lender_key, lender_known, borrower_key, tx_id, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
              row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7, row.8,
            ],
          )?;
          Ok(())
        })
        .await
        .map_err(|e| FlowError::Node(Error::Database(e)))?;

      Ok(FlowResult { tx_id, state })
    }
  }
}
