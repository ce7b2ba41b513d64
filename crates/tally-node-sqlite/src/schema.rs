//! SQL schema for the tally node.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The party directory (network map cache). Exactly one row carries
-- is_local = 1: the node's own identity.
CREATE TABLE IF NOT EXISTS parties (
    owning_key   TEXT PRIMARY KEY,   -- base-58
    organisation TEXT NOT NULL,
    locality     TEXT NOT NULL,
    country      TEXT NOT NULL,
    is_local     INTEGER NOT NULL DEFAULT 0
);

-- The vault: current obligation states. A state lands here atomically when
-- its issuing flow commits; there is no partially-issued row.
CREATE TABLE IF NOT EXISTS obligations (
    obligation_id TEXT PRIMARY KEY,             -- hyphenated UUID
    quantity      INTEGER NOT NULL CHECK (quantity >= 0),
    currency      TEXT NOT NULL,
    paid          INTEGER NOT NULL DEFAULT 0 CHECK (paid >= 0),
    lender_key    TEXT NOT NULL,                -- base-58
    lender_known  INTEGER NOT NULL DEFAULT 1,   -- 0: recorded anonymously
    borrower_key  TEXT NOT NULL,                -- base-58
    tx_id         TEXT NOT NULL,                -- hex SHA-256
    recorded_at   TEXT NOT NULL                 -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS obligations_lender_idx
  ON obligations(lender_key);
CREATE INDEX IF NOT EXISTS obligations_recorded_idx
  ON obligations(recorded_at);

PRAGMA user_version = 1;
";
