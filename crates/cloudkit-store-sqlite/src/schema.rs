//! DDL for the SQLite adapter.
//!
//! Applied every time a connection opens; the `user_version` pragma records
//! the schema revision so later releases can detect an old database and
//! migrate it.

/// The store's DDL. Safe to re-run against an existing database: every
/// statement guards itself with `IF NOT EXISTS`.
///
/// A resource's history is kept in this one table: the current version sits
/// at `uri == resource_reference`, superseded versions are rewritten to
/// `/{c}/{u}/versions/{etag}`, and the unique `uri` constraint is the
/// tiebreaker between racing writers.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS cloudkit_store (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    uri                  TEXT NOT NULL UNIQUE,
    etag                 TEXT NOT NULL,
    collection_reference TEXT NOT NULL,
    resource_reference   TEXT NOT NULL,
    last_modified        TEXT NOT NULL,   -- HTTP-date, set at write time
    remote_user          TEXT,            -- owning principal, NULL = unscoped
    content              TEXT NOT NULL,   -- client JSON, stored verbatim
    deleted              INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS cloudkit_store_resource_idx
    ON cloudkit_store(resource_reference);
CREATE INDEX IF NOT EXISTS cloudkit_store_collection_idx
    ON cloudkit_store(collection_reference);

PRAGMA user_version = 1;
";
