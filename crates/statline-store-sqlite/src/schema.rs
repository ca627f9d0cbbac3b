//! SQL schema for the statline SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS entities (
    entity_id       TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    -- Written only by the status engine.
    current_status  TEXT REFERENCES statuses(status_id) ON DELETE SET NULL
);

-- One row per interval of validity. Dates are ISO 8601 (YYYY-MM-DD), so
-- text comparison orders them correctly.
CREATE TABLE IF NOT EXISTS statuses (
    status_id     TEXT PRIMARY KEY,
    observed_id   TEXT NOT NULL REFERENCES entities(entity_id) ON DELETE CASCADE,
    applies_from  TEXT NOT NULL,   -- inclusive
    applies_to    TEXT,            -- exclusive; NULL while current
    payload_json  TEXT NOT NULL,
    UNIQUE (observed_id, applies_from),
    UNIQUE (observed_id, applies_to),
    CHECK  (applies_to IS NULL OR applies_from < applies_to)
);

-- At most one open-ended status per entity. Concurrent writers racing for
-- the same entity are serialised by this index.
CREATE UNIQUE INDEX IF NOT EXISTS statuses_one_current_idx
    ON statuses(observed_id) WHERE applies_to IS NULL;

CREATE INDEX IF NOT EXISTS entities_kind_idx ON entities(kind);

PRAGMA user_version = 1;
";
