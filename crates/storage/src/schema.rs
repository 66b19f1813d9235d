use rusqlite::Connection;

use crate::error::StorageError;

pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

// Negative slot numbers only exist inside a transaction, while rows are
// parked during a reindex.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, unixepoch());

CREATE TABLE IF NOT EXISTS kits (
    name TEXT PRIMARY KEY NOT NULL,
    bank_id TEXT NOT NULL,
    alias TEXT,
    editable INTEGER NOT NULL DEFAULT 1,
    locked INTEGER NOT NULL DEFAULT 0,
    modified INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS voices (
    kit_name TEXT NOT NULL REFERENCES kits (name) ON DELETE CASCADE,
    voice_number INTEGER NOT NULL CHECK (voice_number BETWEEN 1 AND 4),
    alias TEXT,
    PRIMARY KEY (kit_name, voice_number)
);

CREATE TABLE IF NOT EXISTS samples (
    id INTEGER PRIMARY KEY,
    kit_name TEXT NOT NULL REFERENCES kits (name) ON DELETE CASCADE,
    voice_number INTEGER NOT NULL CHECK (voice_number BETWEEN 1 AND 4),
    slot_number INTEGER NOT NULL CHECK (slot_number BETWEEN -12 AND 11),
    filename TEXT NOT NULL,
    source_path TEXT NOT NULL,
    is_stereo INTEGER NOT NULL DEFAULT 0,
    wav_bitrate INTEGER,
    wav_sample_rate INTEGER,
    UNIQUE (kit_name, voice_number, slot_number),
    UNIQUE (kit_name, voice_number, source_path)
);
CREATE INDEX IF NOT EXISTS idx_samples_kit ON samples (kit_name, voice_number, slot_number);
";
