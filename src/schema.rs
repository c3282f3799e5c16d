//! Backing relation schema for sqlfs
//!
//! File content lives in a single `files` relation as discrete byte-range
//! chunks keyed by file name and starting offset. The `is_directory` column
//! is reserved and currently unused.

/// DDL executed when a session opens. Idempotent against an existing store.
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_directory INTEGER NOT NULL DEFAULT 0,
    offset INTEGER NOT NULL,
    contents_length INTEGER NOT NULL,
    contents BLOB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_files_name_offset ON files(name, offset);";

/// Buffered bytes beyond which a write triggers an implicit flush.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 8192;

/// Upper bound on the payload of a single persisted chunk row.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4096;
