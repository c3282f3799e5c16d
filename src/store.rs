//! Backing store session
//!
//! `StoreSession` owns the SQLite connection for the lifetime of a
//! filesystem and exposes the handful of row operations the chunk core
//! needs: ordered selects over a file's chunk rows, the aggregates that
//! describe its layout, row deletes, and the multi-row insert used by the
//! flusher. Every flush runs inside one transaction on this connection, so
//! a failed flush rolls back to the previously persisted layout.

use std::path::Path;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::error::Result;
use crate::schema::SCHEMA;

/// Metadata of one persisted chunk row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkMeta {
    pub id: i64,
    pub offset: u64,
    pub length: u64,
}

/// Aggregate description of a file's chunk rows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub chunks: u64,
    pub end: u64,
}

pub(crate) struct StoreSession {
    conn: Connection,
}

impl StoreSession {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!("opened chunk store at {}", path.display());
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Begin a transaction on the session connection. Statements issued
    /// through the session while it is live join it; dropping it without
    /// `commit` rolls everything back.
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// One past the last persisted byte, or `None` if no rows exist for
    /// the name (the file does not exist).
    pub fn end_offset(&self, name: &str) -> Result<Option<u64>> {
        let end: Option<i64> = self.conn.query_row(
            "SELECT MAX(offset + contents_length) FROM files WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(end.map(|v| v as u64))
    }

    /// The first chunk (ascending by offset) whose byte range contains
    /// `position`, boundaries included. With a gapless layout this exists
    /// for every position up to the end offset; a missing row surfaces as
    /// a store error.
    pub fn chunk_at(&self, name: &str, position: u64) -> Result<ChunkMeta> {
        let meta = self.conn.query_row(
            "SELECT id, offset, contents_length FROM files
             WHERE name = ?1 AND ?2 >= offset AND offset + contents_length >= ?2
             ORDER BY offset ASC LIMIT 1",
            params![name, position as i64],
            |row| {
                Ok(ChunkMeta {
                    id: row.get(0)?,
                    offset: row.get::<_, i64>(1)? as u64,
                    length: row.get::<_, i64>(2)? as u64,
                })
            },
        )?;
        Ok(meta)
    }

    pub fn payload(&self, id: i64) -> Result<Vec<u8>> {
        let contents: Vec<u8> = self.conn.query_row(
            "SELECT contents FROM files WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(contents)
    }

    pub fn layout(&self, name: &str) -> Result<Layout> {
        let layout = self.conn.query_row(
            "SELECT COUNT(*), MAX(offset + contents_length) FROM files WHERE name = ?1",
            params![name],
            |row| {
                Ok(Layout {
                    chunks: row.get::<_, i64>(0)? as u64,
                    end: row.get::<_, Option<i64>>(1)?.unwrap_or(0) as u64,
                })
            },
        )?;
        Ok(layout)
    }

    /// Next chunk holding data past `position`, for sequential traversal.
    pub fn chunk_after(&self, name: &str, position: u64) -> Result<Option<(u64, Vec<u8>)>> {
        let row = self
            .conn
            .query_row(
                "SELECT offset, contents FROM files
                 WHERE name = ?1 AND offset + contents_length > ?2
                 ORDER BY offset ASC LIMIT 1",
                params![name, position as i64],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    /// All chunks holding data at or after `position`, ascending by offset.
    pub fn chunks_from(&self, name: &str, position: u64) -> Result<Vec<(u64, Vec<u8>)>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT offset, contents FROM files
             WHERE name = ?1 AND offset + contents_length >= ?2
             ORDER BY offset ASC",
        )?;
        let rows = stmt.query_map(params![name, position as i64], |row| {
            Ok((row.get::<_, i64>(0)? as u64, row.get(1)?))
        })?;
        let mut chunks = Vec::new();
        for row in rows {
            chunks.push(row?);
        }
        Ok(chunks)
    }

    /// Insert `data` as consecutive rows of at most `max_chunk` bytes each,
    /// starting at `start`. Empty data inserts the single zero-length row
    /// that marks an empty file. Returns the number of rows written.
    pub fn insert_chunks(
        &self,
        name: &str,
        start: u64,
        data: &[u8],
        max_chunk: usize,
    ) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO files (name, offset, contents_length, contents)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        if data.is_empty() {
            stmt.execute(params![name, start as i64, 0i64, &[] as &[u8]])?;
            return Ok(1);
        }
        let mut offset = start;
        let mut rows = 0;
        for piece in data.chunks(max_chunk) {
            stmt.execute(params![name, offset as i64, piece.len() as i64, piece])?;
            offset += piece.len() as u64;
            rows += 1;
        }
        Ok(rows)
    }

    pub fn delete_chunk(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM files WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn delete_file(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM files WHERE name = ?1", params![name])?;
        Ok(())
    }

    /// Delete every chunk row of `name` at or after `offset`; the flusher
    /// rewrites that whole range when splicing.
    pub fn delete_file_from(&self, name: &str, offset: u64) -> Result<()> {
        self.conn.execute(
            "DELETE FROM files WHERE name = ?1 AND offset >= ?2",
            params![name, offset as i64],
        )?;
        Ok(())
    }

    pub fn chunk_count(&self, name: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM files WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err)?;
        Ok(())
    }
}
