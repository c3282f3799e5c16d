//! Filesystem entry point and configuration

use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::error::{FsError, Result};
use crate::handle::FileHandle;
use crate::mode::OpenMode;
use crate::schema::{DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_CHUNK_SIZE};
use crate::store::StoreSession;

/// Tuning knobs for a filesystem.
#[derive(Debug, Clone, Copy)]
pub struct FsConfig {
    /// Buffered bytes beyond which a write triggers an implicit flush.
    pub max_buffer_size: usize,
    /// Upper bound on the payload of a single persisted chunk row.
    pub max_chunk_size: usize,
    /// Codec for text-mode handles.
    pub encoding: &'static Encoding,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            encoding: UTF_8,
        }
    }
}

/// A filesystem over a SQLite chunk store.
///
/// Owns the store session for its lifetime and hands out [`FileHandle`]s
/// that borrow it, so every handle is closed (or dropped, which flushes
/// best-effort) before the session can be released.
///
/// # Examples
///
/// ```rust,ignore
/// use sqlfs::SqlFs;
///
/// let fs = SqlFs::open_path("files.db")?;
/// let mut f = fs.open("greeting.txt", "w".parse()?)?;
/// f.write("hello\n")?;
/// f.close()?;
/// fs.close()?;
/// ```
pub struct SqlFs {
    pub(crate) session: StoreSession,
    pub(crate) config: FsConfig,
}

impl SqlFs {
    /// Open (or create) a filesystem backed by the database at `path`.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_path_with_config(path, FsConfig::default())
    }

    pub fn open_path_with_config<P: AsRef<Path>>(path: P, config: FsConfig) -> Result<Self> {
        Ok(Self {
            session: StoreSession::open(path.as_ref())?,
            config,
        })
    }

    /// Open a filesystem backed by an in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with_config(FsConfig::default())
    }

    pub fn in_memory_with_config(config: FsConfig) -> Result<Self> {
        Ok(Self {
            session: StoreSession::in_memory()?,
            config,
        })
    }

    /// Open a file by name.
    ///
    /// Mode tokens parse into [`OpenMode`], so `fs.open(name, "r+".parse()?)`
    /// fails with [`FsError::NotSupportedMode`] on an unrecognized token.
    /// Read mode requires the file to exist; write-truncate drops existing
    /// content; the other writable modes create the file when absent, and
    /// the append modes start with the cursor at the end of the file.
    pub fn open(&self, name: &str, mode: OpenMode) -> Result<FileHandle<'_>> {
        debug!("opening {:?} with {:?}", name, mode);
        let end = self.session.end_offset(name)?;

        if end.is_none() && mode.requires_existing() {
            return Err(FsError::NotFound(name.to_string()));
        }

        let cursor = if mode.appends() { end.unwrap_or(0) } else { 0 };
        let mut handle = FileHandle::new(self, name.to_string(), mode, cursor);

        if end.is_some() && mode.truncates() {
            debug!("truncating {:?}", name);
            let tx = self.session.transaction()?;
            self.session.delete_file(name)?;
            tx.commit()?;
            handle.touch();
        } else if end.is_none() && mode.is_writable() {
            handle.touch();
        }
        Ok(handle)
    }

    /// Whether any chunk rows exist for `name`.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.session.end_offset(name)?.is_some())
    }

    /// Total length of the file in bytes, or `None` if it does not exist.
    pub fn size(&self, name: &str) -> Result<Option<u64>> {
        self.session.end_offset(name)
    }

    /// Number of persisted chunk rows for `name`.
    pub fn chunk_count(&self, name: &str) -> Result<u64> {
        self.session.chunk_count(name)
    }

    /// Release the store session. Consuming the filesystem (and the borrow
    /// it lends to open handles) makes a second close unrepresentable.
    pub fn close(self) -> Result<()> {
        self.session.close()
    }
}
