//! Error types for sqlfs

use thiserror::Error;

use crate::payload::DataKind;

/// Result type for sqlfs operations
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors raised by filesystem, handle, and reader operations.
///
/// Each variant surfaces synchronously at the operation whose precondition
/// was violated. Because writes are buffered, rewrite conflicts surface at
/// flush time (seek, tell, close, or a write that overflows the buffer)
/// rather than at the write that caused them.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("mode {0:?} is not supported")]
    NotSupportedMode(String),

    #[error("file {0:?} does not exist")]
    NotFound(String),

    #[error("cannot write to a read-only handle")]
    ReadOnly,

    #[error("cannot write {found} data to a handle opened in {expected} mode")]
    TypeMismatch { expected: DataKind, found: DataKind },

    #[error("only seeks relative to the start of the file are supported")]
    SeekUnsupported,

    #[error("rewrite starting inside a multi-chunk file must extend past its end")]
    UnsupportedRewrite,

    #[error("data is not representable in the {0} encoding")]
    Codec(&'static str),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}
