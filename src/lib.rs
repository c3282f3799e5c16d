//! # sqlfs - POSIX-like file semantics over a SQLite chunk store
//!
//! sqlfs stores file content as discrete byte-range chunk rows in a single
//! SQLite relation and exposes the familiar file surface on top: open
//! modes, a cursor, buffered writes, seek/tell, bulk reads, and line
//! iteration.
//!
//! Writes accumulate in a per-handle buffer and are reconciled with the
//! persisted chunk layout on flush: appends coalesce short trailing
//! chunks, seeks past the end zero-fill the gap, and overlapping writes
//! splice the affected chunks. Each flush is a single transaction, so a
//! failure leaves the previously persisted layout untouched.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlfs::SqlFs;
//!
//! fn main() -> sqlfs::Result<()> {
//!     let fs = SqlFs::open_path("files.db")?;
//!
//!     let mut f = fs.open("log.txt", "a+".parse()?)?;
//!     f.write("first line\n")?;
//!     f.close()?;
//!
//!     let mut f = fs.open("log.txt", "r".parse()?)?;
//!     for line in f.lines() {
//!         println!("{:?}", line?);
//!     }
//!
//!     fs.close()
//! }
//! ```

pub mod error;
pub mod fs;
pub mod handle;
pub mod mode;
pub mod payload;
pub mod reader;
pub mod schema;
mod store;

pub use error::{FsError, Result};
pub use fs::{FsConfig, SqlFs};
pub use handle::FileHandle;
pub use mode::{ModeKind, OpenMode};
pub use payload::{Content, Data, DataKind};
pub use reader::Lines;
