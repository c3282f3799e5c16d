//! Open modes
//!
//! The mode vocabulary is a closed enum rather than a string inspected at
//! call sites. The classic tokens (`r`, `wb`, `r+`, `a+`, ...) parse into it
//! via `FromStr`; combinations without a token, such as binary append, are
//! built with [`OpenMode::new`].

use std::str::FromStr;

use crate::error::FsError;
use crate::payload::DataKind;

/// What the handle may do with the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    /// Read only; the file must already exist. Cursor starts at 0.
    Read,
    /// Write-truncate: drop any existing content, start empty. Cursor 0.
    Write,
    /// Read-modify: create empty if absent; positional reads and writes.
    ReadWrite,
    /// Append: create empty if absent; cursor starts at end of file.
    Append,
    /// Append-or-create with reads allowed; cursor starts at end of file.
    AppendRead,
}

/// A fully specified open mode: what the handle may do, and whether its
/// payloads are text or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    kind: ModeKind,
    data: DataKind,
}

impl OpenMode {
    pub fn new(kind: ModeKind, data: DataKind) -> Self {
        Self { kind, data }
    }

    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    pub fn data(&self) -> DataKind {
        self.data
    }

    pub fn is_readable(&self) -> bool {
        matches!(
            self.kind,
            ModeKind::Read | ModeKind::ReadWrite | ModeKind::AppendRead
        )
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self.kind, ModeKind::Read)
    }

    pub fn is_seekable(&self) -> bool {
        // every current mode supports start-relative seeks
        true
    }

    /// Whether opening requires the file to already exist.
    pub fn requires_existing(&self) -> bool {
        matches!(self.kind, ModeKind::Read)
    }

    /// Whether opening an existing file drops its content first.
    pub fn truncates(&self) -> bool {
        matches!(self.kind, ModeKind::Write)
    }

    /// Whether the cursor starts at the current end of file.
    pub fn appends(&self) -> bool {
        matches!(self.kind, ModeKind::Append | ModeKind::AppendRead)
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mode = match token {
            "r" | "rt" => Self::new(ModeKind::Read, DataKind::Text),
            "rb" => Self::new(ModeKind::Read, DataKind::Binary),
            "w" | "wt" => Self::new(ModeKind::Write, DataKind::Text),
            "wb" => Self::new(ModeKind::Write, DataKind::Binary),
            "r+" => Self::new(ModeKind::ReadWrite, DataKind::Text),
            "a" => Self::new(ModeKind::Append, DataKind::Text),
            "a+" => Self::new(ModeKind::AppendRead, DataKind::Text),
            _ => return Err(FsError::NotSupportedMode(token.to_string())),
        };
        Ok(mode)
    }
}
