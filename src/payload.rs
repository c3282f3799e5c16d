//! Text/binary payload types
//!
//! A handle is opened for either text or binary data and every payload
//! carries its kind statically, so mismatches are caught at the write (or
//! read) boundary instead of by inspecting values at run time.

use std::fmt;

/// Whether a handle (or payload) carries text or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Text,
    Binary,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Text => f.write_str("text"),
            DataKind::Binary => f.write_str("binary"),
        }
    }
}

/// Borrowed payload accepted by [`FileHandle::write`](crate::FileHandle::write).
///
/// Built from `&str` or `&[u8]` via `From`, so call sites can pass either
/// directly: `handle.write("abc")` or `handle.write(&b"abc"[..])`.
#[derive(Debug, Clone, Copy)]
pub enum Data<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl Data<'_> {
    pub fn kind(&self) -> DataKind {
        match self {
            Data::Text(_) => DataKind::Text,
            Data::Bytes(_) => DataKind::Binary,
        }
    }
}

impl<'a> From<&'a str> for Data<'a> {
    fn from(value: &'a str) -> Self {
        Data::Text(value)
    }
}

impl<'a> From<&'a String> for Data<'a> {
    fn from(value: &'a String) -> Self {
        Data::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for Data<'a> {
    fn from(value: &'a [u8]) -> Self {
        Data::Bytes(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Data<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Data::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for Data<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Data::Bytes(value.as_slice())
    }
}

/// Owned payload produced by reads and line iteration.
///
/// Text handles yield decoded strings, binary handles raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Binary(Vec<u8>),
}

impl Content {
    pub fn kind(&self) -> DataKind {
        match self {
            Content::Text(_) => DataKind::Text,
            Content::Binary(_) => DataKind::Binary,
        }
    }

    /// Length in logical units: characters for text, bytes for binary.
    pub fn len(&self) -> usize {
        match self {
            Content::Text(s) => s.chars().count(),
            Content::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Content::Text(s) => s.is_empty(),
            Content::Binary(b) => b.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            Content::Binary(_) => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Content::Text(_) => None,
            Content::Binary(b) => Some(b),
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Content::Text(s) => Some(s),
            Content::Binary(_) => None,
        }
    }

    pub fn into_binary(self) -> Option<Vec<u8>> {
        match self {
            Content::Text(_) => None,
            Content::Binary(b) => Some(b),
        }
    }
}
