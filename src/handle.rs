//! File handles
//!
//! A `FileHandle` is the per-open-file state: mode, cursor, and the write
//! buffer. Writes accumulate as byte fragments and are reconciled against
//! the persisted chunk layout by [`FileHandle::flush`], which runs on
//! buffer overflow, seek, tell, close, and drop.

use std::io::SeekFrom;

use log::{debug, warn};

use crate::error::{FsError, Result};
use crate::fs::SqlFs;
use crate::mode::OpenMode;
use crate::payload::{Content, Data, DataKind};
use crate::reader::Lines;

pub struct FileHandle<'fs> {
    fs: &'fs SqlFs,
    name: String,
    mode: OpenMode,
    cursor: u64,
    fragments: Vec<Vec<u8>>,
    buffered: usize,
    closed: bool,
}

impl<'fs> FileHandle<'fs> {
    pub(crate) fn new(fs: &'fs SqlFs, name: String, mode: OpenMode, cursor: u64) -> Self {
        Self {
            fs,
            name,
            mode,
            cursor,
            fragments: Vec::new(),
            buffered: 0,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Buffer an empty fragment so the next flush materializes the file
    /// even if nothing else is written.
    pub(crate) fn touch(&mut self) {
        self.fragments.push(Vec::new());
    }

    /// Buffer a payload at the cursor. Text is encoded with the configured
    /// codec; the cursor advances by the raw byte length either way.
    ///
    /// Returns the number of logical units written: characters for text,
    /// bytes for binary.
    pub fn write<'d>(&mut self, data: impl Into<Data<'d>>) -> Result<usize> {
        let data = data.into();
        if data.kind() != self.mode.data() {
            return Err(FsError::TypeMismatch {
                expected: self.mode.data(),
                found: data.kind(),
            });
        }
        if !self.mode.is_writable() {
            return Err(FsError::ReadOnly);
        }

        let (bytes, units) = match data {
            Data::Text(text) => (self.encode_text(text)?, text.chars().count()),
            Data::Bytes(bytes) => (bytes.to_vec(), bytes.len()),
        };
        self.cursor += bytes.len() as u64;
        self.buffered += bytes.len();
        self.fragments.push(bytes);

        if self.buffered > self.fs.config.max_buffer_size {
            self.flush()?;
        }
        Ok(units)
    }

    /// Read up to `size` logical units (characters for text handles, bytes
    /// for binary ones) from the cursor onward; `None` reads everything
    /// remaining. Text is decoded before truncation so multi-byte
    /// sequences never split; the cursor advances by the raw bytes
    /// actually consumed.
    pub fn read(&mut self, size: Option<usize>) -> Result<Content> {
        let rows = self.fs.session.chunks_from(&self.name, self.cursor)?;
        let mut raw = Vec::new();
        for (i, (offset, payload)) in rows.into_iter().enumerate() {
            if i == 0 {
                let skip = (self.cursor.saturating_sub(offset) as usize).min(payload.len());
                raw.extend_from_slice(&payload[skip..]);
            } else {
                raw.extend_from_slice(&payload);
            }
        }

        match self.mode.data() {
            DataKind::Binary => {
                let take = size.unwrap_or(raw.len()).min(raw.len());
                raw.truncate(take);
                self.cursor += take as u64;
                Ok(Content::Binary(raw))
            }
            DataKind::Text => {
                let text = self.decode_text(&raw)?;
                match size {
                    Some(limit) => match text.char_indices().nth(limit) {
                        Some((boundary, _)) => {
                            let kept = text[..boundary].to_string();
                            let consumed = self.encode_text(&kept)?.len();
                            self.cursor += consumed as u64;
                            Ok(Content::Text(kept))
                        }
                        None => {
                            self.cursor += raw.len() as u64;
                            Ok(Content::Text(text))
                        }
                    },
                    None => {
                        self.cursor += raw.len() as u64;
                        Ok(Content::Text(text))
                    }
                }
            }
        }
    }

    /// Lazy line iterator from the current cursor; restartable by seeking
    /// and calling again. Each yielded line advances the cursor by its
    /// exact byte length.
    pub fn lines<'h>(&'h mut self) -> Lines<'h, 'fs> {
        Lines::new(self)
    }

    /// Next line, or `None` once the data is exhausted.
    pub fn read_line(&mut self) -> Result<Option<Content>> {
        self.lines().next().transpose()
    }

    /// All remaining lines.
    pub fn read_lines(&mut self) -> Result<Vec<Content>> {
        self.lines().collect()
    }

    /// Move the cursor to an absolute position. Only start-relative seeks
    /// are supported; the buffer is flushed first so the cursor never
    /// moves away from un-persisted state.
    pub fn seek(&mut self, target: SeekFrom) -> Result<u64> {
        if !self.mode.is_seekable() {
            return Err(FsError::SeekUnsupported);
        }
        let SeekFrom::Start(position) = target else {
            return Err(FsError::SeekUnsupported);
        };
        self.flush()?;
        self.cursor = position;
        Ok(position)
    }

    /// Current cursor position, after flushing buffered writes.
    pub fn tell(&mut self) -> Result<u64> {
        self.flush()?;
        Ok(self.cursor)
    }

    /// Reconcile buffered fragments with the persisted chunk layout.
    ///
    /// The buffered bytes form one run starting at `cursor - buffered`
    /// (the cursor advanced as they were written). The run is classified
    /// against the file's end offset, merged with the prefix/suffix bytes
    /// of any affected chunks, re-chunked into rows of at most
    /// `max_chunk_size` bytes, and inserted inside a single transaction.
    /// On failure the transaction rolls back and the buffer is kept.
    pub fn flush(&mut self) -> Result<()> {
        if self.fragments.is_empty() {
            return Ok(());
        }
        let session = &self.fs.session;
        let max_chunk = self.fs.config.max_chunk_size;
        let write_start = self.cursor - self.buffered as u64;

        let tx = session.transaction()?;
        let end = session.end_offset(&self.name)?;
        let mut prefix: Vec<u8> = Vec::new();
        let mut suffix: Vec<u8> = Vec::new();

        let start = match end {
            // first flush for this name
            None => 0,
            // appending, possibly with a zero-filled gap after the end
            Some(end) if write_start >= end => {
                let trailing = session.chunk_at(&self.name, end)?;
                let start = if trailing.length < max_chunk as u64 {
                    // coalesce the short trailing chunk to bound fragmentation
                    prefix = session.payload(trailing.id)?;
                    session.delete_chunk(trailing.id)?;
                    trailing.offset
                } else {
                    end
                };
                prefix.resize(prefix.len() + (write_start - end) as usize, 0);
                start
            }
            // rewriting over existing data
            Some(end) => {
                let write_end = write_start + self.buffered as u64;
                let target = session.chunk_at(&self.name, write_start)?;
                let layout = session.layout(&self.name)?;
                if layout.chunks > 1 && write_end <= end {
                    // an interior rewrite of a multi-chunk file would need a
                    // general interval splice; refuse rather than corrupt
                    return Err(FsError::UnsupportedRewrite);
                }
                let payload = session.payload(target.id)?;
                prefix = payload[..(write_start - target.offset) as usize].to_vec();
                let cut = ((write_end - target.offset) as usize).min(payload.len());
                suffix = payload[cut..].to_vec();
                session.delete_file_from(&self.name, target.offset)?;
                target.offset
            }
        };

        let mut data = prefix;
        for fragment in &self.fragments {
            data.extend_from_slice(fragment);
        }
        data.extend_from_slice(&suffix);

        if !data.is_empty() || end.is_none() {
            let rows = session.insert_chunks(&self.name, start, &data, max_chunk)?;
            debug!(
                "flushed {} bytes into {} chunk(s) of {:?} at offset {}",
                data.len(),
                rows,
                self.name,
                start
            );
        }
        tx.commit()?;

        self.fragments.clear();
        self.buffered = 0;
        Ok(())
    }

    /// Flush the remaining buffer and give the handle up. Unlike the
    /// drop-time flush, failures propagate to the caller.
    pub fn close(mut self) -> Result<()> {
        let result = self.flush();
        self.closed = true;
        result
    }

    pub(crate) fn cursor(&self) -> u64 {
        self.cursor
    }

    pub(crate) fn advance(&mut self, bytes: u64) {
        self.cursor += bytes;
    }

    pub(crate) fn next_chunk(&self, position: u64) -> Result<Option<(u64, Vec<u8>)>> {
        self.fs.session.chunk_after(&self.name, position)
    }

    /// Wrap raw line bytes in the handle's payload kind, decoding text at
    /// yield time.
    pub(crate) fn to_content(&self, bytes: Vec<u8>) -> Result<Content> {
        match self.mode.data() {
            DataKind::Text => Ok(Content::Text(self.decode_text(&bytes)?)),
            DataKind::Binary => Ok(Content::Binary(bytes)),
        }
    }

    fn encode_text(&self, text: &str) -> Result<Vec<u8>> {
        let encoding = self.fs.config.encoding;
        let (bytes, _, malformed) = encoding.encode(text);
        if malformed {
            return Err(FsError::Codec(encoding.name()));
        }
        Ok(bytes.into_owned())
    }

    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        let encoding = self.fs.config.encoding;
        let (text, malformed) = encoding.decode_without_bom_handling(bytes);
        if malformed {
            return Err(FsError::Codec(encoding.name()));
        }
        Ok(text.into_owned())
    }
}

impl Drop for FileHandle<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.flush() {
            warn!("discarding buffered data for {:?}: {}", self.name, err);
        }
    }
}
