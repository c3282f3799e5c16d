//! Sequential line iteration
//!
//! `Lines` walks a file's chunk rows from the handle's cursor, splitting
//! on line terminators and carrying partial lines across chunk
//! boundaries. Chunks are pulled from the store one at a time, so the
//! iterator stays lazy; creating a fresh one after a seek restarts from
//! the new cursor.

use crate::error::Result;
use crate::handle::FileHandle;
use crate::payload::Content;

pub struct Lines<'h, 'fs> {
    handle: &'h mut FileHandle<'fs>,
    /// Scan position inside the persisted layout; independent of the
    /// handle cursor, which only advances as lines are yielded.
    scan: u64,
    chunk: Vec<u8>,
    chunk_pos: usize,
    carry: Vec<u8>,
    done: bool,
}

impl<'h, 'fs> Lines<'h, 'fs> {
    pub(crate) fn new(handle: &'h mut FileHandle<'fs>) -> Self {
        let scan = handle.cursor();
        Self {
            handle,
            scan,
            chunk: Vec::new(),
            chunk_pos: 0,
            carry: Vec::new(),
            done: false,
        }
    }

    fn yield_line(&mut self, line: Vec<u8>) -> Result<Content> {
        self.handle.advance(line.len() as u64);
        self.handle.to_content(line)
    }

    fn next_line(&mut self) -> Result<Option<Content>> {
        if self.done {
            return Ok(None);
        }
        loop {
            if self.chunk_pos < self.chunk.len() {
                match self.chunk[self.chunk_pos..]
                    .iter()
                    .position(|&byte| byte == b'\n')
                {
                    Some(found) => {
                        let end = self.chunk_pos + found + 1;
                        let mut line = std::mem::take(&mut self.carry);
                        line.extend_from_slice(&self.chunk[self.chunk_pos..end]);
                        self.chunk_pos = end;
                        return self.yield_line(line).map(Some);
                    }
                    None => {
                        self.carry.extend_from_slice(&self.chunk[self.chunk_pos..]);
                        self.chunk_pos = self.chunk.len();
                    }
                }
            }
            match self.handle.next_chunk(self.scan)? {
                Some((offset, payload)) => {
                    // the first chunk may start before the cursor; later
                    // ones line up with the scan position exactly
                    self.chunk_pos = self.scan.saturating_sub(offset) as usize;
                    self.scan = offset + payload.len() as u64;
                    self.chunk = payload;
                }
                None => {
                    self.done = true;
                    if self.carry.is_empty() {
                        return Ok(None);
                    }
                    let tail = std::mem::take(&mut self.carry);
                    return self.yield_line(tail).map(Some);
                }
            }
        }
    }
}

impl Iterator for Lines<'_, '_> {
    type Item = Result<Content>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
