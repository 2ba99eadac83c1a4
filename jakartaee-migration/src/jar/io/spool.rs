//! Disk-backed holding area for converted entry payloads.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Location of one payload inside a [`Spool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpoolSlot {
    offset: u64,
    len: usize,
}

/// Append-only anonymous temporary file, removed by the OS once dropped.
pub struct Spool {
    file: File,
    end: u64,
}

impl Spool {
    pub fn new() -> io::Result<Self> {
        Ok(Spool {
            file: tempfile::tempfile()?,
            end: 0,
        })
    }

    pub fn push(&mut self, payload: &[u8]) -> io::Result<SpoolSlot> {
        self.file.seek(SeekFrom::Start(self.end))?;
        self.file.write_all(payload)?;
        let slot = SpoolSlot {
            offset: self.end,
            len: payload.len(),
        };
        self.end += payload.len() as u64;
        Ok(slot)
    }

    pub fn read(&mut self, slot: SpoolSlot) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(slot.offset))?;
        let mut payload = vec![0; slot.len];
        self.file.read_exact(&mut payload)?;
        Ok(payload)
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }
}
