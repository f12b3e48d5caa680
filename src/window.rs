//! A bounded, randomly-addressable view over a byte range of an underlying
//! `Read + Seek` source.
//!
//! The delta appliers (C2) need both sequential reads and absolute/relative
//! seeks within the old working range of a delta descriptor; `Window` gives
//! them that without exposing the rest of the scratch file or the caller's
//! old archive.

use std::io::{self, Read, Seek, SeekFrom};

pub struct Window<R> {
    inner: R,
    base: u64,
    len: u64,
    pos: u64,
}

impl<R: Read + Seek> Window<R> {
    pub fn new(mut inner: R, base: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(base))?;
        Ok(Window { inner, base, len, pos: 0 })
    }

    /// Length of the window, in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Current position, relative to the start of the window.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Seek to an absolute position within the window.
    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(self.base + pos))?;
        self.pos = pos;
        Ok(())
    }
}

impl<R: Read> Read for Window<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        if remaining == 0 {
            return Ok(0);
        }
        let cap = Ord::min(buf.len() as u64, remaining) as usize;
        let n = self.inner.read(&mut buf[..cap])?;
        self.pos += n as u64;
        Ok(n)
    }
}
