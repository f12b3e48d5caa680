//! C4: the partially-compressing output.
//!
//! A `Write` adapter that transparently switches between pass-through and
//! DEFLATE, driven entirely by `output_position` crossing the boundaries of
//! an ordered, non-overlapping list of [`TypedRange`]s expressed in
//! delta-friendly-new coordinates. Implemented as a small state machine
//! (`PassThrough` / `Deflating`) composed around the underlying writer,
//! rather than any form of inheritance (§9).

use std::io::Write;

use crate::deflate::StreamingDeflate;
use crate::error::RecompressError;
use crate::range::TypedRange;

enum State {
    PassThrough,
    Deflating { encoder: StreamingDeflate, range_end: u64 },
}

/// Wraps a writer `W`, deflating the configured ranges of the byte stream
/// written through it and passing everything else straight through.
///
/// Never closes `W`: callers retain ownership and control of its lifetime,
/// which is what lets the apply orchestrator hand it the caller's own
/// output stream without taking over its close semantics (§4.4, §4.5).
pub struct PartiallyCompressingOutput<W: Write> {
    sink: W,
    ranges: Vec<TypedRange>,
    next_range_idx: usize,
    output_position: u64,
    state: State,
}

impl<W: Write> PartiallyCompressingOutput<W> {
    /// `ranges` must already be sorted ascending and non-overlapping, as
    /// guaranteed by the patch reader (C1).
    pub fn new(sink: W, ranges: Vec<TypedRange>) -> Self {
        PartiallyCompressingOutput {
            sink,
            ranges,
            next_range_idx: 0,
            output_position: 0,
            state: State::PassThrough,
        }
    }

    pub fn output_position(&self) -> u64 {
        self.output_position
    }

    /// Write the next `buf.len()` bytes of the delta-friendly new file.
    ///
    /// Writing `buf` one byte at a time yields byte-identical output to a
    /// single call with the whole buffer: the only state that matters is
    /// `output_position`, and a chunk never crosses a boundary without first
    /// transitioning.
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<(), RecompressError> {
        while !buf.is_empty() {
            let next_boundary = match &self.state {
                State::PassThrough => self.ranges.get(self.next_range_idx).map(|r| r.offset()),
                State::Deflating { range_end, .. } => Some(*range_end),
            };

            let take = match next_boundary {
                Some(boundary) if boundary == self.output_position => {
                    self.transition()?;
                    continue;
                }
                Some(boundary) => {
                    let distance = boundary - self.output_position;
                    Ord::min(distance, buf.len() as u64) as usize
                }
                None => buf.len(),
            };

            let (chunk, rest) = buf.split_at(take);
            match &mut self.state {
                State::PassThrough => self.sink.write_all(chunk)?,
                State::Deflating { encoder, .. } => encoder.write(chunk, &mut self.sink)?,
            }
            self.output_position += take as u64;
            buf = rest;
        }
        Ok(())
    }

    fn transition(&mut self) -> Result<(), RecompressError> {
        match std::mem::replace(&mut self.state, State::PassThrough) {
            State::PassThrough => {
                let tr = self.ranges[self.next_range_idx];
                self.next_range_idx += 1;
                tracing::trace!(
                    offset = tr.offset(),
                    end = tr.end_offset(),
                    level = tr.params.level,
                    nowrap = tr.params.nowrap,
                    "entering deflating range"
                );
                let encoder =
                    StreamingDeflate::new(tr.params.level, tr.params.strategy, tr.params.nowrap);
                self.state = State::Deflating { encoder, range_end: tr.end_offset() };
            }
            State::Deflating { encoder, range_end } => {
                tracing::trace!(end = range_end, "leaving deflating range");
                encoder.finish(&mut self.sink)?;
                self.state = State::PassThrough;
            }
        }
        Ok(())
    }

    /// Flush any buffered pass-through bytes to the underlying writer.
    pub fn flush(&mut self) -> Result<(), RecompressError> {
        self.sink.flush()?;
        Ok(())
    }

    /// Finalise a still-open DEFLATING range (only valid exactly at its end)
    /// and flush. Does not close the underlying writer; returns it back to
    /// the caller.
    pub fn close(mut self) -> Result<W, RecompressError> {
        if let State::Deflating { range_end, .. } = &self.state {
            if self.output_position != *range_end {
                return Err(RecompressError::IncompleteRange);
            }
        }
        if matches!(self.state, State::Deflating { .. }) {
            self.transition()?;
        }
        self.sink.flush()?;
        Ok(self.sink)
    }
}
