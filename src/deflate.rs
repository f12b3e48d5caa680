//! C6: the compatibility-window table, and the binding to the external
//! DEFLATE codec (§4.6, §6).
//!
//! The binding is [`miniz_oxide`]: its low-level
//! [`create_comp_flags_from_zip_params`](miniz_oxide::deflate::core::create_comp_flags_from_zip_params)
//! accepts exactly the (level, window_bits, strategy) triple the wire format
//! carries, which is what makes byte-exact, dependency-only (no FFI)
//! recompression possible.

use std::io::Write;

use miniz_oxide::deflate::core::{
    compress, create_comp_flags_from_zip_params, CompressorOxide, TDEFLFlush, TDEFLStatus,
};
use miniz_oxide::inflate::{decompress_to_vec, decompress_to_vec_zlib};

use crate::error::{RecompressError, UncompressError};
use crate::range::Strategy;

/// One entry of the compatibility-window table: a patch-byte identifier plus
/// a predicate validating (level, strategy, nowrap) tuples for that window.
pub struct CompatibilityWindow {
    pub id: u8,
    pub name: &'static str,
    validate: fn(u8, Strategy, bool) -> bool,
}

impl CompatibilityWindow {
    pub fn validate(&self, level: u8, strategy: Strategy, nowrap: bool) -> bool {
        (self.validate)(level, strategy, nowrap)
    }
}

fn default_deflate_validate(level: u8, _strategy: Strategy, _nowrap: bool) -> bool {
    (1..=9).contains(&level)
}

/// The standard, widely-deployed deflate implementation every modern ZIP
/// tool uses. Byte id `0`.
pub const DEFAULT_DEFLATE: CompatibilityWindow = CompatibilityWindow {
    id: 0,
    name: "DEFAULT_DEFLATE",
    validate: default_deflate_validate,
};

/// Process-wide static table. New compatibility windows can be appended here
/// with new byte identifiers without breaking patches written against the
/// existing ones.
pub const WINDOWS: &[CompatibilityWindow] = &[DEFAULT_DEFLATE];

pub fn lookup_window(id: u8) -> Option<&'static CompatibilityWindow> {
    WINDOWS.iter().find(|w| w.id == id)
}

/// Inflate `data`, selecting raw or zlib-wrapped deflate by `nowrap`.
///
/// Level and strategy are not needed to decompress; only the wrap flag
/// selects the input format.
pub fn inflate(data: &[u8], nowrap: bool) -> Result<Vec<u8>, UncompressError> {
    let result = if nowrap {
        decompress_to_vec(data)
    } else {
        decompress_to_vec_zlib(data)
    };
    result.map_err(|e| UncompressError::Inflate(format!("{:?}", e)))
}

fn window_bits(nowrap: bool) -> i32 {
    if nowrap {
        -15
    } else {
        15
    }
}

/// Incremental deflate encoder bound to a single recompress range.
///
/// Wraps [`CompressorOxide`] the way C4 needs: bytes can be pushed in any
/// chunking (including one at a time) and the compressed output written to
/// `sink` is identical regardless of how the input was chunked.
pub struct StreamingDeflate {
    compressor: CompressorOxide,
    out_buf: Vec<u8>,
}

const OUT_BUF_SIZE: usize = 32 * 1024;

impl StreamingDeflate {
    pub fn new(level: u8, strategy: Strategy, nowrap: bool) -> Self {
        let flags = create_comp_flags_from_zip_params(
            level as i32,
            window_bits(nowrap),
            strategy.to_byte() as i32,
        );
        StreamingDeflate {
            compressor: CompressorOxide::new(flags),
            out_buf: vec![0u8; OUT_BUF_SIZE],
        }
    }

    /// Feed more bytes of the delta-friendly new stream into the encoder,
    /// writing any compressed output produced to `sink`.
    pub fn write(&mut self, mut input: &[u8], sink: &mut dyn Write) -> Result<(), RecompressError> {
        while !input.is_empty() {
            let (status, consumed, produced) =
                compress(&mut self.compressor, input, &mut self.out_buf, TDEFLFlush::None);
            match status {
                TDEFLStatus::Okay => {}
                other => {
                    return Err(RecompressError::Encoder(format!("{:?}", other)));
                }
            }
            if produced > 0 {
                sink.write_all(&self.out_buf[..produced])?;
            }
            input = &input[consumed..];
            if consumed == 0 && produced == 0 {
                // Defensive: avoid spinning if the encoder stalls without
                // consuming or producing anything.
                break;
            }
        }
        Ok(())
    }

    /// Finish the range: flush all remaining buffered output. Does not touch
    /// the underlying stream beyond writing the final compressed bytes.
    pub fn finish(mut self, sink: &mut dyn Write) -> Result<(), RecompressError> {
        loop {
            let (status, _consumed, produced) =
                compress(&mut self.compressor, &[], &mut self.out_buf, TDEFLFlush::Finish);
            if produced > 0 {
                sink.write_all(&self.out_buf[..produced])?;
            }
            match status {
                TDEFLStatus::Done => return Ok(()),
                TDEFLStatus::Okay => continue,
                other => return Err(RecompressError::Encoder(format!("{:?}", other))),
            }
        }
    }
}
