//! C3: the partially-uncompressing input. Builds the delta-friendly old blob
//! by walking the original old file once, copying the gaps verbatim and
//! inflating the ranges named by the uncompress plan.

use std::io::Write;

use crate::deflate::inflate;
use crate::error::UncompressError;
use crate::range::Range;

/// Copy `old` into `out`, inflating the ranges in `plan` along the way.
///
/// `nowrap_for` maps an uncompress-plan range to the wrap flag to use when
/// inflating it; the orchestrator derives this from the recompress plan
/// entry covering the equivalent delta-friendly-new region (§4.3).
pub fn build_delta_friendly_old(
    old: &[u8],
    plan: &[Range],
    nowrap_for: impl Fn(usize) -> bool,
    out: &mut impl Write,
) -> Result<u64, UncompressError> {
    let mut cursor = 0u64;
    let mut written = 0u64;

    for (i, range) in plan.iter().enumerate() {
        if range.end_offset() > old.len() as u64 {
            return Err(UncompressError::RangeOutOfBounds {
                offset: range.offset,
                length: range.length,
                old_len: old.len() as u64,
            });
        }

        if range.offset > cursor {
            let gap = &old[cursor as usize..range.offset as usize];
            out.write_all(gap)?;
            written += gap.len() as u64;
        }

        let compressed = &old[range.offset as usize..range.end_offset() as usize];
        let nowrap = nowrap_for(i);
        let plain = inflate(compressed, nowrap)?;
        out.write_all(&plain)?;
        written += plain.len() as u64;

        cursor = range.end_offset();
    }

    if (cursor as usize) < old.len() {
        let tail = &old[cursor as usize..];
        out.write_all(tail)?;
        written += tail.len() as u64;
    }

    Ok(written)
}
