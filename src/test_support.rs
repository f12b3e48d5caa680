//! Shared fixtures for integration-style unit tests scattered across the
//! crate. Not part of the public API; compiled only under `#[cfg(test)]`.

use byteorder::{BigEndian, ByteOrder};

use crate::delta::bsdiff::SIGNATURE;
use crate::plan::MAGIC;
use crate::utils::encode_sign_magnitude;

fn push_u64(buf: &mut Vec<u8>, v: i64) {
    let mut b = [0u8; 8];
    BigEndian::write_i64(&mut b, v);
    buf.extend_from_slice(&b);
}

fn push_u32(buf: &mut Vec<u8>, v: i32) {
    let mut b = [0u8; 4];
    BigEndian::write_i32(&mut b, v);
    buf.extend_from_slice(&b);
}

/// Build a minimal, valid `GFbFv1_0` patch with no uncompress/recompress
/// ranges and a single BSDIFF descriptor whose delta is a single
/// `(0, new.len(), 0)` control triple: it ignores the old file entirely and
/// emits `new` verbatim via the "extra" (copy) segment. Useful whenever a
/// test needs *some* valid patch producing a known output, independent of
/// whatever the old bytes happen to be.
pub fn build_trivial_bsdiff_patch(new: &[u8]) -> Vec<u8> {
    let mut delta = Vec::new();
    delta.extend_from_slice(SIGNATURE);
    delta.extend_from_slice(&encode_sign_magnitude(new.len() as i64));
    delta.extend_from_slice(&encode_sign_magnitude(0)); // diffSegLen
    delta.extend_from_slice(&encode_sign_magnitude(new.len() as i64)); // copySegLen
    delta.extend_from_slice(&encode_sign_magnitude(0)); // oldSkip
    delta.extend_from_slice(new);

    let mut patch = Vec::new();
    patch.extend_from_slice(MAGIC);
    push_u32(&mut patch, 0); // flags
    push_u64(&mut patch, 0); // delta_friendly_old_size
    push_u32(&mut patch, 0); // uncompress count
    push_u32(&mut patch, 0); // recompress count
    push_u32(&mut patch, 1); // delta descriptor count
    patch.push(0); // BSDIFF
    push_u64(&mut patch, 0); // old offset
    push_u64(&mut patch, 0); // old length
    push_u64(&mut patch, 0); // new offset
    push_u64(&mut patch, new.len() as i64); // new length
    push_u64(&mut patch, delta.len() as i64); // delta length
    patch.extend_from_slice(&delta);
    patch
}
