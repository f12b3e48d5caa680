//! BSDIFF-style applier (§4.2, primary format).
//!
//! Stream shape: signature `ENDSLEY/BSDIFF43`, a sign-magnitude `newSize`,
//! then repeated sign-magnitude control triples `(diffSegLen, copySegLen,
//! oldSkip)` until exactly `newSize` bytes have been emitted.

use std::io::{Read, Write};

use crate::config::BufferConfig;
use crate::error::DeltaApplyError as E;
use crate::recompress::PartiallyCompressingOutput;
use crate::utils::decode_sign_magnitude;
use crate::window::Window;

/// ASCII signature at the start of every BSDIFF delta payload.
pub const SIGNATURE: &[u8; 16] = b"ENDSLEY/BSDIFF43";

/// Hard floor under any configured buffer size (§4.2: "≥ 4 KiB").
const MIN_BUFFER_SIZE: usize = 4096;

fn read_i64<D: Read>(delta: &mut D) -> Result<i64, E> {
    let mut bytes = [0u8; 8];
    delta.read_exact(&mut bytes).map_err(|_| E::Truncated)?;
    decode_sign_magnitude(&bytes).ok_or(E::BadNewSize("sign-magnitude value -2^63 is unrepresentable"))
}

struct ControlTriple {
    diff_seg_len: u64,
    copy_seg_len: u64,
    old_skip: i64,
}

fn read_control<D: Read>(delta: &mut D) -> Result<Option<ControlTriple>, E> {
    let mut probe = [0u8; 1];
    match delta.read(&mut probe) {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(e) => return Err(E::Io(e)),
    }

    let mut rest = [0u8; 23];
    delta.read_exact(&mut rest).map_err(|_| E::Truncated)?;

    let mut diff_bytes = [0u8; 8];
    diff_bytes[0] = probe[0];
    diff_bytes[1..].copy_from_slice(&rest[..7]);
    let diff_seg_len = decode_sign_magnitude(&diff_bytes)
        .ok_or(E::BadControl("diffSegLen is the unrepresentable sign-magnitude value"))?;

    let mut copy_bytes = [0u8; 8];
    copy_bytes.copy_from_slice(&rest[7..15]);
    let copy_seg_len = decode_sign_magnitude(&copy_bytes)
        .ok_or(E::BadControl("copySegLen is the unrepresentable sign-magnitude value"))?;

    let mut skip_bytes = [0u8; 8];
    skip_bytes.copy_from_slice(&rest[15..23]);
    let old_skip = decode_sign_magnitude(&skip_bytes)
        .ok_or(E::BadControl("oldSkip is the unrepresentable sign-magnitude value"))?;

    if diff_seg_len < 0 {
        return Err(E::BadControl("diffSegLen must be non-negative"));
    }
    if copy_seg_len < 0 {
        return Err(E::BadControl("copySegLen must be non-negative"));
    }

    Ok(Some(ControlTriple {
        diff_seg_len: diff_seg_len as u64,
        copy_seg_len: copy_seg_len as u64,
        old_skip,
    }))
}

/// Apply a BSDIFF-style delta. Returns the number of bytes emitted.
pub fn apply<R, D, W>(
    mut old: Window<R>,
    mut delta: D,
    out: &mut PartiallyCompressingOutput<W>,
    cfg: &BufferConfig,
) -> Result<u64, E>
where
    R: Read + std::io::Seek,
    D: Read,
    W: Write,
{
    let chunk_cap = Ord::max(cfg.buffer_size, MIN_BUFFER_SIZE);
    let initial = Ord::min(Ord::max(cfg.delta_min, MIN_BUFFER_SIZE), chunk_cap);

    let mut signature = [0u8; 16];
    delta.read_exact(&mut signature).map_err(|_| E::Truncated)?;
    if &signature != SIGNATURE {
        return Err(E::BadSignature("expected ENDSLEY/BSDIFF43"));
    }

    let new_size = read_i64(&mut delta)?;
    if new_size < 0 {
        return Err(E::BadNewSize("newSize must be non-negative"));
    }
    let new_size = new_size as u64;

    let mut emitted: u64 = 0;
    let mut add_buf = vec![0u8; initial];
    let mut old_buf = vec![0u8; initial];

    while emitted < new_size {
        let control = read_control(&mut delta)?.ok_or(E::Truncated)?;

        if emitted + control.diff_seg_len > new_size {
            return Err(E::OutputOverrun);
        }

        let mut remaining = control.diff_seg_len;
        while remaining > 0 {
            let chunk = Ord::min(remaining, chunk_cap as u64) as usize;
            if add_buf.len() < chunk {
                add_buf.resize(chunk, 0);
            }
            if old_buf.len() < chunk {
                old_buf.resize(chunk, 0);
            }

            delta.read_exact(&mut add_buf[..chunk]).map_err(|_| E::Truncated)?;
            old.read_exact(&mut old_buf[..chunk]).map_err(|_| {
                E::OldOutOfBounds(old.position() as i64, old.len())
            })?;

            for i in 0..chunk {
                add_buf[i] = old_buf[i].wrapping_add(add_buf[i]);
            }
            out.write_all(&add_buf[..chunk])?;

            remaining -= chunk as u64;
            emitted += chunk as u64;
        }

        if emitted + control.copy_seg_len > new_size {
            return Err(E::OutputOverrun);
        }

        let mut remaining = control.copy_seg_len;
        while remaining > 0 {
            let chunk = Ord::min(remaining, chunk_cap as u64) as usize;
            if add_buf.len() < chunk {
                add_buf.resize(chunk, 0);
            }
            delta.read_exact(&mut add_buf[..chunk]).map_err(|_| E::Truncated)?;
            out.write_all(&add_buf[..chunk])?;
            remaining -= chunk as u64;
            emitted += chunk as u64;
        }

        let new_old_pos = old.position() as i64 + control.old_skip;
        if new_old_pos < 0 || new_old_pos as u64 > old.len() {
            return Err(E::OldOutOfBounds(new_old_pos, old.len()));
        }
        old.seek_to(new_old_pos as u64)?;
    }

    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferConfig;
    use crate::range::TypedRange;
    use std::io::Cursor;

    fn window(bytes: &[u8]) -> Window<Cursor<&[u8]>> {
        Window::new(Cursor::new(bytes), 0, bytes.len() as u64).unwrap()
    }

    fn build_delta(new_size: i64, triples: &[(i64, i64, i64)], add_bytes: &[u8], copy_bytes: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(SIGNATURE);
        buf.extend_from_slice(&crate::utils::encode_sign_magnitude(new_size));
        let mut add_pos = 0;
        let mut copy_pos = 0;
        for &(diff, copy, skip) in triples {
            buf.extend_from_slice(&crate::utils::encode_sign_magnitude(diff));
            buf.extend_from_slice(&crate::utils::encode_sign_magnitude(copy));
            buf.extend_from_slice(&crate::utils::encode_sign_magnitude(skip));
            buf.extend_from_slice(&add_bytes[add_pos..add_pos + diff as usize]);
            add_pos += diff as usize;
            buf.extend_from_slice(&copy_bytes[copy_pos..copy_pos + copy as usize]);
            copy_pos += copy as usize;
        }
        buf
    }

    fn sink(ranges: Vec<TypedRange>) -> PartiallyCompressingOutput<Vec<u8>> {
        PartiallyCompressingOutput::new(Vec::new(), ranges)
    }

    #[test]
    fn zero_new_size_emits_nothing() {
        let delta = build_delta(0, &[], &[], &[]);
        let mut out = sink(Vec::new());
        let emitted = apply(window(b"old"), Cursor::new(&delta[..]), &mut out, &BufferConfig::default()).unwrap();
        assert_eq!(emitted, 0);
        assert_eq!(out.close().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_add_and_copy_segment() {
        // old = "abc", addends make diff segment "abc" + delta 1 => "bcd"
        let old = b"abc";
        let add_bytes = [1u8, 1, 1];
        let copy_bytes = b"XY";
        let delta = build_delta(5, &[(3, 2, 0)], &add_bytes, copy_bytes);

        let mut out = sink(Vec::new());
        let emitted = apply(window(old), Cursor::new(&delta[..]), &mut out, &BufferConfig::default()).unwrap();
        assert_eq!(emitted, 5);
        assert_eq!(out.close().unwrap(), b"bcdXY");
    }

    #[test]
    fn rejects_bad_signature() {
        let mut delta = build_delta(0, &[], &[], &[]);
        delta[0] = b'?';
        let mut out = sink(Vec::new());
        assert!(matches!(apply(window(b""), Cursor::new(&delta[..]), &mut out, &BufferConfig::default()), Err(E::BadSignature(_))));
    }

    #[test]
    fn rejects_overrun_triple() {
        // declares newSize=1 but diff segment alone asks for 2 bytes
        let add_bytes = [0u8, 0];
        let delta = build_delta(1, &[(2, 0, 0)], &add_bytes, &[]);
        let mut out = sink(Vec::new());
        assert!(matches!(apply(window(b"ab"), Cursor::new(&delta[..]), &mut out, &BufferConfig::default()), Err(E::OutputOverrun)));
    }

    #[test]
    fn rejects_seek_out_of_bounds() {
        let delta = build_delta(0, &[], &[], &[]);
        // Manually craft a control triple instead so seek is exercised: newSize 1 diff 1, seek -5
        let mut buf = Vec::new();
        buf.extend_from_slice(SIGNATURE);
        buf.extend_from_slice(&crate::utils::encode_sign_magnitude(1));
        buf.extend_from_slice(&crate::utils::encode_sign_magnitude(1));
        buf.extend_from_slice(&crate::utils::encode_sign_magnitude(0));
        buf.extend_from_slice(&crate::utils::encode_sign_magnitude(-5));
        buf.push(0);
        let _ = delta; // unused placeholder variant
        let mut out = sink(Vec::new());
        assert!(matches!(
            apply(window(b"a"), Cursor::new(&buf[..]), &mut out, &BufferConfig::default()),
            Err(E::OldOutOfBounds(_, _))
        ));
    }
}
