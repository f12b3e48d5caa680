//! FILE_BY_FILE applier (§4.2.1 of the expanded design).
//!
//! A delta descriptor tagged `FILE_BY_FILE` carries, as its payload, a
//! complete nested `GFbFv1_0` patch addressed at the descriptor's old
//! working range. Applying it means recursing into the orchestrator (C5)
//! with that range as the nested "old archive" and materialising the
//! nested result before splicing it into the parent's output stream — the
//! nested apply owns its own scratch file, its own uncompress/recompress
//! plans and its own deltas, independent of the parent's.

use std::io::Write;
use std::path::Path;

use crate::config::BufferConfig;
use crate::error::DeltaApplyError as E;
use crate::recompress::PartiallyCompressingOutput;

/// Apply a nested file-by-file patch. `old` is the bytes of the descriptor's
/// old working range; `delta` is the complete nested patch byte stream.
/// Returns the number of bytes emitted (the nested new archive's size).
pub fn apply<W: Write>(
    old: &[u8],
    delta: &[u8],
    out: &mut PartiallyCompressingOutput<W>,
    temp_dir: &Path,
    cfg: &BufferConfig,
) -> Result<u64, E> {
    let nested_new = crate::orchestrator::apply_with_config(old, delta, Vec::new(), temp_dir, cfg)
        .map_err(|e| E::Nested(Box::new(e)))?;
    out.write_all(&nested_new)?;
    Ok(nested_new.len() as u64)
}
