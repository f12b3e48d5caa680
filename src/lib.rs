/*!
Apply engine for file-by-file archive patches.

A file-by-file patch expresses the difference between an old and a new
ZIP-family archive (APK, JAR, plain ZIP) by diffing over the *uncompressed*
content of selected entries wherever possible, then recompressing the result
byte-for-byte on the way out. This crate implements the apply side only:
parsing the patch wire format (§4.1), rebuilding the delta-friendly old blob
by selectively inflating the old archive (§4.3), running the delta algorithm
named by each descriptor (BSDIFF, GDIFF, or a nested file-by-file patch,
§4.2), and splicing the results into the new archive while transparently
recompressing the configured ranges (§4.4).

Patch *generation* is out of scope; this crate only knows how to apply an
already-produced patch.

```no_run
use std::io::Cursor;

fn apply_patch(old: &[u8], patch: &[u8]) -> fbfpatch::Result<Vec<u8>> {
    let new_out = fbfpatch::apply(old, patch, Cursor::new(Vec::new()))?;
    Ok(new_out.into_inner())
}
```
*/

pub mod config;
pub mod deflate;
pub mod delta;
pub mod error;
mod orchestrator;
pub mod plan;
pub mod range;
pub mod recompress;
pub mod uncompress;
pub mod utils;
pub mod window;

#[cfg(test)]
mod test_support;

pub use config::BufferConfig;
pub use error::{
    DeltaApplyError, Error, OrchestratorError, PatchFormatError, RecompressError, Result,
    UncompressError,
};
pub use plan::{DeltaDescriptor, DeltaFormat, PatchApplyPlan};
pub use range::{DeflateParameters, Range, Strategy, TypedRange};

use std::io::Write;
use std::path::Path;

/// Apply `patch` to `old`, writing the reconstructed new archive to
/// `new_out`. Uses the system temporary directory for the delta-friendly old
/// scratch file; see [`apply_in`] to use a caller-chosen directory.
///
/// `new_out` is never closed: on success it is flushed and returned to the
/// caller so they retain control of its lifetime.
pub fn apply<W: Write>(old: &[u8], patch: &[u8], new_out: W) -> Result<W> {
    apply_in(old, patch, new_out, &std::env::temp_dir())
}

/// As [`apply`], but the delta-friendly old scratch file is created in
/// `temp_dir` rather than the system default. The scratch file is removed
/// before this function returns, whether it succeeds or fails.
pub fn apply_in<W: Write>(old: &[u8], patch: &[u8], new_out: W, temp_dir: &Path) -> Result<W> {
    orchestrator::apply(old, patch, new_out, temp_dir)
}

/// As [`apply_in`], but with caller-chosen BSDIFF buffer sizing (mirrors the
/// teacher's `Bspatch::buffer_size`/`delta_min` builder methods, §1.1).
pub fn apply_with_config<W: Write>(
    old: &[u8],
    patch: &[u8],
    new_out: W,
    temp_dir: &Path,
    cfg: &BufferConfig,
) -> Result<W> {
    orchestrator::apply_with_config(old, patch, new_out, temp_dir, cfg)
}
