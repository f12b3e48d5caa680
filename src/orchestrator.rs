//! C5: the apply orchestrator. Drives C1 → C3 → (C2 per descriptor) → C4,
//! and owns the scratch file that holds the delta-friendly old blob for the
//! duration of one apply.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::BufferConfig;
use crate::delta::{bsdiff, file_by_file, gdiff};
use crate::error::{Error, OrchestratorError};
use crate::plan::DeltaFormat;
use crate::recompress::PartiallyCompressingOutput;
use crate::uncompress::build_delta_friendly_old;
use crate::window::Window;

/// Guards the delta-friendly old blob's backing file. `NamedTempFile`
/// already deletes its path on `Drop`; this wrapper exists to name the
/// pattern the design notes call out (§4.5) and to give it a narrower,
/// apply-specific interface than the raw tempfile type.
struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    fn new_in(dir: &Path) -> Result<Self, OrchestratorError> {
        let file = NamedTempFile::new_in(dir).map_err(OrchestratorError::Scratch)?;
        Ok(ScratchFile { file })
    }

    fn writer(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Open an independent, randomly-addressable view restricted to `range`
    /// within the scratch file. Each descriptor gets its own handle so
    /// deltas can be processed one at a time without fighting over a shared
    /// cursor.
    fn open_range(&self, offset: u64, length: u64) -> Result<Window<File>, OrchestratorError> {
        let handle = self.file.as_file().try_clone().map_err(OrchestratorError::Scratch)?;
        Window::new(handle, offset, length).map_err(OrchestratorError::Scratch)
    }

    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>, OrchestratorError> {
        let mut handle = self.file.as_file().try_clone().map_err(OrchestratorError::Scratch)?;
        handle.seek(SeekFrom::Start(offset)).map_err(OrchestratorError::Scratch)?;
        let mut buf = vec![0u8; length as usize];
        handle.read_exact(&mut buf).map_err(OrchestratorError::Scratch)?;
        Ok(buf)
    }
}

/// Apply `patch` to `old`, writing the reconstructed new archive to
/// `new_out`. `temp_dir` is where the delta-friendly old scratch file is
/// created; it is always removed before this function returns, on every
/// exit path.
///
/// `new_out` is never closed: on success it is flushed and handed back to
/// the caller, who retains ownership of its lifetime (§4.5, §8).
pub fn apply<W: Write>(old: &[u8], patch: &[u8], new_out: W, temp_dir: &Path) -> Result<W, Error> {
    apply_with_config(old, patch, new_out, temp_dir, &BufferConfig::default())
}

/// As [`apply`], but with caller-chosen BSDIFF buffer sizing (§1.1).
pub fn apply_with_config<W: Write>(
    old: &[u8],
    patch: &[u8],
    new_out: W,
    temp_dir: &Path,
    cfg: &BufferConfig,
) -> Result<W, Error> {
    let parsed = crate::plan::parse(patch)?;
    let plan = &parsed.plan;
    tracing::debug!(
        delta_friendly_old_size = plan.delta_friendly_old_size,
        uncompress_ranges = plan.uncompress_plan.len(),
        recompress_ranges = plan.recompress_plan.len(),
        descriptors = plan.delta_descriptors.len(),
        "parsed patch apply plan"
    );

    let mut scratch = ScratchFile::new_in(temp_dir)?;
    tracing::trace!(dir = %temp_dir.display(), "opened delta-friendly-old scratch file");
    {
        let nowrap_for = |i: usize| {
            plan.recompress_plan
                .get(i)
                .map(|tr| tr.params.nowrap)
                .unwrap_or(false)
        };
        let writer = scratch.writer();
        let written = build_delta_friendly_old(old, &plan.uncompress_plan, nowrap_for, writer)?;
        if written != plan.delta_friendly_old_size {
            return Err(crate::error::UncompressError::SizeMismatch.into());
        }
    }

    let mut out = PartiallyCompressingOutput::new(new_out, plan.recompress_plan.clone());

    for (descriptor, mut delta_stream) in parsed.deltas() {
        tracing::trace!(
            format = ?descriptor.format,
            old_offset = descriptor.old_working_range.offset,
            new_offset = descriptor.new_working_range.offset,
            new_length = descriptor.new_working_range.length,
            "applying delta descriptor"
        );
        let emitted = match descriptor.format {
            DeltaFormat::Bsdiff => {
                let window = scratch
                    .open_range(descriptor.old_working_range.offset, descriptor.old_working_range.length)?;
                bsdiff::apply(window, &mut delta_stream, &mut out, cfg)?
            }
            DeltaFormat::Gdiff => {
                let window = scratch
                    .open_range(descriptor.old_working_range.offset, descriptor.old_working_range.length)?;
                gdiff::apply(window, &mut delta_stream, &mut out, descriptor.new_working_range.length)?
            }
            DeltaFormat::FileByFile => {
                let old_bytes = scratch
                    .read_range(descriptor.old_working_range.offset, descriptor.old_working_range.length)?;
                let mut delta_bytes = Vec::new();
                delta_stream.read_to_end(&mut delta_bytes).map_err(crate::error::DeltaApplyError::Io)?;
                file_by_file::apply(&old_bytes, &delta_bytes, &mut out, temp_dir, cfg)?
            }
        };

        if emitted != descriptor.new_working_range.length {
            return Err(OrchestratorError::DeltaOutputSizeMismatch {
                expected: descriptor.new_working_range.length,
                actual: emitted,
            }
            .into());
        }
    }

    let new_out = out.close()?;
    Ok(new_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_trivial_bsdiff_patch;

    #[test]
    fn applies_trivial_patch_and_does_not_close_output() {
        #[derive(Default)]
        struct CountingSink {
            data: Vec<u8>,
            closes: u32,
        }
        impl Write for CountingSink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.data.write(buf)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        impl Drop for CountingSink {
            fn drop(&mut self) {
                self.closes += 1;
            }
        }

        let old = b"irrelevant old bytes".to_vec();
        let new = b"the reconstructed new archive".to_vec();
        let patch = build_trivial_bsdiff_patch(&new);

        let dir = tempfile::tempdir().unwrap();
        let sink = CountingSink::default();
        let result = apply(&old, &patch, sink, dir.path()).expect("apply should succeed");
        assert_eq!(result.data, new);
        // The sink is handed back alive; only this final drop increments it.
        assert_eq!(result.closes, 0);
    }

    #[test]
    fn unsupported_delta_format_is_rejected_at_parse_time() {
        let mut patch = build_trivial_bsdiff_patch(b"x");
        // Descriptor format byte sits right after the fixed header + both
        // (empty) plan counts: magic(8) + flags(4) + old_size(8) + n(4) + m(4).
        let format_pos = 8 + 4 + 8 + 4 + 4 + 4;
        patch[format_pos] = 99;
        let dir = tempfile::tempdir().unwrap();
        let err = apply(b"", &patch, Vec::new(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::PatchFormat(_)));
    }

    #[test]
    fn descriptor_size_mismatch_is_reported() {
        use crate::delta::bsdiff::SIGNATURE;
        use crate::plan::MAGIC;
        use crate::utils::encode_sign_magnitude;
        use byteorder::{BigEndian, ByteOrder};

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

        // BSDIFF payload that actually emits 6 bytes ("abcdef"), but the
        // descriptor declares a new_working_range.length of 5.
        let new = b"abcdef";
        let mut delta = Vec::new();
        delta.extend_from_slice(SIGNATURE);
        delta.extend_from_slice(&encode_sign_magnitude(new.len() as i64));
        delta.extend_from_slice(&encode_sign_magnitude(0));
        delta.extend_from_slice(&encode_sign_magnitude(new.len() as i64));
        delta.extend_from_slice(&encode_sign_magnitude(0));
        delta.extend_from_slice(new);

        let mut patch = Vec::new();
        patch.extend_from_slice(MAGIC);
        push_u32(&mut patch, 0);
        push_u64(&mut patch, 0);
        push_u32(&mut patch, 0);
        push_u32(&mut patch, 0);
        push_u32(&mut patch, 1);
        patch.push(0); // BSDIFF
        push_u64(&mut patch, 0);
        push_u64(&mut patch, 0);
        push_u64(&mut patch, 0);
        push_u64(&mut patch, 5); // declared new length, wrong on purpose
        push_u64(&mut patch, delta.len() as i64);
        patch.extend_from_slice(&delta);

        let dir = tempfile::tempdir().unwrap();
        let err = apply(b"", &patch, Vec::new(), dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::Orchestrator(OrchestratorError::DeltaOutputSizeMismatch { .. })
        ));
    }
}
