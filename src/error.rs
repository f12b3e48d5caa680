//! Error taxonomy for the patch-apply engine.
//!
//! Each component of the pipeline (§2 of the design notes) owns a narrow
//! error enum describing only the violations it can detect; [`Error`] widens
//! all of them plus [`std::io::Error`] into the single type every public
//! entry point returns.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural violations detected while parsing the patch header and plans (C1).
#[derive(Debug, Error)]
pub enum PatchFormatError {
    #[error("not a valid patch: bad magic identifier")]
    BadMagic,
    #[error("reserved flags field is non-zero")]
    NonZeroFlags,
    #[error("negative length in {0}")]
    NegativeLength(&'static str),
    #[error("negative offset in {0}")]
    NegativeOffset(&'static str),
    #[error("{0} is not strictly ascending")]
    BadOrder(&'static str),
    #[error("unrecognised compatibility window id {0}")]
    BadCompatWindow(u8),
    #[error("deflate level {0} out of range 1..9")]
    BadLevel(u8),
    #[error("deflate strategy {0} out of range 0..2")]
    BadStrategy(u8),
    #[error("nowrap flag byte {0} is not 0 or 1")]
    BadNowrap(u8),
    #[error("unrecognised delta format byte {0}")]
    BadDeltaFormat(u8),
    #[error("record count {0} does not fit in a signed 32-bit integer")]
    BadRecordCount(i64),
    #[error("recompress and delta plans disagree on delta-friendly new size")]
    SizeMismatch,
    #[error("patch stream ended before the expected structure was read")]
    Truncated,
}

/// Violations raised by a binary-diff applier (C2).
#[derive(Debug, Error)]
pub enum DeltaApplyError {
    #[error("bad signature: {0}")]
    BadSignature(&'static str),
    #[error("bad newSize: {0}")]
    BadNewSize(&'static str),
    #[error("bad control triple: {0}")]
    BadControl(&'static str),
    #[error("old-file position {0} is out of bounds [0, {1}]")]
    OldOutOfBounds(i64, u64),
    #[error("applier would write past the declared output size")]
    OutputOverrun,
    #[error("delta stream ended unexpectedly")]
    Truncated,
    #[error("unrecognised opcode {0}")]
    BadOpcode(u8),
    #[error("nested file-by-file patch failed: {0}")]
    Nested(Box<Error>),
    #[error(transparent)]
    Recompress(#[from] RecompressError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Violations raised while deflating the delta-friendly new stream (C4).
#[derive(Debug, Error)]
pub enum RecompressError {
    #[error("range closed before output_position reached its end")]
    IncompleteRange,
    #[error("deflate parameters rejected by the compatibility window: {0}")]
    BadParameters(String),
    #[error("deflate encoder failure: {0}")]
    Encoder(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Violations raised while inflating the delta-friendly old stream (C3).
#[derive(Debug, Error)]
pub enum UncompressError {
    #[error("inflate failure: {0}")]
    Inflate(String),
    #[error("uncompressed region size mismatch at gap boundary")]
    SizeMismatch,
    #[error("uncompress-plan range [{offset}, {offset}+{length}) exceeds old file length {old_len}")]
    RangeOutOfBounds { offset: u64, length: u64, old_len: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Violations raised by the apply orchestrator itself (C5).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("unsupported delta format byte {0}")]
    UnsupportedDeltaFormat(u8),
    #[error("delta descriptor declared {expected} new-file bytes but the applier emitted {actual}")]
    DeltaOutputSizeMismatch { expected: u64, actual: u64 },
    #[error("scratch file I/O failure: {0}")]
    Scratch(std::io::Error),
}

/// Top-level error type returned by every public entry point.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    PatchFormat(#[from] PatchFormatError),
    #[error(transparent)]
    DeltaApply(#[from] DeltaApplyError),
    #[error(transparent)]
    Recompress(#[from] RecompressError),
    #[error(transparent)]
    Uncompress(#[from] UncompressError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
