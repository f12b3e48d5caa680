//! Buffer sizing knobs for an apply run (§1.1 ambient configuration).
//!
//! Mirrors the teacher's `Bspatch` builder (`buffer_size`, `delta_min`):
//! a library takes configuration through builder methods on its entry
//! point, not a global config object.

/// Default main I/O chunk size, shared by every delta applier and the
/// uncompress/recompress paths. Same value the teacher uses for its copy
/// buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 131072;

/// Default initial size of the BSDIFF add/old scratch buffers. Grows up to
/// `buffer_size` as individual control triples demand.
pub const DEFAULT_DELTA_MIN: usize = 32768;

/// Lower bound below which `buffer_size`/`delta_min` are clamped, matching
/// the teacher's own `bs < 128 => 128` guard.
const MIN_BUFFER: usize = 128;

/// The buffer sizes used while applying one patch.
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    pub buffer_size: usize,
    pub delta_min: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig { buffer_size: DEFAULT_BUFFER_SIZE, delta_min: DEFAULT_DELTA_MIN }
    }
}

impl BufferConfig {
    /// Clamp `buffer_size` to at least `MIN_BUFFER`.
    pub fn with_buffer_size(mut self, bs: usize) -> Self {
        self.buffer_size = Ord::max(bs, MIN_BUFFER);
        self
    }

    /// Clamp `delta_min` to at least `MIN_BUFFER`, and to at most the
    /// current `buffer_size` (it seeds a buffer that will grow up to
    /// `buffer_size` as needed, never starts larger than that).
    pub fn with_delta_min(mut self, dm: usize) -> Self {
        self.delta_min = Ord::min(Ord::max(dm, MIN_BUFFER), self.buffer_size);
        self
    }
}
