//! C2: binary-diff appliers.
//!
//! The delta format byte in a patch selects one of a small closed set of
//! appliers. Each is a free function generic over the old random-access
//! window and the output sink, matching the rest of this crate's preference
//! for monomorphised generics over trait objects (the teacher's `Bspatch`
//! and `Bsdiff` are generic the same way); the dispatch itself is a flat
//! match on [`crate::plan::DeltaFormat`] in the orchestrator (C5), which is
//! the tagged-variant shape §9 of the design notes asks for without needing
//! a `dyn`-safe trait.

pub mod bsdiff;
pub mod file_by_file;
pub mod gdiff;
