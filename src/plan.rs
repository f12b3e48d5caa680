//! C1: the patch reader. Parses the `GFbFv1_0` wire format (§4.1) into a
//! [`PatchApplyPlan`] plus the ordered delta descriptor/payload pairs.

use std::io::Cursor;

use byteorder::{BigEndian, ByteOrder};

use crate::error::PatchFormatError as E;
use crate::range::{DeflateParameters, Range, Strategy, TypedRange};

/// Magic identifier at the start of every patch: ASCII `GFbFv1_0`.
pub const MAGIC: &[u8; 8] = b"GFbFv1_0";

/// Delta algorithm selected for one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaFormat {
    Bsdiff,
    FileByFile,
    Gdiff,
}

impl DeltaFormat {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(DeltaFormat::Bsdiff),
            1 => Some(DeltaFormat::FileByFile),
            2 => Some(DeltaFormat::Gdiff),
            _ => None,
        }
    }
}

/// One delta record: which algorithm, which old/new working ranges, and how
/// many payload bytes follow it in the patch stream.
#[derive(Debug, Clone, Copy)]
pub struct DeltaDescriptor {
    pub format: DeltaFormat,
    pub old_working_range: Range,
    pub new_working_range: Range,
    pub delta_length: u64,
}

/// The fully parsed, validated apply plan (§3).
#[derive(Debug, Clone)]
pub struct PatchApplyPlan {
    pub delta_friendly_old_size: u64,
    pub delta_friendly_new_size: u64,
    pub uncompress_plan: Vec<Range>,
    pub recompress_plan: Vec<TypedRange>,
    pub delta_descriptors: Vec<DeltaDescriptor>,
}

/// A parsed patch: the plan, plus a borrowed payload slice per descriptor.
pub struct ParsedPatch<'p> {
    pub plan: PatchApplyPlan,
    payloads: Vec<&'p [u8]>,
}

impl<'p> ParsedPatch<'p> {
    /// Iterate `(descriptor, bounded delta stream)` pairs in patch order.
    pub fn deltas(&self) -> impl Iterator<Item = (&DeltaDescriptor, Cursor<&'p [u8]>)> + '_ {
        self.plan
            .delta_descriptors
            .iter()
            .zip(self.payloads.iter().map(|s| Cursor::new(*s)))
    }
}

/// Minimal forward-only cursor over a borrowed byte slice, used only while
/// parsing the fixed-width header and plans.
struct ByteReader<'p> {
    data: &'p [u8],
    pos: usize,
}

impl<'p> ByteReader<'p> {
    fn new(data: &'p [u8]) -> Self {
        ByteReader { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'p [u8], E> {
        if self.data.len() - self.pos < n {
            return Err(E::Truncated);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, E> {
        Ok(self.take(1)?[0])
    }

    fn i32_be(&mut self) -> Result<i32, E> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    fn i64_be(&mut self) -> Result<i64, E> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }
}

fn non_negative(value: i64, field: &'static str, negative_is_length: bool) -> Result<u64, E> {
    if value < 0 {
        if negative_is_length {
            Err(E::NegativeLength(field))
        } else {
            Err(E::NegativeOffset(field))
        }
    } else {
        Ok(value as u64)
    }
}

fn record_count(value: i32, field: &'static str) -> Result<usize, E> {
    if value < 0 {
        Err(E::BadRecordCount(value as i64))
    } else {
        let _ = field;
        Ok(value as usize)
    }
}

/// Parse a complete `GFbFv1_0` patch held entirely in memory.
///
/// This mirrors the teacher's `Bspatch::new(patch: &[u8])` shape: the whole
/// header and both plans must be validated before any delta is exposed, so
/// there is no benefit to an incremental `Read`-based parser.
pub fn parse(patch: &[u8]) -> Result<ParsedPatch<'_>, E> {
    let mut r = ByteReader::new(patch);

    let magic = r.take(8)?;
    if magic != MAGIC {
        return Err(E::BadMagic);
    }

    let flags = r.i32_be()?;
    if flags != 0 {
        return Err(E::NonZeroFlags);
    }

    let delta_friendly_old_size = non_negative(r.i64_be()?, "delta_friendly_old_size", true)?;

    let n = record_count(r.i32_be()?, "uncompress_plan")?;
    let mut uncompress_plan = Vec::with_capacity(n);
    let mut prev_offset: Option<u64> = None;
    for _ in 0..n {
        let offset = non_negative(r.i64_be()?, "uncompress_plan.offset", false)?;
        let length = non_negative(r.i64_be()?, "uncompress_plan.length", true)?;
        if let Some(prev) = prev_offset {
            if offset <= prev {
                return Err(E::BadOrder("uncompress_plan"));
            }
        }
        prev_offset = Some(offset);
        uncompress_plan.push(Range::new(offset, length));
    }

    let m = record_count(r.i32_be()?, "recompress_plan")?;
    let mut recompress_plan = Vec::with_capacity(m);
    let mut prev_offset: Option<u64> = None;
    for _ in 0..m {
        let offset = non_negative(r.i64_be()?, "recompress_plan.offset", false)?;
        let length = non_negative(r.i64_be()?, "recompress_plan.length", true)?;
        let compat_window = r.u8()?;
        let level = r.u8()?;
        let strategy_byte = r.u8()?;
        let nowrap_byte = r.u8()?;

        if crate::deflate::lookup_window(compat_window).is_none() {
            return Err(E::BadCompatWindow(compat_window));
        }
        if !(1..=9).contains(&level) {
            return Err(E::BadLevel(level));
        }
        let strategy = Strategy::from_byte(strategy_byte).ok_or(E::BadStrategy(strategy_byte))?;
        let nowrap = match nowrap_byte {
            0 => false,
            1 => true,
            other => return Err(E::BadNowrap(other)),
        };

        if let Some(prev) = prev_offset {
            if offset <= prev {
                return Err(E::BadOrder("recompress_plan"));
            }
        }
        prev_offset = Some(offset);

        recompress_plan.push(TypedRange {
            range: Range::new(offset, length),
            params: DeflateParameters { compat_window, level, strategy, nowrap },
        });
    }

    let d = record_count(r.i32_be()?, "delta_descriptors")?;
    if d < 1 {
        return Err(E::BadRecordCount(d as i64));
    }
    let mut delta_descriptors = Vec::with_capacity(d);
    let mut payloads = Vec::with_capacity(d);
    let mut expected_new_offset: u64 = 0;
    for _ in 0..d {
        let format_byte = r.u8()?;
        let format = DeltaFormat::from_byte(format_byte).ok_or(E::BadDeltaFormat(format_byte))?;
        let old_offset = non_negative(r.i64_be()?, "delta_descriptor.old_working.offset", false)?;
        let old_length = non_negative(r.i64_be()?, "delta_descriptor.old_working.length", true)?;
        let new_offset = non_negative(r.i64_be()?, "delta_descriptor.new_working.offset", false)?;
        let new_length = non_negative(r.i64_be()?, "delta_descriptor.new_working.length", true)?;
        let delta_length = non_negative(r.i64_be()?, "delta_descriptor.delta_length", true)?;

        if new_offset != expected_new_offset {
            return Err(E::BadOrder("delta_descriptors"));
        }
        expected_new_offset += new_length;

        let payload = r.take(delta_length as usize)?;
        payloads.push(payload);

        delta_descriptors.push(DeltaDescriptor {
            format,
            old_working_range: Range::new(old_offset, old_length),
            new_working_range: Range::new(new_offset, new_length),
            delta_length,
        });
    }

    let delta_friendly_new_size = expected_new_offset;
    for typed in &recompress_plan {
        if typed.end_offset() > delta_friendly_new_size {
            return Err(E::SizeMismatch);
        }
    }

    let plan = PatchApplyPlan {
        delta_friendly_old_size,
        delta_friendly_new_size,
        uncompress_plan,
        recompress_plan,
        delta_descriptors,
    };

    Ok(ParsedPatch { plan, payloads })
}
