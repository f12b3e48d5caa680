//! Sign-magnitude 64-bit integer codec used by the BSDIFF delta payload.
//!
//! Bit 63 of the little-endian 8-byte encoding is the sign; bits 0-62 are the
//! magnitude. This is not the platform's two's-complement representation, so
//! it is decoded by hand rather than by reusing `i64::from_le_bytes`. The
//! value `1 << 63` ("negative zero") has no magnitude and is unrepresentable.

const SIGN_BIT: u64 = 1 << 63;
const MAGNITUDE_MASK: u64 = SIGN_BIT - 1;

/// Decode a sign-magnitude 64-bit little-endian integer.
///
/// Returns `None` for the unrepresentable encoding (sign set, magnitude zero).
pub fn decode_sign_magnitude(bytes: &[u8; 8]) -> Option<i64> {
    let raw = u64::from_le_bytes(*bytes);
    let magnitude = raw & MAGNITUDE_MASK;
    if raw & SIGN_BIT != 0 {
        if magnitude == 0 {
            return None;
        }
        Some(-(magnitude as i64))
    } else {
        Some(magnitude as i64)
    }
}

/// Encode a signed 64-bit integer as sign-magnitude little-endian bytes.
///
/// Only used by test fixtures: the apply engine never emits BSDIFF payloads.
pub fn encode_sign_magnitude(value: i64) -> [u8; 8] {
    let magnitude = value.unsigned_abs();
    let raw = if value < 0 { magnitude | SIGN_BIT } else { magnitude };
    raw.to_le_bytes()
}
