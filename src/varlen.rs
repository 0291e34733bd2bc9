//! Variable-length quantities.
//!
//! MIDI delta-times are written 7 bits per byte, most significant group first,
//! with the high bit set on every byte except the last. MUS delta-times use the
//! same accumulation when read back, so both directions live here.

use crate::error::{ConvertError, Result};

/// Largest value a 4-byte MIDI variable-length quantity can hold.
pub const MAX_VARLEN: u32 = 0x0FFF_FFFF;

/// Encode `value` as a MIDI variable-length quantity.
///
/// Returns a fixed scratch array and the number of bytes used (1..=5).
pub fn encode_varlen(mut value: u32) -> ([u8; 5], usize) {
    // Fill from the back so the low group ends up last.
    let mut scratch = [0u8; 5];
    let mut start = scratch.len() - 1;
    scratch[start] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        start -= 1;
        scratch[start] = 0x80 | (value & 0x7F) as u8;
        value >>= 7;
    }

    let len = scratch.len() - start;
    let mut out = [0u8; 5];
    out[..len].copy_from_slice(&scratch[start..]);
    (out, len)
}

/// Decode a MIDI variable-length quantity from the front of `bytes`.
///
/// Returns `(value, bytes_consumed)`, or `None` if the slice ends before a
/// terminating byte or the quantity is longer than 5 bytes.
pub fn decode_varlen(bytes: &[u8]) -> Option<(u32, usize)> {
    let mut value: u32 = 0;
    for (i, &b) in bytes.iter().take(5).enumerate() {
        value = (value << 7) | u32::from(b & 0x7F);
        if b & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}

/// Read a MUS delta-time starting at `offset` inside `score`.
///
/// `base` is the absolute offset of `score` within the MUS input, used only
/// for error reporting. Reading stops after the first byte with a clear high
/// bit; running off the end of `score` is a bounds violation.
pub fn decode_mus_delta(score: &[u8], offset: usize, base: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut used = 0usize;
    loop {
        let &b = score.get(offset + used).ok_or(ConvertError::BufferExhausted {
            offset: base + offset + used,
            needed: 1,
        })?;
        used += 1;
        value = value
            .checked_mul(128)
            .map(|v| v + u32::from(b & 0x7F))
            .filter(|&v| v <= MAX_VARLEN)
            .ok_or(ConvertError::DeltaOutOfRange { offset: base + offset })?;
        if b & 0x80 == 0 {
            return Ok((value, used));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(v: u32) -> Vec<u8> {
        let (bytes, len) = encode_varlen(v);
        bytes[..len].to_vec()
    }

    #[test]
    fn encodes_reference_values() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(0x40), vec![0x40]);
        assert_eq!(encoded(0x7F), vec![0x7F]);
        assert_eq!(encoded(0x80), vec![0x81, 0x00]);
        assert_eq!(encoded(0x2000), vec![0xC0, 0x00]);
        assert_eq!(encoded(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encoded(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(encoded(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn full_u32_needs_five_bytes() {
        let out = encoded(u32::MAX);
        assert_eq!(out.len(), 5);
        assert_eq!(*out.last().unwrap() & 0x80, 0);
    }

    #[test]
    fn decode_inverts_encode() {
        // Sweep across every group boundary rather than the whole range.
        let mut v: u32 = 0;
        while v <= MAX_VARLEN {
            for probe in [v, v.saturating_sub(1), v + 1] {
                let bytes = encoded(probe);
                assert!(bytes.len() <= 5);
                assert_eq!(bytes.last().unwrap() & 0x80, 0, "value {probe:#x}");
                assert!(bytes[..bytes.len() - 1].iter().all(|b| b & 0x80 != 0));
                assert_eq!(decode_varlen(&bytes), Some((probe, bytes.len())));
            }
            v = v * 3 + 1;
        }
    }

    #[test]
    fn decode_rejects_unterminated() {
        assert_eq!(decode_varlen(&[0x81, 0x80]), None);
        assert_eq!(decode_varlen(&[]), None);
    }

    #[test]
    fn mus_delta_reads_until_clear_high_bit() {
        let score = [0x00, 0x82, 0x2C, 0x55];
        assert_eq!(decode_mus_delta(&score, 1, 0), Ok((0x12C, 2)));
        assert_eq!(decode_mus_delta(&score, 3, 0), Ok((0x55, 1)));
    }

    #[test]
    fn mus_delta_past_end_is_exhaustion() {
        let score = [0x81, 0x81];
        assert_eq!(
            decode_mus_delta(&score, 0, 100),
            Err(ConvertError::BufferExhausted { offset: 102, needed: 1 })
        );
    }

    #[test]
    fn mus_delta_too_large_is_rejected() {
        let score = [0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        assert_eq!(
            decode_mus_delta(&score, 0, 16),
            Err(ConvertError::DeltaOutOfRange { offset: 16 })
        );
    }
}
