//! # Decompression routine
//!
//! Available with feature `decompress`. [`depack`] is the sole entry point:
//! it needs no work memory, only the exact decompressed size (the caller
//! supplies a destination buffer of that size).

use crate::bitio::BitReader;
use crate::format::{A, A_BITS, B, B_BITS, C, C_BITS, D, D_BITS, E, E_BITS, F_BITS, MIN_MATCH,
    NUM_SLOTS, SLOT_BITS, W_BITS};
use crate::Error;

/// Decompress `src` into `dst`, stopping once `dst` is full.
///
/// `dst` must be exactly the original (uncompressed) size: the bitstream
/// carries no length field of its own (§4.6, §2 "self-delimiting"). Returns
/// the number of bytes written, which is always `dst.len()` on success.
pub fn depack(src: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    if dst.is_empty() {
        return Ok(0);
    }

    let mut r = BitReader::new(src);
    let mut pos = 0usize;

    while pos < dst.len() {
        if r.get_bit()? {
            let len = decode_len(&mut r)? as usize;
            let offs = decode_offs(&mut r)?;
            let distance = offs as usize + 1;

            if distance > pos {
                return Err(Error::LookbehindOverrun);
            }

            let mut from = pos - distance;
            for _ in 0..len {
                if pos >= dst.len() {
                    return Err(Error::OutputOverrun);
                }
                // Copied one byte at a time: overlapping matches (distance
                // shorter than len) are how runs are encoded (§4.5 edge case).
                dst[pos] = dst[from];
                from += 1;
                pos += 1;
            }
        } else {
            let byte = r.get(8)? as u8;
            *dst.get_mut(pos).ok_or(Error::OutputOverrun)? = byte;
            pos += 1;
        }
    }

    Ok(pos)
}

/// Decode a length field: up to five cascading "is this the group" flag
/// bits followed by the group's suffix (§4.5, mirrors `emit_match`'s prefix
/// encoding exactly, one group at a time from shortest to longest).
fn decode_len(r: &mut BitReader) -> Result<u32, Error> {
    let mut group = 5;
    for k in 0..5 {
        if r.get_bit()? {
            group = k;
            break;
        }
    }

    let (suffix_bits, base) = match group {
        0 => (A_BITS, 0),
        1 => (B_BITS, A),
        2 => (C_BITS, B),
        3 => (D_BITS, C),
        4 => (E_BITS, D),
        _ => (F_BITS, E),
    };

    let suffix = r.get(suffix_bits)?;
    Ok(base + suffix + MIN_MATCH)
}

/// Decode an offset field: a `SLOT_BITS`-wide slot selector, then either a
/// fixed-width low-range suffix (slot 0) or `mlog` suffix bits for the
/// matching high-range magnitude (mirrors `emit_match`'s offset encoding).
fn decode_offs(r: &mut BitReader) -> Result<u32, Error> {
    let slot = r.get(SLOT_BITS)?;

    if slot == 0 {
        r.get(W_BITS - (NUM_SLOTS - 1))
    } else {
        let mlog = slot + (W_BITS - NUM_SLOTS);
        let suffix = r.get(mlog)?;
        Ok((1u32 << mlog) + suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::pack;

    #[test]
    fn empty_output_needs_no_input() {
        let mut dst: [u8; 0] = [];
        assert_eq!(depack(&[], &mut dst).unwrap(), 0);
    }

    #[test]
    fn truncated_stream_reports_input_overrun() {
        let packed = pack(b"hello, hello, hello, world", 7).unwrap();
        let mut dst = vec![0u8; 27];
        let truncated = &packed[..packed.len() / 2];
        assert_eq!(depack(truncated, &mut dst), Err(Error::InputOverrun));
    }

    #[test]
    fn bogus_offset_reports_lookbehind_overrun() {
        // A single match token with the largest possible offset slot, right
        // at the start of the stream: no prior output exists to reach back
        // into.
        let mut buf = [0u8; 8];
        {
            use crate::bitio::BitWriter;
            let mut w = BitWriter::new(&mut buf);
            w.put(1, 1).unwrap(); // flag: match
            w.put(1, 1).unwrap(); // length group A, shortest length
            w.put(0, A_BITS).unwrap();
            w.put(NUM_SLOTS - 1, SLOT_BITS).unwrap(); // highest slot
            let mlog = (NUM_SLOTS - 1) + (W_BITS - NUM_SLOTS);
            w.put(0, mlog).unwrap();
            w.finalize().unwrap();
        }
        let mut dst = vec![0u8; 16];
        assert_eq!(depack(&buf, &mut dst), Err(Error::LookbehindOverrun));
    }

    #[test]
    fn round_trips_packed_output_across_levels() {
        let input: Vec<u8> = (0..5000u32).map(|i| ((i * 7) % 97) as u8).collect();
        for level in 5..=10u8 {
            let packed = pack(&input, level).unwrap();
            let mut out = vec![0u8; input.len()];
            let n = depack(&packed, &mut out).unwrap();
            assert_eq!(n, input.len());
            assert_eq!(out, input);
        }
    }
}
