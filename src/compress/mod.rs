//! # Compression routines
//!
//! Available with feature `compress`.
//!
//! [`pack`] is available when the `alloc` feature is enabled; it allocates
//! both the destination buffer and the work memory. [`pack_level`] is the
//! `no_std`-friendly entry point: caller-owned `dst` and `workmem` buffers,
//! no allocation anywhere in the call.
//!
//! # Examples
//!
//! ```
//! use crush::compress::{pack, workmem_size};
//! # #[cfg(feature = "alloc")] {
//! let input = b"abcabcabcabcabcabc";
//! let packed = pack(input, 5)?;
//! assert!(packed.len() <= crush::compress::max_packed_size(input.len()));
//! # }
//! # Ok::<(), crush::Error>(())
//! ```

mod chain;
mod tree;

#[cfg(all(feature = "alloc", not(feature = "std")))]
extern crate alloc;

#[cfg(all(feature = "alloc", not(feature = "std")))]
use alloc::vec;
#[cfg(all(feature = "alloc", not(feature = "std")))]
use alloc::vec::Vec;
#[cfg(all(feature = "alloc", feature = "std"))]
use std::vec;
#[cfg(all(feature = "alloc", feature = "std"))]
use std::vec::Vec;

use crate::bitio::BitWriter;
use crate::format::{self, A, A_BITS, B, B_BITS, C, C_BITS, D, D_BITS, E, E_BITS, F_BITS,
    MIN_MATCH, NUM_SLOTS, SLOT_BITS, W_BITS};
use crate::Error;

pub use crate::format::max_packed_size;

/// Which of the two parsers a level selects, and the search parameters
/// within it (§4.3/§4.4 "Level mapping").
#[derive(Clone, Copy)]
enum Params {
    Chain { max_depth: u32, accept_len: u32 },
    Tree { max_depth: u32, accept_len: u32 },
}

fn level_params(level: u8) -> Result<Params, Error> {
    match level {
        5 => Ok(Params::Chain { max_depth: 1, accept_len: 16 }),
        6 => Ok(Params::Chain { max_depth: 8, accept_len: 32 }),
        7 => Ok(Params::Chain { max_depth: 64, accept_len: 64 }),
        8 => Ok(Params::Tree { max_depth: 16, accept_len: 96 }),
        9 => Ok(Params::Tree { max_depth: 32, accept_len: 224 }),
        10 => Ok(Params::Tree { max_depth: u32::MAX, accept_len: u32::MAX }),
        _ => Err(Error::InvalidLevel),
    }
}

/// Size in `u32` words the `workmem` buffer passed to [`pack_level`] must
/// have, for compressing `src_size` bytes at the given `level`.
///
/// Returns [`Error::InvalidLevel`] for levels outside `5..=10`.
pub fn workmem_words(src_size: usize, level: u8) -> Result<usize, Error> {
    match level_params(level)? {
        Params::Chain { .. } => Ok(chain::workmem_len(src_size)),
        Params::Tree { .. } => Ok(tree::workmem_len(src_size)),
    }
}

/// Size in bytes the `workmem` buffer passed to [`pack_level`] must have.
pub fn workmem_size(src_size: usize, level: u8) -> Result<usize, Error> {
    Ok(workmem_words(src_size, level)? * core::mem::size_of::<u32>())
}

/// Compress `src` into `dst` at the given level (`5..=10`), using `workmem`
/// as scratch space (sized per [`workmem_words`]).
///
/// Returns the number of bytes written to `dst`, which never exceeds
/// [`max_packed_size`].
pub fn pack_level(
    src: &[u8],
    dst: &mut [u8],
    workmem: &mut [u32],
    level: u8,
) -> Result<usize, Error> {
    let params = level_params(level)?;

    if src.is_empty() {
        return Ok(0);
    }

    let mut bw = BitWriter::new(dst);

    // Matches need 3 bytes to hash and MIN_MATCH to encode; for tiny inputs
    // skip search entirely and emit literals (§4.3/§4.4, §7 edge case).
    if src.len() < MIN_MATCH as usize + 1 {
        for &byte in src {
            emit_literal(&mut bw, byte)?;
        }
        return bw.finalize();
    }

    match params {
        Params::Chain { max_depth, accept_len } => {
            chain::parse(src, &mut bw, workmem, max_depth, accept_len)?;
        }
        Params::Tree { max_depth, accept_len } => {
            tree::parse(src, &mut bw, workmem, max_depth, accept_len)?;
        }
    }

    bw.finalize()
}

/// Compress `src` into a freshly allocated `Vec<u8>`, allocating its own
/// work memory.
#[cfg(feature = "alloc")]
pub fn pack(src: &[u8], level: u8) -> Result<Vec<u8>, Error> {
    let words = workmem_words(src.len(), level)?;
    let mut workmem = vec![0u32; words];
    let mut dst = vec![0u8; format::max_packed_size(src.len())];
    let size = pack_level(src, &mut dst, &mut workmem, level)?;
    dst.truncate(size);
    Ok(dst)
}

/// Compress `src` into a caller-owned `dst`, allocating only the work
/// memory. Useful when `dst` is already sized (or reused across calls) but
/// the caller would rather not work out [`workmem_size`] themselves.
#[cfg(feature = "alloc")]
pub fn pack_with_workmem_vec(src: &[u8], dst: &mut [u8], level: u8) -> Result<usize, Error> {
    let words = workmem_words(src.len(), level)?;
    let mut workmem = vec![0u32; words];
    pack_level(src, dst, &mut workmem, level)
}

/// Emit a single literal byte: a 0 flag bit followed by 8 data bits, packed
/// as one 9-bit write (§4.5).
#[inline]
pub(crate) fn emit_literal(bw: &mut BitWriter, byte: u8) -> Result<(), Error> {
    bw.put((byte as u32) << 1, 9)
}

/// Emit a match token: a 1 flag bit, the length code, then the offset code
/// (§4.5). `offs` is the raw encoded offset (`distance - 1`); `len` is the
/// full match length including `MIN_MATCH`.
pub(crate) fn emit_match(bw: &mut BitWriter, offs: u32, len: u32) -> Result<(), Error> {
    bw.put(1, 1)?;

    let l = len - MIN_MATCH;

    if l < A {
        bw.put(1, 1)?;
        bw.put(l, A_BITS)?;
    } else if l < B {
        bw.put(1 << 1, 2)?;
        bw.put(l - A, B_BITS)?;
    } else if l < C {
        bw.put(1 << 2, 3)?;
        bw.put(l - B, C_BITS)?;
    } else if l < D {
        bw.put(1 << 3, 4)?;
        bw.put(l - C, D_BITS)?;
    } else if l < E {
        bw.put(1 << 4, 5)?;
        bw.put(l - D, E_BITS)?;
    } else {
        bw.put(0, 5)?;
        bw.put(l - E, F_BITS)?;
    }

    let low_range_bits = W_BITS - (NUM_SLOTS - 1);
    let low_range_limit = 2 << (W_BITS - NUM_SLOTS);

    if offs >= low_range_limit {
        let mlog = format::log2_floor(offs);
        bw.put(mlog - (W_BITS - NUM_SLOTS), SLOT_BITS)?;
        bw.put(offs - (1 << mlog), mlog)?;
    } else {
        bw.put(0, SLOT_BITS)?;
        bw.put(offs, low_range_bits)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompress::depack;

    fn roundtrip(input: &[u8], level: u8) -> Vec<u8> {
        let words = workmem_words(input.len(), level).unwrap();
        let mut workmem = vec![0u32; words];
        let mut dst = vec![0u8; format::max_packed_size(input.len())];
        let size = pack_level(input, &mut dst, &mut workmem, level).unwrap();
        dst.truncate(size);
        let mut out = vec![0u8; input.len()];
        let n = depack(&dst, &mut out).unwrap();
        assert_eq!(n, input.len());
        assert_eq!(out, input);
        dst
    }

    #[test]
    fn empty_input_encodes_to_zero_bytes() {
        for level in 5..=10 {
            let dst = roundtrip(b"", level);
            assert_eq!(dst.len(), 0);
        }
    }

    #[test]
    fn single_byte_encodes_to_two_bytes() {
        for level in 5..=10 {
            let dst = roundtrip(b"A", level);
            assert_eq!(dst.len(), 2);
        }
    }

    #[test]
    fn three_byte_input_encodes_to_four_bytes() {
        for level in 5..=10 {
            let dst = roundtrip(b"ABC", level);
            assert_eq!(dst.len(), 4);
        }
    }

    #[test]
    fn repeated_run_compresses_with_a_match() {
        for level in 5..=10 {
            roundtrip(b"AAAAAAAA", level);
            roundtrip(b"ABABABABABABABAB", level);
        }
    }

    #[test]
    fn invalid_level_is_rejected() {
        assert_eq!(level_params(4).unwrap_err(), Error::InvalidLevel);
        assert_eq!(level_params(11).unwrap_err(), Error::InvalidLevel);
        assert_eq!(workmem_size(16, 0).unwrap_err(), Error::InvalidLevel);
    }

    #[test]
    fn all_levels_round_trip_and_respect_the_size_bound() {
        let input: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        for level in 5..=10 {
            let dst = roundtrip(&input, level);
            assert!(dst.len() <= format::max_packed_size(input.len()));
        }
    }

    #[test]
    fn level_ten_is_never_worse_than_faster_levels() {
        let input: Vec<u8> =
            b"the quick brown fox jumps over the lazy dog, again and again and again"
                .iter()
                .cycle()
                .take(3000)
                .copied()
                .collect();

        let words10 = workmem_words(input.len(), 10).unwrap();
        let mut workmem10 = vec![0u32; words10];
        let mut dst10 = vec![0u8; format::max_packed_size(input.len())];
        let size10 = pack_level(&input, &mut dst10, &mut workmem10, 10).unwrap();

        for level in 5..=9 {
            let words = workmem_words(input.len(), level).unwrap();
            let mut workmem = vec![0u32; words];
            let mut dst = vec![0u8; format::max_packed_size(input.len())];
            let size = pack_level(&input, &mut dst, &mut workmem, level).unwrap();
            assert!(size10 <= size, "level 10 ({size10}) should beat level {level} ({size})");
        }
    }
}
