//! Format constants and the shared match-cost function.
//!
//! Available whenever either `compress` or `decompress` is enabled, since
//! both the encoders and the decoder must agree on the exact same constants.
//!
//! This is the bitstream's fixed-structure prefix code: window size, length
//! group thresholds, and offset-slot structure. None of it depends on the
//! input; it parameterizes every encoder and the decoder identically.

/// Window size in bits (17..23 in the reference; CRUSH fixes it at 21).
pub const W_BITS: u32 = 21;
/// Window size in bytes: the largest representable back-reference distance.
pub const W_SIZE: u64 = 1 << W_BITS;
/// Number of bits used to select an offset slot.
pub const SLOT_BITS: u32 = 4;
/// Number of offset slots (`1 << SLOT_BITS`).
pub const NUM_SLOTS: u32 = 1 << SLOT_BITS;

pub(crate) const A_BITS: u32 = 2; // 1 xx
pub(crate) const B_BITS: u32 = 2; // 01 xx
pub(crate) const C_BITS: u32 = 2; // 001 xx
pub(crate) const D_BITS: u32 = 3; // 0001 xxx
pub(crate) const E_BITS: u32 = 5; // 00001 xxxxx
pub(crate) const F_BITS: u32 = 9; // 00000 xxxxxxxxx

pub(crate) const A: u32 = 1 << A_BITS;
pub(crate) const B: u32 = (1 << B_BITS) + A;
pub(crate) const C: u32 = (1 << C_BITS) + B;
pub(crate) const D: u32 = (1 << D_BITS) + C;
pub(crate) const E: u32 = (1 << E_BITS) + D;
const F: u32 = (1 << F_BITS) + E;

/// Minimum encodable match length.
pub const MIN_MATCH: u32 = 3;
/// Maximum encodable match length.
pub const MAX_MATCH: u32 = (F - 1) + MIN_MATCH;

/// Sentinel "no match" position used by the hash chain and binary tree.
pub const NO_MATCH_POS: u32 = u32::MAX;

/// Default hash width in bits; see [`hash_bits_for`].
pub const CRUSH_HASH_BITS: u32 = 17;
/// Size of the hash lookup table at the default hash width.
pub const LOOKUP_SIZE: usize = 1 << CRUSH_HASH_BITS;

/// Upper bound on compressed size for `src_size` bytes of input.
pub const fn max_packed_size(src_size: usize) -> usize {
    src_size + src_size / 8 + 64
}

/// Pick the hash width used to build the lookup table for a given input
/// size (§4.3 Phase 1).
///
/// For small inputs the work-memory layout already reserves a full
/// `LOOKUP_SIZE`-entry table (see `workmem_size`'s small-input branch), so
/// the default width is used outright. For large inputs the table instead
/// shares space with the `mpos` array (one word per source byte), so the
/// width is capped at `log2(src_size)` to guarantee it fits.
pub fn hash_bits_for(src_size: usize) -> u32 {
    if 2 * src_size < LOOKUP_SIZE {
        CRUSH_HASH_BITS
    } else {
        log2_floor(src_size.max(1) as u32)
    }
}

/// Floor of base-2 logarithm of a nonzero integer.
#[inline]
pub fn log2_floor(n: u32) -> u32 {
    debug_assert!(n > 0);
    31 - n.leading_zeros()
}

/// Fibonacci hash (Knuth's multiplicative hash) of the 3 bytes at `bytes`.
///
/// The constant `2654435761` is a prime close to `2^32 / phi`. Any 3-byte
/// hash is format-compatible; this one matches the reference's search
/// characteristics (see spec's Design Notes on the Fibonacci hash constant).
#[inline]
pub fn hash3(bytes: &[u8], bits: u32) -> u32 {
    debug_assert!(bits > 0 && bits <= 32);
    let val = bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16;
    val.wrapping_mul(2_654_435_761).wrapping_shr(32 - bits)
}

/// Exact bit cost of encoding the token `(offs, len)` at the current bit
/// position (ignoring byte alignment): one flag bit, plus the length-group
/// prefix+suffix, plus the offset slot selector and its suffix.
///
/// `offs` is the raw encoded offset (`distance - 1`); `len` is the full
/// match length (including `MIN_MATCH`).
pub fn match_cost(offs: u32, len: u32) -> u32 {
    let mut cost = 1u32;

    let l = len - MIN_MATCH;

    cost += if l < A {
        1 + A_BITS
    } else if l < B {
        2 + B_BITS
    } else if l < C {
        3 + C_BITS
    } else if l < D {
        4 + D_BITS
    } else if l < E {
        5 + E_BITS
    } else {
        5 + F_BITS
    };

    cost += SLOT_BITS;

    if offs >= (2 << (W_BITS - NUM_SLOTS)) {
        cost += log2_floor(offs);
    } else {
        cost += W_BITS - (NUM_SLOTS - 1);
    }

    cost
}
