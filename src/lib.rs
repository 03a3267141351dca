#![cfg_attr(not(feature = "std"), no_std)]
//! # crush
//!
//! A single-block implementation of [CRUSH](https://github.com/jibsen/bcrush), a
//! byte-oriented LZ77-family compression format: literals and back-references
//! packed into a dependency-free bitstream, with no container or framing of
//! its own (that is left to the caller).
//!
//! Two encoders are offered, both producing bitstreams the single decoder
//! reads identically:
//!
//! - levels 5-7 run a fast hash-chain parser (greedy-with-lookahead);
//! - levels 8-10 run a slower, optimal binary-search-tree parser that
//!   minimizes the exact encoded bit cost.
//!
//! ### Usage
//!
//! See the [`compress`] or [`decompress`] module documentation for reference.
//!
//! In `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! crush = "0.2.0"
//! ```
//!
//! Or, to only enable certain features:
//!
//! ```toml
//! [dependencies.crush]
//! version = "0.2.0"
//! default-features = false
//! features = ["decompress", "compress"]
//! ```
//!
//! - `decompress`: Enables [`depack`](decompress::depack).
//! - `compress`: Enables [`pack_level`](compress::pack_level) and friends.
//! - `alloc`: Enables the allocating [`pack`](compress::pack) entry point.
//!            Without `std`, this uses `extern crate alloc`.
//! - `std`: Enables use of `std`. Implies `alloc`.
//!
//! All features are enabled by default.

#[cfg(feature = "compress")]
pub mod compress;
#[cfg(feature = "decompress")]
pub mod decompress;

mod bitio;
mod format;

/// Error result codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// `level` passed to [`workmem_size`](compress::workmem_size) or
    /// [`pack_level`](compress::pack_level) is outside `5..=10`.
    InvalidLevel,
    /// A decoded match reaches further back than any data produced so far;
    /// likely indicates corrupt or truncated compressed input.
    LookbehindOverrun,
    /// Output buffer was not large enough to hold the result.
    OutputOverrun,
    /// Compressed input buffer is truncated or otherwise exhausted
    /// mid-token.
    InputOverrun,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::InvalidLevel => write!(f, "invalid compression level"),
            Error::LookbehindOverrun => write!(f, "lookbehind overrun"),
            Error::OutputOverrun => write!(f, "output overrun"),
            Error::InputOverrun => write!(f, "input overrun"),
        }
    }
}

impl core::error::Error for Error {}

#[cfg(test)]
#[cfg(all(feature = "compress", feature = "decompress", feature = "alloc"))]
mod tests {
    #[cfg(not(feature = "std"))]
    extern crate alloc;

    #[cfg(not(feature = "std"))]
    use alloc::vec;

    use super::{compress::pack, decompress::depack};

    #[test]
    fn round_trips_a_small_english_sentence() {
        let input = b"the quick brown fox jumps over the lazy dog";
        for level in 5..=10u8 {
            let compressed = pack(input, level).expect("failed to compress");
            let mut dst = vec![0u8; input.len()];
            depack(&compressed, &mut dst).expect("failed to decompress");
            assert_eq!(input, dst.as_slice());
        }
    }

    #[test]
    fn round_trips_binary_data_with_long_runs() {
        let mut input = vec![0u8; 8192];
        for (i, b) in input.iter_mut().enumerate() {
            *b = (i % 3 == 0) as u8 * 0xAB;
        }
        for level in 5..=10u8 {
            let compressed = pack(&input, level).expect("failed to compress");
            let mut dst = vec![0u8; input.len()];
            depack(&compressed, &mut dst).expect("failed to decompress");
            assert_eq!(input, dst);
        }
    }
}
