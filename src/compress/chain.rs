//! Fast/medium encoder: a backwards dynamic-programming parse over hash
//! chains built in a single forward pass (§4.3).
//!
//! Levels 5 (`max_depth=1, accept_len=16`), 6 (`8, 32`) and 7 (`64, 64`)
//! all go through [`parse`].
//!
//! ## Work memory layout
//!
//! A single `&mut [u32]` buffer backs four logically distinct arrays, the
//! same way the reference C overlaps them through pointer arithmetic on one
//! allocation (see spec's Design Notes, "Overlapping work-memory arenas"):
//!
//! - `prev[0..n]`, the hash-chain links built in phase 1, is read from the
//!   *same slots* that phase 2 writes `cost[0..=n]` into (`cost[n]` lands
//!   in `mpos[0]`'s slot, which is never read meaningfully before it's
//!   overwritten with `mpos[0] = 0` at the very end — both values happen to
//!   be zero).
//! - `lookup[0..table_len]` (phase 1 only) shares memory with `mpos[0..n]`
//!   (phase 2 onward): the lookup table is never consulted again once the
//!   chains are built.
//! - `mlen[0..n]` has its own region; phase 2 writes it, phase 3 reads it.
//!
//! This keeps `workmem_len` equal to the documented
//! `max(3n, n + LOOKUP_SIZE)` word count instead of a separately-allocated,
//! larger layout.

use crate::compress::{emit_literal, emit_match};
use crate::format::{self, hash_bits_for, hash3, match_cost, MAX_MATCH, MIN_MATCH, NO_MATCH_POS, W_SIZE};
use crate::bitio::BitWriter;
use crate::Error;

pub(super) fn workmem_len(src_size: usize) -> usize {
    let n = src_size;
    if format::LOOKUP_SIZE < 2 * n {
        3 * n
    } else {
        n + format::LOOKUP_SIZE
    }
}

/// Thin accessor over the shared work-memory buffer; see the module docs
/// for which logical arrays alias which slots.
struct Mem<'a> {
    mem: &'a mut [u32],
    n: usize,
}

impl<'a> Mem<'a> {
    #[inline]
    fn prev(&self, i: usize) -> u32 {
        self.mem[i]
    }
    #[inline]
    fn set_prev(&mut self, i: usize, v: u32) {
        self.mem[i] = v;
    }
    #[inline]
    fn cost(&self, i: usize) -> u32 {
        self.mem[i]
    }
    #[inline]
    fn set_cost(&mut self, i: usize, v: u32) {
        self.mem[i] = v;
    }
    #[inline]
    fn lookup(&self, h: usize) -> u32 {
        self.mem[self.n + h]
    }
    #[inline]
    fn set_lookup(&mut self, h: usize, v: u32) {
        self.mem[self.n + h] = v;
    }
    #[inline]
    fn mpos(&self, i: usize) -> u32 {
        self.mem[self.n + i]
    }
    #[inline]
    fn set_mpos(&mut self, i: usize, v: u32) {
        self.mem[self.n + i] = v;
    }
    #[inline]
    fn mlen(&self, i: usize) -> u32 {
        self.mem[2 * self.n + i]
    }
    #[inline]
    fn set_mlen(&mut self, i: usize, v: u32) {
        self.mem[2 * self.n + i] = v;
    }
}

pub(super) fn parse(
    src: &[u8],
    bw: &mut BitWriter,
    workmem: &mut [u32],
    max_depth: u32,
    accept_len: u32,
) -> Result<(), Error> {
    let n = src.len();
    let last_match_pos = n - 3;

    let mut mem = Mem { mem: workmem, n };

    // Phase 1: build hash chains left-to-right.
    let bits = hash_bits_for(n);
    let table_len = 1usize << bits;

    for h in 0..table_len {
        mem.set_lookup(h, NO_MATCH_POS);
    }
    for i in 0..=last_match_pos {
        let h = hash3(&src[i..], bits) as usize;
        let head = mem.lookup(h);
        mem.set_prev(i, head);
        mem.set_lookup(h, i as u32);
    }

    // Initialize the last two positions as literals, and the cost-to-end
    // sentinel at the very end of the input.
    mem.set_mlen(n - 2, 1);
    mem.set_mlen(n - 1, 1);
    mem.set_cost(n - 2, 18);
    mem.set_cost(n - 1, 9);
    mem.set_cost(n, 0);

    // Phase 2: backwards DP, walking the hash chain at each position.
    let mut cur = last_match_pos;
    while cur > 0 {
        let mut pos = mem.prev(cur);

        mem.set_cost(cur, mem.cost(cur + 1) + 9);
        mem.set_mlen(cur, 1);

        let mut max_len = MIN_MATCH - 1;
        let len_limit = core::cmp::min(MAX_MATCH as usize, n - cur) as u32;
        let mut chain_left = max_depth;

        while pos != NO_MATCH_POS && chain_left > 0 {
            chain_left -= 1;

            if (cur as u64) - (pos as u64) > W_SIZE {
                break;
            }

            let pos_idx = pos as usize;
            let mut len = 0u32;

            if max_len < len_limit && src[pos_idx + max_len as usize] == src[cur + max_len as usize] {
                while len < len_limit && src[pos_idx + len as usize] == src[cur + len as usize] {
                    len += 1;
                }
            }

            if len > max_len {
                let mut min_cost = u32::MAX;
                let mut min_cost_len = MIN_MATCH - 1;

                for i in (max_len + 1)..=len {
                    let c = match_cost((cur - pos_idx - 1) as u32, i) + mem.cost(cur + i as usize);
                    if c < min_cost {
                        min_cost = c;
                        min_cost_len = i;
                    }
                }

                max_len = len;

                if min_cost < mem.cost(cur) {
                    mem.set_cost(cur, min_cost);
                    mem.set_mpos(cur, pos_idx as u32);
                    mem.set_mlen(cur, min_cost_len);

                    if pos_idx > 0 && src[pos_idx - 1] == src[cur - 1] && min_cost_len < MAX_MATCH {
                        let mut ext_len = min_cost_len;
                        let mut ext_cur = cur;
                        let mut ext_pos = pos_idx;
                        loop {
                            ext_cur -= 1;
                            ext_pos -= 1;
                            ext_len += 1;
                            let c = match_cost((ext_cur - ext_pos - 1) as u32, ext_len)
                                + mem.cost(ext_cur + ext_len as usize);
                            mem.set_cost(ext_cur, c);
                            mem.set_mpos(ext_cur, ext_pos as u32);
                            mem.set_mlen(ext_cur, ext_len);

                            if !(ext_pos > 0 && src[ext_pos - 1] == src[ext_cur - 1] && ext_len < MAX_MATCH) {
                                break;
                            }
                        }
                        cur = ext_cur;
                        break;
                    }
                }
            }

            if len >= accept_len || len == len_limit {
                break;
            }

            pos = mem.prev(pos_idx);
        }

        cur -= 1;
    }

    mem.set_mpos(0, 0);
    mem.set_mlen(0, 1);

    // Phase 3: emit, following the chosen path.
    let mut i = 0usize;
    while i < n {
        let mlen = mem.mlen(i);
        if mlen == 1 {
            emit_literal(bw, src[i])?;
        } else {
            let offs = (i as u32) - mem.mpos(i) - 1;
            emit_match(bw, offs, mlen)?;
        }
        i += mlen as usize;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::{pack_level, workmem_words};
    use crate::decompress::depack;

    #[test]
    fn chain_parser_round_trips_text() {
        let input = b"the quick brown fox jumps over the lazy dog".repeat(8);
        for level in [5u8, 6, 7] {
            let words = workmem_words(input.len(), level).unwrap();
            let mut workmem = vec![0u32; words];
            let mut dst = vec![0u8; format::max_packed_size(input.len())];
            let size = pack_level(&input, &mut dst, &mut workmem, level).unwrap();
            let mut out = vec![0u8; input.len()];
            assert_eq!(depack(&dst[..size], &mut out).unwrap(), input.len());
            assert_eq!(out, input);
        }
    }
}
