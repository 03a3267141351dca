//! Optimal encoder: a forward dynamic-programming parse over matches found
//! by a binary search tree maintained per hash bucket, re-rooted at every
//! query position (§4.4).
//!
//! Levels 8 (`max_depth=16, accept_len=96`), 9 (`32, 224`) and 10
//! (`u32::MAX, u32::MAX`) all go through [`parse`].
//!
//! Unlike the chain parser, this array layout is *not* aliased: the
//! documented work-memory formula `5n + 3 + LOOKUP_SIZE` already accounts
//! for five fully separate arrays (`cost`, `mpos`, `mlen` each sized `n+1`,
//! plus the `2n`-word tree-node table and the lookup table), so there is no
//! overlap to exploit the way the chain parser's does.
//!
//! ## Two passes over the same `cost`/`mpos`/`mlen` arrays
//!
//! Phase 1 walks forward, filling `cost[j]`/`mlen[j]`/`mpos[j]` *by arrival
//! position* `j`: the cheapest way to reach byte offset `j` from the start.
//! Phase 3 (shared with the chain parser, in `compress::mod`) needs the
//! opposite indexing — *by start position* `i`, so it can emit token `i`
//! and then jump straight to `i + mlen[i]`.
//!
//! Phase 2 turns one into the other in place, by walking the chosen path
//! backward from `n` to `0` and relabelling each edge from its arrival
//! index to its start index. Because the rewrite target (`start`) is
//! strictly less than the position being read (`j`), and each position is
//! visited at most once as a `j`, the walk carries the about-to-be
//! overwritten values forward in two locals (`next_len`/`next_pos`)
//! instead of re-reading them after the fact.

use crate::compress::{emit_literal, emit_match};
use crate::format::{self, hash_bits_for, hash3, match_cost, MAX_MATCH, MIN_MATCH, NO_MATCH_POS, W_SIZE};
use crate::bitio::BitWriter;
use crate::Error;

pub(super) fn workmem_len(src_size: usize) -> usize {
    5 * src_size + 3 + format::LOOKUP_SIZE
}

#[derive(Clone, Copy)]
enum Side {
    Lt,
    Gt,
}

struct Mem<'a> {
    mem: &'a mut [u32],
    n: usize,
}

impl<'a> Mem<'a> {
    fn new(mem: &'a mut [u32], n: usize) -> Self {
        Self { mem, n }
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
    fn mpos(&self, i: usize) -> u32 {
        self.mem[(self.n + 1) + i]
    }
    #[inline]
    fn set_mpos(&mut self, i: usize, v: u32) {
        self.mem[(self.n + 1) + i] = v;
    }
    #[inline]
    fn mlen(&self, i: usize) -> u32 {
        self.mem[2 * (self.n + 1) + i]
    }
    #[inline]
    fn set_mlen(&mut self, i: usize, v: u32) {
        self.mem[2 * (self.n + 1) + i] = v;
    }
    #[inline]
    fn lt(&self, i: usize) -> u32 {
        self.mem[3 * (self.n + 1) + i]
    }
    #[inline]
    fn set_lt(&mut self, i: usize, v: u32) {
        self.mem[3 * (self.n + 1) + i] = v;
    }
    #[inline]
    fn gt(&self, i: usize) -> u32 {
        self.mem[3 * (self.n + 1) + self.n + i]
    }
    #[inline]
    fn set_gt(&mut self, i: usize, v: u32) {
        self.mem[3 * (self.n + 1) + self.n + i] = v;
    }
    #[inline]
    fn lookup(&self, h: usize) -> u32 {
        self.mem[3 * (self.n + 1) + 2 * self.n + h]
    }
    #[inline]
    fn set_lookup(&mut self, h: usize, v: u32) {
        self.mem[3 * (self.n + 1) + 2 * self.n + h] = v;
    }

    #[inline]
    fn write_side(&mut self, node: usize, side: Side, v: u32) {
        match side {
            Side::Lt => self.set_lt(node, v),
            Side::Gt => self.set_gt(node, v),
        }
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
    let mut mem = Mem::new(workmem, n);

    let bits = hash_bits_for(n);
    let table_len = 1usize << bits;
    for h in 0..table_len {
        mem.set_lookup(h, NO_MATCH_POS);
    }

    mem.set_cost(0, 0);
    for i in 1..=n {
        mem.set_cost(i, u32::MAX);
    }

    let last_hashable = n.saturating_sub(3);

    // Next position we are actually going to check matches at. Lets us
    // skip the cost-update enumeration (but keep building the tree) for
    // positions already covered by a previously accepted long match.
    let mut next_match_cur = 0usize;

    // Phase 1: forward DP. `cost`/`mlen`/`mpos` are indexed by arrival
    // position here; phase 2 relabels them by start position below.
    for cur in 0..n {
        let base_cost = mem.cost(cur);

        let lit_cost = base_cost.saturating_add(9);
        if lit_cost < mem.cost(cur + 1) {
            mem.set_cost(cur + 1, lit_cost);
            mem.set_mlen(cur + 1, 1);
        }

        if cur > next_match_cur {
            next_match_cur = cur;
        }

        if cur > last_hashable {
            continue;
        }

        let h = hash3(&src[cur..], bits) as usize;
        let len_left = core::cmp::min(MAX_MATCH as usize, n - cur) as u32;
        let len_limit = if cur == next_match_cur {
            len_left
        } else {
            core::cmp::min(accept_len, len_left)
        };

        let mut node = mem.lookup(h);
        let (mut ptr0_node, mut ptr0_side) = (cur, Side::Lt);
        let (mut ptr1_node, mut ptr1_side) = (cur, Side::Gt);
        let mut len0 = 0u32;
        let mut len1 = 0u32;
        let mut best_len = MIN_MATCH - 1;
        let mut depth = max_depth;

        loop {
            if node == NO_MATCH_POS || (cur as u64) - (node as u64) > W_SIZE || depth == 0 {
                mem.write_side(ptr0_node, ptr0_side, NO_MATCH_POS);
                mem.write_side(ptr1_node, ptr1_side, NO_MATCH_POS);
                break;
            }
            depth -= 1;

            let node_us = node as usize;
            let mut len = core::cmp::min(len0, len1);
            while len < len_limit && src[node_us + len as usize] == src[cur + len as usize] {
                len += 1;
            }

            // Only update the DP cost array, and only advance
            // `next_match_cur`, while actually checking matches at this
            // position (closest-first order means later, farther
            // candidates can only lengthen the longest length seen so
            // far, never shorten it).
            if cur == next_match_cur && len > best_len {
                for l in (best_len + 1)..=len {
                    let c = match_cost((cur - node_us - 1) as u32, l) + base_cost;
                    if c < mem.cost(cur + l as usize) {
                        mem.set_cost(cur + l as usize, c);
                        mem.set_mlen(cur + l as usize, l);
                        mem.set_mpos(cur + l as usize, (cur - node_us - 1) as u32);
                    }
                }

                best_len = len;

                if len >= accept_len {
                    next_match_cur = cur + len as usize;
                }
            }

            if len >= accept_len || len == len_limit {
                // A full-length (or accepted) match can't be usefully
                // distinguished further: graft this node's own subtrees
                // directly onto the pending slots.
                mem.write_side(ptr0_node, ptr0_side, mem.gt(node_us));
                mem.write_side(ptr1_node, ptr1_side, mem.lt(node_us));
                break;
            }

            if src[node_us + len as usize] < src[cur + len as usize] {
                mem.write_side(ptr0_node, ptr0_side, node);
                ptr0_node = node_us;
                ptr0_side = Side::Gt;
                len0 = len;
                node = mem.gt(node_us);
            } else {
                mem.write_side(ptr1_node, ptr1_side, node);
                ptr1_node = node_us;
                ptr1_side = Side::Lt;
                len1 = len;
                node = mem.lt(node_us);
            }
        }

        mem.set_lookup(h, cur as u32);
    }

    // Phase 2: relabel the chosen path from arrival-indexed to
    // start-indexed, walking backward from `n`.
    let mut j = n;
    let mut next_len = mem.mlen(j);
    let mut next_pos = mem.mpos(j);
    while j > 0 {
        let len = next_len;
        let pos = next_pos;
        let start = j - len as usize;

        next_len = mem.mlen(start);
        next_pos = mem.mpos(start);

        mem.set_mlen(start, len);
        mem.set_mpos(start, pos);

        j = start;
    }

    // Phase 3: emit, following the chosen path (shared with the chain
    // parser).
    let mut i = 0usize;
    while i < n {
        let mlen = mem.mlen(i);
        if mlen == 1 {
            emit_literal(bw, src[i])?;
        } else {
            emit_match(bw, mem.mpos(i), mlen)?;
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
    fn tree_parser_round_trips_text() {
        let input = b"the quick brown fox jumps over the lazy dog".repeat(8);
        for level in [8u8, 9, 10] {
            let words = workmem_words(input.len(), level).unwrap();
            let mut workmem = vec![0u32; words];
            let mut dst = vec![0u8; format::max_packed_size(input.len())];
            let size = pack_level(&input, &mut dst, &mut workmem, level).unwrap();
            let mut out = vec![0u8; input.len()];
            assert_eq!(depack(&dst[..size], &mut out).unwrap(), input.len());
            assert_eq!(out, input);
        }
    }

    #[test]
    fn tree_parser_finds_a_match_across_a_long_gap() {
        let mut input = vec![0u8; 5000];
        input[..8].copy_from_slice(b"needle!!");
        input[4990..4998].copy_from_slice(b"needle!!");
        let words = workmem_words(input.len(), 10).unwrap();
        let mut workmem = vec![0u32; words];
        let mut dst = vec![0u8; format::max_packed_size(input.len())];
        let size = pack_level(&input, &mut dst, &mut workmem, 10).unwrap();
        let mut out = vec![0u8; input.len()];
        assert_eq!(depack(&dst[..size], &mut out).unwrap(), input.len());
        assert_eq!(out, input);
    }
}
