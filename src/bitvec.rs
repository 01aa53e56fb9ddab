//! Succinct BitVector (Rank / Select)
//!
//! **Interleaved Memory Layout**: [RankHeader(u64) | Body(8 x u64)]
//! Optimized for L1 Cache Locality. Single fetch rank execution.
//!
//! The layout is identical in memory and on disk. A saved bit-vector is
//! queried in place through [`LeWords`], so a memory-mapped image needs no
//! decoding pass before the first query.

extern crate alloc;
use alloc::vec::Vec;

/// 512 bits of body + 64 bits of header = 576 bits per block
/// Fits reasonably well in cache lines (9 * u64 = 72 bytes)
const BLOCK_BITS: usize = 512;
const WORDS_PER_BLOCK: usize = 8;
const BLOCK_STRIDE: usize = WORDS_PER_BLOCK + 1; // 1 Header + 8 Body

/// Word storage behind a [`BitVector`].
pub trait Words {
    /// Interleaved word at index `i`.
    fn word(&self, i: usize) -> u64;

    /// Total number of interleaved words (headers included).
    fn num_words(&self) -> usize;
}

impl Words for Vec<u64> {
    #[inline(always)]
    fn word(&self, i: usize) -> u64 {
        self[i]
    }

    #[inline]
    fn num_words(&self) -> usize {
        self.len()
    }
}

/// Little-endian `u64` words borrowed from a byte image.
///
/// No alignment requirement: words are assembled with `from_le_bytes`,
/// so the slice may start anywhere inside an mmapped file.
#[derive(Clone, Copy, Debug)]
pub struct LeWords<'a> {
    bytes: &'a [u8],
}

impl<'a> LeWords<'a> {
    /// Wrap `bytes`. Returns `None` unless the length is a multiple of 8.
    pub fn new(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() % 8 != 0 {
            return None;
        }
        Some(Self { bytes })
    }

    /// Wrap bytes already checked by `format::decode`.
    pub(crate) fn from_validated(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl Words for LeWords<'_> {
    #[inline(always)]
    fn word(&self, i: usize) -> u64 {
        let at = i * 8;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes[at..at + 8]);
        u64::from_le_bytes(buf)
    }

    #[inline]
    fn num_words(&self) -> usize {
        self.bytes.len() / 8
    }
}

/// Number of interleaved words needed to hold `len` bits.
pub fn words_for(len: usize) -> usize {
    let full = len / BLOCK_BITS;
    let rem = len % BLOCK_BITS;
    let tail = if rem == 0 { 0 } else { 1 + (rem + 63) / 64 };
    full * BLOCK_STRIDE + tail
}

#[derive(Clone)]
pub struct BitVector<W = Vec<u64>> {
    /// Interleaved data: [Rank0, Word0..7, Rank1, Word8..15, ...]
    data: W,
    len: usize,
    ones: usize,
}

impl BitVector {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            len: 0,
            ones: 0,
        }
    }

    /// Push a bit to the vector.
    /// Header placeholders are written during push, finalized by build_index().
    #[inline]
    pub fn push(&mut self, bit: bool) {
        let bit_idx = self.len % BLOCK_BITS;

        // New block start? Push header placeholder.
        if bit_idx == 0 {
            self.data.push(0);
        }

        let word_offset = bit_idx / 64;
        let bit_offset = bit_idx % 64;

        let block_base = (self.len / BLOCK_BITS) * BLOCK_STRIDE;
        let target_idx = block_base + 1 + word_offset;

        if target_idx >= self.data.len() {
            self.data.push(0);
        }

        if bit {
            self.data[target_idx] |= 1 << bit_offset;
        }

        self.len += 1;
    }

    /// Finalize the index. Must be called after all pushes.
    /// Calculates the Rank Headers in-place.
    pub fn build_index(&mut self) {
        let mut sum = 0usize;
        let num_blocks = (self.len + BLOCK_BITS - 1) / BLOCK_BITS;

        for b in 0..num_blocks {
            let base = b * BLOCK_STRIDE;
            self.data[base] = sum as u64;

            let words_in_block = (self.data.len() - base - 1).min(WORDS_PER_BLOCK);
            for w in 0..words_in_block {
                sum += self.data[base + 1 + w].count_ones() as usize;
            }
        }
        self.ones = sum;
    }

    /// Raw interleaved words, in the order they are persisted.
    pub fn words(&self) -> &[u64] {
        &self.data
    }
}

impl Default for BitVector {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Words> BitVector<W> {
    /// Reassemble a bit-vector from persisted parts.
    ///
    /// Checks that the word count matches `len` and that every rank header
    /// agrees with the popcount of the blocks before it, so later rank and
    /// select calls stay in bounds.
    pub fn from_parts(data: W, len: usize, ones: usize) -> Option<Self> {
        if data.num_words() != words_for(len) || ones > len {
            return None;
        }

        let mut sum = 0usize;
        let mut base = 0;
        while base < data.num_words() {
            if data.word(base) != sum as u64 {
                return None;
            }
            let words_in_block = (data.num_words() - base - 1).min(WORDS_PER_BLOCK);
            for w in 0..words_in_block {
                sum += data.word(base + 1 + w).count_ones() as usize;
            }
            base += BLOCK_STRIDE;
        }

        if sum != ones {
            return None;
        }
        Some(Self { data, len, ones })
    }

    /// Reassemble without re-checking; for sections `format::decode` accepted.
    #[inline]
    pub(crate) fn from_validated(data: W, len: usize, ones: usize) -> Self {
        Self { data, len, ones }
    }

    /// Access bit at index
    #[inline(always)]
    pub fn get(&self, i: usize) -> bool {
        let block = i / BLOCK_BITS;
        let offset = i % BLOCK_BITS;
        let idx = block * BLOCK_STRIDE + 1 + offset / 64;
        (self.data.word(idx) >> (offset % 64)) & 1 != 0
    }

    /// Rank1(i): Count 1s in [0..i)
    /// **Cache Optimized**: Fetches header and body from contiguous memory.
    #[inline(always)]
    pub fn rank1(&self, i: usize) -> usize {
        if i >= self.len {
            return self.ones;
        }

        let block = i / BLOCK_BITS;
        let offset = i % BLOCK_BITS;
        let base = block * BLOCK_STRIDE;

        // 1. Header Load (Base Rank)
        let mut r = self.data.word(base) as usize;

        // 2. Body Sum (Popcount)
        let word_idx = offset / 64;
        for w in 0..word_idx {
            r += self.data.word(base + 1 + w).count_ones() as usize;
        }

        // 3. Partial Word
        let bit_idx = offset % 64;
        if bit_idx > 0 {
            let mask = (1u64 << bit_idx) - 1;
            r += (self.data.word(base + 1 + word_idx) & mask).count_ones() as usize;
        }

        r
    }

    /// Rank0(i): Count 0s in [0..i)
    #[inline(always)]
    pub fn rank0(&self, i: usize) -> usize {
        i.min(self.len) - self.rank1(i)
    }

    /// Select1(k): Position of the k-th 1 (0-based). Requires `k < count_ones()`.
    ///
    /// Binary search over rank headers, then popcount scan inside one block.
    pub fn select1(&self, k: usize) -> usize {
        debug_assert!(k < self.ones);
        let block = self.find_block(|b| self.data.word(b * BLOCK_STRIDE) as usize, k);
        let base = block * BLOCK_STRIDE;
        let mut remaining = k - self.data.word(base) as usize;

        for w in 0..self.words_in_block(block) {
            let word = self.data.word(base + 1 + w);
            let c = word.count_ones() as usize;
            if remaining < c {
                return block * BLOCK_BITS + w * 64 + select_in_word(word, remaining);
            }
            remaining -= c;
        }
        self.len
    }

    /// Select0(k): Position of the k-th 0 (0-based). Requires `k < count_zeros()`.
    pub fn select0(&self, k: usize) -> usize {
        debug_assert!(k < self.len - self.ones);
        let zeros_before = |b: usize| b * BLOCK_BITS - self.data.word(b * BLOCK_STRIDE) as usize;
        let block = self.find_block(zeros_before, k);
        let base = block * BLOCK_STRIDE;
        let mut remaining = k - zeros_before(block);

        for w in 0..self.words_in_block(block) {
            // Padding past `len` reads as zero bits, but they only sit after
            // every real zero, so an in-range `k` never lands on them.
            let word = !self.data.word(base + 1 + w);
            let c = word.count_ones() as usize;
            if remaining < c {
                return block * BLOCK_BITS + w * 64 + select_in_word(word, remaining);
            }
            remaining -= c;
        }
        self.len
    }

    /// Last block whose cumulative count (per `before`) is `<= k`.
    #[inline]
    fn find_block(&self, before: impl Fn(usize) -> usize, k: usize) -> usize {
        let num_blocks = (self.len + BLOCK_BITS - 1) / BLOCK_BITS;
        let (mut lo, mut hi) = (0usize, num_blocks);
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            if before(mid) <= k {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    #[inline]
    fn words_in_block(&self, block: usize) -> usize {
        (self.data.num_words() - block * BLOCK_STRIDE - 1).min(WORDS_PER_BLOCK)
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Position of the r-th set bit inside a single word.
#[inline(always)]
fn select_in_word(mut word: u64, r: usize) -> usize {
    for _ in 0..r {
        word &= word - 1;
    }
    word.trailing_zeros() as usize
}
