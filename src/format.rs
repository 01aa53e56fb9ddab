//! Binary image format for trie indexes.
//!
//! One contiguous, little-endian byte image. The same bytes serve eager
//! loading and zero-copy mapping: every section is read in place.
//!
//! # Format Overview (v1)
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ HEADER (32 bytes)                                          │
//! │   magic: [u8; 4] = "ALTR"                                  │
//! │   version: u32 = 1                                         │
//! │   num_keys: u64                                            │
//! │   num_nodes: u64                                           │
//! │   image_len: u64 (whole file, footer included)             │
//! ├────────────────────────────────────────────────────────────┤
//! │ SECTION DIRECTORY (7 x 16 bytes)                           │
//! │   offset: u64, len: u64                                    │
//! │   order: louds, terminal, link, labels,                    │
//! │          tail_offsets, tail, weights                       │
//! ├────────────────────────────────────────────────────────────┤
//! │ SECTIONS (each starts 8-byte aligned, zero padded)         │
//! │   bit-vector: bit_len u64 | ones u64 | interleaved words   │
//! │   labels: u8 x num_nodes                                   │
//! │   tail_offsets: u64 x (linked nodes + 1)                   │
//! │   tail: concatenated multi-byte labels                     │
//! │   weights: f32 x num_keys                                  │
//! ├────────────────────────────────────────────────────────────┤
//! │ FOOTER (8 bytes)                                           │
//! │   crc32: u32 (over everything before the footer)           │
//! │   magic: [u8; 4] = "RTLA"                                  │
//! └────────────────────────────────────────────────────────────┘
//! ```

extern crate alloc;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use crate::bitvec::{words_for, BitVector, LeWords};
use crate::builder::TrieParts;

/// Magic bytes: "ALTR" (header)
pub const MAGIC: [u8; 4] = *b"ALTR";

/// Footer magic: "RTLA" (reversed, marks valid end)
pub const FOOTER_MAGIC: [u8; 4] = *b"RTLA";

/// Current format version
pub const VERSION: u32 = 1;

pub const HEADER_LEN: usize = 32;
pub const SECTION_COUNT: usize = 7;
pub const DIRECTORY_LEN: usize = SECTION_COUNT * 16;
pub const FOOTER_LEN: usize = 8;

/// Bytes before the interleaved words of a bit-vector section.
const BITS_PREFIX_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Louds = 0,
    Terminal = 1,
    Link = 2,
    Labels = 3,
    TailOffsets = 4,
    Tail = 5,
    Weights = 6,
}

/// Bit-vector section, validated.
#[derive(Clone, Debug)]
pub struct BitsMeta {
    pub len: usize,
    pub ones: usize,
    pub words: Range<usize>,
}

/// Validated section map of an image. Holds no borrowed data.
#[derive(Clone, Debug)]
pub struct Layout {
    pub num_keys: usize,
    pub num_nodes: usize,
    pub image_len: usize,
    pub louds: BitsMeta,
    pub terminal: BitsMeta,
    pub link: BitsMeta,
    pub labels: Range<usize>,
    pub tail_offsets: Range<usize>,
    pub tail: Range<usize>,
    pub weights: Range<usize>,
}

impl Layout {
    /// Zero-copy view of a bit-vector section.
    pub fn bits<'a>(&self, image: &'a [u8], meta: &BitsMeta) -> BitVector<LeWords<'a>> {
        view_bits(image, meta)
    }
}

fn view_bits<'a>(image: &'a [u8], meta: &BitsMeta) -> BitVector<LeWords<'a>> {
    let words = LeWords::from_validated(&image[meta.words.clone()]);
    BitVector::from_validated(words, meta.len, meta.ones)
}

// ============================================================================
// Encode
// ============================================================================

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn pad8(out: &mut Vec<u8>) {
    while out.len() % 8 != 0 {
        out.push(0);
    }
}

fn put_bits(out: &mut Vec<u8>, bits: &BitVector) {
    put_u64(out, bits.len() as u64);
    put_u64(out, bits.count_ones() as u64);
    for &w in bits.words() {
        put_u64(out, w);
    }
}

/// Append one section at the next aligned offset and record it.
fn section<F: FnOnce(&mut Vec<u8>)>(
    out: &mut Vec<u8>,
    directory: &mut [(usize, usize); SECTION_COUNT],
    which: Section,
    write: F,
) {
    pad8(out);
    let start = out.len();
    write(out);
    directory[which as usize] = (start, out.len() - start);
}

/// Serialize trie parts into a complete image.
pub fn encode(parts: &TrieParts) -> Vec<u8> {
    let mut out = Vec::new();
    out.resize(HEADER_LEN + DIRECTORY_LEN, 0);

    let mut directory = [(0usize, 0usize); SECTION_COUNT];
    let dir = &mut directory;

    section(&mut out, dir, Section::Louds, |o| put_bits(o, &parts.louds));
    section(&mut out, dir, Section::Terminal, |o| put_bits(o, &parts.terminal));
    section(&mut out, dir, Section::Link, |o| put_bits(o, &parts.link));
    section(&mut out, dir, Section::Labels, |o| o.extend_from_slice(&parts.labels));
    section(&mut out, dir, Section::TailOffsets, |o| {
        for &off in &parts.tail_offsets {
            put_u64(o, off);
        }
    });
    section(&mut out, dir, Section::Tail, |o| o.extend_from_slice(&parts.tail));
    section(&mut out, dir, Section::Weights, |o| {
        for &w in &parts.weights {
            o.extend_from_slice(&w.to_le_bytes());
        }
    });
    pad8(&mut out);

    let image_len = out.len() + FOOTER_LEN;

    let mut header = Vec::with_capacity(HEADER_LEN + DIRECTORY_LEN);
    header.extend_from_slice(&MAGIC);
    put_u32(&mut header, VERSION);
    put_u64(&mut header, parts.num_keys() as u64);
    put_u64(&mut header, parts.num_nodes() as u64);
    put_u64(&mut header, image_len as u64);
    for &(offset, len) in &directory {
        put_u64(&mut header, offset as u64);
        put_u64(&mut header, len as u64);
    }
    out[..header.len()].copy_from_slice(&header);

    let crc = crc32fast::hash(&out);
    put_u32(&mut out, crc);
    out.extend_from_slice(&FOOTER_MAGIC);
    out
}

// ============================================================================
// Decode
// ============================================================================

#[inline]
fn read_u32(data: &[u8], pos: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[pos..pos + 4]);
    u32::from_le_bytes(buf)
}

#[inline]
pub(crate) fn read_u64(data: &[u8], pos: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[pos..pos + 8]);
    u64::from_le_bytes(buf)
}

#[inline]
pub(crate) fn read_f32(data: &[u8], pos: usize) -> f32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[pos..pos + 4]);
    f32::from_le_bytes(buf)
}

fn to_usize(v: u64, what: &str) -> Result<usize, String> {
    usize::try_from(v).map_err(|_| format!("{} does not fit in memory: {}", what, v))
}

fn decode_bits(data: &[u8], range: Range<usize>, name: &str) -> Result<BitsMeta, String> {
    if range.len() < BITS_PREFIX_LEN {
        return Err(format!("{} section too small", name));
    }
    let len = to_usize(read_u64(data, range.start), name)?;
    let ones = to_usize(read_u64(data, range.start + 8), name)?;
    let words = range.start + BITS_PREFIX_LEN..range.end;

    if words.len() != words_for(len).saturating_mul(8) {
        return Err(format!(
            "{} section holds {} bytes of words, expected {} for {} bits",
            name,
            words.len(),
            words_for(len).saturating_mul(8),
            len
        ));
    }

    let view = LeWords::new(&data[words.clone()])
        .and_then(|w| BitVector::from_parts(w, len, ones));
    if view.is_none() {
        return Err(format!("{} section has inconsistent rank headers", name));
    }
    Ok(BitsMeta { len, ones, words })
}

/// Recompute the footer checksum after editing an image in place.
#[cfg(test)]
pub(crate) fn reseal(data: &mut [u8]) {
    let footer = data.len() - FOOTER_LEN;
    let crc = crc32fast::hash(&data[..footer]);
    data[footer..footer + 4].copy_from_slice(&crc.to_le_bytes());
}

/// One pass over the LOUDS bits and link labels.
///
/// Child `k` is the k-th one-bit; its parent is the number of zeros before
/// it, minus one. Requiring every child id to exceed its parent's id makes
/// the node graph a tree, so walks up and down it terminate.
fn check_topology(
    data: &[u8],
    louds: &BitsMeta,
    link: &BitsMeta,
    labels: &[u8],
    tail_offsets: &[u8],
    tail: &[u8],
) -> Result<(), String> {
    let louds = view_bits(data, louds);
    if !louds.get(0) || louds.get(1) {
        return Err(String::from("louds does not start with the super-root"));
    }

    let mut zeros = 1usize;
    let mut child = 1usize;
    let mut sibling = false;
    for pos in 2..louds.len() {
        if !louds.get(pos) {
            zeros += 1;
            sibling = false;
            continue;
        }
        // zeros - 1 is the parent of `child`.
        if child < zeros {
            return Err(format!("louds node {} is not below its parent", child));
        }
        if sibling && labels[child] <= labels[child - 1] {
            return Err(format!("sibling labels out of order at node {}", child));
        }
        child += 1;
        sibling = true;
    }

    let link = view_bits(data, link);
    let mut r = 0usize;
    for node in 0..link.len() {
        if !link.get(node) {
            continue;
        }
        let start = read_u64(tail_offsets, r * 8) as usize;
        let end = read_u64(tail_offsets, (r + 1) * 8) as usize;
        // Offsets were already checked monotonic and within the tail.
        if node == 0 || end - start < 2 || tail[start] != labels[node] {
            return Err(format!("linked label of node {} is malformed", node));
        }
        r += 1;
    }
    Ok(())
}

/// Validate `data` and return its section map.
///
/// With `verify_checksum` the CRC-32 footer is checked first. Structural
/// checks always run: magic, version, section bounds, bit-vector
/// consistency, tree shape, sibling order and tail offsets. Queries against a
/// returned layout stay in bounds and terminate.
pub fn decode(data: &[u8], verify_checksum: bool) -> Result<Layout, String> {
    if data.len() < HEADER_LEN + DIRECTORY_LEN + FOOTER_LEN {
        return Err(format!("image too small: {} bytes", data.len()));
    }
    if data[0..4] != MAGIC {
        return Err(String::from("invalid magic"));
    }
    let version = read_u32(data, 4);
    if version != VERSION {
        return Err(format!("unsupported format version {}", version));
    }

    let num_keys = to_usize(read_u64(data, 8), "num_keys")?;
    let num_nodes = to_usize(read_u64(data, 16), "num_nodes")?;
    let image_len = to_usize(read_u64(data, 24), "image_len")?;
    if image_len != data.len() {
        return Err(format!(
            "image truncated: {} bytes, header says {}",
            data.len(),
            image_len
        ));
    }

    let footer = data.len() - FOOTER_LEN;
    if data[footer + 4..] != FOOTER_MAGIC {
        return Err(String::from("missing footer magic"));
    }
    if verify_checksum {
        let stored = read_u32(data, footer);
        let actual = crc32fast::hash(&data[..footer]);
        if stored != actual {
            return Err(format!(
                "checksum mismatch: stored {:08x}, computed {:08x}",
                stored, actual
            ));
        }
    }

    let mut sections: [Range<usize>; SECTION_COUNT] = Default::default();
    for (i, slot) in sections.iter_mut().enumerate() {
        let at = HEADER_LEN + i * 16;
        let offset = to_usize(read_u64(data, at), "section offset")?;
        let len = to_usize(read_u64(data, at + 8), "section length")?;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= footer)
            .ok_or_else(|| format!("section {} out of bounds", i))?;
        if offset < HEADER_LEN + DIRECTORY_LEN || offset % 8 != 0 {
            return Err(format!("section {} misplaced at offset {}", i, offset));
        }
        *slot = offset..end;
    }

    let louds = decode_bits(data, sections[Section::Louds as usize].clone(), "louds")?;
    let terminal = decode_bits(data, sections[Section::Terminal as usize].clone(), "terminal")?;
    let link = decode_bits(data, sections[Section::Link as usize].clone(), "link")?;

    if num_nodes == 0 {
        return Err(String::from("image has no root node"));
    }
    let louds_len = num_nodes
        .checked_mul(2)
        .and_then(|n| n.checked_add(1))
        .ok_or_else(|| format!("node count {} overflows", num_nodes))?;
    if louds.len != louds_len || louds.ones != num_nodes {
        return Err(String::from("louds shape does not match node count"));
    }
    if terminal.len != num_nodes || terminal.ones != num_keys {
        return Err(String::from("terminal bits do not match key count"));
    }
    if link.len != num_nodes {
        return Err(String::from("link bits do not match node count"));
    }

    let labels = sections[Section::Labels as usize].clone();
    if labels.len() != num_nodes {
        return Err(String::from("label section does not match node count"));
    }

    let tail = sections[Section::Tail as usize].clone();
    let tail_offsets = sections[Section::TailOffsets as usize].clone();
    let offsets_len = link
        .ones
        .checked_add(1)
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| String::from("link count overflows"))?;
    if tail_offsets.len() != offsets_len {
        return Err(String::from("tail offset section does not match link count"));
    }
    let mut prev = 0u64;
    for i in 0..=link.ones {
        let off = read_u64(data, tail_offsets.start + i * 8);
        if (i == 0 && off != 0) || off < prev || off > tail.len() as u64 {
            return Err(format!("tail offset {} out of order", i));
        }
        prev = off;
    }
    if prev != tail.len() as u64 {
        return Err(String::from("tail offsets do not cover the tail"));
    }

    let weights = sections[Section::Weights as usize].clone();
    if num_keys.checked_mul(4) != Some(weights.len()) {
        return Err(String::from("weight table does not match key count"));
    }

    check_topology(
        data,
        &louds,
        &link,
        &data[labels.clone()],
        &data[tail_offsets.clone()],
        &data[tail.clone()],
    )?;

    Ok(Layout {
        num_keys,
        num_nodes,
        image_len,
        louds,
        terminal,
        link,
        labels,
        tail_offsets,
        tail,
        weights,
    })
}
