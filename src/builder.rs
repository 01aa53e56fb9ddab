//! Trie construction
//!
//! Turns a [`KeySet`] into the raw parts of a path-compressed LOUDS trie.
//!
//! 1. Sort records by bytes (stable), merge duplicates, summing weights.
//! 2. Walk the sorted keys breadth-first. Each node is a range of keys sharing
//!    a prefix; its children are the sub-ranges grouped by the next byte.
//! 3. A child edge carries the longest prefix its whole group shares, so
//!    single-child chains collapse into one multi-byte label.
//!
//! Node ids are BFS positions (root = 0). Key ids are the rank of a key's
//! terminal node among all terminal nodes, which makes them dense in `[0, N)`.

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::bitvec::BitVector;
use crate::error::{Error, Result};
use crate::key::KeySet;

/// Everything `format::encode` needs to lay out an image.
pub struct TrieParts {
    /// "10" + per node (BFS): one 1 per child, then a 0.
    pub louds: BitVector,
    /// Per node: is the end of a key.
    pub terminal: BitVector,
    /// Per node: label is longer than one byte (stored in `tail`).
    pub link: BitVector,
    /// Per node: first byte of the incoming edge label (0 for the root).
    pub labels: Vec<u8>,
    /// Per linked node, plus one: offsets into `tail`.
    pub tail_offsets: Vec<u64>,
    /// Full labels of linked nodes, concatenated.
    pub tail: Vec<u8>,
    /// Per key id: accumulated weight.
    pub weights: Vec<f32>,
    /// Per input record: the id it was assigned.
    pub record_ids: Vec<usize>,
}

impl TrieParts {
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn num_keys(&self) -> usize {
        self.weights.len()
    }
}

/// Distinct keys in byte order, with merged weights.
struct Distinct<'a> {
    keys: Vec<&'a [u8]>,
    weights: Vec<f32>,
    /// Input record index -> position in `keys`.
    record_slot: Vec<usize>,
}

fn dedup(keyset: &KeySet) -> Distinct<'_> {
    let mut order: Vec<usize> = (0..keyset.len()).collect();
    let records: Vec<_> = keyset.iter().collect();
    order.sort_by(|&a, &b| records[a].as_bytes().cmp(records[b].as_bytes()));

    let mut keys: Vec<&[u8]> = Vec::new();
    let mut weights: Vec<f32> = Vec::new();
    let mut record_slot = alloc::vec![0usize; keyset.len()];

    for &r in &order {
        let text = records[r].as_bytes();
        match keys.last() {
            Some(&last) if last == text => {
                if let Some(w) = weights.last_mut() {
                    *w += records[r].weight();
                }
            }
            _ => {
                keys.push(text);
                weights.push(records[r].weight());
            }
        }
        record_slot[r] = keys.len() - 1;
    }

    Distinct {
        keys,
        weights,
        record_slot,
    }
}

/// Length of the common prefix of `a` and `b`.
#[inline]
fn lcp(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Build trie parts from `keyset`.
pub fn build_parts(keyset: &KeySet) -> Result<TrieParts> {
    if keyset.is_empty() {
        return Err(Error::EmptyInput);
    }

    let distinct = dedup(keyset);
    let keys = &distinct.keys;

    let mut louds = BitVector::new();
    let mut terminal = BitVector::new();
    let mut link = BitVector::new();
    let mut labels: Vec<u8> = Vec::with_capacity(keys.len() * 2);
    let mut tail_offsets: Vec<u64> = alloc::vec![0];
    let mut tail: Vec<u8> = Vec::new();

    let mut slot_id = alloc::vec![0usize; keys.len()];
    let mut weights: Vec<f32> = Vec::with_capacity(keys.len());

    // Super-root prefix.
    louds.push(true);
    louds.push(false);

    // Root carries no label.
    labels.push(0);
    link.push(false);

    // (first key, end key, depth in bytes)
    let mut queue: VecDeque<(usize, usize, usize)> = VecDeque::new();
    queue.push_back((0, keys.len(), 0));

    while let Some((lo, hi, depth)) = queue.pop_front() {
        // Sorted, so a key ending here can only be the first of the range.
        let is_terminal = keys[lo].len() == depth;
        terminal.push(is_terminal);
        if is_terminal {
            slot_id[lo] = weights.len();
            weights.push(distinct.weights[lo]);
        }

        let mut i = lo + usize::from(is_terminal);
        while i < hi {
            let byte = keys[i][depth];
            let mut j = i + 1;
            while j < hi && keys[j][depth] == byte {
                j += 1;
            }

            let shared = lcp(&keys[i][depth..], &keys[j - 1][depth..]);
            let label = &keys[i][depth..depth + shared];

            louds.push(true);
            labels.push(byte);
            if label.len() > 1 {
                link.push(true);
                tail.extend_from_slice(label);
                tail_offsets.push(tail.len() as u64);
            } else {
                link.push(false);
            }

            queue.push_back((i, j, depth + shared));
            i = j;
        }
        louds.push(false);
    }

    louds.build_index();
    terminal.build_index();
    link.build_index();

    let record_ids = distinct
        .record_slot
        .iter()
        .map(|&slot| slot_id[slot])
        .collect();

    Ok(TrieParts {
        louds,
        terminal,
        link,
        labels,
        tail_offsets,
        tail,
        weights,
        record_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyset(keys: &[&str]) -> KeySet {
        keys.iter().collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(build_parts(&KeySet::new()), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_path_compression() {
        // root -> "a" -> "b" -> "c", "b"
        let parts = build_parts(&keyset(&["a", "ab", "abc", "b"])).unwrap();

        assert_eq!(parts.num_nodes(), 5);
        assert_eq!(parts.num_keys(), 4);
        assert_eq!(parts.tail.len(), 0);

        // Two keys sharing a long stem collapse into one linked edge.
        let parts = build_parts(&keyset(&["international", "internet"])).unwrap();
        assert_eq!(parts.num_nodes(), 4);
        assert_eq!(parts.link.count_ones(), 3);
        assert_eq!(&parts.tail[..6], b"intern");
    }

    #[test]
    fn test_louds_shape() {
        let parts = build_parts(&keyset(&["a", "ab", "abc", "b"])).unwrap();
        // 10 | 110 (root: a, b) | 10 (a: b) | 0 (b) | 10 (ab: c) | 0 (abc)
        let expected = [
            true, false, true, true, false, true, false, false, true, false, false,
        ];
        assert_eq!(parts.louds.len(), expected.len());
        for (i, &bit) in expected.iter().enumerate() {
            assert_eq!(parts.louds.get(i), bit, "bit {}", i);
        }
        assert_eq!(parts.louds.len(), 2 * parts.num_nodes() + 1);
    }

    #[test]
    fn test_ids_follow_level_order() {
        let parts = build_parts(&keyset(&["abc", "b", "ab", "a"])).unwrap();
        // Records: abc, b, ab, a -> BFS terminals: a(0) b(1) ab(2) abc(3)
        assert_eq!(parts.record_ids, vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_duplicate_weights_sum() {
        let mut ks = KeySet::new();
        ks.append("x", 1.0);
        ks.append("y", 0.5);
        ks.append("x", 2.0);

        let parts = build_parts(&ks).unwrap();
        assert_eq!(parts.num_keys(), 2);
        assert_eq!(parts.record_ids[0], parts.record_ids[2]);
        assert_eq!(parts.weights[parts.record_ids[0]], 3.0);
        assert_eq!(parts.weights[parts.record_ids[1]], 0.5);
    }

    #[test]
    fn test_empty_key_is_root() {
        let parts = build_parts(&keyset(&["", "a"])).unwrap();
        assert!(parts.terminal.get(0));
        assert_eq!(parts.record_ids, vec![0, 1]);
    }
}
