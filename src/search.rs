//! Trie Search Implementation
//!
//! **Architecture**:
//! - LOUDS bit-vector: node navigation by rank/select, no child pointers
//! - Terminal bit-vector: key id = rank1(terminal, node)
//! - Link bit-vector + tail: multi-byte edge labels (path compression)
//!
//! **Navigation** (node ids are BFS positions, root = 0):
//! - children(v) = `[select0(v) - v, select0(v + 1) - v - 1)`
//! - parent(v)   = `rank0(select1(v)) - 1`
//!
//! Exact lookup is O(query length), independent of the number of keys.
//! Multi-result searches advance a [`SearchAgent`] one match per call.

extern crate alloc;
use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::ops::Range;

use crate::agent::{AgentState, Cursor, Frame, QueryKind, SearchAgent};
use crate::bitvec::{BitVector, LeWords};
use crate::error::{Error, Result};
use crate::format::{read_f32, read_u64, Layout};
use crate::key::Key;
use crate::trie::TrieIndex;

/// Borrowed, zero-copy view over a validated image.
pub(crate) struct TrieView<'a> {
    louds: BitVector<LeWords<'a>>,
    terminal: BitVector<LeWords<'a>>,
    link: BitVector<LeWords<'a>>,
    labels: &'a [u8],
    tail_offsets: &'a [u8],
    tail: &'a [u8],
    weights: &'a [u8],
}

impl<'a> TrieView<'a> {
    pub fn new(image: &'a [u8], layout: &Layout) -> Self {
        Self {
            louds: layout.bits(image, &layout.louds),
            terminal: layout.bits(image, &layout.terminal),
            link: layout.bits(image, &layout.link),
            labels: &image[layout.labels.clone()],
            tail_offsets: &image[layout.tail_offsets.clone()],
            tail: &image[layout.tail.clone()],
            weights: &image[layout.weights.clone()],
        }
    }

    #[inline]
    pub fn num_keys(&self) -> usize {
        self.terminal.count_ones()
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Child node ids of `node`. Siblings are contiguous in BFS order.
    #[inline]
    fn children(&self, node: usize) -> Range<usize> {
        // Node v's unary block sits between its v-th and (v+1)-th zero.
        // Every bit before `start` that is not one of those v + 1 zeros is a
        // child edge, so the first child id is `start - (v + 1)`.
        let start = self.louds.select0(node) + 1;
        let end = self.louds.select0(node + 1);
        let first = start - node - 1;
        first..first + (end - start)
    }

    #[inline]
    fn parent(&self, node: usize) -> usize {
        self.louds.rank0(self.louds.select1(node)) - 1
    }

    /// Child of `node` whose label starts with `byte`.
    #[inline]
    fn find_child(&self, node: usize, byte: u8) -> Option<usize> {
        let range = self.children(node);
        self.labels[range.clone()]
            .binary_search(&byte)
            .ok()
            .map(|i| range.start + i)
    }

    /// Full label of the edge into `node`.
    #[inline]
    fn label(&self, node: usize) -> &'a [u8] {
        if self.link.get(node) {
            let r = self.link.rank1(node);
            let start = read_u64(self.tail_offsets, r * 8) as usize;
            let end = read_u64(self.tail_offsets, (r + 1) * 8) as usize;
            &self.tail[start..end]
        } else {
            &self.labels[node..node + 1]
        }
    }

    #[inline]
    fn is_terminal(&self, node: usize) -> bool {
        self.terminal.get(node)
    }

    #[inline]
    pub fn weight(&self, id: usize) -> f32 {
        read_f32(self.weights, id * 4)
    }

    #[inline]
    fn set_match(&self, key: &mut Key, node: usize) {
        let id = self.terminal.rank1(node);
        key.id = Some(id);
        key.weight = self.weight(id);
    }

    /// Terminal node spelling exactly `query`.
    pub fn find(&self, query: &[u8]) -> Option<usize> {
        let mut node = 0;
        let mut pos = 0;
        while pos < query.len() {
            let child = self.find_child(node, query[pos])?;
            let label = self.label(child);
            if !query[pos..].starts_with(label) {
                return None;
            }
            pos += label.len();
            node = child;
        }
        self.is_terminal(node).then_some(node)
    }

    /// Key id of `query`, if indexed.
    #[inline]
    pub fn key_id(&self, query: &[u8]) -> Option<usize> {
        self.find(query).map(|node| self.terminal.rank1(node))
    }

    /// Walk down until `query` is used up, possibly ending inside an edge.
    /// `out` receives the bytes of every edge taken.
    fn descend(&self, query: &[u8], out: &mut Vec<u8>) -> Option<usize> {
        let mut node = 0;
        let mut pos = 0;
        while pos < query.len() {
            let child = self.find_child(node, query[pos])?;
            let label = self.label(child);
            let rest = &query[pos..];
            if rest.len() >= label.len() {
                if !rest.starts_with(label) {
                    return None;
                }
                pos += label.len();
            } else {
                if !label.starts_with(rest) {
                    return None;
                }
                pos = query.len();
            }
            out.extend_from_slice(label);
            node = child;
        }
        Some(node)
    }

    /// Rebuild the bytes of key `id` into `out`. Caller checks the range.
    pub fn restore(&self, id: usize, out: &mut Vec<u8>) {
        out.clear();
        let mut node = self.terminal.select1(id);
        while node != 0 {
            out.extend(self.label(node).iter().rev());
            node = self.parent(node);
        }
        out.reverse();
    }

    // ------------------------------------------------------------------------
    // Searches
    // ------------------------------------------------------------------------

    pub fn lookup(&self, agent: &mut SearchAgent) -> bool {
        if agent.kind != QueryKind::Text || agent.state == AgentState::Idle {
            return false;
        }

        let found = self.find(&agent.query);
        match found {
            Some(node) => {
                // The query becomes the matched key; the old key buffer is
                // recycled as the next query buffer.
                core::mem::swap(&mut agent.key.text, &mut agent.query);
                self.set_match(&mut agent.key, node);
            }
            None => agent.key.clear(),
        }
        agent.finish_single();
        found.is_some()
    }

    pub fn reverse_lookup(&self, agent: &mut SearchAgent) -> Result<bool> {
        let QueryKind::Id(id) = agent.kind else {
            return Ok(false);
        };
        agent.finish_single();

        let num_keys = self.num_keys();
        if id >= num_keys {
            agent.key.clear();
            return Err(Error::InvalidId { id, num_keys });
        }

        self.restore(id, &mut agent.key.text);
        agent.key.id = Some(id);
        agent.key.weight = self.weight(id);
        Ok(true)
    }

    pub fn common_prefix_search(&self, agent: &mut SearchAgent) -> bool {
        if agent.kind != QueryKind::Text {
            reject_id_query(agent);
            return false;
        }

        let (mut node, mut pos) = match (agent.state, &agent.cursor) {
            (AgentState::Idle | AgentState::Exhausted, _) => return false,
            (AgentState::Enumerating, Cursor::CommonPrefix { node, pos }) => (*node, *pos),
            _ => {
                agent.cursor = Cursor::CommonPrefix { node: 0, pos: 0 };
                agent.state = AgentState::Enumerating;
                if self.is_terminal(0) {
                    agent.key.text.clear();
                    self.set_match(&mut agent.key, 0);
                    return true;
                }
                (0, 0)
            }
        };

        while pos < agent.query.len() {
            let Some(child) = self.find_child(node, agent.query[pos]) else {
                break;
            };
            let label = self.label(child);
            if !agent.query[pos..].starts_with(label) {
                break;
            }
            pos += label.len();
            node = child;

            if self.is_terminal(node) {
                agent.cursor = Cursor::CommonPrefix { node, pos };
                agent.key.text.clear();
                agent.key.text.extend_from_slice(&agent.query[..pos]);
                self.set_match(&mut agent.key, node);
                return true;
            }
        }

        agent.exhaust();
        false
    }

    pub fn predictive_search(&self, agent: &mut SearchAgent) -> bool {
        if agent.kind != QueryKind::Text {
            reject_id_query(agent);
            return false;
        }

        match (agent.state, &agent.cursor) {
            (AgentState::Idle | AgentState::Exhausted, _) => return false,
            (AgentState::Enumerating, Cursor::Predictive { .. }) => {}
            _ => {
                let mut stack = agent.take_stack();
                agent.key.text.clear();
                let Some(node) = self.descend(&agent.query, &mut agent.key.text) else {
                    agent.cursor = Cursor::Predictive { stack };
                    agent.exhaust();
                    return false;
                };

                let children = self.children(node);
                stack.push(Frame {
                    next: children.start,
                    end: children.end,
                    key_len: agent.key.text.len(),
                });
                agent.cursor = Cursor::Predictive { stack };
                agent.state = AgentState::Enumerating;

                if self.is_terminal(node) {
                    self.set_match(&mut agent.key, node);
                    return true;
                }
            }
        }

        let SearchAgent { cursor, key, .. } = &mut *agent;
        let Cursor::Predictive { stack } = cursor else {
            return false;
        };

        // Depth-first, children in label order: keys come out sorted.
        while let Some(top) = stack.last_mut() {
            if top.next == top.end {
                stack.pop();
                continue;
            }
            let child = top.next;
            top.next += 1;
            key.text.truncate(top.key_len);
            key.text.extend_from_slice(self.label(child));

            let children = self.children(child);
            stack.push(Frame {
                next: children.start,
                end: children.end,
                key_len: key.text.len(),
            });

            if self.is_terminal(child) {
                self.set_match(key, child);
                return true;
            }
        }

        agent.exhaust();
        false
    }
}

/// Multi-result searches have nothing to enumerate for a staged identifier.
fn reject_id_query(agent: &mut SearchAgent) {
    if agent.state != AgentState::Idle {
        agent.exhaust();
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Keys that are prefixes of a query, shortest first.
///
/// **Lazy** - drives a private [`SearchAgent`]; nothing is collected up front.
pub struct CommonPrefixIter<'a> {
    index: &'a TrieIndex,
    agent: SearchAgent,
}

impl<'a> CommonPrefixIter<'a> {
    pub(crate) fn new(index: &'a TrieIndex, query: &[u8]) -> Self {
        let mut agent = SearchAgent::new();
        agent.set_query(query);
        Self { index, agent }
    }
}

impl Iterator for CommonPrefixIter<'_> {
    type Item = Key;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.index
            .common_prefix_search(&mut self.agent)
            .then(|| self.agent.key().clone())
    }
}

impl FusedIterator for CommonPrefixIter<'_> {}

/// Keys that start with a query, in ascending byte order.
///
/// **Lazy** - each `next` resumes the depth-first walk where it stopped.
pub struct PredictiveIter<'a> {
    index: &'a TrieIndex,
    agent: SearchAgent,
}

impl<'a> PredictiveIter<'a> {
    pub(crate) fn new(index: &'a TrieIndex, query: &[u8]) -> Self {
        let mut agent = SearchAgent::new();
        agent.set_query(query);
        Self { index, agent }
    }
}

impl Iterator for PredictiveIter<'_> {
    type Item = Key;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.index
            .predictive_search(&mut self.agent)
            .then(|| self.agent.key().clone())
    }
}

impl FusedIterator for PredictiveIter<'_> {}
