//! Search agent: a reusable, per-query cursor.
//!
//! An agent carries the query, the progress of a multi-result search, and the
//! last match. Searching never allocates a result list; each call advances the
//! cursor by one match. Buffers are kept across queries, so one agent can serve
//! a whole session of lookups.
//!
//! ```text
//! Idle ──set_query──▶ QueryStaged ──search──▶ Enumerating ──search──▶ Exhausted
//!   ▲                                                                    │
//!   └───────────────────────────── clear() ◀─────────────────────────────┘
//! ```
//!
//! `lookup` and `reverse_lookup` consume the query and return the agent to
//! `Idle`, with the match left readable through [`SearchAgent::key`].
//! A common-prefix or predictive search on an agent holding an identifier
//! (or against an empty index) finds nothing and moves it to `Exhausted`.

extern crate alloc;
use alloc::vec::Vec;

use crate::key::Key;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    /// No active query.
    Idle,
    /// Query set, nothing consumed yet.
    QueryStaged,
    /// A multi-result search has produced at least one match.
    Enumerating,
    /// The search has no further matches.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum QueryKind {
    None,
    Text,
    Id(usize),
}

/// One level of the depth-first walk behind predictive search.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    /// Next child node to visit.
    pub next: usize,
    /// One past the last child node.
    pub end: usize,
    /// Length of the matched key at this node.
    pub key_len: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) enum Cursor {
    #[default]
    Fresh,
    CommonPrefix {
        node: usize,
        pos: usize,
    },
    Predictive {
        stack: Vec<Frame>,
    },
}

/// Per-query search state. See the [module docs](self).
///
/// Give each thread its own agent; the [`TrieIndex`](crate::TrieIndex) it
/// searches can be shared freely.
#[derive(Clone, Debug)]
pub struct SearchAgent {
    pub(crate) query: Vec<u8>,
    pub(crate) kind: QueryKind,
    pub(crate) state: AgentState,
    pub(crate) cursor: Cursor,
    pub(crate) key: Key,
}

impl SearchAgent {
    pub fn new() -> Self {
        Self {
            query: Vec::new(),
            kind: QueryKind::None,
            state: AgentState::Idle,
            cursor: Cursor::Fresh,
            key: Key::default(),
        }
    }

    /// Stage a string query for lookup, common-prefix or predictive search.
    pub fn set_query(&mut self, query: impl AsRef<[u8]>) {
        self.query.clear();
        self.query.extend_from_slice(query.as_ref());
        self.kind = QueryKind::Text;
        self.restart();
    }

    /// Stage an identifier for reverse lookup.
    pub fn set_reverse_query(&mut self, id: usize) {
        self.query.clear();
        self.kind = QueryKind::Id(id);
        self.restart();
    }

    /// The staged string query, if any.
    pub fn query(&self) -> Option<&[u8]> {
        match self.kind {
            QueryKind::Text => Some(&self.query),
            _ => None,
        }
    }

    /// The staged identifier, if any.
    pub fn query_id(&self) -> Option<usize> {
        match self.kind {
            QueryKind::Id(id) => Some(id),
            _ => None,
        }
    }

    /// The most recent match.
    #[inline]
    pub fn key(&self) -> &Key {
        &self.key
    }

    #[inline]
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Drop the query, the cursor and the match. Buffers are kept.
    pub fn clear(&mut self) {
        self.query.clear();
        self.kind = QueryKind::None;
        self.state = AgentState::Idle;
        self.reset_cursor();
        self.key.clear();
    }

    fn restart(&mut self) {
        self.state = AgentState::QueryStaged;
        self.reset_cursor();
    }

    /// Back to `Fresh`, keeping the predictive stack allocation.
    pub(crate) fn reset_cursor(&mut self) {
        match &mut self.cursor {
            Cursor::Predictive { stack } => stack.clear(),
            cursor => *cursor = Cursor::Fresh,
        }
    }

    /// Take the predictive stack (empty), reusing its allocation.
    pub(crate) fn take_stack(&mut self) -> Vec<Frame> {
        match core::mem::take(&mut self.cursor) {
            Cursor::Predictive { mut stack } => {
                stack.clear();
                stack
            }
            _ => Vec::new(),
        }
    }

    /// End a single-shot search: query consumed, agent idle.
    pub(crate) fn finish_single(&mut self) {
        self.query.clear();
        self.kind = QueryKind::None;
        self.state = AgentState::Idle;
        self.reset_cursor();
    }

    pub(crate) fn exhaust(&mut self) {
        self.state = AgentState::Exhausted;
    }
}

impl Default for SearchAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_is_idle() {
        let agent = SearchAgent::new();
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.query(), None);
        assert_eq!(agent.query_id(), None);
    }

    #[test]
    fn test_set_query_stages() {
        let mut agent = SearchAgent::new();
        agent.set_query("abc");
        assert_eq!(agent.state(), AgentState::QueryStaged);
        assert_eq!(agent.query(), Some(&b"abc"[..]));

        agent.set_reverse_query(7);
        assert_eq!(agent.state(), AgentState::QueryStaged);
        assert_eq!(agent.query(), None);
        assert_eq!(agent.query_id(), Some(7));
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut agent = SearchAgent::new();
        agent.set_query("abc");
        agent.exhaust();
        agent.key.set_text("abc");

        agent.clear();
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.query(), None);
        assert!(agent.key().is_empty());
    }

    #[test]
    fn test_reset_keeps_stack_allocation() {
        let mut agent = SearchAgent::new();
        let mut stack = agent.take_stack();
        stack.reserve(32);
        let capacity = stack.capacity();
        stack.push(Frame {
            next: 1,
            end: 2,
            key_len: 0,
        });
        agent.cursor = Cursor::Predictive { stack };

        agent.set_query("x");
        let stack = agent.take_stack();
        assert!(stack.is_empty());
        assert_eq!(stack.capacity(), capacity);
    }
}
