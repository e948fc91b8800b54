//! Depth and cycle bookkeeping for graph walks
//!
//! Object graphs may be cyclic through references and arbitrarily deep
//! through direct nesting. Every recursive walk in this crate carries a
//! [`TraversalContext`] so it terminates on both.

use crate::error::{PdfError, Result};
use std::collections::HashSet;
use std::hash::Hash;

/// Maximum nesting depth for recursive graph walks.
pub const MAX_TRAVERSAL_DEPTH: usize = 1000;

#[derive(Debug)]
pub(crate) struct TraversalContext<K> {
    depth: usize,
    max_depth: usize,
    on_path: HashSet<K>,
}

impl<K: Eq + Hash + Copy> TraversalContext<K> {
    pub fn new() -> Self {
        Self::with_limit(MAX_TRAVERSAL_DEPTH)
    }

    pub fn with_limit(max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth,
            on_path: HashSet::new(),
        }
    }

    /// Enter one nesting level.
    pub fn enter(&mut self) -> Result<()> {
        if self.depth + 1 > self.max_depth {
            return Err(PdfError::InvalidStructure(format!(
                "Maximum nesting depth exceeded: {} (limit: {})",
                self.depth + 1,
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Mark `key` as being on the current path. Returns false if it already is.
    pub fn visit(&mut self, key: K) -> bool {
        self.on_path.insert(key)
    }

    /// Take `key` off the current path.
    pub fn leave(&mut self, key: K) {
        self.on_path.remove(&key);
    }

    pub fn is_on_path(&self, key: &K) -> bool {
        self.on_path.contains(key)
    }
}

impl<K: Eq + Hash + Copy> Default for TraversalContext<K> {
    fn default() -> Self {
        Self::new()
    }
}
