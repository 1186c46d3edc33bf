// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-capacity result sink for node lookups.

use dirsvc_core::DirError;

use crate::node::NodeEntry;

/// Caller-supplied buffer receiving lookup results.
///
/// A lookup either writes its complete match set or leaves the sink untouched
/// and reports [`DirError::BufferTooSmall`]; partial results are never written.
#[derive(Debug, Clone)]
pub struct NodeResults {
    capacity: usize,
    entries: Vec<NodeEntry>,
}

impl NodeResults {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[NodeEntry] {
        &self.entries
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<NodeEntry> {
        self.entries
    }

    /// Replace the contents with `matches`, or fail without touching the sink.
    pub(crate) fn fill(&mut self, matches: Vec<NodeEntry>) -> Result<usize, DirError> {
        if matches.len() > self.capacity {
            return Err(DirError::BufferTooSmall {
                needed: matches.len(),
                capacity: self.capacity,
            });
        }
        self.entries = matches;
        Ok(self.entries.len())
    }
}
