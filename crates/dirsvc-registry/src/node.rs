// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registered directory nodes.

use std::sync::{Arc, Weak};

use dirsvc_core::{DirectoryPlugin, NodeKind, Token};

/// A node stored in the registry.
///
/// The back-reference to the serving plugin is weak: resolving it is a lookup,
/// and a node may be registered before its plugin has been instantiated.
pub struct DirectoryNode {
    path: String,
    kind: NodeKind,
    owner: Token,
    plugin: Option<Weak<dyn DirectoryPlugin>>,
}

impl DirectoryNode {
    pub fn new(
        path: String,
        kind: NodeKind,
        owner: Token,
        plugin: Option<&Arc<dyn DirectoryPlugin>>,
    ) -> Self {
        Self {
            path,
            kind,
            owner,
            plugin: plugin.map(Arc::downgrade),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn owner(&self) -> Token {
        self.owner
    }

    /// The serving plugin, if it has been attached and is still alive.
    pub fn plugin(&self) -> Option<Arc<dyn DirectoryPlugin>> {
        self.plugin.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn attach(&mut self, plugin: &Arc<dyn DirectoryPlugin>) {
        self.plugin = Some(Arc::downgrade(plugin));
    }

    /// Snapshot of the node for lookup results.
    pub fn entry(&self) -> NodeEntry {
        NodeEntry {
            path: self.path.clone(),
            kind: self.kind,
            owner: self.owner,
        }
    }
}

impl std::fmt::Debug for DirectoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryNode")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("owner", &self.owner)
            .field("plugin", &self.plugin().is_some())
            .finish()
    }
}

/// A lookup result: an owned copy of a node's identifying fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub path: String,
    pub kind: NodeKind,
    pub owner: Token,
}

/// Outcome of [`NodeRegistry::add_node`](crate::NodeRegistry::add_node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    /// A node with the same path already exists in the target collection.
    DuplicateRejected,
    /// The singleton slot for this kind is already populated.
    SingletonOccupied,
}
