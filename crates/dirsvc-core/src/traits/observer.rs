// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node change notifications.

/// Receives node-added and node-removed events keyed by path.
///
/// Called after the registry lock has been released, so an observer may query
/// the registry. Delivery semantics beyond that are the observer's concern.
pub trait NodeObserver: Send + Sync {
    fn node_added(&self, path: &str);

    fn node_removed(&self, path: &str);
}
