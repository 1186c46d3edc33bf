// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the dirsvc directory service.

use thiserror::Error;

/// The status type returned by every registry, table and registration operation.
///
/// Missing nodes and duplicates are routine outcomes and are reported here,
/// never by panicking.
#[derive(Debug, Error)]
pub enum DirError {
    /// A required argument was missing or empty (e.g. an empty path segment list).
    #[error("null or empty parameter")]
    NullOrEmptyParameter,

    /// A singleton slot is already occupied or the path is already registered.
    #[error("node already registered: {path}")]
    DuplicateNode { path: String },

    /// No registered node has this path.
    #[error("node not registered: {path}")]
    NodeNotRegistered { path: String },

    /// The requested node (or the backend serving a selector) is unavailable.
    #[error("unknown node name: {name}")]
    UnknownNodeName { name: String },

    /// The result sink cannot hold the complete match set. Retry with more capacity.
    #[error("result buffer too small: {needed} entries needed, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// An allocation for a single operation failed; the operation was rolled back.
    #[error("memory allocation failure")]
    MemoryAllocationFailure,

    /// The presented capability token does not belong to any known plugin.
    #[error("invalid plugin token")]
    InvalidToken,

    /// A plugin with the same name is already present in the table.
    #[error("plugin already loaded: {name}")]
    PluginAlreadyLoaded { name: String },

    /// No plugin with the given name is present in the table.
    #[error("plugin not found: {name}")]
    PluginNameNotFound { name: String },

    /// A blocking lookup passed its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A plugin entry point reported failure.
    #[error("plugin {name} failed: {message}")]
    Plugin { name: String, message: String },

    /// Configuration errors (invalid descriptor, bad config value).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DirError {
    /// Shorthand for a plugin entry-point failure.
    pub fn plugin(name: impl Into<String>, message: impl Into<String>) -> Self {
        DirError::Plugin {
            name: name.into(),
            message: message.into(),
        }
    }
}
