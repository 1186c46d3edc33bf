// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the dirsvc directory service.
//!
//! This crate provides the error type, the value types shared by the node
//! registry and the plugin lifecycle (node kinds, capability tokens, plugin
//! state bits, lookup match modes), and the traits that form the boundary
//! between the service and its backend plugins.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DirError;
pub use types::{
    Capability, ConfiguredState, LoadTier, MatchMode, NodeKind, PluginState, Token,
};

pub use traits::{
    DirectoryPlugin, NodeObserver, PluginConfigStore, PluginRequest, PluginResolver,
    ResourceKind, SharedResource,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_error_covers_every_status() {
        let _ = DirError::NullOrEmptyParameter;
        let _ = DirError::DuplicateNode {
            path: "/Local/Default".into(),
        };
        let _ = DirError::NodeNotRegistered {
            path: "/LDAPv3/ldap.example.com".into(),
        };
        let _ = DirError::UnknownNodeName {
            name: "/Search".into(),
        };
        let _ = DirError::BufferTooSmall {
            needed: 3,
            capacity: 1,
        };
        let _ = DirError::MemoryAllocationFailure;
        let _ = DirError::InvalidToken;
        let _ = DirError::PluginAlreadyLoaded {
            name: "LDAPv3".into(),
        };
        let _ = DirError::PluginNameNotFound {
            name: "NIS".into(),
        };
        let _ = DirError::Timeout {
            duration: std::time::Duration::from_secs(5),
        };
        let _ = DirError::Plugin {
            name: "Cache".into(),
            message: "init failed".into(),
        };
        let _ = DirError::Config("bad".into());
        let _ = DirError::Internal("bad".into());
    }

    #[test]
    fn all_boundary_traits_are_exported() {
        fn _assert_plugin<T: DirectoryPlugin>() {}
        fn _assert_observer<T: NodeObserver>() {}
        fn _assert_store<T: PluginConfigStore>() {}
        fn _assert_resolver<T: PluginResolver>() {}
    }
}
