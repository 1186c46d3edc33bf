// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary traits between the directory service core and its collaborators.
//!
//! [`DirectoryPlugin`] is the module entry-point set every backend exposes.
//! The other traits describe external services the core consumes: the node
//! change observer, the persisted plugin configuration, and lazy resolution of
//! a token to a live plugin.

pub mod config_store;
pub mod observer;
pub mod plugin;

pub use config_store::PluginConfigStore;
pub use observer::NodeObserver;
pub use plugin::{DirectoryPlugin, PluginRequest, PluginResolver, ResourceKind, SharedResource};
