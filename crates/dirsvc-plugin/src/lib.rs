// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin table, lifecycle management and the node registration API.
//!
//! Every known backend has a [`PluginRecord`](table::PluginRecord) in the
//! [`PluginTable`]. The [`LifecycleManager`] constructs plugins at boot or on
//! first demand and drives them through the [`InitializationLauncher`]'s
//! bounded retry loop. Plugins register their nodes through the
//! [`NodeRegistrar`], presenting the capability token they were handed at
//! validation time.

pub mod catalog;
pub mod config_store;
pub mod factory;
pub mod launcher;
pub mod lifecycle;
pub mod manifest;
pub mod policy;
pub mod registrar;
pub mod service;
pub mod table;

pub use catalog::{builtin_catalog, NodeOnlyFactory, NodeOnlyPlugin};
pub use config_store::MemoryConfigStore;
pub use factory::{DeclarativeLoader, ModuleLoader, PluginFactory};
pub use launcher::{InitializationLauncher, LaunchSettings, LaunchState, SharedResources};
pub use lifecycle::{LifecycleManager, PluginKey};
pub use manifest::{parse_plugin_manifest, NodeDeclaration, PluginManifest};
pub use policy::ServicePolicy;
pub use registrar::{join_path, split_path, NodeRegistrar};
pub use service::{await_launches, DirectoryService, DirectoryServiceBuilder};
pub use table::{PluginRecord, PluginSnapshot, PluginTable, RecordId};
