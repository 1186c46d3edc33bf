// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module construction boundary.

use std::sync::Arc;

use dirsvc_core::{DirError, DirectoryPlugin};

use crate::catalog::NodeOnlyFactory;
use crate::manifest::PluginManifest;
use crate::registrar::NodeRegistrar;

/// A constructible module reference.
///
/// The lifecycle manager calls `create` without holding any table lock, at
/// boot for static plugins and on first demand for lazy ones. The registrar is
/// how the new plugin will register its nodes once it has been validated.
pub trait PluginFactory: Send + Sync {
    fn create(&self, registrar: Arc<NodeRegistrar>) -> Result<Arc<dyn DirectoryPlugin>, DirError>;
}

/// Turns an on-disk descriptor into a factory.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, manifest: &PluginManifest) -> Result<Arc<dyn PluginFactory>, DirError>;
}

/// Loader for descriptor-only plugins whose sole job is to claim the nodes
/// listed in their descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarativeLoader;

impl ModuleLoader for DeclarativeLoader {
    fn load(&self, manifest: &PluginManifest) -> Result<Arc<dyn PluginFactory>, DirError> {
        if manifest.nodes.is_empty() {
            return Err(DirError::Config(format!(
                "plugin {}: a declarative plugin must list at least one node",
                manifest.name
            )));
        }
        Ok(Arc::new(NodeOnlyFactory::from_manifest(manifest)))
    }
}
