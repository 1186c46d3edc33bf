// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin module boundary.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DirError;
use crate::types::{PluginState, Token};

/// Process-wide resources a plugin may ask to be handed after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Handle to the service's async runtime.
    Runtime,
    /// The mutex shared by all plugins that serialize against each other.
    SharedMutex,
}

/// A concrete shared resource, delivered through [`DirectoryPlugin::process_request`].
#[derive(Debug, Clone)]
pub enum SharedResource {
    Runtime(tokio::runtime::Handle),
    SharedMutex(Arc<tokio::sync::Mutex<()>>),
}

impl SharedResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            SharedResource::Runtime(_) => ResourceKind::Runtime,
            SharedResource::SharedMutex(_) => ResourceKind::SharedMutex,
        }
    }
}

/// Requests the core sends through the generic request entry point.
#[derive(Debug, Clone)]
pub enum PluginRequest {
    ProvideResource(SharedResource),
}

/// Entry points exposed by every directory backend.
///
/// The core treats these as an opaque capability set and never holds a table
/// or registry lock while calling them.
#[async_trait]
pub trait DirectoryPlugin: Send + Sync + 'static {
    /// Returns the plugin's registered name.
    fn name(&self) -> &str;

    /// Checks that the plugin can run against this service. `signature` is the
    /// plugin's capability token, which it must present when registering nodes.
    async fn validate(&self, version: &str, signature: Token) -> Result<(), DirError>;

    /// Brings the plugin up. Called repeatedly by the launcher until it succeeds
    /// or the retry ceiling is reached.
    async fn initialize(&self) -> Result<(), DirError>;

    /// Notifies the plugin of an Active/Inactive transition.
    async fn set_plugin_state(&self, state: PluginState) -> Result<(), DirError>;

    /// Generic request entry point; used to hand over shared resources.
    async fn process_request(&self, request: PluginRequest) -> Result<(), DirError>;

    /// Shared resources this plugin wants after a successful initialization.
    fn required_resources(&self) -> Vec<ResourceKind> {
        Vec::new()
    }
}

/// Resolves a capability token to the live plugin instance that owns it,
/// loading the plugin on demand if necessary.
#[async_trait]
pub trait PluginResolver: Send + Sync {
    async fn resolve(&self, token: Token) -> Option<Arc<dyn DirectoryPlugin>>;
}
