// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-retry plugin initialization.
//!
//! The launcher calls `initialize` until it succeeds or the attempt ceiling is
//! reached, sleeping a constant delay between attempts. Success commits
//! `INITIALIZED`, hands over the shared resources the plugin asked for and
//! applies the persisted Active/Inactive state. Exhausting the ceiling commits
//! `INACTIVE | FAILED_TO_INIT`, which is never retried automatically.

use std::sync::Arc;
use std::time::Duration;

use dirsvc_config::model::LauncherConfig;
use dirsvc_core::{
    DirectoryPlugin, PluginConfigStore, PluginRequest, PluginState, ResourceKind, SharedResource,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::table::PluginTable;

/// Retry ceiling and constant backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchSettings {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl From<&LauncherConfig> for LaunchSettings {
    fn from(config: &LauncherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }
}

/// Launcher state. `Succeeded` and `GaveUp` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Trying { attempt: u32 },
    Succeeded { attempts: u32 },
    GaveUp { attempts: u32 },
}

impl LaunchState {
    pub fn succeeded(self) -> bool {
        matches!(self, LaunchState::Succeeded { .. })
    }
}

/// Process-wide resources handed to plugins that declare a need for them.
#[derive(Debug, Clone)]
pub struct SharedResources {
    runtime: Option<tokio::runtime::Handle>,
    mutex: Arc<tokio::sync::Mutex<()>>,
}

impl SharedResources {
    /// Capture the current runtime, if called from inside one.
    pub fn current() -> Self {
        Self {
            runtime: tokio::runtime::Handle::try_current().ok(),
            mutex: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn get(&self, kind: ResourceKind) -> Option<SharedResource> {
        match kind {
            ResourceKind::Runtime => self.runtime.clone().map(SharedResource::Runtime),
            ResourceKind::SharedMutex => Some(SharedResource::SharedMutex(Arc::clone(&self.mutex))),
        }
    }
}

impl Default for SharedResources {
    fn default() -> Self {
        Self::current()
    }
}

/// Drives one plugin at a time through `initialize` with bounded retries.
pub struct InitializationLauncher {
    table: Arc<PluginTable>,
    config: Arc<dyn PluginConfigStore>,
    resources: SharedResources,
    settings: LaunchSettings,
}

impl InitializationLauncher {
    pub fn new(
        table: Arc<PluginTable>,
        config: Arc<dyn PluginConfigStore>,
        resources: SharedResources,
        settings: LaunchSettings,
    ) -> Self {
        Self {
            table,
            config,
            resources,
            settings,
        }
    }

    pub fn settings(&self) -> LaunchSettings {
        self.settings
    }

    /// Run the retry loop on its own task.
    pub fn spawn(self: &Arc<Self>, name: String, plugin: Arc<dyn DirectoryPlugin>) -> JoinHandle<LaunchState> {
        let launcher = Arc::clone(self);
        tokio::spawn(async move { launcher.run(&name, plugin).await })
    }

    /// Run the retry loop to completion on the calling task.
    pub async fn run(&self, name: &str, plugin: Arc<dyn DirectoryPlugin>) -> LaunchState {
        let mut state = LaunchState::Trying { attempt: 0 };
        loop {
            state = match state {
                LaunchState::Trying { attempt } => {
                    let attempt = attempt + 1;
                    match plugin.initialize().await {
                        Ok(()) => {
                            self.on_success(name, plugin.as_ref(), attempt).await;
                            LaunchState::Succeeded { attempts: attempt }
                        }
                        Err(e) if attempt < self.settings.max_attempts => {
                            debug!(plugin = %name, attempt, error = %e, "initialize failed, retrying");
                            tokio::time::sleep(self.settings.retry_delay).await;
                            LaunchState::Trying { attempt }
                        }
                        Err(e) => {
                            error!(
                                plugin = %name,
                                attempts = attempt,
                                error = %e,
                                "initialize failed, giving up"
                            );
                            if let Err(e) = self.table.commit_state(name, PluginState::gave_up()) {
                                warn!(plugin = %name, error = %e, "could not record failure");
                            }
                            LaunchState::GaveUp { attempts: attempt }
                        }
                    }
                }
                done => return done,
            };
        }
    }

    async fn on_success(&self, name: &str, plugin: &dyn DirectoryPlugin, attempts: u32) {
        if let Err(e) = self
            .table
            .update_state(name, |s| s.with_lifecycle(PluginState::INITIALIZED))
        {
            warn!(plugin = %name, error = %e, "initialized plugin missing from table");
            return;
        }

        for kind in plugin.required_resources() {
            let Some(resource) = self.resources.get(kind) else {
                warn!(plugin = %name, resource = ?kind, "requested resource unavailable");
                continue;
            };
            if let Err(e) = plugin
                .process_request(PluginRequest::ProvideResource(resource))
                .await
            {
                warn!(plugin = %name, resource = ?kind, error = %e, "resource hand-over failed");
            }
        }

        let configured = self.config.configured_state(name);
        let state = match self.table.update_state(name, |s| s.with_activity(configured)) {
            Ok(state) => state,
            Err(e) => {
                warn!(plugin = %name, error = %e, "could not apply configured state");
                return;
            }
        };
        if let Err(e) = plugin.set_plugin_state(state).await {
            warn!(plugin = %name, error = %e, "set_plugin_state failed");
        }
        info!(plugin = %name, attempts, state = %state, "plugin initialized");
    }
}
