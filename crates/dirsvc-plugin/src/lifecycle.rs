// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin lifecycle manager.
//!
//! Constructs static plugins at boot, instantiates lazy plugins on first
//! demand and toggles Active/Inactive. Plugin code (construction, `validate`,
//! `initialize`, `set_plugin_state`) always runs with no table lock held: the
//! manager snapshots a record, releases the lock, does the slow work and
//! re-enters the table only to commit the result.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dirsvc_core::{
    ConfiguredState, DirError, DirectoryPlugin, LoadTier, PluginConfigStore, PluginResolver,
    PluginState, Token,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::factory::PluginFactory;
use crate::launcher::{InitializationLauncher, LaunchState};
use crate::manifest::{PluginManifest, SERVICE_VERSION};
use crate::policy::ServicePolicy;
use crate::registrar::NodeRegistrar;
use crate::table::{PluginRecord, PluginSnapshot, PluginTable};

/// Identifies a plugin by name or by capability token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKey<'a> {
    Name(&'a str),
    Token(Token),
}

impl<'a> From<&'a str> for PluginKey<'a> {
    fn from(name: &'a str) -> Self {
        PluginKey::Name(name)
    }
}

impl From<Token> for PluginKey<'_> {
    fn from(token: Token) -> Self {
        PluginKey::Token(token)
    }
}

/// Orchestrates construction, lazy loading and state changes of plugins.
pub struct LifecycleManager {
    table: Arc<PluginTable>,
    registrar: Arc<NodeRegistrar>,
    config: Arc<dyn PluginConfigStore>,
    launcher: Arc<InitializationLauncher>,
    policy: ServicePolicy,
    /// Names whose construction has been attempted. Guarded separately from
    /// the table so racing loaders never wait on each other.
    attempted: Mutex<HashSet<String>>,
}

impl LifecycleManager {
    pub fn new(
        table: Arc<PluginTable>,
        registrar: Arc<NodeRegistrar>,
        config: Arc<dyn PluginConfigStore>,
        launcher: Arc<InitializationLauncher>,
        policy: ServicePolicy,
    ) -> Self {
        Self {
            table,
            registrar,
            config,
            launcher,
            policy,
            attempted: Mutex::new(HashSet::new()),
        }
    }

    pub fn table(&self) -> &Arc<PluginTable> {
        &self.table
    }

    pub fn registrar(&self) -> &Arc<NodeRegistrar> {
        &self.registrar
    }

    pub fn config(&self) -> &Arc<dyn PluginConfigStore> {
        &self.config
    }

    /// Add a plugin record, reading its initial Active/Inactive state from
    /// the configuration store. Returns the plugin's capability token.
    pub fn register(
        &self,
        manifest: &PluginManifest,
        tier: LoadTier,
        factory: Option<Arc<dyn PluginFactory>>,
    ) -> Result<Token, DirError> {
        let configured = self.config.configured_state(&manifest.name);
        let record = PluginRecord::new(&manifest.name, &manifest.version, tier, factory)
            .lazy(manifest.lazy_load);
        let token = record.token();
        self.table.register(record, configured)?;
        Ok(token)
    }

    /// Construct and validate a static or eager plugin, commit its module
    /// handle and launch its initialization on a separate task.
    pub async fn start(&self, name: &str) -> Result<JoinHandle<LaunchState>, DirError> {
        let snapshot = self
            .table
            .get(name)
            .ok_or_else(|| DirError::PluginNameNotFound {
                name: name.to_string(),
            })?;
        if snapshot.is_loaded() || !self.claim(name) {
            return Err(DirError::PluginAlreadyLoaded {
                name: name.to_string(),
            });
        }

        let module = self
            .construct(&snapshot)
            .await
            .ok_or_else(|| DirError::plugin(name, "construction or validation failed"))?;
        let module = self.table.commit_module(name, module)?;
        Ok(self.launcher.spawn(name.to_string(), module))
    }

    /// Start every non-lazy static plugin that has not been constructed yet.
    ///
    /// Returns one launcher handle per started plugin. Failures to construct
    /// are logged and skipped.
    pub async fn start_static(&self) -> Vec<(String, JoinHandle<LaunchState>)> {
        let mut launches = Vec::new();
        for snapshot in self.table.snapshot() {
            if snapshot.tier != LoadTier::Static || snapshot.lazy || snapshot.is_loaded() {
                continue;
            }
            match self.start(&snapshot.name).await {
                Ok(handle) => launches.push((snapshot.name, handle)),
                Err(e) => warn!(plugin = %snapshot.name, error = %e, "static plugin not started"),
            }
        }
        info!(started = launches.len(), "static plugins launched");
        launches
    }

    /// Register a plugin found on disk.
    ///
    /// Lazy plugins get their declared nodes registered on their behalf and
    /// are constructed on first demand. Eager plugins are started right away
    /// and the launcher handle is returned.
    pub async fn discover(
        &self,
        manifest: &PluginManifest,
        factory: Arc<dyn PluginFactory>,
    ) -> Result<(Token, Option<JoinHandle<LaunchState>>), DirError> {
        manifest.check_compatible()?;
        let token = self.register(manifest, LoadTier::DiscoveredOnDisk, Some(factory))?;

        if !manifest.lazy_load {
            let handle = self.start(&manifest.name).await?;
            return Ok((token, Some(handle)));
        }

        for node in &manifest.nodes {
            if let Err(e) = self
                .registrar
                .register_proxy_node(token, node.segments(), node.kind)
            {
                warn!(plugin = %manifest.name, path = %node.path, error = %e, "proxy node not registered");
            }
        }
        debug!(plugin = %manifest.name, nodes = manifest.nodes.len(), "lazy plugin discovered");
        Ok((token, None))
    }

    /// Return the plugin's module, constructing and initializing it first if
    /// it has never been loaded.
    ///
    /// Only the first caller for a given plugin constructs it; concurrent
    /// callers get `None` rather than waiting. Plugins marked as failed are
    /// unavailable until [`reset_failed`](Self::reset_failed).
    pub async fn load_if_needed(&self, key: PluginKey<'_>) -> Option<Arc<dyn DirectoryPlugin>> {
        let snapshot = match key {
            PluginKey::Name(name) => self.table.get(name),
            PluginKey::Token(token) => self.table.get_by_token(token),
        }?;
        if snapshot.state.has_failed() {
            debug!(plugin = %snapshot.name, "plugin failed to initialize, not loading");
            return None;
        }
        if let Some(module) = snapshot.module {
            return Some(module);
        }
        if !self.claim(&snapshot.name) {
            debug!(plugin = %snapshot.name, "load already attempted by another caller");
            return None;
        }

        let name = snapshot.name.clone();
        info!(plugin = %name, "lazily loading plugin");
        let module = self.construct(&snapshot).await?;
        let outcome = self.launcher.run(&name, Arc::clone(&module)).await;
        let module = match self.table.commit_module(&name, module) {
            Ok(module) => module,
            Err(e) => {
                warn!(plugin = %name, error = %e, "could not commit module handle");
                return None;
            }
        };
        outcome.succeeded().then_some(module)
    }

    /// Persist and apply an Active/Inactive change.
    ///
    /// Activating a plugin that was never loaded loads it. Otherwise the state
    /// bit is flipped and an initialized plugin is notified.
    pub async fn set_state(
        &self,
        name: &str,
        desired: ConfiguredState,
    ) -> Result<PluginState, DirError> {
        let snapshot = self
            .table
            .get(name)
            .ok_or_else(|| DirError::PluginNameNotFound {
                name: name.to_string(),
            })?;
        self.config.set_configured_state(name, desired);
        let state = self.table.update_state(name, |s| s.with_activity(desired))?;

        match snapshot.module {
            None if desired == ConfiguredState::Active => {
                self.load_if_needed(PluginKey::Name(name)).await;
                return self.current_state(name);
            }
            Some(module) if state.is_initialized() => {
                if let Err(e) = module.set_plugin_state(state).await {
                    warn!(plugin = %name, error = %e, "set_plugin_state failed");
                }
            }
            _ => {}
        }
        info!(plugin = %name, state = %state, "plugin state changed");
        Ok(state)
    }

    /// Clear a `FAILED_TO_INIT` record so it can be loaded again.
    ///
    /// A plugin whose module was already constructed is relaunched at once;
    /// otherwise the next demand constructs it.
    pub fn reset_failed(&self, name: &str) -> Result<Option<JoinHandle<LaunchState>>, DirError> {
        let snapshot = self
            .table
            .get(name)
            .ok_or_else(|| DirError::PluginNameNotFound {
                name: name.to_string(),
            })?;
        if !snapshot.state.has_failed() {
            debug!(plugin = %name, state = %snapshot.state, "reset of healthy plugin ignored");
            return Ok(None);
        }

        let configured = self.config.configured_state(name);
        self.table.update_state(name, |s| {
            s.with_lifecycle(PluginState::UNINITIALIZED)
                .with_activity(configured)
        })?;
        self.attempted.lock().remove(name);
        info!(plugin = %name, "failed plugin reset");

        match snapshot.module {
            Some(module) if self.claim(name) => {
                Ok(Some(self.launcher.spawn(name.to_string(), module)))
            }
            _ => Ok(None),
        }
    }

    pub fn bump_data_stamp(&self, name: &str) -> Result<u64, DirError> {
        self.table.bump_data_stamp(name)
    }

    /// Whether `plugin` may serve `record_types` for `node`.
    pub fn is_ok_to_service_query(&self, plugin: &str, node: &str, record_types: &[&str]) -> bool {
        self.policy.is_ok_to_service_query(plugin, node, record_types)
    }

    fn claim(&self, name: &str) -> bool {
        self.attempted.lock().insert(name.to_string())
    }

    fn current_state(&self, name: &str) -> Result<PluginState, DirError> {
        self.table
            .get(name)
            .map(|snapshot| snapshot.state)
            .ok_or_else(|| DirError::PluginNameNotFound {
                name: name.to_string(),
            })
    }

    /// Build and validate a module. Failures are logged and recorded as
    /// `FAILED_TO_INIT`; the record keeps no module handle.
    async fn construct(&self, snapshot: &PluginSnapshot) -> Option<Arc<dyn DirectoryPlugin>> {
        let name = snapshot.name.as_str();
        let Some(factory) = &snapshot.factory else {
            error!(plugin = %name, "plugin has no module to construct");
            self.mark_failed(name);
            return None;
        };

        let module = match factory.create(Arc::clone(&self.registrar)) {
            Ok(module) => module,
            Err(e) => {
                error!(plugin = %name, error = %e, "plugin construction failed");
                self.mark_failed(name);
                return None;
            }
        };
        if let Err(e) = module.validate(SERVICE_VERSION, snapshot.token).await {
            error!(plugin = %name, error = %e, "plugin validation failed");
            self.mark_failed(name);
            return None;
        }
        debug!(plugin = %name, "plugin constructed and validated");
        Some(module)
    }

    fn mark_failed(&self, name: &str) {
        if let Err(e) = self.table.commit_state(name, PluginState::gave_up()) {
            warn!(plugin = %name, error = %e, "could not record failure");
        }
    }
}

#[async_trait]
impl PluginResolver for LifecycleManager {
    async fn resolve(&self, token: Token) -> Option<Arc<dyn DirectoryPlugin>> {
        self.load_if_needed(PluginKey::Token(token)).await
    }
}
