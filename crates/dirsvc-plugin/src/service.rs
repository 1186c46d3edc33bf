// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The assembled directory service.
//!
//! `DirectoryService` owns the single node registry and plugin table of the
//! process and wires them to the registrar, launcher and lifecycle manager.
//! It is built once at start-up and passed by reference to whoever needs it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dirsvc_config::DirsvcConfig;
use dirsvc_core::{
    DirError, DirectoryPlugin, LoadTier, MatchMode, NodeObserver, PluginConfigStore, Token,
};
use dirsvc_registry::{NodeRegistry, NodeResults, RegistryCapabilities};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::catalog::builtin_catalog;
use crate::config_store::MemoryConfigStore;
use crate::factory::{DeclarativeLoader, ModuleLoader, PluginFactory};
use crate::launcher::{InitializationLauncher, LaunchSettings, LaunchState, SharedResources};
use crate::lifecycle::LifecycleManager;
use crate::manifest::{parse_plugin_manifest, PluginManifest};
use crate::policy::ServicePolicy;
use crate::registrar::NodeRegistrar;
use crate::table::{PluginSnapshot, PluginTable};

/// Builder for [`DirectoryService`].
pub struct DirectoryServiceBuilder {
    capabilities: RegistryCapabilities,
    lookup_timeout: Option<Duration>,
    settings: LaunchSettings,
    config_store: Option<Arc<dyn PluginConfigStore>>,
    policy: ServicePolicy,
}

impl DirectoryServiceBuilder {
    fn new() -> Self {
        Self {
            capabilities: RegistryCapabilities::default(),
            lookup_timeout: None,
            settings: LaunchSettings::default(),
            config_store: None,
            policy: ServicePolicy::new(),
        }
    }

    pub fn capabilities(mut self, capabilities: RegistryCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Deadline for lookups blocked on an empty singleton slot.
    pub fn lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn launch_settings(mut self, settings: LaunchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn config_store(mut self, store: Arc<dyn PluginConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    pub fn policy(mut self, policy: ServicePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> DirectoryService {
        let registry = Arc::new(
            NodeRegistry::new(self.capabilities).with_lookup_timeout(self.lookup_timeout),
        );
        let table = Arc::new(PluginTable::new());
        let registrar = Arc::new(NodeRegistrar::new(Arc::clone(&table), Arc::clone(&registry)));
        let config = self
            .config_store
            .unwrap_or_else(|| Arc::new(MemoryConfigStore::new()));
        let launcher = Arc::new(InitializationLauncher::new(
            Arc::clone(&table),
            Arc::clone(&config),
            SharedResources::current(),
            self.settings,
        ));
        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::clone(&table),
            Arc::clone(&registrar),
            config,
            launcher,
            self.policy,
        ));

        DirectoryService {
            registry,
            table,
            registrar,
            lifecycle,
        }
    }
}

/// Node registry, plugin table and lifecycle manager of one process.
pub struct DirectoryService {
    registry: Arc<NodeRegistry>,
    table: Arc<PluginTable>,
    registrar: Arc<NodeRegistrar>,
    lifecycle: Arc<LifecycleManager>,
}

impl DirectoryService {
    pub fn builder() -> DirectoryServiceBuilder {
        DirectoryServiceBuilder::new()
    }

    /// Build a service from the loaded configuration.
    pub fn from_config(config: &DirsvcConfig) -> Self {
        let caps = &config.capabilities;
        Self::builder()
            .capabilities(RegistryCapabilities {
                search: caps.search,
                local: caps.local,
                cache: caps.cache,
                configure: caps.configure,
                bsd: caps.bsd,
            })
            .lookup_timeout(config.registry.lookup_timeout())
            .launch_settings(LaunchSettings::from(&config.launcher))
            .config_store(Arc::new(MemoryConfigStore::from_plugins(&config.plugins)))
            .policy(ServicePolicy::from_config(&config.policy))
            .build()
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn table(&self) -> &Arc<PluginTable> {
        &self.table
    }

    pub fn registrar(&self) -> &Arc<NodeRegistrar> {
        &self.registrar
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleManager> {
        &self.lifecycle
    }

    pub fn add_observer(&self, observer: Arc<dyn NodeObserver>) {
        self.registry.add_observer(observer);
    }

    /// Register a plugin that is constructed at boot.
    pub fn register_static(
        &self,
        manifest: &PluginManifest,
        factory: Arc<dyn PluginFactory>,
    ) -> Result<Token, DirError> {
        self.lifecycle
            .register(manifest, LoadTier::Static, Some(factory))
    }

    /// Register the built-in plugin for every enabled capability.
    pub fn register_builtins(&self) -> Result<usize, DirError> {
        let catalog = builtin_catalog(self.registry.capabilities());
        for manifest in &catalog {
            let factory = DeclarativeLoader.load(manifest)?;
            self.register_static(manifest, factory)?;
        }
        Ok(catalog.len())
    }

    /// Register a plugin found on disk. See [`LifecycleManager::discover`].
    pub async fn discover(
        &self,
        manifest: &PluginManifest,
        factory: Arc<dyn PluginFactory>,
    ) -> Result<(Token, Option<JoinHandle<LaunchState>>), DirError> {
        self.lifecycle.discover(manifest, factory).await
    }

    /// Discover every `*.toml` descriptor in `dir`.
    ///
    /// Unreadable or invalid descriptors are logged and skipped. Returns the
    /// launcher handles of eager plugins.
    pub async fn discover_dir(
        &self,
        dir: &Path,
        loader: &dyn ModuleLoader,
    ) -> Result<Vec<(String, JoinHandle<LaunchState>)>, DirError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            DirError::Config(format!("cannot read plugin directory {}: {e}", dir.display()))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut launches = Vec::new();
        for path in paths {
            let manifest = match std::fs::read_to_string(&path)
                .map_err(|e| DirError::Config(e.to_string()))
                .and_then(|content| parse_plugin_manifest(&content))
            {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping plugin descriptor");
                    continue;
                }
            };
            let discovered = match loader.load(&manifest) {
                Ok(factory) => self.discover(&manifest, factory).await,
                Err(e) => Err(e),
            };
            match discovered {
                Ok((_, Some(handle))) => launches.push((manifest.name, handle)),
                Ok((_, None)) => {}
                Err(e) => warn!(plugin = %manifest.name, error = %e, "plugin not discovered"),
            }
        }
        info!(dir = %dir.display(), eager = launches.len(), "plugin directory scanned");
        Ok(launches)
    }

    /// Construct static plugins and launch their initialization.
    pub async fn boot(&self) -> Vec<(String, JoinHandle<LaunchState>)> {
        self.lifecycle.start_static().await
    }

    pub async fn lookup(
        &self,
        pattern: &str,
        mode: MatchMode,
        sink: &mut NodeResults,
    ) -> Result<usize, DirError> {
        self.registry.lookup(pattern, mode, sink).await
    }

    pub async fn lookup_with_timeout(
        &self,
        pattern: &str,
        mode: MatchMode,
        sink: &mut NodeResults,
        timeout: Option<Duration>,
    ) -> Result<usize, DirError> {
        self.registry
            .lookup_with_timeout(pattern, mode, sink, timeout)
            .await
    }

    /// Resolve the plugin serving `path`, loading it on demand.
    pub async fn plugin_for(&self, path: &str) -> Result<Arc<dyn DirectoryPlugin>, DirError> {
        self.registry
            .plugin_for(path, self.lifecycle.as_ref())
            .await
    }

    pub fn plugins(&self) -> Vec<PluginSnapshot> {
        self.table.snapshot()
    }

    /// Drop every registered node.
    pub fn shutdown(&self) {
        self.registry.teardown();
    }
}

/// Wait for launcher tasks and report how many plugins came up.
pub async fn await_launches(launches: Vec<(String, JoinHandle<LaunchState>)>) -> usize {
    let mut succeeded = 0;
    for (name, handle) in launches {
        match handle.await {
            Ok(state) if state.succeeded() => succeeded += 1,
            Ok(state) => warn!(plugin = %name, outcome = ?state, "plugin did not initialize"),
            Err(e) => warn!(plugin = %name, error = %e, "launcher task failed"),
        }
    }
    succeeded
}
