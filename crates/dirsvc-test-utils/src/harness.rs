// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end service tests.
//!
//! `TestHarness` assembles a complete `DirectoryService` with an in-memory
//! configuration store and a [`RecordingObserver`] attached to the registry.

use std::sync::Arc;
use std::time::Duration;

use dirsvc_core::{ConfiguredState, PluginConfigStore};
use dirsvc_plugin::{DirectoryService, LaunchSettings, MemoryConfigStore, ServicePolicy};
use dirsvc_registry::RegistryCapabilities;

use crate::observer::RecordingObserver;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    capabilities: RegistryCapabilities,
    settings: LaunchSettings,
    lookup_timeout: Option<Duration>,
    configured: Vec<(String, ConfiguredState)>,
    policy: ServicePolicy,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            capabilities: RegistryCapabilities::default(),
            settings: LaunchSettings {
                max_attempts: 100,
                retry_delay: Duration::from_millis(10),
            },
            lookup_timeout: Some(Duration::from_secs(5)),
            configured: Vec::new(),
            policy: ServicePolicy::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: RegistryCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_launch_settings(mut self, settings: LaunchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Persisted state for a plugin, applied before anything is registered.
    pub fn with_configured(mut self, plugin: &str, state: ConfiguredState) -> Self {
        self.configured.push((plugin.to_string(), state));
        self
    }

    pub fn with_policy(mut self, policy: ServicePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> TestHarness {
        let store = Arc::new(MemoryConfigStore::new());
        for (plugin, state) in &self.configured {
            store.set_configured_state(plugin, *state);
        }
        let service = DirectoryService::builder()
            .capabilities(self.capabilities)
            .launch_settings(self.settings)
            .lookup_timeout(self.lookup_timeout)
            .config_store(Arc::clone(&store) as Arc<dyn PluginConfigStore>)
            .policy(self.policy)
            .build();
        let observer = Arc::new(RecordingObserver::new());
        service.add_observer(Arc::clone(&observer) as _);

        TestHarness {
            service,
            observer,
            store,
        }
    }
}

/// A wired service plus handles tests assert against.
pub struct TestHarness {
    pub service: DirectoryService,
    pub observer: Arc<RecordingObserver>,
    pub store: Arc<MemoryConfigStore>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default harness: every capability enabled, 10ms retry delay.
    pub fn new() -> Self {
        Self::builder().build()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
