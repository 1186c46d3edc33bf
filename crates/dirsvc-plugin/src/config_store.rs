// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process plugin configuration store.

use std::collections::{BTreeMap, HashMap};

use dirsvc_core::{ConfiguredState, PluginConfigStore};
use parking_lot::RwLock;

/// Plugin name to Active/Inactive, seeded from the `[plugins]` table.
///
/// Changes made through `set_configured_state` live for the process lifetime.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    states: RwLock<HashMap<String, ConfiguredState>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a `name = enabled` map.
    pub fn from_plugins(plugins: &BTreeMap<String, bool>) -> Self {
        let states = plugins
            .iter()
            .map(|(name, enabled)| (name.clone(), ConfiguredState::from(*enabled)))
            .collect();
        Self {
            states: RwLock::new(states),
        }
    }
}

impl PluginConfigStore for MemoryConfigStore {
    fn configured_state(&self, plugin: &str) -> ConfiguredState {
        self.states.read().get(plugin).copied().unwrap_or_default()
    }

    fn set_configured_state(&self, plugin: &str, state: ConfiguredState) {
        self.states.write().insert(plugin.to_string(), state);
    }
}
