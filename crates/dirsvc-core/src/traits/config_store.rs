// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted per-plugin configuration.

use crate::types::ConfiguredState;

/// Synchronous key-value store of plugin name to Active/Inactive.
///
/// Read when a record is registered and on every state change or lazy load;
/// written when an administrator changes a plugin's state.
pub trait PluginConfigStore: Send + Sync {
    /// The persisted state, defaulting to Active for unknown plugins.
    fn configured_state(&self, plugin: &str) -> ConfiguredState;

    fn set_configured_state(&self, plugin: &str, state: ConfiguredState);
}
