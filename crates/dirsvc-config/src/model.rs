// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the dirsvc directory service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level dirsvc configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirsvcConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Optional backends compiled into this service.
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    /// Node registry behaviour.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Plugin initialization retry policy.
    #[serde(default)]
    pub launcher: LauncherConfig,

    /// Persisted plugin state: plugin name to enabled (Active) or disabled (Inactive).
    /// Plugins not listed default to Active.
    #[serde(default)]
    pub plugins: BTreeMap<String, bool>,

    /// Record-type service policies, checked by `IsOkToServiceQuery`.
    #[serde(default)]
    pub policy: Vec<PolicyConfig>,

    /// Directory scanned for `*.toml` plugin descriptors.
    #[serde(default)]
    pub plugin_dir: Option<String>,
}

/// Process identity and logging.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "dirsvc".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Optional backends. A disabled backend's selectors fail fast instead of waiting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilitiesConfig {
    /// Aggregate search nodes (authentication, contacts, network).
    #[serde(default = "default_true")]
    pub search: bool,

    #[serde(default = "default_true")]
    pub local: bool,

    #[serde(default = "default_true")]
    pub cache: bool,

    #[serde(default = "default_true")]
    pub configure: bool,

    #[serde(default = "default_true")]
    pub bsd: bool,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            search: true,
            local: true,
            cache: true,
            configure: true,
            bsd: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Node registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Deadline for lookups waiting on an empty singleton slot. `0` waits forever.
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

impl RegistryConfig {
    pub fn lookup_timeout(&self) -> Option<Duration> {
        (self.lookup_timeout_secs > 0).then(|| Duration::from_secs(self.lookup_timeout_secs))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

fn default_lookup_timeout_secs() -> u64 {
    60
}

/// Initialization launcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// Number of `Initialize` attempts before a plugin is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Constant delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl LauncherConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    100
}

fn default_retry_delay_ms() -> u64 {
    1000
}

/// Restricts which record types a plugin may serve for one node.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Plugin name the policy applies to.
    pub plugin: String,

    /// Node path the policy applies to.
    pub node: String,

    /// If non-empty, only these record types may be served.
    #[serde(default)]
    pub allow: Vec<String>,

    /// Record types that may never be served.
    #[serde(default)]
    pub deny: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = DirsvcConfig::default();
        assert_eq!(config.service.name, "dirsvc");
        assert_eq!(config.launcher.max_attempts, 100);
        assert_eq!(config.launcher.retry_delay(), Duration::from_secs(1));
        assert_eq!(
            config.registry.lookup_timeout(),
            Some(Duration::from_secs(60))
        );
        assert!(config.capabilities.search && config.capabilities.bsd);
        assert!(config.plugins.is_empty());
        assert!(config.policy.is_empty());
    }

    #[test]
    fn zero_lookup_timeout_means_wait_forever() {
        let config = RegistryConfig {
            lookup_timeout_secs: 0,
        };
        assert_eq!(config.lookup_timeout(), None);
    }

    #[test]
    fn policy_array_deserializes() {
        let toml_str = r#"
[[policy]]
plugin = "LDAPv3"
node = "/LDAPv3/ldap.example.com"
allow = ["Users", "Groups"]

[[policy]]
plugin = "NIS"
node = "/NIS/example"
deny = ["Computers"]
"#;
        let config: DirsvcConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.policy.len(), 2);
        assert_eq!(config.policy[0].allow, vec!["Users", "Groups"]);
        assert!(config.policy[0].deny.is_empty());
        assert_eq!(config.policy[1].deny, vec!["Computers"]);
    }

    #[test]
    fn policy_denies_unknown_fields() {
        let toml_str = r#"
[[policy]]
plugin = "LDAPv3"
node = "/LDAPv3/x"
alow = ["Users"]
"#;
        assert!(toml::from_str::<DirsvcConfig>(toml_str).is_err());
    }
}
