// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value types shared by the node registry and the plugin lifecycle.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Category of a directory node.
///
/// Seven kinds are singleton slots (at most one node each per process); the
/// other three are ordered collections keyed by path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum NodeKind {
    Generic,
    LocalHosted,
    DefaultNetworkHosted,
    Local,
    Cache,
    Configure,
    AuthenticationSearch,
    ContactsSearch,
    NetworkSearch,
    #[strum(to_string = "BSD", serialize = "Bsd")]
    #[serde(rename = "BSD", alias = "Bsd")]
    Bsd,
}

impl NodeKind {
    /// Every singleton kind, in slot order.
    pub const SINGLETONS: [NodeKind; 7] = [
        NodeKind::Local,
        NodeKind::Cache,
        NodeKind::Configure,
        NodeKind::AuthenticationSearch,
        NodeKind::ContactsSearch,
        NodeKind::NetworkSearch,
        NodeKind::Bsd,
    ];

    /// Returns true for kinds that occupy a one-per-process slot.
    pub fn is_singleton(self) -> bool {
        !matches!(
            self,
            NodeKind::Generic | NodeKind::LocalHosted | NodeKind::DefaultNetworkHosted
        )
    }

    /// The optional backend capability this kind is served by, if any.
    pub fn capability(self) -> Option<Capability> {
        match self {
            NodeKind::Local => Some(Capability::Local),
            NodeKind::Cache => Some(Capability::Cache),
            NodeKind::Configure => Some(Capability::Configure),
            NodeKind::AuthenticationSearch
            | NodeKind::ContactsSearch
            | NodeKind::NetworkSearch => Some(Capability::Search),
            NodeKind::Bsd => Some(Capability::Bsd),
            NodeKind::Generic | NodeKind::LocalHosted | NodeKind::DefaultNetworkHosted => None,
        }
    }

    /// Slots that must be populated, in order, before a lookup on this kind
    /// can be answered. The network search node is only served once the local
    /// node exists.
    pub fn wait_chain(self) -> &'static [NodeKind] {
        match self {
            NodeKind::Local => &[NodeKind::Local],
            NodeKind::Cache => &[NodeKind::Cache],
            NodeKind::Configure => &[NodeKind::Configure],
            NodeKind::AuthenticationSearch => &[NodeKind::AuthenticationSearch],
            NodeKind::ContactsSearch => &[NodeKind::ContactsSearch],
            NodeKind::NetworkSearch => &[NodeKind::Local, NodeKind::NetworkSearch],
            NodeKind::Bsd => &[NodeKind::Bsd],
            NodeKind::Generic | NodeKind::LocalHosted | NodeKind::DefaultNetworkHosted => &[],
        }
    }
}

/// Optional backends that can be switched off in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Capability {
    Search,
    Local,
    Cache,
    Configure,
    Bsd,
}

/// Capability identifier handed to a plugin when its record is created.
///
/// It is both the plugin's identity in the table and its credential for the
/// node registration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token(Uuid);

impl Token {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil token, which no plugin record is ever assigned.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

bitflags! {
    /// Lifecycle state bits of a plugin record.
    ///
    /// `INITIALIZED`, `FAILED_TO_INIT` and `UNINITIALIZED` are mutually
    /// exclusive; each composes with exactly one of `ACTIVE` / `INACTIVE`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PluginState: u32 {
        const UNINITIALIZED = 1 << 0;
        const INITIALIZED = 1 << 1;
        const ACTIVE = 1 << 2;
        const INACTIVE = 1 << 3;
        const FAILED_TO_INIT = 1 << 4;
    }
}

impl PluginState {
    const LIFECYCLE: PluginState = PluginState::UNINITIALIZED
        .union(PluginState::INITIALIZED)
        .union(PluginState::FAILED_TO_INIT);
    const ACTIVITY: PluginState = PluginState::ACTIVE.union(PluginState::INACTIVE);

    /// Initial state of a freshly registered record.
    pub fn registered(configured: ConfiguredState) -> Self {
        PluginState::UNINITIALIZED | configured.into()
    }

    /// Terminal state committed after the retry ceiling is exhausted.
    pub fn gave_up() -> Self {
        PluginState::INACTIVE | PluginState::FAILED_TO_INIT
    }

    /// Replace the activity bit, keeping the lifecycle bit.
    pub fn with_activity(self, configured: ConfiguredState) -> Self {
        (self - Self::ACTIVITY) | configured.into()
    }

    /// Replace the lifecycle bit, keeping the activity bit.
    pub fn with_lifecycle(self, lifecycle: PluginState) -> Self {
        (self - Self::LIFECYCLE) | (lifecycle & Self::LIFECYCLE)
    }

    pub fn is_active(self) -> bool {
        self.contains(PluginState::ACTIVE)
    }

    pub fn is_initialized(self) -> bool {
        self.contains(PluginState::INITIALIZED)
    }

    pub fn has_failed(self) -> bool {
        self.contains(PluginState::FAILED_TO_INIT)
    }
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Persisted Active/Inactive preference for a plugin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConfiguredState {
    #[default]
    Active,
    Inactive,
}

impl From<bool> for ConfiguredState {
    fn from(active: bool) -> Self {
        if active {
            ConfiguredState::Active
        } else {
            ConfiguredState::Inactive
        }
    }
}

impl From<ConfiguredState> for PluginState {
    fn from(state: ConfiguredState) -> Self {
        match state {
            ConfiguredState::Active => PluginState::ACTIVE,
            ConfiguredState::Inactive => PluginState::INACTIVE,
        }
    }
}

/// How a plugin record entered the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum LoadTier {
    /// Constructed at boot.
    Static,
    /// Found as a descriptor on disk; constructed on first demand if lazy.
    DiscoveredOnDisk,
}

/// How `Lookup` interprets its pattern.
///
/// The string modes compare against full node paths; the selector modes ignore
/// the pattern and return a designated slot or collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum MatchMode {
    ExactMatch,
    StartsWith,
    EndsWith,
    Contains,
    ExactMatchIgnoreCase,
    StartsWithIgnoreCase,
    EndsWithIgnoreCase,
    ContainsIgnoreCase,
    LocalNode,
    CacheNode,
    ConfigureNode,
    AuthenticationSearchNode,
    ContactsSearchNode,
    NetworkSearchNode,
    BsdNode,
    LocalHostedNodes,
    DefaultNetworkNodes,
}

impl MatchMode {
    /// The node kind a selector mode designates, or `None` for string modes.
    pub fn selector(self) -> Option<NodeKind> {
        match self {
            MatchMode::LocalNode => Some(NodeKind::Local),
            MatchMode::CacheNode => Some(NodeKind::Cache),
            MatchMode::ConfigureNode => Some(NodeKind::Configure),
            MatchMode::AuthenticationSearchNode => Some(NodeKind::AuthenticationSearch),
            MatchMode::ContactsSearchNode => Some(NodeKind::ContactsSearch),
            MatchMode::NetworkSearchNode => Some(NodeKind::NetworkSearch),
            MatchMode::BsdNode => Some(NodeKind::Bsd),
            MatchMode::LocalHostedNodes => Some(NodeKind::LocalHosted),
            MatchMode::DefaultNetworkNodes => Some(NodeKind::DefaultNetworkHosted),
            _ => None,
        }
    }

    /// Test a node path against a pattern. Selector modes never match here.
    pub fn matches(self, pattern: &str, path: &str) -> bool {
        match self {
            MatchMode::ExactMatch => path == pattern,
            MatchMode::StartsWith => path.starts_with(pattern),
            MatchMode::EndsWith => path.ends_with(pattern),
            MatchMode::Contains => path.contains(pattern),
            MatchMode::ExactMatchIgnoreCase => path.to_lowercase() == pattern.to_lowercase(),
            MatchMode::StartsWithIgnoreCase => {
                path.to_lowercase().starts_with(&pattern.to_lowercase())
            }
            MatchMode::EndsWithIgnoreCase => path.to_lowercase().ends_with(&pattern.to_lowercase()),
            MatchMode::ContainsIgnoreCase => path.to_lowercase().contains(&pattern.to_lowercase()),
            _ => false,
        }
    }
}
