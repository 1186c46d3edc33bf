// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptor parsing from `*.toml` files.
//!
//! A descriptor names a plugin, says whether it wants to be loaded lazily and
//! lists the nodes that should be registered on its behalf before it exists.

use std::str::FromStr;

use dirsvc_core::{DirError, NodeKind};
use serde::{Deserialize, Serialize};

use crate::registrar::split_path;

/// Version of this service, checked against `min_service_version`.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parsed plugin descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    /// Semantic version string.
    pub version: String,
    pub description: String,
    /// Defer construction until a lookup or state change demands the plugin.
    pub lazy_load: bool,
    /// Oldest service version this plugin runs against.
    pub min_service_version: Option<String>,
    /// Nodes claimed by the plugin, pre-registered for lazy plugins.
    pub nodes: Vec<NodeDeclaration>,
}

/// A node a plugin serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDeclaration {
    pub path: String,
    pub kind: NodeKind,
}

impl NodeDeclaration {
    pub fn new(path: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// The path split into its non-empty segments.
    pub fn segments(&self) -> Vec<String> {
        split_path(&self.path)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    plugin: PluginSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginSection {
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    lazy_load: bool,
    min_service_version: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeSection {
    path: String,
    #[serde(default = "default_node_kind")]
    kind: String,
}

fn default_node_kind() -> String {
    NodeKind::Generic.to_string()
}

/// Parse a plugin descriptor from TOML content.
///
/// Rejects empty names, versions that are not semver, node paths without a
/// segment and unknown node kinds.
pub fn parse_plugin_manifest(toml_content: &str) -> Result<PluginManifest, DirError> {
    let file: ManifestFile = toml::from_str(toml_content)
        .map_err(|e| DirError::Config(format!("invalid plugin descriptor: {e}")))?;
    let section = file.plugin;

    if section.name.is_empty() {
        return Err(DirError::Config(
            "plugin descriptor: name must not be empty".to_string(),
        ));
    }
    if section.version.is_empty() {
        return Err(DirError::Config(
            "plugin descriptor: version must not be empty".to_string(),
        ));
    }
    semver::Version::parse(&section.version).map_err(|e| {
        DirError::Config(format!(
            "plugin descriptor {}: invalid version '{}': {e}",
            section.name, section.version
        ))
    })?;

    let mut nodes = Vec::with_capacity(section.nodes.len());
    for node in section.nodes {
        let kind = NodeKind::from_str(&node.kind).map_err(|_| {
            DirError::Config(format!(
                "plugin descriptor {}: invalid node kind '{}' for {}",
                section.name, node.kind, node.path
            ))
        })?;
        if split_path(&node.path).is_empty() {
            return Err(DirError::Config(format!(
                "plugin descriptor {}: node path '{}' has no segments",
                section.name, node.path
            )));
        }
        nodes.push(NodeDeclaration {
            path: node.path,
            kind,
        });
    }

    Ok(PluginManifest {
        name: section.name,
        version: section.version,
        description: section.description,
        lazy_load: section.lazy_load,
        min_service_version: section.min_service_version,
        nodes,
    })
}

impl PluginManifest {
    /// Check `min_service_version` against the running service.
    pub fn check_compatible(&self) -> Result<(), DirError> {
        let Some(required) = &self.min_service_version else {
            return Ok(());
        };
        let required = semver::Version::parse(required).map_err(|e| {
            DirError::Config(format!(
                "plugin {}: invalid min_service_version '{required}': {e}",
                self.name
            ))
        })?;
        let running = semver::Version::parse(SERVICE_VERSION)
            .map_err(|e| DirError::Internal(format!("service version: {e}")))?;
        if running < required {
            return Err(DirError::Config(format!(
                "plugin {} requires service {required}, running {running}",
                self.name
            )));
        }
        Ok(())
    }
}
