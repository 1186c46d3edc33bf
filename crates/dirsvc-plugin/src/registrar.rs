// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Node registration API exposed to plugins.
//!
//! Every call presents the caller's capability token. The token must belong to
//! a record in the plugin table, except for proxy registrations made by the
//! lifecycle manager on behalf of a lazy plugin that has not been constructed.

use std::sync::Arc;

use dirsvc_core::{DirError, NodeKind, Token};
use dirsvc_registry::{AddOutcome, NodeRegistry};
use tracing::{debug, warn};

use crate::table::PluginTable;

/// Join path segments into a `/`-delimited path.
///
/// The buffer is reserved up front; an allocation failure is reported rather
/// than aborting.
pub fn join_path(segments: &[String]) -> Result<String, DirError> {
    if segments.is_empty() || segments.iter().any(String::is_empty) {
        return Err(DirError::NullOrEmptyParameter);
    }
    let len: usize = segments.iter().map(|segment| segment.len() + 1).sum();
    let mut path = String::new();
    path.try_reserve_exact(len)
        .map_err(|_| DirError::MemoryAllocationFailure)?;
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    Ok(path)
}

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Capability-checked entry point into the node registry.
pub struct NodeRegistrar {
    table: Arc<PluginTable>,
    registry: Arc<NodeRegistry>,
}

impl NodeRegistrar {
    pub fn new(table: Arc<PluginTable>, registry: Arc<NodeRegistry>) -> Self {
        Self { table, registry }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Register a node owned by the plugin holding `token`.
    pub fn register_node(
        &self,
        token: Token,
        segments: Vec<String>,
        kind: NodeKind,
    ) -> Result<(), DirError> {
        self.register(token, segments, kind, false)
    }

    /// Register a node for a plugin that may not be constructed yet.
    ///
    /// The token is not checked against the table. The node is attached to
    /// its plugin lazily, on the first `plugin_for` resolution.
    pub fn register_proxy_node(
        &self,
        token: Token,
        segments: Vec<String>,
        kind: NodeKind,
    ) -> Result<(), DirError> {
        self.register(token, segments, kind, true)
    }

    fn register(
        &self,
        token: Token,
        segments: Vec<String>,
        kind: NodeKind,
        proxy: bool,
    ) -> Result<(), DirError> {
        let record = self.table.get_by_token(token);
        if record.is_none() && !proxy {
            warn!(token = %token, kind = %kind, "registration with unknown token rejected");
            return Err(DirError::InvalidToken);
        }

        let path = join_path(&segments)?;
        let module = record.as_ref().and_then(|r| r.module.as_ref());
        match self.registry.add_node(path.clone(), kind, token, module) {
            AddOutcome::Inserted => {
                debug!(
                    path = %path,
                    kind = %kind,
                    plugin = record.as_ref().map(|r| r.name.as_str()).unwrap_or("<proxy>"),
                    "node registered by plugin"
                );
                Ok(())
            }
            AddOutcome::DuplicateRejected | AddOutcome::SingletonOccupied => {
                Err(DirError::DuplicateNode { path })
            }
        }
    }

    /// Remove a node previously registered under `token`.
    ///
    /// Only the owning plugin may remove a node.
    pub fn unregister_node(&self, token: Token, segments: Vec<String>) -> Result<(), DirError> {
        if !self.table.contains_token(token) {
            return Err(DirError::InvalidToken);
        }
        let path = join_path(&segments)?;

        self.registry.remove_owned(&path, token).inspect_err(|e| {
            if matches!(e, DirError::InvalidToken) {
                warn!(path = %path, "unregistration by non-owner rejected");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn join_builds_rooted_path() {
        assert_eq!(join_path(&segments(&["Search"])).unwrap(), "/Search");
        assert_eq!(
            join_path(&segments(&["LDAPv3", "ldap.example.com"])).unwrap(),
            "/LDAPv3/ldap.example.com"
        );
    }

    #[test]
    fn join_rejects_empty_input() {
        assert!(matches!(join_path(&[]), Err(DirError::NullOrEmptyParameter)));
        assert!(matches!(
            join_path(&segments(&["BSD", ""])),
            Err(DirError::NullOrEmptyParameter)
        ));
    }

    #[test]
    fn split_drops_empty_segments() {
        assert_eq!(split_path("/BSD/local"), segments(&["BSD", "local"]));
        assert_eq!(split_path("//Search//"), segments(&["Search"]));
        assert!(split_path("/").is_empty());
    }
}
