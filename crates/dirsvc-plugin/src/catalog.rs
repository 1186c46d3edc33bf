// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in plugin catalog.
//!
//! The service boots with one node-only plugin per enabled capability. A
//! node-only plugin does nothing but claim the nodes listed in its descriptor
//! when it initializes; the data behind those nodes is served elsewhere.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dirsvc_core::{DirError, DirectoryPlugin, NodeKind, PluginRequest, PluginState, Token};
use dirsvc_registry::RegistryCapabilities;
use parking_lot::Mutex;
use tracing::debug;

use crate::factory::PluginFactory;
use crate::manifest::{NodeDeclaration, PluginManifest};
use crate::registrar::NodeRegistrar;

const BUILTIN_VERSION: &str = "1.0.0";

fn builtin(name: &str, description: &str, nodes: Vec<NodeDeclaration>) -> PluginManifest {
    PluginManifest {
        name: name.to_string(),
        version: BUILTIN_VERSION.to_string(),
        description: description.to_string(),
        lazy_load: false,
        min_service_version: None,
        nodes,
    }
}

/// Descriptors for the built-in plugins whose capability is enabled.
pub fn builtin_catalog(capabilities: RegistryCapabilities) -> Vec<PluginManifest> {
    let mut catalog = Vec::new();
    if capabilities.configure {
        catalog.push(builtin(
            "Configure",
            "Service configuration node",
            vec![NodeDeclaration::new("/Configure", NodeKind::Configure)],
        ));
    }
    if capabilities.local {
        catalog.push(builtin(
            "Local",
            "Local directory store",
            vec![
                NodeDeclaration::new("/Local/Default", NodeKind::Local),
                NodeDeclaration::new("/Local/Default", NodeKind::LocalHosted),
            ],
        ));
    }
    if capabilities.search {
        catalog.push(builtin(
            "Search",
            "Search policy aggregators",
            vec![
                NodeDeclaration::new("/Search", NodeKind::AuthenticationSearch),
                NodeDeclaration::new("/Search/Contacts", NodeKind::ContactsSearch),
                NodeDeclaration::new("/Search/Network", NodeKind::NetworkSearch),
            ],
        ));
    }
    if capabilities.cache {
        catalog.push(builtin(
            "Cache",
            "Lookup result cache",
            vec![NodeDeclaration::new("/Cache", NodeKind::Cache)],
        ));
    }
    if capabilities.bsd {
        catalog.push(builtin(
            "BSD",
            "BSD flat-file directory",
            vec![
                NodeDeclaration::new("/BSD", NodeKind::Bsd),
                NodeDeclaration::new("/BSD/local", NodeKind::LocalHosted),
            ],
        ));
    }
    catalog
}

/// Factory producing a [`NodeOnlyPlugin`] for one descriptor.
#[derive(Debug, Clone)]
pub struct NodeOnlyFactory {
    name: String,
    nodes: Vec<NodeDeclaration>,
}

impl NodeOnlyFactory {
    pub fn from_manifest(manifest: &PluginManifest) -> Self {
        Self {
            name: manifest.name.clone(),
            nodes: manifest.nodes.clone(),
        }
    }
}

impl PluginFactory for NodeOnlyFactory {
    fn create(&self, registrar: Arc<NodeRegistrar>) -> Result<Arc<dyn DirectoryPlugin>, DirError> {
        Ok(Arc::new(NodeOnlyPlugin {
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            registrar,
            token: OnceLock::new(),
            state: Mutex::new(PluginState::UNINITIALIZED),
        }))
    }
}

/// A plugin that registers its declared nodes and nothing else.
pub struct NodeOnlyPlugin {
    name: String,
    nodes: Vec<NodeDeclaration>,
    registrar: Arc<NodeRegistrar>,
    token: OnceLock<Token>,
    state: Mutex<PluginState>,
}

impl NodeOnlyPlugin {
    /// Last state the lifecycle manager reported.
    pub fn state(&self) -> PluginState {
        *self.state.lock()
    }
}

#[async_trait]
impl DirectoryPlugin for NodeOnlyPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self, _version: &str, signature: Token) -> Result<(), DirError> {
        if self.token.set(signature).is_err() && self.token.get() != Some(&signature) {
            return Err(DirError::InvalidToken);
        }
        Ok(())
    }

    async fn initialize(&self) -> Result<(), DirError> {
        let token = *self
            .token
            .get()
            .ok_or_else(|| DirError::plugin(&self.name, "initialized before validation"))?;
        for node in &self.nodes {
            match self
                .registrar
                .register_node(token, node.segments(), node.kind)
            {
                Ok(()) => {}
                // pre-registered on our behalf, or left over from an earlier attempt
                Err(DirError::DuplicateNode { path })
                    if self.registrar.registry().owner_of(&path, node.kind) == Some(token) => {}
                Err(e) => return Err(e),
            }
        }
        debug!(plugin = %self.name, nodes = self.nodes.len(), "node-only plugin initialized");
        Ok(())
    }

    async fn set_plugin_state(&self, state: PluginState) -> Result<(), DirError> {
        *self.state.lock() = state;
        Ok(())
    }

    async fn process_request(&self, _request: PluginRequest) -> Result<(), DirError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{PluginRecord, PluginTable};
    use dirsvc_core::{ConfiguredState, LoadTier};
    use dirsvc_registry::NodeRegistry;

    fn instantiate(
        table: &Arc<PluginTable>,
        registry: &Arc<NodeRegistry>,
        manifest: &PluginManifest,
    ) -> (Token, Arc<NodeRegistrar>, Arc<dyn DirectoryPlugin>) {
        let record = PluginRecord::new(&manifest.name, &manifest.version, LoadTier::Static, None);
        let token = record.token();
        table.register(record, ConfiguredState::Active).unwrap();
        let registrar = Arc::new(NodeRegistrar::new(Arc::clone(table), Arc::clone(registry)));
        let plugin = NodeOnlyFactory::from_manifest(manifest)
            .create(Arc::clone(&registrar))
            .unwrap();
        (token, registrar, plugin)
    }

    fn local_manifest() -> PluginManifest {
        builtin_catalog(RegistryCapabilities::default())
            .into_iter()
            .find(|m| m.name == "Local")
            .unwrap()
    }

    #[test]
    fn full_catalog_covers_every_singleton_slot() {
        let catalog = builtin_catalog(RegistryCapabilities::default());
        let names: Vec<&str> = catalog.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Configure", "Local", "Search", "Cache", "BSD"]);

        for kind in NodeKind::SINGLETONS {
            let claimed = catalog
                .iter()
                .flat_map(|m| m.nodes.iter())
                .filter(|n| n.kind == kind)
                .count();
            assert_eq!(claimed, 1, "{kind} should be claimed exactly once");
        }
    }

    #[test]
    fn disabled_capabilities_are_left_out() {
        let capabilities = RegistryCapabilities {
            search: false,
            bsd: false,
            ..RegistryCapabilities::default()
        };
        let catalog = builtin_catalog(capabilities);
        assert!(catalog.iter().all(|m| m.name != "Search" && m.name != "BSD"));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn builtin_versions_are_semver() {
        for manifest in builtin_catalog(RegistryCapabilities::default()) {
            assert!(manifest.check_compatible().is_ok());
            assert!(!manifest.lazy_load);
        }
    }

    #[tokio::test]
    async fn validate_keeps_the_first_signature() {
        let table = Arc::new(PluginTable::new());
        let registry = Arc::new(NodeRegistry::default());
        let (token, _, plugin) = instantiate(&table, &registry, &local_manifest());

        plugin.validate("1.0.0", token).await.unwrap();
        plugin.validate("1.0.0", token).await.unwrap();
        assert!(matches!(
            plugin.validate("1.0.0", Token::generate()).await,
            Err(DirError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn racing_validations_admit_one_signature() {
        let table = Arc::new(PluginTable::new());
        let registry = Arc::new(NodeRegistry::default());
        let (_, _, plugin) = instantiate(&table, &registry, &local_manifest());

        let (first, second) = tokio::join!(
            plugin.validate("1.0.0", Token::generate()),
            plugin.validate("1.0.0", Token::generate())
        );
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn reinitializing_accepts_nodes_already_owned() {
        let table = Arc::new(PluginTable::new());
        let registry = Arc::new(NodeRegistry::default());
        let (token, _, plugin) = instantiate(&table, &registry, &local_manifest());

        plugin.validate("1.0.0", token).await.unwrap();
        plugin.initialize().await.unwrap();
        plugin.initialize().await.unwrap();
        assert_eq!(registry.singleton(NodeKind::Local).unwrap().owner, token);
    }

    #[tokio::test]
    async fn owning_the_hosted_entry_does_not_stand_in_for_the_slot() {
        let table = Arc::new(PluginTable::new());
        let registry = Arc::new(NodeRegistry::default());
        let (token, registrar, plugin) = instantiate(&table, &registry, &local_manifest());

        registrar
            .register_node(
                token,
                vec!["Local".to_string(), "Default".to_string()],
                NodeKind::LocalHosted,
            )
            .unwrap();
        let squatter = Token::generate();
        registry.add_node("/Local/Other".into(), NodeKind::Local, squatter, None);

        plugin.validate("1.0.0", token).await.unwrap();
        let err = plugin.initialize().await.unwrap_err();
        assert!(matches!(err, DirError::DuplicateNode { path } if path == "/Local/Default"));
        assert_eq!(registry.singleton(NodeKind::Local).unwrap().owner, squatter);
    }
}
