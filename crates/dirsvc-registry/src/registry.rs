// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The node registry.
//!
//! A single mutex guards every collection. Observer callbacks and slot latch
//! wake-ups happen after that mutex has been released, so an observer or a
//! woken lookup may call back into the registry.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use dirsvc_core::{
    Capability, DirError, DirectoryPlugin, MatchMode, NodeKind, NodeObserver, PluginResolver,
    Token,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::node::{AddOutcome, DirectoryNode, NodeEntry};
use crate::results::NodeResults;

/// Optional backends enabled for this process.
///
/// Selectors whose backend is disabled fail fast with
/// [`DirError::UnknownNodeName`] instead of waiting for a slot that will never
/// be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryCapabilities {
    pub search: bool,
    pub local: bool,
    pub cache: bool,
    pub configure: bool,
    pub bsd: bool,
}

impl RegistryCapabilities {
    pub fn is_enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::Search => self.search,
            Capability::Local => self.local,
            Capability::Cache => self.cache,
            Capability::Configure => self.configure,
            Capability::Bsd => self.bsd,
        }
    }
}

impl Default for RegistryCapabilities {
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

#[derive(Default)]
struct Collections {
    slots: HashMap<NodeKind, DirectoryNode>,
    generic: BTreeMap<String, DirectoryNode>,
    local_hosted: BTreeMap<String, DirectoryNode>,
    default_network: BTreeMap<String, DirectoryNode>,
    node_count: usize,
    change_token: u64,
}

impl Collections {
    fn ordered(&self) -> [&BTreeMap<String, DirectoryNode>; 3] {
        [&self.generic, &self.local_hosted, &self.default_network]
    }

    fn find_mut(&mut self, path: &str) -> Option<&mut DirectoryNode> {
        if let Some(node) = self.generic.get_mut(path) {
            return Some(node);
        }
        if let Some(node) = self.local_hosted.get_mut(path) {
            return Some(node);
        }
        if let Some(node) = self.default_network.get_mut(path) {
            return Some(node);
        }
        self.slots.values_mut().find(|node| node.path() == path)
    }
}

/// Path-keyed index of every registered directory node.
///
/// Construct one per process and share it by `Arc` with the registration API,
/// the lifecycle manager and the lookup surface.
pub struct NodeRegistry {
    inner: Mutex<Collections>,
    latches: HashMap<NodeKind, watch::Sender<bool>>,
    observers: RwLock<Vec<Arc<dyn NodeObserver>>>,
    capabilities: RegistryCapabilities,
    lookup_timeout: Option<Duration>,
}

impl NodeRegistry {
    /// Create an empty registry with one latch per singleton slot.
    pub fn new(capabilities: RegistryCapabilities) -> Self {
        let latches = NodeKind::SINGLETONS
            .iter()
            .map(|kind| (*kind, watch::channel(false).0))
            .collect();
        Self {
            inner: Mutex::new(Collections::default()),
            latches,
            observers: RwLock::new(Vec::new()),
            capabilities,
            lookup_timeout: None,
        }
    }

    /// Default deadline applied by [`lookup`](Self::lookup). `None` waits forever.
    pub fn with_lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn capabilities(&self) -> RegistryCapabilities {
        self.capabilities
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout
    }

    /// Subscribe an observer to generic node added/removed events.
    pub fn add_observer(&self, observer: Arc<dyn NodeObserver>) {
        self.observers.write().push(observer);
    }

    /// Insert a node into the slot or collection for its kind.
    ///
    /// Rejected nodes are dropped; the caller's path is not retained.
    pub fn add_node(
        &self,
        path: String,
        kind: NodeKind,
        owner: Token,
        plugin: Option<&Arc<dyn DirectoryPlugin>>,
    ) -> AddOutcome {
        let node = DirectoryNode::new(path, kind, owner, plugin);
        if kind.is_singleton() {
            return self.claim_slot(node);
        }

        let mut inner = self.inner.lock();
        let collection = match kind {
            NodeKind::Generic => &mut inner.generic,
            NodeKind::LocalHosted => &mut inner.local_hosted,
            _ => &mut inner.default_network,
        };
        let path = match collection.entry(node.path().to_string()) {
            Entry::Occupied(existing) => {
                debug!(path = %existing.key(), kind = %kind, "duplicate node rejected");
                return AddOutcome::DuplicateRejected;
            }
            Entry::Vacant(slot) => slot.insert(node).path().to_string(),
        };
        debug!(path = %path, kind = %kind, owner = %owner, "node registered");

        if kind == NodeKind::Generic {
            inner.node_count += 1;
            inner.change_token += 1;
            drop(inner);
            self.notify(|observer| observer.node_added(&path));
        }
        AddOutcome::Inserted
    }

    fn claim_slot(&self, node: DirectoryNode) -> AddOutcome {
        let kind = node.kind();
        {
            let mut inner = self.inner.lock();
            if let Some(existing) = inner.slots.get(&kind) {
                debug!(
                    kind = %kind,
                    existing = %existing.path(),
                    rejected = %node.path(),
                    "singleton slot already occupied"
                );
                return AddOutcome::SingletonOccupied;
            }
            info!(kind = %kind, path = %node.path(), "singleton slot populated");
            inner.slots.insert(kind, node);
        }

        if let Some(latch) = self.latches.get(&kind) {
            latch.send_if_modified(|populated| !std::mem::replace(populated, true));
        }
        AddOutcome::Inserted
    }

    /// Remove a generic, locally-hosted or default-network node by path.
    ///
    /// Singleton nodes are never removed. Only generic removals are counted and
    /// reported to observers.
    pub fn remove_node(&self, path: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.generic.remove(path).is_some() {
            inner.node_count = inner.node_count.saturating_sub(1);
            inner.change_token += 1;
            drop(inner);
            debug!(path = %path, "generic node unregistered");
            self.notify(|observer| observer.node_removed(path));
            return true;
        }
        if inner.local_hosted.remove(path).is_some() || inner.default_network.remove(path).is_some()
        {
            debug!(path = %path, "hosted node unregistered");
            return true;
        }
        false
    }

    /// Remove the node at `path` owned by `owner`.
    ///
    /// The same path may be held by different plugins in different
    /// collections; only the entry owned by `owner` is removed. Generic
    /// removals are counted and reported exactly as in
    /// [`remove_node`](Self::remove_node).
    pub fn remove_owned(&self, path: &str, owner: Token) -> Result<(), DirError> {
        let mut inner = self.inner.lock();
        let owned = |collection: &BTreeMap<String, DirectoryNode>| {
            collection.get(path).is_some_and(|node| node.owner() == owner)
        };

        if owned(&inner.generic) {
            inner.generic.remove(path);
            inner.node_count = inner.node_count.saturating_sub(1);
            inner.change_token += 1;
            drop(inner);
            debug!(path = %path, owner = %owner, "generic node unregistered");
            self.notify(|observer| observer.node_removed(path));
            return Ok(());
        }
        if owned(&inner.local_hosted) {
            inner.local_hosted.remove(path);
            debug!(path = %path, owner = %owner, "locally hosted node unregistered");
            return Ok(());
        }
        if owned(&inner.default_network) {
            inner.default_network.remove(path);
            debug!(path = %path, owner = %owner, "default network node unregistered");
            return Ok(());
        }

        if inner.ordered().iter().any(|collection| collection.contains_key(path)) {
            return Err(DirError::InvalidToken);
        }
        Err(DirError::NodeNotRegistered {
            path: path.to_string(),
        })
    }

    /// Owner of the node `kind` would place at `path`.
    ///
    /// For singleton kinds this is the owner of the slot, whatever path it
    /// was claimed under.
    pub fn owner_of(&self, path: &str, kind: NodeKind) -> Option<Token> {
        let inner = self.inner.lock();
        let node = match kind {
            NodeKind::Generic => inner.generic.get(path),
            NodeKind::LocalHosted => inner.local_hosted.get(path),
            NodeKind::DefaultNetworkHosted => inner.default_network.get(path),
            _ => inner.slots.get(&kind),
        };
        node.map(DirectoryNode::owner)
    }

    /// Probe for a path in the collection of `kind`.
    ///
    /// Singleton kinds cannot be probed and always report false; claim the slot
    /// with [`add_node`](Self::add_node) and inspect the outcome instead.
    pub fn is_present(&self, path: &str, kind: NodeKind) -> bool {
        let inner = self.inner.lock();
        match kind {
            NodeKind::Generic => inner.generic.contains_key(path),
            NodeKind::LocalHosted => inner.local_hosted.contains_key(path),
            NodeKind::DefaultNetworkHosted => inner.default_network.contains_key(path),
            _ => false,
        }
    }

    /// Look up nodes using the registry's default deadline.
    pub async fn lookup(
        &self,
        pattern: &str,
        mode: MatchMode,
        sink: &mut NodeResults,
    ) -> Result<usize, DirError> {
        self.lookup_with_timeout(pattern, mode, sink, self.lookup_timeout)
            .await
    }

    /// Look up nodes, writing the complete result set into `sink`.
    ///
    /// String modes match against every path in the generic, locally-hosted and
    /// default-network collections and yield ascending path order. Singleton
    /// selectors wait (up to `timeout`) for their slot to be populated.
    pub async fn lookup_with_timeout(
        &self,
        pattern: &str,
        mode: MatchMode,
        sink: &mut NodeResults,
        timeout: Option<Duration>,
    ) -> Result<usize, DirError> {
        let matches = match mode.selector() {
            Some(kind) if kind.is_singleton() => self.select_slot(kind, timeout).await?,
            Some(kind) => self.select_collection(kind),
            None => self.match_paths(pattern, mode)?,
        };
        sink.fill(matches)
    }

    fn match_paths(&self, pattern: &str, mode: MatchMode) -> Result<Vec<NodeEntry>, DirError> {
        if pattern.is_empty() {
            return Err(DirError::NullOrEmptyParameter);
        }
        let inner = self.inner.lock();
        let mut found: BTreeMap<&str, NodeEntry> = BTreeMap::new();
        for collection in inner.ordered() {
            for (path, node) in collection {
                if mode.matches(pattern, path) {
                    found.entry(path.as_str()).or_insert_with(|| node.entry());
                }
            }
        }
        if found.is_empty() {
            return Err(DirError::UnknownNodeName {
                name: pattern.to_string(),
            });
        }
        Ok(found.into_values().collect())
    }

    fn select_collection(&self, kind: NodeKind) -> Vec<NodeEntry> {
        let inner = self.inner.lock();
        let collection = match kind {
            NodeKind::LocalHosted => &inner.local_hosted,
            NodeKind::DefaultNetworkHosted => &inner.default_network,
            _ => &inner.generic,
        };
        collection.values().map(DirectoryNode::entry).collect()
    }

    async fn select_slot(
        &self,
        kind: NodeKind,
        timeout: Option<Duration>,
    ) -> Result<Vec<NodeEntry>, DirError> {
        let chain = kind.wait_chain();
        let disabled = chain.iter().any(|dep| {
            dep.capability()
                .is_some_and(|cap| !self.capabilities.is_enabled(cap))
        });
        if disabled {
            return Err(DirError::UnknownNodeName {
                name: kind.to_string(),
            });
        }

        let deadline = timeout.map(|duration| (Instant::now() + duration, duration));
        for dep in chain {
            self.wait_for_slot(*dep, deadline).await?;
        }

        let inner = self.inner.lock();
        inner
            .slots
            .get(&kind)
            .map(|node| vec![node.entry()])
            .ok_or_else(|| DirError::UnknownNodeName {
                name: kind.to_string(),
            })
    }

    async fn wait_for_slot(
        &self,
        kind: NodeKind,
        deadline: Option<(Instant, Duration)>,
    ) -> Result<(), DirError> {
        let latch = self
            .latches
            .get(&kind)
            .ok_or_else(|| DirError::Internal(format!("no latch for slot {kind}")))?;
        let mut populated = latch.subscribe();
        if *populated.borrow() {
            return Ok(());
        }

        debug!(kind = %kind, "waiting for singleton slot");
        let wait = async {
            populated
                .wait_for(|set| *set)
                .await
                .map(|_| ())
                .map_err(|_| DirError::Internal(format!("latch for slot {kind} closed")))
        };
        match deadline {
            None => wait.await,
            Some((at, duration)) => tokio::time::timeout_at(at, wait)
                .await
                .map_err(|_| DirError::Timeout { duration })?,
        }
    }

    /// Resolve the plugin serving `path`.
    ///
    /// Uses the node's cached back-reference when it is still alive; otherwise
    /// asks `resolver` for the owner token's plugin (which may load it) and
    /// caches the result on the node.
    pub async fn plugin_for(
        &self,
        path: &str,
        resolver: &dyn PluginResolver,
    ) -> Result<Arc<dyn DirectoryPlugin>, DirError> {
        let owner = {
            let mut inner = self.inner.lock();
            let node = inner
                .find_mut(path)
                .ok_or_else(|| DirError::NodeNotRegistered {
                    path: path.to_string(),
                })?;
            if let Some(plugin) = node.plugin() {
                return Ok(plugin);
            }
            node.owner()
        };

        let plugin = resolver
            .resolve(owner)
            .await
            .ok_or_else(|| DirError::UnknownNodeName {
                name: path.to_string(),
            })?;

        let mut inner = self.inner.lock();
        if let Some(node) = inner.find_mut(path).filter(|node| node.owner() == owner) {
            node.attach(&plugin);
        }
        Ok(plugin)
    }

    /// The node currently in a singleton slot, if any.
    pub fn singleton(&self, kind: NodeKind) -> Option<NodeEntry> {
        self.inner.lock().slots.get(&kind).map(DirectoryNode::entry)
    }

    /// Find a node by exact path across every collection and slot.
    pub fn node(&self, path: &str) -> Option<NodeEntry> {
        self.inner.lock().find_mut(path).map(|node| node.entry())
    }

    /// Generic node paths in ascending order.
    pub fn generic_paths(&self) -> Vec<String> {
        self.inner.lock().generic.keys().cloned().collect()
    }

    /// Number of live generic nodes.
    pub fn node_count(&self) -> usize {
        self.inner.lock().node_count
    }

    /// Counter bumped on every structural change to the generic collection.
    pub fn change_token(&self) -> u64 {
        self.inner.lock().change_token
    }

    /// Drop every node from every slot and collection. Used at process teardown.
    pub fn teardown(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.slots.len()
            + inner.generic.len()
            + inner.local_hosted.len()
            + inner.default_network.len();
        inner.slots.clear();
        inner.generic.clear();
        inner.local_hosted.clear();
        inner.default_network.clear();
        inner.node_count = 0;
        inner.change_token += 1;
        info!(dropped, "node registry torn down");
    }

    fn notify(&self, event: impl Fn(&dyn NodeObserver)) {
        let observers: Vec<Arc<dyn NodeObserver>> = self.observers.read().clone();
        for observer in &observers {
            event(observer.as_ref());
        }
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new(RegistryCapabilities::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct Events {
        added: parking_lot::Mutex<Vec<String>>,
        removed: parking_lot::Mutex<Vec<String>>,
    }

    impl NodeObserver for Events {
        fn node_added(&self, path: &str) {
            self.added.lock().push(path.to_string());
        }

        fn node_removed(&self, path: &str) {
            self.removed.lock().push(path.to_string());
        }
    }

    fn add(registry: &NodeRegistry, path: &str, kind: NodeKind) -> AddOutcome {
        registry.add_node(path.to_string(), kind, Token::generate(), None)
    }

    #[test]
    fn generic_insert_and_remove_track_count_and_change_token() {
        let registry = NodeRegistry::default();
        assert_eq!(add(&registry, "/LDAPv3/a", NodeKind::Generic), AddOutcome::Inserted);
        assert_eq!(add(&registry, "/LDAPv3/b", NodeKind::Generic), AddOutcome::Inserted);
        assert_eq!(registry.node_count(), 2);
        assert_eq!(registry.change_token(), 2);

        assert!(registry.remove_node("/LDAPv3/a"));
        assert_eq!(registry.node_count(), 1);
        assert_eq!(registry.change_token(), 3);
        assert!(!registry.remove_node("/LDAPv3/a"));
        assert_eq!(registry.change_token(), 3);
    }

    #[test]
    fn duplicate_generic_path_is_rejected_without_event() {
        let registry = NodeRegistry::default();
        let events = Arc::new(Events::default());
        registry.add_observer(events.clone());

        let first = Token::generate();
        registry.add_node("/NIS/domain".into(), NodeKind::Generic, first, None);
        let outcome = registry.add_node("/NIS/domain".into(), NodeKind::Generic, Token::generate(), None);

        assert_eq!(outcome, AddOutcome::DuplicateRejected);
        assert_eq!(*events.added.lock(), vec!["/NIS/domain".to_string()]);
        assert_eq!(registry.node_count(), 1);
        assert_eq!(registry.node("/NIS/domain").unwrap().owner, first);
    }

    #[test]
    fn second_singleton_claim_is_rejected_and_first_kept() {
        let registry = NodeRegistry::default();
        let first = Token::generate();
        registry.add_node("/Local/Default".into(), NodeKind::Local, first, None);
        let outcome = registry.add_node("/Local/Other".into(), NodeKind::Local, Token::generate(), None);

        assert_eq!(outcome, AddOutcome::SingletonOccupied);
        let kept = registry.singleton(NodeKind::Local).unwrap();
        assert_eq!(kept.path, "/Local/Default");
        assert_eq!(kept.owner, first);
        assert_eq!(registry.node_count(), 0);
    }

    #[test]
    fn singleton_kinds_are_never_present() {
        let registry = NodeRegistry::default();
        add(&registry, "/Search", NodeKind::AuthenticationSearch);
        assert!(!registry.is_present("/Search", NodeKind::AuthenticationSearch));

        add(&registry, "/LDAPv3/a", NodeKind::Generic);
        assert!(registry.is_present("/LDAPv3/a", NodeKind::Generic));
        assert!(!registry.is_present("/LDAPv3/a", NodeKind::LocalHosted));
    }

    #[test]
    fn singleton_nodes_cannot_be_removed() {
        let registry = NodeRegistry::default();
        add(&registry, "/Configure", NodeKind::Configure);
        assert!(!registry.remove_node("/Configure"));
        assert!(registry.singleton(NodeKind::Configure).is_some());
    }

    #[test]
    fn hosted_removals_are_silent() {
        let registry = NodeRegistry::default();
        let events = Arc::new(Events::default());
        registry.add_observer(events.clone());

        add(&registry, "/Local/Default", NodeKind::LocalHosted);
        add(&registry, "/LDAPv3/dflt", NodeKind::DefaultNetworkHosted);
        assert!(registry.remove_node("/Local/Default"));
        assert!(registry.remove_node("/LDAPv3/dflt"));

        assert!(events.added.lock().is_empty());
        assert!(events.removed.lock().is_empty());
        assert_eq!(registry.node_count(), 0);
        assert_eq!(registry.change_token(), 0);
    }

    #[test]
    fn same_path_may_live_in_separate_collections() {
        let registry = NodeRegistry::default();
        assert_eq!(add(&registry, "/Local/Default", NodeKind::Generic), AddOutcome::Inserted);
        assert_eq!(
            add(&registry, "/Local/Default", NodeKind::LocalHosted),
            AddOutcome::Inserted
        );
    }

    #[tokio::test]
    async fn starts_with_returns_matches_in_path_order() {
        let registry = NodeRegistry::default();
        for path in ["/B", "/AB", "/A"] {
            add(&registry, path, NodeKind::Generic);
        }
        let mut sink = NodeResults::with_capacity(10);
        let count = registry
            .lookup("/A", MatchMode::StartsWith, &mut sink)
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(sink.paths(), vec!["/A", "/AB"]);
    }

    #[tokio::test]
    async fn exact_match_round_trip() {
        let registry = NodeRegistry::default();
        add(&registry, "/LDAPv3/ldap.example.com", NodeKind::Generic);

        let mut sink = NodeResults::with_capacity(1);
        registry
            .lookup("/LDAPv3/ldap.example.com", MatchMode::ExactMatch, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.paths(), vec!["/LDAPv3/ldap.example.com"]);

        registry.remove_node("/LDAPv3/ldap.example.com");
        let err = registry
            .lookup("/LDAPv3/ldap.example.com", MatchMode::ExactMatch, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DirError::UnknownNodeName { .. }));
    }

    #[tokio::test]
    async fn case_insensitive_lookup_merges_collections_in_order() {
        let registry = NodeRegistry::default();
        add(&registry, "/LDAPv3/b", NodeKind::Generic);
        add(&registry, "/ldapv3/a", NodeKind::DefaultNetworkHosted);
        add(&registry, "/LDAPv3/b", NodeKind::LocalHosted);

        let mut sink = NodeResults::with_capacity(10);
        registry
            .lookup("/LDAPV3/", MatchMode::StartsWithIgnoreCase, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.paths(), vec!["/LDAPv3/b", "/ldapv3/a"]);
        assert_eq!(sink.entries()[0].kind, NodeKind::Generic);
    }

    #[tokio::test]
    async fn undersized_sink_reports_buffer_too_small_and_stays_empty() {
        let registry = NodeRegistry::default();
        for path in ["/A", "/AB", "/AC"] {
            add(&registry, path, NodeKind::Generic);
        }
        let mut sink = NodeResults::with_capacity(2);
        let err = registry
            .lookup("/A", MatchMode::StartsWith, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirError::BufferTooSmall {
                needed: 3,
                capacity: 2
            }
        ));
        assert!(sink.is_empty());

        let mut bigger = NodeResults::with_capacity(3);
        registry
            .lookup("/A", MatchMode::StartsWith, &mut bigger)
            .await
            .unwrap();
        assert_eq!(bigger.len(), 3);
    }

    #[tokio::test]
    async fn empty_pattern_is_rejected() {
        let registry = NodeRegistry::default();
        let mut sink = NodeResults::with_capacity(1);
        let err = registry
            .lookup("", MatchMode::Contains, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DirError::NullOrEmptyParameter));
    }

    #[tokio::test]
    async fn populated_selector_returns_immediately() {
        let registry = NodeRegistry::default();
        add(&registry, "/BSD/local", NodeKind::Bsd);

        let mut sink = NodeResults::with_capacity(1);
        registry
            .lookup("", MatchMode::BsdNode, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.paths(), vec!["/BSD/local"]);
        assert_eq!(sink.entries()[0].kind, NodeKind::Bsd);
    }

    #[tokio::test]
    async fn disabled_backend_fails_fast() {
        let registry = NodeRegistry::new(RegistryCapabilities {
            search: false,
            ..RegistryCapabilities::default()
        });
        let mut sink = NodeResults::with_capacity(1);
        for mode in [
            MatchMode::AuthenticationSearchNode,
            MatchMode::ContactsSearchNode,
            MatchMode::NetworkSearchNode,
        ] {
            let err = registry.lookup("", mode, &mut sink).await.unwrap_err();
            assert!(matches!(err, DirError::UnknownNodeName { .. }));
        }
    }

    #[tokio::test]
    async fn network_search_fails_fast_without_local_backend() {
        let registry = NodeRegistry::new(RegistryCapabilities {
            local: false,
            ..RegistryCapabilities::default()
        });
        add(&registry, "/Search/Network", NodeKind::NetworkSearch);
        let mut sink = NodeResults::with_capacity(1);
        let err = registry
            .lookup("", MatchMode::NetworkSearchNode, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, DirError::UnknownNodeName { .. }));
    }

    #[tokio::test]
    async fn aggregate_selectors_return_whole_collection() {
        let registry = NodeRegistry::default();
        add(&registry, "/LDAPv3/b", NodeKind::DefaultNetworkHosted);
        add(&registry, "/LDAPv3/a", NodeKind::DefaultNetworkHosted);
        add(&registry, "/Local/Default", NodeKind::LocalHosted);

        let mut sink = NodeResults::with_capacity(5);
        registry
            .lookup("ignored", MatchMode::DefaultNetworkNodes, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.paths(), vec!["/LDAPv3/a", "/LDAPv3/b"]);

        registry
            .lookup("ignored", MatchMode::LocalHostedNodes, &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.paths(), vec!["/Local/Default"]);
    }

    #[test]
    fn remove_owned_targets_the_owners_collection() {
        let registry = NodeRegistry::default();
        let events = Arc::new(Events::default());
        registry.add_observer(events.clone());
        let hosted_owner = Token::generate();
        let generic_owner = Token::generate();
        registry.add_node("/X".into(), NodeKind::LocalHosted, hosted_owner, None);
        registry.add_node("/X".into(), NodeKind::Generic, generic_owner, None);
        let token_before = registry.change_token();

        registry.remove_owned("/X", hosted_owner).unwrap();
        assert!(!registry.is_present("/X", NodeKind::LocalHosted));
        assert!(registry.is_present("/X", NodeKind::Generic));
        assert_eq!(registry.change_token(), token_before);
        assert!(events.removed.lock().is_empty());

        registry.remove_owned("/X", generic_owner).unwrap();
        assert_eq!(registry.node_count(), 0);
        assert_eq!(registry.change_token(), token_before + 1);
        assert_eq!(*events.removed.lock(), vec!["/X".to_string()]);
    }

    #[test]
    fn remove_owned_rejects_strangers_and_missing_paths() {
        let registry = NodeRegistry::default();
        let owner = Token::generate();
        registry.add_node("/NIS/domain".into(), NodeKind::Generic, owner, None);
        registry.add_node("/Cache".into(), NodeKind::Cache, owner, None);

        assert!(matches!(
            registry.remove_owned("/NIS/domain", Token::generate()),
            Err(DirError::InvalidToken)
        ));
        assert!(registry.is_present("/NIS/domain", NodeKind::Generic));
        assert!(matches!(
            registry.remove_owned("/NIS/other", owner),
            Err(DirError::NodeNotRegistered { .. })
        ));
        assert!(matches!(
            registry.remove_owned("/Cache", owner),
            Err(DirError::NodeNotRegistered { .. })
        ));
        assert!(registry.singleton(NodeKind::Cache).is_some());
    }

    #[test]
    fn owner_of_reads_the_kinds_own_collection_or_slot() {
        let registry = NodeRegistry::default();
        let local = Token::generate();
        let hosted = Token::generate();
        registry.add_node("/Local/Default".into(), NodeKind::Local, local, None);
        registry.add_node("/BSD/local".into(), NodeKind::LocalHosted, hosted, None);

        assert_eq!(registry.owner_of("/Local/Other", NodeKind::Local), Some(local));
        assert_eq!(registry.owner_of("/BSD/local", NodeKind::LocalHosted), Some(hosted));
        assert_eq!(registry.owner_of("/BSD/local", NodeKind::Generic), None);
        assert_eq!(registry.owner_of("/BSD", NodeKind::Bsd), None);
    }

    #[test]
    fn teardown_sweeps_everything() {
        let registry = NodeRegistry::default();
        add(&registry, "/Local/Default", NodeKind::Local);
        add(&registry, "/A", NodeKind::Generic);
        add(&registry, "/B", NodeKind::LocalHosted);
        registry.teardown();

        assert!(registry.singleton(NodeKind::Local).is_none());
        assert!(registry.generic_paths().is_empty());
        assert!(registry.node("/B").is_none());
        assert_eq!(registry.node_count(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Remove(String),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let path = "/[A-C]{1,3}";
        prop_oneof![
            path.prop_map(Op::Add),
            path.prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn generic_order_and_count_survive_any_op_sequence(
            ops in proptest::collection::vec(op_strategy(), 0..64)
        ) {
            let registry = NodeRegistry::default();
            let mut model = BTreeSet::new();
            for op in ops {
                match op {
                    Op::Add(path) => {
                        let outcome = registry.add_node(path.clone(), NodeKind::Generic, Token::nil(), None);
                        let inserted = model.insert(path);
                        prop_assert_eq!(outcome == AddOutcome::Inserted, inserted);
                    }
                    Op::Remove(path) => {
                        prop_assert_eq!(registry.remove_node(&path), model.remove(&path));
                    }
                }
            }
            let paths = registry.generic_paths();
            prop_assert!(paths.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(paths, model.iter().cloned().collect::<Vec<_>>());
            prop_assert_eq!(registry.node_count(), model.len());
        }
    }
}
