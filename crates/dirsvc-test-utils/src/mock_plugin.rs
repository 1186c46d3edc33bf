// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted plugin for lifecycle tests.
//!
//! `MockFactory` counts constructions and keeps every instance it built so
//! tests can inspect initialize calls, state notifications and resources.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use dirsvc_core::{
    DirError, DirectoryPlugin, NodeKind, PluginRequest, PluginState, ResourceKind, Token,
};
use dirsvc_plugin::{NodeDeclaration, NodeRegistrar, PluginFactory, PluginManifest};
use parking_lot::Mutex;

/// How `initialize` behaves across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitScript {
    Succeed,
    /// Fail this many calls, then succeed.
    FailTimes(u32),
    AlwaysFail,
}

#[derive(Debug, Clone)]
struct MockBehaviour {
    name: String,
    nodes: Vec<NodeDeclaration>,
    init: InitScript,
    init_delay: Duration,
    fail_construction: bool,
    reject_validation: bool,
    resources: Vec<ResourceKind>,
}

/// Factory for [`MockPlugin`]s.
pub struct MockFactory {
    behaviour: MockBehaviour,
    constructions: AtomicUsize,
    instances: Mutex<Vec<Arc<MockPlugin>>>,
}

impl MockFactory {
    pub fn new(name: &str) -> Self {
        Self {
            behaviour: MockBehaviour {
                name: name.to_string(),
                nodes: Vec::new(),
                init: InitScript::Succeed,
                init_delay: Duration::ZERO,
                fail_construction: false,
                reject_validation: false,
                resources: Vec::new(),
            },
            constructions: AtomicUsize::new(0),
            instances: Mutex::new(Vec::new()),
        }
    }

    /// Node the plugin registers when it initializes.
    pub fn with_node(mut self, path: &str, kind: NodeKind) -> Self {
        self.behaviour.nodes.push(NodeDeclaration::new(path, kind));
        self
    }

    pub fn with_init(mut self, script: InitScript) -> Self {
        self.behaviour.init = script;
        self
    }

    /// Sleep inside every `initialize` call.
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.behaviour.init_delay = delay;
        self
    }

    pub fn with_resource(mut self, kind: ResourceKind) -> Self {
        self.behaviour.resources.push(kind);
        self
    }

    pub fn failing_construction(mut self) -> Self {
        self.behaviour.fail_construction = true;
        self
    }

    pub fn rejecting_validation(mut self) -> Self {
        self.behaviour.reject_validation = true;
        self
    }

    /// Descriptor matching this factory's plugin.
    pub fn manifest(&self, lazy_load: bool) -> PluginManifest {
        PluginManifest {
            name: self.behaviour.name.clone(),
            version: "1.0.0".to_string(),
            description: format!("mock plugin {}", self.behaviour.name),
            lazy_load,
            min_service_version: None,
            nodes: self.behaviour.nodes.clone(),
        }
    }

    /// Number of `create` calls, including failed ones.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    pub fn instances(&self) -> Vec<Arc<MockPlugin>> {
        self.instances.lock().clone()
    }

    pub fn last(&self) -> Option<Arc<MockPlugin>> {
        self.instances.lock().last().cloned()
    }
}

impl PluginFactory for MockFactory {
    fn create(&self, registrar: Arc<NodeRegistrar>) -> Result<Arc<dyn DirectoryPlugin>, DirError> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        if self.behaviour.fail_construction {
            tracing::debug!(plugin = %self.behaviour.name, "scripted construction failure");
            return Err(DirError::plugin(&self.behaviour.name, "scripted construction failure"));
        }
        let plugin = Arc::new(MockPlugin {
            behaviour: self.behaviour.clone(),
            registrar,
            token: OnceLock::new(),
            validated_version: Mutex::new(None),
            init_calls: AtomicU32::new(0),
            states: Mutex::new(Vec::new()),
            resources: Mutex::new(Vec::new()),
        });
        self.instances.lock().push(Arc::clone(&plugin));
        Ok(plugin)
    }
}

/// A plugin whose behaviour is scripted by its [`MockFactory`].
pub struct MockPlugin {
    behaviour: MockBehaviour,
    registrar: Arc<NodeRegistrar>,
    token: OnceLock<Token>,
    validated_version: Mutex<Option<String>>,
    init_calls: AtomicU32,
    states: Mutex<Vec<PluginState>>,
    resources: Mutex<Vec<ResourceKind>>,
}

impl MockPlugin {
    pub fn token(&self) -> Option<Token> {
        self.token.get().copied()
    }

    pub fn validated_version(&self) -> Option<String> {
        self.validated_version.lock().clone()
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Every state passed to `set_plugin_state`, in order.
    pub fn states(&self) -> Vec<PluginState> {
        self.states.lock().clone()
    }

    pub fn received_resources(&self) -> Vec<ResourceKind> {
        self.resources.lock().clone()
    }

    fn register_nodes(&self, token: Token) -> Result<(), DirError> {
        for node in &self.behaviour.nodes {
            match self
                .registrar
                .register_node(token, node.segments(), node.kind)
            {
                Ok(()) => {}
                Err(DirError::DuplicateNode { path })
                    if self.registrar.registry().owner_of(&path, node.kind) == Some(token) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryPlugin for MockPlugin {
    fn name(&self) -> &str {
        &self.behaviour.name
    }

    async fn validate(&self, version: &str, signature: Token) -> Result<(), DirError> {
        if self.behaviour.reject_validation {
            return Err(DirError::plugin(&self.behaviour.name, "scripted validation failure"));
        }
        if self.token.set(signature).is_err() && self.token.get() != Some(&signature) {
            return Err(DirError::InvalidToken);
        }
        *self.validated_version.lock() = Some(version.to_string());
        Ok(())
    }

    async fn initialize(&self) -> Result<(), DirError> {
        let call = self.init_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.behaviour.init_delay.is_zero() {
            tokio::time::sleep(self.behaviour.init_delay).await;
        }
        let fail = match self.behaviour.init {
            InitScript::Succeed => false,
            InitScript::FailTimes(n) => call <= n,
            InitScript::AlwaysFail => true,
        };
        if fail {
            tracing::debug!(
                plugin = %self.behaviour.name,
                attempt = call,
                "scripted initialize failure"
            );
            return Err(DirError::plugin(
                &self.behaviour.name,
                format!("scripted failure on attempt {call}"),
            ));
        }
        let token = self
            .token()
            .ok_or_else(|| DirError::plugin(&self.behaviour.name, "not validated"))?;
        self.register_nodes(token)
    }

    async fn set_plugin_state(&self, state: PluginState) -> Result<(), DirError> {
        self.states.lock().push(state);
        Ok(())
    }

    async fn process_request(&self, request: PluginRequest) -> Result<(), DirError> {
        match request {
            PluginRequest::ProvideResource(resource) => self.resources.lock().push(resource.kind()),
        }
        Ok(())
    }

    fn required_resources(&self) -> Vec<ResourceKind> {
        self.behaviour.resources.clone()
    }
}
