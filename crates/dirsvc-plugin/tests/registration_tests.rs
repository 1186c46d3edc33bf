// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability-checked node registration.

use dirsvc_core::{DirError, LoadTier, MatchMode, NodeKind, Token};
use dirsvc_plugin::PluginManifest;
use dirsvc_registry::NodeResults;
use dirsvc_test_utils::{NodeEvent, TestHarness};

fn segments(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn register_plugin(harness: &TestHarness, name: &str) -> Token {
    let manifest = PluginManifest {
        name: name.to_string(),
        version: "1.0.0".to_string(),
        description: String::new(),
        lazy_load: false,
        min_service_version: None,
        nodes: vec![],
    };
    harness
        .service
        .lifecycle()
        .register(&manifest, LoadTier::Static, None)
        .unwrap()
}

#[tokio::test]
async fn unknown_token_is_rejected_unless_proxy() {
    let harness = TestHarness::new();
    let registrar = harness.service.registrar();
    let stranger = Token::generate();

    let err = registrar
        .register_node(stranger, segments(&["LDAPv3", "x"]), NodeKind::Generic)
        .unwrap_err();
    assert!(matches!(err, DirError::InvalidToken));
    assert!(harness.service.registry().node("/LDAPv3/x").is_none());

    registrar
        .register_proxy_node(stranger, segments(&["LDAPv3", "x"]), NodeKind::Generic)
        .unwrap();
    assert_eq!(
        harness.service.registry().node("/LDAPv3/x").unwrap().owner,
        stranger
    );
}

#[tokio::test]
async fn empty_path_is_rejected() {
    let harness = TestHarness::new();
    let token = register_plugin(&harness, "NIS");
    let registrar = harness.service.registrar();

    assert!(matches!(
        registrar.register_node(token, vec![], NodeKind::Generic),
        Err(DirError::NullOrEmptyParameter)
    ));
    assert!(matches!(
        registrar.register_node(token, segments(&["NIS", ""]), NodeKind::Generic),
        Err(DirError::NullOrEmptyParameter)
    ));
    assert_eq!(harness.service.registry().node_count(), 0);
}

#[tokio::test]
async fn duplicates_report_duplicate_node() {
    let harness = TestHarness::new();
    let token = register_plugin(&harness, "NIS");
    let other = register_plugin(&harness, "Local");
    let registrar = harness.service.registrar();

    registrar
        .register_node(token, segments(&["NIS", "example"]), NodeKind::Generic)
        .unwrap();
    let err = registrar
        .register_node(token, segments(&["NIS", "example"]), NodeKind::Generic)
        .unwrap_err();
    assert!(matches!(err, DirError::DuplicateNode { path } if path == "/NIS/example"));
    assert_eq!(harness.observer.added(), vec!["/NIS/example".to_string()]);

    registrar
        .register_node(other, segments(&["Local", "Default"]), NodeKind::Local)
        .unwrap();
    let err = registrar
        .register_node(token, segments(&["Local", "Other"]), NodeKind::Local)
        .unwrap_err();
    assert!(matches!(err, DirError::DuplicateNode { .. }));
    let slot = harness.service.registry().singleton(NodeKind::Local).unwrap();
    assert_eq!(slot.path, "/Local/Default");
    assert_eq!(slot.owner, other);
}

#[tokio::test]
async fn register_then_lookup_then_unregister() {
    let harness = TestHarness::new();
    let token = register_plugin(&harness, "LDAPv3");
    let registrar = harness.service.registrar();
    let path = segments(&["LDAPv3", "ldap.example.com"]);

    registrar
        .register_node(token, path.clone(), NodeKind::Generic)
        .unwrap();
    let mut sink = NodeResults::with_capacity(4);
    let found = harness
        .service
        .lookup("/LDAPv3/ldap.example.com", MatchMode::ExactMatch, &mut sink)
        .await
        .unwrap();
    assert_eq!(found, 1);
    assert_eq!(sink.entries()[0].owner, token);

    registrar.unregister_node(token, path).unwrap();
    let mut sink = NodeResults::with_capacity(4);
    let err = harness
        .service
        .lookup("/LDAPv3/ldap.example.com", MatchMode::ExactMatch, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, DirError::UnknownNodeName { .. }));
    assert_eq!(
        harness.observer.events(),
        vec![
            NodeEvent::Added("/LDAPv3/ldap.example.com".to_string()),
            NodeEvent::Removed("/LDAPv3/ldap.example.com".to_string()),
        ]
    );
}

#[tokio::test]
async fn only_the_owner_may_unregister() {
    let harness = TestHarness::new();
    let owner = register_plugin(&harness, "NIS");
    let intruder = register_plugin(&harness, "LDAPv3");
    let registrar = harness.service.registrar();

    registrar
        .register_node(owner, segments(&["NIS", "example"]), NodeKind::Generic)
        .unwrap();
    assert!(matches!(
        registrar.unregister_node(intruder, segments(&["NIS", "example"])),
        Err(DirError::InvalidToken)
    ));
    assert!(matches!(
        registrar.unregister_node(Token::generate(), segments(&["NIS", "example"])),
        Err(DirError::InvalidToken)
    ));
    assert_eq!(harness.service.registry().node_count(), 1);
}

#[tokio::test]
async fn unregistering_missing_node_reports_not_registered() {
    let harness = TestHarness::new();
    let token = register_plugin(&harness, "NIS");
    let err = harness
        .service
        .registrar()
        .unregister_node(token, segments(&["NIS", "nowhere"]))
        .unwrap_err();
    assert!(matches!(err, DirError::NodeNotRegistered { path } if path == "/NIS/nowhere"));
}

#[tokio::test]
async fn hosted_nodes_are_registered_silently() {
    let harness = TestHarness::new();
    let token = register_plugin(&harness, "BSD");
    let registrar = harness.service.registrar();

    registrar
        .register_node(token, segments(&["BSD", "local"]), NodeKind::LocalHosted)
        .unwrap();
    registrar
        .register_node(token, segments(&["BSD", "net"]), NodeKind::DefaultNetworkHosted)
        .unwrap();
    assert!(harness.observer.events().is_empty());
    assert_eq!(harness.service.registry().node_count(), 0);

    let mut sink = NodeResults::with_capacity(4);
    harness
        .service
        .lookup("", MatchMode::LocalHostedNodes, &mut sink)
        .await
        .unwrap();
    assert_eq!(sink.paths(), vec!["/BSD/local"]);

    registrar
        .unregister_node(token, segments(&["BSD", "local"]))
        .unwrap();
    assert!(harness.observer.events().is_empty());
}

#[tokio::test]
async fn hosted_owner_unregisters_beneath_a_generic_node_at_the_same_path() {
    let harness = TestHarness::new();
    let hosted = register_plugin(&harness, "BSD");
    let generic = register_plugin(&harness, "NIS");
    let registrar = harness.service.registrar();
    let registry = harness.service.registry();

    registrar
        .register_node(hosted, segments(&["X"]), NodeKind::LocalHosted)
        .unwrap();
    registrar
        .register_node(generic, segments(&["X"]), NodeKind::Generic)
        .unwrap();
    harness.observer.clear();

    registrar.unregister_node(hosted, segments(&["X"])).unwrap();
    assert!(!registry.is_present("/X", NodeKind::LocalHosted));
    assert!(registry.is_present("/X", NodeKind::Generic));
    assert_eq!(registry.node_count(), 1);
    assert!(harness.observer.events().is_empty());

    assert!(matches!(
        registrar.unregister_node(hosted, segments(&["X"])),
        Err(DirError::InvalidToken)
    ));
    registrar.unregister_node(generic, segments(&["X"])).unwrap();
    assert_eq!(harness.observer.removed(), vec!["/X".to_string()]);
    assert!(matches!(
        registrar.unregister_node(generic, segments(&["X"])),
        Err(DirError::NodeNotRegistered { .. })
    ));
}
