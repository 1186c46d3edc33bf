// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record-type service policy.

use std::collections::{HashMap, HashSet};

use dirsvc_config::model::PolicyConfig;

#[derive(Debug, Default, Clone)]
struct RecordTypeRule {
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl RecordTypeRule {
    fn permits(&self, record_type: &str) -> bool {
        !self.deny.contains(record_type)
            && (self.allow.is_empty() || self.allow.contains(record_type))
    }
}

/// Allow/deny lists keyed by plugin name, then node path.
///
/// A query is permitted unless a rule exists for the pair and one of the
/// requested record types is denied or missing from a non-empty allow list.
#[derive(Debug, Default, Clone)]
pub struct ServicePolicy {
    rules: HashMap<String, HashMap<String, RecordTypeRule>>,
}

impl ServicePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(entries: &[PolicyConfig]) -> Self {
        let mut policy = Self::new();
        for entry in entries {
            policy.add_rule(&entry.plugin, &entry.node, &entry.allow, &entry.deny);
        }
        policy
    }

    /// Add or replace the rule for one plugin/node pair.
    pub fn add_rule(&mut self, plugin: &str, node: &str, allow: &[String], deny: &[String]) {
        let rule = RecordTypeRule {
            allow: allow.iter().cloned().collect(),
            deny: deny.iter().cloned().collect(),
        };
        self.rules
            .entry(plugin.to_string())
            .or_default()
            .insert(node.to_string(), rule);
    }

    pub fn is_ok_to_service_query(&self, plugin: &str, node: &str, record_types: &[&str]) -> bool {
        match self.rules.get(plugin).and_then(|nodes| nodes.get(node)) {
            Some(rule) => record_types.iter().all(|t| rule.permits(t)),
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
