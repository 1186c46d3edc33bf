// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observer that records node events for assertion.

use dirsvc_core::NodeObserver;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    Added(String),
    Removed(String),
}

/// Captures every node added/removed notification in delivery order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<NodeEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<NodeEvent> {
        self.events.lock().clone()
    }

    pub fn added(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                NodeEvent::Added(path) => Some(path.clone()),
                NodeEvent::Removed(_) => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                NodeEvent::Removed(path) => Some(path.clone()),
                NodeEvent::Added(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl NodeObserver for RecordingObserver {
    fn node_added(&self, path: &str) {
        self.events.lock().push(NodeEvent::Added(path.to_string()));
    }

    fn node_removed(&self, path: &str) {
        self.events.lock().push(NodeEvent::Removed(path.to_string()));
    }
}
