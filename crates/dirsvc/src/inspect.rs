// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dirsvc nodes` and `dirsvc plugins` command implementations.
//!
//! Both boot a service in-process and print what it ended up with, as an
//! aligned table or as JSON for scripting.

use std::str::FromStr;

use dirsvc_config::DirsvcConfig;
use dirsvc_core::{DirError, MatchMode};
use dirsvc_plugin::PluginSnapshot;
use dirsvc_registry::{NodeEntry, NodeResults};
use serde::Serialize;

use crate::serve::start_service;

/// One line of `dirsvc nodes` output.
#[derive(Debug, Serialize)]
pub struct NodeRow {
    pub path: String,
    pub kind: String,
    pub owner: String,
}

impl From<&NodeEntry> for NodeRow {
    fn from(entry: &NodeEntry) -> Self {
        Self {
            path: entry.path.clone(),
            kind: entry.kind.to_string(),
            owner: entry.owner.to_string(),
        }
    }
}

/// One line of `dirsvc plugins` output.
#[derive(Debug, Serialize)]
pub struct PluginRow {
    pub name: String,
    pub version: String,
    pub tier: String,
    pub state: String,
    pub loaded: bool,
    pub lazy: bool,
    pub data_stamp: u64,
}

impl From<&PluginSnapshot> for PluginRow {
    fn from(snapshot: &PluginSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            version: snapshot.version.clone(),
            tier: snapshot.tier.to_string(),
            state: snapshot.state.to_string(),
            loaded: snapshot.is_loaded(),
            lazy: snapshot.lazy,
            data_stamp: snapshot.valid_data_stamp,
        }
    }
}

pub fn parse_mode(mode: &str) -> Result<MatchMode, DirError> {
    MatchMode::from_str(mode).map_err(|_| DirError::Config(format!("unknown match mode '{mode}'")))
}

/// Run the `dirsvc nodes` command.
pub async fn run_nodes(
    config: &DirsvcConfig,
    pattern: &str,
    mode: &str,
    capacity: usize,
    json: bool,
) -> Result<(), DirError> {
    let mode = parse_mode(mode)?;
    let service = start_service(config).await?;

    let mut sink = NodeResults::with_capacity(capacity);
    service.lookup(pattern, mode, &mut sink).await?;
    let rows: Vec<NodeRow> = sink.entries().iter().map(NodeRow::from).collect();

    if json {
        print_json(&rows)?;
    } else {
        for row in &rows {
            println!("{:<40} {:<22} {}", row.path, row.kind, row.owner);
        }
    }
    Ok(())
}

/// Run the `dirsvc plugins` command.
pub async fn run_plugins(config: &DirsvcConfig, json: bool) -> Result<(), DirError> {
    let service = start_service(config).await?;
    let rows: Vec<PluginRow> = service.plugins().iter().map(PluginRow::from).collect();

    if json {
        print_json(&rows)?;
    } else {
        println!(
            "{:<16} {:<10} {:<18} {:<28} LOADED",
            "NAME", "VERSION", "TIER", "STATE"
        );
        for row in &rows {
            println!(
                "{:<16} {:<10} {:<18} {:<28} {}",
                row.name,
                row.version,
                row.tier,
                row.state,
                if row.loaded { "yes" } else { "no" }
            );
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), DirError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| DirError::Internal(format!("failed to render JSON: {e}")))?;
    println!("{rendered}");
    Ok(())
}
