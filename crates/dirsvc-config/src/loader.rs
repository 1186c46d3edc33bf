// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dirsvc.toml` > `~/.config/dirsvc/dirsvc.toml` > `/etc/dirsvc/dirsvc.toml`
//! with environment variable overrides via `DIRSVC_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DirsvcConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dirsvc/dirsvc.toml` (system-wide)
/// 3. `~/.config/dirsvc/dirsvc.toml` (user XDG config)
/// 4. `./dirsvc.toml` (local directory)
/// 5. `DIRSVC_*` environment variables
pub fn load_config() -> Result<DirsvcConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<DirsvcConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DirsvcConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DirsvcConfig, figment::Error> {
    tracing::debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(DirsvcConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DirsvcConfig::default()))
        .merge(Toml::file("/etc/dirsvc/dirsvc.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dirsvc/dirsvc.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dirsvc.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that underscores inside
/// key names survive: `DIRSVC_LAUNCHER_RETRY_DELAY_MS` maps to
/// `launcher.retry_delay_ms`, not `launcher.retry.delay.ms`.
fn env_provider() -> Env {
    Env::prefixed("DIRSVC_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("service_", "service.", 1)
            .replacen("capabilities_", "capabilities.", 1)
            .replacen("registry_", "registry.", 1)
            .replacen("launcher_", "launcher.", 1)
            .replacen("plugins_", "plugins.", 1);
        mapped.into()
    })
}
