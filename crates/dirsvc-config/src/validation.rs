// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::DirsvcConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every validation error rather than failing fast.
pub fn validate_config(config: &DirsvcConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.to_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "service.log_level `{}` must be one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.launcher.max_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: "launcher.max_attempts must be at least 1".to_string(),
        });
    }

    if let Some(dir) = &config.plugin_dir
        && dir.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "plugin_dir must not be empty when set".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (i, policy) in config.policy.iter().enumerate() {
        if policy.plugin.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("policy[{i}].plugin must not be empty"),
            });
        }
        if policy.node.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("policy[{i}].node must not be empty"),
            });
        }
        if !seen.insert((&policy.plugin, &policy.node)) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "duplicate policy for plugin `{}` on node `{}`",
                    policy.plugin, policy.node
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
