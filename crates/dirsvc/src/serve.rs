// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dirsvc serve` and the shared boot sequence.

use std::path::Path;

use dirsvc_config::DirsvcConfig;
use dirsvc_core::DirError;
use dirsvc_plugin::{await_launches, DeclarativeLoader, DirectoryService};
use tracing::{info, warn};

/// Build the service, register built-in and on-disk plugins and wait for
/// every launcher to finish.
pub async fn start_service(config: &DirsvcConfig) -> Result<DirectoryService, DirError> {
    let service = DirectoryService::from_config(config);
    let builtins = service.register_builtins()?;

    let mut launches = service.boot().await;
    if let Some(dir) = &config.plugin_dir {
        match service.discover_dir(Path::new(dir), &DeclarativeLoader).await {
            Ok(eager) => launches.extend(eager),
            Err(e) => warn!(dir = %dir, error = %e, "plugin directory not scanned"),
        }
    }

    let total = launches.len();
    let succeeded = await_launches(launches).await;
    info!(
        builtins,
        plugins = service.table().count(),
        launched = total,
        initialized = succeeded,
        active = service.table().active_count(),
        "directory service booted"
    );
    Ok(service)
}

/// Run the `dirsvc serve` command until Ctrl+C.
pub async fn run_serve(config: DirsvcConfig) -> Result<(), DirError> {
    info!(name = %config.service.name, "starting directory service");
    let service = start_service(&config).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| DirError::Internal(format!("signal handler: {e}")))?;

    info!("shutdown requested");
    service.shutdown();
    info!("dirsvc serve shutdown complete");
    Ok(())
}
