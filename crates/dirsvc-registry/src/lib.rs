// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory node registry.
//!
//! The [`NodeRegistry`] indexes every registered directory node by path. Seven
//! node kinds live in one-shot singleton slots; generic, locally-hosted and
//! default-network nodes live in ordered collections. Lookups either match a
//! pattern against paths or select a designated slot, waiting for it to be
//! populated when it is still empty.

pub mod node;
pub mod registry;
pub mod results;

pub use node::{AddOutcome, DirectoryNode, NodeEntry};
pub use registry::{NodeRegistry, RegistryCapabilities};
pub use results::NodeResults;
