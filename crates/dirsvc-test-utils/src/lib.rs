// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for dirsvc integration tests.
//!
//! # Components
//!
//! - [`MockFactory`] / [`MockPlugin`] - scripted plugin with construction and
//!   initialize counters
//! - [`RecordingObserver`] - captures node added/removed events
//! - [`TestHarness`] - a fully wired service with fast retry settings

pub mod harness;
pub mod mock_plugin;
pub mod observer;

pub use harness::TestHarness;
pub use mock_plugin::{InitScript, MockFactory, MockPlugin};
pub use observer::{NodeEvent, RecordingObserver};
