// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tro-tab: worker-tab lifecycle and transport for the run orchestrator.

pub mod controller;
pub mod host;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use controller::{TabCommand, TabConfig, TabController, TabError, TabInfo, TabResponse};
pub use host::{HostTabController, HostTransport};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTab, FakeTabController, TabCall};
