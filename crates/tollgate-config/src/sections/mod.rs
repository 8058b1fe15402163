// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for the Tollgate engine.

pub mod expansion;
pub mod logging;
pub mod policy;
pub mod scan;

pub use expansion::{ExpansionConfig, ExpansionConfigLayer, MappingEntry};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use policy::{PolicyConfig, PolicyConfigLayer};
pub use scan::{ScanConfig, ScanConfigLayer};
