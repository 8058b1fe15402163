// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{ExpansionConfigLayer, LoggingConfigLayer, PolicyConfigLayer, ScanConfigLayer};

/// Engine configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbacConfigLayer {
	#[serde(default)]
	pub scan: Option<ScanConfigLayer>,
	#[serde(default)]
	pub policy: Option<PolicyConfigLayer>,
	#[serde(default)]
	pub expansion: Option<ExpansionConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl AbacConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: AbacConfigLayer) {
		merge_option(&mut self.scan, other.scan, ScanConfigLayer::merge);
		merge_option(&mut self.policy, other.policy, PolicyConfigLayer::merge);
		merge_option(
			&mut self.expansion,
			other.expansion,
			ExpansionConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
