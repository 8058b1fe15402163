// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `[logging]`: filter directives and output format for decision logs.

use serde::{Deserialize, Serialize};

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfigLayer {
	/// `EnvFilter` directives such as `warn,tollgate_abac=debug`.
	pub level: Option<String>,
	/// One JSON object per event instead of human-readable lines.
	pub json: Option<bool>,
}

impl LoggingConfigLayer {
	pub fn merge(&mut self, other: Self) {
		self.level = other.level.or(self.level.take());
		self.json = other.json.or(self.json);
	}

	pub fn finalize(self) -> LoggingConfig {
		let fallback = LoggingConfig::default();
		LoggingConfig {
			level: self.level.unwrap_or(fallback.level),
			json: self.json.unwrap_or(fallback.json),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
	pub level: String,
	pub json: bool,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: DEFAULT_FILTER.to_string(),
			json: false,
		}
	}
}
