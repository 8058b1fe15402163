// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute expansion configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2000;

/// One regex rewrite rule applied to values of `attribute`.
///
/// `replacement` may reference capture groups (`$1`, `${name}`) and may
/// expand to several whitespace-separated values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingEntry {
	pub attribute: String,
	pub pattern: String,
	pub replacement: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpansionConfigLayer {
	pub lookup_timeout_ms: Option<u64>,
	pub mappings: Option<Vec<MappingEntry>>,
}

impl ExpansionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.lookup_timeout_ms.is_some() {
			self.lookup_timeout_ms = other.lookup_timeout_ms;
		}
		if other.mappings.is_some() {
			self.mappings = other.mappings;
		}
	}

	pub fn finalize(self) -> ExpansionConfig {
		ExpansionConfig {
			lookup_timeout_ms: self.lookup_timeout_ms.unwrap_or(DEFAULT_LOOKUP_TIMEOUT_MS),
			mappings: self.mappings.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpansionConfig {
	pub lookup_timeout_ms: u64,
	pub mappings: Vec<MappingEntry>,
}

impl ExpansionConfig {
	pub fn lookup_timeout(&self) -> Duration {
		Duration::from_millis(self.lookup_timeout_ms)
	}
}

impl Default for ExpansionConfig {
	fn default() -> Self {
		Self {
			lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
			mappings: Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = ExpansionConfig::default();
		assert_eq!(config.lookup_timeout_ms, 2000);
		assert_eq!(config.lookup_timeout(), Duration::from_secs(2));
		assert!(config.mappings.is_empty());
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let layer = ExpansionConfigLayer {
			lookup_timeout_ms: Some(250),
			mappings: Some(vec![MappingEntry {
				attribute: "role".to_string(),
				pattern: "^admin$".to_string(),
				replacement: "admin user".to_string(),
			}]),
		};
		let config = layer.finalize();
		assert_eq!(config.lookup_timeout(), Duration::from_millis(250));
		assert_eq!(config.mappings.len(), 1);
	}

	#[test]
	fn test_deserialize_mappings_in_order() {
		let toml_str = r#"
lookup_timeout_ms = 500

[[mappings]]
attribute = "role"
pattern = "^admin$"
replacement = "admin user"

[[mappings]]
attribute = "role"
pattern = "^user$"
replacement = "user guest"
"#;
		let layer: ExpansionConfigLayer = toml::from_str(toml_str).unwrap();
		let mappings = layer.mappings.unwrap();
		assert_eq!(mappings.len(), 2);
		assert_eq!(mappings[0].pattern, "^admin$");
		assert_eq!(mappings[1].replacement, "user guest");
	}
}
