// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for the Tollgate access-control engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Validation of rule and scan settings before they reach the engine
//! - Consistent environment variable naming (`TOLLGATE_*`)
//! - Tracing subscriber initialisation from the logging section
//!
//! # Usage
//!
//! ```ignore
//! use tollgate_config::load_config;
//!
//! let settings = load_config()?;
//! tollgate_config::init_tracing(&settings.logging)?;
//! println!("match-all rules: {:?}", settings.policy.match_all);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;
pub mod telemetry;

pub use error::{ConfigError, Result};
pub use layer::AbacConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};
pub use telemetry::init_tracing;

use std::path::PathBuf;

use tracing::{debug, info};

/// Fully resolved engine configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbacSettings {
	pub scan: ScanConfig,
	pub policy: PolicyConfig,
	pub expansion: ExpansionConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`TOLLGATE_*`)
/// 2. Config file (`/etc/tollgate/abac.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<AbacSettings> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<AbacSettings> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<AbacSettings> {
	let mut merged = AbacConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration from an in-memory TOML document, ignoring the environment.
pub fn load_config_from_str(content: &str) -> Result<AbacSettings> {
	let layer: AbacConfigLayer = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
		path: PathBuf::from("<inline>"),
		source: e,
	})?;
	finalize(layer)
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<AbacSettings> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AbacConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: AbacConfigLayer) -> Result<AbacSettings> {
	let scan = layer.scan.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize();
	let expansion = layer.expansion.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&scan, &policy, &expansion)?;

	info!(
		scanned_elements = scan.elements.len(),
		union_attributes = scan.union_attributes.len(),
		intersection_attributes = scan.intersection_attributes.len(),
		match_all_rules = policy.match_all.len(),
		match_one_rules = policy.match_one.len(),
		expansion_mappings = expansion.mappings.len(),
		lookup_timeout_ms = expansion.lookup_timeout_ms,
		"ABAC configuration loaded"
	);

	Ok(AbacSettings {
		scan,
		policy,
		expansion,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	scan: &ScanConfig,
	policy: &PolicyConfig,
	expansion: &ExpansionConfig,
) -> Result<()> {
	let conflicting = policy.conflicting_rules();
	if !conflicting.is_empty() {
		return Err(ConfigError::Validation(format!(
			"attributes configured as both match_all and match_one: {}",
			conflicting.join(", ")
		)));
	}

	let conflicting = scan.conflicting_attributes();
	if !conflicting.is_empty() {
		return Err(ConfigError::Validation(format!(
			"attributes configured for both union and intersection aggregation: {}",
			conflicting.join(", ")
		)));
	}

	if expansion.lookup_timeout_ms == 0 {
		return Err(ConfigError::Validation(
			"expansion.lookup_timeout_ms must be greater than zero".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	const FULL_CONFIG: &str = r#"
[scan]
elements = ["security"]
union_attributes = ["releasableTo"]
intersection_attributes = ["classification"]

[policy]
match_all = ["rule"]
match_one = ["country"]

[expansion]
lookup_timeout_ms = 750

[[expansion.mappings]]
attribute = "rule"
pattern = "^A$"
replacement = "A B"

[logging]
level = "debug"
"#;

	#[test]
	fn test_load_from_str() {
		let settings = load_config_from_str(FULL_CONFIG).unwrap();
		assert_eq!(settings.scan.elements, vec!["security".to_string()]);
		assert_eq!(settings.policy.match_all, vec!["rule".to_string()]);
		assert_eq!(settings.policy.match_one, vec!["country".to_string()]);
		assert_eq!(settings.expansion.lookup_timeout_ms, 750);
		assert_eq!(settings.expansion.mappings.len(), 1);
		assert_eq!(settings.logging.level, "debug");
	}

	#[test]
	fn test_empty_config_resolves_to_defaults() {
		let settings = load_config_from_str("").unwrap();
		assert_eq!(settings, AbacSettings::default());
	}

	#[test]
	fn test_rule_with_both_modes_is_rejected() {
		let err = load_config_from_str(
			r#"
[policy]
match_all = ["country"]
match_one = ["country"]
"#,
		)
		.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
		assert!(err.to_string().contains("country"));
	}

	#[test]
	fn test_attribute_with_both_aggregations_is_rejected() {
		let err = load_config_from_str(
			r#"
[scan]
union_attributes = ["releasableTo"]
intersection_attributes = ["releasableTo"]
"#,
		)
		.unwrap_err();
		assert!(err.to_string().contains("releasableTo"));
	}

	#[test]
	fn test_zero_timeout_is_rejected() {
		let err = load_config_from_str("[expansion]\nlookup_timeout_ms = 0\n").unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn test_file_layer_is_loaded() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("abac.toml");
		std::fs::write(&path, FULL_CONFIG).unwrap();

		let mut merged = AbacConfigLayer::default();
		merged.merge(DefaultsSource.load().unwrap());
		merged.merge(TomlSource::new(path).load().unwrap());
		let settings = finalize(merged).unwrap();
		assert_eq!(settings.scan.union_attributes, vec!["releasableTo".to_string()]);
	}
}
