// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Where ABAC settings come from: built-in defaults, a TOML file and `TOLLGATE_*` variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::AbacConfigLayer;
use crate::sections::{
	ExpansionConfigLayer, LoggingConfigLayer, MappingEntry, PolicyConfigLayer, ScanConfigLayer,
};

/// Merge order. A source with higher precedence overrides the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Produces one [`AbacConfigLayer`] to merge.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AbacConfigLayer, ConfigError>;
}

/// Contributes nothing; section defaults are applied at finalization.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AbacConfigLayer, ConfigError> {
		debug!("using built-in ABAC defaults");
		Ok(AbacConfigLayer::default())
	}
}

/// Reads a TOML file. A missing file contributes an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/tollgate/abac.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AbacConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "no ABAC settings file, skipping");
			return Ok(AbacConfigLayer::default());
		}

		debug!(path = %self.path.display(), "reading ABAC settings file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AbacConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(path = %self.path.display(), "parsed ABAC settings layer");
		Ok(layer)
	}
}

/// Reads `TOLLGATE_*` variables.
///
/// Convention: TOLLGATE_<SECTION>_<FIELD>. List values are comma-separated.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AbacConfigLayer, ConfigError> {
		debug!("reading TOLLGATE_* environment");
		load_layer(&|name: &str| std::env::var(name).ok())
	}
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn load_layer(lookup: Lookup<'_>) -> Result<AbacConfigLayer, ConfigError> {
	Ok(AbacConfigLayer {
		scan: Some(load_scan(lookup)),
		policy: Some(load_policy(lookup)),
		expansion: Some(load_expansion(lookup)?),
		logging: Some(load_logging(lookup)),
	})
}

fn env_var(lookup: Lookup<'_>, name: &str) -> Option<String> {
	lookup(name).filter(|s| !s.is_empty())
}

fn env_bool(lookup: Lookup<'_>, name: &str) -> Option<bool> {
	env_var(lookup, name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u64(lookup: Lookup<'_>, name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(lookup, name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_list(lookup: Lookup<'_>, name: &str) -> Option<Vec<String>> {
	env_var(lookup, name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn load_scan(lookup: Lookup<'_>) -> ScanConfigLayer {
	ScanConfigLayer {
		elements: env_list(lookup, "TOLLGATE_SCAN_ELEMENTS"),
		union_attributes: env_list(lookup, "TOLLGATE_SCAN_UNION_ATTRIBUTES"),
		intersection_attributes: env_list(lookup, "TOLLGATE_SCAN_INTERSECTION_ATTRIBUTES"),
	}
}

fn load_policy(lookup: Lookup<'_>) -> PolicyConfigLayer {
	PolicyConfigLayer {
		match_all: env_list(lookup, "TOLLGATE_POLICY_MATCH_ALL"),
		match_one: env_list(lookup, "TOLLGATE_POLICY_MATCH_ONE"),
		subject_attributes: None,
	}
}

fn load_expansion(lookup: Lookup<'_>) -> Result<ExpansionConfigLayer, ConfigError> {
	let mappings = match env_var(lookup, "TOLLGATE_EXPANSION_MAPPINGS") {
		Some(json) => Some(serde_json::from_str::<Vec<MappingEntry>>(&json).map_err(|e| {
			ConfigError::InvalidValue {
				key: "TOLLGATE_EXPANSION_MAPPINGS".to_string(),
				message: e.to_string(),
			}
		})?),
		None => None,
	};

	Ok(ExpansionConfigLayer {
		lookup_timeout_ms: env_u64(lookup, "TOLLGATE_EXPANSION_LOOKUP_TIMEOUT_MS")?,
		mappings,
	})
}

fn load_logging(lookup: Lookup<'_>) -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var(lookup, "TOLLGATE_LOG_LEVEL"),
		json: env_bool(lookup, "TOLLGATE_LOG_JSON"),
	}
}
