// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Errors raised while resolving engine settings.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	/// A single setting could not be interpreted, e.g. a non-numeric timeout.
	#[error("setting `{key}` is invalid: {message}")]
	InvalidValue { key: String, message: String },

	#[error("{path} is not valid TOML: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("cannot read {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Settings that parse individually but contradict each other.
	#[error("inconsistent ABAC settings: {0}")]
	Validation(String),

	#[error("tracing subscriber already installed or unusable: {0}")]
	Logging(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
