// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine error types.
//!
//! Evaluation never fails: malformed documents, missing assertions and
//! failed lookups degrade to "no profile" / "no permissions" / "unexpanded".
//! Errors only arise while assembling an engine configuration.

use thiserror::Error;

/// Errors that can occur while configuring the engine.
#[derive(Debug, Error)]
pub enum AbacError {
	/// An expansion table entry has a pattern that does not compile.
	#[error("invalid expansion pattern `{pattern}` for attribute `{attribute}`: {source}")]
	InvalidExpansionPattern {
		attribute: String,
		pattern: String,
		#[source]
		source: regex::Error,
	},

	/// The engine configuration is inconsistent.
	#[error("configuration error: {0}")]
	Configuration(String),

	/// Loading the layered configuration failed.
	#[error(transparent)]
	Config(#[from] tollgate_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, AbacError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_pattern_message_names_attribute() {
		let source = regex::Regex::new("(").unwrap_err();
		let err = AbacError::InvalidExpansionPattern {
			attribute: "role".to_string(),
			pattern: "(".to_string(),
			source,
		};
		let message = err.to_string();
		assert!(message.contains("role"));
		assert!(message.contains("`(`"));
	}

	#[test]
	fn config_errors_convert() {
		let err: AbacError =
			tollgate_config::ConfigError::Validation("bad timeout".to_string()).into();
		assert!(matches!(err, AbacError::Config(_)));
		assert!(err.to_string().contains("bad timeout"));
	}
}
