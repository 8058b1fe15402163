// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracing subscriber setup driven by [`LoggingConfig`].

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::sections::LoggingConfig;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level when it is set. Calling this
/// twice returns [`ConfigError::Logging`] instead of panicking.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => filter_for_level(&config.level)?,
	};

	let builder = tracing_subscriber::fmt().with_env_filter(filter);
	let result = if config.json {
		builder.json().try_init()
	} else {
		builder.try_init()
	};

	result.map_err(|e| ConfigError::Logging(e.to_string()))
}

fn filter_for_level(level: &str) -> Result<EnvFilter, ConfigError> {
	EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidValue {
		key: "logging.level".to_string(),
		message: e.to_string(),
	})
}
