// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Expansion backed by an external directory.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use super::Expansion;
use crate::types::ValueSet;

/// Errors a directory may report for a single value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
	#[error("lookup timed out after {0:?}")]
	Timeout(Duration),

	#[error("value not known to the directory")]
	NotFound,

	#[error("directory unavailable: {0}")]
	Unavailable(String),
}

/// A directory that resolves one attribute value into the values it implies.
///
/// Implementations may block. They are handed the deadline they should honour
/// and should return [`LookupError::Timeout`] once it has passed.
pub trait DirectoryLookup: Send + Sync {
	fn lookup(
		&self,
		attribute: &str,
		value: &str,
		deadline: Duration,
	) -> Result<Vec<String>, LookupError>;
}

/// Expands values by asking a [`DirectoryLookup`].
///
/// Every value of a set is looked up on its own thread and all of them share
/// one deadline, `timeout` after expansion starts. The engine stops waiting at
/// the deadline whether or not the directory honours it. A failed or late
/// answer leaves that value unexpanded; the other values are still used.
pub struct LookupExpansion<L: ?Sized> {
	name: String,
	directory: Arc<L>,
	timeout: Duration,
	attributes: Option<BTreeSet<String>>,
}

impl<L: DirectoryLookup> LookupExpansion<L> {
	pub fn new(name: impl Into<String>, directory: L, timeout: Duration) -> Self {
		Self::shared(name, Arc::new(directory), timeout)
	}
}

impl<L: DirectoryLookup + ?Sized> LookupExpansion<L> {
	/// Wraps a directory that is also used elsewhere.
	pub fn shared(name: impl Into<String>, directory: Arc<L>, timeout: Duration) -> Self {
		Self {
			name: name.into(),
			directory,
			timeout,
			attributes: None,
		}
	}

	/// Builder: only consult the directory for these attribute names.
	pub fn for_attributes<I, S>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes = Some(attributes.into_iter().map(Into::into).collect());
		self
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	fn applies_to(&self, attribute: &str) -> bool {
		self
			.attributes
			.as_ref()
			.map_or(true, |names| names.contains(attribute))
	}
}

type Answer = Result<Vec<String>, LookupError>;

impl<L: DirectoryLookup + ?Sized + 'static> LookupExpansion<L> {
	fn start(&self, attribute: &str, value: &str) -> Option<Receiver<Answer>> {
		let (tx, rx) = mpsc::channel();
		let directory = Arc::clone(&self.directory);
		let (attribute, value) = (attribute.to_string(), value.to_string());
		let timeout = self.timeout;

		let spawned = thread::Builder::new()
			.name(format!("lookup-{}", self.name))
			.spawn(move || {
				let answer = directory.lookup(&attribute, &value, timeout);
				// The receiver is gone once the deadline has passed.
				let _ = tx.send(answer);
			});

		match spawned {
			Ok(_) => Some(rx),
			Err(e) => {
				warn!(
					expansion = %self.name,
					error = %e,
					"cannot start directory lookup, value left unexpanded"
				);
				None
			}
		}
	}
}

impl<L: DirectoryLookup + ?Sized + 'static> Expansion for LookupExpansion<L> {
	fn name(&self) -> &str {
		&self.name
	}

	fn expand(&self, attribute: &str, values: &ValueSet) -> ValueSet {
		if !self.applies_to(attribute) || values.is_empty() {
			return values.clone();
		}

		let deadline = Instant::now() + self.timeout;
		let pending: Vec<_> = values
			.iter()
			.map(|value| self.start(attribute, value))
			.collect();

		let mut expanded = values.clone();
		for rx in pending.into_iter().flatten() {
			let remaining = deadline.saturating_duration_since(Instant::now());
			match rx.recv_timeout(remaining) {
				Ok(Ok(found)) => expanded.extend(found),
				Ok(Err(LookupError::NotFound)) => {
					debug!(expansion = %self.name, attribute, "value not in directory");
				}
				Ok(Err(e)) => {
					warn!(
						expansion = %self.name,
						attribute,
						error = %e,
						"directory lookup failed, value left unexpanded"
					);
				}
				Err(RecvTimeoutError::Timeout) => {
					warn!(
						expansion = %self.name,
						attribute,
						timeout_ms = self.timeout.as_millis() as u64,
						"directory missed deadline, value left unexpanded"
					);
				}
				Err(RecvTimeoutError::Disconnected) => {
					warn!(
						expansion = %self.name,
						attribute,
						"directory lookup aborted, value left unexpanded"
					);
				}
			}
		}
		expanded
	}
}
