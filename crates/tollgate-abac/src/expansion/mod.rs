// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute expansion.
//!
//! An expansion grows a raw value set into its full equivalence set, for
//! example a role into the roles it implies. Expansions are chained: each
//! stage receives the output of the previous one.
//!
//! # Failure policy
//!
//! A stage that cannot resolve a value passes it through unchanged instead of
//! dropping it. A transient directory outage therefore never narrows the
//! permissions a subject holds or the markings a resource carries; it only
//! withholds the extra values the expansion would have added.

pub mod lookup;
pub mod mapping;

pub use lookup::{DirectoryLookup, LookupError, LookupExpansion};
pub use mapping::MappingExpansion;

use std::fmt;
use std::sync::Arc;

use crate::types::ValueSet;

/// A single expansion stage.
///
/// Implementations must be pure with respect to their inputs: `values` is
/// borrowed and a new set is returned.
pub trait Expansion: Send + Sync {
	/// Short name used in logs.
	fn name(&self) -> &str;

	fn expand(&self, attribute: &str, values: &ValueSet) -> ValueSet;
}

/// Adapts a closure into an [`Expansion`].
pub struct FnExpansion<F> {
	name: String,
	f: F,
}

impl<F> FnExpansion<F>
where
	F: Fn(&str, &ValueSet) -> ValueSet + Send + Sync,
{
	pub fn new(name: impl Into<String>, f: F) -> Self {
		Self {
			name: name.into(),
			f,
		}
	}
}

impl<F> Expansion for FnExpansion<F>
where
	F: Fn(&str, &ValueSet) -> ValueSet + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn expand(&self, attribute: &str, values: &ValueSet) -> ValueSet {
		(self.f)(attribute, values)
	}
}

/// Ordered, immutable list of expansion stages.
///
/// Cloning is cheap. Reconfiguration builds a new chain rather than
/// editing one in place.
#[derive(Clone)]
pub struct ExpansionChain {
	stages: Arc<[Arc<dyn Expansion>]>,
}

impl ExpansionChain {
	pub fn new(stages: Vec<Arc<dyn Expansion>>) -> Self {
		Self {
			stages: stages.into(),
		}
	}

	/// The identity chain.
	pub fn empty() -> Self {
		Self::new(Vec::new())
	}

	/// Returns a new chain with `stage` appended.
	pub fn with_stage(&self, stage: Arc<dyn Expansion>) -> Self {
		let mut stages: Vec<_> = self.stages.iter().cloned().collect();
		stages.push(stage);
		Self::new(stages)
	}

	pub fn len(&self) -> usize {
		self.stages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}

	pub fn stage_names(&self) -> Vec<&str> {
		self.stages.iter().map(|s| s.name()).collect()
	}

	/// Shorthand for [`expand`] with this chain.
	pub fn expand(&self, attribute: &str, values: &ValueSet) -> ValueSet {
		expand(attribute, values, self)
	}
}

impl Default for ExpansionChain {
	fn default() -> Self {
		Self::empty()
	}
}

impl fmt::Debug for ExpansionChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ExpansionChain")
			.field("stages", &self.stage_names())
			.finish()
	}
}

/// Runs `values` through every stage of `chain` in order.
///
/// An empty chain returns a copy of `values`.
pub fn expand(attribute: &str, values: &ValueSet, chain: &ExpansionChain) -> ValueSet {
	chain
		.stages
		.iter()
		.fold(values.clone(), |acc, stage| stage.expand(attribute, &acc))
}
