// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Regex rewrite table expansion.

use std::collections::BTreeMap;

use regex::Regex;
use tollgate_config::ExpansionConfig;

use super::Expansion;
use crate::error::{AbacError, Result};
use crate::types::ValueSet;

struct MappingRule {
	pattern: Regex,
	replacement: String,
}

/// Expands attribute values through an ordered table of regex rewrites.
///
/// For each attribute the rules run in configuration order and each rule sees
/// the values produced by the rules before it, so `admin -> admin user` followed
/// by `user -> user guest` expands `admin` to all three. A matching value is
/// rewritten with `replace_all` and the result is split on whitespace; the
/// original value is always kept.
#[derive(Default)]
pub struct MappingExpansion {
	table: BTreeMap<String, Vec<MappingRule>>,
}

impl MappingExpansion {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_config(config: &ExpansionConfig) -> Result<Self> {
		let mut expansion = Self::new();
		for entry in &config.mappings {
			expansion.add_rule(&entry.attribute, &entry.pattern, &entry.replacement)?;
		}
		Ok(expansion)
	}

	/// Appends a rewrite rule for `attribute`.
	pub fn add_rule(&mut self, attribute: &str, pattern: &str, replacement: &str) -> Result<()> {
		let compiled = Regex::new(pattern).map_err(|source| AbacError::InvalidExpansionPattern {
			attribute: attribute.to_string(),
			pattern: pattern.to_string(),
			source,
		})?;

		self
			.table
			.entry(attribute.to_string())
			.or_default()
			.push(MappingRule {
				pattern: compiled,
				replacement: replacement.to_string(),
			});
		Ok(())
	}

	/// Builder form of [`MappingExpansion::add_rule`].
	pub fn with_rule(mut self, attribute: &str, pattern: &str, replacement: &str) -> Result<Self> {
		self.add_rule(attribute, pattern, replacement)?;
		Ok(self)
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	pub fn rule_count(&self) -> usize {
		self.table.values().map(Vec::len).sum()
	}
}

impl Expansion for MappingExpansion {
	fn name(&self) -> &str {
		"mapping"
	}

	fn expand(&self, attribute: &str, values: &ValueSet) -> ValueSet {
		let Some(rules) = self.table.get(attribute) else {
			return values.clone();
		};

		let mut expanded = values.clone();
		for rule in rules {
			let mut added = ValueSet::new();
			for value in expanded.iter().filter(|v| rule.pattern.is_match(v)) {
				let rewritten = rule.pattern.replace_all(value, rule.replacement.as_str());
				added.extend(rewritten.split_whitespace().map(str::to_string));
			}
			expanded.extend(added);
		}
		expanded
	}
}
