// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Type definitions for ABAC policy evaluation.
//!
//! This module defines the data model shared by every stage of the engine:
//!
//! - [`AttributeValueSet`]: one named attribute and its (already expanded) values
//! - [`PermissionSet`]: the attributes a subject holds, or a resource requires
//! - [`MatchMode`] / [`PolicyRule`] / [`PolicyRules`]: how each attribute is compared
//!
//! # Design Principles
//!
//! 1. **Absent means unrestricted**: a missing key and an empty value set are
//!    treated the same way by the evaluator
//! 2. **Build once**: permission sets are assembled by a builder and then only read
//! 3. **Deterministic**: ordered collections, so decisions and logs are reproducible
//! 4. **Serializable**: all types can be logged/audited as JSON

use std::collections::{btree_map, BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tollgate_config::PolicyConfig;

/// A set of attribute values. Ordered so iteration is stable.
pub type ValueSet = BTreeSet<String>;

/// One named attribute and its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValueSet {
	pub name: String,
	pub values: ValueSet,
}

impl AttributeValueSet {
	pub fn new(name: impl Into<String>, values: ValueSet) -> Self {
		Self {
			name: name.into(),
			values,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

/// Attribute name -> values, one entry per distinct name.
///
/// Used both for what a subject holds and for what a resource requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
	attributes: BTreeMap<String, AttributeValueSet>,
}

impl PermissionSet {
	/// Creates a permission set with no attributes.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts an attribute, replacing any previous entry with the same name.
	pub fn insert(&mut self, attribute: AttributeValueSet) {
		self.attributes.insert(attribute.name.clone(), attribute);
	}

	/// Builder: add an attribute.
	pub fn with<I, S>(mut self, name: &str, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.insert(AttributeValueSet::new(
			name,
			values.into_iter().map(Into::into).collect(),
		));
		self
	}

	pub fn get(&self, name: &str) -> Option<&AttributeValueSet> {
		self.attributes.get(name)
	}

	/// Values held under `name`, if the attribute is present.
	pub fn values(&self, name: &str) -> Option<&ValueSet> {
		self.get(name).map(|a| &a.values)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.attributes.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.attributes.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = &AttributeValueSet> {
		self.attributes.values()
	}

	pub fn len(&self) -> usize {
		self.attributes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty()
	}
}

impl FromIterator<AttributeValueSet> for PermissionSet {
	fn from_iter<T: IntoIterator<Item = AttributeValueSet>>(iter: T) -> Self {
		let mut set = PermissionSet::new();
		for attribute in iter {
			set.insert(attribute);
		}
		set
	}
}

impl IntoIterator for PermissionSet {
	type Item = AttributeValueSet;
	type IntoIter = btree_map::IntoValues<String, AttributeValueSet>;

	fn into_iter(self) -> Self::IntoIter {
		self.attributes.into_values()
	}
}

/// How the values a subject holds are compared with the values a resource requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
	/// Every required value must be held.
	All,
	/// At least one required value must be held.
	One,
}

/// Comparison rule for a single resource attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
	pub mode: MatchMode,
	/// Subject attribute to compare against; defaults to the resource attribute name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subject_attribute: Option<String>,
}

impl PolicyRule {
	pub fn new(mode: MatchMode) -> Self {
		Self {
			mode,
			subject_attribute: None,
		}
	}

	pub fn all() -> Self {
		Self::new(MatchMode::All)
	}

	pub fn one() -> Self {
		Self::new(MatchMode::One)
	}

	/// Builder: read the subject's values from a differently named attribute.
	pub fn with_subject_attribute(mut self, name: impl Into<String>) -> Self {
		self.subject_attribute = Some(name.into());
		self
	}

	/// The subject attribute name used when checking resource attribute `resource_attribute`.
	pub fn subject_attribute_for<'a>(&'a self, resource_attribute: &'a str) -> &'a str {
		self
			.subject_attribute
			.as_deref()
			.unwrap_or(resource_attribute)
	}
}

/// Resource attribute name -> comparison rule.
///
/// Names without a rule are unconfigured and fail their check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyRules {
	rules: BTreeMap<String, PolicyRule>,
}

impl PolicyRules {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds rules from a plain `name -> mode` mapping.
	pub fn from_modes<I, S>(modes: I) -> Self
	where
		I: IntoIterator<Item = (S, MatchMode)>,
		S: Into<String>,
	{
		let mut rules = Self::new();
		for (name, mode) in modes {
			rules.insert(name, PolicyRule::new(mode));
		}
		rules
	}

	/// Builds rules from the resolved policy configuration section.
	pub fn from_config(config: &PolicyConfig) -> Self {
		let mut rules = Self::new();
		let modes = config
			.match_all
			.iter()
			.map(|name| (name, MatchMode::All))
			.chain(config.match_one.iter().map(|name| (name, MatchMode::One)));

		for (name, mode) in modes {
			let mut rule = PolicyRule::new(mode);
			if let Some(alias) = config.subject_attributes.get(name) {
				rule = rule.with_subject_attribute(alias.clone());
			}
			rules.insert(name.clone(), rule);
		}
		rules
	}

	pub fn insert(&mut self, name: impl Into<String>, rule: PolicyRule) {
		self.rules.insert(name.into(), rule);
	}

	/// Builder: add a rule.
	pub fn with(mut self, name: impl Into<String>, rule: PolicyRule) -> Self {
		self.insert(name, rule);
		self
	}

	pub fn get(&self, name: &str) -> Option<&PolicyRule> {
		self.rules.get(name)
	}

	pub fn len(&self) -> usize {
		self.rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn permission_set_new_is_empty() {
		let set = PermissionSet::new();
		assert!(set.is_empty());
		assert_eq!(set.len(), 0);
		assert!(set.values("rule").is_none());
	}

	#[test]
	fn permission_set_insert_replaces_same_name() {
		let set = PermissionSet::new()
			.with("rule", ["A"])
			.with("rule", ["B", "C"]);
		assert_eq!(set.len(), 1);
		let values: Vec<_> = set.values("rule").unwrap().iter().cloned().collect();
		assert_eq!(values, vec!["B".to_string(), "C".to_string()]);
	}

	#[test]
	fn permission_set_names_are_sorted() {
		let set = PermissionSet::new()
			.with("rule", ["A"])
			.with("country", ["GBR"]);
		let names: Vec<_> = set.names().collect();
		assert_eq!(names, vec!["country", "rule"]);
	}

	#[test]
	fn permission_set_serializes_as_map() {
		let set = PermissionSet::new().with("country", ["GBR"]);
		let json = serde_json::to_value(&set).unwrap();
		assert_eq!(json["country"]["values"][0], "GBR");
	}

	#[test]
	fn rule_subject_attribute_defaults_to_resource_name() {
		let rule = PolicyRule::one();
		assert_eq!(rule.subject_attribute_for("country"), "country");

		let rule = PolicyRule::one().with_subject_attribute("citizenship");
		assert_eq!(rule.subject_attribute_for("country"), "citizenship");
	}

	#[test]
	fn rules_from_modes() {
		let rules =
			PolicyRules::from_modes([("rule", MatchMode::All), ("country", MatchMode::One)]);
		assert_eq!(rules.len(), 2);
		assert_eq!(rules.get("rule").map(|r| r.mode), Some(MatchMode::All));
		assert_eq!(rules.get("country").map(|r| r.mode), Some(MatchMode::One));
		assert!(rules.get("caveat").is_none());
	}

	#[test]
	fn rules_from_config_applies_aliases() {
		let mut config = PolicyConfig {
			match_all: vec!["rule".to_string()],
			match_one: vec!["country".to_string()],
			..Default::default()
		};
		config
			.subject_attributes
			.insert("country".to_string(), "citizenship".to_string());

		let rules = PolicyRules::from_config(&config);
		let country = rules.get("country").unwrap();
		assert_eq!(country.mode, MatchMode::One);
		assert_eq!(country.subject_attribute_for("country"), "citizenship");
		assert_eq!(rules.get("rule").unwrap().subject_attribute, None);
	}

	#[test]
	fn match_mode_serde_names() {
		assert_eq!(serde_json::to_string(&MatchMode::All).unwrap(), "\"all\"");
		assert_eq!(serde_json::to_string(&MatchMode::One).unwrap(), "\"one\"");
	}
}
