// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subject permission sets built from identity assertions.
//!
//! An assertion carries one or more attribute statements. Same-named
//! attributes across statements are merged, never intersected: a subject only
//! gains permissions by presenting more statements. The merged values are then
//! expanded once per attribute name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::expansion::ExpansionChain;
use crate::types::{AttributeValueSet, PermissionSet, ValueSet};

/// A validated identity assertion as handed over by the token collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityAssertion {
	#[serde(default)]
	pub statements: Vec<AttributeStatement>,
}

impl IdentityAssertion {
	pub fn new(statements: Vec<AttributeStatement>) -> Self {
		Self { statements }
	}

	/// An assertion with exactly one attribute statement.
	pub fn single(statement: AttributeStatement) -> Self {
		Self::new(vec![statement])
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeStatement {
	#[serde(default)]
	pub attributes: Vec<AssertedAttribute>,
}

impl AttributeStatement {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder: add an attribute with string values.
	pub fn with<I, S>(mut self, name: &str, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes.push(AssertedAttribute::text(name, values));
		self
	}

	/// Builder: add an attribute with raw values.
	pub fn with_attribute(mut self, attribute: AssertedAttribute) -> Self {
		self.attributes.push(attribute);
		self
	}
}

/// One asserted attribute. Values are raw because assertions may carry
/// non-string payloads; only string values are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertedAttribute {
	pub name: String,
	#[serde(default)]
	pub values: Vec<Value>,
}

impl AssertedAttribute {
	pub fn text<I, S>(name: &str, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			name: name.to_string(),
			values: values.into_iter().map(|v| Value::String(v.into())).collect(),
		}
	}
}

/// Builds subject permission sets.
#[derive(Debug, Clone, Copy)]
pub struct SubjectAttributeBuilder<'a> {
	chain: &'a ExpansionChain,
}

impl<'a> SubjectAttributeBuilder<'a> {
	pub fn new(chain: &'a ExpansionChain) -> Self {
		Self { chain }
	}

	/// No assertion means no attributes.
	pub fn build(&self, assertion: Option<&IdentityAssertion>) -> PermissionSet {
		match assertion {
			Some(assertion) => self.build_statements(&assertion.statements),
			None => {
				debug!("no identity assertion, subject holds no attributes");
				PermissionSet::new()
			}
		}
	}

	pub fn build_statement(&self, statement: &AttributeStatement) -> PermissionSet {
		self.build_statements(std::slice::from_ref(statement))
	}

	pub fn build_statements(&self, statements: &[AttributeStatement]) -> PermissionSet {
		let mut merged: BTreeMap<String, ValueSet> = BTreeMap::new();

		for attribute in statements.iter().flat_map(|s| &s.attributes) {
			let values = merged.entry(attribute.name.clone()).or_default();
			for value in &attribute.values {
				match value {
					Value::String(s) => {
						values.insert(s.clone());
					}
					other => {
						debug!(
							attribute = %attribute.name,
							kind = value_kind(other),
							"skipping non-string attribute value"
						);
					}
				}
			}
		}

		merged
			.into_iter()
			.map(|(name, values)| {
				let expanded = self.chain.expand(&name, &values);
				AttributeValueSet::new(name, expanded)
			})
			.collect()
	}
}

fn value_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
