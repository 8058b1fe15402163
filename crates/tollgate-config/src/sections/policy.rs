// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy rule configuration section.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfigLayer {
	pub match_all: Option<Vec<String>>,
	pub match_one: Option<Vec<String>>,
	/// Resource attribute name -> subject attribute name it is compared against.
	pub subject_attributes: Option<BTreeMap<String, String>>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.match_all.is_some() {
			self.match_all = other.match_all;
		}
		if other.match_one.is_some() {
			self.match_one = other.match_one;
		}
		if other.subject_attributes.is_some() {
			self.subject_attributes = other.subject_attributes;
		}
	}

	pub fn finalize(self) -> PolicyConfig {
		PolicyConfig {
			match_all: self.match_all.unwrap_or_default(),
			match_one: self.match_one.unwrap_or_default(),
			subject_attributes: self.subject_attributes.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
	pub match_all: Vec<String>,
	pub match_one: Vec<String>,
	pub subject_attributes: BTreeMap<String, String>,
}

impl PolicyConfig {
	/// Attribute names configured with both match modes.
	pub fn conflicting_rules(&self) -> Vec<String> {
		self
			.match_all
			.iter()
			.filter(|name| self.match_one.contains(name))
			.cloned()
			.collect()
	}
}
