// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Document scan configuration section.
//!
//! Names the markup elements that carry security markings and says how
//! repeated occurrences of each marking attribute are combined.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanConfigLayer {
	pub elements: Option<Vec<String>>,
	pub union_attributes: Option<Vec<String>>,
	pub intersection_attributes: Option<Vec<String>>,
}

impl ScanConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.elements.is_some() {
			self.elements = other.elements;
		}
		if other.union_attributes.is_some() {
			self.union_attributes = other.union_attributes;
		}
		if other.intersection_attributes.is_some() {
			self.intersection_attributes = other.intersection_attributes;
		}
	}

	pub fn finalize(self) -> ScanConfig {
		ScanConfig {
			elements: self.elements.unwrap_or_default(),
			union_attributes: self.union_attributes.unwrap_or_default(),
			intersection_attributes: self.intersection_attributes.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
	pub elements: Vec<String>,
	pub union_attributes: Vec<String>,
	pub intersection_attributes: Vec<String>,
}

impl ScanConfig {
	/// Attribute names configured for both aggregation modes.
	pub fn conflicting_attributes(&self) -> Vec<String> {
		self
			.union_attributes
			.iter()
			.filter(|name| self.intersection_attributes.contains(name))
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_finalize_defaults_are_empty() {
		let config = ScanConfigLayer::default().finalize();
		assert!(config.elements.is_empty());
		assert!(config.union_attributes.is_empty());
		assert!(config.intersection_attributes.is_empty());
	}

	#[test]
	fn test_merge_overwrites_only_present_fields() {
		let mut base = ScanConfigLayer {
			elements: Some(vec!["security".to_string()]),
			union_attributes: Some(vec!["releasableTo".to_string()]),
			intersection_attributes: None,
		};
		let overlay = ScanConfigLayer {
			elements: None,
			union_attributes: Some(vec!["ownerProducer".to_string()]),
			intersection_attributes: Some(vec!["classification".to_string()]),
		};
		base.merge(overlay);
		assert_eq!(base.elements, Some(vec!["security".to_string()]));
		assert_eq!(base.union_attributes, Some(vec!["ownerProducer".to_string()]));
		assert_eq!(
			base.intersection_attributes,
			Some(vec!["classification".to_string()])
		);
	}

	#[test]
	fn test_conflicting_attributes() {
		let config = ScanConfig {
			elements: vec!["security".to_string()],
			union_attributes: vec!["a".to_string(), "b".to_string()],
			intersection_attributes: vec!["b".to_string(), "c".to_string()],
		};
		assert_eq!(config.conflicting_attributes(), vec!["b".to_string()]);
	}

	#[test]
	fn test_deserialize_partial() {
		let toml_str = r#"
elements = ["security", "resource"]
union_attributes = ["releasableTo"]
"#;
		let layer: ScanConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(
			layer.elements,
			Some(vec!["security".to_string(), "resource".to_string()])
		);
		assert!(layer.intersection_attributes.is_none());
	}
}
