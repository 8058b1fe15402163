// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resource security profiles extracted from embedded document markings.
//!
//! The builder walks a document, picks out the configured marking elements
//! and folds their attributes into a [`PermissionSet`]:
//!
//! ```text
//! <security releasableTo="GBR USA" classification="A B C"/>
//! <security releasableTo="CAN"     classification="B C D"/>
//!
//! union        releasableTo   -> {CAN, GBR, USA}
//! intersection classification -> {B, C}
//! ```
//!
//! Each aggregated value set is run through the expansion chain before it is
//! stored. A document that cannot be read yields an empty profile, which the
//! evaluator treats as unrestricted; callers that cannot accept that should
//! check [`ProfileStats::malformed`].

pub mod reader;

pub use reader::{ElementSource, ReadError, StartElement, VecElementSource, XmlElementSource};

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::expansion::ExpansionChain;
use crate::types::{AttributeValueSet, PermissionSet, ValueSet};

/// Which elements to scan and how each marking attribute is aggregated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRules {
	pub elements: BTreeSet<String>,
	pub union_attributes: BTreeSet<String>,
	pub intersection_attributes: BTreeSet<String>,
}

impl ScanRules {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_config(config: &tollgate_config::ScanConfig) -> Self {
		Self {
			elements: config.elements.iter().cloned().collect(),
			union_attributes: config.union_attributes.iter().cloned().collect(),
			intersection_attributes: config.intersection_attributes.iter().cloned().collect(),
		}
	}

	/// Builder: scan elements with these local names.
	pub fn with_elements<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.elements.extend(names.into_iter().map(Into::into));
		self
	}

	/// Builder: merge repeated occurrences of these attributes.
	pub fn with_union<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.union_attributes.extend(names.into_iter().map(Into::into));
		self
	}

	/// Builder: intersect repeated occurrences of these attributes.
	pub fn with_intersection<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self
			.intersection_attributes
			.extend(names.into_iter().map(Into::into));
		self
	}
}

/// What a scan saw, for callers that want to audit fail-open cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileStats {
	pub matched_elements: usize,
	pub malformed: bool,
}

/// Builds resource security profiles.
#[derive(Debug, Clone, Copy)]
pub struct SecurityProfileBuilder<'a> {
	rules: &'a ScanRules,
	chain: &'a ExpansionChain,
}

impl<'a> SecurityProfileBuilder<'a> {
	pub fn new(rules: &'a ScanRules, chain: &'a ExpansionChain) -> Self {
		Self { rules, chain }
	}

	pub fn build_xml(&self, document: &str) -> PermissionSet {
		self.build(XmlElementSource::new(document))
	}

	/// Absent documents carry no markings.
	pub fn build_xml_opt(&self, document: Option<&str>) -> PermissionSet {
		match document {
			Some(document) => self.build_xml(document),
			None => {
				debug!("no document supplied, using empty security profile");
				PermissionSet::new()
			}
		}
	}

	pub fn build<S: ElementSource>(&self, source: S) -> PermissionSet {
		self.build_with_stats(source).0
	}

	pub fn build_with_stats<S: ElementSource>(
		&self,
		mut source: S,
	) -> (PermissionSet, ProfileStats) {
		let mut acc = Accumulator::default();

		while let Some(event) = source.next_start() {
			match event {
				Ok(element) => acc.record(self.rules, &element),
				Err(e) => {
					warn!(
						position = e.position,
						error = %e.message,
						"malformed document, using empty security profile"
					);
					let stats = ProfileStats {
						matched_elements: acc.matched_elements,
						malformed: true,
					};
					return (PermissionSet::new(), stats);
				}
			}
		}

		let stats = ProfileStats {
			matched_elements: acc.matched_elements,
			malformed: false,
		};
		(acc.finish(self.chain), stats)
	}
}

#[derive(Default)]
struct Accumulator {
	unions: BTreeMap<String, ValueSet>,
	intersections: BTreeMap<String, Vec<ValueSet>>,
	matched_elements: usize,
}

impl Accumulator {
	fn record(&mut self, rules: &ScanRules, element: &StartElement) {
		if !rules.elements.contains(&element.name) {
			return;
		}
		self.matched_elements += 1;

		// Prefixed attributes can share a local name; the first one counts.
		let mut seen = BTreeSet::new();
		for (name, value) in &element.attributes {
			if !seen.insert(name.as_str()) {
				continue;
			}
			if rules.union_attributes.contains(name) {
				self
					.unions
					.entry(name.clone())
					.or_default()
					.extend(tokenize(value));
			} else if rules.intersection_attributes.contains(name) {
				self
					.intersections
					.entry(name.clone())
					.or_default()
					.push(tokenize(value).collect());
			}
		}
	}

	fn finish(self, chain: &ExpansionChain) -> PermissionSet {
		let intersected = self
			.intersections
			.into_iter()
			.map(|(name, occurrences)| (name, intersect_all(occurrences)));

		self
			.unions
			.into_iter()
			.chain(intersected)
			.map(|(name, values)| {
				let expanded = chain.expand(&name, &values);
				AttributeValueSet::new(name, expanded)
			})
			.collect()
	}
}

fn tokenize(value: &str) -> impl Iterator<Item = String> + '_ {
	value.split_whitespace().map(str::to_string)
}

fn intersect_all(occurrences: Vec<ValueSet>) -> ValueSet {
	let mut occurrences = occurrences.into_iter();
	let Some(first) = occurrences.next() else {
		return ValueSet::new();
	};
	occurrences.fold(first, |mut acc, next| {
		acc.retain(|value| next.contains(value));
		acc
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::expansion::{Expansion, FnExpansion};
	use std::sync::Arc;

	fn set(values: &[&str]) -> ValueSet {
		values.iter().map(|v| v.to_string()).collect()
	}

	fn rules() -> ScanRules {
		ScanRules::new()
			.with_elements(["security"])
			.with_union(["releasableTo"])
			.with_intersection(["classification"])
	}

	fn build(document: &str) -> PermissionSet {
		let rules = rules();
		let chain = ExpansionChain::empty();
		SecurityProfileBuilder::new(&rules, &chain).build_xml(document)
	}

	mod aggregation {
		use super::*;

		#[test]
		fn union_merges_occurrences() {
			let profile = build(
				r#"<doc><security releasableTo="A"/><security releasableTo="B"/></doc>"#,
			);
			assert_eq!(profile.values("releasableTo"), Some(&set(&["A", "B"])));
		}

		#[test]
		fn intersection_keeps_common_values() {
			let profile = build(
				r#"<doc>
					<security classification="A B C"/>
					<security classification="B C D"/>
				</doc>"#,
			);
			assert_eq!(profile.values("classification"), Some(&set(&["B", "C"])));
		}

		#[test]
		fn single_intersection_occurrence_is_unchanged() {
			let profile = build(r#"<security classification="A B"/>"#);
			assert_eq!(profile.values("classification"), Some(&set(&["A", "B"])));
		}

		#[test]
		fn disjoint_intersection_collapses_to_empty() {
			let profile = build(
				r#"<doc><security classification="A"/><security classification="B"/></doc>"#,
			);
			assert_eq!(profile.values("classification"), Some(&ValueSet::new()));
		}

		#[test]
		fn whitespace_runs_are_single_separators() {
			let profile = build("<security releasableTo=\"  GBR\t\tUSA \n CAN \"/>");
			assert_eq!(
				profile.values("releasableTo"),
				Some(&set(&["CAN", "GBR", "USA"]))
			);
		}

		#[test]
		fn nested_marking_elements_are_all_scanned() {
			let profile = build(
				r#"<security releasableTo="A">
					<body><security releasableTo="B"/></body>
				</security>"#,
			);
			assert_eq!(profile.values("releasableTo"), Some(&set(&["A", "B"])));
		}
	}

	mod filtering {
		use super::*;

		#[test]
		fn unconfigured_attributes_are_ignored() {
			let profile = build(r#"<security owner="alice" releasableTo="GBR"/>"#);
			assert_eq!(profile.len(), 1);
			assert!(!profile.contains("owner"));
		}

		#[test]
		fn unscanned_elements_are_ignored() {
			let profile = build(r#"<doc><paragraph releasableTo="GBR"/></doc>"#);
			assert!(profile.is_empty());
		}

		#[test]
		fn colliding_local_names_count_once_per_element() {
			let profile = build(
				r#"<doc xmlns:a="urn:a" xmlns:b="urn:b">
					<security a:classification="A B" b:classification="B C"/>
					<security a:releasableTo="GBR" b:releasableTo="USA"/>
				</doc>"#,
			);
			assert_eq!(profile.values("classification"), Some(&set(&["A", "B"])));
			assert_eq!(profile.values("releasableTo"), Some(&set(&["GBR"])));
		}

		#[test]
		fn namespaced_elements_match_on_local_name() {
			let profile = build(
				r#"<m:doc xmlns:m="urn:example"><m:security m:releasableTo="GBR"/></m:doc>"#,
			);
			assert_eq!(profile.values("releasableTo"), Some(&set(&["GBR"])));
		}
	}

	mod degraded_input {
		use super::*;

		#[test]
		fn malformed_document_yields_empty_profile() {
			let rules = rules();
			let chain = ExpansionChain::empty();
			let builder = SecurityProfileBuilder::new(&rules, &chain);
			let (profile, stats) = builder.build_with_stats(XmlElementSource::new(
				r#"<doc><security releasableTo="GBR"></doc>"#,
			));
			assert!(profile.is_empty());
			assert!(stats.malformed);
			assert_eq!(stats.matched_elements, 1);
		}

		#[test]
		fn absent_document_yields_empty_profile() {
			let rules = rules();
			let chain = ExpansionChain::empty();
			let profile = SecurityProfileBuilder::new(&rules, &chain).build_xml_opt(None);
			assert!(profile.is_empty());
		}
	}

	#[test]
	fn aggregated_values_are_expanded() {
		let rules = rules();
		let fvey: Arc<dyn Expansion> = Arc::new(FnExpansion::new(
			"fvey",
			|attribute: &str, values: &ValueSet| {
				let mut out = values.clone();
				if attribute == "releasableTo" && values.contains("GBR") {
					out.insert("FVEY".to_string());
				}
				out
			},
		));
		let chain = ExpansionChain::new(vec![fvey]);
		let profile =
			SecurityProfileBuilder::new(&rules, &chain)
				.build_xml(r#"<security releasableTo="GBR"/>"#);
		assert_eq!(profile.values("releasableTo"), Some(&set(&["FVEY", "GBR"])));
	}

	#[test]
	fn works_with_any_element_source() {
		let rules = rules();
		let chain = ExpansionChain::empty();
		let source = VecElementSource::new(vec![
			StartElement::new("security").with_attribute("classification", "A B C"),
			StartElement::new("security").with_attribute("classification", "B C D"),
		]);
		let profile = SecurityProfileBuilder::new(&rules, &chain).build(source);
		assert_eq!(profile.values("classification"), Some(&set(&["B", "C"])));
	}
}
