// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ABAC policy evaluation.
//!
//! A resource profile lists the attributes a subject must satisfy. Every
//! attribute name in the profile is checked on its own and access is granted
//! only when all of them pass:
//!
//! ```text
//! for each (name, required) in resource profile
//!     │
//!     ├── required is empty         → unrestricted, pass
//!     ├── no rule for name          → fail (never guess a mode)
//!     ├── rule = All                → pass iff required ⊆ held
//!     └── rule = One                → pass iff required ∩ held ≠ ∅
//! ```
//!
//! An empty profile grants to everyone. A subject with no attributes is
//! denied by any profile that has at least one non-empty requirement.
//!
//! These functions are pure and never log; the engine handle in
//! [`crate::service`] records decisions.

use serde::Serialize;

use crate::types::{MatchMode, PermissionSet, PolicyRules, ValueSet};

/// Result of checking one resource attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
	/// The subject holds what the rule requires.
	Satisfied,
	/// The resource requires no values for this attribute.
	Unrestricted,
	/// `All` rule: the subject lacks `missing` of the required values.
	MissingValues { missing: usize },
	/// `One` rule: the subject holds none of the required values.
	NoOverlap,
	/// The attribute has no configured rule.
	Unconfigured,
}

impl CheckOutcome {
	pub fn is_satisfied(&self) -> bool {
		matches!(self, CheckOutcome::Satisfied | CheckOutcome::Unrestricted)
	}
}

/// Outcome for one attribute, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeCheck {
	pub attribute: String,
	pub mode: Option<MatchMode>,
	pub outcome: CheckOutcome,
}

/// Full account of a decision: one check per resource attribute, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Decision {
	pub checks: Vec<AttributeCheck>,
}

impl Decision {
	pub fn is_granted(&self) -> bool {
		self.checks.iter().all(|c| c.outcome.is_satisfied())
	}

	/// Names of the attributes that caused a denial.
	pub fn failed_attributes(&self) -> impl Iterator<Item = &str> {
		self
			.checks
			.iter()
			.filter(|c| !c.outcome.is_satisfied())
			.map(|c| c.attribute.as_str())
	}
}

/// Returns true if `subject` satisfies every requirement of `resource`.
pub fn evaluate(subject: &PermissionSet, resource: &PermissionSet, rules: &PolicyRules) -> bool {
	resource
		.iter()
		.all(|required| {
			check_attribute(&required.name, &required.values, subject, rules).is_satisfied()
		})
}

/// Like [`evaluate`], but checks every attribute and reports each outcome.
pub fn explain(subject: &PermissionSet, resource: &PermissionSet, rules: &PolicyRules) -> Decision {
	let checks = resource
		.iter()
		.map(|required| AttributeCheck {
			attribute: required.name.clone(),
			mode: rules.get(&required.name).map(|r| r.mode),
			outcome: check_attribute(&required.name, &required.values, subject, rules),
		})
		.collect();
	Decision { checks }
}

/// Checks a single resource attribute against the subject.
pub fn check_attribute(
	name: &str,
	required: &ValueSet,
	subject: &PermissionSet,
	rules: &PolicyRules,
) -> CheckOutcome {
	if required.is_empty() {
		return CheckOutcome::Unrestricted;
	}

	let Some(rule) = rules.get(name) else {
		return CheckOutcome::Unconfigured;
	};

	let empty = ValueSet::new();
	let held = subject
		.values(rule.subject_attribute_for(name))
		.unwrap_or(&empty);

	match rule.mode {
		MatchMode::All => {
			let missing = required.difference(held).count();
			if missing == 0 {
				CheckOutcome::Satisfied
			} else {
				CheckOutcome::MissingValues { missing }
			}
		}
		MatchMode::One => {
			if required.iter().any(|value| held.contains(value)) {
				CheckOutcome::Satisfied
			} else {
				CheckOutcome::NoOverlap
			}
		}
	}
}
