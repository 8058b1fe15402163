// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute-Based Access Control (ABAC) decision engine.
//!
//! Decides whether an identity may see a resource by comparing the attribute
//! values the identity holds with the security markings carried inside the
//! resource document.
//!
//! # Architecture
//!
//! 1. **Expansion** ([`expansion`]): ordered stages that enrich raw values
//! 2. **Profiles** ([`profile`]): scan a document's markings into a resource profile
//! 3. **Subjects** ([`subject`]): merge an identity assertion into subject permissions
//! 4. **Evaluation** ([`engine`]): pure ALL/ONE checks per attribute
//! 5. **Filtering** ([`filter`]): apply a decision across an ordered result set
//! 6. **Service** ([`service`]): shared handle with swappable configuration
//!
//! # Decision Flow
//!
//! ```text
//! identity assertion ─► SubjectAttributeBuilder ─► subject ──┐
//!                                                            ├─► evaluate ─► bool
//! document ──────────► SecurityProfileBuilder ──► profile ──┘       │
//!                                                                   ▼
//!                                  ResultFilter ─► retained resources + count
//! ```
//!
//! # Example
//!
//! ```
//! use tollgate_abac::{
//!     evaluate, AttributeStatement, ExpansionChain, IdentityAssertion, MatchMode, PolicyRules,
//!     ScanRules, SecurityProfileBuilder, SubjectAttributeBuilder,
//! };
//!
//! let chain = ExpansionChain::empty();
//! let scan = ScanRules::new()
//!     .with_elements(["para"])
//!     .with_union(["rule"]);
//! let rules = PolicyRules::from_modes([("rule", MatchMode::All)]);
//!
//! let profile = SecurityProfileBuilder::new(&scan, &chain)
//!     .build_xml(r#"<doc><para rule="A B">text</para></doc>"#);
//! let subject = SubjectAttributeBuilder::new(&chain).build(Some(&IdentityAssertion::single(
//!     AttributeStatement::new().with("rule", ["A", "B", "C"]),
//! )));
//!
//! assert!(evaluate(&subject, &profile, &rules));
//! ```

pub mod engine;
pub mod error;
pub mod expansion;
pub mod filter;
pub mod profile;
pub mod service;
pub mod subject;
pub mod types;

pub use engine::{check_attribute, evaluate, explain, AttributeCheck, CheckOutcome, Decision};
pub use error::{AbacError, Result};
pub use expansion::{
	expand, DirectoryLookup, Expansion, ExpansionChain, FnExpansion, LookupError, LookupExpansion,
	MappingExpansion,
};
pub use filter::{filter_concurrent, FilterOutcome, ResultFilter, Retained};
pub use profile::{
	ElementSource, ProfileStats, ReadError, ScanRules, SecurityProfileBuilder, StartElement,
	VecElementSource, XmlElementSource,
};
pub use service::{AbacEngine, DirectoryBackend, EngineConfig};
pub use subject::{
	AssertedAttribute, AttributeStatement, IdentityAssertion, SubjectAttributeBuilder,
};
pub use types::{AttributeValueSet, MatchMode, PermissionSet, PolicyRule, PolicyRules, ValueSet};
