// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Long-lived engine handle with atomically swappable configuration.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tollgate_config::AbacSettings;
use tracing::{debug, info, instrument, warn};

use crate::engine::{evaluate, explain, Decision};
use crate::error::{AbacError, Result};
use crate::expansion::{
	DirectoryLookup, Expansion, ExpansionChain, LookupExpansion, MappingExpansion,
};
use crate::filter::{FilterOutcome, ResultFilter};
use crate::profile::{ScanRules, SecurityProfileBuilder};
use crate::subject::{IdentityAssertion, SubjectAttributeBuilder};
use crate::types::{PermissionSet, PolicyRules};

/// A directory consulted during expansion.
///
/// The engine wraps each backend in a [`LookupExpansion`] bounded by the
/// configured `expansion.lookup_timeout_ms`.
#[derive(Clone)]
pub struct DirectoryBackend {
	name: String,
	directory: Arc<dyn DirectoryLookup>,
	attributes: Option<Vec<String>>,
}

impl DirectoryBackend {
	pub fn new(name: impl Into<String>, directory: impl DirectoryLookup + 'static) -> Self {
		Self::shared(name, Arc::new(directory))
	}

	pub fn shared(name: impl Into<String>, directory: Arc<dyn DirectoryLookup>) -> Self {
		Self {
			name: name.into(),
			directory,
			attributes: None,
		}
	}

	/// Builder: only consult this directory for these attribute names.
	pub fn for_attributes<I, S>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes = Some(attributes.into_iter().map(Into::into).collect());
		self
	}

	fn into_expansion(self, timeout: Duration) -> Arc<dyn Expansion> {
		let lookup = LookupExpansion::shared(self.name, self.directory, timeout);
		match self.attributes {
			Some(attributes) => Arc::new(lookup.for_attributes(attributes)),
			None => Arc::new(lookup),
		}
	}
}

impl fmt::Debug for DirectoryBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DirectoryBackend")
			.field("name", &self.name)
			.field("attributes", &self.attributes)
			.finish()
	}
}

/// Everything one evaluation needs. Replaced as a whole, never edited.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
	pub scan: ScanRules,
	pub rules: PolicyRules,
	pub chain: ExpansionChain,
}

impl EngineConfig {
	pub fn new(scan: ScanRules, rules: PolicyRules, chain: ExpansionChain) -> Self {
		Self { scan, rules, chain }
	}

	/// Builds an engine configuration from resolved settings.
	///
	/// The configured mapping table runs first, followed by one lookup stage per
	/// directory in order, each bounded by `expansion.lookup_timeout_ms`.
	pub fn from_settings(
		settings: &AbacSettings,
		directories: Vec<DirectoryBackend>,
	) -> Result<Self> {
		let conflicts = settings.scan.conflicting_attributes();
		if !conflicts.is_empty() {
			return Err(AbacError::Configuration(format!(
				"attributes configured for both union and intersection: {}",
				conflicts.join(", ")
			)));
		}
		let conflicts = settings.policy.conflicting_rules();
		if !conflicts.is_empty() {
			return Err(AbacError::Configuration(format!(
				"attributes configured as both match_all and match_one: {}",
				conflicts.join(", ")
			)));
		}

		let mapping = MappingExpansion::from_config(&settings.expansion)?;
		let timeout = settings.expansion.lookup_timeout();
		let mut stages: Vec<Arc<dyn Expansion>> = Vec::with_capacity(directories.len() + 1);
		if !mapping.is_empty() {
			stages.push(Arc::new(mapping));
		}
		stages.extend(directories.into_iter().map(|d| d.into_expansion(timeout)));

		let config = Self {
			scan: ScanRules::from_config(&settings.scan),
			rules: PolicyRules::from_config(&settings.policy),
			chain: ExpansionChain::new(stages),
		};

		let unconfigured = config.unconfigured_attributes();
		if !unconfigured.is_empty() {
			warn!(
				attributes = ?unconfigured,
				"Scanned attributes have no policy rule; resources carrying them will be denied"
			);
		}

		Ok(config)
	}

	/// Scanned attribute names with no policy rule.
	pub fn unconfigured_attributes(&self) -> Vec<&str> {
		let scanned: BTreeSet<&str> = self
			.scan
			.union_attributes
			.iter()
			.chain(self.scan.intersection_attributes.iter())
			.map(String::as_str)
			.collect();
		scanned
			.into_iter()
			.filter(|name| self.rules.get(name).is_none())
			.collect()
	}

	pub fn subject(&self, assertion: Option<&IdentityAssertion>) -> PermissionSet {
		SubjectAttributeBuilder::new(&self.chain).build(assertion)
	}

	pub fn profile(&self, document: Option<&str>) -> PermissionSet {
		SecurityProfileBuilder::new(&self.scan, &self.chain).build_xml_opt(document)
	}
}

/// Shared decision engine.
///
/// Each request loads one configuration snapshot and uses it throughout, so a
/// concurrent [`AbacEngine::reconfigure`] is observed entirely or not at all.
pub struct AbacEngine {
	config: ArcSwap<EngineConfig>,
}

impl AbacEngine {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			config: ArcSwap::from_pointee(config),
		}
	}

	pub fn from_settings(
		settings: &AbacSettings,
		directories: Vec<DirectoryBackend>,
	) -> Result<Self> {
		Ok(Self::new(EngineConfig::from_settings(settings, directories)?))
	}

	/// Loads settings from defaults, `path` and the `TOLLGATE_*` environment.
	pub fn load(path: impl Into<PathBuf>, directories: Vec<DirectoryBackend>) -> Result<Self> {
		let settings = tollgate_config::load_config_with_file(path)?;
		Self::from_settings(&settings, directories)
	}

	/// The configuration new requests will use.
	pub fn snapshot(&self) -> Arc<EngineConfig> {
		self.config.load_full()
	}

	/// Replaces the configuration for all subsequent requests.
	pub fn reconfigure(&self, config: EngineConfig) {
		info!(
			rules = config.rules.len(),
			expansion_stages = config.chain.len(),
			scanned_elements = config.scan.elements.len(),
			"Reconfiguring ABAC engine"
		);
		self.config.store(Arc::new(config));
	}

	/// Decides whether the asserted identity may see the document.
	#[instrument(
		level = "debug",
		skip_all,
		fields(has_assertion = assertion.is_some(), has_document = document.is_some())
	)]
	pub fn is_allowed(
		&self,
		assertion: Option<&IdentityAssertion>,
		document: Option<&str>,
	) -> bool {
		let config = self.snapshot();
		let subject = config.subject(assertion);
		let profile = config.profile(document);
		let granted = evaluate(&subject, &profile, &config.rules);
		debug!(
			subject_attributes = subject.len(),
			profile_attributes = profile.len(),
			granted,
			"ABAC decision"
		);
		granted
	}

	/// Like [`AbacEngine::is_allowed`], with the per-attribute breakdown.
	#[instrument(level = "debug", skip_all)]
	pub fn explain(
		&self,
		assertion: Option<&IdentityAssertion>,
		document: Option<&str>,
	) -> Decision {
		let config = self.snapshot();
		let subject = config.subject(assertion);
		let profile = config.profile(document);
		let decision = explain(&subject, &profile, &config.rules);
		if !decision.is_granted() {
			debug!(
				failed = ?decision.failed_attributes().collect::<Vec<_>>(),
				"ABAC denial"
			);
		}
		decision
	}

	/// Filters `(resource, document)` pairs for one identity.
	#[instrument(level = "debug", skip_all, fields(items = items.len()))]
	pub fn filter_documents<R, D>(
		&self,
		assertion: Option<&IdentityAssertion>,
		items: Vec<(R, D)>,
	) -> FilterOutcome<R>
	where
		D: AsRef<str>,
	{
		let config = self.snapshot();
		let subject = config.subject(assertion);
		let profiled = items
			.into_iter()
			.map(|(resource, document)| (resource, config.profile(Some(document.as_ref()))));
		let outcome = ResultFilter::new(&subject, &config.rules).filter(profiled);
		debug!(
			total = outcome.total,
			retained = outcome.count(),
			denied = outcome.denied,
			"Filtered results"
		);
		outcome
	}
}

impl fmt::Debug for AbacEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AbacEngine")
			.field("config", &self.snapshot())
			.finish()
	}
}
