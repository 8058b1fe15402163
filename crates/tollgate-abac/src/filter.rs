// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch filtering of resources by access decision.

use std::slice;
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::engine::evaluate;
use crate::types::{PermissionSet, PolicyRules};

/// Retained resources plus counts for the caller's result metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome<R> {
	/// Granted resources in their original relative order.
	pub retained: Vec<R>,
	/// Number of resources considered.
	pub total: usize,
	/// Number of resources withheld.
	pub denied: usize,
}

impl<R> FilterOutcome<R> {
	/// The updated result count.
	pub fn count(&self) -> usize {
		self.retained.len()
	}
}

/// Applies one subject and rule set across many resource profiles.
#[derive(Debug, Clone, Copy)]
pub struct ResultFilter<'a> {
	subject: &'a PermissionSet,
	rules: &'a PolicyRules,
}

impl<'a> ResultFilter<'a> {
	pub fn new(subject: &'a PermissionSet, rules: &'a PolicyRules) -> Self {
		Self { subject, rules }
	}

	pub fn is_allowed(&self, profile: &PermissionSet) -> bool {
		evaluate(self.subject, profile, self.rules)
	}

	/// Evaluates each item once, in order, and keeps the granted resources.
	pub fn filter<R, I>(&self, items: I) -> FilterOutcome<R>
	where
		I: IntoIterator<Item = (R, PermissionSet)>,
	{
		let mut total = 0;
		let mut retained = Vec::new();
		for (resource, profile) in items {
			total += 1;
			if self.is_allowed(&profile) {
				retained.push(resource);
			}
		}
		FilterOutcome {
			denied: total - retained.len(),
			retained,
			total,
		}
	}

	/// Lazily yields granted resources. Cloning the iterator restarts
	/// evaluation from the clone's position.
	pub fn iter<'i, R>(&self, items: &'i [(R, PermissionSet)]) -> Retained<'i, 'a, R> {
		Retained {
			items: items.iter(),
			filter: *self,
		}
	}
}

/// Iterator returned by [`ResultFilter::iter`].
#[derive(Debug)]
pub struct Retained<'i, 'a, R> {
	items: slice::Iter<'i, (R, PermissionSet)>,
	filter: ResultFilter<'a>,
}

impl<R> Clone for Retained<'_, '_, R> {
	fn clone(&self) -> Self {
		Self {
			items: self.items.clone(),
			filter: self.filter,
		}
	}
}

impl<'i, R> Iterator for Retained<'i, '_, R> {
	type Item = &'i R;

	fn next(&mut self) -> Option<Self::Item> {
		let filter = self.filter;
		self
			.items
			.by_ref()
			.find(|(_, profile)| filter.is_allowed(profile))
			.map(|(resource, _)| resource)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(0, self.items.size_hint().1)
	}
}

/// Evaluates profiles on the blocking pool in `workers` contiguous chunks.
///
/// Output order matches input order regardless of which chunk finishes first.
/// A chunk whose task panics counts as denied for every item in it.
#[instrument(level = "debug", skip_all, fields(items = items.len(), workers = workers))]
pub async fn filter_concurrent<R>(
	items: Vec<(R, PermissionSet)>,
	subject: Arc<PermissionSet>,
	rules: Arc<PolicyRules>,
	workers: usize,
) -> FilterOutcome<R> {
	let total = items.len();
	let (resources, profiles): (Vec<R>, Vec<PermissionSet>) = items.into_iter().unzip();
	let chunk_size = total.div_ceil(workers.max(1)).max(1);

	let mut tasks = Vec::new();
	let mut profiles = profiles.into_iter();
	loop {
		let chunk: Vec<PermissionSet> = profiles.by_ref().take(chunk_size).collect();
		if chunk.is_empty() {
			break;
		}
		let len = chunk.len();
		let subject = Arc::clone(&subject);
		let rules = Arc::clone(&rules);
		let handle = tokio::task::spawn_blocking(move || {
			chunk
				.iter()
				.map(|profile| evaluate(&subject, profile, &rules))
				.collect::<Vec<bool>>()
		});
		tasks.push((len, handle));
	}

	let mut decisions = Vec::with_capacity(total);
	for (index, (len, handle)) in tasks.into_iter().enumerate() {
		match handle.await {
			Ok(chunk) => decisions.extend(chunk),
			Err(e) => {
				warn!(
					chunk = index,
					items = len,
					error = %e,
					"Filter worker failed, denying chunk"
				);
				decisions.extend(std::iter::repeat(false).take(len));
			}
		}
	}

	let retained: Vec<R> = resources
		.into_iter()
		.zip(decisions)
		.filter_map(|(resource, granted)| granted.then_some(resource))
		.collect();

	FilterOutcome {
		denied: total - retained.len(),
		retained,
		total,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::MatchMode;

	fn subject() -> PermissionSet {
		PermissionSet::new()
			.with("rule", ["A", "B"])
			.with("country", ["GBR"])
	}

	fn rules() -> PolicyRules {
		PolicyRules::from_modes([("rule", MatchMode::All), ("country", MatchMode::One)])
	}

	fn items() -> Vec<(&'static str, PermissionSet)> {
		vec![
			("R1", PermissionSet::new().with("rule", ["A", "B", "CR", "WS"])),
			(
				"R2",
				PermissionSet::new()
					.with("rule", ["A", "B"])
					.with("country", ["AUS", "CAN", "GBR"]),
			),
			(
				"R3",
				PermissionSet::new()
					.with("rule", ["A", "B"])
					.with("country", ["AUS"]),
			),
		]
	}

	mod sequential {
		use super::*;

		#[test]
		fn retains_granted_resources_with_counts() {
			let (subject, rules) = (subject(), rules());
			let outcome = ResultFilter::new(&subject, &rules).filter(items());
			assert_eq!(outcome.retained, vec!["R2"]);
			assert_eq!(outcome.count(), 1);
			assert_eq!(outcome.total, 3);
			assert_eq!(outcome.denied, 2);
		}

		#[test]
		fn preserves_input_order() {
			let (subject, rules) = (subject(), rules());
			let open = || PermissionSet::new();
			let items = vec![("c", open()), ("a", open()), ("b", open())];
			let outcome = ResultFilter::new(&subject, &rules).filter(items);
			assert_eq!(outcome.retained, vec!["c", "a", "b"]);
		}

		#[test]
		fn empty_input() {
			let (subject, rules) = (subject(), rules());
			let outcome =
				ResultFilter::new(&subject, &rules).filter(Vec::<(u32, PermissionSet)>::new());
			assert!(outcome.retained.is_empty());
			assert_eq!(outcome.total, 0);
			assert_eq!(outcome.denied, 0);
		}
	}

	mod lazy {
		use super::*;

		#[test]
		fn yields_granted_resources() {
			let (subject, rules) = (subject(), rules());
			let items = items();
			let retained: Vec<_> = ResultFilter::new(&subject, &rules).iter(&items).collect();
			assert_eq!(retained, vec![&"R2"]);
		}

		#[test]
		fn is_restartable() {
			let (subject, rules) = (subject(), rules());
			let items = items();
			let iter = ResultFilter::new(&subject, &rules).iter(&items);
			let first: Vec<_> = iter.clone().collect();
			let second: Vec<_> = iter.collect();
			assert_eq!(first, second);
		}
	}

	mod concurrent {
		use super::*;

		#[tokio::test]
		async fn matches_sequential_result() {
			let outcome =
				filter_concurrent(items(), Arc::new(subject()), Arc::new(rules()), 2).await;
			assert_eq!(outcome.retained, vec!["R2"]);
			assert_eq!(outcome.total, 3);
			assert_eq!(outcome.denied, 2);
		}

		#[tokio::test]
		async fn preserves_order_across_chunks() {
			let items: Vec<(usize, PermissionSet)> = (0..50)
				.map(|i| {
					let country = if i % 3 == 0 { "GBR" } else { "AUS" };
					(i, PermissionSet::new().with("country", [country]))
				})
				.collect();
			let expected: Vec<usize> = (0..50).filter(|i| i % 3 == 0).collect();

			let outcome = filter_concurrent(items, Arc::new(subject()), Arc::new(rules()), 4).await;
			assert_eq!(outcome.retained, expected);
		}

		#[tokio::test]
		async fn zero_workers_still_evaluates() {
			let outcome =
				filter_concurrent(items(), Arc::new(subject()), Arc::new(rules()), 0).await;
			assert_eq!(outcome.retained, vec!["R2"]);
		}

		#[tokio::test]
		async fn more_workers_than_items() {
			let outcome =
				filter_concurrent(items(), Arc::new(subject()), Arc::new(rules()), 16).await;
			assert_eq!(outcome.retained, vec!["R2"]);
		}

		#[tokio::test]
		async fn empty_input() {
			let outcome = filter_concurrent(
				Vec::<(u8, PermissionSet)>::new(),
				Arc::new(subject()),
				Arc::new(rules()),
				4,
			)
			.await;
			assert_eq!(outcome.total, 0);
			assert!(outcome.retained.is_empty());
		}
	}

	mod instrumentation {
		use super::*;
		use std::fmt;
		use std::sync::Mutex;
		use tracing::field::{Field, Visit};
		use tracing::span::{Attributes, Id};
		use tracing::Subscriber;
		use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

		#[derive(Clone, Default)]
		struct SpanFields(Arc<Mutex<Vec<(String, String)>>>);

		impl Visit for SpanFields {
			fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
				if let Ok(mut fields) = self.0.lock() {
					fields.push((field.name().to_string(), format!("{value:?}")));
				}
			}
		}

		impl<S: Subscriber> Layer<S> for SpanFields {
			fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
				attrs.record(&mut self.clone());
			}
		}

		#[tokio::test]
		async fn span_records_worker_count() {
			let fields = SpanFields::default();
			let subscriber = tracing_subscriber::registry().with(fields.clone());
			let _guard = tracing::subscriber::set_default(subscriber);

			filter_concurrent(items(), Arc::new(subject()), Arc::new(rules()), 4).await;

			let recorded = fields.0.lock().unwrap().clone();
			assert!(recorded.contains(&("items".to_string(), "3".to_string())));
			assert!(recorded.contains(&("workers".to_string(), "4".to_string())));
		}
	}
}
