// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Streaming element readers.
//!
//! The profile builder only needs start-element events with their attributes,
//! so any pull parser can feed it through [`ElementSource`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// A start (or self-closing) element and its attributes, names without namespace prefix.
///
/// Dropping prefixes means `a:x` and `b:x` on one element both appear as `x`,
/// in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
	pub name: String,
	pub attributes: Vec<(String, String)>,
}

impl StartElement {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			attributes: Vec::new(),
		}
	}

	/// Builder: add an attribute.
	pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.push((name.into(), value.into()));
		self
	}
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed document at byte {position}: {message}")]
pub struct ReadError {
	pub position: u64,
	pub message: String,
}

/// Pull-style source of start-element events.
///
/// After yielding an error a source should yield `None`.
pub trait ElementSource {
	fn next_start(&mut self) -> Option<Result<StartElement, ReadError>>;
}

/// Replays a fixed list of elements. Useful when the document has already been parsed.
#[derive(Debug, Clone)]
pub struct VecElementSource {
	elements: std::vec::IntoIter<StartElement>,
}

impl VecElementSource {
	pub fn new(elements: Vec<StartElement>) -> Self {
		Self {
			elements: elements.into_iter(),
		}
	}
}

impl ElementSource for VecElementSource {
	fn next_start(&mut self) -> Option<Result<StartElement, ReadError>> {
		self.elements.next().map(Ok)
	}
}

/// [`ElementSource`] over an XML document held in memory.
pub struct XmlElementSource<'a> {
	reader: Reader<&'a [u8]>,
	done: bool,
}

impl<'a> XmlElementSource<'a> {
	pub fn new(document: &'a str) -> Self {
		let mut reader = Reader::from_str(document);
		reader.config_mut().trim_text(true);
		Self {
			reader,
			done: false,
		}
	}

	fn error(&self, message: impl Into<String>) -> ReadError {
		ReadError {
			position: self.reader.buffer_position() as u64,
			message: message.into(),
		}
	}

	fn start_element(&self, start: &BytesStart<'_>) -> Result<StartElement, ReadError> {
		let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
		let mut attributes = Vec::new();

		for attribute in start.attributes() {
			let attribute = attribute.map_err(|e| self.error(e.to_string()))?;
			if attribute.key.as_namespace_binding().is_some() {
				continue;
			}
			let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
			let value = attribute
				.unescape_value()
				.map_err(|e| self.error(e.to_string()))?
				.into_owned();
			attributes.push((key, value));
		}

		Ok(StartElement { name, attributes })
	}
}

impl ElementSource for XmlElementSource<'_> {
	fn next_start(&mut self) -> Option<Result<StartElement, ReadError>> {
		if self.done {
			return None;
		}

		loop {
			match self.reader.read_event() {
				Ok(Event::Start(start)) | Ok(Event::Empty(start)) => {
					let element = self.start_element(&start);
					if element.is_err() {
						self.done = true;
					}
					return Some(element);
				}
				Ok(Event::Eof) => {
					self.done = true;
					return None;
				}
				Ok(_) => continue,
				Err(e) => {
					self.done = true;
					return Some(Err(self.error(e.to_string())));
				}
			}
		}
	}
}
