//! Recursive-descent decode of one body.

use kwire_model::{ObjectRef, PropertyInfo, SequenceRef, Value, WireName};
use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::options::EnvelopeOptions;
use crate::refs::{ReferenceTracker, Slot};
use crate::registry::{TypeBinding, TypeRegistry};
use crate::token::{TokenError, TokenKind, TokenReader, describe};
use crate::version::SoapNamespaces;

/// Per-call decode state. Dropped when the body has been read.
pub(crate) struct DecodeSession<'a> {
	registry: &'a TypeRegistry,
	ns: SoapNamespaces,
	reader: &'a mut dyn TokenReader,
	refs: ReferenceTracker,
	max_depth: usize,
	max_array_len: usize,
	depth: usize,
}

impl<'a> DecodeSession<'a> {
	pub(crate) fn new(registry: &'a TypeRegistry, reader: &'a mut dyn TokenReader, options: &EnvelopeOptions) -> Self {
		Self {
			ns: registry.namespaces(),
			registry,
			reader,
			refs: ReferenceTracker::new(),
			max_depth: options.max_depth,
			max_array_len: options.max_array_len,
			depth: 0,
		}
	}

	/// Reads the top-level siblings starting at the current start tag, and stops on the first
	/// end tag after them. The first sibling is the result unless a later one carries
	/// `root="1"`.
	pub(crate) fn read_body(mut self) -> Result<Value, DecodeError> {
		let mut result = None;
		let mut siblings = 0usize;
		while self.reader.kind() == TokenKind::StartTag {
			let is_root = self.reader.attribute(Some(self.ns.enc), "root") == Some("1");
			let own_type = WireName::new(self.reader.namespace(), self.reader.name());
			let value = self
				.read_value(None, Some(own_type), &PropertyInfo::any())?
				.unwrap_or_default();
			if is_root || result.is_none() {
				result = Some(value);
			}
			siblings += 1;
			self.reader.next_tag()?;
		}
		self.refs.finish()?;
		debug!(siblings, "body decoded");
		Ok(result.unwrap_or_default())
	}

	/// Reads one element at the current start tag and stops on its end tag. Returns `None` when
	/// the element is an unresolved forward reference; the slot is patched later.
	fn read_value(
		&mut self,
		slot: Option<Slot>,
		given: Option<WireName>,
		expected: &PropertyInfo,
	) -> Result<Option<Value>, DecodeError> {
		self.depth += 1;
		if self.depth > self.max_depth {
			return Err(DecodeError::DepthExceeded(self.max_depth));
		}
		let element = self.reader.name().to_string();

		if let Some(href) = self.reader.attribute(None, "href").map(str::to_string) {
			let Some(slot) = slot else {
				return Err(DecodeError::RootReference(href));
			};
			let id = href.strip_prefix('#').unwrap_or(&href);
			let value = self.refs.reference(id, slot);
			self.expect_end(&element)?;
			self.depth -= 1;
			return Ok(value);
		}

		let id = self.reader.attribute(None, "id").map(str::to_string);
		let nil = self
			.reader
			.attribute(Some(self.ns.xsi), "nil")
			.or_else(|| self.reader.attribute(Some(self.ns.xsi), "null"))
			.is_some_and(is_true);

		let value = if nil {
			self.expect_end(&element)?;
			Value::Null
		} else {
			let wire = self.wire_type(given, expected)?;
			self.read_instance(&wire, expected)?
		};

		if let Some(id) = id {
			self.refs.bind(&id, &value)?;
		}
		self.depth -= 1;
		Ok(Some(value))
	}

	fn wire_type(&self, given: Option<WireName>, expected: &PropertyInfo) -> Result<WireName, DecodeError> {
		if let Some(declared) = self.reader.attribute(Some(self.ns.xsi), "type") {
			return self.qualified(declared);
		}
		if let Some(given) = given {
			return Ok(given);
		}
		if self.reader.attribute(Some(self.ns.enc), "arrayType").is_some() {
			return Ok(WireName::qualified(self.ns.enc, "Array"));
		}
		Ok(self.registry.resolve_for_type(&expected.type_hint).wire)
	}

	fn read_instance(&mut self, wire: &WireName, expected: &PropertyInfo) -> Result<Value, DecodeError> {
		match self.registry.resolve_for_decode(wire) {
			Some(TypeBinding::Marshal(marshal)) => marshal.read(&mut *self.reader, wire, expected),
			Some(TypeBinding::Sequence) => self.read_sequence(expected),
			Some(TypeBinding::Object(constructor)) => {
				let object = constructor();
				self.read_object(&object)?;
				Ok(Value::Object(object))
			}
			None => Err(DecodeError::UnknownType(wire.clone())),
		}
	}

	fn read_object(&mut self, object: &ObjectRef) -> Result<(), DecodeError> {
		while self.reader.next_tag()? == TokenKind::StartTag {
			let namespace = self.reader.namespace();
			let name = self.reader.name();
			let found = {
				let inner = object.borrow();
				(0..inner.property_count())
					.find(|&i| inner.property_info(i).matches(namespace, name))
					.map(|i| (i, inner.property_info(i).clone()))
			};
			let Some((index, info)) = found else {
				return Err(DecodeError::UnknownProperty {
					name: name.to_string(),
					owner: object.type_key(),
				});
			};
			let slot = Slot::Property {
				owner: object.clone(),
				index,
			};
			if let Some(value) = self.read_value(Some(slot), None, &info)? {
				object.borrow_mut().set_property(index, value)?;
			}
		}
		Ok(())
	}

	fn read_sequence(&mut self, expected: &PropertyInfo) -> Result<Value, DecodeError> {
		let element = expected.element.as_deref().cloned().unwrap_or_default();
		let sequence = SequenceRef::default();
		let mut item_type = None;

		if let Some(array_type) = self.reader.attribute(Some(self.ns.enc), "arrayType") {
			let (name, size) = self.array_type(array_type)?;
			item_type = Some(name);
			if let Some(size) = size {
				self.check_len(size)?;
				sequence.borrow_mut().resize(size);
			}
		}
		let mut position = match self.reader.attribute(Some(self.ns.enc), "offset") {
			Some(offset) => parse_index(offset)?.unwrap_or(0),
			None => 0,
		};

		while self.reader.next_tag()? == TokenKind::StartTag {
			if let Some(explicit) = self.reader.attribute(Some(self.ns.enc), "position") {
				position = parse_index(explicit)?.unwrap_or(position);
			}
			let len = position.checked_add(1).ok_or(DecodeError::ArrayTooLarge {
				index: position,
				limit: self.max_array_len,
			})?;
			self.check_len(len)?;
			let slot = Slot::Element {
				owner: sequence.clone(),
				index: position,
			};
			match self.read_value(Some(slot), item_type.clone(), &element)? {
				Some(value) => sequence.borrow_mut().set(position, value),
				None if position >= sequence.len() => sequence.borrow_mut().resize(len),
				None => trace!(position, "array item parked"),
			}
			position = len;
		}
		Ok(Value::Sequence(sequence))
	}

	/// Rejects arrays that would hold more than `max_array_len` slots.
	fn check_len(&self, len: usize) -> Result<(), DecodeError> {
		if len > self.max_array_len {
			return Err(DecodeError::ArrayTooLarge {
				index: len.saturating_sub(1),
				limit: self.max_array_len,
			});
		}
		Ok(())
	}

	/// Parses `prefix:name[size]`. An empty size (`[]`) means the array grows dynamically.
	fn array_type(&self, text: &str) -> Result<(WireName, Option<usize>), DecodeError> {
		let malformed = || DecodeError::MalformedArrayType(text.to_string());
		let open = text.find('[').ok_or_else(malformed)?;
		let name = self.qualified(&text[..open])?;
		let size = parse_index(&text[open..]).map_err(|_| malformed())?;
		Ok((name, size))
	}

	fn qualified(&self, text: &str) -> Result<WireName, DecodeError> {
		let (prefix, local) = text.split_once(':').unwrap_or(("", text));
		match self.reader.resolve_prefix(prefix) {
			Some("") if prefix.is_empty() => Ok(WireName::local(local)),
			Some(namespace) => Ok(WireName::qualified(namespace, local)),
			None if prefix.is_empty() => Ok(WireName::local(local)),
			None => Err(TokenError::UnboundPrefix(prefix.to_string()).into()),
		}
	}

	fn expect_end(&mut self, element: &str) -> Result<(), DecodeError> {
		if self.reader.next_tag()? == TokenKind::EndTag {
			return Ok(());
		}
		Err(DecodeError::UnexpectedTag {
			expected: format!("end tag </{element}>"),
			found: describe(&*self.reader),
		})
	}
}

fn is_true(text: &str) -> bool {
	let text = text.trim();
	text == "1" || text.eq_ignore_ascii_case("true")
}

/// Parses `[n]`. Returns `None` for `[]`.
fn parse_index(text: &str) -> Result<Option<usize>, DecodeError> {
	let invalid = || DecodeError::InvalidIndex(text.to_string());
	let inner = text
		.trim()
		.strip_prefix('[')
		.and_then(|rest| rest.strip_suffix(']'))
		.ok_or_else(invalid)?;
	if inner.trim().is_empty() {
		return Ok(None);
	}
	inner.trim().parse().map(Some).map_err(|_| invalid())
}
