//! Recursive encode of one body.
//!
//! Objects and sequences reachable more than once, or placed in a multi-ref property, are
//! written inline at their first occurrence with `id="oN"`; every later occurrence is an
//! `href="#oN"` pointer. The root is always inline and owns index 0.

use kwire_model::{ObjectRef, PropertyInfo, SequenceRef, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::EncodeError;
use crate::options::EnvelopeOptions;
use crate::registry::{TypeMapping, TypeRegistry};
use crate::token::TokenWriter;
use crate::version::SoapNamespaces;

const ITEM_TAG: &str = "item";

/// Per-call encode state.
pub(crate) struct EncodeSession<'a> {
	registry: &'a TypeRegistry,
	ns: SoapNamespaces,
	implicit_types: bool,
	max_depth: usize,
	depth: usize,
	writer: &'a mut dyn TokenWriter,
	written: Vec<Value>,
	indices: FxHashMap<usize, usize>,
	shared: FxHashSet<usize>,
}

impl<'a> EncodeSession<'a> {
	pub(crate) fn new(registry: &'a TypeRegistry, writer: &'a mut dyn TokenWriter, options: &EnvelopeOptions) -> Self {
		Self {
			ns: registry.namespaces(),
			registry,
			implicit_types: options.implicit_types,
			max_depth: options.max_depth,
			depth: 1,
			writer,
			written: Vec::new(),
			indices: FxHashMap::default(),
			shared: FxHashSet::default(),
		}
	}

	/// Writes `root` as a complete element named by its wire type.
	pub(crate) fn write_root(mut self, root: &Value) -> Result<(), EncodeError> {
		if root.is_null() {
			return Err(EncodeError::NullValue("body".to_string()));
		}
		self.shared = shared_identities(root);
		self.written.push(root.clone());
		let mapping = self.registry.resolve_for_encode(root);
		let (namespace, name) = (mapping.wire.namespace(), mapping.wire.name());

		self.writer.start_tag(namespace, name)?;
		if let Some(identity) = root.identity() {
			self.indices.insert(identity, 0);
			if self.shared.contains(&identity) {
				self.writer.attribute(None, "id", "o0")?;
			}
		}
		self.write_element(root, &PropertyInfo::any(), &mapping)?;
		self.writer.end_tag(namespace, name)?;
		debug!(root = %mapping.wire, referenced = self.written.len() - 1, "body encoded");
		Ok(())
	}

	/// Writes attributes and content of `value` into the already open element for `info`.
	fn write_property(&mut self, value: &Value, info: &PropertyInfo) -> Result<(), EncodeError> {
		if self.depth >= self.max_depth {
			return Err(EncodeError::DepthExceeded(self.max_depth));
		}
		self.depth += 1;
		let written = self.write_nested(value, info);
		self.depth -= 1;
		written
	}

	fn write_nested(&mut self, value: &Value, info: &PropertyInfo) -> Result<(), EncodeError> {
		if value.is_null() {
			return Err(EncodeError::NullValue(info.name.to_string()));
		}
		if let Some(identity) = value.identity() {
			if let Some(index) = self.indices.get(&identity) {
				self.writer.attribute(None, "href", &format!("#o{index}"))?;
				return Ok(());
			}
			if info.is_by_reference() || self.shared.contains(&identity) {
				let index = self.written.len();
				self.written.push(value.clone());
				self.indices.insert(identity, index);
				self.writer.attribute(None, "id", &format!("o{index}"))?;
			}
		}

		let mapping = self.registry.resolve_for_encode(value);
		if !self.implicit_types || value.type_key() != info.type_hint {
			let qualified = self.qualify(&mapping)?;
			self.writer.attribute(Some(self.ns.xsi), "type", &qualified)?;
		}
		self.write_element(value, info, &mapping)
	}

	fn write_element(&mut self, value: &Value, info: &PropertyInfo, mapping: &TypeMapping) -> Result<(), EncodeError> {
		match (value, &mapping.marshal) {
			(Value::Opaque(opaque), _) => {
				self.writer.text(&opaque.text)?;
				Ok(())
			}
			(_, Some(marshal)) => marshal.write(&mut *self.writer, &mapping.wire, value),
			(Value::Object(object), None) => self.write_object(object),
			(Value::Sequence(sequence), None) => self.write_sequence(sequence, info),
			(Value::Null, None) => Err(EncodeError::NullValue(info.name.to_string())),
			(other, None) => Err(EncodeError::Unsupported {
				kind: other.kind(),
				type_key: other.type_key(),
			}),
		}
	}

	fn write_object(&mut self, object: &ObjectRef) -> Result<(), EncodeError> {
		for (info, value) in object.entries() {
			if value.is_null() || info.is_transient() {
				continue;
			}
			let namespace = info.namespace();
			self.writer.start_tag(namespace, &info.name)?;
			self.write_property(&value, &info)?;
			self.writer.end_tag(namespace, &info.name)?;
		}
		Ok(())
	}

	fn write_sequence(&mut self, sequence: &SequenceRef, info: &PropertyInfo) -> Result<(), EncodeError> {
		let element = info.element.as_deref().cloned().unwrap_or_default();
		let (tag_namespace, tag) = if element.name.is_empty() {
			(None, ITEM_TAG)
		} else {
			(element.namespace(), element.name.as_ref())
		};
		let items = sequence.to_vec();

		if !self.implicit_types {
			let item_type = self.registry.resolve_for_type(&element.type_hint);
			let qualified = self.qualify(&item_type)?;
			let array_type = format!("{qualified}[{}]", items.len());
			self.writer.attribute(Some(self.ns.enc), "arrayType", &array_type)?;
		}

		let mut skipped = false;
		for (index, item) in items.iter().enumerate() {
			if item.is_null() {
				skipped = true;
				continue;
			}
			self.writer.start_tag(tag_namespace, tag)?;
			if skipped {
				self.writer.attribute(Some(self.ns.enc), "position", &format!("[{index}]"))?;
				skipped = false;
			}
			self.write_property(item, &element)?;
			self.writer.end_tag(tag_namespace, tag)?;
		}
		Ok(())
	}

	/// `prefix:name` for a mapping's wire name, declaring the prefix if needed.
	fn qualify(&mut self, mapping: &TypeMapping) -> Result<String, EncodeError> {
		Ok(match mapping.wire.namespace() {
			Some(namespace) => format!("{}:{}", self.writer.prefix(namespace)?, mapping.wire.name()),
			None => mapping.wire.name().to_string(),
		})
	}
}

/// Identities of objects and sequences reachable more than once from `root`.
fn shared_identities(root: &Value) -> FxHashSet<usize> {
	let mut seen = FxHashSet::default();
	let mut shared = FxHashSet::default();
	let mut stack = vec![root.clone()];
	while let Some(value) = stack.pop() {
		let Some(identity) = value.identity() else {
			continue;
		};
		if !seen.insert(identity) {
			shared.insert(identity);
			continue;
		}
		match &value {
			Value::Object(object) => stack.extend(
				object
					.entries()
					.into_iter()
					.filter(|(info, value)| !info.is_transient() && !value.is_null())
					.map(|(_, value)| value),
			),
			Value::Sequence(sequence) => stack.extend(sequence.to_vec().into_iter().filter(|v| !v.is_null())),
			_ => {}
		}
	}
	shared
}
