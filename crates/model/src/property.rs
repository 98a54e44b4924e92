use std::borrow::Cow;

use bitflags::bitflags;

use crate::name::TypeKey;

bitflags! {
	/// Encoding flags carried by a [`PropertyInfo`].
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct PropertyFlags: u8 {
		/// Never written to the wire.
		const TRANSIENT = 1;
		/// Written once with an `id` and referenced by `href` everywhere else.
		const MULTI_REF = 2;
		/// Always carried by reference, never inlined without an id.
		const REF_ONLY = 4;
	}
}

/// Static metadata for one property of a serializable type.
///
/// Descriptors are ordered; both encode and decode walk them in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
	/// Element name on the wire. Empty for the generic descriptor.
	pub name: Cow<'static, str>,
	/// Namespace of the element. `None` matches any namespace when decoding.
	pub namespace: Option<Cow<'static, str>>,
	/// Encoding flags.
	pub flags: PropertyFlags,
	/// Declared type of the property value.
	pub type_hint: TypeKey,
	/// Descriptor for the items of an array property.
	pub element: Option<Box<PropertyInfo>>,
}

impl PropertyInfo {
	/// Creates an untyped descriptor named `name`.
	pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
		Self {
			name: name.into(),
			namespace: None,
			flags: PropertyFlags::empty(),
			type_hint: TypeKey::ANY,
			element: None,
		}
	}

	/// The generic descriptor: no name, any namespace, any type.
	pub fn any() -> Self {
		Self::new("")
	}

	/// Sets the element namespace.
	pub fn with_namespace(mut self, namespace: impl Into<Cow<'static, str>>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	/// Sets the declared type.
	pub fn with_type(mut self, type_hint: TypeKey) -> Self {
		self.type_hint = type_hint;
		self
	}

	/// Replaces the flag set.
	pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
		self.flags = flags;
		self
	}

	/// Declares this property as a sequence whose items follow `element`.
	pub fn with_element(mut self, element: PropertyInfo) -> Self {
		self.type_hint = TypeKey::SEQUENCE;
		self.element = Some(Box::new(element));
		self
	}

	/// Marks the property transient.
	pub fn transient(mut self) -> Self {
		self.flags |= PropertyFlags::TRANSIENT;
		self
	}

	/// Marks the property multi-referenced.
	pub fn multi_ref(mut self) -> Self {
		self.flags |= PropertyFlags::MULTI_REF;
		self
	}

	/// Marks the property reference-only.
	pub fn ref_only(mut self) -> Self {
		self.flags |= PropertyFlags::REF_ONLY;
		self
	}

	/// Returns the namespace, if any.
	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	/// Returns true if the property is skipped on encode.
	pub fn is_transient(&self) -> bool {
		self.flags.contains(PropertyFlags::TRANSIENT)
	}

	/// Returns true if the value must be carried by id/href.
	pub fn is_by_reference(&self) -> bool {
		self.flags.intersects(PropertyFlags::MULTI_REF | PropertyFlags::REF_ONLY)
	}

	/// Returns true if a parsed element `(namespace, name)` belongs to this property.
	pub fn matches(&self, namespace: Option<&str>, name: &str) -> bool {
		if self.name != name {
			return false;
		}
		match &self.namespace {
			None => true,
			Some(ns) => namespace == Some(ns.as_ref()),
		}
	}
}

impl Default for PropertyInfo {
	fn default() -> Self {
		Self::any()
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(None, Some("urn:a"), "value", true)]
	#[case(None, None, "value", true)]
	#[case(Some("urn:a"), Some("urn:a"), "value", true)]
	#[case(Some("urn:a"), Some("urn:b"), "value", false)]
	#[case(Some("urn:a"), None, "value", false)]
	#[case(None, Some("urn:a"), "other", false)]
	fn matches_name_and_optional_namespace(
		#[case] declared: Option<&'static str>,
		#[case] parsed: Option<&str>,
		#[case] name: &str,
		#[case] expected: bool,
	) {
		let mut info = PropertyInfo::new("value");
		if let Some(ns) = declared {
			info = info.with_namespace(ns);
		}
		assert_eq!(info.matches(parsed, name), expected);
	}

	#[test]
	fn reference_flags() {
		assert!(!PropertyInfo::new("a").is_by_reference());
		assert!(PropertyInfo::new("a").multi_ref().is_by_reference());
		assert!(PropertyInfo::new("a").ref_only().is_by_reference());
		assert!(PropertyInfo::new("a").transient().is_transient());
	}

	#[test]
	fn element_descriptor_makes_a_sequence() {
		let info = PropertyInfo::new("hosts").with_element(PropertyInfo::new("host").with_type(TypeKey::STRING));
		assert_eq!(info.type_hint, TypeKey::SEQUENCE);
		assert_eq!(info.element.as_ref().map(|e| e.name.as_ref()), Some("host"));
	}
}
