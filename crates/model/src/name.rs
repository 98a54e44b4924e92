use std::borrow::Cow;
use std::fmt;

/// A qualified wire name: optional namespace plus local name.
///
/// An absent namespace is distinct from the empty-string namespace; both take part in
/// equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireName {
	namespace: Option<String>,
	name: String,
}

impl WireName {
	/// Creates a wire name from an optional namespace and a local name.
	pub fn new(namespace: Option<impl Into<String>>, name: impl Into<String>) -> Self {
		Self {
			namespace: namespace.map(Into::into),
			name: name.into(),
		}
	}

	/// Creates a namespaced wire name.
	pub fn qualified(namespace: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			namespace: Some(namespace.into()),
			name: name.into(),
		}
	}

	/// Creates a wire name without a namespace.
	pub fn local(name: impl Into<String>) -> Self {
		Self {
			namespace: None,
			name: name.into(),
		}
	}

	/// Returns the namespace, if any.
	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	/// Returns the local name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns true if this name has the given namespace and local name.
	pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
		self.namespace.as_deref() == namespace && self.name == name
	}
}

impl fmt::Display for WireName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.namespace {
			Some(ns) => write!(f, "{{{ns}}}{}", self.name),
			None => f.write_str(&self.name),
		}
	}
}

/// Stable identifier of a local type.
///
/// The registry keys its encode-side mapping by `TypeKey`, and property descriptors use it as
/// the declared type hint. Rust types default to their [`std::any::type_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
	/// Untyped: matches any value and maps to the generic `anyType` wire name.
	pub const ANY: Self = Self::new("any");
	/// UTF-8 string scalar.
	pub const STRING: Self = Self::new("string");
	/// 32-bit signed integer scalar.
	pub const INT: Self = Self::new("int");
	/// 64-bit signed integer scalar.
	pub const LONG: Self = Self::new("long");
	/// Boolean scalar.
	pub const BOOLEAN: Self = Self::new("boolean");
	/// 32-bit float scalar.
	pub const FLOAT: Self = Self::new("float");
	/// 64-bit float scalar.
	pub const DOUBLE: Self = Self::new("double");
	/// Binary payload scalar.
	pub const BYTES: Self = Self::new("bytes");
	/// Timestamp scalar.
	pub const DATE_TIME: Self = Self::new("date-time");
	/// Ordered sequence of values.
	pub const SEQUENCE: Self = Self::new("sequence");
	/// Runtime-declared property bag.
	pub const RECORD: Self = Self::new("record");

	/// Creates a key from a static string.
	pub const fn new(key: &'static str) -> Self {
		Self(Cow::Borrowed(key))
	}

	/// Creates a key from an owned string.
	pub fn owned(key: String) -> Self {
		Self(Cow::Owned(key))
	}

	/// Returns the key for the Rust type `T`.
	pub fn of<T: ?Sized>() -> Self {
		Self::new(std::any::type_name::<T>())
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns true for [`TypeKey::ANY`].
	pub fn is_any(&self) -> bool {
		*self == Self::ANY
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn absent_namespace_differs_from_empty() {
		let none = WireName::local("item");
		let empty = WireName::qualified("", "item");
		assert_ne!(none, empty);

		let set: HashSet<_> = [none.clone(), empty.clone()].into_iter().collect();
		assert_eq!(set.len(), 2);
		assert!(none.is(None, "item"));
		assert!(empty.is(Some(""), "item"));
	}

	#[test]
	fn display_uses_clark_notation() {
		assert_eq!(WireName::qualified("urn:pds", "instrument").to_string(), "{urn:pds}instrument");
		assert_eq!(WireName::local("item").to_string(), "item");
	}

	#[test]
	fn type_key_of_is_stable_per_type() {
		struct Probe;
		assert_eq!(TypeKey::of::<Probe>(), TypeKey::of::<Probe>());
		assert_ne!(TypeKey::of::<Probe>(), TypeKey::of::<String>());
		assert!(TypeKey::ANY.is_any());
		assert!(!TypeKey::STRING.is_any());
	}

	#[test]
	fn owned_and_static_keys_compare_by_content() {
		assert_eq!(TypeKey::owned("string".to_string()), TypeKey::STRING);
	}
}
