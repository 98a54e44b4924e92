//! Wire name to local type bindings.

use std::fmt;
use std::sync::Arc;

use kwire_model::{ObjectRef, RecordSchema, Serializable, TypeKey, Value, WireName};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::marshal::{AnyTypeMarshal, Base64Marshal, DateMarshal, FloatMarshal, Marshal, PrimitiveMarshal};
use crate::version::{SoapNamespaces, SoapVersion};

/// Creates a fresh, empty instance of a bound object type.
pub type Constructor = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// What a wire name decodes into.
#[derive(Clone)]
pub enum TypeBinding {
	/// A constructible object type.
	Object(Constructor),
	/// The sequence type.
	Sequence,
	/// A marshal that reads the element directly.
	Marshal(Arc<dyn Marshal>),
}

impl fmt::Debug for TypeBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TypeBinding::Object(_) => f.write_str("Object(..)"),
			TypeBinding::Sequence => f.write_str("Sequence"),
			TypeBinding::Marshal(m) => write!(f, "Marshal({m:?})"),
		}
	}
}

/// Wire name and optional marshal a local type encodes as.
#[derive(Debug, Clone)]
pub struct TypeMapping {
	/// Wire type name.
	pub wire: WireName,
	/// Marshal that writes the value content, if any.
	pub marshal: Option<Arc<dyn Marshal>>,
}

#[derive(Default)]
struct Tables {
	by_wire: FxHashMap<WireName, TypeBinding>,
	by_key: FxHashMap<TypeKey, TypeMapping>,
}

/// Shared, thread-safe type registry.
///
/// Built once per protocol version and shared between envelopes through an `Arc`.
/// Registration is an upsert: the last binding for a wire name wins.
pub struct TypeRegistry {
	version: SoapVersion,
	tables: RwLock<Tables>,
}

impl TypeRegistry {
	/// Creates a registry with the array binding and the built-in marshals.
	pub fn new(version: SoapVersion) -> Self {
		let registry = Self {
			version,
			tables: RwLock::new(Tables::default()),
		};
		let ns = version.namespaces();
		registry.register(
			WireName::qualified(ns.enc, "Array"),
			Some(TypeKey::SEQUENCE),
			TypeBinding::Sequence,
		);
		Arc::new(PrimitiveMarshal).register(&registry);
		Arc::new(FloatMarshal).register(&registry);
		Arc::new(Base64Marshal).register(&registry);
		Arc::new(DateMarshal).register(&registry);
		Arc::new(AnyTypeMarshal).register(&registry);
		registry
	}

	/// Protocol version the registry's namespaces belong to.
	pub fn version(&self) -> SoapVersion {
		self.version
	}

	/// Namespace set of the registry's version.
	pub fn namespaces(&self) -> SoapNamespaces {
		self.version.namespaces()
	}

	/// Binds `wire` to `binding`, and `key` (if given) back to `wire`.
	pub fn register(&self, wire: WireName, key: Option<TypeKey>, binding: TypeBinding) {
		let mut tables = self.tables.write();
		if let Some(key) = key {
			let marshal = match &binding {
				TypeBinding::Marshal(m) => Some(m.clone()),
				_ => None,
			};
			let mapping = TypeMapping {
				wire: wire.clone(),
				marshal,
			};
			if let Some(previous) = tables.by_key.insert(key.clone(), mapping) {
				if previous.wire != wire {
					debug!(%key, from = %previous.wire, to = %wire, "type key remapped");
				}
			}
		}
		if tables.by_wire.insert(wire.clone(), binding).is_some() {
			debug!(%wire, "wire binding replaced");
		}
	}

	/// Binds `wire` to the object type `T`.
	pub fn add_mapping<T: Serializable + Default>(&self, wire: WireName) {
		let constructor: Constructor = Arc::new(|| ObjectRef::new(T::default()));
		self.register(wire, Some(TypeKey::of::<T>()), TypeBinding::Object(constructor));
	}

	/// Binds `wire` to a constructor producing objects whose type key is `key`.
	pub fn add_constructor<F>(&self, wire: WireName, key: TypeKey, constructor: F)
	where
		F: Fn() -> ObjectRef + Send + Sync + 'static,
	{
		self.register(wire, Some(key), TypeBinding::Object(Arc::new(constructor)));
	}

	/// Binds `wire` to `marshal`, and values with type key `key` back to `wire`.
	pub fn add_marshal(&self, wire: WireName, key: TypeKey, marshal: Arc<dyn Marshal>) {
		self.register(wire, Some(key), TypeBinding::Marshal(marshal));
	}

	/// Decodes elements of the schema's wire name into records. Records name themselves on
	/// encode, so no reverse mapping is added.
	pub fn add_record(&self, schema: RecordSchema) {
		let wire = schema.name().clone();
		let constructor: Constructor = Arc::new(move || ObjectRef::new(schema.instantiate()));
		self.register(wire, None, TypeBinding::Object(constructor));
	}

	/// Binding for a wire name, if registered.
	pub fn resolve_for_decode(&self, wire: &WireName) -> Option<TypeBinding> {
		self.tables.read().by_wire.get(wire).cloned()
	}

	/// Encode mapping for a type key. `ANY` and unknown keys map to `xsd:anyType`.
	pub fn resolve_for_type(&self, key: &TypeKey) -> TypeMapping {
		if !key.is_any() {
			if let Some(mapping) = self.tables.read().by_key.get(key) {
				return mapping.clone();
			}
		}
		self.any_type()
	}

	/// Encode mapping for a runtime value. Never fails.
	pub fn resolve_for_encode(&self, value: &Value) -> TypeMapping {
		match value {
			Value::Object(object) => match object.borrow().wire_name() {
				Some(wire) => TypeMapping { wire, marshal: None },
				None => self.resolve_for_type(&object.type_key()),
			},
			Value::Opaque(opaque) => TypeMapping {
				wire: opaque.type_name.clone(),
				marshal: None,
			},
			Value::Null => self.any_type(),
			other => self.resolve_for_type(&other.type_key()),
		}
	}

	/// The generic wire type.
	pub fn any_type(&self) -> TypeMapping {
		TypeMapping {
			wire: WireName::qualified(self.namespaces().xsd, "anyType"),
			marshal: None,
		}
	}

	/// Number of bound wire names.
	pub fn len(&self) -> usize {
		self.tables.read().by_wire.len()
	}

	/// Returns true if nothing is bound.
	pub fn is_empty(&self) -> bool {
		self.tables.read().by_wire.is_empty()
	}

	/// Returns true if `wire` is bound.
	pub fn contains(&self, wire: &WireName) -> bool {
		self.tables.read().by_wire.contains_key(wire)
	}
}

impl Default for TypeRegistry {
	fn default() -> Self {
		Self::new(SoapVersion::default())
	}
}

impl fmt::Debug for TypeRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeRegistry")
			.field("version", &self.version)
			.field("bindings", &self.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::thread;

	use kwire_model::{PropertyError, PropertyInfo, Record};
	use pretty_assertions::assert_eq;

	use super::*;

	#[derive(Debug, Default)]
	struct Empty;

	impl Serializable for Empty {
		fn property_count(&self) -> usize {
			0
		}

		fn property(&self, _index: usize) -> Value {
			Value::Null
		}

		fn set_property(&mut self, index: usize, _value: Value) -> Result<(), PropertyError> {
			Err(PropertyError::IndexOutOfRange { index, count: 0 })
		}

		fn property_info(&self, _index: usize) -> &PropertyInfo {
			unreachable!("Empty has no properties")
		}
	}

	fn ns() -> SoapNamespaces {
		SoapVersion::V11.namespaces()
	}

	#[test]
	fn builtins_are_registered() {
		let registry = TypeRegistry::new(SoapVersion::V11);
		assert!(registry.contains(&WireName::qualified(ns().enc, "Array")));
		assert!(registry.contains(&WireName::qualified(ns().xsd, "dateTime")));
		assert_eq!(
			registry.resolve_for_type(&TypeKey::SEQUENCE).wire,
			WireName::qualified(ns().enc, "Array")
		);
		assert_eq!(
			registry.resolve_for_type(&TypeKey::BYTES).wire,
			WireName::qualified(ns().xsd, "base64Binary")
		);
		assert!(matches!(
			registry.resolve_for_decode(&WireName::qualified(ns().enc, "base64")),
			Some(TypeBinding::Marshal(_))
		));
	}

	#[test]
	fn unknown_types_fall_back_to_any_type() {
		let registry = TypeRegistry::new(SoapVersion::V11);
		let mapping = registry.resolve_for_encode(&Value::object(Empty));
		assert_eq!(mapping.wire, WireName::qualified(ns().xsd, "anyType"));
		assert!(mapping.marshal.is_none());
		assert_eq!(registry.resolve_for_type(&TypeKey::ANY).wire, mapping.wire);
		assert!(registry.resolve_for_decode(&WireName::qualified("urn:x", "Missing")).is_none());
	}

	#[test]
	fn last_registration_wins() {
		let registry = TypeRegistry::new(SoapVersion::V11);
		let before = registry.len();
		registry.add_mapping::<Empty>(WireName::qualified("urn:x", "First"));
		registry.add_mapping::<Empty>(WireName::qualified("urn:x", "Second"));
		assert_eq!(registry.len(), before + 2);
		assert_eq!(
			registry.resolve_for_encode(&Value::object(Empty)).wire,
			WireName::qualified("urn:x", "Second")
		);

		registry.register(WireName::qualified("urn:x", "First"), None, TypeBinding::Sequence);
		assert_eq!(registry.len(), before + 2);
		assert!(matches!(
			registry.resolve_for_decode(&WireName::qualified("urn:x", "First")),
			Some(TypeBinding::Sequence)
		));
	}

	#[test]
	fn records_name_themselves() {
		let registry = TypeRegistry::new(SoapVersion::V11);
		let record = Value::object(Record::new(WireName::qualified("urn:x", "Query")));
		assert_eq!(registry.resolve_for_encode(&record).wire, WireName::qualified("urn:x", "Query"));
	}

	#[test]
	fn concurrent_registration() {
		let registry = Arc::new(TypeRegistry::new(SoapVersion::V12));
		let before = registry.len();
		let handles: Vec<_> = (0..4)
			.map(|i| {
				let registry = registry.clone();
				thread::spawn(move || {
					for j in 0..25 {
						registry.add_mapping::<Empty>(WireName::qualified("urn:t", format!("T{i}_{j}")));
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}
		assert_eq!(registry.len(), before + 100);
	}
}
