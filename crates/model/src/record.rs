use std::borrow::Cow;
use std::sync::Arc;

use crate::error::PropertyError;
use crate::name::{TypeKey, WireName};
use crate::object::Serializable;
use crate::property::PropertyInfo;
use crate::value::Value;

/// A property bag whose descriptors are declared at runtime.
///
/// Records carry their own wire name, so encoding one needs no registry mapping. Decoding into a
/// record needs a [`RecordSchema`] registered for its wire name.
#[derive(Debug, Clone)]
pub struct Record {
	name: WireName,
	properties: Vec<(PropertyInfo, Value)>,
}

impl Record {
	/// Creates an empty record.
	pub fn new(name: WireName) -> Self {
		Self {
			name,
			properties: Vec::new(),
		}
	}

	/// Appends an untyped property named `name`.
	pub fn with_property(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
		self.properties.push((PropertyInfo::new(name), value.into()));
		self
	}

	/// Appends a property with an explicit descriptor.
	pub fn add_property(&mut self, info: PropertyInfo, value: impl Into<Value>) {
		self.properties.push((info, value.into()));
	}

	/// Returns the wire name.
	pub fn name(&self) -> &WireName {
		&self.name
	}

	/// Returns the value of the first property named `name`.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.properties.iter().find(|(info, _)| info.name == name).map(|(_, value)| value)
	}

	/// Iterates over `(descriptor, value)` pairs in order.
	pub fn iter(&self) -> impl Iterator<Item = (&PropertyInfo, &Value)> {
		self.properties.iter().map(|(info, value)| (info, value))
	}
}

impl Serializable for Record {
	fn type_key(&self) -> TypeKey {
		TypeKey::RECORD
	}

	fn wire_name(&self) -> Option<WireName> {
		Some(self.name.clone())
	}

	fn property_count(&self) -> usize {
		self.properties.len()
	}

	fn property(&self, index: usize) -> Value {
		self.properties.get(index).map(|(_, value)| value.clone()).unwrap_or_default()
	}

	fn set_property(&mut self, index: usize, value: Value) -> Result<(), PropertyError> {
		let count = self.properties.len();
		let slot = self
			.properties
			.get_mut(index)
			.ok_or(PropertyError::IndexOutOfRange { index, count })?;
		slot.1 = value;
		Ok(())
	}

	fn property_info(&self, index: usize) -> &PropertyInfo {
		&self.properties[index].0
	}
}

/// Declared shape of a [`Record`], used to materialize records on decode.
#[derive(Debug, Clone)]
pub struct RecordSchema {
	name: WireName,
	properties: Arc<[PropertyInfo]>,
}

impl RecordSchema {
	/// Creates a schema for records named `name` with the given descriptors.
	pub fn new(name: WireName, properties: Vec<PropertyInfo>) -> Self {
		Self {
			name,
			properties: properties.into(),
		}
	}

	/// Returns the wire name.
	pub fn name(&self) -> &WireName {
		&self.name
	}

	/// Returns the declared descriptors.
	pub fn properties(&self) -> &[PropertyInfo] {
		&self.properties
	}

	/// Creates a record with every declared property set to null.
	pub fn instantiate(&self) -> Record {
		Record {
			name: self.name.clone(),
			properties: self.properties.iter().map(|info| (info.clone(), Value::Null)).collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::object::ObjectRef;

	fn station() -> RecordSchema {
		RecordSchema::new(
			WireName::qualified("urn:pds", "Station"),
			vec![
				PropertyInfo::new("code").with_type(TypeKey::STRING),
				PropertyInfo::new("elevation").with_type(TypeKey::INT),
			],
		)
	}

	#[test]
	fn instantiate_declares_null_slots() {
		let record = station().instantiate();
		assert_eq!(record.property_count(), 2);
		assert_eq!(record.get("code"), Some(&Value::Null));
		assert_eq!(record.property_info(1).type_hint, TypeKey::INT);
	}

	#[test]
	fn record_carries_its_wire_name() {
		let record = Record::new(WireName::qualified("urn:pds", "Query")).with_property("limit", 10);
		assert_eq!(record.wire_name(), Some(WireName::qualified("urn:pds", "Query")));
		assert_eq!(Serializable::type_key(&record), TypeKey::RECORD);
		assert_eq!(record.get("limit"), Some(&Value::from(10)));
		assert_eq!(record.get("missing"), None);
	}

	#[test]
	fn set_property_out_of_range() {
		let object = ObjectRef::new(station().instantiate());
		object.borrow_mut().set_property(0, Value::from("ALMA")).unwrap();
		let err = object.borrow_mut().set_property(5, Value::Null).unwrap_err();
		assert_eq!(err, PropertyError::IndexOutOfRange { index: 5, count: 2 });
		assert_eq!(object.values(), vec![Value::from("ALMA"), Value::Null]);
	}
}
