use std::any::Any;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset};

use crate::name::{TypeKey, WireName};
use crate::object::{ObjectRef, Serializable};
use crate::sequence::{Sequence, SequenceRef};

#[cfg(test)]
mod tests;

/// A leaf value handled by one of the built-in marshals.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
	/// `xsd:string`.
	String(String),
	/// `xsd:int`.
	Int(i32),
	/// `xsd:long`.
	Long(i64),
	/// `xsd:boolean`.
	Boolean(bool),
	/// `xsd:float`.
	Float(f32),
	/// `xsd:double`.
	Double(f64),
	/// `xsd:base64Binary`.
	Bytes(Vec<u8>),
	/// `xsd:dateTime`.
	DateTime(DateTime<FixedOffset>),
}

impl Scalar {
	/// Type key of this scalar kind.
	pub fn type_key(&self) -> TypeKey {
		match self {
			Scalar::String(_) => TypeKey::STRING,
			Scalar::Int(_) => TypeKey::INT,
			Scalar::Long(_) => TypeKey::LONG,
			Scalar::Boolean(_) => TypeKey::BOOLEAN,
			Scalar::Float(_) => TypeKey::FLOAT,
			Scalar::Double(_) => TypeKey::DOUBLE,
			Scalar::Bytes(_) => TypeKey::BYTES,
			Scalar::DateTime(_) => TypeKey::DATE_TIME,
		}
	}

	/// Short kind name for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Scalar::String(_) => "string",
			Scalar::Int(_) => "int",
			Scalar::Long(_) => "long",
			Scalar::Boolean(_) => "boolean",
			Scalar::Float(_) => "float",
			Scalar::Double(_) => "double",
			Scalar::Bytes(_) => "bytes",
			Scalar::DateTime(_) => "date-time",
		}
	}
}

/// Text content of an element whose type is only known by name.
///
/// Produced when an untyped (`anyType`) element carries plain text; written back verbatim
/// under its recorded type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
	/// Wire type the element was decoded as.
	pub type_name: WireName,
	/// Raw text content.
	pub text: String,
}

impl Opaque {
	/// Creates an opaque value.
	pub fn new(type_name: WireName, text: impl Into<String>) -> Self {
		Self {
			type_name,
			text: text.into(),
		}
	}
}

/// A value produced and consumed by a user-supplied marshal.
pub trait CustomValue: Any + fmt::Debug {
	/// Type key the registry maps to the marshal's wire name.
	fn type_key(&self) -> TypeKey;

	/// Structural equality against another custom value.
	fn eq_value(&self, other: &dyn CustomValue) -> bool {
		let _ = other;
		false
	}
}

/// Shared handle to a [`CustomValue`].
#[derive(Clone)]
pub struct CustomRef(Rc<dyn CustomValue>);

impl CustomRef {
	/// Wraps `value` in a new shared handle.
	pub fn new<T: CustomValue>(value: T) -> Self {
		let inner: Rc<dyn CustomValue> = Rc::new(value);
		Self(inner)
	}

	/// Returns the value as `T`, if it is one.
	pub fn downcast_ref<T: CustomValue>(&self) -> Option<&T> {
		let any: &dyn Any = &*self.0;
		any.downcast_ref::<T>()
	}

	/// Returns the inner value.
	pub fn get(&self) -> &dyn CustomValue {
		&*self.0
	}

	/// Type key of the inner value.
	pub fn type_key(&self) -> TypeKey {
		self.0.type_key()
	}

	/// Returns true if both handles point at the same value.
	pub fn ptr_eq(&self, other: &CustomRef) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for CustomRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.0, f)
	}
}

/// Any value that can occupy a property slot or a sequence item.
#[derive(Debug, Clone, Default)]
pub enum Value {
	/// Absent value.
	#[default]
	Null,
	/// Built-in leaf value.
	Scalar(Scalar),
	/// Property-bearing object.
	Object(ObjectRef),
	/// Ordered sequence.
	Sequence(SequenceRef),
	/// Value handled by a custom marshal.
	Custom(CustomRef),
	/// Untyped text content.
	Opaque(Opaque),
}

impl Value {
	/// Wraps `object` in a new shared handle.
	pub fn object<T: Serializable>(object: T) -> Self {
		Value::Object(ObjectRef::new(object))
	}

	/// Builds a new sequence from `values`.
	pub fn sequence(values: impl IntoIterator<Item = Value>) -> Self {
		Value::Sequence(SequenceRef::new(Sequence::from_values(values)))
	}

	/// Returns true for [`Value::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Short kind name for diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Scalar(s) => s.kind(),
			Value::Object(_) => "object",
			Value::Sequence(_) => "sequence",
			Value::Custom(_) => "custom",
			Value::Opaque(_) => "opaque",
		}
	}

	/// Runtime type key of the value.
	pub fn type_key(&self) -> TypeKey {
		match self {
			Value::Null | Value::Opaque(_) => TypeKey::ANY,
			Value::Scalar(s) => s.type_key(),
			Value::Object(o) => o.type_key(),
			Value::Sequence(_) => TypeKey::SEQUENCE,
			Value::Custom(c) => c.type_key(),
		}
	}

	/// Pointer identity for objects and sequences; `None` for values without identity.
	pub fn identity(&self) -> Option<usize> {
		match self {
			Value::Object(o) => Some(o.identity()),
			Value::Sequence(s) => Some(s.identity()),
			_ => None,
		}
	}

	/// Returns true if both values are the same object or sequence instance.
	pub fn same_instance(&self, other: &Value) -> bool {
		match (self.identity(), other.identity()) {
			(Some(a), Some(b)) => a == b,
			_ => false,
		}
	}

	/// Returns the string content of a string scalar or opaque value.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Scalar(Scalar::String(s)) => Some(s),
			Value::Opaque(o) => Some(&o.text),
			_ => None,
		}
	}

	/// Returns an `int` scalar.
	pub fn as_i32(&self) -> Option<i32> {
		match self {
			Value::Scalar(Scalar::Int(v)) => Some(*v),
			_ => None,
		}
	}

	/// Returns an integer scalar widened to `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Value::Scalar(Scalar::Long(v)) => Some(*v),
			Value::Scalar(Scalar::Int(v)) => Some(i64::from(*v)),
			_ => None,
		}
	}

	/// Returns a boolean scalar.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Scalar(Scalar::Boolean(v)) => Some(*v),
			_ => None,
		}
	}

	/// Returns a floating-point scalar widened to `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Scalar(Scalar::Double(v)) => Some(*v),
			Value::Scalar(Scalar::Float(v)) => Some(f64::from(*v)),
			_ => None,
		}
	}

	/// Returns a binary scalar.
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Value::Scalar(Scalar::Bytes(v)) => Some(v),
			_ => None,
		}
	}

	/// Returns a timestamp scalar.
	pub fn as_date_time(&self) -> Option<DateTime<FixedOffset>> {
		match self {
			Value::Scalar(Scalar::DateTime(v)) => Some(*v),
			_ => None,
		}
	}

	/// Returns the object handle.
	pub fn as_object(&self) -> Option<&ObjectRef> {
		match self {
			Value::Object(o) => Some(o),
			_ => None,
		}
	}

	/// Returns the sequence handle.
	pub fn as_sequence(&self) -> Option<&SequenceRef> {
		match self {
			Value::Sequence(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the custom value handle.
	pub fn as_custom(&self) -> Option<&CustomRef> {
		match self {
			Value::Custom(c) => Some(c),
			_ => None,
		}
	}

	/// Returns the opaque payload.
	pub fn as_opaque(&self) -> Option<&Opaque> {
		match self {
			Value::Opaque(o) => Some(o),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	/// Structural equality. Shared instances short-circuit, so equal graphs with aliasing
	/// compare equal without walking the shared part twice.
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Scalar(a), Value::Scalar(b)) => a == b,
			(Value::Opaque(a), Value::Opaque(b)) => a == b,
			(Value::Custom(a), Value::Custom(b)) => a.ptr_eq(b) || a.get().eq_value(b.get()),
			(Value::Object(a), Value::Object(b)) => {
				a.ptr_eq(b) || (a.type_key() == b.type_key() && a.values() == b.values())
			}
			(Value::Sequence(a), Value::Sequence(b)) => a.ptr_eq(b) || a.to_vec() == b.to_vec(),
			_ => false,
		}
	}
}

impl From<Scalar> for Value {
	fn from(v: Scalar) -> Self {
		Value::Scalar(v)
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Scalar(Scalar::String(v))
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Scalar(Scalar::String(v.to_string()))
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Scalar(Scalar::Int(v))
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Scalar(Scalar::Long(v))
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Scalar(Scalar::Boolean(v))
	}
}

impl From<f32> for Value {
	fn from(v: f32) -> Self {
		Value::Scalar(Scalar::Float(v))
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Scalar(Scalar::Double(v))
	}
}

impl From<Vec<u8>> for Value {
	fn from(v: Vec<u8>) -> Self {
		Value::Scalar(Scalar::Bytes(v))
	}
}

impl From<DateTime<FixedOffset>> for Value {
	fn from(v: DateTime<FixedOffset>) -> Self {
		Value::Scalar(Scalar::DateTime(v))
	}
}

impl From<ObjectRef> for Value {
	fn from(v: ObjectRef) -> Self {
		Value::Object(v)
	}
}

impl From<SequenceRef> for Value {
	fn from(v: SequenceRef) -> Self {
		Value::Sequence(v)
	}
}

impl From<Sequence> for Value {
	fn from(v: Sequence) -> Self {
		Value::Sequence(SequenceRef::new(v))
	}
}

impl From<CustomRef> for Value {
	fn from(v: CustomRef) -> Self {
		Value::Custom(v)
	}
}

impl From<Opaque> for Value {
	fn from(v: Opaque) -> Self {
		Value::Opaque(v)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Value::Null, Into::into)
	}
}
