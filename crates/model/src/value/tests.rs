use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::error::PropertyError;
use crate::property::PropertyInfo;

#[derive(Debug, Default)]
struct Point {
	x: i32,
	y: i32,
}

static POINT_PROPS: std::sync::LazyLock<[PropertyInfo; 2]> = std::sync::LazyLock::new(|| {
	[
		PropertyInfo::new("x").with_type(TypeKey::INT),
		PropertyInfo::new("y").with_type(TypeKey::INT),
	]
});

impl Serializable for Point {
	fn property_count(&self) -> usize {
		2
	}

	fn property(&self, index: usize) -> Value {
		match index {
			0 => self.x.into(),
			_ => self.y.into(),
		}
	}

	fn set_property(&mut self, index: usize, value: Value) -> Result<(), PropertyError> {
		let v = value
			.as_i32()
			.ok_or_else(|| PropertyError::mismatch(POINT_PROPS[index].name.clone(), "int", value.kind()))?;
		match index {
			0 => self.x = v,
			1 => self.y = v,
			_ => return Err(PropertyError::IndexOutOfRange { index, count: 2 }),
		}
		Ok(())
	}

	fn property_info(&self, index: usize) -> &PropertyInfo {
		&POINT_PROPS[index]
	}
}

#[derive(Debug, PartialEq)]
struct Money(i64);

impl CustomValue for Money {
	fn type_key(&self) -> TypeKey {
		TypeKey::new("money")
	}

	fn eq_value(&self, other: &dyn CustomValue) -> bool {
		let other: &dyn Any = other;
		other.downcast_ref::<Money>() == Some(self)
	}
}

#[test]
fn objects_compare_structurally() {
	let a = Value::object(Point { x: 1, y: 2 });
	let b = Value::object(Point { x: 1, y: 2 });
	let c = Value::object(Point { x: 1, y: 3 });
	assert_eq!(a, b);
	assert_ne!(a, c);
	assert!(!a.same_instance(&b));
	assert!(a.same_instance(&a.clone()));
}

#[test]
fn sequences_compare_item_wise() {
	let a = Value::sequence([Value::from(1), Value::Null, Value::from("x")]);
	let b = Value::sequence([Value::from(1), Value::Null, Value::from("x")]);
	assert_eq!(a, b);
	assert_ne!(a, Value::sequence([Value::from(1)]));
}

#[test]
fn custom_values_use_eq_value() {
	let a = Value::from(CustomRef::new(Money(5)));
	assert_eq!(a, Value::from(CustomRef::new(Money(5))));
	assert_ne!(a, Value::from(CustomRef::new(Money(6))));
	assert_eq!(a.type_key(), TypeKey::new("money"));
	assert_eq!(a.as_custom().and_then(|c| c.downcast_ref::<Money>()), Some(&Money(5)));
}

#[test]
fn downcast_object_handle() {
	let value = Value::object(Point { x: 4, y: 9 });
	let object = value.as_object().cloned().unwrap();
	object.borrow_mut().set_property(1, Value::from(10)).unwrap();
	let point = object.downcast_ref::<Point>().unwrap();
	assert_eq!((point.x, point.y), (4, 10));
}

#[test]
fn set_property_rejects_wrong_kind() {
	let object = ObjectRef::new(Point::default());
	let err = object.borrow_mut().set_property(0, Value::from("nope")).unwrap_err();
	assert_eq!(err, PropertyError::mismatch("x", "int", "string"));
}

#[rstest]
#[case(Value::Null, "null", TypeKey::ANY)]
#[case(Value::from("s"), "string", TypeKey::STRING)]
#[case(Value::from(1), "int", TypeKey::INT)]
#[case(Value::from(1_i64), "long", TypeKey::LONG)]
#[case(Value::from(false), "boolean", TypeKey::BOOLEAN)]
#[case(Value::from(1.5_f32), "float", TypeKey::FLOAT)]
#[case(Value::from(1.5_f64), "double", TypeKey::DOUBLE)]
#[case(Value::from(vec![1_u8, 2]), "bytes", TypeKey::BYTES)]
#[case(Value::sequence([]), "sequence", TypeKey::SEQUENCE)]
#[case(Value::from(Opaque::new(WireName::local("t"), "x")), "opaque", TypeKey::ANY)]
fn kind_and_type_key(#[case] value: Value, #[case] kind: &str, #[case] key: TypeKey) {
	assert_eq!(value.kind(), kind);
	assert_eq!(value.type_key(), key);
}

#[test]
fn numeric_accessors_widen() {
	assert_eq!(Value::from(7).as_i64(), Some(7));
	assert_eq!(Value::from(7_i64).as_i32(), None);
	assert_eq!(Value::from(0.5_f32).as_f64(), Some(0.5));
	assert_eq!(Value::from(None::<i32>), Value::Null);
	assert_eq!(Value::from(Some("a")).as_str(), Some("a"));
}
