use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::error::PropertyError;
use crate::name::{TypeKey, WireName};
use crate::property::PropertyInfo;
use crate::value::Value;

/// An object that takes part in a wire graph.
///
/// Implementors expose an ordered list of properties. The codec reads and writes them by
/// index, using [`Serializable::property_info`] for names, namespaces, flags and type hints.
pub trait Serializable: Any + fmt::Debug {
	/// Stable identifier used for the encode-side registry lookup.
	fn type_key(&self) -> TypeKey {
		TypeKey::of::<Self>()
	}

	/// Wire name carried by the instance itself, bypassing the registry on encode.
	fn wire_name(&self) -> Option<WireName> {
		None
	}

	/// Number of properties.
	fn property_count(&self) -> usize;

	/// Returns the value at `index`. Unset properties are [`Value::Null`].
	fn property(&self, index: usize) -> Value;

	/// Stores `value` at `index`.
	fn set_property(&mut self, index: usize, value: Value) -> Result<(), PropertyError>;

	/// Returns the descriptor at `index`.
	fn property_info(&self, index: usize) -> &PropertyInfo;
}

/// Shared handle to a [`Serializable`] object.
///
/// Cloning the handle aliases the object; identity is pointer identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<dyn Serializable>>);

impl ObjectRef {
	/// Wraps `object` in a new shared handle.
	pub fn new<T: Serializable>(object: T) -> Self {
		let inner: Rc<RefCell<dyn Serializable>> = Rc::new(RefCell::new(object));
		Self(inner)
	}

	/// Immutably borrows the object.
	pub fn borrow(&self) -> Ref<'_, dyn Serializable> {
		self.0.borrow()
	}

	/// Mutably borrows the object.
	pub fn borrow_mut(&self) -> RefMut<'_, dyn Serializable> {
		self.0.borrow_mut()
	}

	/// Returns true if both handles point at the same object.
	pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
		self.identity() == other.identity()
	}

	/// Address-based identity, stable while any handle is alive.
	pub fn identity(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}

	/// Type key of the underlying object.
	pub fn type_key(&self) -> TypeKey {
		self.0.borrow().type_key()
	}

	/// Borrows the object as `T`, if it is one.
	pub fn downcast_ref<T: Serializable>(&self) -> Option<Ref<'_, T>> {
		Ref::filter_map(self.0.borrow(), |object| {
			let any: &dyn Any = object;
			any.downcast_ref::<T>()
		})
		.ok()
	}

	/// Snapshot of all property values in descriptor order.
	pub fn values(&self) -> Vec<Value> {
		let object = self.0.borrow();
		(0..object.property_count()).map(|i| object.property(i)).collect()
	}

	/// Snapshot of `(descriptor, value)` pairs in descriptor order.
	pub fn entries(&self) -> Vec<(PropertyInfo, Value)> {
		let object = self.0.borrow();
		(0..object.property_count())
			.map(|i| (object.property_info(i).clone(), object.property(i)))
			.collect()
	}
}

impl fmt::Debug for ObjectRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(object) => write!(f, "ObjectRef({}@{:#x})", object.type_key(), self.identity()),
			Err(_) => write!(f, "ObjectRef(<borrowed>@{:#x})", self.identity()),
		}
	}
}
