use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

/// Ordered, dynamically resizable list of values.
///
/// Unset slots hold [`Value::Null`]. Writing past the end grows the sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
	items: Vec<Value>,
}

impl Sequence {
	/// Creates an empty sequence.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a sequence holding `values`.
	pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
		Self {
			items: values.into_iter().collect(),
		}
	}

	/// Number of slots, set or not.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Returns true if the sequence has no slots.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Returns the value at `index`.
	pub fn get(&self, index: usize) -> Option<&Value> {
		self.items.get(index)
	}

	/// Stores `value` at `index`, growing the sequence with null slots if needed.
	///
	/// # Panics
	///
	/// Panics if the grown sequence cannot be allocated. Callers taking `index` from
	/// untrusted input bound it first.
	pub fn set(&mut self, index: usize, value: Value) {
		if index >= self.items.len() {
			self.items.resize(index + 1, Value::Null);
		}
		self.items[index] = value;
	}

	/// Resizes to `len` slots. Growing keeps existing slots and fills with null.
	pub fn resize(&mut self, len: usize) {
		self.items.resize(len, Value::Null);
	}

	/// Appends a value.
	pub fn push(&mut self, value: Value) {
		self.items.push(value);
	}

	/// Iterates over all slots.
	pub fn iter(&self) -> std::slice::Iter<'_, Value> {
		self.items.iter()
	}

	/// Returns the slots as a slice.
	pub fn as_slice(&self) -> &[Value] {
		&self.items
	}
}

impl FromIterator<Value> for Sequence {
	fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
		Self::from_values(iter)
	}
}

/// Shared handle to a [`Sequence`].
#[derive(Clone, Default)]
pub struct SequenceRef(Rc<RefCell<Sequence>>);

impl SequenceRef {
	/// Wraps `sequence` in a new shared handle.
	pub fn new(sequence: Sequence) -> Self {
		Self(Rc::new(RefCell::new(sequence)))
	}

	/// Immutably borrows the sequence.
	pub fn borrow(&self) -> Ref<'_, Sequence> {
		self.0.borrow()
	}

	/// Mutably borrows the sequence.
	pub fn borrow_mut(&self) -> RefMut<'_, Sequence> {
		self.0.borrow_mut()
	}

	/// Returns true if both handles point at the same sequence.
	pub fn ptr_eq(&self, other: &SequenceRef) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Address-based identity, stable while any handle is alive.
	pub fn identity(&self) -> usize {
		Rc::as_ptr(&self.0) as *const () as usize
	}

	/// Number of slots.
	pub fn len(&self) -> usize {
		self.0.borrow().len()
	}

	/// Returns true if the sequence has no slots.
	pub fn is_empty(&self) -> bool {
		self.0.borrow().is_empty()
	}

	/// Snapshot of all slots.
	pub fn to_vec(&self) -> Vec<Value> {
		self.0.borrow().as_slice().to_vec()
	}
}

impl From<Sequence> for SequenceRef {
	fn from(sequence: Sequence) -> Self {
		Self::new(sequence)
	}
}

impl fmt::Debug for SequenceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.try_borrow() {
			Ok(seq) => write!(f, "SequenceRef(len={}@{:#x})", seq.len(), self.identity()),
			Err(_) => write!(f, "SequenceRef(<borrowed>@{:#x})", self.identity()),
		}
	}
}
