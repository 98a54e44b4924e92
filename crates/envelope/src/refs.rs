//! Decode-side `id`/`href` bookkeeping.
//!
//! Every `href` names an id. If the id is already bound, the reference resolves at once;
//! otherwise the slot that wanted it is parked on a chain of pending patches, and all of them
//! are assigned when the id is finally bound.

use indexmap::IndexMap;
use kwire_model::{ObjectRef, SequenceRef, Value};
use tracing::trace;

use crate::error::DecodeError;


/// A property or sequence position waiting for a value.
#[derive(Debug, Clone)]
pub enum Slot {
	/// Property `index` of `owner`.
	Property {
		/// Object holding the property.
		owner: ObjectRef,
		/// Property index.
		index: usize,
	},
	/// Item `index` of `owner`.
	Element {
		/// Sequence holding the item.
		owner: SequenceRef,
		/// Item index.
		index: usize,
	},
}

impl Slot {
	/// Stores `value` into the slot.
	pub fn assign(&self, value: Value) -> Result<(), DecodeError> {
		match self {
			Slot::Property { owner, index } => owner.borrow_mut().set_property(*index, value)?,
			Slot::Element { owner, index } => owner.borrow_mut().set(*index, value),
		}
		Ok(())
	}
}

#[derive(Debug)]
enum Entry {
	Resolved(Value),
	Pending { head: usize },
}

#[derive(Debug)]
struct PendingPatch {
	slot: Slot,
	next: Option<usize>,
}

/// Per-document id map with forward-reference chains.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
	ids: IndexMap<String, Entry>,
	patches: Vec<Option<PendingPatch>>,
}

impl ReferenceTracker {
	/// Creates an empty tracker.
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolves `href="#id"` for `slot`. Returns the bound value, or parks the slot and returns
	/// `None` if `id` has not been bound yet.
	pub fn reference(&mut self, id: &str, slot: Slot) -> Option<Value> {
		let next = match self.ids.get(id) {
			Some(Entry::Resolved(value)) => return Some(value.clone()),
			Some(Entry::Pending { head }) => Some(*head),
			None => None,
		};
		let index = self.patches.len();
		self.patches.push(Some(PendingPatch { slot, next }));
		self.ids.insert(id.to_string(), Entry::Pending { head: index });
		trace!(id, parked = index, "forward reference parked");
		None
	}

	/// Binds `id` to `value` and patches every slot parked on it. Returns the number of patched
	/// slots.
	pub fn bind(&mut self, id: &str, value: &Value) -> Result<usize, DecodeError> {
		let mut cursor = match self.ids.get(id) {
			Some(Entry::Resolved(_)) => return Err(DecodeError::DuplicateId(id.to_string())),
			Some(Entry::Pending { head }) => Some(*head),
			None => None,
		};
		self.ids.insert(id.to_string(), Entry::Resolved(value.clone()));
		let mut patched = 0;
		while let Some(index) = cursor {
			let Some(patch) = self.patches.get_mut(index).and_then(Option::take) else {
				break;
			};
			patch.slot.assign(value.clone())?;
			cursor = patch.next;
			patched += 1;
		}
		if patched > 0 {
			trace!(id, patched, "forward references resolved");
		}
		Ok(patched)
	}

	/// Value bound to `id`, if any.
	pub fn resolved(&self, id: &str) -> Option<&Value> {
		match self.ids.get(id) {
			Some(Entry::Resolved(value)) => Some(value),
			_ => None,
		}
	}

	/// Ids referenced but not yet bound, in first-reference order.
	pub fn pending_ids(&self) -> Vec<&str> {
		self.ids
			.iter()
			.filter(|(_, entry)| matches!(entry, Entry::Pending { .. }))
			.map(|(id, _)| id.as_str())
			.collect()
	}

	/// Checks that every referenced id was bound.
	pub fn finish(&self) -> Result<(), DecodeError> {
		match self.pending_ids().first() {
			Some(id) => Err(DecodeError::DanglingReference((*id).to_string())),
			None => Ok(()),
		}
	}
}
