use thiserror::Error;

/// Errors raised when reading or assigning an object property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
	/// The index is past the object's property count.
	#[error("property index {index} out of range (count {count})")]
	IndexOutOfRange {
		/// Requested index.
		index: usize,
		/// Number of properties the object exposes.
		count: usize,
	},
	/// The value kind cannot be stored in this property.
	#[error("property `{property}` expects {expected}, found {found}")]
	TypeMismatch {
		/// Property name.
		property: String,
		/// Kind the property accepts.
		expected: &'static str,
		/// Kind that was supplied.
		found: &'static str,
	},
}

impl PropertyError {
	/// Builds a [`PropertyError::TypeMismatch`] for `property`.
	pub fn mismatch(property: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
		Self::TypeMismatch {
			property: property.into(),
			expected,
			found,
		}
	}
}
