//! Error types for envelope encode and decode.

use kwire_model::{PropertyError, TypeKey, WireName};
use thiserror::Error;

use crate::options::OptionsError;
use crate::token::TokenError;
use crate::version::SoapVersion;

/// Coarse classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
	/// The document violates the envelope structure or reference rules.
	Protocol,
	/// The document is well formed but cannot be materialized with the registered types.
	Binding,
	/// The token stream itself failed.
	Stream,
}

/// Errors that abort a decode call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
	/// The token stream failed or held the wrong event.
	#[error(transparent)]
	Token(#[from] TokenError),

	/// A tag other than the one the envelope structure requires.
	#[error("expected {expected}, found {found}")]
	UnexpectedTag {
		/// Required tag.
		expected: String,
		/// Tag found in the stream.
		found: String,
	},

	/// Two elements declare the same `id`.
	#[error("duplicate id `{0}`")]
	DuplicateId(String),

	/// A child element matches no property descriptor of its parent.
	#[error("unknown property `{name}` in {owner}")]
	UnknownProperty {
		/// Element name of the child.
		name: String,
		/// Type key of the parent object.
		owner: TypeKey,
	},

	/// The top-level element is an `href` pointer.
	#[error("href `{0}` at document root")]
	RootReference(String),

	/// An `href` target never appeared in the document.
	#[error("dangling reference to id `{0}`")]
	DanglingReference(String),

	/// A `position` or `offset` attribute is not of the form `[n]`.
	#[error("invalid array index `{0}`")]
	InvalidIndex(String),

	/// An `arrayType` attribute is not of the form `prefix:name[n]`.
	#[error("malformed arrayType `{0}`")]
	MalformedArrayType(String),

	/// Nesting exceeds the configured maximum depth.
	#[error("document nesting exceeds maximum depth {0}")]
	DepthExceeded(usize),

	/// An array size, offset or position reaches past the configured array limit.
	#[error("array index {index} exceeds limit {limit}")]
	ArrayTooLarge {
		/// Requested slot count or index.
		index: usize,
		/// Configured `max_array_len`.
		limit: usize,
	},

	/// Text content cannot be parsed as the declared type.
	#[error("invalid {type_name} value {text:?}: {reason}")]
	InvalidValue {
		/// Declared wire type.
		type_name: WireName,
		/// Offending text.
		text: String,
		/// Parser message.
		reason: String,
	},

	/// No registry binding exists for a type that must be materialized.
	#[error("no binding registered for {0}")]
	UnknownType(WireName),

	/// An untyped element has child elements and cannot be materialized.
	#[error("cannot materialize untyped complex element {0}")]
	Unmaterializable(WireName),

	/// A decoded value does not fit the target property.
	#[error(transparent)]
	Property(#[from] PropertyError),

	/// A custom marshal rejected the element.
	#[error("marshal error: {0}")]
	Marshal(String),
}

impl DecodeError {
	/// Classifies the error.
	pub fn category(&self) -> ErrorCategory {
		match self {
			DecodeError::Token(_) => ErrorCategory::Stream,
			DecodeError::UnknownType(_)
			| DecodeError::Unmaterializable(_)
			| DecodeError::Property(_)
			| DecodeError::Marshal(_) => ErrorCategory::Binding,
			DecodeError::UnexpectedTag { .. }
			| DecodeError::DuplicateId(_)
			| DecodeError::UnknownProperty { .. }
			| DecodeError::RootReference(_)
			| DecodeError::DanglingReference(_)
			| DecodeError::InvalidIndex(_)
			| DecodeError::MalformedArrayType(_)
			| DecodeError::DepthExceeded(_)
			| DecodeError::ArrayTooLarge { .. }
			| DecodeError::InvalidValue { .. } => ErrorCategory::Protocol,
		}
	}
}

/// Errors that abort an encode call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
	/// The token writer rejected a call.
	#[error(transparent)]
	Token(#[from] TokenError),

	/// A null value reached a position where a value must be written.
	#[error("null value for `{0}`")]
	NullValue(String),

	/// No encoder path exists for the value.
	#[error("no encoder for {kind} value of type {type_key}")]
	Unsupported {
		/// Value kind.
		kind: &'static str,
		/// Runtime type key.
		type_key: TypeKey,
	},

	/// A marshal received a value kind it does not write.
	#[error("marshal for {type_name} cannot write {found} value")]
	MarshalMismatch {
		/// Wire type the marshal handles.
		type_name: WireName,
		/// Value kind supplied.
		found: &'static str,
	},

	/// The value graph nests deeper than the configured maximum depth.
	#[error("value nesting exceeds maximum depth {0}")]
	DepthExceeded(usize),

	/// Reading a property failed.
	#[error(transparent)]
	Property(#[from] PropertyError),

	/// A custom marshal failed.
	#[error("marshal error: {0}")]
	Marshal(String),
}

/// Top-level envelope error.
#[derive(Debug, Error)]
pub enum Error {
	/// Decoding failed.
	#[error("decode error: {0}")]
	Decode(#[from] DecodeError),

	/// Encoding failed.
	#[error("encode error: {0}")]
	Encode(#[from] EncodeError),

	/// Options could not be loaded.
	#[error(transparent)]
	Options(#[from] OptionsError),

	/// Registry and options disagree on the protocol version.
	#[error("registry is built for SOAP {registry}, options request SOAP {options}")]
	VersionMismatch {
		/// Version of the registry.
		registry: SoapVersion,
		/// Version requested by the options.
		options: SoapVersion,
	},
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, Error>;
