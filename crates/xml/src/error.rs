//! Error types for XML reading and writing.

use kwire_envelope::TokenError;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Errors raised while converting between XML text and tokens.
#[derive(Debug, Error)]
pub enum XmlError {
	/// The text is not well-formed XML.
	#[error("xml syntax error: {0}")]
	Syntax(#[from] quick_xml::Error),

	/// A start tag carries a malformed attribute.
	#[error("malformed attribute: {0}")]
	Attribute(#[from] AttrError),

	/// Names or character data are not valid UTF-8.
	#[error("invalid utf-8: {0}")]
	Encoding(#[from] std::str::Utf8Error),

	/// Writing the rendered document failed.
	#[error("write failed: {0}")]
	Io(#[from] std::io::Error),

	/// The token structure is invalid.
	#[error(transparent)]
	Token(#[from] TokenError),

	/// The envelope codec rejected the document.
	#[error(transparent)]
	Envelope(#[from] kwire_envelope::Error),
}

/// Result type for XML operations.
pub type Result<T> = std::result::Result<T, XmlError>;
