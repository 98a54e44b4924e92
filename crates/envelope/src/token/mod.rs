//! Token stream seams consumed and produced by the envelope codec.
//!
//! The codec never sees document text. It pulls events from a [`TokenReader`] and pushes
//! calls into a [`TokenWriter`]; `kwire-xml` adapts both to XML, and [`TokenBuffer`] /
//! [`TokenSink`] keep a document in memory.

mod buffer;


pub use buffer::{Attribute, StartToken, Token, TokenBuffer, TokenSink};
use thiserror::Error;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Event kind at the reader's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	/// Before the first token.
	StartDocument,
	/// An element start tag.
	StartTag,
	/// An element end tag.
	EndTag,
	/// Character data.
	Text,
	/// After the last token.
	EndDocument,
}

/// Errors raised by token readers and writers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
	/// The stream is not at the expected event.
	#[error("expected {expected}, found {found}")]
	Unexpected {
		/// What the caller required.
		expected: String,
		/// What the stream held.
		found: String,
	},
	/// Non-whitespace text where only tags are allowed.
	#[error("unexpected text content {0:?}")]
	UnexpectedText(String),
	/// A child element inside text-only content.
	#[error("unexpected nested element <{0}>")]
	NestedElement(String),
	/// An end tag that does not close the innermost open element.
	#[error("end tag </{found}> does not match open element <{expected}>")]
	MismatchedEnd {
		/// Name of the innermost open element.
		expected: String,
		/// Name given to the end tag.
		found: String,
	},
	/// An end tag with no open element.
	#[error("end tag </{0}> without an open element")]
	UnbalancedEnd(String),
	/// An attribute or declaration written after the start tag was closed.
	#[error("attribute `{0}` written outside a start tag")]
	AttributeOutsideStartTag(String),
	/// The document ended with elements still open.
	#[error("{0} element(s) left open at end of document")]
	UnclosedElements(usize),
	/// The underlying document text is malformed.
	#[error("syntax error: {0}")]
	Syntax(String),
	/// A qualified name uses a prefix with no namespace binding.
	#[error("unbound namespace prefix `{0}`")]
	UnboundPrefix(String),
}

/// Pull reader over a tag-structured document.
///
/// Readers start at [`TokenKind::StartDocument`]. Tag names are reported with their resolved
/// namespace; `None` means the element has no namespace.
pub trait TokenReader {
	/// Kind of the current event.
	fn kind(&self) -> TokenKind;

	/// Namespace of the current start or end tag.
	fn namespace(&self) -> Option<&str>;

	/// Local name of the current start or end tag; empty for other events.
	fn name(&self) -> &str;

	/// Content of the current text event; empty for other events.
	fn text(&self) -> &str;

	/// Value of an attribute on the current start tag. A `None` namespace matches the first
	/// attribute with that local name in any namespace.
	fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&str>;

	/// Namespace bound to `prefix` in the current scope. The empty prefix is the default
	/// namespace.
	fn resolve_prefix(&self, prefix: &str) -> Option<&str>;

	/// Advances to the next event.
	fn next(&mut self) -> Result<TokenKind, TokenError>;

	/// Advances to the next start or end tag, skipping whitespace-only text.
	fn next_tag(&mut self) -> Result<TokenKind, TokenError> {
		let mut kind = self.next()?;
		while kind == TokenKind::Text && self.text().trim().is_empty() {
			kind = self.next()?;
		}
		match kind {
			TokenKind::StartTag | TokenKind::EndTag => Ok(kind),
			TokenKind::Text => Err(TokenError::UnexpectedText(self.text().to_string())),
			_ => Err(TokenError::Unexpected {
				expected: "a tag".to_string(),
				found: describe(self),
			}),
		}
	}

	/// Reads the text content of the current start tag and stops on its end tag.
	fn read_text(&mut self) -> Result<String, TokenError> {
		self.require(TokenKind::StartTag, None, None)?;
		let mut out = String::new();
		loop {
			match self.next()? {
				TokenKind::Text => out.push_str(self.text()),
				TokenKind::EndTag => return Ok(out),
				TokenKind::StartTag => return Err(TokenError::NestedElement(self.name().to_string())),
				TokenKind::StartDocument | TokenKind::EndDocument => {
					return Err(TokenError::UnclosedElements(1));
				}
			}
		}
	}

	/// Checks the current event. `None` for `namespace` or `name` skips that check.
	fn require(&self, kind: TokenKind, namespace: Option<&str>, name: Option<&str>) -> Result<(), TokenError> {
		let kind_ok = self.kind() == kind;
		let ns_ok = namespace.is_none() || self.namespace() == namespace;
		let name_ok = name.is_none_or(|n| self.name() == n);
		if kind_ok && ns_ok && name_ok {
			return Ok(());
		}
		let expected = match (namespace, name) {
			(Some(ns), Some(n)) => format!("{kind:?} {{{ns}}}{n}"),
			(None, Some(n)) => format!("{kind:?} {n}"),
			_ => format!("{kind:?}"),
		};
		Err(TokenError::Unexpected {
			expected,
			found: describe(self),
		})
	}

	/// Skips the subtree of the current start tag, stopping on its end tag. Returns all text
	/// content found inside, concatenated in document order.
	fn skip_element(&mut self) -> Result<String, TokenError> {
		self.require(TokenKind::StartTag, None, None)?;
		let mut depth = 1usize;
		let mut text = String::new();
		while depth > 0 {
			match self.next()? {
				TokenKind::StartTag => depth += 1,
				TokenKind::EndTag => depth -= 1,
				TokenKind::Text => text.push_str(self.text()),
				TokenKind::StartDocument => {}
				TokenKind::EndDocument => return Err(TokenError::UnclosedElements(depth)),
			}
		}
		Ok(text)
	}
}

/// Push writer producing a tag-structured document.
///
/// Attributes and namespace declarations may only be written between `start_tag` and the next
/// child, text, or end tag.
pub trait TokenWriter {
	/// Binds `prefix` to `namespace` on the next start tag.
	fn set_prefix(&mut self, prefix: &str, namespace: &str) -> Result<(), TokenError>;

	/// Returns the prefix bound to `namespace`, declaring a generated one on the current start
	/// tag if none is in scope.
	fn prefix(&mut self, namespace: &str) -> Result<String, TokenError>;

	/// Opens an element.
	fn start_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<(), TokenError>;

	/// Adds an attribute to the current start tag.
	fn attribute(&mut self, namespace: Option<&str>, name: &str, value: &str) -> Result<(), TokenError>;

	/// Writes character data.
	fn text(&mut self, text: &str) -> Result<(), TokenError>;

	/// Closes the innermost open element, which must be `(namespace, name)`.
	fn end_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<(), TokenError>;
}

/// Human-readable description of the reader's current event.
pub(crate) fn describe<R: TokenReader + ?Sized>(reader: &R) -> String {
	let qualified = |r: &R| match r.namespace() {
		Some(ns) => format!("{{{ns}}}{}", r.name()),
		None => r.name().to_string(),
	};
	match reader.kind() {
		TokenKind::StartTag => format!("start tag <{}>", qualified(reader)),
		TokenKind::EndTag => format!("end tag </{}>", qualified(reader)),
		TokenKind::Text => format!("text {:?}", reader.text()),
		TokenKind::StartDocument => "start of document".to_string(),
		TokenKind::EndDocument => "end of document".to_string(),
	}
}
