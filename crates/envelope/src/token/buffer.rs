use std::mem;

use super::{TokenError, TokenKind, TokenReader, TokenWriter, XML_NAMESPACE};

/// One attribute of a start tag, with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	/// Attribute namespace; `None` for unprefixed attributes.
	pub namespace: Option<String>,
	/// Local name.
	pub name: String,
	/// Unescaped value.
	pub value: String,
}

/// A start tag with resolved names and the prefix declarations it carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartToken {
	/// Element namespace.
	pub namespace: Option<String>,
	/// Local name.
	pub name: String,
	/// Attributes in document order, excluding namespace declarations.
	pub attributes: Vec<Attribute>,
	/// `(prefix, namespace)` bindings declared on this element. The empty prefix is the default
	/// namespace.
	pub declarations: Vec<(String, String)>,
}

impl StartToken {
	/// Creates a start tag without attributes.
	pub fn new(namespace: Option<&str>, name: &str) -> Self {
		Self {
			namespace: namespace.map(str::to_string),
			name: name.to_string(),
			..Self::default()
		}
	}

	fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|a| a.name == name && (namespace.is_none() || a.namespace.as_deref() == namespace))
			.map(|a| a.value.as_str())
	}

	fn declared(&self, prefix: &str) -> Option<&str> {
		self.declarations
			.iter()
			.rev()
			.find(|(p, _)| p == prefix)
			.map(|(_, ns)| ns.as_str())
	}
}

/// One recorded document event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// Element start.
	Start(StartToken),
	/// Element end; closes the innermost open start.
	End,
	/// Character data.
	Text(String),
}

/// An owned, in-memory token document.
///
/// Built by pushing tokens (or through a [`TokenSink`]) and read back through [`TokenReader`].
/// The read cursor is independent of the token list; [`TokenBuffer::rewind`] restarts it.
#[derive(Debug, Clone, Default)]
pub struct TokenBuffer {
	tokens: Vec<Token>,
	depth: usize,
	position: usize,
	open: Vec<usize>,
	closing: bool,
}

impl TokenBuffer {
	/// Creates an empty buffer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a start tag.
	pub fn push_start(&mut self, start: StartToken) {
		self.tokens.push(Token::Start(start));
		self.depth += 1;
	}

	/// Appends an end tag for the innermost open start.
	pub fn push_end(&mut self) -> Result<(), TokenError> {
		if self.depth == 0 {
			return Err(TokenError::UnbalancedEnd(String::new()));
		}
		self.depth -= 1;
		self.tokens.push(Token::End);
		Ok(())
	}

	/// Appends character data, merging with directly preceding text.
	pub fn push_text(&mut self, text: &str) {
		if text.is_empty() {
			return;
		}
		match self.tokens.last_mut() {
			Some(Token::Text(prev)) => prev.push_str(text),
			_ => self.tokens.push(Token::Text(text.to_string())),
		}
	}

	/// Returns all recorded tokens.
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	/// Number of start tags not yet closed.
	pub fn open_elements(&self) -> usize {
		self.depth
	}

	/// Resets the read cursor to the start of the document.
	pub fn rewind(&mut self) {
		self.position = 0;
		self.open.clear();
		self.closing = false;
	}

	fn current_start(&self) -> Option<&StartToken> {
		match self.kind() {
			TokenKind::StartTag | TokenKind::EndTag => match self.open.last().and_then(|&i| self.tokens.get(i)) {
				Some(Token::Start(start)) => Some(start),
				_ => None,
			},
			_ => None,
		}
	}
}

impl TokenReader for TokenBuffer {
	fn kind(&self) -> TokenKind {
		if self.position == 0 {
			return TokenKind::StartDocument;
		}
		match self.tokens.get(self.position - 1) {
			Some(Token::Start(_)) => TokenKind::StartTag,
			Some(Token::End) => TokenKind::EndTag,
			Some(Token::Text(_)) => TokenKind::Text,
			None => TokenKind::EndDocument,
		}
	}

	fn namespace(&self) -> Option<&str> {
		self.current_start().and_then(|s| s.namespace.as_deref())
	}

	fn name(&self) -> &str {
		self.current_start().map_or("", |s| s.name.as_str())
	}

	fn text(&self) -> &str {
		match self.position.checked_sub(1).and_then(|i| self.tokens.get(i)) {
			Some(Token::Text(text)) => text,
			_ => "",
		}
	}

	fn attribute(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
		if self.kind() != TokenKind::StartTag {
			return None;
		}
		self.current_start()?.attribute(namespace, name)
	}

	fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
		if prefix == "xml" {
			return Some(XML_NAMESPACE);
		}
		self.open.iter().rev().find_map(|&i| match self.tokens.get(i) {
			Some(Token::Start(start)) => start.declared(prefix),
			_ => None,
		})
	}

	fn next(&mut self) -> Result<TokenKind, TokenError> {
		if mem::take(&mut self.closing) {
			self.open.pop();
		}
		if self.position > self.tokens.len() {
			return Ok(TokenKind::EndDocument);
		}
		self.position += 1;
		match self.tokens.get(self.position - 1) {
			Some(Token::Start(_)) => {
				self.open.push(self.position - 1);
				Ok(TokenKind::StartTag)
			}
			Some(Token::End) => {
				self.closing = true;
				Ok(TokenKind::EndTag)
			}
			Some(Token::Text(_)) => Ok(TokenKind::Text),
			None if self.open.is_empty() => Ok(TokenKind::EndDocument),
			None => Err(TokenError::UnclosedElements(self.open.len())),
		}
	}
}

/// A [`TokenWriter`] that records into a [`TokenBuffer`].
///
/// Element and attribute namespaces without a binding in scope get a generated `nN` prefix
/// declared on the current start tag.
#[derive(Debug, Default)]
pub struct TokenSink {
	buffer: TokenBuffer,
	open: Vec<usize>,
	in_start: bool,
	pending: Vec<(String, String)>,
	generated: usize,
}

impl TokenSink {
	/// Creates an empty sink.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the document written so far.
	pub fn buffer(&self) -> &TokenBuffer {
		&self.buffer
	}

	/// Finishes the document. Every element must be closed.
	pub fn into_buffer(self) -> Result<TokenBuffer, TokenError> {
		if !self.open.is_empty() {
			return Err(TokenError::UnclosedElements(self.open.len()));
		}
		Ok(self.buffer)
	}

	fn start_at(&self, index: usize) -> Option<&StartToken> {
		match self.buffer.tokens.get(index) {
			Some(Token::Start(start)) => Some(start),
			_ => None,
		}
	}

	fn current_start_mut(&mut self) -> Option<&mut StartToken> {
		if !self.in_start {
			return None;
		}
		let index = *self.open.last()?;
		match self.buffer.tokens.get_mut(index) {
			Some(Token::Start(start)) => Some(start),
			_ => None,
		}
	}

	fn resolve(&self, prefix: &str) -> Option<&str> {
		if prefix == "xml" {
			return Some(XML_NAMESPACE);
		}
		self.open
			.iter()
			.rev()
			.find_map(|&i| self.start_at(i).and_then(|s| s.declared(prefix)))
	}

	fn lookup(&self, namespace: &str, allow_default: bool) -> Option<String> {
		let scoped = self
			.open
			.iter()
			.rev()
			.filter_map(|&i| self.start_at(i))
			.flat_map(|s| s.declarations.iter().rev());
		scoped
			.chain(self.pending.iter().rev())
			.filter(|(p, ns)| ns == namespace && (allow_default || !p.is_empty()))
			.find(|(p, _)| self.resolve(p).is_none_or(|bound| bound == namespace))
			.map(|(p, _)| p.clone())
	}

	fn ensure_prefix(&mut self, namespace: &str, allow_default: bool) -> Result<String, TokenError> {
		if namespace == XML_NAMESPACE {
			return Ok("xml".to_string());
		}
		if let Some(prefix) = self.lookup(namespace, allow_default) {
			return Ok(prefix);
		}
		let mut prefix = format!("n{}", self.generated);
		while self.resolve(&prefix).is_some() {
			self.generated += 1;
			prefix = format!("n{}", self.generated);
		}
		self.generated += 1;
		let start = self
			.current_start_mut()
			.ok_or_else(|| TokenError::AttributeOutsideStartTag(format!("xmlns:{prefix}")))?;
		start.declarations.push((prefix.clone(), namespace.to_string()));
		Ok(prefix)
	}
}

fn non_empty(namespace: Option<&str>) -> Option<&str> {
	namespace.filter(|ns| !ns.is_empty())
}

impl TokenWriter for TokenSink {
	fn set_prefix(&mut self, prefix: &str, namespace: &str) -> Result<(), TokenError> {
		self.pending.push((prefix.to_string(), namespace.to_string()));
		Ok(())
	}

	fn prefix(&mut self, namespace: &str) -> Result<String, TokenError> {
		self.ensure_prefix(namespace, false)
	}

	fn start_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<(), TokenError> {
		let namespace = non_empty(namespace);
		let mut start = StartToken::new(namespace, name);
		start.declarations = mem::take(&mut self.pending);
		self.open.push(self.buffer.tokens.len());
		self.buffer.push_start(start);
		self.in_start = true;
		if let Some(ns) = namespace {
			self.ensure_prefix(ns, true)?;
		}
		Ok(())
	}

	fn attribute(&mut self, namespace: Option<&str>, name: &str, value: &str) -> Result<(), TokenError> {
		if !self.in_start {
			return Err(TokenError::AttributeOutsideStartTag(name.to_string()));
		}
		let namespace = non_empty(namespace);
		if let Some(ns) = namespace {
			self.ensure_prefix(ns, false)?;
		}
		let start = self
			.current_start_mut()
			.ok_or_else(|| TokenError::AttributeOutsideStartTag(name.to_string()))?;
		start.attributes.push(Attribute {
			namespace: namespace.map(str::to_string),
			name: name.to_string(),
			value: value.to_string(),
		});
		Ok(())
	}

	fn text(&mut self, text: &str) -> Result<(), TokenError> {
		self.in_start = false;
		self.buffer.push_text(text);
		Ok(())
	}

	fn end_tag(&mut self, namespace: Option<&str>, name: &str) -> Result<(), TokenError> {
		let index = *self
			.open
			.last()
			.ok_or_else(|| TokenError::UnbalancedEnd(name.to_string()))?;
		let start = self
			.start_at(index)
			.ok_or_else(|| TokenError::UnbalancedEnd(name.to_string()))?;
		if start.name != name || start.namespace.as_deref() != non_empty(namespace) {
			return Err(TokenError::MismatchedEnd {
				expected: start.name.clone(),
				found: name.to_string(),
			});
		}
		self.buffer.push_end()?;
		self.open.pop();
		self.in_start = false;
		Ok(())
	}
}
