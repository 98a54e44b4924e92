//! XML text to tokens.

use std::str;

use kwire_envelope::{Attribute, StartToken, TokenBuffer, TokenError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::PrefixDeclaration;
use tracing::debug;

use crate::error::{Result, XmlError};
use crate::scope::Scopes;

/// Parses XML text into a token buffer.
///
/// Prefixed names are resolved against the `xmlns` declarations in scope, and the declarations
/// are kept on each start token so the buffer can resolve qualified attribute values later.
/// Self-closing elements become a start and an end token. Entities are unescaped and CDATA
/// sections are read as text. Comments, processing instructions and the doctype are dropped.
pub fn parse(xml: &str) -> Result<TokenBuffer> {
	let mut reader = Reader::from_str(xml);
	let mut buffer = TokenBuffer::new();
	let mut scopes = Scopes::default();
	let mut elements = 0usize;

	loop {
		match reader.read_event()? {
			Event::Start(e) => {
				buffer.push_start(open(&mut scopes, &e)?);
				elements += 1;
			}
			Event::Empty(e) => {
				buffer.push_start(open(&mut scopes, &e)?);
				buffer.push_end()?;
				scopes.pop();
				elements += 1;
			}
			Event::End(_) => {
				buffer.push_end()?;
				scopes.pop();
			}
			Event::Text(e) => buffer.push_text(&e.unescape()?),
			Event::CData(e) => buffer.push_text(str::from_utf8(&e)?),
			Event::Eof => break,
			_ => {}
		}
	}
	if scopes.depth() > 0 {
		return Err(TokenError::UnclosedElements(scopes.depth()).into());
	}
	debug!(elements, tokens = buffer.tokens().len(), "xml parsed");
	Ok(buffer)
}

/// Pushes the element's declarations as a new scope and resolves its names against it.
fn open(scopes: &mut Scopes, e: &BytesStart<'_>) -> Result<StartToken> {
	let mut declarations = Vec::new();
	let mut attributes = Vec::new();
	for attribute in e.attributes() {
		let attribute = attribute?;
		let value = attribute.unescape_value()?.into_owned();
		match attribute.key.as_namespace_binding() {
			Some(PrefixDeclaration::Default) => declarations.push((String::new(), value)),
			Some(PrefixDeclaration::Named(prefix)) => declarations.push((str::from_utf8(prefix)?.to_string(), value)),
			None => attributes.push((attribute.key, value)),
		}
	}
	scopes.push(declarations.clone());

	let name = e.name();
	let prefix = name.prefix();
	let namespace = resolve(scopes, prefix.as_ref().map(|p| p.as_ref()), true)?;
	let mut start = StartToken::new(namespace, str::from_utf8(name.local_name().as_ref())?);
	for (key, value) in attributes {
		let prefix = key.prefix();
		let namespace = resolve(scopes, prefix.as_ref().map(|p| p.as_ref()), false)?;
		start.attributes.push(Attribute {
			namespace: namespace.map(str::to_string),
			name: str::from_utf8(key.local_name().as_ref())?.to_string(),
			value,
		});
	}
	start.declarations = declarations;
	Ok(start)
}

/// Namespace of a name with `prefix`. Unprefixed elements take the default namespace;
/// unprefixed attributes have none.
fn resolve<'s>(scopes: &'s Scopes, prefix: Option<&[u8]>, element: bool) -> Result<Option<&'s str>> {
	let Some(prefix) = prefix else {
		return Ok(if element {
			scopes.resolve("").filter(|ns| !ns.is_empty())
		} else {
			None
		});
	};
	let prefix = str::from_utf8(prefix)?;
	match scopes.resolve(prefix) {
		Some(namespace) => Ok(Some(namespace)),
		None => Err(XmlError::Token(TokenError::UnboundPrefix(prefix.to_string()))),
	}
}
