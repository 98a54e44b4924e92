//! Tokens to XML text.

use kwire_envelope::{StartToken, Token, TokenBuffer, TokenError};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use crate::error::Result;
use crate::scope::Scopes;

/// Renders a token buffer as XML text.
///
/// Declarations recorded on start tokens become `xmlns` attributes. A namespace with no binding
/// in scope gets a generated `nsN` prefix declared on the element that needs it. Elements
/// without content self-close.
pub fn render(buffer: &TokenBuffer) -> Result<String> {
	let mut writer = Writer::new(Vec::new());
	let mut scopes = Scopes::default();
	let mut open = Vec::new();
	let mut generated = 0usize;
	let tokens = buffer.tokens();

	let mut index = 0;
	while let Some(token) = tokens.get(index) {
		index += 1;
		match token {
			Token::Start(start) => {
				scopes.push(start.declarations.clone());
				let (name, tag) = start_tag(&mut scopes, start, &mut generated);
				if matches!(tokens.get(index), Some(Token::End)) {
					writer.write_event(Event::Empty(tag))?;
					scopes.pop();
					index += 1;
				} else {
					writer.write_event(Event::Start(tag))?;
					open.push(name);
				}
			}
			Token::End => {
				let name = open.pop().ok_or_else(|| TokenError::UnbalancedEnd(String::new()))?;
				writer.write_event(Event::End(BytesEnd::new(name)))?;
				scopes.pop();
			}
			Token::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
		}
	}
	if !open.is_empty() {
		return Err(TokenError::UnclosedElements(open.len()).into());
	}

	let text = String::from_utf8(writer.into_inner()).map_err(|e| e.utf8_error())?;
	debug!(tokens = tokens.len(), bytes = text.len(), "xml rendered");
	Ok(text)
}

/// Builds the start tag for `start`, whose declarations are the innermost scope.
fn start_tag(scopes: &mut Scopes, start: &StartToken, generated: &mut usize) -> (String, BytesStart<'static>) {
	let name = match start.namespace.as_deref().filter(|ns| !ns.is_empty()) {
		Some(namespace) => qualify(scopes, namespace, &start.name, true, generated),
		None => {
			if scopes.resolve("").is_some_and(|ns| !ns.is_empty()) {
				scopes.declare("", "");
			}
			start.name.clone()
		}
	};
	let keys: Vec<String> = start
		.attributes
		.iter()
		.map(|attribute| match attribute.namespace.as_deref().filter(|ns| !ns.is_empty()) {
			Some(namespace) => qualify(scopes, namespace, &attribute.name, false, generated),
			None => attribute.name.clone(),
		})
		.collect();

	let mut tag = BytesStart::new(name.clone());
	for (prefix, namespace) in scopes.current() {
		let key = if prefix.is_empty() {
			"xmlns".to_string()
		} else {
			format!("xmlns:{prefix}")
		};
		tag.push_attribute((key.as_str(), namespace.as_str()));
	}
	for (key, attribute) in keys.iter().zip(&start.attributes) {
		tag.push_attribute((key.as_str(), attribute.value.as_str()));
	}
	(name, tag)
}

/// `prefix:local`, or `local` when the namespace is the default one.
fn qualify(scopes: &mut Scopes, namespace: &str, local: &str, element: bool, generated: &mut usize) -> String {
	let prefix = match scopes.prefix_for(namespace, element) {
		Some(prefix) => prefix.to_string(),
		None => {
			let prefix = scopes.generate(generated);
			scopes.declare(&prefix, namespace);
			prefix
		}
	};
	if prefix.is_empty() {
		local.to_string()
	} else {
		format!("{prefix}:{local}")
	}
}
