use kwire_envelope::token::XML_NAMESPACE;
use kwire_envelope::{StartToken, Token, TokenBuffer, TokenError, TokenKind, TokenReader};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::{XmlError, parse, render};

fn starts(buffer: &TokenBuffer) -> Vec<(Option<String>, String)> {
	buffer
		.tokens()
		.iter()
		.filter_map(|token| match token {
			Token::Start(start) => Some((start.namespace.clone(), start.name.clone())),
			_ => None,
		})
		.collect()
}

#[test]
fn test_parse_resolves_prefixes_and_default_namespace() {
	let buffer = parse(r#"<a:root xmlns:a="urn:a" xmlns="urn:d"><child><inner xmlns=""/></child></a:root>"#).unwrap();
	assert_eq!(
		starts(&buffer),
		vec![
			(Some("urn:a".to_string()), "root".to_string()),
			(Some("urn:d".to_string()), "child".to_string()),
			(None, "inner".to_string()),
		]
	);
}

#[test]
fn test_parse_expands_self_closing_elements() {
	let buffer = parse("<a><b/></a>").unwrap();
	assert_eq!(
		buffer.tokens(),
		&[
			Token::Start(StartToken::new(None, "a")),
			Token::Start(StartToken::new(None, "b")),
			Token::End,
			Token::End,
		]
	);
}

#[test]
fn test_parse_unescapes_and_merges_text() {
	let mut buffer = parse("<t>a &amp; b<!-- note --><![CDATA[ <raw> ]]>&#x41;</t>").unwrap();
	buffer.next_tag().unwrap();
	assert_eq!(buffer.read_text().unwrap(), "a & b <raw> A");
}

#[test]
fn test_parse_ignores_prolog() {
	let buffer = parse("<?xml version=\"1.0\"?>\n<!DOCTYPE t>\n<?pi data?><t/>").unwrap();
	assert_eq!(starts(&buffer), vec![(None, "t".to_string())]);
}

#[test]
fn test_parse_resolves_attributes() {
	let mut buffer = parse(r#"<t xmlns:x="urn:x" x:kind="1" plain="2" xml:lang="en"/>"#).unwrap();
	buffer.next_tag().unwrap();
	assert_eq!(buffer.attribute(Some("urn:x"), "kind"), Some("1"));
	assert_eq!(buffer.attribute(None, "plain"), Some("2"));
	assert_eq!(buffer.attribute(Some(XML_NAMESPACE), "lang"), Some("en"));
	assert_eq!(buffer.resolve_prefix("x"), Some("urn:x"));
}

#[test]
fn test_parse_rejects_unbound_prefix() {
	let err = parse("<q:t/>").unwrap_err();
	assert!(matches!(err, XmlError::Token(TokenError::UnboundPrefix(p)) if p == "q"));
}

#[test]
fn test_parse_rejects_mismatched_end() {
	assert!(matches!(parse("<a></b>"), Err(XmlError::Syntax(_))));
}

#[test]
fn test_parse_rejects_unclosed_document() {
	assert!(parse("<a><b></b>").is_err());
}

#[test]
fn test_render_self_closes_and_escapes() {
	let mut buffer = TokenBuffer::new();
	let mut start = StartToken::new(None, "t");
	start.attributes.push(kwire_envelope::Attribute {
		namespace: None,
		name: "q".to_string(),
		value: "a\"b".to_string(),
	});
	buffer.push_start(start);
	buffer.push_start(StartToken::new(None, "empty"));
	buffer.push_end().unwrap();
	buffer.push_text("1 < 2 & 3");
	buffer.push_end().unwrap();
	assert_eq!(render(&buffer).unwrap(), "<t q=\"a&quot;b\"><empty/>1 &lt; 2 &amp; 3</t>");
}

#[test]
fn test_render_generates_missing_prefixes() {
	let mut buffer = TokenBuffer::new();
	let mut start = StartToken::new(Some("urn:a"), "t");
	start.attributes.push(kwire_envelope::Attribute {
		namespace: Some(XML_NAMESPACE.to_string()),
		name: "lang".to_string(),
		value: "en".to_string(),
	});
	buffer.push_start(start);
	buffer.push_end().unwrap();
	assert_eq!(render(&buffer).unwrap(), r#"<ns0:t xmlns:ns0="urn:a" xml:lang="en"/>"#);
}

#[test]
fn test_render_uses_recorded_declarations() {
	let mut buffer = TokenBuffer::new();
	let mut outer = StartToken::new(Some("urn:a"), "outer");
	outer.declarations.push(("a".to_string(), "urn:a".to_string()));
	buffer.push_start(outer);
	buffer.push_start(StartToken::new(Some("urn:a"), "inner"));
	buffer.push_text("x");
	buffer.push_end().unwrap();
	buffer.push_end().unwrap();
	assert_eq!(render(&buffer).unwrap(), r#"<a:outer xmlns:a="urn:a"><a:inner>x</a:inner></a:outer>"#);
}

#[test]
fn test_render_rejects_unclosed_buffer() {
	let mut buffer = TokenBuffer::new();
	buffer.push_start(StartToken::new(None, "t"));
	assert!(matches!(render(&buffer), Err(XmlError::Token(TokenError::UnclosedElements(1)))));
}

#[test]
fn test_parse_render_is_stable() {
	let xml = r#"<v:E xmlns:v="urn:v" xmlns:i="urn:i"><v:B i:type="x">t</v:B><c/></v:E>"#;
	assert_eq!(render(&parse(xml).unwrap()).unwrap(), xml);
}

proptest! {
	#[test]
	fn test_text_survives_render_and_parse(text in "\\PC{1,24}") {
		let mut buffer = TokenBuffer::new();
		buffer.push_start(StartToken::new(Some("urn:t"), "t"));
		buffer.push_text(&text);
		buffer.push_end().unwrap();

		let mut back = parse(&render(&buffer).unwrap()).unwrap();
		prop_assert_eq!(back.next_tag().unwrap(), TokenKind::StartTag);
		prop_assert_eq!(back.namespace(), Some("urn:t"));
		prop_assert_eq!(back.read_text().unwrap(), text);
	}
}
