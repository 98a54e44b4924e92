//! Remote fault records.

use thiserror::Error;

use crate::error::{DecodeError, EncodeError};
use crate::token::{TokenError, TokenKind, TokenReader, TokenWriter, XML_NAMESPACE};
use crate::version::SoapVersion;

/// A fault returned in place of a response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{code}: {string}")]
pub struct Fault {
	/// Fault code, e.g. `soap:Server`.
	pub code: String,
	/// Human-readable reason.
	pub string: String,
	/// Node or role that raised the fault.
	pub actor: Option<String>,
	/// Flattened text of the detail element.
	pub detail: Option<String>,
}

impl Fault {
	/// Creates a fault with a code and reason.
	pub fn new(code: impl Into<String>, string: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			string: string.into(),
			..Self::default()
		}
	}

	/// Reads a fault starting at its `Fault` start tag and stops on its end tag.
	pub fn parse(reader: &mut dyn TokenReader, version: SoapVersion) -> Result<Self, DecodeError> {
		let env = version.namespaces().env;
		reader.require(TokenKind::StartTag, Some(env), Some("Fault"))?;
		let mut fault = Fault::default();
		while reader.next_tag()? == TokenKind::StartTag {
			let name = reader.name().to_string();
			match (version, name.as_str()) {
				(SoapVersion::V12, "Code") => fault.code = read_nested(reader, "Value")?.unwrap_or_default(),
				(SoapVersion::V12, "Reason") => fault.string = read_nested(reader, "Text")?.unwrap_or_default(),
				(SoapVersion::V12, "Node" | "Role") => fault.actor = Some(reader.read_text()?),
				(SoapVersion::V12, "Detail") => fault.detail = Some(reader.skip_element()?.trim().to_string()),
				(_, "faultcode") => fault.code = reader.read_text()?,
				(_, "faultstring") => fault.string = reader.read_text()?,
				(_, "faultactor") => fault.actor = Some(reader.read_text()?),
				(_, "detail") => fault.detail = Some(reader.skip_element()?.trim().to_string()),
				_ => {
					return Err(DecodeError::UnexpectedTag {
						expected: "fault field".to_string(),
						found: name.clone(),
					});
				}
			}
		}
		reader.require(TokenKind::EndTag, Some(env), Some("Fault"))?;
		Ok(fault)
	}

	/// Writes the fault as a complete `Fault` element.
	pub fn write(&self, writer: &mut dyn TokenWriter, version: SoapVersion) -> Result<(), EncodeError> {
		let env = version.namespaces().env;
		writer.start_tag(Some(env), "Fault")?;
		match version {
			SoapVersion::V12 => {
				writer.start_tag(Some(env), "Code")?;
				text_element(writer, Some(env), "Value", &self.code)?;
				writer.end_tag(Some(env), "Code")?;
				writer.start_tag(Some(env), "Reason")?;
				writer.start_tag(Some(env), "Text")?;
				writer.attribute(Some(XML_NAMESPACE), "lang", "en")?;
				writer.text(&self.string)?;
				writer.end_tag(Some(env), "Text")?;
				writer.end_tag(Some(env), "Reason")?;
				if let Some(actor) = &self.actor {
					text_element(writer, Some(env), "Role", actor)?;
				}
				if let Some(detail) = &self.detail {
					text_element(writer, Some(env), "Detail", detail)?;
				}
			}
			SoapVersion::V10 | SoapVersion::V11 => {
				text_element(writer, None, "faultcode", &self.code)?;
				text_element(writer, None, "faultstring", &self.string)?;
				if let Some(actor) = &self.actor {
					text_element(writer, None, "faultactor", actor)?;
				}
				if let Some(detail) = &self.detail {
					text_element(writer, None, "detail", detail)?;
				}
			}
		}
		writer.end_tag(Some(env), "Fault")?;
		Ok(())
	}
}

/// Reads the text of the first `child` element inside the current element, skipping siblings
/// such as `Subcode`.
fn read_nested(reader: &mut dyn TokenReader, child: &str) -> Result<Option<String>, DecodeError> {
	let mut found = None;
	while reader.next_tag()? == TokenKind::StartTag {
		if found.is_none() && reader.name() == child {
			found = Some(reader.read_text()?);
		} else {
			reader.skip_element()?;
		}
	}
	Ok(found)
}

fn text_element(
	writer: &mut dyn TokenWriter,
	namespace: Option<&str>,
	name: &str,
	text: &str,
) -> Result<(), TokenError> {
	writer.start_tag(namespace, name)?;
	writer.text(text)?;
	writer.end_tag(namespace, name)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;
	use crate::token::TokenSink;

	fn sample() -> Fault {
		Fault {
			code: "v:Server".to_string(),
			string: "query failed".to_string(),
			actor: Some("urn:pds:query".to_string()),
			detail: Some("timeout".to_string()),
		}
	}

	#[rstest]
	#[case(SoapVersion::V11)]
	#[case(SoapVersion::V12)]
	fn write_then_parse(#[case] version: SoapVersion) {
		let mut sink = TokenSink::new();
		sample().write(&mut sink, version).unwrap();
		let mut doc = sink.into_buffer().unwrap();
		doc.next_tag().unwrap();
		assert_eq!(Fault::parse(&mut doc, version).unwrap(), sample());
	}

	#[test]
	fn display_shows_code_and_reason() {
		assert_eq!(Fault::new("v:Client", "bad request").to_string(), "v:Client: bad request");
	}

	#[test]
	fn rejects_unknown_children() {
		let env = SoapVersion::V11.namespaces().env;
		let mut sink = TokenSink::new();
		sink.start_tag(Some(env), "Fault").unwrap();
		sink.start_tag(None, "surprise").unwrap();
		sink.end_tag(None, "surprise").unwrap();
		sink.end_tag(Some(env), "Fault").unwrap();
		let mut doc = sink.into_buffer().unwrap();
		doc.next_tag().unwrap();
		assert!(matches!(
			Fault::parse(&mut doc, SoapVersion::V11),
			Err(DecodeError::UnexpectedTag { found, .. }) if found == "surprise"
		));
	}
}
