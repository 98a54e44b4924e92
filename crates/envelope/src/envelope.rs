//! A single request or response envelope.

use std::sync::Arc;

use kwire_model::{Value, WireName};
use thiserror::Error;
use tracing::debug;

use crate::decode::DecodeSession;
use crate::encode::EncodeSession;
use crate::error::{DecodeError, EncodeError, Error, Result};
use crate::fault::Fault;
use crate::options::EnvelopeOptions;
use crate::registry::TypeRegistry;
use crate::token::{TokenError, TokenKind, TokenReader, TokenWriter, describe};
use crate::version::SoapVersion;


/// One header element, kept as its name and flattened text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
	/// Element name.
	pub name: WireName,
	/// Text content.
	pub text: String,
}

impl HeaderEntry {
	/// Creates a header entry.
	pub fn new(name: WireName, text: impl Into<String>) -> Self {
		Self {
			name,
			text: text.into(),
		}
	}
}

/// Content of an envelope body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
	/// A decoded (or to-be-encoded) value.
	Value(Value),
	/// A fault.
	Fault(Fault),
}

/// Unwrapped response value.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
	/// The response object has no properties, or the body was empty.
	Empty,
	/// The response object has one property, or the body is not an object.
	Single(Value),
	/// All properties of the response object, in order.
	Many(Vec<Value>),
}

/// Why [`SerializationEnvelope::response`] produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
	/// The peer answered with a fault.
	#[error("remote fault: {0}")]
	Fault(Fault),
	/// Nothing has been parsed yet, or the last parse failed.
	#[error("no response body has been parsed")]
	NoBody,
}

/// Encodes outgoing bodies and decodes incoming ones against a shared [`TypeRegistry`].
///
/// Reference state lives only for the duration of one `write` or `parse` call.
#[derive(Debug)]
pub struct SerializationEnvelope {
	registry: Arc<TypeRegistry>,
	options: EnvelopeOptions,
	header_out: Vec<HeaderEntry>,
	body_out: Option<Body>,
	header_in: Vec<HeaderEntry>,
	body_in: Option<Body>,
}

impl SerializationEnvelope {
	/// Creates an envelope. The registry must be built for the options' version.
	pub fn new(registry: Arc<TypeRegistry>, options: EnvelopeOptions) -> Result<Self> {
		if registry.version() != options.version {
			return Err(Error::VersionMismatch {
				registry: registry.version(),
				options: options.version,
			});
		}
		Ok(Self {
			registry,
			options,
			header_out: Vec::new(),
			body_out: None,
			header_in: Vec::new(),
			body_in: None,
		})
	}

	/// The shared registry.
	pub fn registry(&self) -> &Arc<TypeRegistry> {
		&self.registry
	}

	/// Envelope options.
	pub fn options(&self) -> &EnvelopeOptions {
		&self.options
	}

	/// Protocol version.
	pub fn version(&self) -> SoapVersion {
		self.options.version
	}

	/// Sets the outgoing body object.
	pub fn set_body_out(&mut self, value: impl Into<Value>) {
		let value = value.into();
		self.body_out = (!value.is_null()).then_some(Body::Value(value));
	}

	/// Sets an outgoing fault in place of a body object.
	pub fn set_fault_out(&mut self, fault: Fault) {
		self.body_out = Some(Body::Fault(fault));
	}

	/// Clears the outgoing body; `write` then produces an empty `Body` element.
	pub fn set_body_out_empty(&mut self) {
		self.body_out = None;
	}

	/// The outgoing body, if set.
	pub fn body_out(&self) -> Option<&Body> {
		self.body_out.as_ref()
	}

	/// Appends an outgoing header entry.
	pub fn add_header(&mut self, entry: HeaderEntry) {
		self.header_out.push(entry);
	}

	/// Writes the full `Envelope` / `Header` / `Body` document.
	pub fn write(&self, writer: &mut dyn TokenWriter) -> Result<()> {
		self.open_frame(writer).map_err(EncodeError::from)?;
		self.write_body(writer)?;
		let env = self.registry.namespaces().env;
		writer.end_tag(Some(env), "Body").map_err(EncodeError::from)?;
		writer.end_tag(Some(env), "Envelope").map_err(EncodeError::from)?;
		Ok(())
	}

	fn open_frame(&self, writer: &mut dyn TokenWriter) -> std::result::Result<(), TokenError> {
		let ns = self.registry.namespaces();
		writer.set_prefix("i", ns.xsi)?;
		writer.set_prefix("d", ns.xsd)?;
		writer.set_prefix("c", ns.enc)?;
		writer.set_prefix("v", ns.env)?;
		writer.start_tag(Some(ns.env), "Envelope")?;
		writer.start_tag(Some(ns.env), "Header")?;
		for entry in &self.header_out {
			writer.start_tag(entry.name.namespace(), entry.name.name())?;
			writer.text(&entry.text)?;
			writer.end_tag(entry.name.namespace(), entry.name.name())?;
		}
		writer.end_tag(Some(ns.env), "Header")?;
		writer.start_tag(Some(ns.env), "Body")
	}

	/// Writes only the body content. Writes nothing when the body is empty.
	pub fn write_body(&self, writer: &mut dyn TokenWriter) -> Result<()> {
		match &self.body_out {
			None => Ok(()),
			Some(Body::Fault(fault)) => Ok(fault.write(writer, self.version())?),
			Some(Body::Value(value)) => {
				EncodeSession::new(&self.registry, writer, &self.options).write_root(value)?;
				Ok(())
			}
		}
	}

	/// Reads a full envelope document. Header entries are kept as flattened text.
	pub fn parse(&mut self, reader: &mut dyn TokenReader) -> Result<()> {
		self.header_in.clear();
		self.body_in = None;
		let parsed = self.parse_envelope(reader);
		if parsed.is_err() {
			self.body_in = None;
		}
		parsed
	}

	fn parse_envelope(&mut self, reader: &mut dyn TokenReader) -> Result<()> {
		let env = self.registry.namespaces().env;

		reader.next_tag().map_err(DecodeError::from)?;
		expect(reader, TokenKind::StartTag, env, "Envelope")?;
		reader.next_tag().map_err(DecodeError::from)?;
		if reader.kind() == TokenKind::StartTag && reader.namespace() == Some(env) && reader.name() == "Header" {
			while reader.next_tag().map_err(DecodeError::from)? == TokenKind::StartTag {
				let name = WireName::new(reader.namespace(), reader.name());
				let text = reader.skip_element().map_err(DecodeError::from)?;
				self.header_in.push(HeaderEntry { name, text });
			}
			reader.next_tag().map_err(DecodeError::from)?;
		}
		expect(reader, TokenKind::StartTag, env, "Body")?;
		self.parse_body(reader)?;
		expect(reader, TokenKind::EndTag, env, "Body")?;
		reader.next_tag().map_err(DecodeError::from)?;
		expect(reader, TokenKind::EndTag, env, "Envelope")?;
		debug!(headers = self.header_in.len(), "envelope parsed");
		Ok(())
	}

	/// Reads the body starting at its `Body` start tag and stops on the `Body` end tag.
	pub fn parse_body(&mut self, reader: &mut dyn TokenReader) -> Result<()> {
		self.body_in = None;
		let env = self.registry.namespaces().env;
		let kind = reader.next_tag().map_err(DecodeError::from)?;
		let body = if kind == TokenKind::StartTag && reader.namespace() == Some(env) && reader.name() == "Fault" {
			let fault = Fault::parse(reader, self.version())?;
			reader.next_tag().map_err(DecodeError::from)?;
			debug!(code = %fault.code, "fault received");
			Body::Fault(fault)
		} else {
			Body::Value(DecodeSession::new(&self.registry, reader, &self.options).read_body()?)
		};
		self.body_in = Some(body);
		Ok(())
	}

	/// The last parsed body.
	pub fn body_in(&self) -> Option<&Body> {
		self.body_in.as_ref()
	}

	/// Header entries of the last parsed envelope.
	pub fn header_in(&self) -> &[HeaderEntry] {
		&self.header_in
	}

	/// The fault of the last parsed body, if it was one.
	pub fn fault(&self) -> Option<&Fault> {
		match &self.body_in {
			Some(Body::Fault(fault)) => Some(fault),
			_ => None,
		}
	}

	/// Unwraps the parsed response object: no properties yield [`Response::Empty`], one yields
	/// that property's value, more yield all values in order.
	pub fn response(&self) -> std::result::Result<Response, ResponseError> {
		match &self.body_in {
			None => Err(ResponseError::NoBody),
			Some(Body::Fault(fault)) => Err(ResponseError::Fault(fault.clone())),
			Some(Body::Value(Value::Null)) => Ok(Response::Empty),
			Some(Body::Value(Value::Object(object))) => {
				let mut values = object.values();
				Ok(match values.len() {
					0 => Response::Empty,
					1 => values.pop().map_or(Response::Empty, Response::Single),
					_ => Response::Many(values),
				})
			}
			Some(Body::Value(other)) => Ok(Response::Single(other.clone())),
		}
	}
}

fn expect(reader: &dyn TokenReader, kind: TokenKind, env: &str, name: &str) -> std::result::Result<(), DecodeError> {
	if reader.kind() == kind && reader.namespace() == Some(env) && reader.name() == name {
		return Ok(());
	}
	let tag = match kind {
		TokenKind::EndTag => format!("end tag </{{{env}}}{name}>"),
		_ => format!("start tag <{{{env}}}{name}>"),
	};
	Err(DecodeError::UnexpectedTag {
		expected: tag,
		found: describe(reader),
	})
}
