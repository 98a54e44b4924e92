//! XML text adapter for [`kwire_envelope`].
//!
//! [`parse`] turns document text into a [`TokenBuffer`] with namespaces resolved, and [`render`]
//! turns a buffer back into text. [`to_xml`] and [`from_xml`] wrap both around a
//! [`SerializationEnvelope`].

#![warn(missing_docs)]

pub mod error;
mod read;
mod scope;
mod write;

#[cfg(test)]
mod tests;

use kwire_envelope::{SerializationEnvelope, TokenBuffer, TokenSink};

pub use error::{Result, XmlError};
pub use read::parse;
pub use write::render;

/// Writes `envelope` as XML text.
pub fn to_xml(envelope: &SerializationEnvelope) -> Result<String> {
	let mut sink = TokenSink::new();
	envelope.write(&mut sink)?;
	render(&sink.into_buffer()?)
}

/// Parses `xml` into `envelope`, replacing its previously parsed header and body.
pub fn from_xml(envelope: &mut SerializationEnvelope, xml: &str) -> Result<()> {
	let mut document: TokenBuffer = parse(xml)?;
	envelope.parse(&mut document)?;
	Ok(())
}
