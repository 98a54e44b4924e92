//! Serialization envelope for tag-structured RPC documents.
//!
//! The envelope maps a graph of [`Serializable`](kwire_model::Serializable) objects to and from a
//! token stream:
//! * [`TypeRegistry`]: wire name to local type bindings, shared between envelopes
//! * [`Marshal`]: custom per-wire-type readers and writers, with built-ins for XSD scalars
//! * [`SerializationEnvelope`]: one request or response, with header, body, and fault handling
//! * [`TokenReader`] / [`TokenWriter`]: the pull and push token seams, plus in-memory
//!   [`TokenBuffer`] and [`TokenSink`] implementations
//!
//! Multi-referenced objects are written once with an `id` and pointed at with `href`; decoding
//! restores the aliasing and patches forward references once their target appears.

#![warn(missing_docs)]

mod decode;
mod encode;
pub mod envelope;
pub mod error;
pub mod fault;
pub mod marshal;
pub mod options;
pub mod refs;
pub mod registry;
pub mod token;
pub mod version;

pub use envelope::{Body, HeaderEntry, Response, ResponseError, SerializationEnvelope};
pub use error::{DecodeError, EncodeError, Error, ErrorCategory, Result};
pub use fault::Fault;
pub use marshal::{AnyTypeMarshal, Base64Marshal, DateMarshal, FloatMarshal, Marshal, PrimitiveMarshal};
pub use options::{EnvelopeOptions, OptionsError};
pub use refs::{ReferenceTracker, Slot};
pub use registry::{Constructor, TypeBinding, TypeMapping, TypeRegistry};
pub use token::{Attribute, StartToken, Token, TokenBuffer, TokenError, TokenKind, TokenReader, TokenSink, TokenWriter};
pub use version::{SoapNamespaces, SoapVersion};
