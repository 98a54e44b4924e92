//! Per-wire-type readers and writers.
//!
//! A [`Marshal`] owns the content of an element: the codec writes the element tag and its
//! `xsi:type` and hands the marshal the text in between. On read the marshal starts on the start
//! tag and must stop on the matching end tag.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use kwire_model::{Opaque, PropertyInfo, Scalar, TypeKey, Value, WireName};

use crate::error::{DecodeError, EncodeError};
use crate::registry::TypeRegistry;
use crate::token::{TokenKind, TokenReader, TokenWriter};

/// Custom encoding for one or more wire types.
pub trait Marshal: Send + Sync + fmt::Debug {
	/// Reads the element at the reader's current start tag, stopping on its end tag.
	fn read(&self, reader: &mut dyn TokenReader, type_name: &WireName, expected: &PropertyInfo)
	-> Result<Value, DecodeError>;

	/// Writes the content of `value`, which is being encoded as `type_name`.
	fn write(&self, writer: &mut dyn TokenWriter, type_name: &WireName, value: &Value) -> Result<(), EncodeError>;

	/// Registers the wire types this marshal handles.
	fn register(self: Arc<Self>, registry: &TypeRegistry);
}

fn invalid(type_name: &WireName, text: &str, reason: impl fmt::Display) -> DecodeError {
	DecodeError::InvalidValue {
		type_name: type_name.clone(),
		text: text.to_string(),
		reason: reason.to_string(),
	}
}

fn mismatch(type_name: &WireName, value: &Value) -> EncodeError {
	EncodeError::MarshalMismatch {
		type_name: type_name.clone(),
		found: value.kind(),
	}
}

/// `xsd:string`, `xsd:int`, `xsd:long` and `xsd:boolean`.
#[derive(Debug, Default)]
pub struct PrimitiveMarshal;

impl Marshal for PrimitiveMarshal {
	fn read(
		&self,
		reader: &mut dyn TokenReader,
		type_name: &WireName,
		_expected: &PropertyInfo,
	) -> Result<Value, DecodeError> {
		let text = reader.read_text()?;
		let scalar = match type_name.name() {
			"string" => Scalar::String(text),
			"int" => Scalar::Int(text.trim().parse().map_err(|e| invalid(type_name, &text, e))?),
			"long" => Scalar::Long(text.trim().parse().map_err(|e| invalid(type_name, &text, e))?),
			"boolean" => {
				let lowered = text.trim().to_ascii_lowercase();
				Scalar::Boolean(lowered == "1" || lowered == "true")
			}
			other => return Err(DecodeError::Marshal(format!("primitive marshal cannot read `{other}`"))),
		};
		Ok(Value::Scalar(scalar))
	}

	fn write(&self, writer: &mut dyn TokenWriter, type_name: &WireName, value: &Value) -> Result<(), EncodeError> {
		let text = match value {
			Value::Scalar(Scalar::String(s)) => s.clone(),
			Value::Scalar(Scalar::Int(v)) => v.to_string(),
			Value::Scalar(Scalar::Long(v)) => v.to_string(),
			Value::Scalar(Scalar::Boolean(v)) => v.to_string(),
			other => return Err(mismatch(type_name, other)),
		};
		writer.text(&text)?;
		Ok(())
	}

	fn register(self: Arc<Self>, registry: &TypeRegistry) {
		let xsd = registry.namespaces().xsd;
		for (name, key) in [
			("string", TypeKey::STRING),
			("int", TypeKey::INT),
			("long", TypeKey::LONG),
			("boolean", TypeKey::BOOLEAN),
		] {
			registry.add_marshal(WireName::qualified(xsd, name), key, self.clone());
		}
	}
}

/// `xsd:float` and `xsd:double`, including `INF`, `-INF` and `NaN`.
#[derive(Debug, Default)]
pub struct FloatMarshal;

fn parse_float(text: &str) -> Result<f64, std::num::ParseFloatError> {
	match text.trim() {
		"INF" => Ok(f64::INFINITY),
		"-INF" => Ok(f64::NEG_INFINITY),
		"NaN" => Ok(f64::NAN),
		other => other.parse(),
	}
}

fn format_float(v: f64) -> String {
	if v.is_nan() {
		"NaN".to_string()
	} else if v == f64::INFINITY {
		"INF".to_string()
	} else if v == f64::NEG_INFINITY {
		"-INF".to_string()
	} else {
		v.to_string()
	}
}

impl Marshal for FloatMarshal {
	fn read(
		&self,
		reader: &mut dyn TokenReader,
		type_name: &WireName,
		_expected: &PropertyInfo,
	) -> Result<Value, DecodeError> {
		let text = reader.read_text()?;
		let v = parse_float(&text).map_err(|e| invalid(type_name, &text, e))?;
		let scalar = match type_name.name() {
			"float" => Scalar::Float(v as f32),
			_ => Scalar::Double(v),
		};
		Ok(Value::Scalar(scalar))
	}

	fn write(&self, writer: &mut dyn TokenWriter, type_name: &WireName, value: &Value) -> Result<(), EncodeError> {
		let text = match value {
			Value::Scalar(Scalar::Float(v)) if v.is_finite() => v.to_string(),
			Value::Scalar(Scalar::Float(v)) => format_float(f64::from(*v)),
			Value::Scalar(Scalar::Double(v)) => format_float(*v),
			other => return Err(mismatch(type_name, other)),
		};
		writer.text(&text)?;
		Ok(())
	}

	fn register(self: Arc<Self>, registry: &TypeRegistry) {
		let xsd = registry.namespaces().xsd;
		registry.add_marshal(WireName::qualified(xsd, "float"), TypeKey::FLOAT, self.clone());
		registry.add_marshal(WireName::qualified(xsd, "double"), TypeKey::DOUBLE, self);
	}
}

/// Binary payloads as standard base64.
#[derive(Debug, Default)]
pub struct Base64Marshal;

impl Marshal for Base64Marshal {
	fn read(
		&self,
		reader: &mut dyn TokenReader,
		type_name: &WireName,
		_expected: &PropertyInfo,
	) -> Result<Value, DecodeError> {
		let text = reader.read_text()?;
		let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
		let bytes = STANDARD.decode(compact).map_err(|e| invalid(type_name, &text, e))?;
		Ok(Value::Scalar(Scalar::Bytes(bytes)))
	}

	fn write(&self, writer: &mut dyn TokenWriter, type_name: &WireName, value: &Value) -> Result<(), EncodeError> {
		let Value::Scalar(Scalar::Bytes(bytes)) = value else {
			return Err(mismatch(type_name, value));
		};
		writer.text(&STANDARD.encode(bytes))?;
		Ok(())
	}

	fn register(self: Arc<Self>, registry: &TypeRegistry) {
		let ns = registry.namespaces();
		registry.add_marshal(WireName::qualified(ns.enc, "base64"), TypeKey::BYTES, self.clone());
		registry.add_marshal(WireName::qualified(ns.xsd, "base64Binary"), TypeKey::BYTES, self);
	}
}

/// `xsd:dateTime`. Timestamps without an offset are read as UTC.
#[derive(Debug, Default)]
pub struct DateMarshal;

impl Marshal for DateMarshal {
	fn read(
		&self,
		reader: &mut dyn TokenReader,
		type_name: &WireName,
		_expected: &PropertyInfo,
	) -> Result<Value, DecodeError> {
		let text = reader.read_text()?;
		let trimmed = text.trim();
		let parsed = match DateTime::parse_from_rfc3339(trimmed) {
			Ok(dt) => dt,
			Err(err) => NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
				.map(|naive| naive.and_utc().fixed_offset())
				.map_err(|_| invalid(type_name, &text, err))?,
		};
		Ok(Value::Scalar(Scalar::DateTime(parsed)))
	}

	fn write(&self, writer: &mut dyn TokenWriter, type_name: &WireName, value: &Value) -> Result<(), EncodeError> {
		let Value::Scalar(Scalar::DateTime(dt)) = value else {
			return Err(mismatch(type_name, value));
		};
		let text = if dt.offset().local_minus_utc() == 0 {
			dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true)
		} else {
			dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
		};
		writer.text(&text)?;
		Ok(())
	}

	fn register(self: Arc<Self>, registry: &TypeRegistry) {
		let xsd = registry.namespaces().xsd;
		registry.add_marshal(WireName::qualified(xsd, "dateTime"), TypeKey::DATE_TIME, self);
	}
}

/// Untyped elements. Text-only content becomes [`Value::Opaque`].
#[derive(Debug, Default)]
pub struct AnyTypeMarshal;

impl Marshal for AnyTypeMarshal {
	fn read(
		&self,
		reader: &mut dyn TokenReader,
		type_name: &WireName,
		_expected: &PropertyInfo,
	) -> Result<Value, DecodeError> {
		let mut text = String::new();
		loop {
			match reader.next()? {
				TokenKind::Text => text.push_str(reader.text()),
				TokenKind::EndTag => break,
				TokenKind::StartTag => return Err(DecodeError::Unmaterializable(type_name.clone())),
				TokenKind::StartDocument | TokenKind::EndDocument => {
					return Err(crate::token::TokenError::UnclosedElements(1).into());
				}
			}
		}
		Ok(Value::Opaque(Opaque::new(type_name.clone(), text)))
	}

	fn write(&self, writer: &mut dyn TokenWriter, type_name: &WireName, value: &Value) -> Result<(), EncodeError> {
		match value {
			Value::Opaque(opaque) => writer.text(&opaque.text)?,
			Value::Scalar(Scalar::String(s)) => writer.text(s)?,
			other => return Err(mismatch(type_name, other)),
		}
		Ok(())
	}

	fn register(self: Arc<Self>, registry: &TypeRegistry) {
		let xsd = registry.namespaces().xsd;
		registry.register(WireName::qualified(xsd, "anyType"), None, crate::registry::TypeBinding::Marshal(self));
	}
}
