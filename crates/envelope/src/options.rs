//! Envelope configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::SoapVersion;

/// Default nesting limit for encode and decode.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default upper bound on decoded array slots.
pub const DEFAULT_MAX_ARRAY_LEN: usize = 1 << 20;

/// Errors loading [`EnvelopeOptions`].
#[derive(Debug, Error)]
pub enum OptionsError {
	/// The TOML text could not be parsed.
	#[error("failed to parse envelope options: {0}")]
	Parse(#[from] toml::de::Error),

	/// A field holds an unusable value.
	#[error("invalid envelope option `{field}`: {reason}")]
	Invalid {
		/// Offending field.
		field: &'static str,
		/// Why it was rejected.
		reason: &'static str,
	},
}

/// Per-envelope behavior switches.
///
/// ```toml
/// version = "1.2"
/// implicit-types = true
/// max-depth = 64
/// max-array-len = 4096
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EnvelopeOptions {
	/// Protocol version; must match the registry the envelope is built with.
	pub version: SoapVersion,
	/// Omit `xsi:type` (and `arrayType`) when the runtime type equals the declared type.
	pub implicit_types: bool,
	/// Maximum element nesting accepted on decode and produced on encode.
	pub max_depth: usize,
	/// Maximum number of slots a decoded array may hold. Declared sizes, offsets and
	/// positions beyond it are rejected.
	pub max_array_len: usize,
}

impl Default for EnvelopeOptions {
	fn default() -> Self {
		Self {
			version: SoapVersion::default(),
			implicit_types: false,
			max_depth: DEFAULT_MAX_DEPTH,
			max_array_len: DEFAULT_MAX_ARRAY_LEN,
		}
	}
}

impl EnvelopeOptions {
	/// Sets the protocol version.
	pub fn with_version(mut self, version: SoapVersion) -> Self {
		self.version = version;
		self
	}

	/// Toggles implicit types.
	pub fn with_implicit_types(mut self, implicit_types: bool) -> Self {
		self.implicit_types = implicit_types;
		self
	}

	/// Sets the nesting limit.
	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}

	/// Sets the decoded array size limit.
	pub fn with_max_array_len(mut self, max_array_len: usize) -> Self {
		self.max_array_len = max_array_len;
		self
	}

	/// Parses options from TOML. Missing keys take their defaults.
	pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
		let options: Self = toml::from_str(text)?;
		if options.max_depth == 0 {
			return Err(OptionsError::Invalid {
				field: "max-depth",
				reason: "must be at least 1",
			});
		}
		Ok(options)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_is_default() {
		assert_eq!(EnvelopeOptions::from_toml_str("").unwrap(), EnvelopeOptions::default());
	}

	#[test]
	fn parses_kebab_case_keys() {
		let options = EnvelopeOptions::from_toml_str("version = \"1.2\"\nimplicit-types = true\nmax-depth = 64\nmax-array-len = 16\n").unwrap();
		assert_eq!(
			options,
			EnvelopeOptions::default()
				.with_version(SoapVersion::V12)
				.with_implicit_types(true)
				.with_max_depth(64)
				.with_max_array_len(16)
		);
	}

	#[test]
	fn rejects_unknown_keys_and_zero_depth() {
		assert!(matches!(
			EnvelopeOptions::from_toml_str("implicit_types = true"),
			Err(OptionsError::Parse(_))
		));
		assert!(matches!(
			EnvelopeOptions::from_toml_str("version = \"2.0\""),
			Err(OptionsError::Parse(_))
		));
		assert!(matches!(
			EnvelopeOptions::from_toml_str("max-depth = 0"),
			Err(OptionsError::Invalid { field: "max-depth", .. })
		));
	}
}
