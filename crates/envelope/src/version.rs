//! SOAP protocol versions and their namespace sets.

use serde::{Deserialize, Serialize};

/// SOAP envelope version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoapVersion {
	/// SOAP 1.0 with the 1999 schema namespaces.
	#[serde(rename = "1.0")]
	V10,
	/// SOAP 1.1.
	#[default]
	#[serde(rename = "1.1")]
	V11,
	/// SOAP 1.2.
	#[serde(rename = "1.2")]
	V12,
}

/// Namespace URIs used by one [`SoapVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoapNamespaces {
	/// Envelope namespace.
	pub env: &'static str,
	/// SOAP encoding namespace (arrays, `root`, `position`).
	pub enc: &'static str,
	/// Schema-instance namespace (`type`, `nil`).
	pub xsi: &'static str,
	/// Schema namespace for built-in types.
	pub xsd: &'static str,
}

const XSI_1999: &str = "http://www.w3.org/1999/XMLSchema-instance";
const XSD_1999: &str = "http://www.w3.org/1999/XMLSchema";
const XSI_2001: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_2001: &str = "http://www.w3.org/2001/XMLSchema";
const ENV_11: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const ENC_11: &str = "http://schemas.xmlsoap.org/soap/encoding/";
const ENV_12: &str = "http://www.w3.org/2003/05/soap-envelope";
const ENC_12: &str = "http://www.w3.org/2003/05/soap-encoding";

impl SoapVersion {
	/// Namespace set for this version.
	pub const fn namespaces(self) -> SoapNamespaces {
		match self {
			SoapVersion::V10 => SoapNamespaces {
				env: ENV_11,
				enc: ENC_11,
				xsi: XSI_1999,
				xsd: XSD_1999,
			},
			SoapVersion::V11 => SoapNamespaces {
				env: ENV_11,
				enc: ENC_11,
				xsi: XSI_2001,
				xsd: XSD_2001,
			},
			SoapVersion::V12 => SoapNamespaces {
				env: ENV_12,
				enc: ENC_12,
				xsi: XSI_2001,
				xsd: XSD_2001,
			},
		}
	}

	/// Version string as written in configuration.
	pub const fn as_str(self) -> &'static str {
		match self {
			SoapVersion::V10 => "1.0",
			SoapVersion::V11 => "1.1",
			SoapVersion::V12 => "1.2",
		}
	}
}

impl std::fmt::Display for SoapVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
