//! Redacted holder for redirect tokens and the configured client secret.

// self
use crate::_prelude::*;

/// Access token, refresh token, authorization code, or client secret.
///
/// Serializes as the bare string so grants and descriptors round-trip through JSON, but
/// formats as `<redacted>` so spans, `Debug` dumps of a [`crate::auth::TokenGrant`], and
/// outcome logs never carry the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a value read from a redirect or from configuration.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw value for handing to the provider's API.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
