//! Provider descriptor data shared by every adapter.
//!
//! A descriptor is the immutable, serializable half of a provider: endpoints, client
//! identity, and the shape of the final redirect. The behavioral half lives in
//! [`crate::provider::ProviderAdapter`] implementations.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret},
	error::ConfigError,
};

/// How the provider hands the result back on the redirect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
	#[default]
	/// Implicit grant: the access token rides on the redirect fragment.
	Token,
	/// Authorization code grant: the redirect carries a `code` to exchange later.
	Code,
}
impl ResponseType {
	/// Returns the RFC 6749 `response_type` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResponseType::Token => "token",
			ResponseType::Code => "code",
		}
	}

	/// Redirect parameter that carries the result for this response type.
	pub const fn default_param(self) -> &'static str {
		match self {
			ResponseType::Token => "access_token",
			ResponseType::Code => "code",
		}
	}
}
impl Display for ResponseType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// First URL loaded for every login attempt.
	pub authorization: Url,
	/// Token endpoint, kept for consumers that exchange codes themselves.
	pub token: Url,
	/// Redirect URI the provider navigates to once the flow completes.
	pub redirect: Url,
}

/// Immutable provider descriptor consumed by adapters and the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Human-readable service name.
	pub name: String,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret, for providers that hand one to desktop clients.
	#[serde(default)]
	pub client_secret: Option<TokenSecret>,
	/// Result shape requested from the authorization endpoint.
	#[serde(default)]
	pub response_type: ResponseType,
	/// Redirect parameter carrying the token; defaults per [`ResponseType`].
	#[serde(default)]
	pub token_param: Option<String>,
	/// Requested scopes.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Character used to join scopes into the `scope` parameter.
	#[serde(default = "default_scope_delimiter")]
	pub scope_delimiter: char,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Decodes and validates a descriptor from JSON.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let descriptor: Self =
			serde_path_to_error::deserialize(&mut de).map_err(ConfigError::invalid_descriptor)?;

		descriptor.validate()?;

		Ok(descriptor)
	}

	/// Redirect parameter carrying the token.
	pub fn token_param(&self) -> &str {
		self.token_param.as_deref().unwrap_or(self.response_type.default_param())
	}

	/// Scopes joined with the configured delimiter, or `None` when no scopes are requested.
	pub fn scope_param(&self) -> Option<String> {
		if self.scopes.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, value) in self.scopes.iter().enumerate() {
			if idx > 0 {
				buf.push(self.scope_delimiter);
			}

			buf.push_str(value);
		}

		Some(buf)
	}
}

fn default_scope_delimiter() -> char {
	' '
}
