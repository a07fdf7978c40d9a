//! Crate-level error types shared across the engine, adapters, and descriptors.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, TokenError},
	provider::ProviderDescriptorError,
	render::{LoadError, ScriptError},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error reported through [`crate::host::LoginOutcome::Failure`] and public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Renderer failed to load a page.
	#[error(transparent)]
	Transport(#[from] LoadError),
	/// Injected page script failed or returned an unexpected result.
	#[error(transparent)]
	Script(#[from] ScriptError),
	/// Final redirect could not be turned into a token.
	#[error(transparent)]
	Token(#[from] TokenError),

	/// Adapter rejected the URL or the URL could not be parsed.
	#[error("Navigation was rejected: {reason}.")]
	Classification {
		/// Adapter- or engine-supplied reason string.
		reason: String,
	},
	/// Adapter kept rewriting navigations without settling.
	#[error("Navigation was rewritten more than {limit} times.")]
	RedirectLoop {
		/// Rewrite budget that was exhausted.
		limit: usize,
	},
}
impl Error {
	/// Builds a classification error from any displayable reason.
	pub fn classification(reason: impl Into<String>) -> Self {
		Self::Classification { reason: reason.into() }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Provider descriptor JSON could not be decoded.
	#[error("Provider descriptor is invalid at `{path}`.")]
	InvalidDescriptor {
		/// Path to the offending field.
		path: String,
		/// Structured decoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// Descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] ProviderDescriptorError),
	/// A URL supplied through configuration could not be parsed.
	#[error("Configured {field} URL is invalid.")]
	InvalidUrl {
		/// Which configuration field held the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A page-matching pattern failed to compile.
	#[error("Page pattern `{pattern}` is invalid.")]
	InvalidPattern {
		/// Pattern source text.
		pattern: String,
		/// Underlying compile failure.
		#[source]
		source: regex::Error,
	},
	/// A login attempt was started without a username or password.
	#[error("Login requires a non-empty {field}.")]
	EmptyCredential {
		/// Which credential was empty.
		field: &'static str,
	},
}
impl ConfigError {
	/// Wraps a path-aware JSON decoding failure.
	pub fn invalid_descriptor(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::InvalidDescriptor { path, source: e.into_inner() }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn nested_errors_keep_their_source() {
		let load = LoadError::network("offline");
		let err: Error = load.into();

		assert!(matches!(err, Error::Transport(_)));
		assert!(err.to_string().contains("offline"));

		let err: Error = ConfigError::EmptyCredential { field: "password" }.into();

		assert_eq!(err.to_string(), "Login requires a non-empty password.");
	}

	#[test]
	fn invalid_descriptor_reports_field_path() {
		#[derive(Debug, Deserialize)]
		struct Sample {
			#[allow(dead_code)]
			client_id: String,
		}

		let mut de = serde_json::Deserializer::from_str("{\"client_id\":7}");
		let e = serde_path_to_error::deserialize::<_, Sample>(&mut de)
			.expect_err("Numeric client id should fail to decode.");
		let err = ConfigError::invalid_descriptor(e);

		assert!(matches!(&err, ConfigError::InvalidDescriptor { path, .. } if path == "client_id"));
		assert!(StdError::source(&err).is_some());
	}
}
