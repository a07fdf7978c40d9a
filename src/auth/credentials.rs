//! User-supplied login credentials.

// self
use crate::{_prelude::*, error::ConfigError};

/// Username/password pair handed to the engine for a single login attempt.
///
/// The password never shows up in `Debug` output, so credentials can ride along in spans
/// and error contexts safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	username: String,
	password: String,
}
impl Credentials {
	/// Validates and wraps a username/password pair.
	pub fn new(
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let username = username.into();
		let password = password.into();

		if username.trim().is_empty() {
			return Err(ConfigError::EmptyCredential { field: "username" });
		}
		if password.is_empty() {
			return Err(ConfigError::EmptyCredential { field: "password" });
		}

		Ok(Self { username, password })
	}

	/// Username as entered by the user.
	pub fn username(&self) -> &str {
		&self.username
	}

	/// Returns the password. Callers must avoid logging this string.
	pub fn expose_password(&self) -> &str {
		&self.password
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}
