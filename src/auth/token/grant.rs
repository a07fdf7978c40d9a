//! Token extraction from the provider's final redirect.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Failures raised while turning a redirect URL into a [`TokenGrant`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenError {
	/// The redirect did not carry the configured token parameter.
	#[error("Redirect is missing the `{param}` parameter.")]
	MissingToken {
		/// Parameter name the adapter expects the token under.
		param: String,
	},
	/// `expires_in` was not a positive number of seconds.
	#[error("Redirect carries an invalid expires_in value: {value}.")]
	InvalidExpiresIn {
		/// Raw value received from the provider.
		value: String,
	},
	/// The echoed `state` differs from the one the session sent.
	#[error("Redirect state does not match the login session.")]
	StateMismatch,
}

/// Token material captured from the final redirect of a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Access token (or authorization code, for `response_type=code` providers).
	pub access_token: TokenSecret,
	/// Provider-reported token type, usually `bearer`.
	pub token_type: Option<String>,
	/// Scope string granted by the provider, verbatim.
	pub scope: Option<String>,
	/// Refresh token, if the provider put one on the redirect.
	pub refresh_token: Option<TokenSecret>,
	/// `state` echoed back by the provider.
	pub state: Option<String>,
	/// Instant the redirect was observed.
	pub issued_at: OffsetDateTime,
	/// Expiry derived from `expires_in`, when supplied.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenGrant {
	/// Extracts a grant from `url`, reading the token from `token_param`.
	pub fn from_redirect(url: &Url, token_param: &str) -> Result<Self, TokenError> {
		Self::from_redirect_at(url, token_param, OffsetDateTime::now_utc())
	}

	/// Same as [`TokenGrant::from_redirect`] with an explicit observation instant.
	pub fn from_redirect_at(
		url: &Url,
		token_param: &str,
		issued_at: OffsetDateTime,
	) -> Result<Self, TokenError> {
		let mut params = redirect_params(url);
		let access_token = params
			.remove(token_param)
			.filter(|value| !value.is_empty())
			.map(TokenSecret::new)
			.ok_or_else(|| TokenError::MissingToken { param: token_param.to_owned() })?;
		let expires_at = match params.remove("expires_in") {
			Some(raw) => Some(expiry_from(&raw, issued_at)?),
			None => None,
		};

		Ok(Self {
			access_token,
			token_type: params.remove("token_type"),
			scope: params.remove("scope"),
			refresh_token: params.remove("refresh_token").map(TokenSecret::new),
			state: params.remove("state"),
			issued_at,
			expires_at,
		})
	}

	/// Rejects a grant whose echoed `state` differs from `expected`.
	///
	/// Providers that drop `state` on the redirect are accepted.
	pub fn validate_state(&self, expected: &str) -> Result<(), TokenError> {
		match self.state.as_deref() {
			Some(returned) if returned != expected => Err(TokenError::StateMismatch),
			_ => Ok(()),
		}
	}

	/// Returns `true` once the grant's expiry (if any) has passed at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}
}

/// Collects the percent-decoded `key=value` pairs of a redirect's query and fragment.
///
/// Fragment values win over query values with the same key.
pub fn redirect_params(url: &Url) -> HashMap<String, String> {
	let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();

	if let Some(fragment) = url.fragment() {
		params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
	}

	params
}

fn expiry_from(raw: &str, issued_at: OffsetDateTime) -> Result<OffsetDateTime, TokenError> {
	let invalid = || TokenError::InvalidExpiresIn { value: raw.to_owned() };
	let seconds = raw.trim().parse::<i64>().map_err(|_| invalid())?;

	if seconds <= 0 {
		return Err(invalid());
	}

	issued_at.checked_add(Duration::seconds(seconds)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Redirect fixture should parse.")
	}

	#[test]
	fn fragment_token_is_decoded_with_metadata() {
		let issued = macros::datetime!(2025-06-13 12:00 UTC);
		let grant = TokenGrant::from_redirect_at(
			&url(
				"oceanbar://oauth/callback#access_token=abc%2B123&token_type=bearer&expires_in=2592000&scope=read%20write&state=xyz",
			),
			"access_token",
			issued,
		)
		.expect("Fragment redirect should yield a grant.");

		assert_eq!(grant.access_token.expose(), "abc+123");
		assert_eq!(grant.token_type.as_deref(), Some("bearer"));
		assert_eq!(grant.scope.as_deref(), Some("read write"));
		assert_eq!(grant.expires_at, Some(issued + Duration::days(30)));
		assert!(grant.validate_state("xyz").is_ok());
		assert_eq!(grant.validate_state("other"), Err(TokenError::StateMismatch));
		assert!(!grant.is_expired_at(issued));
		assert!(grant.is_expired_at(issued + Duration::days(30)));
	}

	#[test]
	fn query_token_and_missing_state_are_accepted() {
		let grant = TokenGrant::from_redirect(&url("https://app.test/callback?code=c-1"), "code")
			.expect("Query redirect should yield a grant.");

		assert_eq!(grant.access_token.expose(), "c-1");
		assert!(grant.state.is_none());
		assert!(grant.validate_state("anything").is_ok());
		assert!(grant.expires_at.is_none());
	}

	#[test]
	fn fragment_overrides_query() {
		let params = redirect_params(&url("https://app.test/cb?access_token=q#access_token=f"));

		assert_eq!(params.get("access_token").map(String::as_str), Some("f"));
	}

	#[test]
	fn missing_or_empty_token_is_rejected() {
		for raw in ["https://app.test/callback", "https://app.test/callback?access_token="] {
			let err = TokenGrant::from_redirect(&url(raw), "access_token")
				.expect_err("Redirect without a token should be rejected.");

			assert_eq!(err, TokenError::MissingToken { param: "access_token".into() });
		}
	}

	#[test]
	fn bad_expires_in_is_rejected() {
		for raw in ["soon", "0", "-5"] {
			let redirect = format!("https://app.test/callback?access_token=t&expires_in={raw}");
			let err = TokenGrant::from_redirect(&url(&redirect), "access_token")
				.expect_err("Invalid expires_in should be rejected.");

			assert!(matches!(err, TokenError::InvalidExpiresIn { .. }));
		}
	}
}
