// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret},
	provider::{ProviderDescriptor, ProviderEndpoints, ResponseType},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required to start a login.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is part of every descriptor.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Redirect URL is required to recognize the end of the flow.
	#[error("Missing redirect URL.")]
	MissingRedirectUrl,
	/// Client identifier cannot be blank.
	#[error("Client identifier cannot be empty.")]
	EmptyClientId,
	/// Token parameter override cannot be blank.
	#[error("Token parameter name cannot be empty.")]
	EmptyTokenParam,
	/// Provider-hosted endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Display name; defaults to the identifier.
	pub name: Option<String>,
	/// Authorization endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// Redirect URL.
	pub redirect_url: Option<Url>,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Optional client secret.
	pub client_secret: Option<TokenSecret>,
	/// Requested response type.
	pub response_type: ResponseType,
	/// Optional token parameter override.
	pub token_param: Option<String>,
	/// Requested scopes.
	pub scopes: Vec<String>,
	/// Scope delimiter.
	pub scope_delimiter: char,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			name: None,
			authorization_endpoint: None,
			token_endpoint: None,
			redirect_url: None,
			client_id: String::new(),
			client_secret: None,
			response_type: ResponseType::default(),
			token_param: None,
			scopes: Vec::new(),
			scope_delimiter: ' ',
		}
	}

	/// Sets the display name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the redirect URL.
	pub fn redirect_url(mut self, url: Url) -> Self {
		self.redirect_url = Some(url);

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Overrides the response type.
	pub fn response_type(mut self, response_type: ResponseType) -> Self {
		self.response_type = response_type;

		self
	}

	/// Overrides the redirect parameter carrying the token.
	pub fn token_param(mut self, param: impl Into<String>) -> Self {
		self.token_param = Some(param.into());

		self
	}

	/// Replaces the requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the scope delimiter.
	pub fn scope_delimiter(mut self, delimiter: char) -> Self {
		self.scope_delimiter = delimiter;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let redirect = self.redirect_url.ok_or(ProviderDescriptorError::MissingRedirectUrl)?;
		let descriptor = ProviderDescriptor {
			name: self.name.unwrap_or_else(|| self.id.to_string()),
			id: self.id,
			endpoints: ProviderEndpoints { authorization, token, redirect },
			client_id: self.client_id,
			client_secret: self.client_secret,
			response_type: self.response_type,
			token_param: self.token_param,
			scopes: self.scopes,
			scope_delimiter: self.scope_delimiter,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	pub(crate) fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.client_id.trim().is_empty() {
			return Err(ProviderDescriptorError::EmptyClientId);
		}
		if self.token_param.as_deref().is_some_and(|param| param.trim().is_empty()) {
			return Err(ProviderDescriptorError::EmptyTokenParam);
		}

		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_scope_delimiter(self.scope_delimiter)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderDescriptorError> {
	if delimiter.is_control() {
		Err(ProviderDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
