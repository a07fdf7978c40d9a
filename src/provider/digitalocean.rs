//! DigitalOcean preset for [`HostedPageAdapter`].
//!
//! DigitalOcean only offers the browser-based implicit grant for third-party desktop
//! apps. Login and consent both live on `cloud.digitalocean.com`; a signed-in user who
//! lands on the dashboard is sent back to the authorization URL.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	error::ConfigError,
	provider::{
		ApprovalPolicy, HostedPageAdapter, LoginForm, PagePatterns, ProviderDescriptor,
		ResponseType, RewriteTarget,
	},
};

/// Authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://cloud.digitalocean.com/v1/oauth/authorize";
/// Token endpoint.
pub const TOKEN_URL: &str = "https://cloud.digitalocean.com/v1/oauth/token";
/// Scopes requested by desktop clients.
pub const SCOPES: [&str; 2] = ["read", "write"];

/// Builds the DigitalOcean descriptor for a registered application.
pub fn descriptor(
	client_id: &str,
	client_secret: Option<&str>,
	redirect: Url,
) -> Result<ProviderDescriptor, ConfigError> {
	let mut builder = ProviderDescriptor::builder(ProviderId::new("digitalocean")?)
		.name("DigitalOcean")
		.authorization_endpoint(parse("authorization", AUTHORIZATION_URL)?)
		.token_endpoint(parse("token", TOKEN_URL)?)
		.redirect_url(redirect)
		.client_id(client_id)
		.response_type(ResponseType::Token)
		.scopes(SCOPES);

	if let Some(secret) = client_secret {
		builder = builder.client_secret(secret);
	}

	Ok(builder.build()?)
}

/// Page patterns of the DigitalOcean control panel.
pub fn pages() -> PagePatterns {
	PagePatterns::new("/login")
		.wrong_credentials_param("error")
		.approval_path("/v1/oauth/authorize")
		.error_path("/v1/oauth/error")
		.external_path("/registrations*")
		.external_path("/forgot_password*")
		.rewrite("/", RewriteTarget::Authorization)
		.rewrite("/projects*", RewriteTarget::Authorization)
		.rewrite("/droplets*", RewriteTarget::Authorization)
}

/// Login form of the DigitalOcean control panel.
pub fn login_form() -> Result<LoginForm, ConfigError> {
	LoginForm::default()
		.username_selector("input[name='user[email]'], input[type=email]")
		.password_selector("input[name='user[password]'], input[type=password]")
		.approval_marker(r#"(?i)<form\b[^>]*\baction\s*=\s*["'][^"']*/v1/oauth/authorize"#)
}

/// Builds the ready-to-use DigitalOcean adapter.
///
/// The authorize path doubles as the first URL of every attempt, so approval stays
/// in-page rather than raising the host sheet.
pub fn adapter(
	client_id: &str,
	client_secret: Option<&str>,
	redirect: Url,
) -> Result<HostedPageAdapter, ConfigError> {
	Ok(HostedPageAdapter::new(descriptor(client_id, client_secret, redirect)?, pages())
		.with_login_form(login_form()?)
		.with_approval_policy(ApprovalPolicy::InPage))
}

fn parse(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { field, source })
}
