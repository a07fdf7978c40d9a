//! Provider adapter hooks consulted by the navigation engine.
//!
//! An adapter pairs a [`ProviderDescriptor`] with the provider-specific logic needed to
//! recognize and manipulate its hosted pages. Adapters are stateless strategy objects:
//! every decision is made from the URL or document handed in, never from engine state.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenSecret},
	provider::ProviderDescriptor,
	render::{Document, Renderer, ScriptError},
};

/// Decision taken for a URL the renderer is about to load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UrlAction {
	/// Load the URL unmodified.
	LoadUrl,
	/// Load the URL and ask the host to show the approval sheet.
	ShowApprovalSheet,
	/// Load the URL and ask the host to hide the approval sheet.
	HideApprovalSheet,
	/// Load the URL and fill in the credentials once it is a login page.
	InsertCredentials,
	/// The provider rejected the submitted credentials.
	WrongCredentials,
	/// The flow cannot continue.
	Error {
		/// Diagnostic reason.
		reason: String,
	},
	/// Drop the URL and load this one instead.
	LoadCustomUrl(Url),
	/// Drop the URL and open this one in the system browser.
	LoadExternal(Url),
	/// The URL is the final redirect carrying the token.
	Finished(Url),
}
impl UrlAction {
	/// Builds an [`UrlAction::Error`] from any displayable reason.
	pub fn error(reason: impl Into<String>) -> Self {
		Self::Error { reason: reason.into() }
	}

	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			UrlAction::LoadUrl => "load_url",
			UrlAction::ShowApprovalSheet => "show_approval_sheet",
			UrlAction::HideApprovalSheet => "hide_approval_sheet",
			UrlAction::InsertCredentials => "insert_credentials",
			UrlAction::WrongCredentials => "wrong_credentials",
			UrlAction::Error { .. } => "error",
			UrlAction::LoadCustomUrl(_) => "load_custom_url",
			UrlAction::LoadExternal(_) => "load_external",
			UrlAction::Finished(_) => "finished",
		}
	}
}

/// Classification of a fully loaded document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PageType {
	#[default]
	/// Any page without special handling.
	Default,
	/// The provider's login form.
	LoginPage,
	/// The provider's "grant access to this app" page.
	ApprovalPage,
}
impl PageType {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PageType::Default => "default",
			PageType::LoginPage => "login_page",
			PageType::ApprovalPage => "approval_page",
		}
	}
}
impl Display for PageType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Capability set every provider supplies to the engine.
///
/// Implementors are required to be `Send + Sync` so one adapter value can back many
/// engines. Only the three decision hooks are mandatory; the descriptor accessors and
/// [`ProviderAdapter::add_login_params`] have defaults driven by
/// [`ProviderAdapter::descriptor`].
pub trait ProviderAdapter: Send + Sync {
	/// Immutable provider data.
	fn descriptor(&self) -> &ProviderDescriptor;

	/// Classifies a URL the renderer is about to load.
	///
	/// Must be total: provider error redirects map to [`UrlAction::Error`] and the
	/// token-bearing redirect maps to [`UrlAction::Finished`].
	fn action_for_url(&self, url: &Url) -> UrlAction;

	/// Classifies a loaded document by its URL and markup.
	fn page_type_for_document(&self, document: &Document) -> PageType;

	/// Writes the credentials into the loaded login form and submits it.
	///
	/// Providers that collect credentials through a host sheet instead may leave this as
	/// a no-op.
	fn fill_credentials(
		&self,
		credentials: &Credentials,
		renderer: &mut dyn Renderer,
	) -> Result<(), ScriptError>;

	/// Adds provider query parameters to the authorization URL.
	///
	/// The default inserts `response_type`, `client_id`, `redirect_uri`, and `scope`.
	fn add_login_params(&self, params: &mut BTreeMap<String, String>) {
		let descriptor = self.descriptor();

		params.insert("response_type".into(), descriptor.response_type.as_str().into());
		params.insert("client_id".into(), descriptor.client_id.clone());
		params.insert("redirect_uri".into(), descriptor.endpoints.redirect.to_string());

		if let Some(scope) = descriptor.scope_param() {
			params.insert("scope".into(), scope);
		}
	}

	/// Human-readable service name.
	fn name(&self) -> &str {
		&self.descriptor().name
	}

	/// First URL loaded for every login attempt, without query parameters.
	fn authorization_url(&self) -> &Url {
		&self.descriptor().endpoints.authorization
	}

	/// OAuth 2.0 client identifier.
	fn client_id(&self) -> &str {
		&self.descriptor().client_id
	}

	/// Client secret, if the provider issued one.
	fn client_secret(&self) -> Option<&TokenSecret> {
		self.descriptor().client_secret.as_ref()
	}

	/// Token endpoint.
	fn token_url(&self) -> &Url {
		&self.descriptor().endpoints.token
	}

	/// Redirect URL marking the end of the flow.
	fn redirect_url(&self) -> &Url {
		&self.descriptor().endpoints.redirect
	}

	/// Redirect parameter carrying the token.
	fn token_param(&self) -> &str {
		self.descriptor().token_param()
	}

	/// Returns `true` when `url` points at the configured redirect.
	///
	/// Scheme, host, port, and path must match; query and fragment are ignored.
	fn is_redirect(&self, url: &Url) -> bool {
		let redirect = self.redirect_url();

		url.scheme() == redirect.scheme()
			&& url.host_str() == redirect.host_str()
			&& url.port_or_known_default() == redirect.port_or_known_default()
			&& url.path().trim_end_matches('/') == redirect.path().trim_end_matches('/')
	}
}

/// Builds the full authorization URL from the adapter's login parameters.
///
/// `state`, when given, is sent alongside the adapter's parameters.
pub fn authorization_request_url<A>(adapter: &A, state: Option<&str>) -> Url
where
	A: ?Sized + ProviderAdapter,
{
	let mut params = BTreeMap::new();

	adapter.add_login_params(&mut params);

	if let Some(state) = state {
		params.insert("state".into(), state.into());
	}

	let mut url = adapter.authorization_url().clone();

	if params.is_empty() {
		return url;
	}

	let mut pairs = url.query_pairs_mut();

	for (key, value) in &params {
		pairs.append_pair(key, value);
	}

	drop(pairs);

	url
}
