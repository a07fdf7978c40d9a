//! Data-driven adapter for providers that host login and consent on their own domain.
//!
//! Providers differ mostly in paths and form markup, so [`HostedPageAdapter`] is
//! configured rather than subclassed: [`PagePatterns`] map paths to actions,
//! [`LoginForm`] describes how to find and fill the login form, and [`ApprovalPolicy`]
//! decides whether the approval page is surfaced through a host sheet.

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, redirect_params},
	error::ConfigError,
	provider::{
		PageType, ProviderAdapter, ProviderDescriptor, UrlAction, authorization_request_url,
	},
	render::{Document, Renderer, ScriptError},
};

const SCRIPT_SUBMITTED: &str = "submitted";

static PASSWORD_FIELD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)<input\b[^>]*\btype\s*=\s*["']?password\b"#)
		.expect("Password field pattern should compile.")
});

/// How a provider's approval page reaches the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApprovalPolicy {
	#[default]
	/// The approval page is shown in place; no host directive is emitted.
	InPage,
	/// Approval paths raise the host's approval sheet; dismiss paths lower it.
	Sheet,
}

/// Where a rewritten navigation is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewriteTarget {
	/// Restart at the adapter's own authorization URL.
	Authorization,
	/// Load a fixed URL.
	Url(Url),
}

/// Path patterns on the provider host, each mapped to an engine action.
///
/// A pattern ending in `*` matches by prefix; any other pattern must equal the path,
/// ignoring trailing slashes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PagePatterns {
	/// Path of the login form.
	pub login_path: String,
	/// Query parameter whose presence on the login path means "credentials rejected".
	pub wrong_credentials_param: Option<String>,
	/// Paths of the approval page.
	pub approval_paths: Vec<String>,
	/// Paths that lower the approval sheet.
	pub sheet_dismiss_paths: Vec<String>,
	/// Provider error pages.
	pub error_paths: Vec<String>,
	/// Paths opened in the system browser (sign-up, password reset).
	pub external_paths: Vec<String>,
	/// Paths replaced with another navigation.
	pub rewrites: Vec<(String, RewriteTarget)>,
}
impl PagePatterns {
	/// Creates patterns with the given login path and nothing else.
	pub fn new(login_path: impl Into<String>) -> Self {
		Self { login_path: login_path.into(), ..Default::default() }
	}

	/// Sets the wrong-credentials query marker.
	pub fn wrong_credentials_param(mut self, param: impl Into<String>) -> Self {
		self.wrong_credentials_param = Some(param.into());

		self
	}

	/// Adds an approval path.
	pub fn approval_path(mut self, pattern: impl Into<String>) -> Self {
		self.approval_paths.push(pattern.into());

		self
	}

	/// Adds a sheet dismiss path.
	pub fn sheet_dismiss_path(mut self, pattern: impl Into<String>) -> Self {
		self.sheet_dismiss_paths.push(pattern.into());

		self
	}

	/// Adds a provider error path.
	pub fn error_path(mut self, pattern: impl Into<String>) -> Self {
		self.error_paths.push(pattern.into());

		self
	}

	/// Adds a path opened in the system browser.
	pub fn external_path(mut self, pattern: impl Into<String>) -> Self {
		self.external_paths.push(pattern.into());

		self
	}

	/// Adds a rewrite rule.
	pub fn rewrite(mut self, pattern: impl Into<String>, target: RewriteTarget) -> Self {
		self.rewrites.push((pattern.into(), target));

		self
	}
}

/// Login form selectors and markup markers.
#[derive(Clone, Debug)]
pub struct LoginForm {
	/// CSS selector of the form, used when the password input is not inside one.
	pub form_selector: String,
	/// CSS selector of the username input.
	pub username_selector: String,
	/// CSS selector of the password input.
	pub password_selector: String,
	/// Markup that identifies an approval page regardless of its path.
	pub approval_marker: Option<Regex>,
}
impl LoginForm {
	/// Overrides the form selector.
	pub fn form_selector(mut self, selector: impl Into<String>) -> Self {
		self.form_selector = selector.into();

		self
	}

	/// Overrides the username selector.
	pub fn username_selector(mut self, selector: impl Into<String>) -> Self {
		self.username_selector = selector.into();

		self
	}

	/// Overrides the password selector.
	pub fn password_selector(mut self, selector: impl Into<String>) -> Self {
		self.password_selector = selector.into();

		self
	}

	/// Compiles and sets the approval marker.
	pub fn approval_marker(mut self, pattern: &str) -> Result<Self, ConfigError> {
		let marker = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
			pattern: pattern.to_owned(),
			source,
		})?;

		self.approval_marker = Some(marker);

		Ok(self)
	}

	fn script(&self, credentials: &Credentials) -> String {
		let literal = |value: &str| serde_json::Value::from(value).to_string();

		format!(
			r#"(function () {{
	var user = document.querySelector({user_sel});
	var pass = document.querySelector({pass_sel});
	if (!user || !pass) {{ return "missing-fields"; }}
	user.value = {user};
	pass.value = {pass};
	[user, pass].forEach(function (el) {{
		el.dispatchEvent(new Event("input", {{ bubbles: true }}));
	}});
	var form = pass.form || document.querySelector({form_sel});
	if (!form) {{ return "missing-fields"; }}
	if (typeof form.requestSubmit === "function") {{ form.requestSubmit(); }} else {{ form.submit(); }}
	return "{SCRIPT_SUBMITTED}";
}})();"#,
			user_sel = literal(&self.username_selector),
			pass_sel = literal(&self.password_selector),
			form_sel = literal(&self.form_selector),
			user = literal(credentials.username()),
			pass = literal(credentials.expose_password()),
		)
	}
}
impl Default for LoginForm {
	fn default() -> Self {
		Self {
			form_selector: "form".into(),
			username_selector: "input[type=email], input[name=username], input[name=email]".into(),
			password_selector: "input[type=password]".into(),
			approval_marker: None,
		}
	}
}

/// Configurable [`ProviderAdapter`] for same-host login and consent pages.
#[derive(Clone, Debug)]
pub struct HostedPageAdapter {
	descriptor: ProviderDescriptor,
	pages: PagePatterns,
	policy: ApprovalPolicy,
	form: LoginForm,
}
impl HostedPageAdapter {
	/// Creates an adapter with the default login form and in-page approval.
	pub fn new(descriptor: ProviderDescriptor, pages: PagePatterns) -> Self {
		Self { descriptor, pages, policy: ApprovalPolicy::default(), form: LoginForm::default() }
	}

	/// Overrides the approval policy.
	pub fn with_approval_policy(mut self, policy: ApprovalPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Overrides the login form description.
	pub fn with_login_form(mut self, form: LoginForm) -> Self {
		self.form = form;

		self
	}

	/// Configured path patterns.
	pub fn pages(&self) -> &PagePatterns {
		&self.pages
	}

	/// Configured approval policy.
	pub fn approval_policy(&self) -> ApprovalPolicy {
		self.policy
	}

	fn is_provider_host(&self, url: &Url) -> bool {
		let authorization = self.authorization_url();

		matches!(url.scheme(), "http" | "https")
			&& url.host_str() == authorization.host_str()
			&& url.port_or_known_default() == authorization.port_or_known_default()
	}

	fn redirect_action(&self, url: &Url) -> UrlAction {
		let params = redirect_params(url);

		if let Some(error) = params.get("error") {
			let detail = params.get("error_description").unwrap_or(error);

			return UrlAction::error(format!("{} returned `{error}`: {detail}", self.name()));
		}

		match params.get(self.token_param()) {
			Some(token) if !token.is_empty() => UrlAction::Finished(url.clone()),
			_ => UrlAction::error(format!("redirect carries no `{}`", self.token_param())),
		}
	}

	fn sheet_action(&self, sheet: UrlAction) -> UrlAction {
		match self.policy {
			ApprovalPolicy::InPage => UrlAction::LoadUrl,
			ApprovalPolicy::Sheet => sheet,
		}
	}
}
impl ProviderAdapter for HostedPageAdapter {
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	fn action_for_url(&self, url: &Url) -> UrlAction {
		match url.scheme() {
			"about" => return UrlAction::LoadUrl,
			"http" | "https" => {},
			scheme if scheme == self.redirect_url().scheme() => {},
			scheme => return UrlAction::error(format!("unsupported URL scheme `{scheme}`")),
		}

		if self.is_redirect(url) {
			return self.redirect_action(url);
		}
		if !self.is_provider_host(url) {
			return UrlAction::LoadUrl;
		}

		let path = url.path();
		let pages = &self.pages;

		if path_matches(&pages.login_path, path) {
			let rejected = pages
				.wrong_credentials_param
				.as_deref()
				.is_some_and(|marker| url.query_pairs().any(|(key, _)| key == marker));

			return if rejected {
				UrlAction::WrongCredentials
			} else {
				UrlAction::InsertCredentials
			};
		}
		if any_matches(&pages.error_paths, path) {
			let detail = redirect_params(url)
				.remove("error_description")
				.unwrap_or_else(|| format!("error page {path}"));

			return UrlAction::error(format!("{} reported {detail}", self.name()));
		}
		if any_matches(&pages.external_paths, path) {
			return UrlAction::LoadExternal(url.clone());
		}
		if let Some((_, target)) =
			pages.rewrites.iter().find(|(pattern, _)| path_matches(pattern, path))
		{
			let target = match target {
				RewriteTarget::Authorization => authorization_request_url(self, None),
				RewriteTarget::Url(target) => target.clone(),
			};

			return UrlAction::LoadCustomUrl(target);
		}
		if any_matches(&pages.approval_paths, path) {
			return self.sheet_action(UrlAction::ShowApprovalSheet);
		}
		if any_matches(&pages.sheet_dismiss_paths, path) {
			return self.sheet_action(UrlAction::HideApprovalSheet);
		}

		UrlAction::LoadUrl
	}

	fn page_type_for_document(&self, document: &Document) -> PageType {
		if !self.is_provider_host(&document.url) {
			return PageType::Default;
		}
		if PASSWORD_FIELD.is_match(&document.html) {
			return PageType::LoginPage;
		}

		let path = document.url.path();
		let marked = self
			.form
			.approval_marker
			.as_ref()
			.is_some_and(|marker| marker.is_match(&document.html));

		if marked || any_matches(&self.pages.approval_paths, path) {
			PageType::ApprovalPage
		} else {
			PageType::Default
		}
	}

	fn fill_credentials(
		&self,
		credentials: &Credentials,
		renderer: &mut dyn Renderer,
	) -> Result<(), ScriptError> {
		let result = renderer.evaluate_script(&self.form.script(credentials))?;

		if result.as_str() == Some(SCRIPT_SUBMITTED) {
			Ok(())
		} else {
			Err(ScriptError::UnexpectedResult { result: result.to_string() })
		}
	}
}

fn path_matches(pattern: &str, path: &str) -> bool {
	match pattern.strip_suffix('*') {
		Some(prefix) => path.starts_with(prefix),
		None => pattern.trim_end_matches('/') == path.trim_end_matches('/'),
	}
}

fn any_matches(patterns: &[String], path: &str) -> bool {
	patterns.iter().any(|pattern| path_matches(pattern, path))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ProviderId, render::HeadlessRenderer};

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Adapter fixture URL should parse.")
	}

	fn adapter(policy: ApprovalPolicy) -> HostedPageAdapter {
		let descriptor =
			ProviderDescriptor::builder(ProviderId::new("provider-test").expect("Id is valid."))
				.name("Provider")
				.authorization_endpoint(url("https://provider.test/oauth/authorize"))
				.token_endpoint(url("https://provider.test/oauth/token"))
				.redirect_url(url("https://app.test/callback"))
				.client_id("client-1")
				.build()
				.expect("Descriptor fixture should build.");
		let pages = PagePatterns::new("/login")
			.wrong_credentials_param("error")
			.approval_path("/oauth/approve")
			.sheet_dismiss_path("/oauth/approve/done")
			.error_path("/oauth/error")
			.external_path("/signup*")
			.rewrite("/", RewriteTarget::Authorization);

		HostedPageAdapter::new(descriptor, pages).with_approval_policy(policy)
	}

	#[test]
	fn unmatched_urls_pass_through() {
		let adapter = adapter(ApprovalPolicy::Sheet);

		for raw in [
			"https://provider.test/oauth/authorize?client_id=client-1",
			"https://provider.test/assets/app.js",
			"https://cdn.other.test/login",
			"about:blank",
		] {
			assert_eq!(adapter.action_for_url(&url(raw)), UrlAction::LoadUrl, "{raw}");
		}
	}

	#[test]
	fn login_path_distinguishes_rejections() {
		let adapter = adapter(ApprovalPolicy::InPage);

		assert_eq!(
			adapter.action_for_url(&url("https://provider.test/login")),
			UrlAction::InsertCredentials
		);
		assert_eq!(
			adapter.action_for_url(&url("https://provider.test/login/?next=%2F")),
			UrlAction::InsertCredentials
		);
		assert_eq!(
			adapter.action_for_url(&url("https://provider.test/login?error=invalid")),
			UrlAction::WrongCredentials
		);
	}

	#[test]
	fn redirect_yields_finished_or_error() {
		let adapter = adapter(ApprovalPolicy::InPage);
		let done = url("https://app.test/callback?access_token=abc123");

		assert_eq!(adapter.action_for_url(&done), UrlAction::Finished(done.clone()));
		assert!(matches!(
			adapter.action_for_url(&url(
				"https://app.test/callback?error=access_denied&error_description=User+denied"
			)),
			UrlAction::Error { reason } if reason.contains("User denied")
		));
		assert!(matches!(
			adapter.action_for_url(&url("https://app.test/callback")),
			UrlAction::Error { .. }
		));
	}

	#[test]
	fn sheet_actions_follow_policy() {
		let sheet = adapter(ApprovalPolicy::Sheet);
		let in_page = adapter(ApprovalPolicy::InPage);
		let approve = url("https://provider.test/oauth/approve");
		let done = url("https://provider.test/oauth/approve/done");

		assert_eq!(sheet.action_for_url(&approve), UrlAction::ShowApprovalSheet);
		assert_eq!(sheet.action_for_url(&done), UrlAction::HideApprovalSheet);
		assert_eq!(in_page.action_for_url(&approve), UrlAction::LoadUrl);
		assert_eq!(in_page.action_for_url(&done), UrlAction::LoadUrl);
	}

	#[test]
	fn error_external_rewrite_and_scheme_rules() {
		let adapter = adapter(ApprovalPolicy::InPage);

		assert!(matches!(
			adapter.action_for_url(&url("https://provider.test/oauth/error")),
			UrlAction::Error { .. }
		));

		let signup = url("https://provider.test/signup/new");

		assert_eq!(adapter.action_for_url(&signup), UrlAction::LoadExternal(signup.clone()));

		let root = url("https://provider.test/");
		let UrlAction::LoadCustomUrl(target) = adapter.action_for_url(&root) else {
			panic!("Dashboard root should be rewritten.");
		};

		assert_eq!(target.path(), "/oauth/authorize");
		assert!(target.query_pairs().any(|(key, value)| key == "client_id" && value == "client-1"));
		assert!(matches!(
			adapter.action_for_url(&url("ftp://provider.test/login")),
			UrlAction::Error { .. }
		));
	}

	#[test]
	fn documents_are_classified_by_markup_and_path() {
		let adapter = adapter(ApprovalPolicy::InPage);
		let login = Document::new(
			url("https://provider.test/login"),
			"<form><input name=email><INPUT TYPE='password' name=pw></form>",
		);
		let approval =
			Document::new(url("https://provider.test/oauth/approve"), "<button>Allow</button>");
		let foreign = Document::new(url("https://other.test/login"), "<input type=password>");
		let plain = Document::new(url("https://provider.test/account"), "<p>hi</p>");

		assert_eq!(adapter.page_type_for_document(&login), PageType::LoginPage);
		assert_eq!(adapter.page_type_for_document(&approval), PageType::ApprovalPage);
		assert_eq!(adapter.page_type_for_document(&foreign), PageType::Default);
		assert_eq!(adapter.page_type_for_document(&plain), PageType::Default);

		let marked = adapter
			.clone()
			.with_login_form(
				LoginForm::default()
					.approval_marker(r#"action="/oauth/grant""#)
					.expect("Marker should compile."),
			);
		let grant = Document::new(
			url("https://provider.test/consent"),
			r#"<form action="/oauth/grant"></form>"#,
		);

		assert_eq!(marked.page_type_for_document(&grant), PageType::ApprovalPage);
	}

	#[test]
	fn fill_credentials_escapes_values_and_checks_result() {
		let adapter = adapter(ApprovalPolicy::InPage);
		let credentials = Credentials::new("alice", "se\"cr'et\\")
			.expect("Credential fixture should be valid.");
		let mut renderer = HeadlessRenderer::default().with_script_result("submitted");

		adapter
			.fill_credentials(&credentials, &mut renderer)
			.expect("Submitted result should be accepted.");

		let script = &renderer.scripts()[0];

		assert!(script.contains(r#"user.value = "alice";"#));
		assert!(script.contains(r#"pass.value = "se\"cr'et\\";"#));

		renderer.queue_script_result(Ok(serde_json::Value::from("missing-fields")));

		let err = adapter
			.fill_credentials(&credentials, &mut renderer)
			.expect_err("Missing fields should be reported.");

		assert!(matches!(err, ScriptError::UnexpectedResult { .. }));
	}

	#[test]
	fn invalid_marker_is_a_config_error() {
		assert!(matches!(
			LoginForm::default().approval_marker("(unclosed"),
			Err(ConfigError::InvalidPattern { .. })
		));
	}
}
