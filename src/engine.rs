//! Navigation engine that walks a renderer through the provider's hosted login.
//!
//! The host owns a web view and forwards its navigation callbacks to [`LoginEngine`]. For
//! every URL the engine asks the [`ProviderAdapter`] what to do, and for every finished
//! page what kind of page it is. It fills the login form, raises or lowers the host's
//! approval sheet, and reports exactly one [`LoginOutcome`] per session through
//! [`HostUi::login_finished`].

pub mod session;

pub use session::SessionState;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, SessionId, TokenGrant},
	engine::session::{Session, SheetState},
	host::{HostUi, LoginOutcome},
	obs::{self, LoginOutcomeLabel, LoginSpan, LoginSpanGuard, log_event},
	provider::{PageType, ProviderAdapter, UrlAction, authorization_request_url},
	render::{LoadError, LoadErrorKind, NavigationPolicy, Renderer},
};

/// Number of `LoadCustomUrl` rewrites a session may perform before it fails.
pub const MAX_CUSTOM_URL_REWRITES: usize = 8;

/// Drives one login session at a time against a single provider.
///
/// All entry points take `&mut self` and are expected to be called from the host's
/// event loop in the order the renderer reports events. Callbacks that arrive while no
/// session is pending are ignored.
pub struct LoginEngine<R, H>
where
	R: Renderer,
	H: HostUi,
{
	adapter: Arc<dyn ProviderAdapter>,
	renderer: R,
	host: H,
	session: Option<Session>,
	next_session: SessionId,
}
impl<R, H> LoginEngine<R, H>
where
	R: Renderer,
	H: HostUi,
{
	/// Creates an idle engine.
	pub fn new(adapter: Arc<dyn ProviderAdapter>, renderer: R, host: H) -> Self {
		Self { adapter, renderer, host, session: None, next_session: SessionId::first() }
	}

	/// Provider adapter consulted for every decision.
	pub fn adapter(&self) -> &dyn ProviderAdapter {
		self.adapter.as_ref()
	}

	/// Renderer driven by the engine.
	pub fn renderer(&self) -> &R {
		&self.renderer
	}

	/// Mutable access to the renderer, e.g. to present a document in headless runs.
	pub fn renderer_mut(&mut self) -> &mut R {
		&mut self.renderer
	}

	/// Host receiving directives and outcomes.
	pub fn host(&self) -> &H {
		&self.host
	}

	/// Mutable access to the host.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	/// Consumes the engine, returning the renderer and host.
	pub fn into_parts(self) -> (R, H) {
		(self.renderer, self.host)
	}

	/// Identifier of the current (or most recent) session.
	pub fn session_id(&self) -> Option<SessionId> {
		self.session.as_ref().map(|session| session.id)
	}

	/// State of the current (or most recent) session.
	pub fn state(&self) -> SessionState {
		self.session.as_ref().map_or(SessionState::Idle, |session| session.state)
	}

	/// Returns `true` while a session is waiting for renderer events.
	pub fn is_pending(&self) -> bool {
		self.state().is_pending()
	}

	/// Returns `true` from the first login page until the credentials were accepted.
	pub fn in_login_phase(&self) -> bool {
		self.session.as_ref().is_some_and(Session::in_login_phase)
	}

	/// Returns `true` once the approval page was reached, until the session ends.
	pub fn in_approval_phase(&self) -> bool {
		self.session.as_ref().is_some_and(Session::in_approval_phase)
	}

	/// Returns `true` while the host's approval sheet is raised.
	pub fn sheet_shown(&self) -> bool {
		self.session.as_ref().is_some_and(Session::sheet_shown)
	}

	/// Starts a login attempt and asks the renderer to load the authorization URL.
	///
	/// Returns as soon as the load was issued; the outcome arrives later through
	/// [`HostUi::login_finished`]. A session that is still pending is abandoned first,
	/// without an outcome.
	pub fn start_login_process(
		&mut self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Result<SessionId> {
		let _guard = self.span("start_login_process");
		let credentials = Credentials::new(username, password)?;

		if self.is_pending() {
			log_event!(warn, "abandoning the pending login session");

			self.abandon();
		}

		let id = self.next_session;

		self.next_session = id.next();

		let session = Session::new(id, credentials);
		let url = authorization_request_url(self.adapter.as_ref(), Some(&session.nonce));

		self.session = Some(session);

		obs::record_login_outcome(&self.adapter.descriptor().id, LoginOutcomeLabel::Attempt);
		log_event!(info, session = %id, url = %loggable(&url), "login session started");

		self.renderer.load(&url);

		Ok(id)
	}

	/// Abandons the pending session without reporting an outcome.
	///
	/// Lowers the approval sheet if it is raised. Returns the abandoned session, or
	/// `None` when nothing was pending.
	pub fn cancel(&mut self) -> Option<SessionId> {
		let _guard = self.span("cancel");

		self.abandon()
	}

	/// Decides whether the renderer may load `url`.
	pub fn will_load(&mut self, url: &str) -> NavigationPolicy {
		let _guard = self.span("will_load");

		if !self.is_pending() {
			log_event!(debug, "no pending session; cancelling navigation");

			return NavigationPolicy::Cancel;
		}

		let url = match Url::parse(url) {
			Ok(url) => url,
			Err(e) => {
				self.fail(Error::classification(format!("unparsable URL `{url}`: {e}")));

				return NavigationPolicy::Cancel;
			},
		};
		let action = self.adapter.action_for_url(&url);

		log_event!(debug, url = %loggable(&url), action = action.as_str(), "navigation classified");

		let policy = self.dispatch(action);

		if let (NavigationPolicy::Cancel, Some(session)) = (policy, self.session.as_mut()) {
			session.echo_expected = true;
		}

		policy
	}

	/// Notes that the renderer started a provisional load.
	pub fn did_start_provisional_load(&mut self, url: &str) {
		let _guard = self.span("did_start_provisional_load");

		self.note_progress(url, "provisional");
	}

	/// Notes that the renderer committed a load.
	pub fn did_commit_load(&mut self, url: &str) {
		let _guard = self.span("did_commit_load");

		self.note_progress(url, "committed");
	}

	/// Classifies the loaded document and fills the login form when one was expected.
	///
	/// A login page that shows up again after the credentials were submitted means the
	/// provider rejected them.
	pub fn did_finish_load(&mut self) {
		let _guard = self.span("did_finish_load");

		if !self.is_pending() {
			return;
		}

		let Some(document) = self.renderer.current_document() else {
			log_event!(debug, "finished load has no document");

			return;
		};
		let page = self.adapter.page_type_for_document(&document);

		log_event!(debug, url = %loggable(&document.url), page = page.as_str(), "page classified");

		let Some(session) = self.session.as_mut() else { return };
		let insert = std::mem::take(&mut session.insert_pending);

		match page {
			PageType::LoginPage if insert => {
				session.state = SessionState::LoginPageShown;

				let filled = match session.credentials.as_ref() {
					Some(credentials) =>
						self.adapter.fill_credentials(credentials, &mut self.renderer),
					None => Ok(()),
				};

				match filled {
					Ok(()) => session.state = SessionState::CredentialsSubmitted,
					Err(e) => self.fail(e.into()),
				}
			},
			PageType::LoginPage if session.state == SessionState::CredentialsSubmitted =>
				self.finish(LoginOutcome::CredentialsWrong),
			PageType::ApprovalPage => session.state = SessionState::ApprovalPageShown,
			PageType::LoginPage | PageType::Default => {},
		}
	}

	/// Reports a load failure as the session's outcome.
	///
	/// After the engine answered `Cancel`, the next interrupted or cancelled load is the
	/// renderer's echo of that decision and is ignored once. Any other failure, including
	/// a stop the engine did not cause, ends the session.
	pub fn did_fail_load(&mut self, error: LoadError) {
		let _guard = self.span("did_fail_load");
		let Some(session) = self.session.as_mut().filter(|session| session.state.is_pending())
		else {
			return;
		};

		if matches!(error.kind, LoadErrorKind::InterruptedByPolicy | LoadErrorKind::Cancelled)
			&& std::mem::take(&mut session.echo_expected)
		{
			log_event!(debug, kind = ?error.kind, "ignoring echo of a cancelled navigation");

			return;
		}

		let error = match (error.url.is_none(), self.renderer.current_url()) {
			(true, Some(url)) => error.with_url(url),
			_ => error,
		};

		self.fail(error.into());
	}

	fn span(&self, stage: &'static str) -> LoginSpanGuard {
		LoginSpan::new(&self.adapter.descriptor().id, stage).entered()
	}

	fn note_progress(&self, url: &str, phase: &'static str) {
		#[cfg(feature = "tracing")]
		{
			if self.is_pending() {
				::tracing::trace!(url = %redact_raw(url), phase, "renderer load progressed");
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (self, url, phase);
		}
	}

	fn dispatch(&mut self, action: UrlAction) -> NavigationPolicy {
		match action {
			UrlAction::LoadUrl => NavigationPolicy::Allow,
			UrlAction::ShowApprovalSheet => {
				self.show_sheet();

				NavigationPolicy::Allow
			},
			UrlAction::HideApprovalSheet => {
				self.hide_sheet();

				NavigationPolicy::Allow
			},
			UrlAction::InsertCredentials => {
				if self.state() == SessionState::CredentialsSubmitted {
					self.finish(LoginOutcome::CredentialsWrong);
				} else if let Some(session) = self.session.as_mut() {
					session.insert_pending = true;
				}

				NavigationPolicy::Allow
			},
			UrlAction::WrongCredentials => {
				self.finish(LoginOutcome::CredentialsWrong);

				NavigationPolicy::Allow
			},
			UrlAction::Error { reason } => {
				self.fail(Error::Classification { reason });

				NavigationPolicy::Cancel
			},
			UrlAction::LoadCustomUrl(target) => {
				self.rewrite(&target);

				NavigationPolicy::Cancel
			},
			UrlAction::LoadExternal(target) => {
				self.host.open_external(&target);

				NavigationPolicy::Cancel
			},
			UrlAction::Finished(redirect) => {
				self.complete(&redirect);

				NavigationPolicy::Cancel
			},
		}
	}

	fn show_sheet(&mut self) {
		let Some(session) = self.session.as_mut() else { return };

		if session.sheet != SheetState::Never {
			log_event!(debug, "approval sheet already shown in this session");

			return;
		}

		session.sheet = SheetState::Shown;

		self.host.show_approval_sheet();
	}

	fn hide_sheet(&mut self) {
		let Some(session) = self.session.as_mut() else { return };

		if session.sheet != SheetState::Shown {
			return;
		}

		session.sheet = SheetState::Hidden;

		self.host.hide_approval_sheet();
	}

	fn rewrite(&mut self, target: &Url) {
		let Some(session) = self.session.as_mut() else { return };

		session.rewrites += 1;

		if session.rewrites > MAX_CUSTOM_URL_REWRITES {
			self.fail(Error::RedirectLoop { limit: MAX_CUSTOM_URL_REWRITES });

			return;
		}

		log_event!(debug, url = %loggable(target), "navigation rewritten");

		self.renderer.load(target);
	}

	fn complete(&mut self, redirect: &Url) {
		let Some(session) = self.session.as_mut() else { return };

		session.state = SessionState::TokenExtraction;

		let grant = TokenGrant::from_redirect(redirect, self.adapter.token_param())
			.and_then(|grant| grant.validate_state(&session.nonce).map(|()| grant));

		match grant {
			Ok(grant) => self.finish(LoginOutcome::Success(grant)),
			Err(e) => self.fail(e.into()),
		}
	}

	fn fail(&mut self, error: Error) {
		log_event!(warn, error = %error, "login session failed");

		self.finish(LoginOutcome::Failure(error));
	}

	/// Reports `outcome` unless the session already ended.
	fn finish(&mut self, outcome: LoginOutcome) {
		let Some(session) = self.session.as_mut().filter(|session| session.state.is_pending())
		else {
			return;
		};
		let id = session.id;
		let kind = outcome.kind();

		if session.terminate(SessionState::Finished(kind)) {
			self.host.hide_approval_sheet();
		}

		obs::record_login_outcome(&self.adapter.descriptor().id, kind.into());
		log_event!(info, session = %id, outcome = kind.as_str(), "login session finished");

		self.host.login_finished(id, outcome);
	}

	fn abandon(&mut self) -> Option<SessionId> {
		let session = self.session.as_mut().filter(|session| session.state.is_pending())?;
		let id = session.id;

		if session.terminate(SessionState::Cancelled) {
			self.host.hide_approval_sheet();
		}

		obs::record_login_outcome(&self.adapter.descriptor().id, LoginOutcomeLabel::Cancelled);
		log_event!(info, session = %id, "login session cancelled");

		Some(id)
	}
}
impl<R, H> Debug for LoginEngine<R, H>
where
	R: Renderer + Debug,
	H: HostUi + Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginEngine")
			.field("provider", &self.adapter.descriptor().id)
			.field("renderer", &self.renderer)
			.field("host", &self.host)
			.field("session", &self.session)
			.finish()
	}
}

/// Strips query and fragment, which may carry credentials or tokens.
#[cfg(feature = "tracing")]
fn loggable(url: &Url) -> String {
	let mut url = url.clone();

	url.set_query(None);
	url.set_fragment(None);

	url.to_string()
}

#[cfg(feature = "tracing")]
fn redact_raw(url: &str) -> String {
	Url::parse(url).map(|url| loggable(&url)).unwrap_or_else(|_| "<unparsable>".into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::ProviderId,
		host::{HostEvent, OutcomeKind, RecordingHost},
		provider::{ApprovalPolicy, HostedPageAdapter, PagePatterns, ProviderDescriptor},
		render::{Document, HeadlessRenderer},
	};

	type TestEngine = LoginEngine<HeadlessRenderer, RecordingHost>;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Engine fixture URL should parse.")
	}

	fn engine(policy: ApprovalPolicy) -> TestEngine {
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
			.approval_path("/oauth/approve")
			.sheet_dismiss_path("/oauth/approve/done");
		let adapter = HostedPageAdapter::new(descriptor, pages).with_approval_policy(policy);

		LoginEngine::new(
			Arc::new(adapter),
			HeadlessRenderer::default().with_script_result("submitted"),
			RecordingHost::default(),
		)
	}

	fn nonce(engine: &TestEngine) -> String {
		let authorize = engine.renderer().last_load().expect("Authorization URL should load.");

		authorize
			.query_pairs()
			.find(|(key, _)| key == "state")
			.map(|(_, value)| value.into_owned())
			.expect("Authorization URL should carry state.")
	}

	fn present_login(engine: &mut TestEngine) {
		assert_eq!(engine.will_load("https://provider.test/login"), NavigationPolicy::Allow);

		engine.renderer_mut().present(Document::new(
			url("https://provider.test/login"),
			"<form><input type=email><input type=password></form>",
		));
		engine.did_finish_load();
	}

	#[test]
	fn idle_engine_cancels_navigation() {
		let mut engine = engine(ApprovalPolicy::InPage);

		assert_eq!(engine.state(), SessionState::Idle);
		assert_eq!(engine.will_load("https://provider.test/login"), NavigationPolicy::Cancel);
		assert!(engine.cancel().is_none());
		assert!(engine.host().events().is_empty());
	}

	#[test]
	fn start_loads_authorization_url_with_state() {
		let mut engine = engine(ApprovalPolicy::InPage);
		let id = engine.start_login_process("alice", "secret").expect("Login should start.");
		let authorize = engine.renderer().last_load().expect("Authorization URL should load.");

		assert_eq!(authorize.path(), "/oauth/authorize");
		assert_eq!(nonce(&engine).len(), 32);
		assert_eq!(engine.session_id(), Some(id));
		assert_eq!(engine.state(), SessionState::AwaitingAuthPage);
		assert!(engine.is_pending());
	}

	#[test]
	fn empty_credentials_are_rejected_before_loading() {
		let mut engine = engine(ApprovalPolicy::InPage);
		let err =
			engine.start_login_process("", "secret").expect_err("Empty username should fail.");

		assert!(matches!(err, Error::Config(_)));
		assert!(engine.renderer().loads().is_empty());
		assert_eq!(engine.state(), SessionState::Idle);
	}

	#[test]
	fn login_page_is_filled_once_and_success_is_reported() {
		let mut engine = engine(ApprovalPolicy::InPage);
		let id = engine.start_login_process("alice", "secret").expect("Login should start.");

		present_login(&mut engine);

		assert_eq!(engine.renderer().scripts().len(), 1);
		assert_eq!(engine.state(), SessionState::CredentialsSubmitted);
		assert!(engine.in_login_phase());

		// An interstitial page after the submit neither refills nor ends the session.
		engine
			.renderer_mut()
			.present(Document::new(url("https://provider.test/session"), "<p>Signing in</p>"));
		engine.did_finish_load();

		assert_eq!(engine.renderer().scripts().len(), 1);
		assert_eq!(engine.state(), SessionState::CredentialsSubmitted);

		let state = nonce(&engine);
		let redirect = format!("https://app.test/callback#access_token=abc123&state={state}");

		assert_eq!(engine.will_load(&redirect), NavigationPolicy::Cancel);
		assert_eq!(engine.state(), SessionState::Finished(OutcomeKind::Success));

		let outcomes: Vec<_> = engine.host().outcomes().collect();

		assert_eq!(outcomes.len(), 1);
		assert_eq!(outcomes[0].0, id);
		assert_eq!(
			outcomes[0].1.grant().map(|grant| grant.access_token.expose()),
			Some("abc123")
		);
	}

	#[test]
	fn reshown_login_page_means_wrong_credentials() {
		let mut engine = engine(ApprovalPolicy::InPage);

		engine.start_login_process("alice", "wrong").expect("Login should start.");
		present_login(&mut engine);

		assert_eq!(engine.will_load("https://provider.test/login"), NavigationPolicy::Allow);
		assert_eq!(engine.state(), SessionState::Finished(OutcomeKind::CredentialsWrong));
		assert!(!engine.in_login_phase());
		assert_eq!(engine.host().outcomes().count(), 1);
	}

	#[test]
	fn sheet_is_shown_once_and_hidden_before_outcome() {
		let mut engine = engine(ApprovalPolicy::Sheet);

		engine.start_login_process("alice", "secret").expect("Login should start.");
		present_login(&mut engine);

		for _ in 0..2 {
			assert_eq!(
				engine.will_load("https://provider.test/oauth/approve"),
				NavigationPolicy::Allow
			);
		}
		assert!(engine.sheet_shown());

		engine.renderer_mut().present(Document::new(
			url("https://provider.test/oauth/approve"),
			"<button>Allow</button>",
		));
		engine.did_finish_load();

		assert!(engine.in_approval_phase());

		engine.will_load("https://app.test/callback?error=access_denied");

		let events = engine.host().events();

		assert!(matches!(events[0], HostEvent::ShowApprovalSheet));
		assert!(matches!(events[1], HostEvent::HideApprovalSheet));
		assert!(matches!(events[2], HostEvent::Finished(_, LoginOutcome::Failure(_))));
		assert_eq!(events.len(), 3);
		assert!(!engine.sheet_shown());
	}

	#[test]
	fn rewrites_are_bounded() {
		let mut engine = engine(ApprovalPolicy::InPage);

		engine.start_login_process("alice", "secret").expect("Login should start.");

		let target = url("https://provider.test/oauth/authorize");

		for _ in 0..MAX_CUSTOM_URL_REWRITES {
			assert_eq!(
				engine.dispatch(UrlAction::LoadCustomUrl(target.clone())),
				NavigationPolicy::Cancel
			);
		}

		assert!(engine.is_pending());
		assert_eq!(engine.renderer().loads().len(), MAX_CUSTOM_URL_REWRITES + 1);

		engine.dispatch(UrlAction::LoadCustomUrl(target));

		assert!(matches!(
			engine.host().last_outcome(),
			Some(LoginOutcome::Failure(Error::RedirectLoop { limit: MAX_CUSTOM_URL_REWRITES }))
		));
	}

	#[test]
	fn cancel_hides_sheet_and_reports_nothing() {
		let mut engine = engine(ApprovalPolicy::Sheet);
		let id = engine.start_login_process("alice", "secret").expect("Login should start.");

		engine.will_load("https://provider.test/oauth/approve");

		assert_eq!(engine.cancel(), Some(id));
		assert_eq!(engine.state(), SessionState::Cancelled);
		assert_eq!(engine.host().outcomes().count(), 0);
		assert!(matches!(engine.host().events().last(), Some(HostEvent::HideApprovalSheet)));
		assert_eq!(engine.will_load("https://provider.test/login"), NavigationPolicy::Cancel);
		assert!(engine.cancel().is_none());
	}
}
