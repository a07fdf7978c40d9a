//! Per-attempt session state owned by the engine.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	auth::{Credentials, SessionId},
	host::OutcomeKind,
};

const STATE_LEN: usize = 32;

/// Where a login session stands.
///
/// The phase flags exposed by [`crate::engine::LoginEngine`] (`in_login_phase`,
/// `in_approval_phase`) are projections of this single value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
	#[default]
	/// No session has been started yet.
	Idle,
	/// The authorization URL was issued; no provider page has been recognized yet.
	AwaitingAuthPage,
	/// The login form loaded and is being filled.
	LoginPageShown,
	/// The login form was submitted; waiting for the provider's verdict.
	CredentialsSubmitted,
	/// The provider is showing its approval page.
	ApprovalPageShown,
	/// The final redirect arrived and the token is being extracted.
	TokenExtraction,
	/// An outcome was reported.
	Finished(OutcomeKind),
	/// The host abandoned the session; no outcome was reported.
	Cancelled,
}
impl SessionState {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionState::Idle => "idle",
			SessionState::AwaitingAuthPage => "awaiting_auth_page",
			SessionState::LoginPageShown => "login_page_shown",
			SessionState::CredentialsSubmitted => "credentials_submitted",
			SessionState::ApprovalPageShown => "approval_page_shown",
			SessionState::TokenExtraction => "token_extraction",
			SessionState::Finished(_) => "finished",
			SessionState::Cancelled => "cancelled",
		}
	}

	/// Returns `true` once an outcome was reported or the session was cancelled.
	pub fn is_terminal(self) -> bool {
		matches!(self, SessionState::Finished(_) | SessionState::Cancelled)
	}

	/// Returns `true` while renderer callbacks are acted upon.
	pub fn is_pending(self) -> bool {
		!self.is_terminal() && self != SessionState::Idle
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum SheetState {
	#[default]
	Never,
	Shown,
	Hidden,
}

#[derive(Debug)]
pub(crate) struct Session {
	pub(crate) id: SessionId,
	pub(crate) state: SessionState,
	pub(crate) sheet: SheetState,
	pub(crate) credentials: Option<Credentials>,
	pub(crate) nonce: String,
	pub(crate) insert_pending: bool,
	pub(crate) rewrites: usize,
	/// Set when the engine answered `Cancel`; consumed by the renderer's echo of it.
	pub(crate) echo_expected: bool,
}
impl Session {
	pub(crate) fn new(id: SessionId, credentials: Credentials) -> Self {
		Self {
			id,
			state: SessionState::AwaitingAuthPage,
			sheet: SheetState::Never,
			credentials: Some(credentials),
			nonce: random_string(STATE_LEN),
			insert_pending: false,
			rewrites: 0,
			echo_expected: false,
		}
	}

	pub(crate) fn in_login_phase(&self) -> bool {
		matches!(self.state, SessionState::LoginPageShown | SessionState::CredentialsSubmitted)
	}

	pub(crate) fn in_approval_phase(&self) -> bool {
		matches!(self.state, SessionState::ApprovalPageShown | SessionState::TokenExtraction)
	}

	pub(crate) fn sheet_shown(&self) -> bool {
		self.sheet == SheetState::Shown
	}

	/// Moves to a terminal state; returns `true` if the host sheet must be lowered.
	pub(crate) fn terminate(&mut self, state: SessionState) -> bool {
		let hide = self.sheet_shown();

		if hide {
			self.sheet = SheetState::Hidden;
		}

		self.state = state;
		self.credentials = None;
		self.insert_pending = false;
		self.echo_expected = false;

		hide
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
