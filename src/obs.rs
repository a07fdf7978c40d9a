//! Optional observability helpers for login sessions.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits spans named `oauth2_webflow.login` with the `provider` and
//!   `stage` (engine entry point) fields, plus debug events for every navigation decision.
//! - `metrics` increments the `oauth2_webflow_login_total` counter for every
//!   attempt/outcome, labeled by `provider` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

pub(crate) use tracing::log_event;

// self
use crate::{_prelude::*, host::OutcomeKind};

/// Lifecycle labels recorded for each login session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoginOutcomeLabel {
	/// A session was started.
	Attempt,
	/// A token was captured.
	Success,
	/// The provider rejected the credentials.
	CredentialsWrong,
	/// The session failed.
	Failure,
	/// The host abandoned the session.
	Cancelled,
}
impl LoginOutcomeLabel {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LoginOutcomeLabel::Attempt => "attempt",
			LoginOutcomeLabel::Success => "success",
			LoginOutcomeLabel::CredentialsWrong => "credentials_wrong",
			LoginOutcomeLabel::Failure => "failure",
			LoginOutcomeLabel::Cancelled => "cancelled",
		}
	}
}
impl From<OutcomeKind> for LoginOutcomeLabel {
	fn from(kind: OutcomeKind) -> Self {
		match kind {
			OutcomeKind::Success => LoginOutcomeLabel::Success,
			OutcomeKind::CredentialsWrong => LoginOutcomeLabel::CredentialsWrong,
			OutcomeKind::Failure => LoginOutcomeLabel::Failure,
		}
	}
}
impl Display for LoginOutcomeLabel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
