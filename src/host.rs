//! Host UI contract consumed by the engine.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenGrant},
};

/// Terminal result of one login session.
#[derive(Debug)]
pub enum LoginOutcome {
	/// The provider redirected with a token.
	Success(TokenGrant),
	/// The provider rejected the username/password; the host may re-prompt.
	CredentialsWrong,
	/// The flow failed and cannot continue.
	Failure(Error),
}
impl LoginOutcome {
	/// Returns the payload-free kind of this outcome.
	pub fn kind(&self) -> OutcomeKind {
		match self {
			LoginOutcome::Success(_) => OutcomeKind::Success,
			LoginOutcome::CredentialsWrong => OutcomeKind::CredentialsWrong,
			LoginOutcome::Failure(_) => OutcomeKind::Failure,
		}
	}

	/// Returns the grant of a successful outcome.
	pub fn grant(&self) -> Option<&TokenGrant> {
		match self {
			LoginOutcome::Success(grant) => Some(grant),
			_ => None,
		}
	}
}

/// Payload-free [`LoginOutcome`] discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
	/// See [`LoginOutcome::Success`].
	Success,
	/// See [`LoginOutcome::CredentialsWrong`].
	CredentialsWrong,
	/// See [`LoginOutcome::Failure`].
	Failure,
}
impl OutcomeKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OutcomeKind::Success => "success",
			OutcomeKind::CredentialsWrong => "credentials_wrong",
			OutcomeKind::Failure => "failure",
		}
	}
}
impl Display for OutcomeKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Directives and outcomes the engine hands to the hosting UI.
pub trait HostUi {
	/// Raise the approval overlay.
	fn show_approval_sheet(&mut self);

	/// Lower the approval overlay.
	fn hide_approval_sheet(&mut self);

	/// Open `url` in the system browser.
	fn open_external(&mut self, url: &Url);

	/// Receive the single terminal outcome of `session`.
	fn login_finished(&mut self, session: SessionId, outcome: LoginOutcome);
}

/// One call recorded by [`RecordingHost`].
#[derive(Debug)]
pub enum HostEvent {
	/// [`HostUi::show_approval_sheet`] was called.
	ShowApprovalSheet,
	/// [`HostUi::hide_approval_sheet`] was called.
	HideApprovalSheet,
	/// [`HostUi::open_external`] was called.
	OpenExternal(Url),
	/// [`HostUi::login_finished`] was called.
	Finished(SessionId, LoginOutcome),
}

/// [`HostUi`] that records every call, for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingHost {
	events: Vec<HostEvent>,
}
impl RecordingHost {
	/// All recorded calls, oldest first.
	pub fn events(&self) -> &[HostEvent] {
		&self.events
	}

	/// Recorded outcomes, oldest first.
	pub fn outcomes(&self) -> impl Iterator<Item = (SessionId, &LoginOutcome)> {
		self.events.iter().filter_map(|event| match event {
			HostEvent::Finished(session, outcome) => Some((*session, outcome)),
			_ => None,
		})
	}

	/// Most recent outcome, if any.
	pub fn last_outcome(&self) -> Option<&LoginOutcome> {
		self.outcomes().last().map(|(_, outcome)| outcome)
	}

	/// Drains the recorded calls.
	pub fn take_events(&mut self) -> Vec<HostEvent> {
		std::mem::take(&mut self.events)
	}
}
impl HostUi for RecordingHost {
	fn show_approval_sheet(&mut self) {
		self.events.push(HostEvent::ShowApprovalSheet);
	}

	fn hide_approval_sheet(&mut self) {
		self.events.push(HostEvent::HideApprovalSheet);
	}

	fn open_external(&mut self, url: &Url) {
		self.events.push(HostEvent::OpenExternal(url.clone()));
	}

	fn login_finished(&mut self, session: SessionId, outcome: LoginOutcome) {
		self.events.push(HostEvent::Finished(session, outcome));
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_host_filters_outcomes() {
		let mut host = RecordingHost::default();
		let session = SessionId::first();

		host.show_approval_sheet();
		host.login_finished(session, LoginOutcome::CredentialsWrong);
		host.hide_approval_sheet();

		assert_eq!(host.events().len(), 3);
		assert_eq!(host.outcomes().count(), 1);
		assert_eq!(
			host.last_outcome().map(LoginOutcome::kind),
			Some(OutcomeKind::CredentialsWrong)
		);
		assert_eq!(host.take_events().len(), 3);
		assert!(host.events().is_empty());
	}
}
