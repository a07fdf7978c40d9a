// self
use crate::{_prelude::*, auth::ProviderId};

/// Emits a `tracing` event when the `tracing` feature is enabled; expands to nothing
/// otherwise.
macro_rules! log_event {
	($level:ident, $($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	};
}
pub(crate) use log_event;

/// A span builder used by the navigation engine.
#[derive(Clone, Debug)]
pub struct LoginSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl LoginSpan {
	/// Creates a new span tagged with the provider + engine stage.
	pub fn new(provider: &ProviderId, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth2_webflow.login", provider = provider.as_ref(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (provider, stage);

			Self {}
		}
	}

	/// Enters the span for the duration of one engine callback.
	pub fn entered(self) -> LoginSpanGuard {
		#[cfg(feature = "tracing")]
		{
			LoginSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			LoginSpanGuard {}
		}
	}
}

/// RAII guard returned by [`LoginSpan::entered`].
pub struct LoginSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for LoginSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("LoginSpanGuard(..)")
	}
}
