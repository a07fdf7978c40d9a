//! Renderer capability contract required from the embedded web component.
//!
//! The engine never talks to a concrete web view. Hosts implement [`Renderer`] over their
//! platform widget and forward the widget's navigation callbacks to
//! [`crate::engine::LoginEngine`]. [`HeadlessRenderer`] is a scripted implementation for
//! tests and demos.

pub mod headless;

pub use headless::*;

// self
use crate::_prelude::*;

/// Operations the engine issues against the embedded web component.
pub trait Renderer {
	/// Starts loading `url` in the main frame.
	fn load(&mut self, url: &Url);

	/// Replaces the main frame with `html`, resolving relative links against `base_url`.
	fn load_html(&mut self, html: &str, base_url: &Url);

	/// Evaluates `script` in the main frame and returns its JSON-converted completion value.
	fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value, ScriptError>;

	/// URL of the main frame, if anything has been committed.
	fn current_url(&self) -> Option<Url>;

	/// Snapshot of the fully loaded main-frame document.
	fn current_document(&self) -> Option<Document>;
}

/// Answer to the renderer's "may this navigation proceed" question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationPolicy {
	/// Let the renderer load the URL.
	Allow,
	/// Drop the navigation.
	Cancel,
}

/// Main-frame document snapshot handed to page classifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
	/// Final URL of the document after redirects.
	pub url: Url,
	/// Document title, if the renderer reports one.
	pub title: Option<String>,
	/// Serialized DOM (`document.documentElement.outerHTML`).
	pub html: String,
}
impl Document {
	/// Creates a snapshot for `url` with the given markup.
	pub fn new(url: Url, html: impl Into<String>) -> Self {
		Self { url, title: None, html: html.into() }
	}

	/// Attaches a document title.
	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());

		self
	}
}

/// Reason a renderer gave up on a load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
	/// DNS, TCP, or TLS failure.
	Network,
	/// The load was interrupted because a policy decision cancelled it.
	InterruptedByPolicy,
	/// The renderer or the user stopped the load.
	Cancelled,
	/// Anything the host could not categorize.
	Other,
}

/// Load failure reported through `did_fail_load`.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Page failed to load: {message}.")]
pub struct LoadError {
	/// Failure category.
	pub kind: LoadErrorKind,
	/// Platform error code, when available.
	pub code: Option<i64>,
	/// Human-readable description from the renderer.
	pub message: String,
	/// URL that failed, when the renderer reports it.
	pub url: Option<Url>,
}
impl LoadError {
	/// Creates a load error of the given kind.
	pub fn new(kind: LoadErrorKind, message: impl Into<String>) -> Self {
		Self { kind, code: None, message: message.into(), url: None }
	}

	/// Convenience constructor for transport failures.
	pub fn network(message: impl Into<String>) -> Self {
		Self::new(LoadErrorKind::Network, message)
	}

	/// Convenience constructor for the renderer's echo of a cancelled navigation.
	pub fn interrupted_by_policy() -> Self {
		Self::new(LoadErrorKind::InterruptedByPolicy, "frame load interrupted")
	}

	/// Adds the platform error code.
	pub fn with_code(mut self, code: i64) -> Self {
		self.code = Some(code);

		self
	}

	/// Adds the failing URL.
	pub fn with_url(mut self, url: Url) -> Self {
		self.url = Some(url);

		self
	}
}

/// Failures raised while running an injected page script.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScriptError {
	/// The renderer reported a script exception.
	#[error("Page script raised an error: {message}.")]
	Evaluation {
		/// Exception text from the renderer.
		message: String,
	},
	/// The script completed but did not report success.
	#[error("Page script returned an unexpected result: {result}.")]
	UnexpectedResult {
		/// JSON rendering of the completion value.
		result: String,
	},
}
impl ScriptError {
	/// Wraps a renderer-reported exception.
	pub fn evaluation(message: impl Into<String>) -> Self {
		Self::Evaluation { message: message.into() }
	}
}
