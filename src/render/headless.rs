//! Scripted, windowless [`Renderer`] for tests, demos, and replaying recorded flows.

// std
use std::collections::VecDeque;
// self
use crate::{
	_prelude::*,
	render::{Document, Renderer, ScriptError},
};

/// Renderer that records every request and serves caller-supplied documents.
///
/// Loads are only recorded: the caller decides which [`Document`] "arrives" by calling
/// [`HeadlessRenderer::present`] before forwarding `did_finish_load` to the engine.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
	loads: Vec<Url>,
	html_loads: Vec<(String, Url)>,
	scripts: Vec<String>,
	script_results: VecDeque<Result<serde_json::Value, ScriptError>>,
	fallback_result: serde_json::Value,
	document: Option<Document>,
}
impl HeadlessRenderer {
	/// Sets the completion value returned once queued script results run out.
	pub fn with_script_result(mut self, value: impl Into<serde_json::Value>) -> Self {
		self.fallback_result = value.into();

		self
	}

	/// Queues the result of the next script evaluation.
	pub fn queue_script_result(&mut self, result: Result<serde_json::Value, ScriptError>) {
		self.script_results.push_back(result);
	}

	/// Makes `document` the current main-frame document.
	pub fn present(&mut self, document: Document) {
		self.document = Some(document);
	}

	/// URLs requested through [`Renderer::load`], oldest first.
	pub fn loads(&self) -> &[Url] {
		&self.loads
	}

	/// Most recent URL requested through [`Renderer::load`].
	pub fn last_load(&self) -> Option<&Url> {
		self.loads.last()
	}

	/// Markup/base URL pairs requested through [`Renderer::load_html`].
	pub fn html_loads(&self) -> &[(String, Url)] {
		&self.html_loads
	}

	/// Scripts evaluated so far, oldest first.
	pub fn scripts(&self) -> &[String] {
		&self.scripts
	}
}
impl Renderer for HeadlessRenderer {
	fn load(&mut self, url: &Url) {
		self.loads.push(url.clone());
	}

	fn load_html(&mut self, html: &str, base_url: &Url) {
		self.html_loads.push((html.to_owned(), base_url.clone()));
		self.document = Some(Document::new(base_url.clone(), html));
	}

	fn evaluate_script(&mut self, script: &str) -> Result<serde_json::Value, ScriptError> {
		self.scripts.push(script.to_owned());

		self.script_results.pop_front().unwrap_or_else(|| Ok(self.fallback_result.clone()))
	}

	fn current_url(&self) -> Option<Url> {
		self.document
			.as_ref()
			.map(|document| document.url.clone())
			.or_else(|| self.loads.last().cloned())
	}

	fn current_document(&self) -> Option<Document> {
		self.document.clone()
	}
}
