//! Replays a DigitalOcean login against a headless renderer, printing every directive the
//! host receives.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth2_webflow::{
	engine::LoginEngine,
	host::{HostEvent, LoginOutcome, RecordingHost},
	provider::digitalocean,
	render::{Document, HeadlessRenderer},
};

const LOGIN_PAGE: &str = r#"<form action="/sessions" method="post">
	<input type="email" name="user[email]">
	<input type="password" name="user[password]">
</form>"#;
const APPROVAL_PAGE: &str =
	r#"<form method="post" action="/v1/oauth/authorize"><button>Authorize application</button></form>"#;

fn main() -> Result<()> {
	color_eyre::install()?;

	let redirect = Url::parse("oceanbar://oauth/callback")?;
	let adapter = digitalocean::adapter("demo-client", None, redirect)?;
	let renderer = HeadlessRenderer::default().with_script_result("submitted");
	let mut engine = LoginEngine::new(Arc::new(adapter), renderer, RecordingHost::default());
	let session = engine.start_login_process("sammy@example.com", "hunter2")?;
	let authorize = engine.renderer().last_load().cloned().ok_or_else(|| {
		color_eyre::eyre::eyre!("The engine did not request the authorization URL.")
	})?;

	println!("{session}: loading {authorize}.");

	// The provider bounces anonymous users to its login form.
	for (url, html) in [
		(authorize.as_str(), None),
		("https://cloud.digitalocean.com/login", Some(LOGIN_PAGE)),
		(authorize.as_str(), Some(APPROVAL_PAGE)),
	] {
		let policy = engine.will_load(url);

		println!("{url} -> {policy:?}.");

		if let Some(html) = html {
			engine.did_commit_load(url);
			engine.renderer_mut().present(Document::new(Url::parse(url)?, html));
			engine.did_finish_load();
			println!("  state: {}.", engine.state().as_str());
		}
	}

	let state = authorize
		.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.unwrap_or_default();
	let callback = format!(
		"oceanbar://oauth/callback#access_token=demo-token&token_type=bearer&expires_in=2592000&state={state}"
	);

	println!("redirect -> {:?}.", engine.will_load(&callback));

	for event in engine.host().events() {
		match event {
			HostEvent::Finished(id, LoginOutcome::Success(grant)) => println!(
				"{id}: signed in, token {} expires at {:?}.",
				grant.access_token, grant.expires_at
			),
			HostEvent::Finished(id, outcome) => println!("{id}: {}.", outcome.kind()),
			other => println!("host: {other:?}."),
		}
	}

	Ok(())
}
