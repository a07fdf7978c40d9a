//! Drive an embedded web renderer through a provider's hosted OAuth 2.0 login and consent
//! pages, then capture the token from the final redirect.
//!
//! Some providers ship no desktop-friendly OAuth flow. This crate lets a desktop host load
//! the provider's real pages inside its own web view while a [`engine::LoginEngine`]
//! watches every navigation, fills the login form, surfaces the approval page, and reports
//! exactly one [`host::LoginOutcome`] per attempt.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod engine;
pub mod error;
pub mod host;
pub mod obs;
pub mod provider;
pub mod render;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
