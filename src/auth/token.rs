//! Token secrets and redirect-derived grants.

pub mod grant;
pub mod secret;
