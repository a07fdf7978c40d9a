//! Provider-facing descriptors (data) and adapters (behavior).
//!
//! `descriptor` exposes validated, serde-loadable metadata (`ProviderDescriptor`) covering
//! the authorization, token, and redirect endpoints plus the client identity.
//! `adapter` defines [`ProviderAdapter`], the hook set the navigation engine consults for
//! every URL and document. `hosted` implements it for same-host login pages and
//! `digitalocean` ships a ready preset.

pub mod adapter;
pub mod descriptor;
pub mod digitalocean;
pub mod hosted;

pub use adapter::*;
pub use descriptor::*;
pub use hosted::*;
