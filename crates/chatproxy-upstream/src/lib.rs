//! Outbound HTTP for chatproxy.
//!
//! Every client built here presents the process-wide impersonation profile and
//! owns its own cookie jar. Nothing in this crate knows about credentials or
//! routing; callers decorate requests themselves.

pub mod client;
pub mod profile;

pub use client::{ClientError, ClientFactory, PROXY_TIMEOUT};
pub use profile::{ClientProfile, DEFAULT_PROFILE_NAME};
