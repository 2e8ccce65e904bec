pub mod auth;
pub mod core;
pub mod error;
pub mod handler;
pub mod route;

pub use auth::{AccessToken, AccountEmail, bearer_authorization};
pub use crate::core::{Core, CoreState};
pub use error::ProxyError;
pub use route::{CHATGPT_PREFIX, IMITATE_PREFIX, PLATFORM_PREFIX, RouteTable};
