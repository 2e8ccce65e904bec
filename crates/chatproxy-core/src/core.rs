use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::any;
use chatproxy_common::GatewayConfig;
use chatproxy_credential::CredentialStore;
use wreq::Client;

use crate::auth::attach_access_token;
use crate::handler::proxy_handler;
use crate::route::RouteTable;

/// Everything a proxied request needs, shared by all handler tasks.
pub struct CoreState {
    /// Long-timeout client reused for every proxied request.
    pub client: Client,
    pub credentials: Arc<CredentialStore>,
    pub routes: RouteTable,
    pub user_agent: String,
    /// Managed account, tagged onto requests that use the refreshed token.
    pub account_email: Option<String>,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(client: Client, credentials: Arc<CredentialStore>, config: &GatewayConfig) -> Self {
        Self {
            state: Arc::new(CoreState {
                client,
                credentials,
                routes: RouteTable::new(&config.upstream),
                user_agent: config.user_agent.clone(),
                account_email: config.auth.email.clone(),
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/chatgpt/{*path}", any(proxy_handler))
            .route("/imitate/v1/{*path}", any(proxy_handler))
            .route("/platform/{*path}", any(proxy_handler))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                attach_access_token,
            ))
            .layer(DefaultBodyLimit::disable())
            .with_state(self.state.clone())
    }

    pub fn state(&self) -> Arc<CoreState> {
        self.state.clone()
    }
}
