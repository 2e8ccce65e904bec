//! Credential lifecycle for chatproxy.
//!
//! Owns the shared [`CredentialStore`] and the background loop that keeps its
//! access token and PUID fresh. The proxy only ever reads from the store.

pub mod device_id;
pub mod error;
pub mod login;
pub mod puid;
pub mod refresh;
pub mod refresh_token;
pub mod store;

use std::sync::Arc;

use chatproxy_common::GatewayConfig;
use chatproxy_upstream::ClientFactory;
use tracing::info;

pub use device_id::{DEVICE_ID_NAMESPACE, device_id_from_seed, resolve_device_id};
pub use error::AuthError;
pub use login::Auth0Login;
pub use puid::PuidClient;
pub use refresh::{
    CredentialRefresher, PuidSource, REFRESH_INTERVAL, RefreshHandle, RefreshStatus,
    RefreshStrategy, TokenSource,
};
pub use refresh_token::RefreshTokenExchange;
pub use store::{CredentialState, CredentialStore};

pub struct CredentialRuntime {
    pub store: Arc<CredentialStore>,
    pub refresh: RefreshHandle,
    pub strategy: &'static str,
}

impl CredentialRuntime {
    /// Resolves the device id, seeds the store and starts the refresh loop
    /// selected by the configured credentials.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &GatewayConfig, factory: &ClientFactory) -> Self {
        let device_id = resolve_device_id(&config.auth);
        let strategy = RefreshStrategy::select(&config.auth);
        let name = strategy.name();

        let mut initial = CredentialState {
            device_id: device_id.clone(),
            ..Default::default()
        };
        let tokens: Arc<dyn TokenSource> = match strategy {
            RefreshStrategy::Static { access_token, puid } => {
                initial.access_token = access_token;
                initial.puid = puid;
                info!(strategy = name, device_id = %device_id, "credentials loaded");
                return Self {
                    store: Arc::new(CredentialStore::new(initial)),
                    refresh: RefreshHandle::fixed(RefreshStatus::Static),
                    strategy: name,
                };
            }
            RefreshStrategy::Password { username, password } => Arc::new(Auth0Login::new(
                factory.clone(),
                &config.upstream.chat_base,
                &config.upstream.auth_base,
                config.user_agent.clone(),
                username,
                password,
            )),
            RefreshStrategy::RefreshToken { refresh_token } => Arc::new(RefreshTokenExchange::new(
                factory.clone(),
                &config.upstream.auth_base,
                config.user_agent.clone(),
                refresh_token,
            )),
        };

        let store = Arc::new(CredentialStore::new(initial));
        let puid = Arc::new(PuidClient::new(
            factory.clone(),
            &config.upstream.chat_base,
            config.user_agent.clone(),
            device_id.clone(),
        ));
        let refresh = CredentialRefresher::new(store.clone(), tokens, puid).spawn();
        info!(strategy = name, device_id = %device_id, "credential refresh started");

        Self {
            store,
            refresh,
            strategy: name,
        }
    }
}
