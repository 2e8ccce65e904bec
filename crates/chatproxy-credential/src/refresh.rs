use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatproxy_common::AuthSettings;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::AuthError;
use crate::store::CredentialStore;

/// Time between two refresh cycles. Tokens are assumed to outlive it.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const REFRESH_PUID_ERROR: &str = "failed to refresh PUID";

/// Produces a fresh access token, one call per refresh cycle.
#[async_trait]
pub trait TokenSource: Send + Sync {
    fn label(&self) -> &'static str;

    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Derives a PUID from an access token; empty means "could not".
#[async_trait]
pub trait PuidSource: Send + Sync {
    async fn puid(&self, access_token: &str) -> String;
}

/// Which way the process keeps its credentials fresh, decided once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStrategy {
    Password { username: String, password: String },
    RefreshToken { refresh_token: String },
    Static { access_token: String, puid: String },
}

impl RefreshStrategy {
    /// Password beats refresh token beats static values.
    pub fn select(auth: &AuthSettings) -> Self {
        if let Some((username, password)) = auth.login_pair() {
            return Self::Password {
                username: username.to_string(),
                password: password.to_string(),
            };
        }
        if let Some(refresh_token) = auth.refresh_token.as_deref() {
            return Self::RefreshToken {
                refresh_token: refresh_token.to_string(),
            };
        }
        Self::Static {
            access_token: auth.access_token.clone().unwrap_or_default(),
            puid: auth.puid.clone().unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::RefreshToken { .. } => "refresh_token",
            Self::Static { .. } => "static",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Credentials come from configuration and are never refreshed.
    Static,
    /// The loop is alive; `cycles` counts completed token acquisitions.
    Running { cycles: u64 },
    /// The loop gave up for good. The proxy keeps serving stale credentials.
    Terminated { reason: String },
}

/// Observer side of a refresh loop.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    status: watch::Receiver<RefreshStatus>,
}

impl RefreshHandle {
    pub fn fixed(status: RefreshStatus) -> Self {
        let (_tx, rx) = watch::channel(status);
        Self { status: rx }
    }

    pub fn status(&self) -> RefreshStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.status.clone()
    }

    pub fn is_terminated(&self) -> bool {
        matches!(*self.status.borrow(), RefreshStatus::Terminated { .. })
    }
}

pub struct CredentialRefresher {
    store: Arc<CredentialStore>,
    tokens: Arc<dyn TokenSource>,
    puid: Arc<dyn PuidSource>,
    interval: Duration,
}

impl CredentialRefresher {
    pub fn new(
        store: Arc<CredentialStore>,
        tokens: Arc<dyn TokenSource>,
        puid: Arc<dyn PuidSource>,
    ) -> Self {
        Self {
            store,
            tokens,
            puid,
            interval: REFRESH_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts the loop on the current runtime and detaches it.
    pub fn spawn(self) -> RefreshHandle {
        let (tx, rx) = watch::channel(RefreshStatus::Running { cycles: 0 });
        tokio::spawn(self.run(tx));
        RefreshHandle { status: rx }
    }

    async fn run(self, status: watch::Sender<RefreshStatus>) {
        let source = self.tokens.label();
        let mut cycles = 0_u64;
        loop {
            let access_token = match self.tokens.access_token().await {
                Ok(token) if !token.is_empty() => token,
                Ok(_) => {
                    error!(source, "{REFRESH_PUID_ERROR}: empty access token");
                    status.send_replace(RefreshStatus::Terminated {
                        reason: "empty access token".to_string(),
                    });
                    return;
                }
                Err(err) => {
                    warn!(source, error = %err, "{REFRESH_PUID_ERROR}");
                    status.send_replace(RefreshStatus::Terminated {
                        reason: err.to_string(),
                    });
                    return;
                }
            };

            self.store.store_access_token(access_token.clone());

            let puid = self.puid.puid(&access_token).await;
            if puid.is_empty() {
                warn!(source, "{REFRESH_PUID_ERROR}");
            } else {
                self.store.store_puid(puid);
                info!(source, "PUID is updated");
            }

            cycles += 1;
            status.send_replace(RefreshStatus::Running { cycles });
            tokio::time::sleep(self.interval).await;
        }
    }
}
