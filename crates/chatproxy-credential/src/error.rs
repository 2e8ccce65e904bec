use chatproxy_upstream::ClientError;

/// Failures of the token-producing auth flows.
///
/// Every variant is terminal for the refresh loop that observed it.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("request failed: {0}")]
    Transport(#[from] wreq::Error),
    #[error("decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("missing access token in response")]
    MissingAccessToken,
    #[error("{message} (status {status})")]
    Login { message: &'static str, status: u16 },
}

impl AuthError {
    pub(crate) fn login(message: &'static str, status: u16) -> Self {
        Self::Login { message, status }
    }
}
