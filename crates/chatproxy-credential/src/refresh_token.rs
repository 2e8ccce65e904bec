use async_trait::async_trait;
use chatproxy_upstream::ClientFactory;
use serde_json::Value as JsonValue;
use tracing::{error, info};
use wreq::header::{CONTENT_TYPE, USER_AGENT};

use crate::error::AuthError;
use crate::refresh::TokenSource;

pub const CLIENT_ID: &str = "pdlLIX2Y72MIl2rhLhTE9VV9bN905kBh";
pub const REDIRECT_URI: &str = "com.openai.chat://auth0.openai.com/ios/com.openai.chat/callback";

/// Exchanges a long-lived refresh token for a fresh access token.
#[derive(Debug, Clone)]
pub struct RefreshTokenExchange {
    factory: ClientFactory,
    token_url: String,
    user_agent: String,
    refresh_token: String,
}

impl RefreshTokenExchange {
    pub fn new(
        factory: ClientFactory,
        auth_base: &str,
        user_agent: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            token_url: format!("{}/oauth/token", auth_base.trim_end_matches('/')),
            user_agent: user_agent.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub async fn refresh_access_token(&self) -> Result<String, AuthError> {
        let client = self.factory.create_client(true)?;
        let payload = serde_json::json!({
            "redirect_uri": REDIRECT_URI,
            "grant_type": "refresh_token",
            "client_id": CLIENT_ID,
            "refresh_token": self.refresh_token,
        });
        let response = client
            .post(&self.token_url)
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            error!(status, "refresh token: server responded with unexpected status");
        }
        let body = response.bytes().await?;
        let raw = serde_json::from_slice::<JsonValue>(&body)?;
        let Some(access_token) = raw.get("access_token").and_then(JsonValue::as_str) else {
            error!(response = %raw, "refresh token: missing access token");
            return Err(AuthError::MissingAccessToken);
        };
        Ok(access_token.to_string())
    }
}

#[async_trait]
impl TokenSource for RefreshTokenExchange {
    fn label(&self) -> &'static str {
        "refresh_token"
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        let token = self.refresh_access_token().await?;
        info!("access token is updated");
        Ok(token)
    }
}
