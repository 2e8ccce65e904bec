use async_trait::async_trait;
use chatproxy_upstream::ClientFactory;
use tracing::error;
use wreq::header::{AUTHORIZATION, COOKIE, HeaderMap, SET_COOKIE, USER_AGENT};

use crate::refresh::PuidSource;

pub const PUID_COOKIE: &str = "_puid";

/// Derives the `_puid` session cookie from a valid access token.
#[derive(Debug, Clone)]
pub struct PuidClient {
    factory: ClientFactory,
    models_url: String,
    user_agent: String,
    device_id: String,
}

impl PuidClient {
    pub fn new(
        factory: ClientFactory,
        chat_base: &str,
        user_agent: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            models_url: format!(
                "{}/backend-api/models?history_and_training_disabled=false",
                chat_base.trim_end_matches('/')
            ),
            user_agent: user_agent.into(),
            device_id: device_id.into(),
        }
    }

    /// Returns the PUID, or an empty string when it cannot be obtained.
    ///
    /// The request goes out directly, never through the configured proxy.
    pub async fn get_puid(&self, access_token: &str) -> String {
        if access_token.is_empty() {
            error!("GetPUID: missing access token");
            return String::new();
        }

        let client = match self.factory.create_client(false) {
            Ok(client) => client,
            Err(err) => {
                error!(error = %err, "GetPUID: build http client");
                return String::new();
            }
        };

        let response = client
            .get(&self.models_url)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(USER_AGENT, &self.user_agent)
            .header(COOKIE, format!("oai-did={};", self.device_id))
            .send()
            .await;
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "GetPUID: request failed");
                return String::new();
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            error!(status, "GetPUID: server responded with unexpected status");
            return String::new();
        }

        match response_cookie(response.headers(), PUID_COOKIE) {
            Some(puid) => puid,
            None => {
                error!("GetPUID: PUID cookie not found");
                String::new()
            }
        }
    }
}

#[async_trait]
impl PuidSource for PuidClient {
    async fn puid(&self, access_token: &str) -> String {
        self.get_puid(access_token).await
    }
}

/// Value of the first `Set-Cookie` entry named `name`.
pub(crate) fn response_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|raw| {
            let pair = raw.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().trim_matches('"').to_string())
        })
}
