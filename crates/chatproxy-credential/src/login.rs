//! Username/password login through the Auth0 universal login pages.
//!
//! The flow runs on one client with its own cookie jar and manual redirects:
//! the session cookie set by the chat host callback is what finally unlocks
//! `/api/auth/session`.

use async_trait::async_trait;
use chatproxy_upstream::ClientFactory;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;
use wreq::Client;
use wreq::header::{LOCATION, USER_AGENT};

use crate::error::AuthError;
use crate::refresh::TokenSource;

const GET_AUTHORIZED_URL_ERROR: &str = "failed to get authorized url";
const GET_STATE_ERROR: &str = "failed to get state";
const EMAIL_INVALID_ERROR: &str = "email is not valid";
const EMAIL_OR_PASSWORD_INVALID_ERROR: &str = "email or password is not correct";
const GET_ACCESS_TOKEN_ERROR: &str = "failed to get access token";

const MAX_REDIRECTS: usize = 10;
const CALLBACK_PATH: &str = "/api/auth/callback/";

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    #[serde(rename = "csrfToken", default)]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct SigninResponse {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(rename = "accessToken", default)]
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct Auth0Login {
    factory: ClientFactory,
    chat_base: String,
    auth_base: String,
    user_agent: String,
    username: String,
    password: String,
}

impl Auth0Login {
    pub fn new(
        factory: ClientFactory,
        chat_base: &str,
        auth_base: &str,
        user_agent: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            factory,
            chat_base: chat_base.trim_end_matches('/').to_string(),
            auth_base: auth_base.trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub async fn login(&self) -> Result<String, AuthError> {
        let client = self.factory.create_manual_redirect_client(true)?;

        let csrf_token = self.csrf_token(&client).await?;
        let authorized_url = self.authorized_url(&client, &csrf_token).await?;
        let state = self.state(&client, authorized_url).await?;
        self.check_username(&client, &state).await?;
        let resume = self.check_password(&client, &state).await?;
        self.follow_callback(&client, resume).await?;
        self.session_access_token(&client).await
    }

    async fn csrf_token(&self, client: &Client) -> Result<String, AuthError> {
        let response = client
            .get(format!("{}/api/auth/csrf", self.chat_base))
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(AuthError::login(GET_AUTHORIZED_URL_ERROR, status));
        }
        let body: CsrfResponse = serde_json::from_slice(&response.bytes().await?)?;
        if body.csrf_token.is_empty() {
            return Err(AuthError::login(GET_AUTHORIZED_URL_ERROR, status));
        }
        Ok(body.csrf_token)
    }

    async fn authorized_url(&self, client: &Client, csrf_token: &str) -> Result<Url, AuthError> {
        let response = client
            .post(format!("{}/api/auth/signin/auth0?prompt=login", self.chat_base))
            .header(USER_AGENT, &self.user_agent)
            .form(&[
                ("callbackUrl", "/"),
                ("csrfToken", csrf_token),
                ("json", "true"),
            ])
            .send()
            .await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(AuthError::login(GET_AUTHORIZED_URL_ERROR, status));
        }
        let body: SigninResponse = serde_json::from_slice(&response.bytes().await?)?;
        if body.url.contains("error") {
            return Err(AuthError::login(GET_AUTHORIZED_URL_ERROR, status));
        }
        Url::parse(&body.url).map_err(|_| AuthError::login(GET_AUTHORIZED_URL_ERROR, status))
    }

    async fn state(&self, client: &Client, authorized_url: Url) -> Result<String, AuthError> {
        let response = client
            .get(authorized_url.as_str())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;
        let status = response.status().as_u16();
        redirect_location(&response)
            .and_then(|location| query_value(&location, "state"))
            .ok_or_else(|| AuthError::login(GET_STATE_ERROR, status))
    }

    async fn check_username(&self, client: &Client, state: &str) -> Result<(), AuthError> {
        let response = client
            .post(format!(
                "{}/u/login/identifier?state={}",
                self.auth_base,
                urlencoding::encode(state)
            ))
            .header(USER_AGENT, &self.user_agent)
            .form(&[
                ("state", state),
                ("username", self.username.as_str()),
                ("js-available", "true"),
                ("webauthn-available", "true"),
                ("is-brave", "false"),
                ("webauthn-platform-available", "false"),
                ("action", "default"),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_redirection() {
            return Err(AuthError::login(EMAIL_INVALID_ERROR, status.as_u16()));
        }
        Ok(())
    }

    async fn check_password(&self, client: &Client, state: &str) -> Result<Url, AuthError> {
        let response = client
            .post(format!(
                "{}/u/login/password?state={}",
                self.auth_base,
                urlencoding::encode(state)
            ))
            .header(USER_AGENT, &self.user_agent)
            .form(&[
                ("state", state),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
                ("action", "default"),
            ])
            .send()
            .await?;
        let status = response.status().as_u16();
        redirect_location(&response)
            .ok_or_else(|| AuthError::login(EMAIL_OR_PASSWORD_INVALID_ERROR, status))
    }

    /// Walks the resume redirects until the chat host callback has been visited.
    async fn follow_callback(&self, client: &Client, resume_url: Url) -> Result<(), AuthError> {
        let mut url = resume_url;
        for _ in 0..MAX_REDIRECTS {
            if query_value(&url, "error").is_some() {
                return Err(AuthError::login(GET_ACCESS_TOKEN_ERROR, 0));
            }
            debug!(url = %url, "login redirect");
            let response = client
                .get(url.as_str())
                .header(USER_AGENT, &self.user_agent)
                .send()
                .await?;
            let status = response.status().as_u16();
            if url.path().starts_with(CALLBACK_PATH) {
                return Ok(());
            }
            url = redirect_location(&response)
                .ok_or_else(|| AuthError::login(GET_ACCESS_TOKEN_ERROR, status))?;
        }
        Err(AuthError::login(GET_ACCESS_TOKEN_ERROR, 0))
    }

    async fn session_access_token(&self, client: &Client) -> Result<String, AuthError> {
        let response = client
            .get(format!("{}/api/auth/session", self.chat_base))
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(AuthError::login(GET_ACCESS_TOKEN_ERROR, status));
        }
        let body: SessionResponse = serde_json::from_slice(&response.bytes().await?)?;
        if body.access_token.is_empty() {
            return Err(AuthError::MissingAccessToken);
        }
        Ok(body.access_token)
    }
}

#[async_trait]
impl TokenSource for Auth0Login {
    fn label(&self) -> &'static str {
        "password"
    }

    async fn access_token(&self) -> Result<String, AuthError> {
        let token = self.login().await?;
        info!("login succeeded");
        Ok(token)
    }
}

/// The redirect target of `response`, resolved against the URL that produced it.
fn redirect_location(response: &wreq::Response) -> Option<Url> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    let current = Url::parse(response.url().as_str()).ok()?;
    resolve_location(&current, location)
}

pub(crate) fn resolve_location(current: &Url, location: &str) -> Option<Url> {
    current.join(location).ok()
}

/// First non-blank value of `key` in the query of `url`.
pub(crate) fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
