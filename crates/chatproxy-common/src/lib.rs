use serde::{Deserialize, Serialize};

pub const CHAT_BASE_URL: &str = "https://chatgpt.com";
pub const PLATFORM_BASE_URL: &str = "https://api.openai.com";
pub const AUTH_BASE_URL: &str = "https://auth0.openai.com";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} url: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Final configuration used by the running process.
///
/// Everything here is read once at startup; nothing is reloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Impersonation profile name as configured (resolved by the upstream crate).
    pub client_profile: Option<String>,
    pub user_agent: String,
    /// Optional outbound proxy (for upstream egress).
    pub proxy: Option<String>,
    pub auth: AuthSettings,
    pub upstream: UpstreamUrls,
}

/// Credential material supplied by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    pub email: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
    pub puid: Option<String>,
    pub access_token: Option<String>,
    pub device_id: Option<String>,
}

impl AuthSettings {
    /// Username and password, only when both are present.
    pub fn login_pair(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamUrls {
    pub chat_base: String,
    pub platform_base: String,
    pub auth_base: String,
}

impl Default for UpstreamUrls {
    fn default() -> Self {
        Self {
            chat_base: CHAT_BASE_URL.to_string(),
            platform_base: PLATFORM_BASE_URL.to_string(),
            auth_base: AUTH_BASE_URL.to_string(),
        }
    }
}

impl UpstreamUrls {
    pub fn backend_api(&self) -> String {
        format!("{}/backend-api", self.chat_base)
    }
}

/// Optional layer collected from CLI/ENV before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub client_profile: Option<String>,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
    pub auth: AuthSettings,
    pub chat_base: Option<String>,
    pub platform_base: Option<String>,
    pub auth_base: Option<String>,
}

impl GatewayConfigPatch {
    pub fn into_config(self) -> Result<GatewayConfig, ConfigError> {
        let defaults = UpstreamUrls::default();
        let upstream = UpstreamUrls {
            chat_base: base_url("chat_base", self.chat_base, defaults.chat_base)?,
            platform_base: base_url("platform_base", self.platform_base, defaults.platform_base)?,
            auth_base: base_url("auth_base", self.auth_base, defaults.auth_base)?,
        };
        Ok(GatewayConfig {
            host: self.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: self.port.unwrap_or(8080),
            client_profile: self.client_profile,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            proxy: self.proxy,
            auth: self.auth,
            upstream,
        })
    }
}

fn base_url(
    field: &'static str,
    value: Option<String>,
    default: String,
) -> Result<String, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl { field, value });
    }
    Ok(value.trim_end_matches('/').to_string())
}
