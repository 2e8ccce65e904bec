use anyhow::Context;
use chatproxy_common::{AuthSettings, GatewayConfig, GatewayConfigPatch};
use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "chatproxy",
    version,
    about = "Reverse proxy for the ChatGPT and platform APIs"
)]
pub struct CliArgs {
    /// Bind host.
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Bind port.
    #[arg(long, env = "PORT")]
    pub port: Option<String>,

    /// Browser impersonation profile, e.g. `chrome_137` or `safari_18`.
    #[arg(long, env = "CLIENT_PROFILE")]
    pub client_profile: Option<String>,

    /// User-Agent sent upstream.
    #[arg(long, env = "UA")]
    pub user_agent: Option<String>,

    /// Optional outbound proxy for upstream requests.
    #[arg(long, env = "PROXY")]
    pub proxy: Option<String>,

    #[arg(long, env = "OPENAI_DEVICE_ID")]
    pub device_id: Option<String>,

    #[arg(long, env = "OPENAI_EMAIL")]
    pub email: Option<String>,

    #[arg(long, env = "OPENAI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long, env = "OPENAI_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    #[arg(long, env = "PUID", hide_env_values = true)]
    pub puid: Option<String>,

    /// Access token used as is when no login method is configured.
    #[arg(long, env = "IMITATE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "CHATPROXY_CHAT_BASE", hide = true)]
    pub chat_base: Option<String>,

    #[arg(long, env = "CHATPROXY_PLATFORM_BASE", hide = true)]
    pub platform_base: Option<String>,

    #[arg(long, env = "CHATPROXY_AUTH_BASE", hide = true)]
    pub auth_base: Option<String>,
}

pub fn config_from_env() -> anyhow::Result<GatewayConfig> {
    load_config(CliArgs::parse())
}

pub fn load_config(args: CliArgs) -> anyhow::Result<GatewayConfig> {
    let patch = GatewayConfigPatch {
        host: sanitize_optional_env_value(args.host),
        port: parse_u16_env_value(args.port, "PORT")?,
        client_profile: sanitize_optional_env_value(args.client_profile),
        user_agent: sanitize_optional_env_value(args.user_agent),
        proxy: sanitize_optional_env_value(args.proxy),
        auth: AuthSettings {
            email: sanitize_optional_env_value(args.email),
            password: sanitize_secret_value(args.password),
            refresh_token: sanitize_optional_env_value(args.refresh_token),
            puid: sanitize_optional_env_value(args.puid),
            access_token: sanitize_optional_env_value(args.access_token),
            device_id: sanitize_optional_env_value(args.device_id),
        },
        chat_base: sanitize_optional_env_value(args.chat_base),
        platform_base: sanitize_optional_env_value(args.platform_base),
        auth_base: sanitize_optional_env_value(args.auth_base),
    };
    patch.into_config().context("invalid configuration")
}

fn sanitize_optional_env_value(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    // Unresolved `${VAR}` placeholders from deployment templates count as unset.
    if trimmed.starts_with("${") && trimmed.ends_with('}') {
        return None;
    }
    Some(trimmed)
}

/// Like [`sanitize_optional_env_value`] but never trims: surrounding spaces
/// are part of a password.
fn sanitize_secret_value(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || (trimmed.starts_with("${") && trimmed.ends_with('}')) {
        return None;
    }
    Some(value)
}

fn parse_u16_env_value(value: Option<String>, env_name: &str) -> anyhow::Result<Option<u16>> {
    let Some(raw) = sanitize_optional_env_value(value) else {
        return Ok(None);
    };
    let parsed = raw
        .parse::<u16>()
        .with_context(|| format!("invalid {env_name} value: {raw}"))?;
    Ok(Some(parsed))
}
