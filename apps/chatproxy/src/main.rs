mod bootstrap;

use anyhow::Context;
use chatproxy_core::Core;
use chatproxy_credential::CredentialRuntime;
use chatproxy_upstream::{ClientFactory, ClientProfile};
use time::OffsetDateTime;
use tracing::info;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("chatproxy failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = bootstrap::config_from_env()?;
    let profile = ClientProfile::resolve(config.client_profile.as_deref());
    info!(
        host = %config.host,
        port = config.port,
        profile = profile.name(),
        proxy = %config.proxy.as_deref().unwrap_or(""),
        "config loaded"
    );

    let factory = ClientFactory::new(profile, config.proxy.clone());
    let client = factory
        .shared_client()
        .context("build upstream http client")?;

    let credentials = CredentialRuntime::start(&config, &factory);
    let core = Core::new(client, credentials.store.clone(), &config);

    let bind = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(
        addr = %bind,
        strategy = credentials.strategy,
        started_at = OffsetDateTime::now_utc().unix_timestamp(),
        "service chatproxy is ready"
    );

    axum::serve(listener, core.router())
        .await
        .context("serve")?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "chatproxy=info,chatproxy_core=info,chatproxy_credential=info,chatproxy_upstream=info",
        )
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
