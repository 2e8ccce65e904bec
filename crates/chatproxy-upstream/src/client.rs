use std::time::Duration;

use wreq::{Client, Proxy};

use crate::profile::ClientProfile;

/// Timeout of the shared proxying client; long enough for streamed completions.
pub const PROXY_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid proxy url {url}: {source}")]
    Proxy {
        url: String,
        #[source]
        source: wreq::Error,
    },
    #[error("build http client: {0}")]
    Build(#[source] wreq::Error),
}

#[derive(Debug, Clone, Copy, Default)]
struct ClientOptions {
    with_proxy: bool,
    timeout: Option<Duration>,
    manual_redirects: bool,
}

/// Builds impersonating clients for the proxy and for auth calls.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    profile: ClientProfile,
    proxy: Option<String>,
}

impl ClientFactory {
    pub fn new(profile: ClientProfile, proxy: Option<String>) -> Self {
        Self {
            profile,
            proxy: normalize_proxy(proxy),
        }
    }

    pub fn profile(&self) -> ClientProfile {
        self.profile
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// The long-lived client reused by every proxied request.
    pub fn shared_client(&self) -> Result<Client, ClientError> {
        self.build(ClientOptions {
            with_proxy: true,
            timeout: Some(PROXY_TIMEOUT),
            manual_redirects: false,
        })
    }

    /// A short-lived client with a fresh cookie jar, for a single auth call.
    pub fn create_client(&self, with_proxy: bool) -> Result<Client, ClientError> {
        self.build(ClientOptions {
            with_proxy,
            ..Default::default()
        })
    }

    /// Like [`create_client`](Self::create_client) but redirects are returned
    /// to the caller instead of being followed.
    pub fn create_manual_redirect_client(&self, with_proxy: bool) -> Result<Client, ClientError> {
        self.build(ClientOptions {
            with_proxy,
            manual_redirects: true,
            ..Default::default()
        })
    }

    fn build(&self, options: ClientOptions) -> Result<Client, ClientError> {
        let mut builder = Client::builder()
            .emulation(self.profile.emulation())
            .cookie_store(true);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if options.manual_redirects {
            builder = builder.redirect(wreq::redirect::Policy::none());
        }
        if options.with_proxy
            && let Some(url) = self.proxy.as_deref()
        {
            let proxy = Proxy::all(url).map_err(|source| ClientError::Proxy {
                url: url.to_string(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(ClientError::Build)
    }
}

fn normalize_proxy(value: Option<String>) -> Option<String> {
    value
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
}
