use chatproxy_common::UpstreamUrls;

pub const CHATGPT_PREFIX: &str = "/chatgpt";
pub const IMITATE_PREFIX: &str = "/imitate/v1";
pub const PLATFORM_PREFIX: &str = "/platform";

/// Maps inbound paths onto upstream URLs.
#[derive(Debug, Clone)]
pub struct RouteTable {
    chat_base: String,
    backend_api: String,
    platform_base: String,
}

impl RouteTable {
    pub fn new(urls: &UpstreamUrls) -> Self {
        Self {
            chat_base: urls.chat_base.clone(),
            backend_api: urls.backend_api(),
            platform_base: urls.platform_base.clone(),
        }
    }

    /// `/chatgpt/*` goes to the chat host as is, `/imitate/v1/*` to its
    /// backend api, `/platform/*` and everything else to the platform host.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = if let Some(rest) = strip_segment_prefix(path, CHATGPT_PREFIX) {
            format!("{}{rest}", self.chat_base)
        } else if let Some(rest) = strip_segment_prefix(path, IMITATE_PREFIX) {
            format!("{}{rest}", self.backend_api)
        } else {
            let rest = strip_segment_prefix(path, PLATFORM_PREFIX).unwrap_or(path);
            format!("{}{rest}", self.platform_base)
        };
        if let Some(query) = query.filter(|query| !query.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

fn strip_segment_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new(&UpstreamUrls::default())
    }

    #[test]
    fn imitate_maps_to_backend_api_with_query() {
        assert_eq!(
            table().upstream_url("/imitate/v1/foo", Some("x=1")),
            "https://chatgpt.com/backend-api/foo?x=1"
        );
    }

    #[test]
    fn chatgpt_keeps_path() {
        assert_eq!(
            table().upstream_url("/chatgpt/backend-api/conversation", None),
            "https://chatgpt.com/backend-api/conversation"
        );
    }

    #[test]
    fn platform_maps_to_platform_host() {
        assert_eq!(
            table().upstream_url("/platform/v1/chat/completions", Some("")),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn unknown_prefix_falls_through_to_platform() {
        assert_eq!(
            table().upstream_url("/v1/models", Some("a=b&c=d")),
            "https://api.openai.com/v1/models?a=b&c=d"
        );
        assert_eq!(
            table().upstream_url("/chatgptx/y", None),
            "https://api.openai.com/chatgptx/y"
        );
    }

    #[test]
    fn custom_bases_are_honored() {
        let table = RouteTable::new(&UpstreamUrls {
            chat_base: "http://127.0.0.1:1".to_string(),
            platform_base: "http://127.0.0.1:2".to_string(),
            auth_base: "http://127.0.0.1:3".to_string(),
        });
        assert_eq!(
            table.upstream_url("/imitate/v1/models", None),
            "http://127.0.0.1:1/backend-api/models"
        );
        assert_eq!(
            table.upstream_url("/platform/v1/models", None),
            "http://127.0.0.1:2/v1/models"
        );
    }
}
