use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;
use http::{HeaderMap, Request};

use crate::core::CoreState;

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const X_AUTHORIZATION_HEADER: &str = "x-authorization";

/// The token this request will present upstream, before bearer normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessToken(pub String);

/// Account the request acts as, when known. Used to tag deactivation logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEmail(pub String);

/// Prefixes `Bearer ` unless the value already starts with `Bearer`.
pub fn bearer_authorization(token: &str) -> String {
    if token.starts_with("Bearer") {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}

/// Binds an [`AccessToken`] to every request.
///
/// A caller-supplied `Authorization` (or `X-Authorization`) header wins.
/// Without one the request acts as the managed account: the refreshed token
/// from the credential store is used and the account email is attached.
pub async fn attach_access_token(
    State(state): State<Arc<CoreState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match caller_token(req.headers()) {
        Some(token) => {
            req.extensions_mut().insert(AccessToken(token));
        }
        None => {
            let snapshot = state.credentials.snapshot();
            req.extensions_mut()
                .insert(AccessToken(snapshot.access_token.clone()));
            if let Some(email) = state.account_email.clone() {
                req.extensions_mut().insert(AccountEmail(email));
            }
        }
    }
    next.run(req).await
}

fn caller_token(headers: &HeaderMap) -> Option<String> {
    [AUTHORIZATION_HEADER, X_AUTHORIZATION_HEADER]
        .into_iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn bare_token_gets_prefixed() {
        assert_eq!(bearer_authorization("abc"), "Bearer abc");
        assert_eq!(bearer_authorization(""), "Bearer ");
        assert_eq!(bearer_authorization("bearer abc"), "Bearer bearer abc");
    }

    #[test]
    fn prefixed_token_is_unchanged() {
        assert_eq!(bearer_authorization("Bearer xyz"), "Bearer xyz");
        assert_eq!(bearer_authorization("Bearerxyz"), "Bearerxyz");
    }

    #[test]
    fn authorization_beats_x_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert("x-authorization", HeaderValue::from_static("second"));
        assert_eq!(caller_token(&headers).as_deref(), Some("second"));
        headers.insert("authorization", HeaderValue::from_static("Bearer first"));
        assert_eq!(caller_token(&headers).as_deref(), Some("Bearer first"));
    }

    #[test]
    fn blank_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("  "));
        assert_eq!(caller_token(&headers), None);
    }
}
