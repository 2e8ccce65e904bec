mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Query, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chatproxy_credential::PuidClient;

use common::{bind_local, factory, spawn_upstream};

#[derive(Clone)]
struct Upstream {
    status: StatusCode,
    set_cookie: Option<&'static str>,
    hits: Arc<AtomicUsize>,
}

async fn models(
    State(upstream): State<Upstream>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    let authorized = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some("Bearer tok");
    let has_device = headers.get(COOKIE).and_then(|v| v.to_str().ok()) == Some("oai-did=device-1;");
    let has_query = query.get("history_and_training_disabled").map(String::as_str) == Some("false");
    if !(authorized && has_device && has_query) {
        return (StatusCode::BAD_REQUEST, HeaderMap::new(), "bad request shape");
    }
    let mut out = HeaderMap::new();
    if let Some(cookie) = upstream.set_cookie {
        out.insert(SET_COOKIE, cookie.parse().unwrap());
    }
    (upstream.status, out, "{\"models\":[]}")
}

async fn client_for(status: StatusCode, set_cookie: Option<&'static str>) -> (PuidClient, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/backend-api/models", get(models))
        .with_state(Upstream {
            status,
            set_cookie,
            hits: hits.clone(),
        });
    let base = spawn_upstream(router).await;
    (PuidClient::new(factory(), &base, "test-agent", "device-1"), hits)
}

#[tokio::test]
async fn puid_cookie_is_returned_on_success() {
    let (client, hits) = client_for(StatusCode::OK, Some("_puid=cookieVal123; Path=/; HttpOnly")).await;
    assert_eq!(client.get_puid("tok").await, "cookieVal123");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unauthorized_yields_empty() {
    let (client, _) = client_for(StatusCode::UNAUTHORIZED, Some("_puid=ignored")).await;
    assert_eq!(client.get_puid("tok").await, "");
}

#[tokio::test]
async fn missing_cookie_yields_empty() {
    let (client, _) = client_for(StatusCode::OK, None).await;
    assert_eq!(client.get_puid("tok").await, "");
}

#[tokio::test]
async fn empty_token_makes_no_request() {
    let (client, hits) = client_for(StatusCode::OK, Some("_puid=cookieVal123")).await;
    assert_eq!(client.get_puid("").await, "");
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_upstream_yields_empty() {
    let (listener, base) = bind_local().await;
    drop(listener);
    let client = PuidClient::new(factory(), &base, "test-agent", "device-1");
    assert_eq!(client.get_puid("tok").await, "");
}
