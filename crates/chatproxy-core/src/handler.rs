use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::TryStreamExt;
use http::header::{CONTENT_TYPE, COOKIE, USER_AGENT};
use http::{HeaderValue, Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::auth::{AccessToken, AccountEmail, bearer_authorization};
use crate::core::CoreState;
use crate::error::{ProxyError, json_response};

pub const OAI_LANGUAGE_HEADER: &str = "oai-language";
pub const OAI_DEVICE_ID_HEADER: &str = "oai-device-id";
pub const OAI_LANGUAGE: &str = "en-US";

pub async fn proxy_handler(State(state): State<Arc<CoreState>>, req: Request) -> Response {
    let started_at = Instant::now();
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();
    let url = state.routes.upstream_url(&path, parts.uri.query());
    let access_token = parts
        .extensions
        .get::<AccessToken>()
        .map(|token| token.0.clone())
        .unwrap_or_default();
    let email = parts
        .extensions
        .get::<AccountEmail>()
        .map(|email| email.0.clone());

    info!(
        event = "downstream_received",
        method = %parts.method,
        path = %path,
        upstream = %url
    );

    let method = match wreq::Method::from_bytes(parts.method.as_str().as_bytes()) {
        Ok(method) => method,
        Err(err) => return ProxyError::internal(err.to_string()).into_response(),
    };
    let device_id = state.credentials.device_id();

    let mut builder = state
        .client
        .request(method, url.as_str())
        .header(USER_AGENT.as_str(), state.user_agent.as_str())
        .header(
            wreq::header::AUTHORIZATION,
            bearer_authorization(&access_token),
        )
        .header(OAI_LANGUAGE_HEADER, OAI_LANGUAGE)
        .header(OAI_DEVICE_ID_HEADER, device_id.as_str())
        .header(COOKIE.as_str(), format!("oai-did={device_id};"));
    if parts.method != Method::GET {
        let body: Bytes = match to_bytes(body, usize::MAX).await {
            Ok(body) => body,
            Err(err) => return ProxyError::internal(err.to_string()).into_response(),
        };
        builder = builder.body(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(
                event = "upstream_failed",
                path = %path,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            return ProxyError::internal(err.to_string()).into_response();
        }
    };

    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status != StatusCode::OK {
        if status == StatusCode::UNAUTHORIZED {
            warn!(
                "account {} is deactivated",
                email.as_deref().unwrap_or("unknown")
            );
        }
        let body = match response.bytes().await {
            Ok(bytes) => decode_error_body(&bytes),
            Err(_) => Value::Object(Map::new()),
        };
        warn!(
            event = "downstream_responded",
            path = %path,
            status = status.as_u16(),
            elapsed_ms = started_at.elapsed().as_millis()
        );
        return json_response(status, &body);
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE.as_str())
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok());
    info!(
        event = "downstream_responded",
        path = %path,
        status = status.as_u16(),
        elapsed_ms = started_at.elapsed().as_millis(),
        is_stream = true
    );

    let stream_path = path.clone();
    let stream = response.bytes_stream().inspect_err(move |err| {
        warn!(event = "upstream_stream_failed", path = %stream_path, error = %err);
    });
    let mut resp = Response::new(Body::from_stream(stream));
    *resp.status_mut() = StatusCode::OK;
    if let Some(content_type) = content_type {
        resp.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    resp
}

/// Upstream error bodies are relayed as JSON objects; anything else becomes `{}`.
fn decode_error_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Map<String, Value>>(bytes) {
        Ok(map) => Value::Object(map),
        Err(_) => Value::Object(Map::new()),
    }
}
