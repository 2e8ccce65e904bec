use axum::body::Body;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde_json::{Map, Value};
use tracing::warn;

pub const ERROR_MESSAGE_KEY: &str = "errorMessage";

/// A response generated locally rather than relayed from upstream.
#[derive(Debug)]
pub struct ProxyError {
    pub status: StatusCode,
    pub body: Value,
}

impl ProxyError {
    /// `{"errorMessage": ...}` with 500. The message is logged at warn.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(error = %message, "proxy error");
        let mut body = Map::new();
        body.insert(ERROR_MESSAGE_KEY.to_string(), Value::String(message));
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Value::Object(body),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        json_response(self.status, &self.body)
    }
}

pub(crate) fn json_response(status: StatusCode, body: &Value) -> Response {
    let mut resp = Response::new(Body::from(body.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_uses_envelope() {
        let err = ProxyError::internal("connection refused");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.to_string(), r#"{"errorMessage":"connection refused"}"#);
    }
}
