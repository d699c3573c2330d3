//! JSON response construction with the fixed CORS header set.

use crate::errors::{CellarError, Result};
use http_body_util::{BodyExt, Full, combinators::BoxBody};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub type HandlerBody = BoxBody<Bytes, CellarError>;

/// Fixed CORS header set applied to every response, pre-flight included.
pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "GET, POST, PATCH, OPTIONS"),
    ("Content-Type", "application/json"),
];

fn builder(status: StatusCode) -> http::response::Builder {
    let mut builder = Response::builder().status(status);
    for (name, value) in CORS_HEADERS {
        builder = builder.header(*name, *value);
    }
    builder
}

fn full_body(bytes: Bytes) -> HandlerBody {
    Full::new(bytes).map_err(|never| match never {}).boxed()
}

/// Serializes a value into a JSON response with CORS headers.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<HandlerBody>> {
    let bytes = serde_json::to_vec(value).map(Bytes::from)?;
    builder(status)
        .body(full_body(bytes))
        .map_err(|e| CellarError::InternalError(format!("Failed to build response: {e}")))
}

/// `{"error": message}` with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response<HandlerBody> {
    let body = serde_json::json!({ "error": message });
    json_response(status, &body).unwrap_or_else(|_| {
        let mut fallback = Response::new(full_body(Bytes::from_static(b"{}")));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Empty 200 used for OPTIONS pre-flight.
pub fn preflight_response() -> Result<Response<HandlerBody>> {
    builder(StatusCode::OK)
        .body(full_body(Bytes::new()))
        .map_err(|e| CellarError::InternalError(format!("Failed to build response: {e}")))
}

/// Deserializes a JSON request body.
pub fn deserialize_body<T: DeserializeOwned>(bytes: &Bytes) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CellarError::RequestBodyError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_headers_on_every_response() {
        let response = json_response(StatusCode::OK, &serde_json::json!({"ok": true})).unwrap();
        for (name, value) in CORS_HEADERS {
            assert_eq!(
                response.headers().get(*name).and_then(|v| v.to_str().ok()),
                Some(*value)
            );
        }
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(StatusCode::NOT_FOUND, "Not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_preflight_is_empty_200() {
        let response = preflight_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_deserialize_body_error() {
        let result = deserialize_body::<serde_json::Value>(&Bytes::from_static(b"{nope"));
        assert!(matches!(
            result.unwrap_err(),
            CellarError::RequestBodyError(_)
        ));
    }
}
