//! Shorthands for building responses inside responders.

use crate::error::MockError;
use crate::handler::MockResponse;
use bytes::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Empty body.
pub fn status(status: StatusCode) -> MockResponse {
    bytes(status, None, Bytes::new())
}

pub fn text(status: StatusCode, body: impl Into<String>) -> MockResponse {
    bytes(
        status,
        Some(HeaderValue::from_static("text/plain; charset=utf-8")),
        Bytes::from(body.into()),
    )
}

pub fn json<T: Serialize + ?Sized>(status: StatusCode, payload: &T) -> Result<MockResponse, MockError> {
    let body = serde_json::to_vec(payload)?;
    Ok(bytes(
        status,
        Some(HeaderValue::from_static("application/json")),
        Bytes::from(body),
    ))
}

pub fn bytes(
    status: StatusCode,
    content_type: Option<HeaderValue>,
    body: impl Into<Bytes>,
) -> MockResponse {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}
