//! Responders produce the response for a matched request.
//!
//! Anything implementing [`Responder`] can back a handler. Closures are
//! adapted with [`from_fn`] (synchronous) and [`from_async_fn`]; fixed
//! responses use [`CannedResponse`].

use super::{snapshot_request, MockRequest, MockResponse};
use crate::matching::Parameters;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::future::Future;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Responder: Send + Sync {
    /// Build the response. Errors are turned into `500` by the handler.
    async fn respond(
        &self,
        request: &MockRequest,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<MockResponse>;
}

pub struct FnResponder<F> {
    f: F,
}

/// Adapt a synchronous closure.
pub fn from_fn<F>(f: F) -> FnResponder<F>
where
    F: Fn(&MockRequest, &Parameters) -> anyhow::Result<MockResponse> + Send + Sync,
{
    FnResponder { f }
}

#[async_trait]
impl<F> Responder for FnResponder<F>
where
    F: Fn(&MockRequest, &Parameters) -> anyhow::Result<MockResponse> + Send + Sync,
{
    async fn respond(
        &self,
        request: &MockRequest,
        parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<MockResponse> {
        (self.f)(request, parameters)
    }
}

pub struct AsyncFnResponder<F> {
    f: F,
}

/// Adapt an async closure. It receives its own copy of the request.
pub fn from_async_fn<F, Fut>(f: F) -> AsyncFnResponder<F>
where
    F: Fn(MockRequest, Parameters, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<MockResponse>> + Send,
{
    AsyncFnResponder { f }
}

#[async_trait]
impl<F, Fut> Responder for AsyncFnResponder<F>
where
    F: Fn(MockRequest, Parameters, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<MockResponse>> + Send,
{
    async fn respond(
        &self,
        request: &MockRequest,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<MockResponse> {
        (self.f)(snapshot_request(request), parameters.clone(), cancel.clone()).await
    }
}

/// A fixed response, cloned for every call.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl CannedResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn json<T: serde::Serialize + ?Sized>(
        status: StatusCode,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(payload)?;
        Ok(Self::new(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(body))
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn to_response(&self) -> MockResponse {
        let mut response = Response::new(self.body.clone());
        *response.status_mut() = self.status;
        for (name, value) in &self.headers {
            response.headers_mut().append(name.clone(), value.clone());
        }
        response
    }
}

#[async_trait]
impl Responder for CannedResponse {
    async fn respond(
        &self,
        _request: &MockRequest,
        _parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<MockResponse> {
        Ok(self.to_response())
    }
}

#[async_trait]
impl Responder for StatusCode {
    async fn respond(
        &self,
        _request: &MockRequest,
        _parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<MockResponse> {
        Ok(CannedResponse::new(*self).to_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;

    fn request() -> MockRequest {
        Request::builder()
            .uri("http://host/api/x")
            .body(Bytes::from_static(b"payload"))
            .unwrap()
    }

    #[tokio::test]
    async fn test_sync_closure_sees_parameters() {
        let responder = from_fn(|_req, params| {
            let id = params.get_str("id").unwrap_or_default().to_string();
            Ok(Response::new(Bytes::from(id)))
        });
        let params = Parameters::from_pairs([("id", "42")]);
        let response = responder
            .respond(&request(), &params, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.body().as_ref(), b"42");
    }

    #[tokio::test]
    async fn test_async_closure_gets_owned_request() {
        let responder = from_async_fn(|req: MockRequest, _params, cancel: CancellationToken| async move {
            assert!(!cancel.is_cancelled());
            Ok(Response::new(req.into_body()))
        });
        let response = responder
            .respond(&request(), &Parameters::empty(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.body().as_ref(), b"payload");
    }

    #[tokio::test]
    async fn test_canned_json_response() {
        let canned = CannedResponse::json(StatusCode::CREATED, &serde_json::json!({"ok": true})).unwrap();
        let response = canned
            .respond(&request(), &Parameters::empty(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_status_code_is_a_responder() {
        let response = StatusCode::NO_CONTENT
            .respond(&request(), &Parameters::empty(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }
}
