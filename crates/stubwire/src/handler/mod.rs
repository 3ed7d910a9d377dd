//! Request handlers.
//!
//! A [`RequestHandler`] pairs a matcher with a responder. Named handlers keep
//! a calling history that tracers read back.
//!
//! - `matchers`: how a handler decides it can take a request
//! - `responder`: how it builds the response

pub mod matchers;
pub mod responder;

pub use matchers::{
    BaseAddressMatcher, MethodFilter, RegexMatcher, RequestMatcher, UriTemplateMatcher,
};
pub use responder::{CannedResponse, Responder};

use crate::error::MockError;
use crate::matching::{MatchingResult, Parameters};
use futures::FutureExt;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// A request with its body fully buffered.
pub type MockRequest = Request<bytes::Bytes>;
/// A response with its body fully buffered.
pub type MockResponse = Response<bytes::Bytes>;

/// Copy a request: method, URI, version, headers, extensions and body.
pub fn snapshot_request(request: &MockRequest) -> MockRequest {
    let mut copy = Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    *copy.extensions_mut() = request.extensions().clone();
    copy
}

/// One recorded invocation of a named handler.
#[derive(Debug)]
pub struct CallingHistoryContext {
    request: MockRequest,
    parameters: Parameters,
}

impl CallingHistoryContext {
    pub fn new(request: MockRequest, parameters: Parameters) -> Self {
        Self { request, parameters }
    }

    pub fn request(&self) -> &MockRequest {
        &self.request
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn body(&self) -> &[u8] {
        self.request.body()
    }
}

pub struct RequestHandler {
    name: Option<String>,
    matcher: Box<dyn RequestMatcher>,
    responder: Box<dyn Responder>,
    histories: Mutex<Vec<Arc<CallingHistoryContext>>>,
}

impl RequestHandler {
    pub fn new(matcher: impl RequestMatcher + 'static, responder: impl Responder + 'static) -> Self {
        Self {
            name: None,
            matcher: Box::new(matcher),
            responder: Box::new(responder),
            histories: Mutex::new(Vec::new()),
        }
    }

    /// Match with an arbitrary closure.
    pub fn delegated<F>(matcher: F, responder: impl Responder + 'static) -> Self
    where
        F: Fn(&MockRequest) -> MatchingResult + Send + Sync + 'static,
    {
        Self::new(matcher, responder)
    }

    pub fn uri_template(
        base_address: &str,
        template: &str,
        methods: MethodFilter,
        responder: impl Responder + 'static,
    ) -> Result<Self, MockError> {
        let matcher = UriTemplateMatcher::new(base_address, template, methods)?;
        Ok(Self::new(matcher, responder))
    }

    pub fn regex(
        base_address: &str,
        pattern: &str,
        methods: MethodFilter,
        responder: impl Responder + 'static,
    ) -> Result<Self, MockError> {
        let matcher = RegexMatcher::new(base_address, pattern, methods)?;
        Ok(Self::new(matcher, responder))
    }

    /// Accept everything under `base_address`. Used for default handlers.
    pub fn base_address_only(
        base_address: &str,
        responder: impl Responder + 'static,
    ) -> Result<Self, MockError> {
        let matcher = BaseAddressMatcher::new(base_address)?;
        Ok(Self::new(matcher, responder))
    }

    /// Name the handler so its calls are recorded and traceable.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_match(&self, request: &MockRequest) -> MatchingResult {
        self.matcher.is_match(request)
    }

    /// Invoke the responder with the bindings from a prior match.
    ///
    /// History is appended before the responder runs. Responder errors and
    /// panics come back as `500 Internal Server Error`.
    pub async fn handle(
        &self,
        request: &MockRequest,
        parameters: Parameters,
        cancel: &CancellationToken,
    ) -> MockResponse {
        if let Some(name) = &self.name {
            debug!("Recording call to handler '{}': {} {}", name, request.method(), request.uri());
            let entry = CallingHistoryContext::new(snapshot_request(request), parameters.clone());
            self.histories.lock().push(Arc::new(entry));
        }

        let outcome = AssertUnwindSafe(self.responder.respond(request, &parameters, cancel))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                let detail = format!("{:#}", err);
                error!(
                    "Handler '{}' failed for {} {}: {}",
                    self.display_name(),
                    request.method(),
                    request.uri(),
                    detail
                );
                fault_response(detail)
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(
                    "Handler '{}' panicked for {} {}: {}",
                    self.display_name(),
                    request.method(),
                    request.uri(),
                    detail
                );
                fault_response(detail)
            }
        }
    }

    /// Copy of the calls recorded so far, oldest first.
    pub fn calling_histories(&self) -> Vec<Arc<CallingHistoryContext>> {
        self.histories.lock().clone()
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("name", &self.name)
            .field("calls", &self.histories.lock().len())
            .finish_non_exhaustive()
    }
}

fn fault_response(detail: String) -> MockResponse {
    let mut response = Response::new(bytes::Bytes::from(detail));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("responder panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("responder panicked: {}", message)
    } else {
        "responder panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hyper::Method;

    const BASE: &str = "http://host/api";

    fn request(method: Method, uri: &str, body: &'static str) -> MockRequest {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-trace", "abc")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    async fn run(handler: &RequestHandler, req: &MockRequest) -> MockResponse {
        let result = handler.is_match(req);
        assert!(result.is_match());
        handler
            .handle(req, result.into_parameters(), &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_named_handler_records_snapshot() {
        let handler = RequestHandler::uri_template(BASE, "user/{id}", MethodFilter::any(), StatusCode::OK)
            .unwrap()
            .with_name("user");
        let req = request(Method::POST, "http://host/api/user/7", "hello");
        run(&handler, &req).await;
        drop(req);

        let histories = handler.calling_histories();
        assert_eq!(histories.len(), 1);
        let call = &histories[0];
        assert_eq!(call.request().method(), Method::POST);
        assert_eq!(call.request().uri(), "http://host/api/user/7");
        assert_eq!(call.request().headers()["x-trace"], "abc");
        assert_eq!(call.body(), b"hello");
        assert_eq!(call.parameters().get_str("id"), Some("7"));
    }

    #[tokio::test]
    async fn test_unnamed_handler_records_nothing() {
        let handler = RequestHandler::base_address_only(BASE, StatusCode::OK).unwrap();
        run(&handler, &request(Method::GET, "http://host/api/x", "")).await;
        assert!(handler.calling_histories().is_empty());
    }

    #[tokio::test]
    async fn test_responder_error_becomes_500_and_history_is_kept() {
        let handler = RequestHandler::delegated(
            |_| true.into(),
            responder::from_fn(|_, _| Err(anyhow::anyhow!("backend exploded"))),
        )
        .with_name("failing");
        let response = run(&handler, &request(Method::GET, "http://host/api", "")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8_lossy(response.body()).contains("backend exploded"));
        assert_eq!(handler.calling_histories().len(), 1);
    }

    #[tokio::test]
    async fn test_responder_panic_becomes_500() {
        let handler = RequestHandler::delegated(
            |_| true.into(),
            responder::from_fn(|_, _| panic!("boom")),
        );
        let response = run(&handler, &request(Method::GET, "http://host/api", "")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(String::from_utf8_lossy(response.body()).contains("boom"));
    }

    #[tokio::test]
    async fn test_history_snapshot_is_independent() {
        let handler = RequestHandler::delegated(|_| true.into(), StatusCode::OK).with_name("h");
        let req = request(Method::GET, "http://host/api", "");
        run(&handler, &req).await;
        let before = handler.calling_histories();
        run(&handler, &req).await;
        assert_eq!(before.len(), 1);
        assert_eq!(handler.calling_histories().len(), 2);
    }

    #[test]
    fn test_invalid_construction_is_reported() {
        assert!(RequestHandler::uri_template("/relative", "x", MethodFilter::any(), StatusCode::OK).is_err());
        assert!(RequestHandler::regex(BASE, "(", MethodFilter::any(), StatusCode::OK).is_err());
        assert!(RequestHandler::uri_template(BASE, "{", MethodFilter::any(), StatusCode::OK).is_err());
    }
}
