use super::MockServer;
use crate::error::MockError;
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response};
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// `tower::Service` over a shared [`MockServer`].
///
/// Stands in for a real HTTP connector: code under test sends requests
/// through it and gets the mock responses back.
#[derive(Debug, Clone)]
pub struct MockTransport {
    server: Arc<MockServer>,
}

impl MockTransport {
    pub fn new(server: Arc<MockServer>) -> Self {
        Self { server }
    }

    pub fn server(&self) -> &Arc<MockServer> {
        &self.server
    }
}

impl<B> Service<Request<B>> for MockTransport
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: fmt::Display,
{
    type Response = Response<Full<Bytes>>;
    type Error = MockError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let server = Arc::clone(&self.server);
        Box::pin(async move {
            let response = server.send(request).await?;
            Ok(response.map(Full::new))
        })
    }
}
