//! Fluent registration of routes that share a base address.
//!
//! ```no_run
//! use hyper::StatusCode;
//! use stubwire::MockServer;
//!
//! # fn main() -> Result<(), stubwire::MockError> {
//! let server = MockServer::new();
//! server
//!     .with_service("http://host/api")?
//!     .api("user/{id}").method("GET").status(StatusCode::OK)?
//!     .api("x").method("POST").name("h").status(StatusCode::OK)?
//!     .fallback().status(StatusCode::SERVICE_UNAVAILABLE)?;
//! # Ok(())
//! # }
//! ```

use crate::error::MockError;
use crate::handler::{
    matchers::parse_base_address, responder, CannedResponse, MethodFilter, MockRequest,
    MockResponse, RequestHandler, Responder,
};
use crate::matching::Parameters;
use crate::server::MockServer;
use hyper::StatusCode;
use serde::Serialize;

/// Routes registered through a clause all live under its base address.
#[derive(Debug)]
pub struct ServiceClause<'a> {
    server: &'a MockServer,
    base_address: String,
}

impl<'a> ServiceClause<'a> {
    pub fn new(server: &'a MockServer, base_address: &str) -> Result<Self, MockError> {
        parse_base_address(base_address)?;
        Ok(Self {
            server,
            base_address: base_address.to_string(),
        })
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Route on a URI template relative to the base address.
    pub fn api(&self, template: &str) -> RouteBuilder<'_, 'a> {
        RouteBuilder::new(self, Route::Template(template.to_string()))
    }

    /// Route on a regex over the relative URI, path and query included.
    pub fn regex_api(&self, pattern: &str) -> RouteBuilder<'_, 'a> {
        RouteBuilder::new(self, Route::Regex(pattern.to_string()))
    }

    /// Default handler for anything under the base address.
    ///
    /// Method filters do not apply to fallbacks.
    pub fn fallback(&self) -> RouteBuilder<'_, 'a> {
        RouteBuilder::new(self, Route::Fallback)
    }

    pub fn done(&self) -> &'a MockServer {
        self.server
    }
}

#[derive(Debug, Clone)]
enum Route {
    Template(String),
    Regex(String),
    Fallback,
}

#[derive(Debug)]
#[must_use = "a route is only registered by one of its terminal methods"]
pub struct RouteBuilder<'c, 'a> {
    clause: &'c ServiceClause<'a>,
    route: Route,
    methods: Vec<String>,
    name: Option<String>,
}

impl<'c, 'a> RouteBuilder<'c, 'a> {
    fn new(clause: &'c ServiceClause<'a>, route: Route) -> Self {
        Self {
            clause,
            route,
            methods: Vec::new(),
            name: None,
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.methods.push(method.to_string());
        self
    }

    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods
            .extend(methods.into_iter().map(|m| m.as_ref().to_string()));
        self
    }

    /// Name the route so it can be traced.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn respond_with(
        self,
        responder: impl Responder + 'static,
    ) -> Result<&'c ServiceClause<'a>, MockError> {
        let base = self.clause.base_address.as_str();
        let server = self.clause.server;
        let methods = MethodFilter::new(&self.methods);

        let handler = match &self.route {
            Route::Template(template) => {
                RequestHandler::uri_template(base, template, methods, responder)?
            }
            Route::Regex(pattern) => RequestHandler::regex(base, pattern, methods, responder)?,
            Route::Fallback => RequestHandler::base_address_only(base, responder)?,
        };
        let handler = match self.name {
            Some(name) => handler.with_name(name),
            None => handler,
        };

        match self.route {
            Route::Fallback => server.add_default_handler(handler)?,
            _ => server.add_handler(handler)?,
        };
        Ok(self.clause)
    }

    /// Respond with a synchronous closure.
    pub fn respond_with_fn<F>(self, f: F) -> Result<&'c ServiceClause<'a>, MockError>
    where
        F: Fn(&MockRequest, &Parameters) -> anyhow::Result<MockResponse> + Send + Sync + 'static,
    {
        self.respond_with(responder::from_fn(f))
    }

    /// Respond with an empty body and the given status.
    pub fn status(self, status: StatusCode) -> Result<&'c ServiceClause<'a>, MockError> {
        self.respond_with(CannedResponse::new(status))
    }

    /// Respond `200 OK` with `payload` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(
        self,
        payload: &T,
    ) -> Result<&'c ServiceClause<'a>, MockError> {
        self.json_with_status(StatusCode::OK, payload)
    }

    pub fn json_with_status<T: Serialize + ?Sized>(
        self,
        status: StatusCode,
        payload: &T,
    ) -> Result<&'c ServiceClause<'a>, MockError> {
        let canned = CannedResponse::json(status, payload)?;
        self.respond_with(canned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hyper::Request;
    use tokio_util::sync::CancellationToken;

    fn get(uri: &str) -> MockRequest {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_rejects_relative_base_address() {
        let server = MockServer::new();
        assert!(matches!(
            server.with_service("/api"),
            Err(MockError::InvalidBaseAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_chained_registration() {
        let server = MockServer::new();
        server
            .with_service("http://host/api")
            .unwrap()
            .api("a")
            .status(StatusCode::ACCEPTED)
            .unwrap()
            .regex_api("^b/(?P<n>[0-9]+)$")
            .name("b")
            .status(StatusCode::CREATED)
            .unwrap()
            .fallback()
            .status(StatusCode::IM_A_TEAPOT)
            .unwrap();

        let cancel = CancellationToken::new();
        let a = server.dispatch(get("http://host/api/a"), cancel.clone()).await;
        let b = server.dispatch(get("http://host/api/b/12"), cancel.clone()).await;
        let other = server.dispatch(get("http://host/api/zzz"), cancel.clone()).await;
        let outside = server.dispatch(get("http://host/web"), cancel).await;

        assert_eq!(a.status(), StatusCode::ACCEPTED);
        assert_eq!(b.status(), StatusCode::CREATED);
        assert_eq!(other.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(outside.status(), StatusCode::NOT_FOUND);

        let tracer = server.tracer("b").unwrap();
        tracer.verify_bound_parameter("n", "12").unwrap();
    }

    #[test]
    fn test_invalid_template_surfaces_at_registration() {
        let server = MockServer::new();
        let clause = server.with_service("http://host/api").unwrap();
        let err = clause.api("user/{id").status(StatusCode::OK).unwrap_err();
        assert!(matches!(err, MockError::Template(_)));
        assert_eq!(server.handler_count(), 0);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let server = MockServer::new();
        let clause = server.with_service("http://host/api").unwrap();
        clause.api("a").name("same").status(StatusCode::OK).unwrap();
        let err = clause.api("b").name("same").status(StatusCode::OK).unwrap_err();
        assert!(matches!(err, MockError::DuplicateName(name) if name == "same"));
    }

    #[test]
    fn test_done_returns_server() {
        let server = MockServer::new();
        let clause = server.with_service("http://host/api").unwrap();
        clause.api("a").status(StatusCode::OK).unwrap();
        assert!(std::ptr::eq(clause.done(), &server));
    }
}
