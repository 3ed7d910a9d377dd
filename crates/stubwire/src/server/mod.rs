//! MockServer - the in-process dispatcher.
//!
//! Requests are offered to primary handlers first, newest registration
//! first, then to default handlers. Nothing matching means `404`.
//!
//! - `transport`: `tower::Service` adapter for plugging the server into clients

mod transport;


pub use transport::MockTransport;

use crate::config::ServerConfig;
use crate::error::MockError;
use crate::handler::{MockRequest, MockResponse, RequestHandler};
use crate::matching::Parameters;
use crate::service::ServiceClause;
use crate::tracer::HandlerTracer;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A request that no handler accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub method: String,
    pub uri: String,
    pub message: String,
}

pub struct MockServer {
    config: ServerConfig,
    handlers: RwLock<Vec<Arc<RequestHandler>>>,
    default_handlers: RwLock<Vec<Arc<RequestHandler>>>,
    /// Named handlers across both lists
    named: RwLock<HashMap<String, Arc<RequestHandler>>>,
    diagnostics_enabled: AtomicBool,
    diagnostics: Mutex<Vec<DiagnosticRecord>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            diagnostics_enabled: AtomicBool::new(config.diagnostics),
            config,
            handlers: RwLock::new(Vec::new()),
            default_handlers: RwLock::new(Vec::new()),
            named: RwLock::new(HashMap::new()),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register a primary handler. Later registrations take precedence.
    pub fn add_handler(&self, handler: RequestHandler) -> Result<Arc<RequestHandler>, MockError> {
        self.register(handler, &self.handlers)
    }

    /// Register a handler consulted only when no primary handler matches.
    pub fn add_default_handler(
        &self,
        handler: RequestHandler,
    ) -> Result<Arc<RequestHandler>, MockError> {
        self.register(handler, &self.default_handlers)
    }

    fn register(
        &self,
        handler: RequestHandler,
        list: &RwLock<Vec<Arc<RequestHandler>>>,
    ) -> Result<Arc<RequestHandler>, MockError> {
        let handler = Arc::new(handler);
        let mut named = self.named.write();
        if let Some(name) = handler.name() {
            if named.contains_key(name) {
                return Err(MockError::DuplicateName(name.to_string()));
            }
            named.insert(name.to_string(), Arc::clone(&handler));
        }
        list.write().push(Arc::clone(&handler));
        debug!("Registered handler '{}'", handler.name().unwrap_or("<unnamed>"));
        Ok(handler)
    }

    /// Register routes under one base address.
    pub fn with_service(&self, base_address: &str) -> Result<ServiceClause<'_>, MockError> {
        ServiceClause::new(self, base_address)
    }

    pub fn handler(&self, name: &str) -> Option<Arc<RequestHandler>> {
        self.named.read().get(name).cloned()
    }

    /// Verification view over a named handler.
    pub fn tracer(&self, name: &str) -> Result<HandlerTracer, MockError> {
        self.handler(name)
            .map(|handler| HandlerTracer::new(name, handler))
            .ok_or_else(|| MockError::HandlerNotFound(name.to_string()))
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len() + self.default_handlers.read().len()
    }

    /// Route a buffered request to the handler that should answer it.
    pub async fn dispatch(&self, request: MockRequest, cancel: CancellationToken) -> MockResponse {
        let primary = self.handlers.read().clone();
        let selected = select_handler(&primary, &request).or_else(|| {
            let defaults = self.default_handlers.read().clone();
            select_handler(&defaults, &request)
        });

        match selected {
            Some((handler, parameters)) => {
                debug!(
                    "Handler '{}' selected for {} {}",
                    handler.name().unwrap_or("<unnamed>"),
                    request.method(),
                    request.uri()
                );
                handler.handle(&request, parameters, &cancel).await
            }
            None => self.not_found(&request),
        }
    }

    /// Buffer the body of any request, then dispatch it.
    pub async fn send<B>(&self, request: Request<B>) -> Result<MockResponse, MockError>
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let (parts, body) = request.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| MockError::Body(e.to_string()))?
            .to_bytes();
        Ok(self
            .dispatch(Request::from_parts(parts, body), CancellationToken::new())
            .await)
    }

    pub fn enable_diagnostics(&self) {
        self.diagnostics_enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable_diagnostics(&self) {
        self.diagnostics_enabled.store(false, Ordering::SeqCst);
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics_enabled.load(Ordering::SeqCst)
    }

    /// Unmatched requests recorded while diagnostics were on.
    pub fn diagnostics(&self) -> Vec<DiagnosticRecord> {
        self.diagnostics.lock().clone()
    }

    pub fn clear_diagnostics(&self) {
        self.diagnostics.lock().clear();
    }

    fn not_found(&self, request: &MockRequest) -> MockResponse {
        let message = format!(
            "No handler matched the request: {} {}",
            request.method(),
            request.uri()
        );
        warn!("{}", message);

        if self.diagnostics_enabled() {
            self.diagnostics.lock().push(DiagnosticRecord {
                method: request.method().to_string(),
                uri: request.uri().to_string(),
                message: message.clone(),
            });
        }

        let body = if self.config.not_found_diagnostics {
            Bytes::from(message)
        } else {
            Bytes::new()
        };
        let mut response = Response::new(body);
        *response.status_mut() = StatusCode::NOT_FOUND;
        if self.config.not_found_diagnostics {
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        response
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockServer")
            .field("config", &self.config)
            .field("handlers", &self.handlers.read().len())
            .field("default_handlers", &self.default_handlers.read().len())
            .finish()
    }
}

/// Last registered match wins. Each handler is asked at most once.
fn select_handler(
    handlers: &[Arc<RequestHandler>],
    request: &MockRequest,
) -> Option<(Arc<RequestHandler>, Parameters)> {
    handlers.iter().rev().find_map(|handler| {
        let result = handler.is_match(request);
        result
            .is_match()
            .then(|| (Arc::clone(handler), result.into_parameters()))
    })
}
