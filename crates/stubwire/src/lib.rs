//! Stubwire: in-process HTTP mocking.
//!
//! Register handlers on a [`MockServer`], point the code under test at a
//! [`MockTransport`], then verify what was called through a [`HandlerTracer`].
//!
//! ```no_run
//! use hyper::StatusCode;
//! use stubwire::MockServer;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let server = MockServer::new();
//! server
//!     .with_service("http://host/api")?
//!     .api("user/{id}").method("GET").name("get-user").json(&serde_json::json!({"id": 42}))?;
//!
//! // ... exercise the code under test ...
//!
//! let tracer = server.tracer("get-user")?;
//! tracer.verify_has_been_called_times(1)?;
//! tracer.verify_bound_parameter("id", "42")?;
//! # Ok(())
//! # }
//! ```

// ===== Matching =====
pub mod matching;
pub mod template;

// ===== Handlers and dispatch =====
pub mod handler;
pub mod server;
pub mod service;

// ===== Verification and helpers =====
pub mod predicates;
pub mod response;
pub mod tracer;

pub mod config;
pub mod error;

pub use config::{MockConfig, ServerConfig};
pub use error::{MockError, TemplateError, VerifyError};
pub use handler::{
    responder, CallingHistoryContext, CannedResponse, MethodFilter, MockRequest, MockResponse,
    RequestHandler, RequestMatcher, Responder,
};
pub use matching::{BindingValue, MatchingResult, Parameters};
pub use server::{DiagnosticRecord, MockServer, MockTransport};
pub use service::{RouteBuilder, ServiceClause};
pub use template::UriTemplate;
pub use tracer::HandlerTracer;
