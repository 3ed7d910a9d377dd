//! Verification over the calls a named handler received.
//!
//! A [`HandlerTracer`] is obtained from [`MockServer::tracer`](crate::MockServer::tracer).
//! Every check reads a fresh copy of the history, so calls still arriving
//! while a check runs do not disturb it.

use crate::error::VerifyError;
use crate::handler::{CallingHistoryContext, RequestHandler};
use crate::matching::BindingValue;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct HandlerTracer {
    name: String,
    handler: Arc<RequestHandler>,
}

impl HandlerTracer {
    pub(crate) fn new(name: &str, handler: Arc<RequestHandler>) -> Self {
        Self {
            name: name.to_string(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recorded calls, oldest first. Concurrent callers may interleave.
    pub fn calling_histories(&self) -> Vec<Arc<CallingHistoryContext>> {
        self.handler.calling_histories()
    }

    pub fn call_count(&self) -> usize {
        self.calling_histories().len()
    }

    pub fn verify_has_been_called(&self) -> Result<(), VerifyError> {
        if self.call_count() > 0 {
            return Ok(());
        }
        Err(self.failure("The API is not called, which does not match your expectation."))
    }

    pub fn verify_has_been_called_times(&self, times: usize) -> Result<(), VerifyError> {
        let actual = self.call_count();
        if actual == times {
            return Ok(());
        }
        Err(self.failure(format!(
            "The API has been called for {} time(s) rather than {} time(s).",
            actual, times
        )))
    }

    pub fn verify_not_called(&self) -> Result<(), VerifyError> {
        let actual = self.call_count();
        if actual == 0 {
            return Ok(());
        }
        Err(self.failure(format!(
            "The API has been called for {} time(s). But your expectation is not being called.",
            actual
        )))
    }

    /// Passes when some call bound `parameter` to exactly `expected`.
    pub fn verify_bound_parameter(&self, parameter: &str, expected: &str) -> Result<(), VerifyError> {
        self.verify_bound_parameter_with(parameter, |value| value == expected)
    }

    /// Passes when some call bound `parameter` to a value accepted by `check`.
    pub fn verify_bound_parameter_with<F>(&self, parameter: &str, check: F) -> Result<(), VerifyError>
    where
        F: Fn(&BindingValue) -> bool,
    {
        let found = self
            .calling_histories()
            .iter()
            .any(|call| call.parameters().get(parameter).is_some_and(&check));
        if found {
            return Ok(());
        }
        Err(self.failure(format!(
            "Either no parameter has name \"{}\" or the parameter value did not pass the verify process",
            parameter
        )))
    }

    // ===== Request content =====

    /// Body of the first call as JSON. `Ok(None)` when nothing was recorded.
    pub fn first_request_content<T: DeserializeOwned>(&self) -> Result<Option<T>, VerifyError> {
        self.first_request_content_with(json_body)
    }

    pub fn last_request_content<T: DeserializeOwned>(&self) -> Result<Option<T>, VerifyError> {
        self.last_request_content_with(json_body)
    }

    /// Like [`first_request_content`](Self::first_request_content) but fails
    /// when more than one call was recorded.
    pub fn single_request_content<T: DeserializeOwned>(&self) -> Result<Option<T>, VerifyError> {
        self.single_request_content_with(json_body)
    }

    pub fn first_request_content_with<T, E, F>(&self, decode: F) -> Result<Option<T>, VerifyError>
    where
        F: FnOnce(&[u8]) -> Result<T, E>,
        E: fmt::Display,
    {
        let histories = self.calling_histories();
        self.decode(histories.first(), decode)
    }

    pub fn last_request_content_with<T, E, F>(&self, decode: F) -> Result<Option<T>, VerifyError>
    where
        F: FnOnce(&[u8]) -> Result<T, E>,
        E: fmt::Display,
    {
        let histories = self.calling_histories();
        self.decode(histories.last(), decode)
    }

    pub fn single_request_content_with<T, E, F>(&self, decode: F) -> Result<Option<T>, VerifyError>
    where
        F: FnOnce(&[u8]) -> Result<T, E>,
        E: fmt::Display,
    {
        let histories = self.calling_histories();
        if histories.len() > 1 {
            return Err(self.failure(format!(
                "Expected at most one call but the API has been called for {} time(s).",
                histories.len()
            )));
        }
        self.decode(histories.first(), decode)
    }

    pub fn first_request_text(&self) -> Result<Option<String>, VerifyError> {
        self.first_request_content_with(utf8_body)
    }

    pub fn last_request_text(&self) -> Result<Option<String>, VerifyError> {
        self.last_request_content_with(utf8_body)
    }

    fn decode<T, E, F>(
        &self,
        call: Option<&Arc<CallingHistoryContext>>,
        decode: F,
    ) -> Result<Option<T>, VerifyError>
    where
        F: FnOnce(&[u8]) -> Result<T, E>,
        E: fmt::Display,
    {
        let Some(call) = call else {
            return Ok(None);
        };
        decode(call.body())
            .map(Some)
            .map_err(|e| self.failure(format!("Cannot read the request content: {}", e)))
    }

    fn failure(&self, message: impl Into<String>) -> VerifyError {
        VerifyError::new(&self.name, message)
    }
}

impl fmt::Debug for HandlerTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTracer")
            .field("name", &self.name)
            .field("calls", &self.call_count())
            .finish()
    }
}

fn json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}

fn utf8_body(body: &[u8]) -> Result<String, std::str::Utf8Error> {
    std::str::from_utf8(body).map(str::to_string)
}
