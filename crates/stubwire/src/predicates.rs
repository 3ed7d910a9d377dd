//! Request predicates for delegated matchers.
//!
//! ```
//! use stubwire::predicates::{method_is, path_is, CompareMode};
//! use stubwire::{MatchingResult, MockRequest};
//!
//! let matcher = |req: &MockRequest| {
//!     MatchingResult::from(
//!         method_is(req, &["GET"]) && path_is(req, "/health", CompareMode::CaseSensitive).unwrap_or(false),
//!     )
//! };
//! # let _ = matcher;
//! ```

use crate::error::MockError;
use crate::handler::{MethodFilter, MockRequest, RequestMatcher, UriTemplateMatcher};
use crate::matching::MatchingResult;
use crate::template::uri;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl CompareMode {
    fn eq(self, a: &str, b: &str) -> bool {
        match self {
            CompareMode::CaseSensitive => a == b,
            CompareMode::CaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }
}

/// Whether the request method is one of `methods`. An empty list never matches.
pub fn method_is(request: &MockRequest, methods: &[&str]) -> bool {
    methods
        .iter()
        .any(|m| m.eq_ignore_ascii_case(request.method().as_str()))
}

/// Compare the request path (still percent-encoded) with `absolute_path`.
pub fn path_is(
    request: &MockRequest,
    absolute_path: &str,
    mode: CompareMode,
) -> Result<bool, MockError> {
    if !absolute_path.starts_with('/') {
        return Err(MockError::InvalidPath(absolute_path.to_string()));
    }
    Ok(mode.eq(request.uri().path(), absolute_path))
}

/// Compare `host[:port]` of the request with `authority`. Default ports are omitted.
pub fn authority_is(request: &MockRequest, authority: &str, mode: CompareMode) -> bool {
    let Some(url) = uri::absolute_url(request.uri()) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let actual = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    mode.eq(&actual, authority)
}

/// Matcher for `template` under `base_address`, limited to `methods` when not empty.
pub fn request_is(
    base_address: &str,
    template: &str,
    methods: &[&str],
) -> Result<impl Fn(&MockRequest) -> MatchingResult + Send + Sync + 'static, MockError> {
    let matcher = UriTemplateMatcher::new(base_address, template, MethodFilter::new(methods))?;
    Ok(move |request: &MockRequest| matcher.is_match(request))
}
