//! Request matchers.
//!
//! A matcher decides whether a handler accepts a request and binds any named
//! values on the way. Closures work as delegated matchers.

use super::MockRequest;
use crate::error::MockError;
use crate::matching::{BindingValue, MatchingResult, Parameters};
use crate::template::{uri, UriTemplate};
use hyper::Method;
use regex::Regex;
use url::Url;

pub trait RequestMatcher: Send + Sync {
    fn is_match(&self, request: &MockRequest) -> MatchingResult;
}

impl<F> RequestMatcher for F
where
    F: Fn(&MockRequest) -> MatchingResult + Send + Sync,
{
    fn is_match(&self, request: &MockRequest) -> MatchingResult {
        self(request)
    }
}

/// Parse an absolute service base address.
pub fn parse_base_address(address: &str) -> Result<Url, MockError> {
    let invalid = |reason: &str| MockError::InvalidBaseAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(address).map_err(|e| invalid(&e.to_string()))?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("not an absolute hierarchical URI"));
    }
    Ok(url)
}

/// Accepted HTTP methods, compared case-insensitively. Empty accepts any method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodFilter {
    methods: Vec<String>,
}

impl MethodFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            methods: methods
                .into_iter()
                .map(|m| m.as_ref().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn is_any(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.is_any()
            || self
                .methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(method.as_str()))
    }
}

/// Matches a URI template below a base address, optionally filtered by method.
#[derive(Debug, Clone)]
pub struct UriTemplateMatcher {
    base_address: Url,
    template: UriTemplate,
    methods: MethodFilter,
}

impl UriTemplateMatcher {
    pub fn new(base_address: &str, template: &str, methods: MethodFilter) -> Result<Self, MockError> {
        Ok(Self {
            base_address: parse_base_address(base_address)?,
            template: UriTemplate::parse(template)?,
            methods,
        })
    }

    pub fn template(&self) -> &UriTemplate {
        &self.template
    }
}

impl RequestMatcher for UriTemplateMatcher {
    fn is_match(&self, request: &MockRequest) -> MatchingResult {
        if !self.methods.allows(request.method()) {
            return MatchingResult::no_match();
        }
        let Some(url) = uri::absolute_url(request.uri()) else {
            return MatchingResult::no_match();
        };
        self.template.is_match(&self.base_address, &url)
    }
}

/// Matches a regex against the request URI relative to a base address.
///
/// Named groups become bindings; a named group that did not participate in
/// the match binds [`BindingValue::Absent`].
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    base_address: Url,
    regex: Regex,
    methods: MethodFilter,
}

impl RegexMatcher {
    pub fn new(base_address: &str, pattern: &str, methods: MethodFilter) -> Result<Self, MockError> {
        let regex = Regex::new(pattern).map_err(|source| MockError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            base_address: parse_base_address(base_address)?,
            regex,
            methods,
        })
    }
}

impl RequestMatcher for RegexMatcher {
    fn is_match(&self, request: &MockRequest) -> MatchingResult {
        if !self.methods.allows(request.method()) {
            return MatchingResult::no_match();
        }
        let Some(url) = uri::absolute_url(request.uri()) else {
            return MatchingResult::no_match();
        };
        let Some(relative) = uri::relative_uri(&self.base_address, &url) else {
            return MatchingResult::no_match();
        };
        let Some(captures) = self.regex.captures(&relative) else {
            return MatchingResult::no_match();
        };

        let bindings = self.regex.capture_names().flatten().map(|name| {
            let value = captures.name(name).map(|m| m.as_str().to_string());
            (name.to_string(), BindingValue::from(value))
        });
        MatchingResult::matched(Parameters::from_pairs(bindings))
    }
}

/// Matches every request under a base address. Binds nothing.
#[derive(Debug, Clone)]
pub struct BaseAddressMatcher {
    base_address: Url,
}

impl BaseAddressMatcher {
    pub fn new(base_address: &str) -> Result<Self, MockError> {
        Ok(Self {
            base_address: parse_base_address(base_address)?,
        })
    }
}

impl RequestMatcher for BaseAddressMatcher {
    fn is_match(&self, request: &MockRequest) -> MatchingResult {
        uri::absolute_url(request.uri())
            .map(|url| UriTemplate::is_base_address_match(&self.base_address, &url))
            .unwrap_or(false)
            .into()
    }
}
