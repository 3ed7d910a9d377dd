//! URI template matching.
//!
//! Grammar: path segments separated by `/`, where a segment of the exact
//! form `{name}` captures and anything else is a case-insensitive literal.
//! An optional query part lists `key=value` pairs; a value of the form
//! `{name}` captures, any other value must be present and equal.
//!
//! Templates are relative: they are matched against the part of a request
//! URI that lies below a service base address.

mod element;
mod path;
mod query;
pub mod uri;

pub use element::UriTemplateElement;
pub use path::UriTemplatePathMatcher;
pub use query::UriQueryStringTemplateMatcher;

use crate::error::TemplateError;
use crate::matching::MatchingResult;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Templates are resolved against this address only to split them into parts.
const TEMPLATE_ANCHOR: &str = "http://stubwire.template/";

#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    path: UriTemplatePathMatcher,
    query: UriQueryStringTemplateMatcher,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let unparsable = |reason: String| TemplateError::Unparsable {
            template: template.to_string(),
            reason,
        };

        let anchor = Url::parse(TEMPLATE_ANCHOR).map_err(|e| unparsable(e.to_string()))?;
        let anchored = anchor
            .join(template)
            .map_err(|e| unparsable(e.to_string()))?;

        let path = UriTemplatePathMatcher::new(uri::path_segments(anchored.path()))?;
        let query = UriQueryStringTemplateMatcher::new(anchored.query().unwrap_or(""))?;

        Ok(Self {
            template: template.to_string(),
            path,
            query,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn path_matcher(&self) -> &UriTemplatePathMatcher {
        &self.path
    }

    pub fn query_matcher(&self) -> &UriQueryStringTemplateMatcher {
        &self.query
    }

    /// Match `uri` relative to `base_address`. Path bindings come first in the result.
    pub fn is_match(&self, base_address: &Url, uri: &Url) -> MatchingResult {
        let Some(relative) = uri::relative_path_segments(base_address, uri) else {
            return MatchingResult::no_match();
        };

        let path_result = self.path.is_match(&relative);
        if !path_result.is_match() {
            return MatchingResult::no_match();
        }

        let query_result = self.query.is_match(uri.query().unwrap_or(""));
        if !query_result.is_match() {
            return MatchingResult::no_match();
        }

        MatchingResult::matched(path_result.parameters().union(query_result.parameters()))
    }

    pub fn is_base_address_match(base_address: &Url, uri: &Url) -> bool {
        uri::is_base_address_match(base_address, uri)
    }
}

impl FromStr for UriTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
