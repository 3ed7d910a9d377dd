use super::element::UriTemplateElement;
use crate::error::TemplateError;
use crate::matching::{MatchingResult, Parameters};

/// Matches relative path segments against the path part of a template.
#[derive(Debug, Clone)]
pub struct UriTemplatePathMatcher {
    elements: Vec<UriTemplateElement>,
}

impl UriTemplatePathMatcher {
    /// Build from already split (and decoded) template segments, root excluded.
    pub fn new<I, S>(segments: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let elements = segments
            .into_iter()
            .map(|s| UriTemplateElement::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { elements })
    }

    pub fn elements(&self) -> &[UriTemplateElement] {
        &self.elements
    }

    /// Segment counts must be equal; there is no greedy or wildcard segment.
    pub fn is_match<S: AsRef<str>>(&self, segments: &[S]) -> MatchingResult {
        if segments.len() != self.elements.len() {
            return MatchingResult::no_match();
        }

        let mut captured = Vec::new();
        for (element, segment) in self.elements.iter().zip(segments) {
            let segment = segment.as_ref();
            if !element.is_match(segment) {
                return MatchingResult::no_match();
            }
            if element.is_variable() {
                captured.push((element.value().to_string(), segment.to_string()));
            }
        }

        MatchingResult::matched(Parameters::from_pairs(captured))
    }
}
