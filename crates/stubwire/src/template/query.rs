use super::element::UriTemplateElement;
use super::uri::query_pairs;
use crate::error::TemplateError;
use crate::matching::{MatchingResult, Parameters};
use std::collections::HashMap;

/// Matches an actual query string against the query part of a template.
///
/// The template states what must be present; anything else in the actual
/// query is ignored. Declared variables that are missing still bind, to an
/// empty string.
#[derive(Debug, Clone, Default)]
pub struct UriQueryStringTemplateMatcher {
    elements: Vec<(String, UriTemplateElement)>,
}

impl UriQueryStringTemplateMatcher {
    pub fn new(template_query: &str) -> Result<Self, TemplateError> {
        let mut elements: Vec<(String, UriTemplateElement)> = Vec::new();
        for (key, value) in query_pairs(template_query) {
            if elements.iter().any(|(existing, _)| *existing == key) {
                return Err(TemplateError::DuplicateQueryKey {
                    key,
                    template: template_query.to_string(),
                });
            }
            let element = UriTemplateElement::parse(&value)?;
            elements.push((key, element));
        }
        Ok(Self { elements })
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the template requires at least one literal key.
    pub fn has_required_keys(&self) -> bool {
        self.elements.iter().any(|(_, e)| !e.is_variable())
    }

    pub fn is_match(&self, query: &str) -> MatchingResult {
        let actual: HashMap<String, String> = query_pairs(query).into_iter().collect();

        let all_literals_present = self
            .elements
            .iter()
            .filter(|(_, element)| !element.is_variable())
            .all(|(key, _)| actual.contains_key(key));
        if !all_literals_present {
            return MatchingResult::no_match();
        }

        let mut captured = Vec::new();
        for (key, element) in &self.elements {
            match actual.get(key) {
                Some(value) => {
                    if !element.is_match(value) {
                        return MatchingResult::no_match();
                    }
                    if element.is_variable() {
                        captured.push((element.value().to_string(), value.clone()));
                    }
                }
                None if element.is_variable() => {
                    captured.push((element.value().to_string(), String::new()));
                }
                None => {}
            }
        }

        MatchingResult::matched(Parameters::from_pairs(captured))
    }
}
