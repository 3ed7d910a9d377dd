//! Matching results and bound parameters.
//!
//! A matcher answers two questions for a request: can this handler take it,
//! and which named values did the route capture along the way. Both travel
//! together in [`MatchingResult`].

use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

/// A value captured for a named template variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingValue {
    Text(String),
    /// Declared by the route but not captured (an optional regex group that did not participate).
    Absent,
}

impl BindingValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BindingValue::Text(value) => Some(value),
            BindingValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, BindingValue::Absent)
    }
}

impl fmt::Display for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingValue::Text(value) => f.write_str(value),
            BindingValue::Absent => f.write_str("<absent>"),
        }
    }
}

impl From<String> for BindingValue {
    fn from(value: String) -> Self {
        BindingValue::Text(value)
    }
}

impl From<&str> for BindingValue {
    fn from(value: &str) -> Self {
        BindingValue::Text(value.to_string())
    }
}

impl From<Option<String>> for BindingValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(BindingValue::Absent, BindingValue::Text)
    }
}

impl PartialEq<str> for BindingValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for BindingValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// One named binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: BindingValue,
}

static EMPTY_PARAMETERS: Lazy<Parameters> = Lazy::new(|| Parameters {
    entries: Arc::from(Vec::new()),
});

/// Immutable, insertion-ordered bindings with case-insensitive key lookup.
///
/// Cloning is cheap: the entries are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameters {
    entries: Arc<[Binding]>,
}

impl Parameters {
    /// The shared empty mapping.
    pub fn empty() -> Self {
        EMPTY_PARAMETERS.clone()
    }

    /// Build from pairs. A name that appears twice keeps its first value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<BindingValue>,
    {
        let mut entries: Vec<Binding> = Vec::new();
        for (name, value) in pairs {
            let name = name.into();
            if entries.iter().any(|b| keys_equal(&b.name, &name)) {
                continue;
            }
            entries.push(Binding {
                name,
                value: value.into(),
            });
        }

        if entries.is_empty() {
            return Self::empty();
        }
        Self {
            entries: Arc::from(entries),
        }
    }

    /// Concatenate two mappings; on a name collision the left side wins.
    pub fn union(&self, other: &Parameters) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        Self::from_pairs(
            self.entries
                .iter()
                .chain(other.entries.iter())
                .map(|b| (b.name.clone(), b.value.clone())),
        )
    }

    pub fn get(&self, name: &str) -> Option<&BindingValue> {
        self.entries
            .iter()
            .find(|b| keys_equal(&b.name, name))
            .map(|b| &b.value)
    }

    /// Captured text for `name`; `None` if unbound or absent.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(BindingValue::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.entries.iter()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|b| (&b.name, &b.value)))
            .finish()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn keys_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Whether a handler accepts a request, plus whatever the matcher bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingResult {
    is_match: bool,
    parameters: Parameters,
}

impl MatchingResult {
    pub fn new(is_match: bool, parameters: Parameters) -> Self {
        Self {
            is_match,
            parameters,
        }
    }

    pub fn matched(parameters: Parameters) -> Self {
        Self::new(true, parameters)
    }

    pub fn no_match() -> Self {
        Self::new(false, Parameters::empty())
    }

    pub fn is_match(&self) -> bool {
        self.is_match
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }
}

impl From<bool> for MatchingResult {
    fn from(value: bool) -> Self {
        Self::new(value, Parameters::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let params = Parameters::from_pairs([("UserId", "42")]);
        assert_eq!(params.get_str("userid"), Some("42"));
        assert_eq!(params.get_str("USERID"), Some("42"));
        assert!(params.get("other").is_none());
    }

    #[test]
    fn test_first_writer_wins() {
        let params = Parameters::from_pairs([("id", "path"), ("ID", "query")]);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get_str("id"), Some("path"));
    }

    #[test]
    fn test_union_keeps_left_side_on_collision() {
        let path = Parameters::from_pairs([("id", "1"), ("name", "a")]);
        let query = Parameters::from_pairs([("Id", "2"), ("page", "3")]);
        let merged = path.union(&query);
        let names: Vec<_> = merged.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "page"]);
        assert_eq!(merged.get_str("id"), Some("1"));
    }

    #[test]
    fn test_no_match_carries_empty_parameters() {
        let result = MatchingResult::no_match();
        assert!(!result.is_match());
        assert!(result.parameters().is_empty());

        let from_bool: MatchingResult = true.into();
        assert!(from_bool.is_match());
        assert!(from_bool.parameters().is_empty());
    }

    #[test]
    fn test_absent_binding() {
        let params = Parameters::from_pairs([("opt", BindingValue::Absent)]);
        assert!(params.contains_key("opt"));
        assert_eq!(params.get_str("opt"), None);
        assert!(params.get("opt").is_some_and(BindingValue::is_absent));
    }
}
