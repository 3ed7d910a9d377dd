//! A single template token: either a literal or a `{name}` variable.

use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplateElement {
    value: String,
    is_variable: bool,
}

impl UriTemplateElement {
    /// Classify `token`. A leading `{` commits the token to variable syntax.
    pub fn parse(token: &str) -> Result<Self, TemplateError> {
        match variable_name(token)? {
            Some(name) => Ok(Self {
                value: name.to_string(),
                is_variable: true,
            }),
            None => Ok(Self {
                value: token.to_string(),
                is_variable: false,
            }),
        }
    }

    /// Literal text, or the variable name for a variable.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_variable(&self) -> bool {
        self.is_variable
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.is_variable || literal_eq(&self.value, candidate)
    }
}

fn variable_name(token: &str) -> Result<Option<&str>, TemplateError> {
    if !token.starts_with('{') {
        return Ok(None);
    }
    if token.chars().count() < 3 {
        return Err(TemplateError::InvalidVariable(token.to_string()));
    }
    if !token.ends_with('}') {
        return Err(TemplateError::UnterminatedVariable(token.to_string()));
    }

    let name = &token[1..token.len() - 1];
    if name.contains(['{', '}']) {
        return Err(TemplateError::ReservedCharacter(token.to_string()));
    }
    Ok(Some(name))
}

pub(crate) fn literal_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
