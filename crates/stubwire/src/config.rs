//! Declarative mock definitions.
//!
//! A mock can be described in YAML or JSON instead of code:
//!
//! ```yaml
//! server:
//!   not_found_diagnostics: true
//! services:
//!   - base_address: http://host/api
//!     apis:
//!       - template: user/{id}
//!         methods: [GET]
//!         name: get-user
//!         response:
//!           status: 200
//!           body: { "id": 1 }
//!     fallback:
//!       response:
//!         status: 503
//! ```
//!
//! A string `body` is sent as `text/plain`; any other value is sent as JSON.

use crate::error::MockError;
use crate::handler::{matchers::parse_base_address, CannedResponse, RegexMatcher, MethodFilter};
use crate::server::MockServer;
use crate::template::UriTemplate;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Server behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Put method and URI in the body of `404` responses
    pub not_found_diagnostics: bool,
    /// Record unmatched requests for later inspection
    pub diagnostics: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_address: String,
    #[serde(default)]
    pub apis: Vec<ApiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackConfig>,
}

/// One route. Exactly one of `template` and `regex` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub response: CannedResponseConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub response: CannedResponseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedResponseConfig {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

fn default_status() -> u16 {
    200
}

impl Default for CannedResponseConfig {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

impl CannedResponseConfig {
    pub fn to_canned_response(&self) -> Result<CannedResponse, MockError> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|_| MockError::Config(format!("invalid status code {}", self.status)))?;
        let mut canned = CannedResponse::new(status);

        match &self.body {
            None => {}
            Some(serde_json::Value::String(text)) => {
                canned = canned
                    .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))
                    .with_body(text.clone());
            }
            Some(value) => {
                canned = CannedResponse::json(status, value)?;
            }
        }

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| MockError::Config(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| MockError::Config(format!("invalid value for header '{}': {}", name, e)))?;
            canned = canned.with_header(name, value);
        }
        Ok(canned)
    }
}

impl MockConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MockError> {
        let config: MockConfig =
            serde_yaml::from_str(yaml).map_err(|e| MockError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, MockError> {
        let config: MockConfig =
            serde_json::from_str(json).map_err(|e| MockError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. `.json` files are read as JSON, anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MockError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Check everything registration would check, without a server.
    pub fn validate(&self) -> Result<(), MockError> {
        let mut names = HashSet::new();
        let mut claim_name = |name: &Option<String>| -> Result<(), MockError> {
            match name {
                Some(name) if !names.insert(name.clone()) => {
                    Err(MockError::DuplicateName(name.clone()))
                }
                _ => Ok(()),
            }
        };

        for service in &self.services {
            parse_base_address(&service.base_address)?;

            for api in &service.apis {
                match (&api.template, &api.regex) {
                    (Some(template), None) => {
                        UriTemplate::parse(template)?;
                    }
                    (None, Some(pattern)) => {
                        RegexMatcher::new(&service.base_address, pattern, MethodFilter::any())?;
                    }
                    _ => {
                        return Err(MockError::Config(format!(
                            "api under '{}' must set exactly one of 'template' or 'regex'",
                            service.base_address
                        )));
                    }
                }
                api.response.to_canned_response()?;
                claim_name(&api.name)?;
            }

            if let Some(fallback) = &service.fallback {
                fallback.response.to_canned_response()?;
                claim_name(&fallback.name)?;
            }
        }
        Ok(())
    }
}

impl MockServer {
    /// Build a server with every route in `config` registered.
    pub fn from_config(config: &MockConfig) -> Result<Self, MockError> {
        config.validate()?;
        let server = MockServer::with_config(config.server.clone());

        for service in &config.services {
            let clause = server.with_service(&service.base_address)?;

            for api in &service.apis {
                let route = match (&api.template, &api.regex) {
                    (Some(template), _) => clause.api(template),
                    (None, Some(pattern)) => clause.regex_api(pattern),
                    (None, None) => {
                        return Err(MockError::Config("api without template or regex".to_string()))
                    }
                };
                let route = route.methods(&api.methods);
                let route = match &api.name {
                    Some(name) => route.name(name),
                    None => route,
                };
                route.respond_with(api.response.to_canned_response()?)?;
                info!(
                    "Registered {} {} under {}",
                    if api.methods.is_empty() { "*".to_string() } else { api.methods.join(",") },
                    api.template.as_deref().or(api.regex.as_deref()).unwrap_or_default(),
                    service.base_address
                );
            }

            if let Some(fallback) = &service.fallback {
                let route = clause.fallback();
                let route = match &fallback.name {
                    Some(name) => route.name(name),
                    None => route,
                };
                route.respond_with(fallback.response.to_canned_response()?)?;
                info!("Registered fallback under {}", service.base_address);
            }
        }
        Ok(server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
server:
  not_found_diagnostics: true
services:
  - base_address: http://host/api
    apis:
      - template: user/{id}
        methods: [GET]
        name: get-user
        response:
          status: 200
          headers:
            x-mock: "yes"
          body: { "id": 1 }
      - regex: "^files/(?P<path>.+)$"
        response:
          body: plain text
    fallback:
      name: fallback
      response:
        status: 503
"#;

    #[test]
    fn test_parse_yaml() {
        let config = MockConfig::from_yaml_str(YAML).unwrap();
        assert!(config.server.not_found_diagnostics);
        assert!(!config.server.diagnostics);
        let service = &config.services[0];
        assert_eq!(service.apis.len(), 2);
        assert_eq!(service.apis[1].response.status, 200);
        assert_eq!(service.fallback.as_ref().unwrap().response.status, 503);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"services":[{"base_address":"http://host","apis":[{"template":"ping"}]}]}"#;
        let config = MockConfig::from_json_str(json).unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.services[0].apis[0].template.as_deref(), Some("ping"));
    }

    #[test]
    fn test_validate_rejects_bad_definitions() {
        let cases = [
            "services: [{base_address: /relative}]",
            "services: [{base_address: 'http://h', apis: [{}]}]",
            "services: [{base_address: 'http://h', apis: [{template: a, regex: b}]}]",
            "services: [{base_address: 'http://h', apis: [{template: 'a/{x'}]}]",
            "services: [{base_address: 'http://h', apis: [{regex: '('}]}]",
            "services: [{base_address: 'http://h', apis: [{template: a, response: {status: 1000}}]}]",
            "services: [{base_address: 'http://h', apis: [{template: a, name: n}, {template: b, name: n}]}]",
        ];
        for yaml in cases {
            assert!(MockConfig::from_yaml_str(yaml).is_err(), "{yaml}");
        }
    }

    #[test]
    fn test_canned_response_body_kinds() {
        let text = CannedResponseConfig {
            body: Some(serde_json::json!("hi")),
            ..Default::default()
        }
        .to_canned_response()
        .unwrap()
        .to_response();
        assert_eq!(text.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(text.body().as_ref(), b"hi");

        let json = CannedResponseConfig {
            status: 201,
            body: Some(serde_json::json!([1, 2])),
            ..Default::default()
        }
        .to_canned_response()
        .unwrap()
        .to_response();
        assert_eq!(json.status(), StatusCode::CREATED);
        assert_eq!(json.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(json.body().as_ref(), b"[1,2]");
    }

    #[test]
    fn test_from_config_registers_routes() {
        let config = MockConfig::from_yaml_str(YAML).unwrap();
        let server = MockServer::from_config(&config).unwrap();
        assert_eq!(server.handler_count(), 3);
        assert!(server.tracer("get-user").is_ok());
        assert!(server.tracer("fallback").is_ok());
        assert!(server.config().not_found_diagnostics);
    }
}
