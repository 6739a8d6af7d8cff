use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{OpenApiSpec, ParameterLocation};
use crate::error::BuildError;
use crate::extract::ParsedOperation;
use crate::value_to_string;

/// Escapes everything but unreserved characters when substituting a value
/// into a path template, so spaces become `%20` rather than `+`.
const PATH_COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const DEFAULT_HEADER_KEY_NAME: &str = "X-API-Key";
const DEFAULT_QUERY_KEY_NAME: &str = "api_key";

/// Where an API key is injected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    #[default]
    Header,
    Query,
}

/// Authentication configuration. Internally tagged on `authType` so the
/// serialized form matches the external credential-store shape. Values are
/// secrets and must never reach log output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "authType", rename_all = "camelCase")]
pub enum Credentials {
    #[default]
    None,
    ApiKey {
        #[serde(rename = "apiKey")]
        key: String,

        #[serde(rename = "apiKeyLocation", default)]
        location: ApiKeyLocation,

        #[serde(rename = "apiKeyName", default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Bearer {
        #[serde(rename = "bearerToken")]
        token: String,
    },
    Basic { username: String, password: String },
}

/// The fully assembled, transport-ready representation of one HTTP request.
/// Immutable and single-use; no network call happens here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescription {
    pub method: String,
    pub url: String,
    pub headers: IndexMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<IndexMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

/// Resolve the effective base URL: a non-empty override wins, else the
/// document's first server entry, else empty (the caller owns the fallout of
/// a relative URL).
pub fn resolve_base_url(spec: &OpenApiSpec, override_url: Option<&str>) -> String {
    if let Some(url) = override_url.filter(|u| !u.is_empty()) {
        return url.to_string();
    }
    spec.servers.first().map(|s| s.url.clone()).unwrap_or_default()
}

/// Assembles a `RequestDescription` from one operation, a base URL, a bag of
/// parameter values, an optional body payload, and optional credentials.
pub struct RequestBuilder<'a> {
    operation: &'a ParsedOperation,
    base_url: &'a str,
    values: Option<&'a IndexMap<String, Value>>,
    body: Option<&'a Value>,
    binary_property: Option<&'a str>,
    credentials: Option<&'a Credentials>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(operation: &'a ParsedOperation, base_url: &'a str) -> Self {
        Self {
            operation,
            base_url,
            values: None,
            body: None,
            binary_property: None,
            credentials: None,
        }
    }

    pub fn values(mut self, values: &'a IndexMap<String, Value>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn body(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn binary_property(mut self, name: &'a str) -> Self {
        self.binary_property = Some(name);
        self
    }

    pub fn credentials(mut self, credentials: &'a Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn build(self) -> Result<RequestDescription, BuildError> {
        let url = self.substituted_url()?;
        let query = self.query_map();
        let headers = self.header_map();
        let (body, json) = self.body_payload();

        log::debug!("built {} {url}", self.operation.method.as_str());

        Ok(RequestDescription {
            method: self.operation.method.as_str().to_string(),
            url,
            headers,
            query,
            body,
            json,
        })
    }

    /// A value counts as supplied when the key exists and is not null.
    fn value_of(&self, name: &str) -> Option<&Value> {
        self.values
            .and_then(|m| m.get(name))
            .filter(|v| !v.is_null())
    }

    fn substituted_url(&self) -> Result<String, BuildError> {
        let mut url = format!("{}{}", self.base_url, self.operation.path);

        for param in &self.operation.parameters {
            if param.location != ParameterLocation::Path {
                continue;
            }
            match self.value_of(&param.name) {
                Some(value) => {
                    let encoded =
                        utf8_percent_encode(&value_to_string(value), PATH_COMPONENT_ENCODE_SET)
                            .to_string();
                    url = url.replace(&format!("{{{}}}", param.name), &encoded);
                }
                None if param.required => {
                    return Err(BuildError::MissingParameter(param.name.clone()));
                }
                // Optional and unsupplied: the placeholder stays literal.
                None => {}
            }
        }

        Ok(url)
    }

    fn query_map(&self) -> Option<IndexMap<String, String>> {
        let mut query = IndexMap::new();

        for param in &self.operation.parameters {
            if param.location != ParameterLocation::Query {
                continue;
            }
            if let Some(value) = self.value_of(&param.name) {
                let text = value_to_string(value);
                if !text.is_empty() {
                    query.insert(param.name.clone(), text);
                }
            }
        }

        // API-key query auth merges in after the declared parameters, in
        // addition to them, never instead of them.
        if let Some(Credentials::ApiKey {
            key,
            location: ApiKeyLocation::Query,
            name,
        }) = self.credentials
        {
            let name = name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_QUERY_KEY_NAME);
            query.insert(name.to_string(), key.clone());
        }

        (!query.is_empty()).then_some(query)
    }

    fn header_map(&self) -> IndexMap<String, String> {
        let mut headers = IndexMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());

        if let Some(body) = &self.operation.request_body {
            headers.insert("Content-Type".to_string(), body.content_type.clone());
        }

        for param in &self.operation.parameters {
            match param.location {
                ParameterLocation::Header => {
                    if let Some(value) = self.value_of(&param.name) {
                        let text = value_to_string(value);
                        if !text.is_empty() {
                            headers.insert(param.name.clone(), text);
                        }
                    }
                }
                ParameterLocation::Cookie => {
                    log::debug!("cookie parameter '{}' not supported, ignored", param.name);
                }
                ParameterLocation::Path | ParameterLocation::Query => {}
            }
        }

        match self.credentials {
            Some(Credentials::ApiKey {
                key,
                location: ApiKeyLocation::Header,
                name,
            }) => {
                let name = name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_HEADER_KEY_NAME);
                headers.insert(name.to_string(), key.clone());
            }
            Some(Credentials::Bearer { token }) => {
                headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            }
            Some(Credentials::Basic { username, password }) => {
                let encoded = BASE64.encode(format!("{username}:{password}"));
                headers.insert("Authorization".to_string(), format!("Basic {encoded}"));
            }
            Some(Credentials::ApiKey {
                location: ApiKeyLocation::Query,
                ..
            })
            | Some(Credentials::None)
            | None => {}
        }

        headers
    }

    /// Body dispatch on the operation's declared content type. Returns the
    /// payload plus the JSON flag: `Some(true)` for JSON mappings,
    /// `Some(false)` for multipart carrying a binary property, absent
    /// otherwise.
    fn body_payload(&self) -> (Option<Value>, Option<bool>) {
        let Some(request_body) = &self.operation.request_body else {
            return (None, None);
        };
        let Some(payload) = self.body else {
            return (None, None);
        };

        match request_body.content_type.as_str() {
            "application/json" => match payload {
                Value::Object(map) if !map.is_empty() => (Some(payload.clone()), Some(true)),
                _ => (None, None),
            },
            "application/xml" => match payload {
                Value::String(s) if !s.is_empty() => (Some(payload.clone()), None),
                _ => (None, None),
            },
            "application/x-www-form-urlencoded" => match payload {
                // Form encoding itself happens in the transport.
                Value::Object(map) if !map.is_empty() => (Some(payload.clone()), None),
                _ => (None, None),
            },
            "multipart/form-data" => match payload {
                Value::Object(_) => {
                    let json = self.binary_property.is_some().then_some(false);
                    (Some(payload.clone()), json)
                }
                _ => (None, None),
            },
            _ => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{HttpMethod, ParsedOperation, ParsedParameter};
    use serde_json::json;

    fn op_with_path_param(path: &str, name: &str, required: bool) -> ParsedOperation {
        ParsedOperation {
            operation_id: "test".to_string(),
            method: HttpMethod::Get,
            path: path.to_string(),
            summary: String::new(),
            description: String::new(),
            parameters: vec![ParsedParameter {
                name: name.to_string(),
                location: ParameterLocation::Path,
                required,
                schema: None,
                description: String::new(),
            }],
            request_body: None,
        }
    }

    #[test]
    fn path_values_are_percent_encoded() {
        let op = op_with_path_param("/items/{itemId}", "itemId", true);
        let values: IndexMap<String, Value> =
            [("itemId".to_string(), json!("hello world"))].into_iter().collect();

        let req = RequestBuilder::new(&op, "https://api.example.com")
            .values(&values)
            .build()
            .unwrap();
        assert_eq!(req.url, "https://api.example.com/items/hello%20world");
    }

    #[test]
    fn missing_required_path_value_fails() {
        let op = op_with_path_param("/items/{itemId}", "itemId", true);
        let err = RequestBuilder::new(&op, "https://api.example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingParameter(name) if name == "itemId"));
    }

    #[test]
    fn basic_auth_header_is_base64() {
        let op = op_with_path_param("/items/{itemId}", "itemId", false);
        let creds = Credentials::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        let req = RequestBuilder::new(&op, "https://api.example.com")
            .credentials(&creds)
            .build()
            .unwrap();
        assert_eq!(
            req.headers.get("Authorization").map(String::as_str),
            Some("Basic dXNlcjpwYXNz")
        );
    }
}
