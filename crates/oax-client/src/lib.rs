//! One-shot HTTP transport for request descriptions.
//!
//! The core builds transport-ready descriptions; this crate performs them.
//! One attempt per call, no retry, no backoff, no caching. Batch
//! orchestration belongs to the caller.

pub mod error;

use oax_core::request::RequestDescription;
use reqwest::Method;
use serde_json::Value;

pub use error::TransportError;

/// Blocking HTTP transport.
pub struct Transport {
    client: reqwest::blocking::Client,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum BodyMode {
    None,
    Json,
    Form,
    Multipart,
    Raw,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch spec text from a URL. The body comes back as plain text no
    /// matter what content type the server declares.
    pub fn fetch_spec(&self, url: &str) -> Result<String, TransportError> {
        log::debug!("fetching spec from {url}");
        let response = self.client.get(url).send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(TransportError::Http { status, body: text });
        }
        Ok(text)
    }

    /// Perform one built request. The response is parsed as JSON, falling
    /// back to a plain string value for non-JSON payloads. Non-2xx statuses
    /// surface as `TransportError::Http`.
    pub fn execute(&self, request: &RequestDescription) -> Result<Value, TransportError> {
        let method: Method = request
            .method
            .parse()
            .map_err(|_| TransportError::InvalidMethod(request.method.clone()))?;

        let mode = body_mode(request);
        let mut builder = self.client.request(method, &request.url);

        if let Some(query) = &request.query {
            let pairs: Vec<(&str, &str)> = query
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            builder = builder.query(&pairs);
        }

        for (name, value) in &request.headers {
            // reqwest's encoders own the Content-Type for these modes; the
            // multipart one in particular needs its boundary attached.
            if name.eq_ignore_ascii_case("content-type")
                && matches!(mode, BodyMode::Json | BodyMode::Form | BodyMode::Multipart)
            {
                continue;
            }
            builder = builder.header(name, value);
        }

        builder = attach_body(builder, request, mode)?;

        log::debug!("{} {}", request.method, request.url);
        let response = builder.send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(TransportError::Http { status, body: text });
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

fn body_mode(request: &RequestDescription) -> BodyMode {
    let Some(body) = &request.body else {
        return BodyMode::None;
    };
    if request.json == Some(true) {
        return BodyMode::Json;
    }
    let content_type = request
        .headers
        .get("Content-Type")
        .map(String::as_str)
        .unwrap_or("");
    match (content_type, body) {
        ("application/x-www-form-urlencoded", Value::Object(_)) => BodyMode::Form,
        ("multipart/form-data", Value::Object(_)) => BodyMode::Multipart,
        _ => BodyMode::Raw,
    }
}

fn attach_body(
    builder: reqwest::blocking::RequestBuilder,
    request: &RequestDescription,
    mode: BodyMode,
) -> Result<reqwest::blocking::RequestBuilder, TransportError> {
    let Some(body) = &request.body else {
        return Ok(builder);
    };

    match mode {
        BodyMode::None => Ok(builder),
        BodyMode::Json => Ok(builder.json(body)),
        BodyMode::Form => {
            let Value::Object(map) = body else {
                return Ok(builder);
            };
            let pairs: Vec<(String, String)> = map
                .iter()
                .map(|(k, v)| (k.clone(), text_value(v)))
                .collect();
            Ok(builder.form(&pairs))
        }
        BodyMode::Multipart => {
            let Value::Object(map) = body else {
                return Ok(builder);
            };
            let mut form = reqwest::blocking::multipart::Form::new();
            for (k, v) in map {
                form = form.text(k.clone(), text_value(v));
            }
            Ok(builder.multipart(form))
        }
        BodyMode::Raw => match body {
            Value::String(s) => Ok(builder.body(s.clone())),
            other => Ok(builder.body(other.to_string())),
        },
    }
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
