pub mod deref;
pub mod model;
pub mod validate;

pub use model::*;

use crate::error::{LoadError, ParseError};

/// Parse, validate, and fully dereference an OpenAPI document.
///
/// The input may be JSON or YAML; format is sniffed from the first
/// non-whitespace character. Grammar violations are aggregated into a single
/// `ParseError::Invalid`. The returned document contains no `$ref` nodes.
pub fn load(input: &str) -> Result<OpenApiSpec, LoadError> {
    let raw = parse_raw(input)?;

    let messages = validate::check(&raw);
    if !messages.is_empty() {
        return Err(ParseError::Invalid { messages }.into());
    }

    let spec: OpenApiSpec = serde_json::from_value(raw).map_err(ParseError::Json)?;
    validate_version(&spec)?;

    let mut resolver = deref::RefResolver::new(&spec);
    Ok(resolver.resolve_spec(&spec)?)
}

/// Parse raw spec text into a JSON value. YAML is the default; JSON is
/// detected by a leading `{`.
fn parse_raw(input: &str) -> Result<serde_json::Value, ParseError> {
    if input.trim_start().starts_with('{') {
        Ok(serde_json::from_str(input)?)
    } else {
        Ok(serde_yaml_ng::from_str(input)?)
    }
}

fn validate_version(spec: &OpenApiSpec) -> Result<(), ParseError> {
    if !spec.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(spec.openapi.clone()));
    }
    Ok(())
}
