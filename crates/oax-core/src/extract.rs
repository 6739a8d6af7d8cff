use crate::document::{
    OpenApiSpec, Operation, ParameterLocation, ParameterOrRef, RequestBodyOrRef, Schema,
};
use crate::error::ExtractError;

/// The five HTTP methods operations are extracted for, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Request-body content types, most preferred first. The first entry present
/// in an operation's content map wins; anything else the document offers is
/// not exposed.
pub const CONTENT_TYPE_PRIORITY: [&str; 4] = [
    "application/json",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "application/xml",
];

/// A normalized operation record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOperation {
    pub operation_id: String,
    pub method: HttpMethod,
    pub path: String,
    pub summary: String,
    pub description: String,
    pub parameters: Vec<ParsedParameter>,
    pub request_body: Option<ParsedRequestBody>,
}

/// A normalized parameter record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Schema>,
    pub description: String,
}

/// The single content entry an operation's request body is reduced to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequestBody {
    pub content_type: String,
    pub schema: Option<Schema>,
    pub required: bool,
}

/// Walk the document's path/method matrix and emit one record per defined
/// operation. Output order is paths in document order, then methods in the
/// fixed order GET, POST, PUT, PATCH, DELETE, so indices are stable across
/// calls for the same document. Never fails; malformed entries fall back to
/// defaults.
pub fn extract(spec: &OpenApiSpec) -> Vec<ParsedOperation> {
    let mut operations = Vec::new();

    for (path, item) in &spec.paths {
        let path_params = convert_parameters(&item.parameters);

        let slots = [
            (HttpMethod::Get, item.get.as_ref()),
            (HttpMethod::Post, item.post.as_ref()),
            (HttpMethod::Put, item.put.as_ref()),
            (HttpMethod::Patch, item.patch.as_ref()),
            (HttpMethod::Delete, item.delete.as_ref()),
        ];
        for (method, op) in slots {
            if let Some(op) = op {
                operations.push(parse_operation(method, path, op, &path_params));
            }
        }
    }

    log::debug!("extracted {} operation(s)", operations.len());
    operations
}

/// Find an operation by id, first match wins.
pub fn find_operation<'a>(
    operations: &'a [ParsedOperation],
    operation_id: &str,
) -> Result<&'a ParsedOperation, ExtractError> {
    operations
        .iter()
        .find(|op| op.operation_id == operation_id)
        .ok_or_else(|| ExtractError::OperationNotFound(operation_id.to_string()))
}

fn parse_operation(
    method: HttpMethod,
    path: &str,
    op: &Operation,
    path_params: &[ParsedParameter],
) -> ParsedOperation {
    let operation_id = op
        .operation_id
        .clone()
        .unwrap_or_else(|| synthesize_operation_id(method, path));

    // Path-level parameters first, operation-level after, no dedup: lookups
    // that take the later entry resolve name collisions to the operation's
    // more specific definition.
    let mut parameters = path_params.to_vec();
    parameters.extend(convert_parameters(&op.parameters));

    let request_body = op.request_body.as_ref().and_then(parse_request_body);

    ParsedOperation {
        operation_id,
        method,
        path: path.to_string(),
        summary: op.summary.clone().unwrap_or_default(),
        description: op.description.clone().unwrap_or_default(),
        parameters,
        request_body,
    }
}

fn convert_parameters(params: &[ParameterOrRef]) -> Vec<ParsedParameter> {
    params
        .iter()
        .filter_map(|entry| match entry {
            ParameterOrRef::Parameter(p) => Some(ParsedParameter {
                name: p.name.clone(),
                location: p.location,
                required: p.required,
                schema: p.schema.as_ref().and_then(|s| s.as_schema().cloned()),
                description: p.description.clone().unwrap_or_default(),
            }),
            // Bare references should not survive dereferencing; drop them.
            ParameterOrRef::Ref { .. } => None,
        })
        .collect()
}

fn parse_request_body(body: &RequestBodyOrRef) -> Option<ParsedRequestBody> {
    let RequestBodyOrRef::RequestBody(rb) = body else {
        return None;
    };

    let content_type = CONTENT_TYPE_PRIORITY
        .iter()
        .find(|ct| rb.content.contains_key(**ct))?;
    let media = &rb.content[*content_type];

    Some(ParsedRequestBody {
        content_type: content_type.to_string(),
        schema: media.schema.as_ref().and_then(|s| s.as_schema().cloned()),
        required: rb.required,
    })
}

/// Deterministic fallback id for operations without an `operationId`:
/// lowercased method, `_`, then the path with the leading slash trimmed,
/// inner slashes replaced by `_`, and placeholder braces stripped.
pub fn synthesize_operation_id(method: HttpMethod, path: &str) -> String {
    let tail: String = path
        .trim_start_matches('/')
        .chars()
        .filter(|c| !matches!(c, '{' | '}'))
        .map(|c| if c == '/' { '_' } else { c })
        .collect();
    format!("{}_{}", method.as_str().to_lowercase(), tail)
}
