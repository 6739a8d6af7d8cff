use std::collections::HashSet;

use super::model::{
    Components, MediaType, OpenApiSpec, Operation, Parameter, ParameterOrRef, PathItem,
    RequestBodyOrRef, ResponseOrRef, Schema, SchemaOrRef,
};
use crate::error::ResolveError;
use indexmap::IndexMap;

/// Materializes every `$ref` pointer into its target subtree, producing a
/// document with no references left. Reference cycles are rejected with
/// `ResolveError::CircularRef` instead of being chased forever.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    visiting: HashSet<String>,
}

impl<'a> RefResolver<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self {
            components: spec.components.as_ref(),
            visiting: HashSet::new(),
        }
    }

    /// Resolve the entire document, returning a copy with no `$ref` nodes.
    pub fn resolve_spec(&mut self, spec: &OpenApiSpec) -> Result<OpenApiSpec, ResolveError> {
        let mut resolved = spec.clone();

        for item in resolved.paths.values_mut() {
            self.resolve_path_item(item)?;
        }

        // Component sections are inlined too, so a schema shared between a
        // request body and a component lookup reads identically at both
        // sites, and no section keeps a leftover reference.
        if let Some(components) = &mut resolved.components {
            let schemas: Vec<(String, SchemaOrRef)> = components
                .schemas
                .iter()
                .map(|(name, entry)| (name.clone(), entry.clone()))
                .collect();
            for (name, entry) in schemas {
                let done = self.resolve_schema_or_ref(&entry)?;
                components.schemas.insert(name, done);
            }

            let parameters: Vec<(String, ParameterOrRef)> = components
                .parameters
                .iter()
                .map(|(name, entry)| (name.clone(), entry.clone()))
                .collect();
            for (name, entry) in parameters {
                let done = self.resolve_parameter_or_ref(&entry)?;
                components.parameters.insert(name, done);
            }

            let bodies: Vec<(String, RequestBodyOrRef)> = components
                .request_bodies
                .iter()
                .map(|(name, entry)| (name.clone(), entry.clone()))
                .collect();
            for (name, entry) in bodies {
                let done = self.resolve_request_body_or_ref(&entry)?;
                components.request_bodies.insert(name, done);
            }

            let responses: Vec<(String, ResponseOrRef)> = components
                .responses
                .iter()
                .map(|(name, entry)| (name.clone(), entry.clone()))
                .collect();
            for (name, entry) in responses {
                let done = self.resolve_response_or_ref(&entry)?;
                components.responses.insert(name, done);
            }
        }

        log::debug!("dereferenced document with {} path(s)", resolved.paths.len());
        Ok(resolved)
    }

    fn resolve_path_item(&mut self, item: &mut PathItem) -> Result<(), ResolveError> {
        item.parameters = item
            .parameters
            .iter()
            .map(|p| self.resolve_parameter_or_ref(p))
            .collect::<Result<Vec<_>, _>>()?;

        for op in [
            &mut item.get,
            &mut item.post,
            &mut item.put,
            &mut item.patch,
            &mut item.delete,
        ]
        .into_iter()
        .flatten()
        {
            self.resolve_operation(op)?;
        }
        Ok(())
    }

    fn resolve_operation(&mut self, op: &mut Operation) -> Result<(), ResolveError> {
        op.parameters = op
            .parameters
            .iter()
            .map(|p| self.resolve_parameter_or_ref(p))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(body) = &op.request_body {
            op.request_body = Some(self.resolve_request_body_or_ref(body)?);
        }

        let mut responses = IndexMap::new();
        for (status, resp) in &op.responses {
            responses.insert(status.clone(), self.resolve_response_or_ref(resp)?);
        }
        op.responses = responses;

        Ok(())
    }

    pub fn resolve_schema_or_ref(
        &mut self,
        schema_or_ref: &SchemaOrRef,
    ) -> Result<SchemaOrRef, ResolveError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => {
                if !self.visiting.insert(ref_path.clone()) {
                    return Err(ResolveError::CircularRef(ref_path.clone()));
                }
                let target = self.lookup_schema(ref_path)?;
                let resolved = self.resolve_schema_or_ref(&target)?;
                self.visiting.remove(ref_path);
                Ok(resolved)
            }
            SchemaOrRef::Schema(schema) => {
                Ok(SchemaOrRef::Schema(Box::new(self.resolve_schema(schema)?)))
            }
        }
    }

    fn resolve_schema(&mut self, schema: &Schema) -> Result<Schema, ResolveError> {
        let mut resolved = schema.clone();

        let mut properties = IndexMap::new();
        for (name, prop) in &schema.properties {
            properties.insert(name.clone(), self.resolve_schema_or_ref(prop)?);
        }
        resolved.properties = properties;

        if let Some(items) = &schema.items {
            resolved.items = Some(Box::new(self.resolve_schema_or_ref(items)?));
        }

        resolved.all_of = schema
            .all_of
            .iter()
            .map(|s| self.resolve_schema_or_ref(s))
            .collect::<Result<Vec<_>, _>>()?;
        resolved.one_of = schema
            .one_of
            .iter()
            .map(|s| self.resolve_schema_or_ref(s))
            .collect::<Result<Vec<_>, _>>()?;
        resolved.any_of = schema
            .any_of
            .iter()
            .map(|s| self.resolve_schema_or_ref(s))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(super::model::AdditionalProperties::Schema(s)) = &schema.additional_properties
        {
            resolved.additional_properties = Some(super::model::AdditionalProperties::Schema(
                Box::new(self.resolve_schema_or_ref(s)?),
            ));
        }

        Ok(resolved)
    }

    fn resolve_parameter_or_ref(
        &mut self,
        param: &ParameterOrRef,
    ) -> Result<ParameterOrRef, ResolveError> {
        match param {
            ParameterOrRef::Ref { ref_path } => {
                if !self.visiting.insert(ref_path.clone()) {
                    return Err(ResolveError::CircularRef(ref_path.clone()));
                }
                let target = self.lookup_parameter(ref_path)?;
                let resolved = self.resolve_parameter_or_ref(&target)?;
                self.visiting.remove(ref_path);
                Ok(resolved)
            }
            ParameterOrRef::Parameter(p) => {
                let mut resolved: Parameter = p.clone();
                if let Some(s) = &p.schema {
                    resolved.schema = Some(self.resolve_schema_or_ref(s)?);
                }
                Ok(ParameterOrRef::Parameter(resolved))
            }
        }
    }

    fn resolve_request_body_or_ref(
        &mut self,
        body: &RequestBodyOrRef,
    ) -> Result<RequestBodyOrRef, ResolveError> {
        match body {
            RequestBodyOrRef::Ref { ref_path } => {
                if !self.visiting.insert(ref_path.clone()) {
                    return Err(ResolveError::CircularRef(ref_path.clone()));
                }
                let target = self.lookup_request_body(ref_path)?;
                let resolved = self.resolve_request_body_or_ref(&target)?;
                self.visiting.remove(ref_path);
                Ok(resolved)
            }
            RequestBodyOrRef::RequestBody(rb) => {
                let mut resolved = rb.clone();
                self.resolve_media_types(&mut resolved.content)?;
                Ok(RequestBodyOrRef::RequestBody(resolved))
            }
        }
    }

    fn resolve_response_or_ref(
        &mut self,
        resp: &ResponseOrRef,
    ) -> Result<ResponseOrRef, ResolveError> {
        match resp {
            ResponseOrRef::Ref { ref_path } => {
                if !self.visiting.insert(ref_path.clone()) {
                    return Err(ResolveError::CircularRef(ref_path.clone()));
                }
                let target = self.lookup_response(ref_path)?;
                let resolved = self.resolve_response_or_ref(&target)?;
                self.visiting.remove(ref_path);
                Ok(resolved)
            }
            ResponseOrRef::Response(r) => {
                let mut resolved = r.clone();
                self.resolve_media_types(&mut resolved.content)?;
                Ok(ResponseOrRef::Response(resolved))
            }
        }
    }

    fn resolve_media_types(
        &mut self,
        content: &mut IndexMap<String, MediaType>,
    ) -> Result<(), ResolveError> {
        for media_type in content.values_mut() {
            if let Some(s) = media_type.schema.clone() {
                media_type.schema = Some(self.resolve_schema_or_ref(&s)?);
            }
        }
        Ok(())
    }

    // Lookup helpers. Each returns the raw components entry, which may
    // itself be a reference; the callers above recurse until inline, with
    // the visiting set bounding the chase.

    fn lookup_schema(&self, ref_path: &str) -> Result<SchemaOrRef, ResolveError> {
        let name = parse_ref_name(ref_path, "schemas")?;
        self.components
            .and_then(|c| c.schemas.get(name))
            .cloned()
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_parameter(&self, ref_path: &str) -> Result<ParameterOrRef, ResolveError> {
        let name = parse_ref_name(ref_path, "parameters")?;
        self.components
            .and_then(|c| c.parameters.get(name))
            .cloned()
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_request_body(&self, ref_path: &str) -> Result<RequestBodyOrRef, ResolveError> {
        let name = parse_ref_name(ref_path, "requestBodies")?;
        self.components
            .and_then(|c| c.request_bodies.get(name))
            .cloned()
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_response(&self, ref_path: &str) -> Result<ResponseOrRef, ResolveError> {
        let name = parse_ref_name(ref_path, "responses")?;
        self.components
            .and_then(|c| c.responses.get(name))
            .cloned()
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }
}

/// Parse a `$ref` path like `#/components/schemas/Pet` and extract the name.
fn parse_ref_name<'a>(ref_path: &'a str, expected_section: &str) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{expected_section}', got '{section}' in {ref_path}"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_name_parsing() {
        assert_eq!(
            parse_ref_name("#/components/schemas/Pet", "schemas").unwrap(),
            "Pet"
        );
        assert!(parse_ref_name("#/definitions/Pet", "schemas").is_err());
        assert!(parse_ref_name("#/components/parameters/Pet", "schemas").is_err());
    }
}
