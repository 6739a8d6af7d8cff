use heck::ToTitleCase;
use serde::Serialize;
use serde_json::{Value, json};

use crate::document::{Schema, SchemaType};
use crate::extract::ParsedParameter;
use crate::value_to_string;

/// Primitive kind a field is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Options,
}

/// One selectable choice of an options field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOption {
    pub name: String,
    pub value: Value,
}

/// A UI-agnostic description of one user-fillable value. Recomputed on every
/// call; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub default: Value,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

/// camelCase → Title Case with inserted spaces (`firstName` → `First Name`).
pub fn display_name(name: &str) -> String {
    name.to_title_case()
}

/// Convert an object schema into an ordered list of field descriptors, one
/// per declared property. Returns an empty list for a missing schema, a
/// non-object declared type, or an absent properties map. One flat level
/// only; nested objects and arrays stay string fields.
pub fn schema_to_fields(schema: Option<&Schema>, context_id: &str) -> Vec<FieldDescriptor> {
    let Some(schema) = schema else {
        return Vec::new();
    };
    if !schema.is_object() || schema.properties.is_empty() {
        return Vec::new();
    }

    log::debug!(
        "mapping {} properties for {context_id}",
        schema.properties.len()
    );

    schema
        .properties
        .iter()
        .map(|(name, entry)| {
            field_from_schema(name, entry.as_schema(), schema.required.contains(name))
        })
        .collect()
}

/// The same per-property mapping applied to a parameter list, using each
/// parameter's own required flag.
pub fn parameters_to_fields(params: &[ParsedParameter]) -> Vec<FieldDescriptor> {
    params
        .iter()
        .map(|p| field_from_schema(&p.name, p.schema.as_ref(), p.required))
        .collect()
}

fn field_from_schema(name: &str, schema: Option<&Schema>, required: bool) -> FieldDescriptor {
    let kind = schema.map_or(FieldKind::String, classify);

    let options = if kind == FieldKind::Options {
        schema
            .map(|s| {
                s.enum_values
                    .iter()
                    .map(|v| FieldOption {
                        name: display_name(&value_to_string(v)),
                        value: v.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let default = schema
        .and_then(|s| s.default_value.clone())
        .unwrap_or_else(|| zero_value(kind));

    FieldDescriptor {
        name: name.to_string(),
        label: display_name(name),
        kind,
        default,
        required,
        options,
    }
}

fn classify(schema: &Schema) -> FieldKind {
    if let Some(t) = &schema.schema_type {
        if t.contains(SchemaType::Integer) || t.contains(SchemaType::Number) {
            return FieldKind::Number;
        }
        if t.contains(SchemaType::Boolean) {
            return FieldKind::Boolean;
        }
    }
    if !schema.enum_values.is_empty() {
        return FieldKind::Options;
    }
    FieldKind::String
}

fn zero_value(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Number => json!(0),
        FieldKind::Boolean => json!(false),
        FieldKind::String | FieldKind::Options => json!(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_splits_camel_case() {
        assert_eq!(display_name("firstName"), "First Name");
        assert_eq!(display_name("emailAddress"), "Email Address");
        assert_eq!(display_name("id"), "Id");
    }

    #[test]
    fn enum_values_keep_original_type() {
        let schema = Schema {
            schema_type: Some(crate::document::TypeSet::Single(SchemaType::Object)),
            properties: [(
                "status".to_string(),
                crate::document::SchemaOrRef::Schema(Box::new(Schema {
                    enum_values: vec![json!("available"), json!("pending")],
                    ..Schema::default()
                })),
            )]
            .into_iter()
            .collect(),
            ..Schema::default()
        };

        let fields = schema_to_fields(Some(&schema), "test");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].kind, FieldKind::Options);
        assert_eq!(fields[0].options[0].name, "Available");
        assert_eq!(fields[0].options[0].value, json!("available"));
    }

    #[test]
    fn missing_schema_yields_no_fields() {
        assert!(schema_to_fields(None, "test").is_empty());
    }
}
