use serde_json::Value;

/// Structural grammar check, run on the raw value before typed
/// deserialization. Collects every violation instead of stopping at the
/// first, so one failed load reports the whole list.
pub fn check(doc: &Value) -> Vec<String> {
    let mut messages = Vec::new();

    let Some(root) = doc.as_object() else {
        return vec!["document root must be an object".to_string()];
    };

    match root.get("openapi") {
        None => messages.push("missing required field: openapi".to_string()),
        Some(Value::String(_)) => {}
        Some(_) => messages.push("field 'openapi' must be a string".to_string()),
    }

    match root.get("info") {
        None => messages.push("missing required field: info".to_string()),
        Some(Value::Object(info)) => {
            for field in ["title", "version"] {
                match info.get(field) {
                    Some(Value::String(_)) => {}
                    Some(_) => messages.push(format!("field 'info.{field}' must be a string")),
                    None => messages.push(format!("missing required field: info.{field}")),
                }
            }
        }
        Some(_) => messages.push("field 'info' must be an object".to_string()),
    }

    if let Some(paths) = root.get("paths") {
        match paths.as_object() {
            Some(map) => {
                for (template, item) in map {
                    if !template.starts_with('/') {
                        messages.push(format!("path template '{template}' must start with '/'"));
                    }
                    check_path_item(template, item, &mut messages);
                }
            }
            None => messages.push("field 'paths' must be an object".to_string()),
        }
    }

    messages
}

fn check_path_item(template: &str, item: &Value, messages: &mut Vec<String>) {
    let Some(map) = item.as_object() else {
        messages.push(format!("path item '{template}' must be an object"));
        return;
    };

    if let Some(params) = map.get("parameters") {
        check_parameters(template, params, messages);
    }

    for method in ["get", "post", "put", "patch", "delete"] {
        if let Some(op) = map.get(method) {
            match op.as_object() {
                Some(op_map) => {
                    if let Some(params) = op_map.get("parameters") {
                        check_parameters(template, params, messages);
                    }
                }
                None => {
                    messages.push(format!("operation '{method} {template}' must be an object"));
                }
            }
        }
    }
}

fn check_parameters(template: &str, params: &Value, messages: &mut Vec<String>) {
    let Some(list) = params.as_array() else {
        messages.push(format!("'parameters' under '{template}' must be an array"));
        return;
    };

    for (i, entry) in list.iter().enumerate() {
        let Some(map) = entry.as_object() else {
            messages.push(format!("parameter {i} under '{template}' must be an object"));
            continue;
        };
        // Reference entries are checked after dereferencing.
        if map.contains_key("$ref") {
            continue;
        }
        if !map.get("name").is_some_and(Value::is_string) {
            messages.push(format!("parameter {i} under '{template}' is missing 'name'"));
        }
        match map.get("in").and_then(Value::as_str) {
            Some("path" | "query" | "header" | "cookie") => {}
            Some(other) => messages.push(format!(
                "parameter {i} under '{template}' has invalid location '{other}'"
            )),
            None => messages.push(format!("parameter {i} under '{template}' is missing 'in'")),
        }
    }
}
