use oax_core::document::{self, RequestBodyOrRef, SchemaOrRef};
use oax_core::error::{LoadError, ParseError, ResolveError};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const CYCLIC: &str = include_str!("fixtures/cyclic.yaml");

#[test]
fn load_petstore_yaml() {
    let spec = document::load(PETSTORE).expect("should load petstore");
    assert_eq!(spec.openapi, "3.0.3");
    assert_eq!(spec.info.title, "Petstore");
    assert_eq!(spec.paths.len(), 2);
    assert_eq!(spec.servers[0].url, "https://api.example.com/v1");
}

#[test]
fn load_json_document() {
    let input = r#"{
        "openapi": "3.0.0",
        "info": {"title": "J", "version": "1"},
        "paths": {
            "/x": {"get": {"operationId": "getX", "responses": {"200": {"description": "ok"}}}}
        }
    }"#;
    let spec = document::load(input).expect("should load JSON spec");
    assert_eq!(spec.info.title, "J");
    assert!(spec.paths.contains_key("/x"));
}

#[test]
fn no_reference_survives_loading() {
    let spec = document::load(PETSTORE).unwrap();
    let serialized = serde_json::to_string(&spec).unwrap();
    assert!(
        !serialized.contains("$ref"),
        "loaded document still contains a reference"
    );
}

#[test]
fn shared_schema_is_inlined_identically() {
    let spec = document::load(PETSTORE).unwrap();

    let pet_component = spec
        .components
        .as_ref()
        .unwrap()
        .schemas
        .get("Pet")
        .and_then(SchemaOrRef::as_schema)
        .expect("Pet component should be inline");

    let put = spec.paths["/pets/{petId}"].put.as_ref().unwrap();
    let RequestBodyOrRef::RequestBody(body) = put.request_body.as_ref().unwrap() else {
        panic!("request body should be inline after load");
    };
    let body_schema = body.content["application/json"]
        .schema
        .as_ref()
        .and_then(SchemaOrRef::as_schema)
        .expect("body schema should be inline after load");

    assert_eq!(body_schema, pet_component);
    assert_eq!(body_schema.properties.len(), 4);
    assert!(body_schema.required.contains(&"name".to_string()));
}

#[test]
fn path_level_parameter_reference_is_resolved() {
    let spec = document::load(PETSTORE).unwrap();
    let item = &spec.paths["/pets/{petId}"];
    match &item.parameters[0] {
        oax_core::document::ParameterOrRef::Parameter(p) => {
            assert_eq!(p.name, "petId");
            assert!(p.required);
        }
        _ => panic!("path-level parameter should be inline after load"),
    }
}

#[test]
fn unsupported_version_is_rejected() {
    let input = r#"
openapi: "2.0.0"
info:
  title: Old
  version: "1.0"
paths: {}
"#;
    let err = document::load(input).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Parse(ParseError::UnsupportedVersion(v)) if v == "2.0.0"
    ));
}

#[test]
fn grammar_violations_are_aggregated() {
    let input = r#"
info:
  title: 42
paths:
  pets:
    get:
      parameters:
        - in: nowhere
"#;
    let err = document::load(input).unwrap_err();
    let LoadError::Parse(ParseError::Invalid { messages }) = err else {
        panic!("expected aggregated validation failure");
    };
    assert!(messages.len() >= 4, "got: {messages:?}");
    assert!(messages.iter().any(|m| m.contains("openapi")));
    assert!(messages.iter().any(|m| m.contains("start with '/'")));
}

#[test]
fn cyclic_reference_fails_loading() {
    let err = document::load(CYCLIC).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Resolve(ResolveError::CircularRef(path)) if path.contains("Node")
    ));
}

#[test]
fn unknown_reference_target_fails_loading() {
    let input = r##"
openapi: "3.0.0"
info:
  title: Broken
  version: "1.0"
paths:
  /a:
    get:
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Missing"
"##;
    let err = document::load(input).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Resolve(ResolveError::RefTargetNotFound(_))
    ));
}
