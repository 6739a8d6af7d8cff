use oax_core::document::{self, ParameterLocation};
use oax_core::error::ExtractError;
use oax_core::extract::{self, HttpMethod};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const CONTENT_TYPES: &str = include_str!("fixtures/content-types.yaml");

#[test]
fn operations_come_out_in_document_and_method_order() {
    let spec = document::load(PETSTORE).unwrap();
    let ops = extract::extract(&spec);

    let ids: Vec<&str> = ops.iter().map(|o| o.operation_id.as_str()).collect();
    assert_eq!(
        ids,
        ["listPets", "createPet", "getPet", "updatePet", "deletePet"]
    );
    assert_eq!(ops[2].method, HttpMethod::Get);
    assert_eq!(ops[3].method, HttpMethod::Put);
    assert_eq!(ops[4].method, HttpMethod::Delete);
}

#[test]
fn path_level_parameters_merge_before_operation_level() {
    let spec = document::load(PETSTORE).unwrap();
    let ops = extract::extract(&spec);
    let get_pet = extract::find_operation(&ops, "getPet").unwrap();

    assert_eq!(get_pet.parameters.len(), 3);
    assert_eq!(get_pet.parameters[0].name, "petId");
    assert_eq!(get_pet.parameters[0].location, ParameterLocation::Path);
    assert!(get_pet.parameters[0].required);
    assert_eq!(get_pet.parameters[1].name, "verbose");
    assert_eq!(get_pet.parameters[2].name, "X-Request-Id");
    assert_eq!(get_pet.parameters[2].location, ParameterLocation::Header);

    // Operations without their own parameters still inherit the path level.
    let delete_pet = extract::find_operation(&ops, "deletePet").unwrap();
    assert_eq!(delete_pet.parameters.len(), 1);
    assert_eq!(delete_pet.parameters[0].name, "petId");
}

#[test]
fn request_body_takes_highest_priority_content_type() {
    let spec = document::load(CONTENT_TYPES).unwrap();
    let ops = extract::extract(&spec);

    // XML is declared first in the document, JSON still wins.
    let note = extract::find_operation(&ops, "createNote").unwrap();
    assert_eq!(
        note.request_body.as_ref().unwrap().content_type,
        "application/json"
    );

    let upload = extract::find_operation(&ops, "uploadFile").unwrap();
    assert_eq!(
        upload.request_body.as_ref().unwrap().content_type,
        "multipart/form-data"
    );

    let form = extract::find_operation(&ops, "submitForm").unwrap();
    assert_eq!(
        form.request_body.as_ref().unwrap().content_type,
        "application/x-www-form-urlencoded"
    );
}

#[test]
fn missing_operation_id_is_synthesized() {
    let spec = document::load(CONTENT_TYPES).unwrap();
    let ops = extract::extract(&spec);
    let ping = ops.iter().find(|o| o.path == "/ping").unwrap();
    assert_eq!(ping.operation_id, "get_ping");
    assert_eq!(ping.summary, "");
    assert_eq!(ping.description, "");
}

#[test]
fn operation_without_body_has_none() {
    let spec = document::load(PETSTORE).unwrap();
    let ops = extract::extract(&spec);
    assert!(extract::find_operation(&ops, "getPet").unwrap().request_body.is_none());
    assert!(extract::find_operation(&ops, "listPets").unwrap().request_body.is_none());
}

#[test]
fn lookup_of_unknown_operation_fails_with_id() {
    let spec = document::load(PETSTORE).unwrap();
    let ops = extract::extract(&spec);
    let err = extract::find_operation(&ops, "feedPet").unwrap_err();
    let ExtractError::OperationNotFound(id) = err;
    assert_eq!(id, "feedPet");
}
