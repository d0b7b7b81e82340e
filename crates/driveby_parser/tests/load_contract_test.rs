use driveby_core::{ContractLoadError, HttpMethod, ParameterLocation, SchemaType};
use driveby_parser::load_contract;
use pretty_assertions::assert_eq;
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.2.0
servers:
  - url: http://petstore.local/api
paths:
  /pets:
    title: Pets collection
    get:
      summary: List pets
      parameters:
        - name: limit
          in: query
          schema:
            type: [integer, "null"]
            minimum: 1
            exclusiveMinimum: 1
      responses:
        200:
          description: A list of pets
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Pet'
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pet'
      responses:
        201:
          description: Created
        default:
          $ref: '#/components/responses/Error'
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        schema:
          type: string
          format: uuid
    get:
      responses:
        200:
          description: One pet
        404:
          $ref: '#/components/responses/Error'
components:
  schemas:
    Pet:
      type: object
      required: [id, name]
      properties:
        id:
          type: string
          format: uuid
        name:
          type: string
        parent:
          $ref: '#/components/schemas/Pet'
  responses:
    Error:
      description: Something went wrong
  securitySchemes:
    bearerAuth:
      type: http
      scheme: bearer
security:
  - bearerAuth: []
"#;

fn write_fixture(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_load_petstore_from_file() {
    let file = write_fixture(PETSTORE, ".yaml");
    let loaded = load_contract(file.path().to_str().unwrap()).await.unwrap();
    let model = &loaded.model;

    assert_eq!(model.info.title, "Petstore");
    assert_eq!(model.operation_count(), 3);
    assert_eq!(model.paths[0].path, "/pets");
    assert_eq!(model.paths[1].path, "/pets/{petId}");
    assert_eq!(model.servers, vec!["http://petstore.local/api"]);
    assert!(model.security_schemes.contains_key("bearerAuth"));

    let list = model.find_operation(HttpMethod::Get, "/pets").unwrap();
    let limit = &list.parameters[0];
    assert_eq!(limit.location, ParameterLocation::Query);
    let limit_schema = limit.schema.as_ref().unwrap();
    assert_eq!(limit_schema.schema_type, Some(SchemaType::Integer));
    assert!(limit_schema.nullable);
    assert!(limit_schema.exclusive_minimum);

    let items = list.responses["200"].content["application/json"]
        .schema
        .as_ref()
        .unwrap()
        .items
        .as_ref()
        .unwrap();
    assert_eq!(items.required, vec!["id", "name"]);
    assert_eq!(
        items.properties["parent"].recursive_ref.as_deref(),
        Some("#/components/schemas/Pet")
    );

    let create = model.find_operation(HttpMethod::Post, "/pets").unwrap();
    assert_eq!(
        create.responses["default"].description.as_deref(),
        Some("Something went wrong")
    );

    let get = model.find_operation(HttpMethod::Get, "/pets/{petId}").unwrap();
    assert_eq!(get.parameters.len(), 1);
    assert!(get.documents_status(404));

    assert!(loaded.notes.iter().any(|note| note.contains("title")));
}

#[tokio::test]
async fn test_load_from_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openapi.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PETSTORE))
        .mount(&server)
        .await;

    let url = format!("{}/openapi.yaml", server.uri());
    let loaded = load_contract(&url).await.unwrap();
    assert_eq!(loaded.model.source, url);
    assert_eq!(loaded.model.operation_count(), 3);
}

#[tokio::test]
async fn test_non_ok_status_is_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = load_contract(&format!("{}/missing.json", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ContractLoadError::Unreachable { .. }));
}

#[tokio::test]
async fn test_unresolved_reference_is_fatal() {
    let broken = PETSTORE.replace(
        "'#/components/responses/Error'",
        "'#/components/responses/Missing'",
    );
    let file = write_fixture(&broken, ".yaml");
    let err = load_contract(file.path().to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ContractLoadError::UnresolvedReference { reference } if reference == "#/components/responses/Missing"
    ));
}

#[tokio::test]
async fn test_contract_without_operations() {
    let file = write_fixture(
        r#"{"openapi": "3.0.0", "info": {"title": "Empty", "version": "1"}, "paths": {}}"#,
        ".json",
    );
    let err = load_contract(file.path().to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ContractLoadError::NoOperations));
}
