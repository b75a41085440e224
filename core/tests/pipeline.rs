use oasir_core::config::EnumsMode;
use oasir_core::ir::{BodyPagination, HttpMethod, LogicalOperator, SchemaType};
use oasir_core::{compile_document, AppError, CompiledDocument, DiagnosticKind, ParserConfig};
use pretty_assertions::assert_eq;
use serde_json::Value;

fn compile_yaml(yaml: &str, config: &ParserConfig) -> CompiledDocument {
    let root: Value = serde_yaml::from_str(yaml).unwrap();
    compile_document(root, config).unwrap()
}

#[test]
fn test_cyclic_schemas_terminate() {
    let compiled = compile_yaml(
        r##"
openapi: 3.1.0
info: {title: Cycles, version: "1"}
paths: {}
components:
  schemas:
    Node:
      type: object
      properties:
        next: {$ref: "#/components/schemas/Node"}
        tree: {$ref: "#/components/schemas/Tree"}
    Tree:
      type: object
      properties:
        children:
          type: array
          items: {$ref: "#/components/schemas/Node"}
"##,
        &ParserConfig::default(),
    );
    let node = &compiled.ir.components.schemas["Node"];
    assert_eq!(
        node.properties["next"].reference.as_deref(),
        Some("#/components/schemas/Node")
    );
    let tree = &compiled.ir.components.schemas["Tree"];
    assert!(tree.properties["children"].is(SchemaType::Array));
}

#[test]
fn test_single_branch_composition_collapses() {
    let compiled = compile_yaml(
        r##"
openapi: 3.0.3
info: {title: Compose, version: "1"}
paths: {}
components:
  schemas:
    Pet: {type: object, properties: {name: {type: string}}}
    Wrapped:
      allOf:
        - $ref: "#/components/schemas/Pet"
    Either:
      oneOf:
        - type: string
"##,
        &ParserConfig::default(),
    );
    let schemas = &compiled.ir.components.schemas;
    assert_eq!(schemas["Wrapped"].reference.as_deref(), Some("#/components/schemas/Pet"));
    assert!(schemas["Wrapped"].logical_operator.is_none());
    assert!(schemas["Either"].is(SchemaType::String));
}

#[test]
fn test_nullability_parity_across_documents() {
    let v30 = compile_yaml(
        r##"
openapi: 3.0.3
info: {title: Null, version: "1"}
paths: {}
components:
  schemas:
    Name: {type: string, nullable: true}
"##,
        &ParserConfig::default(),
    );
    let v31 = compile_yaml(
        r##"
openapi: 3.1.0
info: {title: Null, version: "1"}
paths: {}
components:
  schemas:
    Name: {type: [string, "null"]}
"##,
        &ParserConfig::default(),
    );
    let a = &v30.ir.components.schemas["Name"];
    let b = &v31.ir.components.schemas["Name"];
    assert_eq!(a, b);
    assert_eq!(b.logical_operator, Some(LogicalOperator::Or));
}

const PETS: &str = r##"
openapi: 3.0.3
info: {title: Pets, version: "1"}
paths:
  /pets:
    get:
      operationId: listPets
      parameters:
        - {name: page, in: query, schema: {type: integer}}
        - {name: status, in: query, schema: {type: string, enum: [sold, available]}}
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: {$ref: "#/components/schemas/Pet"}
    post:
      operationId: createPet
      requestBody:
        required: true
        content:
          application/json:
            schema: {$ref: "#/components/schemas/Pet"}
      responses:
        "201":
          description: created
          content:
            application/json:
              schema: {$ref: "#/components/schemas/Pet"}
components:
  schemas:
    Pet:
      type: object
      required: [id, name]
      properties:
        id: {type: integer, readOnly: true}
        name: {type: string}
        password: {type: string, writeOnly: true}
        status: {type: string, enum: [available, sold]}
"##;

#[test]
fn test_read_write_split_end_to_end() {
    let compiled = compile_yaml(PETS, &ParserConfig::default());
    let schemas = &compiled.ir.components.schemas;
    assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Pet", "PetWritable"]);
    assert!(!schemas["Pet"].properties.contains_key("password"));
    assert!(!schemas["PetWritable"].properties.contains_key("id"));
    assert_eq!(schemas["PetWritable"].required, vec!["name".to_string()]);

    let create = compiled.ir.operation("/pets", HttpMethod::Post).unwrap();
    let body = create.body.as_ref().unwrap();
    assert!(body.required);
    assert_eq!(body.schema.reference.as_deref(), Some("#/components/schemas/PetWritable"));
    assert_eq!(
        create.responses["201"].schema.reference.as_deref(),
        Some("#/components/schemas/Pet")
    );

    let list = compiled.ir.operation("/pets", HttpMethod::Get).unwrap();
    assert_eq!(
        list.responses["200"].schema.items[0].reference.as_deref(),
        Some("#/components/schemas/Pet")
    );
}

#[test]
fn test_enum_promotion_dedups_and_compiles_to_refs() {
    let mut config = ParserConfig::default();
    config.transforms.enums.mode = EnumsMode::Root;
    config.transforms.read_write.enabled = false;
    let compiled = compile_yaml(PETS, &config);

    let schemas = &compiled.ir.components.schemas;
    assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Pet", "StatusEnum"]);
    assert_eq!(
        schemas["Pet"].properties["status"].reference.as_deref(),
        Some("#/components/schemas/StatusEnum")
    );
    let list = compiled.ir.operation("/pets", HttpMethod::Get).unwrap();
    assert_eq!(
        list.parameters.query["status"].schema.reference.as_deref(),
        Some("#/components/schemas/StatusEnum")
    );
    assert!(schemas["StatusEnum"].is(SchemaType::Enum));
}

#[test]
fn test_enum_root_then_inline_round_trip() {
    let mut config = ParserConfig::default();
    config.transforms.read_write.enabled = false;

    config.transforms.enums.mode = EnumsMode::Root;
    let promoted = compile_yaml(PETS, &config);
    config.transforms.enums.mode = EnumsMode::Inline;
    let restored = compile_document(promoted.document, &config).unwrap();

    let schemas = &restored.ir.components.schemas;
    assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Pet"]);
    let status = &schemas["Pet"].properties["status"];
    assert!(status.reference.is_none());
    assert!(status.is(SchemaType::Enum));
    assert_eq!(
        restored.document["components"]["schemas"]["Pet"]["properties"]["status"]["enum"],
        serde_json::json!(["sold", "available"])
    );
}

#[test]
fn test_pagination_detection_depth() {
    let compiled = compile_yaml(
        r##"
openapi: 3.1.0
info: {title: Paging, version: "1"}
paths:
  /pets:
    get:
      parameters:
        - {name: page, in: query, schema: {type: integer}}
        - {name: limit, in: query, schema: {type: integer}}
      responses: {"200": {description: ok}}
  /search:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                query: {type: string}
                page: {type: integer}
      responses: {"200": {description: ok}}
  /deep:
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                paging:
                  type: object
                  properties:
                    page: {type: integer}
      responses: {"200": {description: ok}}
"##,
        &ParserConfig::default(),
    );
    let ir = &compiled.ir;
    let list = ir.operation("/pets", HttpMethod::Get).unwrap();
    assert!(list.parameters.query["page"].pagination);
    assert!(!list.parameters.query["limit"].pagination);

    let search = ir.operation("/search", HttpMethod::Post).unwrap();
    assert_eq!(
        search.body.as_ref().unwrap().pagination,
        Some(BodyPagination::Field("page".into()))
    );
    let deep = ir.operation("/deep", HttpMethod::Post).unwrap();
    assert_eq!(deep.body.as_ref().unwrap().pagination, None);
}

#[test]
fn test_duplicate_operation_ids_are_diagnosed() {
    let compiled = compile_yaml(
        r##"
swagger: "2.0"
info: {title: Dupes, version: "1"}
paths:
  /cats:
    get: {operationId: list, responses: {"200": {description: ok}}}
  /dogs:
    get: {operationId: list, responses: {"200": {description: ok}}}
"##,
        &ParserConfig::default(),
    );
    let ids: Vec<&str> = compiled.ir.operations().map(|op| op.id.as_str()).collect();
    assert_eq!(ids, vec!["list", "list"]);
    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::DuplicateOperationId);
    assert_eq!(compiled.diagnostics[0].location, "GET /dogs");
}

#[test]
fn test_unresolved_reference_is_fatal() {
    let root: Value = serde_yaml::from_str(
        r##"
openapi: 3.0.3
info: {title: Broken, version: "1"}
paths: {}
components:
  schemas:
    Pet: {$ref: "#/components/schemas/Missing"}
"##,
    )
    .unwrap();
    let err = compile_document(root, &ParserConfig::default()).unwrap_err();
    match err {
        AppError::UnresolvedReference { pointer } => assert_eq!(pointer, "#/components/schemas/Missing"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_version_is_rejected() {
    let root: Value = serde_yaml::from_str("openapi: 4.0.0\npaths: {}\n").unwrap();
    let err = compile_document(root, &ParserConfig::default()).unwrap_err();
    assert!(matches!(err, AppError::UnsupportedDocument(_)));
}
