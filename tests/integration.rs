// ==============================================================================
// Integration Tests: Compile Catalogs and Compare Against Expected IDL Output
// ==============================================================================
//
// Fixture catalogs under `tests/fixtures/` are loaded through the public API
// and compiled from their own roots. Whole documents are compared byte for
// byte against golden `.proto` files; the small scenarios further down use
// inline catalogs and check single blocks.

mod common;

use common::{block_names, compile_fixture, config_for, golden, load_fixture};
use pretty_assertions::assert_eq;
use protoschema::{
    FieldKind, ProtoError, ProtoType, ScalarType, SchemaCompiler, SchemaConfig, SchemaOutput,
    parse_catalog_str, resolve_roots,
};

/// Compile an inline catalog from its `roots` with default configuration.
fn compile_str(json: &str) -> SchemaOutput {
    let loaded = parse_catalog_str(json, "inline.json").expect("inline catalog loads");
    let roots = resolve_roots(&loaded.catalog, &loaded.roots).expect("roots resolve");
    SchemaCompiler::with_roots(&loaded.catalog, config_for(&loaded), roots)
        .expect("non-empty roots")
        .into_output()
}

/// The lines of one block, without indentation, braces included.
fn block<'t>(text: &'t str, header: &str) -> Vec<&'t str> {
    let start = text
        .find(header)
        .unwrap_or_else(|| panic!("`{header}` not found in:\n{text}"));
    text[start..]
        .lines()
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .collect()
}

// ==============================================================================
// Golden Documents
// ==============================================================================

#[test]
fn test_shop_matches_golden() {
    let output = compile_fixture("shop.json");
    assert_eq!(output.text, golden("shop.proto"));
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
}

#[test]
fn test_warehouse_matches_golden() {
    let output = compile_fixture("warehouse.json");
    assert_eq!(output.text, golden("warehouse.proto"));
}

#[test]
fn test_warehouse_warnings() {
    let output = compile_fixture("warehouse.json");
    let messages: Vec<&str> = output.warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "unsupported generic type `T` on field `inventory.Warehouse.bins`",
            "unsupported number of generic type arguments: 2 on field `inventory.Warehouse.pairs`",
            "unsupported number of map type arguments: 1 on field `inventory.Warehouse.lookup`",
            "nested container type `list` on field `inventory.Warehouse.nested`",
            "generated name `GrpcItem` is already used by `inventory.Item`; \
             `legacy.Item` is emitted as `Grpclegacy_Item`",
        ]
    );
}

#[test]
fn test_directory_catalog_is_merged() {
    let output = compile_fixture("split");
    insta::assert_snapshot!(block_names(&output), @r"
    GrpcAccountState
    GrpcInvoice
    GrpcAccount
    ");
    assert!(
        output
            .text
            .contains("option java_package = \"com.acme.billing.proto\";")
    );
    assert_eq!(
        block(&output.text, "message GrpcInvoice"),
        vec![
            "message GrpcInvoice {",
            "optional string number = 1;",
            "optional GrpcAccount payer = 2;",
            "optional sint64 issued = 3;",
            "}",
        ]
    );
}

// ==============================================================================
// Scenarios
// ==============================================================================

#[test]
fn test_scalar_fields() {
    let output = compile_str(
        r#"{"roots": ["demo.Counter"], "types": [
            {"name": "demo.Counter", "kind": "class", "fields": [
                {"name": "count", "type": "int"},
                {"name": "name", "type": "string"}
            ]}
        ]}"#,
    );
    assert_eq!(
        block(&output.text, "message GrpcCounter"),
        vec![
            "message GrpcCounter {",
            "optional sint32 count = 1;",
            "optional string name = 2;",
            "}",
        ]
    );
}

#[test]
fn test_collection_of_composite() {
    let output = compile_str(
        r#"{"roots": ["demo.Bag"], "types": [
            {"name": "demo.Bag", "kind": "class", "fields": [
                {"name": "items", "type": "list", "args": ["demo.Foo"]}
            ]},
            {"name": "demo.Foo", "kind": "class", "fields": [{"name": "weight", "type": "float"}]}
        ]}"#,
    );
    assert!(output.text.contains("\trepeated GrpcFoo items = 1;\n"));
    assert_eq!(
        block(&output.text, "message GrpcFoo"),
        vec!["message GrpcFoo {", "optional float weight = 1;", "}"]
    );
}

#[test]
fn test_map_field_has_no_modifier() {
    let output = compile_str(
        r#"{"roots": ["demo.Board"], "types": [
            {"name": "demo.Board", "kind": "class", "fields": [
                {"name": "scores", "type": "map", "args": ["string", "int"]}
            ]}
        ]}"#,
    );
    assert!(output.text.contains("\tmap<string, sint32> scores = 1;\n"));
    let board = output.schema.message("GrpcBoard").expect("rendered");
    assert_eq!(
        board.fields[0].kind,
        FieldKind::Map {
            key: ProtoType::Scalar(ScalarType::String),
            value: ProtoType::Scalar(ScalarType::Sint32),
        }
    );
}

#[test]
fn test_enum_precedes_messages() {
    let output = compile_str(
        r#"{"roots": ["demo.Pixel"], "types": [
            {"name": "demo.Pixel", "kind": "class", "fields": [
                {"name": "x", "type": "int"},
                {"name": "color", "type": "demo.Color"}
            ]},
            {"name": "demo.Color", "kind": "enum", "constants": ["RED", "GREEN", "BLUE"]}
        ]}"#,
    );
    assert_eq!(
        block(&output.text, "enum GrpcColor"),
        vec![
            "enum GrpcColor {",
            "RED = 0;",
            "GREEN = 1;",
            "BLUE = 2;",
            "}",
        ]
    );
    let enum_at = output.text.find("enum GrpcColor").expect("enum present");
    let message_at = output.text.find("message GrpcPixel").expect("message present");
    assert!(enum_at < message_at);
    assert!(output.text.contains("\toptional GrpcColor color = 2;\n"));
}

#[test]
fn test_two_dimensional_array_gets_wrapper() {
    let output = compile_str(
        r#"{"roots": ["geo.Grid"], "types": [
            {"name": "geo.Grid", "kind": "class", "fields": [
                {"name": "matrix", "type": "int[][]"}
            ]}
        ]}"#,
    );
    assert_eq!(
        block(&output.text, "message GrpcGrid"),
        vec![
            "message GrpcGrid {",
            "repeated Array_Grid_matrix matrix = 1;",
            "}",
        ]
    );
    assert_eq!(
        block(&output.text, "message Array_Grid_matrix"),
        vec![
            "message Array_Grid_matrix {",
            "repeated sint32 items = 1;",
            "}",
        ]
    );
}

#[test]
fn test_collection_of_opaque_type() {
    let output = compile_str(
        r#"{"roots": ["demo.Box"], "types": [
            {"name": "demo.Box", "kind": "class", "fields": [
                {"name": "label", "type": "string"},
                {"name": "contents", "type": "list", "args": ["object"]}
            ]}
        ]}"#,
    );
    assert!(
        output
            .text
            .contains("\trepeated google.protobuf.Any contents = 2;\n")
    );
    assert!(output.warnings.is_empty());
}

// ==============================================================================
// Properties
// ==============================================================================

#[test]
fn test_field_numbers_are_dense() {
    for fixture in ["shop.json", "warehouse.json", "split"] {
        let output = compile_fixture(fixture);
        for message in output.schema.messages.iter().chain(&output.schema.wrappers) {
            let numbers: Vec<u32> = message.fields.iter().map(|f| f.number).collect();
            let expected: Vec<u32> = (1..=message.fields.len() as u32).collect();
            assert_eq!(numbers, expected, "{fixture}: {}", message.name);
        }
    }
}

#[test]
fn test_no_block_is_rendered_twice() {
    for fixture in ["shop.json", "warehouse.json", "split"] {
        let output = compile_fixture(fixture);
        let names: Vec<&str> = output.schema.block_names().collect();
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(names.len(), unique.len(), "{fixture}: {names:?}");
    }
}

#[test]
fn test_all_enums_precede_all_messages() {
    let output = compile_fixture("shop.json");
    let last_enum = output.text.rfind("\nenum ").expect("enums present");
    let first_message = output.text.find("\nmessage ").expect("messages present");
    assert!(last_enum < first_message);
}

#[test]
fn test_output_is_deterministic() {
    let first = compile_fixture("shop.json");
    let second = compile_fixture("shop.json");
    assert_eq!(first.text, second.text);

    let loaded = load_fixture("shop.json");
    let roots = resolve_roots(&loaded.catalog, &loaded.roots).expect("roots resolve");
    let compiler = SchemaCompiler::with_roots(&loaded.catalog, config_for(&loaded), roots)
        .expect("non-empty roots");
    assert_eq!(compiler.text(), compiler.text());
    assert_eq!(compiler.text(), first.text);
}

#[test]
fn test_recursive_types_terminate() {
    let output = compile_str(
        r#"{"roots": ["tree.Node"], "types": [
            {"name": "tree.Node", "kind": "class", "fields": [
                {"name": "parent", "type": "tree.Node"},
                {"name": "children", "type": "list", "args": ["tree.Node"]},
                {"name": "sibling", "type": "tree.Leaf"}
            ]},
            {"name": "tree.Leaf", "kind": "class", "fields": [
                {"name": "owner", "type": "tree.Node"}
            ]}
        ]}"#,
    );
    insta::assert_snapshot!(block_names(&output), @r"
    GrpcNode
    GrpcLeaf
    ");
    assert!(output.text.contains("\toptional GrpcNode parent = 1;\n"));
    assert!(output.text.contains("\trepeated GrpcNode children = 2;\n"));
    assert!(output.text.contains("\toptional GrpcNode owner = 1;\n"));
}

// ==============================================================================
// Configuration and Errors
// ==============================================================================

#[test]
fn test_custom_prefix_applies_to_every_generated_name() {
    let loaded = load_fixture("shop.json");
    let roots = resolve_roots(&loaded.catalog, &loaded.roots).expect("roots resolve");
    let mut config = config_for(&loaded);
    config.name_prefix("Pb");
    let compiler =
        SchemaCompiler::with_roots(&loaded.catalog, config, roots).expect("non-empty roots");
    insta::assert_snapshot!(compiler.schema().block_names().collect::<Vec<_>>().join("\n"), @r"
    PbStatus
    PbTier
    PbTag
    PbOrder
    PbLine
    PbCustomer
    PbProduct
    PbAddress
    Array_Product_dimensions
    ");
}

#[test]
fn test_extra_roots_extend_the_document() {
    let loaded = load_fixture("shop.json");
    let roots = resolve_roots(&loaded.catalog, &["shop.Order", "shop.Order.Audit"])
        .expect("roots resolve");
    let compiler = SchemaCompiler::with_roots(&loaded.catalog, config_for(&loaded), roots)
        .expect("non-empty roots");
    // Roots are queued ahead of anything the first root references.
    let names: Vec<&str> = compiler.schema().block_names().collect();
    assert_eq!(&names[3..6], ["GrpcOrder", "GrpcAudit", "GrpcLine"]);
}

#[test]
fn test_empty_roots_fail_before_traversal() {
    let loaded = load_fixture("no_roots.json");
    assert!(loaded.roots.is_empty());
    let roots = resolve_roots(&loaded.catalog, &loaded.roots).expect("nothing to resolve");
    let err = SchemaCompiler::with_roots(&loaded.catalog, SchemaConfig::new(), roots)
        .err()
        .expect("empty root set is rejected");
    assert!(matches!(err, ProtoError::NoRootTypes));
}
