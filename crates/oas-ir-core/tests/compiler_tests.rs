//! Integration tests for schema compilation against fixture documents.
//!
//! Fixtures live in the shared workspace `tests/fixtures` directory. Inline
//! schemas are used only where a fixture would obscure the point.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use oas_ir_core::{
    compile, find_all, find_first, BasicNamer, CompileOptions, DateRepr, DateTimeNode, DateType,
    Dialect, NodeKind, OptionsOverride, OverrideOptions, RefInfo, Refs, SchemaCompiler, SchemaHook,
    SchemaNode, TypeInfo, ValueFormat,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Number, Value};

// ── Helpers ─────────────────────────────────────────────────────────────────

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures");

fn load_fixture(name: &str) -> Value {
    let path = Path::new(FIXTURES_DIR).join(format!("{name}.json"));
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {name}.json: {e}"));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {name}.json: {e}"))
}

fn schema_of<'a>(document: &'a Value, name: &str) -> &'a Value {
    &document["components"]["schemas"][name]
}

fn compile_fresh(document: &Value, name: &str) -> (Vec<SchemaNode>, Refs) {
    compile(
        Some(schema_of(document, name)),
        Some(name),
        CompileOptions::default(),
        Dialect::detect(document),
    )
}

fn compile_with(document: &Value, name: &str, options: CompileOptions) -> Vec<SchemaNode> {
    let (nodes, _) = compile(
        Some(schema_of(document, name)),
        Some(name),
        options,
        Dialect::detect(document),
    );
    nodes
}

fn property<'a>(nodes: &'a [SchemaNode], name: &str) -> &'a [SchemaNode] {
    let SchemaNode::Object(object) = &nodes[0] else {
        panic!("expected an object node, got {:?}", nodes[0]);
    };
    &object.properties[name]
}

fn type_info(ty: Value, format: Option<&str>) -> SchemaNode {
    SchemaNode::TypeInfo(TypeInfo {
        ty: Some(ty),
        format: format.map(str::to_string),
    })
}

// ── Determinism and cycle safety ────────────────────────────────────────────

#[test]
fn test_fresh_runs_produce_identical_output() {
    let document = load_fixture("petstore");

    let (first_nodes, first_refs) = compile_fresh(&document, "Pet");
    let (second_nodes, second_refs) = compile_fresh(&document, "Pet");

    assert_eq!(first_nodes, second_nodes);
    assert_eq!(first_refs, second_refs);
}

#[test]
fn test_recursive_references_terminate() {
    let document = load_fixture("recursive");
    let (nodes, refs) = compile_fresh(&document, "FileNode");

    // Self-references stay references instead of inlining
    let ref_nodes = find_all(&nodes, NodeKind::Ref);
    assert_eq!(ref_nodes.len(), 2);
    let expected = SchemaNode::Ref(RefInfo {
        name: "fileNode".to_string(),
        path: "models/fileNode".to_string(),
    });
    assert_eq!(ref_nodes[0], &expected);
    assert_eq!(ref_nodes[1], &expected);

    // Both pointer sights share one table record
    assert_eq!(refs.len(), 1);
    assert_eq!(refs["#/components/schemas/FileNode"].original_name, "FileNode");
}

#[test]
fn test_reference_table_is_shared_across_entries() {
    let document = load_fixture("recursive");
    let namer = BasicNamer::default();
    let mut compiler = SchemaCompiler::new(CompileOptions::default(), &namer, Dialect::V30);

    let file_node = compiler.compile(Some(schema_of(&document, "FileNode")), Some("FileNode"));
    let link = compiler.compile(Some(schema_of(&document, "Link")), Some("Link"));

    // Link's target reuses the name minted during the FileNode run
    let target = find_first(&link, NodeKind::Ref).unwrap();
    assert_eq!(target, find_first(&file_node, NodeKind::Ref).unwrap());

    let pointers: Vec<_> = compiler.refs().keys().collect();
    assert_eq!(
        pointers,
        vec!["#/components/schemas/FileNode", "#/components/schemas/Link"]
    );
}

#[test]
fn test_enum_counters_are_per_run_not_per_schema() {
    let document = load_fixture("petstore");
    let namer = BasicNamer::default();
    let mut compiler = SchemaCompiler::new(CompileOptions::default(), &namer, Dialect::V30);

    let first = compiler.compile(Some(schema_of(&document, "Pet")), Some("Pet"));
    let second = compiler.compile(Some(schema_of(&document, "Pet")), Some("Pet"));

    let SchemaNode::Enum(first_enum) = find_first(&first, NodeKind::Enum).unwrap() else {
        panic!("expected an enum node");
    };
    let SchemaNode::Enum(second_enum) = find_first(&second, NodeKind::Enum).unwrap() else {
        panic!("expected an enum node");
    };
    assert_eq!(first_enum.name, "PetStatus");
    assert_eq!(second_enum.name, "PetStatus2");

    // The reference table did not grow on the second pass
    assert_eq!(compiler.refs().len(), 2);
}

// ── Node sequence shapes ────────────────────────────────────────────────────

#[test]
fn test_pet_object_shape() {
    let document = load_fixture("petstore");
    let (nodes, refs) = compile_fresh(&document, "Pet");

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1], type_info(json!("object"), None));

    let SchemaNode::Object(object) = &nodes[0] else {
        panic!("expected an object node, got {:?}", nodes[0]);
    };
    let names: Vec<_> = object.properties.keys().collect();
    assert_eq!(
        names,
        vec!["id", "category", "name", "photoUrls", "tags", "status", "avatar"]
    );

    assert_eq!(
        object.properties["id"],
        vec![
            SchemaNode::Integer,
            type_info(json!("integer"), Some("int64")),
            SchemaNode::Optional,
        ]
    );
    assert_eq!(
        object.properties["category"],
        vec![
            SchemaNode::Ref(RefInfo {
                name: "category".to_string(),
                path: "models/category".to_string(),
            }),
            SchemaNode::TypeInfo(TypeInfo::default()),
            SchemaNode::Optional,
        ]
    );
    // Required properties carry no trailing marker
    assert_eq!(
        object.properties["name"],
        vec![SchemaNode::String, type_info(json!("string"), None)]
    );

    assert_eq!(refs.len(), 2);
    assert_eq!(refs["#/components/schemas/Tag"].property_name, "tag");
}

#[test]
fn test_array_property_lifts_bounds() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "Pet");

    let SchemaNode::Array(array) = &property(&nodes, "photoUrls")[0] else {
        panic!("expected an array node");
    };
    assert_eq!(array.min, Some(Number::from(1)));
    assert_eq!(array.max, None);
    assert_eq!(
        array.items,
        vec![SchemaNode::String, type_info(json!("string"), None)]
    );

    // The bound lives only inside the array payload
    assert!(find_all(&nodes, NodeKind::Min).is_empty());
}

#[test]
fn test_constraints_precede_type_info() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "User");

    assert_eq!(
        property(&nodes, "username"),
        &[
            SchemaNode::String,
            SchemaNode::Min(Number::from(3)),
            SchemaNode::Max(Number::from(20)),
            type_info(json!("string"), None),
            SchemaNode::Optional,
        ]
    );

    let (nodes, _) = compile_fresh(&document, "Category");
    assert_eq!(
        property(&nodes, "name"),
        &[
            SchemaNode::String,
            SchemaNode::Pattern("^[A-Za-z ]+$".to_string()),
            type_info(json!("string"), None),
            SchemaNode::Optional,
        ]
    );
}

#[test]
fn test_read_only_marker_trails_type_info() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "User");

    assert_eq!(
        property(&nodes, "id"),
        &[
            SchemaNode::Integer,
            type_info(json!("integer"), Some("int64")),
            SchemaNode::ReadOnly,
            SchemaNode::Optional,
        ]
    );
}

#[test]
fn test_nullable_optional_property_is_nullish() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "ApiResponse");

    assert_eq!(
        property(&nodes, "message"),
        &[
            SchemaNode::String,
            type_info(json!("string"), None),
            SchemaNode::Nullable,
            SchemaNode::Nullish,
        ]
    );
}

#[test]
fn test_boolean_default_is_carried() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "Order");

    assert_eq!(
        property(&nodes, "complete"),
        &[
            SchemaNode::Boolean,
            type_info(json!("boolean"), None),
            SchemaNode::Default(json!(false)),
            SchemaNode::Optional,
        ]
    );
}

// ── Enums ───────────────────────────────────────────────────────────────────

#[test]
fn test_string_enum_from_fixture() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "Pet");

    let chain = property(&nodes, "status");
    let SchemaNode::Enum(e) = &chain[0] else {
        panic!("expected an enum node, got {:?}", chain[0]);
    };
    assert_eq!(e.name, "PetStatus");
    assert_eq!(e.type_name, "PetStatus");
    assert!(!e.as_const);
    assert_eq!(e.items.len(), 3);
    assert_eq!(e.items[0].value, json!("available"));
    assert_eq!(e.items[0].format, ValueFormat::String);

    assert_eq!(
        &chain[1..],
        &[
            type_info(json!("string"), None),
            SchemaNode::Describe("pet status in the store".to_string()),
            SchemaNode::Optional,
        ]
    );
}

#[test]
fn test_numeric_enum_forces_const_for_every_mode() {
    use oas_ir_core::EnumMode;

    let document = load_fixture("petstore");
    for mode in [EnumMode::Enum, EnumMode::Literal, EnumMode::ConstEnum] {
        let options = CompileOptions {
            enum_mode: mode,
            ..CompileOptions::default()
        };
        let nodes = compile_with(&document, "User", options);

        let chain = property(&nodes, "userStatus");
        let SchemaNode::Enum(e) = &chain[0] else {
            panic!("expected an enum node, got {:?}", chain[0]);
        };
        assert!(e.as_const, "numeric enums must be const under {mode:?}");
        assert_eq!(e.name, "UserUserStatus");
        assert!(e.items.iter().all(|item| item.format == ValueFormat::Number));
        assert_eq!(e.items[0].name, json!(0));
    }
}

// ── Formats ─────────────────────────────────────────────────────────────────

#[test]
fn test_binary_property_short_circuits() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "Pet");

    assert_eq!(
        property(&nodes, "avatar"),
        &[
            type_info(json!("string"), Some("binary")),
            SchemaNode::Blob,
            SchemaNode::Optional,
        ]
    );
}

#[test]
fn test_date_time_property_replaces_string() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "Order");

    assert_eq!(
        property(&nodes, "shipDate"),
        &[
            SchemaNode::DateTime(DateTimeNode::default()),
            type_info(json!("string"), Some("date-time")),
            SchemaNode::Optional,
        ]
    );
}

#[test]
fn test_email_and_uri_validators() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "User");

    assert_eq!(
        property(&nodes, "email"),
        &[
            SchemaNode::String,
            SchemaNode::Email,
            type_info(json!("string"), Some("email")),
            SchemaNode::Optional,
        ]
    );
    assert_eq!(
        property(&nodes, "website"),
        &[
            SchemaNode::String,
            SchemaNode::Url,
            type_info(json!("string"), Some("uri")),
            SchemaNode::Optional,
        ]
    );
}

// ── OpenAPI 3.1 ─────────────────────────────────────────────────────────────

#[test]
fn test_dialect_detection() {
    assert_eq!(Dialect::detect(&load_fixture("petstore")), Dialect::V30);
    assert_eq!(Dialect::detect(&load_fixture("library-31")), Dialect::V31);
}

#[test]
fn test_type_array_property() {
    let document = load_fixture("library-31");
    let (nodes, _) = compile_fresh(&document, "Book");

    assert_eq!(
        property(&nodes, "subtitle"),
        &[
            SchemaNode::String,
            type_info(json!("string"), None),
            type_info(json!(["string", "null"]), None),
            SchemaNode::Nullable,
            SchemaNode::Optional,
        ]
    );

    let (nodes, _) = compile_fresh(&document, "Author");
    assert_eq!(
        property(&nodes, "born"),
        &[
            SchemaNode::Integer,
            type_info(json!("integer"), None),
            type_info(json!(["integer", "null"]), None),
            SchemaNode::Nullable,
            SchemaNode::Optional,
        ]
    );
}

#[test]
fn test_const_properties() {
    let document = load_fixture("library-31");
    let (nodes, _) = compile_fresh(&document, "Book");

    let chain = property(&nodes, "edition");
    let SchemaNode::Const(constant) = &chain[0] else {
        panic!("expected a const node, got {:?}", chain[0]);
    };
    assert_eq!(constant.value, json!(1));
    assert_eq!(constant.format, ValueFormat::Number);

    let (nodes, _) = compile_fresh(&document, "Format");
    let SchemaNode::Const(constant) = &nodes[0] else {
        panic!("expected a const node, got {:?}", nodes[0]);
    };
    assert_eq!(constant.value, json!("isbn-13"));
    assert_eq!(constant.format, ValueFormat::String);
}

#[test]
fn test_prefix_items_tuple() {
    let document = load_fixture("library-31");
    let (nodes, _) = compile_fresh(&document, "Book");

    assert_eq!(
        property(&nodes, "dimensions")[0],
        SchemaNode::Tuple(vec![
            SchemaNode::Number,
            SchemaNode::Number,
            SchemaNode::Number,
        ])
    );
}

#[test]
fn test_enum_vendor_names() {
    let document = load_fixture("library-31");
    let (nodes, _) = compile_fresh(&document, "Book");

    let SchemaNode::Enum(e) = &property(&nodes, "genre")[0] else {
        panic!("expected an enum node");
    };
    assert_eq!(e.name, "BookGenre");
    assert_eq!(e.items[0].name, json!("Fiction"));
    assert_eq!(e.items[0].value, json!("fiction"));
    assert_eq!(e.items[2].name, json!("Poetry"));
}

// ── Options ─────────────────────────────────────────────────────────────────

#[test]
fn test_override_matches_nested_property_names() {
    let document = load_fixture("petstore");

    // Nested properties compile under scoped names ("OrderShipDate"), so an
    // unanchored pattern reaches them and an anchored one does not.
    let options = CompileOptions {
        overrides: vec![OptionsOverride {
            pattern: "Order".to_string(),
            options: OverrideOptions {
                date_type: Some(DateType::Off),
                ..OverrideOptions::default()
            },
        }],
        ..CompileOptions::default()
    };
    let nodes = compile_with(&document, "Order", options);
    assert_eq!(
        property(&nodes, "shipDate"),
        &[
            SchemaNode::String,
            type_info(json!("string"), Some("date-time")),
            SchemaNode::Optional,
        ]
    );

    let options = CompileOptions {
        overrides: vec![OptionsOverride {
            pattern: "^Order$".to_string(),
            options: OverrideOptions {
                date_type: Some(DateType::Off),
                ..OverrideOptions::default()
            },
        }],
        ..CompileOptions::default()
    };
    let nodes = compile_with(&document, "Order", options);
    assert_eq!(
        property(&nodes, "shipDate")[0],
        SchemaNode::DateTime(DateTimeNode::default())
    );
}

#[test]
fn test_date_type_override_per_schema() {
    let document = load_fixture("petstore");
    let options = CompileOptions {
        date_type: DateType::Off,
        overrides: vec![OptionsOverride {
            pattern: "Order".to_string(),
            options: OverrideOptions {
                date_type: Some(DateType::Date),
                ..OverrideOptions::default()
            },
        }],
        ..CompileOptions::default()
    };

    let nodes = compile_with(&document, "Order", options);
    assert_eq!(
        property(&nodes, "shipDate")[0],
        SchemaNode::Date(DateRepr::Date)
    );
}

#[test]
fn test_hook_bypasses_compilation_when_non_empty() {
    let document = load_fixture("petstore");
    let hook: SchemaHook = Arc::new(|_schema, base_name| match base_name {
        Some("Pet") => Some(vec![SchemaNode::Boolean]),
        Some("Tag") => Some(Vec::new()),
        Some("User") => Some(vec![SchemaNode::Boolean, SchemaNode::Boolean]),
        _ => None,
    });
    let options = CompileOptions {
        schema_hook: Some(hook),
        ..CompileOptions::default()
    };

    let nodes = compile_with(&document, "Pet", options.clone());
    assert_eq!(nodes, vec![SchemaNode::Boolean]);

    // An empty hook result falls through to the normal algorithm
    let nodes = compile_with(&document, "Tag", options.clone());
    assert_eq!(nodes[0].kind(), NodeKind::Object);

    // Hook output still passes through the top-level dedup
    let nodes = compile_with(&document, "User", options);
    assert_eq!(nodes, vec![SchemaNode::Boolean]);
}

// ── Serialized output ───────────────────────────────────────────────────────

#[test]
fn test_serialized_sequence_shape() {
    let document = load_fixture("petstore");
    let (nodes, _) = compile_fresh(&document, "Pet");

    let json = serde_json::to_value(&nodes).unwrap();
    assert_eq!(json[0]["keyword"], json!("object"));
    assert_eq!(json[1], json!({ "keyword": "typeInfo", "args": { "type": "object" } }));

    let status = &json[0]["args"]["properties"]["status"];
    assert_eq!(status[0]["keyword"], json!("enum"));
    assert_eq!(status[0]["args"]["name"], json!("PetStatus"));
    assert_eq!(status[0]["args"]["items"][0]["value"], json!("available"));
    assert_eq!(status[status.as_array().unwrap().len() - 1]["keyword"], json!("optional"));

    let back: Vec<SchemaNode> = serde_json::from_value(json).unwrap();
    assert_eq!(back, nodes);
}
