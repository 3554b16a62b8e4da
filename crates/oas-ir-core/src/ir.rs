//! The schema IR — tagged nodes that emitters consume instead of raw schemas.
//!
//! A compiled schema is an ordered `Vec<SchemaNode>`: one structural or scalar
//! node followed by constraint and metadata nodes. The order is part of the
//! contract — emitters fold the sequence left to right (e.g. `min` before the
//! base type node, trailing `nullable`/`readOnly` markers at the end).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

// ---------------------------------------------------------------------------
// Node payloads
// ---------------------------------------------------------------------------

/// Payload of a `ref` node: a resolved pointer to another named schema.
///
/// `name` is the referenced schema's property name as produced by the naming
/// service; `path` is its resolved output location. Reference nodes never
/// inline the referenced schema — that is what keeps cyclic schemas finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefInfo {
    pub name: String,
    pub path: String,
}

/// Payload of an `object` node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectNode {
    /// Property name → compiled node sequence, in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, Vec<SchemaNode>>,
    /// Compiled `additionalProperties` schema; empty when the object is closed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_properties: Vec<SchemaNode>,
    /// Set on object members of an `anyOf` union, where partial matches are
    /// only sound if each variant is matched exactly.
    #[serde(default, skip_serializing_if = "is_false")]
    pub strict: bool,
}

/// Payload of an `array` node. `min`/`max` are item-count bounds lifted out
/// of the surrounding constraint nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayNode {
    pub items: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
}

/// Payload of an `enum` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumNode {
    /// Unique enum name within the compilation run (collisions suffixed).
    pub name: String,
    /// The name after the naming service's `Type` transform.
    pub type_name: String,
    /// Forced for numeric underlying types, where a plain identifier enum
    /// cannot represent the values.
    pub as_const: bool,
    pub items: Vec<EnumEntry>,
}

/// A single enum member. `name` is the declared display name (a vendor
/// extension name when present, otherwise the value itself) and is kept as a
/// raw JSON value because numeric enums name entries by their numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumEntry {
    pub name: Value,
    pub value: Value,
    pub format: ValueFormat,
}

/// Whether an enum or const value is rendered as a number or a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    Number,
    String,
}

/// Payload of a `const` node (OpenAPI 3.1 only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstNode {
    pub name: Value,
    pub format: ValueFormat,
    pub value: Value,
}

/// The raw `type`/`format` pair as declared, carried for emitters that want
/// the source typing next to the interpreted nodes. `type` may be a string or
/// a 3.1 type array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Rendering for `date`/`time` nodes: a native date value or its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRepr {
    Date,
    String,
}

/// Payload of a `dateTime` node. At most one of the flags is set: `offset`
/// for timezone-offset strings, `local` for local-time strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeNode {
    #[serde(default, skip_serializing_if = "is_false")]
    pub offset: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub local: bool,
}

// ---------------------------------------------------------------------------
// SchemaNode
// ---------------------------------------------------------------------------

/// One node of the compiled IR.
///
/// Serialized adjacently tagged as `{ "keyword": ..., "args": ... }`; unit
/// nodes omit `args`. The variants partition into:
///
/// - **structural**: `ref`, `object`, `array`, `union`, `intersection`,
///   `tuple`, `enum`, `const`
/// - **scalar**: `string`, `number`, `integer`, `boolean`, `null`,
///   `unknown`, `any`
/// - **constraint / metadata**: `min`, `max`, `pattern`, `typeInfo`,
///   `default`, `describe`, `nullable`, `nullish`, `optional`, `readOnly`,
///   and the format refinements `date`, `dateTime`, `time`, `uuid`, `email`,
///   `url`, `blob`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "keyword", content = "args", rename_all = "camelCase")]
pub enum SchemaNode {
    // --- structural ---
    Ref(RefInfo),
    Object(ObjectNode),
    Array(ArrayNode),
    /// `oneOf`/`anyOf` members, already reduced to one node each.
    Union(Vec<SchemaNode>),
    /// `allOf` members plus any sibling-property nodes folded in.
    Intersection(Vec<SchemaNode>),
    /// 3.1 `prefixItems` members, one node each.
    Tuple(Vec<SchemaNode>),
    Enum(EnumNode),
    Const(ConstNode),

    // --- scalar ---
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// Unparseable input under `unknown-type = unknown`.
    Unknown,
    /// Unparseable input under `unknown-type = any` (the default).
    Any,

    // --- constraint / metadata ---
    Min(Number),
    Max(Number),
    Pattern(String),
    TypeInfo(TypeInfo),
    Default(Value),
    Describe(String),
    Nullable,
    /// Optional and nullable at once (an absent-or-null property).
    Nullish,
    Optional,
    ReadOnly,
    Date(DateRepr),
    DateTime(DateTimeNode),
    Time(DateRepr),
    Uuid,
    Email,
    Url,
    Blob,
}

/// Payload-free mirror of [`SchemaNode`] used to query node sequences by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Ref,
    Object,
    Array,
    Union,
    Intersection,
    Tuple,
    Enum,
    Const,
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Unknown,
    Any,
    Min,
    Max,
    Pattern,
    TypeInfo,
    Default,
    Describe,
    Nullable,
    Nullish,
    Optional,
    ReadOnly,
    Date,
    DateTime,
    Time,
    Uuid,
    Email,
    Url,
    Blob,
}

impl SchemaNode {
    /// The payload-free tag of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            SchemaNode::Ref(_) => NodeKind::Ref,
            SchemaNode::Object(_) => NodeKind::Object,
            SchemaNode::Array(_) => NodeKind::Array,
            SchemaNode::Union(_) => NodeKind::Union,
            SchemaNode::Intersection(_) => NodeKind::Intersection,
            SchemaNode::Tuple(_) => NodeKind::Tuple,
            SchemaNode::Enum(_) => NodeKind::Enum,
            SchemaNode::Const(_) => NodeKind::Const,
            SchemaNode::String => NodeKind::String,
            SchemaNode::Number => NodeKind::Number,
            SchemaNode::Integer => NodeKind::Integer,
            SchemaNode::Boolean => NodeKind::Boolean,
            SchemaNode::Null => NodeKind::Null,
            SchemaNode::Unknown => NodeKind::Unknown,
            SchemaNode::Any => NodeKind::Any,
            SchemaNode::Min(_) => NodeKind::Min,
            SchemaNode::Max(_) => NodeKind::Max,
            SchemaNode::Pattern(_) => NodeKind::Pattern,
            SchemaNode::TypeInfo(_) => NodeKind::TypeInfo,
            SchemaNode::Default(_) => NodeKind::Default,
            SchemaNode::Describe(_) => NodeKind::Describe,
            SchemaNode::Nullable => NodeKind::Nullable,
            SchemaNode::Nullish => NodeKind::Nullish,
            SchemaNode::Optional => NodeKind::Optional,
            SchemaNode::ReadOnly => NodeKind::ReadOnly,
            SchemaNode::Date(_) => NodeKind::Date,
            SchemaNode::DateTime(_) => NodeKind::DateTime,
            SchemaNode::Time(_) => NodeKind::Time,
            SchemaNode::Uuid => NodeKind::Uuid,
            SchemaNode::Email => NodeKind::Email,
            SchemaNode::Url => NodeKind::Url,
            SchemaNode::Blob => NodeKind::Blob,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_unit_node_serializes_without_args() {
        let json = serde_json::to_value(SchemaNode::String).unwrap();
        assert_eq!(json, json!({ "keyword": "string" }));

        let json = serde_json::to_value(SchemaNode::ReadOnly).unwrap();
        assert_eq!(json, json!({ "keyword": "readOnly" }));
    }

    #[test]
    fn test_payload_node_serializes_adjacently_tagged() {
        let node = SchemaNode::Min(Number::from(3));
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "keyword": "min", "args": 3 })
        );

        let node = SchemaNode::Ref(RefInfo {
            name: "pet".to_string(),
            path: "models/pet".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "keyword": "ref", "args": { "name": "pet", "path": "models/pet" } })
        );
    }

    #[test]
    fn test_object_node_field_names_and_defaults() {
        let mut properties = IndexMap::new();
        properties.insert("id".to_string(), vec![SchemaNode::Integer]);
        let node = SchemaNode::Object(ObjectNode {
            properties,
            additional_properties: Vec::new(),
            strict: false,
        });

        let json = serde_json::to_value(&node).unwrap();
        // Empty additionalProperties and strict=false are omitted entirely
        assert_eq!(
            json,
            json!({
                "keyword": "object",
                "args": { "properties": { "id": [{ "keyword": "integer" }] } }
            })
        );

        let back: SchemaNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_strict_object_round_trip() {
        let node = SchemaNode::Object(ObjectNode {
            properties: IndexMap::new(),
            additional_properties: vec![SchemaNode::Any],
            strict: true,
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["args"]["strict"], json!(true));
        let back: SchemaNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_enum_node_camel_case_fields() {
        let node = SchemaNode::Enum(EnumNode {
            name: "PetType".to_string(),
            type_name: "PetType".to_string(),
            as_const: true,
            items: vec![EnumEntry {
                name: json!(1),
                value: json!(1),
                format: ValueFormat::Number,
            }],
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["args"]["typeName"], json!("PetType"));
        assert_eq!(json["args"]["asConst"], json!(true));
        assert_eq!(json["args"]["items"][0]["format"], json!("number"));
    }

    #[test]
    fn test_type_info_rename_and_skip() {
        let node = SchemaNode::TypeInfo(TypeInfo {
            ty: Some(json!("string")),
            format: Some("uuid".to_string()),
        });
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "keyword": "typeInfo", "args": { "type": "string", "format": "uuid" } })
        );

        let empty = SchemaNode::TypeInfo(TypeInfo::default());
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            json!({ "keyword": "typeInfo", "args": {} })
        );
    }

    #[test]
    fn test_date_time_flags() {
        let node = SchemaNode::DateTime(DateTimeNode {
            offset: true,
            local: false,
        });
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({ "keyword": "dateTime", "args": { "offset": true } })
        );
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(SchemaNode::Union(Vec::new()).kind(), NodeKind::Union);
        assert_eq!(
            SchemaNode::Intersection(Vec::new()).kind(),
            NodeKind::Intersection
        );
        assert_eq!(SchemaNode::Any.kind(), NodeKind::Any);
        assert_eq!(
            SchemaNode::Pattern("^a".to_string()).kind(),
            NodeKind::Pattern
        );
    }
}
