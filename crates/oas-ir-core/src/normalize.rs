//! Version-aware schema normalization.
//!
//! Wraps a raw JSON schema object in [`ParsedSchema`], whose accessors smooth
//! over the OpenAPI 3.0/3.1 surface differences the compiler cares about:
//! singular vs array `type`, `nullable` vs the `x-nullable` vendor spelling,
//! and the unified `min`/`max` across number, string, and array bounds.
//!
//! Accessors are lenient by construction. Loose schema tooling treats absent,
//! `null`, and type-mismatched keywords interchangeably, so a keyword that is
//! present but unusable reads as absent here rather than failing the compile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// ---------------------------------------------------------------------------
// Dialect
// ---------------------------------------------------------------------------

/// The OpenAPI schema dialect a document (and its schemas) follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// OpenAPI 3.0.x — `nullable`, singular `type`, no `const`/`prefixItems`.
    V30,
    /// OpenAPI 3.1.x — type arrays, `const`, `prefixItems`.
    V31,
}

impl Dialect {
    /// Read the dialect off a document's `openapi` version field.
    /// Missing or unrecognized versions fall back to 3.0 semantics.
    pub fn detect(document: &Value) -> Dialect {
        match document.get("openapi").and_then(Value::as_str) {
            Some(version) if version.starts_with("3.1") => Dialect::V31,
            _ => Dialect::V30,
        }
    }

    pub fn is_v31(self) -> bool {
        matches!(self, Dialect::V31)
    }
}

// ---------------------------------------------------------------------------
// ParsedSchema
// ---------------------------------------------------------------------------

/// A schema object in canonical parsed form.
///
/// Produced by [`parse_schema`]; borrows the underlying JSON map.
#[derive(Debug, Clone, Copy)]
pub struct ParsedSchema<'a> {
    obj: &'a Map<String, Value>,
    dialect: Dialect,
}

/// Parse a raw value into its canonical schema form.
///
/// Returns `None` for absent or non-object values — the caller degrades
/// those to its configured unknown node.
pub fn parse_schema(raw: Option<&Value>, dialect: Dialect) -> Option<ParsedSchema<'_>> {
    let obj = raw?.as_object()?;
    Some(ParsedSchema { obj, dialect })
}

impl<'a> ParsedSchema<'a> {
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Raw keyword access.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key)
    }

    /// Keyword presence, regardless of value.
    pub fn has(&self, key: &str) -> bool {
        self.obj.contains_key(key)
    }

    /// The underlying map, for callers that rebuild a variant of the schema.
    pub fn raw(&self) -> &'a Map<String, Value> {
        self.obj
    }

    /// A copy of the schema with one keyword removed. Used to compile the
    /// sibling keywords of a composition (`oneOf` minus `oneOf`, etc.).
    pub fn without(&self, key: &str) -> Value {
        let mut map = self.obj.clone();
        map.remove(key);
        Value::Object(map)
    }

    // --- type ---

    /// The raw `type` value (string or 3.1 type array).
    pub fn type_value(&self) -> Option<&'a Value> {
        self.obj.get("type")
    }

    /// Singular `type`, when declared as a string.
    pub fn type_str(&self) -> Option<&'a str> {
        self.obj.get("type").and_then(Value::as_str)
    }

    /// The 3.1 `type` array form.
    pub fn type_array(&self) -> Option<&'a Vec<Value>> {
        self.obj.get("type").and_then(Value::as_array)
    }

    /// True when a 3.1 type array declares `"null"` in second position,
    /// e.g. `type: ["string", "null"]`.
    pub fn type_array_nullable(&self) -> bool {
        self.type_array()
            .and_then(|types| types.get(1))
            .and_then(Value::as_str)
            == Some("null")
    }

    // --- unified constraints ---

    /// Unified lower bound: the first declared of `minimum`, `minLength`,
    /// `minItems`. Non-numeric values read as absent.
    pub fn min(&self) -> Option<&'a Number> {
        self.first_declared(&["minimum", "minLength", "minItems"])
            .and_then(Value::as_number)
    }

    /// Unified upper bound: the first declared of `maximum`, `maxLength`,
    /// `maxItems`. Non-numeric values read as absent.
    pub fn max(&self) -> Option<&'a Number> {
        self.first_declared(&["maximum", "maxLength", "maxItems"])
            .and_then(Value::as_number)
    }

    /// Whether the schema admits `null`, via `nullable` or the `x-nullable`
    /// vendor spelling.
    pub fn nullable(&self) -> bool {
        self.first_declared(&["nullable", "x-nullable"])
            .is_some_and(is_truthy)
    }

    pub fn read_only(&self) -> bool {
        self.obj.get("readOnly").is_some_and(is_truthy)
    }

    // --- annotations ---

    pub fn description(&self) -> Option<&'a str> {
        self.non_empty_str("description")
    }

    pub fn pattern(&self) -> Option<&'a str> {
        self.non_empty_str("pattern")
    }

    pub fn format(&self) -> Option<&'a str> {
        self.non_empty_str("format")
    }

    pub fn default_value(&self) -> Option<&'a Value> {
        self.obj.get("default")
    }

    // --- structure ---

    /// The `$ref` pointer, when this schema is a reference.
    pub fn reference(&self) -> Option<&'a str> {
        self.obj.get("$ref").and_then(Value::as_str)
    }

    pub fn one_of(&self) -> Option<&'a Vec<Value>> {
        self.obj.get("oneOf").and_then(Value::as_array)
    }

    pub fn any_of(&self) -> Option<&'a Vec<Value>> {
        self.obj.get("anyOf").and_then(Value::as_array)
    }

    pub fn all_of(&self) -> Option<&'a Vec<Value>> {
        self.obj.get("allOf").and_then(Value::as_array)
    }

    pub fn enum_values(&self) -> Option<&'a Vec<Value>> {
        self.obj.get("enum").and_then(Value::as_array)
    }

    pub fn prefix_items(&self) -> Option<&'a Vec<Value>> {
        self.obj.get("prefixItems").and_then(Value::as_array)
    }

    fn first_declared(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.obj.get(*key))
            .find(|value| !value.is_null())
    }

    fn non_empty_str(&self, key: &str) -> Option<&'a str> {
        self.obj
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// JSON truthiness as loose schema tooling applies it: everything except
/// `null`, `false`, `0`, and `""` counts as set.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
