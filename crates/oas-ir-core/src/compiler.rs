//! The schema compiler — the core of the OpenAPI-to-IR conversion.
//!
//! [`SchemaCompiler::compile`] turns one raw schema value into an ordered
//! node sequence. Interpretation is a fixed decision order: reference,
//! composition (`oneOf`/`anyOf`/`allOf`), enum, tuple, const, format
//! dispatch, array, object, declared type, and finally the configured
//! unknown node. The compiler never fails: anything it cannot interpret
//! degrades to `unknown`/`any` and compilation continues.
//!
//! A compiler instance owns the run's reference table and name counters.
//! Compiling several schemas through one instance shares ref memoization;
//! independent runs start clean.

use std::collections::HashMap;

use heck::ToPascalCase;
use indexmap::IndexMap;
use serde_json::Value;

use crate::config::{CompileOptions, DateType};
use crate::ir::{
    ArrayNode, ConstNode, DateRepr, DateTimeNode, EnumEntry, EnumNode, ObjectNode, RefInfo,
    SchemaNode, TypeInfo, ValueFormat,
};
use crate::naming::{unique_name, NameKind, NameResolver};
use crate::normalize::{is_truthy, parse_schema, Dialect, ParsedSchema};
use crate::refs::{RefRecord, Refs};

pub struct SchemaCompiler<'a> {
    options: CompileOptions,
    namer: &'a dyn NameResolver,
    dialect: Dialect,
    refs: Refs,
    used_alias_names: HashMap<String, usize>,
    used_enum_names: HashMap<String, usize>,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(options: CompileOptions, namer: &'a dyn NameResolver, dialect: Dialect) -> Self {
        Self {
            options,
            namer,
            dialect,
            refs: Refs::new(),
            used_alias_names: HashMap::new(),
            used_enum_names: HashMap::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// References resolved so far, in first-resolution order.
    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn into_refs(self) -> Refs {
        self.refs
    }

    /// Compile a raw schema value into its node sequence.
    ///
    /// Effective options are resolved per call from the override list and
    /// `base_name`. A bypass hook returning a non-empty list short-circuits
    /// the algorithm. Either way the result is deduplicated at the top level
    /// only (first occurrence wins); nested sequences were deduplicated by
    /// their own compile calls.
    pub fn compile(&mut self, raw: Option<&Value>, base_name: Option<&str>) -> Vec<SchemaNode> {
        let opts = self.options.for_schema(base_name);

        if let Some(hook) = opts.schema_hook.as_ref() {
            if let Some(nodes) = hook(raw, base_name) {
                if !nodes.is_empty() {
                    return dedup(nodes);
                }
            }
        }

        dedup(self.parse_node(raw, base_name, &opts))
    }

    // -----------------------------------------------------------------------
    // Core algorithm
    // -----------------------------------------------------------------------

    fn parse_node(
        &mut self,
        raw: Option<&Value>,
        base_name: Option<&str>,
        opts: &CompileOptions,
    ) -> Vec<SchemaNode> {
        let unknown = opts.unknown_type.node();

        let Some(schema) = parse_schema(raw, self.dialect) else {
            return vec![unknown];
        };

        let mut items = base_items(&schema);

        if let Some(pointer) = schema.reference() {
            let mut nodes = vec![self.resolve_ref(pointer)];
            nodes.append(&mut items);
            return nodes;
        }

        if let Some(members) = schema.one_of() {
            return self.parse_union(&schema, members, "oneOf", false, base_name, items, opts);
        }

        if let Some(members) = schema.any_of() {
            return self.parse_union(&schema, members, "anyOf", true, base_name, items, opts);
        }

        if let Some(members) = schema.all_of() {
            return self.parse_intersection(&schema, members, base_name, items, opts);
        }

        if let Some(values) = schema.enum_values() {
            return self.parse_enum(&schema, values, base_name, items, opts);
        }

        if let Some(members) = schema.prefix_items() {
            let entries = members
                .iter()
                .filter_map(|member| self.compile(Some(member), base_name).into_iter().next())
                .collect();
            let mut nodes = vec![SchemaNode::Tuple(entries)];
            nodes.append(&mut items);
            return nodes;
        }

        // const takes precedence over the declared type (3.1 only)
        if self.dialect.is_v31() {
            if let Some(value) = schema.get("const") {
                if value.is_null() {
                    return vec![SchemaNode::Null];
                }

                let format = if value.is_number() {
                    ValueFormat::Number
                } else {
                    ValueFormat::String
                };
                let mut nodes = vec![SchemaNode::Const(ConstNode {
                    name: value.clone(),
                    format,
                    value: value.clone(),
                })];
                nodes.append(&mut items);
                return nodes;
            }
        }

        // Format is more specific than type alone: validators are inserted in
        // front of the type info, and date/binary forms replace the structural
        // node outright.
        if let Some(format) = schema.format() {
            match format {
                "binary" => {
                    items.push(SchemaNode::Blob);
                    return items;
                }
                "date-time" => {
                    if opts.date_type != DateType::Off {
                        let node = match opts.date_type {
                            DateType::Date => SchemaNode::Date(DateRepr::Date),
                            DateType::StringOffset => SchemaNode::DateTime(DateTimeNode {
                                offset: true,
                                local: false,
                            }),
                            DateType::StringLocal => SchemaNode::DateTime(DateTimeNode {
                                offset: false,
                                local: true,
                            }),
                            _ => SchemaNode::DateTime(DateTimeNode::default()),
                        };
                        items.insert(0, node);
                        return items;
                    }
                }
                "date" => {
                    if opts.date_type != DateType::Off {
                        items.insert(0, SchemaNode::Date(date_repr(opts.date_type)));
                        return items;
                    }
                }
                "time" => {
                    if opts.date_type != DateType::Off {
                        items.insert(0, SchemaNode::Time(date_repr(opts.date_type)));
                        return items;
                    }
                }
                "uuid" => items.insert(0, SchemaNode::Uuid),
                "email" | "idn-email" => items.insert(0, SchemaNode::Email),
                "uri" | "ipv4" | "ipv6" | "uri-reference" | "hostname" | "idn-hostname" => {
                    items.insert(0, SchemaNode::Url);
                }
                _ => {
                    // Formats without a refinement node are ignored
                }
            }
        }

        if schema.has("items") || schema.type_str() == Some("array") {
            let compiled = self.compile(schema.get("items"), base_name);
            let mut nodes = vec![SchemaNode::Array(ArrayNode {
                items: compiled,
                min: schema.min().cloned(),
                max: schema.max().cloned(),
            })];
            // Bounds move into the array payload
            nodes.extend(
                items
                    .into_iter()
                    .filter(|node| !matches!(node, SchemaNode::Min(_) | SchemaNode::Max(_))),
            );
            return nodes;
        }

        if schema.get("properties").is_some_and(is_truthy)
            || schema.get("additionalProperties").is_some_and(is_truthy)
        {
            let mut nodes = vec![self.parse_properties(&schema, base_name, opts)];
            nodes.append(&mut items);
            return nodes;
        }

        if let Some(declared) = schema.type_value().filter(|value| is_truthy(value)) {
            if let Some(types) = declared.as_array() {
                // 3.1 type array: re-run with the first entry as the type.
                // The "null" companion was already captured as a nullable node.
                let mut collapsed = schema.raw().clone();
                match types.first() {
                    Some(first) => {
                        collapsed.insert("type".to_string(), first.clone());
                    }
                    None => {
                        collapsed.remove("type");
                    }
                }
                let collapsed = Value::Object(collapsed);

                let mut nodes = self.compile(Some(&collapsed), base_name);
                nodes.append(&mut items);
                return nodes;
            }

            let node = match declared.as_str() {
                Some("string") => SchemaNode::String,
                Some("number") => SchemaNode::Number,
                Some("integer") => SchemaNode::Integer,
                Some("boolean") => SchemaNode::Boolean,
                Some("null") => SchemaNode::Null,
                Some("object") => SchemaNode::Object(ObjectNode::default()),
                other => {
                    tracing::debug!("unrecognized schema type {other:?}, degrading");
                    unknown
                }
            };
            let mut nodes = vec![node];
            nodes.append(&mut items);
            return nodes;
        }

        vec![unknown]
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    /// `oneOf`/`anyOf` → one union node. Members reduce to their first node;
    /// members that fail to parse are dropped. `anyOf` additionally marks
    /// object members strict. Sibling properties compile separately and are
    /// placed before the union.
    #[allow(clippy::too_many_arguments)]
    fn parse_union(
        &mut self,
        schema: &ParsedSchema<'_>,
        members: &[Value],
        keyword: &str,
        strict_objects: bool,
        base_name: Option<&str>,
        mut items: Vec<SchemaNode>,
        opts: &CompileOptions,
    ) -> Vec<SchemaNode> {
        let unknown_kind = opts.unknown_type.node().kind();

        let mut kept = Vec::new();
        for member in members {
            if !is_truthy(member) {
                continue;
            }
            let Some(mut first) = self.compile(Some(member), base_name).into_iter().next() else {
                continue;
            };
            if first.kind() == unknown_kind {
                continue;
            }
            if strict_objects {
                if let SchemaNode::Object(object) = &mut first {
                    object.strict = true;
                }
            }
            kept.push(first);
        }

        let union = SchemaNode::Union(kept);

        if schema.get("properties").is_some_and(is_truthy) {
            let own = schema.without(keyword);
            let mut nodes = self.compile(Some(&own), base_name);
            nodes.push(union);
            nodes.append(&mut items);
            return nodes;
        }

        let mut nodes = vec![union];
        nodes.append(&mut items);
        nodes
    }

    /// `allOf` → one intersection node, same member reduction as unions.
    /// Sibling properties compile to a full sequence appended inside the
    /// intersection's member list, not placed next to it.
    fn parse_intersection(
        &mut self,
        schema: &ParsedSchema<'_>,
        members: &[Value],
        base_name: Option<&str>,
        mut items: Vec<SchemaNode>,
        opts: &CompileOptions,
    ) -> Vec<SchemaNode> {
        let unknown_kind = opts.unknown_type.node().kind();

        let mut kept: Vec<SchemaNode> = members
            .iter()
            .filter(|member| is_truthy(member))
            .filter_map(|member| self.compile(Some(member), base_name).into_iter().next())
            .filter(|first| first.kind() != unknown_kind)
            .collect();

        if schema.get("properties").is_some_and(is_truthy) {
            let own = schema.without("allOf");
            kept.extend(self.compile(Some(&own), base_name));
        }

        let mut nodes = vec![SchemaNode::Intersection(kept)];
        nodes.append(&mut items);
        nodes
    }

    // -----------------------------------------------------------------------
    // Enums
    // -----------------------------------------------------------------------

    fn parse_enum(
        &mut self,
        schema: &ParsedSchema<'_>,
        values: &[Value],
        base_name: Option<&str>,
        items: Vec<SchemaNode>,
        opts: &CompileOptions,
    ) -> Vec<SchemaNode> {
        let candidate =
            format!("{} {}", base_name.unwrap_or_default(), opts.enum_suffix).to_pascal_case();
        let name = unique_name(&candidate, &mut self.used_enum_names);
        let type_name = self.namer.resolve_name(&name, NameKind::Type);

        // x-enumNames has priority over x-enum-varnames
        let extension_names = ["x-enumNames", "x-enum-varnames"]
            .iter()
            .find_map(|key| schema.get(key).and_then(Value::as_array))
            .map(|names| dedup_values(names));

        // Identifier enums cannot carry numeric values, so numeric underlying
        // types force the const form.
        let numeric = matches!(schema.type_str(), Some("number") | Some("integer"));

        let entries: Vec<EnumEntry> = match &extension_names {
            Some(names) => names
                .iter()
                .enumerate()
                .map(|(index, entry_name)| {
                    let value = values.get(index).cloned().unwrap_or(Value::Null);
                    let format = entry_format(numeric, &value);
                    EnumEntry {
                        name: (*entry_name).clone(),
                        value,
                        format,
                    }
                })
                .collect(),
            None => dedup_values(values)
                .into_iter()
                .map(|value| EnumEntry {
                    name: value.clone(),
                    value: value.clone(),
                    format: entry_format(numeric, value),
                })
                .collect(),
        };

        let mut nodes = vec![SchemaNode::Enum(EnumNode {
            name,
            type_name,
            as_const: numeric,
            items: entries,
        })];

        // Range and pattern constraints don't survive enum reduction
        nodes.extend(items.into_iter().filter(|node| {
            !matches!(
                node,
                SchemaNode::Min(_) | SchemaNode::Max(_) | SchemaNode::Pattern(_)
            )
        }));
        nodes
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    fn parse_properties(
        &mut self,
        schema: &ParsedSchema<'_>,
        base_name: Option<&str>,
        opts: &CompileOptions,
    ) -> SchemaNode {
        let required = schema.get("required");

        let mut properties = IndexMap::new();
        if let Some(props) = schema.get("properties").and_then(Value::as_object) {
            for (property, property_schema) in props {
                // Nested schemas get a name scoped under the parent
                let scoped = format!("{} {}", base_name.unwrap_or_default(), property);
                let resolved = self.namer.resolve_name(&scoped, NameKind::Type);

                let is_required = match required {
                    Some(Value::Array(names)) => names
                        .iter()
                        .any(|name| name.as_str() == Some(property.as_str())),
                    Some(other) => is_truthy(other),
                    None => false,
                };
                let nullable = parse_schema(Some(property_schema), self.dialect)
                    .is_some_and(|prop| prop.nullable());

                let mut chain = self.compile(Some(property_schema), Some(&resolved));
                if !is_required && nullable {
                    chain.push(SchemaNode::Nullish);
                } else if !is_required {
                    chain.push(SchemaNode::Optional);
                }

                properties.insert(property.clone(), chain);
            }
        }

        let additional_properties = match schema.get("additionalProperties") {
            Some(Value::Bool(true)) => vec![opts.unknown_type.node()],
            Some(value) if is_truthy(value) => self.compile(Some(value), None),
            _ => Vec::new(),
        };

        SchemaNode::Object(ObjectNode {
            properties,
            additional_properties,
            strict: false,
        })
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    /// Resolve a `$ref` pointer to a ref node, memoizing per run.
    ///
    /// Name derivation happens only on a cache miss; hits rebuild the node
    /// from the stored record without touching the alias counters.
    fn resolve_ref(&mut self, pointer: &str) -> SchemaNode {
        if let Some(record) = self.refs.get(pointer) {
            return SchemaNode::Ref(RefInfo {
                name: record.property_name.clone(),
                path: record.path.clone(),
            });
        }

        // Candidate name is the pointer tail after the last separator
        let candidate = match pointer.rfind('/') {
            Some(index) if index > 0 => &pointer[index + 1..],
            _ => pointer,
        };

        let original_name = unique_name(candidate, &mut self.used_alias_names);
        let property_name = self.namer.resolve_name(&original_name, NameKind::Function);
        let file_name = self.namer.resolve_name(&original_name, NameKind::File);
        let path = self.namer.resolve_path(&file_name, NameKind::File);

        tracing::debug!("registered reference `{pointer}` as `{property_name}`");
        self.refs.insert(
            pointer.to_string(),
            RefRecord {
                property_name: property_name.clone(),
                original_name,
                path: path.clone(),
            },
        );

        SchemaNode::Ref(RefInfo {
            name: property_name,
            path,
        })
    }
}

// ---------------------------------------------------------------------------
// Base items
// ---------------------------------------------------------------------------

/// The constraint and metadata nodes shared by every branch, in contract
/// order: `min`, `max`, `pattern`, the raw type info, `default`, `describe`,
/// then trailing `nullable` and `readOnly` markers.
fn base_items(schema: &ParsedSchema<'_>) -> Vec<SchemaNode> {
    let mut items = Vec::new();

    if let Some(min) = schema.min() {
        items.push(SchemaNode::Min(min.clone()));
    }
    if let Some(max) = schema.max() {
        items.push(SchemaNode::Max(max.clone()));
    }
    if let Some(pattern) = schema.pattern() {
        items.push(SchemaNode::Pattern(pattern.to_string()));
    }

    items.push(SchemaNode::TypeInfo(TypeInfo {
        ty: schema.type_value().filter(|value| !value.is_null()).cloned(),
        format: schema.format().map(str::to_string),
    }));

    if let Some(default) = schema.default_value() {
        // Only string and boolean defaults are carried
        if default.is_string() || default.is_boolean() {
            items.push(SchemaNode::Default(default.clone()));
        }
    }
    if let Some(description) = schema.description() {
        items.push(SchemaNode::Describe(description.to_string()));
    }
    if schema.nullable() {
        items.push(SchemaNode::Nullable);
    }
    if schema.type_array_nullable() {
        // Collapses with a field-level nullable in the top-level dedup
        items.push(SchemaNode::Nullable);
    }
    if schema.read_only() {
        items.push(SchemaNode::ReadOnly);
    }

    items
}

fn date_repr(date_type: DateType) -> DateRepr {
    if date_type == DateType::Date {
        DateRepr::Date
    } else {
        DateRepr::String
    }
}

fn entry_format(numeric: bool, value: &Value) -> ValueFormat {
    if numeric || value.is_number() {
        ValueFormat::Number
    } else {
        ValueFormat::String
    }
}

/// Order-preserving dedup by value equality.
fn dedup_values(values: &[Value]) -> Vec<&Value> {
    let mut unique: Vec<&Value> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.iter().any(|seen| *seen == value) {
            unique.push(value);
        }
    }
    unique
}

/// Top-level structural dedup, first occurrence wins. Nested sequences are
/// left alone — each nested compile already deduplicated its own top level.
fn dedup(nodes: Vec<SchemaNode>) -> Vec<SchemaNode> {
    let mut unique: Vec<SchemaNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !unique.contains(&node) {
            unique.push(node);
        }
    }
    unique
}

// ===========================================================================
// Tests
// ===========================================================================
