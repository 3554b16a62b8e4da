//! Compile OpenAPI 3.0 / 3.1 schemas into a backend-agnostic node IR.
//!
//! Instead of handing emitters raw schema JSON, this crate flattens each
//! schema into an ordered [`SchemaNode`] sequence: one structural or scalar
//! node followed by constraint and metadata nodes. Emitters for different
//! targets fold the same sequences without re-implementing OpenAPI's keyword
//! rules, version quirks, or reference handling.
//!
//! Compilation never fails: unparseable input degrades to a configurable
//! `unknown`/`any` node and the surrounding schema still compiles. Errors
//! only exist at the edges — document parsing, catalog extraction, and
//! emitter callbacks run through [`Catalog::build`].
//!
//! ```
//! use oas_ir_core::{compile, CompileOptions, Dialect, SchemaNode};
//! use serde_json::json;
//!
//! let schema = json!({ "type": "string", "maxLength": 64 });
//! let (nodes, _refs) = compile(
//!     Some(&schema),
//!     Some("name"),
//!     CompileOptions::default(),
//!     Dialect::V30,
//! );
//! assert_eq!(nodes[0], SchemaNode::String);
//! ```

use serde_json::Value;

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ir;
pub mod naming;
pub mod normalize;
pub mod query;
pub mod refs;

pub use catalog::{BuildOutput, Catalog, EntryFailure, Include};
pub use compiler::SchemaCompiler;
pub use config::{
    CompileOptions, DateType, EnumMode, OptionsOverride, OverrideOptions, SchemaHook, UnknownType,
};
pub use error::BuildError;
pub use ir::{
    ArrayNode, ConstNode, DateRepr, DateTimeNode, EnumEntry, EnumNode, NodeKind, ObjectNode,
    RefInfo, SchemaNode, TypeInfo, ValueFormat,
};
pub use naming::{unique_name, BasicNamer, NameKind, NameResolver};
pub use normalize::Dialect;
pub use query::{find_all, find_first};
pub use refs::{RefRecord, Refs};

/// One-shot compile of a single schema with the default namer.
///
/// Returns the node sequence together with the run's reference table. For
/// multiple schemas sharing one reference table, drive a [`SchemaCompiler`]
/// directly.
pub fn compile(
    raw: Option<&Value>,
    base_name: Option<&str>,
    options: CompileOptions,
    dialect: Dialect,
) -> (Vec<SchemaNode>, Refs) {
    let namer = BasicNamer::default();
    let mut compiler = SchemaCompiler::new(options, &namer, dialect);
    let nodes = compiler.compile(raw, base_name);
    (nodes, compiler.into_refs())
}
