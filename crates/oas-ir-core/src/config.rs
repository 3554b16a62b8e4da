//! Compiler options, per-schema overrides, and the bypass hook.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ir::SchemaNode;

/// How `format: date`/`time`/`date-time` schemas are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateType {
    /// Leave date formats uninterpreted; only the raw `typeInfo` carries them.
    Off,
    /// Native date values.
    Date,
    /// Date strings (default).
    String,
    /// Date-time strings with a timezone offset.
    StringOffset,
    /// Date-time strings in local time.
    StringLocal,
}

/// The node emitted wherever a schema cannot be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownType {
    /// Permissive `any` (default).
    Any,
    /// Strict `unknown`, forcing emitters to narrow before use.
    Unknown,
}

impl UnknownType {
    pub fn node(self) -> SchemaNode {
        match self {
            UnknownType::Any => SchemaNode::Any,
            UnknownType::Unknown => SchemaNode::Unknown,
        }
    }
}

/// Preferred enum rendering, carried through to emitters. The compiler itself
/// only consults the numeric-enum rule, which forces `asConst` regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnumMode {
    Enum,
    AsConst,
    AsPascalConst,
    ConstEnum,
    Literal,
}

/// Full bypass: when set and returning a non-empty list for a schema, that
/// list is used verbatim instead of running the compiler. Empty or `None`
/// results fall through to the normal algorithm.
pub type SchemaHook =
    Arc<dyn Fn(Option<&Value>, Option<&str>) -> Option<Vec<SchemaNode>> + Send + Sync>;

/// Options for schema compilation.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g. `date-type`, `enum-mode`).
/// The bypass hook is runtime-only and never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompileOptions {
    /// Date format handling. Default: string.
    pub date_type: DateType,
    /// Node for unparseable schemas. Default: any.
    pub unknown_type: UnknownType,
    /// Enum rendering preference. Default: as-const.
    pub enum_mode: EnumMode,
    /// Suffix appended to derived enum names before casing.
    #[serde(default)]
    pub enum_suffix: String,
    /// Per-schema option overrides; the first entry whose pattern matches the
    /// schema's base name wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OptionsOverride>,
    #[serde(skip)]
    pub schema_hook: Option<SchemaHook>,
}

/// One override entry: a regex over schema base names plus the options to
/// merge over the base options on a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OptionsOverride {
    pub pattern: String,
    #[serde(default)]
    pub options: OverrideOptions,
}

/// The overridable subset of [`CompileOptions`]. Unset fields keep the base
/// value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OverrideOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_type: Option<DateType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_type: Option<UnknownType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_mode: Option<EnumMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_suffix: Option<String>,
}

impl CompileOptions {
    /// Resolve the effective options for a schema name.
    ///
    /// Overrides are tried in order; the first whose pattern matches anywhere
    /// in the base name is merged over the base options. Entries with invalid
    /// patterns are skipped with a warning — an override never fails a compile.
    pub fn for_schema(&self, base_name: Option<&str>) -> CompileOptions {
        let mut effective = self.clone();
        let Some(name) = base_name else {
            return effective;
        };

        for entry in &self.overrides {
            let regex = match Regex::new(&entry.pattern) {
                Ok(regex) => regex,
                Err(err) => {
                    tracing::warn!(
                        "skipping options override with invalid pattern `{}`: {err}",
                        entry.pattern
                    );
                    continue;
                }
            };

            if regex.is_match(name) {
                effective.merge(&entry.options);
                break;
            }
        }

        effective
    }

    fn merge(&mut self, patch: &OverrideOptions) {
        if let Some(date_type) = patch.date_type {
            self.date_type = date_type;
        }
        if let Some(unknown_type) = patch.unknown_type {
            self.unknown_type = unknown_type;
        }
        if let Some(enum_mode) = patch.enum_mode {
            self.enum_mode = enum_mode;
        }
        if let Some(enum_suffix) = &patch.enum_suffix {
            self.enum_suffix = enum_suffix.clone();
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            date_type: DateType::String,
            unknown_type: UnknownType::Any,
            enum_mode: EnumMode::AsConst,
            enum_suffix: String::new(),
            overrides: Vec::new(),
            schema_hook: None,
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("date_type", &self.date_type)
            .field("unknown_type", &self.unknown_type)
            .field("enum_mode", &self.enum_mode)
            .field("enum_suffix", &self.enum_suffix)
            .field("overrides", &self.overrides)
            .field("schema_hook", &self.schema_hook.as_ref().map(|_| ".."))
            .finish()
    }
}
