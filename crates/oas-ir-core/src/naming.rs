//! The naming service boundary.
//!
//! The compiler never invents final identifiers itself. It derives candidate
//! names (ref aliases from pointer tails, enum names from base names) and
//! hands them to a [`NameResolver`], which owns casing and target-specific
//! conventions. The compiler only relies on resolved names being stable for
//! a given input — two runs over the same document must agree.
//!
//! Collisions inside one run are handled before resolution by
//! [`unique_name`], which suffixes repeats with a counter.

use std::collections::HashMap;

use heck::{ToLowerCamelCase, ToPascalCase};

/// What a candidate name will be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// A type identifier (schemas, enums, properties' nested schemas).
    Type,
    /// A value-level identifier (the referencing side of a ref alias).
    Function,
    /// A file stem fed into path resolution.
    File,
}

/// Resolves candidate names and output paths.
///
/// Implementations must be deterministic: the compiler memoizes resolved
/// references per run and separate runs are expected to converge on the same
/// names for the same document.
pub trait NameResolver {
    /// Map a raw candidate (possibly multi-word, e.g. `"pet tags"`) to an
    /// identifier of the given kind.
    fn resolve_name(&self, candidate: &str, kind: NameKind) -> String;

    /// Map a resolved base name to an output path.
    fn resolve_path(&self, base_name: &str, kind: NameKind) -> String;
}

/// Return `name` on first use and `name2`, `name3`, ... on collisions,
/// recording usage counts in `used`.
pub fn unique_name(name: &str, used: &mut HashMap<String, usize>) -> String {
    let count = used
        .entry(name.to_string())
        .and_modify(|count| *count += 1)
        .or_insert(1);

    if *count > 1 {
        format!("{name}{count}")
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// BasicNamer
// ---------------------------------------------------------------------------

/// A deterministic casing-based [`NameResolver`].
///
/// Types become PascalCase, functions and file stems camelCase, and paths
/// join a configurable root directory with the file stem. Enough for
/// inspection tooling and tests; real emitters bring their own resolver.
#[derive(Debug, Clone)]
pub struct BasicNamer {
    root: String,
}

impl BasicNamer {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for BasicNamer {
    fn default() -> Self {
        Self::new("models")
    }
}

impl NameResolver for BasicNamer {
    fn resolve_name(&self, candidate: &str, kind: NameKind) -> String {
        match kind {
            NameKind::Type => candidate.to_pascal_case(),
            NameKind::Function | NameKind::File => candidate.to_lower_camel_case(),
        }
    }

    fn resolve_path(&self, base_name: &str, _kind: NameKind) -> String {
        format!("{}/{}", self.root, base_name)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
