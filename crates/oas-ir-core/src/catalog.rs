//! The schema catalog — named entries extracted from an OpenAPI document —
//! and the build orchestration over it.
//!
//! [`Catalog::from_document`] walks `components` and collects schemas by
//! name, in document order. Responses and request bodies contribute the
//! schema under their negotiated media type. [`Catalog::build`] then runs an
//! emit function per entry: one entry failing never aborts the others, and
//! successful artifacts always come out in catalog order.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BuildError;

/// Which `components` sections feed the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Include {
    Schemas,
    Responses,
    RequestBodies,
}

/// One failed catalog entry, reported alongside the successful artifacts.
#[derive(Debug)]
pub struct EntryFailure {
    pub name: String,
    pub error: BuildError,
}

/// Result of a catalog build. `artifacts` holds the emit results of every
/// successful entry in catalog order; `failures` the entries that did not
/// make it.
#[derive(Debug)]
pub struct BuildOutput<A> {
    pub artifacts: Vec<A>,
    pub failures: Vec<EntryFailure>,
}

impl<A> Default for BuildOutput<A> {
    fn default() -> Self {
        Self {
            artifacts: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Named schemas to compile, in extraction order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: IndexMap<String, Value>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract a catalog from a parsed OpenAPI document.
    ///
    /// Sections are visited in `includes` order; inside a section, entries
    /// keep their document order. A missing `components` block yields an
    /// empty catalog. Only a non-object document root is an error — entries
    /// without a usable schema are skipped, and duplicate names across
    /// sections are overwritten with a warning.
    pub fn from_document(
        document: &Value,
        includes: &[Include],
        content_type: Option<&str>,
    ) -> Result<Catalog, BuildError> {
        let Some(root) = document.as_object() else {
            return Err(BuildError::InvalidDocument(
                "expected a JSON object at the document root".to_string(),
            ));
        };

        let mut entries = IndexMap::new();
        let Some(components) = root.get("components").and_then(Value::as_object) else {
            return Ok(Catalog { entries });
        };

        for include in includes {
            match include {
                Include::Schemas => collect_schemas(&mut entries, components),
                Include::Responses => {
                    collect_media_schemas(&mut entries, components, "responses", content_type);
                }
                Include::RequestBodies => {
                    collect_media_schemas(&mut entries, components, "requestBodies", content_type);
                }
            }
        }

        Ok(Catalog { entries })
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: Value) {
        insert_entry(&mut self.entries, &name.into(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `emit` over every entry in catalog order.
    ///
    /// A failing entry is recorded and skipped; the rest of the catalog still
    /// builds. The artifacts of surviving entries keep catalog order.
    pub fn build<A, F>(&self, mut emit: F) -> BuildOutput<A>
    where
        F: FnMut(&str, &Value) -> Result<Vec<A>, BuildError>,
    {
        let mut output = BuildOutput::default();
        for (name, schema) in &self.entries {
            match emit(name, schema) {
                Ok(mut artifacts) => output.artifacts.append(&mut artifacts),
                Err(error) => {
                    tracing::warn!("catalog entry `{name}` failed: {error}");
                    output.failures.push(EntryFailure {
                        name: name.clone(),
                        error,
                    });
                }
            }
        }
        output
    }

    /// Like [`Catalog::build`], fanning entries out over a thread pool.
    ///
    /// `emit` runs once per entry with no shared mutable state, so callers
    /// wanting ref memoization across entries should use the sequential
    /// build. Output order is catalog order regardless of scheduling.
    pub fn build_parallel<A, F>(&self, emit: F) -> BuildOutput<A>
    where
        A: Send,
        F: Fn(&str, &Value) -> Result<Vec<A>, BuildError> + Sync,
    {
        let entries: Vec<(&String, &Value)> = self.entries.iter().collect();
        let results: Vec<Result<Vec<A>, BuildError>> = entries
            .par_iter()
            .map(|(name, schema)| emit(name.as_str(), schema))
            .collect();

        let mut output = BuildOutput::default();
        for ((name, _), result) in entries.into_iter().zip(results) {
            match result {
                Ok(mut artifacts) => output.artifacts.append(&mut artifacts),
                Err(error) => {
                    tracing::warn!("catalog entry `{name}` failed: {error}");
                    output.failures.push(EntryFailure {
                        name: name.clone(),
                        error,
                    });
                }
            }
        }
        output
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn insert_entry(entries: &mut IndexMap<String, Value>, name: &str, schema: Value) {
    if entries.insert(name.to_string(), schema).is_some() {
        tracing::warn!("duplicate catalog entry `{name}`, keeping the later definition");
    }
}

fn collect_schemas(entries: &mut IndexMap<String, Value>, components: &Map<String, Value>) {
    let Some(value) = components.get("schemas") else {
        return;
    };
    let Some(section) = value.as_object() else {
        tracing::warn!("components.schemas is not an object, skipping");
        return;
    };

    for (name, schema) in section {
        insert_entry(entries, name, schema.clone());
    }
}

fn collect_media_schemas(
    entries: &mut IndexMap<String, Value>,
    components: &Map<String, Value>,
    section: &str,
    content_type: Option<&str>,
) {
    let Some(value) = components.get(section) else {
        return;
    };
    let Some(section_map) = value.as_object() else {
        tracing::warn!("components.{section} is not an object, skipping");
        return;
    };

    for (name, entry) in section_map {
        match content_schema(entry, content_type) {
            Some(schema) => insert_entry(entries, name, schema.clone()),
            None => {
                tracing::debug!("no usable schema under components.{section}.{name}, skipping");
            }
        }
    }
}

/// The schema carried by a response/request-body entry.
///
/// A `$ref` entry is passed through whole so the compiler emits a reference
/// node for it. Otherwise the schema comes from the requested media type, or
/// the first declared one when no content type is given.
fn content_schema<'v>(entry: &'v Value, content_type: Option<&str>) -> Option<&'v Value> {
    if entry.get("$ref").is_some() {
        return Some(entry);
    }

    let content = entry.get("content")?.as_object()?;
    let media = match content_type {
        Some(requested) => content.get(requested),
        None => content.values().next(),
    }?;
    media.get("schema")
}

// ===========================================================================
// Tests
// ===========================================================================
