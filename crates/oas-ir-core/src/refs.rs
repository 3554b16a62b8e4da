//! The per-run reference table.
//!
//! Every distinct `$ref` pointer resolved during a compilation run gets one
//! [`RefRecord`] here on first sight; later sights reuse it. The table is the
//! cycle-breaking mechanism (references are never inlined) and doubles as the
//! run's export manifest: emitters walk it to know which named schemas the
//! output depends on.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The names derived for one referenced schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefRecord {
    /// Identifier used at the referencing site.
    pub property_name: String,
    /// The pointer tail before any naming transform, uniqued per run.
    pub original_name: String,
    /// Resolved output location of the referenced schema.
    pub path: String,
}

/// Reference pointer → record, in first-resolution order.
pub type Refs = IndexMap<String, RefRecord>;
