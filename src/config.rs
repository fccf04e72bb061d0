// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the translator.
//!
//! # Example
//!
//! ```
//! use search_translator::TranslatorConfig;
//!
//! // Minimal config (uses defaults)
//! let config = TranslatorConfig::default();
//! assert_eq!(config.index, "default");
//! assert_eq!(config.identity_field, "_id");
//!
//! // Full config
//! let config = TranslatorConfig {
//!     index: "products".into(),
//!     fold_projection: true,
//!     max_depth: 16,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Configuration for [`SearchTranslator`](crate::SearchTranslator).
///
/// All fields have defaults. The index name is the only one most callers set.
/// It is fixed once the translator is built.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslatorConfig {
    /// Search index every generated `$search` stage targets
    #[serde(default = "default_index")]
    pub index: String,

    /// Path guaranteed present on every document; used for match-all
    #[serde(default = "default_identity_field")]
    pub identity_field: String,

    /// Fold a trailing `$project` into the fold run when the caller does not say otherwise
    #[serde(default)]
    pub fold_projection: bool,

    /// Maximum nesting of junctions and `$not` wrappers
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// `allowAnalyzedField` on regex and wildcard clauses
    #[serde(default = "default_allow_analyzed_regex")]
    pub allow_analyzed_regex: bool,
}

fn default_index() -> String { "default".to_string() }
fn default_identity_field() -> String { "_id".to_string() }
fn default_max_depth() -> usize { 32 }
fn default_allow_analyzed_regex() -> bool { true }

impl TranslatorConfig {
    /// Defaults with the given index name.
    pub fn for_index(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Default::default()
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            identity_field: default_identity_field(),
            fold_projection: false,
            max_depth: default_max_depth(),
            allow_analyzed_regex: default_allow_analyzed_regex(),
        }
    }
}
