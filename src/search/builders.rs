// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Full-text and prefix clause builders
//!
//! These have no filter-document counterpart; callers build them directly.
//!
//! ```text
//! full_text("rust db", ["title", "body"])  → {"text": {"query": "rust db", "path": ["title", "body"]}}
//! prefix("adm", "email")                   → {"wildcard": {"query": "adm*", "path": "email", ...}}
//! ```

use serde::Deserialize;
use serde_json::{json, Value};

use super::clause::{SearchClause, SearchPath};

/// Edit-distance matching for `text` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FuzzyOptions {
    /// 1 or 2; other values are clamped
    #[serde(default = "default_max_edits")]
    pub max_edits: u8,
    /// Leading characters that must match exactly
    #[serde(default)]
    pub prefix_length: u32,
    #[serde(default = "default_max_expansions")]
    pub max_expansions: u32,
}

fn default_max_edits() -> u8 { 2 }
fn default_max_expansions() -> u32 { 50 }

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            max_edits: default_max_edits(),
            prefix_length: 0,
            max_expansions: default_max_expansions(),
        }
    }
}

impl FuzzyOptions {
    pub(crate) fn to_value(&self) -> Value {
        json!({
            "maxEdits": self.max_edits.clamp(1, 2),
            "prefixLength": self.prefix_length,
            "maxExpansions": self.max_expansions,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TextOptions {
    #[serde(default)]
    pub fuzzy: Option<FuzzyOptions>,
    #[serde(default)]
    pub score_boost: Option<f64>,
}

impl TextOptions {
    pub fn fuzzy(mut self, fuzzy: FuzzyOptions) -> Self {
        self.fuzzy = Some(fuzzy);
        self
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.score_boost = Some(boost);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrefixOptions {
    /// Overrides the translator's `allow_analyzed_regex`
    #[serde(default)]
    pub allow_analyzed_field: Option<bool>,
}

pub(crate) fn full_text_clause(
    text: &str,
    path: SearchPath,
    options: &TextOptions,
) -> SearchClause {
    SearchClause::Text {
        path,
        query: text.to_string(),
        fuzzy: options.fuzzy,
        score_boost: options.score_boost,
    }
}

pub(crate) fn prefix_clause(text: &str, path: &str, allow_analyzed_field: bool) -> SearchClause {
    SearchClause::Wildcard {
        path: path.to_string(),
        query: format!("{}*", escape_wildcard(text)),
        allow_analyzed_field,
    }
}

/// Escape wildcard metacharacters so the text matches literally.
fn escape_wildcard(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' | '?' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
