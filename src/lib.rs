// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Search Translator
//!
//! Translates MongoDB-style filter documents and aggregation pipelines into
//! Atlas-Search-style `$search` requests.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Parse                               │
//! │  • Filter JSON → FilterExpr (closed operator vocabulary)    │
//! │  • Fatal: unknown junction, top-level $not, bad shapes      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Convert                              │
//! │  • Field/operator → equals, range, in, exists, regex        │
//! │  • $and/$or/$nor → compound must/should/mustNot             │
//! │  • Unknown operators skipped with a Diagnostic              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Fold                               │
//! │  • $match + $sort → $search{sort}                           │
//! │  • $limit / $skip / $project stay separate stages           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use search_translator::{PipelineOptions, SearchTranslator};
//! use serde_json::json;
//!
//! let translator = SearchTranslator::for_index("orders");
//!
//! let translation = translator
//!     .translate_pipeline(
//!         &json!([
//!             { "$match": { "status": "active" } },
//!             { "$sort": { "createdAt": -1 } },
//!             { "$limit": 10 }
//!         ]),
//!         &PipelineOptions::default(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(translation.output.len(), 2);
//! assert!(translation.is_exact());
//! ```
//!
//! ## Diagnostics
//!
//! Constructs the target cannot express exactly (multi-element array
//! equality, unknown operators, non-numeric sort directions) never fail the
//! call. They are returned as [`Diagnostic`]s on the [`Translation`] and
//! logged through `tracing`.
//!
//! ## Modules
//!
//! - [`search`]: filter model, clause AST, conversion and pipeline folding
//! - [`config`]: [`TranslatorConfig`]
//! - [`metrics`]: `metrics` counters and histograms

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod search;
pub mod translator;

pub use config::TranslatorConfig;
pub use diagnostics::{Diagnostic, Translation};
pub use error::{Result, TranslateError};
pub use search::{
    FindDirectives, FuzzyOptions, Junction, Pipeline, PipelineOptions, PrefixOptions,
    RangeBound, RangeClause, SearchClause, SearchPath, SearchRequest, SortSpec, Stage,
    TextOptions,
};
pub use translator::SearchTranslator;
