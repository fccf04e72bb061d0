// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Translation
//!
//! Filter documents and aggregation pipelines in, `$search` requests out.
//!
//! # Architecture
//!
//! ```text
//! filter JSON
//!     ↓
//! FilterExpr::parse   (closed vocabulary, fatal errors)
//!     ↓
//! Converter           (clauses, diagnostics)
//!     ↓
//! PipelineFolder      ($match + following stages → $search + leftovers)
//! ```
//!
//! # Operator Mapping
//!
//! ```text
//! {status: "active"}             → equals
//! {age: {$gte: 18}}              → range
//! {tags: {$in: [..]}}            → in
//! {email: {$exists: true}}       → exists
//! {name: {$regex: "^al"}}        → regex
//! {$or: [..]}                    → compound.should (minimumShouldMatch 1)
//! {$nor: [..]}                   → compound.mustNot
//! ```

mod builders;
mod clause;
mod converter;
mod filter;
mod pipeline;

pub use builders::{FuzzyOptions, PrefixOptions, TextOptions};
pub use clause::{Junction, RangeBound, RangeClause, SearchClause, SearchPath};
pub use filter::{FieldPredicate, FilterEntry, FilterExpr, LogicalOp, NotOperand, Operator, OperatorSet};
pub use pipeline::{FindDirectives, Pipeline, PipelineOptions, SearchRequest, SortSpec, Stage};

pub(crate) use builders::{full_text_clause, prefix_clause};
pub(crate) use converter::Converter;
pub(crate) use pipeline::{FoldRun, PipelineFolder};
