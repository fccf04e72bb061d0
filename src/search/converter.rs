// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter → Search Clause converter
//!
//! Walks a parsed [`FilterExpr`] and produces the equivalent (or documented
//! best-effort) [`SearchClause`].
//!
//! # Mapping
//!
//! ```text
//! {f: v}                    → equals(f, v)
//! {f: null}                 → should[equals(f, null), mustNot[exists(f)]] (min 1)
//! {f: []}                   → mustNot[exists(f)]
//! {f: [v]}                  → equals(f, v)
//! {f: [v1, v2]}             → must[equals(f, v1), equals(f, v2)]   (approximate)
//! {f: {$ne: v}}             → mustNot[equals(f, v)]
//! {f: {$gte: a, $lt: b}}    → range(f, gte a), range(f, lt b)
//! {f: {$in: [..]}}          → in(f, [..])
//! {f: {$nin: [..]}}         → mustNot[in(f, [..])]
//! {f: {$exists: b}}         → exists(f) | mustNot[exists(f)]
//! {f: {$regex, $options}}   → regex(f, pattern, flags)
//! {f: {$not: {...}}}        → mustNot[<inner>]
//! {$and: [..]}              → must[..]
//! {$or: [..]}               → should[..] (min 1)
//! {$nor: [..]}              → mustNot[..]
//! ```

use serde_json::Value;

use crate::config::TranslatorConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};

use super::clause::SearchClause;
use super::filter::{
    type_name, FieldPredicate, FilterEntry, FilterExpr, LogicalOp, NotOperand, Operator,
    OperatorSet,
};

/// Stateless converter bound to a translator's configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Converter<'a> {
    config: &'a TranslatorConfig,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(config: &'a TranslatorConfig) -> Self {
        Self { config }
    }

    /// Convert a whole filter into exactly one clause.
    pub(crate) fn convert(&self, expr: &FilterExpr, diags: &mut Diagnostics) -> SearchClause {
        let clauses = self.convert_expr(expr, diags);
        self.assemble(clauses)
    }

    /// Match-all clause: existence of the identity field.
    pub(crate) fn match_all(&self) -> SearchClause {
        SearchClause::exists(self.config.identity_field.clone())
    }

    /// Zero clauses → match-all, one → inlined, more → must.
    fn assemble(&self, clauses: Vec<SearchClause>) -> SearchClause {
        combine(clauses).unwrap_or_else(|| self.match_all())
    }

    fn convert_expr(&self, expr: &FilterExpr, diags: &mut Diagnostics) -> Vec<SearchClause> {
        let mut clauses = Vec::new();
        for entry in &expr.entries {
            match entry {
                FilterEntry::Field { path, predicate } => {
                    clauses.extend(self.convert_field(path, predicate, diags));
                }
                FilterEntry::Logical { op, branches } => {
                    clauses.extend(self.convert_logical(*op, branches, diags));
                }
            }
        }
        clauses
    }

    /// `None` when every branch converted to nothing, so the enclosing
    /// expression falls back to match-all instead of an empty compound.
    fn convert_logical(
        &self,
        op: LogicalOp,
        branches: &[FilterExpr],
        diags: &mut Diagnostics,
    ) -> Option<SearchClause> {
        match op {
            LogicalOp::And => combine(
                branches
                    .iter()
                    .flat_map(|branch| self.convert_expr(branch, diags))
                    .collect(),
            ),
            LogicalOp::Or => self
                .convert_branches(branches, diags)
                .map(|clauses| SearchClause::should(clauses, 1)),
            LogicalOp::Nor => self
                .convert_branches(branches, diags)
                .map(SearchClause::must_not),
        }
    }

    /// One clause per branch, so a multi-key branch stays a conjunction.
    /// Branches that convert to nothing are dropped, not widened to match-all.
    fn convert_branches(
        &self,
        branches: &[FilterExpr],
        diags: &mut Diagnostics,
    ) -> Option<Vec<SearchClause>> {
        let clauses: Vec<SearchClause> = branches
            .iter()
            .filter_map(|branch| combine(self.convert_expr(branch, diags)))
            .collect();
        (!clauses.is_empty()).then_some(clauses)
    }

    fn convert_field(
        &self,
        path: &str,
        predicate: &FieldPredicate,
        diags: &mut Diagnostics,
    ) -> Vec<SearchClause> {
        match predicate {
            FieldPredicate::Null => vec![SearchClause::null_or_missing(path)],
            FieldPredicate::Literal(value) => vec![SearchClause::equals(path, value.clone())],
            FieldPredicate::List(items) => vec![self.convert_list(path, items, diags)],
            FieldPredicate::Operators(set) => self.convert_operators(path, set, diags),
        }
    }

    fn convert_list(&self, path: &str, items: &[Value], diags: &mut Diagnostics) -> SearchClause {
        match items {
            [] => SearchClause::missing(path),
            [only] => SearchClause::equals(path, only.clone()),
            _ => {
                diags.push(Diagnostic::ArrayEqualityApproximation {
                    path: path.to_string(),
                    len: items.len(),
                });
                SearchClause::must(
                    items
                        .iter()
                        .map(|item| SearchClause::equals(path, item.clone()))
                        .collect(),
                )
            }
        }
    }

    fn convert_operators(
        &self,
        path: &str,
        set: &OperatorSet,
        diags: &mut Diagnostics,
    ) -> Vec<SearchClause> {
        let mut clauses = Vec::with_capacity(set.entries.len());
        for op in &set.entries {
            match op {
                Operator::Eq(Value::Null) => clauses.push(SearchClause::null_or_missing(path)),
                Operator::Eq(value) => clauses.push(SearchClause::equals(path, value.clone())),
                // $ne: null means "present and not null"
                Operator::Ne(Value::Null) => clauses.push(SearchClause::must_not(vec![
                    SearchClause::null_or_missing(path),
                ])),
                Operator::Ne(value) => clauses.push(SearchClause::must_not(vec![
                    SearchClause::equals(path, value.clone()),
                ])),
                Operator::Range(bound, value) => {
                    clauses.push(SearchClause::range(path, *bound, value.clone()))
                }
                Operator::In(value) => {
                    if let Some(values) = self.list_operand(path, op, value, diags) {
                        clauses.push(SearchClause::one_of(path, values));
                    }
                }
                Operator::Nin(value) => {
                    if let Some(values) = self.list_operand(path, op, value, diags) {
                        clauses.push(SearchClause::must_not(vec![SearchClause::one_of(
                            path, values,
                        )]));
                    }
                }
                Operator::Exists(value) => match truthiness(value) {
                    Some(true) => clauses.push(SearchClause::exists(path)),
                    Some(false) => clauses.push(SearchClause::missing(path)),
                    None => diags.push(Diagnostic::MalformedOperand {
                        path: path.to_string(),
                        operator: op.keyword().to_string(),
                        reason: format!("expected boolean, got {}", type_name(value)),
                    }),
                },
                Operator::Regex(value) => {
                    if let Some(clause) = self.convert_regex(path, value, set.regex_options(), diags) {
                        clauses.push(clause);
                    }
                }
                Operator::Options(_) => {
                    // Consumed by $regex; only stray flags are reported.
                    if !set.has_regex() {
                        diags.push(Diagnostic::MalformedOperand {
                            path: path.to_string(),
                            operator: op.keyword().to_string(),
                            reason: "$options without $regex".to_string(),
                        });
                    }
                }
                Operator::Not(NotOperand::Operators(inner)) => {
                    let negated = self.convert_operators(path, inner, diags);
                    if !negated.is_empty() {
                        clauses.push(SearchClause::must_not(vec![self.assemble(negated)]));
                    }
                }
                Operator::Not(NotOperand::Malformed(value)) => {
                    diags.push(Diagnostic::MalformedOperand {
                        path: path.to_string(),
                        operator: op.keyword().to_string(),
                        reason: format!("expected operator document, got {}", type_name(value)),
                    });
                }
                Operator::Unrecognized { name, .. } => {
                    diags.push(Diagnostic::UnrecognizedOperator {
                        path: path.to_string(),
                        operator: name.clone(),
                    });
                }
            }
        }
        clauses
    }

    fn convert_regex(
        &self,
        path: &str,
        pattern: &Value,
        options: Option<&Value>,
        diags: &mut Diagnostics,
    ) -> Option<SearchClause> {
        let Value::String(pattern) = pattern else {
            diags.push(Diagnostic::NonStringPattern {
                path: path.to_string(),
            });
            return None;
        };

        let flags = match options {
            Some(Value::String(flags)) if !flags.is_empty() => Some(flags.clone()),
            Some(Value::String(_)) | None => None,
            Some(other) => {
                diags.push(Diagnostic::MalformedOperand {
                    path: path.to_string(),
                    operator: "$options".to_string(),
                    reason: format!("expected string, got {}", type_name(other)),
                });
                None
            }
        };

        Some(SearchClause::Regex {
            path: path.to_string(),
            pattern: pattern.clone(),
            flags,
            allow_analyzed_field: self.config.allow_analyzed_regex,
        })
    }

    fn list_operand(
        &self,
        path: &str,
        op: &Operator,
        value: &Value,
        diags: &mut Diagnostics,
    ) -> Option<Vec<Value>> {
        match value {
            Value::Array(items) => Some(items.clone()),
            other => {
                diags.push(Diagnostic::MalformedOperand {
                    path: path.to_string(),
                    operator: op.keyword().to_string(),
                    reason: format!("expected array, got {}", type_name(other)),
                });
                None
            }
        }
    }
}

/// Zero clauses → `None`, one → inlined, more → must.
fn combine(mut clauses: Vec<SearchClause>) -> Option<SearchClause> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(SearchClause::must(clauses)),
    }
}

/// `$exists` accepts booleans and numbers (0 is false).
fn truthiness(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().map_or(true, |f| f != 0.0)),
        _ => None,
    }
}
