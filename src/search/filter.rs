// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Filter Expression model
//!
//! Parses a MongoDB-style filter document into an ordered, closed-vocabulary
//! tree. All string dispatch over operator and junction keys happens here;
//! the converter matches exhaustively over the resulting enums.
//!
//! ```text
//! {"status": "active"}                      field → literal
//! {"tags": ["a", "b"]}                      field → list
//! {"deletedAt": null}                       field → null
//! {"age": {"$gte": 18, "$lt": 65}}          field → operator set
//! {"$or": [{"a": 1}, {"b": 2}]}             junction → branches
//! ```

use serde_json::{Map, Value};

use crate::error::{Result, TranslateError};

use super::clause::RangeBound;

/// Extended-JSON wrappers that denote a scalar literal rather than an operator set.
const EXTENDED_JSON_KEYS: &[&str] = &[
    "$date",
    "$oid",
    "$numberLong",
    "$numberInt",
    "$numberDouble",
    "$numberDecimal",
    "$binary",
    "$timestamp",
    "$uuid",
];

/// Expression-level junction keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nor,
}

impl LogicalOp {
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOp::And => "$and",
            LogicalOp::Or => "$or",
            LogicalOp::Nor => "$nor",
        }
    }
}

/// Parsed filter document. Entries keep input key order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterExpr {
    pub entries: Vec<FilterEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterEntry {
    Logical {
        op: LogicalOp,
        branches: Vec<FilterExpr>,
    },
    Field {
        path: String,
        predicate: FieldPredicate,
    },
}

/// Right-hand side of a field entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPredicate {
    Null,
    /// Scalar, embedded document or Extended-JSON literal
    Literal(Value),
    /// Implicit exact-array / membership match
    List(Vec<Value>),
    Operators(OperatorSet),
}

/// Per-field operator map. Entries keep input key order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperatorSet {
    pub entries: Vec<Operator>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(Value),
    Ne(Value),
    Range(RangeBound, Value),
    In(Value),
    Nin(Value),
    Exists(Value),
    Regex(Value),
    /// Flags paired with `$regex`; consumed by the regex entry
    Options(Value),
    Not(NotOperand),
    Unrecognized { name: String, value: Value },
}

impl Operator {
    pub fn keyword(&self) -> &str {
        match self {
            Operator::Eq(_) => "$eq",
            Operator::Ne(_) => "$ne",
            Operator::Range(RangeBound::Gt, _) => "$gt",
            Operator::Range(RangeBound::Gte, _) => "$gte",
            Operator::Range(RangeBound::Lt, _) => "$lt",
            Operator::Range(RangeBound::Lte, _) => "$lte",
            Operator::In(_) => "$in",
            Operator::Nin(_) => "$nin",
            Operator::Exists(_) => "$exists",
            Operator::Regex(_) => "$regex",
            Operator::Options(_) => "$options",
            Operator::Not(_) => "$not",
            Operator::Unrecognized { name, .. } => name,
        }
    }
}

/// Operand of a field-level `$not`.
#[derive(Debug, Clone, PartialEq)]
pub enum NotOperand {
    Operators(OperatorSet),
    /// Anything that is not an operator document; skipped by the converter
    Malformed(Value),
}

impl OperatorSet {
    /// Flags string from a `$options` entry, if any.
    pub fn regex_options(&self) -> Option<&Value> {
        self.entries.iter().find_map(|op| match op {
            Operator::Options(value) => Some(value),
            _ => None,
        })
    }

    pub fn has_regex(&self) -> bool {
        self.entries.iter().any(|op| matches!(op, Operator::Regex(_)))
    }
}

impl FilterExpr {
    /// Parse a filter document, rejecting nesting deeper than `max_depth`.
    pub fn parse(value: &Value, max_depth: usize) -> Result<Self> {
        match value {
            Value::Object(map) => Self::parse_map(map, 0, max_depth),
            other => Err(TranslateError::InvalidFilter(format!(
                "filter must be an object, got {}",
                type_name(other)
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn parse_map(map: &Map<String, Value>, depth: usize, max_depth: usize) -> Result<Self> {
        if depth > max_depth {
            return Err(TranslateError::DepthExceeded { max: max_depth });
        }

        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let entry = if key.starts_with('$') {
                let op = match key.as_str() {
                    "$and" => LogicalOp::And,
                    "$or" => LogicalOp::Or,
                    "$nor" => LogicalOp::Nor,
                    "$not" => return Err(TranslateError::TopLevelNot),
                    other => {
                        return Err(TranslateError::UnsupportedLogicalOperator(other.to_string()))
                    }
                };
                FilterEntry::Logical {
                    op,
                    branches: Self::parse_branches(op, value, depth, max_depth)?,
                }
            } else if key.is_empty() {
                return Err(TranslateError::InvalidFilter("empty field path".to_string()));
            } else {
                FilterEntry::Field {
                    path: key.clone(),
                    predicate: FieldPredicate::parse(value, depth, max_depth)?,
                }
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    fn parse_branches(
        op: LogicalOp,
        value: &Value,
        depth: usize,
        max_depth: usize,
    ) -> Result<Vec<FilterExpr>> {
        let items = match value {
            Value::Array(items) if !items.is_empty() => items,
            _ => {
                return Err(TranslateError::InvalidFilter(format!(
                    "{} must be a non-empty array",
                    op.keyword()
                )))
            }
        };

        items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Self::parse_map(map, depth + 1, max_depth),
                other => Err(TranslateError::InvalidFilter(format!(
                    "{} entries must be objects, got {}",
                    op.keyword(),
                    type_name(other)
                ))),
            })
            .collect()
    }
}

impl FieldPredicate {
    fn parse(value: &Value, depth: usize, max_depth: usize) -> Result<Self> {
        Ok(match value {
            Value::Null => FieldPredicate::Null,
            Value::Array(items) => FieldPredicate::List(items.clone()),
            Value::Object(map) if is_operator_document(map) => {
                FieldPredicate::Operators(OperatorSet::parse(map, depth, max_depth)?)
            }
            other => FieldPredicate::Literal(other.clone()),
        })
    }
}

impl OperatorSet {
    fn parse(map: &Map<String, Value>, depth: usize, max_depth: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let op = match key.as_str() {
                "$eq" => Operator::Eq(value.clone()),
                "$ne" => Operator::Ne(value.clone()),
                "$gt" => Operator::Range(RangeBound::Gt, value.clone()),
                "$gte" => Operator::Range(RangeBound::Gte, value.clone()),
                "$lt" => Operator::Range(RangeBound::Lt, value.clone()),
                "$lte" => Operator::Range(RangeBound::Lte, value.clone()),
                "$in" => Operator::In(value.clone()),
                "$nin" => Operator::Nin(value.clone()),
                "$exists" => Operator::Exists(value.clone()),
                "$regex" => Operator::Regex(value.clone()),
                "$options" => Operator::Options(value.clone()),
                "$not" => {
                    if depth + 1 > max_depth {
                        return Err(TranslateError::DepthExceeded { max: max_depth });
                    }
                    Operator::Not(match value {
                        Value::Object(inner) if is_operator_document(inner) => {
                            NotOperand::Operators(Self::parse(inner, depth + 1, max_depth)?)
                        }
                        other => NotOperand::Malformed(other.clone()),
                    })
                }
                other => Operator::Unrecognized {
                    name: other.to_string(),
                    value: value.clone(),
                },
            };
            entries.push(op);
        }
        Ok(Self { entries })
    }
}

/// An object is an operator document when its first key is `$`-prefixed and
/// it is not a single-key Extended-JSON literal.
fn is_operator_document(map: &Map<String, Value>) -> bool {
    let Some(first) = map.keys().next() else {
        return false;
    };
    if map.len() == 1 && EXTENDED_JSON_KEYS.contains(&first.as_str()) {
        return false;
    }
    first.starts_with('$')
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<FilterExpr> {
        FilterExpr::parse(&value, 32)
    }

    #[test]
    fn test_field_predicates() {
        let expr = parse(json!({
            "status": "active",
            "deletedAt": null,
            "tags": ["a", "b"],
            "age": { "$gte": 18 },
            "address": { "city": "Leeds" }
        }))
        .unwrap();

        let predicates: Vec<&FieldPredicate> = expr
            .entries
            .iter()
            .map(|entry| match entry {
                FilterEntry::Field { predicate, .. } => predicate,
                _ => panic!("Expected Field entry"),
            })
            .collect();

        assert_eq!(predicates[0], &FieldPredicate::Literal(json!("active")));
        assert_eq!(predicates[1], &FieldPredicate::Null);
        assert_eq!(predicates[2], &FieldPredicate::List(vec![json!("a"), json!("b")]));
        assert!(matches!(predicates[3], FieldPredicate::Operators(_)));
        assert_eq!(predicates[4], &FieldPredicate::Literal(json!({ "city": "Leeds" })));
    }

    #[test]
    fn test_key_order_preserved() {
        let expr = parse(json!({ "z": 1, "a": 2, "m": 3 })).unwrap();
        let paths: Vec<&str> = expr
            .entries
            .iter()
            .filter_map(|entry| match entry {
                FilterEntry::Field { path, .. } => Some(path.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(paths, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_extended_json_is_literal() {
        let expr = parse(json!({ "createdAt": { "$date": "2024-01-01T00:00:00Z" } })).unwrap();
        match &expr.entries[0] {
            FilterEntry::Field { predicate, .. } => {
                assert_eq!(
                    predicate,
                    &FieldPredicate::Literal(json!({ "$date": "2024-01-01T00:00:00Z" }))
                );
            }
            _ => panic!("Expected Field entry"),
        }
    }

    #[test]
    fn test_unrecognized_operator_is_kept() {
        let expr = parse(json!({ "age": { "$gte": 1, "$between": [1, 2] } })).unwrap();
        match &expr.entries[0] {
            FilterEntry::Field {
                predicate: FieldPredicate::Operators(set),
                ..
            } => {
                assert_eq!(set.entries.len(), 2);
                assert_eq!(set.entries[1].keyword(), "$between");
            }
            _ => panic!("Expected operator set"),
        }
    }

    #[test]
    fn test_logical_branches() {
        let expr = parse(json!({ "$or": [{ "a": 1 }, { "b": 2 }] })).unwrap();
        match &expr.entries[0] {
            FilterEntry::Logical { op, branches } => {
                assert_eq!(*op, LogicalOp::Or);
                assert_eq!(branches.len(), 2);
            }
            _ => panic!("Expected Logical entry"),
        }
    }

    #[test]
    fn test_top_level_not_rejected() {
        let err = parse(json!({ "$not": { "a": 1 } })).unwrap_err();
        assert_eq!(err, TranslateError::TopLevelNot);
    }

    #[test]
    fn test_unknown_logical_rejected() {
        let err = parse(json!({ "$where": "this.a > 1" })).unwrap_err();
        assert_eq!(err, TranslateError::UnsupportedLogicalOperator("$where".into()));
    }

    #[test]
    fn test_junction_requires_non_empty_array() {
        assert!(matches!(
            parse(json!({ "$and": [] })),
            Err(TranslateError::InvalidFilter(_))
        ));
        assert!(matches!(
            parse(json!({ "$or": { "a": 1 } })),
            Err(TranslateError::InvalidFilter(_))
        ));
        assert!(matches!(
            parse(json!({ "$nor": [1] })),
            Err(TranslateError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_non_object_filter_rejected() {
        assert!(matches!(parse(json!([1, 2])), Err(TranslateError::InvalidFilter(_))));
    }

    #[test]
    fn test_depth_limit() {
        let mut filter = json!({ "a": 1 });
        for _ in 0..5 {
            filter = json!({ "$and": [filter] });
        }
        assert!(FilterExpr::parse(&filter, 5).is_ok());
        assert_eq!(
            FilterExpr::parse(&filter, 4).unwrap_err(),
            TranslateError::DepthExceeded { max: 4 }
        );
    }

    #[test]
    fn test_not_operand_shapes() {
        let expr = parse(json!({ "a": { "$not": { "$gt": 5 } }, "b": { "$not": 5 } })).unwrap();
        let operands: Vec<&NotOperand> = expr
            .entries
            .iter()
            .filter_map(|entry| match entry {
                FilterEntry::Field {
                    predicate: FieldPredicate::Operators(set),
                    ..
                } => match &set.entries[0] {
                    Operator::Not(operand) => Some(operand),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert!(matches!(operands[0], NotOperand::Operators(_)));
        assert!(matches!(operands[1], NotOperand::Malformed(_)));
    }
}
