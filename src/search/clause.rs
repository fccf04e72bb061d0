// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Clause AST
//!
//! Target-side predicate tree and its rendering to `$search` operator JSON.
//!
//! # Rendered Syntax
//!
//! ```text
//! {"equals":   {"path": "status", "value": "active"}}
//! {"range":    {"path": "age", "gte": 18}}
//! {"in":       {"path": "tags", "value": ["a", "b"]}}
//! {"exists":   {"path": "email"}}
//! {"regex":    {"path": "name", "query": "^al", "allowAnalyzedField": true}}
//! {"text":     {"path": ["title", "body"], "query": "rust"}}
//! {"wildcard": {"path": "email", "query": "admin*", "allowAnalyzedField": true}}
//! {"compound": {"must": [...]}}
//! {"compound": {"should": [...], "minimumShouldMatch": 1}}
//! {"compound": {"mustNot": [...]}}
//! ```

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::builders::FuzzyOptions;

/// Combination semantics of a compound clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    /// Every sub-clause must match
    Must,
    /// At least `minimum` sub-clauses must match
    Should { minimum: u32 },
    /// No sub-clause may match
    MustNot,
}

impl Junction {
    fn key(&self) -> &'static str {
        match self {
            Junction::Must => "must",
            Junction::Should { .. } => "should",
            Junction::MustNot => "mustNot",
        }
    }
}

/// Single range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeBound {
    pub fn key(&self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Gte => "gte",
            RangeBound::Lt => "lt",
            RangeBound::Lte => "lte",
        }
    }
}

/// Range clause. Any subset of the four bounds may be set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeClause {
    pub path: String,
    pub gt: Option<Value>,
    pub gte: Option<Value>,
    pub lt: Option<Value>,
    pub lte: Option<Value>,
}

impl RangeClause {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set one bound, replacing any previous value for it.
    pub fn with_bound(mut self, bound: RangeBound, value: Value) -> Self {
        let slot = match bound {
            RangeBound::Gt => &mut self.gt,
            RangeBound::Gte => &mut self.gte,
            RangeBound::Lt => &mut self.lt,
            RangeBound::Lte => &mut self.lte,
        };
        *slot = Some(value);
        self
    }

    pub fn bounds(&self) -> impl Iterator<Item = (RangeBound, &Value)> {
        [
            (RangeBound::Gt, self.gt.as_ref()),
            (RangeBound::Gte, self.gte.as_ref()),
            (RangeBound::Lt, self.lt.as_ref()),
            (RangeBound::Lte, self.lte.as_ref()),
        ]
        .into_iter()
        .filter_map(|(bound, value)| value.map(|v| (bound, v)))
    }
}

/// Path argument for operators that accept one or many fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPath {
    Single(String),
    Multi(Vec<String>),
    /// Every indexed field
    All,
}

impl SearchPath {
    fn to_value(&self) -> Value {
        match self {
            SearchPath::Single(path) => Value::String(path.clone()),
            SearchPath::Multi(paths) => json!(paths),
            SearchPath::All => json!({ "wildcard": "*" }),
        }
    }
}

impl From<&str> for SearchPath {
    fn from(path: &str) -> Self {
        SearchPath::Single(path.to_string())
    }
}

impl From<String> for SearchPath {
    fn from(path: String) -> Self {
        SearchPath::Single(path)
    }
}

impl From<Vec<String>> for SearchPath {
    fn from(mut paths: Vec<String>) -> Self {
        match paths.len() {
            0 => SearchPath::All,
            1 => SearchPath::Single(paths.remove(0)),
            _ => SearchPath::Multi(paths),
        }
    }
}

impl From<&[&str]> for SearchPath {
    fn from(paths: &[&str]) -> Self {
        paths.iter().map(|p| p.to_string()).collect::<Vec<_>>().into()
    }
}

/// Translated predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchClause {
    Equals {
        path: String,
        value: Value,
    },
    Range(RangeClause),
    In {
        path: String,
        values: Vec<Value>,
    },
    Exists {
        path: String,
    },
    Regex {
        path: String,
        pattern: String,
        flags: Option<String>,
        allow_analyzed_field: bool,
    },
    Text {
        path: SearchPath,
        query: String,
        fuzzy: Option<FuzzyOptions>,
        score_boost: Option<f64>,
    },
    Wildcard {
        path: String,
        query: String,
        allow_analyzed_field: bool,
    },
    Compound {
        junction: Junction,
        clauses: Vec<SearchClause>,
    },
}

impl SearchClause {
    pub fn equals(path: impl Into<String>, value: Value) -> Self {
        SearchClause::Equals {
            path: path.into(),
            value,
        }
    }

    pub fn range(path: impl Into<String>, bound: RangeBound, value: Value) -> Self {
        SearchClause::Range(RangeClause::new(path).with_bound(bound, value))
    }

    pub fn one_of(path: impl Into<String>, values: Vec<Value>) -> Self {
        SearchClause::In {
            path: path.into(),
            values,
        }
    }

    pub fn exists(path: impl Into<String>) -> Self {
        SearchClause::Exists { path: path.into() }
    }

    /// Field is absent.
    pub fn missing(path: impl Into<String>) -> Self {
        Self::must_not(vec![Self::exists(path)])
    }

    /// Field is explicitly null or absent.
    ///
    /// The target does not conflate the two cases, so both branches are
    /// always emitted together.
    pub fn null_or_missing(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::should(
            vec![Self::equals(path.clone(), Value::Null), Self::missing(path)],
            1,
        )
    }

    pub fn must(clauses: Vec<SearchClause>) -> Self {
        SearchClause::Compound {
            junction: Junction::Must,
            clauses,
        }
    }

    pub fn should(clauses: Vec<SearchClause>, minimum: u32) -> Self {
        SearchClause::Compound {
            junction: Junction::Should { minimum },
            clauses,
        }
    }

    pub fn must_not(clauses: Vec<SearchClause>) -> Self {
        SearchClause::Compound {
            junction: Junction::MustNot,
            clauses,
        }
    }

    /// Operator key this clause renders under.
    pub fn operator_name(&self) -> &'static str {
        match self {
            SearchClause::Equals { .. } => "equals",
            SearchClause::Range(_) => "range",
            SearchClause::In { .. } => "in",
            SearchClause::Exists { .. } => "exists",
            SearchClause::Regex { .. } => "regex",
            SearchClause::Text { .. } => "text",
            SearchClause::Wildcard { .. } => "wildcard",
            SearchClause::Compound { .. } => "compound",
        }
    }

    /// Operator body, without the operator key.
    pub fn body(&self) -> Value {
        match self {
            SearchClause::Equals { path, value } => json!({ "path": path, "value": value }),
            SearchClause::Range(range) => {
                let mut body = Map::new();
                body.insert("path".into(), Value::String(range.path.clone()));
                for (bound, value) in range.bounds() {
                    body.insert(bound.key().into(), value.clone());
                }
                Value::Object(body)
            }
            SearchClause::In { path, values } => json!({ "path": path, "value": values }),
            SearchClause::Exists { path } => json!({ "path": path }),
            SearchClause::Regex {
                path,
                pattern,
                flags,
                allow_analyzed_field,
            } => {
                let mut body = json!({
                    "path": path,
                    "query": pattern,
                    "allowAnalyzedField": allow_analyzed_field,
                });
                if let Some(flags) = flags {
                    body["flags"] = Value::String(flags.clone());
                }
                body
            }
            SearchClause::Text {
                path,
                query,
                fuzzy,
                score_boost,
            } => {
                let mut body = json!({ "query": query, "path": path.to_value() });
                if let Some(fuzzy) = fuzzy {
                    body["fuzzy"] = fuzzy.to_value();
                }
                if let Some(boost) = score_boost {
                    body["score"] = json!({ "boost": { "value": boost } });
                }
                body
            }
            SearchClause::Wildcard {
                path,
                query,
                allow_analyzed_field,
            } => json!({
                "query": query,
                "path": path,
                "allowAnalyzedField": allow_analyzed_field,
            }),
            SearchClause::Compound { junction, clauses } => {
                let rendered: Vec<Value> = clauses.iter().map(SearchClause::to_value).collect();
                let mut body = Map::new();
                body.insert(junction.key().into(), Value::Array(rendered));
                if let Junction::Should { minimum } = junction {
                    body.insert("minimumShouldMatch".into(), json!(minimum));
                }
                Value::Object(body)
            }
        }
    }

    /// Render as `{"<operator>": {...}}`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.operator_name().into(), self.body());
        Value::Object(map)
    }
}

impl Serialize for SearchClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_renders() {
        let clause = SearchClause::equals("status", json!("active"));
        assert_eq!(
            clause.to_value(),
            json!({ "equals": { "path": "status", "value": "active" } })
        );
    }

    #[test]
    fn test_range_renders_only_set_bounds() {
        let clause = SearchClause::Range(
            RangeClause::new("age")
                .with_bound(RangeBound::Gte, json!(18))
                .with_bound(RangeBound::Lt, json!(65)),
        );
        assert_eq!(
            clause.to_value(),
            json!({ "range": { "path": "age", "gte": 18, "lt": 65 } })
        );
    }

    #[test]
    fn test_null_or_missing_has_both_branches() {
        let clause = SearchClause::null_or_missing("deletedAt");
        assert_eq!(
            clause.to_value(),
            json!({
                "compound": {
                    "should": [
                        { "equals": { "path": "deletedAt", "value": null } },
                        { "compound": { "mustNot": [ { "exists": { "path": "deletedAt" } } ] } }
                    ],
                    "minimumShouldMatch": 1
                }
            })
        );
    }

    #[test]
    fn test_regex_flags_only_when_present() {
        let plain = SearchClause::Regex {
            path: "name".into(),
            pattern: "^al".into(),
            flags: None,
            allow_analyzed_field: true,
        };
        assert!(plain.body().get("flags").is_none());

        let flagged = SearchClause::Regex {
            path: "name".into(),
            pattern: "^al".into(),
            flags: Some("i".into()),
            allow_analyzed_field: false,
        };
        assert_eq!(flagged.body()["flags"], json!("i"));
        assert_eq!(flagged.body()["allowAnalyzedField"], json!(false));
    }

    #[test]
    fn test_search_path_from_vec() {
        assert_eq!(SearchPath::from(Vec::<String>::new()), SearchPath::All);
        assert_eq!(
            SearchPath::from(vec!["title".to_string()]),
            SearchPath::Single("title".into())
        );
        assert_eq!(
            SearchPath::from(&["title", "body"][..]),
            SearchPath::Multi(vec!["title".into(), "body".into()])
        );
    }

    #[test]
    fn test_all_path_renders_wildcard() {
        let clause = SearchClause::Text {
            path: SearchPath::All,
            query: "rust".into(),
            fuzzy: None,
            score_boost: None,
        };
        assert_eq!(clause.body()["path"], json!({ "wildcard": "*" }));
    }

    #[test]
    fn test_serialize_matches_to_value() {
        let clause = SearchClause::must(vec![
            SearchClause::exists("a"),
            SearchClause::one_of("b", vec![json!(1), json!(2)]),
        ]);
        assert_eq!(serde_json::to_value(&clause).unwrap(), clause.to_value());
    }
}
