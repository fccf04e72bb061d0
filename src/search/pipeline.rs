// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Pipeline model and directive folding
//!
//! A `$match` stage becomes a `$search` stage. The stages directly after it
//! are scanned so a sort can be embedded in the search request; pagination
//! and projection stay separate stages because `$search` cannot carry them.
//!
//! ```text
//! [$match, $sort, $skip, $limit, $unwind, ...]
//!     │
//!     ▼
//! [$search{sort}, $limit(skip+limit), $skip, $unwind, ...]
//! ```
//!
//! # Fold rules
//!
//! - Each of sort / limit / skip / projection is captured at most once.
//! - Sort is only captured directly after the `$match`; sorting after
//!   pagination would change which documents are returned.
//! - Projection is only captured when requested.
//! - Anything else (or a repeat) ends the scan; the rest passes through.
//! - Limit is emitted before skip. If the input skipped first, the emitted
//!   limit is widened to `skip + limit` so the same window is returned.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Result, TranslateError};
use crate::metrics;

use super::clause::SearchClause;
use super::converter::Converter;
use super::filter::{type_name, FilterExpr};

/// Ordered sort directive (`{"createdAt": -1, "name": 1}`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortSpec {
    pub fields: Vec<(String, Value)>,
}

impl SortSpec {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            fields: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// First field whose direction is not a number.
    pub fn non_numeric_field(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, direction)| !direction.is_number())
            .map(|(field, _)| field.as_str())
    }

    pub fn is_foldable(&self) -> bool {
        self.non_numeric_field().is_none()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.iter().cloned().collect())
    }
}

/// One `$search` request: index, a single top-level clause, optional sort.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub clause: SearchClause,
    pub sort: Option<SortSpec>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, clause: SearchClause) -> Self {
        Self {
            index: index.into(),
            clause,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Render as `{"$search": {"index": .., "<op>": {..}, "sort": {..}}}`.
    pub fn to_value(&self) -> Value {
        let mut body = Map::new();
        body.insert("index".into(), Value::String(self.index.clone()));
        body.insert(self.clause.operator_name().into(), self.clause.body());
        if let Some(sort) = &self.sort {
            body.insert("sort".into(), sort.to_value());
        }
        let mut stage = Map::new();
        stage.insert("$search".into(), Value::Object(body));
        Value::Object(stage)
    }
}

/// Pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Filter stage (`$match`), not yet translated
    Match(Value),
    Search(SearchRequest),
    Sort(SortSpec),
    Limit(u64),
    Skip(u64),
    Project(Value),
    /// Any stage the translator does not fold, kept verbatim
    Passthrough(Value),
}

impl Stage {
    /// Parse one stage object. Stages must be objects with exactly one key.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) if map.len() == 1 => map,
            Value::Object(map) => {
                return Err(TranslateError::InvalidPipeline(format!(
                    "stage must have exactly one key, got {}",
                    map.len()
                )))
            }
            other => {
                return Err(TranslateError::InvalidPipeline(format!(
                    "stage must be an object, got {}",
                    type_name(other)
                )))
            }
        };

        let Some((name, operand)) = map.iter().next() else {
            return Err(TranslateError::InvalidPipeline("empty stage".to_string()));
        };
        let passthrough = || Stage::Passthrough(value.clone());
        Ok(match (name.as_str(), operand) {
            ("$match", filter) => Stage::Match(filter.clone()),
            ("$sort", Value::Object(fields)) => Stage::Sort(SortSpec::from_map(fields)),
            ("$limit", n) => n.as_u64().map_or_else(passthrough, Stage::Limit),
            ("$skip", n) => n.as_u64().map_or_else(passthrough, Stage::Skip),
            ("$project", Value::Object(_)) => Stage::Project(operand.clone()),
            _ => passthrough(),
        })
    }

    pub fn to_value(&self) -> Value {
        fn single(key: &str, value: Value) -> Value {
            let mut map = Map::new();
            map.insert(key.to_string(), value);
            Value::Object(map)
        }

        match self {
            Stage::Match(filter) => single("$match", filter.clone()),
            Stage::Search(request) => request.to_value(),
            Stage::Sort(sort) => single("$sort", sort.to_value()),
            Stage::Limit(n) => single("$limit", Value::from(*n)),
            Stage::Skip(n) => single("$skip", Value::from(*n)),
            Stage::Project(projection) => single("$project", projection.clone()),
            Stage::Passthrough(stage) => stage.clone(),
        }
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Ordered list of stages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Parse a JSON array of stage objects.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(Self {
                stages: items.iter().map(Stage::from_value).collect::<Result<_>>()?,
            }),
            other => Err(TranslateError::InvalidPipeline(format!(
                "pipeline must be an array, got {}",
                type_name(other)
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.stages.iter().map(Stage::to_value).collect())
    }
}

impl Serialize for Pipeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Options for pipeline translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PipelineOptions {
    /// Fold a `$project` after the `$match`; `None` uses the translator config
    #[serde(default)]
    pub fold_projection: Option<bool>,
}

impl PipelineOptions {
    pub fn with_projection() -> Self {
        Self {
            fold_projection: Some(true),
        }
    }
}

/// `find()`-style directives. Skip is applied before limit, as `find()` does.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FindDirectives {
    #[serde(default)]
    pub projection: Option<Value>,
    #[serde(default)]
    pub sort: Option<Value>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub skip: Option<u64>,
}

impl FindDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn projection(mut self, projection: Value) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// Directives captured after one `$match` (or passed to `find()`).
#[derive(Debug, Default)]
pub(crate) struct FoldRun {
    pub(crate) sort: Option<SortSpec>,
    pub(crate) limit: Option<u64>,
    pub(crate) skip: Option<u64>,
    pub(crate) project: Option<Value>,
    /// Input applied skip before limit
    pub(crate) skip_first: bool,
    captured: usize,
}

impl FoldRun {
    /// Directives from a `find()` call, which always skips before limiting.
    pub(crate) fn from_find(directives: &FindDirectives) -> Result<Self> {
        let sort = match &directives.sort {
            None => None,
            Some(Value::Object(fields)) => Some(SortSpec::from_map(fields)),
            Some(other) => {
                return Err(TranslateError::InvalidFilter(format!(
                    "sort directive must be an object, got {}",
                    type_name(other)
                )))
            }
        };
        Ok(Self {
            sort,
            limit: directives.limit,
            skip: directives.skip,
            project: directives.projection.clone(),
            skip_first: true,
            captured: 0,
        })
    }

    /// Whether `stage` can join this run.
    ///
    /// A sort is only taken as the first captured stage. `$search` sorts
    /// before any pagination, so a `$sort` that follows `$limit`/`$skip`
    /// reorders only the paged window; embedding it would page a different
    /// set of documents. It ends the scan and stays a separate stage.
    fn accepts(&self, stage: &Stage, fold_projection: bool) -> bool {
        match stage {
            Stage::Sort(_) => self.captured == 0,
            Stage::Limit(_) => self.limit.is_none(),
            Stage::Skip(_) => self.skip.is_none(),
            Stage::Project(_) => fold_projection && self.project.is_none(),
            _ => false,
        }
    }

    fn take(&mut self, stage: Stage) {
        match stage {
            Stage::Sort(sort) => self.sort = Some(sort),
            Stage::Limit(n) => {
                self.skip_first = self.skip.is_some();
                self.limit = Some(n);
            }
            Stage::Skip(n) => self.skip = Some(n),
            Stage::Project(projection) => self.project = Some(projection),
            _ => return,
        }
        self.captured += 1;
    }

    /// Emit the search stage plus whatever directives could not be embedded.
    ///
    /// Emission order: search, unfolded sort, limit, skip, projection.
    pub(crate) fn emit(
        self,
        index: &str,
        clause: SearchClause,
        diags: &mut Diagnostics,
    ) -> Vec<Stage> {
        let mut request = SearchRequest::new(index, clause);
        let mut separate_sort = None;
        if let Some(sort) = self.sort {
            match sort.non_numeric_field() {
                None => request = request.with_sort(sort),
                Some(field) => {
                    diags.push(Diagnostic::NonNumericSortDirection {
                        field: field.to_string(),
                    });
                    separate_sort = Some(sort);
                }
            }
        }

        let sort_embedded = request.sort.is_some();
        let mut stages = vec![Stage::Search(request)];
        stages.extend(separate_sort.map(Stage::Sort));
        match (self.limit, self.skip) {
            (Some(limit), Some(skip)) if self.skip_first => {
                stages.push(Stage::Limit(limit.saturating_add(skip)));
                stages.push(Stage::Skip(skip));
            }
            (limit, skip) => {
                stages.extend(limit.map(Stage::Limit));
                stages.extend(skip.map(Stage::Skip));
            }
        }
        stages.extend(self.project.map(Stage::Project));

        metrics::record_fold(sort_embedded, stages.len() - 1);
        stages
    }
}

/// Rewrites every `$match` in a pipeline into a `$search` fold run.
pub(crate) struct PipelineFolder<'a> {
    converter: Converter<'a>,
    index: &'a str,
    max_depth: usize,
    fold_projection: bool,
}

impl<'a> PipelineFolder<'a> {
    pub(crate) fn new(
        converter: Converter<'a>,
        index: &'a str,
        max_depth: usize,
        fold_projection: bool,
    ) -> Self {
        Self {
            converter,
            index,
            max_depth,
            fold_projection,
        }
    }

    pub(crate) fn fold(&self, stages: Vec<Stage>, diags: &mut Diagnostics) -> Result<Vec<Stage>> {
        let mut out = Vec::with_capacity(stages.len());
        let mut iter = stages.into_iter().peekable();

        while let Some(stage) = iter.next() {
            let Stage::Match(filter) = stage else {
                out.push(stage);
                continue;
            };

            let expr = FilterExpr::parse(&filter, self.max_depth)?;
            let clause = self.converter.convert(&expr, diags);

            let mut run = FoldRun::default();
            while let Some(next) = iter.next_if(|s| run.accepts(s, self.fold_projection)) {
                run.take(next);
            }
            debug!(
                captured = run.captured,
                sort = run.sort.is_some(),
                limit = ?run.limit,
                skip = ?run.skip,
                "Folded $match run"
            );

            out.extend(run.emit(self.index, clause, diags));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslatorConfig;
    use serde_json::json;

    fn fold(pipeline: Value, fold_projection: bool) -> (Vec<Value>, Vec<Diagnostic>) {
        let config = TranslatorConfig::for_index("idx");
        let stages = Pipeline::from_value(&pipeline).unwrap().stages;
        let folder = PipelineFolder::new(
            Converter::new(&config),
            &config.index,
            config.max_depth,
            fold_projection,
        );
        let mut diags = Diagnostics::new();
        let out = folder.fold(stages, &mut diags).unwrap();
        (out.iter().map(Stage::to_value).collect(), diags.into_vec())
    }

    #[test]
    fn test_stage_parsing() {
        assert_eq!(Stage::from_value(&json!({ "$limit": 5 })).unwrap(), Stage::Limit(5));
        assert_eq!(Stage::from_value(&json!({ "$skip": 2 })).unwrap(), Stage::Skip(2));
        assert!(matches!(
            Stage::from_value(&json!({ "$limit": "ten" })).unwrap(),
            Stage::Passthrough(_)
        ));
        assert!(matches!(
            Stage::from_value(&json!({ "$unwind": "$tags" })).unwrap(),
            Stage::Passthrough(_)
        ));
        assert!(matches!(
            Stage::from_value(&json!({ "$limit": 1, "$skip": 1 })),
            Err(TranslateError::InvalidPipeline(_))
        ));
        assert!(matches!(
            Stage::from_value(&json!("$match")),
            Err(TranslateError::InvalidPipeline(_))
        ));
    }

    #[test]
    fn test_pipeline_must_be_array() {
        assert!(matches!(
            Pipeline::from_value(&json!({ "$match": {} })),
            Err(TranslateError::InvalidPipeline(_))
        ));
    }

    #[test]
    fn test_sort_and_limit_fold() {
        let (out, diags) = fold(
            json!([
                { "$match": { "status": "active" } },
                { "$sort": { "createdAt": -1 } },
                { "$limit": 10 }
            ]),
            false,
        );
        assert_eq!(
            out,
            vec![
                json!({ "$search": {
                    "index": "idx",
                    "equals": { "path": "status", "value": "active" },
                    "sort": { "createdAt": -1 }
                } }),
                json!({ "$limit": 10 }),
            ]
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_unfoldable_stage_stops_scan() {
        let (out, _) = fold(
            json!([
                { "$match": { "a": 1 } },
                { "$unwind": "$tags" },
                { "$sort": { "p": 1 } }
            ]),
            false,
        );
        assert_eq!(
            out,
            vec![
                json!({ "$search": { "index": "idx", "equals": { "path": "a", "value": 1 } } }),
                json!({ "$unwind": "$tags" }),
                json!({ "$sort": { "p": 1 } }),
            ]
        );
    }

    #[test]
    fn test_limit_emitted_before_skip() {
        let (out, _) = fold(
            json!([{ "$match": {} }, { "$limit": 10 }, { "$skip": 5 }]),
            false,
        );
        assert_eq!(out[1], json!({ "$limit": 10 }));
        assert_eq!(out[2], json!({ "$skip": 5 }));
    }

    #[test]
    fn test_skip_then_limit_widens_limit() {
        let (out, _) = fold(
            json!([{ "$match": {} }, { "$skip": 5 }, { "$limit": 10 }]),
            false,
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], json!({ "$limit": 15 }));
        assert_eq!(out[2], json!({ "$skip": 5 }));
    }

    #[test]
    fn test_repeated_category_stops_scan() {
        let (out, _) = fold(
            json!([
                { "$match": { "a": 1 } },
                { "$limit": 10 },
                { "$limit": 3 }
            ]),
            false,
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], json!({ "$limit": 10 }));
        assert_eq!(out[2], json!({ "$limit": 3 }));
    }

    #[test]
    fn test_sort_after_pagination_not_folded() {
        let (out, _) = fold(
            json!([
                { "$match": { "a": 1 } },
                { "$limit": 10 },
                { "$sort": { "p": 1 } }
            ]),
            false,
        );
        assert!(out[0]["$search"].get("sort").is_none());
        assert_eq!(out[1], json!({ "$limit": 10 }));
        assert_eq!(out[2], json!({ "$sort": { "p": 1 } }));
    }

    #[test]
    fn test_non_numeric_sort_stays_separate() {
        let (out, diags) = fold(
            json!([
                { "$match": { "a": 1 } },
                { "$sort": { "score": { "$meta": "textScore" } } },
                { "$limit": 5 }
            ]),
            false,
        );
        assert!(out[0]["$search"].get("sort").is_none());
        assert_eq!(out[1], json!({ "$sort": { "score": { "$meta": "textScore" } } }));
        assert_eq!(out[2], json!({ "$limit": 5 }));
        assert_eq!(
            diags,
            vec![Diagnostic::NonNumericSortDirection { field: "score".into() }]
        );
    }

    #[test]
    fn test_projection_only_folded_when_requested() {
        let pipeline = json!([
            { "$match": { "a": 1 } },
            { "$project": { "a": 1 } },
            { "$limit": 5 }
        ]);

        let (unfolded, _) = fold(pipeline.clone(), false);
        assert_eq!(unfolded[1], json!({ "$project": { "a": 1 } }));
        assert_eq!(unfolded[2], json!({ "$limit": 5 }));

        let (folded, _) = fold(pipeline, true);
        assert_eq!(folded[1], json!({ "$limit": 5 }));
        assert_eq!(folded[2], json!({ "$project": { "a": 1 } }));
    }

    #[test]
    fn test_later_match_folded_independently() {
        let (out, _) = fold(
            json!([
                { "$match": { "a": 1 } },
                { "$group": { "_id": "$a" } },
                { "$match": { "b": 2 } },
                { "$limit": 1 }
            ]),
            false,
        );
        assert_eq!(out.len(), 4);
        assert!(out[0].get("$search").is_some());
        assert_eq!(out[1], json!({ "$group": { "_id": "$a" } }));
        assert!(out[2].get("$search").is_some());
        assert_eq!(out[3], json!({ "$limit": 1 }));
    }

    #[test]
    fn test_search_stage_passes_through() {
        let already = json!([
            { "$search": { "index": "idx", "exists": { "path": "_id" } } },
            { "$limit": 3 }
        ]);
        let (out, diags) = fold(already.clone(), false);
        assert_eq!(Value::Array(out), already);
        assert!(diags.is_empty());
    }
}
