// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Translator API
//!
//! [`SearchTranslator`] is the entry point collaborators call: one instance
//! per search index, shared freely across threads. Every call is a pure
//! function of its input and the immutable config.
//!
//! ```text
//! translate_filter(filter, directives)   → [$search{sort}, $limit, $skip, $project]
//! translate_pipeline(stages, options)    → stages with each $match folded
//! translate_clause(filter)               → single SearchClause
//! full_text / prefix                     → [$search]
//! ```

use serde_json::Value;
use tracing::debug;

use crate::config::TranslatorConfig;
use crate::diagnostics::{Diagnostics, Translation};
use crate::error::Result;
use crate::metrics::{self, LatencyTimer};
use crate::search::{
    full_text_clause, prefix_clause, Converter, FilterExpr, FindDirectives, FoldRun, Pipeline,
    PipelineFolder, PipelineOptions, PrefixOptions, SearchClause, SearchPath, SearchRequest,
    Stage, TextOptions,
};

/// Filter → `$search` translator bound to one index.
#[derive(Debug, Clone)]
pub struct SearchTranslator {
    config: TranslatorConfig,
}

impl SearchTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    /// Translator with default settings for `index`.
    pub fn for_index(index: impl Into<String>) -> Self {
        Self::new(TranslatorConfig::for_index(index))
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn index(&self) -> &str {
        &self.config.index
    }

    /// Translate a filter document into a single clause.
    ///
    /// # Example
    ///
    /// ```
    /// use search_translator::{SearchClause, SearchTranslator};
    /// use serde_json::json;
    ///
    /// let translator = SearchTranslator::for_index("users");
    /// let clause = translator
    ///     .translate_clause(&json!({ "status": "active" }))
    ///     .unwrap()
    ///     .output;
    /// assert_eq!(clause, SearchClause::equals("status", json!("active")));
    /// ```
    pub fn translate_clause(&self, filter: &Value) -> Result<Translation<SearchClause>> {
        self.observe("clause", || {
            let mut diags = Diagnostics::new();
            let clause = self.convert(filter, &mut diags)?;
            Ok(Translation::new(clause, diags))
        })
    }

    /// Translate a `find()`-style filter plus directives into a pipeline.
    ///
    /// # Example
    ///
    /// ```
    /// use search_translator::{FindDirectives, SearchTranslator};
    /// use serde_json::json;
    ///
    /// let translator = SearchTranslator::for_index("users");
    /// let pipeline = translator
    ///     .translate_filter(
    ///         &json!({ "age": { "$gte": 18 } }),
    ///         &FindDirectives::new().sort(json!({ "age": 1 })).limit(20),
    ///     )
    ///     .unwrap()
    ///     .output;
    ///
    /// assert_eq!(
    ///     pipeline.to_value(),
    ///     json!([
    ///         { "$search": {
    ///             "index": "users",
    ///             "range": { "path": "age", "gte": 18 },
    ///             "sort": { "age": 1 }
    ///         } },
    ///         { "$limit": 20 }
    ///     ])
    /// );
    /// ```
    pub fn translate_filter(
        &self,
        filter: &Value,
        directives: &FindDirectives,
    ) -> Result<Translation<Pipeline>> {
        self.observe("filter", || {
            let run = FoldRun::from_find(directives)?;
            let mut diags = Diagnostics::new();
            let clause = self.convert(filter, &mut diags)?;
            let stages = run.emit(&self.config.index, clause, &mut diags);
            Ok(Translation::new(Pipeline::new(stages), diags))
        })
    }

    /// Translate an aggregation pipeline, folding each `$match` run.
    ///
    /// Fails when the input is not an array of single-key stage objects.
    pub fn translate_pipeline(
        &self,
        pipeline: &Value,
        options: &PipelineOptions,
    ) -> Result<Translation<Pipeline>> {
        self.observe("pipeline", || {
            let parsed = Pipeline::from_value(pipeline)?;
            self.fold(parsed, options)
        })
    }

    /// Same as [`translate_pipeline`](Self::translate_pipeline) for an already parsed pipeline.
    pub fn translate_stages(
        &self,
        pipeline: Pipeline,
        options: &PipelineOptions,
    ) -> Result<Translation<Pipeline>> {
        self.observe("pipeline", || self.fold(pipeline, options))
    }

    /// Build a full-text `$search` stage over one or more paths.
    ///
    /// An empty path list searches every indexed field.
    pub fn full_text(
        &self,
        text: &str,
        paths: impl Into<SearchPath>,
        options: &TextOptions,
    ) -> Stage {
        let _timer = LatencyTimer::new("full_text");
        metrics::record_translation("full_text", "success");
        let clause = full_text_clause(text, paths.into(), options);
        Stage::Search(SearchRequest::new(self.config.index.clone(), clause))
    }

    /// Build a prefix-match `$search` stage on one path.
    pub fn prefix(&self, text: &str, path: &str, options: &PrefixOptions) -> Stage {
        let _timer = LatencyTimer::new("prefix");
        metrics::record_translation("prefix", "success");
        let allow_analyzed = options
            .allow_analyzed_field
            .unwrap_or(self.config.allow_analyzed_regex);
        let clause = prefix_clause(text, path, allow_analyzed);
        Stage::Search(SearchRequest::new(self.config.index.clone(), clause))
    }

    fn convert(&self, filter: &Value, diags: &mut Diagnostics) -> Result<SearchClause> {
        let expr = FilterExpr::parse(filter, self.config.max_depth)?;
        Ok(Converter::new(&self.config).convert(&expr, diags))
    }

    fn fold(&self, pipeline: Pipeline, options: &PipelineOptions) -> Result<Translation<Pipeline>> {
        let fold_projection = options
            .fold_projection
            .unwrap_or(self.config.fold_projection);
        let folder = PipelineFolder::new(
            Converter::new(&self.config),
            &self.config.index,
            self.config.max_depth,
            fold_projection,
        );

        let input_len = pipeline.len();
        let mut diags = Diagnostics::new();
        let stages = folder.fold(pipeline.stages, &mut diags)?;
        debug!(input_len, output_len = stages.len(), "Translated pipeline");
        Ok(Translation::new(Pipeline::new(stages), diags))
    }

    /// Time the call and count its outcome.
    fn observe<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce() -> Result<Translation<T>>,
    ) -> Result<Translation<T>> {
        let _timer = LatencyTimer::new(operation);
        let result = f();
        match &result {
            Ok(translation) => {
                metrics::record_translation(operation, "success");
                debug!(
                    operation,
                    index = %self.config.index,
                    diagnostics = translation.diagnostics.len(),
                    "Translation complete"
                );
            }
            Err(e) => {
                metrics::record_translation(operation, "error");
                metrics::record_error(operation, e.kind());
                debug!(operation, error = %e, "Translation failed");
            }
        }
        result
    }
}

impl Default for SearchTranslator {
    fn default() -> Self {
        Self::new(TranslatorConfig::default())
    }
}
