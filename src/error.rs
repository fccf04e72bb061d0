// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fatal translation errors.
//!
//! Anything that can be skipped without changing the structural shape of the
//! query is reported as a [`Diagnostic`](crate::Diagnostic) instead.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unsupported logical operator '{0}'")]
    UnsupportedLogicalOperator(String),
    #[error("top-level $not is not supported; use $not inside a field's operator set or $nor")]
    TopLevelNot,
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("filter nesting exceeds maximum depth of {max}")]
    DepthExceeded { max: usize },
}

impl TranslateError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedLogicalOperator(_) => "unsupported_logical",
            Self::TopLevelNot => "top_level_not",
            Self::InvalidPipeline(_) => "invalid_pipeline",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::DepthExceeded { .. } => "depth_exceeded",
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
