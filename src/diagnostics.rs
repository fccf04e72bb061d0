// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Recoverable translation diagnostics.
//!
//! Diagnostics are collected per call and handed back in a [`Translation`],
//! so callers (and tests) never have to capture a shared log stream. Every
//! diagnostic is also emitted as a `tracing` warning and counted.

use std::fmt;

use tracing::warn;

use crate::metrics;

/// Something the translator skipped or approximated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Operator key outside the supported vocabulary; the key was skipped.
    UnrecognizedOperator { path: String, operator: String },
    /// Operator operand has the wrong shape (e.g. `$in` without a list).
    MalformedOperand { path: String, operator: String, reason: String },
    /// `$regex` operand was not a string; the pattern was skipped.
    NonStringPattern { path: String },
    /// Exact array equality was approximated by per-element equality,
    /// which may also match supersets of the listed elements.
    ArrayEqualityApproximation { path: String, len: usize },
    /// A sort direction was not numeric, so the sort stayed a separate stage.
    NonNumericSortDirection { field: String },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnrecognizedOperator { .. } => "unrecognized_operator",
            Self::MalformedOperand { .. } => "malformed_operand",
            Self::NonStringPattern { .. } => "non_string_pattern",
            Self::ArrayEqualityApproximation { .. } => "array_equality_approximation",
            Self::NonNumericSortDirection { .. } => "non_numeric_sort_direction",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedOperator { path, operator } => {
                write!(f, "unrecognized operator '{}' on '{}' skipped", operator, path)
            }
            Self::MalformedOperand { path, operator, reason } => {
                write!(f, "operator '{}' on '{}' skipped: {}", operator, path, reason)
            }
            Self::NonStringPattern { path } => {
                write!(f, "$regex on '{}' skipped: pattern is not a string", path)
            }
            Self::ArrayEqualityApproximation { path, len } => write!(
                f,
                "exact match on {}-element array '{}' approximated by per-element equality",
                len, path
            ),
            Self::NonNumericSortDirection { field } => write!(
                f,
                "sort direction for '{}' is not numeric; sort left as a separate stage",
                field
            ),
        }
    }
}

/// Per-call diagnostic sink threaded through the converter.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        warn!(kind = diagnostic.kind(), "{}", diagnostic);
        metrics::record_diagnostic(diagnostic.kind());
        self.entries.push(diagnostic);
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Translation output plus the diagnostics raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation<T> {
    pub output: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Translation<T> {
    pub(crate) fn new(output: T, diagnostics: Diagnostics) -> Self {
        Self {
            output,
            diagnostics: diagnostics.into_vec(),
        }
    }

    /// True when nothing was skipped or approximated.
    pub fn is_exact(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Drop the diagnostics and keep the output.
    pub fn into_output(self) -> T {
        self.output
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Translation<U> {
        Translation {
            output: f(self.output),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_collect_in_order() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::NonStringPattern { path: "a".into() });
        diags.push(Diagnostic::UnrecognizedOperator {
            path: "b".into(),
            operator: "$foo".into(),
        });

        let entries = diags.into_vec();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind(), "non_string_pattern");
        assert_eq!(entries[1].kind(), "unrecognized_operator");
    }

    #[test]
    fn test_display_names_path_and_operator() {
        let diag = Diagnostic::UnrecognizedOperator {
            path: "age".into(),
            operator: "$between".into(),
        };
        assert_eq!(diag.to_string(), "unrecognized operator '$between' on 'age' skipped");
    }

    #[test]
    fn test_translation_map_keeps_diagnostics() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::NonNumericSortDirection { field: "x".into() });
        let translation = Translation::new(2, diags).map(|n| n * 2);

        assert_eq!(translation.output, 4);
        assert!(!translation.is_exact());
    }
}
