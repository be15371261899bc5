//! Syntax errors.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use treeql_core::{Diagnostic as Report, DiagnosticBag};

/// The first error found while parsing a document.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{title}: {message}")]
#[diagnostic(code(treeql::syntax))]
pub struct SyntaxError {
    /// Diagnostic code, see [`treeql_core::diagnostics::codes`].
    pub code: String,
    pub title: String,
    pub message: String,
    #[source_code]
    pub source_code: String,
    #[label("{}", self.message)]
    pub span: SourceSpan,
}

impl SyntaxError {
    /// Builds an error from a parser diagnostic.
    pub fn from_diagnostic(diagnostic: &Report, source: &str) -> Self {
        Self {
            code: diagnostic.code.to_string(),
            title: diagnostic.title.clone(),
            message: diagnostic.message.clone(),
            source_code: source.to_string(),
            span: diagnostic.span.into(),
        }
    }

    /// Builds an error from the first report in a bag, if there is one.
    pub fn first_in(diagnostics: &DiagnosticBag, source: &str) -> Option<Self> {
        diagnostics
            .first()
            .map(|diagnostic| Self::from_diagnostic(diagnostic, source))
    }

    /// Byte offset where the error was reported.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}
