//! Problems found in query text.
//!
//! Query text is usually half-typed, so the parser keeps going after an error
//! and records what it found here. Callers mostly care about the first report,
//! which is what the editor and the CLI show.

use crate::span::Span;

/// Codes carried by syntax reports, shown as `treeql::syntax` help codes.
pub mod codes {
    /// A token that cannot start or continue the construct being parsed.
    pub const UNEXPECTED_TOKEN: &str = "TQ0001";
    /// The text ended inside a construct.
    pub const UNEXPECTED_EOF: &str = "TQ0002";
    /// A character outside the grammar, or a construct the grammar rejects.
    pub const INVALID_SYNTAX: &str = "TQ0003";
    /// A string with no closing quote, including one cut off after `\`.
    pub const UNTERMINATED_STRING: &str = "TQ0004";
    pub const INVALID_ESCAPE: &str = "TQ0005";
}

/// One problem, pointing at the text it is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// One of [`codes`].
    pub code: &'static str,
    /// Short title, e.g. `unexpected token`.
    pub title: String,
    pub span: Span,
    /// What was expected or found there.
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        code: &'static str,
        title: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            title: title.into(),
            span,
            message: message.into(),
        }
    }
}

/// Reports collected over one parse, in source order.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error.
    ///
    /// A second report at an offset already reported is dropped: recovery
    /// often trips over the same token twice.
    pub fn error(
        &mut self,
        code: &'static str,
        title: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) {
        if self.diagnostics.iter().any(|d| d.span.start == span.start) {
            return;
        }
        self.diagnostics.push(Diagnostic::new(code, title, span, message));
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// The earliest report.
    #[must_use]
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_report_wins() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());

        bag.error(codes::UNEXPECTED_EOF, "unexpected end of input", Span::new(9, 9), "expected `}`");
        bag.error(codes::INVALID_SYNTAX, "invalid token", Span::new(12, 13), "unexpected character `%`");

        assert!(bag.has_errors());
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.first().map(|d| d.code), Some(codes::UNEXPECTED_EOF));
    }

    #[test]
    fn test_same_offset_is_reported_once() {
        let mut bag = DiagnosticBag::new();
        bag.error(codes::UNEXPECTED_TOKEN, "unexpected token", Span::new(4, 5), "expected name, found `)`");
        bag.error(codes::UNEXPECTED_TOKEN, "unexpected token", Span::new(4, 5), "expected `:`, found `)`");

        assert_eq!(bag.len(), 1);
        assert_eq!(bag.iter().next().map(|d| d.message.as_str()), Some("expected name, found `)`"));
    }
}
