//! Terminal rendering of binder diagnostics.

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, Severity, SourceCode};
use sash_diagnostics::{Diagnostic, DiagnosticCategory};
use std::fmt;

/// A binder diagnostic with the source text it points into.
#[derive(Debug)]
pub struct SourceDiagnostic {
    message: String,
    code: u32,
    category: DiagnosticCategory,
    source: NamedSource<String>,
    span: Option<(usize, usize)>,
}

impl SourceDiagnostic {
    pub fn new(diagnostic: &Diagnostic, file_name: &str, text: &str) -> Self {
        Self {
            message: diagnostic.message_text.clone(),
            code: diagnostic.code,
            category: diagnostic.category,
            source: NamedSource::new(file_name, text.to_owned()),
            span: diagnostic
                .span
                .map(|span| (span.start as usize, span.length as usize)),
        }
    }
}

impl fmt::Display for SourceDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceDiagnostic {}

impl MietteDiagnostic for SourceDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("SH{}", self.code)))
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.category {
            DiagnosticCategory::Error => Severity::Error,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::underline(span))))
    }
}

/// Prints diagnostics up to a limit and counts all of them.
pub struct Reporter {
    limit: Option<usize>,
    printed: usize,
    errors: usize,
    total: usize,
}

impl Reporter {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            printed: 0,
            errors: 0,
            total: 0,
        }
    }

    /// Report one diagnostic. `text` is the source it was found in, when the
    /// parser carried it along.
    pub fn report(&mut self, diagnostic: &Diagnostic, text: Option<&str>) {
        self.total += 1;
        if diagnostic.is_error() {
            self.errors += 1;
        }
        if self.limit.is_some_and(|limit| self.printed >= limit) {
            return;
        }
        self.printed += 1;

        match (text, diagnostic.file.as_deref()) {
            (Some(text), Some(file)) => {
                let report = miette::Report::new(SourceDiagnostic::new(diagnostic, file, text));
                eprintln!("{report:?}");
            }
            _ => eprintln!("{diagnostic}"),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Print the summary line. Returns whether any error was reported.
    pub fn finish(&self) -> bool {
        if self.total > self.printed {
            eprintln!("... {} more diagnostic(s) not shown.", self.total - self.printed);
        }
        let errors = self.error_count();
        if errors > 0 {
            eprintln!("\nFound {} error{}.", errors, if errors == 1 { "" } else { "s" });
        }
        errors > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sash_diagnostics::messages;

    fn diagnostic() -> Diagnostic {
        Diagnostic::at(
            sash_core::text::TextSpan::new(6, 3),
            &messages::CANNOT_FIND_NAME_0,
            &["foo"],
        )
        .in_file("main.sash")
    }

    #[test]
    fn test_source_diagnostic_metadata() {
        let rendered = SourceDiagnostic::new(&diagnostic(), "main.sash", "print foo");
        assert_eq!(rendered.to_string(), "Cannot find name 'foo'.");
        assert_eq!(rendered.code().map(|c| c.to_string()), Some("SH2001".to_string()));
        assert_eq!(rendered.severity(), Some(Severity::Error));
        let labels: Vec<_> = rendered.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 6);
        assert_eq!(labels[0].len(), 3);
    }

    #[test]
    fn test_reporter_counts_past_the_limit() {
        let mut reporter = Reporter::new(Some(1));
        reporter.report(&diagnostic(), None);
        reporter.report(&diagnostic(), None);
        reporter.report(&diagnostic(), Some("print foo"));
        assert_eq!(reporter.printed, 1);
        assert_eq!(reporter.error_count(), 3);
        assert!(reporter.finish());
    }

    #[test]
    fn test_empty_reporter() {
        let reporter = Reporter::new(None);
        assert!(!reporter.finish());
    }
}
