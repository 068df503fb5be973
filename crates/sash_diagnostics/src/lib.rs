//! sash_diagnostics: Binder diagnostics.
//!
//! A semantic error is recorded and binding carries on, so one run reports
//! every problem in a file. Each message has a stable numeric code and a
//! template whose `{0}`, `{1}` holes are filled when it is reported.

use sash_core::text::TextSpan;
use std::fmt;

/// Every binder diagnostic is an error: any one of them stops emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticCategory::Error => "error",
        })
    }
}

/// An entry of the message catalogue in [`messages`].
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    /// Template text with `{n}` holes.
    pub message: &'static str,
}

/// A reported problem: a catalogue entry with its holes filled, the span it
/// points at and, once the driver knows it, the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub span: Option<TextSpan>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
}

impl Diagnostic {
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
        }
    }

    pub fn at(span: TextSpan, message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            span: Some(span),
            ..Self::new(message, args)
        }
    }

    pub fn in_file(self, file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..self
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.category, DiagnosticCategory::Error)
    }
}

/// `file(offset): error SH2001: text`, or just the tail when no file is set.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.span) {
            (Some(file), Some(span)) => write!(f, "{}({}): ", file, span.start)?,
            (Some(file), None) => write!(f, "{}: ", file)?,
            (None, _) => {}
        }
        write!(f, "{} SH{}: {}", self.category, self.code, self.message_text)
    }
}

/// Fill `{0}`, `{1}`, ... in `template` with `args`.
pub fn format_message(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_string(), |text, (i, arg)| text.replace(&format!("{{{i}}}"), arg))
}

/// Every diagnostic of one compilation, in report order until sorted.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Record a diagnostic at `span`.
    pub fn report(&mut self, span: TextSpan, message: &DiagnosticMessage, args: &[&str]) {
        self.push(Diagnostic::at(span, message, args));
    }

    pub fn error_count(&self) -> usize {
        self.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn count_code(&self, code: u32) -> usize {
        self.iter().filter(|d| d.code == code).count()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Stamp every diagnostic that has no file yet with `file`.
    pub fn set_file(&mut self, file: &str) {
        for diagnostic in self.diagnostics.iter_mut().filter(|d| d.file.is_none()) {
            diagnostic.file = Some(file.to_string());
        }
    }

    /// Order by file, then by start offset. Stable, so diagnostics at the
    /// same offset keep their report order.
    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by_key(|d| (d.file.clone(), d.span.map(|s| s.start)));
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
    }

    // ========================================================================
    // Names and scopes (2000-2099)
    // ========================================================================
    pub const CANNOT_FIND_NAME_0: DiagnosticMessage = diag!(2001, Error, "Cannot find name '{0}'.");
    pub const NAME_0_IS_ALREADY_DECLARED_IN_THIS_SCOPE: DiagnosticMessage = diag!(2002, Error, "Name '{0}' is already declared in this scope.");
    pub const CANNOT_FIND_TYPE_0: DiagnosticMessage = diag!(2003, Error, "Cannot find type '{0}'.");
    pub const DUPLICATE_PARAMETER_0: DiagnosticMessage = diag!(2004, Error, "Duplicate parameter '{0}'.");

    // ========================================================================
    // Types and operators (2100-2199)
    // ========================================================================
    pub const TYPE_0_IS_NOT_ASSIGNABLE_TO_TYPE_1: DiagnosticMessage = diag!(2101, Error, "Type '{0}' is not assignable to type '{1}'.");
    pub const OPERATOR_0_CANNOT_BE_APPLIED_TO_TYPES_1_AND_2: DiagnosticMessage = diag!(2102, Error, "Operator '{0}' cannot be applied to types '{1}' and '{2}'.");
    pub const OPERATOR_0_CANNOT_BE_APPLIED_TO_TYPE_1: DiagnosticMessage = diag!(2103, Error, "Operator '{0}' cannot be applied to type '{1}'.");
    pub const CONDITION_MUST_BE_BOOLEAN_FOUND_0: DiagnosticMessage = diag!(2104, Error, "Condition must be of type 'Boolean', found '{0}'.");

    // ========================================================================
    // Calls and assignment (2200-2299)
    // ========================================================================
    pub const EXPRESSION_OF_TYPE_0_IS_NOT_CALLABLE: DiagnosticMessage = diag!(2201, Error, "Expression of type '{0}' is not callable.");
    pub const EXPECTED_0_ARGUMENTS_BUT_GOT_1: DiagnosticMessage = diag!(2202, Error, "Expected {0} arguments, but got {1}.");
    pub const ARGUMENT_OF_TYPE_0_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE_1: DiagnosticMessage = diag!(2203, Error, "Argument of type '{0}' is not assignable to parameter of type '{1}'.");
    pub const CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_READ_ONLY: DiagnosticMessage = diag!(2204, Error, "Cannot assign to '{0}' because it is read-only.");
    pub const INVALID_ASSIGNMENT_TARGET: DiagnosticMessage = diag!(2205, Error, "The left-hand side of an assignment must be a variable.");

    // ========================================================================
    // Control flow (2300-2399)
    // ========================================================================
    pub const JUMP_MUST_BE_INSIDE_A_LOOP: DiagnosticMessage = diag!(2301, Error, "'{0}' can only be used inside a loop.");
    pub const JUMP_CANNOT_CROSS_A_FUNCTION_BOUNDARY: DiagnosticMessage = diag!(2302, Error, "'{0}' cannot jump out of a function body.");
    pub const RETURN_VALUE_OF_TYPE_0_EXPECTED: DiagnosticMessage = diag!(2303, Error, "A return value of type '{0}' is expected.");
    pub const FUNCTION_MUST_RETURN_A_VALUE_OF_TYPE_0: DiagnosticMessage = diag!(2304, Error, "Function requires a return of type '{0}' on every path.");
    pub const UNREACHABLE_STATEMENT: DiagnosticMessage = diag!(2305, Error, "Unreached statement.");
    pub const CANNOT_RETURN_0_FROM_FUNCTION_RETURNING_1: DiagnosticMessage = diag!(2306, Error, "A value of type '{0}' cannot be returned from a function returning '{1}'.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_message() {
        let msg = format_message("Type '{0}' is not assignable to type '{1}'.", &["Int", "String"]);
        assert_eq!(msg, "Type 'Int' is not assignable to type 'String'.");
    }

    #[test]
    fn test_format_message_no_args() {
        let msg = format_message("Unreached statement.", &[]);
        assert_eq!(msg, "Unreached statement.");
    }

    #[test]
    fn test_format_message_three_args() {
        let msg = format_message(
            messages::OPERATOR_0_CANNOT_BE_APPLIED_TO_TYPES_1_AND_2.message,
            &["+", "String", "Boolean"],
        );
        assert_eq!(msg, "Operator '+' cannot be applied to types 'String' and 'Boolean'.");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::at(TextSpan::new(10, 5), &messages::CANNOT_FIND_NAME_0, &["foo"])
            .in_file("main.sash");
        let display = format!("{}", diag);
        assert_eq!(display, "main.sash(10): error SH2001: Cannot find name 'foo'.");
    }

    #[test]
    fn test_diagnostic_without_location() {
        let diag = Diagnostic::new(&messages::UNREACHABLE_STATEMENT, &[]);
        assert!(diag.file.is_none());
        assert!(diag.span.is_none());
        assert_eq!(diag.code, 2305);
        assert!(diag.is_error());
    }

    #[test]
    fn test_diagnostic_collection() {
        let mut collection = DiagnosticCollection::new();
        assert!(collection.is_empty());

        collection.report(TextSpan::new(0, 1), &messages::UNREACHABLE_STATEMENT, &[]);
        collection.report(TextSpan::new(4, 1), &messages::CANNOT_FIND_NAME_0, &["x"]);
        assert_eq!(collection.error_count(), 2);
        assert_eq!(collection.count_code(2001), 1);
    }

    #[test]
    fn test_diagnostic_collection_sort_is_stable() {
        let mut collection = DiagnosticCollection::new();
        collection.report(TextSpan::new(10, 1), &messages::UNREACHABLE_STATEMENT, &[]);
        collection.report(TextSpan::new(5, 1), &messages::CANNOT_FIND_NAME_0, &["a"]);
        collection.report(TextSpan::new(5, 1), &messages::CANNOT_FIND_NAME_0, &["b"]);
        collection.set_file("main.sash");
        collection.sort();
        let texts: Vec<_> = collection.iter().map(|d| d.message_text.as_str()).collect();
        assert_eq!(
            texts,
            ["Cannot find name 'a'.", "Cannot find name 'b'.", "Unreached statement."]
        );
        assert!(collection.iter().all(|d| d.file.as_deref() == Some("main.sash")));
    }
}
