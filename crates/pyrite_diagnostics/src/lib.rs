//! pyrite_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Diagnostics carry a category, a resolved message, a source range, an
//! optional rule identifier for configurable-severity rules, and an
//! optional machine-readable remediation action.

use pyrite_core::text::TextRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Warning => write!(f, "warning"),
        }
    }
}

/// Configured severity of a warn-family rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    None,
}

/// Severity configuration for the rules the binder consults.
#[derive(Debug, Clone)]
pub struct DiagnosticRuleSet {
    pub report_missing_imports: DiagnosticLevel,
    pub report_missing_type_stubs: DiagnosticLevel,
    pub report_invalid_string_escape_sequence: DiagnosticLevel,
}

impl Default for DiagnosticRuleSet {
    fn default() -> Self {
        Self {
            report_missing_imports: DiagnosticLevel::Warning,
            report_missing_type_stubs: DiagnosticLevel::Warning,
            report_invalid_string_escape_sequence: DiagnosticLevel::Warning,
        }
    }
}

/// Rule identifiers, as they appear in configuration files.
pub mod rules {
    pub const REPORT_MISSING_IMPORTS: &str = "reportMissingImports";
    pub const REPORT_MISSING_TYPE_STUBS: &str = "reportMissingTypeStubs";
    pub const REPORT_INVALID_STRING_ESCAPE_SEQUENCE: &str = "reportInvalidStringEscapeSequence";
}

/// A machine-readable remediation action attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum DiagnosticAction {
    #[serde(rename = "pyright.createtypestub")]
    CreateTypeStub {
        #[serde(rename = "moduleName")]
        module_name: String,
    },
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    /// The source range where this diagnostic occurred.
    pub range: TextRange,
    /// The configurable rule that produced this diagnostic, if any.
    pub rule: Option<&'static str>,
    pub action: Option<DiagnosticAction>,
}

impl Diagnostic {
    pub fn new(category: DiagnosticCategory, message: impl Into<String>, range: TextRange) -> Self {
        Self {
            category,
            message: message.into(),
            range,
            rule: None,
            action: None,
        }
    }

    pub fn with_rule(mut self, rule: &'static str) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_action(mut self, action: DiagnosticAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Whether this is an error diagnostic.
    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Render the action payload as JSON for host consumption.
    pub fn action_json(&self) -> Option<String> {
        self.action
            .as_ref()
            .and_then(|a| serde_json::to_string(a).ok())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.category, self.range, self.message)?;
        if let Some(rule) = self.rule {
            write!(f, " [{}]", rule)?;
        }
        Ok(())
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc.
/// with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of diagnostics accumulated during analysis of one file.
/// Diagnostics are appended in traversal order.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add a hard error.
    pub fn add_error(&mut self, message: impl Into<String>, range: TextRange) {
        self.add(Diagnostic::new(DiagnosticCategory::Error, message, range));
    }

    /// Add a diagnostic whose severity comes from configuration. A level
    /// of `None` suppresses it entirely.
    pub fn add_with_level(
        &mut self,
        level: DiagnosticLevel,
        rule: &'static str,
        message: impl Into<String>,
        range: TextRange,
    ) -> Option<&mut Diagnostic> {
        let category = match level {
            DiagnosticLevel::Error => DiagnosticCategory::Error,
            DiagnosticLevel::Warning => DiagnosticCategory::Warning,
            DiagnosticLevel::None => return None,
        };
        self.add(Diagnostic::new(category, message, range).with_rule(rule));
        self.diagnostics.last_mut()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticSink) {
        self.diagnostics.extend(other.diagnostics);
    }
}

// ============================================================================
// Diagnostic messages
// ============================================================================

pub mod messages {
    // Scope and declaration statement errors
    pub const YIELD_NOT_ALLOWED_OUTSIDE_FUNCTION: &str =
        "'yield' not allowed outside of a function";
    pub const YIELD_FROM_WITHIN_ASYNC_FUNCTION: &str =
        "'yield from' not allowed in an async function";
    pub const AWAIT_NOT_IN_ASYNC_FUNCTION: &str =
        "'await' allowed only within async function";
    pub const RAISE_PARAMS_MISSING: &str =
        "Raise requires parameter(s) when used outside of an except clause";
    pub const NONLOCAL_AT_MODULE_LEVEL: &str =
        "Nonlocal declaration not allowed at module level";
    pub const ALREADY_DECLARED_GLOBAL: &str = "'{0}' was already declared global";
    pub const ALREADY_DECLARED_NONLOCAL: &str = "'{0}' was already declared nonlocal";
    pub const GLOBAL_REASSIGNMENT: &str = "'{0}' is assigned before global declaration";
    pub const NONLOCAL_REASSIGNMENT: &str = "'{0}' is assigned before nonlocal declaration";
    pub const NONLOCAL_NO_BINDING: &str = "No binding for nonlocal '{0}' found";
    pub const DUPLICATE_METACLASS: &str = "Only one metaclass can be provided";
    pub const TYPE_ANNOTATION_NOT_SUPPORTED: &str =
        "Type annotation not supported for this type of expression";

    // Import diagnostics
    pub const IMPORT_RESOLVE_FAILURE: &str = "Import '{0}' could not be resolved";
    pub const STUB_FILE_MISSING: &str = "Stub file not found for '{0}'";

    // String literal diagnostics
    pub const UNSUPPORTED_ESCAPE_SEQUENCE: &str =
        "Unsupported escape sequence in string literal";
    pub const ESCAPE_WITHIN_FORMAT_EXPRESSION: &str =
        "Escape sequence (backslash) not allowed in expression portion of f-string";
    pub const SINGLE_CLOSE_BRACE_WITHIN_FORMAT_LITERAL: &str =
        "Single close brace not allowed within f-string literal; use double close brace";
    pub const UNTERMINATED_FORMAT_EXPRESSION: &str =
        "Unterminated expression in f-string; missing close brace";
}
