//! Per-file analysis context handed to the binder by the host analyzer.

use pyrite_core::env::ExecutionEnvironment;
use pyrite_core::text::LineMap;
use pyrite_diagnostics::DiagnosticRuleSet;

/// Exported names of a module, as reported by the host's symbol-table
/// lookup for wildcard imports.
#[derive(Debug, Clone, Default)]
pub struct ImportedModuleSymbols {
    /// Exported names in the module's declaration order.
    pub symbol_names: Vec<String>,
}

/// Host callback resolving a module path to its exported symbol table.
/// Cross-module lookups are delegated here; the binder never reads other
/// files itself.
pub trait ImportLookup {
    fn lookup(&self, path: &str) -> Option<ImportedModuleSymbols>;
}

/// Everything the binder needs to know about the file being bound.
pub struct FileInfo<'a> {
    /// Source path of the file, recorded on every declaration.
    pub file_path: String,
    /// Pre-computed line offsets for offset-to-position conversion.
    pub lines: LineMap,
    pub execution_environment: ExecutionEnvironment,
    pub rule_set: DiagnosticRuleSet,
    /// Whether this file is the typing stub (special names are
    /// intercepted there).
    pub is_typing_stub_file: bool,
    /// Whether this file is the built-ins stub (its scope becomes the
    /// built-in scope and receives the export filter).
    pub is_builtin_stub_file: bool,
    /// Wildcard-import resolution callback.
    pub import_lookup: Option<&'a dyn ImportLookup>,
}

impl<'a> FileInfo<'a> {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            lines: LineMap::new(""),
            execution_environment: ExecutionEnvironment::default(),
            rule_set: DiagnosticRuleSet::default(),
            is_typing_stub_file: false,
            is_builtin_stub_file: false,
            import_lookup: None,
        }
    }
}
