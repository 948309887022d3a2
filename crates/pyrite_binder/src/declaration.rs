//! The declaration model.
//!
//! A declaration records one site at which a name was introduced. They
//! are tagged variants rather than trait objects so that downstream
//! consumers can dispatch structurally.

use indexmap::IndexMap;
use pyrite_ast::types::{ClassTypeId, NodeId, TypeSourceId};
use pyrite_core::names::Name;
use pyrite_core::text::TextRange;

/// The type a `BuiltIn` declaration assigns to its name. The binder does
/// no inference; these are the only types it ever states outright.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DeclaredType {
    Any,
    Str,
    Class(ClassTypeId),
}

/// The module-loader steps an importing scope must perform to bind a
/// name: a resolved path plus nested actions for submodules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderActions {
    pub path: String,
    pub implicit_imports: IndexMap<Name, LoaderActions>,
}

impl LoaderActions {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            implicit_imports: IndexMap::default(),
        }
    }
}

/// One site at which a name was introduced.
#[derive(Debug, Clone)]
pub enum Declaration {
    Class {
        node: NodeId,
        path: String,
        range: TextRange,
    },
    Function {
        node: NodeId,
        path: String,
        range: TextRange,
    },
    Method {
        node: NodeId,
        path: String,
        range: TextRange,
    },
    Parameter {
        node: NodeId,
        path: String,
        range: TextRange,
    },
    Variable {
        node: NodeId,
        path: String,
        range: TextRange,
        is_constant: bool,
        type_annotation_node: Option<NodeId>,
        inferred_type_source: Option<TypeSourceId>,
    },
    Alias {
        path: String,
        range: TextRange,
        /// The first dotted-name part for `import a.b.c`-style imports;
        /// used to merge repeated imports of the same root.
        first_name_part: Option<Name>,
        /// The name to look up in the target module, for
        /// `from m import x` style imports.
        symbol_name: Option<Name>,
        implicit_imports: IndexMap<Name, LoaderActions>,
    },
    BuiltIn {
        node: Option<NodeId>,
        declared_type: DeclaredType,
        path: String,
        range: TextRange,
    },
}

/// Discriminant of a declaration, for dispatch and assertions.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum DeclarationCategory {
    Class,
    Function,
    Method,
    Parameter,
    Variable,
    Alias,
    BuiltIn,
}

impl Declaration {
    pub fn category(&self) -> DeclarationCategory {
        match self {
            Declaration::Class { .. } => DeclarationCategory::Class,
            Declaration::Function { .. } => DeclarationCategory::Function,
            Declaration::Method { .. } => DeclarationCategory::Method,
            Declaration::Parameter { .. } => DeclarationCategory::Parameter,
            Declaration::Variable { .. } => DeclarationCategory::Variable,
            Declaration::Alias { .. } => DeclarationCategory::Alias,
            Declaration::BuiltIn { .. } => DeclarationCategory::BuiltIn,
        }
    }

    pub fn range(&self) -> TextRange {
        match self {
            Declaration::Class { range, .. }
            | Declaration::Function { range, .. }
            | Declaration::Method { range, .. }
            | Declaration::Parameter { range, .. }
            | Declaration::Variable { range, .. }
            | Declaration::Alias { range, .. }
            | Declaration::BuiltIn { range, .. } => *range,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Declaration::Class { path, .. }
            | Declaration::Function { path, .. }
            | Declaration::Method { path, .. }
            | Declaration::Parameter { path, .. }
            | Declaration::Variable { path, .. }
            | Declaration::Alias { path, .. }
            | Declaration::BuiltIn { path, .. } => path,
        }
    }
}

/// Whether a name follows the all-caps constant naming convention.
pub fn is_constant_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
