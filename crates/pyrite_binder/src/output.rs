//! Results of binding one file.

use crate::scope::{ScopeKind, ScopeTree};
use crate::symbol::{Symbol, SymbolArena};
use crate::types::TypeRegistry;
use pyrite_ast::types::{ClassTypeId, FunctionTypeId, NodeId, ScopeId};
use pyrite_core::names::Name;
use pyrite_diagnostics::DiagnosticSink;
use rustc_hash::FxHashMap;

/// Side tables attaching binder output to syntax nodes. Tree nodes are
/// immutable once built, so annotations live here keyed by node id.
#[derive(Debug, Default)]
pub struct NodeAnnotations {
    scopes: FxHashMap<NodeId, ScopeId>,
    class_types: FxHashMap<NodeId, ClassTypeId>,
    function_types: FxHashMap<NodeId, FunctionTypeId>,
}

impl NodeAnnotations {
    pub fn set_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.scopes.insert(node, scope);
    }

    pub fn scope_for(&self, node: NodeId) -> Option<ScopeId> {
        self.scopes.get(&node).copied()
    }

    pub fn set_class_type(&mut self, node: NodeId, class: ClassTypeId) {
        self.class_types.insert(node, class);
    }

    pub fn class_type_for(&self, node: NodeId) -> Option<ClassTypeId> {
        self.class_types.get(&node).copied()
    }

    pub fn set_function_type(&mut self, node: NodeId, function: FunctionTypeId) {
        self.function_types.insert(node, function);
    }

    pub fn function_type_for(&self, node: NodeId) -> Option<FunctionTypeId> {
        self.function_types.get(&node).copied()
    }
}

/// Everything the binder produced for one file.
#[derive(Debug)]
pub struct BindOutput {
    pub scopes: ScopeTree,
    pub symbols: SymbolArena,
    pub types: TypeRegistry,
    pub annotations: NodeAnnotations,
    /// The module (or built-in) scope of this file.
    pub module_scope: ScopeId,
    pub module_doc_string: Option<String>,
    pub diagnostics: DiagnosticSink,
}

impl BindOutput {
    /// The symbol for `name` in the given scope's own table, ignoring
    /// parent scopes and export filters.
    pub fn symbol_in_scope(&self, scope: ScopeId, name: Name) -> Option<&Symbol> {
        self.scopes
            .scope(scope)
            .symbol(name)
            .map(|id| self.symbols.get(id))
    }

    /// The built-in scope of this output, if one exists (either this
    /// file's own module scope for the built-ins stub, or a seeded
    /// parent copied from another output).
    pub fn builtin_scope(&self) -> Option<ScopeId> {
        self.scopes
            .iter()
            .find(|(_, scope)| scope.kind == ScopeKind::Builtin)
            .map(|(id, _)| id)
    }
}
