//! Scope tree management for the binder.
//!
//! Scopes are owned by a flat arena and reference their parents by id, so
//! the parent-linked tree never forms ownership cycles. Each scope owns a
//! symbol table mapping names to symbol ids in the symbol arena.

use indexmap::IndexSet;
use pyrite_ast::types::{NodeId, ScopeId, SymbolId};
use pyrite_core::names::Name;
use rustc_hash::FxHashMap;

/// The kind of a scope. Lambdas bind as `Function` scopes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ScopeKind {
    Builtin,
    Module,
    Class,
    Function,
    Comprehension,
}

/// A single lexical scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// The parent scope (None for the outermost scope).
    pub parent: Option<ScopeId>,
    /// The syntax node that owns this scope.
    pub owner: NodeId,
    /// Names declared in this scope.
    symbols: FxHashMap<Name, SymbolId>,
    /// When set, restricts which names unqualified lookup can see from
    /// outside; used only for the built-in scope.
    pub export_filter: Option<IndexSet<Name>>,
    /// Whether execution of this scope always ends in a raise.
    pub always_raises: bool,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>, owner: NodeId) -> Self {
        Self {
            kind,
            parent,
            owner,
            symbols: FxHashMap::default(),
            export_filter: None,
            always_raises: false,
        }
    }

    /// Raw table access; ignores the export filter.
    pub fn symbol(&self, name: Name) -> Option<SymbolId> {
        self.symbols.get(&name).copied()
    }

    pub fn has_symbol(&self, name: Name) -> bool {
        self.symbols.contains_key(&name)
    }

    pub fn insert_symbol(&mut self, name: Name, id: SymbolId) {
        self.symbols.insert(name, id);
    }

    /// Remove a name from this scope's table. The symbol itself stays in
    /// the symbol arena; only the scope's reference to it is dropped.
    /// Used when a `global` or `nonlocal` declaration redirects a name.
    pub fn remove_symbol(&mut self, name: Name) -> Option<SymbolId> {
        self.symbols.remove(&name)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn symbols(&self) -> impl Iterator<Item = (Name, SymbolId)> + '_ {
        self.symbols.iter().map(|(k, v)| (*k, *v))
    }

    /// Whether the export filter (if any) allows `name` to be seen by
    /// unqualified lookup.
    pub fn exports_name(&self, name: Name) -> bool {
        match &self.export_filter {
            Some(filter) => filter.contains(&name),
            None => true,
        }
    }
}

/// The result of a scope-chain lookup.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SymbolLookup {
    pub scope: ScopeId,
    pub symbol: SymbolId,
}

/// Arena of scopes for one file's analysis.
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, owner: NodeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, parent, owner));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId(i as u32), s))
    }

    /// The chain of scopes from `from` outward, including `from` itself.
    pub fn chain(&self, from: ScopeId) -> impl Iterator<Item = (ScopeId, &Scope)> + '_ {
        let mut current = Some(from);
        std::iter::from_fn(move || {
            let id = current?;
            let scope = self.scope(id);
            current = scope.parent;
            Some((id, scope))
        })
    }

    /// The nearest enclosing scope of kind Module or Builtin, including
    /// `from` itself.
    pub fn global_scope(&self, from: ScopeId) -> ScopeId {
        for (id, scope) in self.chain(from) {
            if matches!(scope.kind, ScopeKind::Module | ScopeKind::Builtin) {
                return id;
            }
        }
        // The chain always terminates in a module or builtin scope.
        from
    }

    /// The nearest enclosing scope whose owner is a function or module
    /// node, including `from` itself. Class and comprehension scopes are
    /// skipped; this is the scope a nested function links to.
    pub fn function_or_module_scope(&self, from: ScopeId) -> ScopeId {
        for (id, scope) in self.chain(from) {
            if matches!(
                scope.kind,
                ScopeKind::Function | ScopeKind::Module | ScopeKind::Builtin
            ) {
                return id;
            }
        }
        from
    }

    /// Look a name up through the scope chain starting at `from`. Honors
    /// each scope's export filter, so names hidden from unqualified
    /// lookup are not returned.
    pub fn lookup(&self, from: ScopeId, name: Name) -> Option<SymbolLookup> {
        for (id, scope) in self.chain(from) {
            if let Some(symbol) = scope.symbol(name) {
                if scope.exports_name(name) {
                    return Some(SymbolLookup { scope: id, symbol });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrite_core::names::NameTable;

    #[test]
    fn test_scope_chain_lookup() {
        let interner = NameTable::new();
        let mut tree = ScopeTree::new();
        let module = tree.add_scope(ScopeKind::Module, None, NodeId(0));
        let func = tree.add_scope(ScopeKind::Function, Some(module), NodeId(1));

        let name = interner.intern("x");
        tree.scope_mut(module).insert_symbol(name, SymbolId(0));

        let found = tree.lookup(func, name).unwrap();
        assert_eq!(found.scope, module);
        assert_eq!(found.symbol, SymbolId(0));
    }

    #[test]
    fn test_export_filter_hides_names() {
        let interner = NameTable::new();
        let mut tree = ScopeTree::new();
        let builtin = tree.add_scope(ScopeKind::Builtin, None, NodeId(0));

        let visible = interner.intern("print");
        let hidden = interner.intern("_secret");
        tree.scope_mut(builtin).insert_symbol(visible, SymbolId(0));
        tree.scope_mut(builtin).insert_symbol(hidden, SymbolId(1));

        let mut filter = IndexSet::default();
        filter.insert(visible);
        tree.scope_mut(builtin).export_filter = Some(filter);

        assert!(tree.lookup(builtin, visible).is_some());
        assert!(tree.lookup(builtin, hidden).is_none());
        // The name is still resident in the table.
        assert!(tree.scope(builtin).has_symbol(hidden));
    }

    #[test]
    fn test_function_or_module_skips_class_scopes() {
        let mut tree = ScopeTree::new();
        let module = tree.add_scope(ScopeKind::Module, None, NodeId(0));
        let class = tree.add_scope(ScopeKind::Class, Some(module), NodeId(1));
        let method = tree.add_scope(ScopeKind::Function, Some(class), NodeId(2));
        let inner_class = tree.add_scope(ScopeKind::Class, Some(method), NodeId(3));

        assert_eq!(tree.function_or_module_scope(class), module);
        assert_eq!(tree.function_or_module_scope(method), method);
        assert_eq!(tree.function_or_module_scope(inner_class), method);
    }

    #[test]
    fn test_global_scope() {
        let mut tree = ScopeTree::new();
        let builtin = tree.add_scope(ScopeKind::Builtin, None, NodeId(0));
        let module = tree.add_scope(ScopeKind::Module, Some(builtin), NodeId(1));
        let func = tree.add_scope(ScopeKind::Function, Some(module), NodeId(2));

        assert_eq!(tree.global_scope(func), module);
        assert_eq!(tree.global_scope(module), module);
        assert_eq!(tree.global_scope(builtin), builtin);
    }
}
