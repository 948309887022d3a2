//! Symbols and the symbol arena.
//!
//! A symbol is the per-scope bucket for one name: an ordered list of
//! declarations plus flags. Symbols only grow; nothing is deleted during
//! analysis.

use crate::declaration::Declaration;
use indexmap::IndexSet;
use pyrite_ast::types::{SymbolId, TypeSourceId};
use pyrite_core::names::Name;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u8 {
        const NONE                       = 0;
        /// The name may be referenced before its first binding site.
        const INITIALLY_UNBOUND          = 1 << 0;
        /// The symbol is a member of a class (set on all names bound in
        /// a class scope).
        const CLASS_MEMBER               = 1 << 1;
        /// The symbol is an instance member discovered through a
        /// `self.<name>` assignment in a method.
        const INSTANCE_MEMBER            = 1 << 2;
        /// The symbol should not participate in protocol matching.
        const IGNORED_FOR_PROTOCOL_MATCH = 1 << 3;
    }
}

/// A named entity within a scope, aggregating every site that declares it.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Name,
    pub flags: SymbolFlags,
    /// Declarations in discovery order. Duplicates are allowed; later
    /// passes reconcile them.
    declarations: Vec<Declaration>,
    /// Sources of inferred types, keyed by opaque type-source id. The
    /// binder records where a type could be inferred from; the inference
    /// engine consumes these later.
    inferred_type_sources: IndexSet<TypeSourceId>,
}

impl Symbol {
    pub fn new(name: Name, flags: SymbolFlags) -> Self {
        Self {
            name,
            flags,
            declarations: Vec::new(),
            inferred_type_sources: IndexSet::default(),
        }
    }

    pub fn add_declaration(&mut self, declaration: Declaration) {
        self.declarations.push(declaration);
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn declarations_mut(&mut self) -> &mut Vec<Declaration> {
        &mut self.declarations
    }

    pub fn add_inferred_type_source(&mut self, source: TypeSourceId) {
        self.inferred_type_sources.insert(source);
    }

    pub fn inferred_type_sources(&self) -> impl Iterator<Item = TypeSourceId> + '_ {
        self.inferred_type_sources.iter().copied()
    }
}

/// Flat arena of all symbols created during one file's analysis.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, name: Name, flags: SymbolFlags) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol::new(name, flags));
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
