//! Class and function types constructed during binding.
//!
//! The binder does not infer types, but it does build the shells that the
//! inference engine later fills in: one class type per class node (whose
//! field table is the class scope itself) and one function type per
//! function or lambda node.

use pyrite_ast::types::{ClassTypeId, FunctionTypeId, NodeId, ParameterCategory, ScopeId};
use pyrite_core::names::Name;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassTypeFlags: u8 {
        const NONE             = 0;
        /// Declared within the built-ins or a typing/built-ins stub.
        const BUILT_IN         = 1 << 0;
        /// A synthesized special form from the typing stub (e.g. Union).
        const SPECIAL_BUILT_IN = 1 << 1;
    }
}

#[derive(Debug, Clone)]
pub struct ClassType {
    pub name: Name,
    pub flags: ClassTypeFlags,
    pub doc_string: Option<String>,
    /// Positional base-class argument expressions, by node.
    pub base_class_nodes: Vec<NodeId>,
    /// The `metaclass` keyword argument expression, if present.
    pub metaclass_node: Option<NodeId>,
    /// Set when no explicit base class was written and the class is not
    /// itself `object`.
    pub has_implicit_object_base: bool,
    /// The class scope; its symbol table is the class's field table.
    pub fields: Option<ScopeId>,
}

impl ClassType {
    pub fn new(name: Name, flags: ClassTypeFlags, doc_string: Option<String>) -> Self {
        Self {
            name,
            flags,
            doc_string,
            base_class_nodes: Vec::new(),
            metaclass_node: None,
            has_implicit_object_base: false,
            fields: None,
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FunctionTypeFlags: u8 {
        const NONE           = 0;
        const ASYNC          = 1 << 0;
        /// Declared inside a class body.
        const METHOD         = 1 << 1;
        /// Bound to the class rather than the instance, with or without
        /// an explicit decorator (`__new__` qualifies implicitly).
        const CONSTRUCTOR    = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct FunctionParameter {
    pub category: ParameterCategory,
    /// Absent for a bare `*` separator.
    pub name: Option<Name>,
    pub annotation_node: Option<NodeId>,
    pub has_default: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionType {
    /// Absent for lambdas.
    pub name: Option<Name>,
    pub flags: FunctionTypeFlags,
    pub doc_string: Option<String>,
    pub parameters: Vec<FunctionParameter>,
}

impl FunctionType {
    pub fn new(name: Option<Name>, flags: FunctionTypeFlags) -> Self {
        Self {
            name,
            flags,
            doc_string: None,
            parameters: Vec::new(),
        }
    }
}

/// Registry of the types the binder constructed for this file.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    classes: Vec<ClassType>,
    functions: Vec<FunctionType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: ClassType) -> ClassTypeId {
        let id = ClassTypeId(self.classes.len() as u32);
        self.classes.push(class);
        id
    }

    pub fn class(&self, id: ClassTypeId) -> &ClassType {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassTypeId) -> &mut ClassType {
        &mut self.classes[id.index()]
    }

    pub fn add_function(&mut self, function: FunctionType) -> FunctionTypeId {
        let id = FunctionTypeId(self.functions.len() as u32);
        self.functions.push(function);
        id
    }

    pub fn function(&self, id: FunctionTypeId) -> &FunctionType {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FunctionTypeId) -> &mut FunctionType {
        &mut self.functions[id.index()]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}
