//! pyrite_ast: Syntax-tree definitions for the pyrite analyzer.
//!
//! The tree is produced by an external parser (or synthesized through
//! `pyrite_nodebuilder`); nodes are arena-allocated and reference children
//! by plain references. Import statements arrive with resolver information
//! already attached.

pub mod node;
pub mod types;

pub use node::{Expression, ModuleNode, Statement};
pub use types::{ClassTypeId, FunctionTypeId, NodeId, ScopeId, SymbolId, TypeSourceId};
