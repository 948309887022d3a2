//! pyrite_binder: Name binding and scope analysis.
//!
//! The binder walks one file's syntax tree and produces, for every
//! lexical scope, a symbol table mapping names to symbols, where each
//! symbol carries an ordered list of declarations describing where and
//! how the name was introduced. Function and lambda bodies bind in a
//! deferred second pass after their enclosing scope completes.

pub mod binder;
pub mod builtins;
pub mod context;
pub mod declaration;
mod imports;
pub mod output;
pub mod scope;
pub mod symbol;
pub mod types;

pub use binder::{BindResult, Binder, BinderFault};
pub use context::{FileInfo, ImportLookup, ImportedModuleSymbols};
pub use declaration::{Declaration, DeclarationCategory, DeclaredType, LoaderActions};
pub use output::{BindOutput, NodeAnnotations};
pub use scope::{Scope, ScopeKind, ScopeTree, SymbolLookup};
pub use symbol::{Symbol, SymbolArena, SymbolFlags};
pub use types::{ClassType, ClassTypeFlags, FunctionType, FunctionTypeFlags, TypeRegistry};
