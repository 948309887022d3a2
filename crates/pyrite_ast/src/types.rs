//! Id handles, flags, and operator kinds shared across the analyzer.

use std::fmt;

/// Node ID for referencing syntax nodes by index. Assigned by the parser
/// (or node builder) in creation order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A lightweight handle to a scope in the scope tree.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ScopeId(pub u32);

impl ScopeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A lightweight handle to a symbol in the symbol arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A handle to a class type constructed during binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ClassTypeId(pub u32);

impl ClassTypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A handle to a function type constructed during binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FunctionTypeId(pub u32);

impl FunctionTypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An opaque id identifying the source of an inferred type. The binder
/// forwards these to downstream consumers without interpreting them;
/// in practice they are derived from node ids.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TypeSourceId(pub u32);

impl TypeSourceId {
    #[inline]
    pub fn from_node(node: NodeId) -> Self {
        Self(node.0)
    }
}

impl fmt::Debug for TypeSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeSourceId({})", self.0)
    }
}

bitflags::bitflags! {
    /// Unescape-error flags attached to string tokens by the lexer.
    /// The binder turns these into configurable-severity diagnostics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StringErrorFlags: u8 {
        const NONE                               = 0;
        const UNSUPPORTED_ESCAPE_SEQUENCE        = 1 << 0;
        const ESCAPE_WITHIN_FORMAT_EXPRESSION    = 1 << 1;
        const SINGLE_CLOSE_BRACE_WITHIN_FORMAT   = 1 << 2;
        const UNTERMINATED_FORMAT_EXPRESSION     = 1 << 3;
    }
}

/// Unary, binary, boolean, and comparison operators.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Mod,
    Pow,
    MatrixMultiply,
    LeftShift,
    RightShift,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    And,
    Or,
    Not,
    Negate,
    Positive,
    BitwiseInvert,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Is,
    IsNot,
    In,
    NotIn,
}

impl Operator {
    /// Whether this operator is one of the six comparison operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::GreaterThan
                | Operator::GreaterThanOrEqual
        )
    }
}

/// How a parameter receives its argument.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ParameterCategory {
    /// An ordinary named parameter.
    Simple,
    /// A `*args`-style parameter.
    VarArgList,
    /// A `**kwargs`-style parameter.
    VarArgDictionary,
}
