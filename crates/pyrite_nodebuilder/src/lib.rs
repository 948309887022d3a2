//! pyrite_nodebuilder: Synthetic syntax-tree construction.
//!
//! The parser is an external collaborator, so everything in this
//! repository that needs a tree — binder tests, evaluator tests, host
//! tooling — builds one programmatically through `AstBuilder`. Nodes are
//! allocated in the caller's arena and receive sequential ids and
//! monotonically increasing synthetic ranges, so diagnostics and
//! declarations carry distinct, ordered positions.

use bumpalo::Bump;
use pyrite_ast::node::*;
use pyrite_ast::types::{NodeId, Operator, ParameterCategory, StringErrorFlags};
use pyrite_core::names::NameTable;
use pyrite_core::text::TextRange;
use std::cell::Cell;

/// Builds arena-allocated syntax nodes with fresh ids and ranges.
///
/// ```
/// use bumpalo::Bump;
/// use pyrite_core::names::NameTable;
/// use pyrite_nodebuilder::AstBuilder;
///
/// let arena = Bump::new();
/// let names = NameTable::new();
/// let b = AstBuilder::new(&arena, &names);
/// let module = b.module(vec![b.assign(b.name("x"), b.int(1))]);
/// assert_eq!(module.statements.len(), 1);
/// ```
pub struct AstBuilder<'a> {
    arena: &'a Bump,
    names: &'a NameTable,
    next_id: Cell<u32>,
    cursor: Cell<u32>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(arena: &'a Bump, names: &'a NameTable) -> Self {
        Self {
            arena,
            names,
            next_id: Cell::new(0),
            cursor: Cell::new(0),
        }
    }

    pub fn names(&self) -> &'a NameTable {
        self.names
    }

    fn data(&self) -> NodeData {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let pos = self.cursor.get();
        self.cursor.set(pos + 1);
        NodeData::new(NodeId(id), TextRange::new(pos, pos + 1))
    }

    fn slice<T>(&self, items: Vec<T>) -> &'a [T] {
        self.arena.alloc_slice_fill_iter(items)
    }

    // ========================================================================
    // Names and atoms
    // ========================================================================

    pub fn name_node(&self, value: &str) -> &'a NameNode {
        self.arena.alloc(NameNode {
            data: self.data(),
            value: self.names.intern(value),
        })
    }

    pub fn name(&self, value: &str) -> Expression<'a> {
        Expression::Name(self.name_node(value))
    }

    pub fn int(&self, value: i64) -> Expression<'a> {
        Expression::Number(self.arena.alloc(NumberNode {
            data: self.data(),
            value: NumberValue::Int(value),
        }))
    }

    pub fn float(&self, value: f64) -> Expression<'a> {
        Expression::Number(self.arena.alloc(NumberNode {
            data: self.data(),
            value: NumberValue::Float(value),
        }))
    }

    fn constant(&self, value: KeywordConstant) -> Expression<'a> {
        Expression::Constant(self.arena.alloc(ConstantNode {
            data: self.data(),
            value,
        }))
    }

    pub fn true_literal(&self) -> Expression<'a> {
        self.constant(KeywordConstant::True)
    }

    pub fn false_literal(&self) -> Expression<'a> {
        self.constant(KeywordConstant::False)
    }

    pub fn none_literal(&self) -> Expression<'a> {
        self.constant(KeywordConstant::None)
    }

    pub fn ellipsis(&self) -> Expression<'a> {
        self.constant(KeywordConstant::Ellipsis)
    }

    /// A plain (non-formatted) string literal.
    pub fn string(&self, value: &str) -> Expression<'a> {
        self.string_with_flags(value, StringErrorFlags::NONE)
    }

    pub fn string_with_flags(&self, value: &str, flags: StringErrorFlags) -> Expression<'a> {
        let piece = StringNode {
            data: self.data(),
            value: value.to_string(),
            is_format_string: false,
            format_expressions: &[],
            error_flags: flags,
        };
        Expression::StringList(self.arena.alloc(StringListNode {
            data: self.data(),
            strings: self.slice(vec![piece]),
        }))
    }

    /// A format string with interpolated expressions and optional
    /// lexer-reported error flags.
    pub fn format_string(
        &self,
        value: &str,
        format_expressions: Vec<Expression<'a>>,
        flags: StringErrorFlags,
    ) -> Expression<'a> {
        let piece = StringNode {
            data: self.data(),
            value: value.to_string(),
            is_format_string: true,
            format_expressions: self.slice(format_expressions),
            error_flags: flags,
        };
        Expression::StringList(self.arena.alloc(StringListNode {
            data: self.data(),
            strings: self.slice(vec![piece]),
        }))
    }

    // ========================================================================
    // Compound expressions
    // ========================================================================

    pub fn member(&self, base: Expression<'a>, member: &str) -> Expression<'a> {
        Expression::MemberAccess(self.arena.alloc(MemberAccessNode {
            data: self.data(),
            base,
            member: self.name_node(member),
        }))
    }

    pub fn index(&self, base: Expression<'a>, items: &[Expression<'a>]) -> Expression<'a> {
        Expression::Index(self.arena.alloc(IndexNode {
            data: self.data(),
            base,
            items: self.slice(items.to_vec()),
        }))
    }

    pub fn call(&self, callee: Expression<'a>, args: &[Expression<'a>]) -> Expression<'a> {
        let arguments: Vec<ArgumentNode<'a>> = args.iter().map(|a| self.pos_arg(*a)).collect();
        self.call_with_args(callee, arguments)
    }

    pub fn call_with_args(
        &self,
        callee: Expression<'a>,
        arguments: Vec<ArgumentNode<'a>>,
    ) -> Expression<'a> {
        Expression::Call(self.arena.alloc(CallNode {
            data: self.data(),
            callee,
            arguments: self.slice(arguments),
        }))
    }

    pub fn pos_arg(&self, value: Expression<'a>) -> ArgumentNode<'a> {
        ArgumentNode {
            data: self.data(),
            name: None,
            value,
        }
    }

    pub fn kw_arg(&self, name: &str, value: Expression<'a>) -> ArgumentNode<'a> {
        ArgumentNode {
            data: self.data(),
            name: Some(self.name_node(name)),
            value,
        }
    }

    pub fn tuple(&self, items: &[Expression<'a>]) -> Expression<'a> {
        Expression::Tuple(self.arena.alloc(TupleNode {
            data: self.data(),
            items: self.slice(items.to_vec()),
        }))
    }

    pub fn int_tuple(&self, values: &[i64]) -> Expression<'a> {
        let items: Vec<Expression<'a>> = values.iter().map(|v| self.int(*v)).collect();
        Expression::Tuple(self.arena.alloc(TupleNode {
            data: self.data(),
            items: self.slice(items),
        }))
    }

    pub fn list(&self, items: &[Expression<'a>]) -> Expression<'a> {
        Expression::List(self.arena.alloc(ListNode {
            data: self.data(),
            items: self.slice(items.to_vec()),
        }))
    }

    pub fn unpack(&self, expr: Expression<'a>) -> Expression<'a> {
        Expression::Unpack(self.arena.alloc(UnpackNode {
            data: self.data(),
            expr,
        }))
    }

    pub fn binary(&self, left: Expression<'a>, operator: Operator, right: Expression<'a>) -> Expression<'a> {
        Expression::BinaryOp(self.arena.alloc(BinaryOpNode {
            data: self.data(),
            left,
            operator,
            right,
        }))
    }

    pub fn unary(&self, operator: Operator, expr: Expression<'a>) -> Expression<'a> {
        Expression::UnaryOp(self.arena.alloc(UnaryOpNode {
            data: self.data(),
            operator,
            expr,
        }))
    }

    pub fn not(&self, expr: Expression<'a>) -> Expression<'a> {
        self.unary(Operator::Not, expr)
    }

    pub fn walrus(&self, name: &str, value: Expression<'a>) -> Expression<'a> {
        Expression::AssignmentExpr(self.arena.alloc(AssignmentExpressionNode {
            data: self.data(),
            name: self.name_node(name),
            value,
        }))
    }

    pub fn await_expr(&self, expr: Expression<'a>) -> Expression<'a> {
        Expression::Await(self.arena.alloc(AwaitNode {
            data: self.data(),
            expr,
        }))
    }

    pub fn yield_expr(&self, expr: Option<Expression<'a>>) -> Expression<'a> {
        Expression::Yield(self.arena.alloc(YieldNode {
            data: self.data(),
            expr,
        }))
    }

    pub fn yield_from(&self, expr: Expression<'a>) -> Expression<'a> {
        Expression::YieldFrom(self.arena.alloc(YieldFromNode {
            data: self.data(),
            expr,
        }))
    }

    pub fn lambda(&self, parameters: Vec<ParameterNode<'a>>, expression: Expression<'a>) -> Expression<'a> {
        Expression::Lambda(self.arena.alloc(LambdaNode {
            data: self.data(),
            parameters: self.slice(parameters),
            expression,
        }))
    }

    // ========================================================================
    // Comprehensions
    // ========================================================================

    pub fn comp_for(&self, target: Expression<'a>, iterable: Expression<'a>) -> ComprehensionIter<'a> {
        ComprehensionIter::For(self.arena.alloc(ComprehensionForNode {
            data: self.data(),
            target,
            iterable,
            is_async: false,
        }))
    }

    pub fn comp_if(&self, test: Expression<'a>) -> ComprehensionIter<'a> {
        ComprehensionIter::If(self.arena.alloc(ComprehensionIfNode {
            data: self.data(),
            test,
        }))
    }

    pub fn comprehension(
        &self,
        kind: ComprehensionKind,
        element: Expression<'a>,
        for_if_list: Vec<ComprehensionIter<'a>>,
    ) -> Expression<'a> {
        Expression::Comprehension(self.arena.alloc(ComprehensionNode {
            data: self.data(),
            kind,
            element,
            value: None,
            for_if_list: self.slice(for_if_list),
        }))
    }

    pub fn list_comp(
        &self,
        element: Expression<'a>,
        for_if_list: Vec<ComprehensionIter<'a>>,
    ) -> Expression<'a> {
        self.comprehension(ComprehensionKind::List, element, for_if_list)
    }

    // ========================================================================
    // Simple statements
    // ========================================================================

    pub fn assign(&self, target: Expression<'a>, value: Expression<'a>) -> Statement<'a> {
        Statement::Assignment(self.arena.alloc(AssignmentNode {
            data: self.data(),
            target,
            value,
        }))
    }

    pub fn aug_assign(
        &self,
        target: Expression<'a>,
        operator: Operator,
        value: Expression<'a>,
    ) -> Statement<'a> {
        Statement::AugmentedAssignment(self.arena.alloc(AugmentedAssignmentNode {
            data: self.data(),
            target,
            operator,
            value,
        }))
    }

    pub fn typed_assign(
        &self,
        target: Expression<'a>,
        annotation: Expression<'a>,
        value: Option<Expression<'a>>,
    ) -> Statement<'a> {
        Statement::TypedAssignment(self.arena.alloc(TypedAssignmentNode {
            data: self.data(),
            target,
            annotation,
            value,
        }))
    }

    pub fn expr_stmt(&self, expression: Expression<'a>) -> Statement<'a> {
        Statement::Expr(self.arena.alloc(ExpressionStatementNode {
            data: self.data(),
            expression,
        }))
    }

    /// A doc-string statement: a plain string expression statement.
    pub fn docstring(&self, text: &str) -> Statement<'a> {
        self.expr_stmt(self.string(text))
    }

    pub fn pass_stmt(&self) -> Statement<'a> {
        Statement::Pass(self.arena.alloc(PassNode { data: self.data() }))
    }

    pub fn break_stmt(&self) -> Statement<'a> {
        Statement::Break(self.arena.alloc(BreakNode { data: self.data() }))
    }

    pub fn continue_stmt(&self) -> Statement<'a> {
        Statement::Continue(self.arena.alloc(ContinueNode { data: self.data() }))
    }

    pub fn ret(&self, value: Option<Expression<'a>>) -> Statement<'a> {
        Statement::Return(self.arena.alloc(ReturnNode {
            data: self.data(),
            value,
        }))
    }

    pub fn raise(&self, exc: Option<Expression<'a>>, cause: Option<Expression<'a>>) -> Statement<'a> {
        Statement::Raise(self.arena.alloc(RaiseNode {
            data: self.data(),
            exc,
            cause,
        }))
    }

    pub fn assert_stmt(&self, test: Expression<'a>, message: Option<Expression<'a>>) -> Statement<'a> {
        Statement::Assert(self.arena.alloc(AssertNode {
            data: self.data(),
            test,
            message,
        }))
    }

    pub fn del(&self, targets: Vec<Expression<'a>>) -> Statement<'a> {
        Statement::Del(self.arena.alloc(DelNode {
            data: self.data(),
            targets: self.slice(targets),
        }))
    }

    pub fn global_stmt(&self, names: &[&str]) -> Statement<'a> {
        let names: Vec<&'a NameNode> = names.iter().copied().map(|n| self.name_node(n)).collect();
        Statement::Global(self.arena.alloc(GlobalNode {
            data: self.data(),
            names: self.slice(names),
        }))
    }

    pub fn nonlocal_stmt(&self, names: &[&str]) -> Statement<'a> {
        let names: Vec<&'a NameNode> = names.iter().copied().map(|n| self.name_node(n)).collect();
        Statement::Nonlocal(self.arena.alloc(NonlocalNode {
            data: self.data(),
            names: self.slice(names),
        }))
    }

    // ========================================================================
    // Compound statements
    // ========================================================================

    pub fn suite(&self, statements: Vec<Statement<'a>>) -> &'a SuiteNode<'a> {
        self.arena.alloc(SuiteNode {
            data: self.data(),
            statements: self.slice(statements),
        })
    }

    pub fn module(&self, statements: Vec<Statement<'a>>) -> &'a ModuleNode<'a> {
        self.arena.alloc(ModuleNode {
            data: self.data(),
            statements: self.slice(statements),
        })
    }

    pub fn if_stmt(
        &self,
        test: Expression<'a>,
        if_suite: &'a SuiteNode<'a>,
        else_clause: Option<ElseClause<'a>>,
    ) -> Statement<'a> {
        Statement::If(self.if_node(test, if_suite, else_clause))
    }

    pub fn if_node(
        &self,
        test: Expression<'a>,
        if_suite: &'a SuiteNode<'a>,
        else_clause: Option<ElseClause<'a>>,
    ) -> &'a IfNode<'a> {
        self.arena.alloc(IfNode {
            data: self.data(),
            test,
            if_suite,
            else_clause,
        })
    }

    pub fn while_stmt(
        &self,
        test: Expression<'a>,
        while_suite: &'a SuiteNode<'a>,
        else_suite: Option<&'a SuiteNode<'a>>,
    ) -> Statement<'a> {
        Statement::While(self.arena.alloc(WhileNode {
            data: self.data(),
            test,
            while_suite,
            else_suite,
        }))
    }

    pub fn for_stmt(
        &self,
        target: Expression<'a>,
        iterable: Expression<'a>,
        for_suite: &'a SuiteNode<'a>,
        else_suite: Option<&'a SuiteNode<'a>>,
    ) -> Statement<'a> {
        Statement::For(self.arena.alloc(ForNode {
            data: self.data(),
            target,
            iterable,
            for_suite,
            else_suite,
            is_async: false,
        }))
    }

    pub fn with_item(&self, expr: Expression<'a>, target: Option<Expression<'a>>) -> WithItemNode<'a> {
        WithItemNode {
            data: self.data(),
            expr,
            target,
        }
    }

    pub fn with_stmt(&self, items: Vec<WithItemNode<'a>>, with_suite: &'a SuiteNode<'a>) -> Statement<'a> {
        Statement::With(self.arena.alloc(WithNode {
            data: self.data(),
            with_items: self.slice(items),
            with_suite,
            is_async: false,
        }))
    }

    pub fn except(
        &self,
        type_expr: Option<Expression<'a>>,
        name: Option<&str>,
        except_suite: &'a SuiteNode<'a>,
    ) -> ExceptNode<'a> {
        ExceptNode {
            data: self.data(),
            type_expr,
            name: name.map(|n| self.name_node(n)),
            except_suite,
        }
    }

    pub fn try_stmt(
        &self,
        try_suite: &'a SuiteNode<'a>,
        except_clauses: Vec<ExceptNode<'a>>,
        else_suite: Option<&'a SuiteNode<'a>>,
        finally_suite: Option<&'a SuiteNode<'a>>,
    ) -> Statement<'a> {
        Statement::Try(self.arena.alloc(TryNode {
            data: self.data(),
            try_suite,
            except_clauses: self.slice(except_clauses),
            else_suite,
            finally_suite,
        }))
    }

    // ========================================================================
    // Functions and classes
    // ========================================================================

    pub fn param(&self, name: &str) -> ParameterNode<'a> {
        ParameterNode {
            data: self.data(),
            category: ParameterCategory::Simple,
            name: Some(self.name_node(name)),
            annotation: None,
            default_value: None,
        }
    }

    pub fn param_full(
        &self,
        category: ParameterCategory,
        name: Option<&str>,
        annotation: Option<Expression<'a>>,
        default_value: Option<Expression<'a>>,
    ) -> ParameterNode<'a> {
        ParameterNode {
            data: self.data(),
            category,
            name: name.map(|n| self.name_node(n)),
            annotation,
            default_value,
        }
    }

    pub fn decorator(&self, expression: Expression<'a>) -> DecoratorNode<'a> {
        DecoratorNode {
            data: self.data(),
            expression,
        }
    }

    pub fn function(
        &self,
        name: &str,
        parameters: Vec<ParameterNode<'a>>,
        suite: &'a SuiteNode<'a>,
    ) -> Statement<'a> {
        self.function_full(name, vec![], parameters, None, suite, false)
    }

    pub fn async_function(
        &self,
        name: &str,
        parameters: Vec<ParameterNode<'a>>,
        suite: &'a SuiteNode<'a>,
    ) -> Statement<'a> {
        self.function_full(name, vec![], parameters, None, suite, true)
    }

    pub fn function_full(
        &self,
        name: &str,
        decorators: Vec<DecoratorNode<'a>>,
        parameters: Vec<ParameterNode<'a>>,
        return_annotation: Option<Expression<'a>>,
        suite: &'a SuiteNode<'a>,
        is_async: bool,
    ) -> Statement<'a> {
        Statement::Function(self.arena.alloc(FunctionNode {
            data: self.data(),
            name: self.name_node(name),
            decorators: self.slice(decorators),
            parameters: self.slice(parameters),
            return_annotation,
            suite,
            is_async,
        }))
    }

    pub fn class_def(&self, name: &str, suite: &'a SuiteNode<'a>) -> Statement<'a> {
        self.class_full(name, vec![], vec![], suite)
    }

    pub fn class_full(
        &self,
        name: &str,
        decorators: Vec<DecoratorNode<'a>>,
        arguments: Vec<ArgumentNode<'a>>,
        suite: &'a SuiteNode<'a>,
    ) -> Statement<'a> {
        Statement::Class(self.arena.alloc(ClassNode {
            data: self.data(),
            name: self.name_node(name),
            decorators: self.slice(decorators),
            arguments: self.slice(arguments),
            suite,
        }))
    }

    // ========================================================================
    // Imports
    // ========================================================================

    pub fn module_name(&self, parts: &[&str], import_info: Option<ImportInfo>) -> &'a ModuleNameNode<'a> {
        let names: Vec<&'a NameNode> = parts.iter().copied().map(|p| self.name_node(p)).collect();
        self.arena.alloc(ModuleNameNode {
            data: self.data(),
            leading_dots: 0,
            name_parts: self.slice(names),
            import_info,
        })
    }

    pub fn import_as(
        &self,
        module: &'a ModuleNameNode<'a>,
        alias: Option<&str>,
    ) -> ImportAsNode<'a> {
        ImportAsNode {
            data: self.data(),
            module,
            alias: alias.map(|a| self.name_node(a)),
        }
    }

    pub fn import_stmt(&self, imports: Vec<ImportAsNode<'a>>) -> Statement<'a> {
        Statement::Import(self.arena.alloc(ImportNode {
            data: self.data(),
            imports: self.slice(imports),
        }))
    }

    pub fn import_from_as(&self, name: &str, alias: Option<&str>) -> ImportFromAsNode<'a> {
        ImportFromAsNode {
            data: self.data(),
            name: self.name_node(name),
            alias: alias.map(|a| self.name_node(a)),
        }
    }

    pub fn import_from(
        &self,
        module: &'a ModuleNameNode<'a>,
        imports: Vec<ImportFromAsNode<'a>>,
    ) -> Statement<'a> {
        Statement::ImportFrom(self.arena.alloc(ImportFromNode {
            data: self.data(),
            module,
            imports: self.slice(imports),
            is_wildcard: false,
        }))
    }

    pub fn wildcard_import(&self, module: &'a ModuleNameNode<'a>) -> Statement<'a> {
        Statement::ImportFrom(self.arena.alloc(ImportFromNode {
            data: self.data(),
            module,
            imports: &[],
            is_wildcard: true,
        }))
    }

    /// Import info for a module the resolver found at the given paths.
    pub fn resolved_import(
        &self,
        import_name: &str,
        resolved_paths: &[&str],
        implicit_imports: Vec<ImplicitImport>,
    ) -> ImportInfo {
        ImportInfo {
            import_name: import_name.to_string(),
            is_import_found: true,
            import_type: ImportType::Local,
            is_stub_file: true,
            resolved_paths: resolved_paths.iter().map(|p| p.to_string()).collect(),
            implicit_imports,
        }
    }

    /// Import info for a module the resolver failed to locate.
    pub fn unresolved_import(&self, import_name: &str) -> ImportInfo {
        ImportInfo {
            import_name: import_name.to_string(),
            is_import_found: false,
            import_type: ImportType::Local,
            is_stub_file: false,
            resolved_paths: vec![],
            implicit_imports: vec![],
        }
    }
}
