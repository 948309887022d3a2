//! The binder implementation.
//!
//! Walks the syntax tree and builds the scope tree, symbol tables, and
//! declaration lists. Handles:
//! - Symbol creation for assignment targets, definitions, parameters,
//!   imports, and except binders
//! - Lexical scoping (module, class, function, lambda, comprehension)
//! - `global` / `nonlocal` redirection and their conflict diagnostics
//! - Import loader-action construction
//! - Static dead-branch pruning through the expression evaluator
//! - The deferred (two-pass) walk of function and lambda bodies
//!
//! Class bodies are walked immediately and in line; function and lambda
//! bodies are queued and drained only after the enclosing scope has been
//! fully bound, which is what makes forward references inside nested
//! functions resolve.

use crate::builtins::{self, BUILT_IN_NAMES};
use crate::context::FileInfo;
use crate::declaration::{is_constant_name, Declaration, DeclaredType};
use crate::output::{BindOutput, NodeAnnotations};
use crate::scope::{ScopeKind, ScopeTree};
use crate::symbol::{SymbolArena, SymbolFlags};
use crate::types::{ClassType, ClassTypeFlags, FunctionParameter, FunctionType, FunctionTypeFlags, TypeRegistry};
use indexmap::IndexSet;
use pyrite_ast::node::*;
use pyrite_ast::types::{ClassTypeId, NodeId, ScopeId, StringErrorFlags, SymbolId, TypeSourceId};
use pyrite_core::names::{Name, NameTable};
use pyrite_core::text::TextRange;
use pyrite_diagnostics::{format_message, messages, rules, DiagnosticSink};
use pyrite_evaluator::evaluate_static_bool_expression;
use rustc_hash::FxHashMap;
use std::fmt;

/// A structural invariant violation inside the binder. Unlike language
/// diagnostics, these abort analysis of the file.
#[derive(Debug, Clone)]
pub struct BinderFault {
    pub message: String,
    pub node: NodeId,
}

impl BinderFault {
    pub fn new(message: impl Into<String>, node: NodeId) -> Self {
        Self {
            message: message.into(),
            node,
        }
    }
}

impl fmt::Display for BinderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal binder fault at node {:?}: {}", self.node, self.message)
    }
}

impl std::error::Error for BinderFault {}

pub type BindResult<T = ()> = Result<T, BinderFault>;

/// How a `global` or `nonlocal` statement redirected a name.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum NameBindingType {
    Global,
    Nonlocal,
}

/// Walk state for one scope. Swapped in and out as the walker enters and
/// leaves scopes; the per-scope fields never leak across scopes.
pub(crate) struct ScopeFrame<'a> {
    pub(crate) scope: ScopeId,
    pub(crate) kind: ScopeKind,
    /// Names redirected by `global`/`nonlocal` in this scope.
    pub(crate) not_local_bindings: FxHashMap<Name, NameBindingType>,
    pub(crate) nested_except_depth: u32,
    /// Whether an enclosing function exists (yield legality).
    pub(crate) in_function: bool,
    /// Whether the nearest enclosing function is async (await legality).
    pub(crate) is_async: bool,
    /// The class a method's member-access declarations attach to.
    pub(crate) class_type: Option<ClassTypeId>,
    /// The function node whose body this frame walks; None for module,
    /// class, lambda, and comprehension frames.
    pub(crate) function: Option<&'a FunctionNode<'a>>,
}

impl<'a> ScopeFrame<'a> {
    fn new(scope: ScopeId, kind: ScopeKind) -> Self {
        Self {
            scope,
            kind,
            not_local_bindings: FxHashMap::default(),
            nested_except_depth: 0,
            in_function: false,
            is_async: false,
            class_type: None,
            function: None,
        }
    }
}

/// A sub-scope binder queued for the deferred pass.
pub(crate) enum DeferredBinding<'a> {
    Function {
        node: &'a FunctionNode<'a>,
        scope: ScopeId,
        method_class: Option<ClassTypeId>,
        unexecuted: bool,
    },
    Lambda {
        node: &'a LambdaNode<'a>,
        scope: ScopeId,
        unexecuted: bool,
    },
}

/// The binder for one source file.
pub struct Binder<'a> {
    pub(crate) file: &'a FileInfo<'a>,
    pub(crate) interner: &'a NameTable,
    pub(crate) scopes: ScopeTree,
    pub(crate) symbols: SymbolArena,
    pub(crate) types: TypeRegistry,
    pub(crate) annotations: NodeAnnotations,
    pub(crate) diagnostics: DiagnosticSink,
    pub(crate) frame: ScopeFrame<'a>,
    pub(crate) deferred: Vec<DeferredBinding<'a>>,
    /// Set while walking a statically-false branch: declaration side
    /// effects are suppressed, diagnostics are not.
    pub(crate) unexecuted: bool,
    module_doc_string: Option<String>,
    /// Synthetic special-form class types, one per typing-stub name.
    special_types: FxHashMap<Name, ClassTypeId>,
}

impl<'a> Binder<'a> {
    /// Bind one module tree. `builtins` supplies a pre-built built-in
    /// scope to chain beneath the module scope; its symbols are copied
    /// into this file's scope tree.
    pub fn bind_module(
        module: &'a ModuleNode<'a>,
        file: &'a FileInfo<'a>,
        interner: &'a NameTable,
        builtins: Option<&BindOutput>,
    ) -> BindResult<BindOutput> {
        let mut scopes = ScopeTree::new();
        let mut symbols = SymbolArena::new();

        let mut builtin_parent = None;
        if let Some(output) = builtins {
            if let Some(source_scope) = output.builtin_scope() {
                let copy = scopes.add_scope(ScopeKind::Builtin, None, NodeId::INVALID);
                for (name, sym_id) in output.scopes.scope(source_scope).symbols() {
                    let cloned = output.symbols.get(sym_id).clone();
                    let new_id = symbols.alloc(cloned.name, cloned.flags);
                    *symbols.get_mut(new_id) = cloned;
                    scopes.scope_mut(copy).insert_symbol(name, new_id);
                }
                scopes.scope_mut(copy).export_filter =
                    output.scopes.scope(source_scope).export_filter.clone();
                builtin_parent = Some(copy);
            }
        }

        let module_kind = if file.is_builtin_stub_file {
            ScopeKind::Builtin
        } else {
            ScopeKind::Module
        };
        let module_scope = scopes.add_scope(module_kind, builtin_parent, module.data.id);

        let mut binder = Binder {
            file,
            interner,
            scopes,
            symbols,
            types: TypeRegistry::new(),
            annotations: NodeAnnotations::default(),
            diagnostics: DiagnosticSink::new(),
            frame: ScopeFrame::new(module_scope, module_kind),
            deferred: Vec::new(),
            unexecuted: false,
            module_doc_string: None,
            special_types: FxHashMap::default(),
        };

        binder.annotations.set_scope(module.data.id, module_scope);
        binder.seed_module_names(module_scope);

        binder.module_doc_string = doc_string_of(module.statements);
        for statement in module.statements {
            binder.visit_statement(statement)?;
        }

        let queue = std::mem::take(&mut binder.deferred);
        binder.drain_deferred(queue)?;

        if file.is_builtin_stub_file {
            let filter: IndexSet<Name> = BUILT_IN_NAMES
                .iter()
                .map(|name| interner.intern_static(name))
                .collect();
            binder.scopes.scope_mut(module_scope).export_filter = Some(filter);
        }

        Ok(BindOutput {
            scopes: binder.scopes,
            symbols: binder.symbols,
            types: binder.types,
            annotations: binder.annotations,
            module_scope,
            module_doc_string: binder.module_doc_string,
            diagnostics: binder.diagnostics,
        })
    }

    // ========================================================================
    // Name binding primitives
    // ========================================================================

    /// The `bind` primitive: returns no symbol for names redirected by
    /// `global`/`nonlocal`, otherwise finds or creates the symbol in the
    /// current scope.
    pub(crate) fn bind_name_to_scope(&mut self, name: Name) -> Option<SymbolId> {
        if self.frame.not_local_bindings.contains_key(&name) {
            return None;
        }
        if let Some(existing) = self.scopes.scope(self.frame.scope).symbol(name) {
            return Some(existing);
        }
        let id = self
            .symbols
            .alloc(name, SymbolFlags::INITIALLY_UNBOUND | SymbolFlags::CLASS_MEMBER);
        self.scopes.scope_mut(self.frame.scope).insert_symbol(name, id);
        Some(id)
    }

    fn add_variable_declaration(
        &mut self,
        symbol: SymbolId,
        name: Name,
        node: &NodeData,
        type_annotation_node: Option<NodeId>,
        inferred_type_source: Option<TypeSourceId>,
    ) {
        let is_constant = is_constant_name(self.interner.text(name));
        let declaration = Declaration::Variable {
            node: node.id,
            path: self.file.file_path.clone(),
            range: node.range,
            is_constant,
            type_annotation_node,
            inferred_type_source,
        };
        let symbol = self.symbols.get_mut(symbol);
        symbol.add_declaration(declaration);
        if let Some(source) = inferred_type_source {
            symbol.add_inferred_type_source(source);
        }
    }

    /// The `bindTarget` primitive: recursively walks assignment-target
    /// expressions. Names bind in the current scope (with a `Variable`
    /// declaration when `source` is given); tuples, lists, and unpack
    /// nodes recurse; anything else is walked as an ordinary expression.
    pub(crate) fn bind_target(
        &mut self,
        expr: Expression<'a>,
        source: Option<TypeSourceId>,
    ) -> BindResult {
        match expr {
            Expression::Name(name) => {
                if !self.unexecuted {
                    if let Some(symbol) = self.bind_name_to_scope(name.value) {
                        if source.is_some() {
                            self.add_variable_declaration(symbol, name.value, &name.data, None, source);
                        }
                    }
                }
                Ok(())
            }
            Expression::Tuple(tuple) => {
                for item in tuple.items {
                    self.bind_target(*item, source)?;
                }
                Ok(())
            }
            Expression::List(list) => {
                for item in list.items {
                    self.bind_target(*item, source)?;
                }
                Ok(())
            }
            Expression::Unpack(unpack) => self.bind_target(unpack.expr, source),
            other => self.visit_expression(other),
        }
    }

    // ========================================================================
    // Frames and the deferred pass
    // ========================================================================

    fn with_frame<R>(
        &mut self,
        frame: ScopeFrame<'a>,
        f: impl FnOnce(&mut Self) -> BindResult<R>,
    ) -> BindResult<(R, Vec<DeferredBinding<'a>>)> {
        let saved_frame = std::mem::replace(&mut self.frame, frame);
        let saved_deferred = std::mem::take(&mut self.deferred);
        let result = f(self);
        let queue = std::mem::replace(&mut self.deferred, saved_deferred);
        self.frame = saved_frame;
        result.map(|value| (value, queue))
    }

    fn with_unexecuted(
        &mut self,
        flag: bool,
        f: impl FnOnce(&mut Self) -> BindResult,
    ) -> BindResult {
        let saved = self.unexecuted;
        self.unexecuted = saved || flag;
        let result = f(self);
        self.unexecuted = saved;
        result
    }

    /// Drain queued sub-scope binders in FIFO order. Each entry walks its
    /// body and then drains its own queue, giving the recursive two-pass
    /// discipline.
    fn drain_deferred(&mut self, queue: Vec<DeferredBinding<'a>>) -> BindResult {
        for entry in queue {
            self.bind_deferred_entry(entry)?;
        }
        Ok(())
    }

    fn bind_deferred_entry(&mut self, entry: DeferredBinding<'a>) -> BindResult {
        match entry {
            DeferredBinding::Function {
                node,
                scope,
                method_class,
                unexecuted,
            } => {
                let saved = self.unexecuted;
                self.unexecuted = unexecuted;
                let mut frame = ScopeFrame::new(scope, ScopeKind::Function);
                frame.in_function = true;
                frame.is_async = node.is_async;
                frame.class_type = method_class;
                frame.function = Some(node);
                let result = self.with_frame(frame, |binder| {
                    binder.bind_function_parameters(node.parameters)?;
                    if !binder.unexecuted {
                        binder.seed_function_names(scope, method_class);
                    }
                    binder.visit_suite(node.suite)
                });
                self.unexecuted = saved;
                let ((), queue) = result?;
                self.drain_deferred(queue)
            }
            DeferredBinding::Lambda {
                node,
                scope,
                unexecuted,
            } => {
                let saved = self.unexecuted;
                self.unexecuted = unexecuted;
                let mut frame = ScopeFrame::new(scope, ScopeKind::Function);
                frame.in_function = true;
                let result = self.with_frame(frame, |binder| {
                    binder.bind_function_parameters(node.parameters)?;
                    binder.visit_expression(node.expression)
                });
                self.unexecuted = saved;
                let ((), queue) = result?;
                self.drain_deferred(queue)
            }
        }
    }

    fn bind_function_parameters(&mut self, parameters: &'a [ParameterNode<'a>]) -> BindResult {
        for parameter in parameters {
            let Some(name) = parameter.name else { continue };
            if self.unexecuted {
                continue;
            }
            if let Some(symbol) = self.bind_name_to_scope(name.value) {
                self.symbols.get_mut(symbol).add_declaration(Declaration::Parameter {
                    node: parameter.data.id,
                    path: self.file.file_path.clone(),
                    range: parameter.data.range,
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Implicit name seeding
    // ========================================================================

    fn seed_name(&mut self, scope: ScopeId, name: &'static str, declared_type: DeclaredType) {
        let interned = self.interner.intern_static(name);
        let id = self
            .symbols
            .alloc(interned, SymbolFlags::IGNORED_FOR_PROTOCOL_MATCH);
        self.symbols.get_mut(id).add_declaration(Declaration::BuiltIn {
            node: None,
            declared_type,
            path: self.file.file_path.clone(),
            range: TextRange::empty(0),
        });
        self.scopes.scope_mut(scope).insert_symbol(interned, id);
    }

    fn seed_module_names(&mut self, scope: ScopeId) {
        self.seed_name(scope, "__doc__", DeclaredType::Str);
        self.seed_name(scope, "__name__", DeclaredType::Str);
        self.seed_name(scope, "__loader__", DeclaredType::Any);
        self.seed_name(scope, "__package__", DeclaredType::Str);
        self.seed_name(scope, "__spec__", DeclaredType::Any);
        self.seed_name(scope, "__path__", DeclaredType::Any);
        self.seed_name(scope, "__file__", DeclaredType::Str);
        self.seed_name(scope, "__cached__", DeclaredType::Str);
    }

    fn seed_class_names(&mut self, scope: ScopeId) {
        self.seed_name(scope, "__name__", DeclaredType::Str);
        if self.file.execution_environment.python_version
            >= pyrite_core::env::PythonVersion::V3_3
        {
            self.seed_name(scope, "__qualname__", DeclaredType::Str);
        }
    }

    fn seed_function_names(&mut self, scope: ScopeId, method_class: Option<ClassTypeId>) {
        self.seed_name(scope, "__doc__", DeclaredType::Str);
        self.seed_name(scope, "__name__", DeclaredType::Str);
        if self.file.execution_environment.python_version
            >= pyrite_core::env::PythonVersion::V3_3
        {
            self.seed_name(scope, "__qualname__", DeclaredType::Str);
        }
        self.seed_name(scope, "__module__", DeclaredType::Str);
        for name in [
            "__defaults__",
            "__code__",
            "__globals__",
            "__dict__",
            "__closure__",
            "__annotations__",
            "__kwdefaults__",
        ] {
            self.seed_name(scope, name, DeclaredType::Any);
        }
        if let Some(class_id) = method_class {
            self.seed_name(scope, "__class__", DeclaredType::Class(class_id));
        }
    }

    // ========================================================================
    // Statement visitors
    // ========================================================================

    pub(crate) fn visit_suite(&mut self, suite: &'a SuiteNode<'a>) -> BindResult {
        for statement in suite.statements {
            self.visit_statement(statement)?;
        }
        Ok(())
    }

    fn visit_statement(&mut self, statement: &Statement<'a>) -> BindResult {
        match *statement {
            Statement::Assignment(n) => self.visit_assignment(n),
            Statement::AugmentedAssignment(n) => self.visit_augmented_assignment(n),
            Statement::TypedAssignment(n) => self.visit_typed_assignment(n),
            Statement::If(n) => self.visit_if(n),
            Statement::While(n) => self.visit_while(n),
            Statement::For(n) => self.visit_for(n),
            Statement::Try(n) => self.visit_try(n),
            Statement::With(n) => self.visit_with(n),
            Statement::Function(n) => self.visit_function(n),
            Statement::Class(n) => self.visit_class(n),
            Statement::Return(n) => {
                if let Some(value) = n.value {
                    self.visit_expression(value)?;
                }
                Ok(())
            }
            Statement::Raise(n) => self.visit_raise(n),
            Statement::Assert(n) => {
                self.visit_expression(n.test)?;
                if let Some(message) = n.message {
                    self.visit_expression(message)?;
                }
                Ok(())
            }
            Statement::Del(n) => {
                for target in n.targets {
                    self.bind_target(*target, None)?;
                }
                Ok(())
            }
            Statement::Global(n) => self.visit_global(n),
            Statement::Nonlocal(n) => self.visit_nonlocal(n),
            Statement::Import(n) => self.visit_import(n),
            Statement::ImportFrom(n) => self.visit_import_from(n),
            Statement::Expr(n) => self.visit_expression(n.expression),
            Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => Ok(()),
        }
    }

    fn visit_assignment(&mut self, node: &'a AssignmentNode<'a>) -> BindResult {
        if self.file.is_typing_stub_file {
            if let Expression::Name(name) = node.target {
                let is_special = builtins::is_typing_special(self.interner.text(name.value));
                if is_special {
                    if !self.unexecuted {
                        self.handle_typing_stub_assignment(name);
                    }
                    return self.visit_expression(node.value);
                }
            }
        }

        let source = TypeSourceId::from_node(node.value.data().id);
        match node.target {
            Expression::MemberAccess(member) => {
                self.bind_member_assignment(member, None, Some(source))?;
            }
            target => self.bind_target(target, Some(source))?,
        }
        self.visit_expression(node.value)
    }

    fn visit_augmented_assignment(&mut self, node: &'a AugmentedAssignmentNode<'a>) -> BindResult {
        // The inferred type of an augmented target comes from the
        // target itself, not the right-hand side.
        let source = TypeSourceId::from_node(node.target.data().id);
        self.bind_target(node.target, Some(source))?;
        self.visit_expression(node.value)
    }

    fn visit_typed_assignment(&mut self, node: &'a TypedAssignmentNode<'a>) -> BindResult {
        let annotation_id = node.annotation.data().id;
        let source = node.value.map(|value| TypeSourceId::from_node(value.data().id));
        match node.target {
            Expression::Name(name) => {
                if !self.unexecuted {
                    if let Some(symbol) = self.bind_name_to_scope(name.value) {
                        self.add_variable_declaration(
                            symbol,
                            name.value,
                            &name.data,
                            Some(annotation_id),
                            source,
                        );
                    }
                }
            }
            Expression::MemberAccess(member) if matches!(member.base, Expression::Name(_)) => {
                self.bind_member_assignment(member, Some(annotation_id), source)?;
            }
            other => {
                self.diagnostics
                    .add_error(messages::TYPE_ANNOTATION_NOT_SUPPORTED, other.data().range);
            }
        }
        self.visit_expression(node.annotation)?;
        if let Some(value) = node.value {
            self.visit_expression(value)?;
        }
        Ok(())
    }

    /// In the typing stub, a small set of special names assigned at the
    /// top level receive a synthetic built-in declaration instead of a
    /// variable declaration.
    fn handle_typing_stub_assignment(&mut self, name: &'a NameNode) {
        let Some(symbol) = self.bind_name_to_scope(name.value) else {
            return;
        };
        let declared_type = if name.value == self.interner.known().any {
            DeclaredType::Any
        } else {
            DeclaredType::Class(self.special_form_class(name.value))
        };
        let declaration = Declaration::BuiltIn {
            node: Some(name.data.id),
            declared_type,
            path: self.file.file_path.clone(),
            range: name.data.range,
        };
        self.symbols.get_mut(symbol).add_declaration(declaration);
    }

    fn special_form_class(&mut self, name: Name) -> ClassTypeId {
        if let Some(existing) = self.special_types.get(&name) {
            return *existing;
        }
        let class = ClassType::new(
            name,
            ClassTypeFlags::BUILT_IN | ClassTypeFlags::SPECIAL_BUILT_IN,
            None,
        );
        let id = self.types.add_class(class);
        self.special_types.insert(name, id);
        id
    }

    /// Member-access assignment targets (`base.member = ...`) inside a
    /// method declare class or instance members on the enclosing class.
    fn bind_member_assignment(
        &mut self,
        node: &'a MemberAccessNode<'a>,
        type_annotation_node: Option<NodeId>,
        source: Option<TypeSourceId>,
    ) -> BindResult {
        let Expression::Name(base) = node.base else {
            // Not a simple-name base; nothing declares, but the base
            // expression is still walked.
            return self.visit_expression(node.base);
        };
        let (Some(function), Some(class_id)) = (self.frame.function, self.frame.class_type) else {
            return Ok(());
        };

        let class_name = self.types.class(class_id).name;
        let is_class_member = if base.value == class_name {
            true
        } else {
            let first_param = function
                .parameters
                .first()
                .and_then(|p| p.name)
                .map(|n| n.value);
            if first_param != Some(base.value) {
                return Ok(());
            }
            let known = *self.interner.known();
            if self.function_has_decorator(function, known.staticmethod) {
                return Ok(());
            }
            self.function_has_decorator(function, known.classmethod)
                || function.name.value == known.dunder_new
        };

        if self.unexecuted {
            return Ok(());
        }

        let fields = self
            .types
            .class(class_id)
            .fields
            .expect("class scope exists before method bodies bind");
        let member = node.member.value;
        let symbol = match self.scopes.scope(fields).symbol(member) {
            Some(existing) => existing,
            None => {
                let id = self
                    .symbols
                    .alloc(member, SymbolFlags::INITIALLY_UNBOUND | SymbolFlags::CLASS_MEMBER);
                self.scopes.scope_mut(fields).insert_symbol(member, id);
                id
            }
        };
        if is_class_member {
            self.symbols.get_mut(symbol).flags.insert(SymbolFlags::CLASS_MEMBER);
        } else {
            self.symbols.get_mut(symbol).flags.insert(SymbolFlags::INSTANCE_MEMBER);
        }
        self.add_variable_declaration(symbol, member, &node.data, type_annotation_node, source);
        Ok(())
    }

    fn function_has_decorator(&self, function: &FunctionNode<'a>, name: Name) -> bool {
        function.decorators.iter().any(|decorator| {
            matches!(
                decorator.expression,
                Expression::Name(n) if n.value == name
            )
        })
    }

    fn visit_if(&mut self, node: &'a IfNode<'a>) -> BindResult {
        let verdict = evaluate_static_bool_expression(
            &node.test,
            &self.file.execution_environment,
            self.interner,
        );
        self.visit_expression(node.test)?;
        self.with_unexecuted(verdict == Some(false), |binder| {
            binder.visit_suite(node.if_suite)
        })?;
        match node.else_clause {
            Some(ElseClause::Elif(elif)) => {
                self.with_unexecuted(verdict == Some(true), |binder| binder.visit_if(elif))
            }
            Some(ElseClause::Suite(suite)) => {
                self.with_unexecuted(verdict == Some(true), |binder| binder.visit_suite(suite))
            }
            None => Ok(()),
        }
    }

    fn visit_while(&mut self, node: &'a WhileNode<'a>) -> BindResult {
        let verdict = evaluate_static_bool_expression(
            &node.test,
            &self.file.execution_environment,
            self.interner,
        );
        self.visit_expression(node.test)?;
        self.with_unexecuted(verdict == Some(false), |binder| {
            binder.visit_suite(node.while_suite)
        })?;
        if let Some(else_suite) = node.else_suite {
            self.with_unexecuted(verdict == Some(true), |binder| {
                binder.visit_suite(else_suite)
            })?;
        }
        Ok(())
    }

    fn visit_for(&mut self, node: &'a ForNode<'a>) -> BindResult {
        self.bind_target(node.target, Some(TypeSourceId::from_node(node.data.id)))?;
        self.visit_expression(node.iterable)?;
        self.visit_suite(node.for_suite)?;
        if let Some(else_suite) = node.else_suite {
            self.visit_suite(else_suite)?;
        }
        Ok(())
    }

    fn visit_with(&mut self, node: &'a WithNode<'a>) -> BindResult {
        for item in node.with_items {
            self.visit_expression(item.expr)?;
            if let Some(target) = item.target {
                self.bind_target(target, Some(TypeSourceId::from_node(item.data.id)))?;
            }
        }
        self.visit_suite(node.with_suite)
    }

    fn visit_try(&mut self, node: &'a TryNode<'a>) -> BindResult {
        self.visit_suite(node.try_suite)?;
        self.frame.nested_except_depth += 1;
        for clause in node.except_clauses {
            if let Some(type_expr) = clause.type_expr {
                self.visit_expression(type_expr)?;
            }
            if let Some(name) = clause.name {
                if !self.unexecuted {
                    if let Some(symbol) = self.bind_name_to_scope(name.value) {
                        self.add_variable_declaration(symbol, name.value, &name.data, None, None);
                    }
                }
            }
            self.visit_suite(clause.except_suite)?;
        }
        self.frame.nested_except_depth -= 1;
        if let Some(else_suite) = node.else_suite {
            self.visit_suite(else_suite)?;
        }
        if let Some(finally_suite) = node.finally_suite {
            self.visit_suite(finally_suite)?;
        }
        Ok(())
    }

    fn visit_raise(&mut self, node: &'a RaiseNode<'a>) -> BindResult {
        if !self.unexecuted {
            self.scopes.scope_mut(self.frame.scope).always_raises = true;
        }
        if node.exc.is_none() && self.frame.nested_except_depth == 0 {
            self.diagnostics
                .add_error(messages::RAISE_PARAMS_MISSING, node.data.range);
        }
        if let Some(exc) = node.exc {
            self.visit_expression(exc)?;
        }
        if let Some(cause) = node.cause {
            self.visit_expression(cause)?;
        }
        Ok(())
    }

    fn visit_global(&mut self, node: &'a GlobalNode<'a>) -> BindResult {
        let scope = self.frame.scope;
        let global_scope = self.scopes.global_scope(scope);
        for name_node in node.names {
            let name = name_node.value;
            if self.frame.not_local_bindings.get(&name) == Some(&NameBindingType::Nonlocal) {
                let message = format_message(
                    messages::ALREADY_DECLARED_NONLOCAL,
                    &[self.interner.text(name)],
                );
                self.diagnostics.add_error(message, name_node.data.range);
                continue;
            }
            if let Some(symbol) = self.scopes.scope(scope).symbol(name) {
                if !self.symbols.get(symbol).declarations().is_empty() {
                    let message = format_message(
                        messages::GLOBAL_REASSIGNMENT,
                        &[self.interner.text(name)],
                    );
                    self.diagnostics.add_error(message, name_node.data.range);
                }
            }
            if self.unexecuted {
                continue;
            }
            if self.scopes.scope(global_scope).symbol(name).is_none() {
                let id = self
                    .symbols
                    .alloc(name, SymbolFlags::INITIALLY_UNBOUND | SymbolFlags::CLASS_MEMBER);
                self.scopes.scope_mut(global_scope).insert_symbol(name, id);
            }
            if global_scope != scope {
                self.frame
                    .not_local_bindings
                    .insert(name, NameBindingType::Global);
                self.scopes.scope_mut(scope).remove_symbol(name);
            }
        }
        Ok(())
    }

    fn visit_nonlocal(&mut self, node: &'a NonlocalNode<'a>) -> BindResult {
        let scope = self.frame.scope;
        let global_scope = self.scopes.global_scope(scope);
        if scope == global_scope {
            self.diagnostics
                .add_error(messages::NONLOCAL_AT_MODULE_LEVEL, node.data.range);
            return Ok(());
        }
        for name_node in node.names {
            let name = name_node.value;
            if self.frame.not_local_bindings.get(&name) == Some(&NameBindingType::Global) {
                let message = format_message(
                    messages::ALREADY_DECLARED_GLOBAL,
                    &[self.interner.text(name)],
                );
                self.diagnostics.add_error(message, name_node.data.range);
                continue;
            }
            if let Some(symbol) = self.scopes.scope(scope).symbol(name) {
                if !self.symbols.get(symbol).declarations().is_empty() {
                    let message = format_message(
                        messages::NONLOCAL_REASSIGNMENT,
                        &[self.interner.text(name)],
                    );
                    self.diagnostics.add_error(message, name_node.data.range);
                }
            }
            if !self.enclosing_binding_exists(name) {
                let message =
                    format_message(messages::NONLOCAL_NO_BINDING, &[self.interner.text(name)]);
                self.diagnostics.add_error(message, name_node.data.range);
            }
            if self.unexecuted {
                continue;
            }
            self.frame
                .not_local_bindings
                .insert(name, NameBindingType::Nonlocal);
            self.scopes.scope_mut(scope).remove_symbol(name);
        }
        Ok(())
    }

    /// Search for a binding of `name` in the enclosing scopes, walking
    /// parent links, skipping class scopes, and stopping before the
    /// global scope.
    fn enclosing_binding_exists(&self, name: Name) -> bool {
        let mut current = self.scopes.scope(self.frame.scope).parent;
        while let Some(id) = current {
            let scope = self.scopes.scope(id);
            if matches!(scope.kind, ScopeKind::Module | ScopeKind::Builtin) {
                break;
            }
            if scope.kind != ScopeKind::Class && scope.has_symbol(name) {
                return true;
            }
            current = scope.parent;
        }
        false
    }

    // ========================================================================
    // Functions, lambdas, classes, comprehensions
    // ========================================================================

    fn visit_function(&mut self, node: &'a FunctionNode<'a>) -> BindResult {
        // Decorators, parameter annotations, and default values all
        // evaluate in the enclosing scope.
        for decorator in node.decorators {
            self.visit_expression(decorator.expression)?;
        }
        for parameter in node.parameters {
            if let Some(default_value) = parameter.default_value {
                self.visit_expression(default_value)?;
            }
            if let Some(annotation) = parameter.annotation {
                self.visit_expression(annotation)?;
            }
        }
        if let Some(return_annotation) = node.return_annotation {
            self.visit_expression(return_annotation)?;
        }

        let is_method = self.frame.kind == ScopeKind::Class;
        let mut flags = FunctionTypeFlags::NONE;
        if node.is_async {
            flags |= FunctionTypeFlags::ASYNC;
        }
        if is_method {
            flags |= FunctionTypeFlags::METHOD;
        }
        if node.name.value == self.interner.known().dunder_new {
            // Class-bound even without an explicit decorator.
            flags |= FunctionTypeFlags::CONSTRUCTOR;
        }
        let mut function_type = FunctionType::new(Some(node.name.value), flags);
        function_type.doc_string = doc_string_of(node.suite.statements);
        function_type.parameters = node
            .parameters
            .iter()
            .map(|p| FunctionParameter {
                category: p.category,
                name: p.name.map(|n| n.value),
                annotation_node: p.annotation.map(|a| a.data().id),
                has_default: p.default_value.is_some(),
            })
            .collect();
        let function_type_id = self.types.add_function(function_type);
        self.annotations.set_function_type(node.data.id, function_type_id);

        if !self.unexecuted {
            if let Some(symbol) = self.bind_name_to_scope(node.name.value) {
                let declaration = if is_method {
                    Declaration::Method {
                        node: node.data.id,
                        path: self.file.file_path.clone(),
                        range: node.name.data.range,
                    }
                } else {
                    Declaration::Function {
                        node: node.data.id,
                        path: self.file.file_path.clone(),
                        range: node.name.data.range,
                    }
                };
                self.symbols.get_mut(symbol).add_declaration(declaration);
            }
        }

        // The function's scope links to the nearest enclosing
        // function-or-module scope, not the lexical parent: methods do
        // not capture class scope.
        let parent = self.scopes.function_or_module_scope(self.frame.scope);
        let scope = self.scopes.add_scope(ScopeKind::Function, Some(parent), node.data.id);
        self.annotations.set_scope(node.data.id, scope);

        let method_class = if is_method { self.frame.class_type } else { None };
        self.deferred.push(DeferredBinding::Function {
            node,
            scope,
            method_class,
            unexecuted: self.unexecuted,
        });
        Ok(())
    }

    fn visit_lambda(&mut self, node: &'a LambdaNode<'a>) -> BindResult {
        for parameter in node.parameters {
            if let Some(default_value) = parameter.default_value {
                self.visit_expression(default_value)?;
            }
        }
        let mut function_type = FunctionType::new(None, FunctionTypeFlags::NONE);
        function_type.parameters = node
            .parameters
            .iter()
            .map(|p| FunctionParameter {
                category: p.category,
                name: p.name.map(|n| n.value),
                annotation_node: None,
                has_default: p.default_value.is_some(),
            })
            .collect();
        let function_type_id = self.types.add_function(function_type);
        self.annotations.set_function_type(node.data.id, function_type_id);

        let parent = self.scopes.function_or_module_scope(self.frame.scope);
        let scope = self.scopes.add_scope(ScopeKind::Function, Some(parent), node.data.id);
        self.annotations.set_scope(node.data.id, scope);
        self.deferred.push(DeferredBinding::Lambda {
            node,
            scope,
            unexecuted: self.unexecuted,
        });
        Ok(())
    }

    fn visit_class(&mut self, node: &'a ClassNode<'a>) -> BindResult {
        for decorator in node.decorators {
            self.visit_expression(decorator.expression)?;
        }

        let is_built_in = self.frame.kind == ScopeKind::Builtin
            || self.file.is_builtin_stub_file
            || self.file.is_typing_stub_file;
        let flags = if is_built_in {
            ClassTypeFlags::BUILT_IN
        } else {
            ClassTypeFlags::NONE
        };
        let doc_string = doc_string_of(node.suite.statements);
        let class_id = self
            .types
            .add_class(ClassType::new(node.name.value, flags, doc_string));
        self.annotations.set_class_type(node.data.id, class_id);

        if !self.unexecuted {
            if let Some(symbol) = self.bind_name_to_scope(node.name.value) {
                self.symbols.get_mut(symbol).add_declaration(Declaration::Class {
                    node: node.data.id,
                    path: self.file.file_path.clone(),
                    range: node.name.data.range,
                });
            }
        }

        // Arguments are walked in the enclosing scope. A `metaclass`
        // keyword is recorded (at most once); other keyword arguments
        // are consumed by the metaclass at runtime and ignored here;
        // positional arguments become base classes.
        let mut metaclass_seen = false;
        for argument in node.arguments {
            match argument.name {
                Some(keyword) if keyword.value == self.interner.known().metaclass => {
                    if metaclass_seen {
                        self.diagnostics
                            .add_error(messages::DUPLICATE_METACLASS, argument.data.range);
                    } else {
                        metaclass_seen = true;
                        self.types.class_mut(class_id).metaclass_node =
                            Some(argument.value.data().id);
                    }
                }
                Some(_) => {}
                None => {
                    self.types
                        .class_mut(class_id)
                        .base_class_nodes
                        .push(argument.value.data().id);
                }
            }
            self.visit_expression(argument.value)?;
        }
        if self.types.class(class_id).base_class_nodes.is_empty()
            && node.name.value != self.interner.known().object
        {
            self.types.class_mut(class_id).has_implicit_object_base = true;
        }

        let scope = self
            .scopes
            .add_scope(ScopeKind::Class, Some(self.frame.scope), node.data.id);
        self.types.class_mut(class_id).fields = Some(scope);
        self.annotations.set_scope(node.data.id, scope);
        if !self.unexecuted {
            self.seed_class_names(scope);
        }

        let mut frame = ScopeFrame::new(scope, ScopeKind::Class);
        frame.class_type = Some(class_id);
        let ((), queue) = self.with_frame(frame, |binder| binder.visit_suite(node.suite))?;
        // Methods queued inside the class body drain after the enclosing
        // scope completes, not after the class body.
        self.deferred.extend(queue);
        Ok(())
    }

    fn visit_comprehension(&mut self, node: &'a ComprehensionNode<'a>) -> BindResult {
        let scope = self
            .scopes
            .add_scope(ScopeKind::Comprehension, Some(self.frame.scope), node.data.id);
        self.annotations.set_scope(node.data.id, scope);

        let mut frame = ScopeFrame::new(scope, ScopeKind::Comprehension);
        frame.in_function = self.frame.in_function;
        frame.is_async = self.frame.is_async;
        let ((), queue) = self.with_frame(frame, |binder| {
            for clause in node.for_if_list {
                match clause {
                    ComprehensionIter::For(for_clause) => {
                        binder.bind_target(
                            for_clause.target,
                            Some(TypeSourceId::from_node(for_clause.data.id)),
                        )?;
                        binder.visit_expression(for_clause.iterable)?;
                    }
                    ComprehensionIter::If(if_clause) => {
                        binder.visit_expression(if_clause.test)?;
                    }
                }
            }
            binder.visit_expression(node.element)?;
            if let Some(value) = node.value {
                binder.visit_expression(value)?;
            }
            Ok(())
        })?;
        self.deferred.extend(queue);
        Ok(())
    }

    // ========================================================================
    // Expression visitors
    // ========================================================================

    pub(crate) fn visit_expression(&mut self, expression: Expression<'a>) -> BindResult {
        match expression {
            Expression::Name(_) | Expression::Number(_) | Expression::Constant(_) => Ok(()),
            Expression::MemberAccess(n) => self.visit_expression(n.base),
            Expression::Index(n) => {
                self.visit_expression(n.base)?;
                for item in n.items {
                    self.visit_expression(*item)?;
                }
                Ok(())
            }
            Expression::Slice(n) => {
                for part in [n.start, n.stop, n.step].into_iter().flatten() {
                    self.visit_expression(part)?;
                }
                Ok(())
            }
            Expression::Call(n) => {
                self.visit_expression(n.callee)?;
                for argument in n.arguments {
                    self.visit_expression(argument.value)?;
                }
                Ok(())
            }
            Expression::Tuple(n) => {
                for item in n.items {
                    self.visit_expression(*item)?;
                }
                Ok(())
            }
            Expression::List(n) => {
                for item in n.items {
                    self.visit_expression(*item)?;
                }
                Ok(())
            }
            Expression::Set(n) => {
                for item in n.items {
                    self.visit_expression(*item)?;
                }
                Ok(())
            }
            Expression::Dict(n) => {
                for entry in n.entries {
                    if let Some(key) = entry.key {
                        self.visit_expression(key)?;
                    }
                    self.visit_expression(entry.value)?;
                }
                Ok(())
            }
            Expression::Unpack(n) => self.visit_expression(n.expr),
            Expression::StringList(n) => self.visit_string_list(n),
            Expression::UnaryOp(n) => self.visit_expression(n.expr),
            Expression::BinaryOp(n) => {
                self.visit_expression(n.left)?;
                self.visit_expression(n.right)
            }
            Expression::Ternary(n) => {
                self.visit_expression(n.test)?;
                self.visit_expression(n.if_expr)?;
                self.visit_expression(n.else_expr)
            }
            Expression::Lambda(n) => self.visit_lambda(n),
            Expression::Await(n) => {
                if !self.frame.is_async {
                    self.diagnostics
                        .add_error(messages::AWAIT_NOT_IN_ASYNC_FUNCTION, n.data.range);
                }
                self.visit_expression(n.expr)
            }
            Expression::Yield(n) => {
                if !self.frame.in_function {
                    self.diagnostics
                        .add_error(messages::YIELD_NOT_ALLOWED_OUTSIDE_FUNCTION, n.data.range);
                }
                if let Some(expr) = n.expr {
                    self.visit_expression(expr)?;
                }
                Ok(())
            }
            Expression::YieldFrom(n) => {
                if !self.frame.in_function {
                    self.diagnostics
                        .add_error(messages::YIELD_NOT_ALLOWED_OUTSIDE_FUNCTION, n.data.range);
                } else if self.frame.is_async {
                    self.diagnostics
                        .add_error(messages::YIELD_FROM_WITHIN_ASYNC_FUNCTION, n.data.range);
                }
                self.visit_expression(n.expr)
            }
            Expression::AssignmentExpr(n) => {
                if !self.unexecuted {
                    if let Some(symbol) = self.bind_name_to_scope(n.name.value) {
                        self.add_variable_declaration(
                            symbol,
                            n.name.value,
                            &n.name.data,
                            None,
                            Some(TypeSourceId::from_node(n.value.data().id)),
                        );
                    }
                }
                self.visit_expression(n.value)
            }
            Expression::Comprehension(n) => self.visit_comprehension(n),
        }
    }

    fn visit_string_list(&mut self, node: &'a StringListNode<'a>) -> BindResult {
        for string in node.strings {
            let level = self.file.rule_set.report_invalid_string_escape_sequence;
            let rule = rules::REPORT_INVALID_STRING_ESCAPE_SEQUENCE;
            let checks = [
                (
                    StringErrorFlags::UNSUPPORTED_ESCAPE_SEQUENCE,
                    messages::UNSUPPORTED_ESCAPE_SEQUENCE,
                ),
                (
                    StringErrorFlags::ESCAPE_WITHIN_FORMAT_EXPRESSION,
                    messages::ESCAPE_WITHIN_FORMAT_EXPRESSION,
                ),
                (
                    StringErrorFlags::SINGLE_CLOSE_BRACE_WITHIN_FORMAT,
                    messages::SINGLE_CLOSE_BRACE_WITHIN_FORMAT_LITERAL,
                ),
                (
                    StringErrorFlags::UNTERMINATED_FORMAT_EXPRESSION,
                    messages::UNTERMINATED_FORMAT_EXPRESSION,
                ),
            ];
            for (flag, message) in checks {
                if string.error_flags.contains(flag) {
                    self.diagnostics
                        .add_with_level(level, rule, message, string.data.range);
                }
            }
            for expr in string.format_expressions {
                self.visit_expression(*expr)?;
            }
        }
        Ok(())
    }
}

/// The doc string of a statement list: the first statement, when it is a
/// plain (non-formatted) string expression.
fn doc_string_of(statements: &[Statement<'_>]) -> Option<String> {
    match statements.first() {
        Some(Statement::Expr(expr_stmt)) => match expr_stmt.expression {
            Expression::StringList(strings) if strings.is_plain() => {
                Some(strings.joined_value())
            }
            _ => None,
        },
        _ => None,
    }
}
