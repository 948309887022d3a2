//! pyrite_evaluator: Static expression evaluation.
//!
//! Evaluates expressions whose truth is knowable without executing the
//! program: boolean and integer literals, `not`/`and`/`or` over such
//! expressions, version and platform checks against the execution
//! environment, and the `TYPE_CHECKING` flag. The binder uses these
//! verdicts to prune statically dead branches.
//!
//! The recognized `sys` / `os` / `typing` attribute spellings are matched
//! against the name table's pre-seeded handles, so no string comparison
//! happens during evaluation.

use pyrite_ast::node::{Expression, KeywordConstant, NumberValue};
use pyrite_ast::types::Operator;
use pyrite_core::env::ExecutionEnvironment;
use pyrite_core::names::{Name, NameTable};
use std::cmp::Ordering;

/// Evaluate an expression to a statically-known boolean, if possible.
/// Returns `None` when the truth of the expression cannot be determined
/// without running the program.
pub fn evaluate_static_bool_expression(
    expr: &Expression<'_>,
    exec_env: &ExecutionEnvironment,
    names: &NameTable,
) -> Option<bool> {
    let known = names.known();
    match expr {
        Expression::Constant(n) => match n.value {
            KeywordConstant::True => Some(true),
            KeywordConstant::False => Some(false),
            KeywordConstant::None => Some(false),
            KeywordConstant::Ellipsis => None,
        },
        Expression::Number(n) => match n.value {
            NumberValue::Int(v) => Some(v != 0),
            NumberValue::Float(_) => None,
        },
        Expression::UnaryOp(n) if n.operator == Operator::Not => {
            evaluate_static_bool_expression(&n.expr, exec_env, names).map(|v| !v)
        }
        Expression::BinaryOp(n) => match n.operator {
            Operator::And => {
                let left = evaluate_static_bool_expression(&n.left, exec_env, names);
                let right = evaluate_static_bool_expression(&n.right, exec_env, names);
                match (left, right) {
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                }
            }
            Operator::Or => {
                let left = evaluate_static_bool_expression(&n.left, exec_env, names);
                let right = evaluate_static_bool_expression(&n.right, exec_env, names);
                match (left, right) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                }
            }
            op if op.is_comparison() => evaluate_comparison(n.left, op, n.right, exec_env, names),
            _ => None,
        },
        Expression::Name(n) => {
            if n.value == known.type_checking {
                Some(true)
            } else {
                None
            }
        }
        Expression::MemberAccess(_) => {
            if member_is(expr, known.typing, known.type_checking) {
                Some(true)
            } else {
                None
            }
        }
        Expression::Call(n) => {
            // sys.platform.startswith("...")
            if let Expression::MemberAccess(access) = &n.callee {
                if access.member.value == known.startswith
                    && member_is(&access.base, known.sys, known.platform)
                    && n.arguments.len() == 1
                {
                    if let Some(prefix) = string_value(&n.arguments[0].value) {
                        return Some(exec_env.python_platform.starts_with(&prefix));
                    }
                }
            }
            None
        }
        _ => None,
    }
}

fn evaluate_comparison(
    left: Expression<'_>,
    op: Operator,
    right: Expression<'_>,
    exec_env: &ExecutionEnvironment,
    names: &NameTable,
) -> Option<bool> {
    let known = names.known();

    // sys.version_info compared against an int tuple
    if member_is(&left, known.sys, known.version_info) {
        let parts = int_tuple_value(&right)?;
        let ordering = exec_env.python_version.compare_tuple(&parts);
        return Some(ordering_satisfies(ordering, op));
    }

    // sys.version_info[0] compared against an int
    if let Expression::Index(index) = &left {
        if member_is(&index.base, known.sys, known.version_info)
            && index.items.len() == 1
            && matches!(int_value(&index.items[0]), Some(0))
        {
            let major = int_value(&right)?;
            let ordering = i64::from(exec_env.python_version.major).cmp(&major);
            return Some(ordering_satisfies(ordering, op));
        }
    }

    // sys.platform / os.name compared against a string literal
    if member_is(&left, known.sys, known.platform) {
        let value = string_value(&right)?;
        return match op {
            Operator::Equals => Some(exec_env.python_platform == value),
            Operator::NotEquals => Some(exec_env.python_platform != value),
            _ => None,
        };
    }
    if member_is(&left, known.os, known.os_name) {
        let value = string_value(&right)?;
        let os_name = os_name_for_platform(&exec_env.python_platform);
        return match op {
            Operator::Equals => Some(os_name == value),
            Operator::NotEquals => Some(os_name != value),
            _ => None,
        };
    }

    None
}

fn ordering_satisfies(ordering: Ordering, op: Operator) -> bool {
    match op {
        Operator::LessThan => ordering == Ordering::Less,
        Operator::LessThanOrEqual => ordering != Ordering::Greater,
        Operator::GreaterThan => ordering == Ordering::Greater,
        Operator::GreaterThanOrEqual => ordering != Ordering::Less,
        Operator::Equals => ordering == Ordering::Equal,
        Operator::NotEquals => ordering != Ordering::Equal,
        _ => false,
    }
}

/// Whether `expr` is a member access of exactly `base.attr` with a
/// simple-name base.
fn member_is(expr: &Expression<'_>, base: Name, attr: Name) -> bool {
    if let Expression::MemberAccess(access) = expr {
        if let Expression::Name(base_name) = &access.base {
            return base_name.value == base && access.member.value == attr;
        }
    }
    false
}

fn int_value(expr: &Expression<'_>) -> Option<i64> {
    match expr {
        Expression::Number(n) => match n.value {
            NumberValue::Int(v) => Some(v),
            NumberValue::Float(_) => None,
        },
        _ => None,
    }
}

fn int_tuple_value(expr: &Expression<'_>) -> Option<Vec<i64>> {
    match expr {
        Expression::Tuple(t) => t.items.iter().map(int_value).collect(),
        _ => None,
    }
}

fn string_value(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::StringList(s) if s.is_plain() => Some(s.joined_value()),
        _ => None,
    }
}

fn os_name_for_platform(platform: &str) -> &'static str {
    match platform {
        "win32" => "nt",
        _ => "posix",
    }
}
