//! Tree-walking evaluator. Evaluates AST → Object.
//!
//! Failures are `Object::Error` values, not Rust errors: every step that
//! sequences sub-evaluations (operands, statements, arguments) checks for
//! an error and hands it back unchanged. `return` works the same way via
//! `Object::ReturnValue`, which is unwrapped at the call site or at the
//! top of the program.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::builtins::{self, wrong_arg_count};
use crate::runtime::environment::Environment;
use crate::runtime::object::{Function, Object};
use crate::syntax::ast::{BlockStatement, Expression, InfixOp, PrefixOp, Program, Statement};

type Env = Rc<RefCell<Environment>>;

// ─── Entry point ──────────────────────────────────────────────────────────────

/// Evaluate a whole program. A top-level `return` ends the program with
/// its value.
pub fn eval(program: &Program, env: &Env) -> Object {
    tracing::debug!(statements = program.statements.len(), "evaluating program");
    let result = match eval_statements(&program.statements, env) {
        Object::ReturnValue(inner) => *inner,
        other => other,
    };
    tracing::debug!(result = result.type_name(), "program finished");
    result
}

// ─── Statements ───────────────────────────────────────────────────────────────

/// Evaluate a block in `env` itself. A `ReturnValue` is passed up still
/// wrapped so the enclosing call can unwrap it.
pub fn eval_block(block: &BlockStatement, env: &Env) -> Object {
    eval_statements(&block.statements, env)
}

fn eval_statements(statements: &[Statement], env: &Env) -> Object {
    let mut result = Object::NULL;
    for stmt in statements {
        result = eval_statement(stmt, env);
        if matches!(result, Object::ReturnValue(_) | Object::Error(_)) {
            return result;
        }
    }
    result
}

pub fn eval_statement(stmt: &Statement, env: &Env) -> Object {
    match stmt {
        Statement::Let { name, value, .. } => {
            let val = eval_expr(value, env);
            if val.is_error() { return val; }
            env.borrow_mut().define(name.as_str(), val);
            Object::NULL
        }

        Statement::Return { value, .. } => {
            let val = match value {
                Some(e) => eval_expr(e, env),
                None    => Object::NULL,
            };
            if val.is_error() { return val; }
            Object::ReturnValue(Box::new(val))
        }

        Statement::Expression(e) => eval_expr(e, env),
    }
}

// ─── Expressions ──────────────────────────────────────────────────────────────

pub fn eval_expr(expr: &Expression, env: &Env) -> Object {
    match expr {
        Expression::Integer(v, _) => Object::Integer(*v),
        Expression::Boolean(v, _) => Object::bool(*v),
        Expression::Str(s, _)     => Object::str(s.as_str()),

        Expression::Identifier(name, _) => {
            if let Some(v) = env.borrow().get(name) {
                return v;
            }
            match builtins::lookup(name) {
                Some(b) => Object::Builtin(b),
                None    => Object::error(format!("identifier not found:{name}")),
            }
        }

        Expression::Prefix { op, operand, .. } => {
            let v = eval_expr(operand, env);
            if v.is_error() { return v; }
            eval_prefix(*op, v)
        }

        Expression::Infix { left, op, right, .. } => {
            let l = eval_expr(left, env);
            if l.is_error() { return l; }
            let r = eval_expr(right, env);
            if r.is_error() { return r; }
            eval_infix(*op, l, r)
        }

        Expression::If { condition, consequence, alternative, .. } => {
            let cond = eval_expr(condition, env);
            if cond.is_error() { return cond; }
            if cond.is_truthy() {
                eval_block(consequence, env)
            } else if let Some(alt) = alternative {
                eval_block(alt, env)
            } else {
                Object::NULL
            }
        }

        Expression::Function { params, body, .. } => Object::Function(Rc::new(Function {
            params: params.clone(),
            body: Rc::clone(body),
            env: Rc::clone(env),
        })),

        Expression::Array(items, _) => match eval_exprs(items, env) {
            Ok(vals) => Object::array(vals),
            Err(e)   => e,
        },

        Expression::Index { left, index, .. } => {
            let coll = eval_expr(left, env);
            if coll.is_error() { return coll; }
            let idx = eval_expr(index, env);
            if idx.is_error() { return idx; }
            eval_index(&coll, &idx)
        }

        Expression::Call { callee, args, .. } => {
            let func = eval_expr(callee, env);
            if func.is_error() { return func; }
            match eval_exprs(args, env) {
                Ok(arg_vals) => apply_function(&func, arg_vals),
                Err(e)       => e,
            }
        }
    }
}

/// Evaluate left to right, stopping at the first error.
fn eval_exprs(exprs: &[Expression], env: &Env) -> Result<Vec<Object>, Object> {
    let mut vals = Vec::with_capacity(exprs.len());
    for e in exprs {
        let v = eval_expr(e, env);
        if v.is_error() { return Err(v); }
        vals.push(v);
    }
    Ok(vals)
}

// ─── Call dispatch ────────────────────────────────────────────────────────────

/// Call a function or builtin with already-evaluated arguments.
///
/// A user function runs in a fresh scope enclosed by the scope it was
/// defined in, never the caller's.
pub fn apply_function(func: &Object, args: Vec<Object>) -> Object {
    match func {
        Object::Function(f) => {
            tracing::trace!(params = f.params.len(), argc = args.len(), "calling function");
            if f.params.len() != args.len() {
                return Object::error(wrong_arg_count(args.len(), f.params.len()));
            }
            let call_env = Environment::new_enclosed(Rc::clone(&f.env));
            {
                let mut scope = call_env.borrow_mut();
                for (p, a) in f.params.iter().zip(args) {
                    scope.define(p.as_str(), a);
                }
            }
            match eval_block(&f.body, &call_env) {
                Object::ReturnValue(inner) => *inner,
                other => other,
            }
        }
        Object::Builtin(b) => b.call(&args),
        other => Object::error(format!("not a function: {}", other.type_name())),
    }
}

// ─── Operators ────────────────────────────────────────────────────────────────

fn eval_prefix(op: PrefixOp, v: Object) -> Object {
    match op {
        PrefixOp::Not => Object::bool(!v.is_truthy()),
        PrefixOp::Neg => match v {
            Object::Integer(x) => Object::Integer(x.wrapping_neg()),
            other => Object::error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix(op: InfixOp, l: Object, r: Object) -> Object {
    match (&l, &r) {
        (Object::Integer(a), Object::Integer(b)) => eval_integer_infix(op, *a, *b),
        (Object::Str(a), Object::Str(b)) => match op {
            InfixOp::Add => Object::str(format!("{a}{b}")),
            _ => unknown_infix(op, &l, &r),
        },
        _ if l.type_name() != r.type_name() => Object::error(format!(
            "type mismatch: {} {} {}", l.type_name(), op.as_str(), r.type_name()
        )),
        _ => match op {
            InfixOp::Eq    => Object::bool(l.is_identical(&r)),
            InfixOp::NotEq => Object::bool(!l.is_identical(&r)),
            _ => unknown_infix(op, &l, &r),
        },
    }
}

/// Arithmetic wraps on overflow.
fn eval_integer_infix(op: InfixOp, a: i64, b: i64) -> Object {
    match op {
        InfixOp::Add => Object::Integer(a.wrapping_add(b)),
        InfixOp::Sub => Object::Integer(a.wrapping_sub(b)),
        InfixOp::Mul => Object::Integer(a.wrapping_mul(b)),
        InfixOp::Div => {
            if b == 0 { Object::error("division by zero") }
            else { Object::Integer(a.wrapping_div(b)) }
        }
        InfixOp::Lt    => Object::bool(a < b),
        InfixOp::Gt    => Object::bool(a > b),
        InfixOp::Eq    => Object::bool(a == b),
        InfixOp::NotEq => Object::bool(a != b),
    }
}

fn unknown_infix(op: InfixOp, l: &Object, r: &Object) -> Object {
    Object::error(format!("unknown operator: {} {} {}", l.type_name(), op.as_str(), r.type_name()))
}

fn eval_index(coll: &Object, idx: &Object) -> Object {
    match (coll, idx) {
        (Object::Array(items), Object::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Object::NULL),
        _ => Object::error(format!("index operator not supported: {}", coll.type_name())),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::Span;
    use pretty_assertions::assert_eq;

    fn span() -> Span { Span::new(1, 1) }

    fn int(v: i64) -> Expression { Expression::Integer(v, span()) }

    fn ident(n: &str) -> Expression { Expression::Identifier(n.into(), span()) }

    #[test]
    fn literal_evaluates_to_equal_values_each_time() {
        let env = Environment::new();
        let lit = Expression::Str("same".into(), span());
        assert_eq!(eval_expr(&lit, &env), eval_expr(&lit, &env));
        assert_eq!(eval_expr(&int(7), &env), eval_expr(&int(7), &env));
    }

    #[test]
    fn boolean_literals_are_singletons() {
        let env = Environment::new();
        let t = eval_expr(&Expression::Boolean(true, span()), &env);
        assert!(t.is_identical(&Object::TRUE));
    }

    #[test]
    fn function_shares_body_and_scope() {
        let env = Environment::new();
        let body = Rc::new(BlockStatement {
            statements: vec![Statement::Expression(ident("x"))],
            span: span(),
        });
        let lit = Expression::Function { params: vec!["x".into()], body: Rc::clone(&body), span: span() };
        let Object::Function(f) = eval_expr(&lit, &env) else { panic!("expected function") };
        assert!(Rc::ptr_eq(&f.body, &body));
        assert!(Rc::ptr_eq(&f.env, &env));
    }

    #[test]
    fn left_error_wins_over_right_error() {
        let env = Environment::new();
        let expr = Expression::Infix {
            left: Box::new(ident("first_missing")),
            op: InfixOp::Add,
            right: Box::new(ident("second_missing")),
            span: span(),
        };
        assert_eq!(eval_expr(&expr, &env), Object::error("identifier not found:first_missing"));
    }

    #[test]
    fn let_binds_in_given_scope() {
        let env = Environment::new();
        let stmt = Statement::Let { name: "a".into(), value: int(3), span: span() };
        assert_eq!(eval_statement(&stmt, &env), Object::NULL);
        assert_eq!(env.borrow().get("a"), Some(Object::Integer(3)));
    }

    #[test]
    fn block_does_not_unwrap_return() {
        let env = Environment::new();
        let block = BlockStatement {
            statements: vec![
                Statement::Return { value: Some(int(1)), span: span() },
                Statement::Expression(int(2)),
            ],
            span: span(),
        };
        assert_eq!(eval_block(&block, &env), Object::ReturnValue(Box::new(Object::Integer(1))));
    }

    #[test]
    fn program_unwraps_return() {
        let env = Environment::new();
        let program = Program {
            statements: vec![Statement::Return { value: Some(int(1)), span: span() }],
        };
        assert_eq!(eval(&program, &env), Object::Integer(1));
    }

    #[test]
    fn apply_rejects_non_callables() {
        assert_eq!(apply_function(&Object::Integer(1), vec![]), Object::error("not a function: INTEGER"));
    }

    #[test]
    fn index_integer_edges() {
        let arr = Object::array(vec![Object::Integer(10)]);
        assert_eq!(eval_index(&arr, &Object::Integer(0)), Object::Integer(10));
        assert_eq!(eval_index(&arr, &Object::Integer(1)), Object::NULL);
        assert_eq!(eval_index(&arr, &Object::Integer(i64::MIN)), Object::NULL);
    }

    #[test]
    fn integer_overflow_wraps() {
        assert_eq!(eval_integer_infix(InfixOp::Add, i64::MAX, 1), Object::Integer(i64::MIN));
        assert_eq!(eval_integer_infix(InfixOp::Div, i64::MIN, -1), Object::Integer(i64::MIN));
    }
}
