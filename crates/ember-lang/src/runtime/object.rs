use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::runtime::builtins::Builtin;
use crate::runtime::environment::Environment;
use crate::syntax::ast::BlockStatement;

/// A runtime value. Every evaluation step produces exactly one `Object`.
///
/// `Boolean` and `Null` carry no heap state, so `Object::TRUE`,
/// `Object::FALSE` and `Object::NULL` are the only instances that exist.
/// Strings, arrays and functions are reference counted: cloning an
/// `Object` never copies their payload.
#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Str(Rc<str>),
    Null,
    /// Raised by `return`; unwrapped at the nearest call site or at the
    /// top of the program.
    ReturnValue(Box<Object>),
    Error(String),
    Function(Rc<Function>),
    Array(Rc<Vec<Object>>),
    Builtin(&'static Builtin),
}

/// A closure: parameters and body shared with the AST, plus the
/// environment that was active where the `fn` literal was evaluated.
pub struct Function {
    pub params: Vec<String>,
    pub body: Rc<BlockStatement>,
    pub env: Rc<RefCell<Environment>>,
}

// the captured environment may contain this function, so it is left out
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .field("body", &self.body.to_string())
            .finish_non_exhaustive()
    }
}

impl Object {
    pub const TRUE: Object = Object::Boolean(true);
    pub const FALSE: Object = Object::Boolean(false);
    pub const NULL: Object = Object::Null;

    pub fn bool(b: bool) -> Object {
        if b { Object::TRUE } else { Object::FALSE }
    }

    pub fn str(s: impl Into<Rc<str>>) -> Object {
        Object::Str(s.into())
    }

    pub fn array(items: Vec<Object>) -> Object {
        Object::Array(Rc::new(items))
    }

    pub fn error(message: impl Into<String>) -> Object {
        Object::Error(message.into())
    }

    /// Type tag used verbatim in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_)     => "INTEGER",
            Object::Boolean(_)     => "BOOLEAN",
            Object::Str(_)         => "STRING",
            Object::Null           => "NULL",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_)       => "ERROR",
            Object::Function(_)    => "FUNCTION",
            Object::Array(_)       => "ARRAY",
            Object::Builtin(_)     => "BUILTIN",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// `false` and `null` are falsy; every other value is truthy,
    /// including `0` and `""`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    /// Identity comparison. For booleans and null this is the same as
    /// value equality because only one instance of each value exists;
    /// heap-backed values compare by pointer.
    pub fn is_identical(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Null, Object::Null)             => true,
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Str(a), Object::Str(b))           => Rc::ptr_eq(a, b),
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Array(a), Object::Array(b))       => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b))   => std::ptr::eq(*a, *b),
            _ => false,
        }
    }

    /// Human-readable rendering, as printed by a driver.
    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(v)     => write!(f, "{v}"),
            Object::Boolean(v)     => write!(f, "{v}"),
            Object::Str(s)         => f.write_str(s),
            Object::Null           => f.write_str("null"),
            Object::ReturnValue(v) => write!(f, "{v}"),
            Object::Error(msg)     => write!(f, "ERROR: {msg}"),
            Object::Function(func) => write!(f, "fn({}) {{\n{}\n}}", func.params.join(", "), func.body),
            Object::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Object::Builtin(_) => f.write_str("builtin function"),
        }
    }
}

/// Structural equality for integers, booleans, null and strings; arrays
/// compare element-wise. Functions and builtins compare by identity.
/// Meant for tests and drivers; the evaluator's `==` uses the language rules.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Str(a), Object::Str(b))                 => a == b,
            (Object::Array(a), Object::Array(b))             => a == b,
            (Object::ReturnValue(a), Object::ReturnValue(b)) => a == b,
            (Object::Error(a), Object::Error(b))             => a == b,
            _ => self.is_identical(other),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ast::{Expression, Span, Statement};
    use pretty_assertions::assert_eq;

    fn sample_function() -> Object {
        let body = BlockStatement {
            statements: vec![Statement::Expression(Expression::Identifier("x".into(), Span::new(1, 1)))],
            span: Span::new(1, 1),
        };
        Object::Function(Rc::new(Function {
            params: vec!["x".into(), "y".into()],
            body: Rc::new(body),
            env: Environment::new(),
        }))
    }

    #[test]
    fn type_names() {
        assert_eq!(Object::Integer(1).type_name(), "INTEGER");
        assert_eq!(Object::TRUE.type_name(), "BOOLEAN");
        assert_eq!(Object::str("a").type_name(), "STRING");
        assert_eq!(Object::NULL.type_name(), "NULL");
        assert_eq!(Object::error("x").type_name(), "ERROR");
        assert_eq!(Object::array(vec![]).type_name(), "ARRAY");
        assert_eq!(sample_function().type_name(), "FUNCTION");
    }

    #[test]
    fn truthiness() {
        assert!(!Object::FALSE.is_truthy());
        assert!(!Object::NULL.is_truthy());
        assert!(Object::TRUE.is_truthy());
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::str("").is_truthy());
        assert!(Object::array(vec![]).is_truthy());
    }

    #[test]
    fn bool_constructor_returns_singletons() {
        assert!(Object::bool(true).is_identical(&Object::TRUE));
        assert!(Object::bool(false).is_identical(&Object::FALSE));
        assert!(!Object::TRUE.is_identical(&Object::FALSE));
    }

    #[test]
    fn strings_compare_by_pointer_for_identity() {
        let a = Object::str("hi");
        let b = Object::str("hi");
        assert!(a.is_identical(&a.clone()));
        assert!(!a.is_identical(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn inspect_scalars() {
        assert_eq!(Object::Integer(-7).inspect(), "-7");
        assert_eq!(Object::TRUE.inspect(), "true");
        assert_eq!(Object::NULL.inspect(), "null");
        assert_eq!(Object::str("hello").inspect(), "hello");
        assert_eq!(Object::error("boom").inspect(), "ERROR: boom");
    }

    #[test]
    fn inspect_array() {
        let arr = Object::array(vec![Object::Integer(1), Object::str("two"), Object::NULL]);
        assert_eq!(arr.inspect(), "[1, two, null]");
    }

    #[test]
    fn inspect_function() {
        assert_eq!(sample_function().inspect(), "fn(x, y) {\nx\n}");
    }

    #[test]
    fn return_value_renders_inner() {
        assert_eq!(Object::ReturnValue(Box::new(Object::Integer(3))).inspect(), "3");
    }
}
