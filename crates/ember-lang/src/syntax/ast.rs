use std::fmt;
use std::rc::Rc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let x = 5;`
    Let {
        name: String,
        value: Expression,
        span: Span,
    },
    /// `return expr;` or bare `return;`
    Return {
        value: Option<Expression>,
        span: Span,
    },
    /// A standalone expression, e.g. `add(1, 2);`
    Expression(Expression),
}

/// `{ stmt; stmt; }` — the body of an `if` branch or a function.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String, Span),
    Integer(i64, Span),
    Boolean(bool, Span),
    Str(String, Span),

    /// `[1, 2 * 2, "three"]`
    Array(Vec<Expression>, Span),

    /// `!x`, `-x`
    Prefix {
        op: PrefixOp,
        operand: Box<Expression>,
        span: Span,
    },

    /// `a + b`, `a == b`, etc.
    Infix {
        left: Box<Expression>,
        op: InfixOp,
        right: Box<Expression>,
        span: Span,
    },

    /// `if (cond) { ... } else { ... }`
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
        span: Span,
    },

    /// `fn(x, y) { x + y }`. The body is shared with every Function
    /// object created from this literal.
    Function {
        params: Vec<String>,
        body: Rc<BlockStatement>,
        span: Span,
    },

    /// `callee(args)`. The callee is any expression: `add(1)`, `fn(x) { x }(1)`.
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        span: Span,
    },

    /// `left[index]`
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Identifier(_, s) => s,
            Expression::Integer(_, s)    => s,
            Expression::Boolean(_, s)    => s,
            Expression::Str(_, s)        => s,
            Expression::Array(_, s)      => s,
            Expression::Prefix { span, .. }   => span,
            Expression::Infix { span, .. }    => span,
            Expression::If { span, .. }       => span,
            Expression::Function { span, .. } => span,
            Expression::Call { span, .. }     => span,
            Expression::Index { span, .. }    => span,
        }
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Not,
    Neg,
}

impl PrefixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOp {
    Add, Sub, Mul, Div,
    Lt, Gt,
    Eq, NotEq,
}

impl InfixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfixOp::Add   => "+",
            InfixOp::Sub   => "-",
            InfixOp::Mul   => "*",
            InfixOp::Div   => "/",
            InfixOp::Lt    => "<",
            InfixOp::Gt    => ">",
            InfixOp::Eq    => "==",
            InfixOp::NotEq => "!=",
        }
    }
}

// ─── Rendering ───────────────────────────────────────────────────────────────
//
// Renderings are fully parenthesised so that diagnostics show how the
// parser grouped an expression: `1 + 2 * 3` renders as `(1 + (2 * 3))`.

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 { f.write_str(", ")?; }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.statements.iter().try_for_each(|s| write!(f, "{s}"))
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.statements.iter().try_for_each(|s| write!(f, "{s}"))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value, .. }    => write!(f, "let {name} = {value};"),
            Statement::Return { value: Some(v), .. } => write!(f, "return {v};"),
            Statement::Return { value: None, .. }    => f.write_str("return;"),
            Statement::Expression(e)              => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name, _) => f.write_str(name),
            Expression::Integer(v, _)       => write!(f, "{v}"),
            Expression::Boolean(v, _)       => write!(f, "{v}"),
            Expression::Str(s, _)           => f.write_str(s),
            Expression::Array(items, _) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Expression::Prefix { op, operand, .. } => write!(f, "({}{operand})", op.as_str()),
            Expression::Infix { left, op, right, .. } => write!(f, "({left} {} {right})", op.as_str()),
            Expression::If { condition, consequence, alternative, .. } => {
                write!(f, "if{condition} {consequence}")?;
                if let Some(alt) = alternative {
                    write!(f, "else {alt}")?;
                }
                Ok(())
            }
            Expression::Function { params, body, .. } => {
                f.write_str("fn(")?;
                write_joined(f, params)?;
                write!(f, ") {body}")
            }
            Expression::Call { callee, args, .. } => {
                write!(f, "{callee}(")?;
                write_joined(f, args)?;
                f.write_str(")")
            }
            Expression::Index { left, index, .. } => write!(f, "({left}[{index}])"),
        }
    }
}
