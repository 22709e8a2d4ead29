pub mod syntax;
pub mod runtime;
pub mod error;

pub use error::{Error, ErrorCode};
pub use syntax::ast::Program;
pub use syntax::token::{Token, TokenKind};
pub use runtime::environment::Environment;
pub use runtime::evaluator::eval;
pub use runtime::object::Object;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Tokenize and parse source text into a program ready for evaluation.
pub fn parse(source: &str) -> Result<Program, Vec<Error>> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    syntax::parser::Parser::new(tokens).parse()
}

/// Parse and evaluate `source` in a fresh root environment.
///
/// Syntax errors are returned as `Err`. Runtime failures are not: they come
/// back as `Ok(Object::Error(..))`, exactly as the evaluator produced them.
pub fn run(source: &str) -> Result<Object, Vec<Error>> {
    let program = parse(source)?;
    let env = Environment::new();
    Ok(eval(&program, &env))
}
