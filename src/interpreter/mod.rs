pub mod builtins;
pub mod environment;
pub mod evaluator;
pub mod parser;

pub use environment::{Env, Environment};
pub use evaluator::Script;
pub use parser::{ParseErrors, Parser};

use crate::lexer::Lexer;
use crate::value::Value;

/// Parses and evaluates `source` against a fresh environment and a fresh
/// konst registry. Runtime failures come back as `Value::Error`; only
/// parse failures are `Err`.
pub fn parse_and_eval(source: &str) -> Result<Value, ParseErrors> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program()?;
    let env = Environment::new();
    let mut script = Script::new();
    Ok(script.eval_program(&program, &env))
}
