//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token vector.
//! - `parser` owns all syntactic knowledge and returns an arena-backed `ast::Ast`.
//! - `codegen` lowers the tree into a stack program and renders x86-64 assembly.
//! - `vm` runs lowered stack programs with the target's integer semantics.
//! - `error` centralises the positional diagnostics shared by the other modules.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod parser;
pub mod tokenizer;
pub mod vm;

pub use error::{CompileError, CompileResult, EvalError};

/// Tokenize and parse a source string into an expression tree.
pub fn parse_source(expr: &str) -> CompileResult<ast::Ast> {
  let tokens = tokenizer::tokenize(expr)?;
  parser::parse(tokens, expr)
}

/// Compile a source string into Intel-syntax assembly.
pub fn generate_assembly(expr: &str) -> CompileResult<String> {
  let ast = parse_source(expr)?;
  Ok(codegen::generate(&ast))
}

/// Compile a source string and run the resulting stack program.
pub fn evaluate(expr: &str) -> Result<i64, EvalError> {
  let ast = parse_source(expr)?;
  Ok(vm::run(&codegen::lower(&ast))?)
}
