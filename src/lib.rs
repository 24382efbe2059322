//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the statement list.
//! - `frame` defines the fixed storage map for the single-letter variables.
//! - `codegen` lowers the parsed program into x86-64 AT&T assembly.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod error;
pub mod frame;
pub mod parser;
pub mod tokenizer;

mod codegen;

pub use error::{CompileError, CompileResult};

use tracing::debug;

/// Compile a source string into AT&T assembly. Each stage runs to
/// completion before the next one starts.
pub fn compile(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  debug!(tokens = tokens.len(), "lexical analysis complete");

  let program = parser::parse(tokens, source)?;
  debug!(
    statements = program.body.iter().count(),
    "syntax analysis complete"
  );

  let asm = codegen::generate(&program)?;
  debug!(lines = asm.lines().count(), "code generation complete");

  Ok(asm)
}
