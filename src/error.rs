//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – these routines format
//! messages in a style reminiscent of chibicc, pointing at the offending
//! byte with a caret.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Failure taxonomy of the pipeline. Lexical and syntax errors carry a
/// rendered source line plus caret marker; semantic failures surface
/// during code generation and have no single source position.
#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("{expr_line}\n{marker} {message}"))]
  Tokenize {
    expr_line: String,
    marker: String,
    message: String,
  },
  #[snafu(display("{expr_line}\n{marker} {message}"))]
  Syntax {
    expr_line: String,
    marker: String,
    message: String,
  },
  #[snafu(display("{message}"))]
  Semantic { message: String },
}

impl CompileError {
  /// Lexical error anchored at a specific byte offset in the source.
  pub fn tokenize_at(expr: &str, loc: usize, message: impl Into<String>) -> Self {
    let (expr_line, marker) = render_caret(expr, loc);
    Self::Tokenize {
      expr_line,
      marker,
      message: message.into(),
    }
  }

  /// Syntax error anchored at a specific byte offset in the source.
  pub fn syntax_at(expr: &str, loc: usize, message: impl Into<String>) -> Self {
    let (expr_line, marker) = render_caret(expr, loc);
    Self::Syntax {
      expr_line,
      marker,
      message: message.into(),
    }
  }

  /// Semantic error with no source anchor.
  pub fn semantic(message: impl Into<String>) -> Self {
    Self::Semantic {
      message: message.into(),
    }
  }
}

fn render_caret(expr: &str, loc: usize) -> (String, String) {
  let expr_line = format!("'{expr}'");
  let safe_loc = loc.min(expr.len());
  let char_offset = expr[..safe_loc].chars().count() + 1; // account for opening quote
  let marker = format!("{}^", " ".repeat(char_offset));
  (expr_line, marker)
}
