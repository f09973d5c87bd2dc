//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics point at the offending byte with a caret, chibicc style:
//!
//! ```text
//! 1 $ 2
//!   ^ invalid token: '$'
//! ```
//!
//! The library only builds these values. Printing them and choosing an exit
//! status is left to the caller.

use std::fmt;

use snafu::Snafu;

use crate::vm::VmError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  /// A character the tokenizer does not recognise, or an unrepresentable literal.
  #[snafu(display("{diagnostic}"))]
  Lexical { diagnostic: Diagnostic },

  /// A token the grammar did not expect at this position.
  #[snafu(display("{diagnostic}"))]
  Syntax { diagnostic: Diagnostic },
}

impl CompileError {
  pub fn lexical(source: &str, loc: usize, message: impl Into<String>) -> Self {
    Self::Lexical {
      diagnostic: Diagnostic::at(source, loc, message),
    }
  }

  pub fn syntax(source: &str, loc: usize, message: impl Into<String>) -> Self {
    Self::Syntax {
      diagnostic: Diagnostic::at(source, loc, message),
    }
  }

  pub fn diagnostic(&self) -> &Diagnostic {
    match self {
      Self::Lexical { diagnostic } | Self::Syntax { diagnostic } => diagnostic,
    }
  }

  /// Byte offset into the source where the error was detected.
  pub fn loc(&self) -> usize {
    self.diagnostic().loc
  }

  pub fn message(&self) -> &str {
    &self.diagnostic().message
  }
}

/// Failure of a compile-and-run round trip through the stack interpreter.
#[derive(Debug, Snafu)]
pub enum EvalError {
  #[snafu(transparent)]
  Compile { source: CompileError },

  #[snafu(transparent)]
  Vm { source: VmError },
}

/// A message anchored at a byte offset, carrying the echoed source line and
/// the caret marker already laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub loc: usize,
  pub line: String,
  pub marker: String,
  pub message: String,
}

impl Diagnostic {
  /// Construct a diagnostic anchored at a specific byte offset in the source.
  pub fn at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let mut safe_loc = loc.min(source.len());
    while !source.is_char_boundary(safe_loc) {
      safe_loc -= 1;
    }

    let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |i| safe_loc + i);
    let column = source[line_start..safe_loc].chars().count();

    Self {
      loc,
      line: source[line_start..line_end].to_string(),
      marker: format!("{}^", " ".repeat(column)),
      message: message.into(),
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\n{} {}", self.line, self.marker, self.message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn marker_sits_under_offset() {
    let err = CompileError::lexical("1 $ 2", 2, "invalid token: '$'");
    assert_eq!(err.to_string(), "1 $ 2\n  ^ invalid token: '$'");
    assert_eq!(err.loc(), 2);
  }

  #[test]
  fn offset_past_end_points_after_last_char() {
    let err = CompileError::syntax("1 +", 3, "expected a number, but got \"EOF\"");
    assert_eq!(err.diagnostic().marker, "   ^");
  }

  #[test]
  fn multi_line_source_echoes_only_the_offending_line() {
    let diag = Diagnostic::at("1 +\n 2 @", 7, "invalid token: '@'");
    assert_eq!(diag.line, " 2 @");
    assert_eq!(diag.marker, "   ^");
  }

  #[test]
  fn column_counts_characters_not_bytes() {
    let source = "é $";
    let diag = Diagnostic::at(source, 3, "invalid token: '$'");
    assert_eq!(diag.marker, "  ^");
  }
}
