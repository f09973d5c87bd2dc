//! Recursive-descent parser producing an expression tree.
//!
//! The grammar, lowest precedence first:
//!
//! ```text
//! expression = equality
//! equality   = relational (("==" | "!=") relational)*
//! relational = add (("<" | "<=" | ">" | ">=") add)*
//! add        = mul (("+" | "-") mul)*
//! mul        = unary (("*" | "/") unary)*
//! unary      = ("+" | "-")? primary
//! primary    = "(" expression ")" | number
//! ```
//!
//! The four binary levels are rows of [`PRECEDENCE`] and share one
//! precedence-climbing loop. Each row builds a left-associative chain.

use tracing::debug;

use crate::ast::{Ast, AstBuilder, BinaryOp, NodeId};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// How the operands of a binary operator land in the tree.
#[derive(Debug, Clone, Copy)]
enum Operands {
  InOrder,
  /// `a > b` is stored as `b < a`.
  Swapped,
}

type Level = &'static [(&'static str, BinaryOp, Operands)];

/// Binary operator levels, loosest binding first.
const PRECEDENCE: [Level; 4] = [
  &[
    ("==", BinaryOp::Eq, Operands::InOrder),
    ("!=", BinaryOp::Ne, Operands::InOrder),
  ],
  &[
    ("<", BinaryOp::Lt, Operands::InOrder),
    ("<=", BinaryOp::Le, Operands::InOrder),
    (">", BinaryOp::Lt, Operands::Swapped),
    (">=", BinaryOp::Le, Operands::Swapped),
  ],
  &[
    ("+", BinaryOp::Add, Operands::InOrder),
    ("-", BinaryOp::Sub, Operands::InOrder),
  ],
  &[
    ("*", BinaryOp::Mul, Operands::InOrder),
    ("/", BinaryOp::Div, Operands::InOrder),
  ],
];

/// Parse a complete expression; every token up to `End` must be consumed.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Ast> {
  let mut parser = Parser::new(TokenStream::new(tokens, source));
  let root = parser.parse_expr()?;

  if !parser.stream.is_eof() {
    let token = parser.stream.current();
    let got = describe_token(&token, source);
    return Err(CompileError::syntax(
      source,
      token.loc,
      format!("unexpected token \"{got}\""),
    ));
  }

  let ast = parser.nodes.finish(root);
  debug!(nodes = ast.len(), tree = %ast, "parsed expression");
  Ok(ast)
}

struct Parser<'a> {
  stream: TokenStream<'a>,
  nodes: AstBuilder,
}

impl<'a> Parser<'a> {
  fn new(stream: TokenStream<'a>) -> Self {
    Self {
      stream,
      nodes: AstBuilder::new(),
    }
  }

  fn parse_expr(&mut self) -> CompileResult<NodeId> {
    self.parse_binary(0)
  }

  fn parse_binary(&mut self, level: usize) -> CompileResult<NodeId> {
    let Some(ops) = PRECEDENCE.get(level) else {
      return self.parse_unary();
    };

    let mut node = self.parse_binary(level + 1)?;

    'chain: loop {
      for &(symbol, op, operands) in ops.iter() {
        if self.stream.equal(symbol) {
          let rhs = self.parse_binary(level + 1)?;
          node = match operands {
            Operands::InOrder => self.nodes.binary(op, node, rhs),
            Operands::Swapped => self.nodes.binary(op, rhs, node),
          };
          continue 'chain;
        }
      }
      break;
    }

    Ok(node)
  }

  fn parse_unary(&mut self) -> CompileResult<NodeId> {
    if self.stream.equal("+") {
      return self.parse_primary();
    }

    if self.stream.equal("-") {
      let zero = self.nodes.number(0);
      let operand = self.parse_primary()?;
      return Ok(self.nodes.binary(BinaryOp::Sub, zero, operand));
    }

    self.parse_primary()
  }

  fn parse_primary(&mut self) -> CompileResult<NodeId> {
    if self.stream.equal("(") {
      let node = self.parse_expr()?;
      self.stream.skip(")")?;
      return Ok(node);
    }

    let value = self.stream.get_number()?;
    Ok(self.nodes.number(value))
  }
}

/// Cursor over the token vector. It only ever moves forward.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the tokens; the parser advances `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  /// The token under the cursor. Past the end this keeps answering with the
  /// trailing `End` token, or a synthetic one if the vector was empty.
  fn current(&self) -> Token {
    self
      .tokens
      .get(self.pos)
      .or_else(|| self.tokens.last())
      .copied()
      .unwrap_or_else(|| Token::new(TokenKind::End, self.source.len(), 0))
  }

  /// Consume the current token if it is the given punctuator.
  fn equal(&mut self, op: &str) -> bool {
    let token = self.current();
    if token.kind == TokenKind::Reserved && token_text(&token, self.source) == op {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, op: &str) -> CompileResult<()> {
    if self.equal(op) {
      return Ok(());
    }
    let token = self.current();
    let got = describe_token(&token, self.source);
    Err(CompileError::syntax(
      self.source,
      token.loc,
      format!("expected \"{op}\", but got \"{got}\""),
    ))
  }

  fn get_number(&mut self) -> CompileResult<i64> {
    let token = self.current();
    if let TokenKind::Number(value) = token.kind {
      self.pos += 1;
      return Ok(value);
    }
    let got = describe_token(&token, self.source);
    Err(CompileError::syntax(
      self.source,
      token.loc,
      format!("expected a number, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    self.current().kind == TokenKind::End
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn tree(source: &str) -> String {
    let tokens = tokenize(source).unwrap();
    parse(tokens, source).unwrap().to_string()
  }

  fn syntax_error(source: &str) -> CompileError {
    let tokens = tokenize(source).unwrap();
    let err = parse(tokens, source).unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }), "{err:?}");
    err
  }

  #[test]
  fn chains_are_left_associative() {
    assert_eq!(tree("10 - 2 - 3"), "(- (- 10 2) 3)");
    assert_eq!(tree("8 / 4 / 2"), "(/ (/ 8 4) 2)");
    assert_eq!(tree("1 < 2 < 3"), "(< (< 1 2) 3)");
    assert_eq!(tree("1 == 2 != 3"), "(!= (== 1 2) 3)");
  }

  #[test]
  fn multiplication_binds_tighter_than_addition() {
    assert_eq!(tree("2 + 3 * 4"), "(+ 2 (* 3 4))");
    assert_eq!(tree("(2 + 3) * 4"), "(* (+ 2 3) 4)");
  }

  #[test]
  fn relational_binds_tighter_than_equality() {
    assert_eq!(tree("1 + 1 < 3 == 1"), "(== (< (+ 1 1) 3) 1)");
  }

  #[test]
  fn greater_than_is_mirrored() {
    assert_eq!(tree("3 > 2"), "(< 2 3)");
    assert_eq!(tree("3 >= 2"), "(<= 2 3)");
    assert_eq!(tree("3 > 2"), tree("2 < 3"));
    assert_eq!(tree("1 + 2 > 3 * 4"), "(< (* 3 4) (+ 1 2))");
  }

  #[test]
  fn unary_signs() {
    assert_eq!(tree("-5 + 8"), "(+ (- 0 5) 8)");
    assert_eq!(tree("+5"), "5");
    assert_eq!(tree("-(1 + 2)"), "(- 0 (+ 1 2))");
    assert_eq!(tree("2 * -3"), "(* 2 (- 0 3))");
  }

  #[test]
  fn sign_is_not_repeatable() {
    let err = syntax_error("--1");
    assert_eq!(err.loc(), 1);
    assert_eq!(err.message(), "expected a number, but got \"-\"");
  }

  #[test]
  fn trailing_operator_reports_at_end() {
    let err = syntax_error("1 + ");
    assert_eq!(err.loc(), 4);
    assert_eq!(err.message(), "expected a number, but got \"EOF\"");
  }

  #[test]
  fn unclosed_paren_reports_at_end() {
    let err = syntax_error("(1 + 2");
    assert_eq!(err.loc(), 6);
    assert_eq!(err.message(), "expected \")\", but got \"EOF\"");
  }

  #[test]
  fn unclosed_paren_reports_at_offending_token() {
    let err = syntax_error("(1 2)");
    assert_eq!(err.loc(), 3);
    assert_eq!(err.message(), "expected \")\", but got \"2\"");
  }

  #[test]
  fn leftover_tokens_are_rejected() {
    let err = syntax_error("1 2");
    assert_eq!(err.loc(), 2);
    assert_eq!(err.message(), "unexpected token \"2\"");

    assert_eq!(syntax_error("(1))").loc(), 3);
  }

  #[test]
  fn empty_input_expects_a_number() {
    let err = syntax_error("   ");
    assert_eq!(err.loc(), 3);
    assert_eq!(err.message(), "expected a number, but got \"EOF\"");
  }

  #[test]
  fn operator_in_primary_position() {
    let err = syntax_error("* 2");
    assert_eq!(err.loc(), 0);
  }
}
