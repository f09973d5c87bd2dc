//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about semantics beyond recognising operators
//! and numeric literals. Multi-character punctuators are matched before
//! single-character ones so that `<=` never lexes as `<` `=`.

use tracing::debug;

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  /// Operator or punctuation. The spelling is recovered with [`token_text`].
  Reserved,
  Number(i64),
  /// Sentinel closing every token sequence.
  End,
}

/// Lexical information needed by later stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }
}

const TWO_CHAR_PUNCTUATORS: [&str; 4] = ["==", "!=", "<=", ">="];

/// Lex the input into a flat vector of tokens terminated by a single `End` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let value = input[start..i]
        .parse::<i64>()
        .map_err(|_| CompileError::lexical(input, start, "number literal out of range"))?;
      tokens.push(Token::new(TokenKind::Number(value), start, i - start));
      continue;
    }

    if let Some(op) = TWO_CHAR_PUNCTUATORS
      .into_iter()
      .find(|op| input[i..].starts_with(op))
    {
      tokens.push(Token::new(TokenKind::Reserved, i, op.len()));
      i += op.len();
      continue;
    }

    if matches!(c, b'+' | b'-' | b'*' | b'/' | b'(' | b')' | b'<' | b'>') {
      tokens.push(Token::new(TokenKind::Reserved, i, 1));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lexical(
      input,
      i,
      format!("invalid token: '{invalid_char}'"),
    ));
  }

  tokens.push(Token::new(TokenKind::End, input.len(), 0));
  debug!(count = tokens.len(), "tokenized input");
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  &source[token.loc..token.loc + token.len]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: &Token, source: &str) -> String {
  match token.kind {
    TokenKind::End => "EOF".to_string(),
    _ => token_text(token, source).to_string(),
  }
}
