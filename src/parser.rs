//! Recursive-descent parser producing a statement list and expression AST.
//!
//! The parser mirrors the classic chibicc structure: we maintain a
//! precedence-climbing set of helpers and expose a thin statement layer so
//! sequencing lives outside the expression tree. This keeps the grammar easy
//! to extend with additional statement kinds later on.

use crate::error::{CompileError, CompileResult};
use crate::frame;
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Binary operators recognised by the language. `>` and `>=` never appear
/// here: they are normalised at parse time by swapping operands onto `Lt`
/// and `Le`, which halves the comparison forms the emitter must handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Var {
    name: char,
    offset: i64,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  Assign {
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn var(name: char, offset: i64) -> Self {
    Self::Var { name, offset }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn assign(lhs: AstNode, rhs: AstNode) -> Self {
    Self::Assign {
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

/// Singly-linked list of statements. Each node holds exactly one expression
/// statement for now, but the structure leaves room to grow.
#[derive(Debug, Clone)]
pub struct Stmt {
  pub expr: AstNode,
  pub next: Option<Box<Stmt>>,
}

impl Stmt {
  /// Iterate statement expressions in source (execution) order.
  pub fn iter(&self) -> StmtIter<'_> {
    StmtIter {
      current: Some(self),
    }
  }
}

pub struct StmtIter<'a> {
  current: Option<&'a Stmt>,
}

impl<'a> Iterator for StmtIter<'a> {
  type Item = &'a AstNode;

  fn next(&mut self) -> Option<Self::Item> {
    let stmt = self.current?;
    self.current = stmt.next.as_deref();
    Some(&stmt.expr)
  }
}

/// A parsed program: the statement list in source order.
#[derive(Debug, Clone)]
pub struct Program {
  pub body: Box<Stmt>,
}

/// Parse a sequence of statements from the token stream.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut stream = TokenStream::new(tokens, source);

  if stream.is_eof() {
    return Err(CompileError::syntax_at(source, 0, "program is empty"));
  }

  let body = parse_stmt(&mut stream)?;

  if !stream.is_eof() {
    let token = stream.current().ok_or_else(|| {
      CompileError::syntax_at(
        source,
        source.len(),
        "unexpected end of input after statement",
      )
    })?;
    let got = describe_token(Some(token), source);
    return Err(CompileError::syntax_at(
      source,
      token.loc,
      format!("unexpected token \"{got}\""),
    ));
  }

  Ok(Program { body })
}

fn parse_stmt(stream: &mut TokenStream) -> CompileResult<Box<Stmt>> {
  parse_expr_stmt(stream)
}

fn parse_expr_stmt(stream: &mut TokenStream) -> CompileResult<Box<Stmt>> {
  // The only statement form today is an expression followed by a semicolon.
  // Keeping this isolated makes it trivial to bolt on new statement kinds.
  let expr = parse_expr(stream)?;
  stream.skip(";")?;

  let next = if stream.is_eof() {
    None
  } else {
    Some(parse_stmt(stream)?)
  };

  Ok(Box::new(Stmt { expr, next }))
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<AstNode> {
  parse_assign(stream)
}

fn parse_assign(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let node = parse_equality(stream)?;

  // Right-associative: `a = b = 5` parses as `a = (b = 5)`. Whether the
  // left side is actually assignable is checked by the emitter.
  if stream.equal("=") {
    let rhs = parse_assign(stream)?;
    return Ok(AstNode::assign(node, rhs));
  }

  Ok(node)
}

fn parse_equality(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_relational(stream)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "==") => symbol,
      Some(symbol @ "!=") => symbol,
      _ => break,
    };

    let op = match op_str {
      "==" => BinaryOp::Eq,
      "!=" => BinaryOp::Ne,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_relational(stream)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_relational(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_add(stream)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "<") => symbol,
      Some(symbol @ "<=") => symbol,
      Some(symbol @ ">") => symbol,
      Some(symbol @ ">=") => symbol,
      _ => break,
    };

    stream.skip(op_str)?;
    let rhs = parse_add(stream)?;

    // `a > b` becomes `b < a`, `a >= b` becomes `b <= a`.
    node = match op_str {
      "<" => AstNode::binary(BinaryOp::Lt, node, rhs),
      "<=" => AstNode::binary(BinaryOp::Le, node, rhs),
      ">" => AstNode::binary(BinaryOp::Lt, rhs, node),
      ">=" => AstNode::binary(BinaryOp::Le, rhs, node),
      _ => unreachable!(),
    };
  }

  Ok(node)
}

fn parse_add(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_mul(stream)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "+") => symbol,
      Some(symbol @ "-") => symbol,
      _ => break,
    };

    let op = match op_str {
      "+" => BinaryOp::Add,
      "-" => BinaryOp::Sub,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_mul(stream)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<AstNode> {
  let mut node = parse_unary(stream)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "*") => symbol,
      Some(symbol @ "/") => symbol,
      _ => break,
    };

    let op = match op_str {
      "*" => BinaryOp::Mul,
      "/" => BinaryOp::Div,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_unary(stream)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_unary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  if stream.equal("+") {
    // Unary plus is the identity.
    let operand = parse_unary(stream)?;
    return Ok(operand);
  }

  if stream.equal("-") {
    // Unary minus is rewritten as `0 - operand`.
    let operand = parse_unary(stream)?;
    return Ok(AstNode::binary(BinaryOp::Sub, AstNode::number(0), operand));
  }

  parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<AstNode> {
  if stream.equal("(") {
    let node = parse_expr(stream)?;
    stream.skip(")")?;
    Ok(node)
  } else {
    if matches!(
      stream.peek().map(|token| token.kind),
      Some(TokenKind::Ident)
    ) {
      let (name, loc) = stream.get_ident()?;
      let offset = frame::slot_offset(name).ok_or_else(|| {
        CompileError::syntax_at(
          stream.source,
          loc,
          format!("unknown variable '{name}'"),
        )
      })?;
      return Ok(AstNode::var(name, offset));
    }

    let (value, _) = stream.get_number()?;
    Ok(AstNode::number(value))
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn current(&self) -> Option<&Token> {
    self.peek()
  }

  /// Consume the current token if it matches the provided punctuator.
  fn equal(&mut self, op: &str) -> bool {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Punctuator
      && token.len == op.len()
      && token_text(token, self.source) == op
    {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      Ok(())
    } else {
      let (loc, got) = match self.tokens.get(self.pos) {
        Some(token) => (token.loc, describe_token(Some(token), self.source)),
        None => (self.source.len(), "EOF".to_string()),
      };
      Err(CompileError::syntax_at(
        self.source,
        loc,
        format!("expected \"{s}\", but got \"{got}\""),
      ))
    }
  }

  /// Parse the current token as an integer literal returning its value and location.
  fn get_number(&mut self) -> CompileResult<(i64, usize)> {
    if self.pos >= self.tokens.len() {
      return Err(CompileError::syntax_at(
        self.source,
        self.source.len(),
        "expected a number, but reached end of input",
      ));
    }

    if let Some(token) = self.tokens.get(self.pos)
      && token.kind == TokenKind::Num
    {
      let value = token.value.ok_or_else(|| {
        CompileError::syntax_at(
          self.source,
          token.loc,
          "internal error: numeric token missing value",
        )
      })?;
      let loc = token.loc;
      self.pos += 1;
      return Ok((value, loc));
    }

    let Some(token) = self.tokens.get(self.pos) else {
      return Err(CompileError::syntax_at(
        self.source,
        self.source.len(),
        "unexpected end of input while parsing number",
      ));
    };
    let got = describe_token(Some(token), self.source);
    Err(CompileError::syntax_at(
      self.source,
      token.loc,
      format!("expected a number, but got \"{got}\""),
    ))
  }

  /// Parse the current token as an identifier.
  fn get_ident(&mut self) -> CompileResult<(char, usize)> {
    if let Some(token) = self.tokens.get(self.pos)
      && token.kind == TokenKind::Ident
    {
      let Some(ident) = token_text(token, self.source).chars().next() else {
        return Err(CompileError::syntax_at(
          self.source,
          token.loc,
          "identifier is missing characters",
        ));
      };
      let loc = token.loc;
      self.pos += 1;
      return Ok((ident, loc));
    }

    let Some(token) = self.tokens.get(self.pos) else {
      return Err(CompileError::syntax_at(
        self.source,
        self.source.len(),
        "unexpected end of input while parsing identifier",
      ));
    };
    let got = describe_token(Some(token), self.source);
    Err(CompileError::syntax_at(
      self.source,
      token.loc,
      format!("expected an identifier, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn parse_source(source: &str) -> CompileResult<Program> {
    parse(tokenize(source)?, source)
  }

  fn single_expr(source: &str) -> AstNode {
    let program = parse_source(source).expect("source should parse");
    assert!(program.body.next.is_none(), "expected a single statement");
    program.body.expr.clone()
  }

  #[test]
  fn multiplication_binds_tighter_than_addition() {
    let AstNode::Binary { op, rhs, .. } = single_expr("2+3*4;") else {
      panic!("expected a binary node at the root");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(
      *rhs,
      AstNode::Binary {
        op: BinaryOp::Mul,
        ..
      }
    ));
  }

  #[test]
  fn subtraction_is_left_associative() {
    let AstNode::Binary { op, lhs, rhs } = single_expr("10-2-3;") else {
      panic!("expected a binary node at the root");
    };
    assert_eq!(op, BinaryOp::Sub);
    assert!(matches!(
      *lhs,
      AstNode::Binary {
        op: BinaryOp::Sub,
        ..
      }
    ));
    assert!(matches!(*rhs, AstNode::Num { value: 3 }));
  }

  #[test]
  fn assignment_is_right_associative() {
    let AstNode::Assign { rhs, .. } = single_expr("a=b=5;") else {
      panic!("expected an assignment at the root");
    };
    assert!(matches!(*rhs, AstNode::Assign { .. }));
  }

  #[test]
  fn greater_than_swaps_operands_onto_less_than() {
    let AstNode::Binary { op, lhs, rhs } = single_expr("1>2;") else {
      panic!("expected a binary node at the root");
    };
    assert_eq!(op, BinaryOp::Lt);
    assert!(matches!(*lhs, AstNode::Num { value: 2 }));
    assert!(matches!(*rhs, AstNode::Num { value: 1 }));
  }

  #[test]
  fn unary_minus_becomes_zero_minus_operand() {
    let AstNode::Binary { op, lhs, rhs } = single_expr("-5;") else {
      panic!("expected a binary node at the root");
    };
    assert_eq!(op, BinaryOp::Sub);
    assert!(matches!(*lhs, AstNode::Num { value: 0 }));
    assert!(matches!(*rhs, AstNode::Num { value: 5 }));
  }

  #[test]
  fn unary_plus_is_discarded() {
    assert!(matches!(single_expr("+5;"), AstNode::Num { value: 5 }));
  }

  #[test]
  fn variable_reference_resolves_offset_at_parse_time() {
    let AstNode::Var { name, offset } = single_expr("c;") else {
      panic!("expected a variable reference");
    };
    assert_eq!(name, 'c');
    assert_eq!(offset, 24);
  }

  #[test]
  fn statements_are_kept_in_source_order() {
    let program = parse_source("a=1;a+2;").expect("source should parse");
    let exprs: Vec<&AstNode> = program.body.iter().collect();
    assert_eq!(exprs.len(), 2);
    assert!(matches!(exprs[0], AstNode::Assign { .. }));
    assert!(matches!(exprs[1], AstNode::Binary { .. }));
  }

  #[test]
  fn missing_operand_is_rejected() {
    let err = parse_source("1+;").unwrap_err();
    assert!(err.to_string().contains("expected a number"));
  }

  #[test]
  fn unmatched_paren_is_rejected_at_the_semicolon() {
    let err = parse_source("(1+2;").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("expected \")\""));
    // the caret sits under the semicolon, offset 4 plus the opening quote
    assert!(rendered.lines().nth(1).is_some_and(|l| l.starts_with("     ^")));
  }

  #[test]
  fn missing_semicolon_is_rejected() {
    let err = parse_source("1+2").unwrap_err();
    assert!(err.to_string().contains("expected \";\""));
  }

  #[test]
  fn variables_outside_the_slot_space_are_rejected() {
    let err = parse_source("A;").unwrap_err();
    assert!(err.to_string().contains("unknown variable 'A'"));
  }

  #[test]
  fn empty_program_is_rejected() {
    let err = parse_source("").unwrap_err();
    assert!(err.to_string().contains("program is empty"));
  }
}
