//! Code generation: lower the parsed AST into AT&T x86-64 assembly.
//!
//! The emitter uses a simple stack machine: every expression leaves a
//! single value on the stack and statements pop intermediate results as we
//! chain them. Locals live on the stack frame and are addressed relative to
//! `%rbp`.

use crate::error::{CompileError, CompileResult};
use crate::frame;
use crate::parser::{AstNode, BinaryOp, Program, Stmt};

/// Emit the complete routine: prologue, per-statement code, epilogue. The
/// final statement's residual stack value becomes the return value.
pub fn generate(program: &Program) -> CompileResult<String> {
  let mut asm = String::new();
  asm.push_str(".global main\n");
  asm.push_str("main:\n");
  asm.push_str("    push %rbp\n");
  asm.push_str("    mov %rsp, %rbp\n");
  asm.push_str(&format!("    sub ${}, %rsp\n", frame::FRAME_SIZE));

  emit_stmt(&program.body, &mut asm)?;

  asm.push_str("    pop %rax\n");
  asm.push_str("    mov %rbp, %rsp\n");
  asm.push_str("    pop %rbp\n");
  asm.push_str("    ret\n");

  Ok(asm)
}

/// Walk the statement list, emitting code for each expression and discarding
/// intermediate results to keep stack balance intact.
fn emit_stmt(stmt: &Stmt, asm: &mut String) -> CompileResult<()> {
  emit_expr(&stmt.expr, asm)?;

  if let Some(next) = stmt.next.as_deref() {
    asm.push_str("    pop %rax\n");
    emit_stmt(next, asm)?;
  }
  Ok(())
}

/// Emit stack-based code for a single expression node. Post-order: both
/// operands are generated before the operation, so the right operand ends
/// up in `%rdi` and the left in `%rax`.
fn emit_expr(node: &AstNode, asm: &mut String) -> CompileResult<()> {
  match node {
    AstNode::Num { value } => {
      asm.push_str(&format!("    mov ${value}, %rax\n"));
      asm.push_str("    push %rax\n");
    }
    AstNode::Var { .. } => {
      // Push the slot address, then replace it with the loaded value.
      emit_addr(node, asm)?;
      asm.push_str("    pop %rax\n");
      asm.push_str("    mov (%rax), %rax\n");
      asm.push_str("    push %rax\n");
    }
    AstNode::Binary { op, lhs, rhs } => {
      emit_expr(lhs, asm)?;
      emit_expr(rhs, asm)?;
      asm.push_str("    pop %rdi\n");
      asm.push_str("    pop %rax\n");
      match op {
        BinaryOp::Add => asm.push_str("    add %rdi, %rax\n"),
        BinaryOp::Sub => asm.push_str("    sub %rdi, %rax\n"),
        BinaryOp::Mul => asm.push_str("    imul %rdi, %rax\n"),
        BinaryOp::Div => {
          // idiv divides %rdx:%rax, so sign-extend first.
          asm.push_str("    cqo\n");
          asm.push_str("    idiv %rdi\n");
        }
        BinaryOp::Eq => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    sete %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
        BinaryOp::Ne => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    setne %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
        BinaryOp::Lt => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    setl %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
        BinaryOp::Le => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    setle %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
      }
      asm.push_str("    push %rax\n");
    }
    AstNode::Assign { lhs, rhs } => {
      emit_addr(lhs, asm)?;
      emit_expr(rhs, asm)?;
      asm.push_str("    pop %rdi\n");
      asm.push_str("    pop %rax\n");
      asm.push_str("    mov %rdi, (%rax)\n");
      // Assignment is an expression yielding the assigned value.
      asm.push_str("    push %rdi\n");
    }
  }
  Ok(())
}

fn emit_addr(node: &AstNode, asm: &mut String) -> CompileResult<()> {
  match node {
    AstNode::Var { offset, .. } => {
      asm.push_str(&format!("    lea -{offset}(%rbp), %rax\n"));
      asm.push_str("    push %rax\n");
      Ok(())
    }
    _ => Err(CompileError::semantic(
      "left-hand side of assignment is not a variable",
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse;
  use crate::tokenizer::tokenize;

  fn generate_source(source: &str) -> CompileResult<String> {
    generate(&parse(tokenize(source)?, source)?)
  }

  #[test]
  fn wraps_code_in_frame_setup_and_teardown() {
    let asm = generate_source("42;").expect("source should compile");
    let lines: Vec<&str> = asm.lines().collect();
    assert_eq!(
      &lines[..5],
      &[
        ".global main",
        "main:",
        "    push %rbp",
        "    mov %rsp, %rbp",
        "    sub $208, %rsp",
      ]
    );
    assert_eq!(
      &lines[lines.len() - 4..],
      &["    pop %rax", "    mov %rbp, %rsp", "    pop %rbp", "    ret"]
    );
  }

  #[test]
  fn literal_is_pushed_directly() {
    let asm = generate_source("42;").expect("source should compile");
    assert!(asm.contains("    mov $42, %rax\n    push %rax\n"));
  }

  #[test]
  fn variable_read_goes_through_its_address() {
    let asm = generate_source("b;").expect("source should compile");
    assert!(asm.contains(
      "    lea -16(%rbp), %rax\n    push %rax\n    pop %rax\n    mov (%rax), %rax\n    push %rax\n"
    ));
  }

  #[test]
  fn statement_residue_is_popped_between_statements() {
    let asm = generate_source("1;2;3;").expect("source should compile");
    // two inter-statement discards plus the epilogue's result capture
    let pops = asm.matches("    pop %rax\n").count();
    assert_eq!(pops, 3);
  }

  #[test]
  fn division_sign_extends_before_idiv() {
    let asm = generate_source("7/2;").expect("source should compile");
    assert!(asm.contains("    cqo\n    idiv %rdi\n"));
  }

  #[test]
  fn comparison_materialises_a_zero_or_one() {
    let asm = generate_source("1<2;").expect("source should compile");
    assert!(asm.contains("    cmp %rdi, %rax\n    setl %al\n    movzbl %al, %eax\n"));
  }

  #[test]
  fn assignment_to_non_variable_is_a_semantic_error() {
    let err = generate_source("1=2;").unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }));
    assert!(err.to_string().contains("not a variable"));
  }

  #[test]
  fn output_is_deterministic() {
    let first = generate_source("a=3;a+2;").expect("source should compile");
    let second = generate_source("a=3;a+2;").expect("source should compile");
    assert_eq!(first, second);
  }
}
