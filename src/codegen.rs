//! Code generation: lower the expression tree into x86-64 assembly.
//!
//! The emitter is a simple stack machine. Lowering walks the tree in
//! postorder and produces a flat [`StackOp`] program in which every subtree
//! leaves exactly one value on the stack; [`emit`] then renders that program
//! as Intel-syntax assembly around a `main` entry point.

use tracing::debug;

use crate::ast::{Ast, BinaryOp, Node, NodeId};

/// One step of the target-neutral stack program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOp {
  Push(i64),
  /// Pop the right operand, then the left one, and push `left op right`.
  Apply(BinaryOp),
}

/// Emit assembly for a whole expression.
pub fn generate(ast: &Ast) -> String {
  emit(&lower(ast))
}

/// Postorder work item: expand a subtree, or apply an operator whose
/// operands have already been lowered.
enum Visit {
  Enter(NodeId),
  Exit(BinaryOp),
}

/// Flatten the tree into stack operations, left operand before right.
///
/// The walk keeps its own stack, so left-deep operator chains of any length
/// lower without recursion. Arena order is not postorder here: `a > b` is
/// stored as `Lt(b, a)` with `a` allocated first.
pub fn lower(ast: &Ast) -> Vec<StackOp> {
  let mut ops = Vec::with_capacity(ast.len());
  let mut work = vec![Visit::Enter(ast.root())];

  while let Some(visit) = work.pop() {
    match visit {
      Visit::Exit(op) => ops.push(StackOp::Apply(op)),
      Visit::Enter(id) => match *ast.node(id) {
        Node::Num { value } => ops.push(StackOp::Push(value)),
        Node::Binary { op, lhs, rhs } => {
          work.push(Visit::Exit(op));
          work.push(Visit::Enter(rhs));
          work.push(Visit::Enter(lhs));
        }
      },
    }
  }

  debug!(ops = ops.len(), "lowered expression");
  ops
}

/// Render a stack program with the `main` prologue and the return trailer.
pub fn emit(ops: &[StackOp]) -> String {
  let mut asm = String::new();
  asm.push_str(".intel_syntax noprefix\n");
  asm.push_str(".globl main\n");
  asm.push_str("main:\n");

  for op in ops {
    emit_op(*op, &mut asm);
  }

  asm.push_str("    pop rax\n");
  asm.push_str("    ret\n");
  asm
}

fn emit_op(op: StackOp, asm: &mut String) {
  match op {
    StackOp::Push(value) => {
      // `push imm` only takes 32 bits; go through rax for full-width literals.
      asm.push_str(&format!("    mov rax, {value}\n"));
      asm.push_str("    push rax\n");
    }
    StackOp::Apply(op) => {
      asm.push_str("    pop rdi\n");
      asm.push_str("    pop rax\n");
      match op {
        BinaryOp::Add => asm.push_str("    add rax, rdi\n"),
        BinaryOp::Sub => asm.push_str("    sub rax, rdi\n"),
        BinaryOp::Mul => asm.push_str("    imul rax, rdi\n"),
        BinaryOp::Div => {
          asm.push_str("    cqo\n");
          asm.push_str("    idiv rdi\n");
        }
        BinaryOp::Eq => emit_compare("sete", asm),
        BinaryOp::Ne => emit_compare("setne", asm),
        BinaryOp::Lt => emit_compare("setl", asm),
        BinaryOp::Le => emit_compare("setle", asm),
      }
      asm.push_str("    push rax\n");
    }
  }
}

fn emit_compare(set: &str, asm: &mut String) {
  asm.push_str("    cmp rax, rdi\n");
  asm.push_str(&format!("    {set} al\n"));
  asm.push_str("    movzb rax, al\n");
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::parse;
  use crate::tokenizer::tokenize;

  fn ast(source: &str) -> Ast {
    parse(tokenize(source).unwrap(), source).unwrap()
  }

  #[test]
  fn lowering_is_postorder() {
    use crate::ast::BinaryOp::*;
    use crate::codegen::StackOp::*;

    assert_eq!(lower(&ast("42")), [Push(42)]);
    assert_eq!(
      lower(&ast("10 - 2 - 3")),
      [Push(10), Push(2), Apply(Sub), Push(3), Apply(Sub)]
    );
    assert_eq!(
      lower(&ast("2 + 3 * 4")),
      [Push(2), Push(3), Push(4), Apply(Mul), Apply(Add)]
    );
    assert_eq!(lower(&ast("3 > 2")), [Push(2), Push(3), Apply(Lt)]);
  }

  #[test]
  fn every_subtree_nets_one_push() {
    let ops = lower(&ast("(1 + 2) * -(3 - 4) / 5 == 6 != (7 >= 8)"));
    let mut depth = 0i32;
    for op in &ops {
      depth += match op {
        StackOp::Push(_) => 1,
        StackOp::Apply(_) => -1,
      };
      assert!(depth >= 1);
    }
    assert_eq!(depth, 1);
  }

  #[test]
  fn lowers_long_chains_without_recursion() {
    let source = format!("1{}", "+1".repeat(100_000));
    let ops = lower(&ast(&source));
    assert_eq!(ops.len(), 200_001);
    assert_eq!(ops[..3], [StackOp::Push(1), StackOp::Push(1), StackOp::Apply(BinaryOp::Add)]);
    assert_eq!(crate::vm::run(&ops), Ok(100_001));

    let asm = generate(&ast(&format!("100000{}", "-1".repeat(100_000))));
    assert!(asm.ends_with("    sub rax, rdi\n    push rax\n    pop rax\n    ret\n"));
  }

  #[test]
  fn emits_full_program() {
    let expected = "\
.intel_syntax noprefix
.globl main
main:
    mov rax, 1
    push rax
    mov rax, 2
    push rax
    pop rdi
    pop rax
    add rax, rdi
    push rax
    pop rax
    ret
";
    assert_eq!(generate(&ast("1 + 2")), expected);
  }

  #[test]
  fn division_sign_extends_before_idiv() {
    let asm = generate(&ast("7 / 2"));
    assert!(asm.contains("    cqo\n    idiv rdi\n"));
  }

  #[test]
  fn comparisons_produce_zero_or_one() {
    let asm = generate(&ast("1 <= 2"));
    assert!(asm.contains("    cmp rax, rdi\n    setle al\n    movzb rax, al\n"));
  }

  #[test]
  fn mirrored_comparisons_generate_identical_code() {
    assert_eq!(generate(&ast("3 > 2")), generate(&ast("2 < 3")));
    assert_eq!(generate(&ast("3 >= 2")), generate(&ast("2 <= 3")));
  }

  #[test]
  fn full_width_literals_go_through_rax() {
    let asm = generate(&ast("9223372036854775807"));
    assert!(asm.contains("    mov rax, 9223372036854775807\n    push rax\n"));
  }
}
