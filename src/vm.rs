//! Reference interpreter for lowered stack programs.
//!
//! Arithmetic follows what the emitted x86-64 code does: 64-bit wrapping
//! `add`/`sub`/`imul`, truncating `idiv`, and 0/1 comparison results. The
//! cases where `idiv` traps on the target surface as [`VmError::DivisionFault`].

use snafu::Snafu;

use crate::ast::BinaryOp;
use crate::codegen::StackOp;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum VmError {
  #[snafu(display("division fault: {lhs} / {rhs}"))]
  DivisionFault { lhs: i64, rhs: i64 },

  #[snafu(display("stack underflow at instruction {index}"))]
  StackUnderflow { index: usize },

  #[snafu(display("program left {depth} values on the stack, expected 1"))]
  UnbalancedStack { depth: usize },
}

/// Execute a stack program and return the single value it leaves behind.
pub fn run(ops: &[StackOp]) -> Result<i64, VmError> {
  let mut stack = Vec::new();

  for (index, op) in ops.iter().enumerate() {
    match *op {
      StackOp::Push(value) => stack.push(value),
      StackOp::Apply(op) => {
        let rhs = stack.pop().ok_or(VmError::StackUnderflow { index })?;
        let lhs = stack.pop().ok_or(VmError::StackUnderflow { index })?;
        stack.push(apply(op, lhs, rhs)?);
      }
    }
  }

  match stack.as_slice() {
    [value] => Ok(*value),
    _ => Err(VmError::UnbalancedStack { depth: stack.len() }),
  }
}

fn apply(op: BinaryOp, lhs: i64, rhs: i64) -> Result<i64, VmError> {
  Ok(match op {
    BinaryOp::Add => lhs.wrapping_add(rhs),
    BinaryOp::Sub => lhs.wrapping_sub(rhs),
    BinaryOp::Mul => lhs.wrapping_mul(rhs),
    BinaryOp::Div => lhs
      .checked_div(rhs)
      .ok_or(VmError::DivisionFault { lhs, rhs })?,
    BinaryOp::Eq => i64::from(lhs == rhs),
    BinaryOp::Ne => i64::from(lhs != rhs),
    BinaryOp::Lt => i64::from(lhs < rhs),
    BinaryOp::Le => i64::from(lhs <= rhs),
  })
}
