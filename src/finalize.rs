//! Label resolution: turn a finished fragment into the flat instruction list
//! executed by the quad-code virtual machine.
//!
//! A `HALT` is appended, label markers are dropped, and every symbolic jump
//! target becomes the zero-based index of the instruction that followed its
//! marker.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CompileResult, DuplicateLabelSnafu, UnresolvedLabelSnafu};
use crate::quad::{Fragment, Instr, Item, Label};

/// Fully resolved program; jump targets are absolute line indices.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadProgram {
  pub instrs: Vec<Instr<usize>>,
  pub signature: String,
}

impl QuadProgram {
  pub fn len(&self) -> usize {
    self.instrs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instrs.is_empty()
  }
}

impl fmt::Display for QuadProgram {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for instr in &self.instrs {
      writeln!(f, "{instr}")?;
    }
    writeln!(f, "; generated by {}", self.signature)
  }
}

pub fn finalize(fragment: Fragment, signature: &str) -> CompileResult<QuadProgram> {
  let mut items = fragment.items;
  items.push(Item::Instr(Instr::Halt));

  let mut addresses: HashMap<Label, usize> = HashMap::new();
  let mut pending = Vec::with_capacity(items.len());
  for item in items {
    match item {
      Item::Label(label) => {
        if addresses.insert(label, pending.len()).is_some() {
          return DuplicateLabelSnafu {
            label: label.to_string(),
          }
          .fail();
        }
      }
      Item::Instr(instr) => pending.push(instr),
    }
  }

  let instrs = pending
    .into_iter()
    .map(|instr| {
      instr.try_map_target(|label| {
        addresses.get(&label).copied().ok_or_else(|| {
          UnresolvedLabelSnafu {
            label: label.to_string(),
          }
          .build()
        })
      })
    })
    .collect::<CompileResult<Vec<_>>>()?;

  Ok(QuadProgram {
    instrs,
    signature: signature.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::Literal;
  use crate::error::CompileError;
  use crate::quad::Operand;
  use crate::ty::Type;

  fn print(value: i64) -> Instr<Label> {
    Instr::Print {
      ty: Type::Int,
      src: Operand::Lit(Literal::Int(value)),
    }
  }

  #[test]
  fn empty_fragment_is_a_single_halt() {
    let program = finalize(Fragment::new(), "test").unwrap();
    assert_eq!(program.instrs, vec![Instr::Halt]);
    assert_eq!(program.to_string(), "HALT\n; generated by test\n");
  }

  #[test]
  fn label_points_at_next_instruction() {
    let skip = Label::new(0);
    let mut fragment = Fragment::new();
    fragment.emit(Instr::Jump { target: skip });
    fragment.emit(print(1));
    fragment.place(skip);
    fragment.emit(print(2));

    let program = finalize(fragment, "test").unwrap();
    assert_eq!(program.instrs[0], Instr::Jump { target: 2 });
    assert_eq!(program.len(), 4);
  }

  #[test]
  fn trailing_label_resolves_to_halt() {
    let end = Label::new(7);
    let mut fragment = Fragment::new();
    fragment.emit(Instr::JumpIfZero {
      target: end,
      cond: Operand::Var("x".to_string()),
    });
    fragment.place(end);

    let program = finalize(fragment, "test").unwrap();
    assert_eq!(
      program.instrs[0],
      Instr::JumpIfZero {
        target: 1,
        cond: Operand::Var("x".to_string()),
      }
    );
    assert_eq!(program.instrs[1], Instr::Halt);
  }

  #[test]
  fn stacked_labels_share_an_address() {
    let (a, b) = (Label::new(0), Label::new(1));
    let mut fragment = Fragment::new();
    fragment.emit(Instr::Jump { target: b });
    fragment.place(a);
    fragment.place(b);
    fragment.emit(Instr::Jump { target: a });

    let program = finalize(fragment, "test").unwrap();
    assert_eq!(program.instrs[0], Instr::Jump { target: 1 });
    assert_eq!(program.instrs[1], Instr::Jump { target: 1 });
  }

  #[test]
  fn missing_label_is_reported() {
    let mut fragment = Fragment::new();
    fragment.emit(Instr::Jump {
      target: Label::new(3),
    });
    let err = finalize(fragment, "test").unwrap_err();
    assert_eq!(
      err,
      CompileError::UnresolvedLabel {
        label: "_L3".to_string()
      }
    );
  }

  #[test]
  fn label_placed_twice_is_reported() {
    let mut fragment = Fragment::new();
    fragment.place(Label::new(0));
    fragment.emit(print(0));
    fragment.place(Label::new(0));
    let err = finalize(fragment, "test").unwrap_err();
    assert!(matches!(err, CompileError::DuplicateLabel { .. }));
  }
}
