//! Quad-code instruction records and the translation unit built from them.
//!
//! Instructions are generic over their jump-target type: the translator emits
//! `Instr<Label>` with symbolic targets, the finalizer turns them into
//! `Instr<usize>` holding absolute line indices. Text only appears when an
//! instruction is displayed.

use std::fmt;

use crate::ast::{ArithOp, Literal};
use crate::ty::Type;

/// Source operand: a variable (user or temporary) or an immediate literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  Var(String),
  Lit(Literal),
}

impl From<Literal> for Operand {
  fn from(lit: Literal) -> Self {
    Self::Lit(lit)
  }
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Var(name) => f.write_str(name),
      Operand::Lit(lit) => write!(f, "{lit}"),
    }
  }
}

/// Symbolic jump target issued by the name generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(usize);

impl Label {
  pub(crate) fn new(id: usize) -> Self {
    Self(id)
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "_L{}", self.0)
  }
}

/// Primitive comparisons of the virtual machine. `<=` and `>=` have no opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
  Eq,
  Ne,
  Lt,
  Gt,
}

impl CmpOp {
  fn mnemonic(self) -> &'static str {
    match self {
      CmpOp::Eq => "EQL",
      CmpOp::Ne => "NQL",
      CmpOp::Lt => "LSS",
      CmpOp::Gt => "GRT",
    }
  }
}

fn arith_mnemonic(op: ArithOp) -> &'static str {
  match op {
    ArithOp::Add => "ADD",
    ArithOp::Sub => "SUB",
    ArithOp::Mul => "MLT",
    ArithOp::Div => "DIV",
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr<T> {
  /// `IASN` / `RASN dst src`
  Assign { ty: Type, dst: String, src: Operand },
  /// `IINP` / `RINP dst`
  Input { ty: Type, dst: String },
  /// `IPRT` / `RPRT src`
  Print { ty: Type, src: Operand },
  /// `IADD` ... `RDIV dst lhs rhs`
  Arith {
    op: ArithOp,
    ty: Type,
    dst: String,
    lhs: Operand,
    rhs: Operand,
  },
  /// `IEQL` ... `RGRT dst lhs rhs`; `dst` is always an int holding 0 or 1.
  Compare {
    op: CmpOp,
    ty: Type,
    dst: String,
    lhs: Operand,
    rhs: Operand,
  },
  /// `ITOR dst src`
  IntToReal { dst: String, src: Operand },
  /// `RTOI dst src`
  RealToInt { dst: String, src: Operand },
  /// `JUMP target`
  Jump { target: T },
  /// `JMPZ target cond`
  JumpIfZero { target: T, cond: Operand },
  Halt,
}

impl<T> Instr<T> {
  /// Rebuild the instruction with every jump target passed through `f`.
  pub fn try_map_target<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<Instr<U>, E> {
    Ok(match self {
      Instr::Assign { ty, dst, src } => Instr::Assign { ty, dst, src },
      Instr::Input { ty, dst } => Instr::Input { ty, dst },
      Instr::Print { ty, src } => Instr::Print { ty, src },
      Instr::Arith {
        op,
        ty,
        dst,
        lhs,
        rhs,
      } => Instr::Arith {
        op,
        ty,
        dst,
        lhs,
        rhs,
      },
      Instr::Compare {
        op,
        ty,
        dst,
        lhs,
        rhs,
      } => Instr::Compare {
        op,
        ty,
        dst,
        lhs,
        rhs,
      },
      Instr::IntToReal { dst, src } => Instr::IntToReal { dst, src },
      Instr::RealToInt { dst, src } => Instr::RealToInt { dst, src },
      Instr::Jump { target } => Instr::Jump { target: f(target)? },
      Instr::JumpIfZero { target, cond } => Instr::JumpIfZero {
        target: f(target)?,
        cond,
      },
      Instr::Halt => Instr::Halt,
    })
  }

  pub fn opcode(&self) -> String {
    match self {
      Instr::Assign { ty, .. } => format!("{}ASN", ty.prefix()),
      Instr::Input { ty, .. } => format!("{}INP", ty.prefix()),
      Instr::Print { ty, .. } => format!("{}PRT", ty.prefix()),
      Instr::Arith { op, ty, .. } => format!("{}{}", ty.prefix(), arith_mnemonic(*op)),
      Instr::Compare { op, ty, .. } => format!("{}{}", ty.prefix(), op.mnemonic()),
      Instr::IntToReal { .. } => "ITOR".to_string(),
      Instr::RealToInt { .. } => "RTOI".to_string(),
      Instr::Jump { .. } => "JUMP".to_string(),
      Instr::JumpIfZero { .. } => "JMPZ".to_string(),
      Instr::Halt => "HALT".to_string(),
    }
  }
}

impl<T: fmt::Display> fmt::Display for Instr<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let opcode = self.opcode();
    match self {
      Instr::Assign { dst, src, .. }
      | Instr::IntToReal { dst, src }
      | Instr::RealToInt { dst, src } => write!(f, "{opcode} {dst} {src}"),
      Instr::Input { dst, .. } => write!(f, "{opcode} {dst}"),
      Instr::Print { src, .. } => write!(f, "{opcode} {src}"),
      Instr::Arith { dst, lhs, rhs, .. } | Instr::Compare { dst, lhs, rhs, .. } => {
        write!(f, "{opcode} {dst} {lhs} {rhs}")
      }
      Instr::Jump { target } => write!(f, "{opcode} {target}"),
      Instr::JumpIfZero { target, cond } => write!(f, "{opcode} {target} {cond}"),
      Instr::Halt => f.write_str(&opcode),
    }
  }
}

/// One line of a fragment: an instruction or a label marker naming the next
/// instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
  Label(Label),
  Instr(Instr<Label>),
}

/// Where an evaluated expression lives, and its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
  pub operand: Operand,
  pub ty: Type,
}

impl Value {
  pub fn new(operand: impl Into<Operand>, ty: Type) -> Self {
    Self {
      operand: operand.into(),
      ty,
    }
  }

  pub fn var(name: impl Into<String>, ty: Type) -> Self {
    Self::new(Operand::Var(name.into()), ty)
  }
}

/// Translation output of one AST node. Fragments compose by appending the
/// child's items into the parent; the child is consumed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
  pub items: Vec<Item>,
  pub value: Option<Value>,
}

impl Fragment {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fragment with no code whose value is already available (literal, variable).
  pub fn of_value(value: Value) -> Self {
    Self {
      items: Vec::new(),
      value: Some(value),
    }
  }

  pub fn emit(&mut self, instr: Instr<Label>) {
    self.items.push(Item::Instr(instr));
  }

  pub fn place(&mut self, label: Label) {
    self.items.push(Item::Label(label));
  }

  /// Append `other`'s code, dropping its value.
  pub fn append(&mut self, other: Fragment) {
    self.items.extend(other.items);
  }

  pub fn instructions(&self) -> impl Iterator<Item = &Instr<Label>> {
    self.items.iter().filter_map(|item| match item {
      Item::Instr(instr) => Some(instr),
      Item::Label(_) => None,
    })
  }

  pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
    self.items.iter().filter_map(|item| match item {
      Item::Label(label) => Some(*label),
      Item::Instr(_) => None,
    })
  }

  /// Symbolic listing with `label:` markers, for diagnostics.
  pub fn render(&self) -> String {
    let mut out = String::new();
    for item in &self.items {
      match item {
        Item::Label(label) => out.push_str(&format!("{label}:\n")),
        Item::Instr(instr) => out.push_str(&format!("  {instr}\n")),
      }
    }
    out
  }
}
