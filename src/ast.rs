//! Abstract syntax tree handed over by the front end.
//!
//! The tree is immutable once built; the translator only borrows it. Small
//! constructor helpers keep hand-built trees (tests, embedders) readable and
//! hide the boxing of child nodes.

use std::fmt;

use crate::ty::Type;

/// Arithmetic operators of numeric expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
  Add,
  Sub,
  Mul,
  Div,
}

/// Relational operators of boolean factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
  Lt,
  Gt,
  Eq,
  Ne,
  Le,
  Ge,
}

/// Numeric literal. Its type follows its spelling: `3` is int, `3.` and `2.5`
/// are float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
  Int(i64),
  Float(f64),
}

impl Literal {
  pub fn ty(self) -> Type {
    match self {
      Literal::Int(_) => Type::Int,
      Literal::Float(_) => Type::Float,
    }
  }
}

impl fmt::Display for Literal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      Literal::Int(value) => write!(f, "{value}"),
      // Keep the decimal point so the literal still reads as a float.
      Literal::Float(value) if value.is_finite() && value.fract() == 0.0 => {
        write!(f, "{value:.1}")
      }
      Literal::Float(value) => write!(f, "{value}"),
    }
  }
}

/// Numeric expression tree (expression / term / factor of the grammar).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Literal(Literal),
  Var {
    name: String,
  },
  Binary {
    op: ArithOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  /// `static_cast<int>(...)` / `static_cast<float>(...)`.
  Cast {
    target: Type,
    operand: Box<Expr>,
  },
}

impl Expr {
  pub fn int(value: i64) -> Self {
    Self::Literal(Literal::Int(value))
  }

  pub fn float(value: f64) -> Self {
    Self::Literal(Literal::Float(value))
  }

  pub fn var(name: impl Into<String>) -> Self {
    Self::Var { name: name.into() }
  }

  pub fn binary(op: ArithOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn cast(target: Type, operand: Expr) -> Self {
    Self::Cast {
      target,
      operand: Box::new(operand),
    }
  }
}

/// Boolean expression tree. Only appears as a condition of `if` / `while`.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
  Or {
    lhs: Box<BoolExpr>,
    rhs: Box<BoolExpr>,
  },
  And {
    lhs: Box<BoolExpr>,
    rhs: Box<BoolExpr>,
  },
  Not {
    operand: Box<BoolExpr>,
  },
  Relational {
    op: RelOp,
    lhs: Expr,
    rhs: Expr,
  },
}

impl BoolExpr {
  pub fn or(lhs: BoolExpr, rhs: BoolExpr) -> Self {
    Self::Or {
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn and(lhs: BoolExpr, rhs: BoolExpr) -> Self {
    Self::And {
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn not(operand: BoolExpr) -> Self {
    Self::Not {
      operand: Box::new(operand),
    }
  }

  pub fn relational(op: RelOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Relational { op, lhs, rhs }
  }
}

/// `case <number>: <statements>` arm of a switch.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalCase {
  pub number: i64,
  pub statements: Vec<Stmt>,
}

/// `default: <statements>` arm of a switch. Always present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultCase {
  pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  Assign {
    target: String,
    expr: Expr,
  },
  Input {
    target: String,
  },
  Output {
    expr: Expr,
  },
  If {
    cond: BoolExpr,
    then_branch: Box<Stmt>,
    else_branch: Box<Stmt>,
  },
  While {
    cond: BoolExpr,
    body: Box<Stmt>,
  },
  Switch {
    expr: Expr,
    cases: Vec<ConditionalCase>,
    default: DefaultCase,
  },
  Break,
  Block(Vec<Stmt>),
}

impl Stmt {
  pub fn assign(target: impl Into<String>, expr: Expr) -> Self {
    Self::Assign {
      target: target.into(),
      expr,
    }
  }

  pub fn input(target: impl Into<String>) -> Self {
    Self::Input {
      target: target.into(),
    }
  }

  pub fn output(expr: Expr) -> Self {
    Self::Output { expr }
  }

  pub fn if_else(cond: BoolExpr, then_branch: Stmt, else_branch: Stmt) -> Self {
    Self::If {
      cond,
      then_branch: Box::new(then_branch),
      else_branch: Box::new(else_branch),
    }
  }

  pub fn while_loop(cond: BoolExpr, body: Stmt) -> Self {
    Self::While {
      cond,
      body: Box::new(body),
    }
  }

  pub fn switch(expr: Expr, cases: Vec<ConditionalCase>, default: Vec<Stmt>) -> Self {
    Self::Switch {
      expr,
      cases,
      default: DefaultCase {
        statements: default,
      },
    }
  }

  pub fn block(statements: Vec<Stmt>) -> Self {
    Self::Block(statements)
  }
}

/// `id, id, ...: type;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
  pub ids: Vec<String>,
  pub ty: Type,
}

impl Declaration {
  pub fn new<I, S>(ids: I, ty: Type) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      ids: ids.into_iter().map(Into::into).collect(),
      ty,
    }
  }
}

/// A whole compilation unit: declarations followed by the top-level block.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
  pub declarations: Vec<Declaration>,
  pub body: Vec<Stmt>,
}

impl Program {
  pub fn new(declarations: Vec<Declaration>, body: Vec<Stmt>) -> Self {
    Self { declarations, body }
  }
}
