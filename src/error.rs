//! Error kinds raised while translating a program into quad code.
//!
//! Every error is fatal for the compilation in progress: the translator
//! stops at the first one and no partial output is returned.

use snafu::Snafu;

use crate::ty::Type;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("variable '{name}' was already declared as {existing}"))]
  Redeclaration { name: String, existing: Type },

  #[snafu(display("variable '{name}' was not declared"))]
  Undeclared { name: String },

  #[snafu(display("{what} produces no value"))]
  ValuelessExpression { what: String },

  #[snafu(display("cannot assign a float expression into int variable '{target}'"))]
  NarrowingAssignment { target: String },

  #[snafu(display("switch expression must be int, found {found}"))]
  SwitchType { found: Type },

  #[snafu(display("duplicate case {number} in switch statement"))]
  DuplicateCase { number: i64 },

  #[snafu(display("'{feature}' statement is not implemented"))]
  NotImplemented { feature: String },

  #[snafu(display("jump to label '{label}' which is never placed"))]
  UnresolvedLabel { label: String },

  #[snafu(display("label '{label}' is placed more than once"))]
  DuplicateLabel { label: String },
}
