//! Per-compilation state: the type environment and the name generator.
//!
//! Both are created fresh for every compilation and only ever grow. Generated
//! names start with `_`, which no source identifier can, and temporaries are
//! registered in the environment like declared variables.

use std::collections::HashMap;

use snafu::OptionExt;

use crate::error::{CompileResult, RedeclarationSnafu, UndeclaredSnafu};
use crate::quad::Label;
use crate::ty::Type;

const TEMP_PREFIX: &str = "_t";

/// Identifier -> declared type. Write-once per identifier.
#[derive(Debug, Default)]
pub struct TypeEnv {
  types: HashMap<String, Type>,
}

impl TypeEnv {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn declare(&mut self, id: &str, ty: Type) -> CompileResult<()> {
    if let Some(&existing) = self.types.get(id) {
      return RedeclarationSnafu { name: id, existing }.fail();
    }
    self.types.insert(id.to_string(), ty);
    Ok(())
  }

  pub fn type_of(&self, id: &str) -> CompileResult<Type> {
    self.types.get(id).copied().context(UndeclaredSnafu { name: id })
  }

  pub fn contains(&self, id: &str) -> bool {
    self.types.contains_key(id)
  }
}

/// Issues temporaries and labels, each unique for the whole compilation.
#[derive(Debug, Default)]
pub struct NameGen {
  next_temp: usize,
  next_label: usize,
}

impl NameGen {
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocate a temporary of type `ty` and register it in `env`.
  pub fn fresh_temp(&mut self, env: &mut TypeEnv, ty: Type) -> CompileResult<String> {
    // Skip names a hand-built tree may already have declared.
    let name = loop {
      let candidate = format!("{TEMP_PREFIX}{}", self.next_temp);
      self.next_temp += 1;
      if !env.contains(&candidate) {
        break candidate;
      }
    };
    env.declare(&name, ty)?;
    Ok(name)
  }

  /// Booleans are int temporaries holding 0 or 1.
  pub fn fresh_bool_temp(&mut self, env: &mut TypeEnv) -> CompileResult<String> {
    self.fresh_temp(env, Type::Int)
  }

  pub fn fresh_label(&mut self) -> Label {
    let label = Label::new(self.next_label);
    self.next_label += 1;
    label
  }
}

/// Mutable state threaded through one translation run.
#[derive(Debug, Default)]
pub struct Context {
  pub env: TypeEnv,
  pub names: NameGen,
}

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn declare(&mut self, id: &str, ty: Type) -> CompileResult<()> {
    self.env.declare(id, ty)
  }

  pub fn type_of(&self, id: &str) -> CompileResult<Type> {
    self.env.type_of(id)
  }

  pub fn fresh_temp(&mut self, ty: Type) -> CompileResult<String> {
    self.names.fresh_temp(&mut self.env, ty)
  }

  pub fn fresh_bool_temp(&mut self) -> CompileResult<String> {
    self.names.fresh_bool_temp(&mut self.env)
  }

  pub fn fresh_label(&mut self) -> Label {
    self.names.fresh_label()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::CompileError;

  #[test]
  fn redeclaration_keeps_first_type() {
    let mut env = TypeEnv::new();
    env.declare("x", Type::Int).unwrap();
    let err = env.declare("x", Type::Float).unwrap_err();
    assert_eq!(
      err,
      CompileError::Redeclaration {
        name: "x".to_string(),
        existing: Type::Int,
      }
    );
    assert_eq!(env.type_of("x").unwrap(), Type::Int);
  }

  #[test]
  fn undeclared_lookup_fails() {
    let env = TypeEnv::new();
    assert!(matches!(
      env.type_of("y"),
      Err(CompileError::Undeclared { name }) if name == "y"
    ));
  }

  #[test]
  fn temps_are_registered_and_distinct() {
    let mut ctx = Context::new();
    let a = ctx.fresh_temp(Type::Float).unwrap();
    let b = ctx.fresh_bool_temp().unwrap();
    assert_ne!(a, b);
    assert_eq!(ctx.type_of(&a).unwrap(), Type::Float);
    assert_eq!(ctx.type_of(&b).unwrap(), Type::Int);
  }

  #[test]
  fn temps_skip_names_already_declared() {
    let mut ctx = Context::new();
    ctx.declare("_t0", Type::Float).unwrap();
    ctx.declare("_t1", Type::Float).unwrap();
    let temp = ctx.fresh_temp(Type::Int).unwrap();
    assert_eq!(temp, "_t2");
    assert_eq!(ctx.type_of("_t0").unwrap(), Type::Float);
  }

  #[test]
  fn labels_are_distinct() {
    let mut names = NameGen::new();
    let labels: Vec<_> = (0..4).map(|_| names.fresh_label()).collect();
    for (i, a) in labels.iter().enumerate() {
      for b in &labels[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }
}
