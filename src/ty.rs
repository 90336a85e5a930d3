use std::fmt;

/// Scalar types of the source language. Booleans have no type of their own:
/// they live in `Int` temporaries restricted to `0` and `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
  Int,
  Float,
}

impl Type {
  pub fn is_integer(self) -> bool {
    matches!(self, Type::Int)
  }

  pub fn is_float(self) -> bool {
    matches!(self, Type::Float)
  }

  /// Opcode prefix selecting the int or float variant of an instruction.
  pub fn prefix(self) -> char {
    match self {
      Type::Int => 'I',
      Type::Float => 'R',
    }
  }

  /// Result type of a binary operation: float wins, int only when both are int.
  pub fn unify(self, other: Type) -> Type {
    if self.is_float() || other.is_float() {
      Type::Float
    } else {
      Type::Int
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Type::Int => f.write_str("int"),
      Type::Float => f.write_str("float"),
    }
  }
}
