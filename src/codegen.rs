//! Code generation: lower the AST into quad-code fragments.
//!
//! Every node is translated bottom-up into a `Fragment` holding its code and,
//! for expressions, the operand where the result lives. Parents consume their
//! children's fragments by appending them. Jumps stay symbolic here; the
//! finalizer resolves them to line numbers.

use std::collections::HashMap;

use snafu::{OptionExt, ensure};

use crate::ast::{ArithOp, BoolExpr, ConditionalCase, Expr, Literal, Program, RelOp, Stmt};
use crate::env::Context;
use crate::error::{
  CompileResult, DuplicateCaseSnafu, NarrowingAssignmentSnafu, NotImplementedSnafu,
  SwitchTypeSnafu, ValuelessExpressionSnafu,
};
use crate::quad::{CmpOp, Fragment, Instr, Label, Operand, Value};
use crate::ty::Type;

/// Declare every variable of `program`, then translate its top-level block.
pub fn generate(program: &Program, ctx: &mut Context) -> CompileResult<Fragment> {
  for declaration in &program.declarations {
    for id in &declaration.ids {
      ctx.declare(id, declaration.ty)?;
    }
  }

  emit_stmts(&program.body, ctx)
}

/// Detach the value of an expression fragment, failing if it has none.
pub(crate) fn take_value(fragment: &mut Fragment, what: &str) -> CompileResult<Value> {
  fragment
    .value
    .take()
    .context(ValuelessExpressionSnafu { what })
}

/// Translate a statement list in order. The fragment's value is that of the
/// last statement.
fn emit_stmts(stmts: &[Stmt], ctx: &mut Context) -> CompileResult<Fragment> {
  let mut code = Fragment::new();
  for stmt in stmts {
    let mut fragment = emit_stmt(stmt, ctx)?;
    code.value = fragment.value.take();
    code.append(fragment);
  }
  Ok(code)
}

fn emit_stmt(stmt: &Stmt, ctx: &mut Context) -> CompileResult<Fragment> {
  match stmt {
    Stmt::Assign { target, expr } => emit_assign(target, expr, ctx),
    Stmt::Input { target } => {
      let ty = ctx.type_of(target)?;
      let mut code = Fragment::new();
      code.emit(Instr::Input {
        ty,
        dst: target.clone(),
      });
      Ok(code)
    }
    Stmt::Output { expr } => {
      let mut code = emit_expr(expr, ctx)?;
      let value = take_value(&mut code, "printed expression")?;
      code.emit(Instr::Print {
        ty: value.ty,
        src: value.operand,
      });
      Ok(code)
    }
    Stmt::If {
      cond,
      then_branch,
      else_branch,
    } => emit_if(cond, then_branch, else_branch, ctx),
    Stmt::While { cond, body } => emit_while(cond, body, ctx),
    Stmt::Switch {
      expr,
      cases,
      default,
    } => emit_switch(expr, cases, &default.statements, ctx),
    Stmt::Break => NotImplementedSnafu { feature: "break" }.fail(),
    Stmt::Block(stmts) => emit_stmts(stmts, ctx),
  }
}

fn emit_assign(target: &str, expr: &Expr, ctx: &mut Context) -> CompileResult<Fragment> {
  let mut code = emit_expr(expr, ctx)?;
  let value = take_value(&mut code, &format!("expression assigned to '{target}'"))?;
  let dst = target.to_string();

  let instr = match (value.ty, ctx.type_of(target)?) {
    (Type::Int, Type::Int) => Instr::Assign {
      ty: Type::Int,
      dst,
      src: value.operand,
    },
    (Type::Float, Type::Float) => Instr::Assign {
      ty: Type::Float,
      dst,
      src: value.operand,
    },
    (Type::Int, Type::Float) => Instr::IntToReal {
      dst,
      src: value.operand,
    },
    (Type::Float, Type::Int) => return NarrowingAssignmentSnafu { target }.fail(),
  };
  code.emit(instr);
  Ok(code)
}

fn emit_if(
  cond: &BoolExpr,
  then_branch: &Stmt,
  else_branch: &Stmt,
  ctx: &mut Context,
) -> CompileResult<Fragment> {
  let then_label = ctx.fresh_label();
  let else_label = ctx.fresh_label();
  let join_label = ctx.fresh_label();

  let mut code = emit_bool(cond, ctx)?;
  let flag = take_value(&mut code, "if condition")?;
  code.emit(Instr::JumpIfZero {
    target: else_label,
    cond: flag.operand,
  });

  code.place(then_label);
  code.append(emit_stmt(then_branch, ctx)?);
  code.emit(Instr::Jump { target: join_label });

  code.place(else_label);
  code.append(emit_stmt(else_branch, ctx)?);
  code.place(join_label);
  Ok(code)
}

fn emit_while(cond: &BoolExpr, body: &Stmt, ctx: &mut Context) -> CompileResult<Fragment> {
  let test_label = ctx.fresh_label();
  let exit_label = ctx.fresh_label();

  let mut code = Fragment::new();
  code.place(test_label);
  let mut test = emit_bool(cond, ctx)?;
  let flag = take_value(&mut test, "while condition")?;
  code.append(test);
  code.emit(Instr::JumpIfZero {
    target: exit_label,
    cond: flag.operand,
  });

  code.append(emit_stmt(body, ctx)?);
  code.emit(Instr::Jump { target: test_label });
  code.place(exit_label);
  Ok(code)
}

/// Compare the selector against each case in order and jump to the first
/// match; the default body runs when nothing matched. Every body ends with a
/// jump to the end label, so exactly one body executes.
fn emit_switch(
  expr: &Expr,
  cases: &[ConditionalCase],
  default: &[Stmt],
  ctx: &mut Context,
) -> CompileResult<Fragment> {
  let mut code = emit_expr(expr, ctx)?;
  let selector = take_value(&mut code, "switch expression")?;
  ensure!(
    selector.ty.is_integer(),
    SwitchTypeSnafu { found: selector.ty }
  );

  let end_label = ctx.fresh_label();
  let mut seen: HashMap<i64, Label> = HashMap::new();
  let mut arms = Vec::with_capacity(cases.len());
  for case in cases {
    ensure!(
      !seen.contains_key(&case.number),
      DuplicateCaseSnafu {
        number: case.number
      }
    );
    let label = ctx.fresh_label();
    seen.insert(case.number, label);
    arms.push((label, case));
  }

  if !arms.is_empty() {
    let mismatch = ctx.fresh_bool_temp()?;
    for (label, case) in &arms {
      code.emit(Instr::Compare {
        op: CmpOp::Ne,
        ty: Type::Int,
        dst: mismatch.clone(),
        lhs: selector.operand.clone(),
        rhs: Operand::Lit(Literal::Int(case.number)),
      });
      code.emit(Instr::JumpIfZero {
        target: *label,
        cond: Operand::Var(mismatch.clone()),
      });
    }
  }

  code.append(emit_stmts(default, ctx)?);
  code.emit(Instr::Jump { target: end_label });

  for (label, case) in arms {
    code.place(label);
    code.append(emit_stmts(&case.statements, ctx)?);
    code.emit(Instr::Jump { target: end_label });
  }
  code.place(end_label);
  Ok(code)
}

fn emit_expr(expr: &Expr, ctx: &mut Context) -> CompileResult<Fragment> {
  match expr {
    Expr::Literal(lit) => Ok(Fragment::of_value(Value::new(*lit, lit.ty()))),
    Expr::Var { name } => {
      let ty = ctx.type_of(name)?;
      Ok(Fragment::of_value(Value::var(name.clone(), ty)))
    }
    Expr::Binary { op, lhs, rhs } => emit_arith(*op, lhs, rhs, ctx),
    Expr::Cast { target, operand } => {
      let mut code = emit_expr(operand, ctx)?;
      let value = take_value(&mut code, "cast operand")?;
      if value.ty == *target {
        code.value = Some(value);
        return Ok(code);
      }
      let dst = ctx.fresh_temp(*target)?;
      code.emit(match target {
        Type::Float => Instr::IntToReal {
          dst: dst.clone(),
          src: value.operand,
        },
        Type::Int => Instr::RealToInt {
          dst: dst.clone(),
          src: value.operand,
        },
      });
      code.value = Some(Value::var(dst, *target));
      Ok(code)
    }
  }
}

fn emit_arith(op: ArithOp, lhs: &Expr, rhs: &Expr, ctx: &mut Context) -> CompileResult<Fragment> {
  let (mut code, lhs, rhs, ty) = emit_operands(lhs, rhs, ctx)?;
  let dst = ctx.fresh_temp(ty)?;
  code.emit(Instr::Arith {
    op,
    ty,
    dst: dst.clone(),
    lhs: lhs.operand,
    rhs: rhs.operand,
  });
  code.value = Some(Value::var(dst, ty));
  Ok(code)
}

/// Translate both operands of a binary operation (right first), then widen
/// whichever side is int when the other is float.
fn emit_operands(
  lhs: &Expr,
  rhs: &Expr,
  ctx: &mut Context,
) -> CompileResult<(Fragment, Value, Value, Type)> {
  let mut right = emit_expr(rhs, ctx)?;
  let mut left = emit_expr(lhs, ctx)?;
  let rhs = take_value(&mut right, "right operand")?;
  let lhs = take_value(&mut left, "left operand")?;

  let mut code = Fragment::new();
  code.append(right);
  code.append(left);

  let ty = lhs.ty.unify(rhs.ty);
  let lhs = widen(lhs, ty, &mut code, ctx)?;
  let rhs = widen(rhs, ty, &mut code, ctx)?;
  Ok((code, lhs, rhs, ty))
}

fn widen(value: Value, ty: Type, code: &mut Fragment, ctx: &mut Context) -> CompileResult<Value> {
  if value.ty == ty || !ty.is_float() {
    return Ok(value);
  }
  let dst = ctx.fresh_temp(Type::Float)?;
  code.emit(Instr::IntToReal {
    dst: dst.clone(),
    src: value.operand,
  });
  Ok(Value::var(dst, Type::Float))
}

/// Lower a boolean expression into an int temporary holding exactly 0 or 1.
fn emit_bool(expr: &BoolExpr, ctx: &mut Context) -> CompileResult<Fragment> {
  match expr {
    BoolExpr::Relational { op, lhs, rhs } => emit_relational(*op, lhs, rhs, ctx),
    BoolExpr::Or { lhs, rhs } => {
      let (mut code, lhs, rhs) = emit_bool_operands(lhs, rhs, ctx)?;
      // 1 + 1 must not escape as 2: normalize the sum.
      let sum = ctx.fresh_bool_temp()?;
      let dst = ctx.fresh_bool_temp()?;
      code.emit(Instr::Arith {
        op: ArithOp::Add,
        ty: Type::Int,
        dst: sum.clone(),
        lhs,
        rhs,
      });
      code.emit(Instr::Compare {
        op: CmpOp::Ne,
        ty: Type::Int,
        dst: dst.clone(),
        lhs: Operand::Var(sum),
        rhs: zero(),
      });
      code.value = Some(Value::var(dst, Type::Int));
      Ok(code)
    }
    BoolExpr::And { lhs, rhs } => {
      let (mut code, lhs, rhs) = emit_bool_operands(lhs, rhs, ctx)?;
      let dst = ctx.fresh_bool_temp()?;
      let keep = ctx.fresh_label();
      code.emit(Instr::Compare {
        op: CmpOp::Ne,
        ty: Type::Int,
        dst: dst.clone(),
        lhs,
        rhs: zero(),
      });
      code.emit(Instr::JumpIfZero {
        target: keep,
        cond: Operand::Var(dst.clone()),
      });
      code.emit(Instr::Compare {
        op: CmpOp::Ne,
        ty: Type::Int,
        dst: dst.clone(),
        lhs: rhs,
        rhs: zero(),
      });
      code.place(keep);
      code.value = Some(Value::var(dst, Type::Int));
      Ok(code)
    }
    BoolExpr::Not { operand } => {
      let mut code = emit_bool(operand, ctx)?;
      let value = take_value(&mut code, "negated condition")?;
      let dst = ctx.fresh_bool_temp()?;
      code.emit(Instr::Compare {
        op: CmpOp::Eq,
        ty: Type::Int,
        dst: dst.clone(),
        lhs: value.operand,
        rhs: zero(),
      });
      code.value = Some(Value::var(dst, Type::Int));
      Ok(code)
    }
  }
}

fn emit_bool_operands(
  lhs: &BoolExpr,
  rhs: &BoolExpr,
  ctx: &mut Context,
) -> CompileResult<(Fragment, Operand, Operand)> {
  let mut right = emit_bool(rhs, ctx)?;
  let mut left = emit_bool(lhs, ctx)?;
  let rhs = take_value(&mut right, "right condition")?;
  let lhs = take_value(&mut left, "left condition")?;

  let mut code = Fragment::new();
  code.append(right);
  code.append(left);
  Ok((code, lhs.operand, rhs.operand))
}

fn emit_relational(op: RelOp, lhs: &Expr, rhs: &Expr, ctx: &mut Context) -> CompileResult<Fragment> {
  let op = match op {
    RelOp::Lt => CmpOp::Lt,
    RelOp::Gt => CmpOp::Gt,
    RelOp::Eq => CmpOp::Eq,
    RelOp::Ne => CmpOp::Ne,
    // No opcode for these: `a <= b` is `a < b || a == b`.
    RelOp::Le | RelOp::Ge => {
      let strict = if op == RelOp::Le { RelOp::Lt } else { RelOp::Gt };
      let desugared = BoolExpr::or(
        BoolExpr::relational(strict, lhs.clone(), rhs.clone()),
        BoolExpr::relational(RelOp::Eq, lhs.clone(), rhs.clone()),
      );
      return emit_bool(&desugared, ctx);
    }
  };

  let (mut code, lhs, rhs, ty) = emit_operands(lhs, rhs, ctx)?;
  let dst = ctx.fresh_bool_temp()?;
  code.emit(Instr::Compare {
    op,
    ty,
    dst: dst.clone(),
    lhs: lhs.operand,
    rhs: rhs.operand,
  });
  code.value = Some(Value::var(dst, Type::Int));
  Ok(code)
}

fn zero() -> Operand {
  Operand::Lit(Literal::Int(0))
}
